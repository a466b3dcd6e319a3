use crate::config::{Config, GenomeConfig};
use crate::genome::{Genome, GenomeKey};
use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};

pub type SpeciesKey = usize;

#[derive(Clone, Debug)]
pub struct Species {
    pub key: SpeciesKey,
    pub created: usize,
    pub last_improved: usize,
    pub representative: Genome,
    pub members: Vec<GenomeKey>,
    pub fitness: Option<f64>,
    pub adjusted_fitness: Option<f64>,
    pub fitness_history: Vec<f64>,
}

impl Species {
    pub fn new(key: SpeciesKey, generation: usize, representative: Genome, members: Vec<GenomeKey>) -> Self {
        Self {
            key,
            created: generation,
            last_improved: generation,
            representative,
            members,
            fitness: None,
            adjusted_fitness: None,
            fitness_history: Vec::new(),
        }
    }

    pub fn fitnesses(&self, population: &BTreeMap<GenomeKey, Genome>) -> Vec<f64> {
        self.members
            .iter()
            .filter_map(|k| population.get(k))
            .map(|g| g.fitness.unwrap_or(0.0))
            .collect()
    }
}

/// Memoised genome distances for one speciation pass. Genome keys are never
/// reused, so a key pair identifies a distance.
pub struct DistanceCache<'a> {
    config: &'a GenomeConfig,
    distances: AHashMap<(GenomeKey, GenomeKey), f64>,
    hits: usize,
    misses: usize,
}

impl<'a> DistanceCache<'a> {
    pub fn new(config: &'a GenomeConfig) -> Self {
        Self {
            config,
            distances: AHashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn distance(&mut self, a: &Genome, b: &Genome) -> f64 {
        let key = (a.key.min(b.key), a.key.max(b.key));
        if let Some(&d) = self.distances.get(&key) {
            self.hits += 1;
            return d;
        }
        self.misses += 1;
        let d = a.distance(b, self.config);
        self.distances.insert(key, d);
        d
    }

    pub fn mean(&self) -> f64 {
        let values: Vec<f64> = self.distances.values().copied().collect();
        crate::stats::mean(&values)
    }
}

/// Partitions the population into species by compatibility distance.
#[derive(Clone, Debug, Default)]
pub struct SpeciesSet {
    pub species: BTreeMap<SpeciesKey, Species>,
    genome_to_species: AHashMap<GenomeKey, SpeciesKey>,
    next_key: SpeciesKey,
}

impl SpeciesSet {
    pub fn new() -> Self {
        Self {
            next_key: 1,
            ..Default::default()
        }
    }

    /// Each surviving species first claims the unassigned genome closest to
    /// its old representative. Remaining genomes join the closest new
    /// representative within the compatibility threshold, or found a species
    /// of their own. Species that claim no genome disappear.
    pub fn speciate(&mut self, config: &Config, population: &BTreeMap<GenomeKey, Genome>, generation: usize) {
        let threshold = config.species.compatibility_threshold;
        let mut cache = DistanceCache::new(&config.genome);
        let mut unspeciated: BTreeSet<GenomeKey> = population.keys().copied().collect();
        let mut new_reps: BTreeMap<SpeciesKey, GenomeKey> = BTreeMap::new();
        let mut new_members: BTreeMap<SpeciesKey, Vec<GenomeKey>> = BTreeMap::new();

        for (&sid, s) in &self.species {
            let closest = unspeciated
                .iter()
                .map(|gk| (cache.distance(&s.representative, &population[gk]), *gk))
                .min_by(|a, b| a.0.total_cmp(&b.0));
            let Some((_, gk)) = closest else {
                continue;
            };
            new_reps.insert(sid, gk);
            new_members.insert(sid, vec![gk]);
            unspeciated.remove(&gk);
        }

        for gk in unspeciated {
            let genome = &population[&gk];
            let closest = new_reps
                .iter()
                .map(|(&sid, rk)| (cache.distance(&population[rk], genome), sid))
                .filter(|(d, _)| *d < threshold)
                .min_by(|a, b| a.0.total_cmp(&b.0));
            match closest {
                Some((_, sid)) => new_members.entry(sid).or_default().push(gk),
                None => {
                    let sid = self.next_key;
                    self.next_key += 1;
                    new_reps.insert(sid, gk);
                    new_members.insert(sid, vec![gk]);
                }
            }
        }

        let mut old = std::mem::take(&mut self.species);
        self.genome_to_species.clear();
        for (sid, rk) in new_reps {
            let members = new_members.remove(&sid).unwrap_or_default();
            for &m in &members {
                self.genome_to_species.insert(m, sid);
            }
            let representative = population[&rk].clone();
            let species = match old.remove(&sid) {
                Some(mut s) => {
                    s.representative = representative;
                    s.members = members;
                    s
                }
                None => Species::new(sid, generation, representative, members),
            };
            self.species.insert(sid, species);
        }
        for sid in old.keys() {
            tracing::debug!(species = sid, "species lost all members");
        }

        tracing::debug!(
            mean_distance = cache.mean(),
            hits = cache.hits,
            misses = cache.misses,
            "speciated {} genomes into {} species",
            population.len(),
            self.species.len()
        );
    }

    pub fn species_of(&self, genome: GenomeKey) -> Option<SpeciesKey> {
        self.genome_to_species.get(&genome).copied()
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::SAMPLE;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn population(config: &Config, n: usize, rng: &mut SmallRng) -> BTreeMap<GenomeKey, Genome> {
        (1..=n)
            .map(|k| {
                let mut g = Genome::new(k);
                g.configure_new(&config.genome, rng);
                (k, g)
            })
            .collect()
    }

    #[test]
    fn every_genome_lands_in_exactly_one_species() {
        let config = Config::parse(SAMPLE).unwrap();
        let mut rng = SmallRng::seed_from_u64(11);
        let pop = population(&config, 30, &mut rng);
        let mut set = SpeciesSet::new();
        set.speciate(&config, &pop, 0);

        let mut seen: Vec<GenomeKey> = set.species.values().flat_map(|s| s.members.clone()).collect();
        seen.sort();
        assert_eq!(seen, pop.keys().copied().collect::<Vec<_>>());
        for &gk in pop.keys() {
            let sid = set.species_of(gk).unwrap();
            assert!(set.species[&sid].members.contains(&gk));
        }
    }

    #[test]
    fn zero_threshold_puts_distinct_genomes_apart() {
        let mut config = Config::parse(SAMPLE).unwrap();
        config.species.compatibility_threshold = 0.0;
        let mut rng = SmallRng::seed_from_u64(12);
        let pop = population(&config, 5, &mut rng);
        let mut set = SpeciesSet::new();
        set.speciate(&config, &pop, 0);
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn species_keep_their_identity_across_generations() {
        let mut config = Config::parse(SAMPLE).unwrap();
        config.species.compatibility_threshold = 1e9;
        let mut rng = SmallRng::seed_from_u64(13);
        let pop = population(&config, 10, &mut rng);
        let mut set = SpeciesSet::new();
        set.speciate(&config, &pop, 0);
        assert_eq!(set.species.keys().copied().collect::<Vec<_>>(), vec![1]);

        let next = population(&config, 10, &mut rng)
            .into_values()
            .map(|mut g| {
                g.key += 100;
                (g.key, g)
            })
            .collect();
        set.speciate(&config, &next, 1);
        assert_eq!(set.species.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(set.species[&1].created, 0);
        assert_eq!(set.species[&1].members.len(), 10);
    }
}
