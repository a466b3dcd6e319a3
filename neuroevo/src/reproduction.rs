use crate::config::Config;
use crate::genome::{Genome, GenomeKey, Genomes, NodeIndexer};
use crate::reporter::{Reporter, ReporterSet};
use crate::species::SpeciesSet;
use crate::stagnation;
use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Debug)]
pub struct Reproduction {
    next_genome_key: GenomeKey,
    node_indexer: NodeIndexer,
}

impl Default for Reproduction {
    fn default() -> Self {
        Self::new()
    }
}

impl Reproduction {
    pub fn new() -> Self {
        Self {
            next_genome_key: 1,
            node_indexer: NodeIndexer::default(),
        }
    }

    fn next_key(&mut self) -> GenomeKey {
        let key = self.next_genome_key;
        self.next_genome_key += 1;
        key
    }

    pub fn create_new(&mut self, config: &Config, count: usize, rng: &mut impl Rng) -> Genomes {
        (0..count)
            .map(|_| {
                let key = self.next_key();
                let mut genome = Genome::new(key);
                genome.configure_new(&config.genome, rng);
                (key, genome)
            })
            .collect()
    }

    /// Spawn counts per species, proportional to adjusted fitness, moving
    /// each species halfway from its previous size towards its share and
    /// then normalising to the population size.
    pub fn compute_spawn(
        adjusted_fitness: &[f64],
        previous_sizes: &[usize],
        pop_size: usize,
        min_species_size: usize,
    ) -> Vec<usize> {
        let af_sum: f64 = adjusted_fitness.iter().sum();
        let amounts: Vec<f64> = adjusted_fitness
            .iter()
            .zip(previous_sizes)
            .map(|(&af, &ps)| {
                let target = if af_sum > 0.0 {
                    (af / af_sum * pop_size as f64).max(min_species_size as f64)
                } else {
                    min_species_size as f64
                };
                let d = (target - ps as f64) * 0.5;
                let c = d.round_ties_even();
                let ps = ps as f64;
                if c.abs() > 0.0 {
                    ps + c
                } else if d > 0.0 {
                    ps + 1.0
                } else if d < 0.0 {
                    ps - 1.0
                } else {
                    ps
                }
            })
            .collect();

        let total: f64 = amounts.iter().sum();
        let norm = if total > 0.0 { pop_size as f64 / total } else { 1.0 };
        amounts
            .into_iter()
            .map(|n| ((n * norm).round_ties_even().max(0.0) as usize).max(min_species_size))
            .collect()
    }

    /// An empty result means every species stagnated.
    pub fn reproduce(
        &mut self,
        config: &Config,
        species_set: &mut SpeciesSet,
        mut population: Genomes,
        generation: usize,
        reporters: &mut ReporterSet,
        rng: &mut impl Rng,
    ) -> Genomes {
        let repro = &config.reproduction;
        let mut all_fitnesses = Vec::new();
        let mut remaining = Vec::new();
        for (sid, stagnant) in stagnation::update(&config.stagnation, species_set, &population, generation) {
            let Some(species) = species_set.species.get(&sid) else {
                continue;
            };
            if stagnant {
                reporters.species_stagnant(sid, species);
            } else {
                all_fitnesses.extend(species.fitnesses(&population));
                remaining.push(sid);
            }
        }
        if remaining.is_empty() {
            species_set.species.clear();
            return Genomes::new();
        }

        let min_fitness = crate::stats::min(&all_fitnesses);
        let max_fitness = crate::stats::max(&all_fitnesses);
        let fitness_range = (max_fitness - min_fitness).max(1.0);
        let mut adjusted = Vec::with_capacity(remaining.len());
        let mut previous_sizes = Vec::with_capacity(remaining.len());
        for sid in &remaining {
            if let Some(species) = species_set.species.get_mut(sid) {
                let msf = crate::stats::mean(&species.fitnesses(&population));
                let af = (msf - min_fitness) / fitness_range;
                species.adjusted_fitness = Some(af);
                adjusted.push(af);
                previous_sizes.push(species.members.len());
            }
        }
        reporters.info(&format!("average adjusted fitness: {:.3}", crate::stats::mean(&adjusted)));

        let min_species_size = repro.min_species_size.max(repro.elitism);
        let spawn_amounts = Self::compute_spawn(&adjusted, &previous_sizes, config.neat.pop_size, min_species_size);

        let mut species = std::mem::take(&mut species_set.species);
        let mut next = Genomes::new();
        for (spawn, sid) in spawn_amounts.into_iter().zip(remaining) {
            let Some(mut s) = species.remove(&sid) else {
                continue;
            };
            let mut spawn = spawn.max(repro.elitism);

            let mut old_members: Vec<Genome> = std::mem::take(&mut s.members)
                .iter()
                .filter_map(|k| population.remove(k))
                .collect();
            species_set.species.insert(sid, s);
            old_members.sort_by(|a, b| {
                let fa = a.fitness.unwrap_or(f64::MIN);
                let fb = b.fitness.unwrap_or(f64::MIN);
                fb.total_cmp(&fa)
            });

            for elite in old_members.iter().take(repro.elitism) {
                next.insert(elite.key, elite.clone());
                spawn = spawn.saturating_sub(1);
            }
            if spawn == 0 {
                continue;
            }

            let cutoff = ((repro.survival_threshold * old_members.len() as f64).ceil() as usize).max(2);
            old_members.truncate(cutoff);
            if old_members.is_empty() {
                continue;
            }
            for _ in 0..spawn {
                let (Some(p1), Some(p2)) = (old_members.choose(rng), old_members.choose(rng)) else {
                    break;
                };
                let key = self.next_key();
                let mut child = Genome::new(key);
                child.configure_crossover(p1, p2, rng);
                child.mutate(&config.genome, &mut self.node_indexer, rng);
                next.insert(key, child);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::SAMPLE;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn spawn_moves_halfway_and_normalises() {
        // equal fitness and equal sizes keep sizes
        assert_eq!(Reproduction::compute_spawn(&[0.5, 0.5], &[10, 10], 20, 2), vec![10, 10]);
        // a species with all the fitness grows, the other shrinks
        assert_eq!(Reproduction::compute_spawn(&[1.0, 0.0], &[10, 10], 20, 2), vec![14, 6]);
        // no fitness at all: everyone drifts towards the minimum
        assert_eq!(Reproduction::compute_spawn(&[0.0, 0.0], &[4, 4], 8, 2), vec![4, 4]);
    }

    #[test]
    fn reproduce_keeps_elites_and_refills_population() {
        let config = Config::parse(SAMPLE).unwrap();
        let mut rng = SmallRng::seed_from_u64(21);
        let mut repro = Reproduction::new();
        let mut population = repro.create_new(&config, config.neat.pop_size, &mut rng);
        for (k, g) in population.iter_mut() {
            g.fitness = Some(*k as f64);
        }
        let mut species = SpeciesSet::new();
        species.speciate(&config, &population, 0);
        let best = *population.keys().max().unwrap();

        let mut reporters = ReporterSet::default();
        let next = repro.reproduce(&config, &mut species, population, 0, &mut reporters, &mut rng);

        assert!(next.contains_key(&best));
        assert!(next.len() >= config.neat.pop_size - species.len());
        assert!(next.len() <= config.neat.pop_size + species.len() * config.reproduction.elitism);
        for (key, g) in &next {
            assert_eq!(*key, g.key);
            if *key > config.neat.pop_size {
                assert_eq!(g.fitness, None);
            }
        }
    }

    #[test]
    fn all_stagnant_means_extinction() {
        let mut config = Config::parse(SAMPLE).unwrap();
        config.stagnation.max_stagnation = 0;
        config.stagnation.species_elitism = 0;
        let mut rng = SmallRng::seed_from_u64(22);
        let mut repro = Reproduction::new();
        let mut population = repro.create_new(&config, 10, &mut rng);
        for g in population.values_mut() {
            g.fitness = Some(1.0);
        }
        let mut species = SpeciesSet::new();
        species.speciate(&config, &population, 0);

        let mut reporters = ReporterSet::default();
        let next = repro.reproduce(&config, &mut species, population, 0, &mut reporters, &mut rng);
        assert!(next.is_empty());
        assert!(species.is_empty());
    }
}
