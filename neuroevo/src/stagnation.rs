use crate::config::StagnationConfig;
use crate::genome::{Genome, GenomeKey};
use crate::species::{SpeciesKey, SpeciesSet};
use std::collections::BTreeMap;

/// Scores every species and decides which ones have stopped improving.
///
/// Returns `(species, stagnant)` pairs in ascending order of species fitness.
/// The `species_elitism` best species are never reported stagnant, and
/// stagnation only kicks in while more than that many species remain.
pub fn update(
    config: &StagnationConfig,
    species_set: &mut SpeciesSet,
    population: &BTreeMap<GenomeKey, Genome>,
    generation: usize,
) -> Vec<(SpeciesKey, bool)> {
    let mut scored: Vec<(SpeciesKey, f64, usize)> = Vec::with_capacity(species_set.len());
    for (&sid, s) in species_set.species.iter_mut() {
        let previous = s.fitness_history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let fitness = config.species_fitness_func.apply(&s.fitnesses(population));
        s.fitness = Some(fitness);
        s.fitness_history.push(fitness);
        s.adjusted_fitness = None;
        if fitness > previous {
            s.last_improved = generation;
        }
        scored.push((sid, fitness, s.last_improved));
    }
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));

    let total = scored.len();
    let mut non_stagnant = total;
    let mut result = Vec::with_capacity(total);
    for (idx, (sid, _, last_improved)) in scored.into_iter().enumerate() {
        let stagnant_time = generation.saturating_sub(last_improved);
        let mut stagnant = non_stagnant > config.species_elitism && stagnant_time >= config.max_stagnation;
        if total - idx <= config.species_elitism {
            stagnant = false;
        }
        if stagnant {
            non_stagnant -= 1;
        }
        result.push((sid, stagnant));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FitnessCriterion;
    use crate::species::Species;

    fn genome(key: GenomeKey, fitness: f64) -> Genome {
        let mut g = Genome::new(key);
        g.fitness = Some(fitness);
        g
    }

    fn setup(fitnesses: &[f64]) -> (SpeciesSet, BTreeMap<GenomeKey, Genome>) {
        let mut set = SpeciesSet::new();
        let mut pop = BTreeMap::new();
        for (i, &f) in fitnesses.iter().enumerate() {
            let key = i + 1;
            pop.insert(key, genome(key, f));
            set.species.insert(key, Species::new(key, 0, genome(key, f), vec![key]));
        }
        (set, pop)
    }

    fn config(max_stagnation: usize, species_elitism: usize) -> StagnationConfig {
        StagnationConfig {
            species_fitness_func: FitnessCriterion::Max,
            max_stagnation,
            species_elitism,
        }
    }

    #[test]
    fn sorts_by_fitness_and_records_history() {
        let (mut set, pop) = setup(&[3.0, 1.0, 2.0]);
        let result = update(&config(15, 0), &mut set, &pop, 0);
        assert_eq!(result, vec![(2, false), (3, false), (1, false)]);
        assert_eq!(set.species[&1].fitness_history, vec![3.0]);
        assert_eq!(set.species[&1].fitness, Some(3.0));
    }

    #[test]
    fn flat_species_go_stagnant_except_elites() {
        let (mut set, pop) = setup(&[3.0, 1.0, 2.0]);
        let cfg = config(2, 1);
        for generation in 0..2 {
            assert!(update(&cfg, &mut set, &pop, generation).iter().all(|(_, s)| !s));
        }
        let result = update(&cfg, &mut set, &pop, 2);
        // the single best species is protected
        assert_eq!(result, vec![(2, true), (3, true), (1, false)]);
    }

    #[test]
    fn improvement_resets_the_clock() {
        let (mut set, mut pop) = setup(&[1.0]);
        let cfg = config(2, 0);
        update(&cfg, &mut set, &pop, 0);
        update(&cfg, &mut set, &pop, 1);
        pop.get_mut(&1).unwrap().fitness = Some(5.0);
        assert_eq!(update(&cfg, &mut set, &pop, 2), vec![(1, false)]);
        assert_eq!(set.species[&1].last_improved, 2);
        assert_eq!(update(&cfg, &mut set, &pop, 4), vec![(1, true)]);
    }
}
