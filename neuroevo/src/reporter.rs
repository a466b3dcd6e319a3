//! Hooks into the evolution loop.

use crate::config::Config;
use crate::genome::{Genome, Genomes};
use crate::species::{Species, SpeciesKey, SpeciesSet};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

/// Every hook defaults to doing nothing.
pub trait Reporter {
    fn start_generation(&mut self, _generation: usize) {}
    fn end_generation(&mut self, _config: &Config, _population: &Genomes, _species: &SpeciesSet) {}
    fn post_evaluate(&mut self, _config: &Config, _population: &Genomes, _species: &SpeciesSet, _best: &Genome) {}
    fn complete_extinction(&mut self) {}
    fn found_solution(&mut self, _config: &Config, _generation: usize, _best: &Genome) {}
    fn species_stagnant(&mut self, _key: SpeciesKey, _species: &Species) {}
    fn info(&mut self, _message: &str) {}
}

/// Lets the caller keep a handle on a reporter (e.g. statistics) after
/// handing it to a population.
impl<R: Reporter> Reporter for Rc<RefCell<R>> {
    fn start_generation(&mut self, generation: usize) {
        self.borrow_mut().start_generation(generation);
    }
    fn end_generation(&mut self, config: &Config, population: &Genomes, species: &SpeciesSet) {
        self.borrow_mut().end_generation(config, population, species);
    }
    fn post_evaluate(&mut self, config: &Config, population: &Genomes, species: &SpeciesSet, best: &Genome) {
        self.borrow_mut().post_evaluate(config, population, species, best);
    }
    fn complete_extinction(&mut self) {
        self.borrow_mut().complete_extinction();
    }
    fn found_solution(&mut self, config: &Config, generation: usize, best: &Genome) {
        self.borrow_mut().found_solution(config, generation, best);
    }
    fn species_stagnant(&mut self, key: SpeciesKey, species: &Species) {
        self.borrow_mut().species_stagnant(key, species);
    }
    fn info(&mut self, message: &str) {
        self.borrow_mut().info(message);
    }
}

#[derive(Default)]
pub struct ReporterSet {
    reporters: Vec<Box<dyn Reporter>>,
}

impl ReporterSet {
    pub fn add(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.push(reporter);
    }
}

impl Reporter for ReporterSet {
    fn start_generation(&mut self, generation: usize) {
        for r in &mut self.reporters {
            r.start_generation(generation);
        }
    }
    fn end_generation(&mut self, config: &Config, population: &Genomes, species: &SpeciesSet) {
        for r in &mut self.reporters {
            r.end_generation(config, population, species);
        }
    }
    fn post_evaluate(&mut self, config: &Config, population: &Genomes, species: &SpeciesSet, best: &Genome) {
        for r in &mut self.reporters {
            r.post_evaluate(config, population, species, best);
        }
    }
    fn complete_extinction(&mut self) {
        for r in &mut self.reporters {
            r.complete_extinction();
        }
    }
    fn found_solution(&mut self, config: &Config, generation: usize, best: &Genome) {
        for r in &mut self.reporters {
            r.found_solution(config, generation, best);
        }
    }
    fn species_stagnant(&mut self, key: SpeciesKey, species: &Species) {
        for r in &mut self.reporters {
            r.species_stagnant(key, species);
        }
    }
    fn info(&mut self, message: &str) {
        for r in &mut self.reporters {
            r.info(message);
        }
    }
}

fn fitnesses(population: &Genomes) -> Vec<f64> {
    population.values().filter_map(|g| g.fitness).collect()
}

/// Logs per-generation progress through `tracing`.
pub struct StdOutReporter {
    show_species_detail: bool,
    generation: usize,
    started: Option<Instant>,
    generation_times: Vec<f64>,
}

impl StdOutReporter {
    pub fn new(show_species_detail: bool) -> Self {
        Self {
            show_species_detail,
            generation: 0,
            started: None,
            generation_times: Vec::new(),
        }
    }
}

impl Reporter for StdOutReporter {
    fn start_generation(&mut self, generation: usize) {
        self.generation = generation;
        self.started = Some(Instant::now());
        tracing::info!(generation, "running generation");
    }

    fn end_generation(&mut self, _config: &Config, population: &Genomes, species: &SpeciesSet) {
        tracing::info!(
            generation = self.generation,
            "population of {} members in {} species",
            population.len(),
            species.len()
        );
        if self.show_species_detail {
            for s in species.species.values() {
                tracing::info!(
                    species = s.key,
                    age = self.generation.saturating_sub(s.created),
                    size = s.members.len(),
                    fitness = ?s.fitness,
                    adjusted = ?s.adjusted_fitness,
                    stagnation = self.generation.saturating_sub(s.last_improved),
                    "species"
                );
            }
        }
        if let Some(started) = self.started.take() {
            let elapsed = started.elapsed().as_secs_f64();
            self.generation_times.push(elapsed);
            if self.generation_times.len() > 10 {
                self.generation_times.remove(0);
            }
            let average = crate::stats::mean(&self.generation_times);
            tracing::info!("generation time: {elapsed:.3} sec ({average:.3} average)");
        }
    }

    fn post_evaluate(&mut self, config: &Config, population: &Genomes, species: &SpeciesSet, best: &Genome) {
        let values = fitnesses(population);
        let best_species = species.species_of(best.key);
        tracing::info!(
            mean = crate::stats::mean(&values),
            stdev = crate::stats::stdev(&values),
            "population fitness"
        );
        tracing::info!(
            fitness = best.fitness.unwrap_or(0.0),
            size = ?best.size(),
            species = ?best_species,
            genome = best.key,
            threshold = config.neat.fitness_threshold,
            "best genome"
        );
    }

    fn complete_extinction(&mut self) {
        tracing::warn!("all species extinct");
    }

    fn found_solution(&mut self, _config: &Config, generation: usize, best: &Genome) {
        tracing::info!(
            generation,
            size = ?best.size(),
            "best individual meets the fitness threshold"
        );
    }

    fn species_stagnant(&mut self, key: SpeciesKey, species: &Species) {
        tracing::info!(species = key, members = species.members.len(), "removing stagnant species");
    }

    fn info(&mut self, message: &str) {
        tracing::info!("{message}");
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub stdev_fitness: f64,
    pub species_sizes: Vec<usize>,
    /// Mean member fitness of every species after evaluation.
    pub species_fitness: BTreeMap<SpeciesKey, f64>,
    /// `(nodes, enabled connections)` of the generation's best genome.
    pub best_size: (usize, usize),
}

/// Keeps the most fit genome and a fitness summary of every generation.
#[derive(Default)]
pub struct StatisticsReporter {
    generation: usize,
    pub most_fit_genomes: Vec<Genome>,
    pub generations: Vec<GenerationSummary>,
}

impl StatisticsReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best_genome(&self) -> Option<&Genome> {
        self.most_fit_genomes
            .iter()
            .max_by(|a, b| a.fitness.unwrap_or(f64::MIN).total_cmp(&b.fitness.unwrap_or(f64::MIN)))
    }

    pub fn best_fitness_history(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.best_fitness).collect()
    }

    /// Mean fitness of one species per recorded generation, `None` where
    /// it did not exist.
    pub fn species_fitness(&self, key: SpeciesKey) -> Vec<Option<f64>> {
        self.generations
            .iter()
            .map(|g| g.species_fitness.get(&key).copied())
            .collect()
    }
}

impl Reporter for StatisticsReporter {
    fn start_generation(&mut self, generation: usize) {
        self.generation = generation;
    }

    fn post_evaluate(&mut self, _config: &Config, population: &Genomes, species: &SpeciesSet, best: &Genome) {
        let values = fitnesses(population);
        self.most_fit_genomes.push(best.clone());
        self.generations.push(GenerationSummary {
            generation: self.generation,
            best_fitness: best.fitness.unwrap_or(0.0),
            mean_fitness: crate::stats::mean(&values),
            stdev_fitness: crate::stats::stdev(&values),
            species_sizes: species.species.values().map(|s| s.members.len()).collect(),
            species_fitness: species
                .species
                .iter()
                .map(|(&key, s)| (key, crate::stats::mean(&s.fitnesses(population))))
                .collect(),
            best_size: best.size(),
        });
    }
}
