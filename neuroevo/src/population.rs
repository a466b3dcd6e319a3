use crate::config::Config;
use crate::error::NeatError;
use crate::genome::{Genome, GenomeKey, Genomes};
use crate::reporter::{Reporter, ReporterSet};
use crate::reproduction::Reproduction;
use crate::species::SpeciesSet;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Outcome of closing one generation.
#[derive(Clone, Debug)]
pub enum Evolution {
    Continue,
    Solved(Genome),
}

/// Driven either by [`Population::run`] with a fitness callback, or stepwise:
/// `start_generation`, assign every genome a fitness, then `evolve`.
pub struct Population {
    config: Config,
    genomes: Genomes,
    species: SpeciesSet,
    reproduction: Reproduction,
    reporters: ReporterSet,
    generation: usize,
    best_genome: Option<Genome>,
    rng: SmallRng,
}

impl Population {
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, SmallRng::from_entropy())
    }

    pub fn with_seed(config: Config, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: Config, mut rng: SmallRng) -> Self {
        let mut reproduction = Reproduction::new();
        let genomes = reproduction.create_new(&config, config.neat.pop_size, &mut rng);
        let mut species = SpeciesSet::new();
        species.speciate(&config, &genomes, 0);
        Self {
            config,
            genomes,
            species,
            reproduction,
            reporters: ReporterSet::default(),
            generation: 0,
            best_genome: None,
            rng,
        }
    }

    pub fn add_reporter(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.add(reporter);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn genomes(&self) -> &Genomes {
        &self.genomes
    }

    pub fn genomes_mut(&mut self) -> impl Iterator<Item = &mut Genome> {
        self.genomes.values_mut()
    }

    pub fn genome_mut(&mut self, key: GenomeKey) -> Option<&mut Genome> {
        self.genomes.get_mut(&key)
    }

    pub fn species(&self) -> &SpeciesSet {
        &self.species
    }

    pub fn best_genome(&self) -> Option<&Genome> {
        self.best_genome.as_ref()
    }

    pub fn start_generation(&mut self) {
        self.reporters.start_generation(self.generation);
    }

    /// Closes the current generation once every genome carries a fitness:
    /// checks the termination criterion, then breeds and speciates the next
    /// generation.
    pub fn evolve(&mut self) -> Result<Evolution, NeatError> {
        let mut best: Option<&Genome> = None;
        for g in self.genomes.values() {
            let fitness = g.fitness.ok_or(NeatError::MissingFitness(g.key))?;
            if best.is_none_or(|b| fitness > b.fitness.unwrap_or(f64::MIN)) {
                best = Some(g);
            }
        }
        let Some(best) = best.cloned() else {
            return Err(NeatError::CompleteExtinction);
        };

        self.reporters
            .post_evaluate(&self.config, &self.genomes, &self.species, &best);
        if self
            .best_genome
            .as_ref()
            .is_none_or(|b| best.fitness > b.fitness)
        {
            self.best_genome = Some(best.clone());
        }

        if !self.config.neat.no_fitness_termination {
            let values: Vec<f64> = self.genomes.values().filter_map(|g| g.fitness).collect();
            let fv = self.config.neat.fitness_criterion.apply(&values);
            if fv >= self.config.neat.fitness_threshold {
                self.reporters.found_solution(&self.config, self.generation, &best);
                return Ok(Evolution::Solved(best));
            }
        }

        let current = std::mem::take(&mut self.genomes);
        self.genomes = self.reproduction.reproduce(
            &self.config,
            &mut self.species,
            current,
            self.generation,
            &mut self.reporters,
            &mut self.rng,
        );

        if self.species.is_empty() {
            self.reporters.complete_extinction();
            if !self.config.neat.reset_on_extinction {
                return Err(NeatError::CompleteExtinction);
            }
            self.genomes = self
                .reproduction
                .create_new(&self.config, self.config.neat.pop_size, &mut self.rng);
        }

        self.species.speciate(&self.config, &self.genomes, self.generation);
        self.reporters.end_generation(&self.config, &self.genomes, &self.species);
        self.generation += 1;
        Ok(Evolution::Continue)
    }

    /// Up to `generations` generations, forever with `None`.
    pub fn run<F>(&mut self, mut evaluate: F, generations: Option<usize>) -> Result<Option<Genome>, NeatError>
    where
        F: FnMut(&mut [&mut Genome], &Config),
    {
        let mut k = 0;
        while generations.is_none_or(|n| k < n) {
            k += 1;
            self.start_generation();
            let mut batch: Vec<&mut Genome> = self.genomes.values_mut().collect();
            evaluate(&mut batch, &self.config);
            if let Evolution::Solved(_) = self.evolve()? {
                break;
            }
        }
        if self.config.neat.no_fitness_termination {
            if let Some(best) = &self.best_genome {
                self.reporters.found_solution(&self.config, self.generation, best);
            }
        }
        Ok(self.best_genome.clone())
    }
}
