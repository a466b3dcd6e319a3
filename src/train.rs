use crate::assets::Assets;
use crate::round::Round;
use crate::world::World;
use anyhow::{Context, Result, bail};
use neuroevo::{
    Config, Evolution, FeedForwardNetwork, GenerationSummary, Population, StatisticsReporter,
    StdOutReporter,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::rc::Rc;

pub const DEFAULT_GENERATIONS: usize = 50;
/// Bird height plus its distances to both edges of the gap.
pub const NUM_INPUTS: usize = 3;

#[derive(Clone, Debug)]
pub struct TrainOptions {
    pub generations: usize,
    pub max_score: Option<u32>,
    pub seed: Option<u64>,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            generations: DEFAULT_GENERATIONS,
            max_score: None,
            seed: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    /// A round ended and the next generation is flying.
    NextGeneration,
    Finished,
}

#[derive(Debug, Serialize)]
pub struct TrainingSummary {
    pub generations: usize,
    pub solved: bool,
    pub best_fitness: Option<f64>,
    pub best_size: Option<(usize, usize)>,
    /// Pipes cleared in each generation's round.
    pub scores: Vec<u32>,
    pub history: Vec<GenerationSummary>,
}

/// Runs one round per generation and feeds the fitness back into the
/// population.
pub struct Trainer {
    population: Population,
    stats: Rc<RefCell<StatisticsReporter>>,
    round: Round,
    options: TrainOptions,
    rng: SmallRng,
    scores: Vec<u32>,
    solved: bool,
    finished: bool,
}

impl Trainer {
    pub fn new(config: Config, options: TrainOptions, assets: &Assets) -> Result<Self> {
        if config.genome.num_inputs != NUM_INPUTS || config.genome.num_outputs == 0 {
            bail!(
                "network must take {NUM_INPUTS} inputs and give at least one output, config has {} and {}",
                config.genome.num_inputs,
                config.genome.num_outputs
            );
        }
        let mut rng = match options.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let mut population = Population::with_seed(config, rng.r#gen());
        let stats = Rc::new(RefCell::new(StatisticsReporter::new()));
        population.add_reporter(Box::new(StdOutReporter::new(true)));
        population.add_reporter(Box::new(stats.clone()));
        population.start_generation();

        let round = new_round(&population, &mut rng, options.max_score, assets);
        let finished = options.generations == 0;
        Ok(Self {
            population,
            stats,
            round,
            options,
            rng,
            scores: Vec::new(),
            solved: false,
            finished,
        })
    }

    pub fn from_file(path: &Path, options: TrainOptions, assets: &Assets) -> Result<Self> {
        let config = Config::from_file(path)
            .with_context(|| format!("failed to load NEAT config {}", path.display()))?;
        Self::new(config, options, assets)
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn round_mut(&mut self) -> &mut Round {
        &mut self.round
    }

    /// 1-based, as shown on screen.
    pub fn generation(&self) -> usize {
        self.population.generation() + 1
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    /// One simulation tick. When the round ends the generation is scored and
    /// bred, and the next round starts.
    pub fn tick(&mut self, assets: &Assets) -> Result<Status> {
        if self.finished {
            return Ok(Status::Finished);
        }
        if self.round.step(assets) {
            return Ok(Status::Running);
        }
        self.finish_round(assets)
    }

    fn finish_round(&mut self, assets: &Assets) -> Result<Status> {
        let (score, ticks) = (self.round.score(), self.round.ticks());
        self.scores.push(score);
        tracing::info!(generation = self.generation(), score, ticks, "round over");

        for (key, fitness) in self.round.take_fitness() {
            if let Some(genome) = self.population.genome_mut(key) {
                genome.fitness = Some(fitness);
            }
        }

        match self.population.evolve()? {
            Evolution::Solved(best) => {
                tracing::info!(key = best.key, fitness = ?best.fitness, "fitness threshold reached");
                self.solved = true;
                self.finished = true;
            }
            Evolution::Continue if self.scores.len() >= self.options.generations => {
                self.finished = true;
            }
            Evolution::Continue => {
                self.population.start_generation();
                self.round = new_round(&self.population, &mut self.rng, self.options.max_score, assets);
                return Ok(Status::NextGeneration);
            }
        }
        Ok(Status::Finished)
    }

    pub fn run_headless(&mut self, assets: &Assets) -> Result<TrainingSummary> {
        while self.tick(assets)? != Status::Finished {}
        Ok(self.summary())
    }

    pub fn summary(&self) -> TrainingSummary {
        let stats = self.stats.borrow();
        let best = self.population.best_genome();
        TrainingSummary {
            generations: self.scores.len(),
            solved: self.solved,
            best_fitness: best.and_then(|g| g.fitness),
            best_size: best.map(|g| g.size()),
            scores: self.scores.clone(),
            history: stats.generations.clone(),
        }
    }
}

fn new_round(population: &Population, rng: &mut SmallRng, max_score: Option<u32>, assets: &Assets) -> Round {
    let genome_config = &population.config().genome;
    let brains = population
        .genomes()
        .values()
        .map(|g| (g.key, FeedForwardNetwork::create(g, genome_config)));
    let world = World::new(SmallRng::seed_from_u64(rng.r#gen()), assets);
    Round::new(brains, world, max_score)
}

pub fn write_report(path: &Path, summary: &TrainingSummary) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote training report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = include_str!("../config.txt");

    fn options(generations: usize) -> TrainOptions {
        TrainOptions {
            generations,
            max_score: Some(3),
            seed: Some(42),
        }
    }

    #[test]
    fn shipped_config_fits_the_game() {
        let config = Config::parse(CONFIG).unwrap();
        assert_eq!(config.genome.num_inputs, NUM_INPUTS);
        assert_eq!(config.neat.pop_size, 50);
    }

    #[test]
    fn wrong_input_count_is_rejected() {
        let assets = Assets::builtin();
        let text = CONFIG.replace("num_inputs              = 3", "num_inputs              = 2");
        let config = Config::parse(&text).unwrap();
        assert_eq!(config.genome.num_inputs, 2);
        assert!(Trainer::new(config, options(1), &assets).is_err());
    }

    #[test]
    fn every_genome_flies_each_generation() {
        let assets = Assets::builtin();
        let config = Config::parse(CONFIG).unwrap();
        let mut trainer = Trainer::new(config, options(2), &assets).unwrap();
        assert_eq!(trainer.generation(), 1);
        assert_eq!(trainer.round().alive(), 50);

        let mut status = Status::Running;
        while status == Status::Running {
            status = trainer.tick(&assets).unwrap();
        }
        assert!(matches!(status, Status::NextGeneration | Status::Finished));
        assert_eq!(trainer.scores().len(), 1);
        let stats = trainer.stats.borrow();
        assert_eq!(stats.generations.len(), 1);
        assert!(stats.generations[0].best_fitness > 0.0);
    }

    #[test]
    fn headless_run_stops_at_the_generation_limit() {
        let assets = Assets::builtin();
        let config = Config::parse(CONFIG).unwrap();
        let mut trainer = Trainer::new(config, options(3), &assets).unwrap();
        let summary = trainer.run_headless(&assets).unwrap();
        assert!(trainer.is_finished());
        assert_eq!(summary.generations, 3);
        assert_eq!(summary.scores.len(), summary.generations);
        assert_eq!(summary.history.len(), summary.generations);
        assert!(summary.scores.iter().all(|&s| s <= 3));
        assert!(summary.best_fitness.is_some());
        assert_eq!(trainer.tick(&assets).unwrap(), Status::Finished);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["scores"].as_array().map(Vec::len), Some(summary.generations));
    }

    #[test]
    fn zero_generations_flies_nothing() {
        let assets = Assets::builtin();
        let config = Config::parse(CONFIG).unwrap();
        let mut trainer = Trainer::new(config, options(0), &assets).unwrap();
        assert!(trainer.is_finished());
        assert_eq!(trainer.tick(&assets).unwrap(), Status::Finished);
        assert_eq!(trainer.round().ticks(), 0);

        let summary = trainer.run_headless(&assets).unwrap();
        assert_eq!(summary.generations, 0);
        assert!(!summary.solved);
        assert_eq!(summary.best_fitness, None);
        assert!(summary.history.is_empty());
    }
}
