//! NEAT (NeuroEvolution of Augmenting Topologies).
//!
//! Genomes encode feed-forward networks that grow by structural mutation.
//! Configuration is read from a neat-python compatible INI file, so
//! existing configs can be reused unchanged.

pub mod activation;
pub mod config;
pub mod error;
pub mod genes;
pub mod genome;
pub mod graph;
pub mod network;
pub mod population;
pub mod reporter;
pub mod reproduction;
pub mod species;
pub mod stagnation;
mod stats;

pub use activation::{Activation, Aggregation};
pub use config::Config;
pub use error::{ConfigError, NeatError};
pub use genome::{Genome, GenomeKey, Genomes};
pub use network::FeedForwardNetwork;
pub use population::{Evolution, Population};
pub use reporter::{GenerationSummary, Reporter, StatisticsReporter, StdOutReporter};
pub use species::{Species, SpeciesKey, SpeciesSet};
