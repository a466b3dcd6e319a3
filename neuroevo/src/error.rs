use crate::genome::GenomeKey;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("missing section [{0}]")]
    MissingSection(&'static str),
    #[error("[{section}] missing required key `{key}`")]
    MissingKey { section: &'static str, key: String },
    #[error("[{section}] {key} = {value:?}: {reason}")]
    InvalidValue {
        section: &'static str,
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum NeatError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("complete extinction: every species stagnated")]
    CompleteExtinction,
    #[error("network expects {expected} inputs, got {actual}")]
    InputMismatch { expected: usize, actual: usize },
    #[error("genome {0} was not assigned a fitness")]
    MissingFitness(GenomeKey),
}
