use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Faults outside the clustering core: configuration, input read, output write.
///
/// Data-quality problems and undersized partitions are not errors; they are
/// recorded in the run report and skipped.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input is missing required column {0}")]
    MissingColumn(&'static str),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to serialize run report: {0}")]
    Report(#[from] serde_json::Error),
}
