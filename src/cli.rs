//! Command-line arguments for the `exhibit-fuzzy` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{PartitionMode, PipelineConfig, PipelineVariant};
use crate::observability::LogFormat;

#[derive(Parser, Debug, Clone)]
#[command(name = "exhibit-fuzzy", author, version, about, long_about = None)]
pub struct Cli {
    /// Exhibition history CSV to read
    #[arg(long, env = "EXHIBIT_INPUT")]
    pub input: PathBuf,

    /// Membership CSV to write
    #[arg(long, env = "EXHIBIT_OUTPUT")]
    pub output: PathBuf,

    /// YAML configuration file (optional)
    #[arg(long, env = "EXHIBIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Partitioning mode: by-year or single
    #[arg(long)]
    pub mode: Option<PartitionMode>,

    /// Pipeline variant: basic or enriched
    #[arg(long)]
    pub variant: Option<PipelineVariant>,

    /// Number of clusters
    #[arg(long)]
    pub clusters: Option<usize>,

    /// Seed for cluster initialization
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log output format: json or pretty
    #[arg(long, env = "EXHIBIT_LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,
}

impl Cli {
    /// CLI で指定された値だけを `config` に上書きする。
    #[must_use]
    pub fn apply(&self, config: PipelineConfig) -> PipelineConfig {
        PipelineConfig {
            partition_mode: self.mode.unwrap_or(config.partition_mode),
            variant: self.variant.unwrap_or(config.variant),
            n_clusters: self.clusters.unwrap_or(config.n_clusters),
            seed: self.seed.unwrap_or(config.seed),
            ..config
        }
    }
}
