//! パイプライン全体の実行とパーティション結果の集約。

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PipelineConfig};
use crate::domain::{ExhibitionRecord, MembershipRecord, PartitionKey};

use super::association::AssociationGraph;
use super::cluster::{ClusteringEngine, FuzzyCMeansEngine};
use super::partition::{Partition, partition_records};
use super::projection::{ProjectionOutcome, project};
use super::reconcile::{reconcile, split_artists};
use super::reduce::{DimensionReducer, PcaReducer};

/// Why a partition, or its fuzzy step, produced no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    TooFewArtists { found: usize, required: usize },
    TooFewMultiExhibitionArtists { found: usize, required: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewArtists { found, required } => {
                write!(f, "too few artists ({found} < {required})")
            }
            Self::TooFewMultiExhibitionArtists { found, required } => {
                write!(f, "too few multi-exhibition artists ({found} < {required})")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PartitionStatus {
    Processed,
    /// Single-exhibition rows were emitted; the fuzzy step was skipped.
    FuzzySkipped { cause: SkipReason },
    Skipped { cause: SkipReason },
}

/// Diagnostics for the fuzzy step of one partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzySummary {
    pub dimensions: usize,
    /// Variance captured by each principal component, descending.
    pub explained_variance: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
    pub partition_coefficient: f64,
    pub collapsed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionReport {
    pub key: PartitionKey,
    pub records: usize,
    pub artists: usize,
    pub multi_exhibition_artists: usize,
    pub single_exhibition_artists: usize,
    pub rows: usize,
    pub status: PartitionStatus,
    pub fuzzy: Option<FuzzySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub input_records: usize,
    pub dropped_records: usize,
    pub output_rows: usize,
    pub partitions: Vec<PartitionReport>,
}

/// Result of [`Pipeline::run`].
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed {
        records: Vec<MembershipRecord>,
        report: RunReport,
    },
    /// Every partition was skipped; nothing should be written.
    NoDataProcessed { report: RunReport },
}

impl RunOutcome {
    #[must_use]
    pub fn report(&self) -> &RunReport {
        match self {
            Self::Completed { report, .. } | Self::NoDataProcessed { report } => report,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[MembershipRecord] {
        match self {
            Self::Completed { records, .. } => records,
            Self::NoDataProcessed { .. } => &[],
        }
    }
}

/// クラスタリングパイプライン。
///
/// 設定と各ステージは不変で共有され、パーティションごとに独立して処理される。
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    reducer: Arc<dyn DimensionReducer>,
    engine: Arc<dyn ClusteringEngine>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// PCA と fuzzy c-means を使う既定の構成。
    ///
    /// # Errors
    /// 設定が [`PipelineConfig::validate`] を通らない場合は [`ConfigError`] を返す。
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        let reducer = Arc::new(PcaReducer::new(config.max_components));
        let engine = Arc::new(FuzzyCMeansEngine::new(config.fcm_params()));
        Self::with_stages(config, reducer, engine)
    }

    /// Builds a pipeline around caller-supplied stages.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when `config` is out of range.
    pub fn with_stages(
        config: PipelineConfig,
        reducer: Arc<dyn DimensionReducer>,
        engine: Arc<dyn ClusteringEngine>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            reducer,
            engine,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 全レコードを分割し、各パーティションを並列に処理して結果を集約する。
    #[must_use]
    pub fn run(&self, records: Vec<ExhibitionRecord>) -> RunOutcome {
        let input_records = records.len();
        let set = partition_records(records, self.config.partition_mode);
        let dropped_records = set.dropped;

        info!(
            input_records,
            dropped_records,
            partitions = set.partitions.len(),
            mode = %self.config.partition_mode,
            variant = %self.config.variant,
            "starting membership run"
        );

        let mut results: Vec<(PartitionReport, Vec<MembershipRecord>)> = set
            .partitions
            .into_par_iter()
            .map(|partition| self.process_partition(&partition))
            .collect();
        results.sort_by_key(|(report, _)| report.key);

        let mut partitions = Vec::with_capacity(results.len());
        let mut output = Vec::new();
        for (report, mut rows) in results {
            partitions.push(report);
            output.append(&mut rows);
        }

        let report = RunReport {
            input_records,
            dropped_records,
            output_rows: output.len(),
            partitions,
        };

        if output.is_empty() {
            warn!(
                partitions = report.partitions.len(),
                "no data processed: every partition was skipped"
            );
            return RunOutcome::NoDataProcessed { report };
        }

        info!(
            output_rows = report.output_rows,
            partitions = report.partitions.len(),
            "membership run completed"
        );
        RunOutcome::Completed {
            records: output,
            report,
        }
    }

    /// 1パーティションを処理する。他のパーティションとは状態を共有しない。
    #[must_use]
    pub fn process_partition(
        &self,
        partition: &Partition,
    ) -> (PartitionReport, Vec<MembershipRecord>) {
        let config = &self.config;
        let key = partition.key;
        let graph = AssociationGraph::build(partition, config.keep_blank_artists);
        let split = split_artists(&graph);

        let mut report = PartitionReport {
            key,
            records: partition.len(),
            artists: graph.artist_count(),
            multi_exhibition_artists: split.multi_exhibition.len(),
            single_exhibition_artists: split.single_exhibition.len(),
            rows: 0,
            status: PartitionStatus::Processed,
            fuzzy: None,
        };

        if graph.artist_count() < config.min_artists_per_partition {
            let cause = SkipReason::TooFewArtists {
                found: graph.artist_count(),
                required: config.min_artists_per_partition,
            };
            info!(partition = %key, %cause, "skipping partition");
            report.status = PartitionStatus::Skipped { cause };
            return (report, Vec::new());
        }

        let fuzzy = match project(&graph, &split.multi_exhibition, config.n_clusters) {
            ProjectionOutcome::Projected(co_occurrence) => {
                let embedding = self.reducer.reduce(&co_occurrence);
                debug!(
                    partition = %key,
                    nodes = co_occurrence.node_count(),
                    edges = co_occurrence.edge_count(),
                    dimensions = embedding.dimensions(),
                    "projected co-occurrence graph"
                );
                let assignment = self.engine.cluster(&embedding);
                report.fuzzy = Some(FuzzySummary {
                    dimensions: embedding.dimensions(),
                    explained_variance: embedding.explained_variance.clone(),
                    iterations: assignment.iterations,
                    converged: assignment.converged,
                    partition_coefficient: assignment.partition_coefficient,
                    collapsed: 0,
                });
                Some(assignment)
            }
            ProjectionOutcome::Insufficient { nodes, required } => {
                let cause = SkipReason::TooFewMultiExhibitionArtists {
                    found: nodes,
                    required,
                };
                info!(partition = %key, %cause, "skipping fuzzy step");
                report.status = PartitionStatus::FuzzySkipped { cause };
                None
            }
        };

        let reconciled = reconcile(
            key,
            &graph,
            &split,
            fuzzy.as_ref(),
            config.n_clusters,
            config.collapse_threshold(),
        );

        if let Some(summary) = report.fuzzy.as_mut() {
            summary.collapsed = reconciled.collapsed;
        }
        report.rows = reconciled.records.len();

        info!(
            partition = %key,
            artists = report.artists,
            multi_exhibition = report.multi_exhibition_artists,
            single_exhibition = report.single_exhibition_artists,
            rows = report.rows,
            collapsed = reconciled.collapsed,
            "partition processed"
        );

        (report, reconciled.records)
    }
}
