//! Per-partition clustering pipeline.
//!
//! Partitioner → {Builder → Projection → Reducer → Clustering → Reconciler} → Aggregator.
//! Partitions share nothing but the immutable [`crate::config::PipelineConfig`].

pub mod association;
pub mod cluster;
pub mod orchestrator;
pub mod partition;
pub mod projection;
pub mod reconcile;
pub mod reduce;

pub use association::AssociationGraph;
pub use cluster::{ClusteringEngine, FuzzyAssignment, FuzzyCMeansEngine};
pub use orchestrator::{
    PartitionReport, PartitionStatus, Pipeline, RunOutcome, RunReport, SkipReason,
};
pub use partition::{Partition, PartitionSet, partition_records};
pub use projection::{CoOccurrenceGraph, ProjectionOutcome, project};
pub use reduce::{DimensionReducer, Embedding, PcaReducer};
