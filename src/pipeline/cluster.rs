//! Fuzzy clustering stage.

use crate::domain::{ArtistId, MembershipVector};
use crate::util::fcm::{FcmParams, FuzzyCMeans};

use super::reduce::Embedding;

/// Fuzzy memberships for the artists of one embedding, in embedding order.
#[derive(Debug, Clone)]
pub struct FuzzyAssignment {
    pub artists: Vec<ArtistId>,
    pub memberships: Vec<MembershipVector>,
    pub iterations: usize,
    pub converged: bool,
    pub partition_coefficient: f64,
}

/// 埋め込みから各作家のメンバーシップを求めるステージ。
pub trait ClusteringEngine: Send + Sync {
    fn cluster(&self, embedding: &Embedding) -> FuzzyAssignment;
}

/// Seeded fuzzy c-means.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyCMeansEngine {
    params: FcmParams,
}

impl FuzzyCMeansEngine {
    #[must_use]
    pub fn new(params: FcmParams) -> Self {
        Self { params }
    }
}

impl ClusteringEngine for FuzzyCMeansEngine {
    fn cluster(&self, embedding: &Embedding) -> FuzzyAssignment {
        let fcm = FuzzyCMeans::new(embedding.points.view(), &self.params);
        let clusters = self.params.clusters;

        let memberships = fcm
            .memberships
            .rows()
            .into_iter()
            .map(|row| {
                let weights = row.to_vec();
                // an all-zero row cannot come out of FCM; fall back to the hard default
                MembershipVector::from_weights(&weights)
                    .unwrap_or_else(|| MembershipVector::one_hot(clusters, 0))
            })
            .collect();

        if !fcm.converged {
            tracing::warn!(
                iterations = fcm.iterations,
                artists = embedding.artists.len(),
                "fuzzy c-means stopped at the iteration cap before converging"
            );
        }

        FuzzyAssignment {
            artists: embedding.artists.clone(),
            memberships,
            iterations: fcm.iterations,
            converged: fcm.converged,
            partition_coefficient: fcm.partition_coefficient(),
        }
    }
}
