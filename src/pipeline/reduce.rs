//! Dimensionality reduction of the co-occurrence adjacency matrix.

use ndarray::Array2;

use crate::domain::ArtistId;
use crate::util::pca;

use super::projection::CoOccurrenceGraph;

/// Low-dimensional artist coordinates. Row `i` belongs to `artists[i]`.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub artists: Vec<ArtistId>,
    pub points: Array2<f64>,
    pub explained_variance: Vec<f64>,
}

impl Embedding {
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.points.ncols()
    }
}

/// 共起グラフを低次元の埋め込みに変換するステージ。
pub trait DimensionReducer: Send + Sync {
    fn reduce(&self, graph: &CoOccurrenceGraph) -> Embedding;
}

/// PCA over adjacency rows, keeping `min(max_components, artists)` components.
#[derive(Debug, Clone, Copy)]
pub struct PcaReducer {
    max_components: usize,
}

impl PcaReducer {
    #[must_use]
    pub fn new(max_components: usize) -> Self {
        Self { max_components }
    }
}

impl DimensionReducer for PcaReducer {
    fn reduce(&self, graph: &CoOccurrenceGraph) -> Embedding {
        let adjacency = graph.adjacency_matrix();
        let components = pca::fit_transform(adjacency.view(), self.max_components);
        Embedding {
            artists: graph.artists().to_vec(),
            points: components.embedding,
            explained_variance: components.explained_variance,
        }
    }
}
