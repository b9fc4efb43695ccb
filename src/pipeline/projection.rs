//! Weighted projection of the bipartite graph onto artists.

use std::collections::BTreeMap;

use ndarray::Array2;
use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::FxHashMap;

use crate::domain::ArtistId;

use super::association::AssociationGraph;

/// Artist-only co-occurrence graph. Edge weight = number of shared exhibitions.
///
/// Node `i` of the graph is `artists()[i]`; symmetric, no self-loops.
#[derive(Debug, Clone)]
pub struct CoOccurrenceGraph {
    artists: Vec<ArtistId>,
    graph: UnGraph<ArtistId, u32>,
}

impl CoOccurrenceGraph {
    #[must_use]
    pub fn artists(&self) -> &[ArtistId] {
        &self.artists
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Dense adjacency matrix in [`Self::artists`] order.
    #[must_use]
    pub fn adjacency_matrix(&self) -> Array2<f64> {
        let n = self.graph.node_count();
        let mut matrix = Array2::zeros((n, n));
        for edge in self.graph.raw_edges() {
            let (a, b) = (edge.source().index(), edge.target().index());
            let weight = f64::from(edge.weight);
            matrix[[a, b]] = weight;
            matrix[[b, a]] = weight;
        }
        matrix
    }
}

/// Result of [`project`].
#[derive(Debug, Clone)]
pub enum ProjectionOutcome {
    Projected(CoOccurrenceGraph),
    /// Fewer artists than clusters; clustering is undefined.
    Insufficient { nodes: usize, required: usize },
}

/// 二部グラフを `artists` に制限して作家間の共起グラフへ射影する。
///
/// ノード数が `n_clusters` 未満の場合は [`ProjectionOutcome::Insufficient`] を返す。
#[must_use]
pub fn project(
    association: &AssociationGraph,
    artists: &[ArtistId],
    n_clusters: usize,
) -> ProjectionOutcome {
    if artists.len() < n_clusters || artists.is_empty() {
        return ProjectionOutcome::Insufficient {
            nodes: artists.len(),
            required: n_clusters.max(1),
        };
    }

    let position: FxHashMap<&ArtistId, usize> = artists
        .iter()
        .enumerate()
        .map(|(index, artist)| (artist, index))
        .collect();

    let mut shared: BTreeMap<(usize, usize), u32> = BTreeMap::new();
    for roster in association.exhibition_rosters() {
        let mut members: Vec<usize> = roster
            .into_iter()
            .filter_map(|artist| position.get(artist).copied())
            .collect();
        members.sort_unstable();
        members.dedup();
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                *shared.entry((a, b)).or_insert(0) += 1;
            }
        }
    }

    let mut graph = UnGraph::with_capacity(artists.len(), shared.len());
    for artist in artists {
        graph.add_node(artist.clone());
    }
    for ((a, b), weight) in shared {
        graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), weight);
    }

    ProjectionOutcome::Projected(CoOccurrenceGraph {
        artists: artists.to_vec(),
        graph,
    })
}
