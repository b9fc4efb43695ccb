//! Artist ↔ exhibition 二部グラフの構築。

use std::collections::BTreeSet;

use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::FxHashMap;

use crate::domain::ArtistId;

use super::partition::{Partition, usable};

/// 二部グラフのノード。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationNode {
    Artist(ArtistId),
    Exhibition(String),
}

/// Bipartite artist/exhibition graph for one partition.
///
/// Artist identities are kept in first-appearance order; that order is the one
/// every downstream stage (projection, embedding, clustering) uses.
#[derive(Debug, Clone)]
pub struct AssociationGraph {
    graph: UnGraph<AssociationNode, ()>,
    artist_index: FxHashMap<ArtistId, NodeIndex>,
    exhibition_index: FxHashMap<String, NodeIndex>,
    artist_order: Vec<ArtistId>,
    excluded_records: usize,
}

impl AssociationGraph {
    /// パーティションのレコードから二部グラフを構築する。
    ///
    /// 同じ (artist, exhibition) の組が繰り返し現れてもエッジは1本のみ。
    /// タイトルが空のレコード、および `keep_blank_artists` が偽のときの空の作家名は除外する。
    #[must_use]
    pub fn build(partition: &Partition, keep_blank_artists: bool) -> Self {
        let mut this = Self {
            graph: UnGraph::default(),
            artist_index: FxHashMap::default(),
            exhibition_index: FxHashMap::default(),
            artist_order: Vec::new(),
            excluded_records: 0,
        };

        for record in &partition.records {
            let Some((artist, title)) = usable(record, keep_blank_artists) else {
                this.excluded_records += 1;
                continue;
            };
            let artist_node = this.artist_node(artist);
            let exhibition_node = this.exhibition_node(title);
            this.graph.update_edge(artist_node, exhibition_node, ());
        }

        if this.excluded_records > 0 {
            tracing::debug!(
                partition = %partition.key,
                excluded = this.excluded_records,
                "excluded records with blank exhibition or artist"
            );
        }

        this
    }

    fn artist_node(&mut self, artist: ArtistId) -> NodeIndex {
        if let Some(&index) = self.artist_index.get(&artist) {
            return index;
        }
        let index = self.graph.add_node(AssociationNode::Artist(artist.clone()));
        self.artist_order.push(artist.clone());
        self.artist_index.insert(artist, index);
        index
    }

    fn exhibition_node(&mut self, title: &str) -> NodeIndex {
        if let Some(&index) = self.exhibition_index.get(title) {
            return index;
        }
        let index = self
            .graph
            .add_node(AssociationNode::Exhibition(title.to_string()));
        self.exhibition_index.insert(title.to_string(), index);
        index
    }

    /// Artists in first-appearance order.
    #[must_use]
    pub fn artists(&self) -> &[ArtistId] {
        &self.artist_order
    }

    #[must_use]
    pub fn artist_count(&self) -> usize {
        self.artist_order.len()
    }

    #[must_use]
    pub fn exhibition_count(&self) -> usize {
        self.exhibition_index.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn excluded_records(&self) -> usize {
        self.excluded_records
    }

    /// Number of distinct exhibitions the artist appears in (0 if unknown).
    #[must_use]
    pub fn exhibition_count_of(&self, artist: &ArtistId) -> usize {
        self.artist_index
            .get(artist)
            .map_or(0, |&index| self.graph.neighbors(index).count())
    }

    /// Titles of the exhibitions the artist appears in.
    #[must_use]
    pub fn exhibitions_of(&self, artist: &ArtistId) -> BTreeSet<String> {
        let Some(&index) = self.artist_index.get(artist) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors(index)
            .filter_map(|neighbor| match &self.graph[neighbor] {
                AssociationNode::Exhibition(title) => Some(title.clone()),
                AssociationNode::Artist(_) => None,
            })
            .collect()
    }

    /// Artist rosters of every exhibition, in exhibition insertion order.
    pub(crate) fn exhibition_rosters(&self) -> impl Iterator<Item = Vec<&ArtistId>> + '_ {
        self.graph.node_indices().filter_map(move |index| {
            match &self.graph[index] {
                AssociationNode::Exhibition(_) => Some(
                    self.graph
                        .neighbors(index)
                        .filter_map(|neighbor| match &self.graph[neighbor] {
                            AssociationNode::Artist(artist) => Some(artist),
                            AssociationNode::Exhibition(_) => None,
                        })
                        .collect(),
                ),
                AssociationNode::Artist(_) => None,
            }
        })
    }
}
