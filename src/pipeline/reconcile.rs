//! Reconciliation of fuzzy results with deterministic assignments.
//!
//! Artists seen in a single exhibition never reach the fuzzy step and receive the
//! hard default `[1, 0, ..., 0]`. Fuzzy vectors whose top degree reaches the
//! confidence threshold are replaced by a one-hot vector at their argmax. Every
//! record is built fresh; nothing is mutated in place.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::domain::{ArtistId, MembershipRecord, MembershipVector, PartitionKey};

use super::association::AssociationGraph;
use super::cluster::FuzzyAssignment;

/// Artists of a partition split by exhibition count, each list in artist order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistSplit {
    pub multi_exhibition: Vec<ArtistId>,
    pub single_exhibition: Vec<ArtistId>,
}

/// 作家を出展数（1件 / 複数件）で振り分ける。
#[must_use]
pub fn split_artists(graph: &AssociationGraph) -> ArtistSplit {
    let (multi_exhibition, single_exhibition) = graph
        .artists()
        .iter()
        .cloned()
        .partition(|artist| graph.exhibition_count_of(artist) > 1);
    ArtistSplit {
        multi_exhibition,
        single_exhibition,
    }
}

/// Default vector for artists without co-occurrence signal.
#[must_use]
pub fn hard_assignment(clusters: usize) -> MembershipVector {
    MembershipVector::one_hot(clusters, 0)
}

/// Collapses `vector` to one-hot at its argmax when the top degree is at least `threshold`.
///
/// Returns a new vector; below the threshold the result equals the input.
#[must_use]
pub fn collapse_confident(vector: &MembershipVector, threshold: f64) -> MembershipVector {
    match vector.argmax() {
        Some((cluster, degree)) if degree >= threshold => {
            MembershipVector::one_hot(vector.len(), cluster)
        }
        _ => vector.clone(),
    }
}

/// Output of [`reconcile`].
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    pub records: Vec<MembershipRecord>,
    pub collapsed: usize,
}

/// 1パーティション分の出力レコードを組み立てる。
///
/// `fuzzy` が `None`（ファジィ段階をスキップした場合）は、複数展覧会の作家は出力されない。
#[must_use]
pub fn reconcile(
    key: PartitionKey,
    graph: &AssociationGraph,
    split: &ArtistSplit,
    fuzzy: Option<&FuzzyAssignment>,
    clusters: usize,
    collapse_threshold: Option<f64>,
) -> Reconciled {
    let single: FxHashSet<&ArtistId> = split.single_exhibition.iter().collect();
    let fuzzy_lookup: FxHashMap<&ArtistId, &MembershipVector> = fuzzy
        .map(|assignment| {
            assignment
                .artists
                .iter()
                .zip(&assignment.memberships)
                .collect()
        })
        .unwrap_or_default();

    let mut collapsed = 0;
    let mut records = Vec::with_capacity(graph.artist_count());

    for artist in graph.artists() {
        let (membership, is_fuzzy) = if single.contains(artist) {
            (hard_assignment(clusters), false)
        } else if let Some(vector) = fuzzy_lookup.get(artist) {
            let reconciled = match collapse_threshold {
                Some(threshold) => collapse_confident(vector, threshold),
                None => (*vector).clone(),
            };
            if reconciled != **vector {
                collapsed += 1;
            }
            (reconciled, true)
        } else {
            continue;
        };

        records.push(MembershipRecord {
            artist: artist.clone(),
            partition: key,
            membership,
            exhibition_titles: graph.exhibitions_of(artist),
            is_fuzzy,
        });
    }

    Reconciled { records, collapsed }
}
