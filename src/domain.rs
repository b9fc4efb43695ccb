//! パイプライン全体で共有するドメイン型。

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::util::text::normalize_name;

/// 入力テーブルの1行。読み込み後は変更しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExhibitionRecord {
    pub artist_name: String,
    pub exhibition_title: String,
    pub exhibition_date: Option<NaiveDate>,
}

impl ExhibitionRecord {
    #[must_use]
    pub fn new(
        artist_name: impl Into<String>,
        exhibition_title: impl Into<String>,
        exhibition_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            artist_name: artist_name.into(),
            exhibition_title: exhibition_title.into(),
            exhibition_date,
        }
    }

    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.exhibition_date.map(|date| date.year())
    }
}

/// Normalized artist identity (trimmed, case-folded).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArtistId(String);

impl ArtistId {
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        Self(normalize_name(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ArtistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// パーティションキー。年単位か、データセット全体か。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKey {
    Year(i32),
    All,
}

impl PartitionKey {
    #[must_use]
    pub fn year(self) -> Option<i32> {
        match self {
            Self::Year(year) => Some(year),
            Self::All => None,
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}"),
            Self::All => f.write_str("all"),
        }
    }
}

/// Degrees of membership over `k` clusters. Non-negative, sums to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MembershipVector(Vec<f64>);

impl MembershipVector {
    /// Tolerance used when checking the unit-sum invariant.
    pub const SUM_TOLERANCE: f64 = 1e-6;

    /// All mass on `index`.
    ///
    /// # Panics
    /// `index` が `clusters` 以上の場合。
    #[must_use]
    pub fn one_hot(clusters: usize, index: usize) -> Self {
        assert!(index < clusters, "one-hot index {index} out of range {clusters}");
        let mut degrees = vec![0.0; clusters];
        degrees[index] = 1.0;
        Self(degrees)
    }

    /// Builds a vector from raw non-negative weights, rescaling them to sum to 1.
    ///
    /// Returns `None` for an empty slice, a negative or non-finite weight, or an all-zero row.
    #[must_use]
    pub fn from_weights(weights: &[f64]) -> Option<Self> {
        if weights.is_empty() || weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return None;
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return None;
        }
        Some(Self(weights.iter().map(|w| w / total).collect()))
    }

    #[must_use]
    pub fn degrees(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Highest degree and its cluster index. Ties resolve to the lowest index.
    #[must_use]
    pub fn argmax(&self) -> Option<(usize, f64)> {
        self.0
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (index, degree)| match best {
                Some((_, top)) if degree <= top => best,
                _ => Some((index, degree)),
            })
    }

    #[must_use]
    pub fn is_one_hot(&self) -> bool {
        self.0.iter().filter(|d| **d == 1.0).count() == 1
            && self.0.iter().all(|d| *d == 0.0 || *d == 1.0)
    }

    #[must_use]
    pub fn satisfies_unit_sum(&self) -> bool {
        (self.sum() - 1.0).abs() <= Self::SUM_TOLERANCE && self.0.iter().all(|d| *d >= 0.0)
    }
}

/// 出力行。照合後は変更しない。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MembershipRecord {
    pub artist: ArtistId,
    pub partition: PartitionKey,
    pub membership: MembershipVector,
    pub exhibition_titles: BTreeSet<String>,
    pub is_fuzzy: bool,
}
