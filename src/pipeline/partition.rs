//! Temporal partitioning of the input records.

use std::collections::BTreeMap;

use crate::config::PartitionMode;
use crate::domain::{ArtistId, ExhibitionRecord, PartitionKey};
use crate::util::text::clean_title;

/// Records sharing one partition key.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub key: PartitionKey,
    pub records: Vec<ExhibitionRecord>,
}

impl Partition {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Output of [`partition_records`].
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionSet {
    /// Ascending by key, none empty.
    pub partitions: Vec<Partition>,
    /// Records excluded because their date was missing or unparseable.
    pub dropped: usize,
}

impl PartitionSet {
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.partitions.iter().map(Partition::len).sum()
    }
}

/// 入力レコードをパーティションに分割する。
///
/// 年単位モードでは日付のないレコードを除外し、年の昇順で返す。
/// 単一モードでは全レコードを1つのパーティションにまとめる。
#[must_use]
pub fn partition_records(records: Vec<ExhibitionRecord>, mode: PartitionMode) -> PartitionSet {
    match mode {
        PartitionMode::Single => {
            let partitions = if records.is_empty() {
                Vec::new()
            } else {
                vec![Partition {
                    key: PartitionKey::All,
                    records,
                }]
            };
            PartitionSet {
                partitions,
                dropped: 0,
            }
        }
        PartitionMode::ByYear => {
            let mut by_year: BTreeMap<i32, Vec<ExhibitionRecord>> = BTreeMap::new();
            let mut dropped = 0;
            for record in records {
                match record.year() {
                    Some(year) => by_year.entry(year).or_default().push(record),
                    None => dropped += 1,
                }
            }
            if dropped > 0 {
                tracing::info!(dropped, "dropped records without a parseable exhibition date");
            }
            PartitionSet {
                partitions: by_year
                    .into_iter()
                    .map(|(year, records)| Partition {
                        key: PartitionKey::Year(year),
                        records,
                    })
                    .collect(),
                dropped,
            }
        }
    }
}

/// Normalized artist and cleaned title of a record, or `None` when the record
/// cannot take part in graph construction.
pub(crate) fn usable(
    record: &ExhibitionRecord,
    keep_blank_artists: bool,
) -> Option<(ArtistId, &str)> {
    let title = clean_title(&record.exhibition_title)?;
    let artist = ArtistId::from_raw(&record.artist_name);
    if artist.is_blank() && !keep_blank_artists {
        return None;
    }
    Some((artist, title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(artist: &str, title: &str, year: Option<i32>) -> ExhibitionRecord {
        ExhibitionRecord::new(
            artist,
            title,
            year.and_then(|y| NaiveDate::from_ymd_opt(y, 3, 1)),
        )
    }

    #[test]
    fn by_year_sorts_and_drops_undated() {
        let records = vec![
            record("a", "x", Some(1950)),
            record("b", "y", Some(1931)),
            record("c", "z", None),
            record("d", "x", Some(1950)),
        ];
        let input = records.len();

        let set = partition_records(records, PartitionMode::ByYear);

        let keys: Vec<_> = set.partitions.iter().map(|p| p.key).collect();
        assert_eq!(keys, vec![PartitionKey::Year(1931), PartitionKey::Year(1950)]);
        assert_eq!(set.dropped, 1);
        assert_eq!(set.total_records() + set.dropped, input);
    }

    #[test]
    fn single_mode_keeps_undated_records() {
        let records = vec![record("a", "x", None), record("b", "y", Some(1950))];
        let set = partition_records(records, PartitionMode::Single);
        assert_eq!(set.partitions.len(), 1);
        assert_eq!(set.partitions[0].key, PartitionKey::All);
        assert_eq!(set.partitions[0].len(), 2);
        assert_eq!(set.dropped, 0);
    }

    #[test]
    fn empty_input_yields_no_partitions() {
        assert!(partition_records(Vec::new(), PartitionMode::Single).partitions.is_empty());
        assert!(partition_records(Vec::new(), PartitionMode::ByYear).partitions.is_empty());
    }
}
