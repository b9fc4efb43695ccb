use chrono::NaiveDate;
use exhibit_fuzzy::config::{PartitionMode, PipelineConfig, PipelineVariant};
use exhibit_fuzzy::domain::{ExhibitionRecord, MembershipRecord, PartitionKey};
use exhibit_fuzzy::pipeline::{Pipeline, PartitionStatus, RunOutcome, partition_records};
use exhibit_fuzzy::util::text::normalize_name;

fn on(artist: &str, title: &str, year: i32) -> ExhibitionRecord {
    ExhibitionRecord::new(artist, title, NaiveDate::from_ymd_opt(year, 6, 1))
}

/// 1950: Ex1 {A..E}, Ex2 {A,B,D}, Ex3 {A,C,D}.
fn year_1950() -> Vec<ExhibitionRecord> {
    let mut records: Vec<_> = ["A", "B", "C", "D", "E"]
        .iter()
        .map(|artist| on(artist, "Ex1", 1950))
        .collect();
    records.extend(["A", "B", "D"].iter().map(|artist| on(artist, "Ex2", 1950)));
    records.extend(["A", "C", "D"].iter().map(|artist| on(artist, "Ex3", 1950)));
    records
}

/// Two loose groups that share a bridging exhibition.
fn two_scenes(year: i32) -> Vec<ExhibitionRecord> {
    let mut records = Vec::new();
    for (title, artists) in [
        ("Salon I", &["p", "q", "r", "s"][..]),
        ("Salon II", &["p", "q", "r"][..]),
        ("Salon III", &["q", "r", "s"][..]),
        ("Works on Paper", &["w", "x", "y", "z"][..]),
        ("Prints", &["w", "x", "y"][..]),
        ("Drawings", &["x", "y", "z"][..]),
        ("Crossing", &["s", "w", "solo"][..]),
    ] {
        records.extend(artists.iter().map(|artist| on(artist, title, year)));
    }
    records
}

/// Two tight cliques of twelve artists, each hung together three times, plus one
/// artist shown once with each clique.
fn two_cliques(year: i32) -> Vec<ExhibitionRecord> {
    let mut records = Vec::new();
    for (prefix, shows) in [
        ("painter", ["Salon I", "Salon II", "Salon III"]),
        ("printmaker", ["Prints I", "Prints II", "Prints III"]),
    ] {
        for show in shows {
            records.extend((1..=12).map(|n| on(&format!("{prefix} {n:02}"), show, year)));
        }
    }
    records.push(on("bridge", "Salon I", year));
    records.push(on("bridge", "Prints I", year));
    records
}

fn pipeline(config: PipelineConfig) -> Pipeline {
    Pipeline::new(config).expect("valid config")
}

fn completed(outcome: RunOutcome) -> Vec<MembershipRecord> {
    match outcome {
        RunOutcome::Completed { records, .. } => records,
        RunOutcome::NoDataProcessed { .. } => panic!("expected rows"),
    }
}

fn row<'a>(rows: &'a [MembershipRecord], artist: &str) -> &'a MembershipRecord {
    rows.iter()
        .find(|row| row.artist.as_str() == artist)
        .unwrap_or_else(|| panic!("missing row for {artist}"))
}

#[test]
fn worked_example_assigns_single_exhibition_artist_hard() {
    let rows = completed(pipeline(PipelineConfig::default()).run(year_1950()));

    assert_eq!(rows.len(), 5);
    let e = row(&rows, "e");
    assert_eq!(e.membership.degrees(), &[1.0, 0.0, 0.0, 0.0]);
    assert!(!e.is_fuzzy);
    assert_eq!(e.partition, PartitionKey::Year(1950));

    for artist in ["a", "b", "c", "d"] {
        let fuzzy = row(&rows, artist);
        assert!(fuzzy.is_fuzzy, "{artist} should be fuzzy");
        assert_eq!(fuzzy.membership.len(), 4);
        assert!(fuzzy.membership.satisfies_unit_sum());
    }
    assert_eq!(row(&rows, "a").exhibition_titles.len(), 3);
}

#[test]
fn every_row_has_k_degrees_summing_to_one() {
    let config = PipelineConfig {
        n_clusters: 3,
        ..PipelineConfig::default()
    };
    let mut records = two_scenes(1960);
    records.extend(two_scenes(1961));
    let rows = completed(pipeline(config).run(records));

    assert!(!rows.is_empty());
    for row in &rows {
        assert_eq!(row.membership.len(), 3);
        assert!(row.membership.satisfies_unit_sum(), "{row:?}");
    }
}

#[test]
fn same_seed_gives_identical_output() {
    let config = PipelineConfig {
        n_clusters: 2,
        ..PipelineConfig::default()
    };
    let first = completed(pipeline(config.clone()).run(two_scenes(1970)));
    let second = completed(pipeline(config).run(two_scenes(1970)));
    assert_eq!(first, second);
}

#[test]
fn rows_follow_partition_then_first_appearance_order() {
    let mut records = two_scenes(1972);
    records.extend(year_1950());
    let rows = completed(pipeline(PipelineConfig {
        n_clusters: 2,
        ..PipelineConfig::default()
    })
    .run(records));

    let years: Vec<_> = rows.iter().filter_map(|row| row.partition.year()).collect();
    let mut sorted = years.clone();
    sorted.sort_unstable();
    assert_eq!(years, sorted);

    let names_1950: Vec<_> = rows
        .iter()
        .filter(|row| row.partition == PartitionKey::Year(1950))
        .map(|row| row.artist.as_str())
        .collect();
    assert_eq!(names_1950, vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn small_year_contributes_no_rows() {
    let mut records = year_1950();
    records.extend([on("X", "Tiny", 1951), on("Y", "Tiny", 1951), on("Z", "Tiny", 1951)]);
    let outcome = pipeline(PipelineConfig::default()).run(records);

    let report = outcome.report().clone();
    let rows = completed(outcome);
    assert!(rows.iter().all(|row| row.partition != PartitionKey::Year(1951)));

    let tiny = report
        .partitions
        .iter()
        .find(|partition| partition.key == PartitionKey::Year(1951))
        .expect("1951 is reported");
    assert!(matches!(tiny.status, PartitionStatus::Skipped { .. }));
    assert_eq!(tiny.rows, 0);
}

#[test]
fn partitioning_is_lossless() {
    let mut records = two_scenes(1980);
    records.extend(year_1950());
    records.push(ExhibitionRecord::new("Undated", "Somewhere", None));
    let total = records.len();

    let set = partition_records(records, PartitionMode::ByYear);
    assert_eq!(set.total_records() + set.dropped, total);
    assert_eq!(set.dropped, 1);
}

#[test]
fn enriched_collapses_exactly_the_confident_rows() {
    let base = PipelineConfig {
        n_clusters: 2,
        ..PipelineConfig::default()
    };
    let basic = completed(
        pipeline(PipelineConfig {
            variant: PipelineVariant::Basic,
            ..base.clone()
        })
        .run(two_cliques(1990)),
    );
    let outcome = pipeline(base.clone()).run(two_cliques(1990));
    let collapsed = outcome.report().partitions[0]
        .fuzzy
        .as_ref()
        .expect("fuzzy step ran")
        .collapsed;
    let enriched = completed(outcome);
    assert_eq!(basic.len(), enriched.len());

    let confident = basic
        .iter()
        .filter(|row| {
            row.membership
                .argmax()
                .is_some_and(|(_, degree)| degree >= base.confidence_threshold)
                && !row.membership.is_one_hot()
        })
        .count();
    assert!(collapsed > 0, "fixture should produce confident rows");
    assert_eq!(collapsed, confident);

    for (plain, reconciled) in basic.iter().zip(&enriched) {
        assert_eq!(plain.artist, reconciled.artist);
        assert_eq!(plain.is_fuzzy, reconciled.is_fuzzy);
        match plain.membership.argmax() {
            Some((cluster, degree)) if plain.is_fuzzy && degree >= base.confidence_threshold => {
                assert!(reconciled.membership.is_one_hot());
                assert_eq!(reconciled.membership.argmax().map(|(c, _)| c), Some(cluster));
            }
            _ => assert_eq!(plain.membership, reconciled.membership),
        }
    }

    let bridge = row(&enriched, "bridge");
    assert!(bridge.is_fuzzy);
    assert!(!bridge.membership.is_one_hot());
}

#[test]
fn single_mode_pools_every_record() {
    let mut records = two_scenes(1930);
    records.push(ExhibitionRecord::new("Undated", "Crossing", None));
    let rows = completed(
        pipeline(PipelineConfig {
            partition_mode: PartitionMode::Single,
            n_clusters: 2,
            ..PipelineConfig::default()
        })
        .run(records),
    );
    assert!(rows.iter().all(|row| row.partition == PartitionKey::All));
    assert!(rows.iter().any(|row| row.artist.as_str() == "undated"));
}

#[test]
fn names_are_normalized_case_insensitively() {
    let mut records = year_1950();
    records.push(on("  a ", "Ex4", 1950));
    let rows = completed(pipeline(PipelineConfig::default()).run(records));
    assert_eq!(rows.iter().filter(|row| row.artist.as_str() == "a").count(), 1);
    assert_eq!(row(&rows, "a").exhibition_titles.len(), 4);

    let once = normalize_name("  Pablo PICASSO ");
    assert_eq!(normalize_name(&once), once);
}
