use std::fs;
use std::io::Write;

use exhibit_fuzzy::config::PipelineConfig;
use exhibit_fuzzy::io::{load_records, write_memberships, write_report};
use exhibit_fuzzy::pipeline::{Pipeline, RunOutcome};
use tempfile::{NamedTempFile, tempdir};

const MOMA_STYLE: &str = "\
ExhibitionID,ExhibitionNumber,ExhibitionTitle,ExhibitionBeginDate,DisplayName,Nationality
1,1,Ex1,6/1/1950,Anni Albers,American
1,1,Ex1,6/1/1950,Josef Albers,American
1,1,Ex1,6/1/1950,Paul Klee,Swiss
1,1,Ex1,6/1/1950,Wassily Kandinsky,Russian
1,1,Ex1,6/1/1950,Sophie Taeuber-Arp,Swiss
2,2,Ex2,7/1/1950,Anni Albers,American
2,2,Ex2,7/1/1950,Josef Albers,American
2,2,Ex2,7/1/1950,Wassily Kandinsky,Russian
3,3,Ex3,9/1/1950,ANNI ALBERS,American
3,3,Ex3,9/1/1950,Paul Klee,Swiss
3,3,Ex3,9/1/1950,Wassily Kandinsky,Russian
";

#[test]
fn csv_in_csv_out() {
    let mut input = NamedTempFile::new().expect("temp input");
    input.write_all(MOMA_STYLE.as_bytes()).expect("write input");
    let dir = tempdir().expect("temp dir");
    let output = dir.path().join("memberships.csv");
    let report_path = dir.path().join("report.json");

    let loaded = load_records(input.path()).expect("load");
    assert_eq!(loaded.records.len(), 11);
    assert_eq!(loaded.malformed_rows, 0);

    let pipeline = Pipeline::new(PipelineConfig::default()).expect("valid config");
    let outcome = pipeline.run(loaded.records);
    let RunOutcome::Completed { records, report } = outcome else {
        panic!("expected completed run");
    };
    write_memberships(&output, &records, pipeline.config()).expect("write output");
    write_report(&report_path, &report).expect("write report");

    let written = fs::read_to_string(&output).expect("read output");
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("fik_C1,fik_C2,fik_C3,fik_C4,DisplayName,Year,ExhibitionTitle,IsFuzzy")
    );
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 5);
    assert!(rows.contains(&"1,0,0,0,sophie taeuber-arp,1950,Ex1,False"));
    assert!(rows.iter().any(|row| row.contains(",anni albers,1950,Ex1|Ex2|Ex3,True")));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).expect("read report"))
            .expect("report is json");
    assert_eq!(report["input_records"], 11);
    assert_eq!(report["output_rows"], 5);
    assert_eq!(report["partitions"][0]["status"]["status"], "processed");
}

#[test]
fn latin1_input_is_decoded() {
    let mut bytes = b"DisplayName,ExhibitionTitle,ExhibitionBeginDate\n".to_vec();
    bytes.extend_from_slice(b"Fernand L\xe9ger,Art in Our Time,5/10/1939\n");
    bytes.extend_from_slice(b"Andr\xe9 Masson,Art in Our Time,5/10/1939\n");
    let mut input = NamedTempFile::new().expect("temp input");
    input.write_all(&bytes).expect("write input");

    let loaded = load_records(input.path()).expect("load");
    let names: Vec<_> = loaded
        .records
        .iter()
        .map(|record| record.artist_name.as_str())
        .collect();
    assert_eq!(names, vec!["Fernand Léger", "André Masson"]);
}

#[test]
fn missing_input_is_reported() {
    let dir = tempdir().expect("temp dir");
    let error = load_records(&dir.path().join("absent.csv")).unwrap_err();
    assert!(error.to_string().contains("absent.csv"));
}
