//! Exhibition CSV loader.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::domain::ExhibitionRecord;
use crate::error::PipelineError;
use crate::util::encoding::decode_field;

pub const ARTIST_COLUMN: &str = "DisplayName";
pub const TITLE_COLUMN: &str = "ExhibitionTitle";
pub const DATE_COLUMN: &str = "ExhibitionBeginDate";

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d", "%d %B %Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub records: Vec<ExhibitionRecord>,
    /// Rows the CSV parser could not read.
    pub malformed_rows: usize,
}

/// Opens `path` and reads every exhibition record from it.
///
/// # Errors
/// Fails when the file cannot be opened or a required column is missing.
pub fn load_records(path: &Path) -> Result<LoadedRecords, PipelineError> {
    let file = File::open(path).map_err(|source| PipelineError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = read_records(BufReader::new(file))?;
    info!(
        path = %path.display(),
        records = loaded.records.len(),
        malformed_rows = loaded.malformed_rows,
        "loaded exhibition records"
    );
    Ok(loaded)
}

/// Reads records from CSV with a header row.
///
/// Columns are located by name; `ExhibitionBeginDate` may be absent, in which case
/// every record is undated. Fields that are not valid UTF-8 are decoded as Latin-1.
///
/// # Errors
/// Fails when the header cannot be read or `DisplayName` / `ExhibitionTitle` is missing.
pub fn read_records<R: Read>(reader: R) -> Result<LoadedRecords, PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.byte_headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|field| decode_field(field).trim().trim_start_matches('\u{feff}') == name)
    };
    let artist_column = column(ARTIST_COLUMN).ok_or(PipelineError::MissingColumn(ARTIST_COLUMN))?;
    let title_column = column(TITLE_COLUMN).ok_or(PipelineError::MissingColumn(TITLE_COLUMN))?;
    let date_column = column(DATE_COLUMN);
    if date_column.is_none() {
        warn!("input has no {DATE_COLUMN} column; every record is undated");
    }

    let mut loaded = LoadedRecords::default();
    for (index, result) in csv_reader.byte_records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(error) => {
                warn!(row = index + 1, %error, "skipping malformed row");
                loaded.malformed_rows += 1;
                continue;
            }
        };
        let field = |column: usize| row.get(column).map(decode_field).unwrap_or_default();

        loaded.records.push(ExhibitionRecord {
            artist_name: field(artist_column).into_owned(),
            exhibition_title: field(title_column).into_owned(),
            exhibition_date: date_column.and_then(|column| parse_date(&field(column))),
        });
    }

    Ok(loaded)
}

/// 日付文字列を解析する。解析できない場合は `None`。
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
    {
        return Some(date);
    }
    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(datetime.date());
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    // a bare year is read as January 1st
    if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("10/2/1929", Some((1929, 10, 2)))]
    #[case("1950-03-14", Some((1950, 3, 14)))]
    #[case("1950/03/14", Some((1950, 3, 14)))]
    #[case("1950-03-14 00:00:00", Some((1950, 3, 14)))]
    #[case("1950-03-14T10:00:00+00:00", Some((1950, 3, 14)))]
    #[case("1950-03-14T10:00:00", Some((1950, 3, 14)))]
    #[case("3/14/1950 18:30", Some((1950, 3, 14)))]
    #[case("14 March 1950", Some((1950, 3, 14)))]
    #[case("1961", Some((1961, 1, 1)))]
    #[case("sometime in spring", None)]
    #[case("13/45/1950", None)]
    #[case("", None)]
    fn parses_supported_date_formats(#[case] raw: &str, #[case] expected: Option<(i32, u32, u32)>) {
        let expected = expected.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        assert_eq!(parse_date(raw), expected);
    }

    #[test]
    fn reads_columns_by_name() {
        let csv = "ExhibitionID,ExhibitionTitle,ExhibitionBeginDate,DisplayName\n\
                   1,Cubism and Abstract Art,3/2/1936,Pablo Picasso\n\
                   2,Fantastic Art,12/7/1936,Max Ernst\n";
        let loaded = read_records(csv.as_bytes()).expect("valid csv");
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[0].artist_name, "Pablo Picasso");
        assert_eq!(loaded.records[0].exhibition_title, "Cubism and Abstract Art");
        assert_eq!(loaded.records[1].year(), Some(1936));
    }

    #[test]
    fn decodes_latin1_fields() {
        let mut bytes = b"DisplayName,ExhibitionTitle,ExhibitionBeginDate\n".to_vec();
        bytes.extend_from_slice(b"Fernand L\xe9ger,Art in Our Time,5/10/1939\n");
        let loaded = read_records(bytes.as_slice()).expect("latin-1 csv");
        assert_eq!(loaded.records[0].artist_name, "Fernand Léger");
    }

    #[test]
    fn missing_date_column_leaves_records_undated() {
        let csv = "DisplayName,ExhibitionTitle\nA,X\n";
        let loaded = read_records(csv.as_bytes()).expect("valid csv");
        assert_eq!(loaded.records[0].exhibition_date, None);
    }

    #[test]
    fn missing_artist_column_is_an_error() {
        let csv = "Name,ExhibitionTitle\nA,X\n";
        assert!(matches!(
            read_records(csv.as_bytes()),
            Err(PipelineError::MissingColumn(ARTIST_COLUMN))
        ));
    }

    #[test]
    fn short_rows_read_as_blank_fields() {
        let csv = "DisplayName,ExhibitionTitle,ExhibitionBeginDate\nA\n";
        let loaded = read_records(csv.as_bytes()).expect("flexible csv");
        assert_eq!(loaded.records[0].exhibition_title, "");
        assert_eq!(loaded.records[0].exhibition_date, None);
    }
}
