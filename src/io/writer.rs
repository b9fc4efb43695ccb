//! Membership table writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::{PartitionMode, PipelineConfig};
use crate::domain::MembershipRecord;
use crate::error::PipelineError;
use crate::pipeline::RunReport;

/// Output header for the given configuration.
///
/// `fik_C1..fik_Ck, DisplayName`, then `Year` when partitioned by year, then
/// `ExhibitionTitle, IsFuzzy` for the enriched variant.
#[must_use]
pub fn header(config: &PipelineConfig) -> Vec<String> {
    let mut columns: Vec<String> = (1..=config.n_clusters)
        .map(|cluster| format!("fik_C{cluster}"))
        .collect();
    columns.push("DisplayName".to_string());
    if config.partition_mode == PartitionMode::ByYear {
        columns.push("Year".to_string());
    }
    if config.variant.writes_enriched_columns() {
        columns.push("ExhibitionTitle".to_string());
        columns.push("IsFuzzy".to_string());
    }
    columns
}

/// Writes `records` as CSV to `path`.
///
/// # Errors
/// Fails when the file cannot be created or written.
pub fn write_memberships(
    path: &Path,
    records: &[MembershipRecord],
    config: &PipelineConfig,
) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|source| PipelineError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    write_memberships_to(BufWriter::new(file), records, config)?;
    tracing::info!(path = %path.display(), rows = records.len(), "wrote membership table");
    Ok(())
}

/// Writes `records` as CSV to any writer.
///
/// # Errors
/// Fails on I/O or CSV encoding errors.
pub fn write_memberships_to<W: Write>(
    writer: W,
    records: &[MembershipRecord],
    config: &PipelineConfig,
) -> Result<(), PipelineError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header(config))?;

    for record in records {
        let mut row: Vec<String> = record
            .membership
            .degrees()
            .iter()
            .map(ToString::to_string)
            .collect();
        row.push(record.artist.as_str().to_string());
        if config.partition_mode == PartitionMode::ByYear {
            row.push(
                record
                    .partition
                    .year()
                    .map(|year| year.to_string())
                    .unwrap_or_default(),
            );
        }
        if config.variant.writes_enriched_columns() {
            row.push(
                record
                    .exhibition_titles
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("|"),
            );
            row.push(if record.is_fuzzy { "True" } else { "False" }.to_string());
        }
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes the run report as pretty JSON.
///
/// # Errors
/// Fails when the file cannot be created or the report cannot be serialized.
pub fn write_report(path: &Path, report: &RunReport) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|source| PipelineError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}
