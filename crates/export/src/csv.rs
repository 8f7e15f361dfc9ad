use admitscan_core::{Category, Record, Table};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] ::csv::Error),
    #[error("Destination has no file name: {0}")]
    InvalidDestination(PathBuf),
}

/// `<stem>_<Category>.csv`
pub fn output_file_name(stem: &str, category: Category) -> String {
    format!("{stem}_{category}.csv")
}

/// Serialize a table as UTF-8 CSV: header row, `\n` line endings, fields
/// quoted only when needed.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut writer = ::csv::WriterBuilder::new()
        .terminator(::csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::IoError(e.into_error()))
}

/// Write a table to `destination`. The file appears complete or not at all:
/// bytes go to a sibling temp file which is then renamed into place.
pub fn write_table(table: &Table, destination: &Path) -> Result<(), ExportError> {
    let bytes = to_csv_bytes(table)?;

    let file_name = destination
        .file_name()
        .ok_or_else(|| ExportError::InvalidDestination(destination.to_path_buf()))?;
    let tmp = destination.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    if let Err(e) = fs::write(&tmp, &bytes).and_then(|()| fs::rename(&tmp, destination)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    info!("Data saved to {} ({} rows)", destination.display(), table.rows().len());
    Ok(())
}

/// Normalize `records` to the category's schema and write them.
pub fn write_records(
    records: Vec<Record>,
    category: Category,
    destination: &Path,
) -> Result<Table, ExportError> {
    let table = Table::from_records(category.schema(), records);
    write_table(&table, destination)?;
    Ok(table)
}
