// File I/O operations

pub mod bundle;
pub mod csv;
pub mod error;
pub mod xlsx;

use std::path::Path;

use rhfill_core::Table;

pub use error::IoError;

/// Spreadsheet flavours we know how to read, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Excel,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Excel),
            other => Err(IoError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                format!(".{other}")
            })),
        }
    }
}

/// Read the first sheet (or `sheet`, when given) of a tabular file.
///
/// The first row is the header. Fails with [`IoError::NotFound`] when the
/// path does not exist, so callers can tell a missing input from a broken one.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table, IoError> {
    if !path.is_file() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    match TableFormat::from_path(path)? {
        TableFormat::Csv => crate::csv::import(path),
        TableFormat::Tsv => crate::csv::import_with_delimiter(path, b'\t'),
        TableFormat::Excel => xlsx::import(path, sheet),
    }
}

/// Write a table, choosing the format from the destination extension.
/// Only `.xlsx` is written as a workbook; `.csv`/`.tsv`/`.txt` as text.
pub fn write_table(table: &Table, path: &Path, sheet_name: &str) -> Result<(), IoError> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => crate::csv::export(table, path),
        TableFormat::Tsv => crate::csv::export_tsv(table, path),
        TableFormat::Excel => {
            let is_xlsx = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
            if !is_xlsx {
                return Err(IoError::UnsupportedFormat(format!(
                    "{} (workbooks are written as .xlsx only)",
                    path.display()
                )));
            }
            xlsx::export(table, path, sheet_name)
        }
    }
}
