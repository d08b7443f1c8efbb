// Excel file import (xlsx, xls, xlsb, ods) and export (xlsx only)
//
// Import: first row is the header, every cell becomes text.
// Export: plain values with a bold header row. Not a round-trip format;
//         formatting in the source workbook is not carried over.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Duration, NaiveDate};
use rhfill_core::Table;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};

use crate::error::IoError;

/// Maximum number of rows read from a single sheet.
const MAX_ROWS: usize = 1_048_576;

/// Import one sheet of an Excel-family workbook. `sheet = None` picks the first.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<Table, IoError> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| IoError::read(path, format!("failed to open workbook: {e}")))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => sheet_names.iter().find(|s| s.as_str() == name).cloned(),
        None => sheet_names.first().cloned(),
    }
    .ok_or_else(|| IoError::SheetNotFound {
        path: path.to_path_buf(),
        sheet: sheet.unwrap_or("<first>").to_string(),
    })?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IoError::read(path, format!("failed to read sheet '{sheet_name}': {e}")))?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(Table::default()),
    };
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = cell_to_string(cell);
            let name = name.trim();
            if name.is_empty() { format!("Unnamed: {i}") } else { name.to_string() }
        })
        .collect();

    let mut table = Table::new(columns);
    for (row_idx, row) in rows.enumerate() {
        if row_idx >= MAX_ROWS {
            log::warn!("{}: sheet '{}' truncated at {} rows", path.display(), sheet_name, MAX_ROWS);
            break;
        }
        let values: Vec<String> = row.iter().map(cell_to_string).collect();
        if values.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        table.push_row(values);
    }

    Ok(table)
}

/// Text rendering of a calamine cell.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Format nicely: integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => serial_to_display(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Render an Excel serial date (1900 system) as `DD/MM/YYYY`, with the
/// time appended only when the serial carries a fractional day.
fn serial_to_display(serial: f64) -> String {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return format!("{}", serial);
    };
    let days = serial.floor() as i64;
    let secs = ((serial - serial.floor()) * 86_400.0).round() as i64;
    let Some(datetime) = epoch
        .and_hms_opt(0, 0, 0)
        .and_then(|base| base.checked_add_signed(Duration::days(days) + Duration::seconds(secs)))
    else {
        return format!("{}", serial);
    };
    if secs == 0 {
        datetime.format("%d/%m/%Y").to_string()
    } else {
        datetime.format("%d/%m/%Y %H:%M:%S").to_string()
    }
}

/// Export a table as a single-sheet xlsx workbook. All cells are written as text.
pub fn export(table: &Table, path: &Path, sheet_name: &str) -> Result<(), IoError> {
    let buffer = export_to_buffer(table, sheet_name).map_err(|e| IoError::write(path, e))?;
    std::fs::write(path, buffer).map_err(|e| IoError::write(path, e))
}

/// Serialize a table to xlsx bytes.
pub fn export_to_buffer(table: &Table, sheet_name: &str) -> Result<Vec<u8>, String> {
    let mut workbook = XlsxWorkbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook
        .add_worksheet()
        .set_name(sheet_name)
        .map_err(|e| format!("Failed to create sheet '{}': {}", sheet_name, e))?;

    for (col, name) in table.columns().iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name, &header_format)
            .map_err(|e| format!("Failed to write header '{}': {}", name, e))?;
    }

    for row in table.rows() {
        let excel_row = (row.index() + 1) as u32;
        for (col, value) in row.values().iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(excel_row, col as u16, value)
                .map_err(|e| format!("Failed to write cell ({}, {}): {}", excel_row, col, e))?;
        }
    }

    worksheet.autofit();

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Failed to save XLSX file: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Table {
        Table::from_rows(
            vec!["NOMBRE".into(), "NRO DE CUENTA".into(), "CCI".into()],
            vec![
                vec!["LOPEZ ANA".into(), "191-1234567-0-01".into(), String::new()],
                vec!["RUIZ BOB".into(), "00123".into(), "002191".into()],
            ],
        )
    }

    #[test]
    fn test_xlsx_roundtrip_keeps_text_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("final.xlsx");

        export(&sample(), &path, "ResultadoFinal").unwrap();
        let back = import(&path, None).unwrap();

        assert_eq!(back.columns(), sample().columns());
        assert_eq!(back.len(), 2);
        // leading zeros survive because cells are written as strings
        assert_eq!(back.get(1, "NRO DE CUENTA"), Some("00123"));
        assert_eq!(back.get(0, "CCI"), Some(""));
    }

    #[test]
    fn test_import_named_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("named.xlsx");
        export(&sample(), &path, "DatosValidados").unwrap();

        assert!(import(&path, Some("DatosValidados")).is_ok());
        let err = import(&path, Some("Hoja1")).unwrap_err();
        assert!(matches!(err, IoError::SheetNotFound { .. }));
    }

    #[test]
    fn test_float_cells_render_without_trailing_zero() {
        assert_eq!(cell_to_string(&Data::Float(12345678.0)), "12345678");
        assert_eq!(cell_to_string(&Data::Float(1234.5)), "1234.5");
        assert_eq!(cell_to_string(&Data::Bool(true)), "TRUE");
    }

    #[test]
    fn test_serial_dates() {
        assert_eq!(serial_to_display(45356.0), "05/03/2024");
        assert_eq!(serial_to_display(45356.5), "05/03/2024 12:00:00");
    }
}
