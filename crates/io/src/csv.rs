// CSV/TSV import/export

use std::io::Read;
use std::path::Path;

use rhfill_core::Table;

use crate::error::IoError;

pub fn import(path: &Path) -> Result<Table, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter).map_err(|e| IoError::read(path, e))
}

pub fn import_with_delimiter(path: &Path, delimiter: u8) -> Result<Table, IoError> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, delimiter).map_err(|e| IoError::read(path, e))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::NotFound(path.to_path_buf())
        } else {
            IoError::read(path, e)
        }
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::read(path, e))?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            // Spreadsheet exports from Excel on Windows are usually cp1252
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

fn import_from_string(content: &str, delimiter: u8) -> Result<Table, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Ok(Table::default()),
    };
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if h.is_empty() { format!("Unnamed: {i}") } else { h.to_string() }
        })
        .collect();

    let mut table = Table::new(columns);
    for result in records {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        table.push_row(record.iter().map(|f| f.to_string()).collect());
    }

    Ok(table)
}

pub fn export(table: &Table, path: &Path) -> Result<(), IoError> {
    export_with_delimiter(table, path, b',')
}

pub fn export_tsv(table: &Table, path: &Path) -> Result<(), IoError> {
    export_with_delimiter(table, path, b'\t')
}

fn export_with_delimiter(table: &Table, path: &Path, delimiter: u8) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| IoError::write(path, e))?;

    writer.write_record(table.columns()).map_err(|e| IoError::write(path, e))?;
    for row in table.rows() {
        writer.write_record(row.values()).map_err(|e| IoError::write(path, e))?;
    }

    writer.flush().map_err(|e| IoError::write(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "Name,Age,City\nAlice,30,Paris\nBob,25,London\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "Name\tAge\tCity\nAlice\t30\tParis\nBob\t25\tLondon\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        // Semicolon delimiter but commas appear inside quoted fields
        let content = "Name;Address;City\n\"Doe, Jane\";\"123 Main St, Apt 4\";Paris\nBob;\"456 Elm\";London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_header_row_becomes_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("form.csv");
        fs::write(&path, "Apellidos;Nombres;\nRuiz;Ana;x\n;;\nGomez;Bob;\n").unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.columns(), &["Apellidos", "Nombres", "Unnamed: 2"]);
        // blank line dropped
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "Nombres"), Some("Bob"));
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("base.csv");
        // "NOMBRE\nPÉREZ" with É encoded as 0xC9
        fs::write(&path, b"NOMBRE,X\nP\xC9REZ,1\n").unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.get(0, "NOMBRE"), Some("PÉREZ"));
    }

    #[test]
    fn test_bom_is_stripped_from_first_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        fs::write(&path, "\u{feff}NOMBRE,BANCO\nANA,BCP\n").unwrap();

        let table = import(&path).unwrap();
        assert!(table.has_column("NOMBRE"));
    }

    #[test]
    fn test_tsv_roundtrip_preserves_column_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.tsv");

        let table = Table::from_rows(
            vec!["Name".into(), "Value".into()],
            vec![vec!["Alice".into(), "42".into()], vec!["Bob, Jr".into(), "17".into()]],
        );
        export_tsv(&table, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Name\tValue\n"));

        let imported = import_with_delimiter(&path, b'\t').unwrap();
        assert_eq!(imported, table);
    }
}
