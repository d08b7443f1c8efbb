// In-memory table: ordered named columns, rows of text cells

use serde::{Deserialize, Serialize};

/// A rectangular table of text cells with a header row.
///
/// Column order is preserved from the source file and through every
/// mutation; new columns are appended at the end. Rows are always exactly
/// `columns.len()` cells wide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Build a table from a header and raw rows. Short rows are padded with
    /// empty cells, long rows are truncated to the header width.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Index of the first column with this exact header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        (index < self.rows.len()).then_some(RowRef { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> + '_ {
        (0..self.rows.len()).map(move |index| RowRef { table: self, index })
    }

    /// Raw row values in column order.
    pub fn row_values(&self, index: usize) -> &[String] {
        &self.rows[index]
    }

    /// Cell by column name. `None` if the row or the column does not exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Cell by column index. Panics on out-of-range indices, like slice access.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        &self.rows[row][col]
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        self.rows[row][col] = value.into();
    }

    /// Set a cell by column name. Returns `false` (and writes nothing) when
    /// the column or row does not exist.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) -> bool {
        match (self.column_index(column), self.rows.get_mut(row)) {
            (Some(col), Some(r)) => {
                r[col] = value.into();
                true
            }
            _ => false,
        }
    }

    /// Return the index of `name`, appending an empty column if missing.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.columns.len() - 1
    }

    /// All values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[col].as_str()).collect())
    }

    /// Rewrite every cell in place. `f` returns `Some(new)` to replace a
    /// value or `None` to keep it.
    pub fn map_cells(&mut self, mut f: impl FnMut(&str) -> Option<String>) {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                if let Some(new) = f(cell) {
                    *cell = new;
                }
            }
        }
    }
}

/// Borrowed view of one row, addressable by column name.
#[derive(Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowRef<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: &str) -> Option<&'a str> {
        let col = self.table.column_index(column)?;
        Some(self.table.rows[self.index][col].as_str())
    }

    /// Cell value, or `""` when the column does not exist.
    pub fn get_or_empty(&self, column: &str) -> &'a str {
        self.get(column).unwrap_or("")
    }

    pub fn values(&self) -> &'a [String] {
        &self.table.rows[self.index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rows_are_padded_and_truncated_to_header_width() {
        let t = Table::from_rows(
            cols(&["A", "B"]),
            vec![cols(&["1"]), cols(&["1", "2", "3"])],
        );
        assert_eq!(t.row_values(0), &["1".to_string(), String::new()]);
        assert_eq!(t.row_values(1).len(), 2);
    }

    #[test]
    fn set_ignores_unknown_columns() {
        let mut t = Table::from_rows(cols(&["NOMBRE"]), vec![cols(&["ANA"])]);
        assert!(!t.set(0, "BANCO", "BCP"));
        assert!(t.set(0, "NOMBRE", "BOB"));
        assert_eq!(t.get(0, "NOMBRE"), Some("BOB"));
        assert_eq!(t.columns(), &["NOMBRE".to_string()]);
    }

    #[test]
    fn ensure_column_appends_once() {
        let mut t = Table::from_rows(cols(&["A"]), vec![cols(&["x"]), cols(&["y"])]);
        let idx = t.ensure_column("Coincide");
        assert_eq!(idx, 1);
        assert_eq!(t.ensure_column("Coincide"), 1);
        assert_eq!(t.get(1, "Coincide"), Some(""));
        assert_eq!(t.width(), 2);
    }

    #[test]
    fn row_ref_reads_by_name() {
        let t = Table::from_rows(cols(&["Apellidos", "Nombres"]), vec![cols(&["Ruiz", "Ana"])]);
        let row = t.row(0).unwrap();
        assert_eq!(row.get("Nombres"), Some("Ana"));
        assert_eq!(row.get_or_empty("RUC"), "");
        assert!(t.row(1).is_none());
    }

    #[test]
    fn map_cells_rewrites_selected_values() {
        let mut t = Table::from_rows(cols(&["A", "B"]), vec![cols(&["nan", "ok"])]);
        t.map_cells(|v| (v == "nan").then(String::new));
        assert_eq!(t.row_values(0), &[String::new(), "ok".to_string()]);
    }

    #[test]
    fn serializes_columns_and_rows() {
        let t = Table::from_rows(cols(&["A"]), vec![cols(&["1"])]);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["columns"][0], "A");
        assert_eq!(json["rows"][0][0], "1");
    }
}
