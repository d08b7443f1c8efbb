// Validator: flag form rows whose person exists in the registry

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rhfill_core::Table;
use serde::Serialize;

use crate::error::ReconError;
use crate::model::{form, match_flag_text, ValidatedTable};
use crate::normalize::normalize_name;
use crate::schema::NAME_COLUMN;

/// Where the form's full names came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSource {
    /// `Apellidos` + `Nombres`.
    SurnamesAndGivenNames,
    /// An existing `Nombre_Completo` column.
    FullNameColumn,
    /// Neither was present; the row position stands in for the name.
    RowPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub form_rows: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub registry_rows: usize,
    /// Registry names (normalized) that occur on more than one row.
    pub duplicate_registry_names: usize,
    pub name_source: Option<NameSource>,
}

#[derive(Debug, Clone)]
pub struct Validation {
    pub table: ValidatedTable,
    pub report: ValidationReport,
}

/// Read the registry from disk. A missing file is [`ReconError::NotFound`].
pub fn read_registry(path: &Path) -> Result<Table, ReconError> {
    Ok(rhfill_io::read_table(path, None)?)
}

/// Validate `form` against the registry stored at `registry_path`.
///
/// An empty form returns an empty validation (with a warning) without
/// touching the registry.
pub fn validate(form: Table, registry_path: &Path) -> Result<Validation, ReconError> {
    if form.is_empty() {
        log::warn!("form table is empty, nothing to validate");
        return Ok(empty_validation(form));
    }
    let registry = read_registry(registry_path)?;
    validate_tables(form, &registry)
}

/// Validate `form` against an already loaded registry table.
pub fn validate_tables(mut form: Table, registry: &Table) -> Result<Validation, ReconError> {
    if form.is_empty() {
        log::warn!("form table is empty, nothing to validate");
        return Ok(empty_validation(form));
    }

    let registry_names = registry.column_values(NAME_COLUMN).ok_or_else(|| {
        ReconError::MissingColumn { table: "registry".to_string(), column: NAME_COLUMN.to_string() }
    })?;

    let mut seen: HashMap<String, usize> = HashMap::new();
    for name in &registry_names {
        *seen.entry(normalize_name(name)).or_default() += 1;
    }
    let duplicate_registry_names =
        seen.iter().filter(|(name, count)| !name.is_empty() && **count > 1).count();
    // A blank name is never a join key, on either side.
    let known: HashSet<&str> =
        seen.keys().map(String::as_str).filter(|name| !name.is_empty()).collect();

    let (names, name_source) = full_names(&form);
    let flags: Vec<bool> = names.iter().map(|n| known.contains(n.as_str())).collect();

    let name_col = form.ensure_column(form::FULL_NAME);
    let flag_col = form.ensure_column(form::MATCH_FLAG);
    for (row, (name, &matched)) in names.into_iter().zip(&flags).enumerate() {
        form.set_cell(row, name_col, name);
        form.set_cell(row, flag_col, match_flag_text(matched));
    }

    let matched = flags.iter().filter(|&&m| m).count();
    log::info!("validated {} form rows: {} matched, {} unmatched", flags.len(), matched, flags.len() - matched);
    if duplicate_registry_names > 0 {
        log::warn!("{duplicate_registry_names} registry name(s) appear on more than one row");
    }

    let report = ValidationReport {
        form_rows: flags.len(),
        matched,
        unmatched: flags.len() - matched,
        registry_rows: registry.len(),
        duplicate_registry_names,
        name_source: Some(name_source),
    };
    Ok(Validation { table: ValidatedTable::from_annotated(form, &flags), report })
}

/// Normalized full name per form row, plus which columns produced it.
fn full_names(form: &Table) -> (Vec<String>, NameSource) {
    if form.has_column(form::SURNAMES) && form.has_column(form::GIVEN_NAMES) {
        let names = form
            .rows()
            .map(|row| {
                normalize_name(&format!(
                    "{} {}",
                    row.get_or_empty(form::SURNAMES),
                    row.get_or_empty(form::GIVEN_NAMES)
                ))
            })
            .collect();
        (names, NameSource::SurnamesAndGivenNames)
    } else if form.has_column(form::FULL_NAME) {
        let names = form.rows().map(|row| normalize_name(row.get_or_empty(form::FULL_NAME))).collect();
        (names, NameSource::FullNameColumn)
    } else {
        log::warn!("form has neither name columns nor '{}', using row positions", form::FULL_NAME);
        let names = form.rows().map(|row| row.index().to_string()).collect();
        (names, NameSource::RowPosition)
    }
}

fn empty_validation(mut form: Table) -> Validation {
    form.ensure_column(form::FULL_NAME);
    form.ensure_column(form::MATCH_FLAG);
    Validation {
        table: ValidatedTable::from_annotated(form, &[]),
        report: ValidationReport {
            form_rows: 0,
            matched: 0,
            unmatched: 0,
            registry_rows: 0,
            duplicate_registry_names: 0,
            name_source: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        )
    }

    #[test]
    fn flags_matching_rows() {
        let form = table(&["Apellidos", "Nombres"], &[&["López", "Ana"], &["Ruiz", "Bob"]]);
        let registry = table(&["NOMBRE"], &[&["LOPEZ ANA"]]);

        let v = validate_tables(form, &registry).unwrap();
        let flags: Vec<bool> = v.table.records().iter().map(|r| r.matched).collect();
        assert_eq!(flags, vec![true, false]);
        assert_eq!(v.table.table().get(0, "Nombre_Completo"), Some("LOPEZ ANA"));
        assert_eq!(v.table.table().get(1, "Coincide"), Some("FALSE"));
        assert_eq!(v.report.matched, 1);
        assert_eq!(v.report.name_source, Some(NameSource::SurnamesAndGivenNames));
    }

    #[test]
    fn falls_back_to_full_name_column() {
        let form = table(&["Nombre_Completo"], &[&["  lopez   ANA "]]);
        let registry = table(&["NOMBRE"], &[&["López Ana"]]);

        let v = validate_tables(form, &registry).unwrap();
        assert!(v.table.records()[0].matched);
        assert_eq!(v.report.name_source, Some(NameSource::FullNameColumn));
    }

    #[test]
    fn falls_back_to_row_position() {
        let form = table(&["Otro"], &[&["x"], &["y"]]);
        let registry = table(&["NOMBRE"], &[&["1"]]);

        let v = validate_tables(form, &registry).unwrap();
        let flags: Vec<bool> = v.table.records().iter().map(|r| r.matched).collect();
        assert_eq!(flags, vec![false, true]);
        assert_eq!(v.report.name_source, Some(NameSource::RowPosition));
    }

    #[test]
    fn blank_names_never_match() {
        let form = table(&["Apellidos", "Nombres"], &[&["", " "], &["Ana", ""]]);
        let registry = table(&["NOMBRE"], &[&["ANA"], &[""], &["  "]]);

        let v = validate_tables(form, &registry).unwrap();
        assert_eq!(v.table.records()[0].name, "");
        assert!(!v.table.records()[0].matched);
        assert!(v.table.records()[1].matched);
        assert_eq!(v.report.matched, 1);
        assert_eq!(v.report.duplicate_registry_names, 0);
    }

    #[test]
    fn registry_without_name_column_is_an_error() {
        let form = table(&["Apellidos", "Nombres"], &[&["A", "B"]]);
        let registry = table(&["NAME"], &[&["A B"]]);
        match validate_tables(form, &registry).unwrap_err() {
            ReconError::MissingColumn { column, .. } => assert_eq!(column, "NOMBRE"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_form_is_not_an_error() {
        let form = Table::new(vec!["Apellidos".into(), "Nombres".into()]);
        let v = validate(form, Path::new("/nonexistent/registry.xlsx")).unwrap();
        assert!(v.table.is_empty());
        assert_eq!(v.report.form_rows, 0);
    }

    #[test]
    fn missing_registry_is_not_found() {
        let form = table(&["Apellidos", "Nombres"], &[&["A", "B"]]);
        let err = validate(form, Path::new("/nonexistent/registry.xlsx")).unwrap_err();
        assert!(matches!(err, ReconError::NotFound(_)));
    }

    #[test]
    fn counts_duplicate_registry_names() {
        let form = table(&["Nombre_Completo"], &[&["ANA"]]);
        let registry = table(&["NOMBRE"], &[&["Ana"], &["ANA "], &["BOB"], &[""], &[""]]);
        let v = validate_tables(form, &registry).unwrap();
        assert_eq!(v.report.duplicate_registry_names, 1);
        assert_eq!(v.report.registry_rows, 5);
    }
}
