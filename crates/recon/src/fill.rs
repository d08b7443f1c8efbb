// Filler: write receipt and payee details into matching registry rows

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rhfill_core::Table;
use serde::Serialize;

use crate::error::ReconError;
use crate::fields::extract_fields;
use crate::model::{FormRecord, PayeeFlag, ValidatedTable};
use crate::normalize::{normalize_name, sidecar_stem};
use crate::schema::{RegistryField, RegistrySchema, NAME_COLUMN};
use crate::validate::read_registry;

// ── Text sources ────────────────────────────────────────────────────

/// Where the filler finds the extracted text of a person's receipt.
pub trait TextSource {
    /// Text for a normalized name, or `None` when there is none.
    fn text_for(&self, name: &str) -> Option<String>;
}

/// Sidecar `.txt` files written by the extractor, one per person.
#[derive(Debug, Clone)]
pub struct DirTextSource {
    dir: PathBuf,
}

impl DirTextSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", sidecar_stem(name)))
    }
}

impl TextSource for DirTextSource {
    fn text_for(&self, name: &str) -> Option<String> {
        let path = self.path_for(name);
        match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("cannot read {}: {e}", path.display());
                None
            }
        }
    }
}

impl TextSource for HashMap<String, String> {
    fn text_for(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

// ── Fill ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub registry_rows: usize,
    /// Rows that had a matched form record and were written.
    pub filled: usize,
    pub unmatched: usize,
    /// Filled rows with no extracted text; receipt columns left as they were.
    pub missing_texts: usize,
    /// Filled rows whose name matched more than one form record.
    pub ambiguous: usize,
    /// Third-party flags that were neither yes, no nor blank.
    pub unrecognized_flags: usize,
}

#[derive(Debug, Clone)]
pub struct FillOutcome {
    pub table: Table,
    pub report: FillReport,
}

/// Fill the registry stored at `registry_path` from `validated` and the
/// sidecar texts under `text_dir`.
pub fn fill(
    validated: &ValidatedTable,
    text_dir: &Path,
    registry_path: &Path,
) -> Result<FillOutcome, ReconError> {
    let registry = read_registry(registry_path)?;
    fill_table(registry, validated, &DirTextSource::new(text_dir))
}

/// Fill an already loaded registry table. Only fails when the registry has
/// no `NOMBRE` column; everything else is per-row and ends up in the report.
pub fn fill_table(
    mut registry: Table,
    validated: &ValidatedTable,
    texts: &dyn TextSource,
) -> Result<FillOutcome, ReconError> {
    let name_col = registry.column_index(NAME_COLUMN).ok_or_else(|| ReconError::MissingColumn {
        table: "registry".to_string(),
        column: NAME_COLUMN.to_string(),
    })?;
    let schema = RegistrySchema::resolve(&registry);
    for field in schema.missing() {
        log::debug!("registry has no '{}' column, not filling it", field.header());
    }

    let mut report = FillReport { registry_rows: registry.len(), ..FillReport::default() };

    for row in 0..registry.len() {
        let name = normalize_name(registry.cell(row, name_col));
        registry.set_cell(row, name_col, name.as_str());
        if name.is_empty() {
            report.unmatched += 1;
            continue;
        }

        let (record, hits) = validated.lookup(&name);
        let Some(record) = record else {
            report.unmatched += 1;
            continue;
        };
        if hits > 1 {
            log::warn!("{name}: {hits} matching form rows, using the first");
            report.ambiguous += 1;
        }

        match texts.text_for(&name) {
            Some(text) => write_receipt(&mut registry, &schema, row, &text),
            None => {
                log::warn!("{name}: no extracted text, receipt columns left unchanged");
                report.missing_texts += 1;
            }
        }

        if let Some(ruc) = &record.ruc {
            schema.write(&mut registry, row, RegistryField::Ruc, ruc.as_str());
        }

        let payee = record.payee().unwrap_or_else(|e| {
            log::warn!("{name}: {e}, filling as the person");
            report.unrecognized_flags += 1;
            PayeeFlag::Person
        });
        write_payee(&mut registry, &schema, row, record, payee);
        report.filled += 1;
    }

    registry.map_cells(scrub_cell);
    log::info!(
        "filled {} of {} registry rows ({} without text)",
        report.filled,
        report.registry_rows,
        report.missing_texts
    );
    Ok(FillOutcome { table: registry, report })
}

fn write_receipt(registry: &mut Table, schema: &RegistrySchema, row: usize, text: &str) {
    let fields = extract_fields(text);
    schema.write(registry, row, RegistryField::EmissionDate, fields.date.clone().unwrap_or_default());
    schema.write(registry, row, RegistryField::Series, fields.series.clone().unwrap_or_default());
    schema.write(registry, row, RegistryField::Receipt, fields.receipt.clone().unwrap_or_default());
    schema.write(registry, row, RegistryField::Amount, fields.amount_text());
}

fn write_payee(
    registry: &mut Table,
    schema: &RegistrySchema,
    row: usize,
    record: &FormRecord,
    payee: PayeeFlag,
) {
    let person = &record.person;
    schema.write(registry, row, RegistryField::DocType, person.doc_type.as_str());
    schema.write(registry, row, RegistryField::DocNumber, person.doc_number.as_str());

    let (name, doc_type, doc_number, bank_holder) = match payee {
        PayeeFlag::ThirdParty => {
            let third = &record.third_party;
            (third.display_name(), third.doc_type.clone(), third.doc_number.clone(), third)
        }
        PayeeFlag::Person => (String::new(), String::new(), String::new(), person),
    };
    schema.write(registry, row, RegistryField::ThirdPartyName, name);
    schema.write(registry, row, RegistryField::ThirdPartyDocType, doc_type);
    schema.write(registry, row, RegistryField::ThirdPartyDocNumber, doc_number);
    schema.write(registry, row, RegistryField::Bank, bank_holder.bank_name());
    schema.write(registry, row, RegistryField::Account, bank_holder.account.as_str());
    schema.write(registry, row, RegistryField::Interbank, bank_holder.interbank.as_str());
}

/// Spreadsheet artifacts cleaned from the final table: missing-value
/// markers become empty, and integral numbers lose a trailing `.0`.
/// `nan` may carry surrounding whitespace; `NaN` and `None` must be exact.
pub fn scrub_cell(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed == "nan" || matches!(value, "NaN" | "None") {
        return Some(String::new());
    }
    let digits = trimmed.strip_suffix(".0")?;
    let unsigned = digits.strip_prefix('-').unwrap_or(digits);
    if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
        Some(digits.to_string())
    } else {
        None
    }
}
