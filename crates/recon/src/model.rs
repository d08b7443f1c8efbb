use std::fmt;

use rhfill_core::{RowRef, Table};

use crate::error::ReconError;
use crate::normalize::normalize_name;

// ── Form columns ────────────────────────────────────────────────────

/// Exact headers of the form export.
pub mod form {
    pub const SURNAMES: &str = "Apellidos";
    pub const GIVEN_NAMES: &str = "Nombres";
    pub const FULL_NAME: &str = "Nombre_Completo";
    pub const MATCH_FLAG: &str = "Coincide";
    pub const DOCUMENT_REF: &str = "Cargar Documento RH (PDF)";
    pub const THIRD_PARTY_FLAG: &str = "Emitir Recibo por Honorarios a un tercero.";
    pub const RUC: &str = "RUC";
}

/// Column headers for one payee block of the form. The person and the
/// third party share the same layout, the latter suffixed `(tercero)`.
#[derive(Debug, Clone, Copy)]
pub struct PartyColumns {
    pub surnames: &'static str,
    pub given_names: &'static str,
    pub doc_type: &'static str,
    pub doc_number: &'static str,
    pub bank: &'static str,
    pub bank_other: &'static str,
    pub account: &'static str,
    pub interbank: &'static str,
}

pub const PERSON_COLUMNS: PartyColumns = PartyColumns {
    surnames: "Apellidos",
    given_names: "Nombres",
    doc_type: "Tipo de Documento",
    doc_number: "Nro. de Documento",
    bank: "Entidad Bancaria",
    bank_other: "Nombre de Entidad Bancaria",
    account: "Número de cuenta bancaria",
    interbank: "Número de cuenta Interbancaria",
};

pub const THIRD_PARTY_COLUMNS: PartyColumns = PartyColumns {
    surnames: "Apellidos (tercero)",
    given_names: "Nombres (tercero)",
    doc_type: "Tipo de Documento (tercero)",
    doc_number: "Nro. de Documento (tercero)",
    bank: "Entidad Bancaria (tercero)",
    bank_other: "Nombre de Entidad Bancaria (tercero)",
    account: "Número de cuenta bancaria (tercero)",
    interbank: "Número de cuenta Interbancaria (tercero)",
};

/// Bank option that defers to the free-text bank name field.
const OTHER_BANK: &str = "otro banco";

// ── Payee flag ──────────────────────────────────────────────────────

/// Who the receipt is issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayeeFlag {
    Person,
    ThirdParty,
}

/// The third-party column held something other than yes/no/blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedFlag(pub String);

impl fmt::Display for UnrecognizedFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized third-party flag '{}'", self.0)
    }
}

impl std::error::Error for UnrecognizedFlag {}

impl PayeeFlag {
    /// `si`/`sí` (any case) is a third party; `no` or blank is the person.
    pub fn parse(raw: &str) -> Result<Self, UnrecognizedFlag> {
        match raw.trim().to_lowercase().as_str() {
            "si" | "sí" => Ok(Self::ThirdParty),
            "no" | "" => Ok(Self::Person),
            _ => Err(UnrecognizedFlag(raw.trim().to_string())),
        }
    }
}

// ── Records ─────────────────────────────────────────────────────────

/// Identity and bank details of one payee block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Party {
    pub surnames: String,
    pub given_names: String,
    pub doc_type: String,
    pub doc_number: String,
    pub bank_option: String,
    pub bank_other: String,
    pub account: String,
    pub interbank: String,
}

impl Party {
    pub fn read(row: RowRef<'_>, columns: &PartyColumns) -> Self {
        let cell = |name: &str| row.get_or_empty(name).trim().to_string();
        Self {
            surnames: cell(columns.surnames),
            given_names: cell(columns.given_names),
            doc_type: cell(columns.doc_type),
            doc_number: cell(columns.doc_number),
            bank_option: cell(columns.bank),
            bank_other: cell(columns.bank_other),
            account: cell(columns.account),
            interbank: cell(columns.interbank),
        }
    }

    /// `SURNAMES GIVEN NAMES`, upper-cased. Diacritics are kept.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.surnames, self.given_names).trim().to_uppercase()
    }

    /// Bank name: the free-text field when "Otro banco" was picked,
    /// otherwise the selected option. Normalized like a person name.
    pub fn bank_name(&self) -> String {
        let chosen = if self.bank_option.trim().eq_ignore_ascii_case(OTHER_BANK) {
            &self.bank_other
        } else {
            &self.bank_option
        };
        normalize_name(chosen)
    }
}

/// One form row after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRecord {
    /// Position in the validated table.
    pub row: usize,
    /// Normalized full name.
    pub name: String,
    pub matched: bool,
    pub document_ref: String,
    pub payee_raw: String,
    /// `None` when the form has no RUC column.
    pub ruc: Option<String>,
    pub person: Party,
    pub third_party: Party,
}

impl FormRecord {
    fn read(row: RowRef<'_>, matched: bool) -> Self {
        Self {
            row: row.index(),
            name: normalize_name(row.get_or_empty(form::FULL_NAME)),
            matched,
            document_ref: row.get_or_empty(form::DOCUMENT_REF).trim().to_string(),
            payee_raw: row.get_or_empty(form::THIRD_PARTY_FLAG).to_string(),
            ruc: row.get(form::RUC).map(|v| v.trim().to_string()),
            person: Party::read(row, &PERSON_COLUMNS),
            third_party: Party::read(row, &THIRD_PARTY_COLUMNS),
        }
    }

    pub fn payee(&self) -> Result<PayeeFlag, UnrecognizedFlag> {
        PayeeFlag::parse(&self.payee_raw)
    }
}

// ── Validated table ─────────────────────────────────────────────────

/// Form table carrying the normalized `Nombre_Completo` and the
/// `Coincide` flag, plus the parsed records in row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedTable {
    table: Table,
    records: Vec<FormRecord>,
}

impl ValidatedTable {
    /// Build from a table the validator has just annotated.
    pub(crate) fn from_annotated(table: Table, flags: &[bool]) -> Self {
        let records = table
            .rows()
            .zip(flags)
            .map(|(row, &matched)| FormRecord::read(row, matched))
            .collect();
        Self { table, records }
    }

    /// Reload a validated table that went through a file (e.g. the
    /// `DatosValidados` workbook). Requires both annotation columns unless
    /// the table has no rows.
    pub fn from_table(table: Table) -> Result<Self, ReconError> {
        if table.is_empty() {
            return Ok(Self { table, records: Vec::new() });
        }
        for column in [form::FULL_NAME, form::MATCH_FLAG] {
            if !table.has_column(column) {
                return Err(ReconError::MissingColumn {
                    table: "validated".to_string(),
                    column: column.to_string(),
                });
            }
        }

        let mut flags = Vec::with_capacity(table.len());
        for row in table.rows() {
            let raw = row.get_or_empty(form::MATCH_FLAG);
            let flag = parse_match_flag(raw).ok_or_else(|| ReconError::InvalidValue {
                column: form::MATCH_FLAG.to_string(),
                row: row.index(),
                value: raw.to_string(),
            })?;
            flags.push(flag);
        }
        Ok(Self::from_annotated(table, &flags))
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn records(&self) -> &[FormRecord] {
        &self.records
    }

    pub fn matched(&self) -> impl Iterator<Item = &FormRecord> + '_ {
        self.records.iter().filter(|r| r.matched)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_document_refs(&self) -> bool {
        self.table.has_column(form::DOCUMENT_REF)
    }

    /// First matched record whose name equals `name` (already normalized),
    /// together with how many matched records share that name.
    pub fn lookup(&self, name: &str) -> (Option<&FormRecord>, usize) {
        let mut hits = self.matched().filter(|r| r.name == name);
        let first = hits.next();
        let count = first.map_or(0, |_| 1 + hits.count());
        (first, count)
    }
}

pub(crate) fn match_flag_text(matched: bool) -> &'static str {
    if matched { "TRUE" } else { "FALSE" }
}

fn parse_match_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "verdadero" => Some(true),
        "false" | "0" | "falso" | "" => Some(false),
        _ => None,
    }
}
