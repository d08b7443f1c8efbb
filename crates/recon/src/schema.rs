// Registry output columns, resolved once per table

use rhfill_core::Table;

/// Join key column of the registry.
pub const NAME_COLUMN: &str = "NOMBRE";

/// A registry column the filler may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryField {
    EmissionDate,
    Series,
    Receipt,
    Amount,
    DocType,
    DocNumber,
    ThirdPartyName,
    ThirdPartyDocType,
    ThirdPartyDocNumber,
    Bank,
    Account,
    Interbank,
    Ruc,
}

impl RegistryField {
    pub const ALL: [RegistryField; 13] = [
        Self::EmissionDate,
        Self::Series,
        Self::Receipt,
        Self::Amount,
        Self::DocType,
        Self::DocNumber,
        Self::ThirdPartyName,
        Self::ThirdPartyDocType,
        Self::ThirdPartyDocNumber,
        Self::Bank,
        Self::Account,
        Self::Interbank,
        Self::Ruc,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Self::EmissionDate => "FECHA DE EMISION",
            Self::Series => "NRO SERIE",
            Self::Receipt => "NRO RECIBO",
            Self::Amount => "IMPORTE",
            Self::DocType => "TIPO DE DOCUMENTO",
            Self::DocNumber => "NRO DE DOCUMENTO",
            Self::ThirdPartyName => "NOMBRE DEL TERCERO",
            Self::ThirdPartyDocType => "TIPO DOC TERCERO",
            Self::ThirdPartyDocNumber => "NRO DOC TERCERO",
            Self::Bank => "BANCO",
            Self::Account => "NRO DE CUENTA",
            Self::Interbank => "CCI",
            Self::Ruc => "NRO DE RUC",
        }
    }

    // Declaration order matches `ALL`.
    fn slot(self) -> usize {
        self as usize
    }
}

/// Which output columns a registry table actually has.
///
/// The filler never creates columns: a field whose header is absent is
/// silently not written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySchema {
    columns: [Option<usize>; 13],
}

impl RegistrySchema {
    pub fn resolve(table: &Table) -> Self {
        let mut columns = [None; 13];
        for field in RegistryField::ALL {
            columns[field.slot()] = table.column_index(field.header());
        }
        Self { columns }
    }

    pub fn has(&self, field: RegistryField) -> bool {
        self.columns[field.slot()].is_some()
    }

    /// Fields whose column is absent, in declaration order.
    pub fn missing(&self) -> Vec<RegistryField> {
        RegistryField::ALL.into_iter().filter(|f| !self.has(*f)).collect()
    }

    /// Write `value` into `field` of `row`. Returns whether the column exists.
    pub fn write(
        &self,
        table: &mut Table,
        row: usize,
        field: RegistryField,
        value: impl Into<String>,
    ) -> bool {
        match self.columns[field.slot()] {
            Some(col) => {
                table.set_cell(row, col, value);
                true
            }
            None => false,
        }
    }
}
