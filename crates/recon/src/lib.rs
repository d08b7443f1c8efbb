//! `rhfill-recon`: matching and filling engine for RH payment records.
//!
//! Receives loaded tables, returns annotated tables plus run reports.
//! The only filesystem access is reading the registry and the sidecar text
//! files; fetching documents lives in `rhfill-docs`.

pub mod error;
pub mod fields;
pub mod fill;
pub mod model;
pub mod normalize;
pub mod schema;
pub mod validate;

pub use error::ReconError;
pub use fields::{extract_fields, parse_spanish_date, ExtractedFields};
pub use fill::{fill, fill_table, DirTextSource, FillOutcome, FillReport, TextSource};
pub use model::{FormRecord, Party, PayeeFlag, ValidatedTable};
pub use normalize::{normalize_name, sidecar_stem};
pub use schema::{RegistryField, RegistrySchema};
pub use validate::{read_registry, validate, validate_tables, Validation, ValidationReport};
