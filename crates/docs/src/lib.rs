//! `rhfill-docs`: source documents of matched form records.
//!
//! Fetches each referenced receipt from a document store into a working
//! directory and writes its text next to it for the filler to read.

pub mod error;
pub mod extract;
pub mod reference;
pub mod store;
pub mod text;

pub use error::{ExtractError, StoreError, TextError};
pub use extract::{extract, ExtractReport, Extraction, PDF_DIR, TEXT_DIR};
pub use reference::{parse_document_id, ReferenceError};
pub use store::{DirDocumentStore, DocumentStore, HttpDocumentStore};
pub use text::{PdfToText, TextExtractor};
