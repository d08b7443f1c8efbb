//! `rhfill-core`: shared in-memory table model.
//!
//! Every stage of the pipeline reads and writes [`Table`]s. Cells are text;
//! typed interpretation (flags, amounts, dates) is the caller's job.

pub mod table;

pub use table::{RowRef, Table};
