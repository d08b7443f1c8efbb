use std::fmt;
use std::path::PathBuf;

use rhfill_io::IoError;

#[derive(Debug)]
pub enum ReconError {
    /// Registry (or another required input) does not exist.
    NotFound(PathBuf),
    /// Missing required column in input data.
    MissingColumn { table: String, column: String },
    /// A cell that must hold a known value does not.
    InvalidValue { column: String, row: usize, value: String },
    /// Input could not be read or decoded.
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "file not found: {}", path.display()),
            Self::MissingColumn { table, column } => {
                write!(f, "{table}: missing column '{column}'")
            }
            Self::InvalidValue { column, row, value } => {
                write!(f, "column '{column}', row {row}: unexpected value '{value}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<IoError> for ReconError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::NotFound(path) => Self::NotFound(path),
            other => Self::Io(other.to_string()),
        }
    }
}
