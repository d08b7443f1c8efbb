use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum IoError {
    /// Input file does not exist.
    NotFound(PathBuf),
    /// Extension we cannot read or write.
    UnsupportedFormat(String),
    /// File exists but could not be read or decoded.
    Read { path: PathBuf, message: String },
    /// Destination could not be written.
    Write { path: PathBuf, message: String },
    /// Workbook has no sheet with the requested name (or no sheets at all).
    SheetNotFound { path: PathBuf, sheet: String },
}

impl IoError {
    pub(crate) fn read(path: &std::path::Path, message: impl fmt::Display) -> Self {
        Self::Read { path: path.to_path_buf(), message: message.to_string() }
    }

    pub(crate) fn write(path: &std::path::Path, message: impl fmt::Display) -> Self {
        Self::Write { path: path.to_path_buf(), message: message.to_string() }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "file not found: {}", path.display()),
            Self::UnsupportedFormat(what) => write!(f, "unsupported file format: {what}"),
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Write { path, message } => write!(f, "cannot write {}: {message}", path.display()),
            Self::SheetNotFound { path, sheet } => {
                write!(f, "{}: sheet '{sheet}' not found", path.display())
            }
        }
    }
}

impl std::error::Error for IoError {}
