// Configuration loading and job-scoped state

pub mod job;
pub mod settings;

use std::fmt;
use std::path::PathBuf;

pub use job::{Job, JobError, JobManifest, JobStore};
pub use settings::{Settings, StoreKind};

/// Settings file could not be used.
#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse { path: Option<PathBuf>, message: String },
    /// Parsed, but the values do not make sense together.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Parse { path: Some(path), message } => {
                write!(f, "invalid settings in {}: {message}", path.display())
            }
            Self::Parse { path: None, message } => write!(f, "invalid settings: {message}"),
            Self::Invalid(message) => write!(f, "invalid settings: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}
