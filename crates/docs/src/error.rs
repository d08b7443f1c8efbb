use std::fmt;
use std::path::PathBuf;

/// Failure to fetch one document.
#[derive(Debug)]
pub enum StoreError {
    /// Store could not be set up (bad template, TLS backend, mirror path).
    Config(String),
    /// Document does not exist in the store.
    NotFound(String),
    /// Credentials missing or rejected.
    Auth { status: u16, message: String },
    /// Any other non-success HTTP status.
    Http(u16, String),
    /// The request did not complete within the configured timeout.
    Timeout(String),
    Network(String),
    Io(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "document store configuration: {msg}"),
            Self::NotFound(id) => write!(f, "document '{id}' not found"),
            Self::Auth { status, message } => write!(f, "not authorized (HTTP {status}): {message}"),
            Self::Http(status, message) => write!(f, "HTTP {status}: {message}"),
            Self::Timeout(msg) => write!(f, "timed out: {msg}"),
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Failure to turn one document into text.
#[derive(Debug)]
pub enum TextError {
    /// The external converter is not installed.
    ToolMissing(String),
    /// The converter ran and failed.
    Failed(String),
    Io(String),
}

impl fmt::Display for TextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolMissing(tool) => write!(f, "{tool} not installed (poppler-utils)"),
            Self::Failed(msg) => write!(f, "text extraction failed: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for TextError {}

/// Fatal extract-stage error. Per-record problems never surface here.
#[derive(Debug)]
pub enum ExtractError {
    /// The working directory layout could not be created.
    Setup { path: PathBuf, message: String },
    /// The store refused the configured credentials.
    Store(StoreError),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup { path, message } => {
                write!(f, "cannot prepare working directory {}: {message}", path.display())
            }
            Self::Store(err) => write!(f, "document store: {err}"),
        }
    }
}

impl std::error::Error for ExtractError {}
