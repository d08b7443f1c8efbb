//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                   |
//! |---------|-----------|-----------------------------------------------|
//! | 0       | Universal | Success                                       |
//! | 1       | Universal | General error (unspecified)                   |
//! | 2       | Universal | CLI usage error (bad args)                    |
//! | 3-9     | Input     | Missing files, unreadable tables, settings    |
//! | 10-19   | Documents | Document store and text extraction setup      |
//! | 20-29   | Jobs      | Job lookup and lifecycle                      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant error mapping below

use rhfill_config::{ConfigError, JobError};
use rhfill_docs::{ExtractError, StoreError, TextError};
use rhfill_io::IoError;
use rhfill_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input (3-9)
// =============================================================================

/// Input file missing, or an output could not be written.
pub const EXIT_IO: u8 = 3;

/// Table readable but not usable: missing required column, bad flag value.
pub const EXIT_DATA: u8 = 4;

/// File extension we cannot read or write.
pub const EXIT_FORMAT: u8 = 5;

/// Settings file unreadable or inconsistent.
pub const EXIT_CONFIG: u8 = 6;

// =============================================================================
// Documents (10-19)
// =============================================================================

/// Document store could not be set up (template, token, mirror directory)
/// or rejected the configured credentials.
pub const EXIT_STORE_CONFIG: u8 = 10;

/// `pdftotext` is not installed.
pub const EXIT_TOOL_MISSING: u8 = 11;

/// Working directory for fetched documents could not be created.
pub const EXIT_WORKDIR: u8 = 12;

// =============================================================================
// Jobs (20-29)
// =============================================================================

/// No job with that id (or not a job id at all).
pub const EXIT_JOB_NOT_FOUND: u8 = 20;

/// Job exists but has expired.
pub const EXIT_JOB_EXPIRED: u8 = 21;

/// Job directory present but its manifest is unreadable.
pub const EXIT_JOB_CORRUPT: u8 = 22;

/// Job has no output of the requested kind yet.
pub const EXIT_JOB_INCOMPLETE: u8 = 23;

// =============================================================================
// Error Mapping
// =============================================================================

pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::NotFound(_) | IoError::Read { .. } | IoError::Write { .. } => EXIT_IO,
        IoError::UnsupportedFormat(_) => EXIT_FORMAT,
        IoError::SheetNotFound { .. } => EXIT_DATA,
    }
}

pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::NotFound(_) | ReconError::Io(_) => EXIT_IO,
        ReconError::MissingColumn { .. } | ReconError::InvalidValue { .. } => EXIT_DATA,
    }
}

pub fn config_exit_code(_err: &ConfigError) -> u8 {
    EXIT_CONFIG
}

pub fn store_exit_code(err: &StoreError) -> u8 {
    match err {
        StoreError::Config(_) => EXIT_STORE_CONFIG,
        _ => EXIT_ERROR,
    }
}

pub fn text_exit_code(err: &TextError) -> u8 {
    match err {
        TextError::ToolMissing(_) => EXIT_TOOL_MISSING,
        _ => EXIT_ERROR,
    }
}

pub fn extract_exit_code(err: &ExtractError) -> u8 {
    match err {
        ExtractError::Setup { .. } => EXIT_WORKDIR,
        ExtractError::Store(_) => EXIT_STORE_CONFIG,
    }
}

pub fn job_exit_code(err: &JobError) -> u8 {
    match err {
        JobError::InvalidId(_) | JobError::NotFound(_) => EXIT_JOB_NOT_FOUND,
        JobError::Expired { .. } => EXIT_JOB_EXPIRED,
        JobError::Corrupt { .. } => EXIT_JOB_CORRUPT,
        JobError::Io(_) => EXIT_IO,
    }
}
