//! Error taxonomy for the ingestion pipeline.
//!
//! Errors are layered to match the failure-isolation design: parse-level
//! failures never leave the parser (they collapse to `None`), append- and
//! file-level failures are counted by the caller and do not propagate past
//! a single file, and only [`EngineError`] can terminate the whole run.

use std::path::PathBuf;

/// Internal invariant violations in the line parser.
///
/// Malformed strace syntax is not an error condition — it makes
/// `parse_line` return `Ok(None)` so the caller can count it as an
/// unrecognised line. This variant exists only for conditions that should
/// be structurally impossible (e.g. a dispatch branch producing a record
/// that violates its own invariants), so a bug can be caught instead of
/// silently emitting a bad row.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("internal invariant violated while parsing: {0}")]
    InvariantViolation(&'static str),
}

/// Errors raised while appending a parsed record to the database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("no active appender session")]
    AppenderNotInitialized,

    #[error("failed to create appender: {0}")]
    AppenderInitFailed(duckdb::Error),

    #[error("failed to append row: {0}")]
    AppendFailed(#[from] duckdb::Error),

    #[error("failed to open database: {0}")]
    OpenFailed(duckdb::Error),

    #[error("failed to create schema: {0}")]
    SchemaFailed(duckdb::Error),

    #[error("failed to run summary query: {0}")]
    QueryFailed(duckdb::Error),
}

/// Errors raised while reading and dispatching a single trace file.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("trace file not found: {0}")]
    NotFound(PathBuf),

    #[error("permission denied reading {0}")]
    AccessDenied(PathBuf),

    #[error("line {line} in {path} is {size} bytes, exceeding the {cap} byte cap")]
    LineTooLong {
        path: PathBuf,
        line: usize,
        size: usize,
        cap: usize,
    },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl ProcessError {
    /// Errors that the parallel engine accounts for in `files_with_errors`
    /// rather than treating as a critical, run-terminating failure.
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            ProcessError::NotFound(_) | ProcessError::AccessDenied(_) | ProcessError::LineTooLong { .. }
        )
    }
}

/// Errors that abort the whole parallel run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("worker thread {0} panicked or could not be spawned")]
    WorkerFailed(usize),

    #[error(transparent)]
    Process(#[from] ProcessError),
}
