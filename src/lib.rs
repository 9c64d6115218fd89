//! Parses Linux `strace -tt -T` trace files and bulk-loads the decoded
//! syscalls into a DuckDB database for SQL analysis.
//!
//! The three core subsystems are [`parser`] (line recognition),
//! [`file_processor`] (per-file two-pass reading), and [`engine`]
//! (the parallel worker pool). [`db`] is the DuckDB façade both depend
//! on; [`ingest`] wires all three together into the single entry point
//! the CLI binary calls.

pub mod db;
pub mod engine;
pub mod error;
pub mod file_processor;
pub mod parser;
pub mod pid;
pub mod progress;
pub mod record;

use std::path::PathBuf;

use db::{Db, DbSummary};
use engine::{process_files_parallel, AggregateStats};
use error::{EngineError, ProcessError};
use progress::AggregateProgress;

/// Options controlling one ingestion run, filled in by the CLI from
/// parsed arguments.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub output: PathBuf,
    pub workers: usize,
    pub show_progress: bool,
}

/// What [`ingest`] hands back on success: the run's own counters plus the
/// database's summary queries over the resulting table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub stats: AggregateStats,
    pub summary: DbSummary,
}

/// Ingest every path in `paths` into a fresh database at `options.output`.
///
/// If `options.output` already exists it is removed first (DuckDB won't
/// reopen a file written by an incompatible version, and a stale file
/// from a previous run would otherwise silently accumulate duplicate
/// rows). Returns the first critical error encountered, if any — see
/// [`error::EngineError`] for what counts as critical versus merely
/// per-file.
pub fn ingest(paths: &[PathBuf], options: &IngestOptions) -> Result<IngestReport, EngineError> {
    if let Err(e) = std::fs::remove_file(&options.output) {
        if e.kind() != std::io::ErrorKind::NotFound {
            return Err(EngineError::Process(ProcessError::Io {
                path: options.output.clone(),
                source: e,
            }));
        }
    }

    let coordinator = Db::open(&options.output)?;

    let progress = if options.show_progress {
        AggregateProgress::new(paths.len() as u64)
    } else {
        AggregateProgress::disabled()
    };

    let stats = process_files_parallel(&coordinator, paths, options.workers, |sample| {
        progress.update(sample)
    })?;
    progress.finish();

    let summary = coordinator.summary()?;
    Ok(IngestReport { stats, summary })
}

/// Default worker count: logical CPU count, clamped to at least one and
/// at most the number of files (more workers than files would leave some
/// permanently idle).
pub fn default_worker_count(file_count: usize) -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    std::cmp::max(1, std::cmp::min(cpus, file_count))
}
