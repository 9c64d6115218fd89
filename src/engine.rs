//! The parallel ingestion engine: a fixed-size worker pool that fans
//! trace files across threads by round-robin index, each worker owning
//! one connection and one bulk-append session for its whole assignment.
//!
//! Progress is exposed through atomics sampled by the caller every
//! 100 ms (see [`process_files_parallel`]'s `on_progress` callback); the
//! per-worker last-seen error is returned from the thread closure itself
//! and read back via `JoinHandle::join`, which is already the
//! synchronization point the design calls for — no extra mutex needed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::db::{Db, Ownership};
use crate::error::{EngineError, ProcessError};
use crate::file_processor::process_file;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sums of every worker's per-file counters, plus the two file-level
/// outcome tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub files_complete: u64,
    pub files_with_errors: u64,
    pub total_lines: u64,
    pub parsed_lines: u64,
    pub failed_lines: u64,
}

/// A progress snapshot handed to the caller's callback roughly every
/// 100 ms, plus once more after all workers have joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    pub files_complete: u64,
    pub files_with_errors: u64,
    pub total_files: u64,
}

#[derive(Default)]
struct Counters {
    files_complete: AtomicU64,
    files_with_errors: AtomicU64,
    total_lines: AtomicU64,
    parsed_lines: AtomicU64,
    failed_lines: AtomicU64,
}

impl Counters {
    fn sample(&self) -> (u64, u64) {
        (
            self.files_complete.load(Ordering::SeqCst),
            self.files_with_errors.load(Ordering::SeqCst),
        )
    }
}

/// Distribute `paths` round-robin across `actual_workers`: worker `w`
/// gets indices `w, w + actual_workers, w + 2*actual_workers, ...`.
fn assign(paths: &[PathBuf], worker: usize, actual_workers: usize) -> Vec<PathBuf> {
    paths
        .iter()
        .skip(worker)
        .step_by(actual_workers)
        .cloned()
        .collect()
}

/// One worker's run: begin a single append session, process every
/// assigned file against it, end the session, and report the last error
/// seen (if any) back to the coordinator.
///
/// A failure to even begin the append session is treated as if every
/// assigned file failed — otherwise the coordinator's exit condition
/// (`files_complete + files_with_errors >= total`) would never be
/// satisfied for this worker's share of the work.
fn worker_run(connection: duckdb::Connection, paths: Vec<PathBuf>, counters: Arc<Counters>) -> Option<ProcessError> {
    let mut db = Db::from_connection(connection, Ownership::Borrower);

    if let Err(e) = db.begin_append() {
        counters
            .files_with_errors
            .fetch_add(paths.len() as u64, Ordering::SeqCst);
        return Some(ProcessError::Db(e));
    }

    let mut last_error = None;
    for path in &paths {
        match process_file(&mut db, path) {
            Ok(stats) => {
                counters.files_complete.fetch_add(1, Ordering::SeqCst);
                counters.total_lines.fetch_add(stats.total_lines, Ordering::SeqCst);
                counters.parsed_lines.fetch_add(stats.parsed_lines, Ordering::SeqCst);
                counters.failed_lines.fetch_add(stats.failed_lines, Ordering::SeqCst);
            }
            Err(e) => {
                counters.files_with_errors.fetch_add(1, Ordering::SeqCst);
                last_error = Some(e);
            }
        }
    }

    if let Err(e) = db.end_append() {
        last_error = Some(ProcessError::Db(e));
    }

    last_error
}

/// Process `paths` across a pool of `worker_count` threads sharing
/// `coordinator`'s database instance, invoking `on_progress` about every
/// 100 ms while work is outstanding (and once more after the final join).
///
/// `actual_workers = min(worker_count, paths.len())`; an empty `paths`
/// returns zeroed stats immediately without spawning anything.
pub fn process_files_parallel<F>(
    coordinator: &Db,
    paths: &[PathBuf],
    worker_count: usize,
    mut on_progress: F,
) -> Result<AggregateStats, EngineError>
where
    F: FnMut(ProgressSample),
{
    if paths.is_empty() {
        return Ok(AggregateStats::default());
    }

    let actual_workers = worker_count.clamp(1, paths.len());
    let counters = Arc::new(Counters::default());
    let total_files = paths.len() as u64;

    let mut handles = Vec::with_capacity(actual_workers);
    for worker in 0..actual_workers {
        let assigned = assign(paths, worker, actual_workers);
        let connection = coordinator.clone_connection()?;
        let counters = Arc::clone(&counters);
        let handle = thread::Builder::new()
            .name(format!("ingest-worker-{worker}"))
            .spawn(move || worker_run(connection, assigned, counters))
            .map_err(|_| EngineError::WorkerFailed(worker))?;
        handles.push(handle);
    }

    loop {
        let (complete, errors) = counters.sample();
        on_progress(ProgressSample {
            files_complete: complete,
            files_with_errors: errors,
            total_files,
        });
        if complete + errors >= total_files {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    let mut critical: Option<EngineError> = None;
    for (worker, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(Some(err)) if !err.is_file_level() && critical.is_none() => {
                critical = Some(EngineError::Process(err));
            }
            Ok(_) => {}
            Err(_) if critical.is_none() => critical = Some(EngineError::WorkerFailed(worker)),
            Err(_) => {}
        }
    }

    let (complete, errors) = counters.sample();
    on_progress(ProgressSample {
        files_complete: complete,
        files_with_errors: errors,
        total_files,
    });

    if let Some(err) = critical {
        return Err(err);
    }

    Ok(AggregateStats {
        files_complete: complete,
        files_with_errors: errors,
        total_lines: counters.total_lines.load(Ordering::SeqCst),
        parsed_lines: counters.parsed_lines.load(Ordering::SeqCst),
        failed_lines: counters.failed_lines.load(Ordering::SeqCst),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn trace_file(lines: &[&str]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        f
    }

    #[test]
    fn empty_path_list_returns_zeros_without_spawning() {
        let db = Db::open(Path::new(":memory:")).unwrap();
        let stats = process_files_parallel(&db, &[], 4, |_| {}).unwrap();
        assert_eq!(stats, AggregateStats::default());
    }

    #[test]
    fn assigns_round_robin_across_workers() {
        let paths: Vec<PathBuf> = (0..5).map(|i| PathBuf::from(format!("f{i}"))).collect();
        assert_eq!(assign(&paths, 0, 2), vec![PathBuf::from("f0"), PathBuf::from("f2"), PathBuf::from("f4")]);
        assert_eq!(assign(&paths, 1, 2), vec![PathBuf::from("f1"), PathBuf::from("f3")]);
    }

    #[test]
    fn processes_all_files_and_sums_counters() {
        let db = Db::open(Path::new(":memory:")).unwrap();
        let files: Vec<_> = (0..5)
            .map(|i| trace_file(&[&format!("10:00:00.00000{i} getpid() = {i}")]))
            .collect();
        let paths: Vec<PathBuf> = files.iter().map(|f| f.path().to_path_buf()).collect();

        let stats = process_files_parallel(&db, &paths, 2, |_| {}).unwrap();

        assert_eq!(stats.files_complete, 5);
        assert_eq!(stats.files_with_errors, 0);
        assert_eq!(stats.parsed_lines, 5);
        assert_eq!(db.total_rows().unwrap(), 5);
    }

    #[test]
    fn missing_file_counts_as_error_without_aborting_others() {
        let db = Db::open(Path::new(":memory:")).unwrap();
        let good1 = trace_file(&["10:00:00.000001 getpid() = 1"]);
        let good2 = trace_file(&["10:00:00.000002 getpid() = 2"]);
        let paths = vec![
            good1.path().to_path_buf(),
            PathBuf::from("/nonexistent/missing/path"),
            good2.path().to_path_buf(),
        ];

        let stats = process_files_parallel(&db, &paths, 3, |_| {}).unwrap();

        assert_eq!(stats.files_complete, 2);
        assert_eq!(stats.files_with_errors, 1);
        assert_eq!(db.total_rows().unwrap(), 2);
    }

    #[test]
    fn worker_count_is_clamped_to_file_count() {
        let db = Db::open(Path::new(":memory:")).unwrap();
        let files: Vec<_> = (0..2)
            .map(|i| trace_file(&[&format!("10:00:00.00000{i} getpid() = {i}")]))
            .collect();
        let paths: Vec<PathBuf> = files.iter().map(|f| f.path().to_path_buf()).collect();

        let stats = process_files_parallel(&db, &paths, 16, |_| {}).unwrap();
        assert_eq!(stats.files_complete, 2);
    }
}
