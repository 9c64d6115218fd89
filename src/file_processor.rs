//! Per-file ingestion: a two-pass reader that bounds the line buffer to
//! the file's actual longest line instead of a worst-case constant.
//!
//! Pass 1 ([`count_lines_and_max_length`]) scans the file once with a
//! small fixed scratch buffer to learn the total line count and the
//! longest line. Pass 2 re-opens the file and re-reads it line by line
//! into a buffer sized from that result, dispatching each line to the
//! [`crate::parser::parse_line`] and [`crate::db::Db::append`].

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::db::Db;
use crate::error::ProcessError;
use crate::parser::parse_line;
use crate::pid::extract_pid;

/// Small scratch buffer for pass 1 — independent of line length, since
/// pass 1 never holds a whole line in memory at once.
const SCRATCH_SIZE: usize = 8 * 1024;

/// Hard per-line sanity cap. A line at exactly this size is accepted; one
/// byte over aborts the file with [`ProcessError::LineTooLong`].
pub const LINE_CAP: usize = 10 * 1024 * 1024;

const MIN_LINE_BUFFER: usize = 4096;

/// Per-file counters: lines seen, records appended, records that failed
/// to parse or append.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStats {
    pub total_lines: u64,
    pub parsed_lines: u64,
    pub failed_lines: u64,
}

fn open_file(path: &Path) -> Result<File, ProcessError> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ProcessError::NotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => ProcessError::AccessDenied(path.to_path_buf()),
        _ => ProcessError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

/// Pass 1: count lines (delimiter-inclusive) and find the longest one,
/// without ever holding more than `SCRATCH_SIZE` bytes in memory.
///
/// A file whose last line has no trailing newline still counts that
/// line. An empty file yields `(0, 0)`.
fn count_lines_and_max_length(path: &Path, cap: usize) -> Result<(u64, usize), ProcessError> {
    let file = open_file(path)?;
    let mut reader = BufReader::with_capacity(SCRATCH_SIZE, file);
    let mut scratch = [0u8; SCRATCH_SIZE];

    let mut total_lines: u64 = 0;
    let mut max_len: usize = 0;
    let mut current_len: usize = 0;

    loop {
        let n = reader.read(&mut scratch).map_err(|e| ProcessError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        for &b in &scratch[..n] {
            current_len += 1;
            if b == b'\n' {
                total_lines += 1;
                max_len = max_len.max(current_len);
                if current_len > cap {
                    return Err(ProcessError::LineTooLong {
                        path: path.to_path_buf(),
                        line: total_lines as usize,
                        size: current_len,
                        cap,
                    });
                }
                current_len = 0;
            } else if current_len > cap {
                return Err(ProcessError::LineTooLong {
                    path: path.to_path_buf(),
                    line: (total_lines + 1) as usize,
                    size: current_len,
                    cap,
                });
            }
        }
    }

    if current_len > 0 {
        total_lines += 1;
        max_len = max_len.max(current_len);
    }

    Ok((total_lines, max_len))
}

/// Process one trace file against an already-opened append session.
///
/// Precondition: the caller has called [`Db::begin_append`] on `db`. The
/// caller also owns the matching [`Db::end_append`] — this function never
/// calls it, so several files can share one session.
pub fn process_file(db: &mut Db, path: &Path) -> Result<FileStats, ProcessError> {
    let (total_lines_hint, max_len) = count_lines_and_max_length(path, LINE_CAP)?;

    let mut stats = FileStats::default();
    if total_lines_hint == 0 {
        return Ok(stats);
    }

    let buffer_capacity = max_len.max(MIN_LINE_BUFFER).min(LINE_CAP);

    let basename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let pid = extract_pid(path).unwrap_or(0);

    let file = open_file(path)?;
    let mut reader = BufReader::with_capacity(SCRATCH_SIZE, file);
    let mut line_buf: Vec<u8> = Vec::with_capacity(buffer_capacity);

    loop {
        line_buf.clear();
        let read = reader
            .read_until(b'\n', &mut line_buf)
            .map_err(|e| ProcessError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        if read == 0 {
            break;
        }
        if line_buf.last() == Some(&b'\n') {
            line_buf.pop();
        }

        stats.total_lines += 1;
        let line = String::from_utf8_lossy(&line_buf);

        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(record)) => match db.append(basename, pid, &record) {
                Ok(()) => stats.parsed_lines += 1,
                Err(e) => {
                    log::warn!("{}:{}: append failed: {e}", path.display(), stats.total_lines);
                    stats.failed_lines += 1;
                }
            },
            Err(e) => {
                log::warn!("{}:{}: parse failed: {e}", path.display(), stats.total_lines);
                stats.failed_lines += 1;
            }
        }
    }

    Ok(stats)
}
