//! The database façade: a thin wrapper around a `duckdb::Connection` that
//! owns at most one bulk-append session at a time.
//!
//! A [`Db`] is either the coordinator's handle (owns the instance, created
//! via [`Db::open`]) or a worker's handle (a clone of an existing
//! connection, created via [`Db::connect_to`]). Both variants carry an
//! independent connection — DuckDB serialises writers internally, so
//! sharing one instance across many connections is how the parallel
//! engine gets concurrent appenders without a lock of our own.

use std::path::Path;

use duckdb::{Appender, Connection, params};

use crate::error::DbError;
use crate::record::Record;

const TABLE: &str = "syscalls";

const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS syscalls (
    trace_file VARCHAR,
    pid INTEGER,
    timestamp VARCHAR,
    syscall VARCHAR,
    args TEXT,
    return_value BIGINT,
    error_code VARCHAR,
    error_message VARCHAR,
    duration DOUBLE,
    unfinished BOOLEAN DEFAULT FALSE,
    resumed BOOLEAN DEFAULT FALSE
);
CREATE INDEX IF NOT EXISTS idx_syscalls_syscall ON syscalls(syscall);
CREATE INDEX IF NOT EXISTS idx_syscalls_pid ON syscalls(pid);
CREATE INDEX IF NOT EXISTS idx_syscalls_error_code ON syscalls(error_code);
CREATE INDEX IF NOT EXISTS idx_syscalls_trace_file ON syscalls(trace_file);
";

/// Distinguishes the coordinator's handle from a worker's handle.
///
/// Only the `Owner` is conceptually responsible for the database
/// instance's lifetime; `Borrower` handles are connection-scoped. DuckDB
/// itself reference-counts the underlying instance across connections
/// opened from the same one (see [`Connection::try_clone`]), so in
/// practice every handle's `Drop` can simply close its own connection —
/// this flag exists so the type mirrors the ownership contract rather
/// than leaving it implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owner,
    Borrower,
}

/// Summary statistics over the `syscalls` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DbSummary {
    pub total_rows: i64,
    pub distinct_syscalls: i64,
    pub distinct_pids: i64,
    pub failed_rows: i64,
}

/// A connection to the `syscalls` database, with an optional active
/// bulk-append session.
///
/// `connection` is boxed so its address is stable regardless of where
/// this `Db` is moved to — `appender` borrows from it with a lifetime
/// unsafely widened to `'static`, and that widening is only sound as long
/// as the referent never moves out from under it. See [`Db::begin_append`].
pub struct Db {
    connection: Box<Connection>,
    appender: Option<Appender<'static>>,
    ownership: Ownership,
}

impl Db {
    /// Open (or create) the database at `path` and create the schema.
    /// The returned handle is the owner.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let connection = Connection::open(path).map_err(DbError::OpenFailed)?;
        connection
            .execute_batch(SCHEMA_SQL)
            .map_err(DbError::SchemaFailed)?;
        Ok(Db {
            connection: Box::new(connection),
            appender: None,
            ownership: Ownership::Owner,
        })
    }

    /// Open a second, independent connection onto the same instance this
    /// handle is connected to. The returned handle is a borrower.
    pub fn connect_to(&self) -> Result<Self, DbError> {
        Ok(Self::from_connection(self.clone_connection()?, Ownership::Borrower))
    }

    /// Clone the underlying connection without wrapping it in a `Db`.
    ///
    /// Used by the parallel engine, which needs to move a bare
    /// `Connection` into a worker thread and only assemble the `Db` (and
    /// its append session) once it's running there — `Appender` borrows
    /// the connection it was created from, and there's no need to reason
    /// about whether that borrow is `Send` if it's never asked to cross a
    /// thread boundary in the first place.
    pub fn clone_connection(&self) -> Result<Connection, DbError> {
        self.connection.try_clone().map_err(DbError::OpenFailed)
    }

    /// Wrap an already-open connection as a borrower handle with no
    /// active append session.
    pub fn from_connection(connection: Connection, ownership: Ownership) -> Self {
        Db {
            connection: Box::new(connection),
            appender: None,
            ownership,
        }
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Start a bulk-append session bound to the `syscalls` table.
    /// Idempotent: an existing session is torn down first.
    pub fn begin_append(&mut self) -> Result<(), DbError> {
        self.end_append()?;

        let appender = self
            .connection
            .appender(TABLE)
            .map_err(DbError::AppenderInitFailed)?;

        // SAFETY: `appender` borrows `*self.connection`, which lives in a
        // `Box` whose heap allocation does not move when `Db` itself
        // moves. The widened lifetime is only ever read back out through
        // `&mut self` methods on this same `Db`, and `end_append`/`Drop`
        // guarantee the appender is destroyed before `connection` is, so
        // the borrow never outlives its referent in practice.
        let appender: Appender<'static> = unsafe { std::mem::transmute(appender) };
        self.appender = Some(appender);
        Ok(())
    }

    /// Append one row. Columns are bound in schema order; absent optional
    /// fields become SQL NULL.
    pub fn append(&mut self, trace_file: &str, pid: i32, record: &Record<'_>) -> Result<(), DbError> {
        let appender = self
            .appender
            .as_mut()
            .ok_or(DbError::AppenderNotInitialized)?;

        appender
            .append_row(params![
                trace_file,
                pid,
                record.timestamp,
                record.syscall_name,
                record.args,
                record.return_value,
                record.error_code,
                record.error_message,
                record.duration_seconds,
                record.unfinished,
                record.resumed,
            ])
            .map_err(DbError::AppendFailed)?;
        Ok(())
    }

    /// Flush and destroy the active append session, if any. Safe to call
    /// when no session is active.
    pub fn end_append(&mut self) -> Result<(), DbError> {
        if let Some(mut appender) = self.appender.take() {
            appender.flush().map_err(DbError::AppendFailed)?;
        }
        Ok(())
    }

    /// Total row count in `syscalls`.
    pub fn total_rows(&self) -> Result<i64, DbError> {
        self.scalar_query("SELECT count(*) FROM syscalls")
    }

    /// Count of distinct `syscall` names.
    pub fn distinct_syscalls(&self) -> Result<i64, DbError> {
        self.scalar_query("SELECT count(DISTINCT syscall) FROM syscalls")
    }

    /// Count of distinct `pid` values.
    pub fn distinct_pids(&self) -> Result<i64, DbError> {
        self.scalar_query("SELECT count(DISTINCT pid) FROM syscalls")
    }

    /// Count of rows carrying a non-null `error_code`.
    pub fn failed_rows(&self) -> Result<i64, DbError> {
        self.scalar_query("SELECT count(*) FROM syscalls WHERE error_code IS NOT NULL")
    }

    /// Run all four summary queries at once.
    pub fn summary(&self) -> Result<DbSummary, DbError> {
        Ok(DbSummary {
            total_rows: self.total_rows()?,
            distinct_syscalls: self.distinct_syscalls()?,
            distinct_pids: self.distinct_pids()?,
            failed_rows: self.failed_rows()?,
        })
    }

    fn scalar_query(&self, sql: &str) -> Result<i64, DbError> {
        self.connection
            .query_row(sql, [], |row| row.get(0))
            .map_err(DbError::QueryFailed)
    }

    /// Destroy the append session (if any) and disconnect. Only the owner
    /// closing does anything different to the underlying instance — see
    /// [`Ownership`].
    pub fn close(mut self) -> Result<(), DbError> {
        self.end_append()
    }
}

impl Drop for Db {
    fn drop(&mut self) {
        // Best-effort on teardown: a failed flush here has nowhere left
        // to report to, but dropping without flushing would silently
        // lose buffered rows.
        let _ = self.end_append();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn open_creates_schema_and_starts_empty() {
        let db = Db::open(Path::new(":memory:")).unwrap();
        assert_eq!(db.total_rows().unwrap(), 0);
        assert_eq!(db.ownership(), Ownership::Owner);
    }

    #[test]
    fn append_without_session_is_an_error() {
        let mut db = Db::open(Path::new(":memory:")).unwrap();
        let record = Record::new_complete("10:00:00.000000", "read", "3, buf, 4", Some(4), None, None, None);
        let err = db.append("trace.1", 1, &record).unwrap_err();
        assert!(matches!(err, DbError::AppenderNotInitialized));
    }

    #[test]
    fn append_and_summary_round_trip() {
        let mut db = Db::open(Path::new(":memory:")).unwrap();
        db.begin_append().unwrap();

        let ok = Record::new_complete("10:00:00.000000", "read", "3, buf, 4", Some(4), None, None, None);
        let failing = Record::new_complete(
            "10:00:00.000001",
            "open",
            "\"/x\", O_RDONLY",
            Some(-1),
            Some("ENOENT"),
            Some("No such file or directory"),
            None,
        );
        db.append("trace.1", 1, &ok).unwrap();
        db.append("trace.2", 2, &failing).unwrap();
        db.end_append().unwrap();

        let summary = db.summary().unwrap();
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.distinct_syscalls, 2);
        assert_eq!(summary.distinct_pids, 2);
        assert_eq!(summary.failed_rows, 1);
    }

    #[test]
    fn begin_append_is_idempotent_and_does_not_lose_nothing_pending() {
        let mut db = Db::open(Path::new(":memory:")).unwrap();
        db.begin_append().unwrap();
        let r = Record::new_complete("10:00:00.000000", "read", "3, buf, 4", Some(4), None, None, None);
        db.append("trace.1", 1, &r).unwrap();
        // A second begin_append flushes the first session before opening a new one.
        db.begin_append().unwrap();
        db.append("trace.1", 1, &r).unwrap();
        db.end_append().unwrap();
        assert_eq!(db.total_rows().unwrap(), 2);
    }

    #[test]
    fn connect_to_shares_the_same_instance() {
        let coordinator = Db::open(Path::new(":memory:")).unwrap();
        let mut worker = coordinator.connect_to().unwrap();
        assert_eq!(worker.ownership(), Ownership::Borrower);

        worker.begin_append().unwrap();
        let r = Record::new_complete("10:00:00.000000", "read", "3, buf, 4", Some(4), None, None, None);
        worker.append("trace.1", 1, &r).unwrap();
        worker.end_append().unwrap();

        assert_eq!(coordinator.total_rows().unwrap(), 1);
    }
}
