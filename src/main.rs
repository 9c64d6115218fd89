//! CLI entry point. Its job is limited to gathering paths/options from
//! `clap` and calling into `strace_to_duckdb`; the flag-parsing mechanics
//! themselves are `clap`'s job, and the ingestion logic lives in the
//! library crate.

use std::path::PathBuf;

use clap::Parser;

use strace_to_duckdb::{default_worker_count, ingest, IngestOptions, IngestReport};

#[derive(Parser, Debug)]
#[command(name = "strace-to-duckdb", version, about = "Parse strace(1) trace files and bulk-load the decoded syscalls into a DuckDB database.")]
struct Cli {
    /// One or more strace trace files, produced with `-tt`/`-ttt` (and
    /// optionally `-T`).
    #[arg(value_name = "FILE", required = true)]
    trace_files: Vec<PathBuf>,

    /// Output database path. Removed first if it already exists.
    #[arg(short, long, value_name = "PATH", default_value = "strace.db")]
    output: PathBuf,

    /// Worker thread count. Defaults to the logical CPU count, clamped to
    /// the number of input files.
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Enable debug-level logging.
    #[arg(short, long)]
    verbose: bool,

    /// Disable the terminal progress indicator.
    #[arg(long)]
    no_progress: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap's own exit code for usage errors is 2; this crate's exit
            // contract only distinguishes success (0, e.g. --help/--version)
            // from failure (1).
            err.print().ok();
            std::process::exit(if err.exit_code() == 0 { 0 } else { 1 });
        }
    };

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let workers = cli
        .workers
        .unwrap_or_else(|| default_worker_count(cli.trace_files.len()));

    let options = IngestOptions {
        output: cli.output.clone(),
        workers,
        show_progress: !cli.no_progress,
    };

    match ingest(&cli.trace_files, &options) {
        Ok(report) => print_summary(&cli.output, &report),
        Err(err) => {
            log::error!("ingestion failed: {err}");
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn print_summary(output: &std::path::Path, report: &IngestReport) {
    println!("files processed:   {}", report.stats.files_complete);
    println!("files with errors: {}", report.stats.files_with_errors);
    println!("total lines:       {}", report.stats.total_lines);
    println!("parsed lines:      {}", report.stats.parsed_lines);
    println!("failed lines:      {}", report.stats.failed_lines);
    println!("output database:   {}", output.display());
    println!();
    println!("database summary:");
    println!("  total rows:         {}", report.summary.total_rows);
    println!("  distinct syscalls:  {}", report.summary.distinct_syscalls);
    println!("  distinct pids:      {}", report.summary.distinct_pids);
    println!("  failed syscalls:    {}", report.summary.failed_rows);
}
