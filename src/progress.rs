//! Aggregate progress rendering: turns the engine's periodic
//! [`ProgressSample`] callbacks into a single terminal indicator driven by
//! `indicatif`.
//!
//! This module owns only the presentation; the counters it draws from
//! live in [`crate::engine`]. `indicatif` already no-ops its draw target
//! when stderr isn't a terminal, so `--no-progress` is the only switch
//! this module itself needs to honor.

use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::ProgressSample;

/// A renderer for the one aggregate bar tracking all in-flight files.
///
/// Construct with [`AggregateProgress::new`] (or [`AggregateProgress::disabled`]
/// under `--no-progress`) and pass [`AggregateProgress::update`] as the
/// engine's `on_progress` callback.
pub struct AggregateProgress {
    bar: Option<ProgressBar>,
}

impl AggregateProgress {
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({msg})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        AggregateProgress { bar: Some(bar) }
    }

    /// A renderer that draws nothing — used under `--no-progress`.
    pub fn disabled() -> Self {
        AggregateProgress { bar: None }
    }

    pub fn update(&self, sample: ProgressSample) {
        let Some(bar) = &self.bar else { return };
        bar.set_position(sample.files_complete + sample.files_with_errors);
        bar.set_message(format!("{} errors", sample.files_with_errors));
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
