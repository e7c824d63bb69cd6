//! Progress reporting: a spinner that counts comments as they are appended.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A small wrapper around an `indicatif` bar.
/// - `inc_items(delta)` increments progress
/// - `finish(msg)` finalizes the bar with a message
pub struct ProgressScope {
    pb: ProgressBar,
}

impl ProgressScope {
    /// Open-ended counter; the total is unknown until pagination is exhausted.
    pub fn spinner<T: Into<String>>(label: T) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} {msg} {pos} comments  it/s: {per_sec}  elapsed: {elapsed_precise}",
        ) {
            pb.set_style(style);
        }
        let label = label.into();
        if !label.is_empty() {
            pb.set_message(label);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    /// Counts without drawing anything.
    pub fn hidden() -> Self {
        Self { pb: ProgressBar::hidden() }
    }

    #[inline]
    pub fn inc_items(&self, delta: u64) {
        self.pb.inc(delta);
    }

    pub fn finish<T: Into<String>>(&self, msg: T) {
        self.pb.finish_with_message(msg.into());
    }
}
