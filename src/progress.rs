//! Progress reporting for long-running load, save, and derivation passes.
//!
//! Purely observational: dropping or skipping updates never affects
//! correctness. When the owning graph is not verbose the bar is hidden and
//! every call is a no-op.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

pub(crate) struct Progress {
    bar: Option<ProgressBar>,
    start: Instant,
}

impl Progress {
    /// Starts a reporter for `total` units of work under the given label.
    pub(crate) fn new(label: impl Into<String>, total: u64, verbose: bool) -> Self {
        let bar = if verbose {
            let style = ProgressStyle::with_template("{msg} {bar:32} {pos}/{len} [{elapsed}]")
                .expect("progress template is valid");
            let bar = ProgressBar::new(total).with_style(style);
            bar.set_message(label.into());
            Some(bar)
        } else {
            None
        };
        Self {
            bar,
            start: Instant::now(),
        }
    }

    /// Marks work as processed through unit `processed`.
    pub(crate) fn update(&self, processed: u64) {
        if let Some(bar) = &self.bar {
            bar.set_position(processed);
        }
    }

    /// Ends the operation and clears the bar, returning the elapsed seconds.
    pub(crate) fn finish(self) -> f64 {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        self.start.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_when_not_verbose() {
        let progress = Progress::new("noop", 10, false);
        progress.update(5);
        assert!(progress.finish() >= 0.0);
    }

    #[test]
    fn updates_do_not_panic_past_total() {
        let progress = Progress::new("overrun", 2, true);
        progress.update(5);
        progress.finish();
    }
}
