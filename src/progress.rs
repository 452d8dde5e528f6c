//! Progress reporting utilities using indicatif.
//!
//! Narration only: progress bars are cosmetic and fully suppressed by
//! `--quiet`; nothing here may affect outcomes.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Callback for pipeline stage progress.
///
/// Implement this to receive updates while files are collected and hashed.
pub trait ProgressCallback: Send + Sync {
    /// Called when a stage starts. `total` of 0 means the total is unknown
    /// (collection), anything else is a file count.
    fn on_stage_start(&self, stage: &str, total: usize);

    /// Called once per file processed within the current stage.
    fn on_file(&self, path: &Path);

    /// Called when the current stage completes.
    fn on_stage_end(&self, stage: &str);
}

/// Terminal progress reporter.
///
/// Shows a spinner while the total is unknown and a bar once it is.
/// One stage is active at a time.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// With `quiet` set, every callback is a no-op.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn spinner(stage: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {prefix}: {pos} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_prefix(stage.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    fn counted(stage: &str, total: usize) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix}: [{bar:40.green}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_prefix(stage.to_string());
        pb
    }
}

impl ProgressCallback for Progress {
    fn on_stage_start(&self, stage: &str, total: usize) {
        if self.quiet {
            return;
        }
        let pb = if total == 0 {
            Self::spinner(stage)
        } else {
            Self::counted(stage, total)
        };
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(old) = slot.take() {
                old.finish_and_clear();
            }
            *slot = Some(pb);
        }
    }

    fn on_file(&self, path: &Path) {
        if self.quiet {
            return;
        }
        if let Ok(slot) = self.bar.lock() {
            if let Some(ref pb) = *slot {
                pb.inc(1);
                if let Some(name) = path.file_name() {
                    pb.set_message(name.to_string_lossy().into_owned());
                }
            }
        }
    }

    fn on_stage_end(&self, _stage: &str) {
        if self.quiet {
            return;
        }
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_progress_is_inert() {
        let progress = Progress::new(true);
        progress.on_stage_start("hash", 10);
        progress.on_file(Path::new("/a"));
        progress.on_stage_end("hash");
        assert!(progress.bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_stage_lifecycle_creates_and_clears_bar() {
        let progress = Progress::new(false);
        progress.on_stage_start("hash", 3);
        assert!(progress.bar.lock().unwrap().is_some());
        progress.on_file(Path::new("/a"));
        progress.on_stage_end("hash");
        assert!(progress.bar.lock().unwrap().is_none());
    }
}
