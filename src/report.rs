//! Outcome aggregation and report rendering.
//!
//! Pure data: the tracker accumulates per-duplicate outcomes as the link
//! installer produces them and renders them once at the end of the run.
//! Successes are keyed by canonical source, skips and failures by the
//! duplicate's containing directory. Keys keep insertion order so reports
//! are deterministic for a deterministic pipeline order.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use yansi::Paint;

use crate::actions::LinkOutcome;
use crate::error::ExitCode;
use crate::scanner::FileEntry;

/// One affected path under an outcome key, with the reason where there is
/// one (skips and failures).
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeEntry {
    /// The affected duplicate path
    pub path: PathBuf,
    /// Why the outcome happened (absent for successes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Mapping from a key path to the ordered sequence of affected paths.
///
/// Keys iterate in insertion order; values keep their insertion order too.
#[derive(Debug, Default)]
pub struct OutcomeMap {
    order: Vec<PathBuf>,
    entries: HashMap<PathBuf, Vec<OutcomeEntry>>,
}

impl OutcomeMap {
    /// Append an entry under a key, creating the key on first use.
    pub fn insert(&mut self, key: &Path, entry: OutcomeEntry) {
        let key = key.to_path_buf();
        if !self.entries.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.entries.entry(key).or_default().push(entry);
    }

    /// Iterate keys and their entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[OutcomeEntry])> {
        self.order.iter().map(|key| {
            (
                key.as_path(),
                self.entries.get(key).map_or(&[][..], Vec::as_slice),
            )
        })
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when no outcome has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total number of affected paths across all keys.
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl Serialize for OutcomeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for (key, entries) in self.iter() {
            map.serialize_entry(&key.to_string_lossy(), entries)?;
        }
        map.end()
    }
}

/// A read error surfaced in the report (collection or hashing).
#[derive(Debug, Clone, Serialize)]
pub struct ReportedError {
    /// The path that could not be read
    pub path: PathBuf,
    /// The error message
    pub message: String,
}

/// Run-level counters.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Summary {
    /// Files that entered the pipeline
    pub files_considered: usize,
    /// Files excluded for being below the minimum size
    pub below_min_size: usize,
    /// Confirmed duplicate groups
    pub groups_confirmed: usize,
    /// Links installed (or, in a dry run, links that would be installed)
    pub links_installed: usize,
    /// Bytes reclaimed by those links
    pub bytes_reclaimed: u64,
    /// Whether this was a dry run
    pub dry_run: bool,
}

/// Aggregated outcomes of a run.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    /// Successful (or would-be) links, keyed by canonical source
    pub linked: OutcomeMap,
    /// Precondition skips, keyed by containing directory
    pub skipped: OutcomeMap,
    /// Failed mutations, keyed by containing directory
    pub failed: OutcomeMap,
    /// Backup files left on disk that need manual attention
    pub stranded_backups: Vec<PathBuf>,
    /// Read errors from collection and hashing
    pub errors: Vec<ReportedError>,
    /// Run-level counters
    pub summary: Summary,
}

impl RunReport {
    /// Create a report for a run.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            summary: Summary {
                dry_run,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Record the outcome of one link installation.
    pub fn record(&mut self, source: &FileEntry, duplicate: &FileEntry, outcome: &LinkOutcome) {
        match outcome {
            LinkOutcome::Linked | LinkOutcome::WouldLink => {
                self.linked.insert(
                    &source.path,
                    OutcomeEntry {
                        path: duplicate.path.clone(),
                        reason: None,
                    },
                );
                self.summary.links_installed += 1;
                self.summary.bytes_reclaimed += duplicate.size;
            }
            LinkOutcome::Skipped(reason) => {
                self.skipped.insert(
                    duplicate.parent_dir(),
                    OutcomeEntry {
                        path: duplicate.path.clone(),
                        reason: Some(reason.to_string()),
                    },
                );
            }
            LinkOutcome::Failed { .. } => {
                self.failed.insert(
                    duplicate.parent_dir(),
                    OutcomeEntry {
                        path: duplicate.path.clone(),
                        reason: Some(outcome.to_string()),
                    },
                );
            }
            LinkOutcome::StrandedBackup { backup, .. } => {
                self.failed.insert(
                    duplicate.parent_dir(),
                    OutcomeEntry {
                        path: duplicate.path.clone(),
                        reason: Some(outcome.to_string()),
                    },
                );
                self.stranded_backups.push(backup.clone());
            }
        }
    }

    /// Record a read error from collection or hashing.
    pub fn record_read_error(&mut self, path: &Path, message: String) {
        self.errors.push(ReportedError {
            path: path.to_path_buf(),
            message,
        });
    }

    /// The process exit code this report implies: success only when no
    /// skip, failure, stranded backup, or read error was recorded.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.skipped.is_empty()
            && self.failed.is_empty()
            && self.stranded_backups.is_empty()
            && self.errors.is_empty()
        {
            ExitCode::Success
        } else {
            ExitCode::Partial
        }
    }

    /// Render the report as human-readable text.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let dry_marker = if self.summary.dry_run { " (dry run)" } else { "" };

        if !self.linked.is_empty() {
            let _ = writeln!(
                out,
                "{}{}:",
                format!(
                    "Linked {} duplicate(s) to {} source(s)",
                    self.linked.total_entries(),
                    self.linked.len()
                )
                .green()
                .bold(),
                dry_marker
            );
            for (source, entries) in self.linked.iter() {
                let _ = writeln!(out, "  {}", source.display());
                for entry in entries {
                    let _ = writeln!(out, "    <- {}", entry.path.display());
                }
            }
        }

        if !self.skipped.is_empty() {
            let _ = writeln!(
                out,
                "{}:",
                format!("Skipped {} duplicate(s)", self.skipped.total_entries())
                    .yellow()
                    .bold()
            );
            for (dir, entries) in self.skipped.iter() {
                let _ = writeln!(out, "  {}", dir.display());
                for entry in entries {
                    let _ = writeln!(
                        out,
                        "    {} ({})",
                        entry.path.display(),
                        entry.reason.as_deref().unwrap_or("unknown reason")
                    );
                }
            }
        }

        if !self.failed.is_empty() {
            let _ = writeln!(
                out,
                "{}:",
                format!("Failed {} duplicate(s)", self.failed.total_entries())
                    .red()
                    .bold()
            );
            for (dir, entries) in self.failed.iter() {
                let _ = writeln!(out, "  {}", dir.display());
                for entry in entries {
                    let _ = writeln!(
                        out,
                        "    {} ({})",
                        entry.path.display(),
                        entry.reason.as_deref().unwrap_or("unknown reason")
                    );
                }
            }
        }

        for backup in &self.stranded_backups {
            let _ = writeln!(
                out,
                "{} backup file remains at {}",
                "MANUAL CLEANUP REQUIRED:".red().bold(),
                backup.display()
            );
        }

        if !self.errors.is_empty() {
            let _ = writeln!(
                out,
                "{}:",
                format!("Read errors ({})", self.errors.len()).red().bold()
            );
            for error in &self.errors {
                let _ = writeln!(out, "  {}: {}", error.path.display(), error.message);
            }
        }

        let _ = write!(
            out,
            "{} file(s) considered, {} group(s) confirmed, {} link(s), {} reclaimed{}",
            self.summary.files_considered,
            self.summary.groups_confirmed,
            self.summary.links_installed,
            ByteSize::b(self.summary.bytes_reclaimed),
            dry_marker
        );

        out
    }

    /// Render the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
