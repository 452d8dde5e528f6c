//! File collection beneath a set of root paths.
//!
//! The walker enumerates regular, non-symlink files with `walkdir`,
//! resolves every path with `canonicalize`, and deduplicates by resolved
//! path so overlapping roots never produce the same file twice. Files
//! below the configured minimum size (and empty files) are filtered here,
//! before the grouping pipeline ever sees them.
//!
//! Root validation is strict: a root that is neither a regular file nor a
//! directory aborts the run before any work. Per-entry failures inside a
//! walk (unreadable subdirectory, vanished file) are collected as warnings
//! and the walk continues.

use std::collections::HashSet;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{FileEntry, FileIdentity, ScanError};
use crate::progress::ProgressCallback;

/// Default minimum file size in bytes.
///
/// Below this the per-inode metadata overhead outweighs the savings.
pub const DEFAULT_MIN_SIZE: u64 = 1024;

/// Configuration for file collection.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Minimum file size to include (in bytes). Smaller files are counted
    /// but never collected.
    pub min_size: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
        }
    }
}

/// Result of collecting files beneath the roots.
#[derive(Debug, Default)]
pub struct Collection {
    /// Collected entries, one per unique resolved path, sorted by path
    pub files: Vec<FileEntry>,
    /// Files excluded for being below the minimum size
    pub below_min_size: usize,
    /// Empty files encountered (never candidates)
    pub empty_files: usize,
    /// Non-fatal errors encountered during the walk
    pub errors: Vec<ScanError>,
}

/// Walker over one or more root paths.
pub struct Walker {
    roots: Vec<PathBuf>,
    config: WalkConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl Walker {
    /// Create a walker for the given roots.
    #[must_use]
    pub fn new(roots: &[PathBuf], config: WalkConfig) -> Self {
        Self {
            roots: roots.to_vec(),
            config,
            progress: None,
        }
    }

    /// Attach a progress callback notified once per collected file.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Collect all eligible files beneath the roots.
    ///
    /// # Errors
    ///
    /// Fatal errors only: a root that does not exist, a root that is
    /// neither a file nor a directory, or a platform without device/inode
    /// identity. Everything else is recorded in [`Collection::errors`].
    pub fn collect(&self) -> Result<Collection, ScanError> {
        let mut out = Collection::default();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for root in &self.roots {
            let canonical = std::fs::canonicalize(root).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ScanError::NotFound(root.clone())
                } else {
                    ScanError::Io {
                        path: root.clone(),
                        source: e,
                    }
                }
            })?;

            let metadata = std::fs::metadata(&canonical).map_err(|e| ScanError::Io {
                path: canonical.clone(),
                source: e,
            })?;

            if metadata.is_file() {
                self.ingest(&canonical, &metadata, &mut seen, &mut out)?;
            } else if metadata.is_dir() {
                self.walk_dir(&canonical, &mut seen, &mut out)?;
            } else {
                return Err(ScanError::InvalidRoot(root.clone()));
            }
        }

        // Deterministic processing order for everything downstream
        out.files.sort_by(|a, b| a.path.cmp(&b.path));

        log::info!(
            "Collected {} file(s) ({} below minimum size, {} empty, {} error(s))",
            out.files.len(),
            out.below_min_size,
            out.empty_files,
            out.errors.len()
        );

        Ok(out)
    }

    /// Walk one directory root, ingesting every regular file.
    fn walk_dir(
        &self,
        root: &Path,
        seen: &mut HashSet<PathBuf>,
        out: &mut Collection,
    ) -> Result<(), ScanError> {
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                    log::warn!("Skipping unreadable entry {}: {}", path.display(), e);
                    out.errors.push(ScanError::Io {
                        path,
                        source: e.into(),
                    });
                    continue;
                }
            };

            // Regular files only; directories, symlinks, and specials are
            // not link candidates
            if !entry.file_type().is_file() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    log::warn!(
                        "Skipping {}: cannot read metadata: {}",
                        entry.path().display(),
                        e
                    );
                    out.errors.push(ScanError::Io {
                        path: entry.path().to_path_buf(),
                        source: e.into(),
                    });
                    continue;
                }
            };

            self.ingest(entry.path(), &metadata, seen, out)?;
        }

        Ok(())
    }

    /// Ingest one regular file, applying size filters and path dedup.
    fn ingest(
        &self,
        path: &Path,
        metadata: &Metadata,
        seen: &mut HashSet<PathBuf>,
        out: &mut Collection,
    ) -> Result<(), ScanError> {
        let size = metadata.len();

        if size == 0 {
            log::trace!("Skipping empty file {}", path.display());
            out.empty_files += 1;
            return Ok(());
        }
        if size < self.config.min_size {
            log::trace!(
                "Skipping {} ({} bytes, below minimum {})",
                path.display(),
                size,
                self.config.min_size
            );
            out.below_min_size += 1;
            return Ok(());
        }

        let canonical = match std::fs::canonicalize(path) {
            Ok(canonical) => canonical,
            Err(e) => {
                log::warn!("Cannot resolve {}: {}", path.display(), e);
                out.errors.push(ScanError::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
                return Ok(());
            }
        };

        if !seen.insert(canonical.clone()) {
            log::debug!("Already collected: {}", canonical.display());
            return Ok(());
        }

        let identity = FileIdentity::from_metadata(metadata)
            .ok_or_else(|| ScanError::UnsupportedPlatform(canonical.clone()))?;

        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(e) => {
                log::warn!("Cannot read mtime of {}: {}", canonical.display(), e);
                out.errors.push(ScanError::Io {
                    path: canonical,
                    source: e,
                });
                return Ok(());
            }
        };

        if let Some(ref progress) = self.progress {
            progress.on_file(&canonical);
        }

        out.files
            .push(FileEntry::new(canonical, size, identity, modified));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn collect(roots: &[PathBuf], min_size: u64) -> Collection {
        Walker::new(roots, WalkConfig { min_size })
            .collect()
            .unwrap()
    }

    #[test]
    fn test_collects_regular_files_recursively() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.bin"), vec![1u8; 2000]).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.bin"), vec![2u8; 2000]).unwrap();

        let collection = collect(&[dir.path().to_path_buf()], 1024);
        assert_eq!(collection.files.len(), 2);
        assert!(collection.errors.is_empty());
    }

    #[test]
    fn test_sorted_by_path() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("zzz"), vec![1u8; 2000]).unwrap();
        fs::write(dir.path().join("aaa"), vec![1u8; 2000]).unwrap();

        let collection = collect(&[dir.path().to_path_buf()], 1024);
        let names: Vec<_> = collection
            .files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_owned())
            .collect();
        assert_eq!(names, ["aaa", "zzz"]);
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinks_are_not_collected() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.bin");
        fs::write(&target, vec![1u8; 2000]).unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("alias.bin")).unwrap();

        let collection = collect(&[dir.path().to_path_buf()], 1024);
        assert_eq!(collection.files.len(), 1);
        assert!(collection.files[0].path.ends_with("target.bin"));
    }

    #[test]
    fn test_min_size_and_empty_filters() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tiny"), vec![0u8; 10]).unwrap();
        fs::write(dir.path().join("empty"), b"").unwrap();
        fs::write(dir.path().join("big"), vec![0u8; 1024]).unwrap();

        let collection = collect(&[dir.path().to_path_buf()], 1024);
        assert_eq!(collection.files.len(), 1);
        assert_eq!(collection.below_min_size, 1);
        assert_eq!(collection.empty_files, 1);
    }

    #[test]
    fn test_overlapping_roots_deduplicate() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("f.bin"), vec![1u8; 2000]).unwrap();

        let collection = collect(&[dir.path().to_path_buf(), sub.clone()], 1024);
        assert_eq!(collection.files.len(), 1);
    }

    #[test]
    fn test_file_root_is_collected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("single.bin");
        fs::write(&file, vec![7u8; 2000]).unwrap();

        let collection = collect(&[file.clone()], 1024);
        assert_eq!(collection.files.len(), 1);
        assert_eq!(collection.files[0].size, 2000);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = Walker::new(&[missing.clone()], WalkConfig::default())
            .collect()
            .unwrap_err();
        assert!(matches!(err, ScanError::NotFound(p) if p == missing));
    }
}
