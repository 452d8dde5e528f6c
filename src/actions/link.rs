//! Hard-link installation with a backup-rename protocol.
//!
//! # Overview
//!
//! Replacing a duplicate with a hard link must never lose data, even if
//! the process dies between any two syscalls. The protocol:
//!
//! 1. Verify the destination's directory is writable, else skip.
//! 2. Verify no leftover backup exists at `<dest>` + [`BACKUP_SUFFIX`],
//!    else skip. A leftover backup means an earlier run was interrupted
//!    and must not be silently overwritten.
//! 3. Rename the destination to the backup path. From here the original
//!    bytes are preserved under the backup name no matter what.
//! 4. Create the hard link at the destination path.
//! 5. If the link failed, rename the backup path back (best effort). A
//!    failed restore is the one unrecoverable case and is reported as
//!    such, with the backup path, for manual cleanup.
//! 6. If the link succeeded, delete the backup.
//!
//! Dry-run performs steps 1 and 2 only and reports what would happen.
//!
//! Every outcome is an explicit [`LinkOutcome`] value returned to the
//! caller; there is no shared state and no panic-based unwinding.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix appended to a destination path to form its backup path.
pub const BACKUP_SUFFIX: &str = ".relink.bak";

/// The backup path for a destination file.
#[must_use]
pub fn backup_path(dest: &Path) -> PathBuf {
    let mut os = dest.as_os_str().to_os_string();
    os.push(BACKUP_SUFFIX);
    PathBuf::from(os)
}

/// Options for link installation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkOptions {
    /// Validate only; perform no filesystem mutation.
    pub dry_run: bool,
}

/// Reason a duplicate was skipped before any mutation was attempted.
///
/// Skips are always safe: the filesystem was not touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The destination's containing directory is not writable.
    ReadOnlyDirectory(PathBuf),
    /// The destination's containing directory could not be inspected.
    DirectoryInaccessible {
        /// The directory that could not be inspected
        dir: PathBuf,
        /// The underlying error message
        message: String,
    },
    /// A backup file from an interrupted earlier run already exists.
    BackupExists(PathBuf),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadOnlyDirectory(dir) => {
                write!(f, "directory {} is not writable", dir.display())
            }
            Self::DirectoryInaccessible { dir, message } => {
                write!(f, "cannot inspect directory {}: {}", dir.display(), message)
            }
            Self::BackupExists(backup) => write!(
                f,
                "leftover backup {} exists (interrupted earlier run?)",
                backup.display()
            ),
        }
    }
}

/// Outcome of one link installation.
#[derive(Debug)]
pub enum LinkOutcome {
    /// The duplicate is now a hard link to the source.
    Linked,
    /// Dry-run: preconditions hold, the duplicate would have been linked.
    WouldLink,
    /// A precondition failed; nothing was mutated.
    Skipped(SkipReason),
    /// A mutation was attempted and did not complete; the original file
    /// is intact at its path.
    Failed {
        /// Protocol step that failed
        step: &'static str,
        /// The underlying I/O error
        source: io::Error,
    },
    /// The unrecoverable case: a backup file remains on disk and needs
    /// operator attention. If `link_installed` is true the destination is
    /// a valid link and only the backup needs removal; otherwise the
    /// original content lives in the backup file.
    StrandedBackup {
        /// Path of the surviving backup file
        backup: PathBuf,
        /// Whether the hard link was installed at the destination
        link_installed: bool,
        /// The error that stranded the backup
        source: io::Error,
    },
}

impl LinkOutcome {
    /// True for outcomes that count as a (possibly would-be) link.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Linked | Self::WouldLink)
    }

    /// True for precondition skips.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

impl std::fmt::Display for LinkOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linked => write!(f, "linked"),
            Self::WouldLink => write!(f, "would link"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Failed { step, source } => write!(f, "{step} failed: {source}"),
            Self::StrandedBackup {
                backup,
                link_installed,
                source,
            } => {
                if *link_installed {
                    write!(
                        f,
                        "link installed but backup {} could not be removed: {source}",
                        backup.display()
                    )
                } else {
                    write!(
                        f,
                        "restore failed, original content preserved at {}: {source}",
                        backup.display()
                    )
                }
            }
        }
    }
}

/// Replace `dest` with a hard link to `source`.
///
/// `source` and `dest` must be paths to regular files on the same
/// filesystem; the grouping pipeline guarantees both. Every failure mode
/// is an explicit [`LinkOutcome`]; this function never panics and never
/// leaves the destination without its content except in the loudly
/// reported [`LinkOutcome::StrandedBackup`] case.
#[must_use]
pub fn install_link(source: &Path, dest: &Path, options: LinkOptions) -> LinkOutcome {
    let dir = dest.parent().unwrap_or(Path::new("/"));

    // Step 1: the containing directory must be writable
    match fs::metadata(dir) {
        Ok(metadata) => {
            if metadata.permissions().readonly() {
                log::warn!("Skipping {}: directory not writable", dest.display());
                return LinkOutcome::Skipped(SkipReason::ReadOnlyDirectory(dir.to_path_buf()));
            }
        }
        Err(e) => {
            log::warn!("Skipping {}: cannot inspect {}: {}", dest.display(), dir.display(), e);
            return LinkOutcome::Skipped(SkipReason::DirectoryInaccessible {
                dir: dir.to_path_buf(),
                message: e.to_string(),
            });
        }
    }

    // Step 2: a leftover backup must never be overwritten
    let backup = backup_path(dest);
    if backup.symlink_metadata().is_ok() {
        log::warn!(
            "Skipping {}: leftover backup {} exists",
            dest.display(),
            backup.display()
        );
        return LinkOutcome::Skipped(SkipReason::BackupExists(backup));
    }

    if options.dry_run {
        log::info!("Would link {} <- {}", source.display(), dest.display());
        return LinkOutcome::WouldLink;
    }

    // Step 3: preserve the original under the backup name. Rename is
    // atomic; after this point the bytes exist under exactly one of the
    // two names at all times.
    if let Err(e) = fs::rename(dest, &backup) {
        log::error!("Cannot rename {} to backup: {}", dest.display(), e);
        return LinkOutcome::Failed {
            step: "backup rename",
            source: e,
        };
    }

    // Step 4: install the link
    match fs::hard_link(source, dest) {
        Ok(()) => {
            // Step 6: drop the backup
            match fs::remove_file(&backup) {
                Ok(()) => {
                    log::info!("Linked {} <- {}", source.display(), dest.display());
                    LinkOutcome::Linked
                }
                Err(e) => {
                    log::error!(
                        "Linked {} but backup {} could not be removed: {}",
                        dest.display(),
                        backup.display(),
                        e
                    );
                    LinkOutcome::StrandedBackup {
                        backup,
                        link_installed: true,
                        source: e,
                    }
                }
            }
        }
        Err(link_err) => {
            // Step 5: put the original back
            match fs::rename(&backup, dest) {
                Ok(()) => {
                    log::error!(
                        "Link of {} failed ({}), original restored",
                        dest.display(),
                        link_err
                    );
                    LinkOutcome::Failed {
                        step: "hard link",
                        source: link_err,
                    }
                }
                Err(restore_err) => {
                    log::error!(
                        "Link of {} failed AND restore failed: original content is at {}: {}",
                        dest.display(),
                        backup.display(),
                        restore_err
                    );
                    LinkOutcome::StrandedBackup {
                        backup,
                        link_installed: false,
                        source: restore_err,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[cfg(unix)]
    fn inode(path: &Path) -> u64 {
        use std::os::unix::fs::MetadataExt;
        fs::metadata(path).unwrap().ino()
    }

    #[test]
    #[cfg(unix)]
    fn test_successful_link_shares_inode_and_leaves_no_backup() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "source", b"identical content here");
        let dest = write(&dir, "dest", b"identical content here");

        let outcome = install_link(&source, &dest, LinkOptions::default());
        assert!(matches!(outcome, LinkOutcome::Linked));
        assert_eq!(inode(&source), inode(&dest));
        assert!(!backup_path(&dest).exists());
        assert_eq!(fs::read(&dest).unwrap(), b"identical content here");
    }

    #[test]
    fn test_dry_run_mutates_nothing() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "source", b"content");
        let dest = write(&dir, "dest", b"content");

        let outcome = install_link(&source, &dest, LinkOptions { dry_run: true });
        assert!(matches!(outcome, LinkOutcome::WouldLink));
        assert!(outcome.is_success());
        #[cfg(unix)]
        assert_ne!(inode(&source), inode(&dest));
        assert!(!backup_path(&dest).exists());
    }

    #[test]
    fn test_leftover_backup_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "source", b"content");
        let dest = write(&dir, "dest", b"content");
        let backup = backup_path(&dest);
        fs::write(&backup, b"precious bytes from an interrupted run").unwrap();

        let outcome = install_link(&source, &dest, LinkOptions::default());
        assert!(matches!(
            outcome,
            LinkOutcome::Skipped(SkipReason::BackupExists(_))
        ));
        // Neither the destination nor the old backup was touched
        assert_eq!(fs::read(&dest).unwrap(), b"content");
        assert_eq!(
            fs::read(&backup).unwrap(),
            b"precious bytes from an interrupted run"
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_read_only_directory_is_skipped_without_mutation() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let source = write(&dir, "source", b"content");
        let dest = sub.join("dest");
        fs::write(&dest, b"content").unwrap();

        fs::set_permissions(&sub, fs::Permissions::from_mode(0o555)).unwrap();
        let outcome = install_link(&source, &dest, LinkOptions::default());
        fs::set_permissions(&sub, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(
            outcome,
            LinkOutcome::Skipped(SkipReason::ReadOnlyDirectory(_))
        ));
        assert!(!backup_path(&dest).exists());
        assert_eq!(fs::read(&dest).unwrap(), b"content");
    }

    #[test]
    fn test_failed_link_restores_original() {
        let dir = TempDir::new().unwrap();
        let missing_source = dir.path().join("vanished");
        let dest = write(&dir, "dest", b"original bytes");

        // The rename to backup succeeds, the hard link fails (source is
        // gone), and the restore puts the original back
        let outcome = install_link(&missing_source, &dest, LinkOptions::default());
        assert!(matches!(outcome, LinkOutcome::Failed { step: "hard link", .. }));
        assert_eq!(fs::read(&dest).unwrap(), b"original bytes");
        assert!(!backup_path(&dest).exists());
    }

    #[test]
    fn test_backup_path_appends_suffix() {
        let backup = backup_path(Path::new("/data/file.bin"));
        assert_eq!(
            backup,
            PathBuf::from(format!("/data/file.bin{BACKUP_SUFFIX}"))
        );
    }

    #[test]
    fn test_outcome_display_names_paths() {
        let outcome = LinkOutcome::Skipped(SkipReason::BackupExists(PathBuf::from("/x.bak")));
        assert!(outcome.to_string().contains("/x.bak"));
        assert!(outcome.is_skip());
    }
}
