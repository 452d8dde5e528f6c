//! Filesystem mutation actions.
//!
//! The only mutation relink ever performs is replacing a duplicate file
//! with a hard link to its canonical source, via the backup-rename
//! protocol in [`link`].

pub mod link;

pub use link::{backup_path, install_link, LinkOptions, LinkOutcome, SkipReason, BACKUP_SUFFIX};
