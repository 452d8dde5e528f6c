//! Scanner module for file collection and content hashing.
//!
//! This module provides:
//! - [`walker`]: enumeration of regular, non-symlink files beneath root paths
//! - [`hasher`]: streaming MD5 and BLAKE3 content digests
//!
//! The walker produces [`FileEntry`] records, one per unique resolved path,
//! each carrying the metadata the grouping pipeline partitions on: size,
//! device, inode, and modification time.

pub mod hasher;
pub mod walker;

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use hasher::{blake3_file, digest_hex, md5_file, Blake3Digest, HashError, Md5Digest};
pub use walker::{Collection, WalkConfig, Walker, DEFAULT_MIN_SIZE};

/// Metadata for a collected file.
///
/// The path is absolute and symlink-resolved; one entry exists per unique
/// resolved path. Entries are immutable after collection; the link installer
/// may later replace the underlying directory entry, never the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute, canonicalized path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Filesystem identity (device and inode)
    pub identity: FileIdentity,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, identity: FileIdentity, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            identity,
            modified,
        }
    }

    /// The directory containing this file.
    ///
    /// Collected paths are canonical absolute file paths, so a parent always
    /// exists; "/" is returned defensively for a degenerate path.
    #[must_use]
    pub fn parent_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("/"))
    }
}

/// Filesystem identity of a file: the (device, inode) pair.
///
/// Files sharing an identity are hard links to the same underlying data.
/// Hard links can never span devices, which is why the pipeline partitions
/// on `dev` before anything content-related.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    /// Device (mount point) identifier
    pub dev: u64,
    /// Inode number on that device
    pub ino: u64,
}

impl FileIdentity {
    /// Extract the identity from file metadata.
    ///
    /// Returns `None` where the platform does not expose device and inode
    /// numbers through metadata. Linking without this identity would be
    /// unsafe, so collection refuses to proceed in that case.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    /// Extract the identity from file metadata.
    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        // Windows would need GetFileInformationByHandle on an open handle;
        // metadata alone does not carry the file index.
        None
    }
}

/// Errors that can occur during file collection.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified root path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A supplied root is neither a regular file nor a directory.
    #[error("Not a file or directory: {0}")]
    InvalidRoot(PathBuf),

    /// The platform does not expose device/inode identity.
    #[error("Cannot determine device/inode identity for {0} on this platform")]
    UnsupportedPlatform(PathBuf),

    /// An I/O error occurred while reading an entry.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// The path this error concerns.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::InvalidRoot(p)
            | Self::UnsupportedPlatform(p)
            | Self::Io { path: p, .. } => p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_dir_of_regular_path() {
        let entry = FileEntry::new(
            PathBuf::from("/data/media/song.flac"),
            4096,
            FileIdentity { dev: 1, ino: 42 },
            SystemTime::UNIX_EPOCH,
        );
        assert_eq!(entry.parent_dir(), Path::new("/data/media"));
    }

    #[test]
    #[cfg(unix)]
    fn test_identity_from_metadata_present_on_unix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"x").unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        let identity = FileIdentity::from_metadata(&meta).unwrap();
        assert!(identity.ino != 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_hard_links_share_identity() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("original");
        let link = dir.path().join("link");
        std::fs::write(&original, b"content").unwrap();
        std::fs::hard_link(&original, &link).unwrap();

        let id_a =
            FileIdentity::from_metadata(&std::fs::metadata(&original).unwrap()).unwrap();
        let id_b = FileIdentity::from_metadata(&std::fs::metadata(&link).unwrap()).unwrap();
        assert_eq!(id_a, id_b);
    }

    #[test]
    fn test_scan_error_path_accessor() {
        let err = ScanError::InvalidRoot(PathBuf::from("/dev/null"));
        assert_eq!(err.path(), Path::new("/dev/null"));
    }
}
