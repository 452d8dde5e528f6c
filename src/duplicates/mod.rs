//! Duplicate detection pipeline and group types.
//!
//! # Overview
//!
//! Files are narrowed down to provably identical groups by successive
//! partitioning on ever more expensive discriminators:
//!
//! 1. **Size**: different sizes can never be duplicates
//! 2. **Device**: hard links cannot cross mount points (prerequisite, not
//!    an optimization)
//! 3. **Inode**: files already hard-linked together are identical by
//!    construction; one representative per inode continues
//! 4. **MD5**: 128-bit content digest
//! 5. **BLAKE3**: independent 256-bit content digest
//!
//! A partition that drops to a single member at any stage is discarded.
//! Groups surviving all five stages are confirmed duplicates; the oldest
//! member becomes the canonical source for linking.

pub mod partition;
pub mod pipeline;

pub use partition::{discard_singletons, partition_by};
pub use pipeline::{find_link_groups, PipelineConfig, PipelineStats};

use crate::scanner::{digest_hex, Blake3Digest, FileEntry};

/// A confirmed group of byte-identical files.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// BLAKE3 digest shared by every file in the group
    pub digest: Blake3Digest,
    /// File size in bytes, shared by every file in the group
    pub size: u64,
    /// The identical files, one entry per inode
    pub files: Vec<FileEntry>,
}

impl DuplicateGroup {
    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Bytes reclaimed if every duplicate is linked to the source.
    #[must_use]
    pub fn reclaimable_space(&self) -> u64 {
        self.size * (self.files.len().saturating_sub(1)) as u64
    }

    /// Digest as a hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        digest_hex(&self.digest)
    }

    /// Choose the canonical source and ordered duplicates for this group.
    ///
    /// Returns `None` for groups of fewer than two files.
    #[must_use]
    pub fn into_canonical(self) -> Option<CanonicalChoice> {
        CanonicalChoice::select(self.files)
    }
}

/// A canonical source with the duplicates to be relinked to it.
///
/// The source is the group member with the earliest modification time,
/// ties broken by path, so the choice is stable across runs. Preserving
/// the oldest copy keeps the metadata of the file most likely to be the
/// original.
#[derive(Debug, Clone)]
pub struct CanonicalChoice {
    /// The file preserved as the hard-link target
    pub source: FileEntry,
    /// Files to be replaced by links to the source, in selection order
    pub duplicates: Vec<FileEntry>,
}

impl CanonicalChoice {
    /// Select the canonical source from a confirmed-identical set.
    ///
    /// Returns `None` if fewer than two files are given.
    #[must_use]
    pub fn select(mut files: Vec<FileEntry>) -> Option<Self> {
        if files.len() < 2 {
            return None;
        }
        files.sort_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| a.path.cmp(&b.path))
        });
        let mut iter = files.into_iter();
        let source = iter.next()?;
        Some(Self {
            source,
            duplicates: iter.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileIdentity;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn entry(path: &str, ino: u64, mtime_secs: u64) -> FileEntry {
        FileEntry::new(
            PathBuf::from(path),
            2000,
            FileIdentity { dev: 1, ino },
            SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_secs),
        )
    }

    #[test]
    fn test_oldest_file_becomes_source() {
        let choice = CanonicalChoice::select(vec![
            entry("/c", 3, 300),
            entry("/a", 1, 100),
            entry("/b", 2, 200),
        ])
        .unwrap();

        assert_eq!(choice.source.path, PathBuf::from("/a"));
        let dup_paths: Vec<_> = choice.duplicates.iter().map(|f| f.path.clone()).collect();
        assert_eq!(dup_paths, [PathBuf::from("/b"), PathBuf::from("/c")]);
    }

    #[test]
    fn test_equal_mtime_breaks_tie_by_path() {
        let choice = CanonicalChoice::select(vec![
            entry("/z", 1, 100),
            entry("/m", 2, 100),
            entry("/a", 3, 100),
        ])
        .unwrap();
        assert_eq!(choice.source.path, PathBuf::from("/a"));
    }

    #[test]
    fn test_single_file_has_no_choice() {
        assert!(CanonicalChoice::select(vec![entry("/a", 1, 100)]).is_none());
        assert!(CanonicalChoice::select(Vec::new()).is_none());
    }

    #[test]
    fn test_reclaimable_space() {
        let group = DuplicateGroup {
            digest: [0u8; 32],
            size: 2000,
            files: vec![entry("/a", 1, 1), entry("/b", 2, 2), entry("/c", 3, 3)],
        };
        assert_eq!(group.reclaimable_space(), 4000);
    }
}
