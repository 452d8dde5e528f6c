//! The five-stage grouping pipeline.
//!
//! Straight-line partition-then-filter stages over collections. Metadata
//! stages (size, device, inode) cost nothing; the two digest stages read
//! file content and only ever run on groups that still have more than one
//! member. An I/O error while hashing abandons the whole affected group:
//! a group with an unreadable member can never be confirmed, and the error
//! is surfaced rather than silently shrinking the group.

use std::hash::Hash;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::{discard_singletons, partition_by, DuplicateGroup};
use crate::progress::ProgressCallback;
use crate::scanner::{blake3_file, md5_file, FileEntry, HashError};

/// Configuration for the grouping pipeline.
#[derive(Clone, Default)]
pub struct PipelineConfig {
    /// Number of threads for parallel hashing. 0 means a sensible default.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for the digest stages.
    pub progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Default number of hashing threads. Kept low to avoid disk thrashing.
pub const DEFAULT_IO_THREADS: usize = 4;

impl PipelineConfig {
    /// Set the number of I/O threads for the digest stages.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn effective_threads(&self) -> usize {
        if self.io_threads == 0 {
            DEFAULT_IO_THREADS
        } else {
            self.io_threads
        }
    }
}

/// Statistics from a pipeline run.
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Files that entered the pipeline
    pub input_files: usize,
    /// Files discarded for having a unique size
    pub unique_size: usize,
    /// Files discarded for being alone on their device within a size group
    pub isolated_device: usize,
    /// Directory entries collapsed because they share an inode with a
    /// retained representative
    pub already_linked: usize,
    /// Files discarded after the MD5 stage
    pub unique_md5: usize,
    /// Files discarded after the BLAKE3 stage
    pub unique_blake3: usize,
    /// Files successfully hashed (counted once per digest)
    pub hashed_files: usize,
    /// Total bytes fed through the hashers
    pub bytes_hashed: u64,
    /// Errors encountered while hashing
    pub hash_errors: Vec<HashError>,
    /// Groups abandoned because a member failed to hash
    pub abandoned_groups: usize,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Confirmed duplicate files (excluding each group's source)
    pub duplicate_files: usize,
    /// Bytes reclaimable if every duplicate is linked
    pub reclaimable_bytes: u64,
    /// Whether the run was interrupted by shutdown
    pub interrupted: bool,
}

/// Run the full grouping pipeline over the collected files.
///
/// Returns confirmed duplicate groups and statistics. An interrupted run
/// returns early with `stats.interrupted` set and no groups; hash failures
/// abandon the affected group and are collected in `stats.hash_errors`.
#[must_use]
pub fn find_link_groups(
    files: Vec<FileEntry>,
    config: &PipelineConfig,
) -> (Vec<DuplicateGroup>, PipelineStats) {
    let mut stats = PipelineStats {
        input_files: files.len(),
        ..Default::default()
    };

    // Stage 1: size
    let (groups, discarded) = discard_singletons(partition_by(files, |f| f.size));
    stats.unique_size = discarded;
    log::info!(
        "Size stage: {} file(s) in {} group(s), {} unique discarded",
        stats.input_files - discarded,
        groups.len(),
        discarded
    );

    // Stage 2: device. Hard links cannot cross mount points, so this is a
    // prerequisite for everything that follows.
    let mut device_groups = Vec::new();
    for group in groups {
        let (kept, discarded) = discard_singletons(partition_by(group, |f| f.identity.dev));
        stats.isolated_device += discarded;
        device_groups.extend(kept);
    }

    // Stage 3: inode dedup. Entries sharing an inode are already links to
    // the same data; keep one representative each and skip re-hashing.
    let mut inode_groups = Vec::new();
    for group in device_groups {
        let mut representatives = Vec::new();
        for links in partition_by(group, |f| f.identity.ino) {
            stats.already_linked += links.len() - 1;
            if let Some(first) = links.into_iter().next() {
                representatives.push(first);
            }
        }
        if representatives.len() > 1 {
            inode_groups.push(representatives);
        }
    }
    log::info!(
        "Metadata stages left {} group(s) to hash ({} entr(ies) already hard-linked)",
        inode_groups.len(),
        stats.already_linked
    );

    if inode_groups.is_empty() {
        return (Vec::new(), stats);
    }

    // Stage 4: first digest (MD5, 128-bit)
    let md5_groups = digest_stage(inode_groups, "md5", config, &mut stats, |path| {
        md5_file(path)
    });
    stats.unique_md5 = md5_groups.1;
    let groups: Vec<Vec<FileEntry>> = md5_groups.0.into_iter().map(|(_, g)| g).collect();

    if stats.interrupted || groups.is_empty() {
        return (Vec::new(), stats);
    }

    // Stage 5: second digest (BLAKE3, 256-bit). Matching on both
    // independent digests is the confirmation of identical content.
    let blake3_groups = digest_stage(groups, "blake3", config, &mut stats, |path| {
        blake3_file(path)
    });
    stats.unique_blake3 = blake3_groups.1;

    if stats.interrupted {
        return (Vec::new(), stats);
    }

    let confirmed: Vec<DuplicateGroup> = blake3_groups
        .0
        .into_iter()
        .filter_map(|(digest, files)| {
            let size = files.first().map_or(0, |f| f.size);
            if files.len() > 1 {
                Some(DuplicateGroup {
                    digest,
                    size,
                    files,
                })
            } else {
                None
            }
        })
        .collect();

    stats.duplicate_groups = confirmed.len();
    stats.duplicate_files = confirmed.iter().map(|g| g.len() - 1).sum();
    stats.reclaimable_bytes = confirmed.iter().map(DuplicateGroup::reclaimable_space).sum();

    log::info!(
        "Pipeline complete: {} confirmed group(s), {} duplicate file(s), {} byte(s) reclaimable",
        stats.duplicate_groups,
        stats.duplicate_files,
        stats.reclaimable_bytes
    );

    (confirmed, stats)
}

/// Run one digest stage: hash every member of every group, partition each
/// group by digest, and keep contested partitions.
///
/// Returns the surviving `(digest, files)` groups and the number of files
/// discarded as unique. A hash failure abandons the whole group.
fn digest_stage<D, F>(
    groups: Vec<Vec<FileEntry>>,
    stage: &str,
    config: &PipelineConfig,
    stats: &mut PipelineStats,
    digest_fn: F,
) -> (Vec<(D, Vec<FileEntry>)>, usize)
where
    D: Eq + Hash + Copy + Send,
    F: Fn(&Path) -> Result<D, HashError> + Sync,
{
    let total: usize = groups.iter().map(Vec::len).sum();
    if let Some(ref progress) = config.progress {
        progress.on_stage_start(stage, total);
    }
    log::info!("Hashing {} file(s) with {}", total, stage);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.effective_threads())
        .build();

    let mut survivors = Vec::new();
    let mut discarded = 0;

    for group in groups {
        if config.is_shutdown_requested() {
            log::info!("{} stage interrupted by shutdown", stage);
            stats.interrupted = true;
            break;
        }

        let hash_group = || -> Vec<(FileEntry, Result<D, HashError>)> {
            group
                .into_par_iter()
                .map(|file| {
                    let result = digest_fn(&file.path);
                    if let Some(ref progress) = config.progress {
                        progress.on_file(&file.path);
                    }
                    (file, result)
                })
                .collect()
        };
        let hashed = match pool {
            Ok(ref pool) => pool.install(hash_group),
            Err(ref e) => {
                log::warn!("Falling back to the global thread pool: {}", e);
                hash_group()
            }
        };

        if hashed.iter().any(|(_, result)| result.is_err()) {
            // One unreadable member makes the whole group unconfirmable
            stats.abandoned_groups += 1;
            for (file, result) in hashed {
                match result {
                    Ok(_) => {
                        stats.hashed_files += 1;
                        stats.bytes_hashed += file.size;
                    }
                    Err(e) => {
                        log::error!("Abandoning group of {}: {}", file.path.display(), e);
                        stats.hash_errors.push(e);
                    }
                }
            }
            continue;
        }

        let mut pairs = Vec::with_capacity(hashed.len());
        for (file, result) in hashed {
            stats.hashed_files += 1;
            stats.bytes_hashed += file.size;
            if let Ok(digest) = result {
                pairs.push((file, digest));
            }
        }

        for sub in partition_by(pairs, |(_, digest)| *digest) {
            if sub.len() > 1 {
                let digest = sub[0].1;
                survivors.push((digest, sub.into_iter().map(|(file, _)| file).collect()));
            } else {
                discarded += sub.len();
            }
        }
    }

    if let Some(ref progress) = config.progress {
        progress.on_stage_end(stage);
    }

    (survivors, discarded)
}
