//! Command-line interface definitions for relink.
//!
//! This module defines all CLI arguments using the clap derive API. relink is
//! a single-command tool: it takes one or more root paths and flags that
//! control linking behavior and reporting.
//!
//! # Example
//!
//! ```bash
//! # Preview what would be linked under a media library
//! relink --dry-run ~/media
//!
//! # Link duplicates across two backup trees, JSON report for scripting
//! relink /backup/2024 /backup/2025 --report json
//!
//! # Only consider files of at least 1 MiB
//! relink --min-size 1MiB /srv/archive
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replace duplicate files with hard links to reclaim disk space.
///
/// relink scans the given roots for regular files with byte-identical
/// content (confirmed by two independent digests) and replaces every
/// redundant copy with a hard link to the oldest copy. Files already
/// hard-linked together are recognized and left alone.
#[derive(Debug, Parser)]
#[command(name = "relink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root paths to deduplicate (directories are walked recursively)
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Validate and report without touching the filesystem
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Suppress progress narration (never affects the final report)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Minimum file size to consider (e.g. 4096, 64KiB, 1MB)
    ///
    /// Files below this size are never hashed or linked; the per-inode
    /// metadata overhead outweighs the savings. Supports suffixes:
    /// B, KB, KiB, MB, MiB, GB, GiB, TB, TiB.
    #[arg(long, value_name = "SIZE", value_parser = parse_size, default_value = "1KiB")]
    pub min_size: u64,

    /// Report format (text for humans, json for scripting)
    #[arg(long, value_enum, default_value = "text")]
    pub report: ReportFormat,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

/// Output format for the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable text report
    Text,
    /// JSON report for scripting
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB.
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use relink::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    // Longest suffixes first so "KiB" is not consumed as "B"
    const UNITS: &[(&str, u64)] = &[
        ("TIB", 1 << 40),
        ("GIB", 1 << 30),
        ("MIB", 1 << 20),
        ("KIB", 1 << 10),
        ("TB", 1_000_000_000_000),
        ("GB", 1_000_000_000),
        ("MB", 1_000_000),
        ("KB", 1_000),
        ("T", 1_000_000_000_000),
        ("G", 1_000_000_000),
        ("M", 1_000_000),
        ("K", 1_000),
        ("B", 1),
    ];

    let upper = s.trim().to_uppercase();
    if upper.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (number, multiplier) = UNITS
        .iter()
        .find_map(|(suffix, multiplier)| {
            upper
                .strip_suffix(suffix)
                .map(|rest| (rest.trim_end().to_string(), *multiplier))
        })
        .unwrap_or((upper, 1));

    let value: f64 = number
        .parse()
        .map_err(|_| format!("Invalid size: '{s}'"))?;
    if value < 0.0 || !value.is_finite() {
        return Err(format!("Invalid size: '{s}'"));
    }

    Ok((value * multiplier as f64) as u64)
}
