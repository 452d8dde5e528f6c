//! Streaming content digests.
//!
//! Two independent digests back the duplicate confirmation: MD5 (128-bit)
//! as the first discriminator and BLAKE3 (256-bit) as the second. Agreement
//! on one digest is never treated as proof; only files matching on both are
//! declared identical, which makes an accidental collision across both
//! functions cryptographically implausible without a byte-by-byte compare.
//!
//! Files are read in fixed-size blocks so memory use stays bounded for
//! arbitrarily large files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

/// Read block size for streaming digests.
pub const BLOCK_SIZE: usize = 8192;

/// 128-bit MD5 digest.
pub type Md5Digest = [u8; 16];

/// 256-bit BLAKE3 digest.
pub type Blake3Digest = [u8; 32];

/// Errors that can occur while hashing a file.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// An I/O error occurred while reading the file.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path of the file being hashed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// The path of the file that failed to hash.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } => path,
        }
    }
}

/// Stream a file through `update` in [`BLOCK_SIZE`] chunks.
fn stream_file(path: &Path, mut update: impl FnMut(&[u8])) -> Result<(), HashError> {
    let file = File::open(path).map_err(|e| HashError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = BufReader::new(file);
    let mut buffer = [0u8; BLOCK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| HashError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if bytes_read == 0 {
            break;
        }
        update(&buffer[..bytes_read]);
    }

    Ok(())
}

/// Compute the MD5 digest of a file's content.
///
/// # Errors
///
/// Returns [`HashError::Io`] if the file cannot be opened or read. The
/// caller must surface the error; an unreadable file is never silently
/// dropped from consideration.
pub fn md5_file(path: &Path) -> Result<Md5Digest, HashError> {
    let mut hasher = Md5::new();
    stream_file(path, |block| hasher.update(block))?;
    log::trace!("MD5 computed for {}", path.display());
    Ok(hasher.finalize().into())
}

/// Compute the BLAKE3 digest of a file's content.
///
/// # Errors
///
/// Returns [`HashError::Io`] if the file cannot be opened or read.
pub fn blake3_file(path: &Path) -> Result<Blake3Digest, HashError> {
    let mut hasher = blake3::Hasher::new();
    stream_file(path, |block| {
        hasher.update(block);
    })?;
    log::trace!("BLAKE3 computed for {}", path.display());
    Ok(*hasher.finalize().as_bytes())
}

/// Render a digest as a lowercase hex string.
#[must_use]
pub fn digest_hex(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_identical_content_identical_digests() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"the same bytes");
        let b = write_file(&dir, "b", b"the same bytes");

        assert_eq!(md5_file(&a).unwrap(), md5_file(&b).unwrap());
        assert_eq!(blake3_file(&a).unwrap(), blake3_file(&b).unwrap());
    }

    #[test]
    fn test_different_content_different_digests() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"some bytes");
        let b = write_file(&dir, "b", b"some bytez");

        assert_ne!(md5_file(&a).unwrap(), md5_file(&b).unwrap());
        assert_ne!(blake3_file(&a).unwrap(), blake3_file(&b).unwrap());
    }

    #[test]
    fn test_md5_known_vector() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "abc", b"abc");
        // RFC 1321 test vector for "abc"
        assert_eq!(
            digest_hex(&md5_file(&path).unwrap()),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[test]
    fn test_multi_block_file_streams() {
        let dir = TempDir::new().unwrap();
        let content = vec![0xA5u8; BLOCK_SIZE * 3 + 17];
        let big = write_file(&dir, "big", &content);
        let copy = write_file(&dir, "copy", &content);

        assert_eq!(blake3_file(&big).unwrap(), blake3_file(&copy).unwrap());
        assert_eq!(md5_file(&big).unwrap(), md5_file(&copy).unwrap());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        let err = md5_file(&missing).unwrap_err();
        assert_eq!(err.path(), missing.as_path());
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_digest_hex_format() {
        assert_eq!(digest_hex(&[0x00, 0xab, 0xff]), "00abff");
    }
}
