// src/compare.rs
// =============================================================================
// This module compares files: by size, and by cryptographic hash.
//
// Hashing streams the file through a fixed 64 KiB buffer instead of reading
// it whole - reference files are often large PDFs (tens of MB) and we don't
// want them in memory.
//
// Read failures are reported as Err, never as "hashes differ": the caller
// (the verifier) needs to tell a mismatched file apart from an unreadable
// one when it writes the verdict.
//
// Rust concepts:
// - Traits as seams: sha2's Digest trait lets one loop serve any hasher
// - io::Result<T>: I/O operations that can fail
// - Enums: a closed set of supported algorithms
// =============================================================================

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

// 64 KiB: an arbitrary but fixed chunk size for streaming reads
const BUF_SIZE: usize = 64 * 1024;

/// Hash algorithms the comparator can use
///
/// Sha256 is the default and preferred choice; Md5 is retained only so that
/// results can be compared against legacy md5 records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Md5,
}

/// Compute the lowercase hex digest of a file, streaming in 64 KiB chunks
pub fn file_hash(path: &Path, algorithm: HashAlgorithm) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; BUF_SIZE];

    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break; // end of file
                }
                hasher.update(&buf[..n]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
        HashAlgorithm::Md5 => {
            let mut context = md5::Context::new();
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                context.consume(&buf[..n]);
            }
            Ok(format!("{:x}", context.compute()))
        }
    }
}

/// Do two files have identical content, per the given hash algorithm?
///
/// Err means one of the files could not be read - that is NOT the same
/// thing as Ok(false), which means both files were read and they differ.
pub fn hashes_match(a: &Path, b: &Path, algorithm: HashAlgorithm) -> io::Result<bool> {
    Ok(file_hash(a, algorithm)? == file_hash(b, algorithm)?)
}

/// Trivial, but named: keeps the "compare sizes before hashes" intent
/// readable at the call site
pub fn sizes_match(a: u64, b: u64) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file_with(content: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_sha256_known_value() {
        let f = temp_file_with(b"hello world");
        let digest = file_hash(f.path(), HashAlgorithm::Sha256).unwrap();
        // sha256 of "hello world"
        assert_eq!(
            digest,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_md5_known_value() {
        let f = temp_file_with(b"hello world");
        let digest = file_hash(f.path(), HashAlgorithm::Md5).unwrap();
        assert_eq!(digest, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_hashes_match_reflexive() {
        let f = temp_file_with(b"same bytes either way");
        assert!(hashes_match(f.path(), f.path(), HashAlgorithm::Sha256).unwrap());
    }

    #[test]
    fn test_hashes_match_symmetric() {
        let a = temp_file_with(b"one");
        let b = temp_file_with(b"two");
        let ab = hashes_match(a.path(), b.path(), HashAlgorithm::Sha256).unwrap();
        let ba = hashes_match(b.path(), a.path(), HashAlgorithm::Sha256).unwrap();
        assert_eq!(ab, ba);
        assert!(!ab);
    }

    #[test]
    fn test_identical_content_in_different_files_matches() {
        let a = temp_file_with(b"twin content");
        let b = temp_file_with(b"twin content");
        assert!(hashes_match(a.path(), b.path(), HashAlgorithm::Sha256).unwrap());
        assert!(hashes_match(a.path(), b.path(), HashAlgorithm::Md5).unwrap());
    }

    #[test]
    fn test_unreadable_file_is_err_not_false() {
        let a = temp_file_with(b"exists");
        let missing = Path::new("/definitely/not/a/real/file.bin");
        let result = hashes_match(a.path(), missing, HashAlgorithm::Sha256);
        assert!(result.is_err());
    }

    #[test]
    fn test_large_file_spans_multiple_chunks() {
        // 3 chunks plus a tail, so the streaming loop runs more than once
        let content = vec![0xabu8; BUF_SIZE * 3 + 17];
        let a = temp_file_with(&content);
        let b = temp_file_with(&content);
        assert!(hashes_match(a.path(), b.path(), HashAlgorithm::Sha256).unwrap());
    }

    #[test]
    fn test_sizes_match() {
        assert!(sizes_match(1024, 1024));
        assert!(!sizes_match(1024, 1023));
    }
}
