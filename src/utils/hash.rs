//! Content hashing using FxHash.
//!
//! Uses `rustc_hash::FxHasher` for fast, deterministic fingerprints of module
//! source files. Not cryptographic: only used to tell whether a file's bytes
//! differ from the last successfully loaded version.

use rustc_hash::FxHasher;
use std::hash::Hasher;
use std::io;
use std::path::Path;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}

/// Hash the current content of a file.
pub fn compute_file(path: &Path) -> io::Result<u64> {
    Ok(compute(&std::fs::read(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_compute_deterministic() {
        assert_eq!(compute("answer = 42"), compute("answer = 42"));
        assert_ne!(compute("answer = 42"), compute("answer = 17"));
    }

    #[test]
    fn test_compute_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("answer.json");
        fs::write(&path, "{ \"answer\": 42 }").unwrap();

        let before = compute_file(&path).unwrap();
        fs::write(&path, "{ \"answer\": 17 }").unwrap();
        assert_ne!(compute_file(&path).unwrap(), before);
    }

    #[test]
    fn test_compute_file_missing() {
        let dir = TempDir::new().unwrap();
        assert!(compute_file(&dir.path().join("missing.json")).is_err());
    }
}
