//! Hashing utilities for fingerprinting generated files.

use std::path::{Path, PathBuf};

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::util::fs::write_string;

/// Compute SHA256 hash of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute SHA256 hash of a string.
pub fn sha256_str(s: &str) -> String {
    sha256_bytes(s.as_bytes())
}

/// The path of the checksum file written for `path`.
pub fn checksum_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Write `<path>.sha256` for the contents of `path`, in the format
/// `sha256sum --check` reads. Returns the hash.
pub fn write_checksum(path: &Path, contents: &[u8]) -> Result<String> {
    let hash = sha256_bytes(contents);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    write_string(&checksum_path(path), &format!("{}  {}\n", hash, name))?;
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sha256() {
        assert_eq!(
            sha256_str(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(sha256_str("TEMPLATE = app\n"), sha256_bytes(b"TEMPLATE = app\n"));
    }

    #[test]
    fn test_write_checksum() {
        let tmp = TempDir::new().unwrap();
        let pro = tmp.path().join("demo.pro");

        let hash = write_checksum(&pro, b"").unwrap();
        let written = std::fs::read_to_string(tmp.path().join("demo.pro.sha256")).unwrap();
        assert_eq!(written, format!("{}  demo.pro\n", hash));
    }
}
