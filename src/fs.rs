//! Local file helpers
//!
//! Input validation (existence, size, readability), SHA-256 digests for
//! comparing against store-reported checksums, and atomic writes for saved
//! artifacts (tempfile + rename).

use std::fs;
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::error::{StorycheckError, StorycheckResult};

/// Fail with `InputNotFound` unless `path` names an existing regular file
pub fn ensure_file(path: &Path) -> StorycheckResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(StorycheckError::InputNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Size of an existing file in bytes
pub fn file_size(path: &Path) -> StorycheckResult<u64> {
    ensure_file(path)?;
    Ok(fs::metadata(path)?.len())
}

/// Validate an archive before any remote traffic: exists and within limit
pub fn validate_archive(path: &Path, limit_bytes: u64) -> StorycheckResult<()> {
    let size_bytes = file_size(path)?;
    if size_bytes > limit_bytes {
        return Err(StorycheckError::InputTooLarge {
            path: path.to_path_buf(),
            size_bytes,
            limit_bytes,
        });
    }
    Ok(())
}

/// Read a text document, enforcing the document size limit
///
/// Empty (after trimming) or non-UTF-8 content is `InputUnreadable` - a
/// blank user story would produce a meaningless review.
pub fn read_document(path: &Path, limit_bytes: u64) -> StorycheckResult<String> {
    let size_bytes = file_size(path)?;
    if size_bytes > limit_bytes {
        return Err(StorycheckError::InputTooLarge {
            path: path.to_path_buf(),
            size_bytes,
            limit_bytes,
        });
    }
    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|_| StorycheckError::InputUnreadable {
        path: path.to_path_buf(),
        reason: "content is not valid UTF-8".to_string(),
    })?;
    if text.trim().is_empty() {
        return Err(StorycheckError::InputUnreadable {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }
    Ok(text)
}

/// Base64-encoded SHA-256 of a file, matching the store's digest encoding
pub fn sha256_base64(path: &Path) -> StorycheckResult<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(BASE64.encode(hasher.finalize()))
}

/// Write content to a file atomically
///
/// Uses the tempfile + rename pattern so a crash mid-write never leaves a
/// truncated artifact. Parent directories are created as needed.
pub fn atomic_write(path: &Path, content: &str) -> StorycheckResult<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent)?;
    }
    let dir = parent.unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_file_missing() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.zip");
        let err = ensure_file(&missing).unwrap_err();
        assert!(matches!(
            err,
            StorycheckError::InputNotFound { path } if path == missing
        ));
    }

    #[test]
    fn test_validate_archive_respects_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("project.zip");
        fs::write(&path, vec![0u8; 32]).unwrap();

        assert!(validate_archive(&path, 32).is_ok());
        let err = validate_archive(&path, 31).unwrap_err();
        assert!(matches!(
            err,
            StorycheckError::InputTooLarge { size_bytes: 32, limit_bytes: 31, .. }
        ));
    }

    #[test]
    fn test_read_document_rejects_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("story.txt");
        fs::write(&path, "  \n\t ").unwrap();

        let err = read_document(&path, 1024).unwrap_err();
        assert!(matches!(err, StorycheckError::InputUnreadable { .. }));
    }

    #[test]
    fn test_read_document_rejects_non_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("story.txt");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();

        let err = read_document(&path, 1024).unwrap_err();
        assert!(matches!(err, StorycheckError::InputUnreadable { .. }));
    }

    #[test]
    fn test_read_document_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("story.txt");
        fs::write(&path, "Implement login").unwrap();

        assert_eq!(read_document(&path, 1024).unwrap(), "Implement login");
    }

    #[test]
    fn test_sha256_base64_known_vector() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"abc").unwrap();

        // SHA-256("abc"), base64-encoded
        assert_eq!(
            sha256_base64(&path).unwrap(),
            "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0="
        );
    }

    #[test]
    fn test_atomic_write_new_and_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/feedback.md");

        atomic_write(&path, "first").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        atomic_write(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }
}
