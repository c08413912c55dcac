//! File storage for submission PDFs and evaluation attachments
//!
//! Every write gets a fresh UUID-based name, so concurrent uploads never
//! contend on shared state and a reference never collides with or
//! overwrites an earlier file.

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Outcome of a successful store operation
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Opaque reference to pass back for later retrieval
    pub file_ref: String,
    /// SHA-256 of the contents, hex-encoded
    pub checksum: String,
    /// Size in bytes
    pub size: usize,
}

/// Abstraction over the blob store backing uploads
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist the bytes under a fresh reference
    async fn store(&self, bytes: &[u8], extension: &str) -> Result<StoredFile>;

    /// Read back a previously stored file
    async fn load(&self, file_ref: &str) -> Result<Vec<u8>>;

    async fn exists(&self, file_ref: &str) -> Result<bool>;

    async fn delete(&self, file_ref: &str) -> Result<()>;
}

/// Stores files on the local filesystem under a single flat directory
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the backing directory if it does not exist yet
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// References are flat names we generated ourselves; anything with a
    /// path separator is hostile input.
    fn resolve(&self, file_ref: &str) -> Result<PathBuf> {
        if file_ref.is_empty()
            || file_ref.contains('/')
            || file_ref.contains('\\')
            || file_ref.contains("..")
        {
            return Err(AppError::Validation {
                message: "Referência de arquivo inválida".to_string(),
                field: Some("file_ref".to_string()),
            });
        }
        Ok(self.root.join(file_ref))
    }

    fn sanitize_extension(extension: &str) -> String {
        let ext: String = extension
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(8)
            .collect();
        if ext.is_empty() {
            "bin".to_string()
        } else {
            ext.to_ascii_lowercase()
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, bytes: &[u8], extension: &str) -> Result<StoredFile> {
        let file_ref = format!("{}.{}", Uuid::new_v4(), Self::sanitize_extension(extension));
        let path = self.root.join(&file_ref);

        tokio::fs::write(&path, bytes).await?;

        let stored = StoredFile {
            file_ref,
            checksum: sha256_hex(bytes),
            size: bytes.len(),
        };

        tracing::debug!(
            file_ref = %stored.file_ref,
            size = stored.size,
            "File stored"
        );
        crate::metrics::record_file_stored(stored.size);

        Ok(stored)
    }

    async fn load(&self, file_ref: &str) -> Result<Vec<u8>> {
        let path = self.resolve(file_ref)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound {
                resource_type: "file".to_string(),
                id: file_ref.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, file_ref: &str) -> Result<bool> {
        let path = self.resolve(file_ref)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn delete(&self, file_ref: &str) -> Result<()> {
        let path = self.resolve(file_ref)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Extension sniffed from an uploaded filename, defaulting to pdf
pub fn extension_of(filename: &str) -> &str {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in_tempdir() -> (tempfile::TempDir, LocalFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_store_and_load_round_trip() {
        let (_dir, store) = store_in_tempdir();

        let stored = store.store(b"%PDF-1.7 fake", "pdf").await.unwrap();
        assert!(stored.file_ref.ends_with(".pdf"));
        assert_eq!(stored.size, 13);

        let bytes = store.load(&stored.file_ref).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.7 fake");
    }

    #[tokio::test]
    async fn test_concurrent_stores_get_distinct_refs() {
        let (_dir, store) = store_in_tempdir();

        let a = store.store(b"first", "pdf").await.unwrap();
        let b = store.store(b"second", "pdf").await.unwrap();
        assert_ne!(a.file_ref, b.file_ref);

        assert_eq!(store.load(&a.file_ref).await.unwrap(), b"first");
        assert_eq!(store.load(&b.file_ref).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_checksum_is_sha256_hex() {
        let (_dir, store) = store_in_tempdir();
        let stored = store.store(b"abc", "pdf").await.unwrap();
        assert_eq!(
            stored.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_load_missing_file_is_not_found() {
        let (_dir, store) = store_in_tempdir();
        let err = store.load("missing.pdf").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_path_traversal_is_rejected() {
        let (_dir, store) = store_in_tempdir();
        for hostile in ["../etc/passwd", "a/b.pdf", "..", ""] {
            let err = store.load(hostile).await.unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
        }
    }

    #[tokio::test]
    async fn test_extension_is_sanitized() {
        let (_dir, store) = store_in_tempdir();
        let stored = store.store(b"x", "../PDF").await.unwrap();
        assert!(stored.file_ref.ends_with(".pdf"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("paper.pdf"), "pdf");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("noext"), "pdf");
    }
}
