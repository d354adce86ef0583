//! Filesystem blob backend.
//!
//! Locations are relative paths under a root directory. Anything that could
//! escape the root (absolute paths, `..`, drive prefixes) is rejected before
//! touching the disk.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use promptdesk_shared::{BlobStore, PromptDeskError, Result};
use tracing::debug;

/// Blob store backed by a local directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. The directory is not created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a location to a path under the root, rejecting anything unsafe.
    pub fn resolve(&self, location: &str) -> Result<PathBuf> {
        if location.trim().is_empty() {
            return Err(PromptDeskError::validation("blob location must not be empty"));
        }

        let rel = Path::new(location);
        for component in rel.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(PromptDeskError::validation(format!(
                        "blob location '{location}' escapes the store root"
                    )));
                }
            }
        }

        Ok(self.root.join(rel))
    }

    /// Write `bytes` at `location`, creating parent directories as needed.
    pub async fn store(&self, location: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.resolve(location)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PromptDeskError::io(parent, e))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PromptDeskError::io(&path, e))?;
        debug!(path = %path.display(), size = bytes.len(), "stored blob");
        Ok(path)
    }

    /// Delete the blob at `location`. Returns `false` if it did not exist.
    pub async fn remove(&self, location: &str) -> Result<bool> {
        let path = self.resolve(location)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed blob");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PromptDeskError::io(&path, e)),
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn backend(&self) -> &str {
        "fs"
    }

    async fn fetch_text(&self, location: &str) -> Result<String> {
        let path = self.resolve(location)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PromptDeskError::NotFound(format!("blob {location}"))
            } else {
                PromptDeskError::io(&path, e)
            }
        })?;
        debug!(path = %path.display(), size = bytes.len(), "read blob");
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("pd-blobs-{}", uuid::Uuid::now_v7()))
    }

    #[tokio::test]
    async fn store_then_fetch() {
        let root = temp_root();
        let store = FsBlobStore::new(&root);

        store
            .store("buyer-1/policy.txt", b"Net 30 payment terms.")
            .await
            .expect("store");
        let text = store.fetch_text("buyer-1/policy.txt").await.expect("fetch");
        assert_eq!(text, "Net 30 payment terms.");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn remove_reports_existence() {
        let root = temp_root();
        let store = FsBlobStore::new(&root);
        store.store("buyer-1/old.txt", b"stale").await.expect("store");

        assert!(store.remove("buyer-1/old.txt").await.expect("remove"));
        assert!(!store.remove("buyer-1/old.txt").await.expect("remove again"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn missing_blob_is_not_found() {
        let store = FsBlobStore::new(temp_root());
        let err = store.fetch_text("nope.txt").await.unwrap_err();
        assert!(matches!(err, PromptDeskError::NotFound(_)));
    }

    #[tokio::test]
    async fn invalid_utf8_is_decoded_lossily() {
        let root = temp_root();
        let store = FsBlobStore::new(&root);
        store.store("bin.txt", &[b'o', b'k', 0xff]).await.unwrap();

        let text = store.fetch_text("bin.txt").await.unwrap();
        assert!(text.starts_with("ok"));
        assert!(text.contains('\u{FFFD}'));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn resolve_rejects_traversal() {
        let store = FsBlobStore::new("/srv/blobs");
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("a/../../b").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("  ").is_err());
    }

    #[test]
    fn resolve_joins_relative_paths() {
        let store = FsBlobStore::new("/srv/blobs");
        assert_eq!(
            store.resolve("buyer-1/policy.txt").unwrap(),
            PathBuf::from("/srv/blobs/buyer-1/policy.txt")
        );
    }
}
