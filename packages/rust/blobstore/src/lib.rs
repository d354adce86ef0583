//! Blob backends that hold knowledge-document bodies.
//!
//! This crate provides:
//! - [`FsBlobStore`]: objects under a local root directory
//! - [`HttpBlobStore`]: objects fetched over HTTP(S) with an optional bearer token
//! - [`open_blob_store`]: picks a backend from [`BlobConfig`]

pub mod fs;
pub mod http;

use std::sync::Arc;
use std::time::Duration;

use promptdesk_shared::{BlobConfig, BlobStore, PromptDeskError, Result, expand_home};
use tracing::info;

pub use fs::FsBlobStore;
pub use http::HttpBlobStore;

/// Build the blob backend named by `config.backend`.
pub fn open_blob_store(config: &BlobConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend.as_str() {
        "fs" => {
            let root = expand_home(&config.root);
            info!(root = %root.display(), "using filesystem blob store");
            Ok(Arc::new(FsBlobStore::new(root)))
        }
        "http" => {
            let base_url = config.base_url.as_deref().ok_or_else(|| {
                PromptDeskError::config("blobs.base_url must be set when blobs.backend is 'http'")
            })?;
            info!(base_url, "using HTTP blob store");
            let store = HttpBlobStore::new(
                base_url,
                config.token(),
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Arc::new(store))
        }
        other => Err(PromptDeskError::config(format!(
            "unknown blob backend '{other}': expected 'fs' or 'http'"
        ))),
    }
}
