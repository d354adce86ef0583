//! Collaborator traits the session pipeline is written against.
//!
//! The pipeline never talks to a database or object store directly. It
//! receives implementations of these traits, so the same code runs against
//! libSQL + a blob backend in production and against in-memory fakes in
//! tests.
//!
//! ```text
//! PromptVersionStore ──┐
//!                      ├──▶ SessionService ──▶ ChatSession
//! DocumentStore ───────┘
//!   └─ DocumentCatalog + BlobStore
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{KnowledgeDocument, SystemPromptVersion};

/// Read access to saved system-prompt revisions.
#[async_trait]
pub trait PromptVersionStore: Send + Sync {
    /// All revisions belonging to `user_id`, in no guaranteed order.
    async fn prompt_versions(&self, user_id: &str) -> Result<Vec<SystemPromptVersion>>;
}

/// Read access to the metadata side of a user's knowledge library.
#[async_trait]
pub trait DocumentCatalog: Send + Sync {
    /// Document descriptors belonging to `user_id`, in library order.
    async fn list_documents(&self, user_id: &str) -> Result<Vec<KnowledgeDocument>>;
}

/// Raw object storage addressed by a location string.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend label for logs (`"fs"`, `"http"`).
    fn backend(&self) -> &str;

    /// Download the object at `location` and decode it as text.
    async fn fetch_text(&self, location: &str) -> Result<String>;
}

/// The document-management collaborator: listing plus download.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Document descriptors belonging to `user_id`, in library order.
    async fn list_documents(&self, user_id: &str) -> Result<Vec<KnowledgeDocument>>;

    /// Download the text content of a single document.
    async fn download_document(&self, doc: &KnowledgeDocument) -> Result<String>;
}
