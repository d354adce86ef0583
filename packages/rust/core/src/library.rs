//! [`DocumentStore`] built from a catalog plus a blob backend.

use std::sync::Arc;

use async_trait::async_trait;
use promptdesk_shared::{BlobStore, DocumentCatalog, DocumentStore, KnowledgeDocument, Result};

/// A user's knowledge library: descriptors from a catalog, bodies from a blob store.
#[derive(Clone)]
pub struct Library {
    catalog: Arc<dyn DocumentCatalog>,
    blobs: Arc<dyn BlobStore>,
}

impl Library {
    pub fn new(catalog: Arc<dyn DocumentCatalog>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { catalog, blobs }
    }
}

#[async_trait]
impl DocumentStore for Library {
    async fn list_documents(&self, user_id: &str) -> Result<Vec<KnowledgeDocument>> {
        self.catalog.list_documents(user_id).await
    }

    async fn download_document(&self, doc: &KnowledgeDocument) -> Result<String> {
        tracing::trace!(backend = self.blobs.backend(), path = %doc.storage_path, "downloading document");
        self.blobs.fetch_text(&doc.storage_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use promptdesk_blobstore::FsBlobStore;
    use promptdesk_shared::RecordId;
    use promptdesk_storage::Storage;

    #[tokio::test]
    async fn downloads_by_storage_path() {
        let tmp = std::env::temp_dir().join(format!("pd-library-{}", uuid::Uuid::now_v7()));
        let storage = Storage::open(&tmp.join("pd.db")).await.unwrap();
        let blobs = FsBlobStore::new(tmp.join("blobs"));

        blobs
            .store("buyer-1/rfq.txt", b"RFQ process: three quotes minimum.")
            .await
            .unwrap();
        storage
            .insert_document(&KnowledgeDocument {
                id: RecordId::new().to_string(),
                user_id: "buyer-1".into(),
                name: "RFQ Process.docx".into(),
                original_format: "docx".into(),
                size: 33,
                storage_path: "buyer-1/rfq.txt".into(),
                uploaded_at: Utc::now(),
            })
            .await
            .unwrap();

        let library = Library::new(Arc::new(storage), Arc::new(blobs));
        let docs = library.list_documents("buyer-1").await.unwrap();
        assert_eq!(docs.len(), 1);

        let body = library.download_document(&docs[0]).await.unwrap();
        assert_eq!(body, "RFQ process: three quotes minimum.");

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
