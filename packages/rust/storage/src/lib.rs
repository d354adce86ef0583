//! libSQL record store for prompt revisions and knowledge-library descriptors.
//!
//! The [`Storage`] struct wraps a local libSQL database. Document bodies are
//! not stored here; each descriptor carries a `storage_path` that points into
//! the blob store.
//!
//! **Access rules:**
//! - CLI seeding commands: read-write via [`Storage::open`]
//! - Session assembly: read-only is enough, see [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, params};
use promptdesk_shared::{
    DocumentCatalog, KnowledgeDocument, PromptDeskError, PromptVersionStore, RecordId, Result,
    SystemPromptVersion,
};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PromptDeskError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| PromptDeskError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| PromptDeskError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PromptDeskError::NotFound(format!(
                "database {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| PromptDeskError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| PromptDeskError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        PromptDeskError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(PromptDeskError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Prompt revisions
    // -----------------------------------------------------------------------

    /// Save a new prompt revision for `user_id`, numbered one past the current maximum.
    pub async fn save_prompt_version(
        &self,
        user_id: &str,
        system_prompt: &str,
        evaluation: &str,
        ai_model: &str,
    ) -> Result<SystemPromptVersion> {
        self.check_writable()?;

        let mut rows = self
            .conn
            .query(
                "SELECT COALESCE(MAX(version), 0) FROM prompt_versions WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(storage_err)?;
        let current: i64 = match rows.next().await.map_err(storage_err)? {
            Some(row) => row.get(0).map_err(storage_err)?,
            None => 0,
        };

        let record = SystemPromptVersion {
            id: RecordId::new().to_string(),
            version: current + 1,
            system_prompt: system_prompt.to_string(),
            evaluation: evaluation.to_string(),
            saved_date: Utc::now(),
            ai_model: ai_model.to_string(),
            user_id: user_id.to_string(),
        };

        self.conn
            .execute(
                "INSERT INTO prompt_versions (id, user_id, version, system_prompt, evaluation, saved_date, ai_model)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id.as_str(),
                    record.user_id.as_str(),
                    record.version,
                    record.system_prompt.as_str(),
                    record.evaluation.as_str(),
                    format_ts(&record.saved_date),
                    record.ai_model.as_str(),
                ],
            )
            .await
            .map_err(storage_err)?;

        tracing::debug!(user_id, version = record.version, "saved prompt version");
        Ok(record)
    }

    /// All prompt revisions for `user_id`, in insertion order.
    pub async fn prompt_versions(&self, user_id: &str) -> Result<Vec<SystemPromptVersion>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, version, system_prompt, evaluation, saved_date, ai_model, user_id
                 FROM prompt_versions WHERE user_id = ?1 ORDER BY rowid",
                params![user_id],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_prompt_version(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Knowledge documents
    // -----------------------------------------------------------------------

    /// Register a document descriptor.
    pub async fn insert_document(&self, doc: &KnowledgeDocument) -> Result<()> {
        self.check_writable()?;
        let size = i64::try_from(doc.size).map_err(|_| {
            PromptDeskError::validation(format!("document size {} is out of range", doc.size))
        })?;
        self.conn
            .execute(
                "INSERT INTO knowledge_documents (id, user_id, name, original_format, size, storage_path, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    doc.id.as_str(),
                    doc.user_id.as_str(),
                    doc.name.as_str(),
                    doc.original_format.as_str(),
                    size,
                    doc.storage_path.as_str(),
                    format_ts(&doc.uploaded_at),
                ],
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// List a user's documents, oldest upload first.
    pub async fn list_documents(&self, user_id: &str) -> Result<Vec<KnowledgeDocument>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, name, original_format, size, storage_path, uploaded_at
                 FROM knowledge_documents WHERE user_id = ?1 ORDER BY uploaded_at, rowid",
                params![user_id],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_document(&row)?);
        }
        Ok(results)
    }

    /// Delete a document descriptor by ID. Returns whether a row was removed.
    pub async fn delete_document(&self, id: &str) -> Result<bool> {
        self.check_writable()?;
        let affected = self
            .conn
            .execute("DELETE FROM knowledge_documents WHERE id = ?1", params![id])
            .await
            .map_err(storage_err)?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl PromptVersionStore for Storage {
    async fn prompt_versions(&self, user_id: &str) -> Result<Vec<SystemPromptVersion>> {
        Storage::prompt_versions(self, user_id).await
    }
}

#[async_trait]
impl DocumentCatalog for Storage {
    async fn list_documents(&self, user_id: &str) -> Result<Vec<KnowledgeDocument>> {
        Storage::list_documents(self, user_id).await
    }
}

fn storage_err(e: libsql::Error) -> PromptDeskError {
    PromptDeskError::Storage(e.to_string())
}

/// Fixed-width timestamps so lexical order matches chronological order.
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PromptDeskError::Storage(format!("invalid date: {e}")))
}

/// Convert a database row to a [`SystemPromptVersion`].
fn row_to_prompt_version(row: &libsql::Row) -> Result<SystemPromptVersion> {
    Ok(SystemPromptVersion {
        id: row.get::<String>(0).map_err(storage_err)?,
        version: row.get::<i64>(1).map_err(storage_err)?,
        system_prompt: row.get::<String>(2).map_err(storage_err)?,
        evaluation: row.get::<String>(3).unwrap_or_default(),
        saved_date: parse_ts(&row.get::<String>(4).map_err(storage_err)?)?,
        ai_model: row.get::<String>(5).unwrap_or_default(),
        user_id: row.get::<String>(6).map_err(storage_err)?,
    })
}

/// Convert a database row to a [`KnowledgeDocument`].
fn row_to_document(row: &libsql::Row) -> Result<KnowledgeDocument> {
    Ok(KnowledgeDocument {
        id: row.get::<String>(0).map_err(storage_err)?,
        user_id: row.get::<String>(1).map_err(storage_err)?,
        name: row.get::<String>(2).map_err(storage_err)?,
        original_format: row.get::<String>(3).map_err(storage_err)?,
        size: u64::try_from(row.get::<i64>(4).map_err(storage_err)?)
            .map_err(|_| PromptDeskError::Storage("negative document size".into()))?,
        storage_path: row.get::<String>(5).map_err(storage_err)?,
        uploaded_at: parse_ts(&row.get::<String>(6).map_err(storage_err)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("pd_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn make_doc(user_id: &str, name: &str, uploaded_at: DateTime<Utc>) -> KnowledgeDocument {
        KnowledgeDocument {
            id: RecordId::new().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            original_format: "pdf".into(),
            size: 2048,
            storage_path: format!("{user_id}/{name}.txt"),
            uploaded_at,
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("pd_test_{}.db", Uuid::now_v7()));
        let _s1 = Storage::open(&tmp).await.expect("first open");
        drop(_s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn prompt_versions_increment_per_user() {
        let storage = test_storage().await;

        let v1 = storage
            .save_prompt_version("buyer-1", "first", "", "model-a")
            .await
            .expect("save v1");
        let v2 = storage
            .save_prompt_version("buyer-1", "second", "tighter tone", "model-b")
            .await
            .expect("save v2");
        let other = storage
            .save_prompt_version("buyer-2", "other user", "", "model-a")
            .await
            .expect("save other");

        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);
        assert_eq!(other.version, 1);

        let versions = storage.prompt_versions("buyer-1").await.expect("list");
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].system_prompt, "second");
        assert_eq!(versions[1].evaluation, "tighter tone");
        assert_eq!(versions[1].ai_model, "model-b");
    }

    #[tokio::test]
    async fn unknown_user_has_no_versions() {
        let storage = test_storage().await;
        let versions = storage.prompt_versions("nobody").await.expect("list");
        assert!(versions.is_empty());
    }

    #[tokio::test]
    async fn document_size_round_trips_or_is_rejected() {
        let storage = test_storage().await;

        let mut largest = make_doc("buyer-1", "archive", Utc::now());
        largest.size = i64::MAX as u64;
        storage.insert_document(&largest).await.expect("insert largest");
        let docs = storage.list_documents("buyer-1").await.expect("list");
        assert_eq!(docs[0].size, i64::MAX as u64);

        let mut too_large = make_doc("buyer-1", "overflow", Utc::now());
        too_large.size = u64::MAX;
        let err = storage.insert_document(&too_large).await.unwrap_err();
        assert!(matches!(err, PromptDeskError::Validation { .. }));
        assert_eq!(storage.list_documents("buyer-1").await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn documents_listed_in_upload_order() {
        let storage = test_storage().await;
        let base = Utc::now();

        // Inserted out of order on purpose
        let later = make_doc("buyer-1", "contracts", base + Duration::seconds(10));
        let earlier = make_doc("buyer-1", "policies", base);
        let foreign = make_doc("buyer-2", "unrelated", base);

        storage.insert_document(&later).await.expect("insert later");
        storage.insert_document(&earlier).await.expect("insert earlier");
        storage.insert_document(&foreign).await.expect("insert foreign");

        let docs = storage.list_documents("buyer-1").await.expect("list");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "policies");
        assert_eq!(docs[1].name, "contracts");
        assert_eq!(docs[0].size, 2048);
        assert_eq!(docs[0].storage_path, "buyer-1/policies.txt");
    }

    #[tokio::test]
    async fn delete_document_removes_row() {
        let storage = test_storage().await;
        let doc = make_doc("buyer-1", "obsolete", Utc::now());
        storage.insert_document(&doc).await.unwrap();

        assert!(storage.delete_document(&doc.id).await.expect("delete"));
        assert!(!storage.delete_document(&doc.id).await.expect("delete again"));
        assert!(storage.list_documents("buyer-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn trait_objects_delegate() {
        let storage = test_storage().await;
        storage
            .save_prompt_version("buyer-1", "prompt", "", "m")
            .await
            .unwrap();
        storage
            .insert_document(&make_doc("buyer-1", "guide", Utc::now()))
            .await
            .unwrap();

        let prompts: &dyn PromptVersionStore = &storage;
        let catalog: &dyn DocumentCatalog = &storage;
        assert_eq!(prompts.prompt_versions("buyer-1").await.unwrap().len(), 1);
        assert_eq!(catalog.list_documents("buyer-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("pd_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.save_prompt_version("buyer-1", "prompt", "", "m")
            .await
            .unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        assert_eq!(ro.prompt_versions("buyer-1").await.unwrap().len(), 1);

        let result = ro.save_prompt_version("buyer-1", "again", "", "m").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn readonly_requires_existing_file() {
        let tmp = std::env::temp_dir().join(format!("pd_missing_{}.db", Uuid::now_v7()));
        let result = Storage::open_readonly(&tmp).await;
        assert!(matches!(result, Err(PromptDeskError::NotFound(_))));
    }
}
