//! In-memory collaborator fakes shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use promptdesk_shared::{
    DocumentStore, KnowledgeDocument, PromptDeskError, PromptVersionStore, Result,
    SystemPromptVersion,
};

pub(crate) fn prompt_version(version: i64, text: &str) -> SystemPromptVersion {
    SystemPromptVersion {
        id: format!("pv-{version}"),
        version,
        system_prompt: text.into(),
        evaluation: String::new(),
        saved_date: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ai_model: "gpt-4o".into(),
        user_id: "buyer-1".into(),
    }
}

pub(crate) fn document(name: &str) -> KnowledgeDocument {
    KnowledgeDocument {
        id: format!("doc-{name}"),
        user_id: "buyer-1".into(),
        name: name.into(),
        original_format: "pdf".into(),
        size: 1024,
        storage_path: format!("buyer-1/{name}.txt"),
        uploaded_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    }
}

/// Prompt store returning a fixed list, or failing every call.
pub(crate) struct FakePrompts {
    versions: Option<Vec<SystemPromptVersion>>,
}

impl FakePrompts {
    pub(crate) fn with(versions: Vec<SystemPromptVersion>) -> Self {
        Self {
            versions: Some(versions),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::with(Vec::new())
    }

    pub(crate) fn failing() -> Self {
        Self { versions: None }
    }
}

#[async_trait]
impl PromptVersionStore for FakePrompts {
    async fn prompt_versions(&self, _user_id: &str) -> Result<Vec<SystemPromptVersion>> {
        self.versions
            .clone()
            .ok_or_else(|| PromptDeskError::Storage("prompt backend unavailable".into()))
    }
}

/// Document store with per-document contents; missing contents fail the download.
pub(crate) struct FakeDocuments {
    docs: Vec<KnowledgeDocument>,
    contents: HashMap<String, String>,
    list_fails: bool,
    downloads: Mutex<Vec<String>>,
}

impl FakeDocuments {
    pub(crate) fn new() -> Self {
        Self {
            docs: Vec::new(),
            contents: HashMap::new(),
            list_fails: false,
            downloads: Mutex::new(Vec::new()),
        }
    }

    /// Add a document whose download succeeds with `content`.
    pub(crate) fn ok(mut self, doc: KnowledgeDocument, content: &str) -> Self {
        self.contents.insert(doc.id.clone(), content.into());
        self.docs.push(doc);
        self
    }

    /// Add a document whose download fails.
    pub(crate) fn broken(mut self, doc: KnowledgeDocument) -> Self {
        self.docs.push(doc);
        self
    }

    pub(crate) fn failing_list(mut self) -> Self {
        self.list_fails = true;
        self
    }

    /// Names of documents whose download was attempted, in call order.
    pub(crate) fn download_log(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for FakeDocuments {
    async fn list_documents(&self, _user_id: &str) -> Result<Vec<KnowledgeDocument>> {
        if self.list_fails {
            return Err(PromptDeskError::Storage("document catalog unavailable".into()));
        }
        Ok(self.docs.clone())
    }

    async fn download_document(&self, doc: &KnowledgeDocument) -> Result<String> {
        self.downloads.lock().unwrap().push(doc.name.clone());
        self.contents
            .get(&doc.id)
            .cloned()
            .ok_or_else(|| PromptDeskError::Network(format!("download of {} failed", doc.name)))
    }
}
