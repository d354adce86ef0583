//! Core domain types for PromptDesk sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for stored record identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Generate a new time-sortable record identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// SystemPromptVersion
// ---------------------------------------------------------------------------

/// One saved revision of a user's system prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemPromptVersion {
    /// Record identifier.
    pub id: String,
    /// Monotonic revision number, scoped to the user.
    pub version: i64,
    /// The prompt text itself.
    pub system_prompt: String,
    /// Free-form evaluation notes written alongside the revision.
    pub evaluation: String,
    /// When the revision was saved.
    pub saved_date: DateTime<Utc>,
    /// Model identifier the prompt was tuned for.
    pub ai_model: String,
    /// Owning user.
    pub user_id: String,
}

// ---------------------------------------------------------------------------
// KnowledgeDocument
// ---------------------------------------------------------------------------

/// Descriptor for a document in a user's knowledge library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeDocument {
    /// Record identifier.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Display name (usually the uploaded file name).
    pub name: String,
    /// Format the document was uploaded in (e.g. `pdf`, `docx`, `md`).
    pub original_format: String,
    /// Size in bytes.
    pub size: u64,
    /// Blob-store location of the extracted text.
    pub storage_path: String,
    /// When the document was added.
    pub uploaded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ChatSession
// ---------------------------------------------------------------------------

/// Everything a chat UI needs to start a conversation.
///
/// Built fresh on every initialization and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Resolved system prompt (stored or default).
    pub system_prompt: String,
    /// Wrapped knowledge-base text; empty when there were no documents.
    pub knowledge_context: String,
    /// Prompt and knowledge context joined for the model.
    pub full_context: String,
    /// Every listed document, including ones whose download failed.
    pub documents_used: Vec<KnowledgeDocument>,
    /// Model identifier to chat with.
    pub ai_model: String,
    /// When this session was assembled.
    pub created_at: DateTime<Utc>,
}
