//! SQL migration definitions for the PromptDesk database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: prompt_versions, knowledge_documents",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Saved system prompt revisions
CREATE TABLE IF NOT EXISTS prompt_versions (
    id            TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    version       INTEGER NOT NULL,
    system_prompt TEXT NOT NULL,
    evaluation    TEXT NOT NULL DEFAULT '',
    saved_date    TEXT NOT NULL,
    ai_model      TEXT NOT NULL DEFAULT '',
    UNIQUE(user_id, version)
);

CREATE INDEX IF NOT EXISTS idx_prompt_versions_user ON prompt_versions(user_id);

-- Knowledge library descriptors (bodies live in the blob store)
CREATE TABLE IF NOT EXISTS knowledge_documents (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,
    name            TEXT NOT NULL,
    original_format TEXT NOT NULL,
    size            INTEGER NOT NULL,
    storage_path    TEXT NOT NULL,
    uploaded_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_knowledge_documents_user ON knowledge_documents(user_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
