//! Shared types, error model, configuration, and collaborator traits for PromptDesk.
//!
//! This crate is the foundation depended on by all other PromptDesk crates.
//! It provides:
//! - [`PromptDeskError`]: the unified error type
//! - Domain types ([`SystemPromptVersion`], [`KnowledgeDocument`], [`ChatSession`])
//! - Collaborator traits ([`PromptVersionStore`], [`DocumentStore`], ...)
//! - Configuration ([`AppConfig`], config loading)

pub mod backend;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use backend::{BlobStore, DocumentCatalog, DocumentStore, PromptVersionStore};
pub use config::{
    AppConfig, BlobConfig, DEFAULT_AI_MODEL, SessionConfig, StorageConfig, config_dir,
    config_file_path, expand_home, init_config, load_config, load_config_from, validate_config,
};
pub use error::{PromptDeskError, Result};
pub use types::{ChatSession, KnowledgeDocument, RecordId, SystemPromptVersion};
