//! Knowledge-context assembly.
//!
//! Downloads a user's documents one at a time, in library order, and wraps
//! each successfully retrieved body in a fixed Markdown template:
//!
//! ```text
//! # INTERNAL KNOWLEDGE BASE
//! <intro>
//! ## Document: <name>
//! **Format:** / **Size:** / **Content:**
//! <body>
//! ---
//! ...
//! <closing instruction>
//! ```

use promptdesk_shared::{DocumentStore, KnowledgeDocument};
use tracing::{debug, error, info, instrument, warn};

use crate::session::{SessionProgress, SilentProgress};

const KNOWLEDGE_HEADER: &str = "# INTERNAL KNOWLEDGE BASE";

const KNOWLEDGE_INTRO: &str = "The following documents contain internal company knowledge, \
policies, and procedures that should inform your responses:";

const KNOWLEDGE_CLOSING: &str = "Please use this internal knowledge to provide accurate, \
company-specific guidance while maintaining the principles outlined in your system prompt.";

/// List a user's documents, treating a backend failure as an empty library.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn list_documents(store: &dyn DocumentStore, user_id: &str) -> Vec<KnowledgeDocument> {
    match store.list_documents(user_id).await {
        Ok(docs) => {
            debug!(count = docs.len(), "listed knowledge documents");
            docs
        }
        Err(e) => {
            error!(error = %e, "failed to fetch knowledge documents");
            Vec::new()
        }
    }
}

/// Build the knowledge context for `documents` without progress reporting.
pub async fn build_knowledge_context(
    store: &dyn DocumentStore,
    documents: &[KnowledgeDocument],
) -> String {
    build_knowledge_context_with_progress(store, documents, &SilentProgress).await
}

/// Build the knowledge context for `documents`.
///
/// Returns an empty string for an empty list. Documents that fail to
/// download are logged and left out; the rest keep their relative order.
#[instrument(skip_all, fields(documents = documents.len()))]
pub async fn build_knowledge_context_with_progress(
    store: &dyn DocumentStore,
    documents: &[KnowledgeDocument],
    progress: &dyn SessionProgress,
) -> String {
    if documents.is_empty() {
        return String::new();
    }

    let total = documents.len();
    let mut sections = Vec::with_capacity(total);

    for (i, doc) in documents.iter().enumerate() {
        match store.download_document(doc).await {
            Ok(content) => {
                debug!(name = %doc.name, bytes = content.len(), "loaded document");
                sections.push(document_section(doc, &content));
                progress.document_loaded(&doc.name, i + 1, total);
            }
            Err(e) => {
                warn!(name = %doc.name, error = %e, "failed to load document, skipping");
                progress.document_skipped(&doc.name, i + 1, total);
            }
        }
    }

    info!(loaded = sections.len(), skipped = total - sections.len(), "knowledge context built");

    wrap_sections(&sections)
}

/// Render one document's block.
pub fn document_section(doc: &KnowledgeDocument, content: &str) -> String {
    format!(
        "\n## Document: {}\n**Format:** {}\n**Size:** {} bytes\n**Content:**\n{}\n\n---\n",
        doc.name, doc.original_format, doc.size, content
    )
}

/// Surround rendered sections with the knowledge-base banner.
///
/// The banner is emitted even when `sections` is empty.
fn wrap_sections(sections: &[String]) -> String {
    format!(
        "\n{KNOWLEDGE_HEADER}\n\n{KNOWLEDGE_INTRO}\n\n{}\n\n{KNOWLEDGE_CLOSING}\n",
        sections.join("\n")
    )
}
