//! Chat-session initialization: prompt + knowledge → [`ChatSession`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument};

use promptdesk_shared::{
    ChatSession, DocumentStore, PromptDeskError, PromptVersionStore, Result,
};

use crate::defaults::SessionDefaults;
use crate::knowledge;
use crate::prompt::resolve_latest_prompt;

/// Appended after the knowledge context whenever one is present.
pub const KNOWLEDGE_TRAILER: &str = "IMPORTANT: When responding, prioritize information from \
the internal knowledge base above while maintaining the tone and approach defined in your \
system prompt.";

/// Progress callback for reporting session assembly.
pub trait SessionProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after a document body was downloaded and rendered.
    fn document_loaded(&self, name: &str, current: usize, total: usize);
    /// Called when a document download failed and was left out.
    fn document_skipped(&self, name: &str, current: usize, total: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl SessionProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_loaded(&self, _name: &str, _current: usize, _total: usize) {}
    fn document_skipped(&self, _name: &str, _current: usize, _total: usize) {}
}

/// Join the system prompt with the knowledge context.
///
/// A blank knowledge context leaves the system prompt untouched.
pub fn combine_contexts(system_prompt: &str, knowledge_context: &str) -> String {
    if knowledge_context.trim().is_empty() {
        return system_prompt.to_string();
    }
    format!("{system_prompt}\n\n{knowledge_context}\n\n{KNOWLEDGE_TRAILER}")
}

/// Assembles chat sessions from injected prompt and document backends.
///
/// Holds no per-user state; one instance can serve any number of calls.
#[derive(Clone)]
pub struct SessionService {
    prompts: Arc<dyn PromptVersionStore>,
    documents: Arc<dyn DocumentStore>,
    defaults: SessionDefaults,
}

impl SessionService {
    pub fn new(prompts: Arc<dyn PromptVersionStore>, documents: Arc<dyn DocumentStore>) -> Self {
        Self::with_defaults(prompts, documents, SessionDefaults::default())
    }

    pub fn with_defaults(
        prompts: Arc<dyn PromptVersionStore>,
        documents: Arc<dyn DocumentStore>,
        defaults: SessionDefaults,
    ) -> Self {
        Self {
            prompts,
            documents,
            defaults,
        }
    }

    /// Build a fresh session for `user_id`.
    pub async fn initialize(&self, user_id: &str) -> Result<ChatSession> {
        self.initialize_with_progress(user_id, &SilentProgress).await
    }

    /// Build a fresh session for `user_id`, reporting progress.
    ///
    /// Prompt and listing failures fall back to defaults and individual
    /// download failures are skipped. Anything else is logged and reported
    /// as [`PromptDeskError::SessionInit`].
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn initialize_with_progress(
        &self,
        user_id: &str,
        progress: &dyn SessionProgress,
    ) -> Result<ChatSession> {
        self.assemble(user_id, progress).await.map_err(|e| {
            error!(error = %e, "failed to initialize chat session");
            PromptDeskError::SessionInit
        })
    }

    /// Discard `previous` and build a new session for the same user.
    pub async fn refresh(&self, previous: ChatSession, user_id: &str) -> Result<ChatSession> {
        drop(previous);
        info!(user_id = %user_id, "refreshing chat session");
        self.initialize(user_id).await
    }

    async fn assemble(&self, user_id: &str, progress: &dyn SessionProgress) -> Result<ChatSession> {
        if user_id.trim().is_empty() {
            return Err(PromptDeskError::validation("user id must not be empty"));
        }

        progress.phase("Resolving system prompt");
        let latest = resolve_latest_prompt(self.prompts.as_ref(), user_id).await;
        let (system_prompt, ai_model) = self.defaults.resolve(latest.as_ref());

        progress.phase("Listing knowledge documents");
        let documents = knowledge::list_documents(self.documents.as_ref(), user_id).await;

        progress.phase("Loading knowledge documents");
        let knowledge_context = knowledge::build_knowledge_context_with_progress(
            self.documents.as_ref(),
            &documents,
            progress,
        )
        .await;

        let full_context = combine_contexts(&system_prompt, &knowledge_context);

        info!(
            version = latest.as_ref().map(|v| v.version),
            documents = documents.len(),
            context_chars = full_context.len(),
            model = %ai_model,
            "chat session initialized"
        );

        Ok(ChatSession {
            system_prompt,
            knowledge_context,
            full_context,
            documents_used: documents,
            ai_model,
            created_at: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
