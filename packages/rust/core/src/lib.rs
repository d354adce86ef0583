//! Session assembly for PromptDesk.
//!
//! Resolves a user's latest system prompt, loads their knowledge documents,
//! and combines both into a [`ChatSession`](promptdesk_shared::ChatSession)
//! ready to hand to a chat model.

pub mod defaults;
pub mod knowledge;
pub mod library;
pub mod prompt;
pub mod session;

#[cfg(test)]
mod testing;

pub use defaults::{DEFAULT_SYSTEM_PROMPT, SessionDefaults};
pub use library::Library;
pub use session::{
    KNOWLEDGE_TRAILER, SessionProgress, SessionService, SilentProgress, combine_contexts,
};
