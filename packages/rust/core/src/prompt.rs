//! Latest-prompt resolution.

use promptdesk_shared::{PromptVersionStore, SystemPromptVersion};
use tracing::{debug, error, instrument};

/// Pick the revision with the highest version number.
///
/// On equal version numbers the first one encountered is kept.
pub fn select_latest(versions: Vec<SystemPromptVersion>) -> Option<SystemPromptVersion> {
    versions
        .into_iter()
        .reduce(|latest, current| {
            if current.version > latest.version {
                current
            } else {
                latest
            }
        })
}

/// Look up the newest saved prompt for `user_id`.
///
/// Backend failures are logged and reported as `None`, the same as a user
/// with no revisions; callers fall back to the default prompt either way.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn resolve_latest_prompt(
    store: &dyn PromptVersionStore,
    user_id: &str,
) -> Option<SystemPromptVersion> {
    let versions = match store.prompt_versions(user_id).await {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "failed to fetch latest system prompt");
            return None;
        }
    };

    let count = versions.len();
    let latest = select_latest(versions);
    debug!(
        candidates = count,
        version = latest.as_ref().map(|v| v.version),
        "resolved latest prompt"
    );
    latest
}
