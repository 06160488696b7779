pub mod config;
pub mod error;
pub mod feedback;
pub mod logic;
pub mod model;
pub mod store;

// Export error types
pub use error::{DraftError, GroupSaveError, MalformedReferenceError, SaveError, SubmitError};

// Export feedback sinks
pub use feedback::{FeedbackReporter, LogReporter, RecordingReporter};

// Export logic types
pub use logic::{
    build_group_payload, build_playlist_queue, canonical_id, capture_group_payload, Draft,
    DraftStore, GroupEditSession, ReferencePolicy, SaveOrchestrator, ScreenEditSession,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{
    HttpApiClient, InMemoryApi, ScreenGroupChannel, ScreenReader, SignageApi, WriteChannel,
};

use anyhow::Context;
use serde_json::Value;
use std::sync::Arc;

/// Parse a `path=value` field edit. The value is read as JSON and falls back
/// to a plain string, so `title=Lobby` and `dimensions.width=1920` both work.
pub fn parse_assignment(text: &str) -> anyhow::Result<(String, Value)> {
    let (path, raw) = text
        .split_once('=')
        .with_context(|| format!("expected path=value, got '{}'", text))?;
    if path.trim().is_empty() {
        anyhow::bail!("empty field path in '{}'", text);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((path.trim().to_string(), value))
}

/// Load a screen, apply `edits` to its draft and run one save cycle.
///
/// Write failures are reported through `reporter` and show up in the
/// returned report; only problems before any write was issued are errors.
pub async fn edit_screen<A>(
    api: Arc<A>,
    reporter: Arc<dyn FeedbackReporter>,
    policy: ReferencePolicy,
    screen_id: &str,
    edits: &[(String, Value)],
) -> anyhow::Result<SaveReport>
where
    A: ScreenReader + WriteChannel + 'static,
{
    let mut session = ScreenEditSession::new(screen_id, api, reporter, policy);
    session
        .load()
        .await
        .map_err(|detail| anyhow::anyhow!("could not load screen {}: {}", screen_id, detail))?;

    for (path, value) in edits {
        session.set_field(path, value.clone())?;
    }

    Ok(session.save().await?)
}

/// Load a screen group, apply `edits` and save it.
pub async fn edit_group<A>(
    api: Arc<A>,
    reporter: Arc<dyn FeedbackReporter>,
    group_id: &str,
    edits: &[(String, Value)],
) -> anyhow::Result<ScreenGroup>
where
    A: ScreenGroupChannel + 'static,
{
    let mut session = GroupEditSession::new(group_id, api, reporter);
    session
        .load()
        .await
        .map_err(|detail| anyhow::anyhow!("could not load group {}: {}", group_id, detail))?;

    for (path, value) in edits {
        session.set_field(path, value.clone())?;
    }

    Ok(session.save().await?)
}
