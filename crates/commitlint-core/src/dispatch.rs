//! Event routing
//!
//! Webhook deliveries are identified by a tag of the form `event.action`
//! (for example `pull_request.opened`). Known tags map to a handler; every
//! other tag ends in [`DispatchOutcome::Unhandled`].

use serde_json::Value;
use tracing::{debug, info};

use crate::event::PullRequestEvent;
use crate::handler::{handle_pull_request, BotContext, HandlerReport};
use crate::{Error, Result};

/// Events the bot handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PullRequestOpened,
    PullRequestSynchronize,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::PullRequestOpened, EventKind::PullRequestSynchronize];

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pull_request.opened" => Some(EventKind::PullRequestOpened),
            "pull_request.synchronize" => Some(EventKind::PullRequestSynchronize),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            EventKind::PullRequestOpened => "pull_request.opened",
            EventKind::PullRequestSynchronize => "pull_request.synchronize",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Build the routing tag from the `X-GitHub-Event` name and the payload
///
/// Payloads without an `action` field are tagged with the bare event name.
pub fn event_tag(event_type: &str, payload: &Value) -> String {
    match payload.get("action").and_then(|a| a.as_str()) {
        Some(action) => format!("{}.{}", event_type, action),
        None => event_type.to_string(),
    }
}

/// Result of dispatching one delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled {
        kind: EventKind,
        report: HandlerReport,
    },
    Unhandled {
        tag: String,
    },
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled { .. })
    }
}

/// Routes deliveries to the pull request pipeline
#[derive(Clone)]
pub struct Dispatcher {
    ctx: BotContext,
}

impl Dispatcher {
    pub fn new(ctx: BotContext) -> Self {
        Self { ctx }
    }

    /// Dispatch a parsed payload
    pub async fn dispatch(&self, event_type: &str, payload: &Value) -> Result<DispatchOutcome> {
        let tag = event_tag(event_type, payload);

        let Some(kind) = EventKind::from_tag(&tag) else {
            debug!(tag = %tag, "No handler for event");
            return Ok(DispatchOutcome::Unhandled { tag });
        };

        info!(event = %kind, "Dispatching event");

        let report = match kind {
            EventKind::PullRequestOpened | EventKind::PullRequestSynchronize => {
                let event = PullRequestEvent::from_value(payload)?;
                handle_pull_request(&self.ctx, &event).await?
            }
        };

        Ok(DispatchOutcome::Handled { kind, report })
    }

    /// Dispatch a raw JSON payload
    pub async fn dispatch_json(&self, event_type: &str, payload: &str) -> Result<DispatchOutcome> {
        let payload: Value = serde_json::from_str(payload)
            .map_err(|e| Error::MalformedEvent(format!("invalid JSON payload: {}", e)))?;
        self.dispatch(event_type, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::ConventionalLinter;
    use crate::status::CommitState;
    use crate::test_stubs::{sample_payload, RecordingGitHub};
    use serde_json::json;
    use std::sync::Arc;

    fn dispatcher(github: Arc<RecordingGitHub>) -> Dispatcher {
        Dispatcher::new(BotContext::new(
            github,
            Arc::new(ConventionalLinter::default()),
        ))
    }

    #[test]
    fn test_event_kind_tags() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_tag(kind.as_tag()), Some(kind));
        }
        assert_eq!(EventKind::from_tag("pull_request.closed"), None);
        assert_eq!(EventKind::from_tag("push"), None);
    }

    #[test]
    fn test_event_tag() {
        assert_eq!(
            event_tag("pull_request", &json!({"action": "opened"})),
            "pull_request.opened"
        );
        assert_eq!(event_tag("push", &json!({"ref": "refs/heads/main"})), "push");
    }

    #[tokio::test]
    async fn test_dispatch_opened() {
        let github = Arc::new(RecordingGitHub::new().with_messages(&["fix: bug #1"]));

        let outcome = dispatcher(github.clone())
            .dispatch("pull_request", &sample_payload("opened"))
            .await
            .unwrap();

        match outcome {
            DispatchOutcome::Handled { kind, report } => {
                assert_eq!(kind, EventKind::PullRequestOpened);
                assert_eq!(report.state, CommitState::Success);
            }
            other => panic!("expected handled outcome, got {:?}", other),
        }
        assert_eq!(github.statuses().len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_unhandled_action() {
        let github = Arc::new(RecordingGitHub::new());

        let outcome = dispatcher(github.clone())
            .dispatch("pull_request", &sample_payload("closed"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Unhandled {
                tag: "pull_request.closed".to_string()
            }
        );
        assert!(github.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_unhandled_event_type() {
        let github = Arc::new(RecordingGitHub::new());

        let outcome = dispatcher(github.clone())
            .dispatch("issues", &json!({"action": "opened"}))
            .await
            .unwrap();

        assert!(!outcome.is_handled());
        assert!(github.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_malformed_payload_makes_no_calls() {
        let github = Arc::new(RecordingGitHub::new());

        let err = dispatcher(github.clone())
            .dispatch("pull_request", &json!({"action": "opened"}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedEvent(_)));
        assert!(github.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_json_rejects_garbage() {
        let err = dispatcher(Arc::new(RecordingGitHub::new()))
            .dispatch_json("pull_request", "not json")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedEvent(_)));
    }
}
