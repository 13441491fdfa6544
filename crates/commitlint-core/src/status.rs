//! Commit status reporting

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::GitHubApi;
use crate::event::PullRequestEvent;
use crate::lint::Outcome;
use crate::Result;

/// Context label the statuses are filed under
pub const STATUS_CONTEXT: &str = "commitlint-bot";

/// Description of the pending status
pub const PENDING_DESCRIPTION: &str = "Waiting for the status to be reported";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Pending,
    Success,
    Failure,
}

impl CommitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitState::Pending => "pending",
            CommitState::Success => "success",
            CommitState::Failure => "failure",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CommitState::Pending)
    }
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit status to submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub sha: String,
    pub repo: String,
    pub owner: String,
    pub context: String,
    pub state: CommitState,
    pub description: String,
}

impl StatusUpdate {
    /// Status for the head commit of the event's pull request
    pub fn for_event(
        event: &PullRequestEvent,
        state: CommitState,
        description: impl Into<String>,
    ) -> Self {
        Self {
            sha: event.head_sha().to_string(),
            repo: event.repo().to_string(),
            owner: event.owner().to_string(),
            context: STATUS_CONTEXT.to_string(),
            state,
            description: description.into(),
        }
    }

    pub fn pending(event: &PullRequestEvent) -> Self {
        Self::for_event(event, CommitState::Pending, PENDING_DESCRIPTION)
    }

    pub fn from_outcome(event: &PullRequestEvent, outcome: &Outcome) -> Self {
        let state = if outcome.passed() {
            CommitState::Success
        } else {
            CommitState::Failure
        };
        Self::for_event(event, state, describe(outcome))
    }
}

/// Terminal status description, e.g. `found 2 problems, 1 warnings`
pub fn describe(outcome: &Outcome) -> String {
    format!(
        "found {} problems, {} warnings",
        outcome.errors_count, outcome.warnings_count
    )
}

/// Submit the pending status for the event's head commit
pub async fn report_pending(
    github: &dyn GitHubApi,
    event: &PullRequestEvent,
) -> Result<StatusUpdate> {
    let status = StatusUpdate::pending(event);
    github.create_status(&status).await?;
    info!(
        owner = %status.owner,
        repo = %status.repo,
        sha = %status.sha,
        "Reported pending status"
    );
    Ok(status)
}

/// Submit the terminal status derived from the lint outcome
pub async fn report_result(
    github: &dyn GitHubApi,
    event: &PullRequestEvent,
    outcome: &Outcome,
) -> Result<StatusUpdate> {
    let status = StatusUpdate::from_outcome(event, outcome);
    github.create_status(&status).await?;
    info!(
        owner = %status.owner,
        repo = %status.repo,
        sha = %status.sha,
        state = %status.state,
        description = %status.description,
        "Reported lint status"
    );
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_stubs::{sample_event, ApiCall, RecordingGitHub};
    use crate::{Error, PullRequestAction};

    #[test]
    fn test_commit_state_serializes_lowercase() {
        let json = serde_json::to_string(&CommitState::Failure).unwrap();
        assert_eq!(json, "\"failure\"");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!CommitState::Pending.is_terminal());
        assert!(CommitState::Success.is_terminal());
        assert!(CommitState::Failure.is_terminal());
    }

    #[test]
    fn test_describe_outcome() {
        let outcome = Outcome {
            commits: 3,
            invalid_commits: 1,
            errors_count: 2,
            warnings_count: 1,
        };
        assert_eq!(describe(&outcome), "found 2 problems, 1 warnings");
    }

    #[test]
    fn test_from_outcome_picks_state() {
        let event = sample_event(PullRequestAction::Opened);

        let passed = StatusUpdate::from_outcome(&event, &Outcome::default());
        assert_eq!(passed.state, CommitState::Success);
        assert_eq!(passed.description, "found 0 problems, 0 warnings");

        let failed = StatusUpdate::from_outcome(
            &event,
            &Outcome {
                commits: 1,
                invalid_commits: 1,
                errors_count: 1,
                warnings_count: 0,
            },
        );
        assert_eq!(failed.state, CommitState::Failure);
    }

    #[tokio::test]
    async fn test_report_pending() {
        let github = RecordingGitHub::new();
        let event = sample_event(PullRequestAction::Synchronize);

        report_pending(&github, &event).await.unwrap();

        assert_eq!(
            github.calls(),
            vec![ApiCall::CreateStatus(StatusUpdate {
                sha: "123456789".to_string(),
                repo: "repo".to_string(),
                owner: "user".to_string(),
                context: "commitlint-bot".to_string(),
                state: CommitState::Pending,
                description: "Waiting for the status to be reported".to_string(),
            })]
        );
    }

    #[tokio::test]
    async fn test_report_result_propagates_api_error() {
        let github = RecordingGitHub::new().fail_on(crate::test_stubs::Operation::CreateStatus);
        let event = sample_event(PullRequestAction::Opened);

        let err = report_result(&github, &event, &Outcome::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status: 500, .. }));
    }
}
