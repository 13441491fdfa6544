//! Pull request event pipeline
//!
//! One event runs through a fixed sequence of phases:
//!
//! ```text
//! Start -> Pending -> Fetching -> Linting -> Reporting -> Commenting -> Done
//! ```
//!
//! Any error aborts the run and is returned tagged with the phase it
//! surfaced in. Nothing is carried over between events; all collaborators
//! come in through [`BotContext`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::api::GitHubApi;
use crate::comment::{report_comment, CommentPolicy};
use crate::event::PullRequestEvent;
use crate::lint::{evaluate, CommitReport, Linter, Outcome};
use crate::status::{report_pending, report_result, CommitState};
use crate::Result;

/// Pipeline phase of a single event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Start,
    Pending,
    Fetching,
    Linting,
    Reporting,
    Commenting,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Pending => "pending",
            Phase::Fetching => "fetching",
            Phase::Linting => "linting",
            Phase::Reporting => "reporting",
            Phase::Commenting => "commenting",
            Phase::Done => "done",
        }
    }

    /// The phase that follows this one
    pub fn next(&self) -> Phase {
        match self {
            Phase::Start => Phase::Pending,
            Phase::Pending => Phase::Fetching,
            Phase::Fetching => Phase::Linting,
            Phase::Linting => Phase::Reporting,
            Phase::Reporting => Phase::Commenting,
            Phase::Commenting | Phase::Done => Phase::Done,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collaborators the pipeline runs against
#[derive(Clone)]
pub struct BotContext {
    pub github: Arc<dyn GitHubApi>,
    pub linter: Arc<dyn Linter>,
    pub comment_policy: CommentPolicy,
}

impl BotContext {
    pub fn new(github: Arc<dyn GitHubApi>, linter: Arc<dyn Linter>) -> Self {
        Self {
            github,
            linter,
            comment_policy: CommentPolicy::default(),
        }
    }

    pub fn with_comment_policy(mut self, policy: CommentPolicy) -> Self {
        self.comment_policy = policy;
        self
    }
}

/// What one pipeline run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerReport {
    pub state: CommitState,
    pub outcome: Outcome,
    pub commits: Vec<CommitReport>,
    pub comment_posted: bool,
}

/// Tracks the current phase of a run for logging and error tagging
struct Run<'a> {
    event: &'a PullRequestEvent,
    phase: Phase,
}

impl<'a> Run<'a> {
    fn new(event: &'a PullRequestEvent) -> Self {
        Self {
            event,
            phase: Phase::Start,
        }
    }

    fn advance(&mut self) {
        let next = self.phase.next();
        debug!(
            number = self.event.number(),
            from = %self.phase,
            to = %next,
            "Pipeline transition"
        );
        self.phase = next;
    }

    fn fail<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| {
            error!(
                owner = %self.event.owner(),
                repo = %self.event.repo(),
                number = self.event.number(),
                phase = %self.phase,
                error = %e,
                "Commit lint pipeline failed"
            );
            e.in_phase(self.phase)
        })
    }
}

/// Lint the commits of a pull request and report the result on GitHub
pub async fn handle_pull_request(
    ctx: &BotContext,
    event: &PullRequestEvent,
) -> Result<HandlerReport> {
    info!(
        action = %event.action,
        owner = %event.owner(),
        repo = %event.repo(),
        number = event.number(),
        sha = %event.head_sha(),
        "Processing pull request event"
    );

    let github = ctx.github.as_ref();
    let mut run = Run::new(event);

    run.advance();
    run.fail(report_pending(github, event).await)?;

    run.advance();
    let pull_request = event.pull_request_ref();
    let commits = run.fail(github.get_commits(&pull_request).await)?;
    debug!(count = commits.len(), "Fetched pull request commits");

    run.advance();
    let reports = run.fail(evaluate(ctx.linter.as_ref(), &commits))?;
    let outcome = Outcome::from_reports(&reports);

    run.advance();
    let status = run.fail(report_result(github, event, &outcome).await)?;

    run.advance();
    let comment_posted = run.fail(
        report_comment(github, event, &reports, &outcome, &ctx.comment_policy).await,
    )?;

    run.advance();
    info!(
        number = event.number(),
        state = %status.state,
        commits = outcome.commits,
        errors = outcome.errors_count,
        warnings = outcome.warnings_count,
        comment_posted,
        "Pull request event processed"
    );

    Ok(HandlerReport {
        state: status.state,
        outcome,
        commits: reports,
        comment_posted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::{ConventionalLinter, LintResult};
    use crate::status::{StatusUpdate, PENDING_DESCRIPTION};
    use crate::test_stubs::{sample_event, ApiCall, Operation, RecordingGitHub};
    use crate::{Error, PullRequestAction};

    fn context(github: Arc<RecordingGitHub>) -> BotContext {
        BotContext::new(github, Arc::new(ConventionalLinter::default()))
    }

    #[test]
    fn test_phase_sequence() {
        let mut phase = Phase::Start;
        let mut seen = vec![phase];
        while phase != Phase::Done {
            phase = phase.next();
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                Phase::Start,
                Phase::Pending,
                Phase::Fetching,
                Phase::Linting,
                Phase::Reporting,
                Phase::Commenting,
                Phase::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_valid_commits_report_success_without_comment() {
        let github = Arc::new(RecordingGitHub::new().with_messages(&["fix: bug #1"]));
        let event = sample_event(PullRequestAction::Opened);

        let report = handle_pull_request(&context(github.clone()), &event)
            .await
            .unwrap();

        assert_eq!(report.state, CommitState::Success);
        assert!(!report.comment_posted);
        assert_eq!(report.commits.len(), 1);

        let pending = StatusUpdate::for_event(&event, CommitState::Pending, PENDING_DESCRIPTION);
        let success = StatusUpdate::for_event(
            &event,
            CommitState::Success,
            "found 0 problems, 0 warnings",
        );
        assert_eq!(
            github.calls(),
            vec![
                ApiCall::CreateStatus(pending),
                ApiCall::GetCommits(event.pull_request_ref()),
                ApiCall::CreateStatus(success),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_commit_reports_failure_and_comments_once() {
        let github = Arc::new(
            RecordingGitHub::new().with_messages(&["fix: bug #1", "did some stuff"]),
        );
        let event = sample_event(PullRequestAction::Synchronize);

        let report = handle_pull_request(&context(github.clone()), &event)
            .await
            .unwrap();

        assert_eq!(report.state, CommitState::Failure);
        assert!(report.comment_posted);
        assert_eq!(report.outcome.invalid_commits, 1);

        let statuses = github.statuses();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[1].state, CommitState::Failure);
        assert_eq!(statuses[1].description, "found 2 problems, 0 warnings");

        let comments = github.comments();
        assert_eq!(comments.len(), 1);
        assert!(comments[0].body.contains("* Commit: sha-1"));
        assert!(!comments[0].body.contains("sha-0"));

        assert!(matches!(github.calls().last(), Some(ApiCall::CreateComment(_))));
    }

    #[tokio::test]
    async fn test_comment_policy_disabled() {
        let github = Arc::new(RecordingGitHub::new().with_messages(&["nope"]));
        let ctx = context(github.clone()).with_comment_policy(CommentPolicy::disabled());

        let report = handle_pull_request(&ctx, &sample_event(PullRequestAction::Opened))
            .await
            .unwrap();

        assert_eq!(report.state, CommitState::Failure);
        assert!(!report.comment_posted);
        assert!(github.comments().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_stops_after_pending() {
        let github = Arc::new(RecordingGitHub::new().fail_on(Operation::GetCommits));
        let event = sample_event(PullRequestAction::Opened);

        let err = handle_pull_request(&context(github.clone()), &event)
            .await
            .unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Fetching));
        let statuses = github.statuses();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].state, CommitState::Pending);
    }

    #[tokio::test]
    async fn test_pending_failure_fetches_nothing() {
        let github = Arc::new(RecordingGitHub::new().fail_on(Operation::CreateStatus));

        let err = handle_pull_request(&context(github.clone()), &sample_event(PullRequestAction::Opened))
            .await
            .unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Pending));
        assert!(github.commit_requests().is_empty());
    }

    #[tokio::test]
    async fn test_linter_error_is_fatal() {
        let github = Arc::new(RecordingGitHub::new().with_messages(&["fix: bug #1"]));
        let linter = |_: &str| -> Result<LintResult> { Err(Error::Lint("parser crashed".to_string())) };
        let ctx = BotContext::new(github.clone(), Arc::new(linter));

        let err = handle_pull_request(&ctx, &sample_event(PullRequestAction::Opened))
            .await
            .unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Linting));
        assert_eq!(github.statuses().len(), 1);
    }

    #[tokio::test]
    async fn test_redelivery_repeats_identical_calls() {
        let github = Arc::new(RecordingGitHub::new().with_messages(&["fix: bug #1", "bad"]));
        let ctx = context(github.clone());
        let event = sample_event(PullRequestAction::Opened);

        handle_pull_request(&ctx, &event).await.unwrap();
        let first = github.calls();
        github.reset();
        handle_pull_request(&ctx, &event).await.unwrap();

        assert_eq!(github.calls(), first);
    }
}
