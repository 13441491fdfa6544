//! In-memory GitHub double
//!
//! [`RecordingGitHub`] implements [`GitHubApi`] without any network access.
//! It serves a fixed list of commits and records every call in order, so
//! tests can assert on exactly what the pipeline asked GitHub to do.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::api::{Commit, GitHubApi, NewComment, PullRequestRef};
use crate::event::{Head, Owner, PullRequest, PullRequestAction, PullRequestEvent, Repository};
use crate::status::StatusUpdate;
use crate::{Error, Result};

/// One recorded API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CreateStatus(StatusUpdate),
    GetCommits(PullRequestRef),
    CreateComment(NewComment),
}

/// API operation selector for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateStatus,
    GetCommits,
    CreateComment,
}

#[derive(Debug, Default)]
pub struct RecordingGitHub {
    commits: Vec<Commit>,
    fail_on: Option<Operation>,
    calls: Mutex<Vec<ApiCall>>,
}

impl RecordingGitHub {
    /// A double serving no commits
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve the given commits
    pub fn with_commits(mut self, commits: Vec<Commit>) -> Self {
        self.commits = commits;
        self
    }

    /// Serve one commit per message, with shas `sha-0`, `sha-1`, ...
    pub fn with_messages(self, messages: &[&str]) -> Self {
        let commits = messages
            .iter()
            .enumerate()
            .map(|(i, message)| Commit::new(format!("sha-{}", i), *message))
            .collect();
        self.with_commits(commits)
    }

    /// Make every call of `operation` fail with a 500
    pub fn fail_on(mut self, operation: Operation) -> Self {
        self.fail_on = Some(operation);
        self
    }

    /// Every call recorded so far, oldest first
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().clone()
    }

    pub fn statuses(&self) -> Vec<StatusUpdate> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                ApiCall::CreateStatus(status) => Some(status.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn comments(&self) -> Vec<NewComment> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                ApiCall::CreateComment(comment) => Some(comment.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn commit_requests(&self) -> Vec<PullRequestRef> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                ApiCall::GetCommits(pr) => Some(pr.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ApiCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, operation: Operation, call: ApiCall) -> Result<()> {
        self.lock().push(call);
        if self.fail_on == Some(operation) {
            return Err(Error::Api {
                status: 500,
                message: format!("injected {:?} failure", operation),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GitHubApi for RecordingGitHub {
    async fn create_status(&self, status: &StatusUpdate) -> Result<()> {
        self.record(Operation::CreateStatus, ApiCall::CreateStatus(status.clone()))
    }

    async fn get_commits(&self, pull_request: &PullRequestRef) -> Result<Vec<Commit>> {
        self.record(Operation::GetCommits, ApiCall::GetCommits(pull_request.clone()))?;
        Ok(self.commits.clone())
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<()> {
        self.record(Operation::CreateComment, ApiCall::CreateComment(comment.clone()))
    }
}

/// Pull request #1 of `user/repo` with head `123456789`
pub fn sample_event(action: PullRequestAction) -> PullRequestEvent {
    PullRequestEvent {
        action,
        repository: Repository {
            owner: Owner {
                login: "user".to_string(),
            },
            name: "repo".to_string(),
        },
        pull_request: PullRequest {
            number: 1,
            head: Head {
                sha: "123456789".to_string(),
            },
        },
    }
}

/// Webhook payload matching [`sample_event`]
pub fn sample_payload(action: &str) -> serde_json::Value {
    serde_json::json!({
        "action": action,
        "number": 1,
        "repository": {
            "name": "repo",
            "full_name": "user/repo",
            "owner": { "login": "user" }
        },
        "pull_request": {
            "number": 1,
            "head": { "sha": "123456789" }
        }
    })
}
