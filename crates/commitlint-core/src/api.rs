//! The GitHub operations the bot needs
//!
//! The pipeline only ever talks to GitHub through [`GitHubApi`], so the
//! REST client and the in-memory test double are interchangeable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::status::StatusUpdate;
use crate::Result;

/// Address of a pull request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

/// A commit of a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
}

impl Commit {
    pub fn new(sha: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            message: message.into(),
        }
    }
}

/// A comment to post on a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    pub body: String,
}

#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Set a commit status
    async fn create_status(&self, status: &StatusUpdate) -> Result<()>;

    /// List the commits of a pull request, oldest first
    async fn get_commits(&self, pull_request: &PullRequestRef) -> Result<Vec<Commit>>;

    /// Comment on a pull request
    async fn create_comment(&self, comment: &NewComment) -> Result<()>;
}
