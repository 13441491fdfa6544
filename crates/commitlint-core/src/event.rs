//! Pull request webhook events
//!
//! Only the fields the bot reads are modelled; everything else in the
//! payload is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::PullRequestRef;
use crate::{Error, Result};

/// Pull request actions the bot reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    Opened,
    Synchronize,
}

impl PullRequestAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestAction::Opened => "opened",
            PullRequestAction::Synchronize => "synchronize",
        }
    }
}

impl std::fmt::Display for PullRequestAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `pull_request` event as delivered by GitHub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    pub repository: Repository,
    pub pull_request: PullRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: Owner,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub head: Head,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Head {
    pub sha: String,
}

impl PullRequestEvent {
    /// Parse an event from a webhook payload
    pub fn from_value(payload: &Value) -> Result<Self> {
        Self::deserialize(payload).map_err(|e| Error::MalformedEvent(e.to_string()))
    }

    /// Parse an event from a raw JSON payload
    pub fn from_json(payload: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_value(&value)
    }

    pub fn owner(&self) -> &str {
        &self.repository.owner.login
    }

    pub fn repo(&self) -> &str {
        &self.repository.name
    }

    pub fn number(&self) -> u64 {
        self.pull_request.number
    }

    /// Sha of the head commit, which carries the status
    pub fn head_sha(&self) -> &str {
        &self.pull_request.head.sha
    }

    pub fn pull_request_ref(&self) -> PullRequestRef {
        PullRequestRef {
            owner: self.owner().to_string(),
            repo: self.repo().to_string(),
            number: self.number(),
        }
    }
}
