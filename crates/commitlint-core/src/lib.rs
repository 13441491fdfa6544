//! Commitlint Core - commit message checks for pull requests
//!
//! This crate provides the bot's event handling:
//! - Pull request event parsing and dispatch
//! - Commit message linting
//! - Commit status and comment reporting
//! - The `GitHubApi` seam, plus an in-memory double behind the
//!   `test-stubs` feature

pub mod api;
pub mod comment;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod handler;
pub mod lint;
pub mod status;

#[cfg(any(test, feature = "test-stubs"))]
pub mod test_stubs;

pub use api::{Commit, GitHubApi, NewComment, PullRequestRef};
pub use comment::{format_comment, CommentPolicy};
pub use config::{BotConfig, GitHubSettings};
pub use dispatch::{DispatchOutcome, Dispatcher, EventKind};
pub use error::{Error, Result};
pub use event::{PullRequestAction, PullRequestEvent};
pub use handler::{handle_pull_request, BotContext, HandlerReport, Phase};
pub use lint::{CommitReport, ConventionalLinter, LintResult, LintRules, Linter, Outcome};
pub use status::{CommitState, StatusUpdate, PENDING_DESCRIPTION, STATUS_CONTEXT};
