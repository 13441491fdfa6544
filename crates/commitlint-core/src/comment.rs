//! Pull request comment listing lint problems

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::{GitHubApi, NewComment};
use crate::event::PullRequestEvent;
use crate::lint::{CommitReport, Outcome};
use crate::Result;

const HEADER: &str = "There were the following issues with this Pull Request";

const FOOTER: &str = "You may need to [change the commit messages](https://help.github.com/articles/changing-a-commit-message/) to comply with the repository contributing guidelines.";

/// When to comment on a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentPolicy {
    /// Post comments at all
    pub enabled: bool,
    /// Also comment when every commit passed but some produced warnings
    pub on_warnings: bool,
}

impl Default for CommentPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            on_warnings: false,
        }
    }
}

impl CommentPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            on_warnings: false,
        }
    }

    pub fn should_comment(&self, outcome: &Outcome) -> bool {
        self.enabled && (!outcome.passed() || (self.on_warnings && outcome.has_warnings()))
    }
}

/// Render the comment body for the commits that have problems
pub fn format_comment(reports: &[CommitReport]) -> String {
    let mut listing = String::new();

    for report in reports.iter().filter(|r| r.result.has_problems()) {
        listing.push_str(&format!("* Commit: {}\n", report.sha));
        for error in &report.result.errors {
            listing.push_str(&format!("  - ✖ {}\n", error));
        }
        for warning in &report.result.warnings {
            listing.push_str(&format!("  - ⚠ {}\n", warning));
        }
    }

    format!("{}\n\n{}\n{}\n", HEADER, listing, FOOTER)
}

/// Post the problem listing if the policy asks for it
///
/// Returns whether a comment was posted.
pub async fn report_comment(
    github: &dyn GitHubApi,
    event: &PullRequestEvent,
    reports: &[CommitReport],
    outcome: &Outcome,
    policy: &CommentPolicy,
) -> Result<bool> {
    if !policy.should_comment(outcome) {
        debug!(
            number = event.number(),
            passed = outcome.passed(),
            "No comment needed"
        );
        return Ok(false);
    }

    let comment = NewComment {
        owner: event.owner().to_string(),
        repo: event.repo().to_string(),
        number: event.number(),
        body: format_comment(reports),
    };
    github.create_comment(&comment).await?;

    info!(
        owner = %comment.owner,
        repo = %comment.repo,
        number = comment.number,
        errors = outcome.errors_count,
        warnings = outcome.warnings_count,
        "Posted lint comment"
    );

    Ok(true)
}
