//! Commit message linting
//!
//! [`Linter`] is the seam for the lint function. [`ConventionalLinter`] is
//! the built-in conventional-commit rule set; [`evaluate`] runs a linter
//! over the commits of a pull request in order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::Commit;
use crate::Result;

/// Outcome of linting one commit message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl LintResult {
    /// Build a result; it is valid iff there are no errors
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn clean() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn has_problems(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }
}

/// A commit-message lint function
///
/// Lint problems are reported in the [`LintResult`]; an `Err` means the
/// message could not be linted at all.
pub trait Linter: Send + Sync {
    fn lint(&self, message: &str) -> Result<LintResult>;
}

impl<F> Linter for F
where
    F: Fn(&str) -> Result<LintResult> + Send + Sync,
{
    fn lint(&self, message: &str) -> Result<LintResult> {
        self(message)
    }
}

/// Rule settings for [`ConventionalLinter`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintRules {
    /// Maximum header length in characters
    pub header_max_length: usize,
    /// Allowed commit types
    pub types: Vec<String>,
    /// Skip merge, revert and fixup/squash commits
    pub ignore_merge_commits: bool,
}

impl Default for LintRules {
    fn default() -> Self {
        Self {
            header_max_length: 72,
            types: [
                "build", "chore", "ci", "docs", "feat", "fix", "perf", "refactor", "revert",
                "style", "test",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
            ignore_merge_commits: true,
        }
    }
}

static HEADER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w*)(?:\(([^)]*)\))?!?: (.*)$").expect("valid header pattern"));

/// Note keywords and issue-reference actions that open a footer
static FOOTER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:BREAKING CHANGE: |BREAKING-CHANGE: |(?i:close[sd]?|fix(?:e[sd])?|resolve[sd]?) #\d+)",
    )
    .expect("valid footer pattern")
});

/// Git trailer line, e.g. `Signed-off-by: Jane <jane@example.com>`
static TRAILER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][\w-]*: \S").expect("valid trailer pattern"));

static IGNORED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^Merge pull request #\d+",
        r"^Merge (remote-tracking )?branch ",
        r"^Merge tag ",
        r#"^Revert ".*""#,
        r"^(fixup|squash)! ",
        r"^Automatic merge",
        r"^Auto-merged .* into ",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid ignore pattern"))
    .collect()
});

/// Conventional-commit linter (`type(scope): subject`)
#[derive(Debug, Clone, Default)]
pub struct ConventionalLinter {
    rules: LintRules,
}

impl ConventionalLinter {
    pub fn new(rules: LintRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &LintRules {
        &self.rules
    }

    fn is_ignored(&self, header: &str) -> bool {
        self.rules.ignore_merge_commits && IGNORED_PATTERNS.iter().any(|re| re.is_match(header))
    }

    fn check_header(&self, header: &str, errors: &mut Vec<String>) {
        let length = header.chars().count();
        if length > self.rules.header_max_length {
            errors.push(format!(
                "header must not be longer than {} characters, current length is {}",
                self.rules.header_max_length, length
            ));
        }

        let Some(caps) = HEADER_PATTERN.captures(header) else {
            errors.push("subject may not be empty".to_string());
            errors.push("type may not be empty".to_string());
            return;
        };

        let commit_type = caps.get(1).map_or("", |m| m.as_str());
        let scope = caps.get(2).map(|m| m.as_str());
        let subject = caps.get(3).map_or("", |m| m.as_str()).trim();

        if commit_type.is_empty() {
            errors.push("type may not be empty".to_string());
        } else {
            if commit_type != commit_type.to_lowercase() {
                errors.push("type must be lower-case".to_string());
            }
            if !self.rules.types.iter().any(|t| t == commit_type) {
                errors.push(format!(
                    "type must be one of [{}]",
                    self.rules.types.join(", ")
                ));
            }
        }

        if let Some(scope) = scope {
            if scope != scope.to_lowercase() {
                errors.push("scope must be lower-case".to_string());
            }
        }

        if subject.is_empty() {
            errors.push("subject may not be empty".to_string());
        } else if subject.ends_with('.') {
            errors.push("subject may not end with full stop".to_string());
        }
    }

    fn check_body(lines: &[&str], warnings: &mut Vec<String>) {
        if lines.len() < 2 {
            return;
        }

        if !lines[1].trim().is_empty() {
            warnings.push("body must have leading blank line".to_string());
        }

        let footer_start = lines
            .iter()
            .enumerate()
            .skip(2)
            .find(|(_, line)| FOOTER_PATTERN.is_match(line))
            .map(|(i, _)| i)
            .or_else(|| Self::trailer_block_start(lines));

        if let Some(i) = footer_start {
            if !lines[i - 1].trim().is_empty() {
                warnings.push("footer must have leading blank line".to_string());
            }
        }
    }

    /// Start of the last paragraph when every line in it is a git trailer
    fn trailer_block_start(lines: &[&str]) -> Option<usize> {
        let start = lines
            .iter()
            .rposition(|line| line.trim().is_empty())
            .map_or(0, |i| i + 1);

        let block = &lines[start..];
        (start >= 2 && !block.is_empty() && block.iter().all(|l| TRAILER_PATTERN.is_match(l)))
            .then_some(start)
    }
}

impl Linter for ConventionalLinter {
    fn lint(&self, message: &str) -> Result<LintResult> {
        let message = message.trim_end_matches(['\r', '\n']);
        let lines: Vec<&str> = message.lines().collect();
        let header = lines.first().copied().unwrap_or("");

        if self.is_ignored(header) {
            debug!(header = %header, "Ignoring commit message");
            return Ok(LintResult::clean());
        }

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        self.check_header(header, &mut errors);
        Self::check_body(&lines, &mut warnings);

        Ok(LintResult::new(errors, warnings))
    }
}

/// Lint outcome of one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    pub sha: String,
    pub result: LintResult,
}

/// Aggregate over all commits of a pull request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub commits: usize,
    pub invalid_commits: usize,
    pub errors_count: usize,
    pub warnings_count: usize,
}

impl Outcome {
    pub fn from_reports(reports: &[CommitReport]) -> Self {
        reports.iter().fold(Self::default(), |mut acc, report| {
            acc.commits += 1;
            if !report.result.valid {
                acc.invalid_commits += 1;
            }
            acc.errors_count += report.result.errors.len();
            acc.warnings_count += report.result.warnings.len();
            acc
        })
    }

    /// Passes iff every commit is valid
    pub fn passed(&self) -> bool {
        self.invalid_commits == 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings_count > 0
    }
}

/// Lint every commit message in order
pub fn evaluate(linter: &dyn Linter, commits: &[Commit]) -> Result<Vec<CommitReport>> {
    commits
        .iter()
        .map(|commit| {
            let result = linter.lint(&commit.message)?;
            debug!(
                sha = %commit.sha,
                valid = result.valid,
                errors = result.errors.len(),
                warnings = result.warnings.len(),
                "Linted commit message"
            );
            Ok(CommitReport {
                sha: commit.sha.clone(),
                result,
            })
        })
        .collect()
}
