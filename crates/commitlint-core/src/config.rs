//! Bot configuration
//!
//! Loaded from YAML under a top-level `commitlint` key. `${VAR}` references
//! are replaced with environment variables before parsing, so secrets can
//! stay out of the file:
//!
//! ```yaml
//! commitlint:
//!   github:
//!     token: ${GITHUB_TOKEN}
//!   comment:
//!     on_warnings: true
//!   lint:
//!     header_max_length: 100
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::comment::CommentPolicy;
use crate::lint::LintRules;
use crate::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    pub github: GitHubSettings,
    pub comment: CommentPolicy,
    pub lint: LintRules,
}

/// GitHub API connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GitHubSettings {
    /// REST API base URL
    pub api_url: String,
    /// Installation or personal access token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Page size when listing pull request commits
    pub per_page: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            per_page: 100,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BotConfigFile {
    commitlint: Option<BotConfig>,
}

impl BotConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let yaml = substitute_env_vars(yaml);
        let file: BotConfigFile = serde_yaml::from_str(&yaml)
            .map_err(|e| Error::Config(format!("Failed to parse YAML config: {}", e)))?;
        let config = file.commitlint.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.github.api_url.trim().is_empty() {
            return Err(Error::Config("github.api_url must not be empty".to_string()));
        }
        if self.github.per_page == 0 || self.github.per_page > 100 {
            return Err(Error::Config(format!(
                "github.per_page must be between 1 and 100, got {}",
                self.github.per_page
            )));
        }
        if self.github.timeout_secs == 0 {
            return Err(Error::Config(
                "github.timeout_secs must be positive".to_string(),
            ));
        }
        if self.lint.types.is_empty() {
            return Err(Error::Config("lint.types must not be empty".to_string()));
        }
        if self.lint.header_max_length == 0 {
            return Err(Error::Config(
                "lint.header_max_length must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy of the configuration that is safe to print
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.github.token.is_some() {
            config.github.token = Some("***".to_string());
        }
        config
    }

    pub fn to_yaml(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Wrapper<'a> {
            commitlint: &'a BotConfig,
        }
        Ok(serde_yaml::to_string(&Wrapper { commitlint: self })?)
    }
}

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern"));

/// Replace `${VAR}` with the variable's value; unset variables are left as is
fn substitute_env_vars(yaml: &str) -> String {
    let mut result = yaml.to_string();

    for cap in ENV_VAR_PATTERN.captures_iter(yaml) {
        let var_name = &cap[1];
        if let Ok(var_value) = std::env::var(var_name) {
            let placeholder = format!("${{{}}}", var_name);
            result = result.replace(&placeholder, &var_value);
        }
    }

    result
}
