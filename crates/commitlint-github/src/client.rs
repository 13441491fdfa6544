//! GitHub REST API client
//!
//! Uses the secrecy crate to protect the token in memory.

use async_trait::async_trait;
use commitlint_core::{
    Commit, Error, GitHubApi, GitHubSettings, NewComment, PullRequestRef, Result, StatusUpdate,
};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("commitlint-bot/", env!("CARGO_PKG_VERSION"));

const API_VERSION: &str = "2022-11-28";

/// GitHub client over the REST API
#[derive(Clone)]
pub struct GitHubClient {
    token: Option<SecretString>,
    base_url: String,
    per_page: u32,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a client for api.github.com with default settings
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let settings = GitHubSettings {
            token: Some(token.into()),
            ..GitHubSettings::default()
        };
        Self::with_settings(&settings)
    }

    /// Create a client from configuration
    pub fn with_settings(settings: &GitHubSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            token: settings.token.clone().map(SecretString::new),
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            per_page: settings.per_page,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", API_VERSION);

        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: api_error_message(&body),
            });
        }

        Ok(response)
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    Error::Transport(err.to_string())
}

/// Pull the `message` out of a GitHub error body, falling back to the raw text
fn api_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        message: String,
    }

    serde_json::from_str::<ApiError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string())
}

#[derive(Debug, Serialize)]
struct CreateStatusRequest<'a> {
    state: &'a str,
    description: &'a str,
    context: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateCommentRequest<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn create_status(&self, status: &StatusUpdate) -> Result<()> {
        let path = format!(
            "/repos/{}/{}/statuses/{}",
            status.owner, status.repo, status.sha
        );
        debug!(path = %path, state = %status.state, "Creating commit status");

        let body = CreateStatusRequest {
            state: status.state.as_str(),
            description: &status.description,
            context: &status.context,
        };
        self.send(self.request(Method::POST, &path).json(&body))
            .await?;
        Ok(())
    }

    async fn get_commits(&self, pull_request: &PullRequestRef) -> Result<Vec<Commit>> {
        let path = format!(
            "/repos/{}/{}/pulls/{}/commits",
            pull_request.owner, pull_request.repo, pull_request.number
        );
        debug!(path = %path, "Listing pull request commits");

        let response = self
            .send(
                self.request(Method::GET, &path)
                    .query(&[("per_page", self.per_page)]),
            )
            .await?;
        let items: Vec<CommitItem> = response.json().await.map_err(transport_error)?;

        Ok(items
            .into_iter()
            .map(|item| Commit::new(item.sha, item.commit.message))
            .collect())
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<()> {
        let path = format!(
            "/repos/{}/{}/issues/{}/comments",
            comment.owner, comment.repo, comment.number
        );
        debug!(path = %path, "Creating pull request comment");

        let body = CreateCommentRequest {
            body: &comment.body,
        };
        self.send(self.request(Method::POST, &path).json(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_settings_trims_base_url() {
        let settings = GitHubSettings {
            api_url: "https://ghe.example.com/api/v3/".to_string(),
            ..GitHubSettings::default()
        };
        let client = GitHubClient::with_settings(&settings).unwrap();
        assert_eq!(client.base_url(), "https://ghe.example.com/api/v3");
    }

    #[test]
    fn test_new_uses_public_api() {
        let client = GitHubClient::new("ghp_token").unwrap();
        assert_eq!(client.base_url(), "https://api.github.com");
        assert!(client.token.is_some());
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error_message(r#"{"message":"Bad credentials","documentation_url":"x"}"#),
            "Bad credentials"
        );
        assert_eq!(api_error_message("upstream timeout"), "upstream timeout");
    }

    #[test]
    fn test_status_request_body() {
        let body = CreateStatusRequest {
            state: "pending",
            description: "Waiting for the status to be reported",
            context: "commitlint-bot",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "state": "pending",
                "description": "Waiting for the status to be reported",
                "context": "commitlint-bot"
            })
        );
    }
}
