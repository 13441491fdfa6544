//! Error types for commitlint-core

use thiserror::Error;

use crate::handler::Phase;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed event payload: {0}")]
    MalformedEvent(String),

    #[error("Lint error: {0}")]
    Lint(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{phase} failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the pipeline phase an error surfaced in.
    ///
    /// Errors that already carry a phase are returned unchanged.
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            Error::Phase { .. } => self,
            other => Error::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// The phase this error surfaced in, if known
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_phase_wraps_once() {
        let err = Error::Transport("connection reset".to_string())
            .in_phase(Phase::Fetching)
            .in_phase(Phase::Reporting);

        assert_eq!(err.phase(), Some(Phase::Fetching));
        assert_eq!(
            err.to_string(),
            "fetching failed: Transport error: connection reset"
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = Error::Api {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "GitHub API error (404): Not Found");
        assert!(err.phase().is_none());
    }
}
