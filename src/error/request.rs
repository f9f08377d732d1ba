use std::time::Duration;

use thiserror::Error;

use super::GenerationError;

/// Failure of a single request attempt. Recorded, never retried.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("path parameter '{name}': {source}")]
    PathParameter {
        name: String,
        #[source]
        source: GenerationError,
    },
    #[error("query parameter '{name}': {source}")]
    QueryParameter {
        name: String,
        #[source]
        source: GenerationError,
    },
    #[error("request body: {source}")]
    Body {
        #[source]
        source: GenerationError,
    },
    #[error("random source: {source}")]
    Random {
        #[source]
        source: GenerationError,
    },
    #[error("request body serialization: {source}")]
    BodyEncode {
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid URL: {source}")]
    InvalidUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build request: {source}")]
    Build {
        #[source]
        source: reqwest::Error,
    },
    #[error("request timed out after {}ms", timeout.as_millis())]
    Timeout { timeout: Duration },
    #[error("connection failed: {source}")]
    Connect {
        #[source]
        source: reqwest::Error,
    },
    #[error("transport error: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
}

impl RequestError {
    /// Classifies a client error, dropping the URL so identical failures
    /// against different generated paths share one message.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return Self::Timeout { timeout };
        }
        if err.is_builder() {
            return Self::Build {
                source: err.without_url(),
            };
        }
        if err.is_connect() {
            return Self::Connect {
                source: err.without_url(),
            };
        }
        Self::Transport {
            source: err.without_url(),
        }
    }
}
