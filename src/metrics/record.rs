use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;

/// Outcome of one request attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub url: String,
    pub method: Method,
    /// Zero when no response was received.
    pub status_code: u16,
    pub elapsed: Duration,
    pub is_error: bool,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
}

impl ResultRecord {
    /// Record for a received response, whatever its status.
    #[must_use]
    pub fn response(url: String, method: Method, status_code: u16, elapsed: Duration) -> Self {
        Self {
            url,
            method,
            status_code,
            elapsed,
            is_error: false,
            error_message: String::new(),
            timestamp: Utc::now(),
        }
    }

    /// Record for an attempt that never got a response.
    #[must_use]
    pub fn error(url: String, method: Method, message: String, elapsed: Duration) -> Self {
        Self {
            url,
            method,
            status_code: 0,
            elapsed,
            is_error: true,
            error_message: message,
            timestamp: Utc::now(),
        }
    }

    /// Failed means no response at all or a 4xx/5xx status.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.is_error || self.status_code >= 400
    }
}
