use reqwest::StatusCode;
use thiserror::Error;

/// Longest body excerpt kept in an error message
pub const PREVIEW_CHARS: usize = 200;

/// Failure talking to the market-data API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Retryable error: {status}")]
    Retryable { status: StatusCode },

    #[error("Client error {status}: {preview}")]
    Client { status: StatusCode, preview: String },

    #[error("Non-JSON response: {0}")]
    NonJson(String),

    #[error("Request error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Rate limits, server errors and transport hiccups are worth another attempt.
    /// Everything else fails fast.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Retryable { .. } | ApiError::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// First `PREVIEW_CHARS` characters of a response body
pub fn preview(body: &str) -> String {
    body.chars().take(PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(ApiError::Retryable { status: StatusCode::TOO_MANY_REQUESTS }.is_retryable());
        assert!(ApiError::Transport("reset".to_string()).is_retryable());
        assert!(!ApiError::NonJson("<html>".to_string()).is_retryable());
        assert!(
            !ApiError::Client {
                status: StatusCode::UNAUTHORIZED,
                preview: "bad key".to_string(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_preview_truncates() {
        let body = "x".repeat(500);
        assert_eq!(preview(&body).len(), PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }
}
