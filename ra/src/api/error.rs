//! API error types

use std::time::Duration;

use thiserror::Error;

/// Errors from talking to the prediction service
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Unauthorized { message: Option<String> },

    #[error("Request rejected with status {status}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Rejected { status: u16, detail: Option<String> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// The message the server put in its error body, if any
    pub fn server_detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message } => message.as_deref(),
            ApiError::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_detail() {
        let err = ApiError::Unauthorized {
            message: Some("Incorrect username or password".to_string()),
        };
        assert_eq!(err.server_detail(), Some("Incorrect username or password"));

        let err = ApiError::Rejected {
            status: 400,
            detail: Some("Username already registered".to_string()),
        };
        assert_eq!(err.server_detail(), Some("Username already registered"));

        let err = ApiError::InvalidResponse("missing field".to_string());
        assert_eq!(err.server_detail(), None);
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Rejected {
            status: 422,
            detail: Some("field required".to_string()),
        };
        assert_eq!(err.to_string(), "Request rejected with status 422: field required");

        let err = ApiError::Unauthorized { message: None };
        assert_eq!(err.to_string(), "Unauthorized");

        let err = ApiError::Timeout(Duration::from_secs(30));
        assert!(err.to_string().contains("30"));
    }
}
