use thiserror::Error;

use super::transport::TransportError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error. Please check your connection. ({0})")]
    Network(#[from] TransportError),

    #[error("Invalid JSON returned from server: {0}")]
    MalformedResponse(String),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Session expired. Please login again.")]
    AuthExpired,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unexpected response shape: {0}")]
    ContractViolation(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build the error for a parsed, non-2xx response.
    /// Prefers the server's `message` field over a generic status line.
    pub fn from_status(status: u16, body: &serde_json::Value) -> Self {
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(Self::truncate_body)
            .unwrap_or_else(|| format!("HTTP error {}", status));
        ApiError::Http { status, message }
    }

    /// HTTP status carried by the error, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::AuthExpired => Some(401),
            _ => None,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_status_uses_server_message() {
        let err = ApiError::from_status(404, &json!({ "message": "not found" }));
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_from_status_falls_back_to_status_line() {
        let err = ApiError::from_status(500, &json!({ "success": false }));
        assert_eq!(err.to_string(), "HTTP error 500");

        // Empty and non-string messages are not useful to the caller
        let err = ApiError::from_status(422, &json!({ "message": "" }));
        assert_eq!(err.to_string(), "HTTP error 422");
        let err = ApiError::from_status(422, &json!({ "message": 7 }));
        assert_eq!(err.to_string(), "HTTP error 422");
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(ApiError::truncate_body("short"), "short");

        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.ends_with("(truncated, 520 total bytes)"));
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let long = "é".repeat(MAX_ERROR_BODY_LENGTH);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated"));
    }

    #[test]
    fn test_auth_expired_is_distinct() {
        assert!(ApiError::AuthExpired.is_auth_expired());
        assert!(!ApiError::from_status(403, &json!({})).is_auth_expired());
    }
}
