//! Exchange adapter error types
//!
//! All exchange-related failures are wrapped in the ExchangeError enum.
//! Variants split into two buckets: retryable (the caller may try the same
//! call again later) and fatal (a bug, bad data, or an unknown fault).

use thiserror::Error;

use crate::adapters::itbit::ExchangeResponse;

/// Exchange-specific error types for adapter operations
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Socket connect or read timed out
    #[error("Failed to connect to Exchange due to socket timeout: {0}")]
    Timeout(String),

    /// Exchange answered 502/503/504 (transient overload)
    #[error("Failed to connect to Exchange due to {status} timeout: {body}")]
    ServerUnavailable { status: u16, body: String },

    /// Exchange answered with a status the operation did not expect
    #[error("{context}. Details: {response}")]
    UnexpectedStatus {
        context: String,
        response: ExchangeResponse,
    },

    /// Body could not be mapped onto the expected shape
    #[error("Invalid response: {reason} - body: {body}")]
    InvalidResponse { reason: String, body: String },

    /// Order side other than "buy" or "sell"
    #[error("Unrecognised order side received: {0}")]
    UnknownOrderSide(String),

    /// Programming error: malformed URL, unsupported HTTP method, bad argument
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Building the request signature failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Unexpected I/O failure (DNS, connection refused, reset)
    #[error("Failed to connect to Exchange due to unexpected IO error: {0}")]
    Transport(String),

    /// Invalid or missing configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExchangeError {
    /// True for the timeout bucket: the caller may retry the call.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExchangeError::Timeout(_) | ExchangeError::ServerUnavailable { .. }
        )
    }

    /// Raw response body attached to the error, if any
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ExchangeError::ServerUnavailable { body, .. } => Some(body),
            ExchangeError::UnexpectedStatus { response, .. } => Some(&response.body),
            ExchangeError::InvalidResponse { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Result type alias for exchange operations
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = ExchangeError::Timeout("operation timed out".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to connect to Exchange due to socket timeout: operation timed out"
        );
    }

    #[test]
    fn test_server_unavailable_display() {
        let err = ExchangeError::ServerUnavailable {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to connect to Exchange due to 503 timeout: overloaded"
        );
    }

    #[test]
    fn test_retryable_bucket() {
        assert!(ExchangeError::Timeout("t".into()).is_retryable());
        assert!(ExchangeError::ServerUnavailable { status: 502, body: String::new() }.is_retryable());

        assert!(!ExchangeError::Transport("refused".into()).is_retryable());
        assert!(!ExchangeError::UnknownOrderSide("hold".into()).is_retryable());
        assert!(!ExchangeError::InvalidRequest("PATCH".into()).is_retryable());
        assert!(!ExchangeError::Config("key".into()).is_retryable());
    }

    #[test]
    fn test_unexpected_status_carries_response() {
        let err = ExchangeError::UnexpectedStatus {
            context: "Failed to create order on exchange".to_string(),
            response: ExchangeResponse::new(500, "Internal Server Error", r#"{"code":1}"#),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to create order on exchange. Details:"), "Got: {}", msg);
        assert!(msg.contains("500"), "Got: {}", msg);
        assert_eq!(err.response_body(), Some(r#"{"code":1}"#));
    }

    #[test]
    fn test_invalid_response_display() {
        let err = ExchangeError::InvalidResponse {
            reason: "expected value".to_string(),
            body: "<html>".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid response: expected value - body: <html>");
        assert_eq!(err.response_body(), Some("<html>"));
    }
}
