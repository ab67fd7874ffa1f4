//! Error types for remote operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for remote calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Domain reason attached to a remote rejection.
///
/// Informational only: no guard or retry logic keys off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorReason {
    /// The folder or bucket still holds objects.
    NotEmpty,
    /// The remote side has no credentials configured.
    NotConfigured,
    #[default]
    Other,
}

impl ErrorReason {
    /// Classify a backend error message.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("not empty") || lower.contains("bucketnotempty") {
            Self::NotEmpty
        } else if lower.contains("credentials not configured") {
            Self::NotConfigured
        } else {
            Self::Other
        }
    }
}

/// Errors returned by a remote gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport failure, no structured payload.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Structured rejection from the remote side.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        reason: ErrorReason,
    },

    /// The response could not be understood.
    #[error("Malformed response: {message}")]
    Decode { message: String },
}

impl GatewayError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an API error, deriving the reason from the message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Api {
            status,
            reason: ErrorReason::classify(&message),
            message,
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Reason code, `Other` for non-API errors.
    pub fn reason(&self) -> ErrorReason {
        match self {
            Self::Api { reason, .. } => *reason,
            _ => ErrorReason::Other,
        }
    }

    /// Check if the remote side refused because the target is not empty.
    pub fn is_not_empty(&self) -> bool {
        self.reason() == ErrorReason::NotEmpty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_classification() {
        let err = GatewayError::api(400, "Cannot delete bucket: Bucket is not empty");
        assert!(err.is_not_empty());
        assert_eq!(err.to_string(), "Cannot delete bucket: Bucket is not empty");

        let err = GatewayError::api(400, "AWS credentials not configured");
        assert_eq!(err.reason(), ErrorReason::NotConfigured);
    }

    #[test]
    fn test_network_error_has_no_reason() {
        let err = GatewayError::network("connection refused");
        assert_eq!(err.reason(), ErrorReason::Other);
        assert!(err.to_string().contains("connection refused"));
    }
}
