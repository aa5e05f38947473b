//! Canonical API result types
//!
//! Every call through the client resolves to an [`ApiResult`], regardless of
//! which envelope shape the backend used. Errors are carried as data — a
//! caller that ignores them still holds a well-typed value.

use serde::{Deserialize, Serialize};

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No response reached the client (connect error, timeout, ...).
    /// Recoverable by caller-level retry policy; never retried internally.
    Network,
    /// The access token was rejected (401). Handled internally via the
    /// one-shot renew-and-replay protocol; surfaced only when renewal
    /// itself fails or the replay is rejected again.
    AuthExpired,
    /// Non-2xx server response (5xx or an unclassified status).
    Server,
    /// 4xx response other than 401, e.g. a validation failure.
    Client,
}

/// Unified result of an API call.
///
/// ```json
/// { "success": true, "data": { ... } }
/// { "success": false, "error": "Server", "message": "..." }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResult<T> {
    /// Whether the call succeeded.
    pub success: bool,
    /// Unwrapped payload (successful calls only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Failure classification (failed calls only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    /// Human-readable message, server-provided when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Create a successful result with a server-provided message
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message.into()),
        }
    }

    /// Create a failed result
    pub fn err(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(kind),
            message: Some(message.into()),
        }
    }

    /// Create a failed result without a message
    pub fn err_kind(kind: ErrorKind) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(kind),
            message: None,
        }
    }

    /// True when the call succeeded.
    pub fn is_ok(&self) -> bool {
        self.success
    }

    /// The failure classification, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.error
    }

    /// Map the payload type, keeping the outcome intact.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        ApiResult {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            message: self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_roundtrip() {
        let result: ApiResult<Vec<i32>> = ApiResult::ok(vec![1, 2, 3]);
        let json = serde_json::to_string(&result).unwrap();
        let parsed: ApiResult<Vec<i32>> = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_ok());
        assert_eq!(parsed.data, Some(vec![1, 2, 3]));
        assert_eq!(parsed.error, None);
    }

    #[test]
    fn test_err_carries_kind_and_message() {
        let result: ApiResult<()> = ApiResult::err(ErrorKind::Server, "boom");
        assert!(!result.is_ok());
        assert_eq!(result.kind(), Some(ErrorKind::Server));
        assert_eq!(result.message.as_deref(), Some("boom"));
    }
}
