// src/error.rs
// Standardized error types for the Aula client

use thiserror::Error;

/// Main error type for the Aula library
#[derive(Error, Debug)]
pub enum AulaError {
    /// Bad credentials or an unrecoverable login-flow failure. Never retried.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The platform invalidated the session mid-flight and one transparent
    /// re-login did not recover it.
    #[error("session expired")]
    SessionExpired,

    /// Network-level failure (connect, timeout, TLS). Surfaced immediately;
    /// the caller may retry.
    #[error("transport error: {0}")]
    Transport(String),

    /// Caller input violated an operation contract (e.g. start > end).
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Requested id is absent from the current data set.
    #[error("not found: {0}")]
    NotFound(String),

    /// The whole response was unusable. Per-record anomalies are downgraded
    /// to warnings and never produce this.
    #[error("unparseable response: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Result using AulaError
pub type Result<T> = std::result::Result<T, AulaError>;

impl AulaError {
    /// Convert to user-facing string for MCP tool boundaries
    pub fn to_user_string(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for AulaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AulaError::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            AulaError::Transport(format!("connection failed: {}", err))
        } else {
            AulaError::Transport(err.to_string())
        }
    }
}

impl From<AulaError> for String {
    fn from(err: AulaError) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_error() {
        let err = AulaError::Authentication("bad credentials".to_string());
        assert!(err.to_string().contains("authentication failed"));
        assert!(err.to_string().contains("bad credentials"));
    }

    #[test]
    fn test_session_expired_error() {
        let err = AulaError::SessionExpired;
        assert!(err.to_string().contains("session expired"));
    }

    #[test]
    fn test_invalid_range_error() {
        let err = AulaError::InvalidRange("start after end".to_string());
        assert!(err.to_string().contains("invalid range"));
        assert!(err.to_string().contains("start after end"));
    }

    #[test]
    fn test_not_found_error() {
        let err = AulaError::NotFound("child 42".to_string());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_to_user_string() {
        let err = AulaError::Transport("timeout".to_string());
        assert_eq!(err.to_user_string(), err.to_string());
    }

    #[test]
    fn test_into_string() {
        let err = AulaError::Parse("empty body".to_string());
        let s: String = err.into();
        assert!(s.contains("unparseable response"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: AulaError = json_err.into();
        assert!(matches!(err, AulaError::Json(_)));
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(AulaError::SessionExpired);
        assert!(result.is_err());
    }
}
