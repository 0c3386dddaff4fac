use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Expired or invalid credential (HTTP 401).
    Unauthorized,
    /// Domain-level rejection (HTTP 409).
    Conflict,
    /// Network failures and every other status.
    Generic,
    Validation,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            409 => ErrorCode::Conflict,
            _ => ErrorCode::Generic,
        }
    }
}

/// Classified failure carried by a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: None,
            message: message.into(),
        }
    }

    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::from_status(status),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Failure with no HTTP response at all (connect, timeout, decode).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Generic, message)
    }

    /// The application layer should send the user back to login.
    pub fn requires_reauth(&self) -> bool {
        self.code == ErrorCode::Unauthorized
    }
}
