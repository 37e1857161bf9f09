//! Unified error types for the distribution engine.
//!
//! Error codes:
//! - FETCH_001-003: Remote endpoint errors (transport, upstream status, decode)
//! - CONFIG_001: Configuration errors
//! - DATA_001: No snapshot loaded yet
//! - REFRESH_001: Refresh already in progress

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Remote endpoint error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorCode {
    /// FETCH_001: Request never produced a response
    Transport,
    /// FETCH_002: Endpoint answered with a non-success status
    Status,
    /// FETCH_003: Response body did not have the expected shape
    Decode,
}

impl FetchErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport => "FETCH_001",
            Self::Status => "FETCH_002",
            Self::Decode => "FETCH_003",
        }
    }
}

/// Unified error type for the distribution engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Remote endpoint error with code.
    #[error("[{code}] {message}")]
    Fetch {
        code: &'static str,
        message: String,
        /// Upstream status, when the endpoint answered at all
        upstream_status: Option<u16>,
    },

    #[error("[CONFIG_001] invalid configuration: {0}")]
    Config(String),

    #[error("[DATA_001] no data loaded yet")]
    NoSnapshot,

    #[error("[REFRESH_001] a refresh is already running")]
    RefreshInProgress,

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a transport error (no response received).
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Fetch {
            code: FetchErrorCode::Transport.code(),
            message: msg.into(),
            upstream_status: None,
        }
    }

    /// Create an upstream status error.
    pub fn status(status: u16, msg: impl Into<String>) -> Self {
        Self::Fetch {
            code: FetchErrorCode::Status.code(),
            message: msg.into(),
            upstream_status: Some(status),
        }
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Fetch {
            code: FetchErrorCode::Decode.code(),
            message: msg.into(),
            upstream_status: None,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            // Upstream failures surface as a bad gateway
            Self::Fetch { .. } => 502,
            Self::Config(_) => 500,
            Self::NoSnapshot => 503,
            Self::RefreshInProgress => 409,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Fetch { code, .. } => code,
            Self::Config(_) => "CONFIG_001",
            Self::NoSnapshot => "DATA_001",
            Self::RefreshInProgress => "REFRESH_001",
            Self::Internal(_) => "INTERNAL",
        }
    }
}
