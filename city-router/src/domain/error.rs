//! Routing error types.
//!
//! These errors describe why a route could not be produced. They are
//! cloneable so failed results can be cached and replayed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, caller-visible error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidInput,
    NotNavigable,
    NoPathFound,
    UpstreamLookupFailure,
    Timeout,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "InvalidInput",
            ErrorCode::NotNavigable => "NotNavigable",
            ErrorCode::NoPathFound => "NoPathFound",
            ErrorCode::UpstreamLookupFailure => "UpstreamLookupFailure",
            ErrorCode::Timeout => "Timeout",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a route query failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// Malformed or non-finite coordinates
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An endpoint is neither on land nor within reach of a dock
    #[error("endpoint is not navigable")]
    NotNavigable,

    /// Endpoints resolved but the graph does not connect them
    #[error("no path found between endpoints")]
    NoPathFound,

    /// A dock's operator could not be looked up
    #[error("lookup of building {building_id} failed: {message}")]
    UpstreamLookupFailure {
        building_id: String,
        message: String,
    },

    /// The query deadline passed
    #[error("route search timed out")]
    Timeout,
}

impl RouteError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RouteError::InvalidInput(_) => ErrorCode::InvalidInput,
            RouteError::NotNavigable => ErrorCode::NotNavigable,
            RouteError::NoPathFound => ErrorCode::NoPathFound,
            RouteError::UpstreamLookupFailure { .. } => ErrorCode::UpstreamLookupFailure,
            RouteError::Timeout => ErrorCode::Timeout,
        }
    }

    /// Whether a failed result with this error may be stored in the cache.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, RouteError::InvalidInput(_))
    }
}
