//! Parser error types for plan analysis

use thiserror::Error;

/// Errors that can occur while reading EXPLAIN output
#[derive(Debug, Error)]
pub enum ParseError {
    /// The plan structure does not have the shape PostgreSQL produces
    #[error("Malformed plan at {path}: {reason}")]
    MalformedPlan { path: String, reason: String },

    #[error("Invalid plan JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ParseError {
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPlan { path: path.into(), reason: reason.into() }
    }
}

/// Result type alias for parser operations
pub type ParseResult<T> = Result<T, ParseError>;
