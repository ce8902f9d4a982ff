//! Error types for the Pharos library.
//!
//! All fallible operations in the discovery engine return [`Result`], whose
//! error type is the [`PharosError`] enum. The taxonomy mirrors the request
//! lifecycle: invalid input is rejected outright, a degraded dependency is
//! logged by the caller and never surfaced here, and a systemic failure
//! (every branch of a fan-out lost) maps to [`PharosError::Unavailable`] so
//! callers can tell "nothing relevant" apart from "engine unavailable".

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Pharos operations.
#[derive(Error, Debug)]
pub enum PharosError {
    /// I/O errors (fixture loading, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Query processing errors (malformed input, bad cursor).
    #[error("Query error: {0}")]
    Query(String),

    /// Search index errors.
    #[error("Index error: {0}")]
    Index(String),

    /// Ranking errors (invalid weights, bad configuration).
    #[error("Ranking error: {0}")]
    Ranking(String),

    /// Trending analysis errors.
    #[error("Trending error: {0}")]
    Trending(String),

    /// Recommendation blending errors.
    #[error("Recommendation error: {0}")]
    Recommendation(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed caller input, rejected without retry.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every dependency backing a request failed; distinct from an empty result.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with PharosError.
pub type Result<T> = std::result::Result<T, PharosError>;

impl PharosError {
    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        PharosError::Query(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        PharosError::Index(msg.into())
    }

    /// Create a new ranking error.
    pub fn ranking<S: Into<String>>(msg: S) -> Self {
        PharosError::Ranking(msg.into())
    }

    /// Create a new trending error.
    pub fn trending<S: Into<String>>(msg: S) -> Self {
        PharosError::Trending(msg.into())
    }

    /// Create a new recommendation error.
    pub fn recommendation<S: Into<String>>(msg: S) -> Self {
        PharosError::Recommendation(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        PharosError::InvalidConfig(msg.into())
    }

    /// Create a new invalid input error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        PharosError::InvalidInput(msg.into())
    }

    /// Create a new unavailable error.
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        PharosError::Unavailable(msg.into())
    }

    /// Create a new timeout error.
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        PharosError::Other(format!("Timeout: {}", msg.into()))
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        PharosError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PharosError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = PharosError::query("bad cursor");
        assert_eq!(error.to_string(), "Query error: bad cursor");

        let error = PharosError::unavailable("all indices failed");
        assert_eq!(error.to_string(), "Service unavailable: all indices failed");

        let error = PharosError::invalid_input("binary payload");
        assert_eq!(error.to_string(), "Invalid input: binary payload");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "fixture not found");
        let pharos_error = PharosError::from(io_error);

        match pharos_error {
            PharosError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
