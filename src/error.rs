// src/error.rs

//! Unified error handling for board ingestion.

use std::fmt;

use thiserror::Error;

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or used
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Logical key was empty or whitespace-only
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Logical key is not one of the registered sources
    #[error("Unknown key: '{0}'")]
    UnknownKey(String),

    /// Transport failure other than a timeout
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// A single request exceeded its timeout
    #[error("Request timed out: {url}")]
    Timeout { url: String },

    /// Timeouts persisted past the retry budget
    #[error("Gave up on {url} after {attempts} attempts")]
    RetryExhausted { url: String, attempts: u32 },

    /// An ingest guard stopped the run before any row was collected
    #[error("Ingest of {url} stopped early: {reason}")]
    IngestAborted { url: String, reason: String },

    /// Row or cache write with the wrong number of fields
    #[error("Invalid row shape: expected {expected} fields, got {actual}")]
    InvalidShape { expected: usize, actual: usize },

    /// Report format has no registered writer
    #[error("Report format '{0}' is not supported")]
    UnknownFormat(String),

    /// Nothing cached (or nothing fetched) for the key
    #[error("No data available for '{0}'")]
    NoData(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a network error for a URL.
    pub fn network(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Network {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a timeout error for a URL.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Create a shape error for a row of `actual` fields.
    pub fn shape(expected: usize, actual: usize) -> Self {
        Self::InvalidShape { expected, actual }
    }

    /// Whether the same request may be retried.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
