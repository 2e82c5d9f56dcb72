// src/error.rs

//! Unified error handling for the scraper.

use std::fmt;

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request did not complete within the configured timeout
    #[error("Timeout fetching {url}")]
    Timeout { url: String },

    /// Connection could not be established or was dropped
    #[error("Connection failed for {url}: {message}")]
    Connection { url: String, message: String },

    /// Server answered with a non-2xx status
    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Malformed page, feed, or JSON payload
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// Extracted fields fell below the quality threshold
    #[error("Insufficient content at {url}: {reason}")]
    InsufficientContent { url: String, reason: String },

    /// Nothing worth trying was discovered
    #[error("No candidates found: {0}")]
    NoCandidates(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

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
}

/// Coarse failure classes used to decide between skipping an item,
/// falling back to the next strategy, or reporting a run-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Http,
    Blocked,
    Parse,
    InsufficientContent,
    NoCandidates,
    Internal,
}

impl AppError {
    /// Create a connection error.
    pub fn connection(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Connection {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create an insufficient-content error.
    pub fn insufficient(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InsufficientContent {
            url: url.into(),
            reason: reason.into(),
        }
    }

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

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403 answers: the resource exists but is protected.
    pub fn is_blocked(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Classify this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } | Self::Connection { .. } => FailureKind::Network,
            Self::HttpStatus { .. } if self.is_blocked() => FailureKind::Blocked,
            Self::HttpStatus { .. } => FailureKind::Http,
            Self::Parse { .. } | Self::Json(_) | Self::Url(_) => FailureKind::Parse,
            Self::InsufficientContent { .. } => FailureKind::InsufficientContent,
            Self::NoCandidates(_) => FailureKind::NoCandidates,
            _ => FailureKind::Internal,
        }
    }
}
