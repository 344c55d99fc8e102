//! Error types for the domwatch system
//!
//! This module defines the crate error, the per-backend failure record and
//! the aggregate that a multi-registrar pass returns.

use std::fmt;
use thiserror::Error;

/// Result type alias for domwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the domwatch system
#[derive(Error, Debug)]
pub enum Error {
    /// Registrar-related errors
    #[error("Registrar error: {0}")]
    Registrar(String),

    /// Snapshot store errors
    #[error("Snapshot store error: {0}")]
    Snapshot(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from registrar APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Malformed or truncated control-plane input
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not offered by this backend
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create a registrar error
    pub fn registrar(msg: impl Into<String>) -> Self {
        Self::Registrar(msg.into())
    }

    /// Create a snapshot store error
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an unsupported operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

/// A single registrar call that failed during a pass
#[derive(Error, Debug)]
#[error("{registrar}: {cause}")]
pub struct BackendError {
    /// Name of the registrar that failed
    pub registrar: String,
    /// Position of the registrar in the pass input
    pub position: usize,
    /// What went wrong
    #[source]
    pub cause: Error,
}

impl BackendError {
    /// Create a backend error
    pub fn new(registrar: impl Into<String>, position: usize, cause: Error) -> Self {
        Self {
            registrar: registrar.into(),
            position,
            cause,
        }
    }
}

/// Every registrar failure collected during one pass, in input order
///
/// A pass never stops because one registrar failed; instead the failure is
/// folded in here. Passes return `Some(AggregatedError)` only when at least
/// one registrar call itself failed.
#[derive(Debug, Default)]
pub struct AggregatedError {
    context: String,
    errors: Vec<BackendError>,
}

impl AggregatedError {
    /// Create an empty aggregate with a summary line
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            errors: Vec::new(),
        }
    }

    /// Append a failure, returning the new number of contained errors
    pub fn push(&mut self, err: BackendError) -> usize {
        self.errors.push(err);
        self.errors.len()
    }

    /// Number of contained errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no error was collected
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The contained errors, in the order they occurred
    pub fn errors(&self) -> &[BackendError] {
        &self.errors
    }

    /// Iterate over the contained errors
    pub fn iter(&self) -> std::slice::Iter<'_, BackendError> {
        self.errors.iter()
    }

    /// Whether any contained cause satisfies `predicate`
    ///
    /// ```rust
    /// use domwatch_core::error::{AggregatedError, BackendError, Error};
    ///
    /// let mut agg = AggregatedError::new("check pass failed");
    /// agg.push(BackendError::new("rdap", 0, Error::rate_limited("slow down")));
    /// assert!(agg.contains(|e| matches!(e, Error::RateLimited(_))));
    /// ```
    pub fn contains(&self, predicate: impl Fn(&Error) -> bool) -> bool {
        self.errors.iter().any(|e| predicate(&e.cause))
    }

    /// Whether the named registrar failed during the pass
    pub fn contains_registrar(&self, registrar: &str) -> bool {
        self.errors.iter().any(|e| e.registrar == registrar)
    }

    /// `None` when nothing failed, `Some(self)` otherwise
    pub fn into_option(self) -> Option<Self> {
        if self.errors.is_empty() { None } else { Some(self) }
    }
}

impl fmt::Display for AggregatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.context)?;
        for err in &self.errors {
            write!(f, "\n\t- {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregatedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .first()
            .map(|e| &e.cause as &(dyn std::error::Error + 'static))
    }
}

impl<'a> IntoIterator for &'a AggregatedError {
    type Item = &'a BackendError;
    type IntoIter = std::slice::Iter<'a, BackendError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
