// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for the AJAX interceptor
//!
//! Misuse errors (wiring twice, unwiring when not wired, removing an
//! observer that was never added) are synchronous and never retryable.
//! Observer failures travel through the same type so that they can abort
//! the `send` or `readystatechange` dispatch that triggered them.

use std::fmt;

use thiserror::Error;

/// Result type alias for interceptor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which observer list an operation targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverKind {
    Request,
    Response,
}

impl fmt::Display for ObserverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObserverKind::Request => write!(f, "request"),
            ObserverKind::Response => write!(f, "response"),
        }
    }
}

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// `wire()` called while the hooks are installed
    #[error("Ajax interceptor already wired")]
    AlreadyWired,

    /// `unwire()` called while the hooks are not installed
    #[error("Ajax interceptor not currently wired")]
    NotWired,

    /// Removal of an observer that is not registered
    #[error("Could not remove {kind} observer: not registered")]
    ObserverNotFound { kind: ObserverKind },

    /// An observer or readystatechange listener failed
    #[error("Observer failed: {0}")]
    Observer(String),

    /// Request object used out of order (e.g. send before open)
    #[error("Invalid request state: {operation} requires {expected}, request is {actual}")]
    InvalidState {
        operation: &'static str,
        expected: &'static str,
        actual: String,
    },

    /// Host does not provide the requested capability
    #[error("Unsupported by host: {0}")]
    Unsupported(String),

    /// HTTP method could not be parsed
    #[error("Invalid HTTP method: {0}")]
    Method(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Network failure outside of reqwest (no runtime, aborted task)
    #[error("Network error: {0}")]
    Network(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an observer failure
    pub fn observer<S: Into<String>>(msg: S) -> Self {
        Error::Observer(msg.into())
    }

    /// Create a not-found error for the given observer list
    pub fn observer_not_found(kind: ObserverKind) -> Self {
        Error::ObserverNotFound { kind }
    }

    /// Create an invalid state error
    pub fn invalid_state(
        operation: &'static str,
        expected: &'static str,
        actual: impl fmt::Debug,
    ) -> Self {
        Error::InvalidState {
            operation,
            expected,
            actual: format!("{:?}", actual),
        }
    }

    /// Create a network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Error::Network(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Caller misuse of the interceptor API; retrying the same call
    /// without changing state fails again
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Error::AlreadyWired | Error::NotWired | Error::ObserverNotFound { .. }
        )
    }

    /// Raised by an observer rather than by the interceptor itself
    pub fn is_observer_failure(&self) -> bool {
        matches!(self, Error::Observer(_))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Turn any error into a configuration error mentioning `source`
    fn config_context(self, source: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn config_context(self, source: &str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            Error::Config(format!("{}: {}", source, err))
        })
    }
}
