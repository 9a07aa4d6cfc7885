//! Core error types for the bobo-rs framework.
//!
//! This module provides the error enum [`BoboError`] shared by every crate in the
//! workspace. Route resolution failures are *not* errors: they are converted
//! into responses by the application and live in the HTTP crate instead.

use thiserror::Error;

/// The primary error type for the bobo-rs framework.
///
/// Each variant maps to an appropriate HTTP status code via [`BoboError::status_code`].
#[derive(Error, Debug)]
pub enum BoboError {
    // ── Registration ─────────────────────────────────────────────────

    /// A route pattern is malformed. Raised while registering routes, so it
    /// prevents the application from being built.
    #[error("Invalid route pattern: {0}")]
    Pattern(String),

    /// The application was assembled incorrectly.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── HTTP ─────────────────────────────────────────────────────────

    /// HTTP 400 Bad Request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 404 Not Found. Handlers may return this to produce a not-found page.
    #[error("Not found: {0}")]
    NotFound(String),

    // ── Handlers ─────────────────────────────────────────────────────

    /// A handler failed while producing its result.
    #[error("Handler error: {0}")]
    Handler(#[from] anyhow::Error),

    /// A handler returned a value that cannot be turned into a response.
    #[error("Bad response: {0}")]
    Response(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BoboError {
    /// Creates a [`BoboError::Handler`] from a plain message.
    pub fn handler(message: impl std::fmt::Display) -> Self {
        Self::Handler(anyhow::anyhow!("{message}"))
    }

    /// Returns the HTTP status code associated with this error.
    ///
    /// - `BadRequest` -> 400
    /// - `NotFound` -> 404
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Pattern(_)
            | Self::ImproperlyConfigured(_)
            | Self::Handler(_)
            | Self::Response(_)
            | Self::ConfigurationError(_)
            | Self::SerializationError(_)
            | Self::IoError(_) => 500,
        }
    }

    /// Returns `true` if this error originated in handler code rather than in
    /// the framework's own request processing.
    pub const fn is_handler_failure(&self) -> bool {
        matches!(
            self,
            Self::Handler(_) | Self::Response(_) | Self::SerializationError(_) | Self::IoError(_)
        )
    }
}

/// A convenience type alias for `Result<T, BoboError>`.
pub type BoboResult<T> = Result<T, BoboError>;
