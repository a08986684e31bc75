//! Common error types used throughout hlsforged.
//!
//! Every pipeline stage funnels its failures into [`Error`]. The variants
//! carry enough context for the HTTP layer to pick a status code via
//! [`Error::http_status`] and for a failed job to expose a readable message.

use std::fmt;

/// Error type covering submission, pipeline and lookup failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Submission input was missing or malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested job or artifact does not exist (or has expired).
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "job", "file").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The manifest could not be retrieved or parsed.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// A segment transfer failed; the whole fetch was aborted.
    #[error("Failed to fetch segment {url}: {reason}")]
    FetchFailed {
        /// Locator of the offending segment.
        url: String,
        /// Underlying cause (HTTP status or transport error).
        reason: String,
    },

    /// The remux tool exited unsuccessfully or ran out of time.
    #[error("Remux failed: {diagnostics}")]
    RemuxFailed {
        /// Captured diagnostic output of the tool.
        diagnostics: String,
    },

    /// A record with the same identity already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound { .. } => 404,
            Error::Conflict(_) => 409,
            Error::Manifest(_) => 422,
            Error::FetchFailed { .. } => 502,
            Error::RemuxFailed { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::NotFound { .. } => "not_found",
            Error::Conflict(_) => "conflict",
            Error::Manifest(_) => "manifest_error",
            Error::FetchFailed { .. } => "fetch_failed",
            Error::RemuxFailed { .. } => "remux_failed",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Manifest`].
    pub fn manifest(msg: impl Into<String>) -> Self {
        Error::Manifest(msg.into())
    }

    /// Convenience constructor for [`Error::FetchFailed`].
    pub fn fetch_failed(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::FetchFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Convenience constructor for [`Error::RemuxFailed`].
    pub fn remux_failed(diagnostics: impl Into<String>) -> Self {
        Error::RemuxFailed {
            diagnostics: diagnostics.into(),
        }
    }

    /// Convenience constructor for [`Error::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
