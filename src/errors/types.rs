//! Error type definitions for the asset cache
//!
//! The hierarchy mirrors the crate layout: `AssetError` is what callers of
//! the cache see, `TransportError` is what an `AssetTransport` reports and
//! `RegistryError` covers service lookups.

use thiserror::Error;

use crate::models::AssetClass;

/// Top-level asset cache error type
#[derive(Error, Debug)]
pub enum AssetError {
    /// Configuration errors, fatal at startup
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Asset class that cannot be fetched through the cache
    #[error("Unsupported asset class for fetch: {class}")]
    UnsupportedClass { class: AssetClass },

    /// Download failed with a non-2xx status or a transport error
    #[error("Failed to fetch asset {filename}: {reason}")]
    FetchFailed { filename: String, reason: String },

    /// Download was cancelled before it settled
    #[error("Fetch cancelled: {filename}")]
    Cancelled { filename: String },

    /// Upload rejected by the server, carrying the parsed error body
    #[error("Upload rejected with status {status}: {payload}")]
    UploadRejected {
        status: u16,
        payload: serde_json::Value,
    },

    /// Fetch started outside a Tokio runtime
    #[error("Runtime error: {message}")]
    Runtime { message: String },

    /// CSRF token could not be obtained
    #[error("CSRF token error: {message}")]
    Csrf { message: String },

    /// Transport errors outside of a fetch
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// JSON parsing errors
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by an `AssetTransport`
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The URL could not be parsed or resolved against the origin
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// Request did not complete
    #[error("HTTP request failed: {url} - {message}")]
    RequestFailed { url: String, message: String },

    /// Request timed out
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Response body could not be read
    #[error("Failed to read response body: {url} - {message}")]
    Body { url: String, message: String },
}

/// Service registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Service already registered: {name}")]
    AlreadyRegistered { name: String },

    #[error("Service not registered: {name}")]
    NotRegistered { name: String },

    #[error("Service {name} is a {registered}, not a {requested}")]
    TypeMismatch {
        name: String,
        registered: &'static str,
        requested: &'static str,
    },
}

/// Convenience methods for creating common error types
impl AssetError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a fetch failure for a filename
    pub fn fetch_failed<F: Into<String>, R: Into<String>>(filename: F, reason: R) -> Self {
        Self::FetchFailed {
            filename: filename.into(),
            reason: reason.into(),
        }
    }

    /// Create a CSRF error
    pub fn csrf<S: Into<String>>(message: S) -> Self {
        Self::Csrf {
            message: message.into(),
        }
    }

    /// Filename a fetch was rejected for, if this is a fetch error
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::FetchFailed { filename, .. } | Self::Cancelled { filename } => Some(filename),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl TransportError {
    /// Map a reqwest error onto the transport taxonomy
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if error.is_body() || error.is_decode() {
            Self::Body {
                url: url.to_string(),
                message: error.to_string(),
            }
        } else {
            Self::RequestFailed {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}
