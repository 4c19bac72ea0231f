//! Error types for the strata-formats library.
//!
//! All fallible operations return [`StrataError`] through the [`Result`] alias.
//! The two registry failures a storage engine has to handle are
//! [`StrataError::NotFound`] (a persisted format name nobody registered) and
//! [`StrataError::Construction`] (a registered format that could not be built).
//!
//! # Examples
//!
//! ```
//! use strata_formats::error::{Result, StrataError};
//!
//! fn open_field(format: &str) -> Result<()> {
//!     Err(StrataError::not_found(format))
//! }
//!
//! match open_field("Lucene45") {
//!     Err(StrataError::NotFound { name }) => assert_eq!(name, "Lucene45"),
//!     _ => unreachable!(),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for strata-formats operations.
#[derive(Error, Debug)]
pub enum StrataError {
    /// No descriptor is registered under the requested format name.
    #[error(
        "Format not found: '{name}' (is the plugin providing this format registered with the factory?)"
    )]
    NotFound { name: String },

    /// A descriptor matched but its instance could not be constructed.
    #[error("Failed to construct format '{name}': {reason}")]
    Construction { name: String, reason: String },

    /// A descriptor handle that does not belong to this factory.
    #[error("Unknown descriptor handle: {0}")]
    UnknownDescriptor(usize),

    /// Encoding or decoding of a format block failed.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid factory configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error, typically raised by plugin constructors
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with StrataError.
pub type Result<T> = std::result::Result<T, StrataError>;

impl StrataError {
    /// Create a new not found error for a format name.
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        StrataError::NotFound { name: name.into() }
    }

    /// Create a new construction error.
    pub fn construction<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        StrataError::Construction {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new codec error.
    pub fn codec<S: Into<String>>(msg: S) -> Self {
        StrataError::Codec(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        StrataError::Storage(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        StrataError::InvalidConfig(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        StrataError::Other(msg.into())
    }

    /// Whether this error reports a missing format name.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StrataError::NotFound { .. })
    }

    /// Whether this error reports a failed format construction.
    pub fn is_construction(&self) -> bool {
        matches!(self, StrataError::Construction { .. })
    }
}
