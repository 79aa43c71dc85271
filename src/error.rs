//! Custom error types for the glyph recognition library
//!
//! Every fallible operation in the crate returns [`RecogResult`]. Degenerate
//! geometry is never an error; it is absorbed by the geometry helpers.

use std::sync::Arc;
use thiserror::Error;

/// Main error type for the glyph recognition library
#[derive(Error, Debug, Clone)]
pub enum RecogError {
    /// Recognition was attempted before the template store reached Ready
    #[error("Template library is not loaded")]
    NotLoaded,

    /// An interactive query was overtaken by a newer one
    #[error("Query superseded by a newer request")]
    Superseded,

    /// Errors related to file I/O while loading a template library
    #[error("File I/O error: {0}")]
    Io(#[source] Arc<std::io::Error>),

    /// Errors related to JSON parsing of libraries, inputs or configuration
    #[error("JSON error: {0}")]
    Json(#[source] Arc<serde_json::Error>),

    /// Structurally invalid glyph records
    #[error("Invalid glyph data: {message}")]
    InvalidGlyphData { message: String },

    /// Errors related to configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Custom errors with context
    #[error("Error: {message}")]
    Custom { message: String },
}

impl RecogError {
    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    /// Create an invalid glyph data error
    pub fn invalid_glyph_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidGlyphData {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error came from the library load step
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Json(_) | Self::InvalidGlyphData { .. }
        )
    }
}

// Sources sit behind `Arc` so one failed load can be handed to every caller
impl From<std::io::Error> for RecogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for RecogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(Arc::new(err))
    }
}

/// Result type alias for glyph recognition operations
pub type RecogResult<T> = Result<T, RecogError>;
