//! Error types for token loading
//!
//! Loading is all-or-nothing per reload: any of these errors leaves the
//! previously loaded registry in place.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for token document operations
#[derive(Error, Debug)]
pub enum TokenError {
    /// IO errors while reading token files
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing errors
    #[error("JSON error in {uri}: {source}")]
    Json {
        uri: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parsing errors
    #[error("YAML error in {uri}: {source}")]
    Yaml {
        uri: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document root is not an object of groups and tokens
    #[error("Token document {uri} must contain an object at its root")]
    NotAnObject { uri: String },

    /// Token file extension is neither JSON nor YAML
    #[error("Unsupported token file format: {path:?}")]
    UnsupportedFormat { path: PathBuf },

    /// A `$extends` value that is not a group reference
    #[error("Invalid $extends value {value:?} on group '{group}' in {uri}")]
    InvalidExtends {
        uri: String,
        group: String,
        value: String,
    },

    /// Groups that extend each other in a loop
    #[error("Circular $extends in {uri}: {}", .cycle.join(" -> "))]
    ExtendsCycle { uri: String, cycle: Vec<String> },
}

/// Result type alias for token operations
pub type TokenResult<T> = Result<T, TokenError>;

impl From<std::io::Error> for TokenError {
    fn from(err: std::io::Error) -> Self {
        TokenError::Io {
            source: err,
            message: "IO operation failed".to_string(),
        }
    }
}

/// Helper trait for converting IO errors with context
pub trait IoContext<T> {
    fn with_io_context(self, message: &str) -> TokenResult<T>;
}

impl<T> IoContext<T> for Result<T, std::io::Error> {
    fn with_io_context(self, message: &str) -> TokenResult<T> {
        self.map_err(|e| TokenError::Io {
            message: message.to_string(),
            source: e,
        })
    }
}
