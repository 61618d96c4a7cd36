//! Error types for the Brass core.

use thiserror::Error;

/// Errors that can occur while building dispatch bindings.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A regex trigger pattern failed to compile.
    #[error("Invalid trigger pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
