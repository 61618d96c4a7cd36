//! Manager error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading configuration sources or preparing
/// a binding pass.
///
/// Per-item problems (unknown handler, unknown middleware, unknown group)
/// are never errors; they are skipped.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// The configuration file does not exist.
    #[error("Configuration source not found: {0}")]
    SourceNotFound(PathBuf),

    /// The file extension is not one of `.yaml`, `.yml` or `.json`.
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),

    /// The source could not be decoded into a `ManagedConfig`.
    #[error("Failed to decode configuration source '{name}': {message}")]
    Decode { name: String, message: String },

    /// A before-bind hook reported a failure.
    #[error("Before-bind hook failed: {0}")]
    Hook(String),
}

impl ManagerError {
    /// Creates a hook failure.
    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook(message.into())
    }
}

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;
