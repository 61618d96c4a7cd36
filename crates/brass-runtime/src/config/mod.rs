//! Runtime configuration.
//!
//! The public configuration document serves two purposes: its `logging`,
//! `limits` and `dispatch` keys configure the host itself, and any other
//! key is a section that plugins may read through [`PublicConfig`].

pub mod error;
pub mod loader;
pub mod public;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use public::PublicConfig;
pub use schema::{
    DispatchConfig, LimitsConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    RuntimeConfig, SpanEventConfig,
};
pub use validation::validate_config;
