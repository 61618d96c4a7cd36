//! Brass Runtime - configuration, logging and startup for the Brass plugin
//! host.
//!
//! ```ignore
//! use brass_runtime::{Startup, logging};
//!
//! let startup = Startup::new("manager.yaml").global("brass.yaml");
//! let settings = startup.prepare()?;
//! logging::init_from_config(&settings.config.logging);
//!
//! let manager = startup.manager();
//! manager.register_handler("ping", ping);
//!
//! let dispatcher = settings.config.dispatcher();
//! let report = startup.initialize(&manager, &dispatcher)?;
//! ```

pub mod config;
pub mod console;
pub mod logging;
pub mod startup;

pub use config::{ConfigError, ConfigLoader, ConfigResult, PublicConfig, RuntimeConfig};
pub use logging::{LoggingBuilder, SpanEvents};
pub use startup::{DEFAULT_MANAGER_CONFIG, Settings, Startup, StartupError, StartupResult};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
