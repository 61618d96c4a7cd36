//! Plugin configuration and binding for the Brass plugin host.
//!
//! A [`PluginManager`] loads one or more declarative configuration sources,
//! resolves named handlers, middlewares and groups against its
//! [`Registry`], and registers the result with a
//! [`DispatchSurface`](brass_core::DispatchSurface).
//!
//! ```ignore
//! let manager = PluginManager::new();
//! manager.register_handler("ping", handler_fn(|ctx| async move { /* ... */ }));
//!
//! let dispatcher = Dispatcher::new();
//! let report = manager.initialize(
//!     &[
//!         SourceSpec::defaults(ConfigSource::embedded("builtin", ConfigFormat::Yaml, DEFAULTS)),
//!         SourceSpec::overrides(ConfigSource::file("manager.yaml")),
//!     ],
//!     &dispatcher,
//! )?;
//! ```

pub mod binder;
pub mod builtin;
pub mod error;
pub mod groups;
pub mod manager;
pub mod merge;
pub mod metadata;
pub mod registry;
pub mod source;

pub use binder::{BindReport, Binder, BoundHandler, SkipReason};
pub use builtin::{LOG_MESSAGE, lifecycle_hooks, log_message, register_builtins};
pub use error::{ManagerError, ManagerResult};
pub use groups::{GroupMiddlewares, GroupTable, resolve_groups};
pub use manager::{BeforeBindHook, PluginManager};
pub use merge::{
    DuplicatePolicy, InitReport, LoadedSource, MergeDriver, SourceFailure, SourceReport,
    load_sources,
};
pub use metadata::{
    HandlerMetadata, HandlerMiddlewareMetadata, HandlerTriggerMetadata, ManagedConfig,
    PluginGroup, PluginMetadata,
};
pub use registry::Registry;
pub use source::{ConfigFormat, ConfigSource, SourceRole, SourceSpec};
