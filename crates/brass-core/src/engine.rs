//! The dispatch surface that bindings are registered against.
//!
//! The binding engine never talks to a concrete bot runtime; it only sees a
//! [`DispatchSurface`] that hands out one [`Engine`] per plugin. The
//! in-memory [`Dispatcher`](crate::dispatcher::Dispatcher) is the reference
//! implementation.

use std::sync::Arc;

use crate::binding::Binding;

/// Callback fired when a plugin engine is enabled or disabled.
pub type LifecycleHook = Arc<dyn Fn() + Send + Sync>;

/// Display metadata and lifecycle hooks of a plugin engine.
#[derive(Clone, Default)]
pub struct EngineOptions {
    pub name: String,
    pub brief: String,
    pub help: String,
    pub banner: String,
    pub private_data_folder: String,
    pub public_data_folder: String,
    /// Start the engine disabled.
    pub disable_on_default: bool,
    pub on_enable: Option<LifecycleHook>,
    pub on_disable: Option<LifecycleHook>,
}

impl EngineOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineOptions")
            .field("name", &self.name)
            .field("brief", &self.brief)
            .field("private_data_folder", &self.private_data_folder)
            .field("public_data_folder", &self.public_data_folder)
            .field("disable_on_default", &self.disable_on_default)
            .finish_non_exhaustive()
    }
}

/// A per-plugin dispatch engine.
pub trait Engine: Send + Sync {
    /// Name of the plugin this engine serves.
    fn name(&self) -> &str;

    /// Registers one binding.
    fn bind(&self, binding: Binding);

    /// Number of bindings registered so far.
    fn binding_count(&self) -> usize;
}

/// The external runtime that owns plugin engines.
pub trait DispatchSurface: Send + Sync {
    /// Creates and registers a new engine. Engines are never merged, even
    /// when two share a name.
    fn register_engine(&self, options: EngineOptions) -> Arc<dyn Engine>;
}
