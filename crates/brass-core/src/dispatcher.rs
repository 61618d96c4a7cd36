//! In-memory dispatch runtime.
//!
//! [`Dispatcher`] implements [`DispatchSurface`] and evaluates registered
//! bindings against incoming events:
//!
//! 1. Engines are visited in registration order; disabled engines are skipped
//! 2. Within an engine, bindings are visited in registration order
//! 3. For each binding: trigger → handler rules → pre chain → limiter →
//!    mid chain → handler
//! 4. A blocking binding whose handler ran stops dispatch, as does a handler
//!    calling [`Context::stop_propagation`]
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new().with_command_prefix("#");
//! manager.initialize(&sources, &dispatcher)?;
//! let outcome = dispatcher.dispatch(Event::private(42, "#ping")).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{Instrument, Level, debug, span, trace};

use crate::binding::Binding;
use crate::context::{Context, DispatchState};
use crate::engine::{DispatchSurface, Engine, EngineOptions};
use crate::event::Event;
use crate::limiter::{Limiters, RateSettings};
use crate::middleware::run_chain;

/// Default prefix for command triggers.
pub const DEFAULT_COMMAND_PREFIX: &str = "/";

/// A plugin engine owned by the [`Dispatcher`].
pub struct PluginEngine {
    options: EngineOptions,
    enabled: AtomicBool,
    bindings: RwLock<Vec<Binding>>,
}

impl PluginEngine {
    fn new(options: EngineOptions) -> Self {
        let enabled = !options.disable_on_default;
        Self {
            options,
            enabled: AtomicBool::new(enabled),
            bindings: RwLock::new(Vec::new()),
        }
    }

    /// Returns the options the engine was registered with.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Enables or disables the engine, firing the matching lifecycle hook
    /// when the state actually changes.
    pub fn set_enabled(&self, enabled: bool) {
        if self.enabled.swap(enabled, Ordering::SeqCst) == enabled {
            return;
        }
        let hook = if enabled {
            &self.options.on_enable
        } else {
            &self.options.on_disable
        };
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Returns a snapshot of the registered bindings.
    pub fn bindings(&self) -> Vec<Binding> {
        self.bindings.read().clone()
    }
}

impl Engine for PluginEngine {
    fn name(&self) -> &str {
        &self.options.name
    }

    fn bind(&self, binding: Binding) {
        trace!(
            plugin = %self.options.name,
            handler = %binding.handler,
            trigger = %binding.trigger.kind(),
            "Binding registered"
        );
        self.bindings.write().push(binding);
    }

    fn binding_count(&self) -> usize {
        self.bindings.read().len()
    }
}

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Number of handler invocations.
    pub handled: usize,
    /// A blocking binding ended dispatch.
    pub blocked: bool,
    /// A handler stopped propagation.
    pub stopped: bool,
}

/// The reference in-memory dispatch runtime.
///
/// # Thread Safety
///
/// `Dispatcher` is `Send + Sync`. Locks are only held while copying engine
/// and binding lists, never across a handler call.
pub struct Dispatcher {
    engines: RwLock<Vec<Arc<PluginEngine>>>,
    command_prefix: String,
    limiters: Limiters,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with the default command prefix and limiters.
    pub fn new() -> Self {
        Self {
            engines: RwLock::new(Vec::new()),
            command_prefix: DEFAULT_COMMAND_PREFIX.to_string(),
            limiters: Limiters::default(),
        }
    }

    /// Sets the prefix command triggers expect.
    pub fn with_command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    /// Sets the per-user and per-conversation limiter budgets.
    pub fn with_limits(mut self, user: RateSettings, conversation: RateSettings) -> Self {
        self.limiters = Limiters::new(user, conversation);
        self
    }

    pub fn limiters(&self) -> &Limiters {
        &self.limiters
    }

    /// Names of all engines in registration order, duplicates included.
    pub fn engine_names(&self) -> Vec<String> {
        self.engines
            .read()
            .iter()
            .map(|e| e.options.name.clone())
            .collect()
    }

    /// All engines registered under `name`.
    pub fn engines(&self, name: &str) -> Vec<Arc<PluginEngine>> {
        self.engines
            .read()
            .iter()
            .filter(|e| e.options.name == name)
            .cloned()
            .collect()
    }

    /// All bindings of every engine registered under `name`.
    pub fn bindings(&self, name: &str) -> Vec<Binding> {
        self.engines(name)
            .iter()
            .flat_map(|e| e.bindings())
            .collect()
    }

    /// Total number of bindings across all engines.
    pub fn binding_count(&self) -> usize {
        self.engines.read().iter().map(|e| e.binding_count()).sum()
    }

    /// Enables or disables every engine registered under `name`.
    ///
    /// Returns `false` if no such engine exists.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let engines = self.engines(name);
        for engine in &engines {
            engine.set_enabled(enabled);
        }
        !engines.is_empty()
    }

    /// Dispatches an event to all registered bindings.
    pub async fn dispatch(&self, event: Event) -> DispatchOutcome {
        let span = span!(Level::DEBUG, "dispatch", user_id = event.user_id);
        self.dispatch_inner(event).instrument(span).await
    }

    async fn dispatch_inner(&self, event: Event) -> DispatchOutcome {
        let event = Arc::new(event);
        let state = Arc::new(DispatchState::new());
        let engines: Vec<Arc<PluginEngine>> = self.engines.read().clone();
        let mut outcome = DispatchOutcome::default();

        'engines: for engine in engines.iter().filter(|e| e.is_enabled()) {
            for binding in engine.bindings() {
                if !state.is_propagating() {
                    break 'engines;
                }
                if !self.run_binding(&binding, &event, &state).await {
                    continue;
                }

                outcome.handled += 1;
                if binding.blocking {
                    debug!(
                        plugin = %binding.plugin,
                        handler = %binding.handler,
                        "Blocking binding matched, stopping dispatch"
                    );
                    outcome.blocked = true;
                    break 'engines;
                }
            }
        }

        outcome.stopped = !state.is_propagating();
        outcome
    }

    /// Runs one binding, returning whether its handler was invoked.
    async fn run_binding(
        &self,
        binding: &Binding,
        event: &Arc<Event>,
        state: &Arc<DispatchState>,
    ) -> bool {
        let Some(matched) = binding.trigger.matches(event, &self.command_prefix) else {
            return false;
        };

        let ctx = Arc::new(Context::new(
            Arc::clone(event),
            &binding.plugin,
            &binding.handler,
            matched,
            Arc::clone(state),
        ));

        if !run_chain(&binding.rules, &ctx) || !run_chain(&binding.chain.pre, &ctx) {
            trace!(handler = %binding.handler, "Rejected before limiter");
            return false;
        }
        if let Some(scope) = binding.limiter
            && !self.limiters.check(scope, event)
        {
            debug!(
                handler = %binding.handler,
                scope = ?scope,
                "Rate limited"
            );
            return false;
        }
        if !run_chain(&binding.chain.mid, &ctx) {
            trace!(handler = %binding.handler, "Rejected by mid chain");
            return false;
        }

        debug!(
            plugin = %binding.plugin,
            handler = %binding.handler,
            trigger = %ctx.matched().kind,
            "Executing handler"
        );
        binding.callback.handle(ctx).await;
        true
    }
}

impl DispatchSurface for Dispatcher {
    fn register_engine(&self, options: EngineOptions) -> Arc<dyn Engine> {
        debug!(plugin = %options.name, "Engine registered");
        let engine = Arc::new(PluginEngine::new(options));
        self.engines.write().push(Arc::clone(&engine));
        engine
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("engine_count", &self.engines.read().len())
            .field("command_prefix", &self.command_prefix)
            .finish()
    }
}
