use std::sync::Arc;

use brass_core::{BoxedHandler, BoxedMiddleware, DispatchSurface};
use parking_lot::RwLock;
use tracing::{debug, info, info_span};

use crate::builtin::register_builtins;
use crate::error::ManagerResult;
use crate::merge::{DuplicatePolicy, InitReport, MergeDriver, load_sources};
use crate::registry::Registry;
use crate::source::SourceSpec;

/// Runs after every source is loaded and before anything is bound.
pub type BeforeBindHook = Box<dyn Fn(&Registry) -> ManagerResult<()> + Send + Sync>;

/// Owns the handler registry and drives initialization passes.
///
/// Handlers and middlewares may be registered at any time before
/// [`initialize`](Self::initialize); hooks registered with
/// [`on_before_bind`](Self::on_before_bind) get a last chance to do so.
pub struct PluginManager {
    registry: Arc<Registry>,
    hooks: RwLock<Vec<BeforeBindHook>>,
    policy: DuplicatePolicy,
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginManager {
    /// Creates a manager with the built-in middlewares registered.
    pub fn new() -> Self {
        let registry = Registry::new();
        register_builtins(&registry);
        Self::with_registry(Arc::new(registry))
    }

    /// Creates a manager around an existing registry.
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            hooks: RwLock::new(Vec::new()),
            policy: DuplicatePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn register_handler(&self, name: impl Into<String>, handler: BoxedHandler) {
        self.registry.register_handler(name, handler);
    }

    pub fn register_middleware(&self, name: impl Into<String>, middleware: BoxedMiddleware) {
        self.registry.register_middleware(name, middleware);
    }

    pub fn on_before_bind<F>(&self, hook: F)
    where
        F: Fn(&Registry) -> ManagerResult<()> + Send + Sync + 'static,
    {
        self.hooks.write().push(Box::new(hook));
    }

    /// Loads `sources`, runs the before-bind hooks, then binds every source
    /// in order.
    ///
    /// A failing override source or hook aborts before any binding is made.
    pub fn initialize(
        &self,
        sources: &[SourceSpec],
        surface: &dyn DispatchSurface,
    ) -> ManagerResult<InitReport> {
        let span = info_span!("initialize", sources = sources.len());
        let _enter = span.enter();

        let (loaded, failures) = load_sources(sources)?;

        let hooks = self.hooks.read();
        debug!(hooks = hooks.len(), "Running before-bind hooks");
        for hook in hooks.iter() {
            hook(&self.registry)?;
        }
        drop(hooks);

        let reports = MergeDriver::new(&self.registry, surface)
            .with_policy(self.policy)
            .bind(&loaded);
        let report = InitReport {
            sources: reports,
            failures,
        };

        info!(
            bindings = report.binding_count(),
            handlers = report.bound_handlers().count(),
            "Plugin initialization complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ManagerError;
    use crate::source::{ConfigFormat, ConfigSource};
    use brass_core::{Dispatcher, Event, handler_fn};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DEFAULTS: &str = r#"
groups:
  - name: common
    pre_handlers: [log-message]
plugins:
  - name: X
    group: common
    enable: true
    handlers:
      - name: ping
        triggers:
          commands: [ping]
"#;

    const OVERRIDES: &str = r#"
plugins:
  - name: X
    group: common
    enable: true
    handlers:
      - name: ping
        triggers:
          keywords: [pong]
"#;

    fn yaml(name: &str, contents: &str) -> ConfigSource {
        ConfigSource::embedded(name, ConfigFormat::Yaml, contents)
    }

    fn manager_with_ping(policy: DuplicatePolicy) -> PluginManager {
        let manager = PluginManager::new().with_policy(policy);
        manager.register_handler("ping", handler_fn(|_ctx| async {}));
        manager
    }

    #[test]
    fn test_duplicate_plugin_binds_once_per_source() {
        let manager = manager_with_ping(DuplicatePolicy::Duplicate);
        let dispatcher = Dispatcher::new();

        let report = manager
            .initialize(
                &[
                    SourceSpec::defaults(yaml("defaults", DEFAULTS)),
                    SourceSpec::overrides(yaml("overrides", OVERRIDES)),
                ],
                &dispatcher,
            )
            .unwrap();

        assert_eq!(report.times_bound("X"), 2);
        assert_eq!(dispatcher.engines("X").len(), 2);
        assert_eq!(dispatcher.bindings("X").len(), 2);
        // The override source sees the group declared by the defaults.
        assert!(
            dispatcher
                .bindings("X")
                .iter()
                .all(|b| b.chain.pre.len() == 1)
        );
    }

    #[test]
    fn test_first_wins_skips_later_declarations() {
        let manager = manager_with_ping(DuplicatePolicy::FirstWins);
        let dispatcher = Dispatcher::new();

        let report = manager
            .initialize(
                &[
                    SourceSpec::defaults(yaml("defaults", DEFAULTS)),
                    SourceSpec::overrides(yaml("overrides", OVERRIDES)),
                ],
                &dispatcher,
            )
            .unwrap();

        assert_eq!(report.times_bound("X"), 1);
        assert_eq!(dispatcher.engines("X").len(), 1);
        assert_eq!(
            report.sources[1].report.skip_reason("X"),
            Some(crate::binder::SkipReason::AlreadyBound)
        );
    }

    #[test]
    fn test_failing_override_aborts_before_binding() {
        let manager = manager_with_ping(DuplicatePolicy::Duplicate);
        let dispatcher = Dispatcher::new();

        let err = manager
            .initialize(
                &[
                    SourceSpec::defaults(yaml("defaults", DEFAULTS)),
                    SourceSpec::overrides(ConfigSource::file("/nonexistent/manager.yaml")),
                ],
                &dispatcher,
            )
            .unwrap_err();

        assert!(matches!(err, ManagerError::SourceNotFound(_)));
        assert_eq!(dispatcher.binding_count(), 0);
    }

    #[test]
    fn test_malformed_default_is_skipped() {
        let manager = manager_with_ping(DuplicatePolicy::Duplicate);
        let dispatcher = Dispatcher::new();

        let report = manager
            .initialize(
                &[
                    SourceSpec::defaults(yaml("broken", "plugins: {not: [a, list")),
                    SourceSpec::overrides(yaml("overrides", OVERRIDES)),
                ],
                &dispatcher,
            )
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "broken");
        assert_eq!(report.times_bound("X"), 1);
        // "common" came from the skipped source, so no group middlewares apply.
        assert!(dispatcher.bindings("X")[0].chain.is_empty());
    }

    #[test]
    fn test_hooks_run_before_binding() {
        let manager = PluginManager::new();
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let calls = Arc::clone(&calls);
            manager.on_before_bind(move |registry| {
                calls.fetch_add(1, Ordering::SeqCst);
                registry.register_handler("ping", handler_fn(|_ctx| async {}));
                Ok(())
            });
        }
        let dispatcher = Dispatcher::new();

        let report = manager
            .initialize(&[SourceSpec::overrides(yaml("o", OVERRIDES))], &dispatcher)
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.binding_count(), 1);
    }

    #[test]
    fn test_failing_hook_is_fatal() {
        let manager = manager_with_ping(DuplicatePolicy::Duplicate);
        manager.on_before_bind(|_| Err(ManagerError::hook("database unavailable")));
        let dispatcher = Dispatcher::new();

        let err = manager
            .initialize(&[SourceSpec::overrides(yaml("o", OVERRIDES))], &dispatcher)
            .unwrap_err();

        assert!(matches!(err, ManagerError::Hook(ref m) if m == "database unavailable"));
        assert_eq!(dispatcher.binding_count(), 0);
    }

    #[tokio::test]
    async fn test_builtin_log_message_passes_events_through() {
        let manager = PluginManager::new();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            manager.register_handler(
                "ping",
                handler_fn(move |_ctx| {
                    let hits = Arc::clone(&hits);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                    }
                }),
            );
        }
        let dispatcher = Dispatcher::new();
        manager
            .initialize(&[SourceSpec::defaults(yaml("d", DEFAULTS))], &dispatcher)
            .unwrap();

        let outcome = dispatcher.dispatch(Event::private(7, "/ping")).await;
        assert_eq!(outcome.handled, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
