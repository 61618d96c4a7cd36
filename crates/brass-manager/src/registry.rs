//! Name → implementation tables for handlers and middlewares.

use std::sync::Arc;

use brass_core::{BoxedHandler, BoxedMiddleware};
use dashmap::DashMap;
use tracing::debug;

/// Concurrent registry of named handlers and middlewares.
///
/// Registration is last-write-wins and may happen from any thread at any
/// time, including while a binding pass is reading. Lookups of unknown names
/// return `None`.
#[derive(Default)]
pub struct Registry {
    handlers: DashMap<String, BoxedHandler>,
    middlewares: DashMap<String, BoxedMiddleware>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_handler(&self, name: impl Into<String>, handler: BoxedHandler) {
        let name = name.into();
        if self.handlers.insert(name.clone(), handler).is_some() {
            debug!(handler = %name, "Handler replaced");
        } else {
            debug!(handler = %name, "Handler registered");
        }
    }

    pub fn register_middleware(&self, name: impl Into<String>, middleware: BoxedMiddleware) {
        let name = name.into();
        if self.middlewares.insert(name.clone(), middleware).is_some() {
            debug!(middleware = %name, "Middleware replaced");
        } else {
            debug!(middleware = %name, "Middleware registered");
        }
    }

    pub fn handler(&self, name: &str) -> Option<BoxedHandler> {
        self.handlers.get(name).map(|h| Arc::clone(h.value()))
    }

    pub fn middleware(&self, name: &str) -> Option<BoxedMiddleware> {
        self.middlewares.get(name).map(|m| Arc::clone(m.value()))
    }

    /// Resolves names in order, dropping the ones that are not registered.
    pub fn resolve_middlewares(&self, names: &[String]) -> Vec<BoxedMiddleware> {
        names.iter().filter_map(|n| self.middleware(n)).collect()
    }

    /// Registered handler names, sorted.
    pub fn handler_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Registered middleware names, sorted.
    pub fn middleware_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.middlewares.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("handlers", &self.handler_names())
            .field("middlewares", &self.middleware_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brass_core::{Context, handler_fn};

    fn noop() -> BoxedHandler {
        handler_fn(|_ctx| async {})
    }

    #[test]
    fn test_unknown_names_are_not_found() {
        let registry = Registry::new();
        assert!(registry.handler("missing").is_none());
        assert!(registry.middleware("missing").is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let registry = Registry::new();
        let first = noop();
        let second = noop();
        registry.register_handler("h", Arc::clone(&first));
        registry.register_handler("h", Arc::clone(&second));

        let resolved = registry.handler("h").unwrap();
        assert!(Arc::ptr_eq(&resolved, &second));
        assert_eq!(registry.handler_names(), vec!["h"]);
    }

    #[test]
    fn test_resolve_drops_unknown_and_keeps_order() {
        let registry = Registry::new();
        let a: BoxedMiddleware = Arc::new(|_: &Context| true);
        let b: BoxedMiddleware = Arc::new(|_: &Context| false);
        registry.register_middleware("a", Arc::clone(&a));
        registry.register_middleware("b", Arc::clone(&b));

        let names = ["b", "ghost", "a"].map(String::from);
        let resolved = registry.resolve_middlewares(&names);
        assert_eq!(resolved.len(), 2);
        assert!(Arc::ptr_eq(&resolved[0], &b));
        assert!(Arc::ptr_eq(&resolved[1], &a));
    }

    #[test]
    fn test_concurrent_registration_and_lookup() {
        let registry = Registry::new();
        std::thread::scope(|s| {
            for t in 0..4 {
                let registry = &registry;
                s.spawn(move || {
                    for i in 0..50 {
                        registry.register_handler(format!("h{t}-{i}"), noop());
                        let _ = registry.handler(&format!("h{}-{i}", (t + 1) % 4));
                    }
                });
            }
        });
        assert_eq!(registry.handler_names().len(), 200);
    }
}
