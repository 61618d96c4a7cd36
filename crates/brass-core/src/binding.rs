//! Concrete registrations against a dispatch engine.

use std::sync::Arc;

use crate::handler::BoxedHandler;
use crate::limiter::LimitScope;
use crate::middleware::BoxedMiddleware;
use crate::trigger::Trigger;

/// The resolved, ordered middlewares of one handler.
///
/// Every binding produced for a handler shares a single chain.
#[derive(Default, Clone)]
pub struct MiddlewareChain {
    pub pre: Vec<BoxedMiddleware>,
    pub mid: Vec<BoxedMiddleware>,
}

impl MiddlewareChain {
    pub fn new(pre: Vec<BoxedMiddleware>, mid: Vec<BoxedMiddleware>) -> Self {
        Self { pre, mid }
    }

    /// Total number of middlewares in the chain.
    pub fn len(&self) -> usize {
        self.pre.len() + self.mid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("pre", &self.pre.len())
            .field("mid", &self.mid.len())
            .finish()
    }
}

/// One registration of (trigger, middleware chain, limiter, blocking flag,
/// callback).
#[derive(Clone)]
pub struct Binding {
    pub plugin: String,
    pub handler: String,
    pub trigger: Trigger,
    /// Rules contributed by the handler itself, evaluated right after the trigger.
    pub rules: Vec<BoxedMiddleware>,
    pub chain: Arc<MiddlewareChain>,
    pub limiter: Option<LimitScope>,
    /// When set, a binding whose handler ran stops dispatch for the event.
    pub blocking: bool,
    pub callback: BoxedHandler,
}

impl Binding {
    /// Creates a non-blocking, unlimited binding with an empty chain.
    pub fn new(
        plugin: impl Into<String>,
        handler: impl Into<String>,
        trigger: Trigger,
        callback: BoxedHandler,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            handler: handler.into(),
            trigger,
            rules: Vec::new(),
            chain: Arc::new(MiddlewareChain::default()),
            limiter: None,
            blocking: false,
            callback,
        }
    }

    pub fn with_chain(mut self, chain: Arc<MiddlewareChain>) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_rules(mut self, rules: Vec<BoxedMiddleware>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_limiter(mut self, limiter: Option<LimitScope>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("plugin", &self.plugin)
            .field("handler", &self.handler)
            .field("trigger", &self.trigger.kind())
            .field("patterns", &self.trigger.patterns())
            .field("chain", &self.chain)
            .field("limiter", &self.limiter)
            .field("blocking", &self.blocking)
            .finish()
    }
}
