//! Pre- and mid-stage interceptors.

use std::sync::Arc;

use crate::context::Context;

/// A named interceptor run before a handler.
///
/// Returning `false` stops the binding: later middlewares and the handler
/// itself are not run.
pub trait Middleware: Send + Sync {
    fn check(&self, ctx: &Context) -> bool;
}

impl<F> Middleware for F
where
    F: Fn(&Context) -> bool + Send + Sync,
{
    fn check(&self, ctx: &Context) -> bool {
        self(ctx)
    }
}

/// A shared, type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Runs middlewares in order, stopping at the first rejection.
pub fn run_chain(chain: &[BoxedMiddleware], ctx: &Context) -> bool {
    chain.iter().all(|m| m.check(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::trigger::{TriggerKind, TriggerMatch};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_chain_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = {
            let calls = Arc::clone(&calls);
            move |_: &Context| {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            }
        };
        let chain: Vec<BoxedMiddleware> = vec![
            Arc::new(counted.clone()),
            Arc::new(|_: &Context| false),
            Arc::new(counted),
        ];
        let ctx = Context::detached(
            Event::private(1, "x"),
            TriggerMatch::new(TriggerKind::Keyword, "x"),
        );

        assert!(!run_chain(&chain, &ctx));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(run_chain(&[], &ctx));
    }
}
