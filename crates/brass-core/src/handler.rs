//! Handler trait and closure adapter.
//!
//! A [`Handler`] is the behaviour behind a binding. The same handler instance
//! is shared by every binding produced for it, so implementations must be
//! `Send + Sync` and keep any mutable state behind their own locks.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::binding::Binding;
use crate::context::Context;
use crate::middleware::BoxedMiddleware;

/// A unit of behaviour bound to one or more triggers.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Runs the handler for a matched event.
    async fn handle(&self, ctx: Arc<Context>);

    /// Extra rules evaluated right after the trigger, before any pre-middleware.
    fn rules(&self) -> Vec<BoxedMiddleware> {
        Vec::new()
    }

    /// Adjusts a binding just before it is registered.
    fn attach(&self, binding: Binding) -> Binding {
        binding
    }
}

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// A [`Handler`] backed by an async closure.
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, ctx: Arc<Context>) {
        (self.f)(ctx).await;
    }
}

/// Wraps an async closure as a [`BoxedHandler`].
///
/// ```rust,ignore
/// let ping = handler_fn(|ctx| async move {
///     tracing::info!(user = ctx.event().user_id, "pong");
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> BoxedHandler
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(HandlerFn { f })
}
