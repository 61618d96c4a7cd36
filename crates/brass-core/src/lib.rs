//! # Brass Core
//!
//! The dispatch-side building blocks of the Brass plugin host.
//!
//! This crate provides:
//! - The chat [`Event`] model and the per-binding [`Context`]
//! - [`Handler`] and [`Middleware`] traits
//! - [`Trigger`] categories and their text matching
//! - Per-user and per-conversation [`RateLimiter`]s
//! - The [`DispatchSurface`] / [`Engine`] contract bindings are registered
//!   against, and [`Dispatcher`], an in-memory implementation of it
//!
//! ```text
//! ┌──────────────┐  register_engine  ┌────────────┐  dispatch  ┌─────────┐
//! │ brass-manager│──────────────────▶│ Dispatcher │───────────▶│ Handler │
//! │   (binder)   │  bind(Binding)    │            │            └─────────┘
//! └──────────────┘                   └────────────┘
//! ```

pub mod binding;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod event;
pub mod handler;
pub mod limiter;
pub mod middleware;
pub mod trigger;

pub use binding::{Binding, MiddlewareChain};
pub use context::Context;
pub use dispatcher::{DEFAULT_COMMAND_PREFIX, DispatchOutcome, Dispatcher, PluginEngine};
pub use engine::{DispatchSurface, Engine, EngineOptions, LifecycleHook};
pub use error::{CoreError, CoreResult};
pub use event::{Event, EventKind, MessageType};
pub use handler::{BoxedHandler, Handler, HandlerFn, handler_fn};
pub use limiter::{LimitScope, Limiters, RateLimiter, RateSettings};
pub use middleware::{BoxedMiddleware, Middleware, run_chain};
pub use trigger::{Trigger, TriggerKind, TriggerMatch};
