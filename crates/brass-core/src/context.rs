//! Per-binding execution context.
//!
//! A [`Context`] is created every time a binding's trigger matches an event.
//! All contexts created during one dispatch cycle share the same event and the
//! same propagation flag, so a handler that calls
//! [`stop_propagation`](Context::stop_propagation) stops dispatch for every
//! remaining binding.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::event::Event;
use crate::trigger::TriggerMatch;

/// Shared state of one dispatch cycle.
#[derive(Debug)]
pub(crate) struct DispatchState {
    propagating: AtomicBool,
}

impl DispatchState {
    pub(crate) fn new() -> Self {
        Self {
            propagating: AtomicBool::new(true),
        }
    }

    pub(crate) fn is_propagating(&self) -> bool {
        self.propagating.load(Ordering::SeqCst)
    }
}

/// The context handed to middlewares and handlers.
pub struct Context {
    event: Arc<Event>,
    plugin: String,
    handler: String,
    matched: TriggerMatch,
    state: Mutex<HashMap<String, Value>>,
    dispatch: Arc<DispatchState>,
}

impl Context {
    pub(crate) fn new(
        event: Arc<Event>,
        plugin: &str,
        handler: &str,
        matched: TriggerMatch,
        dispatch: Arc<DispatchState>,
    ) -> Self {
        Self {
            event,
            plugin: plugin.to_string(),
            handler: handler.to_string(),
            matched,
            state: Mutex::new(HashMap::new()),
            dispatch,
        }
    }

    /// Creates a standalone context, outside of any dispatcher.
    ///
    /// Useful for exercising middlewares and handlers directly.
    pub fn detached(event: Event, matched: TriggerMatch) -> Self {
        Self::new(
            Arc::new(event),
            "",
            "",
            matched,
            Arc::new(DispatchState::new()),
        )
    }

    /// Returns the event being processed.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Returns the name of the plugin owning the matched binding.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Returns the name of the handler owning the matched binding.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Returns how the trigger matched.
    pub fn matched(&self) -> &TriggerMatch {
        &self.matched
    }

    /// Returns the text following the matched command, prefix or suffix.
    pub fn args(&self) -> &str {
        &self.matched.args
    }

    /// Stores a value in the per-binding state map.
    ///
    /// Values that cannot be serialized are silently ignored.
    pub fn set_state<T: Serialize>(&self, key: impl Into<String>, value: T) {
        if let Ok(value) = serde_json::to_value(value) {
            self.state.lock().insert(key.into(), value);
        }
    }

    /// Reads a value from the per-binding state map.
    pub fn state<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let state = self.state.lock();
        state
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Stops the event from reaching any further binding.
    pub fn stop_propagation(&self) {
        self.dispatch.propagating.store(false, Ordering::SeqCst);
    }

    /// Returns `true` if the event is still propagating.
    pub fn is_propagating(&self) -> bool {
        self.dispatch.is_propagating()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("plugin", &self.plugin)
            .field("handler", &self.handler)
            .field("matched", &self.matched)
            .field("is_propagating", &self.is_propagating())
            .finish()
    }
}
