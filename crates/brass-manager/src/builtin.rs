//! Middlewares and lifecycle hooks shipped with the manager.

use std::sync::Arc;

use brass_core::{BoxedMiddleware, Context, EventKind, LifecycleHook};
use tracing::info;

use crate::metadata::PluginMetadata;
use crate::registry::Registry;

/// Registry name of [`log_message`].
pub const LOG_MESSAGE: &str = "log-message";

/// Logs every message that reaches it and always lets it through.
pub fn log_message() -> BoxedMiddleware {
    Arc::new(|ctx: &Context| {
        let event = ctx.event();
        let text = if event.text.is_empty() {
            match &event.kind {
                EventKind::Message => "[media message]".to_string(),
                EventKind::Notice { notice_type } => format!("[notice: {notice_type}]"),
            }
        } else {
            event.text.clone()
        };

        info!(
            user_id = event.user_id,
            conversation = event.conversation_id(),
            message_type = event.message_type.as_str(),
            sender = event.sender.as_deref().unwrap_or_default(),
            text = %text,
            "message received"
        );
        true
    })
}

/// Builds the enable / disable hooks for a plugin engine.
///
/// Both log the full plugin metadata.
pub fn lifecycle_hooks(plugin: &PluginMetadata) -> (LifecycleHook, LifecycleHook) {
    let metadata = Arc::new(plugin.clone());

    let on_enable: LifecycleHook = {
        let metadata = Arc::clone(&metadata);
        Arc::new(move || {
            info!(plugin = %metadata.name, metadata = ?metadata, "plugin enabled");
        })
    };
    let on_disable: LifecycleHook = Arc::new(move || {
        info!(plugin = %metadata.name, metadata = ?metadata, "plugin disabled");
    });

    (on_enable, on_disable)
}

/// Registers the built-in middlewares.
pub fn register_builtins(registry: &Registry) {
    registry.register_middleware(LOG_MESSAGE, log_message());
}

#[cfg(test)]
mod tests {
    use super::*;
    use brass_core::{Event, TriggerKind, TriggerMatch};

    #[test]
    fn test_log_message_always_passes() {
        let middleware = log_message();
        let ctx = Context::detached(
            Event::group(1, 2, "").with_sender("alice"),
            TriggerMatch::new(TriggerKind::Keyword, ""),
        );
        assert!(middleware.check(&ctx));

        let notice = Context::detached(
            Event::notice("poke", 2, None),
            TriggerMatch::new(TriggerKind::Notice, ""),
        );
        assert!(middleware.check(&notice));
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = Registry::new();
        register_builtins(&registry);
        assert!(registry.middleware(LOG_MESSAGE).is_some());
    }
}
