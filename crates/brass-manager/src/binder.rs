//! The binding engine.
//!
//! [`Binder`] walks the plugins of a configuration source and registers one
//! [`Binding`] per populated trigger category of every resolvable handler.
//!
//! # Middleware priority
//!
//! Pre- and mid-lists are resolved independently. The inherited list is
//! the handler's group list if it resolves to anything, otherwise the
//! plugin's group list. A handler's own middlewares always run first:
//!
//! ```text
//! effective = own ++ (handler group, else plugin group)
//! ```
//!
//! Unknown handler, middleware and group names are skipped silently; nothing
//! in a binding pass is fatal.

use std::collections::HashMap;
use std::sync::Arc;

use brass_core::{
    Binding, BoxedHandler, BoxedMiddleware, DispatchSurface, EngineOptions, LimitScope,
    MiddlewareChain, Trigger,
};
use tracing::{debug, info, warn};

use crate::builtin::lifecycle_hooks;
use crate::groups::{GroupMiddlewares, GroupTable};
use crate::metadata::{HandlerMetadata, HandlerTriggerMetadata, PluginMetadata};
use crate::registry::Registry;

/// Why a plugin produced no bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyName,
    Disabled,
    NoHandlers,
    /// None of the declared handler names is registered.
    NoResolvedHandlers,
    /// A plugin of the same name was bound earlier in the pass.
    AlreadyBound,
}

/// One handler that was bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundHandler {
    pub plugin: String,
    pub handler: String,
    /// Number of bindings registered for the handler.
    pub bindings: usize,
}

/// Outcome of binding one configuration source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    pub bound: Vec<BoundHandler>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl BindReport {
    /// Total number of bindings registered.
    pub fn binding_count(&self) -> usize {
        self.bound.iter().map(|b| b.bindings).sum()
    }

    /// Returns `true` if any handler of `plugin` was bound.
    pub fn is_bound(&self, plugin: &str) -> bool {
        self.bound.iter().any(|b| b.plugin == plugin)
    }

    /// Records the result of binding one plugin.
    pub fn record(&mut self, plugin: &str, result: Result<Vec<BoundHandler>, SkipReason>) {
        match result {
            Ok(bound) => self.bound.extend(bound),
            Err(reason) => {
                debug!(plugin = %plugin, reason = ?reason, "Plugin skipped");
                self.skipped.push((plugin.to_string(), reason));
            }
        }
    }

    /// Returns the recorded skip reason for `plugin`, if any.
    pub fn skip_reason(&self, plugin: &str) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|(name, _)| name == plugin)
            .map(|(_, reason)| *reason)
    }
}

/// Wires plugins into a dispatch surface.
pub struct Binder<'a> {
    registry: &'a Registry,
    groups: &'a GroupTable,
    surface: &'a dyn DispatchSurface,
}

impl<'a> Binder<'a> {
    pub fn new(
        registry: &'a Registry,
        groups: &'a GroupTable,
        surface: &'a dyn DispatchSurface,
    ) -> Self {
        Self {
            registry,
            groups,
            surface,
        }
    }

    /// Binds every plugin in declaration order.
    pub fn bind_plugins<'p, I>(&self, plugins: I) -> BindReport
    where
        I: IntoIterator<Item = &'p PluginMetadata>,
    {
        let mut report = BindReport::default();
        for plugin in plugins {
            report.record(&plugin.name, self.bind_plugin(plugin));
        }
        report
    }

    /// Binds one plugin, returning the handlers that were bound.
    pub fn bind_plugin(&self, plugin: &PluginMetadata) -> Result<Vec<BoundHandler>, SkipReason> {
        if plugin.name.is_empty() {
            return Err(SkipReason::EmptyName);
        }
        if !plugin.enable {
            return Err(SkipReason::Disabled);
        }
        if plugin.handlers.is_empty() {
            return Err(SkipReason::NoHandlers);
        }

        let endpoints: HashMap<&str, BoxedHandler> = plugin
            .handlers
            .iter()
            .filter_map(|h| self.registry.handler(&h.name).map(|imp| (h.name.as_str(), imp)))
            .collect();
        if endpoints.is_empty() {
            return Err(SkipReason::NoResolvedHandlers);
        }

        let engine = self.surface.register_engine(engine_options(plugin));
        let plugin_group = self.resolve_group(&plugin.group);

        let mut bound = Vec::new();
        for handler in &plugin.handlers {
            let Some(callback) = endpoints.get(handler.name.as_str()) else {
                continue;
            };

            let chain = Arc::new(self.resolve_chain(handler, &plugin_group));
            let limiter = LimitScope::from_selector(&handler.limiter);
            let rules = callback.rules();

            let mut count = 0;
            for trigger in build_triggers(&handler.triggers) {
                let binding = Binding::new(
                    plugin.name.as_str(),
                    handler.name.as_str(),
                    trigger,
                    Arc::clone(callback),
                )
                .with_rules(rules.clone())
                .with_chain(Arc::clone(&chain))
                .with_limiter(limiter)
                .blocking(handler.blocked);
                engine.bind(callback.attach(binding));
                count += 1;
            }

            info!(
                plugin = %plugin.name,
                handler = %handler.name,
                bindings = count,
                metadata = ?handler,
                "plugin initialized"
            );
            bound.push(BoundHandler {
                plugin: plugin.name.clone(),
                handler: handler.name.clone(),
                bindings: count,
            });
        }

        Ok(bound)
    }

    /// Computes a handler's effective chain.
    pub fn resolve_chain(
        &self,
        handler: &HandlerMetadata,
        plugin_group: &ResolvedGroup,
    ) -> MiddlewareChain {
        let handler_group = self.resolve_group(&handler.group);
        MiddlewareChain::new(
            self.pick(
                &handler.middlewares.pre_handlers,
                &handler_group.pre,
                &plugin_group.pre,
            ),
            self.pick(
                &handler.middlewares.mid_handlers,
                &handler_group.mid,
                &plugin_group.mid,
            ),
        )
    }

    fn pick(
        &self,
        own: &[String],
        handler_group: &[BoxedMiddleware],
        plugin_group: &[BoxedMiddleware],
    ) -> Vec<BoxedMiddleware> {
        let inherited = if handler_group.is_empty() {
            plugin_group
        } else {
            handler_group
        };
        let mut chain = self.registry.resolve_middlewares(own);
        chain.extend(inherited.iter().cloned());
        chain
    }

    /// Resolves a group's names against the registry; unknown groups are empty.
    pub fn resolve_group(&self, name: &str) -> ResolvedGroup {
        match self.groups.get(name) {
            Some(GroupMiddlewares { pre, mid }) => ResolvedGroup {
                pre: self.registry.resolve_middlewares(pre),
                mid: self.registry.resolve_middlewares(mid),
            },
            None => ResolvedGroup::default(),
        }
    }
}

/// A group whose middleware names have been resolved.
#[derive(Default, Clone)]
pub struct ResolvedGroup {
    pub pre: Vec<BoxedMiddleware>,
    pub mid: Vec<BoxedMiddleware>,
}

fn engine_options(plugin: &PluginMetadata) -> EngineOptions {
    let (on_enable, on_disable) = lifecycle_hooks(plugin);
    EngineOptions {
        name: plugin.name.clone(),
        brief: plugin.description.clone(),
        help: plugin.help.clone(),
        banner: plugin.banner.clone(),
        private_data_folder: plugin.data_folder.clone(),
        public_data_folder: plugin.public_folder.clone(),
        disable_on_default: false,
        on_enable: Some(on_enable),
        on_disable: Some(on_disable),
    }
}

/// One trigger per populated category, one per regex.
///
/// Regexes that fail to compile are dropped.
fn build_triggers(triggers: &HandlerTriggerMetadata) -> Vec<Trigger> {
    let mut out = Vec::new();
    if !triggers.full_matches.is_empty() {
        out.push(Trigger::FullMatch(triggers.full_matches.clone()));
    }
    if !triggers.keywords.is_empty() {
        out.push(Trigger::Keyword(triggers.keywords.clone()));
    }
    if !triggers.commands.is_empty() {
        out.push(Trigger::Command(triggers.commands.clone()));
    }
    if !triggers.prefixes.is_empty() {
        out.push(Trigger::Prefix(triggers.prefixes.clone()));
    }
    if !triggers.suffixes.is_empty() {
        out.push(Trigger::Suffix(triggers.suffixes.clone()));
    }
    for pattern in &triggers.regexes {
        match Trigger::regex(pattern) {
            Ok(trigger) => out.push(trigger),
            Err(e) => warn!(error = %e, "Skipping regex trigger"),
        }
    }
    if triggers.notice {
        out.push(Trigger::Notice);
    }
    out
}
