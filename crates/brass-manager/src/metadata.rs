//! Declarative configuration model.
//!
//! These types mirror the `groups` / `plugins` document accepted from YAML or
//! JSON sources. Every field except the names is optional.

use serde::{Deserialize, Serialize};

/// One configuration source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedConfig {
    #[serde(default)]
    pub groups: Vec<PluginGroup>,
    #[serde(default)]
    pub plugins: Vec<PluginMetadata>,
}

/// A named, inheritable middleware bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginGroup {
    pub name: String,
    #[serde(default)]
    pub pre_handlers: Vec<String>,
    #[serde(default)]
    pub mid_handlers: Vec<String>,
    #[serde(default)]
    pub sub_groups: Vec<PluginGroup>,
}

/// One installable feature unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub banner: String,
    #[serde(default)]
    pub data_folder: String,
    #[serde(default)]
    pub public_folder: String,
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub handlers: Vec<HandlerMetadata>,
}

/// One trigger + behaviour binding within a plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerMetadata {
    /// Registry key of the handler implementation.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: String,
    /// Stop evaluating further bindings once this handler ran.
    #[serde(default)]
    pub blocked: bool,
    /// `"user"`, `"group"`, or anything else for no limiter.
    #[serde(default)]
    pub limiter: String,
    #[serde(default)]
    pub middlewares: HandlerMiddlewareMetadata,
    #[serde(default)]
    pub triggers: HandlerTriggerMetadata,
}

/// Explicit middleware names declared on a handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerMiddlewareMetadata {
    #[serde(default)]
    pub pre_handlers: Vec<String>,
    #[serde(default)]
    pub mid_handlers: Vec<String>,
}

/// The dispatch conditions that activate a handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerTriggerMetadata {
    #[serde(default)]
    pub full_matches: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default)]
    pub suffixes: Vec<String>,
    #[serde(default)]
    pub regexes: Vec<String>,
    #[serde(default)]
    pub notice: bool,
}

impl HandlerTriggerMetadata {
    /// Returns `true` if no trigger category is populated.
    pub fn is_empty(&self) -> bool {
        self.full_matches.is_empty()
            && self.keywords.is_empty()
            && self.commands.is_empty()
            && self.prefixes.is_empty()
            && self.suffixes.is_empty()
            && self.regexes.is_empty()
            && !self.notice
    }
}
