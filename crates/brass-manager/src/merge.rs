//! Multi-source loading and merging.
//!
//! Sources are loaded in declaration order before anything is bound. Group
//! definitions accumulate across the sources of one pass, so a plugin in a
//! later source can reference a group declared by an earlier one.

use std::collections::HashSet;

use brass_core::DispatchSurface;
use tracing::{error, info, warn};

use crate::binder::{BindReport, Binder, BoundHandler, SkipReason};
use crate::error::ManagerResult;
use crate::groups::GroupTable;
use crate::metadata::ManagedConfig;
use crate::registry::Registry;
use crate::source::{SourceRole, SourceSpec};

/// What happens when two sources declare a plugin of the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Every declaration is bound independently.
    #[default]
    Duplicate,
    /// Later declarations of an already bound plugin are skipped.
    FirstWins,
}

/// A decoded source awaiting binding.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub name: String,
    pub config: ManagedConfig,
}

/// A default source that failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub name: String,
    pub error: String,
}

/// Binding outcome of one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub report: BindReport,
}

/// Outcome of a full initialization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub sources: Vec<SourceReport>,
    pub failures: Vec<SourceFailure>,
}

impl InitReport {
    /// Total number of bindings registered across all sources.
    pub fn binding_count(&self) -> usize {
        self.sources.iter().map(|s| s.report.binding_count()).sum()
    }

    pub fn bound_handlers(&self) -> impl Iterator<Item = &BoundHandler> {
        self.sources.iter().flat_map(|s| s.report.bound.iter())
    }

    /// Number of sources in which `plugin` was bound.
    pub fn times_bound(&self, plugin: &str) -> usize {
        self.sources
            .iter()
            .filter(|s| s.report.is_bound(plugin))
            .count()
    }
}

/// Loads every source, stopping at the first failing override.
pub fn load_sources(
    specs: &[SourceSpec],
) -> ManagerResult<(Vec<LoadedSource>, Vec<SourceFailure>)> {
    let mut loaded = Vec::with_capacity(specs.len());
    let mut failures = Vec::new();

    for spec in specs {
        let name = spec.source.name();
        match spec.source.load() {
            Ok(config) => loaded.push(LoadedSource { name, config }),
            Err(e) if spec.role == SourceRole::Default => {
                warn!(source = %name, error = %e, "Failed to load default configuration, skipping");
                failures.push(SourceFailure {
                    name,
                    error: e.to_string(),
                });
            }
            Err(e) => {
                error!(source = %name, error = %e, "Failed to load configuration");
                return Err(e);
            }
        }
    }

    Ok((loaded, failures))
}

/// Binds loaded sources in order against one surface.
pub struct MergeDriver<'a> {
    registry: &'a Registry,
    surface: &'a dyn DispatchSurface,
    policy: DuplicatePolicy,
}

impl<'a> MergeDriver<'a> {
    pub fn new(registry: &'a Registry, surface: &'a dyn DispatchSurface) -> Self {
        Self {
            registry,
            surface,
            policy: DuplicatePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn bind(&self, sources: &[LoadedSource]) -> Vec<SourceReport> {
        let mut groups = GroupTable::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut reports = Vec::with_capacity(sources.len());

        for source in sources {
            groups.extend_from(&source.config.groups);
            info!(
                source = %source.name,
                plugins = source.config.plugins.len(),
                groups = groups.len(),
                "Binding configuration source"
            );

            let binder = Binder::new(self.registry, &groups, self.surface);
            let mut report = BindReport::default();
            for plugin in &source.config.plugins {
                if self.policy == DuplicatePolicy::FirstWins && seen.contains(&plugin.name) {
                    report.record(&plugin.name, Err(SkipReason::AlreadyBound));
                    continue;
                }
                let result = binder.bind_plugin(plugin);
                if result.is_ok() {
                    seen.insert(plugin.name.clone());
                }
                report.record(&plugin.name, result);
            }

            reports.push(SourceReport {
                name: source.name.clone(),
                report,
            });
        }

        reports
    }
}
