//! Startup orchestration.
//!
//! Startup either completes fully or fails with a [`StartupError`]; the
//! caller never sees a partially bound manager.

use std::path::{Path, PathBuf};

use brass_core::DispatchSurface;
use brass_manager::{
    ConfigFormat, ConfigSource, DuplicatePolicy, InitReport, ManagerError, PluginManager,
    SourceSpec,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, ConfigLoader, PublicConfig, RuntimeConfig, validate_config};

/// Manager configuration compiled into the binary.
pub const DEFAULT_MANAGER_CONFIG: &str = include_str!("../embedded/config.yaml");

const YAML_DEFAULTS_NAME: &str = "embedded:config.yaml";
const JSON_DEFAULTS_NAME: &str = "embedded:config.json";

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Plugin initialization failed: {0}")]
    Manager(#[from] ManagerError),
}

pub type StartupResult<T> = Result<T, StartupError>;

/// Loaded and validated settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: RuntimeConfig,
    pub public: PublicConfig,
}

/// Startup builder.
#[derive(Debug, Clone)]
pub struct Startup {
    global: Option<PathBuf>,
    manager: PathBuf,
    defaults: Option<String>,
    json_defaults: Option<String>,
    policy: DuplicatePolicy,
    load_env: bool,
    search_dirs: bool,
}

impl Startup {
    /// `manager` is the user's manager configuration, which must load.
    pub fn new<P: AsRef<Path>>(manager: P) -> Self {
        Self {
            global: None,
            manager: manager.as_ref().to_path_buf(),
            defaults: Some(DEFAULT_MANAGER_CONFIG.to_string()),
            json_defaults: None,
            policy: DuplicatePolicy::default(),
            load_env: true,
            search_dirs: true,
        }
    }

    /// Sets the public configuration file.
    pub fn global<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.global = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replaces the embedded default manager configuration.
    pub fn defaults(mut self, contents: impl Into<String>) -> Self {
        self.defaults = Some(contents.into());
        self
    }

    /// Adds a JSON default manager configuration, bound after the YAML one.
    pub fn json_defaults(mut self, contents: impl Into<String>) -> Self {
        self.json_defaults = Some(contents.into());
        self
    }

    /// Drops both the YAML and the JSON defaults.
    pub fn without_defaults(mut self) -> Self {
        self.defaults = None;
        self.json_defaults = None;
        self
    }

    pub fn policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Stops looking for `brass.yaml` in the working and user config
    /// directories when no public config file is set.
    pub fn without_search(mut self) -> Self {
        self.search_dirs = false;
        self
    }

    /// Creates a manager using this startup's duplicate policy.
    pub fn manager(&self) -> PluginManager {
        PluginManager::new().with_policy(self.policy)
    }

    /// Manager sources in binding order: YAML defaults, JSON defaults,
    /// then the user's file.
    pub fn sources(&self) -> Vec<SourceSpec> {
        let mut sources = Vec::with_capacity(3);
        let defaults = [
            (YAML_DEFAULTS_NAME, ConfigFormat::Yaml, &self.defaults),
            (JSON_DEFAULTS_NAME, ConfigFormat::Json, &self.json_defaults),
        ];
        for (name, format, contents) in defaults {
            if let Some(contents) = contents {
                sources.push(SourceSpec::defaults(ConfigSource::embedded(
                    name,
                    format,
                    contents.clone(),
                )));
            }
        }
        sources.push(SourceSpec::overrides(ConfigSource::file(&self.manager)));
        sources
    }

    fn loader(&self) -> ConfigLoader {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.global {
            loader = loader.file(path);
        } else if self.search_dirs {
            loader = loader.with_current_dir().with_user_config_dir();
        }
        if !self.load_env {
            loader = loader.without_env();
        }
        loader
    }

    /// Loads and validates the runtime and public configuration.
    pub fn prepare(&self) -> StartupResult<Settings> {
        let loader = self.loader();
        let public = match loader.resolve_file()? {
            Some(path) => PublicConfig::from_file(path)?,
            None => PublicConfig::default(),
        };
        let config = loader.load()?;
        validate_config(&config)?;
        debug!(limits = ?config.limits, "Runtime configuration validated");

        Ok(Settings { config, public })
    }

    /// Binds the manager sources against `surface`.
    pub fn initialize(
        &self,
        manager: &PluginManager,
        surface: &dyn DispatchSurface,
    ) -> StartupResult<InitReport> {
        let report = manager.initialize(&self.sources(), surface)?;
        info!(
            manager = %self.manager.display(),
            bindings = report.binding_count(),
            "Startup complete"
        );
        Ok(report)
    }

    /// [`prepare`](Self::prepare) followed by [`initialize`](Self::initialize).
    pub fn run(
        &self,
        manager: &PluginManager,
        surface: &dyn DispatchSurface,
    ) -> StartupResult<(Settings, InitReport)> {
        let settings = self.prepare()?;
        let report = self.initialize(manager, surface)?;
        Ok((settings, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brass_core::{Dispatcher, handler_fn};

    const MANAGER: &str = r#"
plugins:
  - name: echo
    group: chat
    enable: true
    handlers:
      - name: echo
        triggers:
          commands: [echo]
"#;

    fn manager_with_demo_handlers(startup: &Startup) -> PluginManager {
        let manager = startup.manager();
        manager.register_handler("ping", handler_fn(|_ctx| async {}));
        manager.register_handler("echo", handler_fn(|_ctx| async {}));
        manager
    }

    #[test]
    fn test_embedded_defaults_decode() {
        let config = ConfigSource::embedded("defaults", ConfigFormat::Yaml, DEFAULT_MANAGER_CONFIG)
            .load()
            .unwrap();
        assert_eq!(config.groups[0].pre_handlers, vec!["log-message"]);
        assert_eq!(config.plugins[0].name, "status");
    }

    #[test]
    fn test_run_binds_defaults_and_user_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager_path = dir.path().join("manager.yaml");
        let global_path = dir.path().join("global.yaml");
        std::fs::write(&manager_path, MANAGER).unwrap();
        std::fs::write(&global_path, "dispatch:\n  command_prefix: '#'\nplugins:\n  echo: {}\n")
            .unwrap();

        let startup = Startup::new(&manager_path)
            .global(&global_path)
            .without_env();
        let manager = manager_with_demo_handlers(&startup);
        let dispatcher = Dispatcher::new();

        let (settings, report) = startup.run(&manager, &dispatcher).unwrap();
        assert_eq!(settings.config.dispatch.command_prefix, "#");
        assert!(settings.public.root().get("plugins").is_some());
        assert_eq!(report.times_bound("status"), 1);
        assert_eq!(report.times_bound("echo"), 1);
        // "chat" comes from the embedded defaults
        assert_eq!(dispatcher.bindings("echo")[0].chain.pre.len(), 1);
    }

    #[test]
    fn test_missing_manager_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let startup = Startup::new(dir.path().join("manager.yaml"))
            .without_env()
            .without_search();
        let manager = manager_with_demo_handlers(&startup);
        let dispatcher = Dispatcher::new();

        let err = startup.run(&manager, &dispatcher).unwrap_err();
        assert!(matches!(
            err,
            StartupError::Manager(ManagerError::SourceNotFound(_))
        ));
        assert_eq!(dispatcher.binding_count(), 0);
    }

    #[test]
    fn test_missing_global_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let manager_path = dir.path().join("manager.yaml");
        std::fs::write(&manager_path, MANAGER).unwrap();

        let startup = Startup::new(&manager_path)
            .global(dir.path().join("global.yaml"))
            .without_env();
        assert!(matches!(
            startup.prepare(),
            Err(StartupError::Config(ConfigError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_invalid_settings_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let manager_path = dir.path().join("manager.yaml");
        let global_path = dir.path().join("global.json");
        std::fs::write(&manager_path, MANAGER).unwrap();
        std::fs::write(&global_path, r#"{"limits": {"user": {"max_hits": 0}}}"#).unwrap();

        let startup = Startup::new(&manager_path)
            .global(&global_path)
            .without_env();
        assert!(matches!(
            startup.prepare(),
            Err(StartupError::Config(ConfigError::ValidationError { .. }))
        ));
    }

    #[test]
    fn test_json_defaults_bind_after_yaml_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager_path = dir.path().join("manager.yaml");
        std::fs::write(&manager_path, MANAGER).unwrap();

        let startup = Startup::new(&manager_path)
            .json_defaults(
                r#"{"plugins": [{"name": "relay", "group": "chat", "enable": true,
                    "handlers": [{"name": "echo", "triggers": {"prefixes": ["say "]}}]}]}"#,
            )
            .without_env()
            .without_search();
        let names: Vec<String> = startup.sources().iter().map(|s| s.source.name()).collect();
        assert_eq!(
            names,
            vec![
                "embedded:config.yaml".to_string(),
                "embedded:config.json".to_string(),
                manager_path.display().to_string(),
            ]
        );

        let manager = manager_with_demo_handlers(&startup);
        let dispatcher = Dispatcher::new();
        let report = startup.initialize(&manager, &dispatcher).unwrap();
        assert_eq!(report.sources[1].name, "embedded:config.json");
        assert_eq!(report.times_bound("relay"), 1);
        // the JSON defaults use a group declared by the YAML defaults
        assert_eq!(dispatcher.bindings("relay")[0].chain.pre.len(), 1);
    }

    #[test]
    fn test_broken_json_defaults_only_warn() {
        let dir = tempfile::tempdir().unwrap();
        let manager_path = dir.path().join("manager.yaml");
        std::fs::write(&manager_path, MANAGER).unwrap();

        let startup = Startup::new(&manager_path)
            .json_defaults("{ not json")
            .without_env()
            .without_search();
        let manager = manager_with_demo_handlers(&startup);
        let dispatcher = Dispatcher::new();

        let report = startup.initialize(&manager, &dispatcher).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "embedded:config.json");
        assert_eq!(report.times_bound("echo"), 1);
    }

    #[test]
    fn test_first_wins_policy_reaches_the_manager() {
        let dir = tempfile::tempdir().unwrap();
        let manager_path = dir.path().join("manager.yaml");
        std::fs::write(
            &manager_path,
            "plugins:\n  - name: status\n    enable: true\n    handlers:\n      - name: ping\n        \
             triggers:\n          keywords: [ping]\n",
        )
        .unwrap();

        let startup = Startup::new(&manager_path)
            .policy(DuplicatePolicy::FirstWins)
            .without_env()
            .without_search();
        let manager = manager_with_demo_handlers(&startup);
        let dispatcher = Dispatcher::new();

        let report = startup.initialize(&manager, &dispatcher).unwrap();
        assert_eq!(report.times_bound("status"), 1);
        assert_eq!(dispatcher.engines("status").len(), 1);
    }
}
