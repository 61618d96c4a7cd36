//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Public config file (`brass.yaml` / `brass.yml` / `brass.json`, or an explicit path)
//! 3. Environment variables (`BRASS_*`)
//! 4. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Environment variables are mapped using the `BRASS_` prefix with `__` as separator:
//!
//! - `BRASS_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `BRASS_LIMITS__USER__MAX_HITS=3` → `limits.user.max_hits = 3`
//! - `BRASS_DISPATCH__COMMAND_PREFIX=!` → `dispatch.command_prefix = "!"`
//!
//! # Example
//!
//! ```rust,ignore
//! use brass_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./brass.yaml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Yaml};
use tracing::{debug, info, trace};

use super::error::{ConfigError, ConfigResult};
use super::schema::RuntimeConfig;

const BASE_NAMES: &[&str] = &["brass.yaml", "brass.yml", "brass.json"];

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides, merged last.
    overrides: Figment,
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that reads defaults and the environment only.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a directory searched for `brass.{yaml,yml,json}`.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds user config directory to search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("brass"))
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: RuntimeConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Returns the file that would be loaded, if any.
    pub fn resolve_file(&self) -> ConfigResult<Option<PathBuf>> {
        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            return Ok(Some(path.clone()));
        }

        for search_path in &self.search_paths {
            for base_name in BASE_NAMES {
                let candidate = search_path.join(base_name);
                if candidate.exists() {
                    return Ok(Some(candidate));
                }
            }
        }
        Ok(None)
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<RuntimeConfig> {
        let figment = self.build_figment()?;

        let config: RuntimeConfig = figment.extract().map_err(|e| {
            ConfigError::ParseError(format!("Failed to extract configuration: {e}"))
        })?;

        debug!(
            logging_level = %config.logging.level,
            command_prefix = %config.dispatch.command_prefix,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(RuntimeConfig::default()));

        if let Some(path) = self.resolve_file()? {
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_config_file(figment, &path)?;
        } else {
            debug!("No configuration file, using defaults");
        }

        if self.load_env {
            trace!("Loading environment variables with BRASS_ prefix");
            figment = figment.merge(Env::prefixed("BRASS_").split("__"));
        }

        Ok(figment.merge(self.overrides))
    }
}

/// Merges a single config file into the figment, dispatching on file extension.
fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        "json" => Ok(figment.merge(Json::file(path))),
        _ => Err(ConfigError::ParseError(format!(
            "Unsupported configuration file format: .{ext}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_default_config() {
        let config = ConfigLoader::new().without_env().load().unwrap();

        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.dispatch.command_prefix, "/");
        assert_eq!(config.limits.user.max_hits, 1);
        assert_eq!(config.limits.user.window_ms, 5000);
    }

    #[test]
    fn test_file_values_and_unknown_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brass.yaml");
        std::fs::write(
            &path,
            "logging:\n  level: debug\nlimits:\n  group:\n    max_hits: 4\n\
             dispatch:\n  command_prefix: '!'\nweather:\n  city: Hefei\n",
        )
        .unwrap();

        let config = ConfigLoader::new().file(&path).without_env().load().unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.limits.group.max_hits, 4);
        assert_eq!(config.limits.group.window_ms, 5000);
        assert_eq!(config.dispatch.command_prefix, "!");
    }

    #[test]
    fn test_search_path_finds_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("brass.json"),
            r#"{"limits": {"user": {"window_ms": 250}}}"#,
        )
        .unwrap();

        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();
        assert_eq!(config.limits.user.window_ms, 250);
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ConfigLoader::new()
            .file("/nonexistent/brass.yaml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_unknown_level_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brass.yml");
        std::fs::write(&path, "logging:\n  level: loud\n").unwrap();

        let result = ConfigLoader::new().file(&path).without_env().load();
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_programmatic_overrides_win() {
        let mut overrides = RuntimeConfig::default();
        overrides.dispatch.command_prefix = "#".into();

        let config = ConfigLoader::new()
            .without_env()
            .merge(overrides)
            .load()
            .unwrap();
        assert_eq!(config.dispatch.command_prefix, "#");
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brass.yaml");
        std::fs::write(&path, "dispatch:\n  command_prefix: '!'\n").unwrap();

        // SAFETY: no other test reads this variable
        unsafe {
            std::env::set_var("BRASS_LIMITS__USER__MAX_HITS", "7");
        }
        let config = ConfigLoader::new().file(&path).load().unwrap();
        unsafe {
            std::env::remove_var("BRASS_LIMITS__USER__MAX_HITS");
        }

        assert_eq!(config.limits.user.max_hits, 7);
        assert_eq!(config.dispatch.command_prefix, "!");
    }
}
