//! Public configuration sections.
//!
//! Plugins read their own settings out of the public config document by key
//! path, typically from a before-bind hook.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::error::{ConfigError, ConfigResult};

/// The raw public configuration document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublicConfig {
    root: Value,
}

impl PublicConfig {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Reads a YAML or JSON document, chosen by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;

        let root = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::parse_yaml(&contents)?,
            Some("json") => serde_json::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?,
            other => {
                return Err(ConfigError::ParseError(format!(
                    "Unsupported configuration file format: .{}",
                    other.unwrap_or("")
                )));
            }
        };

        debug!(path = %path.display(), "Public configuration loaded");
        Ok(Self { root })
    }

    /// Parses a YAML document. An empty document is an empty mapping.
    pub fn parse_yaml(contents: &str) -> ConfigResult<Value> {
        if contents.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        let value: Value = serde_yaml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(match value {
            Value::Null => Value::Object(Default::default()),
            other => other,
        })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Descends `keys` and deserializes the value found there.
    pub fn section<T: DeserializeOwned>(&self, keys: &[&str]) -> ConfigResult<T> {
        let mut node = &self.root;
        for key in keys {
            node = node
                .get(*key)
                .ok_or_else(|| ConfigError::missing_section(keys))?;
        }
        serde_json::from_value(node.clone()).map_err(|e| {
            ConfigError::ParseError(format!("section '{}': {e}", keys.join(".")))
        })
    }

    /// Like [`section`](Self::section), falling back to `T::default()` when
    /// the section is absent.
    pub fn section_or_default<T: DeserializeOwned + Default>(
        &self,
        keys: &[&str],
    ) -> ConfigResult<T> {
        match self.section(keys) {
            Err(ConfigError::MissingSection { .. }) => Ok(T::default()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default, PartialEq)]
    struct Weather {
        city: String,
        #[serde(default)]
        units: Option<String>,
    }

    fn document() -> PublicConfig {
        PublicConfig::new(
            PublicConfig::parse_yaml("plugins:\n  weather:\n    city: Hefei\n  echo: 3\n").unwrap(),
        )
    }

    #[test]
    fn test_section_by_key_path() {
        let weather: Weather = document().section(&["plugins", "weather"]).unwrap();
        assert_eq!(
            weather,
            Weather {
                city: "Hefei".into(),
                units: None
            }
        );
    }

    #[test]
    fn test_missing_section() {
        let err = document()
            .section::<Weather>(&["plugins", "news"])
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection { ref path } if path == "plugins.news"));

        let fallback: Weather = document().section_or_default(&["plugins", "news"]).unwrap();
        assert_eq!(fallback, Weather::default());
    }

    #[test]
    fn test_wrong_shape_is_a_parse_error() {
        let err = document().section::<Weather>(&["plugins", "echo"]).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_from_file_yaml_and_json_agree() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("global.yaml");
        let json = dir.path().join("global.json");
        std::fs::write(&yaml, "weather:\n  city: Hefei\n  units: metric\n").unwrap();
        std::fs::write(&json, r#"{"weather": {"city": "Hefei", "units": "metric"}}"#).unwrap();

        assert_eq!(
            PublicConfig::from_file(&yaml).unwrap(),
            PublicConfig::from_file(&json).unwrap()
        );
        assert!(matches!(
            PublicConfig::from_file(dir.path().join("absent.yaml")),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_empty_yaml_is_an_empty_document() {
        let value = PublicConfig::parse_yaml("").unwrap();
        assert!(value.as_object().is_some_and(|m| m.is_empty()));
    }
}
