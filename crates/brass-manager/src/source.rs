//! Configuration sources.
//!
//! A source is either a document compiled into the binary or a file on
//! disk. Both YAML and JSON decode into the same [`ManagedConfig`] through
//! `figment`.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Format, Json, Yaml};

use crate::error::{ManagerError, ManagerResult};
use crate::metadata::ManagedConfig;

/// Document format of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Where a [`ManagedConfig`] comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A document held in memory, typically via `include_str!`.
    Embedded {
        name: String,
        format: ConfigFormat,
        contents: String,
    },
    /// A file whose format follows its extension.
    File(PathBuf),
}

impl ConfigSource {
    pub fn embedded(
        name: impl Into<String>,
        format: ConfigFormat,
        contents: impl Into<String>,
    ) -> Self {
        Self::Embedded {
            name: name.into(),
            format,
            contents: contents.into(),
        }
    }

    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    /// A human-readable name for logs and errors.
    pub fn name(&self) -> String {
        match self {
            Self::Embedded { name, .. } => name.clone(),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// Reads and decodes the source.
    pub fn load(&self) -> ManagerResult<ManagedConfig> {
        let figment = match self {
            Self::Embedded {
                format, contents, ..
            } => match format {
                ConfigFormat::Yaml => Figment::from(Yaml::string(contents)),
                ConfigFormat::Json => Figment::from(Json::string(contents)),
            },
            Self::File(path) => {
                if !path.exists() {
                    return Err(ManagerError::SourceNotFound(path.clone()));
                }
                match ConfigFormat::from_path(path) {
                    Some(ConfigFormat::Yaml) => Figment::from(Yaml::file(path)),
                    Some(ConfigFormat::Json) => Figment::from(Json::file(path)),
                    None => return Err(ManagerError::UnsupportedFormat(path.clone())),
                }
            }
        };

        figment.extract().map_err(|e| ManagerError::Decode {
            name: self.name(),
            message: e.to_string(),
        })
    }
}

/// How a failing source is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    /// Built-in defaults: a failure is logged and the source skipped.
    Default,
    /// User-supplied configuration: a failure aborts initialization.
    Override,
}

/// A source together with its role.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub source: ConfigSource,
    pub role: SourceRole,
}

impl SourceSpec {
    pub fn defaults(source: ConfigSource) -> Self {
        Self {
            source,
            role: SourceRole::Default,
        }
    }

    pub fn overrides(source: ConfigSource) -> Self {
        Self {
            source,
            role: SourceRole::Override,
        }
    }
}
