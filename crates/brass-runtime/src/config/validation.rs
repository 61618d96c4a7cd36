//! Configuration validation utilities.

use brass_core::RateSettings;

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, RuntimeConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &RuntimeConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_rate_settings("limits.user", &config.limits.user)?;
    validate_rate_settings("limits.group", &config.limits.group)?;

    if config.dispatch.command_prefix.trim().is_empty() {
        return Err(ConfigError::validation(
            "dispatch.command_prefix must not be empty",
        ));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is 'file'",
        ));
    }

    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid logging filter module name: {module:?}"
        )));
    }

    Ok(())
}

fn validate_rate_settings(key: &str, settings: &RateSettings) -> ConfigResult<()> {
    if settings.window_ms == 0 {
        return Err(ConfigError::validation(format!(
            "{key}.window_ms must be greater than 0"
        )));
    }
    if settings.max_hits == 0 {
        return Err(ConfigError::validation(format!(
            "{key}.max_hits must be at least 1"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&RuntimeConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let mut config = RuntimeConfig::default();
        config.limits.group.window_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("limits.group.window_ms"));
    }

    #[test]
    fn test_zero_hits_is_rejected() {
        let mut config = RuntimeConfig::default();
        config.limits.user.max_hits = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_blank_command_prefix_is_rejected() {
        let mut config = RuntimeConfig::default();
        config.dispatch.command_prefix = " ".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_file_output_needs_a_path() {
        let mut config = RuntimeConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("brass.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
