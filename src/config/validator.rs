//! Configuration validator for dwarf-query
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoaderConfig, LoggingConfig, MetadataConfig};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_metadata(&config.metadata)?;
        Self::validate_loader(&config.loader)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    fn validate_metadata(metadata: &MetadataConfig) -> Result<(), ConfigError> {
        if metadata.path.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Metadata path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_loader(loader: &LoaderConfig) -> Result<(), ConfigError> {
        if loader.max_threads == 0 {
            return Err(ConfigError::Invalid(
                "Loader threads must be at least 1".to_string(),
            ));
        }

        if loader.max_threads > 128 {
            return Err(ConfigError::Invalid(
                "Loader threads cannot exceed 128".to_string(),
            ));
        }

        if loader.parallel_threshold == 0 {
            return Err(ConfigError::Invalid(
                "Parallel threshold must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, valid_levels
            )));
        }

        if logging.file.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Invalid(
                "Log file path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_metadata_path() {
        let mut config = Config::default();
        config.metadata.path = "  ".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("Metadata path"));
    }

    #[test]
    fn test_invalid_thread_count() {
        let mut config = Config::default();
        config.loader.max_threads = 0;
        assert!(validate_config(&config).is_err());

        config.loader.max_threads = 129;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_parallel_threshold() {
        let mut config = Config::default();
        config.loader.parallel_threshold = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("log level"));
    }

    #[test]
    fn test_log_file_is_optional() {
        let mut config = Config::default();
        assert!(validate_config(&config).is_ok());

        config.logging.file = Some(String::new());
        assert!(validate_config(&config).is_err());

        config.logging.file = Some("dwarf-query.log".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_edge_cases() {
        let mut config = Config::default();
        config.loader.max_threads = 1;
        config.loader.parallel_threshold = 1;
        assert!(validate_config(&config).is_ok());

        config.loader.max_threads = 128;
        config.logging.level = "TRACE".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
