use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Catalog API key is not empty
/// - Catalog timeout, if set, is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.catalog.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.api_key cannot be empty".to_string(),
        ));
    }

    if config.catalog.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "catalog.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::AggregatorConfig;
    use crate::catalog_client::TmdbConfig;
    use crate::config::CacheConfig;

    fn config(api_key: &str, timeout_secs: Option<u64>) -> Config {
        Config {
            catalog: TmdbConfig {
                api_key: api_key.to_string(),
                base_url: None,
                image_base_url: None,
                timeout_secs,
            },
            cache: CacheConfig::default(),
            search: AggregatorConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&config("abc", None)).is_ok());
        assert!(validate_config(&config("abc", Some(10))).is_ok());
    }

    #[test]
    fn test_validate_empty_api_key_fails() {
        let result = validate_config(&config("  ", None));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let result = validate_config(&config("abc", Some(0)));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
