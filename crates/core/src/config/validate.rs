use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Generator capacity is at least 1
/// - Credentials for the external stages are present
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.generator.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "generator.max_concurrent_jobs must be at least 1".to_string(),
        ));
    }

    let required = [
        ("content.api_key", &config.content.api_key),
        ("image.access_key", &config.image.access_key),
        ("notify.webhook_url", &config.notify.webhook_url),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} is required",
                name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.content.api_key = "or-key".to_string();
        config.image.access_key = "unsplash-key".to_string();
        config.notify.webhook_url = "https://hooks.slack.com/services/x".to_string();
        config
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_capacity_fails() {
        let mut config = valid_config();
        config.generator.max_concurrent_jobs = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_concurrent_jobs"));
    }

    #[test]
    fn test_validate_missing_credentials_fail() {
        let mut config = valid_config();
        config.image.access_key = String::new();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("image.access_key"));

        let mut config = valid_config();
        config.notify.webhook_url = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("notify.webhook_url"));
    }
}
