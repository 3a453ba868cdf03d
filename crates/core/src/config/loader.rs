use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Overrides use the `PHRASEREEL_` prefix and `__` as the section separator,
/// e.g. `PHRASEREEL_CONTENT__API_KEY`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("PHRASEREEL_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000

[generator]
max_concurrent_jobs = 2
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.generator.max_concurrent_jobs, 2);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[generator]
max_concurrent_jobs = "many"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[content]
api_key = "key"
model = "some/model"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.content.model, "some/model");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[notify]
webhook_url = "https://hooks.example.com/from-file"
"#
        )
        .unwrap();

        // Only this test touches the notify section.
        std::env::set_var(
            "PHRASEREEL_NOTIFY__WEBHOOK_URL",
            "https://hooks.example.com/from-env",
        );
        let config = load_config(temp_file.path());
        std::env::remove_var("PHRASEREEL_NOTIFY__WEBHOOK_URL");

        assert_eq!(
            config.unwrap().notify.webhook_url,
            "https://hooks.example.com/from-env"
        );
    }
}
