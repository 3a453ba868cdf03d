//! Configuration for the video generator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the video generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Maximum number of jobs in a non-terminal state at once.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Directory the rendered videos are written to. Survives cleanup.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory for per-job intermediate artifacts (audio, image).
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

fn default_max_concurrent_jobs() -> usize {
    3
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output/videos")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            output_dir: default_output_dir(),
            temp_dir: default_temp_dir(),
        }
    }
}

impl GeneratorConfig {
    /// Sets the maximum number of concurrent jobs.
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }

    /// Sets the output directory.
    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Sets the temp directory.
    pub fn with_temp_dir(mut self, dir: PathBuf) -> Self {
        self.temp_dir = dir;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.max_concurrent_jobs, 3);
        assert_eq!(config.output_dir, PathBuf::from("output/videos"));
        assert_eq!(config.temp_dir, PathBuf::from("temp"));
    }

    #[test]
    fn test_config_builder() {
        let config = GeneratorConfig::default()
            .with_max_concurrent_jobs(8)
            .with_output_dir(PathBuf::from("/srv/videos"))
            .with_temp_dir(PathBuf::from("/tmp/reel"));

        assert_eq!(config.max_concurrent_jobs, 8);
        assert_eq!(config.output_dir, PathBuf::from("/srv/videos"));
        assert_eq!(config.temp_dir, PathBuf::from("/tmp/reel"));
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            max_concurrent_jobs = 5
        "#;
        let config: GeneratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_concurrent_jobs, 5);
        assert_eq!(config.temp_dir, PathBuf::from("temp"));
    }
}
