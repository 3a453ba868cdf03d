//! OpenVoice speech synthesis through its python inference script.

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::config::VoiceConfig;
use super::error::StageError;
use super::process;
use super::traits::VoiceGenerator;
use super::types::VoiceResult;

/// Voice generator that shells out to `inference.py`.
pub struct OpenVoiceGenerator {
    script_path: PathBuf,
    python_path: PathBuf,
    ffprobe_path: PathBuf,
}

impl OpenVoiceGenerator {
    pub fn new(config: VoiceConfig) -> Result<Self, StageError> {
        if config.openvoice_path.as_os_str().is_empty() {
            return Err(StageError::NotConfigured(
                "OpenVoice path is required".to_string(),
            ));
        }

        Ok(Self {
            script_path: config.openvoice_path.join("inference.py"),
            python_path: config.python_path,
            ffprobe_path: config.ffprobe_path,
        })
    }
}

#[async_trait]
impl VoiceGenerator for OpenVoiceGenerator {
    fn name(&self) -> &str {
        "openvoice"
    }

    async fn generate_voice(
        &self,
        text: &str,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<VoiceResult, StageError> {
        if text.trim().is_empty() {
            return Err(StageError::InvalidInput(
                "Text is required for voice generation".to_string(),
            ));
        }

        if !tokio::fs::try_exists(&self.script_path).await? {
            return Err(StageError::NotConfigured(format!(
                "OpenVoice inference script not found: {}",
                self.script_path.display()
            )));
        }

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = [
            self.script_path.as_os_str(),
            OsStr::new("--text"),
            OsStr::new(text),
            OsStr::new("--output"),
            output_path.as_os_str(),
        ];
        process::run(&self.python_path, args, cancel).await?;
        process::ensure_output(output_path).await?;

        let duration_secs = process::probe_duration(&self.ffprobe_path, output_path, cancel).await?;
        info!(
            path = %output_path.display(),
            duration_secs,
            "Generated audio"
        );

        Ok(VoiceResult {
            audio_path: output_path.to_path_buf(),
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_path() {
        let result = OpenVoiceGenerator::new(VoiceConfig::default());
        assert!(matches!(result, Err(StageError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_rejects_empty_text() {
        let generator = OpenVoiceGenerator::new(VoiceConfig {
            openvoice_path: PathBuf::from("/opt/openvoice"),
            ..Default::default()
        })
        .unwrap();

        let result = generator
            .generate_voice("  ", Path::new("/tmp/a.wav"), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(StageError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_missing_script_is_not_configured() {
        let dir = tempfile::TempDir::new().unwrap();
        let generator = OpenVoiceGenerator::new(VoiceConfig {
            openvoice_path: dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();

        let result = generator
            .generate_voice(
                "Hello",
                &dir.path().join("a.wav"),
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(StageError::NotConfigured(_))));
    }
}
