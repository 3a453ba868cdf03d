//! FFmpeg-based video renderer.

use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::config::RenderConfig;
use super::error::StageError;
use super::process;
use super::traits::VideoRenderer;
use super::types::RenderResult;

const AUDIO_CODEC: &str = "aac";
const AUDIO_BITRATE: &str = "192k";
const AUDIO_SAMPLE_RATE: &str = "44100";
const AUDIO_CHANNELS: &str = "2";

/// Renders a still background, narration and subtitle into an mp4.
pub struct FfmpegRenderer {
    config: RenderConfig,
}

impl FfmpegRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Builds the `-vf` filter chain: cover-scale, crop, centered text.
    fn video_filter(&self, text: &str) -> String {
        let c = &self.config;
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},\
             drawtext=text='{text}':fontfile='{font}':fontsize={size}:fontcolor={color}:\
             x=(w-text_w)/2:y=(h-text_h)/2:shadowcolor={shadow}:shadowx={offset}:shadowy={offset}:\
             line_spacing={spacing}",
            w = c.width,
            h = c.height,
            text = escape_drawtext(text),
            font = escape_drawtext(&c.font_path.to_string_lossy()),
            size = c.font_size,
            color = c.font_color,
            shadow = c.shadow_color,
            offset = c.shadow_offset,
            spacing = c.line_spacing,
        )
    }

    fn build_args(
        &self,
        image_path: &Path,
        audio_path: &Path,
        text: &str,
        output_path: &Path,
    ) -> Vec<String> {
        let c = &self.config;
        vec![
            "-y".to_string(),
            "-loop".to_string(),
            "1".to_string(),
            "-i".to_string(),
            image_path.to_string_lossy().to_string(),
            "-i".to_string(),
            audio_path.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            c.preset.clone(),
            "-crf".to_string(),
            c.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            c.frame_rate.to_string(),
            "-c:a".to_string(),
            AUDIO_CODEC.to_string(),
            "-b:a".to_string(),
            AUDIO_BITRATE.to_string(),
            "-ar".to_string(),
            AUDIO_SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            AUDIO_CHANNELS.to_string(),
            "-vf".to_string(),
            self.video_filter(text),
            "-shortest".to_string(),
            output_path.to_string_lossy().to_string(),
        ]
    }
}

/// Escapes a value for use inside a single-quoted drawtext option.
fn escape_drawtext(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '\'' | ':' | '%' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

#[async_trait]
impl VideoRenderer for FfmpegRenderer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn render_video(
        &self,
        image_path: &Path,
        audio_path: &Path,
        text: &str,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<RenderResult, StageError> {
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_args(image_path, audio_path, text, output_path);
        process::run(&self.config.ffmpeg_path, &args, cancel).await?;
        process::ensure_output(output_path).await?;

        let duration_secs =
            process::probe_duration(&self.config.ffprobe_path, output_path, cancel).await?;
        info!(
            path = %output_path.display(),
            duration_secs,
            "Rendered video"
        );

        Ok(RenderResult {
            video_path: output_path.to_path_buf(),
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("It's 5:00"), "It\\'s 5\\:00");
        assert_eq!(escape_drawtext("100%"), "100\\%");
        assert_eq!(escape_drawtext("plain"), "plain");
    }

    #[test]
    fn test_build_args() {
        let renderer = FfmpegRenderer::new(RenderConfig::default());
        let args = renderer.build_args(
            &PathBuf::from("/tmp/bg.jpg"),
            &PathBuf::from("/tmp/voice.wav"),
            "Be kind",
            &PathBuf::from("/out/job.mp4"),
        );

        assert_eq!(args.first().map(String::as_str), Some("-y"));
        assert_eq!(args.last().map(String::as_str), Some("/out/job.mp4"));
        assert!(args.contains(&"-shortest".to_string()));
        assert!(args.contains(&"/tmp/bg.jpg".to_string()));

        let filter = args
            .iter()
            .position(|a| a == "-vf")
            .map(|i| args[i + 1].clone())
            .unwrap();
        assert!(filter.starts_with("scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920"));
        assert!(filter.contains("drawtext=text='Be kind'"));
    }
}
