//! Configuration for the production stage collaborators.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// OpenRouter content generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// OpenRouter API key (required).
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_content_model")]
    pub model: String,
    #[serde(default = "default_content_base_url")]
    pub base_url: String,
    /// Value of the `HTTP-Referer` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(default = "default_content_timeout")]
    pub timeout_secs: u64,
}

fn default_content_model() -> String {
    "shisa-ai/shisa-v2-llama3.3-70b:free".to_string()
}

fn default_content_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_content_timeout() -> u64 {
    10
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_content_model(),
            base_url: default_content_base_url(),
            referer: None,
            timeout_secs: default_content_timeout(),
        }
    }
}

/// OpenVoice speech synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Directory containing OpenVoice's `inference.py`.
    #[serde(default)]
    pub openvoice_path: PathBuf,
    #[serde(default = "default_python_path")]
    pub python_path: PathBuf,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
}

fn default_python_path() -> PathBuf {
    PathBuf::from("python")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            openvoice_path: PathBuf::new(),
            python_path: default_python_path(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

/// Unsplash background image search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Unsplash access key (required).
    #[serde(default)]
    pub access_key: String,
    #[serde(default = "default_image_base_url")]
    pub base_url: String,
    /// Widest width/height ratio accepted for a vertical video.
    #[serde(default = "default_max_aspect_ratio")]
    pub max_aspect_ratio: f64,
    #[serde(default = "default_image_timeout")]
    pub timeout_secs: u64,
}

fn default_image_base_url() -> String {
    "https://api.unsplash.com".to_string()
}

fn default_max_aspect_ratio() -> f64 {
    0.6
}

fn default_image_timeout() -> u64 {
    30
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            base_url: default_image_base_url(),
            max_aspect_ratio: default_max_aspect_ratio(),
            timeout_secs: default_image_timeout(),
        }
    }
}

/// FFmpeg video rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default = "default_crf")]
    pub crf: u8,
    #[serde(default = "default_preset")]
    pub preset: String,
    /// TrueType font for the subtitle overlay.
    #[serde(default = "default_font_path")]
    pub font_path: PathBuf,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_font_color")]
    pub font_color: String,
    #[serde(default = "default_shadow_color")]
    pub shadow_color: String,
    #[serde(default = "default_shadow_offset")]
    pub shadow_offset: u32,
    #[serde(default = "default_line_spacing")]
    pub line_spacing: u32,
}

fn default_width() -> u32 {
    1080
}

fn default_height() -> u32 {
    1920
}

fn default_frame_rate() -> u32 {
    30
}

fn default_crf() -> u8 {
    23
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_font_path() -> PathBuf {
    PathBuf::from("assets/fonts/NotoSansJP-Bold.ttf")
}

fn default_font_size() -> u32 {
    64
}

fn default_font_color() -> String {
    "white".to_string()
}

fn default_shadow_color() -> String {
    "black".to_string()
}

fn default_shadow_offset() -> u32 {
    2
}

fn default_line_spacing() -> u32 {
    20
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            width: default_width(),
            height: default_height(),
            frame_rate: default_frame_rate(),
            crf: default_crf(),
            preset: default_preset(),
            font_path: default_font_path(),
            font_size: default_font_size(),
            font_color: default_font_color(),
            shadow_color: default_shadow_color(),
            shadow_offset: default_shadow_offset(),
            line_spacing: default_line_spacing(),
        }
    }
}

/// Slack webhook notifications.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Incoming webhook URL (required).
    #[serde(default)]
    pub webhook_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_defaults() {
        let config = RenderConfig::default();
        assert_eq!((config.width, config.height), (1080, 1920));
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.preset, "medium");
    }

    #[test]
    fn test_content_deserialize_minimal() {
        let toml = r#"
            api_key = "sk-test"
        "#;
        let config: ContentConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_image_defaults() {
        let config: ImageConfig = toml::from_str("").unwrap();
        assert!(config.access_key.is_empty());
        assert_eq!(config.max_aspect_ratio, 0.6);
    }
}
