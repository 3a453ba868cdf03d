use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::generator::GeneratorConfig;
use crate::progress::ProgressConfig;
use crate::stages::{ContentConfig, ImageConfig, NotifyConfig, RenderConfig, VoiceConfig};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub generator: GeneratorConfig,
    pub progress: ProgressConfig,
    pub content: SanitizedContentConfig,
    pub voice: VoiceConfig,
    pub image: SanitizedImageConfig,
    pub render: RenderConfig,
    pub notify: SanitizedNotifyConfig,
}

/// Content config with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedContentConfig {
    pub model: String,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    pub timeout_secs: u64,
    pub api_key_configured: bool,
}

/// Image config with the access key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedImageConfig {
    pub base_url: String,
    pub max_aspect_ratio: f64,
    pub timeout_secs: u64,
    pub access_key_configured: bool,
}

/// Notify config with the webhook hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNotifyConfig {
    pub webhook_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            generator: config.generator.clone(),
            progress: config.progress.clone(),
            content: SanitizedContentConfig {
                model: config.content.model.clone(),
                base_url: config.content.base_url.clone(),
                referer: config.content.referer.clone(),
                timeout_secs: config.content.timeout_secs,
                api_key_configured: !config.content.api_key.is_empty(),
            },
            voice: config.voice.clone(),
            image: SanitizedImageConfig {
                base_url: config.image.base_url.clone(),
                max_aspect_ratio: config.image.max_aspect_ratio,
                timeout_secs: config.image.timeout_secs,
                access_key_configured: !config.image.access_key.is_empty(),
            },
            render: config.render.clone(),
            notify: SanitizedNotifyConfig {
                webhook_configured: !config.notify.webhook_url.is_empty(),
            },
        }
    }
}
