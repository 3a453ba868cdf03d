//! Stage collaborators: the five external capabilities a job runs through.
//!
//! The generator only sees the traits in [`traits`]. Production
//! implementations talk to OpenRouter, OpenVoice, Unsplash, ffmpeg and Slack;
//! test doubles live in [`crate::testing`].

mod config;
mod error;
mod ffmpeg;
mod openrouter;
mod openvoice;
mod process;
mod slack;
mod traits;
mod types;
mod unsplash;

pub use config::{ContentConfig, ImageConfig, NotifyConfig, RenderConfig, VoiceConfig};
pub use error::StageError;
pub use ffmpeg::FfmpegRenderer;
pub use openrouter::OpenRouterContentGenerator;
pub use openvoice::OpenVoiceGenerator;
pub use slack::SlackNotifier;
pub use traits::{ContentGenerator, ImageGenerator, Notifier, VideoRenderer, VoiceGenerator};
pub use types::{
    ContentResult, ImageAttribution, ImageResult, NotificationPayload, NotificationStatus,
    RenderResult, VoiceResult,
};
pub use unsplash::UnsplashImageGenerator;

use std::sync::Arc;

use crate::config::Config;
use crate::generator::GenerationError;

/// The collaborators a generator drives, one per stage.
#[derive(Clone)]
pub struct StageSet {
    pub content: Arc<dyn ContentGenerator>,
    pub voice: Arc<dyn VoiceGenerator>,
    pub image: Arc<dyn ImageGenerator>,
    pub renderer: Arc<dyn VideoRenderer>,
    pub notifier: Arc<dyn Notifier>,
}

impl StageSet {
    /// Builds the production collaborators from configuration.
    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        let configuration = |stage: &str, e: StageError| {
            GenerationError::configuration(format!("{} stage: {}", stage, e))
        };

        let content = OpenRouterContentGenerator::new(config.content.clone())
            .map_err(|e| configuration("content", e))?;
        let voice =
            OpenVoiceGenerator::new(config.voice.clone()).map_err(|e| configuration("voice", e))?;
        let image = UnsplashImageGenerator::new(config.image.clone())
            .map_err(|e| configuration("image", e))?;
        let renderer = FfmpegRenderer::new(config.render.clone());
        let notifier =
            SlackNotifier::new(config.notify.clone()).map_err(|e| configuration("notify", e))?;

        Ok(Self {
            content: Arc::new(content),
            voice: Arc::new(voice),
            image: Arc::new(image),
            renderer: Arc::new(renderer),
            notifier: Arc::new(notifier),
        })
    }
}

impl std::fmt::Debug for StageSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageSet")
            .field("content", &self.content.name())
            .field("voice", &self.voice.name())
            .field("image", &self.image.name())
            .field("renderer", &self.renderer.name())
            .field("notifier", &self.notifier.name())
            .finish()
    }
}
