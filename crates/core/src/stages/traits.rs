//! Trait definitions for the stage collaborators.
//!
//! Each stage is one capability: produce an artifact or fail with a
//! [`StageError`]. Every call receives the job's cancellation token;
//! implementations that can abort early should watch it, the rest are raced
//! against it by the generator and their result is discarded.

use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::error::StageError;
use super::types::{
    ContentResult, ImageResult, NotificationPayload, RenderResult, VoiceResult,
};

/// Produces the phrase pair for a video.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_content(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ContentResult, StageError>;
}

/// Renders text to an audio file at `output_path`.
#[async_trait]
pub trait VoiceGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_voice(
        &self,
        text: &str,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<VoiceResult, StageError>;
}

/// Picks a background image for `keywords` and writes it to `output_path`.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_image(
        &self,
        keywords: &[String],
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ImageResult, StageError>;
}

/// Composites image, audio and text into a video file.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    fn name(&self) -> &str;

    async fn render_video(
        &self,
        image_path: &Path,
        audio_path: &Path,
        text: &str,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<RenderResult, StageError>;
}

/// Delivers a message to an external channel.
///
/// `Ok(false)` means the channel refused the message.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(
        &self,
        payload: &NotificationPayload,
        cancel: &CancellationToken,
    ) -> Result<bool, StageError>;
}
