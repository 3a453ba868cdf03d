//! Mock implementations of the five stage traits.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::stages::{
    ContentGenerator, ContentResult, ImageAttribution, ImageGenerator, ImageResult,
    NotificationPayload, Notifier, RenderResult, StageError, VideoRenderer, VoiceGenerator,
    VoiceResult,
};

use super::control::MockControl;

/// Adds the [`MockControl`] switches as methods on a mock.
macro_rules! delegate_control {
    ($mock:ty) => {
        impl $mock {
            /// Behaviour switches for this mock.
            pub fn control(&self) -> &MockControl {
                &self.control
            }

            /// Configure the next call to fail with the given error.
            pub async fn set_next_error(&self, error: StageError) {
                self.control.set_next_error(error).await;
            }

            /// Set the simulated duration of each call.
            pub fn set_delay(&self, delay: Duration) {
                self.control.set_delay(delay);
            }

            /// Block calls until [`release`](Self::release).
            pub fn hold(&self) {
                self.control.hold();
            }

            pub fn release(&self) {
                self.control.release();
            }

            pub fn call_count(&self) -> usize {
                self.control.call_count()
            }

            /// Wait until at least `count` calls have been made.
            pub async fn wait_for_calls(&self, count: usize) {
                self.control.wait_for_calls(count).await;
            }
        }
    };
}

async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), StageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

// =============================================================================
// Content
// =============================================================================

/// Mock content generator returning a fixed phrase pair.
#[derive(Debug)]
pub struct MockContentGenerator {
    control: MockControl,
    content: RwLock<ContentResult>,
}

impl Default for MockContentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContentGenerator {
    pub fn new() -> Self {
        Self {
            control: MockControl::default(),
            content: RwLock::new(super::fixtures::content()),
        }
    }

    /// Set the phrase pair returned by subsequent calls.
    pub async fn set_content(&self, content: ContentResult) {
        *self.content.write().await = content;
    }
}

delegate_control!(MockContentGenerator);

#[async_trait]
impl ContentGenerator for MockContentGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_content(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ContentResult, StageError> {
        self.control.begin(cancel).await?;
        Ok(self.content.read().await.clone())
    }
}

// =============================================================================
// Voice
// =============================================================================

/// Mock voice generator that writes a small file at the requested path.
#[derive(Debug, Default)]
pub struct MockVoiceGenerator {
    control: MockControl,
    texts: RwLock<Vec<String>>,
}

impl MockVoiceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts passed to each call.
    pub async fn recorded_texts(&self) -> Vec<String> {
        self.texts.read().await.clone()
    }
}

delegate_control!(MockVoiceGenerator);

#[async_trait]
impl VoiceGenerator for MockVoiceGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_voice(
        &self,
        text: &str,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<VoiceResult, StageError> {
        self.texts.write().await.push(text.to_string());
        self.control.begin(cancel).await?;
        if text.trim().is_empty() {
            return Err(StageError::InvalidInput("Text is required".to_string()));
        }
        write_artifact(output_path, b"RIFF mock wav").await?;
        Ok(VoiceResult {
            audio_path: output_path.to_path_buf(),
            duration_secs: 3.5,
        })
    }
}

// =============================================================================
// Image
// =============================================================================

/// Mock image generator that writes a small file at the requested path.
#[derive(Debug, Default)]
pub struct MockImageGenerator {
    control: MockControl,
    keywords: RwLock<Vec<Vec<String>>>,
}

impl MockImageGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keywords passed to each call.
    pub async fn recorded_keywords(&self) -> Vec<Vec<String>> {
        self.keywords.read().await.clone()
    }
}

delegate_control!(MockImageGenerator);

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_image(
        &self,
        keywords: &[String],
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ImageResult, StageError> {
        self.keywords.write().await.push(keywords.to_vec());
        self.control.begin(cancel).await?;
        write_artifact(output_path, b"mock jpeg").await?;
        Ok(ImageResult {
            image_path: output_path.to_path_buf(),
            attribution: ImageAttribution {
                photographer: "Mock Photographer".to_string(),
                url: "https://unsplash.com/photos/mock".to_string(),
            },
        })
    }
}

// =============================================================================
// Render
// =============================================================================

/// A recorded render call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRender {
    pub image_path: PathBuf,
    pub audio_path: PathBuf,
    pub text: String,
    pub output_path: PathBuf,
}

/// Mock renderer that writes the output video file.
#[derive(Debug, Default)]
pub struct MockVideoRenderer {
    control: MockControl,
    renders: RwLock<Vec<RecordedRender>>,
}

impl MockVideoRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn recorded_renders(&self) -> Vec<RecordedRender> {
        self.renders.read().await.clone()
    }
}

delegate_control!(MockVideoRenderer);

#[async_trait]
impl VideoRenderer for MockVideoRenderer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render_video(
        &self,
        image_path: &Path,
        audio_path: &Path,
        text: &str,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<RenderResult, StageError> {
        self.renders.write().await.push(RecordedRender {
            image_path: image_path.to_path_buf(),
            audio_path: audio_path.to_path_buf(),
            text: text.to_string(),
            output_path: output_path.to_path_buf(),
        });
        self.control.begin(cancel).await?;
        write_artifact(output_path, b"mock mp4").await?;
        Ok(RenderResult {
            video_path: output_path.to_path_buf(),
            duration_secs: 3.5,
        })
    }
}

// =============================================================================
// Notify
// =============================================================================

/// Mock notifier recording every payload.
#[derive(Debug)]
pub struct MockNotifier {
    control: MockControl,
    payloads: RwLock<Vec<NotificationPayload>>,
    delivered: RwLock<bool>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            control: MockControl::default(),
            payloads: RwLock::new(Vec::new()),
            delivered: RwLock::new(true),
        }
    }

    /// Value returned by successful calls (default: true).
    pub async fn set_delivered(&self, delivered: bool) {
        *self.delivered.write().await = delivered;
    }

    pub async fn recorded_payloads(&self) -> Vec<NotificationPayload> {
        self.payloads.read().await.clone()
    }
}

delegate_control!(MockNotifier);

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn notify(
        &self,
        payload: &NotificationPayload,
        cancel: &CancellationToken,
    ) -> Result<bool, StageError> {
        self.control.begin(cancel).await?;
        self.payloads.write().await.push(payload.clone());
        Ok(*self.delivered.read().await)
    }
}

/// One mock per stage, sharing handles with the [`StageSet`](crate::stages::StageSet)
/// built from it.
#[derive(Debug, Clone, Default)]
pub struct MockStages {
    pub content: Arc<MockContentGenerator>,
    pub voice: Arc<MockVoiceGenerator>,
    pub image: Arc<MockImageGenerator>,
    pub renderer: Arc<MockVideoRenderer>,
    pub notifier: Arc<MockNotifier>,
}

impl MockStages {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stage set backed by these mocks.
    pub fn stage_set(&self) -> crate::stages::StageSet {
        crate::stages::StageSet {
            content: self.content.clone(),
            voice: self.voice.clone(),
            image: self.image.clone(),
            renderer: self.renderer.clone(),
            notifier: self.notifier.clone(),
        }
    }
}
