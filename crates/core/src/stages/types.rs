//! Artifacts produced by the pipeline stages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Phrase pair produced by the content stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResult {
    /// Full bilingual text: phrase, blank line, translation.
    pub text: String,
    /// Primary (English) phrase. Spoken by the voice stage.
    pub phrase: String,
    /// Japanese translation of the phrase.
    pub translation: String,
}

impl ContentResult {
    pub fn new(phrase: impl Into<String>, translation: impl Into<String>) -> Self {
        let phrase = phrase.into();
        let translation = translation.into();
        Self {
            text: format!("{}\n\n{}", phrase, translation),
            phrase,
            translation,
        }
    }

    /// Image search keywords: the words of the phrase.
    pub fn keywords(&self) -> Vec<String> {
        self.phrase.split_whitespace().map(str::to_string).collect()
    }
}

/// Audio rendered by the voice stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceResult {
    pub audio_path: PathBuf,
    pub duration_secs: f64,
}

/// Credit for a background image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttribution {
    pub photographer: String,
    pub url: String,
}

/// Background image chosen by the image stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub image_path: PathBuf,
    pub attribution: ImageAttribution,
}

/// Video composited by the render stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    pub video_path: PathBuf,
    pub duration_secs: f64,
}

/// Outcome carried by a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Success,
    Error,
}

/// Message delivered by the notify stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub status: NotificationStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_attribution: Option<ImageAttribution>,
}

impl NotificationPayload {
    /// Payload announcing a freshly rendered video.
    pub fn video_generated(
        content: &ContentResult,
        video: &RenderResult,
        attribution: &ImageAttribution,
    ) -> Self {
        Self {
            status: NotificationStatus::Success,
            message: format!(
                "A new video has been generated!\n\n{}\n{}",
                content.phrase, content.translation
            ),
            video_path: Some(video.video_path.clone()),
            content: Some(content.clone()),
            image_attribution: Some(attribution.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_text_and_keywords() {
        let content = ContentResult::new(
            "Helping others brings joy",
            "人を助けることは喜びをもたらします",
        );
        assert_eq!(
            content.text,
            "Helping others brings joy\n\n人を助けることは喜びをもたらします"
        );
        assert_eq!(content.keywords(), vec!["Helping", "others", "brings", "joy"]);
    }

    #[test]
    fn test_video_generated_payload() {
        let content = ContentResult::new("Be kind", "親切に");
        let video = RenderResult {
            video_path: PathBuf::from("output/videos/job-1.mp4"),
            duration_secs: 12.5,
        };
        let attribution = ImageAttribution {
            photographer: "Jane".to_string(),
            url: "https://unsplash.com/photos/abc".to_string(),
        };

        let payload = NotificationPayload::video_generated(&content, &video, &attribution);
        assert_eq!(payload.status, NotificationStatus::Success);
        assert!(payload.message.ends_with("Be kind\n親切に"));
        assert_eq!(payload.video_path, Some(video.video_path));
        assert_eq!(payload.image_attribution, Some(attribution));
    }
}
