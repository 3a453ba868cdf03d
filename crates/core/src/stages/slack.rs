//! Slack incoming-webhook notifier.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::config::NotifyConfig;
use super::error::StageError;
use super::traits::Notifier;
use super::types::{NotificationPayload, NotificationStatus};

/// Posts Block Kit messages to a Slack webhook.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

#[derive(Debug, Serialize)]
struct SlackMessage {
    blocks: Vec<SlackBlock>,
}

#[derive(Debug, Serialize)]
struct SlackBlock {
    #[serde(rename = "type")]
    block_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<SlackText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elements: Option<Vec<SlackText>>,
}

#[derive(Debug, Serialize)]
struct SlackText {
    #[serde(rename = "type")]
    text_type: &'static str,
    text: String,
}

impl SlackBlock {
    fn header(text: impl Into<String>) -> Self {
        Self {
            block_type: "header",
            text: Some(SlackText {
                text_type: "plain_text",
                text: text.into(),
            }),
            elements: None,
        }
    }

    fn section(markdown: impl Into<String>) -> Self {
        Self {
            block_type: "section",
            text: Some(SlackText {
                text_type: "mrkdwn",
                text: markdown.into(),
            }),
            elements: None,
        }
    }

    fn context(markdown: impl Into<String>) -> Self {
        Self {
            block_type: "context",
            text: None,
            elements: Some(vec![SlackText {
                text_type: "mrkdwn",
                text: markdown.into(),
            }]),
        }
    }
}

fn build_message(payload: &NotificationPayload) -> SlackMessage {
    let header = match payload.status {
        NotificationStatus::Success => "🎥 Video generation completed",
        NotificationStatus::Error => "❌ Video generation failed",
    };

    let mut blocks = vec![SlackBlock::header(header), SlackBlock::section(&payload.message)];

    if let Some(path) = &payload.video_path {
        blocks.push(SlackBlock::section(format!("*Path:* `{}`", path.display())));
    }
    if let Some(attribution) = &payload.image_attribution {
        blocks.push(SlackBlock::context(format!(
            "Photo by <{}|{}> on Unsplash",
            attribution.url, attribution.photographer
        )));
    }

    SlackMessage { blocks }
}

impl SlackNotifier {
    pub fn new(config: NotifyConfig) -> Result<Self, StageError> {
        if config.webhook_url.is_empty() {
            return Err(StageError::NotConfigured(
                "Slack webhook URL is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url,
        })
    }

    async fn post(&self, message: &SlackMessage) -> Result<bool, StageError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StageError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(true)
    }

    /// Reports a failure to the channel. Delivery problems are only logged.
    pub async fn notify_error(&self, message: &str) {
        let payload = NotificationPayload {
            status: NotificationStatus::Error,
            message: format!("*Error:* {}", message),
            video_path: None,
            content: None,
            image_attribution: None,
        };
        match self.post(&build_message(&payload)).await {
            Ok(_) => info!("Sent error notification"),
            Err(e) => error!(error = %e, "Failed to send error notification"),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &str {
        "slack"
    }

    async fn notify(
        &self,
        payload: &NotificationPayload,
        _cancel: &CancellationToken,
    ) -> Result<bool, StageError> {
        let delivered = self.post(&build_message(payload)).await?;
        info!(status = ?payload.status, "Sent Slack notification");
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::types::{ContentResult, ImageAttribution, RenderResult};
    use std::path::PathBuf;

    #[test]
    fn test_new_requires_webhook() {
        let result = SlackNotifier::new(NotifyConfig::default());
        assert!(matches!(result, Err(StageError::NotConfigured(_))));
    }

    #[test]
    fn test_build_success_message() {
        let content = ContentResult::new("Be kind", "親切に");
        let video = RenderResult {
            video_path: PathBuf::from("output/videos/job-1.mp4"),
            duration_secs: 10.0,
        };
        let attribution = ImageAttribution {
            photographer: "Jane".to_string(),
            url: "https://unsplash.com/photos/abc".to_string(),
        };
        let payload = NotificationPayload::video_generated(&content, &video, &attribution);

        let json = serde_json::to_value(build_message(&payload)).unwrap();
        let blocks = json["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0]["type"], "header");
        assert!(blocks[2]["text"]["text"]
            .as_str()
            .unwrap()
            .contains("job-1.mp4"));
        assert_eq!(blocks[3]["type"], "context");
        assert!(blocks[3].get("text").is_none());
    }

    #[test]
    fn test_build_error_message() {
        let payload = NotificationPayload {
            status: NotificationStatus::Error,
            message: "boom".to_string(),
            video_path: None,
            content: None,
            image_attribution: None,
        };
        let json = serde_json::to_value(build_message(&payload)).unwrap();
        assert_eq!(json["blocks"].as_array().unwrap().len(), 2);
        assert!(json["blocks"][0]["text"]["text"]
            .as_str()
            .unwrap()
            .contains("failed"));
    }

    #[tokio::test]
    async fn test_notify_error_swallows_delivery_failure() {
        let notifier = SlackNotifier::new(NotifyConfig {
            webhook_url: "http://127.0.0.1:1/webhook".to_string(),
        })
        .unwrap();

        // Unreachable webhook: logged, not returned.
        notifier.notify_error("render failed").await;
    }

    #[tokio::test]
    async fn test_notify_unreachable_webhook_is_http_error() {
        let notifier = SlackNotifier::new(NotifyConfig {
            webhook_url: "http://127.0.0.1:1/webhook".to_string(),
        })
        .unwrap();
        let payload = NotificationPayload {
            status: NotificationStatus::Success,
            message: "done".to_string(),
            video_path: None,
            content: None,
            image_attribution: None,
        };

        let result = notifier.notify(&payload, &CancellationToken::new()).await;
        assert!(matches!(result, Err(StageError::Http(_))));
    }
}
