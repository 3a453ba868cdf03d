//! OpenRouter-backed content generator.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::ContentConfig;
use super::error::StageError;
use super::traits::ContentGenerator;
use super::types::ContentResult;

const SYSTEM_PROMPT: &str =
    "You are an English learning content creator. Always respond in valid JSON format.";

const USER_PROMPT: &str = r#"Generate a short English phrase and its Japanese translation for givers (altruistic personality type).
Requirements:
- One simple sentence about helping or supporting others
- Length: 15-30 seconds when spoken
- Use intermediate level English
- Keep it positive and encouraging

Respond ONLY with a JSON object in this exact format:
{
  "englishPhrase": "your English phrase here",
  "japaneseTranslation": "Japanese translation here"
}"#;

/// Content generator that asks an OpenRouter chat model for a phrase pair.
pub struct OpenRouterContentGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    referer: Option<String>,
}

impl OpenRouterContentGenerator {
    pub fn new(config: ContentConfig) -> Result<Self, StageError> {
        if config.api_key.is_empty() {
            return Err(StageError::NotConfigured(
                "OpenRouter API key is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key,
            model: config.model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            referer: config.referer,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhrasePair {
    #[serde(default)]
    english_phrase: String,
    #[serde(default)]
    japanese_translation: String,
}

/// Parses the model output, falling back to the first `{...}` block when the
/// model wrapped the JSON in prose or code fences.
fn parse_phrase_pair(raw: &str) -> Result<ContentResult, StageError> {
    let raw = raw.trim();
    let pair: PhrasePair = match serde_json::from_str(raw) {
        Ok(pair) => pair,
        Err(e) => {
            warn!("Failed to parse model output as JSON: {}", e);
            let re = Regex::new(r"(?s)\{.*?\}")
                .map_err(|e| StageError::other(format!("invalid pattern: {}", e)))?;
            let block = re
                .find(raw)
                .ok_or_else(|| StageError::InvalidResponse("Invalid response format".to_string()))?;
            serde_json::from_str(block.as_str())
                .map_err(|e| StageError::InvalidResponse(e.to_string()))?
        }
    };

    let phrase = pair.english_phrase.trim();
    let translation = pair.japanese_translation.trim();
    if phrase.is_empty() || translation.is_empty() {
        return Err(StageError::InvalidResponse(
            "Invalid response format".to_string(),
        ));
    }

    Ok(ContentResult::new(phrase, translation))
}

#[async_trait]
impl ContentGenerator for OpenRouterContentGenerator {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn generate_content(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<ContentResult, StageError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: USER_PROMPT,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        debug!(model = %self.model, "Sending request to OpenRouter");

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request);
        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| StageError::InvalidResponse(e.to_string()))?;

        let raw = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| StageError::InvalidResponse("No choices in response".to_string()))?;

        let content = parse_phrase_pair(&raw)?;
        info!(phrase = %content.phrase, "Generated content");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let result = OpenRouterContentGenerator::new(ContentConfig::default());
        assert!(matches!(result, Err(StageError::NotConfigured(_))));
    }

    #[test]
    fn test_parse_plain_json() {
        let raw = r#"{"englishPhrase": "Kindness is contagious", "japaneseTranslation": "親切はうつる"}"#;
        let content = parse_phrase_pair(raw).unwrap();
        assert_eq!(content.phrase, "Kindness is contagious");
        assert_eq!(content.translation, "親切はうつる");
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let raw = "Sure! Here it is:\n```json\n{\"englishPhrase\": \"Give freely\", \"japaneseTranslation\": \"惜しみなく与えよう\"}\n```";
        let content = parse_phrase_pair(raw).unwrap();
        assert_eq!(content.phrase, "Give freely");
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let raw = r#"{"englishPhrase": "Only English"}"#;
        assert!(matches!(
            parse_phrase_pair(raw),
            Err(StageError::InvalidResponse(_))
        ));
        assert!(parse_phrase_pair("no json here").is_err());
    }
}
