//! Unsplash-backed background image picker.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::config::ImageConfig;
use super::error::StageError;
use super::traits::ImageGenerator;
use super::types::{ImageAttribution, ImageResult};

/// Image generator that searches Unsplash for portrait photos.
pub struct UnsplashImageGenerator {
    client: reqwest::Client,
    access_key: String,
    base_url: String,
    max_aspect_ratio: f64,
}

impl UnsplashImageGenerator {
    pub fn new(config: ImageConfig) -> Result<Self, StageError> {
        if config.access_key.is_empty() {
            return Err(StageError::NotConfigured(
                "Unsplash access key is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            access_key: config.access_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_aspect_ratio: config.max_aspect_ratio,
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<UnsplashPhoto>, StageError> {
        let response = self
            .client
            .get(format!("{}/search/photos", self.base_url))
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .query(&[("query", query), ("orientation", "portrait")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let search: UnsplashSearchResponse = response.json().await.map_err(|e| {
            StageError::InvalidResponse(format!("Failed to parse photo search response: {}", e))
        })?;

        Ok(search.results)
    }

    async fn download(&self, url: &str, output_path: &Path) -> Result<(), StageError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StageError::Api {
                status: status.as_u16(),
                message: format!("Failed to download {}", url),
            });
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(output_path, &bytes).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct UnsplashSearchResponse {
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Clone, Deserialize)]
struct UnsplashPhoto {
    width: u32,
    height: u32,
    urls: UnsplashUrls,
    links: UnsplashLinks,
    user: UnsplashUser,
}

#[derive(Debug, Clone, Deserialize)]
struct UnsplashUrls {
    regular: String,
}

#[derive(Debug, Clone, Deserialize)]
struct UnsplashLinks {
    html: String,
}

#[derive(Debug, Clone, Deserialize)]
struct UnsplashUser {
    name: String,
}

/// First photo narrow enough for a vertical video.
fn pick_photo(photos: &[UnsplashPhoto], max_aspect_ratio: f64) -> Option<&UnsplashPhoto> {
    photos
        .iter()
        .find(|p| p.height > 0 && (p.width as f64 / p.height as f64) <= max_aspect_ratio)
}

#[async_trait]
impl ImageGenerator for UnsplashImageGenerator {
    fn name(&self) -> &str {
        "unsplash"
    }

    async fn generate_image(
        &self,
        keywords: &[String],
        output_path: &Path,
        _cancel: &CancellationToken,
    ) -> Result<ImageResult, StageError> {
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let query = keywords.join(" ");
        debug!(query = %query, "Searching Unsplash");

        let photos = self.search(&query).await?;
        if photos.is_empty() {
            return Err(StageError::NotFound("No images found".to_string()));
        }

        let photo = pick_photo(&photos, self.max_aspect_ratio).ok_or_else(|| {
            StageError::NotFound(
                "Image aspect ratio is not suitable for vertical video".to_string(),
            )
        })?;

        self.download(&photo.urls.regular, output_path).await?;
        info!(
            path = %output_path.display(),
            photographer = %photo.user.name,
            "Downloaded background image"
        );

        Ok(ImageResult {
            image_path: output_path.to_path_buf(),
            attribution: ImageAttribution {
                photographer: photo.user.name.clone(),
                url: photo.links.html.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(width: u32, height: u32, name: &str) -> UnsplashPhoto {
        UnsplashPhoto {
            width,
            height,
            urls: UnsplashUrls {
                regular: format!("https://images.unsplash.com/{}", name),
            },
            links: UnsplashLinks {
                html: format!("https://unsplash.com/photos/{}", name),
            },
            user: UnsplashUser {
                name: name.to_string(),
            },
        }
    }

    #[test]
    fn test_new_requires_access_key() {
        let result = UnsplashImageGenerator::new(ImageConfig::default());
        assert!(matches!(result, Err(StageError::NotConfigured(_))));
    }

    #[test]
    fn test_pick_photo_skips_landscape() {
        let photos = vec![photo(4000, 3000, "wide"), photo(3000, 6000, "tall")];
        let picked = pick_photo(&photos, 0.6).unwrap();
        assert_eq!(picked.user.name, "tall");
    }

    #[test]
    fn test_pick_photo_none_suitable() {
        let photos = vec![photo(4000, 3000, "wide"), photo(100, 0, "broken")];
        assert!(pick_photo(&photos, 0.6).is_none());
    }

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{
            "total": 1,
            "results": [{
                "id": "abc",
                "width": 3000,
                "height": 6000,
                "urls": {"regular": "https://images.unsplash.com/abc"},
                "links": {"html": "https://unsplash.com/photos/abc"},
                "user": {"name": "Jane Doe"}
            }]
        }"#;
        let parsed: UnsplashSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].user.name, "Jane Doe");
    }
}
