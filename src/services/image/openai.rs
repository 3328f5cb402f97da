//! # OpenAI image provider
//!
//! DALL-E отвечает ссылкой на картинку (или base64, если так запрошено),
//! ссылку нужно отдельно скачать.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, info};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::consistency::enhance_prompt;
use crate::config::OpenAiImageConfig;
use crate::models::AssetKind;
use crate::services::generation::{AssetProvider, GeneratedAsset, ProviderFailure, ProviderResult};
use crate::utils::common::truncate_for_log;
use crate::utils::http::{RetryPolicy, send_with_retry};

pub const PROVIDER_NAME: &str = "openai";
const IMAGES_URL: &str = "https://api.openai.com/v1/images/generations";

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    style: &'a str,
    n: u32,
}

/// Where the generated image can be found
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    Url(String),
    Inline(Vec<u8>),
}

/// Read `data[0]` of an images API response
pub fn parse_image_response(body: &Value) -> Result<ImagePayload, String> {
    let first = body["data"]
        .get(0)
        .ok_or_else(|| "response contains no images".to_string())?;

    if let Some(url) = first["url"].as_str() {
        return Ok(ImagePayload::Url(url.to_string()));
    }
    if let Some(encoded) = first["b64_json"].as_str() {
        return BASE64
            .decode(encoded)
            .map(ImagePayload::Inline)
            .map_err(|e| format!("invalid base64 image data: {}", e));
    }
    Err("image entry has neither url nor b64_json".to_string())
}

pub struct OpenAiImageProvider {
    client: Client,
    api_key: String,
    config: OpenAiImageConfig,
    enhance_prompts: bool,
    retry: RetryPolicy,
}

impl OpenAiImageProvider {
    pub fn new(client: Client, api_key: &str, config: OpenAiImageConfig, enhance_prompts: bool) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            config,
            enhance_prompts,
            retry: RetryPolicy::default(),
        }
    }

    async fn request_image(&self, prompt: &str) -> Result<Vec<u8>, String> {
        let body = ImageRequest {
            model: &self.config.model,
            prompt,
            size: &self.config.size,
            quality: &self.config.quality,
            style: &self.config.style,
            n: 1,
        };

        let response = send_with_retry(PROVIDER_NAME, self.retry, || {
            self.client
                .post(IMAGES_URL)
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await
        .map_err(|e| e.to_string())?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| format!("invalid JSON response: {}", e))?;

        match parse_image_response(&json)? {
            ImagePayload::Inline(bytes) => Ok(bytes),
            ImagePayload::Url(url) => {
                debug!("Downloading generated image from {}", truncate_for_log(&url, 80));
                let download = send_with_retry(PROVIDER_NAME, self.retry, || self.client.get(&url))
                    .await
                    .map_err(|e| format!("image download failed: {}", e))?;
                download
                    .bytes()
                    .await
                    .map(|b| b.to_vec())
                    .map_err(|e| format!("image download failed: {}", e))
            }
        }
    }
}

#[async_trait::async_trait]
impl AssetProvider for OpenAiImageProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> AssetKind {
        AssetKind::Image
    }

    async fn generate(&self, input: &str, scene_number: u32) -> ProviderResult {
        let prompt = if self.enhance_prompts && scene_number > 0 {
            enhance_prompt(input, scene_number)
        } else {
            input.to_string()
        };
        info!(
            "OpenAI image request for scene {}: '{}'",
            scene_number,
            truncate_for_log(&prompt, 100)
        );

        self.request_image(&prompt)
            .await
            .map(|bytes| GeneratedAsset::new(bytes, PROVIDER_NAME, Some(self.config.model.clone())))
            .map_err(|e| ProviderFailure::new(PROVIDER_NAME, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_url_response() {
        let body = json!({"created": 1, "data": [{"url": "https://img.example/1.png", "revised_prompt": "x"}]});
        assert_eq!(
            parse_image_response(&body),
            Ok(ImagePayload::Url("https://img.example/1.png".to_string()))
        );
    }

    #[test]
    fn test_parse_inline_response() {
        let body = json!({"data": [{"b64_json": BASE64.encode(b"png-bytes")}]});
        assert_eq!(
            parse_image_response(&body),
            Ok(ImagePayload::Inline(b"png-bytes".to_vec()))
        );
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(parse_image_response(&json!({"data": []})).is_err());
        assert!(parse_image_response(&json!({"error": {"message": "bad"}})).is_err());
    }
}
