//! Stability AI text-to-image provider (base64 artifacts inline)

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::info;
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::StabilityConfig;
use crate::models::AssetKind;
use crate::services::generation::{AssetProvider, GeneratedAsset, ProviderFailure, ProviderResult};
use crate::utils::common::truncate_for_log;
use crate::utils::http::{RetryPolicy, send_with_retry};

pub const PROVIDER_NAME: &str = "stability";
const API_BASE: &str = "https://api.stability.ai/v1/generation";

/// Decode the first artifact of a text-to-image response
pub fn decode_artifacts(body: &Value) -> Result<Vec<u8>, String> {
    let artifact = body["artifacts"]
        .get(0)
        .ok_or_else(|| "response contains no artifacts".to_string())?;

    if let Some(reason) = artifact["finishReason"].as_str() {
        if reason == "CONTENT_FILTERED" || reason == "ERROR" {
            return Err(format!("generation finished with {}", reason));
        }
    }

    let encoded = artifact["base64"]
        .as_str()
        .ok_or_else(|| "artifact has no base64 payload".to_string())?;
    BASE64
        .decode(encoded)
        .map_err(|e| format!("invalid base64 artifact: {}", e))
}

pub struct StabilityImageProvider {
    client: Client,
    api_key: String,
    config: StabilityConfig,
    retry: RetryPolicy,
}

impl StabilityImageProvider {
    pub fn new(client: Client, api_key: &str, config: StabilityConfig) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            config,
            retry: RetryPolicy::default(),
        }
    }

    fn payload(&self, prompt: &str) -> Value {
        json!({
            "text_prompts": [{"text": prompt, "weight": 1}],
            "cfg_scale": self.config.cfg_scale,
            "height": self.config.height,
            "width": self.config.width,
            "samples": 1,
            "steps": self.config.steps,
            "style_preset": self.config.style_preset,
        })
    }

    async fn request_image(&self, prompt: &str) -> Result<Vec<u8>, String> {
        let url = format!("{}/{}/text-to-image", API_BASE, self.config.engine);
        let payload = self.payload(prompt);

        let response = send_with_retry(PROVIDER_NAME, self.retry, || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .header(reqwest::header::ACCEPT, "application/json")
                .json(&payload)
        })
        .await
        .map_err(|e| e.to_string())?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("invalid JSON response: {}", e))?;
        decode_artifacts(&body)
    }
}

#[async_trait::async_trait]
impl AssetProvider for StabilityImageProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> AssetKind {
        AssetKind::Image
    }

    async fn generate(&self, input: &str, scene_number: u32) -> ProviderResult {
        info!(
            "Stability image request for scene {}: '{}'",
            scene_number,
            truncate_for_log(input, 100)
        );
        self.request_image(input)
            .await
            .map(|bytes| GeneratedAsset::new(bytes, PROVIDER_NAME, Some(self.config.engine.clone())))
            .map_err(|e| ProviderFailure::new(PROVIDER_NAME, e))
    }
}
