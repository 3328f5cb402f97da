//! # OpenAI TTS provider
//!
//! API OpenAI не понимает SSML, поэтому документ перед отправкой
//! превращается в обычный текст.

use log::info;
use reqwest::Client;
use serde::Serialize;

use super::markup::plain_text;
use crate::config::OpenAiSpeechConfig;
use crate::models::AssetKind;
use crate::services::generation::{AssetProvider, GeneratedAsset, ProviderFailure, ProviderResult};
use crate::utils::common::truncate_for_log;
use crate::utils::http::{RetryPolicy, send_with_retry};

pub const PROVIDER_NAME: &str = "openai";
const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Параметры запроса к API OpenAI TTS
#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'a str,
}

pub struct OpenAiSpeechProvider {
    client: Client,
    api_key: String,
    config: OpenAiSpeechConfig,
    retry: RetryPolicy,
}

impl OpenAiSpeechProvider {
    pub fn new(client: Client, api_key: &str, config: OpenAiSpeechConfig) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            config,
            retry: RetryPolicy::default(),
        }
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, String> {
        let request_body = TtsRequest {
            model: &self.config.model,
            input: text,
            voice: &self.config.voice,
            speed: self.config.speed,
            response_format: "mp3",
        };

        let response = send_with_retry(PROVIDER_NAME, self.retry, || {
            self.client
                .post(SPEECH_URL)
                .bearer_auth(&self.api_key)
                .json(&request_body)
        })
        .await
        .map_err(|e| e.to_string())?;

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| format!("failed to read audio: {}", e))?
            .to_vec();
        info!("Received {} bytes of audio from OpenAI TTS", audio_data.len());
        Ok(audio_data)
    }
}

#[async_trait::async_trait]
impl AssetProvider for OpenAiSpeechProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> AssetKind {
        AssetKind::Speech
    }

    async fn generate(&self, input: &str, scene_number: u32) -> ProviderResult {
        let text = plain_text(input);
        info!(
            "OpenAI TTS request for scene {}: '{}'",
            scene_number,
            truncate_for_log(&text, 80)
        );
        self.synthesize(&text)
            .await
            .map(|bytes| GeneratedAsset::new(bytes, PROVIDER_NAME, Some(self.config.model.clone())))
            .map_err(|e| ProviderFailure::new(PROVIDER_NAME, e))
    }
}
