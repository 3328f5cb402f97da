//! ElevenLabs provider
//!
//! Plain text only. Expressiveness comes from voice settings derived from
//! keyword cues in the text instead of prosody tags.

use log::{debug, info};
use reqwest::Client;
use serde::Serialize;

use super::markup::plain_text;
use crate::config::ElevenLabsConfig;
use crate::models::AssetKind;
use crate::services::generation::{AssetProvider, GeneratedAsset, ProviderFailure, ProviderResult};
use crate::utils::common::truncate_for_log;
use crate::utils::http::{RetryPolicy, send_with_retry};

pub const PROVIDER_NAME: &str = "elevenlabs";
const API_BASE: &str = "https://api.elevenlabs.io/v1/text-to-speech";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.75,
            similarity_boost: 0.85,
            style: 0.5,
            use_speaker_boost: true,
        }
    }
}

/// Derive voice settings from emotional cues in the text.
/// Later cue groups override earlier ones.
pub fn analyze_voice_settings(text: &str) -> VoiceSettings {
    let lower = text.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    let mut settings = VoiceSettings::default();

    if has_any(&["exciting", "amazing", "wonderful"]) {
        settings.style = 0.8;
        settings.stability = 0.6;
    }
    if has_any(&["sad", "crying", "lonely"]) {
        settings.style = 0.3;
        settings.stability = 0.9;
    }
    if has_any(&["scary", "frightening", "dark"]) {
        settings.style = 0.7;
        settings.stability = 0.8;
    }
    settings
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

pub struct ElevenLabsProvider {
    client: Client,
    api_key: String,
    config: ElevenLabsConfig,
    retry: RetryPolicy,
}

impl ElevenLabsProvider {
    pub fn new(client: Client, api_key: &str, config: ElevenLabsConfig) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            config,
            retry: RetryPolicy::default(),
        }
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, String> {
        let voice_settings = analyze_voice_settings(text);
        debug!("ElevenLabs voice settings: {:?}", voice_settings);

        let url = format!("{}/{}", API_BASE, self.config.voice_id);
        let body = SpeechRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings,
        };

        let response = send_with_retry(PROVIDER_NAME, self.retry, || {
            self.client
                .post(&url)
                .header("xi-api-key", &self.api_key)
                .header(reqwest::header::ACCEPT, "audio/mpeg")
                .json(&body)
        })
        .await
        .map_err(|e| e.to_string())?;

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| format!("failed to read audio: {}", e))
    }
}

#[async_trait::async_trait]
impl AssetProvider for ElevenLabsProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> AssetKind {
        AssetKind::Speech
    }

    async fn generate(&self, input: &str, scene_number: u32) -> ProviderResult {
        let text = plain_text(input);
        info!(
            "ElevenLabs request for scene {}: '{}'",
            scene_number,
            truncate_for_log(&text, 80)
        );
        self.synthesize(&text)
            .await
            .map(|bytes| GeneratedAsset::new(bytes, PROVIDER_NAME, Some(self.config.model_id.clone())))
            .map_err(|e| ProviderFailure::new(PROVIDER_NAME, e))
    }
}
