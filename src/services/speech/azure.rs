//! Azure Speech provider. Accepts the markup document natively.

use log::info;
use reqwest::Client;

use super::markup::speak_body;
use crate::config::AzureSpeechConfig;
use crate::models::AssetKind;
use crate::services::generation::{AssetProvider, GeneratedAsset, ProviderFailure, ProviderResult};
use crate::utils::http::{RetryPolicy, send_with_retry};

pub const PROVIDER_NAME: &str = "azure";

/// Wrap a `<speak>` document in the voice envelope Azure expects
pub fn azure_document(markup: &str, voice_name: &str) -> String {
    format!(
        r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xml:lang="en-US"><voice name="{}">{}</voice></speak>"#,
        voice_name,
        speak_body(markup)
    )
}

pub struct AzureSpeechProvider {
    client: Client,
    api_key: String,
    region: String,
    config: AzureSpeechConfig,
    retry: RetryPolicy,
}

impl AzureSpeechProvider {
    pub fn new(client: Client, api_key: &str, region: &str, config: AzureSpeechConfig) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            region: region.to_string(),
            config,
            retry: RetryPolicy::default(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        )
    }

    async fn synthesize(&self, document: String) -> Result<Vec<u8>, String> {
        let url = self.endpoint();
        let response = send_with_retry(PROVIDER_NAME, self.retry, || {
            self.client
                .post(&url)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .header(reqwest::header::CONTENT_TYPE, "application/ssml+xml")
                .header("X-Microsoft-OutputFormat", &self.config.output_format)
                .header(reqwest::header::USER_AGENT, "storyreel")
                .body(document.clone())
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
impl AssetProvider for AzureSpeechProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> AssetKind {
        AssetKind::Speech
    }

    async fn generate(&self, input: &str, scene_number: u32) -> ProviderResult {
        info!(
            "Azure TTS request for scene {} ({} chars of markup)",
            scene_number,
            input.len()
        );
        let document = azure_document(input, &self.config.voice_name);
        self.synthesize(document)
            .await
            .map(|bytes| GeneratedAsset::new(bytes, PROVIDER_NAME, Some(self.config.voice_name.clone())))
            .map_err(|e| ProviderFailure::new(PROVIDER_NAME, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azure_document_replaces_outer_speak() {
        let doc = azure_document(r#"<speak><break time="1s"/>Hello.</speak>"#, "en-US-AriaNeural");
        assert_eq!(
            doc,
            r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xml:lang="en-US"><voice name="en-US-AriaNeural"><break time="1s"/>Hello.</voice></speak>"#
        );
    }

    #[test]
    fn test_endpoint_uses_region() {
        let provider = AzureSpeechProvider::new(Client::new(), "key", "westeurope", AzureSpeechConfig::default());
        assert_eq!(
            provider.endpoint(),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );
    }
}
