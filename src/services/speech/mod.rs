// Speech generation module
// Markup builder, speech providers and the per-story speech generator

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use reqwest::Client;
use tokio::sync::mpsc::Sender;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{AssetKind, AssetStatus, ProgressUpdate, Scene};
use crate::services::generation::{
    AssetGenerator, AssetProvider, GenerationJob, ProviderHealth, StatsSnapshot, provider_chain,
};

pub mod azure;
pub mod elevenlabs;
pub mod markup;
pub mod openai;

pub use azure::AzureSpeechProvider;
pub use elevenlabs::ElevenLabsProvider;
pub use markup::{build_markup, flatten_markup};
pub use openai::OpenAiSpeechProvider;

/// Get the speech provider for a configured name
pub fn get_speech_provider(
    name: &str,
    config: &AppConfig,
    client: &Client,
) -> AppResult<Arc<dyn AssetProvider>> {
    let credentials = &config.credentials;
    let missing = |var: &str| AppError::ConfigurationError(format!("{} is not set", var));

    match name {
        openai::PROVIDER_NAME => {
            let key = credentials
                .openai_api_key
                .as_deref()
                .ok_or_else(|| missing("OPENAI_API_KEY"))?;
            Ok(Arc::new(OpenAiSpeechProvider::new(
                client.clone(),
                key,
                config.speech.openai.clone(),
            )))
        }
        elevenlabs::PROVIDER_NAME => {
            let key = credentials
                .elevenlabs_api_key
                .as_deref()
                .ok_or_else(|| missing("ELEVENLABS_API_KEY"))?;
            Ok(Arc::new(ElevenLabsProvider::new(
                client.clone(),
                key,
                config.speech.elevenlabs.clone(),
            )))
        }
        azure::PROVIDER_NAME => {
            let key = credentials
                .azure_speech_key
                .as_deref()
                .ok_or_else(|| missing("AZURE_SPEECH_KEY"))?;
            let region = credentials
                .azure_speech_region
                .as_deref()
                .ok_or_else(|| missing("AZURE_SPEECH_REGION"))?;
            Ok(Arc::new(AzureSpeechProvider::new(
                client.clone(),
                key,
                region,
                config.speech.azure.clone(),
            )))
        }
        _ => Err(AppError::ConfigurationError(format!(
            "Unsupported speech provider: {}",
            name
        ))),
    }
}

/// Builds markup per scene and runs it through the fallback orchestrator
#[derive(Clone)]
pub struct SpeechGenerator {
    inner: AssetGenerator,
}

impl SpeechGenerator {
    pub fn new(providers: Vec<Arc<dyn AssetProvider>>, max_concurrent: usize, provider_timeout: Duration) -> Self {
        Self {
            inner: AssetGenerator::new(AssetKind::Speech, providers, max_concurrent, provider_timeout),
        }
    }

    /// Build the provider chain from configuration, skipping providers that
    /// cannot be created.
    pub fn from_config(config: &AppConfig, client: &Client) -> Self {
        let chain = provider_chain(&config.speech.primary_provider, &config.speech.fallback_providers);
        let providers = chain
            .iter()
            .filter_map(|name| match get_speech_provider(name, config, client) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    warn!("Skipping speech provider '{}': {}", name, e);
                    None
                }
            })
            .collect();

        Self::new(
            providers,
            config.speech.max_concurrent,
            Duration::from_secs(config.speech.provider_timeout_secs),
        )
    }

    /// The exact document that would be submitted for a scene
    pub fn preview_markup(&self, scene: &Scene) -> String {
        build_markup(&scene.narration_text, &scene.narration_tones, scene.scene_number)
    }

    pub async fn generate_scene_audio(&self, scene: &Scene, output_dir: &Path) -> AssetStatus {
        let markup = self.preview_markup(scene);
        self.inner
            .generate_one(&markup, scene.scene_number, output_dir)
            .await
    }

    pub async fn generate_all(
        &self,
        scenes: &[Scene],
        output_dir: &Path,
        progress: Option<Sender<ProgressUpdate>>,
    ) -> Vec<AssetStatus> {
        let jobs = scenes
            .iter()
            .map(|scene| GenerationJob {
                scene_number: scene.scene_number,
                input: self.preview_markup(scene),
            })
            .collect();
        self.inner.generate_batch(jobs, output_dir, progress).await
    }

    pub fn for_new_run(&self) -> Self {
        Self {
            inner: self.inner.for_new_run(),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.inner.provider_names()
    }

    pub async fn health_check(&self) -> Vec<ProviderHealth> {
        self.inner.health_check().await
    }
}
