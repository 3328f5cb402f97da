// Image generation module
// Image providers and the per-story image generator

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

pub mod consistency;
pub mod openai;
pub mod stability;

pub use consistency::{enhance_prompt, optimize_visual_consistency};
pub use openai::OpenAiImageProvider;
pub use stability::StabilityImageProvider;

/// Get the image provider for a configured name
pub fn get_image_provider(
    name: &str,
    config: &AppConfig,
    client: &Client,
) -> AppResult<Arc<dyn AssetProvider>> {
    let credentials = &config.credentials;
    match name {
        openai::PROVIDER_NAME => {
            let key = credentials.openai_api_key.as_deref().ok_or_else(|| {
                AppError::ConfigurationError("OPENAI_API_KEY is not set".to_string())
            })?;
            Ok(Arc::new(OpenAiImageProvider::new(
                client.clone(),
                key,
                config.image.openai.clone(),
                config.image.enhance_prompts,
            )))
        }
        stability::PROVIDER_NAME => {
            let key = credentials.stability_api_key.as_deref().ok_or_else(|| {
                AppError::ConfigurationError("STABILITY_API_KEY is not set".to_string())
            })?;
            Ok(Arc::new(StabilityImageProvider::new(
                client.clone(),
                key,
                config.image.stability.clone(),
            )))
        }
        _ => Err(AppError::ConfigurationError(format!(
            "Unsupported image provider: {}",
            name
        ))),
    }
}

/// Builds the per-story image batch on top of the fallback orchestrator
#[derive(Clone)]
pub struct ImageGenerator {
    inner: AssetGenerator,
    optimize_prompts: bool,
}

impl ImageGenerator {
    pub fn new(providers: Vec<Arc<dyn AssetProvider>>, max_concurrent: usize, provider_timeout: Duration) -> Self {
        Self {
            inner: AssetGenerator::new(AssetKind::Image, providers, max_concurrent, provider_timeout),
            optimize_prompts: false,
        }
    }

    /// Build the provider chain from configuration. Providers that cannot be
    /// created (missing key, unknown name) are skipped with a warning.
    pub fn from_config(config: &AppConfig, client: &Client) -> Self {
        let chain = provider_chain(&config.image.primary_provider, &config.image.fallback_providers);
        let providers = chain
            .iter()
            .filter_map(|name| match get_image_provider(name, config, client) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    warn!("Skipping image provider '{}': {}", name, e);
                    None
                }
            })
            .collect();

        Self::new(
            providers,
            config.image.max_concurrent,
            Duration::from_secs(config.image.provider_timeout_secs),
        )
        .with_prompt_optimization(config.image.enhance_prompts)
    }

    /// Carry the style of the first scene into later prompts
    pub fn with_prompt_optimization(mut self, enabled: bool) -> Self {
        self.optimize_prompts = enabled;
        self
    }

    /// Prompts that will be sent for each scene, in scene order
    pub fn prompts(&self, scenes: &[Scene]) -> Vec<String> {
        if self.optimize_prompts {
            optimize_visual_consistency(scenes)
        } else {
            scenes.iter().map(|s| s.visual_description.clone()).collect()
        }
    }

    pub async fn generate_scene_image(&self, scene: &Scene, output_dir: &Path) -> AssetStatus {
        self.inner
            .generate_one(&scene.visual_description, scene.scene_number, output_dir)
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
            .zip(self.prompts(scenes))
            .map(|(scene, prompt)| GenerationJob {
                scene_number: scene.scene_number,
                input: prompt,
            })
            .collect();
        self.inner.generate_batch(jobs, output_dir, progress).await
    }

    pub fn for_new_run(&self) -> Self {
        Self {
            inner: self.inner.for_new_run(),
            optimize_prompts: self.optimize_prompts,
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
