// Configuration module
// Centralized management of application configuration

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

pub mod generation; // Image and speech provider configuration
pub mod output; // Video and compiler configuration

pub use generation::{
    AzureSpeechConfig, ElevenLabsConfig, ImageGenerationConfig, OpenAiImageConfig,
    OpenAiSpeechConfig, SpeechGenerationConfig, StabilityConfig,
};
pub use output::{CompilerConfig, VideoConfig};

// API ключи провайдеров. Никогда не сериализуются, берутся из окружения
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub stability_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub azure_speech_key: Option<String>,
    pub azure_speech_region: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env_value("OPENAI_API_KEY"),
            stability_api_key: env_value("STABILITY_API_KEY"),
            elevenlabs_api_key: env_value("ELEVENLABS_API_KEY"),
            azure_speech_key: env_value("AZURE_SPEECH_KEY"),
            azure_speech_region: env_value("AZURE_SPEECH_REGION"),
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub image: ImageGenerationConfig,
    pub speech: SpeechGenerationConfig,
    pub video: VideoConfig,
    pub compiler: CompilerConfig,
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./generated_stories"),
            image: ImageGenerationConfig::default(),
            speech: SpeechGenerationConfig::default(),
            video: VideoConfig::default(),
            compiler: CompilerConfig::default(),
            credentials: Credentials::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional JSON file, then pick up credentials
    /// from the environment.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    AppError::ConfigurationError(format!(
                        "Failed to read config {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                serde_json::from_str::<AppConfig>(&raw).map_err(|e| {
                    AppError::ConfigurationError(format!("Failed to parse config: {}", e))
                })?
            }
            None => {
                debug!("No config file given, using defaults");
                AppConfig::default()
            }
        };

        config.credentials = Credentials::from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.image.max_concurrent == 0 || self.speech.max_concurrent == 0 {
            return Err(AppError::ConfigurationError(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.image.primary_provider.trim().is_empty()
            || self.speech.primary_provider.trim().is_empty()
        {
            return Err(AppError::ConfigurationError(
                "primary_provider must not be empty".to_string(),
            ));
        }
        if self.video.fps == 0 || self.video.width == 0 || self.video.height == 0 {
            return Err(AppError::ConfigurationError(
                "video fps and resolution must be positive".to_string(),
            ));
        }
        if self.compiler.seconds_per_word <= 0.0 {
            return Err(AppError::ConfigurationError(
                "seconds_per_word must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
