use serde::{Deserialize, Serialize};

// Настройки генерации изображений
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImageGenerationConfig {
    // Основной провайдер ("openai" | "stability")
    pub primary_provider: String,
    // Резервные провайдеры в порядке приоритета
    pub fallback_providers: Vec<String>,
    pub max_concurrent: usize,
    pub provider_timeout_secs: u64,
    // Добавлять к промптам указания на единый стиль
    pub enhance_prompts: bool,
    pub openai: OpenAiImageConfig,
    pub stability: StabilityConfig,
}

impl Default for ImageGenerationConfig {
    fn default() -> Self {
        Self {
            primary_provider: "openai".to_string(),
            fallback_providers: Vec::new(),
            max_concurrent: 3,
            provider_timeout_secs: 120,
            enhance_prompts: true,
            openai: OpenAiImageConfig::default(),
            stability: StabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAiImageConfig {
    pub model: String,
    pub size: String,
    pub quality: String,
    pub style: String,
}

impl Default for OpenAiImageConfig {
    fn default() -> Self {
        Self {
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            quality: "hd".to_string(),
            style: "natural".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StabilityConfig {
    pub engine: String,
    pub cfg_scale: f32,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub style_preset: String,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            engine: "stable-diffusion-xl-1024-v1-0".to_string(),
            cfg_scale: 7.0,
            steps: 30,
            width: 1024,
            height: 1024,
            style_preset: "digital-art".to_string(),
        }
    }
}

// Настройки генерации речи
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechGenerationConfig {
    // Основной провайдер ("openai" | "elevenlabs" | "azure")
    pub primary_provider: String,
    pub fallback_providers: Vec<String>,
    pub max_concurrent: usize,
    pub provider_timeout_secs: u64,
    pub openai: OpenAiSpeechConfig,
    pub elevenlabs: ElevenLabsConfig,
    pub azure: AzureSpeechConfig,
}

impl Default for SpeechGenerationConfig {
    fn default() -> Self {
        Self {
            primary_provider: "openai".to_string(),
            fallback_providers: Vec::new(),
            max_concurrent: 2,
            provider_timeout_secs: 120,
            openai: OpenAiSpeechConfig::default(),
            elevenlabs: ElevenLabsConfig::default(),
            azure: AzureSpeechConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAiSpeechConfig {
    pub model: String,
    pub voice: String,
    pub speed: f32,
}

impl Default for OpenAiSpeechConfig {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            voice: "alloy".to_string(), // Default OpenAI voice
            speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ElevenLabsConfig {
    pub voice_id: String,
    pub model_id: String,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AzureSpeechConfig {
    pub voice_name: String,
    pub output_format: String,
}

impl Default for AzureSpeechConfig {
    fn default() -> Self {
        Self {
            voice_name: "en-US-AriaNeural".to_string(),
            output_format: "audio-16khz-128kbitrate-mono-mp3".to_string(),
        }
    }
}
