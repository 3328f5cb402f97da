//! Provider contract shared by image and speech backends

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::AssetKind;

/// Input used to probe an image provider
pub const IMAGE_HEALTH_PROMPT: &str = "A simple test image of a red apple on a white background";
/// Input used to probe a speech provider
pub const SPEECH_HEALTH_MARKUP: &str = "<speak>This is a test audio generation.</speak>";

/// Raw asset returned by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAsset {
    pub bytes: Vec<u8>,
    pub provider: String,
    pub model: Option<String>,
}

impl GeneratedAsset {
    pub fn new(bytes: Vec<u8>, provider: impl Into<String>, model: Option<String>) -> Self {
        Self {
            bytes,
            provider: provider.into(),
            model,
        }
    }
}

/// Structured failure reported across the provider boundary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: String,
}

impl ProviderFailure {
    pub fn new(provider: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            provider: provider.into(),
            error: error.to_string(),
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

pub type ProviderResult = Result<GeneratedAsset, ProviderFailure>;

/// Result of probing one provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderHealth {
    pub provider: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Trait that all asset providers must implement
///
/// `input` is a visual prompt for image providers and a markup document for
/// speech providers. Implementations never panic or raise past this boundary:
/// every network or credential problem comes back as a [`ProviderFailure`].
#[async_trait::async_trait]
pub trait AssetProvider: Send + Sync {
    /// Stable identifier used in logs and usage statistics
    fn name(&self) -> &str;

    fn kind(&self) -> AssetKind;

    async fn generate(&self, input: &str, scene_number: u32) -> ProviderResult;

    /// Probe the backend with a fixed test input
    async fn health_check(&self) -> ProviderHealth {
        let input = match self.kind() {
            AssetKind::Image => IMAGE_HEALTH_PROMPT,
            AssetKind::Speech => SPEECH_HEALTH_MARKUP,
        };
        match self.generate(input, 0).await {
            Ok(_) => ProviderHealth {
                provider: self.name().to_string(),
                healthy: true,
                error: None,
            },
            Err(failure) => ProviderHealth {
                provider: self.name().to_string(),
                healthy: false,
                error: Some(failure.error),
            },
        }
    }
}
