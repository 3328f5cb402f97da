//! Asset and compilation result types
//!
//! Statuses are created by the generators and never mutated afterwards; the
//! validation gate and the compiler only read them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of per-scene asset produced by a generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Speech,
}

impl AssetKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Image => "png",
            Self::Speech => "mp3",
        }
    }

    /// Human readable name used in logs and error messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Speech => "audio",
        }
    }

    /// Deterministic per-scene file name, e.g. `scene_03.png`
    pub fn file_name(&self, scene_number: u32) -> String {
        format!("scene_{:02}.{}", scene_number, self.extension())
    }
}

/// Outcome of generating one asset for one scene
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetStatus {
    scene_number: u32,
    kind: AssetKind,
    generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl AssetStatus {
    pub fn succeeded(
        kind: AssetKind,
        scene_number: u32,
        path: impl Into<PathBuf>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            scene_number,
            kind,
            generated: true,
            path: Some(path.into()),
            provider: Some(provider.into()),
            error_message: None,
        }
    }

    pub fn failed(kind: AssetKind, scene_number: u32, error: impl Into<String>) -> Self {
        Self {
            scene_number,
            kind,
            generated: false,
            path: None,
            provider: None,
            error_message: Some(error.into()),
        }
    }

    pub fn scene_number(&self) -> u32 {
        self.scene_number
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn generated(&self) -> bool {
        self.generated
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// File name of the asset without its directory, for relative references
    pub fn file_name(&self) -> Option<String> {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }
}

/// Find the status for a given scene in a status list
pub fn status_for(statuses: &[AssetStatus], scene_number: u32) -> Option<&AssetStatus> {
    statuses.iter().find(|s| s.scene_number == scene_number)
}

/// Generated/total counters for one asset kind
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KindSummary {
    pub generated: usize,
    pub total: usize,
}

impl KindSummary {
    pub fn from_statuses(statuses: &[AssetStatus]) -> Self {
        Self {
            generated: statuses.iter().filter(|s| s.generated).count(),
            total: statuses.len(),
        }
    }
}

/// Per-kind asset counters reported next to the compiled outputs
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<KindSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<KindSummary>,
}

impl AssetSummary {
    pub fn new(images: Option<&[AssetStatus]>, audio: Option<&[AssetStatus]>) -> Self {
        Self {
            images: images.map(KindSummary::from_statuses),
            audio: audio.map(KindSummary::from_statuses),
        }
    }
}

/// Result of compiling one output format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompiledOutput {
    pub format: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Rendered duration in seconds (video only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl CompiledOutput {
    pub fn success(format: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            format: format.into(),
            success: true,
            output_path: Some(output_path.into()),
            error_message: None,
            duration_secs: None,
        }
    }

    pub fn failure(format: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            success: false,
            output_path: None,
            error_message: Some(error.into()),
            duration_secs: None,
        }
    }

    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }
}

/// Aggregate result of one story compilation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompilationResult {
    /// True when at least one requested format succeeded
    pub success: bool,
    pub output_dir: PathBuf,
    pub outputs: Vec<CompiledOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
    pub asset_summary: AssetSummary,
    /// Set when the run failed before any format could be attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompilationResult {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        outputs: Vec<CompiledOutput>,
        validation_error: Option<String>,
        asset_summary: AssetSummary,
    ) -> Self {
        Self {
            success: outputs.iter().any(|o| o.success),
            output_dir: output_dir.into(),
            outputs,
            validation_error,
            asset_summary,
            error: None,
        }
    }

    /// Result for a run that could not start (e.g. invalid script)
    pub fn aborted(output_dir: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output_dir: output_dir.into(),
            outputs: Vec::new(),
            validation_error: None,
            asset_summary: AssetSummary::default(),
            error: Some(error.into()),
        }
    }

    pub fn output(&self, format: &str) -> Option<&CompiledOutput> {
        self.outputs.iter().find(|o| o.format == format)
    }
}
