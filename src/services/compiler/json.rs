//! JSON manifest: metadata, the full script and per-scene asset statuses.

use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{AssetKind, AssetStatus, AssetSummary, Story};

pub const ENGINE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize)]
pub struct ManifestMetadata {
    pub title: String,
    pub created_at: String,
    pub story_engine_version: String,
    pub scene_count: usize,
    /// Estimated from word counts, seconds
    pub total_duration: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestAsset {
    pub scene_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<&AssetStatus> for ManifestAsset {
    fn from(status: &AssetStatus) -> Self {
        Self {
            scene_number: status.scene_number(),
            path: status.path().map(Path::to_path_buf),
            generated: status.generated(),
            provider: status.provider().map(str::to_string),
            error_message: status.error_message().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestAssets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ManifestAsset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Vec<ManifestAsset>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompilationInfo {
    pub compilation_id: String,
    pub formats: Vec<String>,
    pub validation_passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryManifest<'a> {
    pub metadata: ManifestMetadata,
    pub story: &'a Story,
    pub assets: ManifestAssets,
    pub asset_summary: AssetSummary,
    pub compilation_info: CompilationInfo,
}

/// Inputs shared by the asset-aware formats
pub struct ManifestInput<'a> {
    pub story: &'a Story,
    pub title: &'a str,
    pub images: Option<&'a [AssetStatus]>,
    pub audio: Option<&'a [AssetStatus]>,
    pub formats: Vec<String>,
    pub validation_error: Option<String>,
    pub estimated_duration: f64,
}

fn manifest_assets(statuses: Option<&[AssetStatus]>, kind: AssetKind) -> Option<Vec<ManifestAsset>> {
    statuses.map(|list| {
        let mut assets: Vec<ManifestAsset> = list
            .iter()
            .filter(|s| s.kind() == kind)
            .map(ManifestAsset::from)
            .collect();
        assets.sort_by_key(|a| a.scene_number);
        assets
    })
}

pub fn build_manifest<'a>(input: &ManifestInput<'a>) -> StoryManifest<'a> {
    StoryManifest {
        metadata: ManifestMetadata {
            title: input.title.to_string(),
            created_at: Utc::now().to_rfc3339(),
            story_engine_version: ENGINE_VERSION.to_string(),
            scene_count: input.story.scene_count(),
            total_duration: input.estimated_duration,
        },
        story: input.story,
        assets: ManifestAssets {
            images: manifest_assets(input.images, AssetKind::Image),
            audio: manifest_assets(input.audio, AssetKind::Speech),
        },
        asset_summary: AssetSummary::new(input.images, input.audio),
        compilation_info: CompilationInfo {
            compilation_id: Uuid::new_v4().to_string(),
            formats: input.formats.clone(),
            validation_passed: input.validation_error.is_none(),
            validation_error: input.validation_error.clone(),
        },
    }
}

/// Write `<title>_package.json` into `output_dir`
pub async fn write_manifest(input: &ManifestInput<'_>, output_dir: &Path, file_stem: &str) -> AppResult<PathBuf> {
    let manifest = build_manifest(input);
    let path = output_dir.join(format!("{}_package.json", file_stem));
    let body = serde_json::to_string_pretty(&manifest)?;
    tokio::fs::write(&path, body).await?;
    info!("JSON manifest written to {}", path.display());
    Ok(path)
}
