//! Validation gate
//!
//! Asset-dependent formats are compiled only when every scene 1..=N has a
//! generated asset of each requested kind and every referenced file is on disk.

use log::{info, warn};

use crate::errors::{AppError, AppResult};
use crate::models::{AssetKind, AssetStatus, status_for};
use crate::utils::common::check_file_exists_and_valid;

/// Scene numbers in 1..=scene_count without a generated status
pub fn missing_scenes(statuses: &[AssetStatus], scene_count: usize) -> Vec<u32> {
    (1..=scene_count as u32)
        .filter(|n| !status_for(statuses, *n).map(|s| s.generated()).unwrap_or(false))
        .collect()
}

fn plural_label(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Image => "images",
        AssetKind::Speech => "audio",
    }
}

/// Check asset completeness for the requested kinds.
///
/// `None` means the kind was not requested and is not checked. All problems
/// are collected into one `ValidationError`.
pub async fn validate_assets(
    scene_count: usize,
    images: Option<&[AssetStatus]>,
    audio: Option<&[AssetStatus]>,
) -> AppResult<()> {
    let mut problems = Vec::new();

    for (kind, statuses) in [(AssetKind::Image, images), (AssetKind::Speech, audio)] {
        let Some(statuses) = statuses else {
            continue;
        };

        let missing = missing_scenes(statuses, scene_count);
        if !missing.is_empty() {
            problems.push(format!(
                "Missing {} for scenes: {:?}",
                plural_label(kind),
                missing
            ));
        }

        for status in statuses.iter().filter(|s| s.generated()) {
            match status.path() {
                Some(path) if check_file_exists_and_valid(path).await => {}
                Some(path) => problems.push(format!(
                    "Asset file not found for scene {}: {}",
                    status.scene_number(),
                    path.display()
                )),
                None => problems.push(format!(
                    "Generated {} for scene {} has no path",
                    kind.label(),
                    status.scene_number()
                )),
            }
        }
    }

    if problems.is_empty() {
        info!("Asset validation passed for {} scenes", scene_count);
        Ok(())
    } else {
        let message = problems.join("; ");
        warn!("Asset validation failed: {}", message);
        Err(AppError::ValidationError(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_scenes() {
        let statuses = vec![
            AssetStatus::succeeded(AssetKind::Image, 1, "/tmp/a.png", "openai"),
            AssetStatus::failed(AssetKind::Image, 2, "All image providers failed"),
        ];
        // scene 3 has no status at all
        assert_eq!(missing_scenes(&statuses, 3), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_passes_with_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("scene_01.png");
        let mp3 = dir.path().join("scene_01.mp3");
        std::fs::write(&img, b"png").unwrap();
        std::fs::write(&mp3, b"mp3").unwrap();

        let images = vec![AssetStatus::succeeded(AssetKind::Image, 1, &img, "openai")];
        let audio = vec![AssetStatus::succeeded(AssetKind::Speech, 1, &mp3, "openai")];
        assert!(validate_assets(1, Some(&images), Some(&audio)).await.is_ok());
    }

    #[tokio::test]
    async fn test_names_missing_scene() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("scene_01.png");
        std::fs::write(&img, b"png").unwrap();

        let images = vec![
            AssetStatus::succeeded(AssetKind::Image, 1, &img, "openai"),
            AssetStatus::failed(AssetKind::Image, 2, "boom"),
        ];
        let err = validate_assets(2, Some(&images), None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Asset validation failed: Missing images for scenes: [2]"
        );
    }

    #[tokio::test]
    async fn test_detects_deleted_file() {
        let dir = tempfile::tempdir().unwrap();
        let mp3 = dir.path().join("scene_01.mp3");
        let audio = vec![AssetStatus::succeeded(AssetKind::Speech, 1, &mp3, "azure")];
        let err = validate_assets(1, None, Some(&audio)).await.unwrap_err();
        assert!(err.to_string().contains("Asset file not found for scene 1"));
    }

    #[tokio::test]
    async fn test_unrequested_kinds_are_ignored() {
        assert!(validate_assets(3, None, None).await.is_ok());
    }
}
