use std::time::Duration;

use super::{FakeProvider, ffmpeg_present, three_scene_story};
use crate::config::AppConfig;
use crate::models::{AssetKind, ProgressUpdate, Story};
use crate::services::StoryPipeline;
use crate::services::image::ImageGenerator;
use crate::services::speech::SpeechGenerator;
use crate::utils::common::sanitize_filename;

fn test_config(output_dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.output_dir = output_dir.to_path_buf();
    config.video.width = 320;
    config.video.height = 240;
    config.video.fps = 12;
    config
}

fn pipeline(config: AppConfig, image_fail_scenes: &[u32]) -> StoryPipeline {
    let images = ImageGenerator::new(
        vec![
            FakeProvider::new("painter", AssetKind::Image)
                .failing_for(image_fail_scenes)
                .shared(),
            FakeProvider::new("backup-painter", AssetKind::Image)
                .failing_for(image_fail_scenes)
                .shared(),
        ],
        config.image.max_concurrent,
        Duration::from_secs(10),
    );
    let speech = SpeechGenerator::new(
        vec![
            FakeProvider::new("narrator", AssetKind::Speech)
                .with_audio_secs(1.0)
                .shared(),
        ],
        config.speech.max_concurrent,
        Duration::from_secs(10),
    );
    StoryPipeline::new(config, images, speech)
}

fn formats(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_end_to_end_all_assets_succeed() {
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline(test_config(root.path()), &[]);
    let requested = if ffmpeg_present() {
        formats(&["json", "html", "video"])
    } else {
        formats(&["json", "html"])
    };

    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let report = pipeline
        .run_with_report(&three_scene_story(), "Winter Friends", &requested, Some(tx))
        .await;
    let result = &report.result;

    assert!(result.success);
    assert_eq!(result.outputs.len(), requested.len());
    assert!(result.outputs.iter().all(|o| o.success), "{:?}", result.outputs);
    assert!(result.validation_error.is_none());

    let dir = root.path().join("winter_friends");
    assert_eq!(result.output_dir, dir);
    for n in 1..=3 {
        assert!(dir.join(format!("scene_{:02}.png", n)).exists());
        assert!(dir.join(format!("scene_{:02}.mp3", n)).exists());
    }
    assert!(dir.join("winter_friends_package.json").exists());
    assert!(dir.join("winter_friends_interactive.html").exists());
    if ffmpeg_present() {
        assert!(dir.join("winter_friends_complete.mp4").exists());
        assert!(result.output("video").unwrap().duration_secs.is_some());
    }

    assert_eq!(report.image_stats.usage("painter"), 3);
    assert_eq!(report.speech_stats.successful, 3);
    assert_eq!(report.compiler_stats.successful, requested.len());

    let mut updates = Vec::new();
    while let Some(update) = rx.recv().await {
        updates.push(update);
    }
    assert_eq!(updates.first(), Some(&ProgressUpdate::Started { scenes: 3 }));
    assert_eq!(updates.last(), Some(&ProgressUpdate::Completed { success: true }));
    let assets_done = updates
        .iter()
        .filter(|u| matches!(u, ProgressUpdate::AssetFinished { .. }))
        .count();
    assert_eq!(assets_done, 6);
}

/// Картинка второй сцены не генерируется ни одним провайдером
#[tokio::test]
async fn test_end_to_end_scene_two_image_fails() {
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline(test_config(root.path()), &[2]);

    let result = pipeline
        .run(
            &three_scene_story(),
            "Winter Friends",
            &formats(&["json", "html", "video"]),
            None,
        )
        .await;

    assert!(result.success);

    let video = result.output("video").unwrap();
    assert!(!video.success);
    assert!(video.error_message.as_ref().unwrap().contains("[2]"));

    let html = result.output("html").unwrap();
    assert!(html.success);
    let page = std::fs::read_to_string(html.output_path.as_ref().unwrap()).unwrap();
    assert!(page.contains("scene_01.png"));
    assert!(!page.contains("scene_02.png"));

    let json = result.output("json").unwrap();
    assert!(json.success);
    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json.output_path.as_ref().unwrap()).unwrap()).unwrap();
    let scene_two = &manifest["assets"]["images"][1];
    assert_eq!(scene_two["scene_number"], 2);
    assert_eq!(scene_two["generated"], false);
    assert!(scene_two["error_message"].as_str().unwrap().contains("All image providers failed"));

    let summary = result.asset_summary.images.unwrap();
    assert_eq!((summary.generated, summary.total), (2, 3));
}

#[tokio::test]
async fn test_invalid_story_is_rejected_before_generation() {
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline(test_config(root.path()), &[]);
    let empty = Story {
        story_summary: "Nothing".to_string(),
        scenes: Vec::new(),
        metadata: None,
    };

    let report = pipeline.run_with_report(&empty, "Empty", &formats(&["json"]), None).await;
    assert!(!report.result.success);
    assert!(report.result.outputs.is_empty());
    assert!(report.result.error.as_ref().unwrap().contains("no scenes"));
    assert_eq!(report.image_stats.total, 0);
    assert!(!root.path().join("empty").exists());
}

#[test]
fn test_story_dir_uses_sanitized_title() {
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline(test_config(root.path()), &[]);
    assert_eq!(
        pipeline.story_dir("The Fox & The Hound!"),
        root.path().join(sanitize_filename("The Fox & The Hound!"))
    );
}

#[test]
fn test_concurrent_runs_keep_separate_statistics() {
    tokio_test::block_on(async {
        let root = tempfile::tempdir().unwrap();
        let pipeline = pipeline(test_config(root.path()), &[]);
        let story = three_scene_story();
        let requested = formats(&["json"]);

        let (a, b) = tokio::join!(
            pipeline.run_with_report(&story, "First Tale", &requested, None),
            pipeline.run_with_report(&story, "Second Tale", &requested, None),
        );
        assert_eq!(a.image_stats.total, 3);
        assert_eq!(b.image_stats.total, 3);
        assert!(root.path().join("first_tale").join("first_tale_package.json").exists());
        assert!(root.path().join("second_tale").join("second_tale_package.json").exists());
    });
}
