use super::{ffmpeg_present, silent_wav, three_scene_story, tiny_png};
use crate::config::VideoConfig;
use crate::models::{AssetKind, AssetStatus};
use crate::services::compiler::VideoAssembler;
use crate::services::compiler::cards::{credits_card, render_card};
use crate::services::compiler::video::TimelineEntry;
use crate::utils::ffmpeg::ffmpeg_has_filter;

fn small_config() -> VideoConfig {
    VideoConfig {
        width: 320,
        height: 240,
        fps: 12,
        ..VideoConfig::default()
    }
}

/// Сцены с озвучкой заданной длины, картинки для всех сцен
fn write_assets(dir: &std::path::Path, durations: &[f64]) -> (Vec<AssetStatus>, Vec<AssetStatus>) {
    let mut images = Vec::new();
    let mut audio = Vec::new();
    for (i, secs) in durations.iter().enumerate() {
        let n = i as u32 + 1;
        let image = dir.join(AssetKind::Image.file_name(n));
        std::fs::write(&image, tiny_png()).unwrap();
        images.push(AssetStatus::succeeded(AssetKind::Image, n, image, "fake"));

        let speech = dir.join(AssetKind::Speech.file_name(n));
        std::fs::write(&speech, silent_wav(*secs)).unwrap();
        audio.push(AssetStatus::succeeded(AssetKind::Speech, n, speech, "fake"));
    }
    (images, audio)
}

#[tokio::test]
async fn test_timeline_duration_is_audio_plus_cards() {
    let dir = tempfile::tempdir().unwrap();
    let durations = [1.0, 1.5, 2.0];
    let (images, audio) = write_assets(dir.path(), &durations);
    let story = three_scene_story();
    let assembler = VideoAssembler::new(small_config());

    let timeline = assembler.plan(&story, "Winter Friends", &images, &audio).await;

    assert_eq!(timeline.scene_numbers(), vec![1, 2, 3]);
    assert!(matches!(timeline.entries.first(), Some(TimelineEntry::Title(_))));
    assert!(matches!(timeline.entries.last(), Some(TimelineEntry::Credits(_))));
    let expected = durations.iter().sum::<f64>() + 3.0 + 2.0;
    assert!(
        (timeline.total_duration() - expected).abs() < 0.01,
        "{} vs {}",
        timeline.total_duration(),
        expected
    );
}

#[tokio::test]
async fn test_timeline_omits_scene_without_assets() {
    let dir = tempfile::tempdir().unwrap();
    let (mut images, audio) = write_assets(dir.path(), &[1.0, 1.0, 1.0]);
    images[1] = AssetStatus::failed(AssetKind::Image, 2, "All image providers failed");
    let config = VideoConfig {
        title_card: false,
        credits_card: false,
        ..small_config()
    };

    let timeline = VideoAssembler::new(config)
        .plan(&three_scene_story(), "T", &images, &audio)
        .await;
    assert_eq!(timeline.scene_numbers(), vec![1, 3]);
    assert!((timeline.total_duration() - 2.0).abs() < 0.01);
}

#[tokio::test]
async fn test_timeline_omits_unreadable_audio() {
    let dir = tempfile::tempdir().unwrap();
    let (images, audio) = write_assets(dir.path(), &[1.0, 1.0, 1.0]);
    std::fs::write(dir.path().join("scene_03.mp3"), b"not audio at all").unwrap();
    let config = VideoConfig {
        title_card: false,
        credits_card: false,
        ..small_config()
    };

    let timeline = VideoAssembler::new(config)
        .plan(&three_scene_story(), "T", &images, &audio)
        .await;
    assert_eq!(timeline.scene_numbers(), vec![1, 2]);
}

/// Полная сборка через ffmpeg; без ffmpeg или drawtext тест пропускается
#[tokio::test]
async fn test_rendered_video_duration_matches_timeline() {
    if !ffmpeg_present() || !ffmpeg_has_filter("drawtext").await {
        eprintln!("ffmpeg with drawtext not found, skipping");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    // drawtext без шрифтов (нет fontconfig) тоже считается недоступным
    let config = small_config();
    let card_check = dir.path().join("card_check.mp4");
    if render_card(&credits_card(&config), &config, dir.path(), "check", &card_check)
        .await
        .is_err()
    {
        eprintln!("drawtext cannot render text here, skipping");
        return;
    }

    let durations = [1.0, 1.5, 1.0];
    let (images, audio) = write_assets(dir.path(), &durations);
    let assembler = VideoAssembler::new(small_config());
    let output = dir.path().join("winter_friends_complete.mp4");

    let rendered = assembler
        .assemble(&three_scene_story(), "Winter Friends", &images, &audio, &output)
        .await
        .unwrap();

    assert!(output.exists());
    assert_eq!(rendered.scenes, vec![1, 2, 3]);
    assert!(rendered.omitted_cards.is_empty(), "{:?}", rendered.omitted_cards);

    let expected = durations.iter().sum::<f64>() + 3.0 + 2.0;
    assert!(
        (rendered.planned_secs - expected).abs() < 0.01,
        "planned {} expected {}",
        rendered.planned_secs,
        expected
    );
    let probed = rendered.probed_secs.expect("ffprobe is available alongside ffmpeg");
    assert!((probed - expected).abs() < 0.5, "probed {} expected {}", probed, expected);
}
