//! # Video timeline assembler
//!
//! Для каждой сцены: длительность берётся из озвучки, картинка держится
//! ровно столько же с плавным линейным приближением, звук накладывается
//! на клип. Клипы склеиваются по порядку номеров сцен, в начале и конце
//! опционально стоят титульная карточка и титры.
//!
//! Сцена, клип которой не удалось собрать, просто выпадает из таймлайна.
//! Пустой таймлайн означает провал сборки видео.

use std::path::{Path, PathBuf};

use log::{error, info, warn};

use super::cards::{CardSpec, credits_card, render_card, title_card};
use crate::config::VideoConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{AssetStatus, Story, status_for};
use crate::services::audio::get_audio_duration;
use crate::utils::ffmpeg::{probe_duration, run_ffmpeg_command};

/// One scene in the timeline, with its measured audio duration
#[derive(Debug, Clone, PartialEq)]
pub struct SceneClip {
    pub scene_number: u32,
    pub image: PathBuf,
    pub audio: PathBuf,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEntry {
    Title(CardSpec),
    Scene(SceneClip),
    Credits(CardSpec),
}

impl TimelineEntry {
    pub fn duration_secs(&self) -> f64 {
        match self {
            Self::Title(card) | Self::Credits(card) => card.duration_secs,
            Self::Scene(clip) => clip.duration_secs,
        }
    }
}

/// Ordered list of segments making up the final video
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoTimeline {
    pub entries: Vec<TimelineEntry>,
}

impl VideoTimeline {
    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(TimelineEntry::duration_secs).sum()
    }

    pub fn scene_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, TimelineEntry::Scene(_)))
            .count()
    }

    pub fn scene_numbers(&self) -> Vec<u32> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                TimelineEntry::Scene(clip) => Some(clip.scene_number),
                _ => None,
            })
            .collect()
    }
}

/// What was actually written
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedVideo {
    pub path: PathBuf,
    /// Sum of the segments that made it into the file
    pub planned_secs: f64,
    /// Duration reported by the container, when it could be probed
    pub probed_secs: Option<f64>,
    pub scenes: Vec<u32>,
    /// Cards that failed to render and were left out
    pub omitted_cards: Vec<&'static str>,
}

impl RenderedVideo {
    pub fn duration_secs(&self) -> f64 {
        self.probed_secs.unwrap_or(self.planned_secs)
    }
}

/// zoompan expression for a linear zoom of `zoom_factor` over `frames` frames
pub fn zoom_expression(zoom_factor: f64, frames: u64) -> String {
    format!("1+{}*on/{}", zoom_factor, frames.max(1))
}

pub struct VideoAssembler {
    config: VideoConfig,
}

impl VideoAssembler {
    pub fn new(config: VideoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VideoConfig {
        &self.config
    }

    /// Build the timeline: scenes in ascending number order with measured
    /// durations, cards as configured. Scenes without usable assets are
    /// left out.
    pub async fn plan(
        &self,
        story: &Story,
        title: &str,
        images: &[AssetStatus],
        audio: &[AssetStatus],
    ) -> VideoTimeline {
        let mut scenes: Vec<_> = story.scenes.iter().collect();
        scenes.sort_by_key(|s| s.scene_number);

        let mut entries = Vec::with_capacity(scenes.len() + 2);
        if self.config.title_card {
            entries.push(TimelineEntry::Title(title_card(&self.config, title, &story.story_summary)));
        }

        for scene in scenes {
            let n = scene.scene_number;
            let image = status_for(images, n).filter(|s| s.generated()).and_then(|s| s.path());
            let audio_path = status_for(audio, n).filter(|s| s.generated()).and_then(|s| s.path());
            let (Some(image), Some(audio_path)) = (image, audio_path) else {
                warn!("Scene {}: missing image or audio, leaving it out of the video", n);
                continue;
            };

            match get_audio_duration(audio_path).await {
                Ok(duration) => entries.push(TimelineEntry::Scene(SceneClip {
                    scene_number: n,
                    image: image.to_path_buf(),
                    audio: audio_path.to_path_buf(),
                    duration_secs: duration,
                })),
                Err(e) => error!("Scene {}: cannot read audio duration: {}", n, e),
            }
        }

        if self.config.credits_card {
            entries.push(TimelineEntry::Credits(credits_card(&self.config)));
        }

        VideoTimeline { entries }
    }

    /// ffmpeg arguments for one scene clip
    pub fn scene_clip_args(&self, clip: &SceneClip, output: &Path) -> Vec<String> {
        let (w, h, fps) = (self.config.width, self.config.height, self.config.fps);
        let frames = (clip.duration_secs * fps as f64).ceil() as u64;
        let filter = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1,\
             zoompan=z='{zoom}':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s={w}x{h}:fps={fps},\
             format=yuv420p",
            w = w,
            h = h,
            fps = fps,
            zoom = zoom_expression(self.config.zoom_factor, frames)
        );
        let duration = format!("{:.3}", clip.duration_secs);

        vec![
            "-y".to_string(),
            "-loop".to_string(),
            "1".to_string(),
            "-framerate".to_string(),
            fps.to_string(),
            "-i".to_string(),
            clip.image.to_string_lossy().to_string(),
            "-i".to_string(),
            clip.audio.to_string_lossy().to_string(),
            "-vf".to_string(),
            filter,
            "-map".to_string(),
            "0:v".to_string(),
            "-map".to_string(),
            "1:a".to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "medium".to_string(),
            "-tune".to_string(),
            "stillimage".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            fps.to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            "192k".to_string(),
            "-ar".to_string(),
            "44100".to_string(),
            "-ac".to_string(),
            "2".to_string(),
            "-t".to_string(),
            duration,
            output.to_string_lossy().to_string(),
        ]
    }

    /// Render every timeline entry to its own segment and concatenate them.
    pub async fn render(&self, timeline: &VideoTimeline, output_path: &Path) -> AppResult<RenderedVideo> {
        if timeline.scene_count() == 0 {
            return Err(AppError::VideoProcessingError(
                "No valid scene clips could be created".to_string(),
            ));
        }

        let work_dir = tempfile::tempdir()?;
        let mut segments: Vec<PathBuf> = Vec::with_capacity(timeline.entries.len());
        let mut planned_secs = 0.0;
        let mut scenes = Vec::new();
        let mut omitted_cards = Vec::new();

        for (i, entry) in timeline.entries.iter().enumerate() {
            let segment = work_dir.path().join(format!("segment_{:03}.mp4", i));
            let result = match entry {
                TimelineEntry::Title(card) => {
                    render_card(card, &self.config, work_dir.path(), "title", &segment).await
                }
                TimelineEntry::Credits(card) => {
                    render_card(card, &self.config, work_dir.path(), "credits", &segment).await
                }
                TimelineEntry::Scene(clip) => {
                    info!(
                        "Rendering scene {} clip ({:.2}s)",
                        clip.scene_number, clip.duration_secs
                    );
                    run_ffmpeg_command(&self.scene_clip_args(clip, &segment)).await
                }
            };

            match result {
                Ok(()) => {
                    planned_secs += entry.duration_secs();
                    if let TimelineEntry::Scene(clip) = entry {
                        scenes.push(clip.scene_number);
                    }
                    segments.push(segment);
                }
                Err(e) => match entry {
                    TimelineEntry::Scene(clip) => {
                        error!("Scene {}: clip construction failed, omitting: {}", clip.scene_number, e)
                    }
                    TimelineEntry::Title(_) => {
                        warn!("Title card rendering failed, continuing without it: {}", e);
                        omitted_cards.push("title");
                    }
                    TimelineEntry::Credits(_) => {
                        warn!("Credits card rendering failed, continuing without it: {}", e);
                        omitted_cards.push("credits");
                    }
                },
            }
        }

        if scenes.is_empty() {
            return Err(AppError::VideoProcessingError(
                "No valid scene clips could be created".to_string(),
            ));
        }

        self.concatenate(&segments, work_dir.path(), output_path).await?;

        let probed_secs = match probe_duration(output_path).await {
            Ok(d) => Some(d),
            Err(e) => {
                warn!("Could not probe rendered video duration: {}", e);
                None
            }
        };

        info!(
            "Video written to {} ({} scenes, {:.2}s)",
            output_path.display(),
            scenes.len(),
            probed_secs.unwrap_or(planned_secs)
        );

        Ok(RenderedVideo {
            path: output_path.to_path_buf(),
            planned_secs,
            probed_secs,
            scenes,
            omitted_cards,
        })
    }

    async fn concatenate(&self, segments: &[PathBuf], work_dir: &Path, output_path: &Path) -> AppResult<()> {
        let list_path = work_dir.join("segments.txt");
        let list: String = segments
            .iter()
            .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', r"'\''")))
            .collect();
        tokio::fs::write(&list_path, list).await?;

        let args = vec![
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list_path.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output_path.to_string_lossy().to_string(),
        ];
        run_ffmpeg_command(&args).await
    }

    /// Plan and render the video for a story
    pub async fn assemble(
        &self,
        story: &Story,
        title: &str,
        images: &[AssetStatus],
        audio: &[AssetStatus],
        output_path: &Path,
    ) -> AppResult<RenderedVideo> {
        let timeline = self.plan(story, title, images, audio).await;
        info!(
            "Video timeline: {} scenes, {:.2}s planned",
            timeline.scene_count(),
            timeline.total_duration()
        );
        self.render(&timeline, output_path).await
    }
}
