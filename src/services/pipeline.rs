//! # Story pipeline
//!
//! Один прогон для одной истории: проверка сценария, параллельная генерация
//! картинок и озвучки, затем компиляция запрошенных форматов.
//!
//! Статистика генерации заводится заново на каждый прогон, так что
//! несколько историй можно обрабатывать одновременно на одном пайплайне.

use std::path::PathBuf;

use log::{error, info};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc::Sender;

use crate::config::AppConfig;
use crate::models::{CompilationResult, ProgressUpdate, Story};
use crate::services::compiler::{CompilationStatsSnapshot, CompileRequest, FormatCompiler};
use crate::services::generation::StatsSnapshot;
use crate::services::image::ImageGenerator;
use crate::services::speech::SpeechGenerator;
use crate::utils::common::sanitize_filename;

/// Compilation result plus the counters of the run that produced it
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub result: CompilationResult,
    pub image_stats: StatsSnapshot,
    pub speech_stats: StatsSnapshot,
    pub compiler_stats: CompilationStatsSnapshot,
}

pub struct StoryPipeline {
    config: AppConfig,
    images: ImageGenerator,
    speech: SpeechGenerator,
}

impl StoryPipeline {
    pub fn new(config: AppConfig, images: ImageGenerator, speech: SpeechGenerator) -> Self {
        Self { config, images, speech }
    }

    /// Providers are built from configuration and credentials
    pub fn from_config(config: AppConfig) -> Self {
        let client = Client::new();
        let images = ImageGenerator::from_config(&config, &client);
        let speech = SpeechGenerator::from_config(&config, &client);
        info!(
            "Pipeline ready: image providers {:?}, speech providers {:?}",
            images.provider_names(),
            speech.provider_names()
        );
        Self::new(config, images, speech)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn image_generator(&self) -> &ImageGenerator {
        &self.images
    }

    pub fn speech_generator(&self) -> &SpeechGenerator {
        &self.speech
    }

    /// Per-story output directory: `<output_dir>/<sanitized title>`
    pub fn story_dir(&self, title: &str) -> PathBuf {
        self.config.output_dir.join(sanitize_filename(title))
    }

    pub async fn run(
        &self,
        story: &Story,
        title: &str,
        formats: &[String],
        progress: Option<Sender<ProgressUpdate>>,
    ) -> CompilationResult {
        self.run_with_report(story, title, formats, progress).await.result
    }

    pub async fn run_with_report(
        &self,
        story: &Story,
        title: &str,
        formats: &[String],
        progress: Option<Sender<ProgressUpdate>>,
    ) -> PipelineReport {
        let story_dir = self.story_dir(title);
        let images = self.images.for_new_run();
        let speech = self.speech.for_new_run();
        let compiler = FormatCompiler::new(self.config.compiler.clone(), self.config.video.clone());

        let result = match story.validate() {
            Err(e) => {
                error!("Story \"{}\" rejected: {}", title, e);
                CompilationResult::aborted(&story_dir, e.to_string())
            }
            Ok(()) => {
                if let Some(sender) = &progress {
                    let _ = sender
                        .send(ProgressUpdate::Started {
                            scenes: story.scene_count(),
                        })
                        .await;
                }

                info!(
                    "Generating assets for \"{}\" ({} scenes) into {}",
                    title,
                    story.scene_count(),
                    story_dir.display()
                );

                let (image_statuses, audio_statuses) = tokio::join!(
                    images.generate_all(&story.scenes, &story_dir, progress.clone()),
                    speech.generate_all(&story.scenes, &story_dir, progress.clone()),
                );

                let request = CompileRequest {
                    story,
                    title,
                    output_dir: &story_dir,
                    images: Some(&image_statuses),
                    audio: Some(&audio_statuses),
                    formats,
                };
                compiler.compile(&request, progress.as_ref()).await
            }
        };

        if let Some(sender) = &progress {
            let _ = sender
                .send(ProgressUpdate::Completed {
                    success: result.success,
                })
                .await;
        }

        info!(
            "Story \"{}\" finished: {}/{} formats succeeded",
            title,
            result.outputs.iter().filter(|o| o.success).count(),
            result.outputs.len()
        );

        PipelineReport {
            result,
            image_stats: images.stats(),
            speech_stats: speech.stats(),
            compiler_stats: compiler.stats(),
        }
    }
}
