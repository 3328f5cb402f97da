//! # Format compiler
//!
//! Собирает запрошенные форматы из сценария и статусов ассетов.
//! Каждый формат компилируется независимо: ошибка одного формата
//! записывается в его `CompiledOutput` и не мешает остальным.
//!
//! Форматы, зависящие от ассетов (видео, и html при `html_requires_assets`),
//! собираются только после успешной проверки ассетов.

pub mod cards;
pub mod html;
pub mod json;
pub mod video;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

use crate::config::{CompilerConfig, VideoConfig};
use crate::errors::{AppError, AppResult};
use crate::models::{AssetStatus, AssetSummary, CompilationResult, CompiledOutput, ProgressUpdate, Story};
use crate::services::validation::validate_assets;
use crate::utils::common::sanitize_filename;

pub use video::{RenderedVideo, VideoAssembler, VideoTimeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Json,
    Html,
    Video,
    Epub,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Html => "html",
            Self::Video => "video",
            Self::Epub => "epub",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            "video" | "mp4" => Ok(Self::Video),
            "epub" => Ok(Self::Epub),
            other => Err(AppError::CompilationError(format!("Unknown format: {}", other))),
        }
    }
}

/// Estimated narration length: `max(words * seconds_per_word, min_scene_seconds)` per scene
pub fn estimate_duration(story: &Story, config: &CompilerConfig) -> f64 {
    story
        .scenes
        .iter()
        .map(|scene| (scene.word_count() as f64 * config.seconds_per_word).max(config.min_scene_seconds))
        .sum()
}

#[derive(Debug, Default)]
pub struct CompilationStats {
    total: AtomicUsize,
    successful: AtomicUsize,
    failed: AtomicUsize,
    rendered_secs: Mutex<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompilationStatsSnapshot {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_rendered_secs: f64,
}

impl CompilationStats {
    fn record(&self, output: &CompiledOutput) {
        self.total.fetch_add(1, Ordering::SeqCst);
        if output.success {
            self.successful.fetch_add(1, Ordering::SeqCst);
            if let Some(secs) = output.duration_secs {
                *self.rendered_secs.lock() += secs;
            }
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn snapshot(&self) -> CompilationStatsSnapshot {
        CompilationStatsSnapshot {
            total: self.total.load(Ordering::SeqCst),
            successful: self.successful.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            total_rendered_secs: *self.rendered_secs.lock(),
        }
    }
}

/// Everything one compilation needs
pub struct CompileRequest<'a> {
    pub story: &'a Story,
    pub title: &'a str,
    pub output_dir: &'a Path,
    /// `None` when the asset kind was not generated for this run
    pub images: Option<&'a [AssetStatus]>,
    pub audio: Option<&'a [AssetStatus]>,
    pub formats: &'a [String],
}

pub struct FormatCompiler {
    config: CompilerConfig,
    assembler: VideoAssembler,
    stats: CompilationStats,
}

impl FormatCompiler {
    pub fn new(config: CompilerConfig, video: VideoConfig) -> Self {
        Self {
            config,
            assembler: VideoAssembler::new(video),
            stats: CompilationStats::default(),
        }
    }

    pub fn stats(&self) -> CompilationStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn estimate_duration(&self, story: &Story) -> f64 {
        estimate_duration(story, &self.config)
    }

    fn is_gated(&self, format: OutputFormat) -> bool {
        match format {
            OutputFormat::Video => true,
            OutputFormat::Html => self.config.html_requires_assets,
            OutputFormat::Json | OutputFormat::Epub => false,
        }
    }

    /// Compile every requested format. Never fails as a whole; per-format
    /// problems end up in the corresponding `CompiledOutput`.
    pub async fn compile(
        &self,
        request: &CompileRequest<'_>,
        progress: Option<&Sender<ProgressUpdate>>,
    ) -> CompilationResult {
        let asset_summary = AssetSummary::new(request.images, request.audio);

        if let Err(e) = tokio::fs::create_dir_all(request.output_dir).await {
            error!("Cannot create output directory {}: {}", request.output_dir.display(), e);
            let mut result = CompilationResult::aborted(request.output_dir, e.to_string());
            result.asset_summary = asset_summary;
            return result;
        }

        let parsed: Vec<(String, AppResult<OutputFormat>)> = request
            .formats
            .iter()
            .map(|name| (name.trim().to_lowercase(), name.parse::<OutputFormat>()))
            .collect();

        let needs_gate = parsed
            .iter()
            .any(|(_, f)| matches!(f, Ok(format) if self.is_gated(*format)));

        let validation_error = if needs_gate {
            let outcome = validate_assets(request.story.scene_count(), request.images, request.audio).await;
            if let Some(sender) = progress {
                let _ = sender
                    .send(ProgressUpdate::Validated { passed: outcome.is_ok() })
                    .await;
            }
            outcome.err().map(|e| match e {
                AppError::ValidationError(message) => message,
                other => other.to_string(),
            })
        } else {
            None
        };

        let file_stem = sanitize_filename(request.title);
        let mut outputs = Vec::with_capacity(parsed.len());

        for (name, format) in parsed {
            let output = match format {
                Err(e) => {
                    warn!("{}", e);
                    CompiledOutput::failure(name, e.to_string())
                }
                Ok(format) => {
                    info!("Compiling {} for \"{}\"", format, request.title);
                    let result = if self.is_gated(format) && validation_error.is_some() {
                        Err(AppError::ValidationError(
                            validation_error.clone().unwrap_or_default(),
                        ))
                    } else {
                        self.compile_format(format, request, &file_stem, validation_error.clone())
                            .await
                    };
                    match result {
                        Ok(output) => output,
                        Err(e) => {
                            error!("{} compilation failed: {}", format, e);
                            CompiledOutput::failure(format.as_str(), e.to_string())
                        }
                    }
                }
            };

            self.stats.record(&output);
            if let Some(sender) = progress {
                let _ = sender
                    .send(ProgressUpdate::FormatFinished {
                        format: output.format.clone(),
                        success: output.success,
                    })
                    .await;
            }
            outputs.push(output);
        }

        CompilationResult::new(request.output_dir, outputs, validation_error, asset_summary)
    }

    async fn compile_format(
        &self,
        format: OutputFormat,
        request: &CompileRequest<'_>,
        file_stem: &str,
        validation_error: Option<String>,
    ) -> AppResult<CompiledOutput> {
        match format {
            OutputFormat::Json => {
                let input = json::ManifestInput {
                    story: request.story,
                    title: request.title,
                    images: request.images,
                    audio: request.audio,
                    formats: request.formats.to_vec(),
                    validation_error,
                    estimated_duration: self.estimate_duration(request.story),
                };
                let path = json::write_manifest(&input, request.output_dir, file_stem).await?;
                Ok(CompiledOutput::success(format.as_str(), path))
            }
            OutputFormat::Html => {
                let path = html::write_html(
                    request.story,
                    request.title,
                    request.images,
                    request.audio,
                    request.output_dir,
                    file_stem,
                )
                .await?;
                Ok(CompiledOutput::success(format.as_str(), path))
            }
            OutputFormat::Video => {
                let (Some(images), Some(audio)) = (request.images, request.audio) else {
                    return Err(AppError::CompilationError(
                        "Video requires both image and audio assets".to_string(),
                    ));
                };
                let path: PathBuf = request.output_dir.join(format!("{}_complete.mp4", file_stem));
                let rendered = self
                    .assembler
                    .assemble(request.story, request.title, images, audio, &path)
                    .await?;
                Ok(CompiledOutput::success(format.as_str(), rendered.path.clone())
                    .with_duration(rendered.duration_secs()))
            }
            OutputFormat::Epub => Err(AppError::CompilationError(
                "EPUB compilation not yet implemented".to_string(),
            )),
        }
    }
}
