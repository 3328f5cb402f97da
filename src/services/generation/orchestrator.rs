//! Fallback orchestrator
//!
//! Для каждой сцены провайдеры вызываются по порядку, пока один из них не
//! вернёт ассет. Пакетная генерация ограничена семафором; сбой одной сцены
//! не влияет на остальные.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{error, info, warn};
use tokio::sync::Semaphore;
use tokio::sync::mpsc::Sender;
use tokio::time::timeout;

use super::provider::{AssetProvider, ProviderHealth};
use super::stats::{GenerationStats, StatsSnapshot};
use crate::models::{AssetKind, AssetStatus, ProgressUpdate};

/// One unit of batch work: the provider input for a scene
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub scene_number: u32,
    pub input: String,
}

#[derive(Clone)]
pub struct AssetGenerator {
    kind: AssetKind,
    providers: Vec<Arc<dyn AssetProvider>>,
    max_concurrent: usize,
    provider_timeout: Duration,
    stats: Arc<GenerationStats>,
}

impl AssetGenerator {
    pub fn new(
        kind: AssetKind,
        providers: Vec<Arc<dyn AssetProvider>>,
        max_concurrent: usize,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            kind,
            providers,
            max_concurrent: max_concurrent.max(1),
            provider_timeout,
            stats: Arc::new(GenerationStats::new()),
        }
    }

    /// Same providers and limits, zeroed counters
    pub fn for_new_run(&self) -> Self {
        Self {
            stats: Arc::new(GenerationStats::new()),
            ..self.clone()
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Generate the asset for one scene, trying providers in order.
    ///
    /// Exactly one file is written on success; nothing on failure.
    pub async fn generate_one(&self, input: &str, scene_number: u32, output_dir: &Path) -> AssetStatus {
        let label = self.kind.label();
        let path = output_dir.join(self.kind.file_name(scene_number));
        let mut errors = Vec::new();

        for provider in &self.providers {
            info!(
                "Scene {}: generating {} with provider '{}'",
                scene_number,
                label,
                provider.name()
            );

            match self.attempt(provider.as_ref(), input, scene_number, &path).await {
                Ok(()) => {
                    info!(
                        "Scene {}: {} saved to {} via '{}'",
                        scene_number,
                        label,
                        path.display(),
                        provider.name()
                    );
                    self.stats.record_success(provider.name());
                    return AssetStatus::succeeded(self.kind, scene_number, path, provider.name());
                }
                Err(e) => {
                    warn!(
                        "Scene {}: {} provider '{}' failed: {}",
                        scene_number,
                        label,
                        provider.name(),
                        e
                    );
                    errors.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        self.stats.record_failure();
        let message = if errors.is_empty() {
            format!("No {} providers configured", label)
        } else {
            format!("All {} providers failed ({})", label, errors.join("; "))
        };
        error!("Scene {}: {}", scene_number, message);
        AssetStatus::failed(self.kind, scene_number, message)
    }

    async fn attempt(
        &self,
        provider: &dyn AssetProvider,
        input: &str,
        scene_number: u32,
        path: &Path,
    ) -> Result<(), String> {
        let asset = match timeout(self.provider_timeout, provider.generate(input, scene_number)).await {
            Ok(Ok(asset)) => asset,
            Ok(Err(failure)) => return Err(failure.error),
            Err(_) => {
                return Err(format!(
                    "timed out after {}s",
                    self.provider_timeout.as_secs_f64()
                ));
            }
        };

        if asset.bytes.is_empty() {
            return Err("provider returned an empty asset".to_string());
        }

        if let Err(e) = tokio::fs::write(path, &asset.bytes).await {
            // Не оставляем частично записанный файл
            let _ = tokio::fs::remove_file(path).await;
            return Err(format!("failed to save {}: {}", path.display(), e));
        }

        Ok(())
    }

    /// Generate assets for all jobs with bounded concurrency.
    ///
    /// Returns one status per job, sorted by scene number, whatever the
    /// completion order.
    pub async fn generate_batch(
        &self,
        jobs: Vec<GenerationJob>,
        output_dir: &Path,
        progress: Option<Sender<ProgressUpdate>>,
    ) -> Vec<AssetStatus> {
        let total = jobs.len();
        info!(
            "Generating {} {} assets (max {} concurrent, providers: {:?})",
            total,
            self.kind.label(),
            self.max_concurrent,
            self.provider_names()
        );

        if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
            error!("Failed to create output directory {}: {}", output_dir.display(), e);
            return jobs
                .iter()
                .map(|job| {
                    self.stats.record_failure();
                    AssetStatus::failed(
                        self.kind,
                        job.scene_number,
                        format!("Failed to create output directory: {}", e),
                    )
                })
                .collect();
        }

        // Семафор ограничивает число одновременных генераций
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let completed = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut scene_numbers = Vec::with_capacity(total);
        let mut tasks = Vec::with_capacity(total);

        for job in jobs {
            let generator = self.clone();
            let semaphore = semaphore.clone();
            let completed = completed.clone();
            let progress = progress.clone();
            let output_dir: PathBuf = output_dir.to_path_buf();
            scene_numbers.push(job.scene_number);

            tasks.push(tokio::spawn(async move {
                let status = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        generator
                            .generate_one(&job.input, job.scene_number, &output_dir)
                            .await
                    }
                    Err(e) => {
                        generator.stats.record_failure();
                        AssetStatus::failed(
                            generator.kind,
                            job.scene_number,
                            format!("Concurrency limiter closed: {}", e),
                        )
                    }
                };

                let done = completed.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                if let Some(sender) = progress {
                    let _ = sender
                        .send(ProgressUpdate::AssetFinished {
                            kind: generator.kind,
                            scene_number: job.scene_number,
                            generated: status.generated(),
                            completed: done,
                            total,
                        })
                        .await;
                }
                status
            }));
        }

        let results = join_all(tasks).await;

        let mut statuses: Vec<AssetStatus> = scene_numbers
            .into_iter()
            .zip(results)
            .map(|(scene_number, result)| match result {
                Ok(status) => status,
                Err(e) => {
                    error!("Scene {}: {} generation task failed: {}", scene_number, self.kind.label(), e);
                    self.stats.record_failure();
                    AssetStatus::failed(
                        self.kind,
                        scene_number,
                        format!("Generation task failed: {}", e),
                    )
                }
            })
            .collect();

        statuses.sort_by_key(|s| s.scene_number());

        let snapshot = self.stats.snapshot();
        info!(
            "{} generation finished: {}/{} succeeded, usage {:?}",
            self.kind.label(),
            statuses.iter().filter(|s| s.generated()).count(),
            total,
            snapshot.provider_usage
        );

        statuses
    }

    /// Probe every configured provider
    pub async fn health_check(&self) -> Vec<ProviderHealth> {
        join_all(self.providers.iter().map(|p| p.health_check())).await
    }
}
