//! Запуск ffmpeg/ffprobe
//!
//! Тонкие обёртки над внешними процессами. Ошибки несут хвост stderr,
//! чтобы по логу было понятно, какой фильтр сломался.

use std::path::Path;

use log::{debug, error};
use tokio::process::Command as TokioCommand;

use crate::errors::{AppError, AppResult};

const STDERR_TAIL_LINES: usize = 8;

/// Проверка наличия ffmpeg и ffprobe в PATH
pub fn ffmpeg_available() -> bool {
    which::which("ffmpeg").is_ok() && which::which("ffprobe").is_ok()
}

/// Есть ли фильтр в сборке ffmpeg (например, drawtext требует libfreetype)
pub async fn ffmpeg_has_filter(name: &str) -> bool {
    let output = match TokioCommand::new("ffmpeg")
        .args(["-hide_banner", "-filters"])
        .output()
        .await
    {
        Ok(output) if output.status.success() => output,
        _ => return false,
    };
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(name))
}

/// Запуск команды FFmpeg
pub async fn run_ffmpeg_command(args: &[String]) -> AppResult<()> {
    debug!("ffmpeg {}", args.join(" "));

    let output = TokioCommand::new("ffmpeg")
        .args(args)
        .output()
        .await
        .map_err(|e| AppError::VideoProcessingError(format!("Failed to start ffmpeg: {}", e)))?;

    if !output.status.success() {
        let tail = stderr_tail(&output.stderr);
        error!("ffmpeg failed with status {}: {}", output.status, tail);
        return Err(AppError::VideoProcessingError(format!(
            "ffmpeg exited with status {}: {}",
            output.status, tail
        )));
    }

    Ok(())
}

/// Запуск команды FFprobe, возвращает stdout
pub async fn run_ffprobe_command(args: &[String]) -> AppResult<String> {
    let output = TokioCommand::new("ffprobe")
        .args(args)
        .output()
        .await
        .map_err(|e| AppError::AudioProcessingError(format!("Failed to start ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(AppError::AudioProcessingError(format!(
            "ffprobe exited with status {}: {}",
            output.status,
            stderr_tail(&output.stderr)
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Длительность медиафайла в секундах по данным контейнера
pub async fn probe_duration(path: &Path) -> AppResult<f64> {
    let args = vec![
        "-v".to_string(),
        "error".to_string(),
        "-show_entries".to_string(),
        "format=duration".to_string(),
        "-of".to_string(),
        "default=noprint_wrappers=1:nokey=1".to_string(),
        path.to_string_lossy().to_string(),
    ];
    let stdout = run_ffprobe_command(&args).await?;
    let trimmed = stdout.trim();
    trimmed.parse::<f64>().map_err(|_| {
        AppError::AudioProcessingError(format!(
            "Unexpected ffprobe duration output for {}: '{}'",
            path.display(),
            trimmed
        ))
    })
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
