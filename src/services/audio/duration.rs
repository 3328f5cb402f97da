//! # Audio duration
//!
//! Длительность нужна сборщику видео: каждая сцена держится ровно столько,
//! сколько звучит её озвучка. Сначала читаем контейнер через symphonia,
//! при неудаче спрашиваем ffprobe.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::errors::{AppError, AppResult};
use crate::utils::ffmpeg::probe_duration;

/// Convert a sample count to seconds
pub fn duration_in_seconds(frames: u64, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    frames as f64 / sample_rate as f64
}

/// Read the playback duration of an audio file with symphonia.
///
/// Uses the frame count from the container header when present and
/// otherwise sums packet durations without decoding.
pub fn probe_audio_duration(path: &Path) -> AppResult<f64> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| {
            AppError::AudioProcessingError(format!(
                "Failed to detect audio format of {}: {}",
                path.display(),
                e
            ))
        })?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AppError::AudioProcessingError("No audio track found".to_string()))?;

    let track_id = track.id;
    let params = track.codec_params.clone();
    let sample_rate = params.sample_rate.unwrap_or(0);

    if let (Some(frames), Some(time_base)) = (params.n_frames, params.time_base) {
        let time = time_base.calc_time(frames);
        return Ok(time.seconds as f64 + time.frac);
    }
    if let Some(frames) = params.n_frames {
        if sample_rate > 0 {
            return Ok(duration_in_seconds(frames, sample_rate));
        }
    }

    // Заголовок без числа фреймов: суммируем длительности пакетов
    let mut total_ts: u64 = 0;
    while let Ok(packet) = format.next_packet() {
        if packet.track_id() == track_id {
            total_ts += packet.dur;
        }
    }

    match params.time_base {
        Some(time_base) => {
            let time = time_base.calc_time(total_ts);
            Ok(time.seconds as f64 + time.frac)
        }
        None if sample_rate > 0 => Ok(duration_in_seconds(total_ts, sample_rate)),
        None => Err(AppError::AudioProcessingError(format!(
            "Cannot determine duration of {}",
            path.display()
        ))),
    }
}

/// Duration of an audio file in seconds, symphonia first, ffprobe second
pub async fn get_audio_duration(path: &Path) -> AppResult<f64> {
    let owned: PathBuf = path.to_path_buf();
    let probed = tokio::task::spawn_blocking(move || probe_audio_duration(&owned))
        .await
        .map_err(|e| AppError::AudioProcessingError(format!("Duration probe task failed: {}", e)))?;

    match probed {
        Ok(duration) if duration > 0.0 => {
            debug!("{}: {:.3}s", path.display(), duration);
            Ok(duration)
        }
        Ok(_) | Err(_) => {
            if let Err(e) = &probed {
                warn!("symphonia could not read {}: {}, trying ffprobe", path.display(), e);
            }
            let duration = probe_duration(path).await?;
            if duration <= 0.0 {
                return Err(AppError::AudioProcessingError(format!(
                    "Audio file {} has zero duration",
                    path.display()
                )));
            }
            Ok(duration)
        }
    }
}
