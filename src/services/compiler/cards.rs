//! Title and credits cards
//!
//! Карточки рисуются самим ffmpeg: цветной фон из lavfi, текст через
//! drawtext, тишина из anullsrc. Текст пишется во временные файлы, чтобы
//! не экранировать его внутри графа фильтров.

use std::path::{Path, PathBuf};

use log::debug;

use crate::config::VideoConfig;
use crate::errors::AppResult;
use crate::utils::ffmpeg::run_ffmpeg_command;

pub const TITLE_BACKGROUND: &str = "0x2c3e50";
pub const CREDITS_BACKGROUND: &str = "0x34495e";
pub const TITLE_FONT_SIZE: u32 = 72;
pub const SUMMARY_FONT_SIZE: u32 = 36;
pub const CREDITS_FONT_SIZE: u32 = 48;
pub const SUMMARY_LINE_HEIGHT: u32 = 50;
// Отступ между заголовком и первой строкой аннотации
const SUMMARY_GAP: u32 = 50;

/// Average glyph width relative to the font size
const CHAR_WIDTH_RATIO: f64 = 0.55;

/// Greedy word wrap against an estimated text width.
///
/// Words wider than the line are kept on their own line. At most `max_lines`
/// lines are returned; the last one gets an ellipsis when text was dropped.
pub fn wrap_text(text: &str, max_width_px: u32, font_size: u32, max_lines: usize) -> Vec<String> {
    let max_chars = ((max_width_px as f64) / (font_size as f64 * CHAR_WIDTH_RATIO)).floor() as usize;
    let max_chars = max_chars.max(1);

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate_len = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if candidate_len <= max_chars || current.is_empty() {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            last.push_str("...");
        }
    }
    lines
}

/// One line of text on a card
#[derive(Debug, Clone, PartialEq)]
pub struct CardLine {
    pub text: String,
    pub font_size: u32,
    pub color: &'static str,
    /// drawtext y expression
    pub y: String,
}

/// Still frame held for a fixed duration with silent audio
#[derive(Debug, Clone, PartialEq)]
pub struct CardSpec {
    pub background: &'static str,
    pub lines: Vec<CardLine>,
    pub duration_secs: f64,
}

pub fn title_card(config: &VideoConfig, title: &str, summary: &str) -> CardSpec {
    let mut lines = vec![CardLine {
        text: title.to_string(),
        font_size: TITLE_FONT_SIZE,
        color: "white",
        y: "h/3".to_string(),
    }];

    let wrap_width = config.width.saturating_sub(config.margin_px * 2);
    let summary_top = TITLE_FONT_SIZE + SUMMARY_GAP;
    for (i, line) in wrap_text(summary, wrap_width, SUMMARY_FONT_SIZE, config.summary_max_lines)
        .into_iter()
        .enumerate()
    {
        lines.push(CardLine {
            text: line,
            font_size: SUMMARY_FONT_SIZE,
            color: "0xecf0f1",
            y: format!("h/3+{}", summary_top + i as u32 * SUMMARY_LINE_HEIGHT),
        });
    }

    CardSpec {
        background: TITLE_BACKGROUND,
        lines,
        duration_secs: config.title_duration_secs,
    }
}

pub fn credits_card(config: &VideoConfig) -> CardSpec {
    CardSpec {
        background: CREDITS_BACKGROUND,
        lines: vec![CardLine {
            text: config.credits_text.clone(),
            font_size: CREDITS_FONT_SIZE,
            color: "white",
            y: "h/2".to_string(),
        }],
        duration_secs: config.credits_duration_secs,
    }
}

/// Escape a path for use inside a single-quoted filter option value
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace('\'', r"'\''")
}

fn drawtext_filter(line: &CardLine, text_file: &Path, font_file: Option<&str>) -> String {
    let mut filter = format!(
        "drawtext=textfile='{}':fontsize={}:fontcolor={}:x=(w-text_w)/2:y={}",
        escape_filter_path(text_file),
        line.font_size,
        line.color,
        line.y
    );
    if let Some(font) = font_file {
        filter.push_str(&format!(":fontfile='{}'", escape_filter_path(Path::new(font))));
    }
    filter
}

/// Build ffmpeg arguments for rendering a card; text files are written to `work_dir`
pub async fn card_args(
    spec: &CardSpec,
    config: &VideoConfig,
    work_dir: &Path,
    name: &str,
    output: &Path,
) -> AppResult<Vec<String>> {
    let mut filters = Vec::with_capacity(spec.lines.len());
    for (i, line) in spec.lines.iter().enumerate() {
        let text_file: PathBuf = work_dir.join(format!("{}_line_{}.txt", name, i));
        tokio::fs::write(&text_file, &line.text).await?;
        filters.push(drawtext_filter(line, &text_file, config.font_file.as_deref()));
    }
    filters.push("format=yuv420p".to_string());

    let duration = format!("{:.3}", spec.duration_secs);
    Ok(vec![
        "-y".to_string(),
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!(
            "color=c={}:s={}x{}:r={}:d={}",
            spec.background, config.width, config.height, config.fps, duration
        ),
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        "anullsrc=channel_layout=stereo:sample_rate=44100".to_string(),
        "-vf".to_string(),
        filters.join(","),
        "-map".to_string(),
        "0:v".to_string(),
        "-map".to_string(),
        "1:a".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "medium".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-r".to_string(),
        config.fps.to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-ar".to_string(),
        "44100".to_string(),
        "-ac".to_string(),
        "2".to_string(),
        "-t".to_string(),
        duration,
        output.to_string_lossy().to_string(),
    ])
}

pub async fn render_card(
    spec: &CardSpec,
    config: &VideoConfig,
    work_dir: &Path,
    name: &str,
    output: &Path,
) -> AppResult<()> {
    debug!("Rendering {} card ({:.1}s) to {}", name, spec.duration_secs, output.display());
    let args = card_args(spec, config, work_dir, name, output).await?;
    run_ffmpeg_command(&args).await
}
