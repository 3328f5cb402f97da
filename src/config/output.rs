use serde::{Deserialize, Serialize};

// Параметры итогового видео
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    // Total zoom gained over one scene (0.02 = 2%)
    pub zoom_factor: f64,
    pub title_card: bool,
    pub credits_card: bool,
    pub title_duration_secs: f64,
    pub credits_duration_secs: f64,
    pub summary_max_lines: usize,
    pub margin_px: u32,
    // Шрифт для drawtext; без него ffmpeg использует системный по умолчанию
    pub font_file: Option<String>,
    pub credits_text: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 24,
            zoom_factor: 0.02,
            title_card: true,
            credits_card: true,
            title_duration_secs: 3.0,
            credits_duration_secs: 2.0,
            summary_max_lines: 3,
            margin_px: 100,
            font_file: None,
            credits_text: "Created with Automated Story Engine".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompilerConfig {
    pub default_formats: Vec<String>,
    // Gate the interactive bundle on complete assets like the video
    pub html_requires_assets: bool,
    // Speaking rate for duration estimates (0.4 s/word = 2.5 words/s)
    pub seconds_per_word: f64,
    pub min_scene_seconds: f64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_formats: vec!["json".to_string(), "html".to_string(), "video".to_string()],
            html_requires_assets: false,
            seconds_per_word: 0.4,
            min_scene_seconds: 5.0,
        }
    }
}
