// Сценарные тесты пайплайна с подставными провайдерами (без сети)

mod test_markup;
mod test_pipeline;
mod test_video;

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::models::{AssetKind, Scene, Story, ToneMap};
use crate::services::generation::{AssetProvider, GeneratedAsset, ProviderFailure, ProviderResult};

/// Valid 1x1 PNG
const TINY_PNG_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub(crate) fn tiny_png() -> Vec<u8> {
    STANDARD.decode(TINY_PNG_B64).unwrap()
}

/// Silent 16-bit mono WAV of the given length
pub(crate) fn silent_wav(seconds: f64) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let samples = (seconds * spec.sample_rate as f64).round() as usize;
        for _ in 0..samples {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub(crate) fn ffmpeg_present() -> bool {
    crate::utils::ffmpeg::ffmpeg_available()
}

/// Scripted provider: fails for the listed scenes, optionally sleeps, counts calls
pub(crate) struct FakeProvider {
    pub name: String,
    pub kind: AssetKind,
    pub fail_scenes: HashSet<u32>,
    pub fail_all: bool,
    pub delay: Option<Duration>,
    pub audio_secs: f64,
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeProvider {
    pub fn new(name: &str, kind: AssetKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            fail_scenes: HashSet::new(),
            fail_all: false,
            delay: None,
            audio_secs: 1.0,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn failing_for(mut self, scenes: &[u32]) -> Self {
        self.fail_scenes = scenes.iter().copied().collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_audio_secs(mut self, secs: f64) -> Self {
        self.audio_secs = secs;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn shared(self) -> Arc<dyn AssetProvider> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl AssetProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> AssetKind {
        self.kind
    }

    async fn generate(&self, _input: &str, scene_number: u32) -> ProviderResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_all || self.fail_scenes.contains(&scene_number) {
            return Err(ProviderFailure::new(&self.name, "scripted failure"));
        }

        let bytes = match self.kind {
            AssetKind::Image => tiny_png(),
            AssetKind::Speech => silent_wav(self.audio_secs),
        };
        Ok(GeneratedAsset::new(bytes, &self.name, None))
    }
}

pub(crate) fn scene(number: u32, narration: &str, tones: &[(&str, &str)]) -> Scene {
    Scene {
        scene_number: number,
        plot_summary: format!("Plot of scene {}", number),
        visual_description: format!("A watercolor meadow at dawn, scene {}", number),
        narration_text: narration.to_string(),
        narration_tones: tones.iter().copied().collect::<ToneMap>(),
        transition_from_previous: (number > 1).then(|| "Meanwhile...".to_string()),
        transition_to_next: None,
    }
}

pub(crate) fn three_scene_story() -> Story {
    Story {
        story_summary: "A small hedgehog learns that friends make the winter shorter.".to_string(),
        scenes: vec![
            scene(
                1,
                "Pip woke to a quiet, frozen forest. Everything was white.",
                &[("Pip woke to a quiet, frozen forest.", "calm"), ("Everything was white.", "awe")],
            ),
            scene(
                2,
                "\"Is anyone there?\" he called. Nobody answered.",
                &[("\"Is anyone there?\" he called.", "tense"), ("Nobody answered.", "sad")],
            ),
            scene(
                3,
                "Then the rabbits arrived with soup! Pip laughed.",
                &[("Then the rabbits arrived with soup!", "excited"), ("Pip laughed.", "joyful")],
            ),
        ],
        metadata: None,
    }
}
