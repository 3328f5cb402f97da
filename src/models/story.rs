//! Story script model
//!
//! The script is produced upstream and handed to the pipeline read-only.
//! Tone annotations keep the order in which they appear in the source document.

use std::fmt;

use log::warn;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{AppError, AppResult};

/// Minimum share of the narration the tone segments are expected to cover.
pub const MIN_TONE_COVERAGE: f64 = 0.7;

/// Fixed set of emotional tones understood by the markup builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalTone {
    Calm,
    Curious,
    Awe,
    Tense,
    Determined,
    Sad,
    Excited,
    Angry,
    Mysterious,
    Joyful,
    Vulnerable,
    Tender,
    Nostalgic,
    Hopeful,
    Melancholy,
    Passionate,
}

impl Default for EmotionalTone {
    fn default() -> Self {
        EmotionalTone::Calm
    }
}

impl EmotionalTone {
    pub const ALL: [EmotionalTone; 16] = [
        EmotionalTone::Calm,
        EmotionalTone::Curious,
        EmotionalTone::Awe,
        EmotionalTone::Tense,
        EmotionalTone::Determined,
        EmotionalTone::Sad,
        EmotionalTone::Excited,
        EmotionalTone::Angry,
        EmotionalTone::Mysterious,
        EmotionalTone::Joyful,
        EmotionalTone::Vulnerable,
        EmotionalTone::Tender,
        EmotionalTone::Nostalgic,
        EmotionalTone::Hopeful,
        EmotionalTone::Melancholy,
        EmotionalTone::Passionate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Curious => "curious",
            Self::Awe => "awe",
            Self::Tense => "tense",
            Self::Determined => "determined",
            Self::Sad => "sad",
            Self::Excited => "excited",
            Self::Angry => "angry",
            Self::Mysterious => "mysterious",
            Self::Joyful => "joyful",
            Self::Vulnerable => "vulnerable",
            Self::Tender => "tender",
            Self::Nostalgic => "nostalgic",
            Self::Hopeful => "hopeful",
            Self::Melancholy => "melancholy",
            Self::Passionate => "passionate",
        }
    }

    /// Resolve a free-text tone label.
    ///
    /// Canonical names match case-insensitively; common synonyms produced by
    /// script writers (`wonder`, `serenity`, `joy`, ...) map onto the closest tone.
    /// Returns `None` for labels with no mapping.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase();
        if let Some(tone) = Self::ALL.iter().find(|t| t.as_str() == normalized) {
            return Some(*tone);
        }

        let tone = match normalized.as_str() {
            "curiosity" | "intrigued" => Self::Curious,
            "wonder" | "amazed" => Self::Awe,
            "anticipation" | "enthusiasm" | "enthusiastic" => Self::Excited,
            "serenity" | "contentment" | "satisfaction" | "content" | "reassuring"
            | "peaceful" => Self::Calm,
            "warmth" | "gentleness" | "welcoming" | "grateful" | "trusting" => Self::Tender,
            "enlightening" | "encouragement" | "enlightened" => Self::Hopeful,
            "joy" | "delight" | "happiness" | "fulfilled" => Self::Joyful,
            "reflection" | "reflective" => Self::Nostalgic,
            "pride" => Self::Determined,
            "enchanted" | "enchanting" => Self::Mysterious,
            _ => return None,
        };
        Some(tone)
    }
}

impl fmt::Display for EmotionalTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered mapping from a literal narration segment to its tone label.
///
/// Serialized as a JSON object; entry order is the document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToneMap(Vec<(String, String)>);

impl ToneMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, segment: impl Into<String>, tone: impl Into<String>) {
        self.0.push((segment.into(), tone.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for ToneMap {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(s, t)| (s.into(), t.into())).collect())
    }
}

impl Serialize for ToneMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (segment, tone) in &self.0 {
            map.serialize_entry(segment, tone)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ToneMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ToneMapVisitor;

        impl<'de> Visitor<'de> for ToneMapVisitor {
            type Value = ToneMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping narration segments to tone labels")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ToneMap, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((segment, tone)) = access.next_entry::<String, String>()? {
                    entries.push((segment, tone));
                }
                Ok(ToneMap(entries))
            }
        }

        deserializer.deserialize_map(ToneMapVisitor)
    }
}

/// A single narrative unit of the script
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scene {
    pub scene_number: u32,
    pub plot_summary: String,
    pub visual_description: String,
    pub narration_text: String,
    pub narration_tones: ToneMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_from_previous: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_to_next: Option<String>,
}

impl Scene {
    /// Share of the narration covered by the tone segments (space-joined, in chars).
    pub fn tone_coverage(&self) -> f64 {
        let narration_len = self.narration_text.chars().count();
        if narration_len == 0 {
            return 0.0;
        }
        let segments: Vec<&str> = self.narration_tones.iter().map(|(s, _)| s).collect();
        segments.join(" ").chars().count() as f64 / narration_len as f64
    }

    /// Number of whitespace-separated words in the narration
    pub fn word_count(&self) -> usize {
        self.narration_text.split_whitespace().count()
    }
}

/// Optional descriptive metadata carried along with the script
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moral_theme: Option<String>,
    /// Estimated duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
}

/// Complete script: summary plus the ordered scene list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Story {
    pub story_summary: String,
    pub scenes: Vec<Scene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<StoryMetadata>,
}

impl Story {
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Check the structural guarantees the pipeline relies on.
    ///
    /// Scene numbers must run 1..=N in order. Low tone coverage only warns;
    /// the markup builder copes with partial annotations.
    pub fn validate(&self) -> AppResult<()> {
        if self.scenes.is_empty() {
            return Err(AppError::ValidationError("Story has no scenes".to_string()));
        }

        let actual: Vec<u32> = self.scenes.iter().map(|s| s.scene_number).collect();
        let expected: Vec<u32> = (1..=self.scenes.len() as u32).collect();
        if actual != expected {
            return Err(AppError::ValidationError(format!(
                "Scenes must be numbered sequentially starting from 1, got {:?}",
                actual
            )));
        }

        for scene in &self.scenes {
            if scene.narration_text.trim().is_empty() {
                return Err(AppError::ValidationError(format!(
                    "Scene {} has empty narration",
                    scene.scene_number
                )));
            }
            let coverage = scene.tone_coverage();
            if coverage < MIN_TONE_COVERAGE {
                warn!(
                    "Scene {} tone segments cover {:.0}% of the narration",
                    scene.scene_number,
                    coverage * 100.0
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(number: u32) -> Scene {
        Scene {
            scene_number: number,
            plot_summary: "A rabbit finds a garden".to_string(),
            visual_description: "A white rabbit at the gate of a glowing garden".to_string(),
            narration_text: "Luna stepped inside. The garden glowed.".to_string(),
            narration_tones: [("Luna stepped inside.", "curious"), ("The garden glowed.", "awe")]
                .into_iter()
                .collect(),
            transition_from_previous: None,
            transition_to_next: None,
        }
    }

    #[test]
    fn test_tone_labels() {
        assert_eq!(EmotionalTone::from_label("Excited"), Some(EmotionalTone::Excited));
        assert_eq!(EmotionalTone::from_label(" wonder "), Some(EmotionalTone::Awe));
        assert_eq!(EmotionalTone::from_label("serenity"), Some(EmotionalTone::Calm));
        assert_eq!(EmotionalTone::from_label("pride"), Some(EmotionalTone::Determined));
        assert_eq!(EmotionalTone::from_label("bored"), None);
    }

    #[test]
    fn test_tone_map_keeps_document_order() {
        let json = r#"{"zeta part": "sad", "alpha part": "joyful", "mid part": "calm"}"#;
        let map: ToneMap = serde_json::from_str(json).unwrap();
        let segments: Vec<&str> = map.iter().map(|(s, _)| s).collect();
        assert_eq!(segments, vec!["zeta part", "alpha part", "mid part"]);

        let back = serde_json::to_string(&map).unwrap();
        assert_eq!(back, r#"{"zeta part":"sad","alpha part":"joyful","mid part":"calm"}"#);
    }

    #[test]
    fn test_tone_coverage() {
        let s = scene(1);
        assert!((s.tone_coverage() - 1.0).abs() < 1e-9);

        let mut partial = scene(1);
        partial.narration_tones = [("Luna", "calm")].into_iter().collect();
        assert!(partial.tone_coverage() < MIN_TONE_COVERAGE);
    }

    #[test]
    fn test_validate_numbering() {
        let story = Story {
            story_summary: "summary".to_string(),
            scenes: vec![scene(1), scene(2), scene(3)],
            metadata: None,
        };
        assert!(story.validate().is_ok());

        let gap = Story {
            story_summary: "summary".to_string(),
            scenes: vec![scene(1), scene(3)],
            metadata: None,
        };
        assert!(matches!(gap.validate(), Err(AppError::ValidationError(_))));

        let empty = Story {
            story_summary: "summary".to_string(),
            scenes: vec![],
            metadata: None,
        };
        assert!(empty.validate().is_err());
    }
}
