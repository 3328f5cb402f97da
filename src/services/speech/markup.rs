//! # Speech markup builder
//!
//! Превращает текст сцены и карту эмоциональных тонов в SSML-документ:
//! каждый найденный сегмент оборачивается в `<prosody>` с параметрами тона,
//! после знаков конца предложения и кавычек вставляются паузы.
//!
//! The builder never fails. Segments that cannot be located after the cursor
//! are skipped, unknown tone labels fall back to calm and whatever text is not
//! covered by a segment is emitted unstyled.
//!
//! [`flatten_markup`] goes the other way for providers that only accept plain
//! text. It is a lossy normalisation, not a parser: when the result looks
//! implausibly short the caller gets the original narration back instead.

use log::{debug, warn};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::models::{EmotionalTone, ToneMap};

/// Pause after `.`, `!` and `?`
pub const SENTENCE_PAUSE: &str = r#"<break time="500ms"/>"#;
/// Pause after a quotation mark
pub const QUOTE_PAUSE: &str = r#"<break time="750ms"/>"#;
/// Breath at the start of every scene after the first
pub const SCENE_TRANSITION_PAUSE: &str = r#"<break time="1s"/>"#;

/// Flattened text shorter than this is treated as garbage
pub const MIN_FLATTENED_CHARS: usize = 10;

const SPEAK_OPEN: &str = "<speak>";
const SPEAK_CLOSE: &str = "</speak>";
const ESCAPED_QUOTE: &str = "&quot;";

/// Speech parameters for one tone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prosody {
    pub rate: &'static str,
    pub pitch: &'static str,
    pub volume: &'static str,
}

impl Prosody {
    pub fn is_loud(&self) -> bool {
        self.volume == "loud"
    }
}

/// Tone → (rate, pitch, volume) lookup table
pub fn prosody_for(tone: EmotionalTone) -> Prosody {
    let (rate, pitch, volume) = match tone {
        EmotionalTone::Calm => ("medium", "medium", "medium"),
        EmotionalTone::Curious => ("medium", "+2st", "medium"),
        EmotionalTone::Awe => ("slow", "+1st", "soft"),
        EmotionalTone::Tense => ("fast", "+3st", "loud"),
        EmotionalTone::Determined => ("medium", "medium", "loud"),
        EmotionalTone::Sad => ("slow", "-2st", "soft"),
        EmotionalTone::Excited => ("fast", "+4st", "loud"),
        EmotionalTone::Angry => ("fast", "+2st", "loud"),
        EmotionalTone::Mysterious => ("slow", "-1st", "soft"),
        EmotionalTone::Joyful => ("medium", "+3st", "medium"),
        EmotionalTone::Vulnerable => ("slow", "-1st", "soft"),
        EmotionalTone::Tender => ("slow", "medium", "soft"),
        EmotionalTone::Nostalgic => ("slow", "-1st", "medium"),
        EmotionalTone::Hopeful => ("medium", "+1st", "medium"),
        EmotionalTone::Melancholy => ("slow", "-2st", "soft"),
        EmotionalTone::Passionate => ("medium", "+2st", "loud"),
    };
    Prosody { rate, pitch, volume }
}

/// Escape the five markup metacharacters
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Reverse of [`escape_text`]
pub fn unescape_text(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn styled_segment(text: &str, tone: EmotionalTone) -> String {
    let prosody = prosody_for(tone);
    let inner = format!(
        r#"<prosody rate="{}" pitch="{}" volume="{}">{}</prosody>"#,
        prosody.rate,
        prosody.pitch,
        prosody.volume,
        escape_text(text)
    );
    if prosody.is_loud() {
        format!(r#"<emphasis level="moderate">{}</emphasis>"#, inner)
    } else {
        inner
    }
}

/// Build the markup document for one scene.
///
/// The tone map is walked in its own order with a cursor into `narration`;
/// each segment is looked up at or after the cursor only.
pub fn build_markup(narration: &str, tones: &ToneMap, scene_number: u32) -> String {
    let mut body = String::with_capacity(narration.len() * 2);
    let mut cursor = 0usize;

    for (segment, label) in tones.iter() {
        if segment.is_empty() {
            continue;
        }

        let Some(offset) = narration[cursor..].find(segment) else {
            debug!(
                "Scene {}: segment '{}' not found after position {}, skipping",
                scene_number, segment, cursor
            );
            continue;
        };

        let start = cursor + offset;
        if start > cursor {
            body.push_str(&escape_text(&narration[cursor..start]));
        }

        let tone = EmotionalTone::from_label(label).unwrap_or_else(|| {
            warn!(
                "Scene {}: unknown tone '{}', using {}",
                scene_number,
                label,
                EmotionalTone::default()
            );
            EmotionalTone::default()
        });
        body.push_str(&styled_segment(segment, tone));
        cursor = start + segment.len();
    }

    if cursor < narration.len() {
        body.push_str(&escape_text(&narration[cursor..]));
    }

    let mut document = String::with_capacity(body.len() + 64);
    document.push_str(SPEAK_OPEN);
    if scene_number > 1 {
        document.push_str(SCENE_TRANSITION_PAUSE);
    }
    document.push_str(&insert_pauses(&body));
    document.push_str(SPEAK_CLOSE);
    document
}

/// Second pass: add timed breaks after sentence ends and quotation marks.
/// Only text between tags is touched.
fn insert_pauses(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len() + markup.len() / 4);
    let mut in_tag = false;
    let mut rest = markup;

    while let Some(c) = rest.chars().next() {
        if in_tag {
            out.push(c);
            if c == '>' {
                in_tag = false;
            }
            rest = &rest[c.len_utf8()..];
            continue;
        }

        if c == '<' {
            in_tag = true;
            out.push(c);
            rest = &rest[1..];
            continue;
        }

        if rest.starts_with(ESCAPED_QUOTE) {
            out.push_str(ESCAPED_QUOTE);
            out.push_str(QUOTE_PAUSE);
            rest = &rest[ESCAPED_QUOTE.len()..];
            continue;
        }

        out.push(c);
        if matches!(c, '.' | '!' | '?') {
            out.push_str(SENTENCE_PAUSE);
        }
        rest = &rest[c.len_utf8()..];
    }

    out
}

struct FlattenPatterns {
    tags: Regex,
    leaked_tag_fragments: Regex,
    leaked_element_names: Regex,
    leaked_attributes: Regex,
    semitones: Regex,
    space_before_punct: Regex,
    whitespace: Regex,
}

impl FlattenPatterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            tags: Regex::new(r"<[^>]*>")?,
            // "<speak", "</prosody", "/emphasis>", "break/>"
            leaked_tag_fragments: Regex::new(
                r"(?i)<\s*/?\s*(speak|prosody|emphasis|break)\b[^<>]*>?|/\s*(speak|prosody|emphasis|break)\b\s*>?|\b(speak|prosody|emphasis|break)\s*/?>",
            )?,
            // element name directly followed by an attribute: "prosody rate="
            leaked_element_names: Regex::new(
                r"(?i)\b(?:prosody|emphasis|break)(\s+(?:rate|pitch|volume|level|time)\s*=)",
            )?,
            // quoted values, semitone offsets, or bare level words after "="
            leaked_attributes: Regex::new(
                r#"(?i)\b(?:rate|pitch|volume|level|time)\s*(?:=\s*"[^"]*"|=\s*'[^']*'|[=:]\s*[+-]\d+(?:\.\d+)?st\b|=\s*(?:x-slow|slow|medium|fast|x-fast|silent|x-soft|soft|loud|x-loud|x-low|low|high|x-high|default|moderate|strong|reduced|none)\b)"#,
            )?,
            semitones: Regex::new(r"(^|\s)[+-]\d+st\b")?,
            space_before_punct: Regex::new(r"\s+([,.!?;:])")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }
}

static FLATTEN_PATTERNS: OnceCell<FlattenPatterns> = OnceCell::new();

fn flatten_patterns() -> Result<&'static FlattenPatterns, regex::Error> {
    FLATTEN_PATTERNS.get_or_try_init(FlattenPatterns::compile)
}

/// Convert a markup document back to plain text.
///
/// Strips tags and any instruction fragments a provider might read aloud
/// (`rate="fast"`, `pitch: +2st`, `</prosody`, `prosody rate=`), then
/// normalises spacing. Bare words are never removed: "speak", "emphasis" or
/// "pitch: black" in the narration survive. Falls back to `original` when the result
/// is shorter than [`MIN_FLATTENED_CHARS`].
pub fn flatten_markup(markup: &str, original: &str) -> String {
    let patterns = match flatten_patterns() {
        Ok(p) => p,
        Err(e) => {
            warn!("Markup flattening unavailable ({}), using original text", e);
            return original.to_string();
        }
    };

    let text = patterns.tags.replace_all(markup, "");
    let text = unescape_text(&text);
    let text = patterns.leaked_tag_fragments.replace_all(&text, " ");
    let text = patterns.leaked_element_names.replace_all(&text, "$1");
    let text = patterns.leaked_attributes.replace_all(&text, " ");
    let text = patterns.semitones.replace_all(&text, "$1");
    let text = patterns.whitespace.replace_all(&text, " ");
    let text = patterns.space_before_punct.replace_all(&text, "$1");
    let text = text.trim().to_string();

    if text.chars().count() < MIN_FLATTENED_CHARS {
        debug!(
            "Flattened text too short ({} chars), falling back to original",
            text.chars().count()
        );
        return original.to_string();
    }

    text
}

/// Inner content of a `<speak>` document, or the input itself when it is not wrapped
pub fn speak_body(markup: &str) -> &str {
    let trimmed = markup.trim();
    trimmed
        .strip_prefix(SPEAK_OPEN)
        .and_then(|rest| rest.strip_suffix(SPEAK_CLOSE))
        .unwrap_or(trimmed)
}

/// Text to submit to a provider without markup support.
///
/// Plain input passes through untouched. For a markup document the fallback
/// is the tag-stripped text, so a provider never receives raw tags.
pub fn plain_text(input: &str) -> String {
    if !input.trim_start().starts_with('<') {
        return input.to_string();
    }
    let stripped = strip_tags(input);
    flatten_markup(input, &stripped)
}

fn strip_tags(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut in_tag = false;
    for c in markup.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    unescape_text(text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tones(pairs: &[(&str, &str)]) -> ToneMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_escape_round_trip() {
        let raw = r#"Tom & "Jerry" <3 it's"#;
        let escaped = escape_text(raw);
        assert_eq!(
            escaped,
            "Tom &amp; &quot;Jerry&quot; &lt;3 it&apos;s"
        );
        assert_eq!(unescape_text(&escaped), raw);
    }

    #[test]
    fn test_prosody_table() {
        assert_eq!(
            prosody_for(EmotionalTone::Calm),
            Prosody { rate: "medium", pitch: "medium", volume: "medium" }
        );
        assert_eq!(
            prosody_for(EmotionalTone::Excited),
            Prosody { rate: "fast", pitch: "+4st", volume: "loud" }
        );
        let loud: Vec<EmotionalTone> = EmotionalTone::ALL
            .iter()
            .copied()
            .filter(|t| prosody_for(*t).is_loud())
            .collect();
        assert_eq!(
            loud,
            vec![
                EmotionalTone::Tense,
                EmotionalTone::Determined,
                EmotionalTone::Excited,
                EmotionalTone::Angry,
                EmotionalTone::Passionate
            ]
        );
    }

    #[test]
    fn test_build_wraps_segments_in_order() {
        let narration = "The door creaked. Luna gasped!";
        let markup = build_markup(
            narration,
            &tones(&[("The door creaked.", "mysterious"), ("Luna gasped!", "excited")]),
            1,
        );

        assert_eq!(
            markup,
            concat!(
                "<speak>",
                r#"<prosody rate="slow" pitch="-1st" volume="soft">The door creaked.<break time="500ms"/></prosody>"#,
                " ",
                r#"<emphasis level="moderate"><prosody rate="fast" pitch="+4st" volume="loud">Luna gasped!<break time="500ms"/></prosody></emphasis>"#,
                "</speak>"
            )
        );
    }

    #[test]
    fn test_transition_pause_only_after_first_scene() {
        let t = tones(&[("Hello there", "calm")]);
        assert!(!build_markup("Hello there", &t, 1).contains(SCENE_TRANSITION_PAUSE));
        assert!(build_markup("Hello there", &t, 2).starts_with(r#"<speak><break time="1s"/>"#));
    }

    #[test]
    fn test_quote_pause_follows_entity() {
        let markup = build_markup(r#"She said "hi" softly"#, &ToneMap::new(), 1);
        assert_eq!(
            markup,
            r#"<speak>She said &quot;<break time="750ms"/>hi&quot;<break time="750ms"/> softly</speak>"#
        );
    }

    #[test]
    fn test_pauses_never_inside_tags() {
        let markup = build_markup("Wait. What?", &tones(&[("Wait.", "tense")]), 3);
        // attribute values like "+3st" and the emphasis level stay intact
        assert!(markup.contains(r#"<prosody rate="fast" pitch="+3st" volume="loud">"#));
        assert!(markup.contains(r#"<emphasis level="moderate">"#));
        assert_eq!(markup.matches(SENTENCE_PAUSE).count(), 2);
    }

    #[test]
    fn test_unknown_tone_defaults_to_calm() {
        let markup = build_markup("Something odd", &tones(&[("Something odd", "bewildered")]), 1);
        assert!(markup.contains(r#"<prosody rate="medium" pitch="medium" volume="medium">Something odd</prosody>"#));
    }

    #[test]
    fn test_tone_alias_resolves() {
        let markup = build_markup("A quiet glade", &tones(&[("A quiet glade", "Serenity")]), 1);
        assert!(markup.contains(r#"rate="medium" pitch="medium" volume="medium""#));
    }

    #[test]
    fn test_empty_narration_is_well_formed() {
        assert_eq!(build_markup("", &ToneMap::new(), 1), "<speak></speak>");
    }

    #[test]
    fn test_flatten_strips_markup() {
        let markup = r#"<speak><break time="1s"/><prosody rate="slow" pitch="-1st" volume="soft">The fox &amp; the hound.<break time="500ms"/></prosody></speak>"#;
        assert_eq!(flatten_markup(markup, "orig"), "The fox & the hound.");
    }

    #[test]
    fn test_flatten_removes_leaked_instructions() {
        let leaked = r#"<speak>prosody rate="fast" pitch: +2st volume=loud The river was slow and soft tonight. /prosody</speak>"#;
        assert_eq!(
            flatten_markup(leaked, "fallback text here"),
            "The river was slow and soft tonight."
        );
    }

    #[test]
    fn test_flatten_removes_unclosed_tag_fragments() {
        let leaked = "<speak><prosody rate=\"slow\">Night fell over the hills. &lt;/prosody emphasis&gt;</prosody></speak>";
        assert_eq!(flatten_markup(leaked, "fallback text here"), "Night fell over the hills.");
    }

    #[test]
    fn test_flatten_falls_back_when_too_short() {
        let markup = r#"<speak><prosody rate="fast">Hi.</prosody></speak>"#;
        assert_eq!(flatten_markup(markup, "Hi. Original line"), "Hi. Original line");
    }

    #[test]
    fn test_speak_body() {
        assert_eq!(speak_body("<speak>Hi <break time=\"1s\"/>there</speak>"), "Hi <break time=\"1s\"/>there");
        assert_eq!(speak_body("no wrapper"), "no wrapper");
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text("Just words, no tags"), "Just words, no tags");
        let markup = build_markup("The owl said \"hoot\" twice.", &ToneMap::new(), 2);
        assert_eq!(plain_text(&markup), "The owl said \"hoot\" twice.");
        // short documents fall back to the tag-stripped text
        assert_eq!(plain_text("<speak>Hi &amp; bye</speak>"), "Hi & bye");
    }
}
