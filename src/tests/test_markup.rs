use super::{scene, three_scene_story};
use crate::models::{MIN_TONE_COVERAGE, ToneMap};
use crate::services::speech::markup::{QUOTE_PAUSE, SENTENCE_PAUSE, build_markup, flatten_markup, plain_text};
use crate::services::speech::SpeechGenerator;

fn normalized(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Для сценария с покрытием >= 70% плоский текст совпадает с исходным
#[test]
fn test_flattened_markup_reproduces_narration() {
    for scene in three_scene_story().scenes {
        assert!(scene.tone_coverage() >= MIN_TONE_COVERAGE);
        let markup = build_markup(&scene.narration_text, &scene.narration_tones, scene.scene_number);
        let flat = flatten_markup(&markup, &scene.narration_text);
        assert_eq!(flat, normalized(&scene.narration_text), "scene {}", scene.scene_number);
    }
}

#[test]
fn test_markup_structure_for_quoted_scene() {
    let story = three_scene_story();
    let second = &story.scenes[1];
    let markup = build_markup(&second.narration_text, &second.narration_tones, 2);

    assert!(markup.starts_with(r#"<speak><break time="1s"/>"#));
    assert!(markup.ends_with("</speak>"));
    assert!(markup.contains(&format!("&quot;{}", QUOTE_PAUSE)));
    assert!(markup.contains(&format!("?{}", SENTENCE_PAUSE)));
    // tense и sad идут в порядке карты
    let tense = markup.find(r#"rate="fast""#);
    let sad = markup.find(r#"rate="slow""#);
    assert!(tense.is_some() && sad.is_some());
    assert!(tense < sad);
}

#[test]
fn test_low_coverage_still_produces_valid_markup() {
    let low = scene(
        1,
        "The old lighthouse keeper climbed the stairs one last time and looked out at the sea.",
        &[("looked out at the sea.", "nostalgic")],
    );
    assert!(low.tone_coverage() < MIN_TONE_COVERAGE);

    let markup = build_markup(&low.narration_text, &low.narration_tones, 1);
    assert_eq!(markup.matches("<prosody").count(), 1);
    assert_eq!(flatten_markup(&markup, &low.narration_text), low.narration_text);
}

#[test]
fn test_unmatched_and_out_of_order_segments_are_skipped() {
    let tones: ToneMap = [
        ("second half.", "joyful"),
        ("First half,", "sad"),
        ("not in the text", "angry"),
    ]
    .into_iter()
    .collect();
    let narration = "First half, second half.";

    let markup = build_markup(narration, &tones, 1);
    // "First half," ищется только после курсора и пропускается
    assert_eq!(markup.matches("<prosody").count(), 1);
    assert_eq!(flatten_markup(&markup, narration), narration);
}

#[test]
fn test_markup_without_tones_is_plain_speak_document() {
    let markup = build_markup("Just words here.", &ToneMap::new(), 1);
    assert_eq!(markup, format!("<speak>Just words here.{}</speak>", SENTENCE_PAUSE));
    assert_eq!(plain_text(&markup), "Just words here.");
}

#[test]
fn test_preview_matches_generated_input() {
    let story = three_scene_story();
    let generator = SpeechGenerator::new(Vec::new(), 1, std::time::Duration::from_secs(1));
    let first = &story.scenes[0];
    assert_eq!(
        generator.preview_markup(first),
        build_markup(&first.narration_text, &first.narration_tones, 1)
    );
}

/// Обычные слова "speak", "emphasis", "pitch:" остаются в тексте
#[test]
fn test_flatten_keeps_instruction_like_words_in_narration() {
    let narration = "Luna tried to speak, but only a whisper came out.";
    let tones: ToneMap = [("Luna tried to speak,", "vulnerable")].into_iter().collect();
    let markup = build_markup(narration, &tones, 1);
    assert_eq!(flatten_markup(&markup, narration), narration);
    assert_eq!(plain_text(&markup), narration);

    let narration = "The night was pitch: black. She spoke with emphasis on every word, and the wind's rate was slow.";
    let tones: ToneMap = [
        ("The night was pitch: black.", "mysterious"),
        ("She spoke with emphasis on every word,", "determined"),
    ]
    .into_iter()
    .collect();
    let markup = build_markup(narration, &tones, 2);
    assert_eq!(flatten_markup(&markup, narration), narration);
    assert_eq!(plain_text(&markup), narration);
}
