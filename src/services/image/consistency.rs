//! Visual continuity helpers for image prompts

use crate::models::Scene;

const CONTINUITY_SUFFIX: &str =
    " --style consistent children's book illustration, same artistic style throughout";

// Категории стиля в порядке вывода
const STYLE_KEYWORDS: [(&str, &[&str]); 4] = [
    ("art_style", &["watercolor", "digital art", "oil painting", "illustration"]),
    ("lighting", &["golden hour", "soft light", "dramatic lighting", "moonlight"]),
    ("mood", &["whimsical", "mysterious", "bright", "dark", "cheerful"]),
    ("color_palette", &["warm colors", "cool colors", "pastel", "vibrant"]),
];

/// Add continuity hints to a single prompt.
///
/// Scenes after the first get a prefix tying them to the earlier images;
/// every prompt gets the fixed style suffix.
pub fn enhance_prompt(prompt: &str, scene_number: u32) -> String {
    let mut enhanced = String::with_capacity(prompt.len() + 160);
    if scene_number > 1 {
        enhanced.push_str(&format!(
            "Scene {} in the same visual style as previous scenes. ",
            scene_number
        ));
    }
    enhanced.push_str(prompt.trim());
    enhanced.push_str(CONTINUITY_SUFFIX);
    enhanced
}

/// First matching keyword per style category, in category order
pub fn extract_style_elements(description: &str) -> Vec<&'static str> {
    let lower = description.to_lowercase();
    STYLE_KEYWORDS
        .iter()
        .filter_map(|(_, keywords)| keywords.iter().copied().find(|k| lower.contains(k)))
        .collect()
}

/// Build prompts for the whole story, carrying the style of scene 1 forward.
///
/// Later scenes that do not already mention a style element of the first
/// scene get a "Maintain consistent ..." clause appended.
pub fn optimize_visual_consistency(scenes: &[Scene]) -> Vec<String> {
    let Some(first) = scenes.first() else {
        return Vec::new();
    };
    let base_style = extract_style_elements(&first.visual_description);

    scenes
        .iter()
        .enumerate()
        .map(|(i, scene)| {
            let description = scene.visual_description.trim().to_string();
            if i == 0 || base_style.is_empty() {
                return description;
            }
            let lower = description.to_lowercase();
            let missing: Vec<&str> = base_style
                .iter()
                .copied()
                .filter(|element| !lower.contains(element))
                .collect();
            if missing.is_empty() {
                description
            } else {
                format!(
                    "{} Maintain consistent {} throughout.",
                    description,
                    missing.join(", ")
                )
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ToneMap;

    fn scene(number: u32, visual: &str) -> Scene {
        Scene {
            scene_number: number,
            plot_summary: String::new(),
            visual_description: visual.to_string(),
            narration_text: "text".to_string(),
            narration_tones: ToneMap::new(),
            transition_from_previous: None,
            transition_to_next: None,
        }
    }

    #[test]
    fn test_enhance_prompt() {
        assert_eq!(
            enhance_prompt("A fox in the snow", 1),
            "A fox in the snow --style consistent children's book illustration, same artistic style throughout"
        );
        assert!(enhance_prompt("A fox", 2).starts_with("Scene 2 in the same visual style as previous scenes. A fox"));
    }

    #[test]
    fn test_extract_style_elements() {
        let style = extract_style_elements("Watercolor forest under moonlight, whimsical and pastel");
        assert_eq!(style, vec!["watercolor", "moonlight", "whimsical", "pastel"]);
        assert!(extract_style_elements("a plain room").is_empty());
    }

    #[test]
    fn test_optimize_visual_consistency() {
        let scenes = vec![
            scene(1, "Watercolor meadow in golden hour"),
            scene(2, "A rabbit by the river"),
            scene(3, "A watercolor owl at golden hour"),
        ];
        let prompts = optimize_visual_consistency(&scenes);
        assert_eq!(prompts[0], "Watercolor meadow in golden hour");
        assert_eq!(
            prompts[1],
            "A rabbit by the river Maintain consistent watercolor, golden hour throughout."
        );
        assert_eq!(prompts[2], "A watercolor owl at golden hour");
    }
}
