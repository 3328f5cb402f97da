//! Interactive browser bundle
//!
//! Один HTML файл рядом с ассетами: сцены встроены как JSON, навигация
//! кнопками и стрелками, одна сцена на экране. Картинки и аудио
//! ссылаются относительно, по имени файла.

use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::errors::AppResult;
use crate::models::{AssetStatus, Story, status_for};

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{TITLE}}</title>
<style>
  body { margin: 0; font-family: Georgia, serif; background: #1e2a36; color: #f5f5f5; }
  header { text-align: center; padding: 24px 16px 8px; }
  header p { color: #b8c4cf; max-width: 760px; margin: 8px auto; }
  .scene { display: none; max-width: 960px; margin: 0 auto; padding: 16px; }
  .scene.active { display: block; }
  .scene img { width: 100%; border-radius: 8px; }
  .placeholder { width: 100%; aspect-ratio: 16 / 9; display: flex; align-items: center;
    justify-content: center; background: #2c3e50; border-radius: 8px; color: #7f8c8d; }
  .narration { font-size: 1.3em; line-height: 1.6; }
  .transition { font-style: italic; color: #95a5a6; }
  nav { display: flex; justify-content: center; align-items: center; gap: 24px; padding: 16px; }
  button { font-size: 1em; padding: 8px 20px; border: none; border-radius: 4px; cursor: pointer; }
  button:disabled { opacity: 0.4; cursor: default; }
</style>
</head>
<body>
<header>
  <h1>{{TITLE}}</h1>
  <p>{{SUMMARY}}</p>
</header>
<main id="scenes"></main>
<nav>
  <button id="prev">&larr; Previous</button>
  <span id="indicator"></span>
  <button id="next">Next &rarr;</button>
</nav>
<script>
const scenes = {{SCENES_JSON}};
let current = 0;

function text(tag, cls, value) {
  const el = document.createElement(tag);
  if (cls) el.className = cls;
  el.textContent = value;
  return el;
}

function build() {
  const root = document.getElementById("scenes");
  scenes.forEach((scene) => {
    const section = document.createElement("section");
    section.className = "scene";
    if (scene.transition_from_previous) {
      section.appendChild(text("p", "transition", scene.transition_from_previous));
    }
    if (scene.image) {
      const img = document.createElement("img");
      img.src = scene.image;
      img.alt = "Scene " + scene.scene_number;
      section.appendChild(img);
    } else {
      section.appendChild(text("div", "placeholder", "Image not available"));
    }
    section.appendChild(text("p", "narration", scene.narration_text));
    if (scene.audio) {
      const audio = document.createElement("audio");
      audio.controls = true;
      audio.src = scene.audio;
      section.appendChild(audio);
    }
    if (scene.transition_to_next) {
      section.appendChild(text("p", "transition", scene.transition_to_next));
    }
    root.appendChild(section);
  });
}

function show(index) {
  if (index < 0 || index >= scenes.length) return;
  const sections = document.querySelectorAll(".scene");
  sections.forEach((s) => {
    s.classList.remove("active");
    s.querySelectorAll("audio").forEach((a) => a.pause());
  });
  sections[index].classList.add("active");
  current = index;
  document.getElementById("indicator").textContent =
    "Scene " + (index + 1) + " of " + scenes.length;
  document.getElementById("prev").disabled = index === 0;
  document.getElementById("next").disabled = index === scenes.length - 1;
}

document.getElementById("prev").addEventListener("click", () => show(current - 1));
document.getElementById("next").addEventListener("click", () => show(current + 1));
document.addEventListener("keydown", (e) => {
  if (e.key === "ArrowLeft") show(current - 1);
  if (e.key === "ArrowRight") show(current + 1);
});

build();
show(0);
</script>
</body>
</html>
"#;

/// Scene data embedded in the page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BundleScene {
    pub scene_number: u32,
    pub narration_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_from_previous: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_to_next: Option<String>,
    /// Relative file name, absent when the asset was not generated
    pub image: Option<String>,
    pub audio: Option<String>,
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn relative_name(statuses: Option<&[AssetStatus]>, scene_number: u32) -> Option<String> {
    statuses
        .and_then(|list| status_for(list, scene_number))
        .filter(|s| s.generated())
        .and_then(AssetStatus::file_name)
}

pub fn bundle_scenes(
    story: &Story,
    images: Option<&[AssetStatus]>,
    audio: Option<&[AssetStatus]>,
) -> Vec<BundleScene> {
    let mut scenes: Vec<BundleScene> = story
        .scenes
        .iter()
        .map(|scene| BundleScene {
            scene_number: scene.scene_number,
            narration_text: scene.narration_text.clone(),
            transition_from_previous: scene.transition_from_previous.clone(),
            transition_to_next: scene.transition_to_next.clone(),
            image: relative_name(images, scene.scene_number),
            audio: relative_name(audio, scene.scene_number),
        })
        .collect();
    scenes.sort_by_key(|s| s.scene_number);
    scenes
}

pub fn render_html(
    story: &Story,
    title: &str,
    images: Option<&[AssetStatus]>,
    audio: Option<&[AssetStatus]>,
) -> AppResult<String> {
    let scenes = bundle_scenes(story, images, audio);
    // "</" внутри <script> закрыл бы тег раньше времени
    let scenes_json = serde_json::to_string(&scenes)?.replace("</", "<\\/");

    let title = escape_html(title);
    let summary = escape_html(&story.story_summary);
    Ok(fill_template(
        TEMPLATE,
        &[
            ("TITLE", title.as_str()),
            ("SUMMARY", summary.as_str()),
            ("SCENES_JSON", scenes_json.as_str()),
        ],
    ))
}

/// Substitute `{{NAME}}` placeholders in one pass over the template.
/// Inserted values are never scanned again; unknown placeholders stay as is.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after.find("}}").and_then(|end| {
            let name = &after[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Write `<title>_interactive.html` into `output_dir`
pub async fn write_html(
    story: &Story,
    title: &str,
    images: Option<&[AssetStatus]>,
    audio: Option<&[AssetStatus]>,
    output_dir: &Path,
    file_stem: &str,
) -> AppResult<PathBuf> {
    let html = render_html(story, title, images, audio)?;
    let path = output_dir.join(format!("{}_interactive.html", file_stem));
    tokio::fs::write(&path, html).await?;
    info!("Interactive bundle written to {}", path.display());
    Ok(path)
}
