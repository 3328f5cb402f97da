//! Common utility functions used across the application

use std::path::Path;

/// Sanitize a story title so it can be used as a directory or file name.
/// Converts the name to lowercase and replaces special characters with underscores.
///
/// # Arguments
/// * `input` - The title to sanitize
///
/// # Returns
/// * A sanitized name; `"story"` when nothing usable is left
pub fn sanitize_filename(input: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|', ' ', '\t', '\n', '\r'];
    let mut result = input.trim().to_lowercase(); // Преобразуем в нижний регистр
    for c in invalid_chars {
        result = result.replace(c, "_");
    }
    // Не допускаем выхода за пределы каталога
    while result.starts_with('.') {
        result.remove(0);
    }
    if result.trim_matches('_').is_empty() {
        return "story".to_string();
    }
    result
}

/// Check if a file exists and has valid content (non-zero size)
pub async fn check_file_exists_and_valid(path: &Path) -> bool {
    if let Ok(metadata) = tokio::fs::metadata(path).await {
        if metadata.is_file() && metadata.len() > 0 {
            return true;
        }
    }
    false
}

/// Shorten text for log output, respecting char boundaries
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}
