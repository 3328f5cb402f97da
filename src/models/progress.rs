use serde::{Deserialize, Serialize};

use super::assets::AssetKind;

/// Обновления о прогрессе обработки истории
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ProgressUpdate {
    /// Начало обработки
    Started { scenes: usize },
    /// Завершена генерация одного ассета
    AssetFinished {
        kind: AssetKind,
        scene_number: u32,
        generated: bool,
        completed: usize,
        total: usize,
    },
    /// Результат проверки ассетов
    Validated { passed: bool },
    /// Собран один формат
    FormatFinished { format: String, success: bool },
    /// Завершение обработки
    Completed { success: bool },
}
