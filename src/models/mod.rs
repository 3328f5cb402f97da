// Domain models module
// Contains the script and result data structures used throughout the pipeline

pub mod assets;
pub mod progress;
pub mod story;

// Экспортируем основные типы для удобства использования
pub use assets::{
    AssetKind, AssetStatus, AssetSummary, CompilationResult, CompiledOutput, KindSummary,
    status_for,
};
pub use progress::ProgressUpdate;
pub use story::{EmotionalTone, MIN_TONE_COVERAGE, Scene, Story, StoryMetadata, ToneMap};
