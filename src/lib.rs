// storyreel: story script -> per-scene images and narration -> manifest, bundle, video

pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use errors::{AppError, AppResult};
pub use models::{CompilationResult, Story};
pub use services::{PipelineReport, StoryPipeline};

#[cfg(test)]
mod tests;
