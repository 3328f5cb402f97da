// Services module
// Asset generation, validation and compilation

pub mod audio;
pub mod compiler;
pub mod generation;
pub mod image;
pub mod pipeline;
pub mod speech;
pub mod validation;

pub use pipeline::{PipelineReport, StoryPipeline};
