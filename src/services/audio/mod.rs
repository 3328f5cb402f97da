// Audio utilities used by the video assembler

pub mod duration;

pub use duration::{get_audio_duration, probe_audio_duration};
