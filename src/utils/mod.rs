pub mod common;
pub mod ffmpeg;
pub mod http;
pub mod logger;
