// Error handling module
// Contains the error taxonomy shared by generation, validation and compilation

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError;

// Application error type
#[derive(Debug, Error, Serialize)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Asset validation failed: {0}")]
    ValidationError(String),

    #[error("Compilation error: {0}")]
    CompilationError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Video processing error: {0}")]
    VideoProcessingError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("IO error: {0}")]
    #[serde(serialize_with = "serialize_io_error")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Other error: {0}")]
    Other(String),

    #[error(transparent)]
    #[serde(skip)]
    AnyhowError(#[from] anyhow::Error),
}

// std::io::Error does not implement serde::Serialize
fn serialize_io_error<S>(err: &std::io::Error, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&err.to_string())
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ApiError(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Other(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl<T> From<SendError<T>> for AppError {
    fn from(err: SendError<T>) -> Self {
        AppError::Other(format!("Failed to send message: {}", err))
    }
}

// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AppError::ValidationError("Missing images for scenes: [2]".to_string());
        assert_eq!(
            err.to_string(),
            "Asset validation failed: Missing images for scenes: [2]"
        );

        let err: AppError = "boom".into();
        assert!(matches!(err, AppError::Other(_)));
    }

    #[test]
    fn test_io_error_serializes_as_string() {
        let err = AppError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["IoError"], "gone");
    }
}
