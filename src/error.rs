//! Error types for dermascan.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dermascan operations.
pub type Result<T> = std::result::Result<T, DermascanError>;

/// Errors that can occur while loading the model or serving predictions.
#[derive(Debug, Error)]
pub enum DermascanError {
    /// Model loading failed.
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    /// Uploaded bytes could not be decoded as an image.
    #[error("Invalid image file: {0}")]
    InvalidImage(String),

    /// The request body is malformed or missing the upload field.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The model is not loaded; predictions cannot be served.
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    /// Forward pass failed.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Invalid tensor.
    #[error("Invalid tensor: {0}")]
    Tensor(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl DermascanError {
    /// Create a model load error.
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create an invalid image error.
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an inference error.
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a tensor error.
    pub fn tensor(msg: impl Into<String>) -> Self {
        Self::Tensor(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DermascanError::model_load("shape mismatch");
        assert_eq!(format!("{}", err), "Model loading failed: shape mismatch");

        let err = DermascanError::invalid_image("unsupported format");
        assert_eq!(format!("{}", err), "Invalid image file: unsupported format");

        let err = DermascanError::invalid_request("no file field in multipart body");
        assert_eq!(
            format!("{}", err),
            "Invalid request: no file field in multipart body"
        );

        let err = DermascanError::FileNotFound(PathBuf::from("/path/to/weights.safetensors"));
        assert_eq!(
            format!("{}", err),
            "File not found: /path/to/weights.safetensors"
        );
    }
}
