//! Error types for the audio backend.

use std::path::PathBuf;

use autoreg_spec::{BackendError, ConfigError};
use thiserror::Error;

use crate::model::ModelError;

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors that can occur during generation, I/O, or silence extraction.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Configuration rejected before any computation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The model failed while a generation run was stepping.
    #[error("model invocation failed for utterance {utterance} at step {step}: {source}")]
    ModelInvocation {
        /// Index of the utterance within the batch.
        utterance: usize,
        /// Step at which the model failed.
        step: usize,
        /// Underlying model failure.
        #[source]
        source: ModelError,
    },

    /// Model construction or loading failed.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Invalid generation request.
    #[error("invalid input '{name}': {message}")]
    InvalidInput {
        /// Request field name.
        name: String,
        /// Error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV decoding error.
    #[error("failed to read WAV '{}': {source}", .path.display())]
    WavRead {
        /// File being read.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: hound::Error,
    },

    /// Resampling error.
    #[error("resampling failed: {message}")]
    Resample {
        /// Error message.
        message: String,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A batch item failed; the whole batch is aborted.
    #[error("failed to process '{}': {source}", .path.display())]
    File {
        /// File that failed.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: Box<AudioError>,
    },
}

impl AudioError {
    /// Creates an invalid input error.
    pub fn invalid_input(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Wraps an error with the file it came from.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

impl BackendError for AudioError {
    fn code(&self) -> &'static str {
        match self {
            AudioError::Config(_) => "AUTOREG_001",
            AudioError::ModelInvocation { .. } => "AUTOREG_002",
            AudioError::Model(_) => "AUTOREG_003",
            AudioError::InvalidInput { .. } => "AUTOREG_004",
            AudioError::Io(_) => "AUTOREG_005",
            AudioError::WavRead { .. } => "AUTOREG_006",
            AudioError::Resample { .. } => "AUTOREG_007",
            AudioError::Json(_) => "AUTOREG_008",
            AudioError::File { source, .. } => source.code(),
        }
    }

    fn category(&self) -> &'static str {
        match self {
            AudioError::Config(_) | AudioError::InvalidInput { .. } => "config",
            AudioError::ModelInvocation { .. } | AudioError::Model(_) => "model",
            AudioError::File { source, .. } => source.category(),
            _ => "io",
        }
    }
}
