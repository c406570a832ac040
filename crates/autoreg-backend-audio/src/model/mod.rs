//! The model capability consumed by generation.
//!
//! Generation never looks inside the network. It only needs a single-step
//! forward function that maps `(hidden state, previous sample, conditioning)`
//! to distribution parameters and a new hidden state. [`WaveModel`] is that
//! capability; [`WaveRnn`] is the reference implementation shipped with the
//! crate.

mod layers;
mod wave_rnn;

use autoreg_spec::{DecodeMode, Device};
use thiserror::Error;

pub use layers::{Dense, Embedding, GruCell};
pub use wave_rnn::{WaveRnn, WaveRnnWeights};

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The forward pass failed.
    #[error("forward pass failed: {message}")]
    Forward {
        /// Error message.
        message: String,
    },

    /// A tensor had the wrong size.
    #[error("shape mismatch for {what}: expected {expected}, found {found}")]
    Shape {
        /// What was being checked.
        what: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        found: usize,
    },

    /// The model produced NaN or infinite values.
    #[error("non-finite values in {what}")]
    NonFinite {
        /// Which output contained them.
        what: String,
    },

    /// The model's output kind does not match the configured decode mode.
    #[error("unexpected model output: {message}")]
    UnexpectedOutput {
        /// Error message.
        message: String,
    },

    /// Dual-softmax decoding asked for a fine head the model lacks.
    #[error("model has no fine output head")]
    NoFineHead,

    /// The requested device is not available for this model.
    #[error("device {0} is not supported by this model")]
    UnsupportedDevice(Device),

    /// Reading or parsing a model artifact failed.
    #[error("failed to load model: {message}")]
    Load {
        /// Error message.
        message: String,
    },
}

impl ModelError {
    /// Creates a forward pass error.
    pub fn forward(message: impl Into<String>) -> Self {
        Self::Forward {
            message: message.into(),
        }
    }

    /// Creates a shape mismatch error.
    pub fn shape(what: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::Shape {
            what: what.into(),
            expected,
            found,
        }
    }

    /// Creates a load error.
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }
}

/// Recurrent state of one generation run.
///
/// Owned by exactly one run; it is replaced, never shared, on every step.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenState(Vec<f32>);

impl HiddenState {
    /// All-zero state of the given width.
    pub fn zeros(size: usize) -> Self {
        Self(vec![0.0; size])
    }

    /// Wraps an existing vector.
    pub fn from_vec(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// State width.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the state is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the raw values.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Unwraps the raw values.
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

/// Previous-sample representation fed into the next step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepInput {
    /// Class index for models with categorical input.
    Class(usize),
    /// Sample value in `[-1, 1]` for models with scalar input.
    Scalar(f32),
}

/// Distribution parameters produced by one forward step.
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionParams {
    /// Unnormalized class scores (the coarse head under dual softmax).
    Logits(Vec<f32>),
    /// Continuous distribution parameters.
    Gaussian {
        /// Location.
        mean: f32,
        /// Natural log of the scale.
        log_scale: f32,
    },
}

/// Single-step forward inference capability.
///
/// Implementations must be pure apart from the explicitly threaded
/// [`HiddenState`], so independent runs can share one model across threads.
pub trait WaveModel: Send + Sync {
    /// Hidden state width.
    fn hidden_size(&self) -> usize;

    /// Width of the per-step conditioning vector `forward` expects.
    fn conditioning_size(&self) -> usize;

    /// Decode mode the output heads were built for.
    fn decode_mode(&self) -> DecodeMode;

    /// Whether the previous sample is fed back as a class index.
    fn input_categorical(&self) -> bool;

    /// Initial hidden state for a new run.
    fn initial_state(&self) -> HiddenState {
        HiddenState::zeros(self.hidden_size())
    }

    /// Encodes raw local conditioning frames into per-step conditioning.
    ///
    /// The result has one vector per input frame.
    fn encode_local(&self, frames: &[Vec<f32>]) -> ModelResult<Vec<Vec<f32>>> {
        Ok(frames.to_vec())
    }

    /// Advances one timestep.
    fn forward(
        &self,
        hidden: &HiddenState,
        input: StepInput,
        conditioning: &[f32],
    ) -> ModelResult<(DistributionParams, HiddenState)>;

    /// Fine-head logits conditioned on the coarse class chosen this step.
    ///
    /// `hidden` is the state returned by the `forward` call of the same step.
    fn forward_fine(&self, hidden: &HiddenState, coarse: u32) -> ModelResult<Vec<f32>> {
        let _ = (hidden, coarse);
        Err(ModelError::NoFineHead)
    }
}
