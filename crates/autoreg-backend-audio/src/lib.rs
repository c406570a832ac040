//! autoreg Audio Backend
//!
//! This crate implements autoregressive waveform generation and the silence
//! preprocessing used to prepare training data.
//!
//! # Overview
//!
//! A [`Generator`] drives a recurrent [`WaveModel`] one sample at a time.
//! Each step produces distribution parameters that are decoded according to
//! the configured mode:
//!
//! - **Categorical** - one softmax over `2^bit_size` classes
//! - **Dual softmax** - coarse (high bits) then fine (low bits) softmax heads
//! - **Gaussian** - a continuous `(mean, log_scale)` output
//!
//! Decoded codes are dequantized and, when the dataset is mu-law companded,
//! expanded back to linear amplitude.
//!
//! # Determinism
//!
//! The `maximum` policy never consults an RNG and is bit-reproducible. The
//! `random` policy draws from a PCG32 stream per utterance, seeded via BLAKE3
//! from the generator seed and the utterance index, so batches are
//! reproducible for a fixed seed regardless of thread scheduling.
//!
//! # Example
//!
//! ```
//! use autoreg_backend_audio::{Generator, WaveRnn};
//! use autoreg_spec::{Config, DatasetConfig, ModelConfig, SamplingPolicy};
//!
//! let config = Config {
//!     dataset: DatasetConfig { sampling_rate: 8000, mulaw: true },
//!     model: ModelConfig {
//!         dual_softmax: false,
//!         bit_size: 8,
//!         gaussian: false,
//!         input_categorical: true,
//!         hidden_size: 16,
//!         local_size: 0,
//!         conditioning_size: 8,
//!         embedding_size: 8,
//!         linear_hidden_size: 16,
//!         local_scale: 1,
//!         local_layer_num: 2,
//!         weight_initializer: None,
//!     },
//! };
//!
//! let model = WaveRnn::random(config.model.clone(), 7).unwrap();
//! let generator = Generator::new(config, model).unwrap();
//! let wave = generator.generate(0.01, SamplingPolicy::Maximum).unwrap();
//! assert_eq!(wave.len(), 80);
//! ```
//!
//! # Crate Structure
//!
//! - [`codec`] - Mu-law companding and quantization
//! - [`decoder`] - Distribution decoding under a sampling policy
//! - [`generate`] - Utterance and batch generation
//! - [`model`] - The model capability and the reference WaveRNN
//! - [`pool`] - Scoped worker pool for batch items
//! - [`rng`] - Deterministic RNG with seed derivation
//! - [`silence`] - Silence splitting and per-file masks
//! - [`stepper`] - Recurrent state threading
//! - [`wave`] - Waveform type and WAV I/O

pub mod codec;
pub mod decoder;
pub mod error;
pub mod generate;
pub mod model;
pub mod pool;
pub mod rng;
pub mod silence;
pub mod stepper;
pub mod wave;

// Re-export main types at crate root
pub use codec::WaveformCodec;
pub use decoder::{Decoded, DistributionDecoder};
pub use error::{AudioError, AudioResult};
pub use generate::{GenerateRequest, Generator};
pub use model::{
    DistributionParams, HiddenState, ModelError, ModelResult, StepInput, WaveModel, WaveRnn,
};
pub use silence::{extract_silence, write_masks, FileMask, SilenceMask, SplitConfig};
pub use stepper::RecurrentStepper;
pub use wave::Wave;
