//! autoreg Configuration Library
//!
//! This crate provides the configuration types shared by the autoreg
//! workspace: the model and dataset configuration that accompanies a trained
//! network, the decode modes and sampling policies used during generation,
//! and the error codes reported when a configuration is rejected.
//!
//! # Example
//!
//! ```
//! use autoreg_spec::{Config, DecodeMode, SamplingPolicy};
//!
//! let json = r#"{
//!     "dataset": {"sampling_rate": 16000, "mulaw": true},
//!     "model": {
//!         "dual_softmax": true,
//!         "bit_size": 16,
//!         "gaussian": false,
//!         "input_categorical": false,
//!         "hidden_size": 896,
//!         "local_size": 0,
//!         "conditioning_size": 128,
//!         "embedding_size": 256,
//!         "linear_hidden_size": 512,
//!         "local_scale": 1,
//!         "local_layer_num": 2,
//!         "weight_initializer": null
//!     }
//! }"#;
//!
//! let config = Config::from_json(json).unwrap();
//! let mode = config.model.decode_mode().unwrap();
//! assert_eq!(mode, DecodeMode::DualSoftmax { coarse_bits: 8, fine_bits: 8 });
//!
//! let policy: SamplingPolicy = "maximum".parse().unwrap();
//! assert!(!policy.is_stochastic());
//! ```
//!
//! # Modules
//!
//! - [`config`]: Model, dataset, and device configuration
//! - [`error`]: Error codes, validation results, and the `BackendError` trait
//! - [`mode`]: Decode modes and sampling policies
//! - [`validation`]: Configuration validation functions

pub mod config;
pub mod error;
pub mod mode;
pub mod validation;

// Re-export commonly used types at the crate root
pub use config::{Config, DatasetConfig, Device, ModelConfig, MAX_BIT_SIZE};
pub use error::{
    BackendError, ConfigError, ErrorCode, ValidationError, ValidationResult, ValidationWarning,
    WarningCode,
};
pub use mode::{DecodeMode, SamplingPolicy};
pub use validation::{validate_config, validate_for_generate};
