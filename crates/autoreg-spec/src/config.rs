//! Model and dataset configuration.
//!
//! A [`Config`] is the JSON document that accompanies a trained model. It
//! describes the shape of the network and how its outputs are decoded into
//! audio samples. All fields are required; `weight_initializer` may be `null`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ErrorCode, ValidationError};
use crate::mode::DecodeMode;

/// Largest supported quantization resolution in bits.
pub const MAX_BIT_SIZE: u32 = 16;

/// Dataset parameters consumed by generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Sampling rate in Hz.
    pub sampling_rate: u32,
    /// Whether waveforms are mu-law companded before quantization.
    pub mulaw: bool,
}

/// Network shape and decoding mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Split each code into coarse and fine halves with two softmax heads.
    pub dual_softmax: bool,
    /// Quantization resolution in bits.
    pub bit_size: u32,
    /// Emit continuous `(mean, log_scale)` instead of class logits.
    pub gaussian: bool,
    /// Feed the previous sample back as a class embedding instead of a scalar.
    pub input_categorical: bool,
    /// Recurrent hidden state width.
    pub hidden_size: usize,
    /// Width of the raw local conditioning frames (0 disables conditioning).
    pub local_size: usize,
    /// Width of the encoded local conditioning fed to the recurrent cell.
    pub conditioning_size: usize,
    /// Embedding width for categorical input.
    pub embedding_size: usize,
    /// Width of the hidden dense layer in the output head.
    pub linear_hidden_size: usize,
    /// Number of samples covered by one local conditioning frame.
    pub local_scale: usize,
    /// Number of dense layers in the local encoder.
    pub local_layer_num: usize,
    /// Training-only initializer name.
    pub weight_initializer: Option<String>,
}

impl ModelConfig {
    /// Resolves the decode mode selected by the flags.
    ///
    /// Fails when the flags contradict each other or `bit_size` cannot be
    /// split the way the mode requires.
    pub fn decode_mode(&self) -> Result<DecodeMode, ValidationError> {
        DecodeMode::from_config(self)
    }

    /// Number of output classes for a full-resolution code.
    pub fn num_classes(&self) -> usize {
        1usize << self.bit_size
    }

    /// Whether local conditioning is enabled.
    pub fn with_local(&self) -> bool {
        self.local_size > 0
    }

    /// Width of the per-step conditioning vector after encoding.
    pub fn step_conditioning_size(&self) -> usize {
        if self.with_local() {
            self.conditioning_size
        } else {
            0
        }
    }

    /// Width of the per-step sample input.
    pub fn input_size(&self) -> usize {
        if self.input_categorical {
            self.embedding_size
        } else {
            1
        }
    }
}

/// Full generation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dataset parameters.
    pub dataset: DatasetConfig,
    /// Model parameters.
    pub model: ModelConfig,
}

impl Config {
    /// Parses a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the config to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reads and parses a config file without validating it.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }
}

/// Where the model computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    /// Host CPU.
    #[default]
    Cpu,
    /// GPU with the given device index.
    Gpu(u32),
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Gpu(index) => write!(f, "gpu:{}", index),
        }
    }
}

impl std::str::FromStr for Device {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "cpu" {
            return Ok(Device::Cpu);
        }
        let index = match lower.split_once(':') {
            Some(("gpu" | "cuda", index)) => index.parse::<u32>().ok(),
            None if lower == "gpu" || lower == "cuda" => Some(0),
            _ => None,
        };
        index.map(Device::Gpu).ok_or_else(|| {
            ValidationError::new(
                ErrorCode::UnknownDevice,
                format!("unknown device '{}' (expected cpu or gpu:N)", s),
            )
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_config() -> Config {
        Config {
            dataset: DatasetConfig {
                sampling_rate: 8000,
                mulaw: true,
            },
            model: ModelConfig {
                dual_softmax: false,
                bit_size: 10,
                gaussian: false,
                input_categorical: true,
                hidden_size: 896,
                local_size: 0,
                conditioning_size: 128,
                embedding_size: 256,
                linear_hidden_size: 512,
                local_scale: 1,
                local_layer_num: 2,
                weight_initializer: None,
            },
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = sample_config();
        let json = config.to_json_pretty().unwrap();
        let parsed = Config::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let json = r#"{
            "dataset": {"sampling_rate": 8000, "mulaw": true, "extra": 1},
            "model": {}
        }"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    fn test_config_requires_every_model_field() {
        let mut value = serde_json::to_value(sample_config()).unwrap();
        value["model"].as_object_mut().unwrap().remove("hidden_size");
        assert!(serde_json::from_value::<Config>(value).is_err());
    }

    #[test]
    fn test_derived_sizes() {
        let mut model = sample_config().model;
        assert_eq!(model.num_classes(), 1024);
        assert_eq!(model.input_size(), 256);
        assert_eq!(model.step_conditioning_size(), 0);

        model.input_categorical = false;
        model.local_size = 80;
        assert_eq!(model.input_size(), 1);
        assert_eq!(model.step_conditioning_size(), 128);
    }

    #[test]
    fn test_device_parse() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("gpu:1".parse::<Device>().unwrap(), Device::Gpu(1));
        assert_eq!("CUDA:0".parse::<Device>().unwrap(), Device::Gpu(0));
        assert_eq!("gpu".parse::<Device>().unwrap(), Device::Gpu(0));
        assert_eq!(Device::Gpu(3).to_string(), "gpu:3");

        let err = "tpu".parse::<Device>().unwrap_err();
        assert_eq!(err.error_code(), Some(ErrorCode::UnknownDevice));
    }
}
