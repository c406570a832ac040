//! Reference WaveRNN network.
//!
//! A single GRU layer driven by the previous sample (embedded class or raw
//! scalar) and optional encoded local conditioning, followed by a two-layer
//! output head. Under dual softmax a second head produces the fine half of
//! the code from the new hidden state and the coarse class chosen this step.
//!
//! Artifacts are JSON documents `{ "config": ModelConfig, "weights": ... }`.

use std::path::Path;

use autoreg_spec::{DecodeMode, Device, ModelConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::layers::{Dense, Embedding, GruCell};
use super::{DistributionParams, HiddenState, ModelError, ModelResult, StepInput, WaveModel};
use crate::codec::decode_single;
use crate::rng::{create_rng, derive_component_seed};

/// All trainable parameters of a [`WaveRnn`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaveRnnWeights {
    /// Class embedding, present when the input is categorical.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Embedding>,
    /// Local conditioning encoder layers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local: Vec<Dense>,
    /// Recurrent cell.
    pub gru: GruCell,
    /// Hidden dense layer of the output head.
    pub o1: Dense,
    /// Output projection (class logits, coarse logits, or mean/log-scale).
    pub o2: Dense,
    /// Hidden dense layer of the fine head.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fine_o1: Option<Dense>,
    /// Output projection of the fine head.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fine_o2: Option<Dense>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Artifact {
    config: ModelConfig,
    weights: WaveRnnWeights,
}

#[derive(Serialize)]
struct ArtifactRef<'a> {
    config: &'a ModelConfig,
    weights: &'a WaveRnnWeights,
}

/// GRU-based autoregressive waveform model.
#[derive(Debug, Clone)]
pub struct WaveRnn {
    config: ModelConfig,
    mode: DecodeMode,
    weights: WaveRnnWeights,
    device: Device,
}

impl WaveRnn {
    /// Builds a model from explicit weights, validating every shape.
    pub fn new(config: ModelConfig, weights: WaveRnnWeights, device: Device) -> ModelResult<Self> {
        if device != Device::Cpu {
            return Err(ModelError::UnsupportedDevice(device));
        }
        let mode = config
            .decode_mode()
            .map_err(|e| ModelError::load(e.to_string()))?;
        check_weights(&config, mode, &weights)?;

        Ok(Self {
            config,
            mode,
            weights,
            device,
        })
    }

    /// Builds a deterministically initialized, untrained model.
    pub fn random(config: ModelConfig, seed: u32) -> ModelResult<Self> {
        let mode = config
            .decode_mode()
            .map_err(|e| ModelError::load(e.to_string()))?;
        let rng_for = |key: &str| create_rng(derive_component_seed(seed, key));

        let hidden = config.hidden_size;
        let linear = config.linear_hidden_size;
        let cond = config.step_conditioning_size();

        let embedding = config.input_categorical.then(|| {
            Embedding::random(
                config.num_classes(),
                config.embedding_size,
                &mut rng_for("embedding"),
            )
        });

        let mut local = Vec::new();
        if config.with_local() {
            let mut rng = rng_for("local");
            for layer in 0..config.local_layer_num {
                let cols = if layer == 0 { config.local_size } else { cond };
                local.push(Dense::random(cond, cols, &mut rng));
            }
        }

        let gru = GruCell::random(config.input_size() + cond, hidden, &mut rng_for("gru"));
        let o1 = Dense::random(linear, hidden, &mut rng_for("o1"));
        let o2 = Dense::random(mode.output_size(), linear, &mut rng_for("o2"));

        let (fine_o1, fine_o2) = match mode.fine_size() {
            Some(fine) => (
                Some(Dense::random(linear, hidden + 1, &mut rng_for("fine_o1"))),
                Some(Dense::random(fine, linear, &mut rng_for("fine_o2"))),
            ),
            None => (None, None),
        };

        let weights = WaveRnnWeights {
            embedding,
            local,
            gru,
            o1,
            o2,
            fine_o1,
            fine_o2,
        };
        Self::new(config, weights, Device::Cpu)
    }

    /// Parses a model artifact from JSON.
    pub fn from_json(json: &str, device: Device) -> ModelResult<Self> {
        let artifact: Artifact =
            serde_json::from_str(json).map_err(|e| ModelError::load(e.to_string()))?;
        Self::new(artifact.config, artifact.weights, device)
    }

    /// Serializes the model artifact to JSON.
    pub fn to_json(&self) -> ModelResult<String> {
        serde_json::to_string(&ArtifactRef {
            config: &self.config,
            weights: &self.weights,
        })
        .map_err(|e| ModelError::load(e.to_string()))
    }

    /// Loads a model artifact from disk onto `device`.
    pub fn load(path: &Path, device: Device) -> ModelResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ModelError::load(format!("{}: {}", path.display(), e)))?;
        let model = Self::from_json(&json, device)?;
        debug!(
            path = %path.display(),
            hidden_size = model.config.hidden_size,
            bit_size = model.config.bit_size,
            "loaded WaveRNN artifact"
        );
        Ok(model)
    }

    /// Writes the model artifact to disk.
    pub fn save(&self, path: &Path) -> ModelResult<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .map_err(|e| ModelError::load(format!("{}: {}", path.display(), e)))
    }

    /// Model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Decode mode the output head was built for.
    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Device the model computes on.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Model parameters.
    pub fn weights(&self) -> &WaveRnnWeights {
        &self.weights
    }

    fn embed_input(&self, input: StepInput) -> ModelResult<Vec<f32>> {
        match (&self.weights.embedding, input) {
            (Some(embedding), StepInput::Class(class)) => Ok(embedding.lookup(class)?.to_vec()),
            (None, StepInput::Scalar(x)) => Ok(vec![x]),
            (Some(_), StepInput::Scalar(_)) => Err(ModelError::forward(
                "model expects categorical input but received a scalar",
            )),
            (None, StepInput::Class(_)) => Err(ModelError::forward(
                "model expects scalar input but received a class",
            )),
        }
    }
}

impl WaveModel for WaveRnn {
    fn hidden_size(&self) -> usize {
        self.config.hidden_size
    }

    fn conditioning_size(&self) -> usize {
        self.config.step_conditioning_size()
    }

    fn decode_mode(&self) -> DecodeMode {
        self.mode
    }

    fn input_categorical(&self) -> bool {
        self.config.input_categorical
    }

    fn encode_local(&self, frames: &[Vec<f32>]) -> ModelResult<Vec<Vec<f32>>> {
        frames
            .iter()
            .map(|frame| {
                if frame.len() != self.config.local_size {
                    return Err(ModelError::shape(
                        "local frame",
                        self.config.local_size,
                        frame.len(),
                    ));
                }
                let mut x = frame.clone();
                for layer in &self.weights.local {
                    x = layer.forward(&x);
                    x.iter_mut().for_each(|v| *v = v.tanh());
                }
                Ok(x)
            })
            .collect()
    }

    fn forward(
        &self,
        hidden: &HiddenState,
        input: StepInput,
        conditioning: &[f32],
    ) -> ModelResult<(DistributionParams, HiddenState)> {
        if hidden.len() != self.config.hidden_size {
            return Err(ModelError::shape(
                "hidden state",
                self.config.hidden_size,
                hidden.len(),
            ));
        }
        let cond = self.conditioning_size();
        if conditioning.len() != cond {
            return Err(ModelError::shape("conditioning", cond, conditioning.len()));
        }

        let mut x = self.embed_input(input)?;
        x.extend_from_slice(conditioning);

        let h = self.weights.gru.step(&x, hidden.as_slice());
        let out = self.weights.o2.forward(&relu(self.weights.o1.forward(&h)));
        ensure_finite(&h, "hidden state")?;
        ensure_finite(&out, "output head")?;

        let params = match self.mode {
            DecodeMode::Gaussian { .. } => DistributionParams::Gaussian {
                mean: out[0],
                log_scale: out[1],
            },
            DecodeMode::Categorical { .. } | DecodeMode::DualSoftmax { .. } => {
                DistributionParams::Logits(out)
            }
        };
        Ok((params, HiddenState::from_vec(h)))
    }

    fn forward_fine(&self, hidden: &HiddenState, coarse: u32) -> ModelResult<Vec<f32>> {
        let (DecodeMode::DualSoftmax { coarse_bits, .. }, Some(fine_o1), Some(fine_o2)) =
            (self.mode, &self.weights.fine_o1, &self.weights.fine_o2)
        else {
            return Err(ModelError::NoFineHead);
        };
        if coarse >> coarse_bits != 0 {
            return Err(ModelError::forward(format!(
                "coarse class {} out of range for {} bits",
                coarse, coarse_bits
            )));
        }

        let mut x = hidden.as_slice().to_vec();
        x.push(decode_single(coarse, coarse_bits) as f32);
        let out = fine_o2.forward(&relu(fine_o1.forward(&x)));
        ensure_finite(&out, "fine head")?;
        Ok(out)
    }
}

fn check_weights(config: &ModelConfig, mode: DecodeMode, weights: &WaveRnnWeights) -> ModelResult<()> {
    let hidden = config.hidden_size;
    let linear = config.linear_hidden_size;
    let cond = config.step_conditioning_size();

    match (&weights.embedding, config.input_categorical) {
        (Some(embedding), true) => embedding.check(config.num_classes(), config.embedding_size)?,
        (None, false) => {}
        (None, true) => return Err(ModelError::load("categorical input requires an embedding")),
        (Some(_), false) => return Err(ModelError::load("scalar input model has an embedding")),
    }

    if config.with_local() {
        if weights.local.len() != config.local_layer_num {
            return Err(ModelError::shape(
                "local encoder layers",
                config.local_layer_num,
                weights.local.len(),
            ));
        }
        for (i, layer) in weights.local.iter().enumerate() {
            let cols = if i == 0 { config.local_size } else { cond };
            layer.check(&format!("local[{}]", i), cond, cols)?;
        }
    } else if !weights.local.is_empty() {
        return Err(ModelError::load("local encoder present but local_size is 0"));
    }

    weights.gru.check(config.input_size() + cond, hidden)?;
    weights.o1.check("o1", linear, hidden)?;
    weights.o2.check("o2", mode.output_size(), linear)?;

    match (mode.fine_size(), &weights.fine_o1, &weights.fine_o2) {
        (Some(fine), Some(fine_o1), Some(fine_o2)) => {
            fine_o1.check("fine_o1", linear, hidden + 1)?;
            fine_o2.check("fine_o2", fine, linear)?;
        }
        (None, None, None) => {}
        (Some(_), _, _) => return Err(ModelError::load("dual softmax requires a fine head")),
        (None, _, _) => return Err(ModelError::load("fine head present without dual softmax")),
    }
    Ok(())
}

fn relu(mut x: Vec<f32>) -> Vec<f32> {
    x.iter_mut().for_each(|v| *v = v.max(0.0));
    x
}

fn ensure_finite(values: &[f32], what: &str) -> ModelResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ModelError::NonFinite {
            what: what.to_string(),
        })
    }
}
