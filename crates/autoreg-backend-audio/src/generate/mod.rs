//! Autoregressive waveform generation.
//!
//! A [`Generator`] binds a validated [`Config`] to a [`WaveModel`] and
//! produces waveforms one sample at a time. Each step runs the model once,
//! decodes the resulting distribution into a code (or a continuous value),
//! converts it to an amplitude, and feeds the re-encoded sample back as the
//! next input.
//!
//! Utterances in a batch are fully independent: each owns its hidden state,
//! its output buffer, and an RNG stream derived from the generator seed and
//! the utterance index. Output therefore does not depend on how utterances
//! are scheduled across threads.

mod request;


use autoreg_spec::{
    validate_for_generate, Config, ConfigError, DecodeMode, ErrorCode, SamplingPolicy,
    ValidationError,
};
use tracing::{debug, info, warn};

use crate::codec::{encode_single, max_code, WaveformCodec};
use crate::decoder::{Decoded, DistributionDecoder};
use crate::error::{AudioError, AudioResult};
use crate::model::{ModelError, WaveModel};
use crate::pool::{default_threads, try_parallel_map};
use crate::rng::create_utterance_rng;
use crate::stepper::RecurrentStepper;
use crate::wave::Wave;

pub use request::GenerateRequest;

/// Seed used when none is given.
pub const DEFAULT_SEED: u32 = 0;

/// Longest utterance, in samples, a single run may produce.
pub const MAX_SAMPLES: usize = u32::MAX as usize;

/// Drives a model through full utterances.
pub struct Generator<M: WaveModel> {
    config: Config,
    mode: DecodeMode,
    codec: WaveformCodec,
    model: M,
    seed: u32,
    threads: usize,
}

impl<M: WaveModel> Generator<M> {
    /// Validates the configuration and binds it to `model`.
    ///
    /// Contradictory decode flags and any other configuration problem are
    /// reported here, before a single step runs.
    pub fn new(config: Config, model: M) -> AudioResult<Self> {
        let (mode, warnings) = validate_for_generate(&config)?;
        for warning in &warnings {
            warn!(code = %warning.code, "{}", warning.message);
        }

        if model.hidden_size() != config.model.hidden_size {
            return Err(ModelError::shape(
                "model hidden size",
                config.model.hidden_size,
                model.hidden_size(),
            )
            .into());
        }
        let conditioning = config.model.step_conditioning_size();
        if model.conditioning_size() != conditioning {
            return Err(ModelError::shape(
                "model conditioning size",
                conditioning,
                model.conditioning_size(),
            )
            .into());
        }

        check_model_binding(&config, mode, &model)?;

        let codec = WaveformCodec::new(mode.bit_size(), config.dataset.mulaw);
        Ok(Self {
            config,
            mode,
            codec,
            model,
            seed: DEFAULT_SEED,
            threads: default_threads(),
        })
    }

    /// Sets the base seed for stochastic sampling.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Caps the number of utterances generated concurrently.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolved decode mode.
    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Wrapped model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Base seed.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Number of samples in an utterance of `time_length` seconds.
    pub fn num_samples(&self, time_length: f64) -> AudioResult<usize> {
        if !time_length.is_finite() || time_length < 0.0 {
            return Err(ConfigError::from(ValidationError::with_path(
                ErrorCode::InvalidTimeLength,
                format!("time_length must be a non-negative number, got {}", time_length),
                "time_length",
            ))
            .into());
        }
        let samples = (time_length * self.config.dataset.sampling_rate as f64).round();
        if samples > MAX_SAMPLES as f64 {
            return Err(ConfigError::from(ValidationError::with_path(
                ErrorCode::InvalidTimeLength,
                format!(
                    "time_length {} needs {} samples, more than the limit of {}",
                    time_length, samples, MAX_SAMPLES
                ),
                "time_length",
            ))
            .into());
        }
        Ok(samples as usize)
    }

    /// Generates one utterance from the default initial state.
    pub fn generate(&self, time_length: f64, policy: SamplingPolicy) -> AudioResult<Wave> {
        let mut waves = self.generate_batch(&GenerateRequest::new(time_length, policy))?;
        Ok(waves.remove(0))
    }

    /// Generates every utterance of `request`, in request order.
    ///
    /// Any failure aborts the whole batch; no partial output is returned.
    pub fn generate_batch(&self, request: &GenerateRequest) -> AudioResult<Vec<Wave>> {
        let num_samples = self.num_samples(request.time_length)?;
        self.check_request(request, num_samples)?;

        let decoder = DistributionDecoder::new(self.mode, request.policy);
        info!(
            num_generate = request.num_generate,
            num_samples,
            policy = %request.policy,
            mode = ?self.mode,
            "generating"
        );

        let utterances: Vec<usize> = (0..request.num_generate).collect();
        try_parallel_map(&utterances, self.threads, |_, &utterance| {
            self.run_utterance(utterance, request, decoder, num_samples)
        })
    }

    fn run_utterance(
        &self,
        utterance: usize,
        request: &GenerateRequest,
        decoder: DistributionDecoder,
        num_samples: usize,
    ) -> AudioResult<Wave> {
        let model_config = &self.config.model;
        let bit_size = self.mode.bit_size();
        let local_scale = model_config.local_scale;

        let conditioning = match &request.local_arrays {
            Some(arrays) => self.model.encode_local(&arrays[utterance]).map_err(|source| {
                AudioError::ModelInvocation {
                    utterance,
                    step: 0,
                    source,
                }
            })?,
            None => Vec::new(),
        };

        let mut stepper = match &request.initial_hidden {
            Some(hidden) => RecurrentStepper::with_state(&self.model, hidden[utterance].clone()),
            None => RecurrentStepper::new(&self.model),
        };
        let initial_code = match &request.initial_codes {
            Some(codes) => codes[utterance],
            None => encode_single(0.0, bit_size),
        };
        let mut input = Decoded::Code(initial_code).feedback(bit_size, model_config.input_categorical);
        let mut rng = create_utterance_rng(self.seed, utterance as u32);

        debug!(utterance, initial_code, "utterance started");
        let mut samples = Vec::with_capacity(num_samples);
        for step in 0..num_samples {
            let invocation = |source: ModelError| AudioError::ModelInvocation {
                utterance,
                step,
                source,
            };
            let frame: &[f32] = if conditioning.is_empty() {
                &[]
            } else {
                &conditioning[step / local_scale]
            };

            let params = stepper.step(input, frame).map_err(invocation)?;
            let decoded = decoder
                .decode(&params, |coarse| stepper.fine(coarse), &mut rng)
                .map_err(invocation)?;

            samples.push(self.codec.decode_output(decoded));
            input = decoded.feedback(bit_size, model_config.input_categorical);
        }
        debug!(utterance, steps = stepper.steps(), "utterance complete");

        Ok(Wave::new(samples, self.config.dataset.sampling_rate))
    }

    fn check_request(&self, request: &GenerateRequest, num_samples: usize) -> AudioResult<()> {
        let n = request.num_generate;
        if n == 0 {
            return Err(AudioError::invalid_input("num_generate", "must be at least 1"));
        }
        let count_error = |name: &str, len: usize| {
            AudioError::invalid_input(name, format!("expected {} entries, got {}", n, len))
        };

        if let Some(codes) = &request.initial_codes {
            if codes.len() != n {
                return Err(count_error("initial_codes", codes.len()));
            }
            let max = max_code(self.mode.bit_size());
            if let Some(code) = codes.iter().find(|&&c| c > max) {
                return Err(AudioError::invalid_input(
                    "initial_codes",
                    format!("code {} exceeds maximum {}", code, max),
                ));
            }
        }

        if let Some(hidden) = &request.initial_hidden {
            if hidden.len() != n {
                return Err(count_error("initial_hidden", hidden.len()));
            }
            let size = self.model.hidden_size();
            if let Some(state) = hidden.iter().find(|h| h.len() != size) {
                return Err(AudioError::invalid_input(
                    "initial_hidden",
                    format!("expected width {}, got {}", size, state.len()),
                ));
            }
        }

        let model_config = &self.config.model;
        match (&request.local_arrays, model_config.with_local()) {
            (None, false) => {}
            (Some(_), false) => {
                return Err(AudioError::invalid_input(
                    "local_arrays",
                    "model does not use local conditioning",
                ))
            }
            (None, true) => {
                return Err(AudioError::invalid_input(
                    "local_arrays",
                    "model requires local conditioning",
                ))
            }
            (Some(arrays), true) => {
                if arrays.len() != n {
                    return Err(count_error("local_arrays", arrays.len()));
                }
                let needed = num_samples.div_ceil(model_config.local_scale);
                for (i, frames) in arrays.iter().enumerate() {
                    if frames.len() < needed {
                        return Err(AudioError::invalid_input(
                            "local_arrays",
                            format!(
                                "utterance {} has {} frames but {} samples need {}",
                                i,
                                frames.len(),
                                num_samples,
                                needed
                            ),
                        ));
                    }
                    if let Some(frame) = frames.iter().find(|f| f.len() != model_config.local_size) {
                        return Err(AudioError::invalid_input(
                            "local_arrays",
                            format!(
                                "utterance {} has a frame of width {}, expected {}",
                                i,
                                frame.len(),
                                model_config.local_size
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Rejects a model whose output heads or input kind disagree with `config`.
fn check_model_binding<M: WaveModel>(
    config: &Config,
    mode: DecodeMode,
    model: &M,
) -> AudioResult<()> {
    let mismatch = |message: String| -> AudioError {
        ConfigError::from(ValidationError::with_path(
            ErrorCode::ModelConfigMismatch,
            message,
            "model",
        ))
        .into()
    };

    if model.decode_mode() != mode {
        return Err(mismatch(format!(
            "model decodes as {:?} but the config selects {:?}",
            model.decode_mode(),
            mode
        )));
    }
    if model.input_categorical() != config.model.input_categorical {
        return Err(mismatch(format!(
            "model input_categorical is {} but the config sets {}",
            model.input_categorical(),
            config.model.input_categorical
        )));
    }
    Ok(())
}
