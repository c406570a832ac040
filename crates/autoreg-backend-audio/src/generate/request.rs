//! Generation requests.

use autoreg_spec::SamplingPolicy;

use crate::model::HiddenState;

/// Parameters of one generation call.
///
/// Every per-utterance field, when present, must hold exactly
/// `num_generate` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Length of each utterance in seconds.
    pub time_length: f64,
    /// How samples are picked from each step's distribution.
    pub policy: SamplingPolicy,
    /// Number of independent utterances.
    pub num_generate: usize,
    /// Code fed in at the first step of each utterance (defaults to silence).
    pub initial_codes: Option<Vec<u32>>,
    /// Starting hidden state of each utterance (defaults to the model's).
    pub initial_hidden: Option<Vec<HiddenState>>,
    /// Raw local conditioning frames per utterance, `local_size` wide.
    ///
    /// Required exactly when the model uses local conditioning. Each frame
    /// covers `local_scale` samples.
    pub local_arrays: Option<Vec<Vec<Vec<f32>>>>,
}

impl GenerateRequest {
    /// A single-utterance request with default initial state.
    pub fn new(time_length: f64, policy: SamplingPolicy) -> Self {
        Self {
            time_length,
            policy,
            num_generate: 1,
            initial_codes: None,
            initial_hidden: None,
            local_arrays: None,
        }
    }

    /// Sets the number of utterances.
    pub fn with_num_generate(mut self, num_generate: usize) -> Self {
        self.num_generate = num_generate;
        self
    }

    /// Sets the first-step code of each utterance.
    pub fn with_initial_codes(mut self, codes: Vec<u32>) -> Self {
        self.initial_codes = Some(codes);
        self
    }

    /// Sets the starting hidden state of each utterance.
    pub fn with_initial_hidden(mut self, hidden: Vec<HiddenState>) -> Self {
        self.initial_hidden = Some(hidden);
        self
    }

    /// Sets the local conditioning of each utterance.
    pub fn with_local_arrays(mut self, arrays: Vec<Vec<Vec<f32>>>) -> Self {
        self.local_arrays = Some(arrays);
        self
    }
}
