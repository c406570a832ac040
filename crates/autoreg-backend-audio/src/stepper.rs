//! Recurrent state threading.

use crate::model::{DistributionParams, HiddenState, ModelResult, StepInput, WaveModel};

/// Advances one generation run through the model, one timestep at a time.
///
/// The stepper exclusively owns the run's [`HiddenState`]. Each call to
/// [`step`](Self::step) replaces it with the state returned by the model, so
/// a failed step leaves the previous state in place.
pub struct RecurrentStepper<'m, M: WaveModel + ?Sized> {
    model: &'m M,
    hidden: HiddenState,
    steps: usize,
}

impl<'m, M: WaveModel + ?Sized> RecurrentStepper<'m, M> {
    /// Starts from the model's initial state.
    pub fn new(model: &'m M) -> Self {
        Self::with_state(model, model.initial_state())
    }

    /// Starts from an explicit state.
    pub fn with_state(model: &'m M, hidden: HiddenState) -> Self {
        Self {
            model,
            hidden,
            steps: 0,
        }
    }

    /// Runs one forward step and keeps the new state.
    pub fn step(&mut self, input: StepInput, conditioning: &[f32]) -> ModelResult<DistributionParams> {
        let (params, hidden) = self.model.forward(&self.hidden, input, conditioning)?;
        self.hidden = hidden;
        self.steps += 1;
        Ok(params)
    }

    /// Fine-head logits for the step just taken.
    pub fn fine(&self, coarse: u32) -> ModelResult<Vec<f32>> {
        self.model.forward_fine(&self.hidden, coarse)
    }

    /// Number of completed steps.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Current state.
    pub fn hidden(&self) -> &HiddenState {
        &self.hidden
    }

    /// Consumes the stepper, returning the final state.
    pub fn into_hidden(self) -> HiddenState {
        self.hidden
    }
}
