//! Configuration validation logic.

use crate::config::{Config, DatasetConfig, ModelConfig};
use crate::error::{
    ConfigError, ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode,
};
use crate::mode::DecodeMode;

/// Validates a config and returns every problem found.
///
/// # Example
/// ```
/// use autoreg_spec::{Config, DatasetConfig, ModelConfig};
/// use autoreg_spec::validation::validate_config;
///
/// let config = Config {
///     dataset: DatasetConfig { sampling_rate: 8000, mulaw: true },
///     model: ModelConfig {
///         dual_softmax: false,
///         bit_size: 10,
///         gaussian: false,
///         input_categorical: true,
///         hidden_size: 896,
///         local_size: 0,
///         conditioning_size: 128,
///         embedding_size: 256,
///         linear_hidden_size: 512,
///         local_scale: 1,
///         local_layer_num: 2,
///         weight_initializer: None,
///     },
/// };
///
/// let result = validate_config(&config);
/// assert!(result.is_ok());
/// ```
pub fn validate_config(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::default();

    validate_dataset(&config.dataset, &mut result);
    validate_model(&config.model, &mut result);
    check_warnings(&config.model, &mut result);

    result
}

/// Validates a config and resolves its decode mode in one call.
///
/// Returns the mode together with any warnings.
pub fn validate_for_generate(
    config: &Config,
) -> Result<(DecodeMode, Vec<ValidationWarning>), ConfigError> {
    let warnings = validate_config(config).into_result()?;
    let mode = config.model.decode_mode()?;
    Ok((mode, warnings))
}

fn validate_dataset(dataset: &DatasetConfig, result: &mut ValidationResult) {
    if dataset.sampling_rate == 0 {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidSamplingRate,
            "sampling_rate must be positive",
            "dataset.sampling_rate",
        ));
    }
}

fn validate_model(model: &ModelConfig, result: &mut ValidationResult) {
    if let Err(err) = model.decode_mode() {
        result.add_error(err);
    }

    let mut require_positive = |value: usize, name: &str| {
        if value == 0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidNetworkSize,
                format!("{} must be positive", name),
                format!("model.{}", name),
            ));
        }
    };
    require_positive(model.hidden_size, "hidden_size");
    require_positive(model.linear_hidden_size, "linear_hidden_size");
    if model.input_categorical {
        require_positive(model.embedding_size, "embedding_size");
    }

    if model.with_local() {
        if model.conditioning_size == 0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidLocalConfig,
                "conditioning_size must be positive when local_size is set",
                "model.conditioning_size",
            ));
        }
        if model.local_layer_num == 0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidLocalConfig,
                "local_layer_num must be positive when local_size is set",
                "model.local_layer_num",
            ));
        }
    }
    if model.local_scale == 0 {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidLocalConfig,
            "local_scale must be positive",
            "model.local_scale",
        ));
    }
}

fn check_warnings(model: &ModelConfig, result: &mut ValidationResult) {
    if model.weight_initializer.is_some() {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::UnusedWeightInitializer,
            "weight_initializer only applies to training and is ignored",
            "model.weight_initializer",
        ));
    }
    if !model.with_local() && model.local_scale > 1 {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::UnusedLocalParams,
            format!(
                "local_scale is {} but local_size is 0; no conditioning is used",
                model.local_scale
            ),
            "model.local_scale",
        ));
    }
}
