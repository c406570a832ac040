//! Error types for configuration validation and processing.

use thiserror::Error;

/// Error codes for configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Decode mode errors (C001-C003)
    /// C001: `gaussian` and `dual_softmax` are both enabled
    ContradictoryDecodeMode,
    /// C002: `bit_size` outside the supported range
    InvalidBitSize,
    /// C003: `dual_softmax` requires an even `bit_size`
    OddDualSoftmaxBits,

    // Shape errors (C004-C006)
    /// C004: Sampling rate must be positive
    InvalidSamplingRate,
    /// C005: Network layer size is zero
    InvalidNetworkSize,
    /// C006: Local conditioning sizes are inconsistent
    InvalidLocalConfig,

    // Request errors (C007-C009)
    /// C007: Sampling policy name is not recognized
    UnknownSamplingPolicy,
    /// C008: Requested time length is negative or not finite
    InvalidTimeLength,
    /// C009: Device string is not recognized
    UnknownDevice,

    // Model binding errors (C010)
    /// C010: Model artifact disagrees with the configuration
    ModelConfigMismatch,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "C001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::ContradictoryDecodeMode => "C001",
            ErrorCode::InvalidBitSize => "C002",
            ErrorCode::OddDualSoftmaxBits => "C003",
            ErrorCode::InvalidSamplingRate => "C004",
            ErrorCode::InvalidNetworkSize => "C005",
            ErrorCode::InvalidLocalConfig => "C006",
            ErrorCode::UnknownSamplingPolicy => "C007",
            ErrorCode::InvalidTimeLength => "C008",
            ErrorCode::UnknownDevice => "C009",
            ErrorCode::ModelConfigMismatch => "C010",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: `weight_initializer` is only meaningful for training
    UnusedWeightInitializer,
    /// W002: Local conditioning parameters are set but `local_size` is zero
    UnusedLocalParams,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::UnusedWeightInitializer => "W001",
            WarningCode::UnusedLocalParams => "W002",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Path to the problematic field (e.g., "model.bit_size").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a field path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and optional field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// Path to the problematic field.
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning with a field path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Top-level error type for configuration handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A single configuration problem detected outside full validation.
    #[error("{0}")]
    Invalid(ValidationError),

    /// Configuration validation failed with one or more errors.
    #[error("configuration validation failed with {} error(s): {}", .0.len(), join_errors(.0))]
    ValidationFailed(Vec<ValidationError>),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Returns the first validation error code, if this error carries one.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ConfigError::Invalid(err) => Some(err.code),
            ConfigError::ValidationFailed(errors) => errors.first().map(|e| e.code),
            ConfigError::JsonParse(_) | ConfigError::Io(_) => None,
        }
    }
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::Invalid(err)
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of configuration validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of validation warnings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts to a Result, returning the warnings on success.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(ConfigError::ValidationFailed(self.errors))
        }
    }
}

/// Common trait for backend errors.
///
/// Gives every error type in the workspace a stable code and a category so
/// callers can report failures uniformly.
///
/// # Example
///
/// ```
/// use autoreg_spec::error::BackendError;
///
/// fn describe<E: BackendError>(err: &E) -> String {
///     format!("[{}] {}", err.code(), err.message())
/// }
/// ```
pub trait BackendError: std::error::Error {
    /// Get the error code for reporting.
    ///
    /// Returns a static string like "AUTOREG_001". These codes are stable
    /// and can be used for programmatic error handling.
    fn code(&self) -> &'static str;

    /// Get a human-readable message describing the error.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Get the error category for grouping related errors.
    fn category(&self) -> &'static str;
}

impl BackendError for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            ConfigError::Invalid(err) => err.code.code(),
            ConfigError::ValidationFailed(errors) => {
                errors.first().map(|e| e.code.code()).unwrap_or("C000")
            }
            ConfigError::JsonParse(_) => "C100",
            ConfigError::Io(_) => "C101",
        }
    }

    fn category(&self) -> &'static str {
        "config"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::ContradictoryDecodeMode.to_string(), "C001");
        assert_eq!(ErrorCode::UnknownDevice.to_string(), "C009");
        assert_eq!(ErrorCode::ModelConfigMismatch.to_string(), "C010");
        assert_eq!(WarningCode::UnusedLocalParams.to_string(), "W002");
    }

    #[test]
    fn test_validation_error_with_path() {
        let err = ValidationError::with_path(
            ErrorCode::InvalidBitSize,
            "bit_size must be in 1..=16, got 0",
            "model.bit_size",
        );
        assert_eq!(
            err.to_string(),
            "C002: bit_size must be in 1..=16, got 0 (at model.bit_size)"
        );
    }

    #[test]
    fn test_validation_failed_lists_every_error() {
        let err = ConfigError::ValidationFailed(vec![
            ValidationError::new(ErrorCode::InvalidBitSize, "bad bits"),
            ValidationError::new(ErrorCode::InvalidSamplingRate, "bad rate"),
        ]);
        let message = err.to_string();
        assert!(message.contains("2 error(s)"));
        assert!(message.contains("C002: bad bits"));
        assert!(message.contains("C004: bad rate"));
        assert_eq!(err.error_code(), Some(ErrorCode::InvalidBitSize));
        assert_eq!(err.code(), "C002");
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_into_result() {
        let mut result = ValidationResult::default();
        assert!(result.is_ok());
        result.add_warning(ValidationWarning::with_path(
            WarningCode::UnusedWeightInitializer,
            "ignored",
            "model.weight_initializer",
        ));
        assert_eq!(result.clone().into_result().unwrap().len(), 1);

        result.add_error(ValidationError::new(ErrorCode::InvalidNetworkSize, "zero"));
        assert!(!result.is_ok());
        assert!(matches!(
            result.into_result(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }
}
