use thiserror::Error;

/// Errors raised while building or loading sampled fields.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("degenerate bounding box: min {min:?} must be finite and strictly below max {max:?}")]
    DegenerateBounds { min: [f64; 3], max: [f64; 3] },
    #[error("invalid grid resolution {0}x{1}x{2}: every axis needs at least one sample")]
    InvalidResolution(i64, i64, i64),
    #[error("distance field holds {actual} samples but its resolution implies {expected}")]
    SampleCountMismatch { expected: usize, actual: usize },
    #[error("distance field header value `{name}` is not finite")]
    NonFiniteHeader { name: &'static str },
    #[error("failed to read distance field: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading a portal description. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum PortalParseError {
    #[error("line {line}: expected `key: value`, got {text:?}")]
    MalformedLine { line: usize, text: String },
    #[error("line {line}: `{key}` expects {expected} numbers, got {value:?}")]
    BadValue {
        line: usize,
        key: &'static str,
        expected: usize,
        value: String,
    },
    #[error("line {line}: portal completed before `{key}` was declared")]
    MissingValue { line: usize, key: &'static str },
    #[error("line {line}: portal rotation axis must be non-zero")]
    ZeroAxis { line: usize },
    #[error("line {line}: `{key}` must be positive, got {value}")]
    NonPositive {
        line: usize,
        key: &'static str,
        value: f64,
    },
    #[error("failed to read portal file: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid run parameters, named by their configuration key.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{key}` must be finite, got {value}")]
    NonFinite { key: &'static str, value: f64 },
    #[error("`{key}` is out of range: {reason}")]
    OutOfRange { key: &'static str, reason: String },
    #[error(transparent)]
    Bounds(#[from] FieldError),
}
