use thiserror::Error;

use crate::space::SearchSpaceType;

/// Main error type for the BayHarness optimization stack
#[derive(Error, Debug)]
pub enum BhError {
    #[error("Search space error: {0}")]
    SearchSpace(#[from] SearchSpaceError),

    #[error("Recommender error: {0}")]
    Recommender(#[from] RecommenderError),

    #[error("Surrogate error: {0}")]
    Surrogate(#[from] SurrogateError),

    #[error("Measurement error: {0}")]
    Measurement(#[from] MeasurementError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Search-space construction and lookup errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchSpaceError {
    #[error("Search space has no parameters")]
    Empty,

    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    #[error("Duplicate parameter: {name}")]
    DuplicateParameter { name: String },

    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Point is outside the search space: {message}")]
    PointOutsideSpace { message: String },
}

/// Recommender-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommenderError {
    #[error("{recommender} requires training data but no measurements are available")]
    NoTrainingData { recommender: String },

    #[error("{recommender} does not support {space:?} search spaces")]
    IncompatibleSearchSpace {
        recommender: String,
        space: SearchSpaceType,
    },

    #[error(
        "Analytic acquisition function {acquisition} only supports batch size 1, got {batch_size}"
    )]
    IncompatibleAcquisitionFunction {
        acquisition: String,
        batch_size: usize,
    },

    #[error("Requested {requested} candidates but only {available} remain")]
    ExhaustedCandidates { requested: usize, available: usize },

    #[error("Recommender sequence exhausted after {used} recommenders")]
    SequenceExhausted { used: usize },

    #[error("Batch size must be positive")]
    ZeroBatchSize,

    #[error("Invalid recommender configuration: {message}")]
    InvalidConfig { message: String },
}

/// Surrogate-model errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurrogateError {
    #[error("Surrogate {surrogate} has not been fitted")]
    NotFitted { surrogate: String },

    #[error("Surrogate {surrogate} received no training data")]
    EmptyTrainingData { surrogate: String },

    #[error("Numerical failure in {surrogate}: {message}")]
    Numerical { surrogate: String, message: String },

    #[error("Invalid prior {prior}: {message}")]
    InvalidPrior { prior: String, message: String },
}

/// Measurement ingestion errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasurementError {
    #[error("Measurement is missing a value for target {target}")]
    MissingTarget { target: String },

    #[error("Measurement value for target {target} is not finite: {value}")]
    NonFinite { target: String, value: f64 },

    #[error("Measurement is missing parameter {parameter}")]
    MissingParameter { parameter: String },
}

/// Result type alias for BayHarness operations
pub type BhResult<T> = Result<T, BhError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::BhError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::BhError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::BhError::Config(format!($($arg)*))
    };
}
