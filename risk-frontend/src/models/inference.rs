//! Seams between the request pipeline and the pre-fit models.
//!
//! The ensemble only needs two things from the trained artifact: a row
//! transform (the fitted scaler) and, per member, the probability of the
//! positive class. Anything implementing these traits can be loaded.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InferenceError {
    #[error("expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("input column {0} is not a finite number")]
    NonFiniteInput(usize),

    #[error("output `{0}` does not hold a class probability")]
    MissingOutput(String),

    #[error("session lock poisoned")]
    Poisoned,

    #[error("onnx runtime: {0}")]
    Runtime(String),
}

/// Produces P(positive class) for one scaled feature row.
pub trait ProbabilityProvider: Send + Sync {
    fn positive_probability(&self, row: &[f64]) -> Result<f64, InferenceError>;
}

/// Maps a raw feature row into the space the models were fit on.
pub trait FeatureTransform: Send + Sync {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError>;
}
