//! validate → aggregate → format, for one prediction request.

use crate::models::{Artifact, ModelDetail, PredictionResult};
use crate::services::aggregator::{self, PredictionError};
use crate::services::display;
use crate::services::validator::{self, ValidationError};
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AssessmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl From<AssessmentError> for AppError {
    fn from(err: AssessmentError) -> Self {
        match err {
            AssessmentError::Validation(e) => AppError::BadRequest(e.to_string()),
            AssessmentError::Prediction(PredictionError::NoModels) => {
                AppError::ServiceUnavailable(PredictionError::NoModels.to_string())
            }
            AssessmentError::Prediction(e) => AppError::InternalError(anyhow::Error::new(e)),
        }
    }
}

/// Runs a submitted form through the full pipeline. Validation failures
/// short-circuit before any model is queried.
pub fn assess(
    artifact: &Artifact,
    continuous: &[String],
    submitted: &[(String, String)],
) -> Result<PredictionResult, AssessmentError> {
    let features = validator::validate(artifact.features(), continuous, submitted)?;
    let outcome = aggregator::aggregate(artifact, &features)?;

    let details = outcome
        .models
        .iter()
        .map(|m| ModelDetail {
            model: m.model.clone(),
            probability: m.display.clone(),
        })
        .collect();

    Ok(PredictionResult {
        inputs: display::readable_inputs(&features),
        percent: outcome.percent,
        details,
        chart_labels: outcome.models.iter().map(|m| m.model.clone()).collect(),
        chart_values: outcome.models.iter().map(|m| m.percent).collect(),
        acc_labels: artifact
            .accuracies()
            .iter()
            .map(|(name, _)| name.clone())
            .collect(),
        acc_values: artifact.accuracies().iter().map(|(_, acc)| *acc).collect(),
    })
}
