use crate::models::PredictionResult;
use crate::services::metrics::{record_prediction, record_risk_percent};
use crate::services::{assess, AssessmentError};
use crate::AppState;
use askama::Template;
use axum::{extract::State, Form, Json};
use serde::Serialize;
use service_core::error::AppError;

#[derive(Template)]
#[template(path = "result.html")]
pub struct ResultTemplate {
    pub result: PredictionResult,
    /// Averaged risk with one decimal, e.g. `75.0`.
    pub percent: String,
    pub chart_labels_json: String,
    pub chart_values_json: String,
    pub acc_labels_json: String,
    pub acc_values_json: String,
}

impl ResultTemplate {
    pub fn new(result: PredictionResult) -> Self {
        Self {
            percent: format!("{:.1}", result.percent),
            chart_labels_json: script_json(&result.chart_labels),
            chart_values_json: script_json(&result.chart_values),
            acc_labels_json: script_json(&result.acc_labels),
            acc_values_json: script_json(&result.acc_values),
            result,
        }
    }
}

/// Serialises a value for embedding inside an inline `<script>` block.
fn script_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "[]".to_string())
        .replace('<', "\\u003c")
}

/// Form-encoded submission rendered as the HTML result page.
pub async fn predict(
    State(state): State<AppState>,
    Form(submitted): Form<Vec<(String, String)>>,
) -> Result<ResultTemplate, AppError> {
    let result = run_assessment(&state, &submitted)?;
    Ok(ResultTemplate::new(result))
}

/// Same pipeline as [`predict`], answering with the raw result as JSON.
pub async fn predict_api(
    State(state): State<AppState>,
    Form(submitted): Form<Vec<(String, String)>>,
) -> Result<Json<PredictionResult>, AppError> {
    let result = run_assessment(&state, &submitted)?;
    Ok(Json(result))
}

fn run_assessment(
    state: &AppState,
    submitted: &[(String, String)],
) -> Result<PredictionResult, AppError> {
    match assess(&state.artifact, &state.continuous_features, submitted) {
        Ok(result) => {
            record_prediction("success");
            record_risk_percent(result.percent);
            tracing::info!(
                percent = result.percent,
                models = result.details.len(),
                "Prediction served"
            );
            Ok(result)
        }
        Err(err @ AssessmentError::Validation(_)) => {
            record_prediction("rejected");
            tracing::info!(error = %err, "Rejected prediction request");
            Err(err.into())
        }
        Err(err) => {
            record_prediction("failed");
            tracing::error!(error = %err, "Prediction failed");
            Err(err.into())
        }
    }
}
