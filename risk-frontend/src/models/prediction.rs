use serde::Serialize;

/// One echoed input: human-readable label and value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayField {
    pub label: String,
    pub value: String,
}

/// One model's positive-class probability, formatted like `"70.0%"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDetail {
    pub model: String,
    pub probability: String,
}

/// Everything the result view shows for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub inputs: Vec<DisplayField>,
    /// Mean of `chart_values`, rounded to one decimal.
    pub percent: f64,
    pub details: Vec<ModelDetail>,
    pub chart_labels: Vec<String>,
    pub chart_values: Vec<f64>,
    pub acc_labels: Vec<String>,
    pub acc_values: Vec<f64>,
}
