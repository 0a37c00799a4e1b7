use crate::services::catalog;
use crate::AppState;
use askama::Template;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub struct FieldOption {
    pub code: i64,
    pub label: &'static str,
}

/// One form control per declared feature.
pub struct FormField {
    pub name: String,
    pub label: String,
    /// `any` for continuous measurements, `1` otherwise.
    pub step: &'static str,
    /// Non-empty for categorical features, rendered as a select box.
    pub options: Vec<FieldOption>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub fields: Vec<FormField>,
}

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let fields = state
        .artifact
        .features()
        .iter()
        .map(|name| FormField {
            name: name.clone(),
            label: catalog::display_label(name).unwrap_or(name).to_string(),
            step: if state.continuous_features.contains(name) {
                "any"
            } else {
                "1"
            },
            options: catalog::categories(name)
                .unwrap_or_default()
                .iter()
                .map(|(code, label)| FieldOption {
                    code: *code,
                    label: *label,
                })
                .collect(),
        })
        .collect();

    IndexTemplate { fields }
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let models = state.artifact.models().len();
    let (status, label) = if models > 0 {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "risk-frontend",
            "version": env!("CARGO_PKG_VERSION"),
            "models": models,
        })),
    )
}
