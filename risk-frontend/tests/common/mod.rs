#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use risk_frontend::config::{ArtifactSettings, Settings, TelemetrySettings};
use risk_frontend::models::{Artifact, InferenceError, ProbabilityProvider};
use risk_frontend::startup::Application;
use risk_frontend::AppState;
use service_core::config::ServerSettings;
use std::sync::Arc;
use tower::ServiceExt;

pub const FEATURES: [&str; 13] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

pub const EXAMPLE_FORM: [(&str, &str); 13] = [
    ("age", "63"),
    ("sex", "1"),
    ("cp", "0"),
    ("trestbps", "145"),
    ("chol", "233"),
    ("fbs", "1"),
    ("restecg", "0"),
    ("thalach", "150"),
    ("exang", "0"),
    ("oldpeak", "2.3"),
    ("slope", "0"),
    ("ca", "0"),
    ("thal", "1"),
];

/// A model that always answers with the same probability.
pub struct Fixed(pub f64);

impl ProbabilityProvider for Fixed {
    fn positive_probability(&self, _row: &[f64]) -> Result<f64, InferenceError> {
        Ok(self.0)
    }
}

pub fn continuous_features() -> Vec<String> {
    vec!["oldpeak".to_string()]
}

/// State backed by fixed-probability models over the 13 heart-disease features.
pub fn fixed_state(models: &[(&str, f64)]) -> AppState {
    let models: Vec<(String, Box<dyn ProbabilityProvider>)> = models
        .iter()
        .map(|(name, p)| {
            (
                name.to_string(),
                Box::new(Fixed(*p)) as Box<dyn ProbabilityProvider>,
            )
        })
        .collect();
    let accuracies = models
        .iter()
        .map(|(name, _)| (name.clone(), 0.8))
        .collect();

    let artifact = Artifact::new(
        FEATURES.iter().map(|f| f.to_string()).collect(),
        None,
        models,
        accuracies,
    )
    .expect("fixed artifact is valid");

    AppState::new(Arc::new(artifact), continuous_features())
}

pub fn fixture_path() -> String {
    format!("{}/tests/fixtures/model.json", env!("CARGO_MANIFEST_DIR"))
}

/// State backed by the JSON fixture artifact.
pub fn fixture_state() -> AppState {
    let artifact = Artifact::load(fixture_path(), 1).expect("fixture artifact loads");
    AppState::new(Arc::new(artifact), continuous_features())
}

pub fn encode(pairs: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(pairs).expect("form encodes")
}

pub fn example_without(feature: &str) -> Vec<(&'static str, &'static str)> {
    EXAMPLE_FORM
        .iter()
        .copied()
        .filter(|(name, _)| *name != feature)
        .collect()
}

pub fn example_with(feature: &str, value: &'static str) -> Vec<(&'static str, &'static str)> {
    EXAMPLE_FORM
        .iter()
        .map(|(name, v)| if *name == feature { (*name, value) } else { (*name, *v) })
        .collect()
}

pub async fn post_form(app: Router, uri: &str, body: String) -> (StatusCode, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    /// Serves `state` on an ephemeral port and waits until it answers.
    pub async fn spawn(state: AppState) -> Self {
        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            artifact: ArtifactSettings {
                path: fixture_path(),
                onnx_threads: 1,
                continuous_features: continuous_features(),
            },
            telemetry: TelemetrySettings::default(),
        };

        let app = Application::with_state(&settings, state)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }
}
