use serde::Deserialize;
use service_core::config::{configuration_directory, load_layered, ServerSettings};
use service_core::error::AppError;
use validator::Validate;

#[derive(Deserialize, Clone, Debug, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub server: ServerSettings,
    #[validate(nested)]
    pub artifact: ArtifactSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug, Validate)]
pub struct ArtifactSettings {
    /// Path to the JSON manifest written by the training process.
    #[validate(length(min = 1))]
    pub path: String,
    /// Intra-op threads per ONNX session.
    #[serde(default = "default_onnx_threads")]
    #[validate(range(min = 1))]
    pub onnx_threads: usize,
    /// Features parsed as floats; every other feature is truncated to an integer.
    #[serde(default = "default_continuous_features")]
    pub continuous_features: Vec<String>,
}

fn default_onnx_threads() -> usize {
    1
}

fn default_continuous_features() -> Vec<String> {
    vec!["oldpeak".to_string()]
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC endpoint (e.g. http://tempo:4317). Spans are not exported when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let configuration_directory = configuration_directory("risk-frontend")?;
    load_layered(&configuration_directory)
}
