use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use validator::Validate;

/// HTTP listener settings shared by every service.
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct ServerSettings {
    #[validate(length(min = 1))]
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind. `0` asks the OS for an ephemeral port (used by tests).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Resolves `<service>/config` whether the process runs from the workspace
/// root or from inside the service directory.
pub fn configuration_directory(service_dir: &str) -> Result<PathBuf, AppError> {
    let base_path = std::env::current_dir()?;

    if base_path.ends_with(service_dir) {
        Ok(base_path.join("config"))
    } else {
        Ok(base_path.join(service_dir).join("config"))
    }
}

/// Loads `base.yaml` from `directory`, overlays `APP_`-prefixed environment
/// variables (`APP_SERVER__PORT=9000`) and validates the result.
pub fn load_layered<T>(directory: &Path) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    dotenvy::dotenv().ok();

    let settings = Cfg::builder()
        .add_source(File::from(directory.join("base.yaml")).required(true))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings: T = settings.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}
