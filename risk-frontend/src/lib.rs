pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use models::Artifact;
use std::sync::Arc;

/// Shared application state: the read-only artifact and request settings.
#[derive(Clone)]
pub struct AppState {
    pub artifact: Arc<Artifact>,
    pub continuous_features: Arc<[String]>,
}

impl AppState {
    pub fn new(artifact: Arc<Artifact>, continuous_features: Vec<String>) -> Self {
        Self {
            artifact,
            continuous_features: continuous_features.into(),
        }
    }
}
