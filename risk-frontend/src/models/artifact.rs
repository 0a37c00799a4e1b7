//! The trained-model bundle loaded once at start-up.
//!
//! The manifest is written by the training process and carries four keys:
//! `features` (ordered names), `scaler` (an ONNX graph, or `null` when every
//! model graph embeds its own scaling), `models` (ordered name → ONNX graph)
//! and `accuracies` (ordered name → held-out accuracy). Graph paths are
//! relative to the manifest.

use crate::models::inference::{FeatureTransform, ProbabilityProvider};
use crate::models::loader::SessionLoader;
use crate::models::ordered;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to load {name}: {source:#}")]
    Session {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid artifact: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub features: Vec<String>,
    #[serde(default)]
    pub scaler: Option<PathBuf>,
    #[serde(deserialize_with = "ordered::deserialize")]
    pub models: Vec<(String, PathBuf)>,
    #[serde(deserialize_with = "ordered::deserialize")]
    pub accuracies: Vec<(String, f64)>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_str(json)?)
    }
}

pub struct NamedModel {
    pub name: String,
    pub model: Box<dyn ProbabilityProvider>,
}

/// Read-only model state shared by every request.
pub struct Artifact {
    features: Vec<String>,
    scaler: Option<Box<dyn FeatureTransform>>,
    models: Vec<NamedModel>,
    accuracies: Vec<(String, f64)>,
}

impl Artifact {
    /// Builds an artifact from already-constructed parts.
    pub fn new(
        features: Vec<String>,
        scaler: Option<Box<dyn FeatureTransform>>,
        models: Vec<(String, Box<dyn ProbabilityProvider>)>,
        accuracies: Vec<(String, f64)>,
    ) -> Result<Self, ArtifactError> {
        if features.is_empty() {
            return Err(ArtifactError::Invalid("feature list is empty".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = features.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(ArtifactError::Invalid(format!(
                "feature `{}` is declared twice",
                duplicate
            )));
        }

        let mut seen = HashSet::new();
        if let Some((duplicate, _)) = models.iter().find(|(name, _)| !seen.insert(name.as_str())) {
            return Err(ArtifactError::Invalid(format!(
                "model `{}` is listed twice",
                duplicate
            )));
        }

        if let Some((name, _)) = accuracies.iter().find(|(_, acc)| !acc.is_finite()) {
            return Err(ArtifactError::Invalid(format!(
                "accuracy for `{}` is not a finite number",
                name
            )));
        }

        if models.is_empty() {
            tracing::warn!("Artifact contains no models; predictions will be refused");
        }

        Ok(Self {
            features,
            scaler,
            models: models
                .into_iter()
                .map(|(name, model)| NamedModel { name, model })
                .collect(),
            accuracies,
        })
    }

    /// Reads the manifest at `path`, opens every graph it names and runs one
    /// all-zero row through them so width or output mismatches fail here
    /// rather than on the first request.
    pub fn load(path: impl AsRef<Path>, onnx_threads: usize) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Manifest::from_json(&json)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let loader = SessionLoader::with_threads(onnx_threads).map_err(|source| {
            ArtifactError::Session {
                name: "onnx runtime".to_string(),
                source,
            }
        })?;

        let scaler = match &manifest.scaler {
            Some(graph) => {
                let scaler = loader
                    .load_scaler(&base.join(graph))
                    .map_err(|source| ArtifactError::Session {
                        name: "scaler".to_string(),
                        source,
                    })?;
                Some(Box::new(scaler) as Box<dyn FeatureTransform>)
            }
            None => None,
        };

        let mut models: Vec<(String, Box<dyn ProbabilityProvider>)> =
            Vec::with_capacity(manifest.models.len());
        for (name, graph) in &manifest.models {
            let model =
                loader
                    .load_model(&base.join(graph), name)
                    .map_err(|source| ArtifactError::Session {
                        name: format!("model `{}`", name),
                        source,
                    })?;
            models.push((name.clone(), Box::new(model)));
        }

        let artifact = Self::new(manifest.features, scaler, models, manifest.accuracies)?;
        artifact.check_shapes()?;

        tracing::info!(
            path = %path.display(),
            features = artifact.features.len(),
            models = artifact.models.len(),
            "Loaded model artifact"
        );

        Ok(artifact)
    }

    fn check_shapes(&self) -> Result<(), ArtifactError> {
        let row = vec![0.0; self.features.len()];

        let scaled = match &self.scaler {
            Some(scaler) => scaler
                .transform(&row)
                .map_err(|e| ArtifactError::Invalid(format!("scaler: {}", e)))?,
            None => row,
        };

        for entry in &self.models {
            let probability = entry
                .model
                .positive_probability(&scaled)
                .map_err(|e| ArtifactError::Invalid(format!("model `{}`: {}", entry.name, e)))?;
            if !(0.0..=1.0).contains(&probability) {
                return Err(ArtifactError::Invalid(format!(
                    "model `{}` returned {} for a zero row",
                    entry.name, probability
                )));
            }
        }

        Ok(())
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn scaler(&self) -> Option<&dyn FeatureTransform> {
        self.scaler.as_deref()
    }

    /// Models in the order the artifact lists them.
    pub fn models(&self) -> &[NamedModel] {
        &self.models
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn accuracies(&self) -> &[(String, f64)] {
        &self.accuracies
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("features", &self.features)
            .field("scaled", &self.scaler.is_some())
            .field("models", &self.model_names())
            .field("accuracies", &self.accuracies)
            .finish()
    }
}
