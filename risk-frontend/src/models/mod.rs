pub mod artifact;
pub mod features;
pub mod inference;
pub mod loader;
mod ordered;
pub mod prediction;

pub use artifact::{Artifact, ArtifactError, Manifest, NamedModel};
pub use features::{FeatureValue, FeatureVector};
pub use inference::{FeatureTransform, InferenceError, ProbabilityProvider};
pub use loader::{OnnxModel, OnnxScaler, SessionLoader};
pub use prediction::{DisplayField, ModelDetail, PredictionResult};
