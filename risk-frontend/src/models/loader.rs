//! ONNX Runtime sessions for the fitted scaler and the ensemble members.

use crate::models::inference::{FeatureTransform, InferenceError, ProbabilityProvider};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Builds sessions with a shared threading policy.
pub struct SessionLoader {
    onnx_threads: usize,
}

impl SessionLoader {
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        debug!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    fn session(&self, path: &Path) -> Result<Session> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load ONNX graph from {:?}", path))?;
        Ok(session)
    }

    /// Loads a classifier graph. The probability output is the first one whose
    /// name mentions `prob`, falling back to the last output.
    pub fn load_model(&self, path: &Path, name: &str) -> Result<OnnxModel> {
        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = self.session(path)?;
        let input_name = first_input(&session);
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        debug!(model = %name, input = %input_name, output = %output_name, "Model graph ready");

        Ok(OnnxModel {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    /// Loads a scaler graph; its first output is the transformed row.
    pub fn load_scaler(&self, path: &Path) -> Result<OnnxScaler> {
        info!(path = %path.display(), "Loading ONNX scaler");

        let session = self.session(path)?;
        let input_name = first_input(&session);
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        Ok(OnnxScaler {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

fn first_input(session: &Session) -> String {
    session
        .inputs
        .first()
        .map(|i| i.name.clone())
        .unwrap_or_else(|| "float_input".to_string())
}

/// One ensemble member backed by an ONNX graph.
pub struct OnnxModel {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxModel {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ProbabilityProvider for OnnxModel {
    fn positive_probability(&self, row: &[f64]) -> Result<f64, InferenceError> {
        let input = row_tensor(row)?;
        let mut session = self.session.lock().map_err(|_| InferenceError::Poisoned)?;
        let outputs = session
            .run(ort::inputs![&self.input_name => input])
            .map_err(runtime)?;

        let probability = positive_class(&outputs, &self.output_name)?;
        debug!(model = %self.name, probability = probability, "Model answered");
        Ok(probability)
    }
}

/// The fitted scaler, exported as its own graph.
pub struct OnnxScaler {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl FeatureTransform for OnnxScaler {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        let input = row_tensor(row)?;
        let mut session = self.session.lock().map_err(|_| InferenceError::Poisoned)?;
        let outputs = session
            .run(ort::inputs![&self.input_name => input])
            .map_err(runtime)?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| InferenceError::MissingOutput(self.output_name.clone()))?;
        let (_, data) = output.try_extract_tensor::<f32>().map_err(runtime)?;

        if data.len() != row.len() {
            return Err(InferenceError::DimensionMismatch {
                expected: row.len(),
                actual: data.len(),
            });
        }
        Ok(data.iter().map(|v| *v as f64).collect())
    }
}

/// A `[1, width]` float tensor; sklearn exports take `float_input` as f32.
fn row_tensor(row: &[f64]) -> Result<Tensor<f32>, InferenceError> {
    let shape = vec![1_i64, row.len() as i64];
    let values: Vec<f32> = row.iter().map(|v| *v as f32).collect();
    Tensor::from_array((shape, values)).map_err(runtime)
}

fn runtime(err: impl std::fmt::Display) -> InferenceError {
    InferenceError::Runtime(err.to_string())
}

/// Reads P(class 1) from either a `[1, classes]` tensor or the
/// `seq(map(int64, float))` shape that ZipMap produces.
fn positive_class(outputs: &SessionOutputs, output_name: &str) -> Result<f64, InferenceError> {
    let output = outputs
        .get(output_name)
        .ok_or_else(|| InferenceError::MissingOutput(output_name.to_string()))?;

    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        return match (dims.last().copied(), data) {
            (Some(classes), [_, positive, ..]) if classes >= 2 => Ok(*positive as f64),
            (Some(1), [single]) => Ok(*single as f64),
            _ => Err(InferenceError::MissingOutput(output_name.to_string())),
        };
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return positive_class_from_sequence_map(output, output_name);
    }

    Err(InferenceError::MissingOutput(output_name.to_string()))
}

fn positive_class_from_sequence_map(
    output: &DynValue,
    output_name: &str,
) -> Result<f64, InferenceError> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(runtime)?;
    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(runtime)?;
    let first = maps
        .first()
        .ok_or_else(|| InferenceError::MissingOutput(output_name.to_string()))?;

    let pairs = first.try_extract_key_values::<i64, f32>().map_err(runtime)?;
    pairs
        .iter()
        .find(|(class, _)| *class == 1)
        .map(|(_, probability)| *probability as f64)
        .ok_or_else(|| InferenceError::MissingOutput(output_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn loader() -> SessionLoader {
        SessionLoader::with_threads(1).unwrap()
    }

    #[test]
    fn scaler_standardises_each_column() {
        let scaler = loader().load_scaler(&fixture("scaler.onnx")).unwrap();

        let mut row = vec![
            54.4, 0.68, 0.97, 131.6, 246.3, 0.15, 0.53, 149.6, 0.33, 1.04, 1.4, 0.73, 2.31,
        ];
        row[0] += 9.05;

        let scaled = scaler.transform(&row).unwrap();
        assert_eq!(scaled.len(), 13);
        assert!((scaled[0] - 1.0).abs() < 1e-4);
        assert!(scaled[1..].iter().all(|v| v.abs() < 1e-4));
    }

    #[test]
    fn tensor_output_yields_positive_class() {
        let model = loader()
            .load_model(&fixture("logistic_regression.onnx"), "Logistic Regression")
            .unwrap();

        // All-zero row: sigmoid(intercept) with intercept 0.18.
        let p = model.positive_probability(&[0.0; 13]).unwrap();
        assert!((p - 0.544_878).abs() < 1e-4, "got {}", p);
        assert_eq!(model.name(), "Logistic Regression");
    }

    #[test]
    fn zipmap_output_yields_positive_class() {
        let model = loader().load_model(&fixture("svm.onnx"), "SVM").unwrap();

        let p = model.positive_probability(&[0.0; 13]).unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert!((p - 0.516_244).abs() < 1e-4, "got {}", p);
    }

    #[test]
    fn tree_ensemble_follows_splits() {
        let model = loader()
            .load_model(&fixture("decision_tree.onnx"), "Decision Tree")
            .unwrap();

        // ca <= -0.2 and cp <= -0.4 reaches the [30, 45] leaf.
        let mut row = [0.0; 13];
        row[11] = -1.0;
        row[2] = -1.0;
        assert!((model.positive_probability(&row).unwrap() - 0.6).abs() < 1e-4);

        // ca > -0.2 reaches the [60, 12] leaf.
        row[11] = 1.0;
        let p = model.positive_probability(&row).unwrap();
        assert!((p - 12.0 / 72.0).abs() < 1e-4, "got {}", p);
    }

    #[test]
    fn wrong_width_is_a_runtime_error() {
        let model = loader()
            .load_model(&fixture("logistic_regression.onnx"), "Logistic Regression")
            .unwrap();

        assert!(matches!(
            model.positive_probability(&[0.0; 3]),
            Err(InferenceError::Runtime(_))
        ));
    }

    #[test]
    fn missing_graph_fails_to_load() {
        let err = loader()
            .load_model(&fixture("absent.onnx"), "Absent")
            .err()
            .unwrap();
        assert!(format!("{:#}", err).contains("absent.onnx"));
    }
}
