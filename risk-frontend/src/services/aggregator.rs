//! Runs the scaled feature row through every model and averages the results.

use crate::models::{Artifact, FeatureVector, InferenceError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PredictionError {
    #[error("No models available")]
    NoModels,

    #[error("feature `{0}` is missing from the validated input")]
    MissingFeature(String),

    #[error("scaler failed: {0}")]
    Scaler(#[source] InferenceError),

    #[error("model `{model}` failed: {reason}")]
    Model { model: String, reason: String },
}

/// One model's output.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProbability {
    pub model: String,
    /// Raw positive-class probability in `[0, 1]`.
    pub probability: f64,
    /// `probability * 100` rounded to one decimal.
    pub percent: f64,
    /// `probability * 100` formatted like `"70.0%"`.
    pub display: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleOutcome {
    /// Per-model results in artifact order.
    pub models: Vec<ModelProbability>,
    /// Mean of the per-model `percent` values, rounded to one decimal.
    pub percent: f64,
}

pub fn aggregate(
    artifact: &Artifact,
    features: &FeatureVector,
) -> Result<EnsembleOutcome, PredictionError> {
    if artifact.models().is_empty() {
        return Err(PredictionError::NoModels);
    }

    // The scaler and the models were fit on columns in exactly this order.
    let row = artifact
        .features()
        .iter()
        .map(|name| {
            features
                .get(name)
                .map(|value| value.as_f64())
                .ok_or_else(|| PredictionError::MissingFeature(name.clone()))
        })
        .collect::<Result<Vec<f64>, _>>()?;

    check_finite(&row)?;
    let scaled = match artifact.scaler() {
        Some(scaler) => {
            let scaled = scaler.transform(&row).map_err(PredictionError::Scaler)?;
            check_finite(&scaled)?;
            scaled
        }
        None => row,
    };

    let mut models = Vec::with_capacity(artifact.models().len());
    for entry in artifact.models() {
        let probability = entry
            .model
            .positive_probability(&scaled)
            .map_err(|e| PredictionError::Model {
                model: entry.name.clone(),
                reason: e.to_string(),
            })?;

        if !(0.0..=1.0).contains(&probability) {
            return Err(PredictionError::Model {
                model: entry.name.clone(),
                reason: format!("probability {} is outside [0, 1]", probability),
            });
        }

        let percent = probability * 100.0;
        models.push(ModelProbability {
            model: entry.name.clone(),
            probability,
            percent: round_to_tenth(percent),
            display: format!("{:.1}%", percent),
        });
    }

    let mean = models.iter().map(|m| m.percent).sum::<f64>() / models.len() as f64;

    Ok(EnsembleOutcome {
        models,
        percent: round_to_tenth(mean),
    })
}

/// Infinite or NaN columns would reach the models and come back as a
/// plausible-looking probability, so they fail the request instead.
fn check_finite(row: &[f64]) -> Result<(), PredictionError> {
    match row.iter().position(|v| !v.is_finite()) {
        Some(column) => Err(PredictionError::Scaler(InferenceError::NonFiniteInput(column))),
        None => Ok(()),
    }
}

/// Rounds to one decimal place using the same rule as `{:.1}` formatting, so
/// chart values always agree with the displayed strings.
pub fn round_to_tenth(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureTransform, FeatureValue, ProbabilityProvider};

    struct Fixed(f64);

    impl ProbabilityProvider for Fixed {
        fn positive_probability(&self, _row: &[f64]) -> Result<f64, InferenceError> {
            Ok(self.0)
        }
    }

    fn fixed(probability: f64) -> Box<dyn ProbabilityProvider> {
        Box::new(Fixed(probability))
    }

    /// Returns the first scaled column, to observe what the models receive.
    struct Echo;

    impl ProbabilityProvider for Echo {
        fn positive_probability(&self, row: &[f64]) -> Result<f64, InferenceError> {
            Ok(row[0])
        }
    }

    /// `(x - 0.25) / 0.5` on every column.
    struct Standardise;

    impl FeatureTransform for Standardise {
        fn transform(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
            Ok(row.iter().map(|v| (v - 0.25) / 0.5).collect())
        }
    }

    /// Overflows every column, like a scaler fed values near `f64::MAX`.
    struct Overflow;

    impl FeatureTransform for Overflow {
        fn transform(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
            Ok(row.iter().map(|v| v * f64::MAX * 10.0).collect())
        }
    }

    fn artifact(models: Vec<(&str, Box<dyn ProbabilityProvider>)>) -> Artifact {
        Artifact::new(
            vec!["a".to_string(), "b".to_string()],
            None,
            models
                .into_iter()
                .map(|(name, model)| (name.to_string(), model))
                .collect(),
            vec![],
        )
        .unwrap()
    }

    fn input() -> FeatureVector {
        let mut vector = FeatureVector::new();
        vector.push("a", FeatureValue::Integer(0.0));
        vector.push("b", FeatureValue::Continuous(0.5));
        vector
    }

    #[test]
    fn averages_two_models() {
        let artifact = artifact(vec![
            ("Random Forest", fixed(0.70)),
            ("Logistic Regression", fixed(0.80)),
        ]);

        let outcome = aggregate(&artifact, &input()).unwrap();

        assert_eq!(outcome.percent, 75.0);
        let displays: Vec<&str> = outcome.models.iter().map(|m| m.display.as_str()).collect();
        assert_eq!(displays, vec!["70.0%", "80.0%"]);
        assert_eq!(outcome.models[0].model, "Random Forest");
    }

    #[test]
    fn mean_uses_rounded_model_percents() {
        let artifact = artifact(vec![
            ("x", fixed(0.12345)),
            ("y", fixed(0.5)),
            ("z", fixed(0.98765)),
        ]);

        let outcome = aggregate(&artifact, &input()).unwrap();
        let percents: Vec<f64> = outcome.models.iter().map(|m| m.percent).collect();

        assert_eq!(percents, vec![12.3, 50.0, 98.8]);
        assert_eq!(outcome.percent, round_to_tenth((12.3 + 50.0 + 98.8) / 3.0));
        assert_eq!(outcome.percent, 53.7);
    }

    #[test]
    fn empty_ensemble_is_refused() {
        let artifact = artifact(vec![]);

        assert_eq!(
            aggregate(&artifact, &input()),
            Err(PredictionError::NoModels)
        );
    }

    #[test]
    fn out_of_range_probability_fails_the_request() {
        let artifact = artifact(vec![("ok", fixed(0.5)), ("bad", fixed(1.5))]);

        let err = aggregate(&artifact, &input()).unwrap_err();
        assert!(matches!(err, PredictionError::Model { ref model, .. } if model == "bad"));
    }

    #[test]
    fn nan_probability_fails_the_request() {
        let artifact = artifact(vec![("nan", fixed(f64::NAN))]);
        assert!(aggregate(&artifact, &input()).is_err());
    }

    #[test]
    fn row_follows_artifact_order_and_is_scaled() {
        let artifact = Artifact::new(
            vec!["b".to_string(), "a".to_string()],
            Some(Box::new(Standardise)),
            vec![("echo".to_string(), Box::new(Echo) as Box<dyn ProbabilityProvider>)],
            vec![],
        )
        .unwrap();

        // b = 0.5 comes first, then (0.5 - 0.25) / 0.5 = 0.5.
        let outcome = aggregate(&artifact, &input()).unwrap();
        assert_eq!(outcome.models[0].probability, 0.5);
    }

    #[test]
    fn infinite_input_fails_before_any_model() {
        let artifact = artifact(vec![("echo", Box::new(Echo) as Box<dyn ProbabilityProvider>)]);

        let mut features = FeatureVector::new();
        features.push("a", FeatureValue::Integer(0.0));
        features.push("b", FeatureValue::Continuous(f64::INFINITY));

        assert_eq!(
            aggregate(&artifact, &features),
            Err(PredictionError::Scaler(InferenceError::NonFiniteInput(1)))
        );
    }

    #[test]
    fn non_finite_scaled_row_fails_the_request() {
        let artifact = Artifact::new(
            vec!["a".to_string(), "b".to_string()],
            Some(Box::new(Overflow)),
            vec![("echo".to_string(), Box::new(Echo) as Box<dyn ProbabilityProvider>)],
            vec![],
        )
        .unwrap();

        assert!(matches!(
            aggregate(&artifact, &input()),
            Err(PredictionError::Scaler(InferenceError::NonFiniteInput(1)))
        ));
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let artifact = artifact(vec![("a", fixed(0.33)), ("b", fixed(0.91))]);

        let first = aggregate(&artifact, &input()).unwrap();
        let second = aggregate(&artifact, &input()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rounding_matches_display_formatting() {
        assert_eq!(round_to_tenth(70.0), 70.0);
        assert_eq!(round_to_tenth(12.345), 12.3);
        assert_eq!(round_to_tenth(99.96), 100.0);
    }
}
