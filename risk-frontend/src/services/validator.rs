//! Form validation: every declared feature must be present and numeric.

use crate::models::{FeatureValue, FeatureVector};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing value for {0}")]
    MissingField(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Coerces submitted form pairs into a [`FeatureVector`] ordered like
/// `features`.
///
/// Features named in `continuous` keep their float value; every other feature
/// is parsed as a float and truncated toward zero. The first occurrence of a
/// repeated field wins. No range checks are made.
pub fn validate(
    features: &[String],
    continuous: &[String],
    submitted: &[(String, String)],
) -> Result<FeatureVector, ValidationError> {
    let mut vector = FeatureVector::new();

    for feature in features {
        let raw = submitted
            .iter()
            .find(|(name, _)| name == feature)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| ValidationError::MissingField(feature.clone()))?;

        let is_continuous = continuous.iter().any(|name| name == feature);
        vector.push(feature.clone(), coerce(feature, raw, is_continuous)?);
    }

    Ok(vector)
}

fn coerce(feature: &str, raw: &str, continuous: bool) -> Result<FeatureValue, ValidationError> {
    let parsed = raw.trim().parse::<f64>().map_err(|e| {
        ValidationError::InvalidInput(format!("cannot parse '{}' for {}: {}", raw, feature, e))
    })?;

    if continuous {
        return Ok(FeatureValue::Continuous(parsed));
    }

    if !parsed.is_finite() {
        return Err(ValidationError::InvalidInput(format!(
            "cannot convert '{}' for {} to an integer",
            raw, feature
        )));
    }

    // Adding zero folds the -0.0 that truncating (-1, 0) yields into 0.0.
    Ok(FeatureValue::Integer(parsed.trunc() + 0.0))
}
