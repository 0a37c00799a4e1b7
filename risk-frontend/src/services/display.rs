use crate::models::{DisplayField, FeatureVector};
use crate::services::catalog;

/// Human-readable echo of the submitted inputs, in submission order.
///
/// Unknown features keep their raw name; codes without a registered category
/// name are shown as the raw value.
pub fn readable_inputs(features: &FeatureVector) -> Vec<DisplayField> {
    features
        .iter()
        .map(|(name, value)| {
            let label = catalog::display_label(name).unwrap_or(name).to_string();
            let value = value
                .as_code()
                .and_then(|code| catalog::category_label(name, code))
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string());

            DisplayField { label, value }
        })
        .collect()
}
