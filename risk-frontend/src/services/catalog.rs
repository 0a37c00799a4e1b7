//! Display labels and category names for the heart-disease features.
//!
//! Used only for presentation; prediction never consults this table.

const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("age", "Age"),
    ("sex", "Gender"),
    ("cp", "Chest Pain Type"),
    ("trestbps", "Resting Blood Pressure"),
    ("chol", "Cholesterol"),
    ("fbs", "Fasting Blood Sugar > 120 mg/dl"),
    ("restecg", "Resting ECG Results"),
    ("thalach", "Maximum Heart Rate"),
    ("exang", "Exercise Induced Angina"),
    ("oldpeak", "ST Depression"),
    ("slope", "ST Slope"),
    ("ca", "Number of Major Vessels"),
    ("thal", "Thalassemia"),
];

const NO_YES: &[(i64, &str)] = &[(0, "No"), (1, "Yes")];

const CATEGORY_MAPPINGS: &[(&str, &[(i64, &str)])] = &[
    ("sex", &[(0, "Female"), (1, "Male")]),
    ("fbs", NO_YES),
    ("exang", NO_YES),
    (
        "cp",
        &[
            (0, "Asymptomatic"),
            (1, "Atypical Angina"),
            (2, "Non-Anginal Pain"),
            (3, "Typical Angina"),
        ],
    ),
    (
        "restecg",
        &[
            (0, "Normal"),
            (1, "ST-T Wave Abnormality"),
            (2, "LV Hypertrophy"),
        ],
    ),
    ("slope", &[(0, "Downsloping"), (1, "Flat"), (2, "Upsloping")]),
    (
        "thal",
        &[(1, "Normal"), (2, "Fixed Defect"), (3, "Reversible Defect")],
    ),
];

pub fn display_label(feature: &str) -> Option<&'static str> {
    DISPLAY_NAMES
        .iter()
        .find(|(name, _)| *name == feature)
        .map(|(_, label)| *label)
}

/// All known codes for a categorical feature, in code order.
pub fn categories(feature: &str) -> Option<&'static [(i64, &'static str)]> {
    CATEGORY_MAPPINGS
        .iter()
        .find(|(name, _)| *name == feature)
        .map(|(_, mapping)| *mapping)
}

pub fn category_label(feature: &str, code: i64) -> Option<&'static str> {
    categories(feature)?
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, label)| *label)
}
