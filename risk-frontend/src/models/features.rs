use std::fmt;

/// One coerced form value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    /// Category codes and whole-number measurements, truncated toward zero.
    /// Held as a float so magnitudes past `i64` are still accepted.
    Integer(f64),
    /// Measurements that keep their fractional part.
    Continuous(f64),
}

impl FeatureValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            FeatureValue::Integer(v) | FeatureValue::Continuous(v) => *v,
        }
    }

    /// The value as a category code, if it is a whole number.
    pub fn as_code(&self) -> Option<i64> {
        let v = self.as_f64();
        // 2^63 itself is out of range, hence the strict upper bound.
        if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
            Some(v as i64)
        } else {
            None
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Integer(v) => write!(f, "{:.0}", v),
            FeatureValue::Continuous(v) if v.is_nan() => f.write_str("nan"),
            FeatureValue::Continuous(v) if v.is_infinite() => {
                f.write_str(if *v > 0.0 { "inf" } else { "-inf" })
            }
            // Whole floats keep a trailing ".0" so 2.0 is not shown as "2".
            FeatureValue::Continuous(v) if v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            FeatureValue::Continuous(v) => write!(f, "{}", v),
        }
    }
}

/// Validated form input, in the artifact's declared feature order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    entries: Vec<(String, FeatureValue)>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: FeatureValue) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
