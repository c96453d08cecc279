//! Scalar parameter values
//!
//! Range parameters produce numbers, list and singleton parameters keep the
//! literal token text so substitution reproduces exactly what the template said.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One concrete value a parameter can take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Text(String),
}

impl ParameterValue {
    /// Ordering used for summary statistics.
    ///
    /// Numbers compare numerically, text compares lexicographically and
    /// numbers sort before text.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ParameterValue::Number(a), ParameterValue::Number(b)) => a.total_cmp(b),
            (ParameterValue::Text(a), ParameterValue::Text(b)) => a.cmp(b),
            (ParameterValue::Number(_), ParameterValue::Text(_)) => Ordering::Less,
            (ParameterValue::Text(_), ParameterValue::Number(_)) => Ordering::Greater,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParameterValue::Number(v) => Some(*v),
            ParameterValue::Text(_) => None,
        }
    }
}

/// Render a float the way the substitution contract expects: integral values
/// keep a trailing `.0`, everything else uses the shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Number(v) => f.write_str(&format_number(*v)),
            ParameterValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        ParameterValue::Number(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        ParameterValue::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_decimal_for_integral_floats() {
        assert_eq!(ParameterValue::Number(25.0).to_string(), "25.0");
        assert_eq!(ParameterValue::Number(-3.0).to_string(), "-3.0");
        assert_eq!(ParameterValue::Number(1.5).to_string(), "1.5");
        assert_eq!(ParameterValue::Number(1.7).to_string(), "1.7");
    }

    #[test]
    fn test_display_text_is_verbatim() {
        assert_eq!(ParameterValue::from("1.50").to_string(), "1.50");
        assert_eq!(ParameterValue::from("MC").to_string(), "MC");
    }

    #[test]
    fn test_compare() {
        let a = ParameterValue::Number(1.0);
        let b = ParameterValue::Number(2.0);
        assert_eq!(a.compare(&b), Ordering::Less);

        let x = ParameterValue::from("MD");
        let y = ParameterValue::from("MC");
        assert_eq!(x.compare(&y), Ordering::Greater);
        assert_eq!(a.compare(&x), Ordering::Less);
    }

    #[test]
    fn test_serde_untagged() {
        let json = serde_json::to_string(&ParameterValue::Number(25.0)).unwrap();
        assert_eq!(json, "25.0");
        let json = serde_json::to_string(&ParameterValue::from("1.0")).unwrap();
        assert_eq!(json, "\"1.0\"");

        let back: ParameterValue = serde_json::from_str("\"MC\"").unwrap();
        assert_eq!(back, ParameterValue::from("MC"));
        let back: ParameterValue = serde_json::from_str("30.0").unwrap();
        assert_eq!(back, ParameterValue::Number(30.0));
    }
}
