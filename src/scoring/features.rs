// Feature row preparation for live scoring.
//
// Login events arrive as loose JSON objects. Every known feature gets a
// value: missing or unparsable numerics fall back to a per-feature default,
// categoricals are coerced to strings (numbers become their integer form,
// so `1` and `"1"` match the same one-hot column).

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Numeric features and their defaults, in model column order.
pub const NUMERIC_FEATURES: [(&str, f64); 10] = [
    ("attempts_1m_by_ip", 0.0),
    ("attempts_5m_by_ip", 0.0),
    ("attempts_1m_by_user", 0.0),
    ("attempts_5m_by_user", 0.0),
    ("fail_ratio_10m_by_ip", 0.0),
    ("burst_length_ip", 1.0),
    ("inter_attempt_ms_ip", 60000.0),
    ("geo_velocity_user", 0.0),
    ("rtt_ms", 0.0),
    ("login_success", 0.0),
];

/// Categorical features and their defaults.
pub const CATEGORICAL_FEATURES: [(&str, &str); 6] = [
    ("ua_family", "Unknown"),
    ("device_type", "desktop"),
    ("country_ip", "ZZ"),
    ("asn_ip", "asn0"),
    ("device_seen_before_user", "0"),
    ("cookie_seen_before_user", "0"),
];

/// A fully populated feature row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub numeric: BTreeMap<String, f64>,
    pub categorical: BTreeMap<String, String>,
}

impl FeatureRow {
    /// Build a row from a raw JSON feature object. Unknown keys are ignored.
    pub fn from_json(features: &Map<String, Value>) -> Self {
        let numeric = NUMERIC_FEATURES
            .iter()
            .map(|&(name, default)| {
                let value = features.get(name).and_then(as_f64).unwrap_or(default);
                (name.to_string(), value)
            })
            .collect();

        let categorical = CATEGORICAL_FEATURES
            .iter()
            .map(|&(name, default)| {
                let value = features
                    .get(name)
                    .and_then(as_category)
                    .unwrap_or_else(|| default.to_string());
                (name.to_string(), value)
            })
            .collect();

        Self {
            numeric,
            categorical,
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn as_category(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        // Truncates toward zero, e.g. 1.0 -> "1"
        Value::Number(n) => n.as_f64().map(|v| (v.trunc() as i64).to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> FeatureRow {
        FeatureRow::from_json(value.as_object().unwrap())
    }

    #[test]
    fn test_missing_features_take_defaults() {
        let r = row(json!({}));
        assert_eq!(r.numeric["burst_length_ip"], 1.0);
        assert_eq!(r.numeric["inter_attempt_ms_ip"], 60000.0);
        assert_eq!(r.categorical["country_ip"], "ZZ");
        assert_eq!(r.numeric.len(), NUMERIC_FEATURES.len());
        assert_eq!(r.categorical.len(), CATEGORICAL_FEATURES.len());
    }

    #[test]
    fn test_numeric_strings_are_parsed() {
        let r = row(json!({"rtt_ms": "250.5", "attempts_1m_by_ip": "lots"}));
        assert_eq!(r.numeric["rtt_ms"], 250.5);
        // Unparsable falls back to the default
        assert_eq!(r.numeric["attempts_1m_by_ip"], 0.0);
    }

    #[test]
    fn test_numeric_categoricals_become_integer_strings() {
        let r = row(json!({"device_seen_before_user": 1, "cookie_seen_before_user": 0.0}));
        assert_eq!(r.categorical["device_seen_before_user"], "1");
        assert_eq!(r.categorical["cookie_seen_before_user"], "0");
    }
}
