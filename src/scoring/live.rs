// Live scoring — classify a single login event with persisted thresholds.
//
// Uses the evaluator's boundary rule (score == tau1 -> step_up,
// score == tau2 -> block) so runtime decisions match calibration stats.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::features::FeatureRow;
use super::model::RiskModel;
use crate::policy::{Action, ThresholdPair};

/// The decision returned for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub score: f64,
    pub decision: Action,
    pub tau1: f64,
    pub tau2: f64,
}

/// Score one event's raw features and bucket it.
pub fn score_event(
    model: &dyn RiskModel,
    features: &Map<String, Value>,
    thresholds: ThresholdPair,
) -> Result<Decision> {
    let row = FeatureRow::from_json(features);
    let score = model.predict_proba(&row)?;
    Ok(decide(score, thresholds))
}

/// Bucket an already-computed probability.
pub fn decide(score: f64, thresholds: ThresholdPair) -> Decision {
    Decision {
        score,
        decision: thresholds.classify(score),
        tau1: thresholds.tau1,
        tau2: thresholds.tau2,
    }
}

/// Parse a `{"features": {...}}` scoring payload.
pub fn parse_payload(raw: &str) -> Result<Map<String, Value>> {
    if raw.trim().is_empty() {
        anyhow::bail!("No input payload received");
    }
    let payload: Value = serde_json::from_str(raw).context("Payload is not valid JSON")?;
    match payload.get("features") {
        Some(Value::Object(features)) => Ok(features.clone()),
        _ => anyhow::bail!("Payload must contain a 'features' object"),
    }
}
