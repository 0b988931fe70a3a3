// Data models — Rust structs that map to database rows.
//
// Kept separate from the queries so the retrain pipeline can build history
// entries without depending on rusqlite.

use serde::{Deserialize, Serialize};

/// What kind of data prompted a retrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrainKind {
    /// First capture from the existing data, no new batch.
    Baseline,
    /// Retrain after a mostly benign batch.
    Benign,
    /// Retrain after an attack-heavy batch.
    Attack,
}

impl RetrainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrainKind::Baseline => "baseline",
            RetrainKind::Benign => "benign",
            RetrainKind::Attack => "attack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "baseline" => Some(RetrainKind::Baseline),
            "benign" => Some(RetrainKind::Benign),
            "attack" => Some(RetrainKind::Attack),
            _ => None,
        }
    }
}

impl std::fmt::Display for RetrainKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A retrain outcome ready to be recorded (no id or timestamp yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainEntry {
    pub kind: RetrainKind,
    pub attack_rate: Option<f64>,
    pub tau1: f64,
    pub tau2: f64,
    pub d_tau1: f64,
    pub d_tau2: f64,
    pub cost: f64,
    pub fallback_used: bool,
    pub events: i64,
}

/// One row of threshold history — the outcome of a single retrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainRecord {
    pub id: i64,
    pub kind: RetrainKind,
    /// Attack share of the batch that triggered this retrain, if known.
    pub attack_rate: Option<f64>,
    pub tau1: f64,
    pub tau2: f64,
    /// Change since the previously persisted thresholds.
    pub d_tau1: f64,
    pub d_tau2: f64,
    pub cost: f64,
    pub fallback_used: bool,
    /// Evaluation sample size.
    pub events: i64,
    pub recorded_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [RetrainKind::Baseline, RetrainKind::Benign, RetrainKind::Attack] {
            assert_eq!(RetrainKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RetrainKind::parse("other"), None);
    }
}
