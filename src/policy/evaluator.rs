// Policy evaluator — confusion counts and operational rates for one
// threshold pair.
//
// Score space is split into three half-open buckets:
//   Allow   = [0, tau1)
//   Step-Up = [tau1, tau2)
//   Block   = [tau2, 1]
// A score sitting exactly on a threshold goes to the higher-action bucket.
// The live scorer uses `Action::from_score` too, so calibration-time
// statistics and runtime decisions can never disagree on a boundary.

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// The three possible actions for a scored login event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Allow,
    StepUp,
    Block,
}

impl Action {
    /// Bucket a score with the half-open interval rule.
    ///
    /// Callers must have validated the pair (see `ThresholdPair::new`).
    pub fn from_score(score: f64, pair: ThresholdPair) -> Self {
        if score >= pair.tau2 {
            Action::Block
        } else if score >= pair.tau1 {
            Action::StepUp
        } else {
            Action::Allow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::StepUp => "step_up",
            Action::Block => "block",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Two thresholds with 0 <= tau1 < tau2 <= 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub tau1: f64,
    pub tau2: f64,
}

impl ThresholdPair {
    /// Validate and build a pair. Rejects tau1 >= tau2, NaN, and anything
    /// outside [0, 1].
    pub fn new(tau1: f64, tau2: f64) -> Result<Self, PolicyError> {
        let in_range = |t: f64| (0.0..=1.0).contains(&t);
        if !in_range(tau1) || !in_range(tau2) || tau1 >= tau2 {
            return Err(PolicyError::InvalidThresholds { tau1, tau2 });
        }
        Ok(Self { tau1, tau2 })
    }

    /// Classify a single score against this pair.
    pub fn classify(&self, score: f64) -> Action {
        Action::from_score(score, *self)
    }
}

/// Confusion counts and operational rates for one threshold pair,
/// computed over the full evaluation sample.
///
/// A malicious event landing in Step-Up is counted in neither `tp` nor
/// `fn_`: step-up is treated as a non-terminal outcome for attackers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyStats {
    /// Benign and allowed.
    pub tn: u64,
    /// Benign but challenged.
    pub fp_step: u64,
    /// Benign but blocked.
    pub fp_block: u64,
    /// Malicious and blocked.
    pub tp: u64,
    /// Malicious but allowed.
    #[serde(rename = "fn")]
    pub fn_: u64,
    /// (fp_block + tp) / N
    pub block_rate: f64,
    /// fp_step / N
    pub step_rate: f64,
}

/// A validated, borrowed evaluation sample.
///
/// Construction checks the invariants once so the optimizer can evaluate
/// hundreds of candidate pairs without re-validating.
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a> {
    scores: &'a [f64],
    labels: &'a [u8],
}

impl<'a> Sample<'a> {
    pub fn new(scores: &'a [f64], labels: &'a [u8]) -> Result<Self, PolicyError> {
        if scores.len() != labels.len() {
            return Err(PolicyError::LengthMismatch {
                scores: scores.len(),
                labels: labels.len(),
            });
        }
        if scores.is_empty() {
            return Err(PolicyError::EmptySample);
        }
        if let Some((index, &value)) = scores
            .iter()
            .enumerate()
            .find(|(_, s)| !(0.0..=1.0).contains(*s))
        {
            return Err(PolicyError::InvalidScore { index, value });
        }
        if let Some((index, &value)) = labels.iter().enumerate().find(|(_, l)| **l > 1) {
            return Err(PolicyError::InvalidLabel { index, value });
        }
        Ok(Self { scores, labels })
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Always false for a constructed sample; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Number of malicious events in the sample.
    pub fn malicious(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }

    /// True when every label is identical; the resulting thresholds are
    /// low-confidence.
    pub fn is_single_class(&self) -> bool {
        let malicious = self.malicious();
        malicious == 0 || malicious == self.len()
    }

    /// Tally the confusion counts for an already-validated pair.
    pub fn tally(&self, pair: ThresholdPair) -> PolicyStats {
        let mut stats = PolicyStats {
            tn: 0,
            fp_step: 0,
            fp_block: 0,
            tp: 0,
            fn_: 0,
            block_rate: 0.0,
            step_rate: 0.0,
        };

        for (&score, &label) in self.scores.iter().zip(self.labels) {
            match (label == 1, pair.classify(score)) {
                (false, Action::Allow) => stats.tn += 1,
                (false, Action::StepUp) => stats.fp_step += 1,
                (false, Action::Block) => stats.fp_block += 1,
                (true, Action::Block) => stats.tp += 1,
                (true, Action::Allow) => stats.fn_ += 1,
                (true, Action::StepUp) => {}
            }
        }

        let n = self.len() as f64;
        stats.block_rate = (stats.fp_block + stats.tp) as f64 / n;
        stats.step_rate = stats.fp_step as f64 / n;
        stats
    }
}

/// Evaluate the three-way policy for one threshold pair.
///
/// Fails on an empty or misaligned sample and on a malformed pair.
pub fn evaluate(
    scores: &[f64],
    labels: &[u8],
    tau1: f64,
    tau2: f64,
) -> Result<PolicyStats, PolicyError> {
    let pair = ThresholdPair::new(tau1, tau2)?;
    let sample = Sample::new(scores, labels)?;
    Ok(sample.tally(pair))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_scores_go_to_higher_bucket() {
        let pair = ThresholdPair::new(0.3, 0.7).unwrap();
        assert_eq!(pair.classify(0.3), Action::StepUp);
        assert_eq!(pair.classify(0.7), Action::Block);
        assert_eq!(pair.classify(0.2999), Action::Allow);
        assert_eq!(pair.classify(0.6999), Action::StepUp);
    }

    #[test]
    fn test_counts_and_rates() {
        let scores = [0.1, 0.5, 0.9, 0.95, 0.05, 0.5];
        let labels = [0, 0, 0, 1, 1, 1];
        let stats = evaluate(&scores, &labels, 0.3, 0.8).unwrap();
        assert_eq!(stats.tn, 1);
        assert_eq!(stats.fp_step, 1);
        assert_eq!(stats.fp_block, 1);
        assert_eq!(stats.tp, 1);
        assert_eq!(stats.fn_, 1);
        // Malicious 0.5 sits in Step-Up and is not counted anywhere.
        assert!((stats.block_rate - 2.0 / 6.0).abs() < 1e-12);
        assert!((stats.step_rate - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_inverted_pair() {
        let err = evaluate(&[0.5], &[0], 0.6, 0.6).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidThresholds { .. }));
    }

    #[test]
    fn test_rejects_empty_sample() {
        assert_eq!(
            evaluate(&[], &[], 0.1, 0.9).unwrap_err(),
            PolicyError::EmptySample
        );
    }

    #[test]
    fn test_single_class_detection() {
        let scores = [0.1, 0.2];
        let labels = [0, 0];
        let sample = Sample::new(&scores, &labels).unwrap();
        assert!(sample.is_single_class());
        assert_eq!(sample.malicious(), 0);
    }

    #[test]
    fn test_stats_serialize_fn_key() {
        let stats = evaluate(&[0.05], &[1], 0.1, 0.9).unwrap();
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["fn"], 1);
        assert!(json.get("fn_").is_none());
    }
}
