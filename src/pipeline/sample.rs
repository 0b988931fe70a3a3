// Evaluation sample loading.
//
// The retraining side exports its held-out, time-ordered split as JSON
// Lines. Each record carries a 0/1 label and either a precomputed `score`
// or the raw `features` to run through the live model:
//
//   {"score": 0.82, "label": 1}
//   {"features": {"rtt_ms": 120, "country_ip": "DE"}, "label": 0}

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::scoring::features::FeatureRow;
use crate::scoring::model::RiskModel;

/// One line of a sample file.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleRecord {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub features: Option<Map<String, Value>>,
    pub label: u8,
}

/// Aligned score and label vectors, ready for the optimizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationSample {
    pub scores: Vec<f64>,
    pub labels: Vec<u8>,
}

impl EvaluationSample {
    /// Load and score a JSON Lines sample file.
    pub fn load(path: &Path, model: Option<&dyn RiskModel>) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sample file {}", path.display()))?;
        let records = parse_records(&text)
            .with_context(|| format!("Invalid sample file {}", path.display()))?;
        Self::from_records(&records, model)
    }

    /// Build vectors from parsed records. Records without a score need a
    /// model to score their features.
    pub fn from_records(records: &[SampleRecord], model: Option<&dyn RiskModel>) -> Result<Self> {
        let mut sample = Self {
            scores: Vec::with_capacity(records.len()),
            labels: Vec::with_capacity(records.len()),
        };
        for (i, record) in records.iter().enumerate() {
            let score = match (record.score, &record.features, model) {
                (Some(score), _, _) => score,
                (None, Some(features), Some(model)) => model
                    .predict_proba(&FeatureRow::from_json(features))
                    .with_context(|| format!("Failed to score record {}", i + 1))?,
                (None, Some(_), None) => anyhow::bail!(
                    "Record {} has features but no model is loaded (set RISKGATE_MODEL_PATH)",
                    i + 1
                ),
                (None, None, _) => {
                    anyhow::bail!("Record {} has neither a score nor features", i + 1)
                }
            };
            sample.scores.push(score);
            sample.labels.push(record.label);
        }
        Ok(sample)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Share of malicious events, or 0 for an empty sample.
    pub fn attack_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|&&l| l == 1).count() as f64 / self.labels.len() as f64
    }
}

/// Parse JSON Lines, skipping blank lines. Errors name the 1-based line.
pub fn parse_records(text: &str) -> Result<Vec<SampleRecord>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<SampleRecord>(line)
                .with_context(|| format!("Line {}: malformed sample record", i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::model::LogisticModel;

    #[test]
    fn test_parse_scores_and_skip_blank_lines() {
        let text = "{\"score\": 0.2, \"label\": 0}\n\n{\"score\": 0.9, \"label\": 1}\n";
        let records = parse_records(text).unwrap();
        let sample = EvaluationSample::from_records(&records, None).unwrap();
        assert_eq!(sample.scores, vec![0.2, 0.9]);
        assert_eq!(sample.labels, vec![0, 1]);
        assert_eq!(sample.attack_rate(), 0.5);
    }

    #[test]
    fn test_malformed_line_is_named() {
        let text = "{\"score\": 0.2, \"label\": 0}\n{\"score\": 0.9}\n";
        let err = parse_records(text).unwrap_err();
        assert!(format!("{err}").contains("Line 2"), "got {err}");
    }

    #[test]
    fn test_features_need_a_model() {
        let records = parse_records("{\"features\": {\"rtt_ms\": 5}, \"label\": 0}").unwrap();
        assert!(EvaluationSample::from_records(&records, None).is_err());

        let model = LogisticModel {
            intercept: 0.0,
            numeric: Default::default(),
            categorical: Default::default(),
        };
        let sample = EvaluationSample::from_records(&records, Some(&model)).unwrap();
        assert_eq!(sample.scores, vec![0.5]);
    }

    #[test]
    fn test_record_without_score_or_features() {
        let records = parse_records("{\"label\": 1}").unwrap();
        let err = EvaluationSample::from_records(&records, None).unwrap_err();
        assert!(format!("{err}").contains("neither"));
    }
}
