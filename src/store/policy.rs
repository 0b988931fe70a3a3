// Persisted policy configuration (agent_config.json).
//
// Holds the live thresholds plus the cost weights and guardrails the next
// retrain will optimize under. Missing keys take defaults, and a missing or
// unreadable file yields the full default config so scoring and retraining
// keep running.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::policy::{CostWeights, Guardrails, ThresholdPair};

/// Threshold configuration persisted between retrains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub tau1: f64,
    pub tau2: f64,
    #[serde(flatten)]
    pub costs: CostWeights,
    #[serde(flatten)]
    pub guardrails: Guardrails,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            tau1: 0.35,
            tau2: 0.95,
            costs: CostWeights::default(),
            guardrails: Guardrails::default(),
        }
    }
}

impl PolicyConfig {
    /// Load the config, falling back to defaults on a missing or corrupt
    /// file.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|json| serde_json::from_str(&json).map_err(anyhow::Error::from))
        {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable policy config, using defaults");
                Self::default()
            }
        }
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        super::ensure_parent(path)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write policy config to {}", path.display()))?;
        Ok(())
    }

    /// The live thresholds. Invalid persisted values fall back to the
    /// defaults rather than failing scoring.
    pub fn thresholds(&self) -> ThresholdPair {
        ThresholdPair::new(self.tau1, self.tau2).unwrap_or_else(|e| {
            warn!(error = %e, "Persisted thresholds invalid, using defaults");
            let d = Self::default();
            ThresholdPair {
                tau1: d.tau1,
                tau2: d.tau2,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_merges_with_defaults() {
        let config: PolicyConfig = serde_json::from_str(r#"{"tau1": 0.2, "C_FN": 50}"#).unwrap();
        assert_eq!(config.tau1, 0.2);
        assert_eq!(config.tau2, 0.95);
        assert_eq!(config.costs.c_fn, 50.0);
        assert_eq!(config.costs.c_fp_block, 5.0);
        assert_eq!(config.guardrails.max_step_rate, 0.10);
    }

    #[test]
    fn test_serializes_flat_keys() {
        let json = serde_json::to_value(PolicyConfig::default()).unwrap();
        for key in [
            "tau1",
            "tau2",
            "C_FN",
            "C_FP_STEP",
            "C_FP_BLOCK",
            "max_block_rate",
            "max_step_rate",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn test_invalid_thresholds_fall_back() {
        let config = PolicyConfig {
            tau1: 0.9,
            tau2: 0.1,
            ..PolicyConfig::default()
        };
        let pair = config.thresholds();
        assert_eq!((pair.tau1, pair.tau2), (0.35, 0.95));
    }
}
