// Last sweep record (last_sweep.json) — kept so `riskgate explain` can
// reconstruct why the live thresholds were chosen.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::OptimizationResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRecord {
    pub ts: DateTime<Utc>,
    pub tau1: f64,
    pub tau2: f64,
    pub sweep: OptimizationResult,
}

impl SweepRecord {
    pub fn new(sweep: OptimizationResult) -> Self {
        Self {
            ts: Utc::now(),
            tau1: sweep.tau1,
            tau2: sweep.tau2,
            sweep,
        }
    }

    /// Load the last sweep, or None if no retrain has run yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sweep record from {}", path.display()))?;
        let record = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse sweep record at {}", path.display()))?;
        Ok(Some(record))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        super::ensure_parent(path)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write sweep record to {}", path.display()))?;
        Ok(())
    }
}
