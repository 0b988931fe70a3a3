// Risk model — the swap-ready abstraction over the trained classifier.
//
// Training happens elsewhere; this side only loads an exported artifact and
// produces a maliciousness probability for one feature row. The default
// artifact is a logistic model exported as JSON.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::features::FeatureRow;

/// Trait for producing a maliciousness probability from a feature row.
pub trait RiskModel: Send + Sync {
    /// Probability in [0, 1] that the event is malicious.
    fn predict_proba(&self, row: &FeatureRow) -> Result<f64>;
}

/// Logistic regression over numeric features plus one-hot categoricals.
///
/// `p = sigmoid(intercept + sum(w_i * x_i) + sum(w[cat][value]))`
/// Categorical values with no coefficient contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub intercept: f64,
    #[serde(default)]
    pub numeric: BTreeMap<String, f64>,
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
}

impl LogisticModel {
    /// Load a model artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Model file not found at {}\n\
                 Export a trained model there or set RISKGATE_MODEL_PATH.",
                path.display()
            );
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model from {}", path.display()))?;
        let model: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse model JSON at {}", path.display()))?;
        debug!(
            path = %path.display(),
            numeric = model.numeric.len(),
            categorical = model.categorical.len(),
            "Loaded risk model"
        );
        Ok(model)
    }

    fn linear_term(&self, row: &FeatureRow) -> f64 {
        let numeric: f64 = self
            .numeric
            .iter()
            .filter_map(|(name, w)| row.numeric.get(name).map(|x| w * x))
            .sum();
        let categorical: f64 = self
            .categorical
            .iter()
            .filter_map(|(name, levels)| {
                row.categorical
                    .get(name)
                    .and_then(|value| levels.get(value))
            })
            .sum();
        self.intercept + numeric + categorical
    }
}

impl RiskModel for LogisticModel {
    fn predict_proba(&self, row: &FeatureRow) -> Result<f64> {
        let z = self.linear_term(row);
        if !z.is_finite() {
            anyhow::bail!("Model produced a non-finite linear term ({z})");
        }
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

/// Owned, lazily loaded model handle.
///
/// Built once at startup and passed by reference into scoring calls. The
/// artifact is read on first use and cached for the handle's lifetime.
#[derive(Debug)]
pub struct ModelHandle {
    path: PathBuf,
    model: OnceLock<LogisticModel>,
}

impl ModelHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            model: OnceLock::new(),
        }
    }

    /// Wrap an already-loaded model (no file access).
    pub fn preloaded(model: LogisticModel) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(model);
        Self {
            path: PathBuf::new(),
            model: cell,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// Get the model, loading it on first call.
    pub fn get(&self) -> Result<&LogisticModel> {
        if let Some(model) = self.model.get() {
            return Ok(model);
        }
        let loaded = LogisticModel::load(&self.path)?;
        // A concurrent first call may have won the race; either copy is the
        // same artifact.
        Ok(self.model.get_or_init(|| loaded))
    }
}

impl RiskModel for ModelHandle {
    fn predict_proba(&self, row: &FeatureRow) -> Result<f64> {
        self.get()?.predict_proba(row)
    }
}
