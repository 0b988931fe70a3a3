use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::policy::ThresholdGrid;

/// Default store directory: `<data dir>/riskgate/model_store`, or
/// `./model_store` on platforms without a data dir.
pub fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("riskgate"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("model_store")
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Cost
/// weights and guardrails are NOT here: they live in the persisted policy
/// config so the retrain loop and the scorer read the same values.
pub struct Config {
    /// Directory holding the policy config, sweep record, model and database
    pub store_dir: PathBuf,
    /// Live thresholds + costs + guardrails (agent_config.json)
    pub policy_path: PathBuf,
    /// Last sweep, for explanations (last_sweep.json)
    pub sweep_path: PathBuf,
    /// Exported risk model artifact (rba_model.json)
    pub model_path: PathBuf,
    /// Threshold history database
    #[cfg(feature = "sqlite")]
    pub db_path: PathBuf,
    /// Candidate grid for the threshold sweep
    pub grid: ThresholdGrid,
    /// Cap on sweep worker threads (None = all cores)
    pub threads: Option<usize>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every value has a default; only malformed numbers are errors.
    pub fn load() -> Result<Self> {
        let store_dir = env::var("RISKGATE_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_store_dir());

        let path_or = |key: &str, file: &str| {
            env::var(key)
                .map(PathBuf::from)
                .unwrap_or_else(|_| store_dir.join(file))
        };

        let defaults = ThresholdGrid::default();
        let grid = ThresholdGrid {
            start: parse_env("RISKGATE_GRID_START")?.unwrap_or(defaults.start),
            stop: parse_env("RISKGATE_GRID_STOP")?.unwrap_or(defaults.stop),
            points: parse_env("RISKGATE_GRID_POINTS")?.unwrap_or(defaults.points),
        };

        let threads = parse_env::<usize>("RISKGATE_THREADS")?.filter(|&n| n > 0);

        Ok(Self {
            policy_path: path_or("RISKGATE_POLICY_PATH", "agent_config.json"),
            sweep_path: path_or("RISKGATE_SWEEP_PATH", "last_sweep.json"),
            model_path: path_or("RISKGATE_MODEL_PATH", "rba_model.json"),
            #[cfg(feature = "sqlite")]
            db_path: path_or("RISKGATE_DB_PATH", "riskgate.db"),
            store_dir,
            grid,
            threads,
        })
    }

    /// Check that the sweep grid is usable.
    /// Call this before any operation that runs the optimizer.
    pub fn require_grid(&self) -> Result<()> {
        self.grid.validate().map_err(|e| {
            anyhow::anyhow!(
                "{e}\nCheck RISKGATE_GRID_START / RISKGATE_GRID_STOP / RISKGATE_GRID_POINTS in your .env file."
            )
        })
    }

    /// Check that the model artifact exists.
    /// Call this before any operation that scores raw features.
    pub fn require_model(&self) -> Result<()> {
        if !self.model_path.exists() {
            anyhow::bail!(
                "Model file not found at {}\n\
                 Export a trained model there or set RISKGATE_MODEL_PATH.",
                self.model_path.display()
            );
        }
        Ok(())
    }
}

/// Parse an optional env var. Unset or empty is None; garbage is an error.
fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_dir_is_model_store() {
        let dir = default_store_dir();
        let path_str = dir.to_string_lossy();
        assert!(
            path_str.ends_with("model_store"),
            "Expected path ending in model_store, got: {path_str}"
        );
    }

    #[test]
    fn test_parse_env_unset_is_none() {
        let parsed: Option<usize> = parse_env("RISKGATE_TEST_SURELY_UNSET_VAR").unwrap();
        assert!(parsed.is_none());
    }
}
