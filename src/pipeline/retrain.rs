// Retrain tuning: re-select thresholds for a freshly scored held-out split.
//
// Steps:
// 1. Load the persisted policy config (costs, guardrails, live thresholds)
// 2. Run the threshold sweep under those costs and guardrails
// 3. Write the new thresholds back into the policy config
// 4. Save the sweep record for later explanation
// 5. Return a history entry with the threshold deltas

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::sample::EvaluationSample;
use crate::db::models::{RetrainEntry, RetrainKind};
use crate::policy::{OptimizationResult, ThresholdOptimizer, ThresholdPair};
use crate::store::policy::PolicyConfig;
use crate::store::sweep::SweepRecord;

/// Where the retrain reads and writes its artifacts.
pub struct RetrainPaths<'a> {
    pub policy: &'a Path,
    pub sweep: &'a Path,
}

/// Everything a retrain produced.
#[derive(Debug, Clone)]
pub struct RetrainOutcome {
    /// Thresholds that were live before this retrain.
    pub previous: ThresholdPair,
    pub result: OptimizationResult,
    /// History row describing this retrain.
    pub entry: RetrainEntry,
}

/// Run the sweep over `sample` with the persisted costs and guardrails,
/// then persist the chosen thresholds and the sweep record.
///
/// `threads` caps the rayon pool used for the grid; None uses the global
/// pool. `on_evaluated` is called once per candidate pair. An
/// `attack_rate` outside [0, 1] is rejected before anything is written.
pub fn tune(
    sample: &EvaluationSample,
    paths: &RetrainPaths<'_>,
    optimizer: &ThresholdOptimizer,
    kind: RetrainKind,
    attack_rate: Option<f64>,
    threads: Option<usize>,
    on_evaluated: &(dyn Fn() + Sync),
) -> Result<RetrainOutcome> {
    if let Some(rate) = attack_rate {
        if !(0.0..=1.0).contains(&rate) {
            anyhow::bail!("Invalid attack rate {rate} (must be a share in [0, 1])");
        }
    }

    let mut config = PolicyConfig::load(paths.policy);
    let previous = ThresholdPair {
        tau1: config.tau1,
        tau2: config.tau2,
    };

    let sweep = || {
        optimizer.run_with_progress(
            &sample.scores,
            &sample.labels,
            &config.costs,
            &config.guardrails,
            on_evaluated,
        )
    };

    let result = match threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .context("Failed to build rayon pool for threshold sweep")?;
            pool.install(sweep)?
        }
        None => sweep()?,
    };

    if result.fallback_used {
        warn!("Guardrails unattainable on this sample; persisting fallback thresholds");
    }

    config.tau1 = result.tau1;
    config.tau2 = result.tau2;
    config.save(paths.policy)?;
    SweepRecord::new(result.clone()).save(paths.sweep)?;

    let entry = RetrainEntry {
        kind,
        attack_rate,
        tau1: result.tau1,
        tau2: result.tau2,
        d_tau1: result.tau1 - previous.tau1,
        d_tau2: result.tau2 - previous.tau2,
        cost: result.cost,
        fallback_used: result.fallback_used,
        events: result.events as i64,
    };

    info!(
        kind = kind.as_str(),
        tau1 = format!("{:.3}", result.tau1),
        tau2 = format!("{:.3}", result.tau2),
        d_tau1 = format!("{:+.3}", entry.d_tau1),
        d_tau2 = format!("{:+.3}", entry.d_tau2),
        "Retrain thresholds persisted"
    );

    Ok(RetrainOutcome {
        previous,
        result,
        entry,
    })
}
