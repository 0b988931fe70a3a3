// Threshold optimizer — grid search over (tau1, tau2) pairs.
//
// Every ordered pair from an equally spaced grid is evaluated against the
// sample, pairs breaking a guardrail are dropped, and the survivors are
// ranked by weighted error cost. The winner and up to three runners-up are
// returned together with an echo of the inputs so the choice can be
// explained later without re-running the sweep.
//
// Candidates are evaluated in parallel with rayon. `collect()` on an
// indexed parallel iterator keeps enumeration order, and the ranking is a
// stable sort, so ties resolve exactly as a sequential sweep would: tau1
// ascending, then tau2 ascending, first found wins.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::evaluator::{PolicyStats, Sample, ThresholdPair};
use crate::error::PolicyError;

/// Pair used when no grid candidate satisfies both guardrails.
pub const FALLBACK_PAIR: ThresholdPair = ThresholdPair {
    tau1: 0.10,
    tau2: 0.90,
};

/// How many runners-up to report after the winner.
pub const MAX_ALTERNATIVES: usize = 3;

/// Largest accepted grid (about 50M candidate pairs).
pub const MAX_GRID_POINTS: usize = 10_000;

/// Per-event penalties used to rank candidate threshold pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    /// Malicious event wrongly allowed
    #[serde(rename = "C_FN")]
    pub c_fn: f64,
    /// Benign event wrongly challenged
    #[serde(rename = "C_FP_STEP")]
    pub c_fp_step: f64,
    /// Benign event wrongly blocked
    #[serde(rename = "C_FP_BLOCK")]
    pub c_fp_block: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            c_fn: 100.0,
            c_fp_step: 1.0,
            c_fp_block: 5.0,
        }
    }
}

impl CostWeights {
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (name, value) in [
            ("C_FN", self.c_fn),
            ("C_FP_STEP", self.c_fp_step),
            ("C_FP_BLOCK", self.c_fp_block),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PolicyError::InvalidCostWeight { name, value });
            }
        }
        Ok(())
    }

    /// Weighted error cost over raw counts (not rates), so a larger sample
    /// yields a proportionally larger cost.
    pub fn cost(&self, stats: &PolicyStats) -> f64 {
        self.c_fn * stats.fn_ as f64
            + self.c_fp_step * stats.fp_step as f64
            + self.c_fp_block * stats.fp_block as f64
    }
}

/// Caps on the fraction of events that may be blocked or challenged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guardrails {
    pub max_block_rate: f64,
    pub max_step_rate: f64,
}

impl Default for Guardrails {
    fn default() -> Self {
        Self {
            max_block_rate: 0.02,
            max_step_rate: 0.10,
        }
    }
}

impl Guardrails {
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (name, value) in [
            ("max_block_rate", self.max_block_rate),
            ("max_step_rate", self.max_step_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PolicyError::InvalidGuardrail { name, value });
            }
        }
        Ok(())
    }

    /// True when both observed rates are within their caps.
    pub fn admits(&self, stats: &PolicyStats) -> bool {
        stats.block_rate <= self.max_block_rate && stats.step_rate <= self.max_step_rate
    }
}

/// Equally spaced threshold values, `points` of them from `start` to
/// `stop` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdGrid {
    pub start: f64,
    pub stop: f64,
    pub points: usize,
}

impl Default for ThresholdGrid {
    fn default() -> Self {
        Self {
            start: 0.02,
            stop: 0.98,
            points: 25,
        }
    }
}

impl ThresholdGrid {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.points < 2 {
            return Err(PolicyError::invalid_grid(format!(
                "need at least 2 points, got {}",
                self.points
            )));
        }
        if self.points > MAX_GRID_POINTS {
            return Err(PolicyError::invalid_grid(format!(
                "at most {MAX_GRID_POINTS} points, got {}",
                self.points
            )));
        }
        if !(0.0..=1.0).contains(&self.start)
            || !(0.0..=1.0).contains(&self.stop)
            || self.start >= self.stop
        {
            return Err(PolicyError::invalid_grid(format!(
                "bounds must satisfy 0 <= start < stop <= 1, got {}..{}",
                self.start, self.stop
            )));
        }
        Ok(())
    }

    /// Grid values, ascending. The last value is exactly `stop`.
    pub fn values(&self) -> Vec<f64> {
        let step = (self.stop - self.start) / (self.points - 1) as f64;
        let mut values: Vec<f64> = (0..self.points)
            .map(|i| self.start + i as f64 * step)
            .collect();
        if let Some(last) = values.last_mut() {
            *last = self.stop;
        }
        values
    }

    /// All ordered pairs with tau1 < tau2, in enumeration order
    /// (tau1 ascending, then tau2 ascending).
    pub fn pairs(&self) -> Vec<ThresholdPair> {
        let values = self.values();
        let mut pairs = Vec::with_capacity(self.candidate_count());
        for (i, &tau1) in values.iter().enumerate() {
            for &tau2 in &values[i + 1..] {
                pairs.push(ThresholdPair { tau1, tau2 });
            }
        }
        pairs
    }

    /// G * (G - 1) / 2, saturating for grids that fail `validate`
    pub fn candidate_count(&self) -> usize {
        self.points.saturating_mul(self.points.saturating_sub(1)) / 2
    }
}

/// One evaluated threshold pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub tau1: f64,
    pub tau2: f64,
    pub cost: f64,
    pub stats: PolicyStats,
}

/// The inputs a sweep ran under, echoed into its result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuardrailEcho {
    #[serde(flatten)]
    pub guardrails: Guardrails,
    #[serde(flatten)]
    pub costs: CostWeights,
}

/// Outcome of one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub tau1: f64,
    pub tau2: f64,
    pub cost: f64,
    pub stats: PolicyStats,
    /// Runners-up in ascending cost order. Empty when the fallback was used.
    pub alternatives: Vec<Candidate>,
    pub guardrails: GuardrailEcho,
    /// Set when no candidate satisfied the guardrails and the fixed
    /// fallback pair was reported instead.
    pub fallback_used: bool,
    /// Sample size the sweep ran on.
    pub events: usize,
    /// Malicious events in the sample.
    pub malicious: usize,
}

impl OptimizationResult {
    pub fn pair(&self) -> ThresholdPair {
        ThresholdPair {
            tau1: self.tau1,
            tau2: self.tau2,
        }
    }

    /// Lowest-cost runner-up, if any.
    pub fn closest_alternative(&self) -> Option<&Candidate> {
        self.alternatives
            .iter()
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
    }

    /// All labels identical: thresholds should be treated as low-confidence.
    pub fn is_single_class(&self) -> bool {
        self.malicious == 0 || self.malicious == self.events
    }
}

/// Grid-search optimizer. Holds only configuration; every run is
/// independent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdOptimizer {
    pub grid: ThresholdGrid,
    pub max_alternatives: usize,
}

impl Default for ThresholdOptimizer {
    fn default() -> Self {
        Self {
            grid: ThresholdGrid::default(),
            max_alternatives: MAX_ALTERNATIVES,
        }
    }
}

impl ThresholdOptimizer {
    pub fn new(grid: ThresholdGrid) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    /// Run the sweep.
    pub fn run(
        &self,
        scores: &[f64],
        labels: &[u8],
        costs: &CostWeights,
        guardrails: &Guardrails,
    ) -> Result<OptimizationResult, PolicyError> {
        self.run_with_progress(scores, labels, costs, guardrails, &|| {})
    }

    /// Run the sweep, calling `on_evaluated` once per candidate pair.
    /// The callback may be invoked from several worker threads at once.
    pub fn run_with_progress(
        &self,
        scores: &[f64],
        labels: &[u8],
        costs: &CostWeights,
        guardrails: &Guardrails,
        on_evaluated: &(dyn Fn() + Sync),
    ) -> Result<OptimizationResult, PolicyError> {
        let sample = Sample::new(scores, labels)?;
        costs.validate()?;
        guardrails.validate()?;
        self.grid.validate()?;

        let echo = GuardrailEcho {
            guardrails: *guardrails,
            costs: *costs,
        };

        let pairs = self.grid.pairs();
        let evaluated: Vec<Option<Candidate>> = pairs
            .par_iter()
            .map(|&pair| {
                let stats = sample.tally(pair);
                on_evaluated();
                guardrails.admits(&stats).then(|| Candidate {
                    tau1: pair.tau1,
                    tau2: pair.tau2,
                    cost: costs.cost(&stats),
                    stats,
                })
            })
            .collect();

        let mut feasible: Vec<Candidate> = evaluated.into_iter().flatten().collect();
        debug!(
            candidates = pairs.len(),
            feasible = feasible.len(),
            "Evaluated threshold grid"
        );

        if feasible.is_empty() {
            let stats = sample.tally(FALLBACK_PAIR);
            let cost = costs.cost(&stats);
            warn!(
                max_block_rate = guardrails.max_block_rate,
                max_step_rate = guardrails.max_step_rate,
                "No threshold pair satisfies the guardrails, using fallback pair"
            );
            return Ok(OptimizationResult {
                tau1: FALLBACK_PAIR.tau1,
                tau2: FALLBACK_PAIR.tau2,
                cost,
                stats,
                alternatives: Vec::new(),
                guardrails: echo,
                fallback_used: true,
                events: sample.len(),
                malicious: sample.malicious(),
            });
        }

        // Stable: equal costs keep enumeration order.
        feasible.sort_by(|a, b| a.cost.total_cmp(&b.cost));
        let winner = feasible[0];
        let alternatives: Vec<Candidate> = feasible
            .iter()
            .skip(1)
            .take(self.max_alternatives)
            .copied()
            .collect();

        info!(
            tau1 = format!("{:.3}", winner.tau1),
            tau2 = format!("{:.3}", winner.tau2),
            cost = winner.cost,
            feasible = feasible.len(),
            "Selected thresholds"
        );

        Ok(OptimizationResult {
            tau1: winner.tau1,
            tau2: winner.tau2,
            cost: winner.cost,
            stats: winner.stats,
            alternatives,
            guardrails: echo,
            fallback_used: false,
            events: sample.len(),
            malicious: sample.malicious(),
        })
    }
}

/// Optimize thresholds on the default grid.
pub fn optimize(
    scores: &[f64],
    labels: &[u8],
    c_fn: f64,
    c_fp_step: f64,
    c_fp_block: f64,
    max_block_rate: f64,
    max_step_rate: f64,
) -> Result<OptimizationResult, PolicyError> {
    ThresholdOptimizer::default().run(
        scores,
        labels,
        &CostWeights {
            c_fn,
            c_fp_step,
            c_fp_block,
        },
        &Guardrails {
            max_block_rate,
            max_step_rate,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_matches_linspace() {
        let values = ThresholdGrid::default().values();
        assert_eq!(values.len(), 25);
        assert!((values[0] - 0.02).abs() < 1e-12);
        assert!((values[1] - 0.06).abs() < 1e-12);
        assert_eq!(values[24], 0.98);
    }

    #[test]
    fn test_pair_count() {
        let grid = ThresholdGrid::default();
        assert_eq!(grid.pairs().len(), 300);
        assert_eq!(grid.candidate_count(), 300);
        assert!(grid.pairs().iter().all(|p| p.tau1 < p.tau2));
    }

    #[test]
    fn test_pairs_in_enumeration_order() {
        let grid = ThresholdGrid {
            start: 0.25,
            stop: 0.75,
            points: 3,
        };
        let pairs: Vec<(f64, f64)> = grid.pairs().iter().map(|p| (p.tau1, p.tau2)).collect();
        assert_eq!(pairs, vec![(0.25, 0.5), (0.25, 0.75), (0.5, 0.75)]);
    }

    #[test]
    fn test_grid_rejects_single_point() {
        let grid = ThresholdGrid {
            start: 0.1,
            stop: 0.9,
            points: 1,
        };
        assert!(matches!(grid.validate(), Err(PolicyError::InvalidGrid { .. })));
    }

    #[test]
    fn test_grid_rejects_oversized_point_count() {
        let grid = ThresholdGrid {
            start: 0.1,
            stop: 0.9,
            points: usize::MAX / 2,
        };
        assert!(matches!(grid.validate(), Err(PolicyError::InvalidGrid { .. })));
        // Counting must not overflow even before validation
        assert_eq!(grid.candidate_count(), usize::MAX / 2);

        let largest = ThresholdGrid {
            points: MAX_GRID_POINTS,
            ..grid
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn test_cost_uses_raw_counts() {
        let stats = PolicyStats {
            tn: 10,
            fp_step: 3,
            fp_block: 2,
            tp: 4,
            fn_: 1,
            block_rate: 0.3,
            step_rate: 0.15,
        };
        // 100*1 + 1*3 + 5*2 = 113
        assert_eq!(CostWeights::default().cost(&stats), 113.0);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = optimize(&[0.5], &[0], -1.0, 1.0, 5.0, 1.0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::InvalidCostWeight { name: "C_FN", .. }
        ));
    }

    #[test]
    fn test_guardrail_out_of_range_rejected() {
        let err = optimize(&[0.5], &[0], 100.0, 1.0, 5.0, 1.5, 1.0).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::InvalidGuardrail {
                name: "max_block_rate",
                ..
            }
        ));
    }

    #[test]
    fn test_tie_break_prefers_first_enumerated() {
        // Every pair costs zero on an all-benign sample below the grid, so
        // the very first pair must win.
        let result = optimize(&[0.0, 0.01], &[0, 0], 100.0, 1.0, 5.0, 1.0, 1.0).unwrap();
        assert_eq!(result.tau1, 0.02);
        assert!((result.tau2 - 0.06).abs() < 1e-12);
        assert_eq!(result.cost, 0.0);
        assert_eq!(result.alternatives.len(), 3);
        assert!((result.alternatives[0].tau2 - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_echo_serializes_flat() {
        let result = optimize(&[0.5], &[0], 100.0, 1.0, 5.0, 0.02, 0.1).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        let g = &json["guardrails"];
        assert_eq!(g["max_block_rate"], 0.02);
        assert_eq!(g["C_FN"], 100.0);
        assert_eq!(g["C_FP_BLOCK"], 5.0);
    }
}
