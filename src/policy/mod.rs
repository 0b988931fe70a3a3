// Policy core — the three-way decision policy and its calibration.
//
// evaluator: confusion counts and rates for one (tau1, tau2) pair.
// optimizer: grid search over pairs under guardrails, ranked by cost.
// explain:   human-readable reconstruction of a sweep result.

pub mod evaluator;
pub mod explain;
pub mod optimizer;

pub use evaluator::{evaluate, Action, PolicyStats, Sample, ThresholdPair};
pub use optimizer::{
    optimize, Candidate, CostWeights, Guardrails, OptimizationResult, ThresholdGrid,
    ThresholdOptimizer, FALLBACK_PAIR, MAX_GRID_POINTS,
};
