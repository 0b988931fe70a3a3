// Retrain pipeline — from an exported evaluation split to persisted
// thresholds.

pub mod retrain;
pub mod sample;
