// Unit tests for the policy evaluator.
//
// Tests the half-open bucket rule at both thresholds, the confusion
// breakdown (including the uncounted malicious-in-step-up case), rate
// arithmetic, and input validation.

use riskgate::policy::{evaluate, Action, ThresholdPair};
use riskgate::PolicyError;

// ============================================================
// Boundary rule
// ============================================================

#[test]
fn score_equal_to_tau1_is_step_up() {
    let pair = ThresholdPair::new(0.3, 0.7).unwrap();
    assert_eq!(pair.classify(0.3), Action::StepUp);
}

#[test]
fn score_equal_to_tau2_is_block() {
    let pair = ThresholdPair::new(0.3, 0.7).unwrap();
    assert_eq!(pair.classify(0.7), Action::Block);
}

#[test]
fn boundary_scores_counted_in_higher_buckets() {
    // scores = [tau1, tau2], both benign: one step-up FP, one block FP
    let stats = evaluate(&[0.3, 0.7], &[0, 0], 0.3, 0.7).unwrap();
    assert_eq!(stats.tn, 0);
    assert_eq!(stats.fp_step, 1);
    assert_eq!(stats.fp_block, 1);
    assert_eq!(stats.block_rate, 0.5);
    assert_eq!(stats.step_rate, 0.5);
}

#[test]
fn extremes_of_score_space() {
    let pair = ThresholdPair::new(0.0, 1.0).unwrap();
    assert_eq!(pair.classify(0.0), Action::StepUp);
    assert_eq!(pair.classify(0.999), Action::StepUp);
    assert_eq!(pair.classify(1.0), Action::Block);
}

// ============================================================
// Confusion breakdown
// ============================================================

#[test]
fn malicious_step_up_is_neither_tp_nor_fn() {
    let stats = evaluate(&[0.5], &[1], 0.3, 0.7).unwrap();
    assert_eq!(stats.tp, 0);
    assert_eq!(stats.fn_, 0);
    assert_eq!(stats.block_rate, 0.0);
    // step_rate only counts benign step-ups
    assert_eq!(stats.step_rate, 0.0);
}

#[test]
fn block_rate_counts_both_labels() {
    let stats = evaluate(&[0.9, 0.95, 0.1, 0.2], &[0, 1, 0, 1], 0.5, 0.8).unwrap();
    assert_eq!(stats.fp_block, 1);
    assert_eq!(stats.tp, 1);
    assert_eq!(stats.fn_, 1);
    assert_eq!(stats.tn, 1);
    assert_eq!(stats.block_rate, 0.5);
}

#[test]
fn single_class_sample_still_evaluates() {
    let stats = evaluate(&[0.1, 0.5, 0.9], &[0, 0, 0], 0.3, 0.7).unwrap();
    assert_eq!(stats.tp + stats.fn_, 0);
    assert_eq!(stats.tn + stats.fp_step + stats.fp_block, 3);
}

// ============================================================
// Validation
// ============================================================

#[test]
fn empty_sample_is_rejected() {
    assert_eq!(evaluate(&[], &[], 0.1, 0.9), Err(PolicyError::EmptySample));
}

#[test]
fn mismatched_lengths_are_rejected() {
    assert_eq!(
        evaluate(&[0.1, 0.2], &[0], 0.1, 0.9),
        Err(PolicyError::LengthMismatch {
            scores: 2,
            labels: 1
        })
    );
}

#[test]
fn equal_thresholds_are_rejected() {
    assert!(matches!(
        evaluate(&[0.5], &[0], 0.5, 0.5),
        Err(PolicyError::InvalidThresholds { .. })
    ));
}

#[test]
fn inverted_thresholds_are_rejected() {
    assert!(matches!(
        evaluate(&[0.5], &[0], 0.8, 0.2),
        Err(PolicyError::InvalidThresholds { .. })
    ));
}

#[test]
fn thresholds_outside_unit_interval_are_rejected() {
    assert!(ThresholdPair::new(-0.1, 0.5).is_err());
    assert!(ThresholdPair::new(0.5, 1.1).is_err());
    assert!(ThresholdPair::new(f64::NAN, 0.5).is_err());
}

#[test]
fn label_outside_zero_one_is_rejected() {
    assert_eq!(
        evaluate(&[0.1, 0.2], &[0, 2], 0.1, 0.9),
        Err(PolicyError::InvalidLabel { index: 1, value: 2 })
    );
}

#[test]
fn nan_score_is_rejected() {
    assert!(matches!(
        evaluate(&[f64::NAN], &[0], 0.1, 0.9),
        Err(PolicyError::InvalidScore { index: 0, .. })
    ));
}

#[test]
fn error_messages_are_readable() {
    let err = evaluate(&[0.5], &[0], 0.9, 0.1).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid thresholds tau1=0.9, tau2=0.1 (need 0 <= tau1 < tau2 <= 1)"
    );
}
