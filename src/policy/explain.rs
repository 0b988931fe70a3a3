// Deterministic "why these thresholds?" explanation.
//
// Built only from the echoed inputs and statistics stored in an
// OptimizationResult, so a persisted sweep can be explained later without
// re-running the optimizer. Plain text; the terminal layer adds color.

use super::optimizer::OptimizationResult;

/// Render the explanation as a list of plain-text lines.
pub fn explain(result: &OptimizationResult) -> Vec<String> {
    let g = &result.guardrails.guardrails;
    let c = &result.guardrails.costs;
    let s = &result.stats;

    let mut lines = vec![
        format!(
            "Guardrails: max_block_rate={}, max_step_rate={}. Costs: C_FN={}, C_FP_STEP={}, C_FP_BLOCK={}.",
            g.max_block_rate, g.max_step_rate, c.c_fn, c.c_fp_step, c.c_fp_block
        ),
        format!(
            "Chosen thresholds: tau1={:.3}, tau2={:.3} (total cost={:.1}).",
            result.tau1, result.tau2, result.cost
        ),
        format!(
            "Breakdown at chosen thresholds: FN={}, FP(step)={}, FP(block)={}; block_rate={:.3}, step_rate={:.3}.",
            s.fn_, s.fp_step, s.fp_block, s.block_rate, s.step_rate
        ),
    ];

    if let Some(alt) = result.closest_alternative() {
        lines.push(format!(
            "Closest alternative: tau1={:.3}, tau2={:.3} (cost={:.1}). Chosen pair had lower or equal cost under guardrails.",
            alt.tau1, alt.tau2, alt.cost
        ));
    }

    if result.fallback_used {
        lines.push(
            "No threshold pair met both guardrails; the fallback pair was applied without guardrail checks."
                .to_string(),
        );
    }

    if result.is_single_class() {
        lines.push(format!(
            "Evaluation sample is single-class ({} events, {} malicious); treat these thresholds as low-confidence.",
            result.events, result.malicious
        ));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::optimizer::optimize;

    #[test]
    fn test_explains_winner_and_alternative() {
        let scores = [0.05, 0.40, 0.96, 0.30, 0.70];
        let labels = [0, 0, 1, 0, 1];
        let result = optimize(&scores, &labels, 100.0, 1.0, 5.0, 1.0, 1.0).unwrap();
        let lines = explain(&result);
        assert!(lines[0].starts_with("Guardrails: max_block_rate=1"));
        assert!(lines[1].contains(&format!("tau1={:.3}", result.tau1)));
        assert!(lines.iter().any(|l| l.starts_with("Closest alternative")));
        assert!(!lines.iter().any(|l| l.contains("fallback")));
    }

    #[test]
    fn test_notes_fallback_and_single_class() {
        // 0.99 sits above the top grid value, so every pair blocks it.
        let result = optimize(&[0.5, 0.99], &[1, 1], 100.0, 1.0, 5.0, 0.0, 0.0).unwrap();
        assert!(result.fallback_used);
        let lines = explain(&result);
        assert!(lines.iter().any(|l| l.contains("fallback pair")));
        assert!(lines.iter().any(|l| l.contains("low-confidence")));
        assert!(!lines.iter().any(|l| l.starts_with("Closest alternative")));
    }
}
