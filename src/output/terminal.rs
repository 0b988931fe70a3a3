// Colored terminal output for sweep results, explanations and history.
//
// This module handles all terminal-specific formatting. The main.rs command
// handlers delegate here.

use colored::Colorize;

use crate::db::models::{RetrainKind, RetrainRecord};
use crate::policy::{explain, Candidate, OptimizationResult, PolicyStats};

/// Display a sweep result: chosen pair, breakdown and runners-up.
pub fn display_sweep(result: &OptimizationResult) {
    println!("\n{}", "=== Threshold Sweep ===".bold());
    println!(
        "  Chosen: tau1={}  tau2={}  cost={:.1}",
        format!("{:.3}", result.tau1).bold(),
        format!("{:.3}", result.tau2).bold(),
        result.cost
    );
    println!("  Sample: {} events, {} malicious", result.events, result.malicious);
    display_stats(&result.stats);

    if result.fallback_used {
        println!(
            "\n  {} {}",
            "!".yellow().bold(),
            "No pair met the guardrails. Fallback thresholds applied.".yellow()
        );
        return;
    }

    if !result.alternatives.is_empty() {
        println!("\n  {}", "Closest alternatives:".dimmed());
        println!(
            "  {:>4}  {:>6}  {:>6}  {:>8}  {:>6}  {:>6}",
            "Rank".dimmed(),
            "tau1".dimmed(),
            "tau2".dimmed(),
            "Cost".dimmed(),
            "Block".dimmed(),
            "Step".dimmed(),
        );
        for (i, alt) in result.alternatives.iter().enumerate() {
            display_candidate_row(i + 2, alt);
        }
    }
}

/// Display confusion counts and rates for one pair.
pub fn display_stats(stats: &PolicyStats) {
    println!(
        "  TN={}  FP(step)={}  FP(block)={}  TP={}  FN={}",
        stats.tn,
        stats.fp_step,
        stats.fp_block,
        stats.tp,
        colorize_fn(stats.fn_),
    );
    println!(
        "  block_rate={:.3}  step_rate={:.3}",
        stats.block_rate, stats.step_rate
    );
}

fn display_candidate_row(rank: usize, c: &Candidate) {
    println!(
        "  {:>4}  {:>6.3}  {:>6.3}  {:>8.1}  {:>6.3}  {:>6.3}",
        rank, c.tau1, c.tau2, c.cost, c.stats.block_rate, c.stats.step_rate
    );
}

/// Display the "why these thresholds?" explanation.
pub fn display_explanation(result: &OptimizationResult, recorded_at: &str) {
    println!(
        "\n{}",
        format!("=== Why these thresholds? (sweep {recorded_at}) ===").bold()
    );
    for line in explain::explain(result) {
        let styled = if line.starts_with("No threshold pair") || line.contains("low-confidence") {
            line.yellow()
        } else {
            line.normal()
        };
        println!("  {styled}");
    }
}

/// Display recent retrains with threshold deltas.
pub fn display_history(records: &[RetrainRecord]) {
    if records.is_empty() {
        println!("No retrains recorded yet. Run `riskgate tune` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Last {} retrains ===", records.len()).bold()
    );
    println!();
    println!(
        "  {:<20} {:<9} {:>7} {:>7} {:>7} {:>8} {:>8} {:>8}",
        "Recorded".dimmed(),
        "Kind".dimmed(),
        "Attack".dimmed(),
        "tau1".dimmed(),
        "tau2".dimmed(),
        "d_tau1".dimmed(),
        "d_tau2".dimmed(),
        "Cost".dimmed(),
    );
    println!("  {}", "-".repeat(82).dimmed());

    for r in records {
        let attack = r
            .attack_rate
            .map(|v| format!("{:.0}%", v * 100.0))
            .unwrap_or_else(|| "-".to_string());
        let flag = if r.fallback_used {
            " fallback".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<20} {:<9} {:>7} {:>7.3} {:>7.3} {:>8} {:>8} {:>8.1}{}",
            r.recorded_at,
            colorize_kind(r.kind),
            attack,
            r.tau1,
            r.tau2,
            colorize_delta(r.d_tau1),
            colorize_delta(r.d_tau2),
            r.cost,
            flag,
        );
    }
}

fn colorize_kind(kind: RetrainKind) -> colored::ColoredString {
    match kind {
        RetrainKind::Baseline => kind.as_str().dimmed(),
        RetrainKind::Benign => kind.as_str().green(),
        RetrainKind::Attack => kind.as_str().red(),
    }
}

fn colorize_delta(delta: f64) -> colored::ColoredString {
    let text = super::format_delta(delta);
    if delta > 0.0 {
        text.green()
    } else if delta < 0.0 {
        text.red()
    } else {
        text.dimmed()
    }
}

fn colorize_fn(count: u64) -> colored::ColoredString {
    if count > 0 {
        count.to_string().red()
    } else {
        count.to_string().normal()
    }
}
