// System status display — live thresholds, artifacts, last retrain.

use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use crate::store::policy::PolicyConfig;
use crate::store::sweep::SweepRecord;

/// Display system status to the terminal.
pub async fn show(config: &Config) -> Result<()> {
    println!("Store: {}", config.store_dir.display());

    let policy = PolicyConfig::load(&config.policy_path);
    if config.policy_path.exists() {
        println!(
            "Thresholds: tau1={:.3} tau2={:.3}",
            policy.tau1, policy.tau2
        );
    } else {
        println!("Thresholds: defaults (tau1={:.3} tau2={:.3})", policy.tau1, policy.tau2);
        println!("  Run `riskgate init` to write a policy config");
    }
    println!(
        "Guardrails: max_block_rate={} max_step_rate={}",
        policy.guardrails.max_block_rate, policy.guardrails.max_step_rate
    );
    println!(
        "Costs: C_FN={} C_FP_STEP={} C_FP_BLOCK={}",
        policy.costs.c_fn, policy.costs.c_fp_step, policy.costs.c_fp_block
    );

    println!("Model: {}", artifact_status(&config.model_path));

    match SweepRecord::load(&config.sweep_path)? {
        Some(record) => {
            let note = if record.sweep.fallback_used {
                " (fallback)"
            } else {
                ""
            };
            println!(
                "Last sweep: {} on {} events{}",
                record.ts.format("%Y-%m-%d %H:%M:%S"),
                record.sweep.events,
                note
            );
        }
        None => {
            println!("Last sweep: never");
            println!("  Run `riskgate tune --sample <file>` after a retrain");
        }
    }

    #[cfg(feature = "sqlite")]
    show_last_retrain(config).await?;

    Ok(())
}

#[cfg(feature = "sqlite")]
async fn show_last_retrain(config: &Config) -> Result<()> {
    if !config.db_path.exists() {
        println!("History: not initialized");
        return Ok(());
    }
    let db = crate::db::open_sqlite(&config.db_path)?;
    match db.last_retrain().await? {
        Some(r) => println!(
            "Last retrain: {} ({}, d_tau1={}, d_tau2={})",
            r.recorded_at,
            r.kind,
            crate::output::format_delta(r.d_tau1),
            crate::output::format_delta(r.d_tau2)
        ),
        None => println!("Last retrain: none recorded"),
    }
    Ok(())
}

fn artifact_status(path: &Path) -> String {
    match std::fs::metadata(path) {
        Ok(m) => format!("{} ({})", path.display(), format_bytes(m.len())),
        Err(_) => format!("{} (missing)", path.display()),
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
