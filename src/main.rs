use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use riskgate::config::Config;
use riskgate::db::models::RetrainKind;
use riskgate::pipeline::retrain::{self, RetrainPaths};
use riskgate::pipeline::sample::EvaluationSample;
use riskgate::policy::{self, ThresholdOptimizer};
use riskgate::scoring::live;
use riskgate::scoring::model::{ModelHandle, RiskModel};
use riskgate::store::policy::PolicyConfig;
use riskgate::store::sweep::SweepRecord;

/// riskgate: allow / step-up / block thresholds for risk-based authentication.
///
/// Re-selects the two score thresholds after every retrain so the action
/// policy minimizes expected cost while staying inside block and step-up
/// rate guardrails.
#[derive(Parser)]
#[command(name = "riskgate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store directory, default policy config and history database
    Init,

    /// Re-select thresholds on a held-out evaluation sample (JSON Lines)
    Tune {
        /// Sample file: one {"score"|"features", "label"} record per line
        #[arg(long)]
        sample: PathBuf,

        /// What prompted this retrain (recorded in history)
        #[arg(long, value_enum, default_value = "baseline")]
        kind: KindArg,

        /// Attack share of the new batch, in [0, 1] (defaults to the
        /// sample's share for benign/attack retrains)
        #[arg(long)]
        attack_rate: Option<f64>,
    },

    /// Evaluate one threshold pair on a sample without persisting anything
    Evaluate {
        /// Sample file: one {"score"|"features", "label"} record per line
        #[arg(long)]
        sample: PathBuf,

        #[arg(long)]
        tau1: f64,

        #[arg(long)]
        tau2: f64,
    },

    /// Score one login event: {"features": {...}} as an argument or on stdin
    Score {
        /// JSON payload (read from stdin when omitted)
        payload: Option<String>,
    },

    /// Explain why the live thresholds were chosen
    Explain,

    /// Show threshold history across retrains
    #[cfg(feature = "sqlite")]
    History {
        /// Number of recent retrains to show (default: 12)
        #[arg(long, default_value = "12")]
        limit: u32,

        /// Delete all recorded history
        #[arg(long)]
        reset: bool,
    },

    /// Show system status (thresholds, artifacts, last sweep)
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Baseline,
    Benign,
    Attack,
}

impl From<KindArg> for RetrainKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Baseline => RetrainKind::Baseline,
            KindArg::Benign => RetrainKind::Benign,
            KindArg::Attack => RetrainKind::Attack,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Structured logging on stderr so `score` output stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("riskgate=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing riskgate store...");
            let config = Config::load()?;
            std::fs::create_dir_all(&config.store_dir).with_context(|| {
                format!("Failed to create store at {}", config.store_dir.display())
            })?;

            if config.policy_path.exists() {
                println!("Policy config exists: {}", config.policy_path.display());
            } else {
                PolicyConfig::default().save(&config.policy_path)?;
                println!("Policy config written: {}", config.policy_path.display());
            }

            #[cfg(feature = "sqlite")]
            {
                let db = riskgate::db::initialize_sqlite(&config.db_path)?;
                let table_count = db.table_count().await?;
                println!("History database: {}", config.db_path.display());
                println!("Tables created: {table_count}");
            }

            println!("\nriskgate is ready. Next step: export a scored evaluation split");
            println!("and run: riskgate tune --sample <file.jsonl>");
        }

        Commands::Tune {
            sample,
            kind,
            attack_rate,
        } => {
            let config = Config::load()?;
            config.require_grid()?;
            let kind = RetrainKind::from(kind);

            // Open history first so a broken database stops the retrain
            // before new thresholds go live.
            #[cfg(feature = "sqlite")]
            let db = riskgate::db::initialize_sqlite(&config.db_path)?;

            let optimizer = ThresholdOptimizer::new(config.grid);
            let pb = ProgressBar::new(optimizer.grid.candidate_count() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  Sweep [{bar:30}] {pos}/{len} pairs ({eta})")?,
            );

            println!("Tuning thresholds on {}...", sample.display());

            // Sample scoring and the grid sweep are CPU-bound; keep them off
            // the async runtime.
            let model = ModelHandle::new(config.model_path.clone());
            let policy_path = config.policy_path.clone();
            let sweep_path = config.sweep_path.clone();
            let threads = config.threads;
            let progress = pb.clone();
            let outcome = tokio::task::spawn_blocking(move || -> Result<_> {
                let sample = EvaluationSample::load(&sample, Some(&model as &dyn RiskModel))?;
                let attack_rate = attack_rate.or_else(|| match kind {
                    RetrainKind::Baseline => None,
                    _ => Some(sample.attack_rate()),
                });
                let paths = RetrainPaths {
                    policy: &policy_path,
                    sweep: &sweep_path,
                };
                retrain::tune(
                    &sample,
                    &paths,
                    &optimizer,
                    kind,
                    attack_rate,
                    threads,
                    &|| progress.inc(1),
                )
            })
            .await
            .context("Threshold sweep task panicked")??;
            pb.finish_and_clear();

            #[cfg(feature = "sqlite")]
            {
                if let Err(e) = db.record_retrain(&outcome.entry).await {
                    warn!(error = %e, "Thresholds persisted but the history row was not recorded");
                }
            }

            riskgate::output::terminal::display_sweep(&outcome.result);
            println!(
                "\n  Previous: tau1={:.3} tau2={:.3}  ->  d_tau1={} d_tau2={}",
                outcome.previous.tau1,
                outcome.previous.tau2,
                riskgate::output::format_delta(outcome.entry.d_tau1),
                riskgate::output::format_delta(outcome.entry.d_tau2),
            );
            riskgate::output::terminal::display_explanation(&outcome.result, "just now");
            println!(
                "\n{}",
                format!("Thresholds saved to: {}", config.policy_path.display()).bold()
            );
        }

        Commands::Evaluate { sample, tau1, tau2 } => {
            let config = Config::load()?;
            let model = ModelHandle::new(config.model_path.clone());
            let sample = EvaluationSample::load(&sample, Some(&model as &dyn RiskModel))?;
            let stats = policy::evaluate(&sample.scores, &sample.labels, tau1, tau2)?;
            let weights = PolicyConfig::load(&config.policy_path).costs;

            println!(
                "\n{}",
                format!("=== Policy at tau1={tau1:.3}, tau2={tau2:.3} ===").bold()
            );
            println!("  Sample: {} events", sample.len());
            riskgate::output::terminal::display_stats(&stats);
            println!(
                "  Cost under persisted weights: {:.1}",
                weights.cost(&stats)
            );
        }

        Commands::Score { payload } => {
            // Machine interface: success is JSON on stdout, failure is JSON
            // on stderr with exit code 1.
            if let Err(e) = score_command(payload) {
                let error = serde_json::json!({ "error": format!("{e:#}") });
                eprintln!("{error}");
                std::process::exit(1);
            }
        }

        Commands::Explain => {
            let config = Config::load()?;
            match SweepRecord::load(&config.sweep_path)? {
                Some(record) => {
                    let ts = record.ts.format("%Y-%m-%d %H:%M:%S").to_string();
                    riskgate::output::terminal::display_explanation(&record.sweep, &ts);
                }
                None => {
                    println!("No sweep info yet. Run `riskgate tune --sample <file>` once.");
                }
            }
        }

        #[cfg(feature = "sqlite")]
        Commands::History { limit, reset } => {
            let config = Config::load()?;
            let db = riskgate::db::open_sqlite(&config.db_path)?;

            if reset {
                let removed = db.clear_history().await?;
                println!("Removed {removed} history entries.");
                return Ok(());
            }

            let records = db.recent_retrains(limit).await?;
            riskgate::output::terminal::display_history(&records);
        }

        Commands::Status => {
            let config = Config::load()?;
            riskgate::status::show(&config).await?;
        }
    }

    Ok(())
}

/// Score one event with the persisted thresholds and print the decision.
fn score_command(payload: Option<String>) -> Result<()> {
    let raw = match payload {
        Some(raw) => raw,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read payload from stdin")?;
            buf
        }
    };
    let features = live::parse_payload(&raw)?;

    let config = Config::load()?;
    config.require_model()?;
    let model = ModelHandle::new(config.model_path.clone());
    let thresholds = PolicyConfig::load(&config.policy_path).thresholds();

    let decision = live::score_event(&model, &features, thresholds)?;
    println!("{}", serde_json::to_string(&decision)?);
    Ok(())
}
