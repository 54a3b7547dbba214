// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Hyperpolymath

//! Submission evaluation CLI
//!
//! Usage:
//!   challenge-eval ground_truth.json submission.json --phase dev
//!   challenge-eval ground_truth.csv submission.csv --format tabular --webhook <url>

use anyhow::Result;
use challenge_eval::pipeline::{save_results, Evaluator, LinkPolicy, PipelineConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "challenge-eval")]
#[command(about = "Score a benchmark submission against ground truth")]
#[command(version)]
struct Args {
    /// Path to the ground-truth file
    ground_truth: PathBuf,

    /// Path to the participant submission file
    submission: PathBuf,

    /// Input encoding (structured, tabular)
    #[arg(short, long, default_value = "structured")]
    format: String,

    /// Link failure severity override (advisory, fatal); defaults follow
    /// the format preset
    #[arg(long)]
    link_policy: Option<String>,

    /// Accuracy threshold for the leaderboard notification
    #[arg(short, long, default_value_t = 0.9)]
    threshold: f64,

    /// Webhook endpoint for the leaderboard notification
    #[arg(short, long)]
    webhook: Option<String>,

    /// Phase label used in the notification message
    #[arg(short, long, default_value = "dev")]
    phase: String,

    /// Directory for the JSON results file (skipped when unset)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match args.format.as_str() {
        "structured" | "json" => PipelineConfig::structured(args.phase.as_str()),
        "tabular" | "csv" => PipelineConfig::tabular(args.phase.as_str()),
        other => anyhow::bail!("unknown input format '{}'", other),
    };
    if let Some(policy) = args.link_policy.as_deref() {
        config.link_policy = match policy {
            "advisory" => LinkPolicy::Advisory,
            "fatal" => LinkPolicy::Fatal,
            other => anyhow::bail!("unknown link policy '{}'", other),
        };
    }
    config.leaderboard_threshold = args.threshold;
    config.notification_endpoint = args.webhook;

    tracing::info!("Benchmark Submission Evaluation");
    tracing::info!("===============================");
    tracing::info!("Ground truth: {}", args.ground_truth.display());
    tracing::info!("Submission: {}", args.submission.display());
    tracing::info!(
        "Format: {:?}, link policy: {:?}",
        config.format,
        config.link_policy
    );

    let evaluator = Evaluator::new(config);
    let result = evaluator.evaluate(&args.ground_truth, &args.submission)?;

    println!("\n{}", "=".repeat(60));
    println!("EVALUATION RESULT");
    println!("{}", "=".repeat(60));
    if let Some(accuracy) = result.metrics.accuracy {
        println!("{:<20} {:>10.4}", "Accuracy", accuracy);
    }
    if let Some(precision) = result.metrics.precision {
        println!("{:<20} {:>10.4}", "Precision", precision);
    }
    if let Some(recall) = result.metrics.recall {
        println!("{:<20} {:>10.4}", "Recall", recall);
    }
    if let Some(f1) = result.metrics.f1_score {
        println!("{:<20} {:>10.4}", "F1 Score", f1);
    }
    println!("{:<20} {:>10}", "Model link valid", result.model_link_valid);
    println!("{:<20} {:>10}", "PDF link valid", result.pdf_link_valid);
    if let Some(ref matrix) = result.metrics.confusion_matrix {
        println!("\nConfusion matrix (rows = true, columns = predicted):");
        for row in matrix {
            println!("  {:?}", row);
        }
    }
    println!("{}", "=".repeat(60));

    if let Some(output_dir) = args.output {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let json_path = output_dir.join(format!("eval_{}_{}.json", args.phase, timestamp));
        save_results(&result, &json_path)?;
        println!("Results saved to: {}", json_path.display());
    }

    println!("Completed evaluation for phase '{}'", args.phase);

    Ok(())
}
