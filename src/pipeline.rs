// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Hyperpolymath

//! Evaluation pipeline orchestration
//!
//! One linear run per submission:
//! load ground truth -> load submission -> validate links -> reconcile
//! id sets -> compute metrics -> maybe notify -> assemble result.
//!
//! The two deployed challenge variants (structured JSON with advisory
//! links, tabular CSV with fatal links and the full metric set) are
//! expressed as [`PipelineConfig`] presets rather than separate code
//! paths.

use crate::error::EvalError;
use crate::links::{validate_url, HttpProber, LinkKind, Prober, ValidationOutcome};
use crate::metrics::{compute_metrics, MetricName, MetricSet};
use crate::notify::{Notifier, WebhookNotifier};
use crate::records::{self, InputFormat, RecordSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Default accuracy threshold for a leaderboard notification.
pub const DEFAULT_LEADERBOARD_THRESHOLD: f64 = 0.9;

/// Whether a failed link check aborts the run or only flags the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPolicy {
    /// Invalid links are logged and recorded as 0 flags; scoring proceeds.
    Advisory,
    /// Either invalid link aborts the run before scoring.
    Fatal,
}

/// Configuration for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input encoding shared by ground truth and submission.
    pub format: InputFormat,
    /// Severity of a failed link check.
    pub link_policy: LinkPolicy,
    /// Metrics to compute and report.
    pub metrics: BTreeSet<MetricName>,
    /// Accuracy threshold at or above which a notification fires.
    pub leaderboard_threshold: f64,
    /// Webhook endpoint; `None` disables notifications entirely.
    pub notification_endpoint: Option<String>,
    /// Phase name used only in the notification message.
    pub phase_label: String,
}

impl PipelineConfig {
    /// The structured-variant preset: JSON input, advisory links,
    /// accuracy + F1.
    pub fn structured(phase_label: impl Into<String>) -> Self {
        Self {
            format: InputFormat::Structured,
            link_policy: LinkPolicy::Advisory,
            metrics: [MetricName::Accuracy, MetricName::F1Score]
                .into_iter()
                .collect(),
            leaderboard_threshold: DEFAULT_LEADERBOARD_THRESHOLD,
            notification_endpoint: None,
            phase_label: phase_label.into(),
        }
    }

    /// The tabular-variant preset: CSV input, fatal links, the full
    /// metric set including the confusion matrix.
    pub fn tabular(phase_label: impl Into<String>) -> Self {
        Self {
            format: InputFormat::Tabular,
            link_policy: LinkPolicy::Fatal,
            metrics: MetricName::all(),
            leaderboard_threshold: DEFAULT_LEADERBOARD_THRESHOLD,
            notification_endpoint: None,
            phase_label: phase_label.into(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::structured("dev")
    }
}

/// Result payload returned to the caller. Metrics that were not
/// requested are omitted from the serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(flatten)]
    pub metrics: MetricSet,
    pub model_link_valid: u8,
    pub pdf_link_valid: u8,
}

impl EvaluationResult {
    /// Nested wrapper consumed by the scoreboard:
    /// `{"result": [{"<split>": {...}}], "submission_result": {...}}`.
    pub fn to_leaderboard_payload(&self, split: &str) -> serde_json::Value {
        let inner = serde_json::to_value(self).unwrap_or_default();
        let mut split_entry = serde_json::Map::new();
        split_entry.insert(split.to_string(), inner.clone());
        serde_json::json!({
            "result": [split_entry],
            "submission_result": inner,
        })
    }
}

/// Verify that the two record sets cover exactly the same ids. Always
/// fatal: metrics over mismatched sets are undefined.
pub fn reconcile(ground_truth: &RecordSet, submission: &RecordSet) -> Result<(), EvalError> {
    let missing_from_submission: Vec<String> = ground_truth
        .keys()
        .filter(|id| !submission.contains_key(*id))
        .cloned()
        .collect();
    let unexpected_in_submission: Vec<String> = submission
        .keys()
        .filter(|id| !ground_truth.contains_key(*id))
        .cloned()
        .collect();

    if missing_from_submission.is_empty() && unexpected_in_submission.is_empty() {
        Ok(())
    } else {
        Err(EvalError::KeyMismatch {
            missing_from_submission,
            unexpected_in_submission,
        })
    }
}

/// Orchestrates one end-to-end evaluation run.
pub struct Evaluator {
    config: PipelineConfig,
    prober: Box<dyn Prober>,
    notifier: Box<dyn Notifier>,
}

impl Evaluator {
    /// Evaluator with the real network boundary.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            prober: Box::new(HttpProber),
            notifier: Box::new(WebhookNotifier),
        }
    }

    /// Substitute the reachability probe (tests use deterministic fakes).
    pub fn with_prober(mut self, prober: Box<dyn Prober>) -> Self {
        self.prober = prober;
        self
    }

    /// Substitute the notification delivery.
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline over the two input files.
    pub fn evaluate(
        &self,
        ground_truth_path: &Path,
        submission_path: &Path,
    ) -> Result<EvaluationResult, EvalError> {
        tracing::info!("Loading ground truth from {}", ground_truth_path.display());
        let ground_truth = records::load_ground_truth(ground_truth_path, self.config.format)?;

        tracing::info!("Loading submission from {}", submission_path.display());
        let submission = records::load_submission(submission_path, self.config.format)?;

        tracing::info!("Validating submission links");
        let model_outcome = validate_url(self.prober.as_ref(), &submission.model_link, LinkKind::Model);
        let pdf_outcome = validate_url(self.prober.as_ref(), &submission.pdf_link, LinkKind::PdfReport);
        if self.config.link_policy == LinkPolicy::Fatal {
            self.require_valid(LinkKind::Model, &model_outcome)?;
            self.require_valid(LinkKind::PdfReport, &pdf_outcome)?;
        }

        tracing::info!("Reconciling id sets");
        reconcile(&ground_truth.records, &submission.records)?;

        tracing::info!("Computing metrics for {} records", ground_truth.records.len());
        let metrics = compute_metrics(&ground_truth.records, &submission.records, &self.config.metrics);

        self.maybe_notify(&metrics);

        Ok(EvaluationResult {
            metrics,
            model_link_valid: model_outcome.as_flag(),
            pdf_link_valid: pdf_outcome.as_flag(),
        })
    }

    fn require_valid(&self, kind: LinkKind, outcome: &ValidationOutcome) -> Result<(), EvalError> {
        if outcome.valid {
            return Ok(());
        }
        Err(EvalError::InvalidLink {
            link_kind: kind.to_string(),
            diagnostic: outcome
                .diagnostic
                .clone()
                .unwrap_or_else(|| "link failed validation".to_string()),
        })
    }

    /// Fire the leaderboard notification when accuracy clears the
    /// threshold and an endpoint is configured. Failures are logged and
    /// swallowed; an absent endpoint is a no-op.
    fn maybe_notify(&self, metrics: &MetricSet) {
        let (Some(accuracy), Some(endpoint)) =
            (metrics.accuracy, self.config.notification_endpoint.as_deref())
        else {
            return;
        };
        if accuracy < self.config.leaderboard_threshold {
            return;
        }

        let message = format!(
            "Submission in phase '{}' achieved top leaderboard status with accuracy: {:.2}.",
            self.config.phase_label, accuracy
        );
        tracing::info!("Sending leaderboard notification");
        if let Err(err) = self.notifier.notify(endpoint, &message) {
            tracing::warn!("Failed to deliver leaderboard notification: {}", err);
        }
    }
}

/// Save a result payload as pretty-printed JSON.
pub fn save_results(result: &EvaluationResult, output_path: &Path) -> Result<(), EvalError> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| EvalError::Io {
            path: output_path.display().to_string(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(result).unwrap_or_default();
    std::fs::write(output_path, json).map_err(|source| EvalError::Io {
        path: output_path.display().to_string(),
        source,
    })?;
    tracing::info!("Results saved to {}", output_path.display());
    Ok(())
}
