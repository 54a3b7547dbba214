// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Hyperpolymath

//! Submission evaluation pipeline for the video classification benchmark
//!
//! This crate provides:
//! - Record loading for the two supported encodings (structured JSON,
//!   tabular CSV)
//! - Validation of the required model and PDF report links (format check
//!   plus a single reachability probe)
//! - Reconciliation of submission and ground-truth id sets
//! - Classification metrics (accuracy, weighted precision/recall/F1,
//!   confusion matrix)
//! - Optional best-effort leaderboard notification via webhook
//!
//! The two deployed challenge variants differ only in input encoding,
//! link-failure severity and metric set; both are [`PipelineConfig`]
//! presets over one [`Evaluator`].

pub mod error;
pub mod links;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod records;

pub use error::EvalError;
pub use links::{validate_url, HttpProber, LinkKind, Prober, ValidationOutcome};
pub use metrics::{compute_metrics, ConfusionMatrix, MetricName, MetricSet};
pub use notify::{Notifier, WebhookNotifier};
pub use pipeline::{
    reconcile, save_results, EvaluationResult, Evaluator, LinkPolicy, PipelineConfig,
};
pub use records::{
    load_ground_truth, load_submission, GroundTruthPayload, InputFormat, Label, RecordSet,
    SubmissionPayload, HEADER_ROW_COUNT,
};
