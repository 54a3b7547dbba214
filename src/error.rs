// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Hyperpolymath

//! Error taxonomy for the evaluation pipeline
//!
//! Every failure the pipeline surfaces to a caller is one of these
//! variants. Nothing is retried; the only swallowed failure is the
//! leaderboard notification, which never reaches this type.

/// Errors surfaced by the evaluation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// A source file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A source file does not match the expected shape (missing fields,
    /// too few rows, unparseable content).
    #[error("malformed input in {path}: {reason}")]
    MalformedInput { path: String, reason: String },

    /// Submission and ground truth do not cover the same id set.
    /// Metrics over mismatched sets are meaningless, so this is always
    /// fatal and raised before any metric computation.
    #[error(
        "submission and ground truth must have the same ids \
         (missing from submission: {missing_from_submission:?}, \
         unexpected in submission: {unexpected_in_submission:?})"
    )]
    KeyMismatch {
        missing_from_submission: Vec<String>,
        unexpected_in_submission: Vec<String>,
    },

    /// A required link failed format or reachability checks while the
    /// pipeline was configured with a fatal link policy.
    #[error("{link_kind} failed validation: {diagnostic}")]
    InvalidLink {
        link_kind: String,
        diagnostic: String,
    },
}
