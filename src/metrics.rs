// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Hyperpolymath

//! Classification metrics for submission scoring
//!
//! Implements the standard multi-class metrics the challenge reports:
//! - Confusion matrix over the sorted distinct labels
//! - Accuracy
//! - Weighted-average Precision, Recall and F1 (weight = true support)
//!
//! Everything here is a deterministic pure function of the two label
//! sequences; there is no state across calls.

use crate::records::{Label, RecordSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Metrics a pipeline configuration can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    Accuracy,
    Precision,
    Recall,
    F1Score,
    ConfusionMatrix,
}

impl MetricName {
    /// Every metric the richer pipeline variant reports.
    pub fn all() -> BTreeSet<MetricName> {
        [
            MetricName::Accuracy,
            MetricName::Precision,
            MetricName::Recall,
            MetricName::F1Score,
            MetricName::ConfusionMatrix,
        ]
        .into_iter()
        .collect()
    }
}

/// Square confusion matrix. Rows are true labels, columns are predicted
/// labels, both in sorted order over the distinct labels observed across
/// the two sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    labels: Vec<Label>,
    counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    /// Build from aligned label sequences: `y_true[i]` and `y_pred[i]`
    /// must refer to the same item.
    pub fn from_sequences(y_true: &[Label], y_pred: &[Label]) -> Self {
        assert_eq!(
            y_true.len(),
            y_pred.len(),
            "true and predicted label sequences must have the same length"
        );

        let labels: Vec<Label> = y_true
            .iter()
            .chain(y_pred.iter())
            .cloned()
            .collect::<BTreeSet<Label>>()
            .into_iter()
            .collect();
        let index: BTreeMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.as_str(), i))
            .collect();

        let n = labels.len();
        let mut counts = vec![vec![0u64; n]; n];
        for (truth, pred) in y_true.iter().zip(y_pred.iter()) {
            counts[index[truth.as_str()]][index[pred.as_str()]] += 1;
        }

        Self { labels, counts }
    }

    /// Sorted distinct labels, in row/column order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Matrix cells, row-major.
    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    /// Number of distinct labels (matrix dimension).
    pub fn dimension(&self) -> usize {
        self.labels.len()
    }

    /// Total number of scored items.
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Per-label true support (row sums).
    pub fn row_sums(&self) -> Vec<u64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    /// Per-label predicted counts (column sums).
    pub fn col_sums(&self) -> Vec<u64> {
        let n = self.dimension();
        (0..n)
            .map(|j| self.counts.iter().map(|row| row[j]).sum())
            .collect()
    }

    /// Accuracy: fraction of items on the diagonal.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: u64 = (0..self.dimension()).map(|i| self.counts[i][i]).sum();
        correct as f64 / total as f64
    }

    /// Weighted-average precision across labels.
    pub fn weighted_precision(&self) -> f64 {
        self.weighted(|stats| stats.precision)
    }

    /// Weighted-average recall across labels.
    pub fn weighted_recall(&self) -> f64 {
        self.weighted(|stats| stats.recall)
    }

    /// Weighted-average F1 across labels.
    pub fn weighted_f1(&self) -> f64 {
        self.weighted(|stats| stats.f1)
    }

    /// Matrix rows as a plain nested integer sequence for the payload.
    pub fn into_rows(self) -> Vec<Vec<u64>> {
        self.counts
    }

    fn weighted(&self, select: fn(&LabelStats) -> f64) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.per_label_stats()
            .iter()
            .map(|stats| select(stats) * stats.support as f64)
            .sum::<f64>()
            / total as f64
    }

    fn per_label_stats(&self) -> Vec<LabelStats> {
        let rows = self.row_sums();
        let cols = self.col_sums();
        (0..self.dimension())
            .map(|i| {
                let tp = self.counts[i][i] as f64;
                // Zero denominators contribute 0, matching the weighted
                // multi-class convention.
                let precision = if cols[i] == 0 { 0.0 } else { tp / cols[i] as f64 };
                let recall = if rows[i] == 0 { 0.0 } else { tp / rows[i] as f64 };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                LabelStats {
                    precision,
                    recall,
                    f1,
                    support: rows[i],
                }
            })
            .collect()
    }
}

struct LabelStats {
    precision: f64,
    recall: f64,
    f1: f64,
    support: u64,
}

/// Computed metrics. Only requested metrics are populated; absent ones
/// are omitted from the serialized payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recall: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f1_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confusion_matrix: Option<Vec<Vec<u64>>>,
}

/// Compute the requested metrics over two reconciled record sets.
///
/// y_true and y_pred are built in one pass over the ground-truth key set,
/// so the same id sits at the same index in both sequences. Ids absent
/// from the submission are skipped; the pipeline reconciles key sets
/// before calling, so in practice nothing is skipped.
pub fn compute_metrics(
    ground_truth: &RecordSet,
    submission: &RecordSet,
    requested: &BTreeSet<MetricName>,
) -> MetricSet {
    let mut y_true = Vec::with_capacity(ground_truth.len());
    let mut y_pred = Vec::with_capacity(ground_truth.len());
    for (id, truth) in ground_truth {
        if let Some(pred) = submission.get(id) {
            y_true.push(truth.clone());
            y_pred.push(pred.clone());
        }
    }

    let matrix = ConfusionMatrix::from_sequences(&y_true, &y_pred);

    let mut metrics = MetricSet::default();
    if requested.contains(&MetricName::Accuracy) {
        metrics.accuracy = Some(matrix.accuracy());
    }
    if requested.contains(&MetricName::Precision) {
        metrics.precision = Some(matrix.weighted_precision());
    }
    if requested.contains(&MetricName::Recall) {
        metrics.recall = Some(matrix.weighted_recall());
    }
    if requested.contains(&MetricName::F1Score) {
        metrics.f1_score = Some(matrix.weighted_f1());
    }
    if requested.contains(&MetricName::ConfusionMatrix) {
        metrics.confusion_matrix = Some(matrix.into_rows());
    }
    metrics
}
