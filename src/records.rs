// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Hyperpolymath

//! Record loading for ground-truth and submission files
//!
//! Two encodings are supported:
//! - Structured (JSON): a container with a `predictions` array of
//!   `{video_id, true_label | prediction}` records, plus `HF_Link` and
//!   `PDF_Link` fields on the submission side.
//! - Tabular (CSV): the first two rows carry the model and PDF links as
//!   `"label: value"` metadata; every later row is an `(id, label)` pair.
//!
//! Both loaders produce the same `{id -> label}` mapping so the rest of
//! the pipeline never cares which encoding a file arrived in.

use crate::error::EvalError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Opaque class label. Equality is the only operation the pipeline needs.
pub type Label = String;

/// Mapping from item identifier to label. A `BTreeMap` keeps iteration
/// order deterministic, which is what guarantees that the y_true and
/// y_pred sequences built from it stay index-aligned.
pub type RecordSet = BTreeMap<String, Label>;

/// Number of metadata rows preceding the `(id, label)` rows in a tabular
/// file. Row 0 holds the model link, row 1 the PDF link.
pub const HEADER_ROW_COUNT: usize = 2;

/// Supported input encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// JSON record container
    Structured,
    /// Positional CSV rows
    Tabular,
}

/// Which label field a structured record must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordRole {
    GroundTruth,
    Submission,
}

impl RecordRole {
    fn label_field(self) -> &'static str {
        match self {
            RecordRole::GroundTruth => "true_label",
            RecordRole::Submission => "prediction",
        }
    }
}

/// Trusted label set, loaded once per evaluation run.
#[derive(Debug, Clone)]
pub struct GroundTruthPayload {
    pub records: RecordSet,
}

/// Participant predictions plus the two required attestation links.
#[derive(Debug, Clone)]
pub struct SubmissionPayload {
    pub records: RecordSet,
    pub model_link: String,
    pub pdf_link: String,
}

#[derive(Debug, Deserialize)]
struct StructuredEntry {
    video_id: String,
    #[serde(default)]
    true_label: Option<String>,
    #[serde(default)]
    prediction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StructuredFile {
    #[serde(rename = "HF_Link", default)]
    hf_link: Option<String>,
    #[serde(rename = "PDF_Link", default)]
    pdf_link: Option<String>,
    predictions: Vec<StructuredEntry>,
}

/// Load the trusted label set from `path`.
pub fn load_ground_truth(path: &Path, format: InputFormat) -> Result<GroundTruthPayload, EvalError> {
    let reader = open(path)?;
    let records = match format {
        InputFormat::Structured => parse_structured(reader, RecordRole::GroundTruth, path)?.records,
        InputFormat::Tabular => parse_tabular(reader, path)?.records,
    };
    tracing::info!("Loaded {} ground-truth records from {}", records.len(), path.display());
    Ok(GroundTruthPayload { records })
}

/// Load participant predictions and attestation links from `path`.
pub fn load_submission(path: &Path, format: InputFormat) -> Result<SubmissionPayload, EvalError> {
    let reader = open(path)?;
    let parsed = match format {
        InputFormat::Structured => parse_structured(reader, RecordRole::Submission, path)?,
        InputFormat::Tabular => parse_tabular(reader, path)?,
    };
    tracing::info!("Loaded {} submission records from {}", parsed.records.len(), path.display());
    Ok(SubmissionPayload {
        records: parsed.records,
        model_link: parsed.model_link,
        pdf_link: parsed.pdf_link,
    })
}

fn open(path: &Path) -> Result<BufReader<File>, EvalError> {
    let file = File::open(path).map_err(|source| EvalError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(BufReader::new(file))
}

#[derive(Debug)]
struct ParsedSource {
    records: RecordSet,
    model_link: String,
    pdf_link: String,
}

fn parse_structured<R: Read>(reader: R, role: RecordRole, path: &Path) -> Result<ParsedSource, EvalError> {
    let file: StructuredFile =
        serde_json::from_reader(reader).map_err(|err| EvalError::MalformedInput {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;

    let mut records = RecordSet::new();
    for entry in file.predictions {
        let label = match role {
            RecordRole::GroundTruth => entry.true_label,
            RecordRole::Submission => entry.prediction,
        };
        let label = label.ok_or_else(|| EvalError::MalformedInput {
            path: path.display().to_string(),
            reason: format!(
                "record '{}' is missing the '{}' field",
                entry.video_id,
                role.label_field()
            ),
        })?;
        if records.insert(entry.video_id.clone(), label).is_some() {
            // Last write wins, mirroring the historical behavior.
            tracing::warn!("Duplicate id '{}' in {}", entry.video_id, path.display());
        }
    }

    // Absent links become empty strings and fail the later format check,
    // rather than erroring at load time.
    Ok(ParsedSource {
        records,
        model_link: file.hf_link.unwrap_or_default(),
        pdf_link: file.pdf_link.unwrap_or_default(),
    })
}

fn parse_tabular<R: Read>(reader: R, path: &Path) -> Result<ParsedSource, EvalError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut header_values = Vec::with_capacity(HEADER_ROW_COUNT);
    let mut records = RecordSet::new();

    for (idx, result) in csv_reader.records().enumerate() {
        let row = result.map_err(|err| EvalError::MalformedInput {
            path: path.display().to_string(),
            reason: format!("row {}: {}", idx, err),
        })?;

        if idx < HEADER_ROW_COUNT {
            let raw = row.get(0).unwrap_or("");
            header_values.push(metadata_value(raw));
            continue;
        }

        let (Some(id), Some(label)) = (row.get(0), row.get(1)) else {
            return Err(EvalError::MalformedInput {
                path: path.display().to_string(),
                reason: format!("row {} has fewer than 2 columns", idx),
            });
        };
        if records.insert(id.to_string(), label.to_string()).is_some() {
            tracing::warn!("Duplicate id '{}' in {}", id, path.display());
        }
    }

    if header_values.len() < HEADER_ROW_COUNT {
        return Err(EvalError::MalformedInput {
            path: path.display().to_string(),
            reason: format!(
                "expected {} metadata rows, found {}",
                HEADER_ROW_COUNT,
                header_values.len()
            ),
        });
    }

    let mut header_values = header_values.into_iter();
    Ok(ParsedSource {
        records,
        model_link: header_values.next().unwrap_or_default(),
        pdf_link: header_values.next().unwrap_or_default(),
    })
}

/// Extract the value of a `"label: value"` metadata cell: everything after
/// the last colon, trimmed. This is the historical convention; note that it
/// truncates values that themselves contain a colon, e.g. an `https://`
/// link loses its scheme and host-relative prefix.
fn metadata_value(raw: &str) -> String {
    raw.rsplit(':').next().unwrap_or(raw).trim().to_string()
}
