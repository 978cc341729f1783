//! Canonical extraction from heterogeneous prediction records.
//!
//! Prediction logs are written by the model's training loop and carry ids and
//! answers in whatever shape the batching code happened to produce:
//!
//! | Field  | Observed shapes                              | Canonical form         |
//! |--------|----------------------------------------------|------------------------|
//! | `id`   | `"12"`, `12`, `["12"]`, `[12, 13]`           | first element, as text |
//! | `gens` | `"đen"`, `{"0": "đen"}`                      | lowercased, trimmed    |
//! | `gts`  | `"đen"`, `["đen", "màu đen"]`, `{"0": "đen"}` | list of answers        |
//!
//! Shapes are decoded once into [`RawId`] and [`RawAnswer`] and collapsed
//! immediately by [`extract`]; nothing downstream branches on JSON shape.
//!
//! # Example
//!
//! ```rust
//! use vqa_eval::eval::normalize::{extract, PredictionRecord};
//!
//! let record: PredictionRecord =
//!     serde_json::from_str(r#"{"id": ["1"], "gens": {"0": " Đen "}}"#).unwrap();
//! let extracted = extract(&record).unwrap();
//! assert_eq!(extracted.id, "1");
//! assert_eq!(extracted.predicted.as_deref(), Some("đen"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Boundary Types
// =============================================================================

/// Question id as it appears in a prediction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    /// Batched id list; only the first element is authoritative.
    List(Vec<Value>),
    /// Bare string or number.
    Scalar(Value),
}

impl RawId {
    /// Collapse to the canonical id string.
    ///
    /// Returns `None` for an empty list or a null scalar.
    #[must_use]
    pub fn canonical(&self) -> Option<String> {
        match self {
            RawId::List(items) => items.first().and_then(stringify),
            RawId::Scalar(value) => stringify(value),
        }
    }
}

/// Answer field (`gens` or `gts`) as it appears in a prediction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    /// Keyed wrapper such as `{"0": "đen"}`.
    Mapping(Map<String, Value>),
    /// Anything else: string, number, bool or list.
    Scalar(Value),
}

impl RawAnswer {
    /// The single authoritative value, if there is one.
    ///
    /// Only a single-entry mapping yields a value; empty and multi-key
    /// mappings have no defined answer and yield `None`.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            RawAnswer::Mapping(map) if map.len() == 1 => map.values().next(),
            RawAnswer::Mapping(map) => {
                log::debug!("answer mapping with {} keys has no defined value", map.len());
                None
            }
            RawAnswer::Scalar(value) => Some(value),
        }
    }
}

/// One entry of a prediction log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Question id (scalar or list).
    #[serde(default)]
    pub id: Option<RawId>,
    /// Generated answer.
    #[serde(default)]
    pub gens: Option<RawAnswer>,
    /// Ground truth echoed by the model run, used only as a fallback.
    #[serde(default)]
    pub gts: Option<RawAnswer>,
}

impl PredictionRecord {
    /// Build a record from already-canonical parts.
    pub fn new(id: impl Into<String>, predicted: impl Into<String>) -> Self {
        Self {
            id: Some(RawId::Scalar(Value::String(id.into()))),
            gens: Some(RawAnswer::Scalar(Value::String(predicted.into()))),
            gts: None,
        }
    }

    /// Attach a fallback ground truth.
    pub fn with_ground_truth(mut self, answer: impl Into<String>) -> Self {
        self.gts = Some(RawAnswer::Scalar(Value::String(answer.into())));
        self
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Canonical (id, prediction, fallback ground truth) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPrediction {
    /// Canonical question id.
    pub id: String,
    /// Normalized predicted answer; `None` when the record has no usable answer.
    pub predicted: Option<String>,
    /// Normalized fallback ground truths from `gts`, if present.
    pub raw_ground_truth: Option<Vec<String>>,
}

impl ExtractedPrediction {
    /// Predicted answer for display; empty when there is none.
    #[must_use]
    pub fn predicted_text(&self) -> &str {
        self.predicted.as_deref().unwrap_or("")
    }
}

/// Extract the canonical triple from a prediction record.
///
/// Returns `None` when the record carries no usable id.
#[must_use]
pub fn extract(record: &PredictionRecord) -> Option<ExtractedPrediction> {
    let id = record.id.as_ref()?.canonical()?;

    let predicted = record
        .gens
        .as_ref()
        .and_then(RawAnswer::value)
        .and_then(stringify)
        .map(|s| normalize_answer(&s));

    let raw_ground_truth = record
        .gts
        .as_ref()
        .and_then(RawAnswer::value)
        .map(answer_list)
        .filter(|answers| !answers.is_empty());

    Some(ExtractedPrediction {
        id,
        predicted,
        raw_ground_truth,
    })
}

/// Lowercase and trim an answer for comparison.
///
/// Idempotent: `normalize_answer(normalize_answer(x)) == normalize_answer(x)`.
#[must_use]
pub fn normalize_answer(text: &str) -> String {
    text.to_lowercase().trim().to_string()
}

/// Turn a raw answer value into a list of normalized valid answers.
///
/// A list contributes every non-null element; a non-empty scalar becomes a
/// single-element list; null, empty strings and objects yield nothing.
#[must_use]
pub fn answer_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(stringify)
            .map(|s| normalize_answer(&s))
            .collect(),
        Value::Object(_) => Vec::new(),
        other => match stringify(other) {
            Some(s) if !s.is_empty() => vec![normalize_answer(&s)],
            _ => Vec::new(),
        },
    }
}

/// Render a JSON value as text the way ids and answers are compared.
///
/// Strings are taken verbatim, numbers and booleans use their JSON spelling,
/// null has no text.
#[must_use]
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
