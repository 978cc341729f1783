//! Prediction log loading.
//!
//! Accepts `{"results": [...]}` or a bare array. Items that do not decode as a
//! prediction record are counted and skipped.

use super::normalize::PredictionRecord;
use super::source::{read_json, record_array, SourceStatus};
use crate::Result;
use serde_json::Value;
use std::path::Path;

/// Predictions of one model run, in file order.
#[derive(Debug, Clone, Default)]
pub struct PredictionLog {
    /// Decoded records
    pub records: Vec<PredictionRecord>,
    /// Items that were not prediction objects
    pub malformed: usize,
    /// Load outcome, when read from disk
    pub source: Option<SourceStatus>,
}

impl PredictionLog {
    /// Load a prediction log. Never fails; a bad file yields an empty log.
    pub fn load(path: &Path) -> Self {
        match read_json(path).and_then(Self::from_json) {
            Ok(mut parsed) => {
                log::info!("Loaded {} predictions from {}", parsed.len(), path.display());
                parsed.source = Some(SourceStatus::loaded(path, parsed.len()));
                parsed
            }
            Err(e) => Self {
                source: Some(SourceStatus::failed(path, &e)),
                ..Self::default()
            },
        }
    }

    /// Decode an already-parsed prediction document.
    pub fn from_json(value: Value) -> Result<Self> {
        let mut parsed = Self::default();
        for item in record_array(value, "results")? {
            if !item.is_object() {
                parsed.malformed += 1;
                continue;
            }
            match serde_json::from_value::<PredictionRecord>(item) {
                Ok(record) => parsed.records.push(record),
                Err(e) => {
                    log::debug!("Skipping prediction: {}", e);
                    parsed.malformed += 1;
                }
            }
        }
        Ok(parsed)
    }

    /// Number of decoded predictions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<PredictionRecord>> for PredictionLog {
    fn from(records: Vec<PredictionRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }
}
