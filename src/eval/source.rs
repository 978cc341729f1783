//! Source file bookkeeping shared by the loaders.
//!
//! Every input file ends up with one [`SourceStatus`], whether it loaded,
//! was missing, or failed to parse. Loaders never fail; the statuses are how
//! downstream consumers judge coverage.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of loading one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum LoadOutcome {
    /// Parsed; `records` entries were accepted.
    Loaded {
        /// Accepted record count
        records: usize,
    },
    /// File does not exist.
    Missing,
    /// File exists but could not be read or has an unexpected shape.
    ParseFailed {
        /// Error message
        reason: String,
    },
}

/// Load status of a single source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    /// Path as configured
    pub path: PathBuf,
    /// What happened
    #[serde(flatten)]
    pub outcome: LoadOutcome,
}

impl SourceStatus {
    /// Status for a successfully loaded source.
    pub fn loaded(path: &Path, records: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            outcome: LoadOutcome::Loaded { records },
        }
    }

    /// Status for a source that failed; logs the failure.
    pub fn failed(path: &Path, err: &Error) -> Self {
        let outcome = if err.is_missing_source() {
            log::warn!("Skipping {}: file not found", path.display());
            LoadOutcome::Missing
        } else {
            log::warn!("Skipping {}: {}", path.display(), err);
            LoadOutcome::ParseFailed {
                reason: err.to_string(),
            }
        };
        Self {
            path: path.to_path_buf(),
            outcome,
        }
    }

    /// Whether the source contributed records.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self.outcome, LoadOutcome::Loaded { .. })
    }
}

/// Read and parse a JSON file.
pub(crate) fn read_json(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::SourceMissing(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Unwrap a top-level `{"<key>": [...]}` envelope or a bare array.
pub(crate) fn record_array(value: Value, key: &str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(Error::parse(format!("`{}` is not an array", key))),
            None => Err(Error::parse(format!("object has no `{}` array", key))),
        },
        _ => Err(Error::parse(format!(
            "expected an array or an object with `{}`",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_array_shapes() {
        assert_eq!(record_array(json!([1, 2]), "results").unwrap().len(), 2);
        assert_eq!(
            record_array(json!({"results": [1]}), "results").unwrap().len(),
            1
        );
        assert!(record_array(json!({"other": []}), "results").is_err());
        assert!(record_array(json!({"results": 3}), "results").is_err());
        assert!(record_array(json!("text"), "results").is_err());
    }

    #[test]
    fn test_read_json_missing_file() {
        let err = read_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.is_missing_source());
        let status = SourceStatus::failed(Path::new("/definitely/not/here.json"), &err);
        assert_eq!(status.outcome, LoadOutcome::Missing);
        assert!(!status.is_loaded());
    }

    #[test]
    fn test_status_serializes_flat() {
        let status = SourceStatus::loaded(Path::new("dev.json"), 3);
        let v = serde_json::to_value(&status).unwrap();
        assert_eq!(v["status"], "loaded");
        assert_eq!(v["records"], 3);
    }
}
