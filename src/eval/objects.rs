//! Detected-object index.
//!
//! The detector writes one entry per image file:
//!
//! ```json
//! { "000142.jpg": { "english": ["person", "dog"], "vietnamese": ["người", "chó"] } }
//! ```
//!
//! The dataset refers to images by id, and the two were produced with no
//! shared naming convention. [`ObjectIndex::resolve`] therefore tries a fixed
//! list of filename candidates and takes the first hit. An empty result means
//! "no correlation available", never an error.

use super::config::LabelLanguage;
use super::source::{read_json, SourceStatus};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Labels detected in one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Source-language labels
    #[serde(default)]
    pub english: Vec<String>,
    /// Translated labels
    #[serde(default)]
    pub vietnamese: Vec<String>,
}

impl ObjectRecord {
    /// Labels in the requested language.
    #[must_use]
    pub fn labels(&self, language: LabelLanguage) -> &[String] {
        match language {
            LabelLanguage::English => &self.english,
            LabelLanguage::Vietnamese => &self.vietnamese,
        }
    }

    /// Drop repeated labels, keeping the first occurrence.
    ///
    /// Several source classes share one translation (both ski classes map to
    /// the same Vietnamese label), so translated lists can repeat.
    fn dedup(mut self) -> Self {
        dedup_in_order(&mut self.english);
        dedup_in_order(&mut self.vietnamese);
        self
    }
}

fn dedup_in_order(labels: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    labels.retain(|label| seen.insert(label.clone()));
}

/// Filename candidates for an image id, in resolution priority order.
///
/// Numeric ids expand to 12-digit, 6-digit and bare forms before the raw id;
/// anything else only gets the raw form.
///
/// ```rust
/// use vqa_eval::eval::objects::filename_candidates;
///
/// assert_eq!(
///     filename_candidates("142470"),
///     vec!["000000142470.jpg", "142470.jpg", "142470.jpg", "142470.jpg"]
/// );
/// assert_eq!(filename_candidates("cat_01"), vec!["cat_01.jpg"]);
/// ```
#[must_use]
pub fn filename_candidates(image_id: &str) -> Vec<String> {
    let mut candidates = Vec::with_capacity(4);
    if let Ok(n) = image_id.trim().parse::<i64>() {
        candidates.push(format!("{:012}.jpg", n));
        candidates.push(format!("{:06}.jpg", n));
        candidates.push(format!("{}.jpg", n));
    }
    candidates.push(format!("{}.jpg", image_id));
    candidates
}

/// Detected objects keyed by image filename.
#[derive(Debug, Clone, Default)]
pub struct ObjectIndex {
    by_filename: HashMap<String, ObjectRecord>,
    language: LabelLanguage,
    source: Option<SourceStatus>,
    malformed: usize,
}

impl ObjectIndex {
    /// Create an empty index returning labels in `language`.
    pub fn new(language: LabelLanguage) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    /// Load the detector output. Never fails; see [`ObjectIndex::source`].
    pub fn load(path: &Path, language: LabelLanguage) -> Self {
        let mut index = Self::new(language);
        let status = match read_json(path).and_then(|v| index.insert_json(v)) {
            Ok(count) => {
                log::info!("Loaded detections for {} images from {}", count, path.display());
                SourceStatus::loaded(path, count)
            }
            Err(e) => SourceStatus::failed(path, &e),
        };
        index.source = Some(status);
        index
    }

    /// Insert every entry of a detector output object.
    ///
    /// Entries whose value is not a label object are counted as malformed and
    /// skipped; the rest of the file still loads.
    pub fn insert_json(&mut self, value: Value) -> Result<usize> {
        let Value::Object(entries) = value else {
            return Err(Error::parse("detections must be an object keyed by filename"));
        };
        let mut accepted = 0;
        for (filename, entry) in entries {
            match serde_json::from_value::<ObjectRecord>(entry) {
                Ok(record) => {
                    self.insert(filename, record);
                    accepted += 1;
                }
                Err(e) => {
                    log::debug!("Skipping detections for {}: {}", filename, e);
                    self.malformed += 1;
                }
            }
        }
        Ok(accepted)
    }

    /// Insert one image's labels.
    pub fn insert(&mut self, filename: impl Into<String>, record: ObjectRecord) {
        self.by_filename.insert(filename.into(), record.dedup());
    }

    /// Object labels for an image id; empty when no candidate filename matches.
    #[must_use]
    ///
    /// An empty id still tries its raw candidate, `".jpg"`.
    pub fn resolve(&self, image_id: &str) -> &[String] {
        filename_candidates(image_id)
            .iter()
            .find_map(|name| self.by_filename.get(name))
            .map(|record| record.labels(self.language))
            .unwrap_or(&[])
    }

    /// Number of images with detections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_filename.len()
    }

    /// Whether no detections were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_filename.is_empty()
    }

    /// Load outcome, when built by [`ObjectIndex::load`].
    #[must_use]
    pub fn source(&self) -> Option<&SourceStatus> {
        self.source.as_ref()
    }

    /// Entries skipped for having the wrong shape.
    #[must_use]
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(vi: &[&str]) -> ObjectRecord {
        ObjectRecord {
            english: Vec::new(),
            vietnamese: vi.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_candidates_numeric() {
        assert_eq!(
            filename_candidates("5"),
            vec!["000000000005.jpg", "000005.jpg", "5.jpg", "5.jpg"]
        );
        // Leading zeros in the id are normalized by the integer forms.
        assert_eq!(filename_candidates("007")[2], "7.jpg");
        assert_eq!(filename_candidates("007")[3], "007.jpg");
    }

    #[test]
    fn test_candidates_non_numeric() {
        assert_eq!(filename_candidates("img-5"), vec!["img-5.jpg"]);
    }

    #[test]
    fn test_resolution_priority() {
        let mut index = ObjectIndex::new(LabelLanguage::Vietnamese);
        index.insert("5.jpg", record(&["mèo"]));
        index.insert("000005.jpg", record(&["chó"]));
        assert_eq!(index.resolve("5"), ["chó".to_string()]);

        index.insert("000000000005.jpg", record(&["người"]));
        assert_eq!(index.resolve("5"), ["người".to_string()]);
    }

    #[test]
    fn test_unresolved_is_empty() {
        let mut index = ObjectIndex::new(LabelLanguage::Vietnamese);
        index.insert("000006.jpg", record(&["mèo"]));
        assert!(index.resolve("5").is_empty());
        assert!(index.resolve("").is_empty());
    }

    #[test]
    fn test_empty_id_tries_raw_filename() {
        let mut index = ObjectIndex::new(LabelLanguage::Vietnamese);
        assert!(index.resolve("").is_empty());
        index.insert(".jpg", record(&["mèo"]));
        assert_eq!(index.resolve(""), ["mèo".to_string()]);
    }

    #[test]
    fn test_language_selection() {
        let mut index = ObjectIndex::new(LabelLanguage::English);
        index
            .insert_json(json!({"1.jpg": {"english": ["dog"], "vietnamese": ["chó"]}}))
            .unwrap();
        assert_eq!(index.resolve("1"), ["dog".to_string()]);
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let mut index = ObjectIndex::new(LabelLanguage::Vietnamese);
        let accepted = index
            .insert_json(json!({
                "1.jpg": {"vietnamese": ["chó"]},
                "2.jpg": "not an object",
            }))
            .unwrap();
        assert_eq!(accepted, 1);
        assert_eq!(index.malformed(), 1);
        assert!(index.insert_json(json!([1, 2])).is_err());
    }

    #[test]
    fn test_duplicate_labels_collapsed() {
        let mut index = ObjectIndex::new(LabelLanguage::Vietnamese);
        index.insert("1.jpg", record(&["ván trượt tuyết", "người", "ván trượt tuyết"]));
        assert_eq!(index.resolve("1").len(), 2);
    }
}
