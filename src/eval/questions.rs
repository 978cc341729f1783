//! Ground-truth question index.
//!
//! Loads question/answer annotations from one or more dataset splits and
//! indexes them by canonical question id.
//!
//! ## Accepted shapes
//!
//! ```text
//! {"annotations": [ {...}, ... ]}      or      [ {...}, ... ]
//! ```
//!
//! Each record: `{id | question_id, question, image_id, answers}` where
//! `answers` is a string or a list and `image_id` a string or number.
//!
//! ## Policy
//!
//! - Records without `id` and `question_id` are skipped.
//! - Splits are applied in order; a later split overwrites an earlier one on
//!   id collision. Collisions are counted because they usually point at a
//!   data problem rather than an intended override.
//! - A missing or malformed split is logged and skipped.

use super::normalize::{answer_list, stringify};
use super::source::{read_json, record_array, SourceStatus};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One annotated question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Canonical question id
    pub id: String,
    /// Question text, lowercased
    pub question: String,
    /// Image id as text
    pub image_id: String,
    /// Valid answers, lowercased and trimmed
    pub valid_answers: Vec<String>,
}

impl QuestionRecord {
    /// Create a record; text fields are normalized the same way the loader does.
    pub fn new(
        id: impl Into<String>,
        question: &str,
        image_id: impl Into<String>,
        answers: &[&str],
    ) -> Self {
        let answers = Value::Array(answers.iter().map(|a| Value::from(*a)).collect());
        Self {
            id: id.into(),
            question: question.to_lowercase(),
            image_id: image_id.into(),
            valid_answers: answer_list(&answers),
        }
    }

    /// Decode an annotation object. Returns `None` when it carries no id.
    #[must_use]
    pub fn from_annotation(item: &Value) -> Option<Self> {
        let id = ["id", "question_id"]
            .iter()
            .filter_map(|key| item.get(*key))
            .find_map(stringify)?;

        let question = item
            .get("question")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();

        let image_id = item
            .get("image_id")
            .and_then(stringify)
            .unwrap_or_default();

        let valid_answers = item.get("answers").map(answer_list).unwrap_or_default();

        Some(Self {
            id,
            question,
            image_id,
            valid_answers,
        })
    }

    /// First valid answer, used for answer categorization and error keys.
    #[must_use]
    pub fn primary_answer(&self) -> Option<&str> {
        self.valid_answers.first().map(String::as_str)
    }
}

/// Question records indexed by id.
#[derive(Debug, Clone, Default)]
pub struct DatasetIndex {
    records: HashMap<String, QuestionRecord>,
    sources: Vec<SourceStatus>,
    duplicate_ids: usize,
    skipped_without_id: usize,
}

impl DatasetIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every split in order. Never fails; see [`DatasetIndex::sources`].
    pub fn load(files: &[PathBuf]) -> Self {
        let mut index = Self::new();
        for path in files {
            let status = match index.load_file(path) {
                Ok(count) => {
                    log::info!("Loaded {} questions from {}", count, path.display());
                    SourceStatus::loaded(path, count)
                }
                Err(e) => SourceStatus::failed(path, &e),
            };
            index.sources.push(status);
        }
        index
    }

    fn load_file(&mut self, path: &Path) -> Result<usize> {
        let items = record_array(read_json(path)?, "annotations")?;
        Ok(self.insert_annotations(&items))
    }

    /// Insert raw annotation objects; returns how many were accepted.
    pub fn insert_annotations(&mut self, items: &[Value]) -> usize {
        let mut accepted = 0;
        for item in items {
            match QuestionRecord::from_annotation(item) {
                Some(record) => {
                    self.insert(record);
                    accepted += 1;
                }
                None => self.skipped_without_id += 1,
            }
        }
        accepted
    }

    /// Insert a record, replacing any earlier one with the same id.
    pub fn insert(&mut self, record: QuestionRecord) {
        if let Some(previous) = self.records.insert(record.id.clone(), record) {
            log::debug!("Question id {} redefined by a later split", previous.id);
            self.duplicate_ids += 1;
        }
    }

    /// Look up a question by canonical id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&QuestionRecord> {
        self.records.get(id)
    }

    /// Number of indexed questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Per-file load outcomes, in load order.
    #[must_use]
    pub fn sources(&self) -> &[SourceStatus] {
        &self.sources
    }

    /// How many inserts replaced an existing id.
    #[must_use]
    pub fn duplicate_ids(&self) -> usize {
        self.duplicate_ids
    }

    /// How many annotations were dropped for lack of an id.
    #[must_use]
    pub fn skipped_without_id(&self) -> usize {
        self.skipped_without_id
    }
}

impl FromIterator<QuestionRecord> for DatasetIndex {
    fn from_iter<I: IntoIterator<Item = QuestionRecord>>(iter: I) -> Self {
        let mut index = Self::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}
