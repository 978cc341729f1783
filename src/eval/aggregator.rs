//! Single-pass correctness aggregation.
//!
//! [`StatsAggregator::run`] folds a prediction log into an
//! [`AggregationResult`]: a set of independent bucket tables keyed by question
//! type, answer category, object label and image id. The indices are queried
//! read-only; the buckets are owned by the result and never shared.
//!
//! # Object attribution
//!
//! Two policies run side by side for every record whose image has detected
//! objects:
//!
//! - **co-occurrence** (`objects`): every object in the image is credited,
//!   measuring accuracy on images that contain the object;
//! - **mention** (`mentioned`): only objects whose label occurs in the question
//!   text are credited, measuring accuracy when the question names the object.
//!
//! Mention buckets are therefore always a subset of co-occurrence buckets.
//!
//! # Example
//!
//! ```rust
//! use vqa_eval::eval::aggregator::StatsAggregator;
//! use vqa_eval::eval::config::{EvalConfig, LabelLanguage};
//! use vqa_eval::eval::normalize::PredictionRecord;
//! use vqa_eval::eval::objects::{ObjectIndex, ObjectRecord};
//! use vqa_eval::eval::questions::{DatasetIndex, QuestionRecord};
//!
//! let dataset: DatasetIndex =
//!     std::iter::once(QuestionRecord::new("1", "con mèo màu gì?", "5", &["đen"])).collect();
//! let mut objects = ObjectIndex::new(LabelLanguage::Vietnamese);
//! objects.insert("000005.jpg", ObjectRecord { english: vec![], vietnamese: vec!["mèo".into()] });
//!
//! let result = StatsAggregator::new(&EvalConfig::default())
//!     .run(&[PredictionRecord::new("1", "Đen")], &dataset, &objects);
//!
//! assert_eq!(result.overall.correct, 1);
//! assert_eq!(result.mentioned.len(), 1);
//! ```

use super::bucket::{BucketMap, Tally};
use super::config::EvalConfig;
use super::normalize::{extract, PredictionRecord};
use super::objects::ObjectIndex;
use super::question_type::{categorize_answer, classify, AnswerCategory, QuestionType};
use super::questions::DatasetIndex;
use super::source::SourceStatus;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The two answers a Yes/No confusion matrix is built over.
pub const YES_NO_ANSWERS: [&str; 2] = ["có", "không"];

// =============================================================================
// Buckets
// =============================================================================

/// One question attributed to an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDetail {
    /// Image the question is about
    pub image_id: String,
    /// Question text
    pub question: String,
    /// Whether the prediction matched
    pub correct: bool,
}

/// Accumulator for one object label.
#[derive(Debug, Clone, Default)]
pub struct ObjectBucket {
    /// Total/correct counts
    pub tally: Tally,
    /// Distinct images the object was credited on
    pub images: BTreeSet<String>,
    /// Every attributed question, in input order
    pub questions: Vec<QuestionDetail>,
}

impl ObjectBucket {
    fn record(&mut self, image_id: &str, question: &str, correct: bool) {
        self.tally.record(correct);
        self.images.insert(image_id.to_string());
        self.questions.push(QuestionDetail {
            image_id: image_id.to_string(),
            question: question.to_string(),
            correct,
        });
    }
}

/// One evaluated question on an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageQuestion {
    /// Question text
    pub question: String,
    /// Normalized prediction; empty when the record had none
    pub prediction: String,
    /// Ground truths the prediction was checked against
    pub ground_truth: Vec<String>,
    /// Whether the prediction matched
    pub correct: bool,
}

/// Accumulator for one image.
#[derive(Debug, Clone, Default)]
pub struct ImageBucket {
    /// Total/correct counts
    pub tally: Tally,
    /// Detected objects, as resolved on first touch
    pub objects: Vec<String>,
    /// Every evaluated question, in input order
    pub questions: Vec<ImageQuestion>,
}

/// 2×2 Yes/No confusion counts, indexed `[ground truth][prediction]` in
/// [`YES_NO_ANSWERS`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YesNoConfusion {
    /// Counts per (ground truth, prediction) pair
    pub matrix: [[usize; 2]; 2],
}

impl YesNoConfusion {
    fn position(answer: &str) -> Option<usize> {
        YES_NO_ANSWERS.iter().position(|a| *a == answer)
    }

    /// Count a pair; returns false when either side is outside the lexicon.
    pub fn record(&mut self, ground_truth: &str, predicted: &str) -> bool {
        match (Self::position(ground_truth), Self::position(predicted)) {
            (Some(gt), Some(pred)) => {
                self.matrix[gt][pred] += 1;
                true
            }
            _ => false,
        }
    }

    /// Number of pairs counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }
}

/// How much of the input made it into the buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    /// Prediction log items read, malformed ones included
    pub predictions_seen: usize,
    /// Prediction log items that were not prediction objects
    pub malformed_predictions: usize,
    /// Records that reached the buckets
    pub evaluated: usize,
    /// Records without a usable id
    pub missing_id: usize,
    /// Records whose id is not in the dataset
    pub unresolved_id: usize,
    /// Evaluated records whose image has no detected objects
    pub no_objects: usize,
    /// Evaluated records with objects, none of them named in the question
    pub no_mention: usize,
    /// Dataset annotations dropped for lack of an id
    pub annotations_without_id: usize,
    /// Dataset annotations that replaced an earlier one with the same id
    pub duplicate_question_ids: usize,
    /// Detector entries that were not label objects
    pub malformed_detections: usize,
    /// Input files and how they loaded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceStatus>,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Every bucket table produced by one pass.
#[derive(Debug, Clone, Default)]
pub struct AggregationResult {
    /// All evaluated records
    pub overall: Tally,
    /// Records with fewer words than the short-question threshold
    pub short_questions: Tally,
    /// Per question type
    pub by_question_type: BucketMap<QuestionType, Tally>,
    /// Per ground-truth answer category
    pub by_answer_category: BucketMap<AnswerCategory, Tally>,
    /// Co-occurrence attribution
    pub objects: BucketMap<String, ObjectBucket>,
    /// Mention attribution
    pub mentioned: BucketMap<String, ObjectBucket>,
    /// Per image id
    pub images: BucketMap<String, ImageBucket>,
    /// Predicted answer counts over correct records
    pub correct_answers: BucketMap<String, usize>,
    /// `"<pred> (GT: <gt>)"` counts over incorrect records
    pub wrong_answers: BucketMap<String, usize>,
    /// Per predicted answer
    pub per_answer: BucketMap<String, Tally>,
    /// Yes/No confusion over binary-answer records
    pub yes_no: YesNoConfusion,
    /// Predicted answer word count → records
    pub prediction_lengths: BTreeMap<usize, usize>,
    /// First ground truth word count → records
    pub ground_truth_lengths: BTreeMap<usize, usize>,
    /// Skip and drop counts
    pub coverage: Coverage,
}

/// Drives the aggregation pass.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    short_question_words: usize,
}

impl StatsAggregator {
    /// Create an aggregator with the thresholds of `config`.
    pub fn new(config: &EvalConfig) -> Self {
        Self {
            short_question_words: config.short_question_words,
        }
    }

    /// Fold `predictions` into fresh buckets, in input order.
    pub fn run(
        &self,
        predictions: &[PredictionRecord],
        dataset: &DatasetIndex,
        objects: &ObjectIndex,
    ) -> AggregationResult {
        let mut result = AggregationResult::default();
        for record in predictions {
            self.accumulate(&mut result, record, dataset, objects);
        }

        let c = &result.coverage;
        log::info!(
            "Evaluated {}/{} predictions ({} without id, {} unresolved), accuracy {:.2}%",
            c.evaluated,
            c.predictions_seen,
            c.missing_id,
            c.unresolved_id,
            result.overall.accuracy_pct()
        );
        result
    }

    fn accumulate(
        &self,
        result: &mut AggregationResult,
        record: &PredictionRecord,
        dataset: &DatasetIndex,
        objects: &ObjectIndex,
    ) {
        result.coverage.predictions_seen += 1;

        let Some(extracted) = extract(record) else {
            log::debug!("Prediction without usable id skipped");
            result.coverage.missing_id += 1;
            return;
        };
        let Some(question) = dataset.get(&extracted.id) else {
            log::debug!("Prediction for unknown question {} skipped", extracted.id);
            result.coverage.unresolved_id += 1;
            return;
        };
        result.coverage.evaluated += 1;

        let ground_truth: &[String] = if question.valid_answers.is_empty() {
            extracted.raw_ground_truth.as_deref().unwrap_or(&[])
        } else {
            &question.valid_answers
        };
        let primary = ground_truth.first().map(String::as_str).unwrap_or("");
        let predicted = extracted.predicted_text();
        let correct = extracted
            .predicted
            .as_ref()
            .is_some_and(|p| ground_truth.contains(p));

        result.overall.record(correct);
        result
            .by_question_type
            .entry(classify(&question.question))
            .record(correct);

        let category = categorize_answer(primary);
        result.by_answer_category.entry(category).record(correct);

        if question.question.split_whitespace().count() < self.short_question_words {
            result.short_questions.record(correct);
        }

        // Answer distributions
        result.per_answer.entry(predicted.to_string()).record(correct);
        if correct {
            *result.correct_answers.entry(predicted.to_string()) += 1;
        } else {
            *result
                .wrong_answers
                .entry(format!("{} (GT: {})", predicted, primary)) += 1;
        }
        if category == AnswerCategory::YesNo {
            result.yes_no.record(primary, predicted);
        }
        if extracted.predicted.is_some() {
            *result
                .prediction_lengths
                .entry(predicted.split_whitespace().count())
                .or_insert(0) += 1;
        }
        if !primary.is_empty() {
            *result
                .ground_truth_lengths
                .entry(primary.split_whitespace().count())
                .or_insert(0) += 1;
        }

        // Object attribution
        let labels = objects.resolve(&question.image_id);
        if labels.is_empty() {
            result.coverage.no_objects += 1;
        } else {
            let mut mentioned_any = false;
            for label in labels {
                result
                    .objects
                    .entry(label.clone())
                    .record(&question.image_id, &question.question, correct);
                if question.question.contains(label.as_str()) {
                    mentioned_any = true;
                    result
                        .mentioned
                        .entry(label.clone())
                        .record(&question.image_id, &question.question, correct);
                }
            }
            if !mentioned_any {
                result.coverage.no_mention += 1;
            }
        }

        let image = result.images.entry(question.image_id.clone());
        if image.tally.total == 0 {
            image.objects = labels.to_vec();
        }
        image.tally.record(correct);
        image.questions.push(ImageQuestion {
            question: question.question.clone(),
            prediction: predicted.to_string(),
            ground_truth: ground_truth.to_vec(),
            correct,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::config::LabelLanguage;
    use crate::eval::objects::ObjectRecord;
    use crate::eval::questions::QuestionRecord;
    use serde_json::json;

    fn objects(entries: &[(&str, &[&str])]) -> ObjectIndex {
        let mut index = ObjectIndex::new(LabelLanguage::Vietnamese);
        for (filename, labels) in entries {
            index.insert(
                *filename,
                ObjectRecord {
                    english: Vec::new(),
                    vietnamese: labels.iter().map(|s| s.to_string()).collect(),
                },
            );
        }
        index
    }

    fn prediction(value: serde_json::Value) -> PredictionRecord {
        serde_json::from_value(value).unwrap()
    }

    fn run(
        predictions: &[PredictionRecord],
        dataset: &DatasetIndex,
        objects: &ObjectIndex,
    ) -> AggregationResult {
        StatsAggregator::new(&EvalConfig::default()).run(predictions, dataset, objects)
    }

    #[test]
    fn test_color_example() {
        let dataset: DatasetIndex =
            std::iter::once(QuestionRecord::new("1", "con mèo màu gì?", "5", &["đen"])).collect();
        let result = run(
            &[prediction(json!({"id": ["1"], "gens": {"0": "đen"}}))],
            &dataset,
            &ObjectIndex::default(),
        );

        assert_eq!(result.overall, Tally { total: 1, correct: 1 });
        assert_eq!(result.by_question_type.get(&QuestionType::Color).unwrap().correct, 1);
        assert_eq!(result.by_answer_category.get(&AnswerCategory::Other).unwrap().total, 1);
        assert_eq!(result.short_questions.total, 1);
    }

    #[test]
    fn test_unresolved_records_contribute_nothing() {
        let dataset: DatasetIndex =
            std::iter::once(QuestionRecord::new("1", "ai?", "5", &["x"])).collect();
        let result = run(
            &[
                prediction(json!({"id": "404", "gens": "x"})),
                prediction(json!({"gens": "x"})),
            ],
            &dataset,
            &ObjectIndex::default(),
        );

        assert_eq!(result.overall.total, 0);
        assert!(result.images.is_empty());
        assert!(result.by_question_type.is_empty());
        assert_eq!(result.coverage.predictions_seen, 2);
        assert_eq!(result.coverage.unresolved_id, 1);
        assert_eq!(result.coverage.missing_id, 1);
    }

    #[test]
    fn test_unresolved_image_still_counts_in_image_bucket() {
        let dataset: DatasetIndex =
            std::iter::once(QuestionRecord::new("1", "con chó ở đâu?", "5", &["sân"])).collect();
        let index = objects(&[("000006.jpg", &["chó"])]);
        let result = run(&[PredictionRecord::new("1", "sân")], &dataset, &index);

        assert!(result.objects.is_empty());
        assert!(result.mentioned.is_empty());
        assert_eq!(result.coverage.no_objects, 1);
        let image = result.images.get(&"5".to_string()).unwrap();
        assert_eq!(image.tally.total, 1);
        assert!(image.objects.is_empty());
    }

    #[test]
    fn test_co_occurrence_and_mention() {
        let dataset: DatasetIndex = vec![
            QuestionRecord::new("1", "con chó màu gì?", "5", &["nâu"]),
            QuestionRecord::new("2", "trời có mưa không?", "5", &["không"]),
        ]
        .into_iter()
        .collect();
        let index = objects(&[("5.jpg", &["chó", "người"])]);
        let result = run(
            &[PredictionRecord::new("1", "nâu"), PredictionRecord::new("2", "có")],
            &dataset,
            &index,
        );

        let dog = result.objects.get(&"chó".to_string()).unwrap();
        assert_eq!(dog.tally, Tally { total: 2, correct: 1 });
        assert_eq!(dog.images.len(), 1);
        assert_eq!(dog.questions.len(), 2);

        let mentioned = result.mentioned.get(&"chó".to_string()).unwrap();
        assert_eq!(mentioned.tally, Tally { total: 1, correct: 1 });
        assert!(result.mentioned.get(&"người".to_string()).is_none());
        assert_eq!(result.coverage.no_mention, 1);
    }

    #[test]
    fn test_ground_truth_fallback() {
        let dataset: DatasetIndex =
            std::iter::once(QuestionRecord::new("1", "có mấy con?", "5", &[])).collect();
        let result = run(
            &[PredictionRecord::new("1", "2").with_ground_truth("2")],
            &dataset,
            &ObjectIndex::default(),
        );
        assert_eq!(result.overall.correct, 1);
        assert_eq!(result.by_answer_category.get(&AnswerCategory::Number).unwrap().total, 1);
    }

    #[test]
    fn test_dataset_answers_take_precedence_over_fallback() {
        let dataset: DatasetIndex =
            std::iter::once(QuestionRecord::new("1", "ai?", "5", &["mẹ"])).collect();
        let result = run(
            &[PredictionRecord::new("1", "bố").with_ground_truth("bố")],
            &dataset,
            &ObjectIndex::default(),
        );
        assert_eq!(result.overall.correct, 0);
        assert_eq!(result.wrong_answers.most_common(1), vec![("bố (GT: mẹ)".to_string(), 1)]);
    }

    #[test]
    fn test_ambiguous_prediction_is_incorrect() {
        let dataset: DatasetIndex =
            std::iter::once(QuestionRecord::new("1", "ai?", "5", &["a"])).collect();
        let result = run(
            &[prediction(json!({"id": "1", "gens": {"0": "a", "1": "a"}}))],
            &dataset,
            &ObjectIndex::default(),
        );
        assert_eq!(result.overall, Tally { total: 1, correct: 0 });
        assert!(result.prediction_lengths.is_empty());
    }

    #[test]
    fn test_yes_no_confusion() {
        let dataset: DatasetIndex = vec![
            QuestionRecord::new("1", "có phải con mèo không?", "1", &["có"]),
            QuestionRecord::new("2", "có phải con chó không?", "1", &["không"]),
            QuestionRecord::new("3", "đúng không?", "1", &["sai"]),
        ]
        .into_iter()
        .collect();
        let result = run(
            &[
                PredictionRecord::new("1", "có"),
                PredictionRecord::new("2", "có"),
                PredictionRecord::new("3", "đúng"),
            ],
            &dataset,
            &ObjectIndex::default(),
        );
        assert_eq!(result.yes_no.matrix, [[1, 0], [1, 0]]);
        assert_eq!(result.yes_no.total(), 2);
    }

    #[test]
    fn test_short_question_threshold() {
        let dataset: DatasetIndex = vec![
            QuestionRecord::new("1", "một hai ba bốn", "1", &["x"]),
            QuestionRecord::new("2", "một hai ba bốn năm", "1", &["x"]),
        ]
        .into_iter()
        .collect();
        let result = run(
            &[PredictionRecord::new("1", "x"), PredictionRecord::new("2", "x")],
            &dataset,
            &ObjectIndex::default(),
        );
        assert_eq!(result.short_questions.total, 1);
    }

    #[test]
    fn test_length_distributions() {
        let dataset: DatasetIndex =
            std::iter::once(QuestionRecord::new("1", "gì?", "1", &["xe máy"])).collect();
        let result = run(&[PredictionRecord::new("1", "xe")], &dataset, &ObjectIndex::default());
        assert_eq!(result.prediction_lengths.get(&1), Some(&1));
        assert_eq!(result.ground_truth_lengths.get(&2), Some(&1));
    }
}
