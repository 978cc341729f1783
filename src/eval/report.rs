//! Finalized accuracy report.
//!
//! [`AccuracyReport`] is the immutable output of an evaluation: accuracy
//! ratios computed, object image sets converted to sorted lists, rankings
//! truncated. Keyed tables use ordered maps, so serializing the same
//! aggregation twice yields byte-identical JSON.
//!
//! # Example
//!
//! ```rust
//! use vqa_eval::eval::aggregator::StatsAggregator;
//! use vqa_eval::eval::config::EvalConfig;
//! use vqa_eval::eval::normalize::PredictionRecord;
//! use vqa_eval::eval::objects::ObjectIndex;
//! use vqa_eval::eval::questions::{DatasetIndex, QuestionRecord};
//! use vqa_eval::eval::report::AccuracyReport;
//!
//! let config = EvalConfig::default();
//! let dataset: DatasetIndex =
//!     std::iter::once(QuestionRecord::new("1", "có mấy con mèo?", "5", &["2"])).collect();
//! let result = StatsAggregator::new(&config)
//!     .run(&[PredictionRecord::new("1", "2")], &dataset, &ObjectIndex::default());
//!
//! let report = AccuracyReport::from_result(&result, &config);
//! assert_eq!(report.overall.accuracy, 1.0);
//! println!("{}", report.render_text());
//! ```

use super::aggregator::{
    AggregationResult, Coverage, ImageQuestion, ObjectBucket, YesNoConfusion, YES_NO_ANSWERS,
};
use super::bucket::{top_n_by, BucketMap, Tally};
use super::config::EvalConfig;
use super::question_type::{AnswerCategory, QuestionType};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Objects listed next to each best/worst image.
const LISTED_OBJECTS: usize = 5;

// =============================================================================
// Report Types
// =============================================================================

/// Total/correct with the derived ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyStats {
    /// Records counted
    pub total: usize,
    /// Records answered correctly
    pub correct: usize,
    /// `correct / total`, 0.0 when empty
    pub accuracy: f64,
}

impl From<Tally> for AccuracyStats {
    fn from(tally: Tally) -> Self {
        Self {
            total: tally.total,
            correct: tally.correct,
            accuracy: tally.accuracy(),
        }
    }
}

/// Question-type bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeStats {
    /// Records of this type
    pub total: usize,
    /// Correct records of this type
    pub correct: usize,
    /// `correct / total`
    pub accuracy: f64,
    /// Percent of all evaluated records
    pub share: f64,
}

/// Object bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectStats {
    /// Questions attributed to the object
    pub total: usize,
    /// Correct attributed questions
    pub correct: usize,
    /// `correct / total`
    pub accuracy: f64,
    /// Images the object was credited on, sorted
    pub images: Vec<String>,
    /// `images.len()`
    pub num_images: usize,
}

impl From<&ObjectBucket> for ObjectStats {
    fn from(bucket: &ObjectBucket) -> Self {
        let images: Vec<String> = bucket.images.iter().cloned().collect();
        Self {
            total: bucket.tally.total,
            correct: bucket.tally.correct,
            accuracy: bucket.tally.accuracy(),
            num_images: images.len(),
            images,
        }
    }
}

/// Image bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageStats {
    /// Questions on the image
    pub total: usize,
    /// Correct questions
    pub correct: usize,
    /// `correct / total`
    pub accuracy: f64,
    /// Detected objects
    pub objects: Vec<String>,
    /// Evaluated questions, in input order
    pub questions: Vec<ImageQuestion>,
}

/// Distribution of per-image accuracy (all values in percent).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSummary {
    /// Distinct object labels seen
    pub total_objects: usize,
    /// Distinct images evaluated
    pub total_images: usize,
    /// Mean image accuracy
    pub mean_accuracy: f64,
    /// Median image accuracy
    pub median_accuracy: f64,
    /// Sample standard deviation, 0.0 below two images
    pub std_accuracy: f64,
}

/// One accuracy-range histogram bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Range label, e.g. `"20-40%"`
    pub range: String,
    /// Images in range
    pub count: usize,
    /// Percent of all images
    pub percentage: f64,
}

/// An object in a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedObject {
    /// Object label
    pub label: String,
    /// Attributed questions
    pub total: usize,
    /// `correct / total`
    pub accuracy: f64,
    /// Distinct images
    pub num_images: usize,
}

/// An image in the best/worst listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedImage {
    /// Image id
    pub image_id: String,
    /// Questions on the image
    pub total: usize,
    /// `correct / total`
    pub accuracy: f64,
    /// First few detected objects
    pub objects: Vec<String>,
}

/// Answer frequency entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerCount {
    /// Answer text or wrong-answer key
    pub answer: String,
    /// Occurrences
    pub count: usize,
}

/// Accuracy of one predicted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerStats {
    /// Predicted answer
    pub answer: String,
    /// Times predicted
    pub total: usize,
    /// Times correct
    pub correct: usize,
    /// `correct / total`
    pub accuracy: f64,
}

/// Complete finalized evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// All evaluated records
    pub overall: AccuracyStats,
    /// Short questions only
    pub short_questions: AccuracyStats,
    /// Per question type
    pub by_question_type: BTreeMap<QuestionType, TypeStats>,
    /// Per ground-truth answer category
    pub by_answer_category: BTreeMap<AnswerCategory, AccuracyStats>,
    /// Co-occurrence attribution, per label
    pub object_stats: BTreeMap<String, ObjectStats>,
    /// Mention attribution, per label
    pub mentioned_objects: BTreeMap<String, ObjectStats>,
    /// Per image id
    pub image_stats: BTreeMap<String, ImageStats>,
    /// Image accuracy distribution
    pub summary: ImageSummary,
    /// Image accuracy histogram
    pub histogram: Vec<HistogramBin>,
    /// Objects ranked by accuracy
    pub top_objects_by_accuracy: Vec<RankedObject>,
    /// Objects ranked by attributed questions
    pub top_objects_by_frequency: Vec<RankedObject>,
    /// Best images
    pub top_images: Vec<RankedImage>,
    /// Worst images
    pub bottom_images: Vec<RankedImage>,
    /// Most frequent correct answers
    pub correct_answers: Vec<AnswerCount>,
    /// Most frequent wrong answers with their ground truth
    pub wrong_answers: Vec<AnswerCount>,
    /// Most frequent predicted answers with their accuracy
    pub answer_stats: Vec<AnswerStats>,
    /// Yes/No confusion counts
    pub yes_no_confusion: YesNoConfusion,
    /// Predicted answer word count → records
    pub prediction_lengths: BTreeMap<usize, usize>,
    /// Ground truth word count → records
    pub ground_truth_lengths: BTreeMap<usize, usize>,
    /// How much input was evaluated
    pub coverage: Coverage,
}

// =============================================================================
// Finalization
// =============================================================================

impl AccuracyReport {
    /// Finalize an aggregation with the ranking lengths of `config`.
    #[must_use]
    pub fn from_result(result: &AggregationResult, config: &EvalConfig) -> Self {
        let evaluated = result.overall.total;
        let by_question_type = result
            .by_question_type
            .iter()
            .map(|(ty, tally)| {
                let share = if evaluated == 0 {
                    0.0
                } else {
                    tally.total as f64 / evaluated as f64 * 100.0
                };
                let stats = TypeStats {
                    total: tally.total,
                    correct: tally.correct,
                    accuracy: tally.accuracy(),
                    share,
                };
                (*ty, stats)
            })
            .collect();

        let image_stats: BTreeMap<String, ImageStats> = result
            .images
            .iter()
            .map(|(id, bucket)| {
                let stats = ImageStats {
                    total: bucket.tally.total,
                    correct: bucket.tally.correct,
                    accuracy: bucket.tally.accuracy(),
                    objects: bucket.objects.clone(),
                    questions: bucket.questions.clone(),
                };
                (id.clone(), stats)
            })
            .collect();

        let image_tallies: Vec<Tally> = result.images.iter().map(|(_, b)| b.tally).collect();
        let ranked = rank_objects(&result.objects);
        let (top_images, bottom_images) = rank_images(result, config.top_images);

        Self {
            overall: result.overall.into(),
            short_questions: result.short_questions.into(),
            by_question_type,
            by_answer_category: result
                .by_answer_category
                .iter()
                .map(|(cat, tally)| (*cat, AccuracyStats::from(*tally)))
                .collect(),
            object_stats: object_table(&result.objects),
            mentioned_objects: object_table(&result.mentioned),
            image_stats,
            summary: summarize_images(&image_tallies, result.objects.len()),
            histogram: accuracy_histogram(&image_tallies),
            top_objects_by_accuracy: top_n_by(ranked.clone(), config.top_n, |o| o.accuracy),
            top_objects_by_frequency: top_n_by(ranked, config.top_n, |o| o.total),
            top_images,
            bottom_images,
            correct_answers: answer_counts(&result.correct_answers, config.top_n),
            wrong_answers: answer_counts(&result.wrong_answers, config.top_n),
            answer_stats: top_n_by(
                result
                    .per_answer
                    .iter()
                    .map(|(answer, tally)| AnswerStats {
                        answer: answer.clone(),
                        total: tally.total,
                        correct: tally.correct,
                        accuracy: tally.accuracy(),
                    })
                    .collect(),
                config.top_n,
                |a| a.total,
            ),
            yes_no_confusion: result.yes_no,
            prediction_lengths: result.prediction_lengths.clone(),
            ground_truth_lengths: result.ground_truth_lengths.clone(),
            coverage: result.coverage.clone(),
        }
    }

    /// Export report as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable report.
    ///
    /// Sections, in order: overall stats, objects by accuracy, objects by
    /// frequency, accuracy histogram, best and worst images, question types,
    /// answer categories, wrong answers, coverage.
    #[must_use]
    pub fn render_text(&self) -> String {
        let rule = "-".repeat(80);
        let mut out = String::new();

        out.push_str(&format!("{}\nVQA ACCURACY REPORT\n{}\n\n", "=".repeat(80), "=".repeat(80)));

        out.push_str(&format!("1. OVERALL\n{}\n", rule));
        out.push_str(&format!(
            "Accuracy: {:.2}% ({}/{})\n",
            self.overall.accuracy * 100.0,
            self.overall.correct,
            self.overall.total
        ));
        out.push_str(&format!(
            "Short questions: {:.2}% ({}/{})\n",
            self.short_questions.accuracy * 100.0,
            self.short_questions.correct,
            self.short_questions.total
        ));
        out.push_str(&format!("Object labels detected: {}\n", self.summary.total_objects));
        out.push_str(&format!("Images analysed: {}\n", self.summary.total_images));
        out.push_str(&format!("Mean image accuracy: {:.2}%\n", self.summary.mean_accuracy));
        out.push_str(&format!("Median image accuracy: {:.2}%\n", self.summary.median_accuracy));
        out.push_str(&format!("Standard deviation: {:.2}%\n\n", self.summary.std_accuracy));

        out.push_str(&format!("2. TOP OBJECTS BY ACCURACY\n{}\n", rule));
        for obj in &self.top_objects_by_accuracy {
            out.push_str(&format!(
                "{:20} | Accuracy: {:6.2}% | Questions: {:4} | Images: {:4}\n",
                obj.label,
                obj.accuracy * 100.0,
                obj.total,
                obj.num_images
            ));
        }
        out.push('\n');

        out.push_str(&format!("3. TOP OBJECTS BY FREQUENCY\n{}\n", rule));
        for obj in &self.top_objects_by_frequency {
            out.push_str(&format!(
                "{:20} | Questions: {:4} | Accuracy: {:6.2}% | Images: {:4}\n",
                obj.label,
                obj.total,
                obj.accuracy * 100.0,
                obj.num_images
            ));
        }
        out.push('\n');

        out.push_str(&format!("4. IMAGE ACCURACY RANGES\n{}\n", rule));
        for bin in &self.histogram {
            out.push_str(&format!(
                "{:>10}: {:5} images ({:5.2}%)\n",
                bin.range, bin.count, bin.percentage
            ));
        }
        out.push('\n');

        out.push_str(&format!("5. BEST IMAGES\n{}\n", rule));
        render_images(&mut out, &self.top_images);
        out.push('\n');

        out.push_str(&format!("6. WORST IMAGES\n{}\n", rule));
        render_images(&mut out, &self.bottom_images);
        out.push('\n');

        out.push_str(&format!("7. QUESTION TYPES\n{}\n", rule));
        for (ty, stats) in &self.by_question_type {
            out.push_str(&format!(
                "{:8} | Accuracy: {:6.2}% | Questions: {:5} | Share: {:5.2}%\n",
                ty.as_str(),
                stats.accuracy * 100.0,
                stats.total,
                stats.share
            ));
        }
        out.push('\n');

        out.push_str(&format!("8. ANSWER CATEGORIES\n{}\n", rule));
        for (cat, stats) in &self.by_answer_category {
            out.push_str(&format!(
                "{:8} | Accuracy: {:6.2}% | Questions: {:5}\n",
                cat.as_str(),
                stats.accuracy * 100.0,
                stats.total
            ));
        }
        if self.yes_no_confusion.total() > 0 {
            let m = &self.yes_no_confusion.matrix;
            out.push_str(&format!(
                "Yes/No confusion (rows GT {}/{}): [{}, {}] [{}, {}]\n",
                YES_NO_ANSWERS[0], YES_NO_ANSWERS[1], m[0][0], m[0][1], m[1][0], m[1][1]
            ));
        }
        out.push('\n');

        out.push_str(&format!("9. MOST FREQUENT WRONG ANSWERS\n{}\n", rule));
        for wrong in &self.wrong_answers {
            out.push_str(&format!("{:5}  {}\n", wrong.count, wrong.answer));
        }
        out.push('\n');

        let c = &self.coverage;
        out.push_str(&format!("10. COVERAGE\n{}\n", rule));
        out.push_str(&format!(
            "Predictions: {} seen, {} evaluated, {} without id, {} unresolved\n",
            c.predictions_seen, c.evaluated, c.missing_id, c.unresolved_id
        ));
        out.push_str(&format!(
            "Records without detected objects: {}, without mentioned objects: {}\n",
            c.no_objects, c.no_mention
        ));
        out.push_str(&format!(
            "Malformed predictions: {}, annotations without id: {}, duplicate question ids: {}, malformed detections: {}\n",
            c.malformed_predictions,
            c.annotations_without_id,
            c.duplicate_question_ids,
            c.malformed_detections
        ));
        for source in c.sources.iter().filter(|s| !s.is_loaded()) {
            out.push_str(&format!("Skipped source: {}\n", source.path.display()));
        }

        out
    }
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_text())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn object_table(buckets: &BucketMap<String, ObjectBucket>) -> BTreeMap<String, ObjectStats> {
    buckets
        .iter()
        .map(|(label, bucket)| (label.clone(), ObjectStats::from(bucket)))
        .collect()
}

fn rank_objects(buckets: &BucketMap<String, ObjectBucket>) -> Vec<RankedObject> {
    buckets
        .iter()
        .filter(|(_, b)| b.tally.total > 0)
        .map(|(label, b)| RankedObject {
            label: label.clone(),
            total: b.tally.total,
            accuracy: b.tally.accuracy(),
            num_images: b.images.len(),
        })
        .collect()
}

fn rank_images(result: &AggregationResult, n: usize) -> (Vec<RankedImage>, Vec<RankedImage>) {
    let images: Vec<RankedImage> = result
        .images
        .iter()
        .map(|(id, b)| RankedImage {
            image_id: id.clone(),
            total: b.tally.total,
            accuracy: b.tally.accuracy(),
            objects: b.objects.iter().take(LISTED_OBJECTS).cloned().collect(),
        })
        .collect();
    let top = top_n_by(images.clone(), n, |img| img.accuracy);
    let bottom = top_n_by(images, n, |img| -img.accuracy);
    (top, bottom)
}

fn answer_counts(counts: &BucketMap<String, usize>, n: usize) -> Vec<AnswerCount> {
    counts
        .most_common(n)
        .into_iter()
        .map(|(answer, count)| AnswerCount { answer, count })
        .collect()
}

fn render_images(out: &mut String, images: &[RankedImage]) {
    for img in images {
        out.push_str(&format!(
            "Image {}: {:.1}% ({} questions)\n  Objects: {}\n",
            img.image_id,
            img.accuracy * 100.0,
            img.total,
            img.objects.join(", ")
        ));
    }
}

/// Mean, median and sample standard deviation of image accuracy, in percent.
pub fn summarize_images(images: &[Tally], total_objects: usize) -> ImageSummary {
    let mut accuracies: Vec<f64> = images
        .iter()
        .filter(|t| t.total > 0)
        .map(Tally::accuracy_pct)
        .collect();
    let n = accuracies.len();
    if n == 0 {
        return ImageSummary {
            total_objects,
            ..ImageSummary::default()
        };
    }

    let mean = accuracies.iter().sum::<f64>() / n as f64;
    accuracies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = if n % 2 == 0 {
        (accuracies[n / 2 - 1] + accuracies[n / 2]) / 2.0
    } else {
        accuracies[n / 2]
    };
    let std = if n < 2 {
        0.0
    } else {
        let var = accuracies.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    };

    ImageSummary {
        total_objects,
        total_images: n,
        mean_accuracy: mean,
        median_accuracy: median,
        std_accuracy: std,
    }
}

/// Bin image accuracy into `[0,20)`, `[20,40)`, `[40,60)`, `[60,80)`,
/// `[80,100)` and exactly 100%.
///
/// ```rust
/// use vqa_eval::eval::bucket::Tally;
/// use vqa_eval::eval::report::accuracy_histogram;
///
/// let images = [
///     Tally { total: 2, correct: 0 },
///     Tally { total: 2, correct: 1 },
///     Tally { total: 1, correct: 1 },
///     Tally { total: 3, correct: 3 },
/// ];
/// let counts: Vec<usize> = accuracy_histogram(&images).iter().map(|b| b.count).collect();
/// assert_eq!(counts, vec![1, 0, 1, 0, 0, 2]);
/// ```
pub fn accuracy_histogram(images: &[Tally]) -> Vec<HistogramBin> {
    const LABELS: [&str; 6] = ["0-20%", "20-40%", "40-60%", "60-80%", "80-100%", "100%"];
    let mut counts = [0usize; 6];
    let mut n = 0;
    for tally in images.iter().filter(|t| t.total > 0) {
        n += 1;
        // Integer binning keeps values like 60% out of the 40-60% bin.
        let bin = if tally.correct >= tally.total {
            5
        } else {
            (tally.correct * 5 / tally.total).min(4)
        };
        counts[bin] += 1;
    }
    LABELS
        .iter()
        .zip(counts)
        .map(|(label, count)| HistogramBin {
            range: label.to_string(),
            count,
            percentage: if n == 0 {
                0.0
            } else {
                count as f64 / n as f64 * 100.0
            },
        })
        .collect()
}
