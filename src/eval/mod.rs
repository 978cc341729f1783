//! VQA answer evaluation.
//!
//! # Overview
//!
//! Joins three independently produced inputs and slices answer accuracy:
//!
//! | Input | Shape | Loaded by |
//! |-------|-------|-----------|
//! | Dataset splits | `{"annotations": [...]}` or array | [`DatasetIndex`] |
//! | Prediction log | `{"results": [...]}` or array | [`PredictionLog`] |
//! | Detected objects | `{"<file>.jpg": {"english": [...], "vietnamese": [...]}}` | [`ObjectIndex`] |
//!
//! Indices are built once up front; [`StatsAggregator`] then makes a single
//! forward pass over the predictions, and [`AccuracyReport`] finalizes the
//! buckets.
//!
//! # Example
//!
//! ```rust,no_run
//! use vqa_eval::eval::{evaluate, EvalConfig};
//!
//! let config = EvalConfig::for_dataset_dir("data/ds102")
//!     .with_predictions("runs/baseline.json")
//!     .with_detections("data/detected_objects.json");
//!
//! let report = evaluate(&config)?;
//! println!("{}", report);
//! std::fs::write("accuracy.json", report.to_json()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Slices
//!
//! - **Question type**: 5W1H taxonomy by ordered keyword rules ([`classify`])
//! - **Answer category**: Yes/No, Number, Other of the ground truth
//! - **Object**: co-occurrence and mention attribution
//! - **Image**: per-image accuracy, histogram and best/worst listings
//!
//! # Failure Policy
//!
//! Nothing in the pipeline is fatal. Unreadable inputs are logged and
//! recorded as [`SourceStatus`]; records that cannot be joined are counted in
//! [`Coverage`] and otherwise ignored.

pub mod aggregator;
pub mod bucket;
pub mod config;
pub mod normalize;
pub mod objects;
pub mod pipeline;
pub mod predictions;
pub mod prelude;
pub mod question_type;
pub mod questions;
pub mod report;
pub mod source;

pub use aggregator::{AggregationResult, Coverage, StatsAggregator};
pub use bucket::{BucketMap, Tally};
pub use config::{EvalConfig, LabelLanguage};
pub use normalize::{extract, normalize_answer, ExtractedPrediction, PredictionRecord};
pub use objects::{ObjectIndex, ObjectRecord};
pub use pipeline::{compare_runs, evaluate, render_comparison, Evaluation, RunSummary};
pub use predictions::PredictionLog;
pub use question_type::{categorize_answer, classify, AnswerCategory, QuestionType};
pub use questions::{DatasetIndex, QuestionRecord};
pub use report::AccuracyReport;
pub use source::{LoadOutcome, SourceStatus};
