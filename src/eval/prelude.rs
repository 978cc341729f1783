//! Evaluation prelude - commonly used types for quick imports.
//!
//! # Usage
//!
//! ```rust
//! use vqa_eval::eval::prelude::*;
//!
//! let config = EvalConfig::for_dataset_dir("data");
//! assert_eq!(classify("vì sao?"), QuestionType::Why);
//! # let _ = config;
//! ```
//!
//! For the bucket internals and loader statuses, import from the specific
//! modules.

// Pipeline entry points
pub use super::pipeline::{compare_runs, evaluate, Evaluation, RunSummary};
pub use super::report::AccuracyReport;

// Inputs
pub use super::config::{EvalConfig, LabelLanguage};
pub use super::normalize::PredictionRecord;
pub use super::objects::ObjectIndex;
pub use super::predictions::PredictionLog;
pub use super::questions::{DatasetIndex, QuestionRecord};

// Classification
pub use super::question_type::{categorize_answer, classify, AnswerCategory, QuestionType};

pub use crate::{Error, Result};
