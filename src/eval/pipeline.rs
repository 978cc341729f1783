//! End-to-end evaluation over configured files.
//!
//! [`Evaluation`] builds the dataset and object indices once and evaluates any
//! number of prediction logs against them. Missing or malformed inputs never
//! abort a run; they show up in [`Coverage::sources`](super::aggregator::Coverage).

use super::aggregator::StatsAggregator;
use super::config::EvalConfig;
use super::objects::ObjectIndex;
use super::predictions::PredictionLog;
use super::question_type::QuestionType;
use super::questions::DatasetIndex;
use super::report::{AccuracyReport, AccuracyStats};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Indices built once, ready to score prediction logs.
#[derive(Debug, Clone)]
pub struct Evaluation {
    config: EvalConfig,
    dataset: DatasetIndex,
    objects: ObjectIndex,
}

impl Evaluation {
    /// Validate `config` and load the dataset splits and detector output.
    pub fn load(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        let dataset = DatasetIndex::load(&config.dataset_files);
        let objects = ObjectIndex::load(&config.detections_file, config.label_language);
        Ok(Self::from_parts(config, dataset, objects))
    }

    /// Use already-built indices.
    pub fn from_parts(config: EvalConfig, dataset: DatasetIndex, objects: ObjectIndex) -> Self {
        Self {
            config,
            dataset,
            objects,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Loaded ground truth.
    #[must_use]
    pub fn dataset(&self) -> &DatasetIndex {
        &self.dataset
    }

    /// Loaded detections.
    #[must_use]
    pub fn objects(&self) -> &ObjectIndex {
        &self.objects
    }

    /// Aggregate and finalize one prediction log.
    #[must_use]
    pub fn evaluate(&self, predictions: &PredictionLog) -> AccuracyReport {
        let result = StatsAggregator::new(&self.config).run(
            &predictions.records,
            &self.dataset,
            &self.objects,
        );
        let mut report = AccuracyReport::from_result(&result, &self.config);

        let coverage = &mut report.coverage;
        coverage.predictions_seen += predictions.malformed;
        coverage.malformed_predictions = predictions.malformed;
        coverage.annotations_without_id = self.dataset.skipped_without_id();
        coverage.duplicate_question_ids = self.dataset.duplicate_ids();
        coverage.malformed_detections = self.objects.malformed();

        coverage.sources.extend(self.dataset.sources().iter().cloned());
        coverage.sources.extend(self.objects.source().cloned());
        coverage.sources.extend(predictions.source.clone());
        report
    }

    /// Load and evaluate a prediction file.
    #[must_use]
    pub fn evaluate_file(&self, path: &Path) -> AccuracyReport {
        self.evaluate(&PredictionLog::load(path))
    }
}

/// Evaluate the prediction file named in `config`.
pub fn evaluate(config: &EvalConfig) -> Result<AccuracyReport> {
    let evaluation = Evaluation::load(config.clone())?;
    Ok(evaluation.evaluate_file(&config.predictions_file))
}

// =============================================================================
// Run Comparison
// =============================================================================

/// Headline numbers of one model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run name, the prediction file stem
    pub name: String,
    /// Overall accuracy
    pub overall: AccuracyStats,
    /// Accuracy per question type
    pub by_question_type: BTreeMap<QuestionType, AccuracyStats>,
}

impl RunSummary {
    /// Summarize a finalized report.
    pub fn from_report(name: impl Into<String>, report: &AccuracyReport) -> Self {
        Self {
            name: name.into(),
            overall: report.overall,
            by_question_type: report
                .by_question_type
                .iter()
                .map(|(ty, s)| {
                    let stats = AccuracyStats {
                        total: s.total,
                        correct: s.correct,
                        accuracy: s.accuracy,
                    };
                    (*ty, stats)
                })
                .collect(),
        }
    }
}

/// Evaluate several prediction logs against indices loaded once.
///
/// Summaries come back in input order; an unreadable file yields an empty run
/// rather than an error.
pub fn compare_runs(config: &EvalConfig, prediction_files: &[PathBuf]) -> Result<Vec<RunSummary>> {
    let evaluation = Evaluation::load(config.clone())?;
    Ok(prediction_files
        .iter()
        .map(|path| {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            RunSummary::from_report(name, &evaluation.evaluate_file(path))
        })
        .collect())
}

/// Render run summaries as a fixed-width table, one row per run.
#[must_use]
pub fn render_comparison(runs: &[RunSummary]) -> String {
    let mut out = format!("{:24}{:>10}", "run", "overall");
    for ty in QuestionType::ALL {
        out.push_str(&format!("{:>9}", ty.as_str()));
    }
    out.push('\n');

    for run in runs {
        out.push_str(&format!("{:24}{:>9.2}%", run.name, run.overall.accuracy * 100.0));
        for ty in QuestionType::ALL {
            match run.by_question_type.get(&ty) {
                Some(stats) => out.push_str(&format!("{:>8.2}%", stats.accuracy * 100.0)),
                None => out.push_str(&format!("{:>9}", "-")),
            }
        }
        out.push('\n');
    }
    out
}
