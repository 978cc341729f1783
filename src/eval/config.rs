//! Evaluation configuration.
//!
//! All input locations and reporting knobs live in one [`EvalConfig`] that is
//! passed to each component at construction, so the same pipeline runs
//! against arbitrary fixtures in tests.
//!
//! # Example
//!
//! ```rust
//! use vqa_eval::eval::config::{EvalConfig, LabelLanguage};
//!
//! let config = EvalConfig::for_dataset_dir("data/ds102")
//!     .with_predictions("runs/co-attention.json")
//!     .with_detections("detected_objects.json")
//!     .with_label_language(LabelLanguage::Vietnamese);
//!
//! assert_eq!(config.dataset_files.len(), 3);
//! assert!(config.validate().is_ok());
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Dataset splits in load order. Later splits overwrite earlier ones.
pub const DEFAULT_SPLITS: [&str; 3] = ["test.json", "dev.json", "train.json"];

/// Which label set of the detector output to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelLanguage {
    /// Detector's native labels
    English,
    /// Translated labels, matching the question language
    #[default]
    Vietnamese,
}

/// Configuration for one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Ground-truth dataset files, in load order
    pub dataset_files: Vec<PathBuf>,
    /// Prediction log of the model run
    pub predictions_file: PathBuf,
    /// Detector output keyed by image filename
    pub detections_file: PathBuf,
    /// Label set used for object attribution
    pub label_language: LabelLanguage,
    /// Questions with fewer words than this count as short
    pub short_question_words: usize,
    /// Length of frequency and accuracy rankings
    pub top_n: usize,
    /// Number of best and worst images listed in the text report
    pub top_images: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            dataset_files: Vec::new(),
            predictions_file: PathBuf::from("results.json"),
            detections_file: PathBuf::from("detected_objects.json"),
            label_language: LabelLanguage::default(),
            short_question_words: 5,
            top_n: 10,
            top_images: 5,
        }
    }
}

impl EvalConfig {
    /// Create a configuration with default settings and no dataset files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration reading the standard splits from `dir`.
    pub fn for_dataset_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            dataset_files: DEFAULT_SPLITS.iter().map(|name| dir.join(name)).collect(),
            ..Self::default()
        }
    }

    /// Parse a TOML configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Replace the dataset file list.
    pub fn with_dataset_files(mut self, files: Vec<PathBuf>) -> Self {
        self.dataset_files = files;
        self
    }

    /// Set the prediction log.
    pub fn with_predictions(mut self, path: impl Into<PathBuf>) -> Self {
        self.predictions_file = path.into();
        self
    }

    /// Set the detector output.
    pub fn with_detections(mut self, path: impl Into<PathBuf>) -> Self {
        self.detections_file = path.into();
        self
    }

    /// Set the label language.
    pub fn with_label_language(mut self, language: LabelLanguage) -> Self {
        self.label_language = language;
        self
    }

    /// Set the short-question word threshold.
    pub fn with_short_question_words(mut self, words: usize) -> Self {
        self.short_question_words = words;
        self
    }

    /// Set the ranking length.
    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    /// Check settings that would make the report meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(Error::config("top_n must be at least 1"));
        }
        if self.short_question_words == 0 {
            return Err(Error::config("short_question_words must be at least 1"));
        }
        Ok(())
    }
}
