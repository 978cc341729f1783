//! # vqa-eval
//!
//! Sliced accuracy analysis for visual question answering runs.
//!
//! - **Join**: dataset annotations, prediction logs and detector output, none
//!   of which share a key scheme
//! - **Classify**: Vietnamese questions into the 5W1H taxonomy
//! - **Aggregate**: accuracy per question type, answer category, object and image
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vqa_eval::prelude::*;
//!
//! let config = EvalConfig::load("eval.toml")?;
//! let report = evaluate(&config)?;
//! println!("overall: {:.2}%", report.overall.accuracy * 100.0);
//! # Ok::<(), vqa_eval::Error>(())
//! ```
//!
//! ## Comparing Runs
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use vqa_eval::eval::{compare_runs, render_comparison, EvalConfig};
//!
//! let config = EvalConfig::for_dataset_dir("data");
//! let runs = compare_runs(
//!     &config,
//!     &[PathBuf::from("runs/baseline.json"), PathBuf::from("runs/co-attention.json")],
//! )?;
//! print!("{}", render_comparison(&runs));
//! # Ok::<(), vqa_eval::Error>(())
//! ```
//!
//! Logging goes through the `log` facade; install any logger to see load
//! warnings and pass summaries.

#![warn(missing_docs)]

mod error;
pub mod eval;

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    pub use crate::error::{Error, Result};
    pub use crate::eval::prelude::*;
}

pub use error::{Error, Result};
