//! MACE (Multi-Annotator Competence Estimation) implementation
//!
//! This crate provides:
//! - A sparse item × annotator label matrix with optional control items
//! - The spamming/trustworthy annotator model with smoothed EM and
//!   mean-field variational Bayes estimators
//! - Random restarts with best-score selection and optional early stopping
//! - Threshold decoding of item posteriors, with abstention
//! - CSV/JSON adapters and a command-line interface

pub mod cli;
pub mod config;
pub mod controls;
pub mod decode;
pub mod error;
pub mod evaluation;
pub mod inference;
pub mod io;
pub mod matrix;
pub mod model;
pub mod pipeline;
pub mod ports;
pub mod restarts;
pub mod utils;

pub use config::{InferenceConfig, InferenceMode};
pub use controls::Controls;
pub use decode::{Decoder, Prediction};
pub use error::{Error, Result};
pub use evaluation::{Evaluation, evaluate};
pub use inference::{EmEngine, Estimator, InferenceRun, Strategy, VariationalEstimator};
pub use matrix::{Annotation, LabelAlphabet, LabelMatrix};
pub use model::{AnnotatorModel, ItemPosterior, PosteriorTable};
pub use restarts::{InferenceOutcome, RestartController, RestartSummary};
