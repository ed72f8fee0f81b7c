//! Latent parameters of the annotation model
//!
//! - [`annotator`]: per-annotator spamming probability and spamming strategy
//! - [`posterior`]: per-item distributions over the candidate true labels

pub mod annotator;
pub mod posterior;

pub use annotator::AnnotatorModel;
pub use posterior::{ItemPosterior, PosteriorTable};
