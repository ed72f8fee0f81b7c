//! File adapters around the inference core.
//!
//! - [`reader`]: the comma-separated label matrix and one-token-per-line files
//!   (controls and gold standards)
//! - [`writer`]: predictions, competences, label distributions, entropies and
//!   the JSON run summary

pub mod reader;
pub mod writer;

pub use reader::{parse_label_matrix, read_label_matrix, read_token_lines};
pub use writer::{
    RunSummary, write_competence, write_distribution, write_entropies, write_predictions,
    write_summary,
};
