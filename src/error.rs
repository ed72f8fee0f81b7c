//! Error types for the MACE crate

use thiserror::Error;

/// Main error type for the MACE crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("label matrix has no items")]
    EmptyMatrix,

    #[error("item {item} has no annotations")]
    EmptyItem { item: usize },

    #[error("row {item} has {got} cells, expected {expected}")]
    RaggedRow {
        item: usize,
        expected: usize,
        got: usize,
    },

    #[error(
        "label {label} from annotator {annotator} on item {item} is outside the alphabet of {num_labels} labels"
    )]
    LabelOutOfRange {
        item: usize,
        annotator: usize,
        label: usize,
        num_labels: usize,
    },

    #[error("control label {label} on item {item} is outside the alphabet of {num_labels} labels")]
    ControlOutOfRange {
        item: usize,
        label: usize,
        num_labels: usize,
    },

    #[error("controls list {got} items but the label matrix has {expected}")]
    ControlsLength { expected: usize, got: usize },

    #[error("annotator column lists {got} items but the label matrix has {expected}")]
    ColumnLength { expected: usize, got: usize },

    #[error("gold standard lists {got} items but there are {expected} predictions")]
    GoldLength { expected: usize, got: usize },

    #[error("unknown label '{token}' on line {line} (not present in the annotations)")]
    UnknownLabel { token: String, line: usize },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

impl Error {
    /// Whether this error describes structurally invalid input data.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Error::EmptyMatrix
                | Error::EmptyItem { .. }
                | Error::RaggedRow { .. }
                | Error::LabelOutOfRange { .. }
                | Error::ControlOutOfRange { .. }
                | Error::ControlsLength { .. }
                | Error::ColumnLength { .. }
                | Error::GoldLength { .. }
                | Error::UnknownLabel { .. }
        )
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
