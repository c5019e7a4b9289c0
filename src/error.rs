use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoralError {
    /// Mean requested over zero elements. `context` names the key or year.
    #[error("Cannot average an empty sequence: {context}")]
    EmptySequence { context: String },

    #[error("Malformed input at line {line}, column '{column}': {value:?}")]
    MalformedInput {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CoralError>;

impl CoralError {
    pub(crate) fn empty(context: impl Into<String>) -> Self {
        CoralError::EmptySequence {
            context: context.into(),
        }
    }
}
