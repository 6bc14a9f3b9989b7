use grn_model::GraphError;

/// Failures surfaced by the editor core. Model failures pass through
/// unchanged so the presentation layer can match on them.
#[derive(thiserror::Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("cannot assemble network: {0}")]
    Assembly(String),
}

pub type Result<T> = std::result::Result<T, EditorError>;
