/// Failures reported by the graph model, the drafting machine, the
/// assembler and the GraphML adapter.
///
/// All of them are local: the offending call is rejected and the model is
/// left exactly as it was before the call.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("id already in use: {0}")]
    DuplicateId(String),
    #[error("invalid attribute `{name}`: {reason}")]
    InvalidAttribute { name: String, reason: String },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("malformed file: {0}")]
    MalformedFile(String),
    #[error("incomplete graph: {0}")]
    IncompleteGraph(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphError {
    pub(crate) fn node_not_found(id: impl std::fmt::Display) -> Self {
        GraphError::NotFound(format!("node '{id}'"))
    }

    pub(crate) fn edge_not_found(id: impl std::fmt::Display) -> Self {
        GraphError::NotFound(format!("edge {id}"))
    }

    pub(crate) fn invalid(
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        GraphError::InvalidAttribute {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        GraphError::MalformedFile(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
