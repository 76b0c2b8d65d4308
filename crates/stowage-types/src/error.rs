use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StowageError>;

#[derive(Debug, Error)]
pub enum StowageError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("backup store contains invalid top-level directories: {0}")]
    InvalidStoreLayout(String),

    #[error("object not found: '{0}'")]
    NotFound(String),

    #[error("corrupt artifact: {0}")]
    CorruptArtifact(String),

    #[error("unsupported download target kind: '{0}'")]
    UnsupportedTarget(String),

    #[error("unsupported storage provider: '{0}'")]
    UnsupportedProvider(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// One or more sub-operation failures collected from a multi-step operation.
/// Earlier errors are never discarded when a later one occurs.
#[derive(Debug)]
pub struct AggregateError(Vec<StowageError>);

impl AggregateError {
    pub fn errors(&self) -> &[StowageError] {
        &self.0
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors occurred: [", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        write!(f, "]")
    }
}

impl std::error::Error for AggregateError {}

/// Collapse a list of errors into a single one.
///
/// Returns `None` for an empty list, the error itself for a single-element
/// list, and an [`AggregateError`] otherwise.
pub fn aggregate(mut errs: Vec<StowageError>) -> Option<StowageError> {
    match errs.len() {
        0 => None,
        1 => Some(errs.remove(0)),
        _ => Some(StowageError::Aggregate(AggregateError(errs))),
    }
}
