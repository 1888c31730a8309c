use std::error::Error;

use thiserror::Error;

/// Raised when a caller-supplied ordering predicate fails.
///
/// The structure that observed the failure has already restored its state by the time
/// this error reaches the caller.
#[derive(Debug, Error)]
#[error("ordering comparison failed: {source}")]
pub struct ComparisonError {
    #[source]
    source: Box<dyn Error + Send + Sync + 'static>,
}

impl ComparisonError {
    /// Wrap the reason a comparison could not be decided.
    pub fn new<E>(source: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        Self {
            source: source.into(),
        }
    }

    /// Unwrap the original failure.
    pub fn into_inner(self) -> Box<dyn Error + Send + Sync + 'static> {
        self.source
    }
}

/// Raised by point lookups.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The argument has no value in the domain.
    #[error("invalid argument value")]
    NotFound,
    /// The argument could not be located because a comparison failed.
    #[error(transparent)]
    Comparison(#[from] ComparisonError),
}
