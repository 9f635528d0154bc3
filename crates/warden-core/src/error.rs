use thiserror::Error;

/// Failure raised by a restriction predicate that could not reach a
/// decision.
///
/// This is distinct from a predicate that does not apply to the context
/// (for example a guild check on a direct message), which returns
/// `Ok(false)`. Evaluators treat both as denial.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestrictionError {
    #[error("restriction data unavailable: {0}")]
    Unavailable(String),

    #[error("internal restriction error: {0}")]
    Internal(String),
}

pub type RestrictionResult<T> = Result<T, RestrictionError>;
