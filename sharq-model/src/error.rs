use thiserror::Error;

use crate::ids::IdentifierError;
use crate::interval::IntervalError;
use crate::requeue::RequeueLimitError;

/// Backend-agnostic transport error surfaced by a `Store` implementation.
///
/// `sharq-redis::RedisStore` maps `redis::RedisError` into this; an
/// in-memory test store maps its own (infallible, in practice) errors here
/// too, so `sharq-core::engine::Engine` never needs to know which backend
/// it's talking to.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend unavailable: {0}")]
    Unavailable(String),
    #[error("store protocol error: {0}")]
    Protocol(String),
}

/// A malformed call is a `BadArgument` (raised before any store mutation).
///
/// `OperationFailure` is part of the §7 error taxonomy but is never
/// constructed by `sharq-core`: "nothing to dequeue", "finish on unknown
/// job", and "interval on missing queue" are all encoded as typed
/// success outcomes (`DequeueOutcome::Empty`, `FinishOutcome::NotFound`,
/// `IntervalOutcome::NotFound`) rather than errors, per §4.8. The variant
/// is kept for a caller that wants to fold those outcomes into a single
/// error channel of its own.
#[derive(Debug, Error)]
pub enum SharqError {
    #[error("bad argument: {0}")]
    BadArgument(String),
    #[error("operation failed: {0}")]
    OperationFailure(String),
    #[error(transparent)]
    Backend(#[from] StoreError),
}

impl From<IdentifierError> for SharqError {
    fn from(err: IdentifierError) -> Self {
        SharqError::BadArgument(err.to_string())
    }
}

impl From<IntervalError> for SharqError {
    fn from(err: IntervalError) -> Self {
        SharqError::BadArgument(err.to_string())
    }
}

impl From<RequeueLimitError> for SharqError {
    fn from(err: RequeueLimitError) -> Self {
        SharqError::BadArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SharqError>;
