//! Thin validation wrappers around the newtypes in `sharq_model` (§4.1).
//!
//! Every engine operation runs these before touching the [`Store`](crate::store::Store) —
//! a `BadArgument` is always raised pre-mutation, never after a partial write.

use sharq_model::{Identifier, IntervalMs, RequeueLimit, SharqError};

pub fn identifier(value: &str) -> Result<Identifier, SharqError> {
    Ok(Identifier::parse(value)?)
}

pub fn interval_ms(value: i64) -> Result<IntervalMs, SharqError> {
    Ok(IntervalMs::new(value)?)
}

pub fn requeue_limit(value: i64) -> Result<RequeueLimit, SharqError> {
    Ok(RequeueLimit::new(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_identifier() {
        assert!(identifier("").is_err());
    }

    #[test]
    fn rejects_non_positive_interval() {
        assert!(interval_ms(0).is_err());
    }

    #[test]
    fn rejects_requeue_limit_below_unbounded() {
        assert!(requeue_limit(-2).is_err());
    }
}
