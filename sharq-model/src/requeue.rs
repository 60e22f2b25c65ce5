use std::fmt;

/// Error returned when a caller-supplied requeue limit is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("`requeue_limit` must be -1 (unbounded) or >= 0")]
pub struct RequeueLimitError;

/// Per-job cap on how many times a job may be restored after lease expiry.
///
/// `-1` means unbounded (ported from `sharq.utils.is_valid_requeue_limit`,
/// which accepts any integer `>= -1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RequeueLimit(i64);

impl RequeueLimit {
    pub const UNBOUNDED: RequeueLimit = RequeueLimit(-1);

    pub fn new(value: i64) -> Result<Self, RequeueLimitError> {
        if value < -1 {
            return Err(RequeueLimitError);
        }
        Ok(Self(value))
    }

    pub fn is_unbounded(self) -> bool {
        self.0 == -1
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Returns the value after one requeue consumption: unbounded stays
    /// unbounded, zero has no successor (caller must discard instead),
    /// otherwise decrements by one.
    pub fn after_requeue(self) -> Option<Self> {
        if self.is_unbounded() {
            Some(self)
        } else if self.0 == 0 {
            None
        } else {
            Some(Self(self.0 - 1))
        }
    }

    pub fn is_exhausted(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RequeueLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for RequeueLimit {
    type Error = RequeueLimitError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_below_unbounded() {
        assert!(RequeueLimit::new(-2).is_err());
    }

    #[test]
    fn accepts_unbounded_and_non_negative() {
        assert!(RequeueLimit::new(-1).is_ok());
        assert!(RequeueLimit::new(0).is_ok());
        assert!(RequeueLimit::new(5).is_ok());
    }

    #[test]
    fn unbounded_stays_unbounded_across_requeues() {
        let mut limit = RequeueLimit::UNBOUNDED;
        for _ in 0..100 {
            limit = limit.after_requeue().unwrap();
        }
        assert!(limit.is_unbounded());
    }

    #[test]
    fn bounded_counts_down_to_none() {
        let limit = RequeueLimit::new(2).unwrap();
        let limit = limit.after_requeue().unwrap();
        assert_eq!(limit.get(), 1);
        let limit = limit.after_requeue().unwrap();
        assert_eq!(limit.get(), 0);
        assert!(limit.is_exhausted());
        assert!(limit.after_requeue().is_none());
    }
}
