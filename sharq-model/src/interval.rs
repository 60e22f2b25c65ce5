use std::fmt;

/// Error returned when a caller-supplied interval is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("`interval` must be a positive number of milliseconds")]
pub struct IntervalError;

/// Minimum number of milliseconds between successive dequeues of one
/// `(queue_type, queue_id)`. Always strictly positive (ported from
/// `sharq.utils.is_valid_interval`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct IntervalMs(u64);

impl IntervalMs {
    pub fn new(value: i64) -> Result<Self, IntervalError> {
        if value <= 0 {
            return Err(IntervalError);
        }
        Ok(Self(value as u64))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IntervalMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for IntervalMs {
    type Error = IntervalError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive() {
        assert!(IntervalMs::new(0).is_err());
        assert!(IntervalMs::new(-1).is_err());
    }

    #[test]
    fn accepts_positive() {
        assert_eq!(IntervalMs::new(10_000).unwrap().get(), 10_000);
    }
}
