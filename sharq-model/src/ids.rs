use std::fmt;

/// Maximum length, in bytes, of a `queue_type` / `queue_id` / `job_id`.
pub const IDENTIFIER_MAX_LEN: usize = 100;

/// Characters accepted in an [`Identifier`]: lowercase letters, digits,
/// underscore, hyphen.
fn is_identifier_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-')
}

/// Error returned when a caller-supplied string can't become an
/// [`Identifier`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier must be between 1 and {IDENTIFIER_MAX_LEN} characters")]
    InvalidLength,
    #[error("identifier may only contain [a-z0-9_-] (case-insensitive)")]
    InvalidCharset,
}

/// A validated `queue_type`, `queue_id`, or `job_id`.
///
/// Mirrors `sharq.utils.is_valid_identifier`: length 1-100, charset
/// `[A-Za-z0-9_-]`, case-insensitive for the charset check. The value is
/// stored and echoed back exactly as given — only the *validity* check
/// folds to lowercase, not the stored string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        if value.is_empty() || value.chars().count() > IDENTIFIER_MAX_LEN {
            return Err(IdentifierError::InvalidLength);
        }
        if !value.chars().all(|c| is_identifier_char(c.to_ascii_lowercase())) {
            return Err(IdentifierError::InvalidCharset);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `(queue_type, queue_id)` composite key identifying one rate-limited
/// subject queue. Grouping these two validated identifiers into one type
/// keeps call sites from accidentally swapping the arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueKey {
    pub queue_type: Identifier,
    pub queue_id: Identifier,
}

impl QueueKey {
    pub fn new(queue_type: Identifier, queue_id: Identifier) -> Self {
        Self { queue_type, queue_id }
    }
}

impl fmt::Display for QueueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.queue_type, self.queue_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_identifiers() {
        assert!(Identifier::parse("5m5_qu-eue").is_ok());
        assert!(Identifier::parse("queue_001-").is_ok());
        assert!(Identifier::parse("96c82500-9f88-11e3-bb98-22000ac6964a").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Identifier::parse("").unwrap_err(), IdentifierError::InvalidLength);
    }

    #[test]
    fn rejects_too_long() {
        let long = "a".repeat(IDENTIFIER_MAX_LEN + 1);
        assert_eq!(Identifier::parse(long).unwrap_err(), IdentifierError::InvalidLength);
    }

    #[test]
    fn rejects_bad_charset() {
        assert_eq!(
            Identifier::parse("s!ms_queue").unwrap_err(),
            IdentifierError::InvalidCharset
        );
        assert_eq!(
            Identifier::parse("s!ms queue").unwrap_err(),
            IdentifierError::InvalidCharset
        );
    }

    #[test]
    fn charset_check_is_case_insensitive_but_preserves_case() {
        let id = Identifier::parse("QUEUE-Id_1").unwrap();
        assert_eq!(id.as_str(), "QUEUE-Id_1");
    }

    #[test]
    fn display_round_trips() {
        let key = QueueKey::new(
            Identifier::parse("sms").unwrap(),
            Identifier::parse("u").unwrap(),
        );
        assert_eq!(key.to_string(), "sms:u");
    }
}
