use std::fmt;

use uuid::Uuid;

use super::error::DomainError;

const MAX_VISITOR_ID_LEN: usize = 64;

/// Opaque client token used only for same-day visit deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisitorId(String);

impl VisitorId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accept a client-supplied identifier: 1 to 64 bytes of `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(DomainError::validation("visitor id is empty"));
        }
        if value.len() > MAX_VISITOR_ID_LEN {
            return Err(DomainError::validation(format!(
                "visitor id exceeds {MAX_VISITOR_ID_LEN} characters"
            )));
        }
        if !value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(DomainError::validation(
                "visitor id contains unsupported characters",
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_round_trip_through_parse() {
        let id = VisitorId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert_eq!(VisitorId::parse(id.as_str()), Ok(id));
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(VisitorId::generate(), VisitorId::generate());
    }

    #[test]
    fn hyphenated_uuid_is_accepted() {
        let raw = "0b7e1c9a-3f5d-4a8e-9c21-6d4f0e2b7a13";
        assert_eq!(VisitorId::parse(raw).unwrap().as_str(), raw);
    }

    #[test]
    fn rejects_empty_and_oversized_values() {
        assert!(VisitorId::parse("   ").is_err());
        assert!(VisitorId::parse(&"a".repeat(MAX_VISITOR_ID_LEN + 1)).is_err());
    }

    #[test]
    fn rejects_separator_characters() {
        assert!(VisitorId::parse("abc:def").is_err());
        assert!(VisitorId::parse("abc def").is_err());
        assert!(VisitorId::parse("abc;x=1").is_err());
    }
}
