//! # Federation Entity Identifiers
//!
//! A federation entity is identified by an https URL under its control.
//! [`EntityId`] validates the scheme and shape once at the boundary so the
//! rest of the stack can treat the identifier as a plain string.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// A validated federation entity identifier.
///
/// Entity identifiers are URLs with an `https` scheme (plain `http` is
/// accepted for local development setups, matching common federation
/// software). Serializes as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Parse and validate an entity identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ValidationError::InvalidEntityId(
                "entity id must not be empty".to_string(),
            ));
        }
        if !raw.starts_with("https://") && !raw.starts_with("http://") {
            return Err(ValidationError::InvalidEntityId(format!(
                "entity id must be an http(s) URL, got '{raw}'"
            )));
        }
        if raw.contains(char::is_whitespace) {
            return Err(ValidationError::InvalidEntityId(format!(
                "entity id must not contain whitespace: '{raw}'"
            )));
        }
        Ok(Self(raw))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join a path onto this entity id, normalizing slashes.
    ///
    /// Used to derive default endpoint URLs from the entity id.
    pub fn join(&self, path: &str) -> String {
        let base = self.0.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_https_url() {
        let id = EntityId::new("https://ta.example.org").unwrap();
        assert_eq!(id.as_str(), "https://ta.example.org");
    }

    #[test]
    fn accepts_http_for_dev() {
        assert!(EntityId::new("http://localhost:8765").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(EntityId::new("").is_err());
    }

    #[test]
    fn rejects_non_url() {
        assert!(EntityId::new("ta.example.org").is_err());
        assert!(EntityId::new("ftp://ta.example.org").is_err());
    }

    #[test]
    fn rejects_whitespace() {
        assert!(EntityId::new("https://ta.example.org/a b").is_err());
    }

    #[test]
    fn join_normalizes_slashes() {
        let id = EntityId::new("https://ta.example.org/").unwrap();
        assert_eq!(id.join("/fetch"), "https://ta.example.org/fetch");
        assert_eq!(id.join("fetch"), "https://ta.example.org/fetch");
    }

    #[test]
    fn serde_is_transparent() {
        let id = EntityId::new("https://ta.example.org").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"https://ta.example.org\"");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn deserialize_rejects_invalid() {
        let result: Result<EntityId, _> = serde_json::from_str("\"not-a-url\"");
        assert!(result.is_err());
    }
}
