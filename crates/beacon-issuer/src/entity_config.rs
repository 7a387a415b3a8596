//! # Entity Configuration Retrieval and Verification
//!
//! Entitlement checkers that inspect a subject's metadata need the
//! subject's entity configuration: the self-signed statement it publishes
//! at `/.well-known/openid-federation`. [`EntityConfigSource`] abstracts
//! where that statement comes from so the engine can be tested without a
//! network; [`HttpEntityConfigSource`] is the production implementation.
//!
//! Self-signed means exactly that: the statement is verified against a
//! key from its own `jwks`, which proves possession of the published key
//! but establishes no trust chain. Checkers treat the content as claims
//! by the subject about itself.

use std::time::Duration;

use async_trait::async_trait;
use beacon_core::{EntityId, WELL_KNOWN_FEDERATION_PATH};
use beacon_crypto::{jwt, Jwks};
use serde::{Deserialize, Serialize};

use crate::error::IssuerError;

/// The claims of an entity statement.
///
/// Used for both verified entity configurations (this module) and for
/// the statements this issuer signs about itself and its subordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStatementPayload {
    pub iss: EntityId,
    pub sub: EntityId,
    pub iat: i64,
    pub exp: i64,
    pub jwks: Jwks,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authority_hints: Vec<EntityId>,
    /// Where fetch responses about this subject can be obtained, present
    /// only in subordinate statements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_endpoint: Option<String>,
}

impl EntityStatementPayload {
    /// Entity type identifiers are the top-level metadata keys.
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.metadata.keys().map(String::as_str)
    }

    /// Look up a metadata value by dotted path, e.g.
    /// `"openid_relying_party.client_registration_types"`.
    pub fn metadata_value(&self, path: &str) -> Option<&serde_json::Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.metadata.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

/// Verify a self-signed entity configuration for `expected_sub`.
///
/// The verification key is taken from the statement's own `jwks`, by
/// `kid` when the header carries one, otherwise by trying each key.
pub fn verify_entity_configuration(
    token: &str,
    expected_sub: &EntityId,
) -> Result<EntityStatementPayload, IssuerError> {
    let unverified: EntityStatementPayload = jwt::decode_unverified(token)
        .map_err(|e| IssuerError::EntityConfig(format!("undecodable statement: {e}")))?;
    if &unverified.sub != expected_sub || unverified.iss != unverified.sub {
        return Err(IssuerError::EntityConfig(format!(
            "statement is not a self-signed configuration for '{expected_sub}'"
        )));
    }

    let kid = jwt::header_kid(token)
        .map_err(|e| IssuerError::EntityConfig(format!("unreadable header: {e}")))?;
    let candidates: Vec<_> = match kid.as_deref() {
        Some(kid) => unverified.jwks.find(kid).into_iter().collect(),
        None => unverified.jwks.keys.iter().collect(),
    };
    for jwk in candidates {
        if let Ok(verified) = jwt::verify::<EntityStatementPayload>(token, jwk) {
            return Ok(verified);
        }
    }
    Err(IssuerError::EntityConfig(
        "signature does not verify against the statement's own jwks".to_string(),
    ))
}

/// Source of verified entity configurations.
#[async_trait]
pub trait EntityConfigSource: Send + Sync {
    async fn entity_configuration(
        &self,
        entity_id: &EntityId,
    ) -> Result<EntityStatementPayload, IssuerError>;
}

/// Fetches entity configurations over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpEntityConfigSource {
    client: reqwest::Client,
}

impl HttpEntityConfigSource {
    pub fn new() -> Result<Self, IssuerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| IssuerError::EntityConfig(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EntityConfigSource for HttpEntityConfigSource {
    async fn entity_configuration(
        &self,
        entity_id: &EntityId,
    ) -> Result<EntityStatementPayload, IssuerError> {
        let url = entity_id.join(WELL_KNOWN_FEDERATION_PATH);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IssuerError::EntityConfig(format!("fetch {url}: {e}")))?;
        if !response.status().is_success() {
            return Err(IssuerError::EntityConfig(format!(
                "fetch {url}: status {}",
                response.status()
            )));
        }
        let token = response
            .text()
            .await
            .map_err(|e| IssuerError::EntityConfig(format!("read {url}: {e}")))?;
        verify_entity_configuration(token.trim(), entity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::{unix_now, JWT_TYPE_ENTITY_STATEMENT};
    use beacon_crypto::{SigningAlgorithm, SigningKeyPair};

    fn self_signed(
        pair: &SigningKeyPair,
        entity: &EntityId,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> String {
        let payload = EntityStatementPayload {
            iss: entity.clone(),
            sub: entity.clone(),
            iat: unix_now(),
            exp: unix_now() + 3600,
            jwks: Jwks {
                keys: vec![pair.public_jwk().clone()],
            },
            metadata,
            authority_hints: Vec::new(),
            source_endpoint: None,
        };
        jwt::sign(pair, JWT_TYPE_ENTITY_STATEMENT, &payload).unwrap()
    }

    #[test]
    fn verifies_self_signed_configuration() {
        let entity = EntityId::new("https://rp.example.org").unwrap();
        let pair = SigningKeyPair::generate(SigningAlgorithm::EdDsa, 0).unwrap();
        let mut metadata = serde_json::Map::new();
        metadata.insert("openid_relying_party".to_string(), serde_json::json!({}));
        let token = self_signed(&pair, &entity, metadata);

        let payload = verify_entity_configuration(&token, &entity).unwrap();
        assert_eq!(payload.sub, entity);
        assert_eq!(
            payload.entity_types().collect::<Vec<_>>(),
            vec!["openid_relying_party"]
        );
    }

    #[test]
    fn rejects_statement_for_other_subject() {
        let entity = EntityId::new("https://rp.example.org").unwrap();
        let other = EntityId::new("https://other.example.org").unwrap();
        let pair = SigningKeyPair::generate(SigningAlgorithm::EdDsa, 0).unwrap();
        let token = self_signed(&pair, &entity, serde_json::Map::new());
        assert!(verify_entity_configuration(&token, &other).is_err());
    }

    #[test]
    fn rejects_signature_by_unpublished_key() {
        let entity = EntityId::new("https://rp.example.org").unwrap();
        let published = SigningKeyPair::generate(SigningAlgorithm::EdDsa, 0).unwrap();
        let actual_signer = SigningKeyPair::generate(SigningAlgorithm::EdDsa, 0).unwrap();
        let payload = EntityStatementPayload {
            iss: entity.clone(),
            sub: entity.clone(),
            iat: unix_now(),
            exp: unix_now() + 3600,
            jwks: Jwks {
                keys: vec![published.public_jwk().clone()],
            },
            metadata: serde_json::Map::new(),
            authority_hints: Vec::new(),
            source_endpoint: None,
        };
        let token = jwt::sign(&actual_signer, JWT_TYPE_ENTITY_STATEMENT, &payload).unwrap();
        assert!(verify_entity_configuration(&token, &entity).is_err());
    }

    #[test]
    fn metadata_value_follows_dotted_paths() {
        let entity = EntityId::new("https://rp.example.org").unwrap();
        let pair = SigningKeyPair::generate(SigningAlgorithm::EdDsa, 0).unwrap();
        let mut metadata = serde_json::Map::new();
        metadata.insert(
            "openid_relying_party".to_string(),
            serde_json::json!({"client_registration_types": ["automatic"]}),
        );
        let token = self_signed(&pair, &entity, metadata);
        let payload = verify_entity_configuration(&token, &entity).unwrap();

        assert_eq!(
            payload.metadata_value("openid_relying_party.client_registration_types"),
            Some(&serde_json::json!(["automatic"]))
        );
        assert!(payload.metadata_value("openid_provider.issuer").is_none());
    }
}
