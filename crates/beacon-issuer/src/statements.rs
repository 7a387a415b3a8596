//! # Signed Statements About This Entity and Its Subordinates
//!
//! Everything the entity publishes under its own signature that is not a
//! trust mark: the entity configuration at the well-known path,
//! subordinate statements served by the fetch endpoint, and the signed
//! historical keys document.

use std::sync::Arc;

use beacon_core::{unix_now, EntityId, JWT_TYPE_ENTITY_STATEMENT, JWT_TYPE_JWK_SET};
use beacon_crypto::{jwt, Jwk, KeyRing};
use beacon_store::SubordinateInfo;
use serde::{Deserialize, Serialize};

use crate::entity_config::EntityStatementPayload;
use crate::error::IssuerError;

/// External endpoint URLs advertised in the `federation_entity`
/// metadata. Unset endpoints are omitted from the published metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FederationEndpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federation_fetch_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federation_list_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federation_trust_mark_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federation_trust_mark_status_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federation_trust_mark_list_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federation_historical_keys_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FederationEntityMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    organization_name: Option<String>,
    #[serde(flatten)]
    endpoints: FederationEndpoints,
}

/// Claims of the signed historical keys document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalKeysClaims {
    pub iss: EntityId,
    pub iat: i64,
    pub keys: Vec<Jwk>,
}

/// Builds and signs entity statements.
pub struct StatementSigner {
    entity_id: EntityId,
    key_ring: Arc<KeyRing>,
    /// Validity of signed statements in seconds.
    statement_lifetime_secs: u64,
    organization_name: Option<String>,
    endpoints: FederationEndpoints,
    authority_hints: Vec<EntityId>,
}

impl StatementSigner {
    pub fn new(
        entity_id: EntityId,
        key_ring: Arc<KeyRing>,
        statement_lifetime_secs: u64,
        organization_name: Option<String>,
        endpoints: FederationEndpoints,
        authority_hints: Vec<EntityId>,
    ) -> Self {
        Self {
            entity_id,
            key_ring,
            statement_lifetime_secs,
            organization_name,
            endpoints,
            authority_hints,
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// The self-signed entity configuration served at the well-known
    /// path. Carries the active signing key and the federation_entity
    /// metadata advertising the enabled endpoints.
    pub fn entity_configuration(&self) -> Result<String, IssuerError> {
        let snapshot = self.key_ring.snapshot();
        let iat = unix_now();
        let mut metadata = serde_json::Map::new();
        let federation_entity = FederationEntityMetadata {
            organization_name: self.organization_name.clone(),
            endpoints: self.endpoints.clone(),
        };
        metadata.insert(
            "federation_entity".to_string(),
            serde_json::to_value(federation_entity)
                .map_err(|e| IssuerError::EntityConfig(e.to_string()))?,
        );
        let payload = EntityStatementPayload {
            iss: self.entity_id.clone(),
            sub: self.entity_id.clone(),
            iat,
            exp: iat + self.statement_lifetime_secs as i64,
            jwks: snapshot.jwks(),
            metadata,
            authority_hints: self.authority_hints.clone(),
            source_endpoint: None,
        };
        Ok(jwt::sign(snapshot.active(), JWT_TYPE_ENTITY_STATEMENT, &payload)?)
    }

    /// A subordinate statement: this entity's signature over the
    /// subordinate's registered keys.
    pub fn subordinate_statement(
        &self,
        subordinate: &SubordinateInfo,
    ) -> Result<String, IssuerError> {
        let snapshot = self.key_ring.snapshot();
        let iat = unix_now();
        let payload = EntityStatementPayload {
            iss: self.entity_id.clone(),
            sub: subordinate.entity_id.clone(),
            iat,
            exp: iat + self.statement_lifetime_secs as i64,
            jwks: subordinate.jwks.clone(),
            metadata: serde_json::Map::new(),
            authority_hints: Vec::new(),
            source_endpoint: self.endpoints.federation_fetch_endpoint.clone(),
        };
        Ok(jwt::sign(snapshot.active(), JWT_TYPE_ENTITY_STATEMENT, &payload)?)
    }

    /// The signed historical keys document: active key first, then every
    /// retired key still in retention.
    pub fn historical_keys(&self) -> Result<String, IssuerError> {
        let snapshot = self.key_ring.snapshot();
        let claims = HistoricalKeysClaims {
            iss: self.entity_id.clone(),
            iat: unix_now(),
            keys: snapshot.all_jwks().keys,
        };
        Ok(jwt::sign(snapshot.active(), JWT_TYPE_JWK_SET, &claims)?)
    }
}
