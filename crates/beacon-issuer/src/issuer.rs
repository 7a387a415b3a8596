//! # Trust Mark Signing Facade
//!
//! [`TrustMarkIssuer`] owns the configured trust mark catalog and signs
//! marks over the key ring's current snapshot. It performs no
//! authorization; callers go through the lifecycle engine, which decides
//! whether a mark may be signed at all.

use std::collections::BTreeMap;
use std::sync::Arc;

use beacon_core::{unix_now, EntityId, JWT_TYPE_TRUST_MARK};
use beacon_crypto::{jwt, KeyRing};

use crate::error::IssuerError;
use crate::trust_mark::{TrustMarkClaims, TrustMarkTypeConf};

pub struct TrustMarkIssuer {
    entity_id: EntityId,
    key_ring: Arc<KeyRing>,
    types: BTreeMap<String, TrustMarkTypeConf>,
}

impl TrustMarkIssuer {
    pub fn new(
        entity_id: EntityId,
        key_ring: Arc<KeyRing>,
        confs: impl IntoIterator<Item = TrustMarkTypeConf>,
    ) -> Self {
        let types = confs
            .into_iter()
            .map(|conf| (conf.trust_mark_type.clone(), conf))
            .collect();
        Self {
            entity_id,
            key_ring,
            types,
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn key_ring(&self) -> &Arc<KeyRing> {
        &self.key_ring
    }

    /// The catalog entry for `trust_mark_type`, if configured.
    pub fn type_conf(&self, trust_mark_type: &str) -> Option<&TrustMarkTypeConf> {
        self.types.get(trust_mark_type)
    }

    /// All configured trust mark type identifiers, sorted.
    pub fn trust_mark_types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// The longest configured mark lifetime, which bounds how fast the
    /// signing key may rotate.
    pub fn max_lifetime_secs(&self) -> u64 {
        self.types
            .values()
            .map(|conf| conf.lifetime_secs)
            .max()
            .unwrap_or(0)
    }

    /// Sign a trust mark for `sub`. The caller has already established
    /// entitlement.
    pub fn sign_trust_mark(
        &self,
        trust_mark_type: &str,
        sub: &EntityId,
    ) -> Result<String, IssuerError> {
        let conf = self
            .type_conf(trust_mark_type)
            .ok_or_else(|| IssuerError::UnknownTrustMarkType(trust_mark_type.to_string()))?;
        let iat = unix_now();
        let claims = TrustMarkClaims {
            iss: self.entity_id.clone(),
            sub: sub.clone(),
            trust_mark_type: conf.trust_mark_type.clone(),
            iat,
            exp: (conf.lifetime_secs > 0).then(|| iat + conf.lifetime_secs as i64),
            r#ref: conf.r#ref.clone(),
            logo_uri: conf.logo_uri.clone(),
            delegation: conf.delegation.clone(),
            extra: conf.extra_claims.clone(),
        };
        let snapshot = self.key_ring.snapshot();
        Ok(jwt::sign(snapshot.active(), JWT_TYPE_TRUST_MARK, &claims)?)
    }
}

impl std::fmt::Debug for TrustMarkIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustMarkIssuer")
            .field("entity_id", &self.entity_id)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_crypto::{RolloverConf, SigningAlgorithm};

    const TM: &str = "https://ta.example.org/tm/certified";

    fn issuer(dir: &std::path::Path) -> TrustMarkIssuer {
        let ring = KeyRing::load(
            beacon_crypto::PURPOSE_FEDERATION,
            SigningAlgorithm::EdDsa,
            dir,
            RolloverConf {
                enabled: true,
                interval_secs: 86400 * 90,
                keys_kept: 1,
            },
            0,
        )
        .unwrap();
        TrustMarkIssuer::new(
            EntityId::new("https://ta.example.org").unwrap(),
            Arc::new(ring),
            vec![
                TrustMarkTypeConf {
                    trust_mark_type: TM.to_string(),
                    lifetime_secs: 3600,
                    r#ref: Some("https://ta.example.org/tm-policy".to_string()),
                    logo_uri: None,
                    delegation: None,
                    extra_claims: serde_json::Map::new(),
                    checker: None,
                },
                TrustMarkTypeConf {
                    trust_mark_type: "https://ta.example.org/tm/other".to_string(),
                    lifetime_secs: 7200,
                    r#ref: None,
                    logo_uri: None,
                    delegation: None,
                    extra_claims: serde_json::Map::new(),
                    checker: None,
                },
            ],
        )
    }

    #[test]
    fn signed_mark_verifies_and_carries_claims() {
        let dir = tempfile::tempdir().unwrap();
        let issuer = issuer(dir.path());
        let sub = EntityId::new("https://rp.example.org").unwrap();
        let token = issuer.sign_trust_mark(TM, &sub).unwrap();

        let snapshot = issuer.key_ring().snapshot();
        let claims: TrustMarkClaims =
            jwt::verify(&token, snapshot.active().public_jwk()).unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.trust_mark_type, TM);
        assert_eq!(claims.exp, Some(claims.iat + 3600));
        assert_eq!(claims.r#ref.as_deref(), Some("https://ta.example.org/tm-policy"));

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.typ.as_deref(), Some("trust-mark+jwt"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let issuer = issuer(dir.path());
        let sub = EntityId::new("https://rp.example.org").unwrap();
        assert!(matches!(
            issuer.sign_trust_mark("https://nope", &sub),
            Err(IssuerError::UnknownTrustMarkType(_))
        ));
    }

    #[test]
    fn max_lifetime_spans_the_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let issuer = issuer(dir.path());
        assert_eq!(issuer.max_lifetime_secs(), 7200);
        let types: Vec<&str> = issuer.trust_mark_types().collect();
        assert_eq!(
            types,
            vec!["https://ta.example.org/tm/certified", "https://ta.example.org/tm/other"]
        );
    }
}
