//! # Trust Mark Lifecycle Engine
//!
//! [`TrustMarkLifecycle`] is the single decision point for every
//! externally visible trust mark operation. The decision table for
//! issuance:
//!
//! | stored status | checker verdict | outcome                      |
//! |---------------|-----------------|------------------------------|
//! | `Active`      | not consulted   | sign and return the mark     |
//! | `Pending`     | not consulted   | `ApprovalPending`            |
//! | `Blocked`     | not consulted   | `SubjectBlocked`             |
//! | `Inactive`    | granted         | approve in storage, then sign|
//! | `Inactive`    | denied / none   | `NotEntitled`                |
//!
//! A checker grant is persisted before signing, so a subject admitted
//! once stays entitled even if its entity configuration later becomes
//! unreachable.

use std::sync::Arc;

use beacon_core::EntityId;
use beacon_store::{Status, TrustMarkStore};

use crate::checker::CheckDecision;
use crate::entity_config::EntityConfigSource;
use crate::error::IssuerError;
use crate::issuer::TrustMarkIssuer;

/// Outcome of a subject-initiated trust mark request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The request was recorded (or already existed) and awaits
    /// approval.
    Pending,
    /// The subject is already entitled; there is nothing to request.
    AlreadyActive,
}

pub struct TrustMarkLifecycle {
    issuer: Arc<TrustMarkIssuer>,
    store: Arc<dyn TrustMarkStore>,
    entity_configs: Arc<dyn EntityConfigSource>,
}

impl TrustMarkLifecycle {
    pub fn new(
        issuer: Arc<TrustMarkIssuer>,
        store: Arc<dyn TrustMarkStore>,
        entity_configs: Arc<dyn EntityConfigSource>,
    ) -> Self {
        Self {
            issuer,
            store,
            entity_configs,
        }
    }

    pub fn issuer(&self) -> &Arc<TrustMarkIssuer> {
        &self.issuer
    }

    fn known_type<'a>(&self, trust_mark_type: &'a str) -> Result<&'a str, IssuerError> {
        if self.issuer.type_conf(trust_mark_type).is_some() {
            Ok(trust_mark_type)
        } else {
            Err(IssuerError::UnknownTrustMarkType(trust_mark_type.to_string()))
        }
    }

    /// Issue a trust mark for `sub`, consulting the type's entitlement
    /// checker when the subject has no stored authorization.
    pub async fn issue(
        &self,
        trust_mark_type: &str,
        sub: &EntityId,
    ) -> Result<String, IssuerError> {
        let conf = self
            .issuer
            .type_conf(trust_mark_type)
            .ok_or_else(|| IssuerError::UnknownTrustMarkType(trust_mark_type.to_string()))?;

        match self.store.status(trust_mark_type, sub)? {
            Status::Active => self.issuer.sign_trust_mark(trust_mark_type, sub),
            Status::Pending => Err(IssuerError::ApprovalPending),
            Status::Blocked => Err(IssuerError::SubjectBlocked),
            Status::Inactive => {
                let Some(checker) = &conf.checker else {
                    return Err(IssuerError::NotEntitled {
                        reason: "no entitlement rule for this trust mark type".to_string(),
                    });
                };
                let entity_config = if checker.needs_entity_config() {
                    Some(self.entity_configs.entity_configuration(sub).await?)
                } else {
                    None
                };
                match checker.check(sub, entity_config.as_ref()) {
                    CheckDecision::Granted => {
                        self.store.approve(trust_mark_type, sub)?;
                        tracing::info!(
                            trust_mark_type,
                            sub = %sub,
                            "checker granted entitlement, subject promoted to active"
                        );
                        self.issuer.sign_trust_mark(trust_mark_type, sub)
                    }
                    CheckDecision::Denied { reason } => {
                        tracing::debug!(trust_mark_type, sub = %sub, %reason, "entitlement denied");
                        Err(IssuerError::NotEntitled { reason })
                    }
                }
            }
        }
    }

    /// Record a subject-initiated request.
    pub fn request(
        &self,
        trust_mark_type: &str,
        sub: &EntityId,
    ) -> Result<RequestOutcome, IssuerError> {
        self.known_type(trust_mark_type)?;
        match self.store.request(trust_mark_type, sub)? {
            Status::Active => Ok(RequestOutcome::AlreadyActive),
            _ => Ok(RequestOutcome::Pending),
        }
    }

    /// Whether `sub` currently holds an active entitlement.
    pub fn is_active(&self, trust_mark_type: &str, sub: &EntityId) -> Result<bool, IssuerError> {
        self.known_type(trust_mark_type)?;
        Ok(self.store.status(trust_mark_type, sub)?.is_active())
    }

    /// Active subjects for a type, optionally narrowed to one subject.
    /// The narrowed form returns a single-element list when that subject
    /// is active, an empty list otherwise.
    pub fn list_active(
        &self,
        trust_mark_type: &str,
        sub: Option<&EntityId>,
    ) -> Result<Vec<EntityId>, IssuerError> {
        self.known_type(trust_mark_type)?;
        match sub {
            Some(sub) => {
                if self.store.status(trust_mark_type, sub)?.is_active() {
                    Ok(vec![sub.clone()])
                } else {
                    Ok(Vec::new())
                }
            }
            None => Ok(self.store.active_subjects(trust_mark_type)?),
        }
    }

    /// Operator approval: entitle the subject directly.
    pub fn approve(&self, trust_mark_type: &str, sub: &EntityId) -> Result<(), IssuerError> {
        self.known_type(trust_mark_type)?;
        self.store.approve(trust_mark_type, sub)?;
        Ok(())
    }

    /// Operator block: bar the subject from this type.
    pub fn block(&self, trust_mark_type: &str, sub: &EntityId) -> Result<(), IssuerError> {
        self.known_type(trust_mark_type)?;
        self.store.block(trust_mark_type, sub)?;
        Ok(())
    }

    /// Operator unblock: return a blocked subject to inactive.
    pub fn unblock(&self, trust_mark_type: &str, sub: &EntityId) -> Result<(), IssuerError> {
        self.known_type(trust_mark_type)?;
        self.store.unblock(trust_mark_type, sub)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::EntityChecker;
    use crate::entity_config::EntityStatementPayload;
    use crate::trust_mark::{TrustMarkClaims, TrustMarkTypeConf};
    use async_trait::async_trait;
    use beacon_core::unix_now;
    use beacon_crypto::{jwt, Jwks, KeyRing, RolloverConf, SigningAlgorithm};
    use beacon_store::FileStore;
    use std::collections::HashMap;

    const ALLOW_LISTED: &str = "https://ta.example.org/tm/allow-listed";
    const RP_ONLY: &str = "https://ta.example.org/tm/relying-parties";
    const MANUAL: &str = "https://ta.example.org/tm/manual";

    /// Serves canned entity configurations from memory.
    struct StaticConfigSource {
        configs: HashMap<String, EntityStatementPayload>,
    }

    #[async_trait]
    impl EntityConfigSource for StaticConfigSource {
        async fn entity_configuration(
            &self,
            entity_id: &EntityId,
        ) -> Result<EntityStatementPayload, IssuerError> {
            self.configs
                .get(entity_id.as_str())
                .cloned()
                .ok_or_else(|| {
                    IssuerError::EntityConfig(format!("no configuration for '{entity_id}'"))
                })
        }
    }

    fn sub(raw: &str) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn rp_config(raw: &str) -> EntityStatementPayload {
        let id = sub(raw);
        let mut metadata = serde_json::Map::new();
        metadata.insert("openid_relying_party".to_string(), serde_json::json!({}));
        EntityStatementPayload {
            iss: id.clone(),
            sub: id,
            iat: unix_now(),
            exp: unix_now() + 3600,
            jwks: Jwks::default(),
            metadata,
            authority_hints: Vec::new(),
            source_endpoint: None,
        }
    }

    fn type_conf(ty: &str, checker: Option<EntityChecker>) -> TrustMarkTypeConf {
        TrustMarkTypeConf {
            trust_mark_type: ty.to_string(),
            lifetime_secs: 3600,
            r#ref: None,
            logo_uri: None,
            delegation: None,
            extra_claims: serde_json::Map::new(),
            checker,
        }
    }

    fn engine(dir: &std::path::Path) -> TrustMarkLifecycle {
        let ring = KeyRing::load(
            beacon_crypto::PURPOSE_FEDERATION,
            SigningAlgorithm::EdDsa,
            dir.join("keys"),
            RolloverConf {
                enabled: true,
                interval_secs: 86400 * 90,
                keys_kept: 1,
            },
            0,
        )
        .unwrap();
        let issuer = TrustMarkIssuer::new(
            sub("https://ta.example.org"),
            Arc::new(ring),
            vec![
                type_conf(
                    ALLOW_LISTED,
                    Some(EntityChecker::EntityIds {
                        entity_ids: vec![sub("https://rp.example.org")],
                    }),
                ),
                type_conf(
                    RP_ONLY,
                    Some(EntityChecker::EntityTypes {
                        entity_types: vec!["openid_relying_party".to_string()],
                    }),
                ),
                type_conf(MANUAL, None),
            ],
        );
        let store = FileStore::open(dir.join("data")).unwrap();
        let mut configs = HashMap::new();
        configs.insert(
            "https://rp.example.org".to_string(),
            rp_config("https://rp.example.org"),
        );
        TrustMarkLifecycle::new(
            Arc::new(issuer),
            Arc::new(store),
            Arc::new(StaticConfigSource { configs }),
        )
    }

    #[tokio::test]
    async fn allow_listed_subject_is_issued_and_promoted() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        let rp = sub("https://rp.example.org");

        let token = engine.issue(ALLOW_LISTED, &rp).await.unwrap();
        let snapshot = engine.issuer().key_ring().snapshot();
        let claims: TrustMarkClaims = jwt::verify(&token, snapshot.active().public_jwk()).unwrap();
        assert_eq!(claims.sub, rp);
        assert_eq!(claims.trust_mark_type, ALLOW_LISTED);

        // the grant was persisted
        assert!(engine.is_active(ALLOW_LISTED, &rp).unwrap());
    }

    #[tokio::test]
    async fn unknown_type_fails_every_operation() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        let rp = sub("https://rp.example.org");

        assert!(matches!(
            engine.issue("https://nope", &rp).await,
            Err(IssuerError::UnknownTrustMarkType(_))
        ));
        assert!(matches!(
            engine.request("https://nope", &rp),
            Err(IssuerError::UnknownTrustMarkType(_))
        ));
        assert!(matches!(
            engine.is_active("https://nope", &rp),
            Err(IssuerError::UnknownTrustMarkType(_))
        ));
        assert!(matches!(
            engine.list_active("https://nope", None),
            Err(IssuerError::UnknownTrustMarkType(_))
        ));
    }

    #[tokio::test]
    async fn checker_denies_subject_off_the_list() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        let other = sub("https://other.example.org");
        assert!(matches!(
            engine.issue(ALLOW_LISTED, &other).await,
            Err(IssuerError::NotEntitled { .. })
        ));
        assert!(!engine.is_active(ALLOW_LISTED, &other).unwrap());
    }

    #[tokio::test]
    async fn metadata_checker_fetches_the_entity_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        let rp = sub("https://rp.example.org");
        engine.issue(RP_ONLY, &rp).await.unwrap();

        // no published configuration, fetch fails
        let unknown = sub("https://unknown.example.org");
        assert!(matches!(
            engine.issue(RP_ONLY, &unknown).await,
            Err(IssuerError::EntityConfig(_))
        ));
    }

    #[tokio::test]
    async fn manual_type_requires_operator_approval() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        let rp = sub("https://rp.example.org");

        assert!(matches!(
            engine.issue(MANUAL, &rp).await,
            Err(IssuerError::NotEntitled { .. })
        ));

        assert_eq!(engine.request(MANUAL, &rp).unwrap(), RequestOutcome::Pending);
        assert!(matches!(
            engine.issue(MANUAL, &rp).await,
            Err(IssuerError::ApprovalPending)
        ));

        engine.approve(MANUAL, &rp).unwrap();
        engine.issue(MANUAL, &rp).await.unwrap();
        assert_eq!(
            engine.request(MANUAL, &rp).unwrap(),
            RequestOutcome::AlreadyActive
        );
    }

    #[tokio::test]
    async fn blocked_subject_is_refused_until_unblocked() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        let rp = sub("https://rp.example.org");

        engine.block(ALLOW_LISTED, &rp).unwrap();
        assert!(matches!(
            engine.issue(ALLOW_LISTED, &rp).await,
            Err(IssuerError::SubjectBlocked)
        ));
        assert!(matches!(
            engine.request(ALLOW_LISTED, &rp),
            Err(IssuerError::SubjectBlocked)
        ));
        // approval does not lift a block
        assert!(matches!(
            engine.approve(ALLOW_LISTED, &rp),
            Err(IssuerError::SubjectBlocked)
        ));

        engine.unblock(ALLOW_LISTED, &rp).unwrap();
        engine.issue(ALLOW_LISTED, &rp).await.unwrap();
    }

    #[tokio::test]
    async fn listing_is_deterministic_and_filterable() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        for raw in [
            "https://c.example.org",
            "https://a.example.org",
            "https://b.example.org",
        ] {
            engine.approve(MANUAL, &sub(raw)).unwrap();
        }

        let all = engine.list_active(MANUAL, None).unwrap();
        let raw: Vec<&str> = all.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            raw,
            [
                "https://a.example.org",
                "https://b.example.org",
                "https://c.example.org"
            ]
        );

        let one = engine
            .list_active(MANUAL, Some(&sub("https://b.example.org")))
            .unwrap();
        assert_eq!(one, vec![sub("https://b.example.org")]);
        let none = engine
            .list_active(MANUAL, Some(&sub("https://z.example.org")))
            .unwrap();
        assert!(none.is_empty());
    }
}
