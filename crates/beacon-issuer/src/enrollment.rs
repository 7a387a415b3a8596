//! # Subordinate Enrollment
//!
//! Admission control for new subordinates. A candidate publishes a
//! self-signed entity configuration; the gate fetches and verifies it,
//! evaluates the configured admission checker, and produces the
//! registration record the storage layer persists. Enrollment requests
//! skip the checker and yield a `Pending` record for operator review.

use std::sync::Arc;

use beacon_core::EntityId;
use beacon_store::{Status, SubordinateInfo};

use crate::checker::{CheckDecision, EntityChecker};
use crate::entity_config::{EntityConfigSource, EntityStatementPayload};
use crate::error::IssuerError;

/// Decides whether a candidate may register as a subordinate.
///
/// Without a checker, every candidate with a verifiable entity
/// configuration is admitted.
pub struct EnrollmentGate {
    checker: Option<EntityChecker>,
    entity_configs: Arc<dyn EntityConfigSource>,
}

impl EnrollmentGate {
    pub fn new(
        checker: Option<EntityChecker>,
        entity_configs: Arc<dyn EntityConfigSource>,
    ) -> Self {
        Self {
            checker,
            entity_configs,
        }
    }

    /// Vet `sub` for immediate admission: verify its entity
    /// configuration and evaluate the admission checker. On success the
    /// returned registration is `Active`, carrying the keys and entity
    /// types the candidate published.
    pub async fn vet(&self, sub: &EntityId) -> Result<SubordinateInfo, IssuerError> {
        let config = self.entity_configs.entity_configuration(sub).await?;
        if let Some(checker) = &self.checker {
            if let CheckDecision::Denied { reason } = checker.check(sub, Some(&config)) {
                tracing::debug!(sub = %sub, %reason, "enrollment denied");
                return Err(IssuerError::EnrollmentDenied { reason });
            }
        }
        Ok(registration(sub, config, Status::Active))
    }

    /// A `Pending` registration for operator review. The entity
    /// configuration must still verify, but the checker is not
    /// consulted; an operator decides instead.
    pub async fn draft(&self, sub: &EntityId) -> Result<SubordinateInfo, IssuerError> {
        let config = self.entity_configs.entity_configuration(sub).await?;
        Ok(registration(sub, config, Status::Pending))
    }
}

fn registration(
    sub: &EntityId,
    config: EntityStatementPayload,
    status: Status,
) -> SubordinateInfo {
    let entity_types = config.entity_types().map(str::to_string).collect();
    SubordinateInfo {
        entity_id: sub.clone(),
        entity_types,
        jwks: config.jwks,
        status,
    }
}
