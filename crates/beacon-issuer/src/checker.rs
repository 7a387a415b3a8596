//! # Entitlement Checkers
//!
//! A checker decides whether a subject with no stored authorization may
//! still be issued a trust mark. The checker language is a closed set of
//! predicates over the subject identifier and its verified entity
//! configuration, combinable with `and`/`or`. Configuration deserializes
//! directly into [`EntityChecker`], so an unknown checker type fails at
//! startup instead of silently granting or denying.

use beacon_core::EntityId;
use serde::{Deserialize, Serialize};

use crate::entity_config::EntityStatementPayload;

/// Outcome of an entitlement check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckDecision {
    Granted,
    Denied { reason: String },
}

impl CheckDecision {
    pub fn denied(reason: impl Into<String>) -> Self {
        CheckDecision::Denied {
            reason: reason.into(),
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, CheckDecision::Granted)
    }
}

/// A predicate over a subject and its entity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityChecker {
    /// Grant when the subject is on an explicit allow list.
    EntityIds { entity_ids: Vec<EntityId> },
    /// Grant when the subject declares at least one of these entity
    /// types in its entity configuration metadata.
    EntityTypes { entity_types: Vec<String> },
    /// Grant when the metadata value at `path` equals `value`, or when
    /// the value at `path` is an array containing `value`.
    Claim {
        path: String,
        value: serde_json::Value,
    },
    /// Grant when every child grants.
    And { all: Vec<EntityChecker> },
    /// Grant when at least one child grants.
    Or { any: Vec<EntityChecker> },
}

impl EntityChecker {
    /// Whether evaluating this checker requires the subject's entity
    /// configuration. Pure allow lists do not, so the engine can skip
    /// the fetch.
    pub fn needs_entity_config(&self) -> bool {
        match self {
            EntityChecker::EntityIds { .. } => false,
            EntityChecker::EntityTypes { .. } | EntityChecker::Claim { .. } => true,
            EntityChecker::And { all } => all.iter().any(Self::needs_entity_config),
            EntityChecker::Or { any } => any.iter().any(Self::needs_entity_config),
        }
    }

    /// Evaluate against `sub` and its entity configuration, if one was
    /// obtained.
    pub fn check(
        &self,
        sub: &EntityId,
        entity_config: Option<&EntityStatementPayload>,
    ) -> CheckDecision {
        match self {
            EntityChecker::EntityIds { entity_ids } => {
                if entity_ids.contains(sub) {
                    CheckDecision::Granted
                } else {
                    CheckDecision::denied("subject is not on the allow list")
                }
            }
            EntityChecker::EntityTypes { entity_types } => {
                let Some(config) = entity_config else {
                    return CheckDecision::denied("entity configuration unavailable");
                };
                if config
                    .entity_types()
                    .any(|t| entity_types.iter().any(|want| want == t))
                {
                    CheckDecision::Granted
                } else {
                    CheckDecision::denied(format!(
                        "subject declares none of the entity types {entity_types:?}"
                    ))
                }
            }
            EntityChecker::Claim { path, value } => {
                let Some(config) = entity_config else {
                    return CheckDecision::denied("entity configuration unavailable");
                };
                match config.metadata_value(path) {
                    Some(found) if found == value => CheckDecision::Granted,
                    Some(serde_json::Value::Array(items)) if items.contains(value) => {
                        CheckDecision::Granted
                    }
                    Some(_) => {
                        CheckDecision::denied(format!("metadata '{path}' has a different value"))
                    }
                    None => CheckDecision::denied(format!("metadata '{path}' is absent")),
                }
            }
            EntityChecker::And { all } => {
                for child in all {
                    if let CheckDecision::Denied { reason } = child.check(sub, entity_config) {
                        return CheckDecision::Denied { reason };
                    }
                }
                CheckDecision::Granted
            }
            EntityChecker::Or { any } => {
                let mut reasons = Vec::new();
                for child in any {
                    match child.check(sub, entity_config) {
                        CheckDecision::Granted => return CheckDecision::Granted,
                        CheckDecision::Denied { reason } => reasons.push(reason),
                    }
                }
                CheckDecision::denied(reasons.join("; "))
            }
        }
    }
}
