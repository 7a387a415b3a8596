//! # Stored Record Types
//!
//! The authorization state machine and the subordinate registration
//! record. The transition rules live here, on [`Status`], so every
//! backend applies exactly the same state machine.

use beacon_core::EntityId;
use beacon_crypto::Jwks;
use serde::{Deserialize, Serialize};

/// Authorization status of one subject for one trust mark type.
///
/// A subject with no stored record is `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Never requested, or revoked back to the initial state.
    Inactive,
    /// Requested by the subject, awaiting operator approval.
    Pending,
    /// Entitled; trust marks are issued on demand.
    Active,
    /// Barred from this trust mark type until explicitly unblocked.
    Blocked,
}

impl Status {
    /// The status reached by a subject-initiated request, or `None` when
    /// the request is rejected.
    ///
    /// `Inactive` moves to `Pending`; `Pending` and `Active` stay put so
    /// repeated requests are idempotent; `Blocked` rejects.
    pub fn on_request(self) -> Option<Status> {
        match self {
            Status::Inactive => Some(Status::Pending),
            Status::Pending => Some(Status::Pending),
            Status::Active => Some(Status::Active),
            Status::Blocked => None,
        }
    }

    /// The status reached by an approval, or `None` when approval does
    /// not apply. A block is never lifted implicitly.
    pub fn on_approve(self) -> Option<Status> {
        match self {
            Status::Blocked => None,
            _ => Some(Status::Active),
        }
    }

    /// The status reached by lifting a block. Only `Blocked` changes.
    pub fn on_unblock(self) -> Status {
        match self {
            Status::Blocked => Status::Inactive,
            other => other,
        }
    }

    pub fn is_active(self) -> bool {
        self == Status::Active
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Inactive
    }
}

/// One stored authorization record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRecord {
    pub status: Status,
    /// Unix timestamp of the last transition.
    pub updated_at: i64,
}

impl AuthorizationRecord {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            updated_at: beacon_core::unix_now(),
        }
    }
}

fn active() -> Status {
    Status::Active
}

/// A registered subordinate entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubordinateInfo {
    pub entity_id: EntityId,
    /// OpenID Federation entity type identifiers this subordinate
    /// declares (e.g. `"openid_relying_party"`).
    #[serde(default)]
    pub entity_types: Vec<String>,
    /// The subordinate's public federation keys.
    pub jwks: Jwks,
    /// Registration status. Only `Active` registrations are served by
    /// the fetch and listing endpoints; `Pending` awaits operator
    /// approval, `Blocked` refuses re-enrollment. Records written
    /// without the field are `Active`.
    #[serde(default = "active")]
    pub status: Status,
}
