//! # beacon-store — Persistence for the Beacon Federation Stack
//!
//! Two storage contracts and their backends:
//!
//! - [`TrustMarkStore`]: the per-(trust mark type, subject) authorization
//!   record driving the trust mark lifecycle. Transitions that read the
//!   current status and write a new one ([`TrustMarkStore::request`],
//!   [`TrustMarkStore::approve`]) happen atomically inside the backend,
//!   so concurrent requests for the same subject cannot interleave into
//!   an invalid state.
//! - [`SubordinateStore`]: registered subordinate entities with their
//!   public keys and entity types, backing the fetch and listing
//!   endpoints.
//!
//! Backends are selected by [`StorageConfig`] at startup: [`redb`] for
//! the embedded database (the default) or [`file`] for two plain JSON
//! files that an operator can edit by hand. Both list subjects in
//! lexicographic order so listings are stable across calls and backends.

pub mod config;
pub mod error;
pub mod file;
pub mod record;
pub mod redb;

use beacon_core::EntityId;

pub use config::{open_storage, StorageBackend, StorageConfig, Stores};
pub use error::StorageError;
pub use file::FileStore;
pub use record::{AuthorizationRecord, Status, SubordinateInfo};
pub use self::redb::RedbStore;

/// Authorization records for the trust mark lifecycle.
///
/// A subject with no record is `Inactive`. Every method is safe to call
/// concurrently; `request` and `approve` are atomic read-modify-write
/// operations.
pub trait TrustMarkStore: Send + Sync {
    /// Current status of `sub` for `trust_mark_type`.
    fn status(&self, trust_mark_type: &str, sub: &EntityId) -> Result<Status, StorageError>;

    /// Record a subject-initiated request and return the resulting
    /// status: `Inactive` becomes `Pending`, `Pending` and `Active` are
    /// unchanged. A `Blocked` subject is rejected with
    /// [`StorageError::SubjectBlocked`].
    fn request(&self, trust_mark_type: &str, sub: &EntityId) -> Result<Status, StorageError>;

    /// Entitle the subject: any non-blocked status becomes `Active`.
    /// Approving a `Blocked` subject fails; blocks are lifted only by
    /// [`TrustMarkStore::unblock`].
    fn approve(&self, trust_mark_type: &str, sub: &EntityId) -> Result<(), StorageError>;

    /// Block the subject from obtaining this trust mark type.
    fn block(&self, trust_mark_type: &str, sub: &EntityId) -> Result<(), StorageError>;

    /// Lift a block, returning the subject to `Inactive`. Statuses other
    /// than `Blocked` are unchanged.
    fn unblock(&self, trust_mark_type: &str, sub: &EntityId) -> Result<(), StorageError>;

    /// Drop the record entirely, as if the subject was never seen.
    fn delete(&self, trust_mark_type: &str, sub: &EntityId) -> Result<(), StorageError>;

    /// All subjects with status `Active` for `trust_mark_type`, in
    /// lexicographic order.
    fn active_subjects(&self, trust_mark_type: &str) -> Result<Vec<EntityId>, StorageError>;

    /// All subjects with status `Pending` for `trust_mark_type`, in
    /// lexicographic order.
    fn pending_subjects(&self, trust_mark_type: &str) -> Result<Vec<EntityId>, StorageError>;
}

/// Registered subordinate entities.
pub trait SubordinateStore: Send + Sync {
    /// Insert or replace a subordinate registration.
    fn upsert(&self, info: &SubordinateInfo) -> Result<(), StorageError>;

    /// Look up one subordinate by entity id.
    fn get(&self, entity_id: &EntityId) -> Result<Option<SubordinateInfo>, StorageError>;

    /// Remove a subordinate registration.
    fn delete(&self, entity_id: &EntityId) -> Result<(), StorageError>;

    /// Entity ids of all `Active` subordinates, lexicographically
    /// ordered, optionally restricted to those declaring `entity_type`.
    /// `Pending` and `Blocked` registrations are not listed.
    fn ids(&self, entity_type: Option<&str>) -> Result<Vec<EntityId>, StorageError>;
}
