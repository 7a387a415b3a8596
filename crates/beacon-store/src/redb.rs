//! # redb Backend
//!
//! The default embedded backend. One database file holds two tables:
//! authorization records keyed by `{trust_mark_type}\x1f{subject}` and
//! subordinate registrations keyed by entity id. The unit separator in
//! the composite key cannot occur in either component, so a half-open
//! range scan over `{trust_mark_type}\x1f` enumerates exactly one type's
//! subjects, already in lexicographic subject order.
//!
//! Lifecycle transitions run read and write inside a single write
//! transaction, which redb serializes, so concurrent transitions on the
//! same subject cannot interleave.

use std::path::Path;

use beacon_core::EntityId;
use redb::{Database, ReadableTable, TableDefinition};

use crate::error::StorageError;
use crate::record::{AuthorizationRecord, Status, SubordinateInfo};
use crate::{SubordinateStore, TrustMarkStore};

const AUTHORIZATIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("trust_mark_authorizations");
const SUBORDINATES: TableDefinition<&str, &[u8]> = TableDefinition::new("subordinates");

const KEY_SEPARATOR: char = '\u{1f}';

/// Embedded key-value backend over a single redb database file.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the database at `path` and ensure both tables
    /// exist, so first reads cannot fail on a fresh database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path)?;
        let txn = db.begin_write()?;
        txn.open_table(AUTHORIZATIONS)?;
        txn.open_table(SUBORDINATES)?;
        txn.commit()?;
        Ok(Self { db })
    }

    /// Apply `f` to the current status inside one write transaction and
    /// persist the result if it changed.
    fn transition<F>(
        &self,
        trust_mark_type: &str,
        sub: &EntityId,
        f: F,
    ) -> Result<Status, StorageError>
    where
        F: FnOnce(Status) -> Result<Status, StorageError>,
    {
        let txn = self.db.begin_write()?;
        let next = {
            let mut table = txn.open_table(AUTHORIZATIONS)?;
            let key = auth_key(trust_mark_type, sub);
            let current = match table.get(key.as_str())? {
                Some(value) => {
                    serde_json::from_slice::<AuthorizationRecord>(value.value())?.status
                }
                None => Status::Inactive,
            };
            let next = f(current)?;
            if next != current {
                let payload = serde_json::to_vec(&AuthorizationRecord::new(next))?;
                table.insert(key.as_str(), payload.as_slice())?;
            }
            next
        };
        txn.commit()?;
        Ok(next)
    }

    fn subjects_with_status(
        &self,
        trust_mark_type: &str,
        wanted: Status,
    ) -> Result<Vec<EntityId>, StorageError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(AUTHORIZATIONS)?;
        let start = format!("{trust_mark_type}{KEY_SEPARATOR}");
        let end = format!("{trust_mark_type}\u{20}");
        let mut subjects = Vec::new();
        for item in table.range(start.as_str()..end.as_str())? {
            let (key, value) = item?;
            let record: AuthorizationRecord = serde_json::from_slice(value.value())?;
            if record.status != wanted {
                continue;
            }
            let raw = key
                .value()
                .split_once(KEY_SEPARATOR)
                .map(|(_, sub)| sub.to_string())
                .ok_or_else(|| StorageError::Backend("malformed authorization key".to_string()))?;
            let id = EntityId::new(raw)
                .map_err(|e| StorageError::Backend(format!("corrupt subject key: {e}")))?;
            subjects.push(id);
        }
        Ok(subjects)
    }
}

impl TrustMarkStore for RedbStore {
    fn status(&self, trust_mark_type: &str, sub: &EntityId) -> Result<Status, StorageError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(AUTHORIZATIONS)?;
        match table.get(auth_key(trust_mark_type, sub).as_str())? {
            Some(value) => {
                Ok(serde_json::from_slice::<AuthorizationRecord>(value.value())?.status)
            }
            None => Ok(Status::Inactive),
        }
    }

    fn request(&self, trust_mark_type: &str, sub: &EntityId) -> Result<Status, StorageError> {
        self.transition(trust_mark_type, sub, |current| {
            current
                .on_request()
                .ok_or_else(|| StorageError::blocked(trust_mark_type, sub.as_str()))
        })
    }

    fn approve(&self, trust_mark_type: &str, sub: &EntityId) -> Result<(), StorageError> {
        self.transition(trust_mark_type, sub, |current| {
            current
                .on_approve()
                .ok_or_else(|| StorageError::blocked(trust_mark_type, sub.as_str()))
        })
        .map(|_| ())
    }

    fn block(&self, trust_mark_type: &str, sub: &EntityId) -> Result<(), StorageError> {
        self.transition(trust_mark_type, sub, |_| Ok(Status::Blocked))
            .map(|_| ())
    }

    fn unblock(&self, trust_mark_type: &str, sub: &EntityId) -> Result<(), StorageError> {
        self.transition(trust_mark_type, sub, |current| Ok(current.on_unblock()))
            .map(|_| ())
    }

    fn delete(&self, trust_mark_type: &str, sub: &EntityId) -> Result<(), StorageError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(AUTHORIZATIONS)?;
            table.remove(auth_key(trust_mark_type, sub).as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn active_subjects(&self, trust_mark_type: &str) -> Result<Vec<EntityId>, StorageError> {
        self.subjects_with_status(trust_mark_type, Status::Active)
    }

    fn pending_subjects(&self, trust_mark_type: &str) -> Result<Vec<EntityId>, StorageError> {
        self.subjects_with_status(trust_mark_type, Status::Pending)
    }
}

impl SubordinateStore for RedbStore {
    fn upsert(&self, info: &SubordinateInfo) -> Result<(), StorageError> {
        let payload = serde_json::to_vec(info)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SUBORDINATES)?;
            table.insert(info.entity_id.as_str(), payload.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn get(&self, entity_id: &EntityId) -> Result<Option<SubordinateInfo>, StorageError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SUBORDINATES)?;
        match table.get(entity_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn delete(&self, entity_id: &EntityId) -> Result<(), StorageError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SUBORDINATES)?;
            table.remove(entity_id.as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn ids(&self, entity_type: Option<&str>) -> Result<Vec<EntityId>, StorageError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SUBORDINATES)?;
        let mut ids = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            let info: SubordinateInfo = serde_json::from_slice(value.value())?;
            if !info.status.is_active() {
                continue;
            }
            if let Some(et) = entity_type {
                if !info.entity_types.iter().any(|t| t == et) {
                    continue;
                }
            }
            ids.push(info.entity_id);
        }
        Ok(ids)
    }
}

fn auth_key(trust_mark_type: &str, sub: &EntityId) -> String {
    format!("{trust_mark_type}{KEY_SEPARATOR}{}", sub.as_str())
}

impl From<redb::DatabaseError> for StorageError {
    fn from(e: redb::DatabaseError) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(e: redb::TransactionError) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<redb::TableError> for StorageError {
    fn from(e: redb::TableError) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(e: redb::StorageError) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(e: redb::CommitError) -> Self {
        StorageError::Backend(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_crypto::Jwks;

    fn store() -> (tempfile::TempDir, RedbStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("beacon.redb")).unwrap();
        (dir, store)
    }

    fn sub(raw: &str) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    const TM: &str = "https://ta.example.org/tm/certified";

    #[test]
    fn unknown_subject_is_inactive() {
        let (_dir, store) = store();
        let status = store.status(TM, &sub("https://rp.example.org")).unwrap();
        assert_eq!(status, Status::Inactive);
    }

    #[test]
    fn request_then_approve() {
        let (_dir, store) = store();
        let rp = sub("https://rp.example.org");
        assert_eq!(store.request(TM, &rp).unwrap(), Status::Pending);
        assert_eq!(store.request(TM, &rp).unwrap(), Status::Pending);
        store.approve(TM, &rp).unwrap();
        assert_eq!(store.status(TM, &rp).unwrap(), Status::Active);
        assert_eq!(store.request(TM, &rp).unwrap(), Status::Active);
    }

    #[test]
    fn blocked_subject_rejects_request_and_approve() {
        let (_dir, store) = store();
        let rp = sub("https://rp.example.org");
        store.block(TM, &rp).unwrap();
        assert!(matches!(
            store.request(TM, &rp),
            Err(StorageError::SubjectBlocked { .. })
        ));
        assert!(matches!(
            store.approve(TM, &rp),
            Err(StorageError::SubjectBlocked { .. })
        ));
        store.unblock(TM, &rp).unwrap();
        assert_eq!(store.status(TM, &rp).unwrap(), Status::Inactive);
    }

    #[test]
    fn active_listing_is_sorted_and_type_scoped() {
        let (_dir, store) = store();
        let other_type = "https://ta.example.org/tm/other";
        for raw in [
            "https://c.example.org",
            "https://a.example.org",
            "https://b.example.org",
        ] {
            store.approve(TM, &sub(raw)).unwrap();
        }
        store.approve(other_type, &sub("https://z.example.org")).unwrap();
        store.request(TM, &sub("https://d.example.org")).unwrap();

        let active = store.active_subjects(TM).unwrap();
        let raw: Vec<&str> = active.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            raw,
            [
                "https://a.example.org",
                "https://b.example.org",
                "https://c.example.org"
            ]
        );
        let pending = store.pending_subjects(TM).unwrap();
        assert_eq!(pending, vec![sub("https://d.example.org")]);
    }

    #[test]
    fn delete_resets_to_inactive() {
        let (_dir, store) = store();
        let rp = sub("https://rp.example.org");
        store.block(TM, &rp).unwrap();
        TrustMarkStore::delete(&store, TM, &rp).unwrap();
        assert_eq!(store.status(TM, &rp).unwrap(), Status::Inactive);
    }

    #[test]
    fn subordinate_roundtrip_and_filtering() {
        let (_dir, store) = store();
        let op = SubordinateInfo {
            entity_id: sub("https://op.example.org"),
            entity_types: vec!["openid_provider".to_string()],
            jwks: Jwks::default(),
            status: Status::Active,
        };
        let rp = SubordinateInfo {
            entity_id: sub("https://rp.example.org"),
            entity_types: vec!["openid_relying_party".to_string()],
            jwks: Jwks::default(),
            status: Status::Active,
        };
        store.upsert(&op).unwrap();
        store.upsert(&rp).unwrap();

        assert_eq!(store.get(&op.entity_id).unwrap(), Some(op.clone()));
        assert_eq!(
            store.ids(None).unwrap(),
            vec![op.entity_id.clone(), rp.entity_id.clone()]
        );
        assert_eq!(
            store.ids(Some("openid_provider")).unwrap(),
            vec![op.entity_id.clone()]
        );

        SubordinateStore::delete(&store, &op.entity_id).unwrap();
        assert_eq!(store.get(&op.entity_id).unwrap(), None);
    }

    #[test]
    fn non_active_subordinates_are_not_listed() {
        let (_dir, store) = store();
        let pending = SubordinateInfo {
            entity_id: sub("https://applicant.example.org"),
            entity_types: vec!["openid_relying_party".to_string()],
            jwks: Jwks::default(),
            status: Status::Pending,
        };
        let blocked = SubordinateInfo {
            entity_id: sub("https://banned.example.org"),
            entity_types: vec!["openid_relying_party".to_string()],
            jwks: Jwks::default(),
            status: Status::Blocked,
        };
        store.upsert(&pending).unwrap();
        store.upsert(&blocked).unwrap();

        assert!(store.ids(None).unwrap().is_empty());
        // the records themselves stay visible to direct lookups
        assert_eq!(store.get(&pending.entity_id).unwrap(), Some(pending.clone()));

        let mut approved = pending.clone();
        approved.status = Status::Active;
        store.upsert(&approved).unwrap();
        assert_eq!(store.ids(None).unwrap(), vec![pending.entity_id]);
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beacon.redb");
        let rp = sub("https://rp.example.org");
        {
            let store = RedbStore::open(&path).unwrap();
            store.approve(TM, &rp).unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.status(TM, &rp).unwrap(), Status::Active);
    }
}
