//! # JSON File Backend
//!
//! A plain-text backend for small deployments: two JSON files under the
//! data directory (`trust_marks.json`, `subordinates.json`) that an
//! operator can inspect and edit while the server is stopped. All state
//! lives behind one mutex, so transitions are trivially atomic, and every
//! mutation rewrites the affected file through a temp-file rename.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use beacon_core::EntityId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::record::{AuthorizationRecord, Status, SubordinateInfo};
use crate::{SubordinateStore, TrustMarkStore};

const TRUST_MARKS_FILE: &str = "trust_marks.json";
const SUBORDINATES_FILE: &str = "subordinates.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrustMarkState {
    /// trust mark type -> subject -> record
    #[serde(default)]
    types: BTreeMap<String, BTreeMap<String, AuthorizationRecord>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SubordinateState {
    #[serde(default)]
    subordinates: BTreeMap<String, SubordinateInfo>,
}

#[derive(Debug, Default)]
struct FileState {
    trust_marks: TrustMarkState,
    subordinates: SubordinateState,
}

/// JSON file backend.
pub struct FileStore {
    data_dir: PathBuf,
    state: Mutex<FileState>,
}

impl FileStore {
    /// Open the backend, loading any existing state files from
    /// `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        let trust_marks = load_or_default(&data_dir.join(TRUST_MARKS_FILE))?;
        let subordinates = load_or_default(&data_dir.join(SUBORDINATES_FILE))?;
        Ok(Self {
            data_dir,
            state: Mutex::new(FileState {
                trust_marks,
                subordinates,
            }),
        })
    }

    fn persist_trust_marks(&self, state: &TrustMarkState) -> Result<(), StorageError> {
        write_atomically(&self.data_dir.join(TRUST_MARKS_FILE), state)
    }

    fn persist_subordinates(&self, state: &SubordinateState) -> Result<(), StorageError> {
        write_atomically(&self.data_dir.join(SUBORDINATES_FILE), state)
    }

    fn transition<F>(
        &self,
        trust_mark_type: &str,
        sub: &EntityId,
        f: F,
    ) -> Result<Status, StorageError>
    where
        F: FnOnce(Status) -> Result<Status, StorageError>,
    {
        let mut state = self.state.lock();
        let current = state
            .trust_marks
            .types
            .get(trust_mark_type)
            .and_then(|subjects| subjects.get(sub.as_str()))
            .map(|record| record.status)
            .unwrap_or_default();
        let next = f(current)?;
        if next != current {
            state
                .trust_marks
                .types
                .entry(trust_mark_type.to_string())
                .or_default()
                .insert(sub.as_str().to_string(), AuthorizationRecord::new(next));
            self.persist_trust_marks(&state.trust_marks)?;
        }
        Ok(next)
    }

    fn subjects_with_status(
        &self,
        trust_mark_type: &str,
        wanted: Status,
    ) -> Result<Vec<EntityId>, StorageError> {
        let state = self.state.lock();
        let Some(subjects) = state.trust_marks.types.get(trust_mark_type) else {
            return Ok(Vec::new());
        };
        subjects
            .iter()
            .filter(|(_, record)| record.status == wanted)
            .map(|(raw, _)| {
                EntityId::new(raw.clone())
                    .map_err(|e| StorageError::Backend(format!("corrupt subject key: {e}")))
            })
            .collect()
    }
}

impl TrustMarkStore for FileStore {
    fn status(&self, trust_mark_type: &str, sub: &EntityId) -> Result<Status, StorageError> {
        let state = self.state.lock();
        Ok(state
            .trust_marks
            .types
            .get(trust_mark_type)
            .and_then(|subjects| subjects.get(sub.as_str()))
            .map(|record| record.status)
            .unwrap_or_default())
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
        let mut state = self.state.lock();
        let removed = state
            .trust_marks
            .types
            .get_mut(trust_mark_type)
            .and_then(|subjects| subjects.remove(sub.as_str()))
            .is_some();
        if removed {
            self.persist_trust_marks(&state.trust_marks)?;
        }
        Ok(())
    }

    fn active_subjects(&self, trust_mark_type: &str) -> Result<Vec<EntityId>, StorageError> {
        self.subjects_with_status(trust_mark_type, Status::Active)
    }

    fn pending_subjects(&self, trust_mark_type: &str) -> Result<Vec<EntityId>, StorageError> {
        self.subjects_with_status(trust_mark_type, Status::Pending)
    }
}

impl SubordinateStore for FileStore {
    fn upsert(&self, info: &SubordinateInfo) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        state
            .subordinates
            .subordinates
            .insert(info.entity_id.as_str().to_string(), info.clone());
        self.persist_subordinates(&state.subordinates)
    }

    fn get(&self, entity_id: &EntityId) -> Result<Option<SubordinateInfo>, StorageError> {
        let state = self.state.lock();
        Ok(state.subordinates.subordinates.get(entity_id.as_str()).cloned())
    }

    fn delete(&self, entity_id: &EntityId) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        if state
            .subordinates
            .subordinates
            .remove(entity_id.as_str())
            .is_some()
        {
            self.persist_subordinates(&state.subordinates)?;
        }
        Ok(())
    }

    fn ids(&self, entity_type: Option<&str>) -> Result<Vec<EntityId>, StorageError> {
        let state = self.state.lock();
        Ok(state
            .subordinates
            .subordinates
            .values()
            .filter(|info| info.status.is_active())
            .filter(|info| match entity_type {
                Some(et) => info.entity_types.iter().any(|t| t == et),
                None => true,
            })
            .map(|info| info.entity_id.clone())
            .collect())
    }
}

fn load_or_default<T: Default + for<'de> Deserialize<'de>>(
    path: &Path,
) -> Result<T, StorageError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = fs::read(path)?;
    Ok(serde_json::from_slice(&raw)?)
}

fn write_atomically<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let payload = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TM: &str = "https://ta.example.org/tm/certified";

    fn sub(raw: &str) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let rp = sub("https://rp.example.org");
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.request(TM, &rp).unwrap();
            store.approve(TM, &rp).unwrap();
        }
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.status(TM, &rp).unwrap(), Status::Active);
        assert!(dir.path().join("trust_marks.json").exists());
    }

    #[test]
    fn listings_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        for raw in ["https://b.example.org", "https://a.example.org"] {
            store.approve(TM, &sub(raw)).unwrap();
        }
        let raw: Vec<String> = store
            .active_subjects(TM)
            .unwrap()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        assert_eq!(raw, ["https://a.example.org", "https://b.example.org"]);
    }

    #[test]
    fn pending_subordinates_survive_reopen_unlisted() {
        let dir = tempfile::tempdir().unwrap();
        let applicant = SubordinateInfo {
            entity_id: sub("https://applicant.example.org"),
            entity_types: vec!["openid_relying_party".to_string()],
            jwks: beacon_crypto::Jwks::default(),
            status: Status::Pending,
        };
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.upsert(&applicant).unwrap();
        }
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get(&applicant.entity_id).unwrap(), Some(applicant.clone()));
        assert!(store.ids(None).unwrap().is_empty());

        let mut approved = applicant.clone();
        approved.status = Status::Active;
        store.upsert(&approved).unwrap();
        assert_eq!(store.ids(None).unwrap(), vec![applicant.entity_id]);
    }

    #[test]
    fn blocked_subject_rejects_request() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let rp = sub("https://rp.example.org");
        store.block(TM, &rp).unwrap();
        assert!(matches!(
            store.request(TM, &rp),
            Err(StorageError::SubjectBlocked { .. })
        ));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Request,
        Approve,
        Block,
        Unblock,
        Delete,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Request),
            Just(Op::Approve),
            Just(Op::Block),
            Just(Op::Unblock),
            Just(Op::Delete),
        ]
    }

    /// Pure model of the state machine the store must agree with.
    fn model_step(status: Status, op: &Op) -> Status {
        match op {
            Op::Request => status.on_request().unwrap_or(status),
            Op::Approve => status.on_approve().unwrap_or(status),
            Op::Block => Status::Blocked,
            Op::Unblock => status.on_unblock(),
            Op::Delete => Status::Inactive,
        }
    }

    proptest! {
        #[test]
        fn store_agrees_with_state_machine_model(ops in prop::collection::vec(op_strategy(), 1..24)) {
            let dir = tempfile::tempdir().unwrap();
            let store = FileStore::open(dir.path()).unwrap();
            let rp = sub("https://rp.example.org");
            let mut expected = Status::Inactive;
            for op in &ops {
                match op {
                    Op::Request => { let _ = store.request(TM, &rp); }
                    Op::Approve => { let _ = store.approve(TM, &rp); }
                    Op::Block => store.block(TM, &rp).unwrap(),
                    Op::Unblock => store.unblock(TM, &rp).unwrap(),
                    Op::Delete => TrustMarkStore::delete(&store, TM, &rp).unwrap(),
                }
                expected = model_step(expected, op);
                prop_assert_eq!(store.status(TM, &rp).unwrap(), expected);
            }
        }
    }
}
