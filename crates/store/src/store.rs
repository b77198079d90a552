//! JSON-document patient store with staged-commit units of work.
//!
//! ## Storage layout
//!
//! All records live in one document, `<data_dir>/patients.json`:
//!
//! ```text
//! {
//!   "next_id": 4,
//!   "patients": [ { "id": 1, ... }, { "id": 3, ... } ]
//! }
//! ```
//!
//! ## Commit discipline
//!
//! A unit of work starts from a snapshot of the committed state and records
//! every mutation (insert, field update, status change, hard delete) in a
//! per-id change set. Reads inside the unit of work see staged changes
//! through the working copy; nothing is durable before `commit()`.
//!
//! `commit()` applies the change set onto the *current* committed map under
//! the write lock, serialises the merged map to `patients.json.tmp`, and
//! renames it over the data file. The rename is the atomic publish point: a
//! failure anywhere before it leaves both the file and the committed
//! in-memory state untouched. Because only touched ids are merged,
//! overlapping units of work for different ids are independent; commits
//! racing on the same id are resolved by the commit lock, last commit wins.
//! Id assignment is taken from a shared counter so concurrent inserts never
//! collide.

use crate::config::StoreConfig;
use async_trait::async_trait;
use pmr_core::{
    Patient, PatientId, PatientRepository, PatientStatus, Store, StoreError, StoreResult,
    UnitOfWork,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// On-disk document shape.
#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    next_id: PatientId,
    patients: Vec<Patient>,
}

struct Shared {
    records: RwLock<BTreeMap<PatientId, Patient>>,
    next_id: AtomicU64,
    file: Option<PathBuf>,
}

/// Staged mutation for one id.
#[derive(Clone, Debug)]
enum Change {
    Upsert(Patient),
    Remove,
}

/// Snapshot the repository reads from, plus the change set the commit
/// applies. The change set holds at most one entry per id; a later mutation
/// of the same id supersedes the earlier one.
struct Work {
    records: BTreeMap<PatientId, Patient>,
    changes: BTreeMap<PatientId, Change>,
}

/// JSON-file-backed patient store.
///
/// Cheap to clone; all clones share the same committed state.
#[derive(Clone)]
pub struct JsonStore {
    shared: Arc<Shared>,
}

impl JsonStore {
    /// Opens the store over `<data_dir>/patients.json`, loading the existing
    /// document when present.
    pub async fn open(config: &StoreConfig) -> StoreResult<Self> {
        let path = config.patients_file();
        let (records, next_id) = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let document: StoreDocument =
                    serde_json::from_slice(&bytes).map_err(StoreError::Deserialization)?;
                let records: BTreeMap<PatientId, Patient> = document
                    .patients
                    .into_iter()
                    .map(|patient| (patient.id, patient))
                    .collect();
                (records, document.next_id)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => (BTreeMap::new(), 1),
            Err(err) => return Err(StoreError::Read(err)),
        };

        tracing::info!(records = records.len(), path = %path.display(), "patient store opened");
        Ok(Self {
            shared: Arc::new(Shared {
                records: RwLock::new(records),
                next_id: AtomicU64::new(next_id),
                file: Some(path),
            }),
        })
    }

    /// Opens a store with no backing file. Commits publish to the shared
    /// in-memory state only.
    pub fn in_memory() -> Self {
        Self {
            shared: Arc::new(Shared {
                records: RwLock::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
                file: None,
            }),
        }
    }
}

#[async_trait]
impl Store for JsonStore {
    type Uow = StoreUnitOfWork;

    async fn begin(&self) -> StoreResult<StoreUnitOfWork> {
        let snapshot = self.shared.records.read().await.clone();
        Ok(StoreUnitOfWork {
            shared: self.shared.clone(),
            work: Mutex::new(Work {
                records: snapshot,
                changes: BTreeMap::new(),
            }),
        })
    }
}

/// One unit of work over a snapshot of the committed state.
pub struct StoreUnitOfWork {
    shared: Arc<Shared>,
    work: Mutex<Work>,
}

#[async_trait]
impl PatientRepository for StoreUnitOfWork {
    async fn add(&self, mut patient: Patient) -> StoreResult<Patient> {
        patient.id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let mut work = self.work.lock().await;
        work.records.insert(patient.id, patient.clone());
        work.changes.insert(patient.id, Change::Upsert(patient.clone()));
        Ok(patient)
    }

    async fn get_by_id(&self, id: PatientId) -> StoreResult<Option<Patient>> {
        Ok(self
            .work
            .lock()
            .await
            .records
            .get(&id)
            .filter(|patient| !patient.status.is_deleted())
            .cloned())
    }

    async fn get_all_active(&self) -> StoreResult<Vec<Patient>> {
        Ok(self
            .work
            .lock()
            .await
            .records
            .values()
            .filter(|patient| !patient.status.is_deleted())
            .cloned()
            .collect())
    }

    async fn get_including_deleted(&self, id: PatientId) -> StoreResult<Option<Patient>> {
        Ok(self.work.lock().await.records.get(&id).cloned())
    }

    async fn soft_delete(&self, id: PatientId) -> StoreResult<()> {
        let mut work = self.work.lock().await;
        if let Some(patient) = work.records.get_mut(&id) {
            patient.status = PatientStatus::Deleted;
            let staged = patient.clone();
            work.changes.insert(id, Change::Upsert(staged));
        }
        Ok(())
    }

    async fn restore(&self, id: PatientId) -> StoreResult<()> {
        let mut work = self.work.lock().await;
        if let Some(patient) = work.records.get_mut(&id) {
            if patient.status.is_deleted() {
                patient.status = PatientStatus::Active;
                let staged = patient.clone();
                work.changes.insert(id, Change::Upsert(staged));
            }
        }
        Ok(())
    }

    async fn delete(&self, id: PatientId) -> StoreResult<()> {
        let mut work = self.work.lock().await;
        work.records.remove(&id);
        work.changes.insert(id, Change::Remove);
        Ok(())
    }

    async fn update(&self, patient: &Patient) -> StoreResult<()> {
        let mut work = self.work.lock().await;
        if work.records.contains_key(&patient.id) {
            work.records.insert(patient.id, patient.clone());
            work.changes.insert(patient.id, Change::Upsert(patient.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for StoreUnitOfWork {
    fn patients(&self) -> &dyn PatientRepository {
        self
    }

    async fn commit(&self) -> StoreResult<()> {
        let changes = self.work.lock().await.changes.clone();
        let mut committed = self.shared.records.write().await;

        // Merge only the touched ids onto the current committed map, so a
        // commit never publishes stale copies of records it did not stage.
        let mut merged = committed.clone();
        for (id, change) in &changes {
            match change {
                Change::Upsert(patient) => {
                    merged.insert(*id, patient.clone());
                }
                Change::Remove => {
                    merged.remove(id);
                }
            }
        }

        if let Some(path) = &self.shared.file {
            let document = StoreDocument {
                next_id: self.shared.next_id.load(Ordering::SeqCst),
                patients: merged.values().cloned().collect(),
            };
            let json =
                serde_json::to_vec_pretty(&document).map_err(StoreError::Serialization)?;

            // Atomic publish: the data file is only ever replaced whole.
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, &json)
                .await
                .map_err(StoreError::Write)?;
            tokio::fs::rename(&tmp, path)
                .await
                .map_err(StoreError::Write)?;
        }

        *committed = merged;
        tracing::debug!(
            records = committed.len(),
            staged = changes.len(),
            "patient store committed"
        );
        Ok(())
    }
}
