//! Persistence ports: patient repository, unit of work, and store entry
//! point.
//!
//! The repository owns the soft-delete visibility contract: filtered reads
//! treat `Deleted` records as absent, while the unfiltered lookup sees them.
//! Absence is always `Ok(None)` or a no-op, never an error — only genuine
//! storage failures surface as [`StoreError`](crate::StoreError).
//!
//! All mutations stage inside the owning unit of work and become durable
//! only when [`UnitOfWork::commit`] succeeds. Read-only operations never
//! commit.

use crate::error::StoreResult;
use crate::patient::{Patient, PatientId};
use async_trait::async_trait;

/// Persistence operations scoped to the patient entity.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Stages an insert. Storage assigns the id; the returned entity carries
    /// it. No status validation happens here — the caller sets the status.
    async fn add(&self, patient: Patient) -> StoreResult<Patient>;

    /// Filtered lookup: a soft-deleted record is treated as absent.
    async fn get_by_id(&self, id: PatientId) -> StoreResult<Option<Patient>>;

    /// Materialized snapshot of all records whose status is not `Deleted`.
    /// Order is storage-defined.
    async fn get_all_active(&self) -> StoreResult<Vec<Patient>>;

    /// Unfiltered lookup that bypasses the soft-delete visibility rule.
    /// Used only by the restore and permanent-delete paths.
    async fn get_including_deleted(&self, id: PatientId) -> StoreResult<Option<Patient>>;

    /// Stages `status = Deleted` when the record exists (deleted records
    /// included); no-op when the id is absent.
    async fn soft_delete(&self, id: PatientId) -> StoreResult<()>;

    /// Stages `status = Active` when the record exists and is currently
    /// `Deleted`; no-op otherwise.
    async fn restore(&self, id: PatientId) -> StoreResult<()>;

    /// Stages hard removal. Irreversible once committed.
    async fn delete(&self, id: PatientId) -> StoreResult<()>;

    /// Stages field changes to the existing record identified by
    /// `patient.id`; no-op when that id is absent.
    async fn update(&self, patient: &Patient) -> StoreResult<()>;
}

/// Transactional boundary grouping repository mutations into a single atomic
/// commit.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// The repository whose mutations this unit of work tracks.
    fn patients(&self) -> &dyn PatientRepository;

    /// Flushes all staged mutations to durable storage as one atomic
    /// transaction. A failed commit leaves storage unchanged.
    async fn commit(&self) -> StoreResult<()>;
}

/// Entry point to the persistence collaborator.
///
/// Each lifecycle operation runs against exactly one unit of work obtained
/// from here; units of work are never shared across operations.
#[async_trait]
pub trait Store: Send + Sync {
    type Uow: UnitOfWork;

    /// Opens a fresh unit of work over the current committed state.
    async fn begin(&self) -> StoreResult<Self::Uow>;
}
