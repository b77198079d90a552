//! Patient lifecycle service.
//!
//! Orchestrates repository calls into the public lifecycle operations and
//! translates domain outcomes into [`ExecutionResult`] envelopes. This is
//! the layer that enforces transition legality (the repository only enforces
//! visibility) and the only layer that turns absence into a `NotFound`
//! outcome.
//!
//! Every operation runs as one logical unit bounded by a single unit-of-work
//! commit. Storage failures are logged with full detail and reported to the
//! caller as a generic `ProcessingError`; nothing propagates past the
//! service contract.

use crate::dto::{NewPatient, PatientMapper, PatientUpdate, PatientView};
use crate::error::StoreError;
use crate::patient::PatientId;
use crate::repository::{Store, UnitOfWork};
use crate::result::ExecutionResult;
use std::sync::Arc;

/// Orchestrates the patient lifecycle operations against a store and a
/// mapping collaborator.
#[derive(Clone)]
pub struct PatientLifecycleService<S, M> {
    store: Arc<S>,
    mapper: M,
}

impl<S, M> PatientLifecycleService<S, M>
where
    S: Store,
    M: PatientMapper,
{
    pub fn new(store: Arc<S>, mapper: M) -> Self {
        Self { store, mapper }
    }

    fn storage_failure<T>(action: &str, err: &StoreError) -> ExecutionResult<T> {
        tracing::error!(error = %err, action, "storage failure");
        ExecutionResult::processing_error(format!("An error occurred while {action}."))
    }

    /// Creates a patient and returns the created record with its assigned id.
    ///
    /// Mapping failures are reported as `ValidationError`; the initial status
    /// is whatever the mapper produced (default `Active`).
    pub async fn create_patient(&self, input: NewPatient) -> ExecutionResult<PatientView> {
        const ACTION: &str = "creating the patient";

        let patient = match self.mapper.map_new(&input) {
            Ok(patient) => patient,
            Err(err) => {
                tracing::warn!(error = %err, "patient input rejected by mapping");
                return ExecutionResult::validation_error(err.into_messages());
            }
        };

        let uow = match self.store.begin().await {
            Ok(uow) => uow,
            Err(err) => return Self::storage_failure(ACTION, &err),
        };
        let created = match uow.patients().add(patient).await {
            Ok(created) => created,
            Err(err) => return Self::storage_failure(ACTION, &err),
        };
        if let Err(err) = uow.commit().await {
            return Self::storage_failure(ACTION, &err);
        }

        tracing::info!(patient_id = created.id, "patient created");
        ExecutionResult::success(
            self.mapper.map_view(&created),
            "Patient created successfully.",
        )
    }

    /// Looks a patient up through the visibility-filtered read.
    pub async fn get_patient_by_id(&self, id: PatientId) -> ExecutionResult<PatientView> {
        const ACTION: &str = "retrieving the patient";

        let uow = match self.store.begin().await {
            Ok(uow) => uow,
            Err(err) => return Self::storage_failure(ACTION, &err),
        };
        match uow.patients().get_by_id(id).await {
            Ok(Some(patient)) => {
                tracing::info!(patient_id = id, "patient retrieved");
                ExecutionResult::success(
                    self.mapper.map_view(&patient),
                    "Patient retrieved successfully.",
                )
            }
            Ok(None) => {
                tracing::warn!(patient_id = id, "patient not found");
                ExecutionResult::not_found(format!("Patient with ID {id} not found."))
            }
            Err(err) => Self::storage_failure(ACTION, &err),
        }
    }

    /// Returns all currently-visible (non-deleted) patients. An empty
    /// collection is a normal `Ok` outcome, not an error.
    pub async fn get_all_patients(&self) -> ExecutionResult<Vec<PatientView>> {
        const ACTION: &str = "retrieving all patients";

        let uow = match self.store.begin().await {
            Ok(uow) => uow,
            Err(err) => return Self::storage_failure(ACTION, &err),
        };
        match uow.patients().get_all_active().await {
            Ok(patients) => {
                tracing::info!(count = patients.len(), "patients retrieved");
                let views = patients
                    .iter()
                    .map(|patient| self.mapper.map_view(patient))
                    .collect();
                ExecutionResult::success(views, "Patients retrieved successfully.")
            }
            Err(err) => Self::storage_failure(ACTION, &err),
        }
    }

    /// Applies field changes to an existing, visible patient.
    ///
    /// Status is never mutated through this path; only the soft-delete and
    /// restore operations move it.
    pub async fn update_patient(
        &self,
        id: PatientId,
        input: PatientUpdate,
    ) -> ExecutionResult<PatientView> {
        const ACTION: &str = "updating the patient";

        let uow = match self.store.begin().await {
            Ok(uow) => uow,
            Err(err) => return Self::storage_failure(ACTION, &err),
        };
        let mut patient = match uow.patients().get_by_id(id).await {
            Ok(Some(patient)) => patient,
            Ok(None) => {
                tracing::warn!(patient_id = id, "patient not found");
                return ExecutionResult::not_found(format!("Patient with ID {id} not found."));
            }
            Err(err) => return Self::storage_failure(ACTION, &err),
        };

        if let Err(err) = self.mapper.map_update(&input, &mut patient) {
            tracing::warn!(error = %err, patient_id = id, "patient update rejected by mapping");
            return ExecutionResult::validation_error(err.into_messages());
        }

        if let Err(err) = uow.patients().update(&patient).await {
            return Self::storage_failure(ACTION, &err);
        }
        if let Err(err) = uow.commit().await {
            return Self::storage_failure(ACTION, &err);
        }

        tracing::info!(patient_id = id, "patient updated");
        ExecutionResult::success(
            self.mapper.map_view(&patient),
            "Patient updated successfully.",
        )
    }

    /// Soft-deletes a visible patient, hiding it from filtered reads while
    /// keeping it restorable.
    pub async fn delete_patient(&self, id: PatientId) -> ExecutionResult<bool> {
        const ACTION: &str = "soft deleting the patient";

        let uow = match self.store.begin().await {
            Ok(uow) => uow,
            Err(err) => return Self::storage_failure(ACTION, &err),
        };
        match uow.patients().get_by_id(id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(patient_id = id, "patient not found");
                return ExecutionResult::not_found(format!("Patient with ID {id} not found."));
            }
            Err(err) => return Self::storage_failure(ACTION, &err),
        }

        if let Err(err) = uow.patients().soft_delete(id).await {
            return Self::storage_failure(ACTION, &err);
        }
        if let Err(err) = uow.commit().await {
            return Self::storage_failure(ACTION, &err);
        }

        tracing::info!(patient_id = id, "patient soft deleted");
        ExecutionResult::success(true, "Patient soft deleted successfully.")
    }

    /// Restores a soft-deleted patient back to `Active`.
    ///
    /// Restore is only legal from the `Deleted` status. A missing id and a
    /// record in any other status report the same `NotFound` outcome; that
    /// collapse is part of the compatibility contract.
    pub async fn restore_patient(&self, id: PatientId) -> ExecutionResult<bool> {
        const ACTION: &str = "restoring the patient";

        let uow = match self.store.begin().await {
            Ok(uow) => uow,
            Err(err) => return Self::storage_failure(ACTION, &err),
        };
        match uow.patients().get_including_deleted(id).await {
            Ok(Some(patient)) if patient.status.can_restore() => {}
            Ok(_) => {
                tracing::warn!(patient_id = id, "patient not found or not deleted");
                return ExecutionResult::not_found(format!(
                    "Patient with ID {id} not found or not deleted."
                ));
            }
            Err(err) => return Self::storage_failure(ACTION, &err),
        }

        if let Err(err) = uow.patients().restore(id).await {
            return Self::storage_failure(ACTION, &err);
        }
        if let Err(err) = uow.commit().await {
            return Self::storage_failure(ACTION, &err);
        }

        tracing::info!(patient_id = id, "patient restored");
        ExecutionResult::success(true, "Patient restored successfully.")
    }

    /// Hard-removes a patient from storage. Legal from any status, including
    /// `Deleted`, and irreversible.
    pub async fn permanently_delete_patient(&self, id: PatientId) -> ExecutionResult<bool> {
        const ACTION: &str = "permanently deleting the patient";

        let uow = match self.store.begin().await {
            Ok(uow) => uow,
            Err(err) => return Self::storage_failure(ACTION, &err),
        };
        match uow.patients().get_including_deleted(id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(patient_id = id, "patient not found");
                return ExecutionResult::not_found(format!("Patient with ID {id} not found."));
            }
            Err(err) => return Self::storage_failure(ACTION, &err),
        }

        if let Err(err) = uow.patients().delete(id).await {
            return Self::storage_failure(ACTION, &err);
        }
        if let Err(err) = uow.commit().await {
            return Self::storage_failure(ACTION, &err);
        }

        tracing::info!(patient_id = id, "patient permanently deleted");
        ExecutionResult::success(true, "Patient permanently deleted.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::FieldMapper;
    use crate::error::StoreResult;
    use crate::patient::{Patient, PatientStatus};
    use crate::repository::PatientRepository;
    use crate::result::ResponseCode;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// In-memory fake store. Mutations apply directly to the shared map so
    /// that service-level behaviour can be asserted without a real backend;
    /// `commit` is a no-op unless failure is injected.
    struct MemStore {
        records: Arc<Mutex<BTreeMap<PatientId, Patient>>>,
        next_id: Arc<AtomicU64>,
        fail_commit: bool,
    }

    impl MemStore {
        fn new() -> Self {
            Self {
                records: Arc::new(Mutex::new(BTreeMap::new())),
                next_id: Arc::new(AtomicU64::new(1)),
                fail_commit: false,
            }
        }

        fn failing_commit() -> Self {
            Self {
                fail_commit: true,
                ..Self::new()
            }
        }
    }

    struct MemUow {
        records: Arc<Mutex<BTreeMap<PatientId, Patient>>>,
        next_id: Arc<AtomicU64>,
        fail_commit: bool,
    }

    #[async_trait]
    impl Store for MemStore {
        type Uow = MemUow;

        async fn begin(&self) -> StoreResult<MemUow> {
            Ok(MemUow {
                records: self.records.clone(),
                next_id: self.next_id.clone(),
                fail_commit: self.fail_commit,
            })
        }
    }

    #[async_trait]
    impl PatientRepository for MemUow {
        async fn add(&self, mut patient: Patient) -> StoreResult<Patient> {
            patient.id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.records
                .lock()
                .unwrap()
                .insert(patient.id, patient.clone());
            Ok(patient)
        }

        async fn get_by_id(&self, id: PatientId) -> StoreResult<Option<Patient>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .get(&id)
                .filter(|patient| !patient.status.is_deleted())
                .cloned())
        }

        async fn get_all_active(&self) -> StoreResult<Vec<Patient>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .values()
                .filter(|patient| !patient.status.is_deleted())
                .cloned()
                .collect())
        }

        async fn get_including_deleted(&self, id: PatientId) -> StoreResult<Option<Patient>> {
            Ok(self.records.lock().unwrap().get(&id).cloned())
        }

        async fn soft_delete(&self, id: PatientId) -> StoreResult<()> {
            if let Some(patient) = self.records.lock().unwrap().get_mut(&id) {
                patient.status = PatientStatus::Deleted;
            }
            Ok(())
        }

        async fn restore(&self, id: PatientId) -> StoreResult<()> {
            if let Some(patient) = self.records.lock().unwrap().get_mut(&id) {
                if patient.status.is_deleted() {
                    patient.status = PatientStatus::Active;
                }
            }
            Ok(())
        }

        async fn delete(&self, id: PatientId) -> StoreResult<()> {
            self.records.lock().unwrap().remove(&id);
            Ok(())
        }

        async fn update(&self, patient: &Patient) -> StoreResult<()> {
            let mut records = self.records.lock().unwrap();
            if records.contains_key(&patient.id) {
                records.insert(patient.id, patient.clone());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl UnitOfWork for MemUow {
        fn patients(&self) -> &dyn PatientRepository {
            self
        }

        async fn commit(&self) -> StoreResult<()> {
            if self.fail_commit {
                return Err(StoreError::Commit("injected commit failure".into()));
            }
            Ok(())
        }
    }

    fn service(store: MemStore) -> PatientLifecycleService<MemStore, FieldMapper> {
        PatientLifecycleService::new(Arc::new(store), FieldMapper)
    }

    fn ada() -> NewPatient {
        NewPatient {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            age: 36,
            status: Some(PatientStatus::Active),
        }
    }

    fn named(first_name: &str, status: Option<PatientStatus>) -> NewPatient {
        NewPatient {
            first_name: first_name.into(),
            last_name: "Lovelace".into(),
            age: 36,
            status,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let svc = service(MemStore::new());

        let created = svc.create_patient(ada()).await;
        assert!(created.is_ok());
        let created = created.into_result().unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.status, "Active");

        let fetched = svc.get_patient_by_id(created.id).await;
        assert!(fetched.is_ok());
        assert_eq!(fetched.into_result().unwrap(), created);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let svc = service(MemStore::new());
        let mut input = ada();
        input.first_name = "".into();
        input.age = 0;

        let res = svc.create_patient(input).await;
        assert_eq!(res.code, ResponseCode::ValidationError);
        assert_eq!(res.validation_messages.len(), 2);
        assert!(res.result.is_none());

        // Nothing was persisted.
        let all = svc.get_all_patients().await.into_result().unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_returns_not_found_everywhere() {
        let svc = service(MemStore::new());
        let missing = 99;

        assert_eq!(
            svc.get_patient_by_id(missing).await.code,
            ResponseCode::NotFound
        );
        assert_eq!(
            svc.update_patient(missing, PatientUpdate::default())
                .await
                .code,
            ResponseCode::NotFound
        );
        assert_eq!(
            svc.delete_patient(missing).await.code,
            ResponseCode::NotFound
        );
        assert_eq!(
            svc.restore_patient(missing).await.code,
            ResponseCode::NotFound
        );
        assert_eq!(
            svc.permanently_delete_patient(missing).await.code,
            ResponseCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_soft_delete_hides_patient_from_filtered_reads() {
        let svc = service(MemStore::new());
        let id = svc.create_patient(ada()).await.into_result().unwrap().id;

        let deleted = svc.delete_patient(id).await;
        assert!(deleted.is_ok());
        assert_eq!(deleted.into_result(), Some(true));

        assert_eq!(svc.get_patient_by_id(id).await.code, ResponseCode::NotFound);
        let all = svc.get_all_patients().await.into_result().unwrap();
        assert!(all.iter().all(|view| view.id != id));
    }

    #[tokio::test]
    async fn test_second_soft_delete_returns_not_found() {
        let svc = service(MemStore::new());
        let id = svc.create_patient(ada()).await.into_result().unwrap().id;

        assert!(svc.delete_patient(id).await.is_ok());
        // The first delete already hid the record from filtered reads.
        assert_eq!(svc.delete_patient(id).await.code, ResponseCode::NotFound);

        // But restore still sees it and brings it back to Active.
        assert!(svc.restore_patient(id).await.is_ok());
        let fetched = svc.get_patient_by_id(id).await.into_result().unwrap();
        assert_eq!(fetched.status, "Active");
    }

    #[tokio::test]
    async fn test_restore_is_only_legal_from_deleted() {
        let svc = service(MemStore::new());
        for status in [
            PatientStatus::Active,
            PatientStatus::Inactive,
            PatientStatus::Discharged,
        ] {
            let id = svc
                .create_patient(named("Ada", Some(status)))
                .await
                .into_result()
                .unwrap()
                .id;

            let res = svc.restore_patient(id).await;
            assert_eq!(res.code, ResponseCode::NotFound);

            // Status unchanged.
            let view = svc.get_patient_by_id(id).await.into_result().unwrap();
            assert_eq!(view.status, status.to_string());
        }
    }

    #[tokio::test]
    async fn test_restore_lands_on_active_not_prior_status() {
        let svc = service(MemStore::new());
        let id = svc
            .create_patient(named("Ada", Some(PatientStatus::Discharged)))
            .await
            .into_result()
            .unwrap()
            .id;

        assert!(svc.delete_patient(id).await.is_ok());
        assert!(svc.restore_patient(id).await.is_ok());

        let view = svc.get_patient_by_id(id).await.into_result().unwrap();
        assert_eq!(view.status, "Active");
    }

    #[tokio::test]
    async fn test_permanent_delete_is_terminal() {
        let svc = service(MemStore::new());
        let id = svc.create_patient(ada()).await.into_result().unwrap().id;

        let res = svc.permanently_delete_patient(id).await;
        assert_eq!(res.into_result(), Some(true));

        assert_eq!(svc.get_patient_by_id(id).await.code, ResponseCode::NotFound);
        assert_eq!(svc.restore_patient(id).await.code, ResponseCode::NotFound);
        assert_eq!(
            svc.permanently_delete_patient(id).await.code,
            ResponseCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_permanent_delete_is_legal_from_deleted() {
        let svc = service(MemStore::new());
        let id = svc.create_patient(ada()).await.into_result().unwrap().id;

        assert!(svc.delete_patient(id).await.is_ok());
        assert!(svc.permanently_delete_patient(id).await.is_ok());
        assert_eq!(svc.restore_patient(id).await.code, ResponseCode::NotFound);
    }

    #[tokio::test]
    async fn test_get_all_excludes_deleted_across_mixed_statuses() {
        let svc = service(MemStore::new());
        let active = svc
            .create_patient(named("Ada", Some(PatientStatus::Active)))
            .await
            .into_result()
            .unwrap()
            .id;
        let inactive = svc
            .create_patient(named("Bob", Some(PatientStatus::Inactive)))
            .await
            .into_result()
            .unwrap()
            .id;
        let discharged = svc
            .create_patient(named("Cyd", Some(PatientStatus::Discharged)))
            .await
            .into_result()
            .unwrap()
            .id;
        let deleted = svc
            .create_patient(named("Dee", Some(PatientStatus::Active)))
            .await
            .into_result()
            .unwrap()
            .id;
        assert!(svc.delete_patient(deleted).await.is_ok());

        let all = svc.get_all_patients().await.into_result().unwrap();
        let ids: Vec<_> = all.iter().map(|view| view.id).collect();
        assert_eq!(ids, vec![active, inactive, discharged]);
    }

    #[tokio::test]
    async fn test_get_all_empty_is_ok() {
        let svc = service(MemStore::new());
        let res = svc.get_all_patients().await;
        assert!(res.is_ok());
        assert!(res.into_result().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_fields_but_never_status() {
        let svc = service(MemStore::new());
        let id = svc
            .create_patient(named("Ada", Some(PatientStatus::Inactive)))
            .await
            .into_result()
            .unwrap()
            .id;

        let update = PatientUpdate {
            first_name: None,
            last_name: Some("Byron".into()),
            age: Some(37),
        };
        let updated = svc.update_patient(id, update).await.into_result().unwrap();
        assert_eq!(updated.last_name, "Byron");
        assert_eq!(updated.age, 37);
        assert_eq!(updated.status, "Inactive");
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_fields() {
        let svc = service(MemStore::new());
        let id = svc.create_patient(ada()).await.into_result().unwrap().id;

        let update = PatientUpdate {
            first_name: Some("X".into()),
            last_name: None,
            age: None,
        };
        let res = svc.update_patient(id, update).await;
        assert_eq!(res.code, ResponseCode::ValidationError);

        let view = svc.get_patient_by_id(id).await.into_result().unwrap();
        assert_eq!(view.first_name, "Ada");
    }

    #[tokio::test]
    async fn test_commit_failure_is_reported_as_processing_error() {
        let svc = service(MemStore::failing_commit());

        let res = svc.create_patient(ada()).await;
        assert_eq!(res.code, ResponseCode::ProcessingError);
        // Generic message only; no internal detail leaks to the caller.
        assert!(!res.message.as_deref().unwrap().contains("injected"));
    }
}
