//! Request/response shapes and the field-mapping collaborator.
//!
//! The core never validates entities itself; it trusts what the mapping
//! collaborator hands back. [`FieldMapper`] is the default implementation of
//! that collaborator and owns the field rules: names are required with a
//! minimum length of 3 characters, age must fall in 1–200, and a missing
//! status on creation defaults to `Active`.

use crate::error::MappingError;
use crate::patient::{Patient, PatientId, PatientStatus};
use serde::{Deserialize, Serialize};

const MIN_NAME_LEN: usize = 3;
const AGE_RANGE: std::ops::RangeInclusive<u32> = 1..=200;

/// Input shape for creating a patient.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    /// Initial status; defaults to `Active` when absent.
    #[serde(default)]
    pub status: Option<PatientStatus>,
}

/// Partial update of patient fields.
///
/// Status is deliberately absent: it only moves through the soft-delete and
/// restore operations, never through a field update.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<u32>,
}

/// Output shape returned to callers, with the status rendered as its wire
/// string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientView {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub status: String,
}

/// Mapping collaborator: side-effect-free translation between external
/// shapes and the [`Patient`] entity.
pub trait PatientMapper: Send + Sync {
    /// Maps creation input to a new entity. The id is left at its zero value
    /// for storage to assign.
    fn map_new(&self, input: &NewPatient) -> Result<Patient, MappingError>;

    /// Applies a partial update onto an existing entity. Never touches id or
    /// status.
    fn map_update(
        &self,
        input: &PatientUpdate,
        patient: &mut Patient,
    ) -> Result<(), MappingError>;

    /// Maps an entity to its output shape.
    fn map_view(&self, patient: &Patient) -> PatientView;
}

/// Default field mapper enforcing the patient field rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldMapper;

impl FieldMapper {
    fn check_name(value: &str, field: &str, messages: &mut Vec<String>) {
        if value.trim().is_empty() {
            messages.push(format!("Enter your {field}"));
        } else if value.trim().len() < MIN_NAME_LEN {
            messages.push(format!(
                "{field} must be at least {MIN_NAME_LEN} characters"
            ));
        }
    }

    fn check_age(age: u32, messages: &mut Vec<String>) {
        if !AGE_RANGE.contains(&age) {
            messages.push("Age must be between 1 and 200".to_string());
        }
    }
}

impl PatientMapper for FieldMapper {
    fn map_new(&self, input: &NewPatient) -> Result<Patient, MappingError> {
        let mut messages = Vec::new();
        Self::check_name(&input.first_name, "first name", &mut messages);
        Self::check_name(&input.last_name, "last name", &mut messages);
        Self::check_age(input.age, &mut messages);

        if !messages.is_empty() {
            return Err(MappingError::Validation { messages });
        }

        Ok(Patient {
            id: 0,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            age: input.age,
            status: input.status.unwrap_or_default(),
        })
    }

    fn map_update(
        &self,
        input: &PatientUpdate,
        patient: &mut Patient,
    ) -> Result<(), MappingError> {
        let mut messages = Vec::new();
        if let Some(first_name) = &input.first_name {
            Self::check_name(first_name, "first name", &mut messages);
        }
        if let Some(last_name) = &input.last_name {
            Self::check_name(last_name, "last name", &mut messages);
        }
        if let Some(age) = input.age {
            Self::check_age(age, &mut messages);
        }

        if !messages.is_empty() {
            return Err(MappingError::Validation { messages });
        }

        if let Some(first_name) = &input.first_name {
            patient.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = &input.last_name {
            patient.last_name = last_name.trim().to_string();
        }
        if let Some(age) = input.age {
            patient.age = age;
        }

        Ok(())
    }

    fn map_view(&self, patient: &Patient) -> PatientView {
        PatientView {
            id: patient.id,
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            age: patient.age,
            status: patient.status.to_string(),
        }
    }
}
