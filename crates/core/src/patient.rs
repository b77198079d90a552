//! Patient entity and status state machine.
//!
//! The status drives two things:
//! - **Visibility**: `Deleted` records are hidden from filtered reads and the
//!   active enumeration, but stay retrievable through the unfiltered lookup
//!   until permanently removed.
//! - **Transition legality**: any non-deleted status may move to `Deleted`
//!   (soft delete); only `Deleted` may move back, and restore always lands on
//!   `Active`. Permanent deletion removes the record outright and is terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage-assigned patient identifier.
pub type PatientId = u64;

/// Lifecycle status of a patient record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum PatientStatus {
    /// Patient is under active administration.
    #[default]
    Active,
    /// Patient is registered but not currently active.
    Inactive,
    /// Patient has been discharged.
    Discharged,
    /// Patient is soft-deleted: hidden from filtered reads, restorable.
    Deleted,
}

impl PatientStatus {
    /// Wire/display string for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            PatientStatus::Active => "Active",
            PatientStatus::Inactive => "Inactive",
            PatientStatus::Discharged => "Discharged",
            PatientStatus::Deleted => "Deleted",
        }
    }

    /// Parse from a wire string, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Some(PatientStatus::Active),
            "inactive" => Some(PatientStatus::Inactive),
            "discharged" => Some(PatientStatus::Discharged),
            "deleted" => Some(PatientStatus::Deleted),
            _ => None,
        }
    }

    /// Whether this status hides the record from filtered reads.
    pub fn is_deleted(self) -> bool {
        matches!(self, PatientStatus::Deleted)
    }

    /// Whether a restore transition is legal from this status.
    ///
    /// Restore is only legal from `Deleted`; it always lands on `Active`.
    pub fn can_restore(self) -> bool {
        self.is_deleted()
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Statuses serialise as their PascalCase wire strings but are accepted
// case-insensitively on the way in.
impl<'de> Deserialize<'de> for PatientStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        PatientStatus::parse(&value).ok_or_else(|| {
            serde::de::Error::unknown_variant(
                &value,
                &["Active", "Inactive", "Discharged", "Deleted"],
            )
        })
    }
}

/// A patient record.
///
/// Instances are owned by storage; the service layer only holds transient
/// references during a single operation. `id` is assigned by the store when
/// the record is added and is immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub status: PatientStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_round_trip() {
        for status in [
            PatientStatus::Active,
            PatientStatus::Inactive,
            PatientStatus::Discharged,
            PatientStatus::Deleted,
        ] {
            assert_eq!(PatientStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_parse_case_insensitive() {
        assert_eq!(PatientStatus::parse("active"), Some(PatientStatus::Active));
        assert_eq!(
            PatientStatus::parse("DISCHARGED"),
            Some(PatientStatus::Discharged)
        );
        assert_eq!(PatientStatus::parse("unknown"), None);
    }

    #[test]
    fn test_status_default_is_active() {
        assert_eq!(PatientStatus::default(), PatientStatus::Active);
    }

    #[test]
    fn test_only_deleted_is_restorable() {
        assert!(PatientStatus::Deleted.can_restore());
        assert!(!PatientStatus::Active.can_restore());
        assert!(!PatientStatus::Inactive.can_restore());
        assert!(!PatientStatus::Discharged.can_restore());
    }

    #[test]
    fn test_status_deserializes_case_insensitively() {
        let status: PatientStatus = serde_json::from_str("\"discharged\"").unwrap();
        assert_eq!(status, PatientStatus::Discharged);

        let status: PatientStatus = serde_json::from_str("\"Active\"").unwrap();
        assert_eq!(status, PatientStatus::Active);

        assert!(serde_json::from_str::<PatientStatus>("\"retired\"").is_err());
    }

    #[test]
    fn test_patient_json_round_trip() {
        let patient = Patient {
            id: 7,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            age: 36,
            status: PatientStatus::Active,
        };

        let json = serde_json::to_string(&patient).unwrap();
        let back: Patient = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patient);
        assert!(json.contains("\"Active\""));
    }
}
