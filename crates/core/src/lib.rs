//! # PMR Core
//!
//! Core business logic for the PMR patient lifecycle system.
//!
//! This crate contains the patient domain and the contracts it places on its
//! collaborators:
//! - The [`Patient`] entity and its status state machine
//! - The [`ExecutionResult`] envelope used to report every outcome
//! - The [`PatientRepository`] / [`UnitOfWork`] persistence ports
//! - The [`PatientMapper`] field-mapping port with a default implementation
//! - The [`PatientLifecycleService`] orchestrating the lifecycle operations
//!
//! **No transport concerns**: HTTP/gRPC servers, routing, and authentication
//! belong to surrounding layers. Persistence lives behind the ports in
//! [`repository`]; the `pmr-store` crate provides the default implementation.

pub mod dto;
pub mod error;
pub mod patient;
pub mod repository;
pub mod result;
pub mod service;

pub use dto::{FieldMapper, NewPatient, PatientMapper, PatientUpdate, PatientView};
pub use error::{MappingError, StoreError, StoreResult};
pub use patient::{Patient, PatientId, PatientStatus};
pub use repository::{PatientRepository, Store, UnitOfWork};
pub use result::{ExecutionResult, ResponseCode};
pub use service::PatientLifecycleService;
