//! # PMR Store
//!
//! Default persistence collaborator for the PMR patient lifecycle core.
//!
//! Implements the `Store` / `UnitOfWork` / `PatientRepository` ports from
//! `pmr-core` over a single JSON document on disk:
//! - Mutations stage inside a unit of work and become durable only on
//!   `commit()`
//! - Commits publish atomically by writing a temp file and renaming it over
//!   the data file
//! - An in-memory mode skips the file entirely for tests and embedding

pub mod config;
pub mod store;

pub use config::StoreConfig;
pub use store::{JsonStore, StoreUnitOfWork};
