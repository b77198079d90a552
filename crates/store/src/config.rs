//! Store runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the
//! store, so no environment variables are read during request handling.

use pmr_core::{StoreError, StoreResult};
use std::path::{Path, PathBuf};

const PATIENTS_FILE_NAME: &str = "patients.json";

/// Store configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    data_dir: PathBuf,
}

impl StoreConfig {
    /// Create a new `StoreConfig`. The data directory must already exist.
    pub fn new(data_dir: PathBuf) -> StoreResult<Self> {
        if !data_dir.is_dir() {
            return Err(StoreError::Config(format!(
                "data directory does not exist: {}",
                data_dir.display()
            )));
        }
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the JSON document holding all patient records.
    pub fn patients_file(&self) -> PathBuf {
        self.data_dir.join(PATIENTS_FILE_NAME)
    }
}
