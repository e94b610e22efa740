//! Loading configuration documents from a config directory.
//!
//! Layout:
//!
//! ```text
//! configs/
//!   global.yml
//!   dev.yml
//!   staging.yml
//!   prod.yml
//! ```

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::EnvironmentName;

use crate::document::{EnvironmentDocument, GlobalDocument};
use crate::model::{EnvironmentConfig, GlobalConfig};
use crate::validator;

/// File name of the global document.
pub const GLOBAL_FILE: &str = "global.yml";

/// Reads and validates documents from one config directory.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a loader rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the config directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of an environment's document.
    #[must_use]
    pub fn environment_path(&self, name: EnvironmentName) -> PathBuf {
        self.dir.join(format!("{name}.yml"))
    }

    /// Loads and validates the global document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load_global(&self) -> Result<GlobalConfig> {
        let doc: GlobalDocument = read_document(&self.dir.join(GLOBAL_FILE))?;
        validator::validate_global(doc)
    }

    /// Loads and validates one environment's document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load_environment(&self, name: EnvironmentName) -> Result<EnvironmentConfig> {
        let doc: EnvironmentDocument = read_document(&self.environment_path(name))?;
        validator::validate_environment(name, doc)
    }

    /// Loads every named environment, in the given order.
    ///
    /// # Errors
    ///
    /// Returns the first load or validation error.
    pub fn load_environments(&self, names: &[EnvironmentName]) -> Result<Vec<EnvironmentConfig>> {
        names.iter().map(|&name| self.load_environment(name)).collect()
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    tracing::debug!(path = %path.display(), "reading config document");

    let content = std::fs::read_to_string(path).map_err(|e| StackwrightError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_yaml::from_str(&content).map_err(|e| StackwrightError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
