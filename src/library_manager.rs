//! # Mass Library Manager Module
//!
//! ## Purpose
//! Decides which atomic mass table the crate uses by default: the built-in periodic table or a
//! user JSON file (for example rounded masses used by a laboratory, or isotopically enriched
//! materials). The choice is persisted so every tool in the lab data pipeline agrees on it.
//!
//! ## Architecture
//! - **MassLibraryConfig**: Serializable configuration structure
//! - **LibraryManager**: Core manager with file validation and persistence
//! - **Global Access**: Thread-safe singleton guarded by `Mutex` inside `OnceLock`
//! - **Configuration File**: JSON-based persistent storage (mass_library_config.json)
//!
//! ## Configuration Format
//! ```json
//! {
//!   "source": "file",
//!   "mass_table_file": "lab_masses.json"
//! }
//! ```
//!
//! ## Usage Patterns
//!
//! ### Read-only Access
//! ```rust
//! use FabStoich::library_manager::{MassSource, with_library_manager};
//!
//! let source = with_library_manager(|manager| manager.get_config().source.clone());
//! assert_eq!(source, MassSource::Builtin);
//! ```
//!
//! Note that the process-wide default mass table (`default_mass_table`) is built once, so
//! switching the library affects it only in a new process.

use crate::Stoichiometry::atomic_masses::{CustomMassTable, MassTable, PeriodicTable};
use crate::Stoichiometry::errors::StoichError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

pub const DEFAULT_CONFIG_FILE: &str = "mass_library_config.json";

/// where atomic masses come from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassSource {
    #[default]
    Builtin,
    File,
}

/// Configuration of the atomic mass library.
///
/// # Fields
/// * `source` - built-in periodic table or a JSON file
/// * `mass_table_file` - path to the JSON mass table, used when `source` is `File`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MassLibraryConfig {
    pub source: MassSource,
    #[serde(default)]
    pub mass_table_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LibraryManager {
    config: MassLibraryConfig,
    config_file: String,
}

impl LibraryManager {
    /// Creates a new LibraryManager reading "mass_library_config.json" in the current
    /// directory. If the file doesn't exist or is invalid, uses default configuration.
    pub fn new() -> Self {
        Self::with_config_file(DEFAULT_CONFIG_FILE)
    }

    /// Creates a new LibraryManager with a custom configuration file path.
    pub fn with_config_file(config_file: &str) -> Self {
        let config = Self::load_config(config_file).unwrap_or_else(|e| {
            warn!("invalid mass library config '{}': {}, using defaults", config_file, e);
            MassLibraryConfig::default()
        });

        Self {
            config,
            config_file: config_file.to_string(),
        }
    }

    /// Loads configuration from a JSON file, default configuration if the file is absent
    fn load_config(config_file: &str) -> Result<MassLibraryConfig, StoichError> {
        if Path::new(config_file).exists() {
            let content = fs::read_to_string(config_file)?;
            let config: MassLibraryConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(MassLibraryConfig::default())
        }
    }

    /// Serializes the current configuration to the config file.
    pub fn save_config(&self) -> Result<(), StoichError> {
        let content = serde_json::to_string_pretty(&self.config)?;
        fs::write(&self.config_file, content)?;
        info!("mass library config saved to {}", self.config_file);
        Ok(())
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    pub fn get_config(&self) -> &MassLibraryConfig {
        &self.config
    }

    /// Switches to a JSON mass table.
    ///
    /// The file must exist and hold a valid table; the configuration is saved after the update.
    pub fn set_mass_table_file(&mut self, path: &str) -> Result<(), StoichError> {
        if !Path::new(path).exists() {
            return Err(StoichError::FileNotFound(path.to_string()));
        }
        CustomMassTable::from_json_file(path)?;
        self.config.source = MassSource::File;
        self.config.mass_table_file = Some(path.to_string());
        self.save_config()
    }

    /// Switches back to the built-in periodic table and saves the configuration.
    pub fn reset_to_defaults(&mut self) -> Result<(), StoichError> {
        self.config = MassLibraryConfig::default();
        self.save_config()
    }

    /// Builds the mass table described by the configuration
    pub fn load_mass_table(&self) -> Result<MassTable, StoichError> {
        match (&self.config.source, &self.config.mass_table_file) {
            (MassSource::Builtin, _) => Ok(MassTable::Builtin(PeriodicTable)),
            (MassSource::File, Some(path)) => {
                Ok(MassTable::Custom(CustomMassTable::from_json_file(path)?))
            }
            (MassSource::File, None) => {
                warn!("mass source is 'file' but no mass table file is configured, using built-in table");
                Ok(MassTable::Builtin(PeriodicTable))
            }
        }
    }
}

impl Default for LibraryManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Global singleton instance of LibraryManager using thread-safe OnceLock pattern
static GLOBAL_LIBRARY_MANAGER: OnceLock<Mutex<LibraryManager>> = OnceLock::new();

/// Returns a mutex guard to the global LibraryManager instance.
/// A poisoned lock is recovered.
pub fn get_library_manager() -> MutexGuard<'static, LibraryManager> {
    GLOBAL_LIBRARY_MANAGER
        .get_or_init(|| Mutex::new(LibraryManager::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Executes a closure with read-only access to the LibraryManager.
pub fn with_library_manager<F, R>(f: F) -> R
where
    F: FnOnce(&LibraryManager) -> R,
{
    let manager = get_library_manager();
    f(&*manager)
}

/// Executes a closure with mutable access to the LibraryManager.
///
/// # Example
/// ```rust,no_run
/// use FabStoich::library_manager::with_library_manager_mut;
/// with_library_manager_mut(|manager| manager.set_mass_table_file("lab_masses.json")).unwrap();
/// ```
pub fn with_library_manager_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut LibraryManager) -> R,
{
    let mut manager = get_library_manager();
    f(&mut *manager)
}
