//! # Database Manager Module
//!
//! ## Purpose
//! Keeps the location of the metal surface database in one place instead of hardcoding
//! paths around the crate. The location is persisted in `database_config.json`.
//!
//! ## Architecture
//! - **DatabaseConfig**: Serializable configuration structure
//! - **DatabaseManager**: Core manager with path validation and persistence
//! - **Global Access**: Thread-safe singleton pattern with test isolation
//!
//! ## Configuration Format
//! ```json
//! {
//!   "database_directory": "database/surface",
//!   "metal_library_file": "metal.py"
//! }
//! ```
//!
//! ## Usage Patterns
//!
//! ### Read-only Access
//! ```rust
//! use KiSurf::library_manager::with_database_manager;
//!
//! let dir = with_database_manager(|manager| {
//!     manager.database_directory().to_string()
//! });
//! ```
//!
//! ### Mutable Access
//! ```rust, ignore
//! use KiSurf::library_manager::with_database_manager_mut;
//!
//! with_database_manager_mut(|manager| {
//!     manager.set_database_directory("my_database/surface")
//! })?;
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

/// default name of the configuration file
pub const CONFIG_FILE: &str = "database_config.json";

/// Where the metal database lives on disk.
///
/// # Fields
/// * `database_directory` - top-level folder of the metal database
/// * `metal_library_file` - file name of the surface library inside `<database_directory>/libraries`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub database_directory: String,
    pub metal_library_file: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_directory: "database/surface".to_string(),
            metal_library_file: "metal.py".to_string(),
        }
    }
}

/// Loads, validates and saves the database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    config: DatabaseConfig,
    config_file: String,
}

impl Default for DatabaseManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseManager {
    /// Reads `database_config.json` from the current directory, falling back to defaults.
    pub fn new() -> Self {
        Self::with_config_file(CONFIG_FILE)
    }

    /// Creates a manager backed by a custom configuration file.
    pub fn with_config_file(config_file: &str) -> Self {
        let config = match Self::load_config(config_file) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Could not read database config '{}': {}. Using defaults",
                    config_file,
                    e
                );
                DatabaseConfig::default()
            }
        };

        Self {
            config,
            config_file: config_file.to_string(),
        }
    }

    fn load_config(config_file: &str) -> Result<DatabaseConfig, Box<dyn std::error::Error>> {
        if Path::new(config_file).exists() {
            let content = fs::read_to_string(config_file)?;
            let config: DatabaseConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(DatabaseConfig::default())
        }
    }

    /// Writes the configuration to the config file. Does nothing during tests.
    pub fn save_config(&self) -> Result<(), Box<dyn std::error::Error>> {
        #[cfg(test)]
        {
            // keep the real config file untouched by tests
            return Ok(());
        }

        #[cfg(not(test))]
        {
            let content = serde_json::to_string_pretty(&self.config)?;
            fs::write(&self.config_file, content)?;
            Ok(())
        }
    }

    pub fn database_directory(&self) -> &str {
        &self.config.database_directory
    }

    pub fn metal_library_file(&self) -> &str {
        &self.config.metal_library_file
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Points the manager at another database directory, which must exist.
    pub fn set_database_directory(&mut self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        if Path::new(path).is_dir() {
            self.config.database_directory = path.to_string();
            self.save_config()?;
            Ok(())
        } else {
            Err(format!("Directory does not exist: {}", path).into())
        }
    }

    /// Changes the surface library file name; the file must exist in the current database.
    pub fn set_metal_library_file(&mut self, file: &str) -> Result<(), Box<dyn std::error::Error>> {
        let full = Path::new(&self.config.database_directory)
            .join("libraries")
            .join(file);
        if full.exists() {
            self.config.metal_library_file = file.to_string();
            self.save_config()?;
            Ok(())
        } else {
            Err(format!("File does not exist: {}", full.display()).into())
        }
    }

    pub fn get_config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.config = DatabaseConfig::default();
        self.save_config()?;
        Ok(())
    }
}

static GLOBAL_DATABASE_MANAGER: OnceLock<Mutex<DatabaseManager>> = OnceLock::new();

/// Guard to the global manager. A poisoned lock is recovered since the config holds
/// only plain strings.
pub fn get_database_manager() -> MutexGuard<'static, DatabaseManager> {
    GLOBAL_DATABASE_MANAGER
        .get_or_init(|| Mutex::new(DatabaseManager::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Executes a closure with read-only access to the global DatabaseManager.
pub fn with_database_manager<F, R>(f: F) -> R
where
    F: FnOnce(&DatabaseManager) -> R,
{
    let manager = get_database_manager();
    f(&manager)
}

/// Executes a closure with mutable access to the global DatabaseManager.
pub fn with_database_manager_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut DatabaseManager) -> R,
{
    let mut manager = get_database_manager();
    f(&mut manager)
}
