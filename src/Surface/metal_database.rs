//! # Metal Database Module
//!
//! ## Purpose
//! Top-level access point to the metal surface data. The database owns one library under
//! the fixed key `"surface"` and forwards all lookups to it. On disk it is a directory:
//!
//! ```text
//! <path>/libraries/metal.py
//! ```
//!
//! ## Key Methods
//! - `load()` / `save()` / `save_libraries()`: directory-level I/O
//! - `get_binding_energies()`, `get_surface_site_density()`: exact lookup by label
//! - `get_all_entries_on_metal()`: every facet of one metal
//! - `find_binding_energies()`: best-effort resolution of a user string such as "Pt111"
//!   or "Pt" into unit-checked energies
//!
//! ## Note on `find_binding_energies`
//! When a metal has several facets in the database and the query does not pin one down,
//! the entry with the lowest index is used. The energies are not averaged over facets.
use super::DatabaseError;
use super::metal_library::MetalLibrary;
use super::quantity::{Energy, RawQuantity};
use crate::library_manager::with_database_manager;
use log::{info, warn};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// key of the only library in the database
pub const SURFACE_LIBRARY: &str = "surface";
/// directory below the database root holding the library files
pub const LIBRARIES_DIR: &str = "libraries";
/// file name of the surface library
pub const METAL_LIBRARY_FILE: &str = "metal.py";

fn facet_regex() -> &'static Regex {
    static FACET: OnceLock<Regex> = OnceLock::new();
    FACET.get_or_init(|| Regex::new(r"\d+").expect("valid facet regex"))
}

#[derive(Debug, Clone)]
pub struct MetalDatabase {
    /// always holds the `"surface"` library
    libraries: HashMap<String, MetalLibrary>,
    /// file name used for the surface library on load and save
    pub metal_library_file: String,
}

impl Default for MetalDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MetalDatabase {
    pub fn new() -> Self {
        let mut libraries = HashMap::new();
        libraries.insert(
            SURFACE_LIBRARY.to_string(),
            MetalLibrary::new(SURFACE_LIBRARY),
        );
        Self {
            libraries,
            metal_library_file: METAL_LIBRARY_FILE.to_string(),
        }
    }

    pub fn surface(&self) -> &MetalLibrary {
        // inserted in new(); the map is private and nothing removes it
        &self.libraries[SURFACE_LIBRARY]
    }

    pub fn surface_mut(&mut self) -> &mut MetalLibrary {
        self.libraries
            .entry(SURFACE_LIBRARY.to_string())
            .or_insert_with(|| MetalLibrary::new(SURFACE_LIBRARY))
    }

    fn library_file_name(&self, library: &str) -> String {
        if library == SURFACE_LIBRARY {
            self.metal_library_file.clone()
        } else {
            format!("{}.py", library)
        }
    }

    /// Load the database from `path`, the top-level folder of the metal database.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), DatabaseError> {
        let path = path.as_ref();
        let file = path
            .join(LIBRARIES_DIR)
            .join(self.library_file_name(SURFACE_LIBRARY));
        self.surface_mut().load(file)
    }

    /// Load from the directory and file name stored in the database configuration.
    pub fn load_default(&mut self) -> Result<(), DatabaseError> {
        let (directory, file) = with_database_manager(|manager| {
            (
                manager.database_directory().to_string(),
                manager.metal_library_file().to_string(),
            )
        });
        info!("Loading metal database from configured directory '{}'", directory);
        self.metal_library_file = file;
        self.load(directory)
    }

    pub fn get_binding_energies(
        &self,
        metal_label: &str,
    ) -> Result<&BTreeMap<String, RawQuantity>, DatabaseError> {
        self.surface().get_binding_energies(metal_label)
    }

    pub fn get_surface_site_density(
        &self,
        metal_label: &str,
    ) -> Result<Option<&RawQuantity>, DatabaseError> {
        self.surface().get_surface_site_density(metal_label)
    }

    /// Labels of all entries on a certain metal, on any facet.
    pub fn get_all_entries_on_metal(&self, metal: &str) -> Result<Vec<String>, DatabaseError> {
        self.surface().get_all_entries_on_metal(metal)
    }

    /// Tries to find a match for a metal and/or facet ("Pt111", "Pt") and returns its
    /// binding energies converted to `Energy`.
    pub fn find_binding_energies(
        &self,
        metal: &str,
    ) -> Result<BTreeMap<String, Energy>, DatabaseError> {
        let query = metal.trim();
        if query.is_empty() {
            return Err(DatabaseError::InvalidQuery(
                "Cannot search for nothing.".to_string(),
            ));
        }

        let mut found = None;
        let mut bare_metal = query;
        if let Some(facet) = facet_regex().find(query) {
            match self.surface().get_binding_energies(query) {
                Ok(energies) => found = Some(energies),
                Err(e) => {
                    warn!(
                        "No entry labelled '{}' ({}); searching all facets of the metal instead",
                        query, e
                    );
                    bare_metal = query[..facet.start()].trim();
                }
            }
        }
        if found.is_none() && bare_metal.is_empty() {
            return Err(DatabaseError::InvalidQuery(format!(
                "'{}' names a facet but no metal",
                query
            )));
        }

        let energies = match found {
            Some(energies) => energies,
            None => {
                let matches = self.surface().get_all_entries_on_metal(bare_metal)?;
                if matches.len() > 1 {
                    warn!(
                        "Metal '{}' has {} entries ({}); using binding energies of '{}'",
                        bare_metal,
                        matches.len(),
                        matches.join(", "),
                        matches[0]
                    );
                }
                self.surface().get_binding_energies(&matches[0])?
            }
        };

        energies
            .iter()
            .map(|(element, raw)| Energy::try_from(raw).map(|e| (element.clone(), e)))
            .collect()
    }

    /// Save the database to `path`, the top-level folder of the metal database.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DatabaseError> {
        let path = path.as_ref();
        fs::create_dir_all(path).map_err(|e| DatabaseError::io(path, e))?;
        self.save_libraries(path.join(LIBRARIES_DIR))
    }

    /// Save every library into `path`, the folder holding the library files.
    pub fn save_libraries<P: AsRef<Path>>(&self, path: P) -> Result<(), DatabaseError> {
        let path = path.as_ref();
        fs::create_dir_all(path).map_err(|e| DatabaseError::io(path, e))?;
        for (name, library) in &self.libraries {
            library.save(path.join(self.library_file_name(name)))?;
        }
        Ok(())
    }

    /// The legacy database layout has no metal data.
    pub fn load_old<P: AsRef<Path>>(&mut self, _path: P) -> Result<(), DatabaseError> {
        Err(DatabaseError::NotSupported(
            "loading the old metal database format",
        ))
    }

    pub fn save_old<P: AsRef<Path>>(&self, _path: P) -> Result<(), DatabaseError> {
        Err(DatabaseError::NotSupported(
            "saving the old metal database format",
        ))
    }
}
