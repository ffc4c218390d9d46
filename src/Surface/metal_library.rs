//! # Metal Library Module
//!
//! ## Purpose
//! In-memory form of one library file of the metal database: every catalytic surface
//! (metal + facet) is an `Entry` holding binding energies of the adsorbing elements and
//! the surface site density. Entries are keyed by their unique label ("Pt111", "Ni211").
//!
//! ## Main Data Structures
//! - `Entry`: one surface record, immutable after loading
//! - `MetalLibrary`: label -> Entry map plus the library header (name, descriptions)
//!
//! ## Usage
//! ```rust, ignore
//! let mut lib = MetalLibrary::new("surface");
//! lib.load("database/surface/libraries/metal.py")?;
//! let be = lib.get_binding_energies("Pt111")?;
//! lib.pretty_print();
//! ```
use super::DatabaseError;
use super::quantity::RawQuantity;
use super::record_format::{entry_from_record, parse_document, write_library};
use log::{error, info, warn};
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// catalytic surface record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entry {
    pub index: i64,
    pub label: String,
    pub metal: String,
    pub facet: String,
    pub surface_site_density: Option<RawQuantity>,
    /// element symbol -> binding energy as written in the library
    pub binding_energies: BTreeMap<String, RawQuantity>,
    pub short_desc: String,
    pub long_desc: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetalLibrary {
    pub label: String,
    pub name: String,
    pub short_desc: String,
    pub long_desc: String,
    pub entries: HashMap<String, Entry>,
}

impl MetalLibrary {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load the metal library from the given path
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), DatabaseError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatabaseError::NotFound(format!(
                "Library file '{}' does not exist",
                path.display()
            )));
        }
        let text = fs::read_to_string(path).map_err(|e| DatabaseError::io(path, e))?;
        self.load_from_str(&text)?;
        info!(
            "Loaded {} entries into metal library '{}' from '{}'",
            self.entries.len(),
            self.label,
            path.display()
        );
        Ok(())
    }

    /// Parses library text. On failure nothing is changed and the offending line is logged.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), DatabaseError> {
        let document = match parse_document(text) {
            Ok(document) => document,
            Err(e) => {
                report_parse_error(text, &e);
                return Err(e);
            }
        };
        let mut entries = HashMap::new();
        for record in &document.entries {
            let entry = match entry_from_record(record) {
                Ok(entry) => entry,
                Err(e) => {
                    report_parse_error(text, &e);
                    return Err(e);
                }
            };
            if entries.contains_key(&entry.label) {
                warn!(
                    "Duplicate label '{}' at line {}: earlier entry replaced",
                    entry.label, record.position.line
                );
            }
            entries.insert(entry.label.clone(), entry);
        }
        for (key, value) in &document.header {
            match (key.as_str(), value.as_str()) {
                ("name", Some(v)) => self.name = v.to_string(),
                ("shortDesc" | "short_desc", Some(v)) => self.short_desc = v.to_string(),
                ("longDesc" | "long_desc", Some(v)) => self.long_desc = v.trim().to_string(),
                _ => warn!("Ignoring library header field '{}'", key),
            }
        }
        if entries.is_empty() {
            warn!("Metal library '{}' contains no entries", self.label);
        }
        self.entries = entries;
        Ok(())
    }

    /// Write the library in the record format, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DatabaseError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| DatabaseError::io(parent, e))?;
            }
        }
        fs::write(path, write_library(self)).map_err(|e| DatabaseError::io(path, e))?;
        info!(
            "Saved {} entries of metal library '{}' to '{}'",
            self.entries.len(),
            self.label,
            path.display()
        );
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, DatabaseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), DatabaseError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|e| DatabaseError::io(path, e))
    }

    pub fn get_entry(&self, label: &str) -> Result<&Entry, DatabaseError> {
        self.entries.get(label).ok_or_else(|| {
            DatabaseError::NotFound(format!("Metal '{}' not found in metal library database.", label))
        })
    }

    /// Get a metal's binding energies from its label
    pub fn get_binding_energies(
        &self,
        label: &str,
    ) -> Result<&BTreeMap<String, RawQuantity>, DatabaseError> {
        Ok(&self.get_entry(label)?.binding_energies)
    }

    /// Get a metal's surface site density from its label
    pub fn get_surface_site_density(
        &self,
        label: &str,
    ) -> Result<Option<&RawQuantity>, DatabaseError> {
        Ok(self.get_entry(label)?.surface_site_density.as_ref())
    }

    /// Labels of all entries on `metal_name`, any facet, ordered by entry index
    pub fn get_all_entries_on_metal(&self, metal_name: &str) -> Result<Vec<String>, DatabaseError> {
        let mut matches: Vec<&Entry> = self
            .entries
            .values()
            .filter(|entry| entry.metal == metal_name)
            .collect();
        if matches.is_empty() {
            return Err(DatabaseError::NotFound(format!(
                "Metal '{}' not found in database",
                metal_name
            )));
        }
        matches.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.label.cmp(&b.label)));
        Ok(matches.into_iter().map(|entry| entry.label.clone()).collect())
    }

    /// table of all entries sorted by index
    pub fn pretty_print(&self) {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.index);
        let mut elements: Vec<&String> = entries
            .iter()
            .flat_map(|entry| entry.binding_energies.keys())
            .collect();
        elements.sort();
        elements.dedup();

        let mut table = Table::new();
        let mut header_row = vec![
            Cell::new("index"),
            Cell::new("label"),
            Cell::new("metal"),
            Cell::new("facet"),
            Cell::new("site density"),
        ];
        for element in &elements {
            header_row.push(Cell::new(element));
        }
        table.add_row(Row::new(header_row));
        for entry in entries {
            let density = entry
                .surface_site_density
                .as_ref()
                .map_or_else(|| "-".to_string(), |q| q.to_string());
            let mut row = vec![
                Cell::new(&entry.index.to_string()),
                Cell::new(&entry.label),
                Cell::new(&entry.metal),
                Cell::new(&entry.facet),
                Cell::new(&density),
            ];
            for element in &elements {
                let value = entry
                    .binding_energies
                    .get(*element)
                    .map_or_else(|| "-".to_string(), |q| q.to_string());
                row.push(Cell::new(&value));
            }
            table.add_row(Row::new(row));
        }
        table.printstd();
    }
}

/// logs the source line of a parse error with a pointer to the column
fn report_parse_error(text: &str, e: &DatabaseError) {
    error!("{}", e);
    if let DatabaseError::Parse { line, column, .. } = e {
        if let Some(problem_line) = text.lines().nth(line.saturating_sub(1)) {
            error!("Problematic line: {}", problem_line);
            let pointer = " ".repeat(column.saturating_sub(1)) + "^";
            error!("                  {}", pointer);
        }
    }
}
