/// binding energies and site densities of catalytic metal surfaces
/// # Examples
/// ```
/// use KiSurf::Surface::metal_database::MetalDatabase;
/// let mut db = MetalDatabase::new();
/// db.load("database/surface").unwrap();
/// let pt = db.get_binding_energies("Pt111").unwrap();
/// println!("Pt(111) binding energies: {:?}", pt);
/// let energies = db.find_binding_energies("Ni").unwrap();
/// for (element, e) in energies {
///     println!("{}: {}", element, e);
/// }
/// ```
pub mod metal_database;
/// single library file: entries keyed by label
pub mod metal_library;
/// value/unit pairs and their SI conversions
pub mod quantity;
/// reading and writing of the declarative record files
pub mod record_format;

mod metal_database_tests;

use thiserror::Error;

/// errors of the metal surface database
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Not supported: {0}")]
    NotSupported(&'static str),
    #[error("Unsupported unit: {0}")]
    UnsupportedUnit(String),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl DatabaseError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        DatabaseError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
