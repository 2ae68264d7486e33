//! Where city geometry comes from.

use std::path::{Path, PathBuf};

use super::error::GeometryError;
use super::types::CityGeometry;

/// Provider of static city geometry.
///
/// Consumed once at startup and again whenever the graph is refreshed.
pub trait GeometrySource {
    fn load(&self) -> Result<CityGeometry, GeometryError>;
}

/// An in-memory geometry document is its own source.
impl GeometrySource for CityGeometry {
    fn load(&self) -> Result<CityGeometry, GeometryError> {
        Ok(self.clone())
    }
}

/// Geometry read from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileGeometrySource {
    path: PathBuf,
}

impl FileGeometrySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GeometrySource for FileGeometrySource {
    fn load(&self) -> Result<CityGeometry, GeometryError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| GeometryError::Io {
            path: self.path.display().to_string(),
            source: e,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}
