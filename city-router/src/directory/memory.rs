//! In-memory building directory.

use std::collections::HashMap;
use std::path::Path;

use super::error::DirectoryError;
use super::{Building, BuildingDirectory};

/// Directory backed by a fixed set of buildings.
///
/// Useful for running without a live directory service, and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticBuildingDirectory {
    buildings: HashMap<String, Building>,
}

impl StaticBuildingDirectory {
    pub fn new(buildings: impl IntoIterator<Item = Building>) -> Self {
        Self {
            buildings: buildings
                .into_iter()
                .map(|building| (building.id.clone(), building))
                .collect(),
        }
    }

    /// Load buildings from a JSON file holding an array of buildings.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| DirectoryError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let buildings: Vec<Building> =
            serde_json::from_str(&json).map_err(|e| DirectoryError::Json {
                message: format!("failed to parse {}: {}", path.display(), e),
            })?;
        Ok(Self::new(buildings))
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}

impl BuildingDirectory for StaticBuildingDirectory {
    async fn get_building(&self, id: &str) -> Result<Building, DirectoryError> {
        self.buildings
            .get(id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
    }
}
