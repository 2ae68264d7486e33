//! Building directory lookups.
//!
//! Docks are buildings; the directory says who operates each one. Only the
//! transporter resolver consults it.

mod error;
mod http;
mod memory;

use serde::{Deserialize, Serialize};

use crate::domain::GeoPoint;

pub use error::DirectoryError;
pub use http::{DirectoryConfig, HttpBuildingDirectory};
pub use memory::StaticBuildingDirectory;

/// A building as known to the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: String,
    pub position: GeoPoint,
    /// Entity operating the building, if any.
    #[serde(default)]
    pub operator_id: Option<String>,
}

/// Source of building records.
///
/// Implementations must be shareable across concurrent lookups.
pub trait BuildingDirectory: Send + Sync {
    /// Fetch a building by id.
    ///
    /// Returns [`DirectoryError::NotFound`] for unknown ids.
    fn get_building(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Building, DirectoryError>> + Send;
}
