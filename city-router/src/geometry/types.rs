//! Geometry wire types.

use serde::{Deserialize, Serialize};

use crate::domain::GeoPoint;

/// A walkable land parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandParcel {
    pub id: String,
    /// Boundary ring. May or may not repeat the first vertex at the end.
    pub coordinates: Vec<GeoPoint>,
}

/// A bridge joining two parcels across water.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeSpec {
    pub id: String,
    pub position: GeoPoint,
    pub land_a: String,
    pub land_b: String,
    /// Planned bridges are only usable outside `real` routing.
    #[serde(default = "default_constructed")]
    pub constructed: bool,
}

fn default_constructed() -> bool {
    true
}

/// A dock where the land and canal networks meet.
///
/// The id doubles as the building id in the building directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockSpec {
    pub id: String,
    pub position: GeoPoint,
    /// Parcel the dock stands on. Found by containment when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_id: Option<String>,
}

/// A navigable canal between two docks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanalLink {
    pub from: String,
    pub to: String,
    /// Points along the canal between the two docks, in `from` → `to` order.
    #[serde(default)]
    pub waypoints: Vec<GeoPoint>,
}

/// Everything the graph builder needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityGeometry {
    #[serde(default)]
    pub lands: Vec<LandParcel>,
    #[serde(default)]
    pub bridges: Vec<BridgeSpec>,
    #[serde(default)]
    pub docks: Vec<DockSpec>,
    #[serde(default)]
    pub canals: Vec<CanalLink>,
}
