//! Journey summary types.

use serde::{Deserialize, Serialize};

use super::{GeoPoint, TransportMode};

/// What kind of waypoint a journey event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JourneyEventKind {
    Land,
    Bridge,
    Dock,
}

/// A notable waypoint along a route: entering a parcel, crossing a bridge or
/// stopping at a dock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyEvent {
    #[serde(rename = "type")]
    pub kind: JourneyEventKind,
    /// Parcel id for land events, node id otherwise.
    pub id: String,
    pub position: GeoPoint,
    pub transport_mode: TransportMode,
}

impl JourneyEvent {
    pub fn new(
        kind: JourneyEventKind,
        id: impl Into<String>,
        position: GeoPoint,
        transport_mode: TransportMode,
    ) -> Self {
        Self {
            kind,
            id: id.into(),
            position,
            transport_mode,
        }
    }

    pub fn is_land(&self) -> bool {
        self.kind == JourneyEventKind::Land
    }
}
