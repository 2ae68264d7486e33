//! A small lagoon city shared by tests.
//!
//! ```text
//!   island                 (far north-east, unreachable)
//!
//!   +------+   bridge   +------+
//!   |land-a| ---------- |land-c|
//!   +--dock-a           +------+
//!          \            |land-b|
//!           canal ---- dock-b  |
//!                       +------+
//!                      /
//!            dock-lagoon (open water)
//! ```

use crate::domain::GeoPoint;
use crate::geometry::{BridgeSpec, CanalLink, CityGeometry, DockSpec, LandParcel};

pub(crate) fn pt(lat: f64, lng: f64) -> GeoPoint {
    GeoPoint::new(lat, lng)
}

/// Axis-aligned square parcel listed counter-clockwise from its south-west
/// corner.
pub(crate) fn square(id: &str, south: f64, west: f64, size: f64) -> LandParcel {
    LandParcel {
        id: id.to_string(),
        coordinates: vec![
            pt(south, west),
            pt(south, west + size),
            pt(south + size, west + size),
            pt(south + size, west),
        ],
    }
}

/// Origin on land-a.
pub(crate) const ORIGIN: GeoPoint = GeoPoint::new(45.4380, 12.3350);
/// Destination on land-b.
pub(crate) const DESTINATION: GeoPoint = GeoPoint::new(45.4360, 12.3390);
/// A point on land-c, reached fastest over the bridge.
pub(crate) const ACROSS_BRIDGE: GeoPoint = GeoPoint::new(45.4388, 12.3385);
/// A point on the island.
pub(crate) const ISLAND: GeoPoint = GeoPoint::new(45.4405, 12.3455);
/// Open water next to dock-lagoon.
pub(crate) const LAGOON: GeoPoint = GeoPoint::new(45.4302, 12.3370);
/// Open sea, far from any dock.
pub(crate) const OPEN_SEA: GeoPoint = GeoPoint::new(45.40, 12.40);

pub(crate) fn lagoon_city() -> CityGeometry {
    CityGeometry {
        lands: vec![
            square("land-a", 45.4370, 12.3340, 0.002),
            square("land-b", 45.4350, 12.3380, 0.002),
            square("land-c", 45.4370, 12.3380, 0.002),
            square("island", 45.4400, 12.3450, 0.001),
        ],
        bridges: vec![BridgeSpec {
            id: "bridge-ac".into(),
            position: pt(45.4380, 12.3370),
            land_a: "land-a".into(),
            land_b: "land-c".into(),
            constructed: true,
        }],
        docks: vec![
            DockSpec {
                id: "dock-a".into(),
                position: pt(45.4372, 12.3358),
                land_id: Some("land-a".into()),
            },
            DockSpec {
                id: "dock-b".into(),
                position: pt(45.4368, 12.3382),
                land_id: Some("land-b".into()),
            },
            DockSpec {
                id: "dock-lagoon".into(),
                position: pt(45.4300, 12.3370),
                land_id: None,
            },
        ],
        canals: vec![
            CanalLink {
                from: "dock-a".into(),
                to: "dock-b".into(),
                waypoints: vec![pt(45.4370, 12.3370)],
            },
            CanalLink {
                from: "dock-lagoon".into(),
                to: "dock-b".into(),
                waypoints: vec![pt(45.4320, 12.3375), pt(45.4340, 12.3380)],
            },
        ],
    }
}

/// The lagoon city with its only bridge still in planning.
pub(crate) fn with_planned_bridge() -> CityGeometry {
    let mut geometry = lagoon_city();
    for bridge in &mut geometry.bridges {
        bridge.constructed = false;
    }
    geometry
}
