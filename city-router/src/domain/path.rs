//! Computed routes as sequences of typed points.

use serde::{Deserialize, Serialize};

use super::{GeoPoint, TransportMode};

/// What a path point sits on.
///
/// Each variant only carries the identifiers that make sense for it, so a
/// bridge point can never claim a parcel and a canal waypoint can never claim
/// a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum PointKind {
    /// A point on a land parcel.
    Land { polygon_id: String },
    /// A bridge node.
    Bridge { node_id: String },
    /// A dock node.
    Dock { node_id: String },
    /// A bare coordinate: an off-graph endpoint, or a canal waypoint when
    /// `is_intermediate` is set.
    Plain { is_intermediate: bool },
}

/// One step of a computed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPoint {
    #[serde(flatten)]
    pub position: GeoPoint,
    /// How this point was reached. `None` only on the origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_mode: Option<TransportMode>,
    #[serde(flatten)]
    pub kind: PointKind,
}

impl PathPoint {
    pub fn land(position: GeoPoint, polygon_id: impl Into<String>) -> Self {
        Self {
            position,
            transport_mode: None,
            kind: PointKind::Land {
                polygon_id: polygon_id.into(),
            },
        }
    }

    pub fn bridge(position: GeoPoint, node_id: impl Into<String>) -> Self {
        Self {
            position,
            transport_mode: None,
            kind: PointKind::Bridge {
                node_id: node_id.into(),
            },
        }
    }

    pub fn dock(position: GeoPoint, node_id: impl Into<String>) -> Self {
        Self {
            position,
            transport_mode: None,
            kind: PointKind::Dock {
                node_id: node_id.into(),
            },
        }
    }

    pub fn plain(position: GeoPoint) -> Self {
        Self {
            position,
            transport_mode: None,
            kind: PointKind::Plain {
                is_intermediate: false,
            },
        }
    }

    /// A canal waypoint between two graph nodes.
    pub fn intermediate(position: GeoPoint) -> Self {
        Self {
            position,
            transport_mode: None,
            kind: PointKind::Plain {
                is_intermediate: true,
            },
        }
    }

    /// Sets the mode this point was reached by.
    pub fn via(mut self, mode: TransportMode) -> Self {
        self.transport_mode = Some(mode);
        self
    }

    /// The mode this point was reached by, defaulting to walking.
    pub fn mode(&self) -> TransportMode {
        self.transport_mode.unwrap_or_default()
    }

    pub fn is_intermediate(&self) -> bool {
        matches!(
            self.kind,
            PointKind::Plain {
                is_intermediate: true
            }
        )
    }

    pub fn polygon_id(&self) -> Option<&str> {
        match &self.kind {
            PointKind::Land { polygon_id } => Some(polygon_id),
            _ => None,
        }
    }

    pub fn node_id(&self) -> Option<&str> {
        match &self.kind {
            PointKind::Bridge { node_id } | PointKind::Dock { node_id } => Some(node_id),
            _ => None,
        }
    }
}

/// An ordered route from origin to destination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    points: Vec<PathPoint>,
}

impl Path {
    pub fn new(points: Vec<PathPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<PathPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PathPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PathPoint> {
        self.points.last()
    }

    /// Whether any point was reached over a canal.
    pub fn uses_gondola(&self) -> bool {
        self.points
            .iter()
            .any(|p| p.transport_mode == Some(TransportMode::Gondola))
    }

    /// Distinct dock ids in path order.
    pub fn dock_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for point in &self.points {
            if let PointKind::Dock { node_id } = &point.kind
                && !ids.contains(&node_id.as_str())
            {
                ids.push(node_id);
            }
        }
        ids
    }
}
