//! Spatial lookup structures for the city graph.

use petgraph::graph::NodeIndex;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

use crate::domain::{EARTH_RADIUS_M, GeoPoint};

/// Equirectangular projection around a reference latitude.
///
/// Projected coordinates are in meters, which keeps R-tree distances close
/// to ground distances at city scale.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalProjection {
    cos_lat: f64,
}

impl LocalProjection {
    /// Projection centred on the mean latitude of `points`.
    pub(crate) fn centred_on<'a>(points: impl Iterator<Item = &'a GeoPoint>) -> Self {
        let (sum, count) = points.fold((0.0, 0usize), |(sum, n), p| (sum + p.lat, n + 1));
        let mean_lat = if count == 0 { 0.0 } else { sum / count as f64 };
        Self {
            cos_lat: mean_lat.to_radians().cos(),
        }
    }

    pub(crate) fn project(&self, p: &GeoPoint) -> [f64; 2] {
        [
            p.lng.to_radians() * EARTH_RADIUS_M * self.cos_lat,
            p.lat.to_radians() * EARTH_RADIUS_M,
        ]
    }

    pub(crate) fn unproject(&self, xy: [f64; 2]) -> GeoPoint {
        GeoPoint::new(
            (xy[1] / EARTH_RADIUS_M).to_degrees(),
            (xy[0] / (EARTH_RADIUS_M * self.cos_lat)).to_degrees(),
        )
    }
}

/// Parcel bounding boxes in `[lng, lat]` space, carrying the parcel index.
pub(crate) type ParcelTree = RTree<GeomWithData<Rectangle<[f64; 2]>, usize>>;

/// Projected node positions carrying the node index.
pub(crate) type NodeTree = RTree<GeomWithData<[f64; 2], NodeIndex>>;

/// Parcel indices whose bounding box contains `point`, in ascending order.
pub(crate) fn parcels_around(tree: &ParcelTree, point: &GeoPoint) -> Vec<usize> {
    let mut hits: Vec<usize> = tree
        .locate_in_envelope_intersecting(&AABB::from_point(point.to_xy()))
        .map(|entry| entry.data)
        .collect();
    hits.sort_unstable();
    hits
}

/// Parcel indices whose bounding box comes within roughly `radius_m` of
/// `point`, in ascending order.
pub(crate) fn parcels_within(tree: &ParcelTree, point: &GeoPoint, radius_m: f64) -> Vec<usize> {
    let dlat = (radius_m / EARTH_RADIUS_M).to_degrees();
    let dlng = dlat / point.lat.to_radians().cos().max(1e-6);
    let envelope = AABB::from_corners(
        [point.lng - dlng, point.lat - dlat],
        [point.lng + dlng, point.lat + dlat],
    );
    let mut hits: Vec<usize> = tree
        .locate_in_envelope_intersecting(&envelope)
        .map(|entry| entry.data)
        .collect();
    hits.sort_unstable();
    hits
}

/// Nodes whose projected position lies within the square of half-width
/// `radius_m` around `center`. Callers refine with a true distance check.
pub(crate) fn nodes_near(tree: &NodeTree, center: [f64; 2], radius_m: f64) -> Vec<NodeIndex> {
    let envelope = AABB::from_corners(
        [center[0] - radius_m, center[1] - radius_m],
        [center[0] + radius_m, center[1] + radius_m],
    );
    tree.locate_in_envelope_intersecting(&envelope)
        .map(|entry| entry.data)
        .collect()
}
