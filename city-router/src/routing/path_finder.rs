//! Mixed walking and canal routing between two land coordinates.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::domain::{GeoPoint, Path, PathPoint, RouteError, RouteMode, TransportMode};
use crate::graph::{GeoGraph, GraphNode, NodeKind};

use super::deadline::Deadline;
use super::dijkstra::{GraphRoute, shortest_route};

/// Finds the shortest route between two points on land.
///
/// Both endpoints must fall inside a land parcel; the route may cross
/// bridges and take canals between docks.
#[derive(Debug, Clone, Copy)]
pub struct PathFinder<'a> {
    graph: &'a GeoGraph,
    mode: RouteMode,
}

impl<'a> PathFinder<'a> {
    pub fn new(graph: &'a GeoGraph, mode: RouteMode) -> Self {
        Self { graph, mode }
    }

    /// Computes the route from `origin` to `destination`.
    ///
    /// # Errors
    ///
    /// - [`RouteError::NotNavigable`] if either endpoint is outside every parcel
    /// - [`RouteError::NoPathFound`] if the parcels aren't connected
    /// - [`RouteError::Timeout`] if the deadline passes first
    pub fn find_path(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        deadline: &Deadline,
    ) -> Result<Path, RouteError> {
        deadline.check()?;

        let from = self
            .graph
            .parcel_index_at(&origin)
            .ok_or(RouteError::NotNavigable)?;
        let to = self
            .graph
            .parcel_index_at(&destination)
            .ok_or(RouteError::NotNavigable)?;

        let from_id = &self.graph.parcel(from).id;
        let to_id = &self.graph.parcel(to).id;

        if origin == destination || from == to {
            return Ok(Path::new(vec![
                PathPoint::land(origin, from_id.as_str()),
                PathPoint::land(destination, to_id.as_str()).via(TransportMode::Walk),
            ]));
        }

        let sources: Vec<(NodeIndex, f64)> = self
            .graph
            .parcel(from)
            .nodes
            .iter()
            .map(|&idx| (idx, origin.distance_to(&self.graph.node(idx).position)))
            .collect();
        let targets: HashMap<NodeIndex, f64> = self
            .graph
            .parcel(to)
            .nodes
            .iter()
            .map(|&idx| (idx, destination.distance_to(&self.graph.node(idx).position)))
            .collect();

        let planned_ok = self.mode.allows_planned_bridges();
        let route = shortest_route(
            self.graph,
            &sources,
            &targets,
            |_, node| planned_ok || !node.is_planned_bridge(),
            deadline,
        )?
        .ok_or(RouteError::NoPathFound)?;

        debug!(
            from = %from_id,
            to = %to_id,
            nodes = route.nodes.len(),
            meters = route.cost,
            "found land route"
        );

        let mut points = vec![PathPoint::land(origin, from_id.as_str())];
        self.push_route(&route, &mut points);
        points.push(PathPoint::land(destination, to_id.as_str()).via(TransportMode::Walk));
        Ok(Path::new(points))
    }

    /// Appends the graph part of a route, labelling each point with the
    /// mode of the edge that reached it.
    fn push_route(&self, route: &GraphRoute, points: &mut Vec<PathPoint>) {
        for (i, &idx) in route.nodes.iter().enumerate() {
            let mode = match i.checked_sub(1) {
                None => TransportMode::Walk,
                Some(prev) => {
                    let edge_idx = route.edges[prev];
                    let edge = self.graph.edge(edge_idx);
                    for waypoint in self.graph.waypoints_from(edge_idx, route.nodes[prev]) {
                        points.push(PathPoint::intermediate(waypoint).via(edge.mode));
                    }
                    edge.mode
                }
            };
            points.push(node_point(self.graph.node(idx)).via(mode));
        }
    }
}

/// Path point for a graph node.
pub(crate) fn node_point(node: &GraphNode) -> PathPoint {
    match (&node.kind, &node.polygon_id) {
        (NodeKind::Bridge { .. }, _) => PathPoint::bridge(node.position, node.id.as_str()),
        (NodeKind::Dock, _) => PathPoint::dock(node.position, node.id.as_str()),
        (NodeKind::LandVertex, Some(polygon_id)) => {
            PathPoint::land(node.position, polygon_id.as_str())
        }
        (NodeKind::LandVertex, None) => PathPoint::plain(node.position),
    }
}
