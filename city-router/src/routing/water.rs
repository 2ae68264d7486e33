//! Canal-only routing for endpoints off land.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{GeoPoint, Path, PathPoint, RouteError, TransportMode};
use crate::graph::GeoGraph;

use super::deadline::Deadline;
use super::dijkstra::shortest_route;

/// Finds routes over the dock and canal network only.
///
/// Each endpoint joins the network at its nearest dock, provided one lies
/// within `max_snap_m`. Every point after the origin is travelled by
/// gondola.
#[derive(Debug, Clone, Copy)]
pub struct WaterOnlyPathFinder<'a> {
    graph: &'a GeoGraph,
    max_snap_m: f64,
}

impl<'a> WaterOnlyPathFinder<'a> {
    pub fn new(graph: &'a GeoGraph, max_snap_m: f64) -> Self {
        Self { graph, max_snap_m }
    }

    /// Computes the canal route from `origin` to `destination`.
    ///
    /// # Errors
    ///
    /// - [`RouteError::NotNavigable`] if no dock lies within reach of an endpoint
    /// - [`RouteError::NoPathFound`] if the two docks aren't connected by canals
    /// - [`RouteError::Timeout`] if the deadline passes first
    pub fn find_path(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        deadline: &Deadline,
    ) -> Result<Path, RouteError> {
        deadline.check()?;

        let (start, start_m) = self
            .graph
            .nearest_dock(&origin, self.max_snap_m)
            .ok_or(RouteError::NotNavigable)?;
        let (end, end_m) = self
            .graph
            .nearest_dock(&destination, self.max_snap_m)
            .ok_or(RouteError::NotNavigable)?;

        if origin == destination {
            return Ok(Path::new(vec![
                PathPoint::plain(origin),
                PathPoint::plain(destination).via(TransportMode::Gondola),
            ]));
        }

        let targets = HashMap::from([(end, end_m)]);
        let route = shortest_route(
            self.graph,
            &[(start, start_m)],
            &targets,
            |edge, node| edge.mode == TransportMode::Gondola && node.is_dock(),
            deadline,
        )?
        .ok_or(RouteError::NoPathFound)?;

        debug!(
            from = %self.graph.node(start).id,
            to = %self.graph.node(end).id,
            docks = route.nodes.len(),
            "found canal route"
        );

        let mut points = vec![PathPoint::plain(origin)];
        for (i, &idx) in route.nodes.iter().enumerate() {
            if i > 0 {
                let edge = route.edges[i - 1];
                for waypoint in self.graph.waypoints_from(edge, route.nodes[i - 1]) {
                    points.push(PathPoint::intermediate(waypoint).via(TransportMode::Gondola));
                }
            }
            let node = self.graph.node(idx);
            points.push(PathPoint::dock(node.position, node.id.as_str()).via(TransportMode::Gondola));
        }
        points.push(PathPoint::plain(destination).via(TransportMode::Gondola));
        Ok(Path::new(points))
    }
}
