//! The immutable city graph.

use std::collections::HashMap;
use std::fmt;

use geo::{Intersects, Point, Polygon};
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::RTree;

use crate::domain::{GeoPoint, TransportMode};

use super::index::{LocalProjection, NodeTree, ParcelTree, parcels_around};

/// What a graph node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A point on a land parcel: a boundary vertex or the parcel hub.
    LandVertex,
    /// A bridge between two parcels.
    Bridge { constructed: bool },
    /// A dock joining land and canals.
    Dock,
}

/// Graph node.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: String,
    pub position: GeoPoint,
    pub kind: NodeKind,
    /// Parcel the node belongs to. Bridges have none.
    pub polygon_id: Option<String>,
}

impl GraphNode {
    pub fn is_dock(&self) -> bool {
        self.kind == NodeKind::Dock
    }

    pub fn is_planned_bridge(&self) -> bool {
        self.kind == NodeKind::Bridge { constructed: false }
    }
}

/// Graph edge.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub distance_m: f64,
    pub mode: TransportMode,
    /// Canal points strictly between the endpoints, ordered from the edge's
    /// source node to its target node. Empty for walking edges.
    pub waypoints: Vec<GeoPoint>,
}

impl GraphEdge {
    pub fn walk(distance_m: f64) -> Self {
        Self {
            distance_m,
            mode: TransportMode::Walk,
            waypoints: Vec::new(),
        }
    }

    pub fn canal(distance_m: f64, waypoints: Vec<GeoPoint>) -> Self {
        Self {
            distance_m,
            mode: TransportMode::Gondola,
            waypoints,
        }
    }
}

pub type NetworkGraph = UnGraph<GraphNode, GraphEdge>;

/// A land parcel as held by the graph.
#[derive(Debug, Clone)]
pub(crate) struct Parcel {
    pub(crate) id: String,
    pub(crate) polygon: Polygon<f64>,
    /// Every node an endpoint inside this parcel can walk straight to:
    /// boundary vertices, the hub and docks on the parcel.
    pub(crate) nodes: Vec<NodeIndex>,
}

/// Weighted graph of the city's walking and canal network.
///
/// Built once by [`build_graph`](super::build_graph) and never mutated; a
/// geometry change produces a whole new graph.
pub struct GeoGraph {
    pub(crate) graph: NetworkGraph,
    pub(crate) parcels: Vec<Parcel>,
    pub(crate) parcel_tree: ParcelTree,
    pub(crate) dock_tree: NodeTree,
    pub(crate) projection: LocalProjection,
    pub(crate) node_ids: HashMap<String, NodeIndex>,
}

impl fmt::Debug for GeoGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .field("parcels", &self.parcel_count())
            .field("docks", &self.dock_count())
            .finish_non_exhaustive()
    }
}

impl GeoGraph {
    /// A graph with no parcels, docks or edges.
    pub fn empty() -> Self {
        Self {
            graph: NetworkGraph::default(),
            parcels: Vec::new(),
            parcel_tree: RTree::new(),
            dock_tree: RTree::new(),
            projection: LocalProjection::centred_on(std::iter::empty()),
            node_ids: HashMap::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn parcel_count(&self) -> usize {
        self.parcels.len()
    }

    pub fn dock_count(&self) -> usize {
        self.dock_tree.size()
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    pub fn edge(&self, idx: EdgeIndex) -> &GraphEdge {
        &self.graph[idx]
    }

    /// Looks a node up by its id.
    pub fn node_by_id(&self, id: &str) -> Option<NodeIndex> {
        self.node_ids.get(id).copied()
    }

    /// Id of the parcel containing `point` (boundary inclusive).
    pub fn parcel_at(&self, point: &GeoPoint) -> Option<&str> {
        self.parcel_index_at(point)
            .map(|idx| self.parcels[idx].id.as_str())
    }

    /// Index of the parcel containing `point`. Overlapping parcels resolve
    /// to the one listed first in the geometry.
    pub(crate) fn parcel_index_at(&self, point: &GeoPoint) -> Option<usize> {
        let p: Point<f64> = (*point).into();
        parcels_around(&self.parcel_tree, point)
            .into_iter()
            .find(|&idx| self.parcels[idx].polygon.intersects(&p))
    }

    pub(crate) fn parcel(&self, idx: usize) -> &Parcel {
        &self.parcels[idx]
    }

    /// Nearest dock to `point`, if one lies within `max_m` meters.
    pub(crate) fn nearest_dock(&self, point: &GeoPoint, max_m: f64) -> Option<(NodeIndex, f64)> {
        let nearest = self.dock_tree.nearest_neighbor(&self.projection.project(point))?;
        let distance = point.distance_to(&self.graph[nearest.data].position);
        (distance <= max_m).then_some((nearest.data, distance))
    }

    /// Edges incident to `node` with the node at their far end.
    pub(crate) fn neighbours(
        &self,
        node: NodeIndex,
    ) -> impl Iterator<Item = (EdgeIndex, NodeIndex, &GraphEdge)> + '_ {
        self.graph.edges(node).map(move |edge| {
            let other = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            (edge.id(), other, edge.weight())
        })
    }

    /// Canal waypoints of `edge` in the order met when leaving `from`.
    pub(crate) fn waypoints_from(&self, edge: EdgeIndex, from: NodeIndex) -> Vec<GeoPoint> {
        let weight = &self.graph[edge];
        let forward = self
            .graph
            .edge_endpoints(edge)
            .is_some_and(|(source, _)| source == from);
        if forward {
            weight.waypoints.clone()
        } else {
            weight.waypoints.iter().rev().copied().collect()
        }
    }
}
