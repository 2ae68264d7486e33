//! Graph construction from city geometry.
//!
//! Every land parcel contributes its boundary vertices, walking edges along
//! its perimeter and a hub node at its centroid joined to each vertex.
//! Vertices of different parcels that (nearly) coincide are joined, bridges
//! are linked to the closest vertices of the two parcels they span, and
//! docks are linked to their parcel on foot and to each other by canal.

use std::collections::HashMap;

use geo::{BoundingRect, Centroid, Closest, ClosestPoint, Line, LineString, Polygon, coord};
use petgraph::graph::NodeIndex;
use rstar::RTree;
use rstar::primitives::{GeomWithData, Rectangle};
use tracing::{debug, info};

use crate::config::RouterConfig;
use crate::domain::GeoPoint;
use crate::geometry::{BridgeSpec, CanalLink, CityGeometry, DockSpec, LandParcel};

use super::error::GraphBuildError;
use super::index::{LocalProjection, NodeTree, ParcelTree, nodes_near, parcels_within};
use super::model::{GeoGraph, GraphEdge, GraphNode, NetworkGraph, NodeKind, Parcel};

/// Build an immutable graph from city geometry.
///
/// # Errors
///
/// Returns the first validation error found. Nothing is returned on error,
/// so a half-built graph can never be published.
pub fn build_graph(
    geometry: &CityGeometry,
    config: &RouterConfig,
) -> Result<GeoGraph, GraphBuildError> {
    config.validate()?;
    check_coordinates(geometry)?;

    let projection = LocalProjection::centred_on(
        geometry
            .lands
            .iter()
            .flat_map(|land| land.coordinates.iter())
            .chain(geometry.docks.iter().map(|dock| &dock.position)),
    );

    let mut builder = GraphBuilder::new(config, projection);

    for land in &geometry.lands {
        builder.add_parcel(land)?;
    }

    let vertex_tree = builder.vertex_tree();
    let parcel_tree = builder.parcel_tree();
    builder.link_adjacent_parcels(&vertex_tree);
    builder.link_parcel_junctions(&parcel_tree)?;

    for bridge in &geometry.bridges {
        builder.add_bridge(bridge)?;
    }

    for dock in &geometry.docks {
        builder.add_dock(dock, &parcel_tree, &vertex_tree)?;
    }

    for canal in &geometry.canals {
        builder.add_canal(canal)?;
    }

    let graph = builder.finish(parcel_tree);

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        parcels = graph.parcel_count(),
        docks = graph.dock_count(),
        "built city graph"
    );

    Ok(graph)
}

/// A boundary vertex touching the middle of another parcel's edge.
struct Junction {
    vertex: NodeIndex,
    parcel: usize,
    segment: (NodeIndex, NodeIndex),
    position: GeoPoint,
}

/// Mutable state while building.
struct GraphBuilder<'a> {
    config: &'a RouterConfig,
    projection: LocalProjection,
    graph: NetworkGraph,
    parcels: Vec<Parcel>,
    /// Boundary vertices per parcel, excluding the hub.
    boundaries: Vec<Vec<NodeIndex>>,
    parcel_lookup: HashMap<String, usize>,
    node_ids: HashMap<String, NodeIndex>,
    docks: Vec<GeomWithData<[f64; 2], NodeIndex>>,
}

impl<'a> GraphBuilder<'a> {
    fn new(config: &'a RouterConfig, projection: LocalProjection) -> Self {
        Self {
            config,
            projection,
            graph: NetworkGraph::default(),
            parcels: Vec::new(),
            boundaries: Vec::new(),
            parcel_lookup: HashMap::new(),
            node_ids: HashMap::new(),
            docks: Vec::new(),
        }
    }

    fn add_node(&mut self, node: GraphNode) -> Result<NodeIndex, GraphBuildError> {
        if self.node_ids.contains_key(&node.id) {
            return Err(GraphBuildError::DuplicateId(node.id));
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_ids.insert(id, idx);
        Ok(idx)
    }

    fn connect_walk(&mut self, a: NodeIndex, b: NodeIndex) {
        let distance = self.graph[a].position.distance_to(&self.graph[b].position);
        self.graph.add_edge(a, b, GraphEdge::walk(distance));
    }

    fn add_parcel(&mut self, land: &LandParcel) -> Result<(), GraphBuildError> {
        if self.parcel_lookup.contains_key(&land.id) {
            return Err(GraphBuildError::DuplicateId(land.id.clone()));
        }

        let ring = boundary_ring(land)?;
        let polygon = Polygon::new(
            LineString::from(ring.iter().map(|p| (p.lng, p.lat)).collect::<Vec<_>>()),
            vec![],
        );
        let parcel_idx = self.parcels.len();

        let mut vertices = Vec::with_capacity(ring.len());
        for (i, position) in ring.iter().enumerate() {
            let idx = self.add_node(GraphNode {
                id: format!("{}#{}", land.id, i),
                position: *position,
                kind: NodeKind::LandVertex,
                polygon_id: Some(land.id.clone()),
            })?;
            vertices.push(idx);
        }

        for i in 0..vertices.len() {
            self.connect_walk(vertices[i], vertices[(i + 1) % vertices.len()]);
        }

        let hub_position = polygon
            .centroid()
            .map(|c| GeoPoint::new(c.y(), c.x()))
            .unwrap_or(ring[0]);
        let hub = self.add_node(GraphNode {
            id: format!("{}#hub", land.id),
            position: hub_position,
            kind: NodeKind::LandVertex,
            polygon_id: Some(land.id.clone()),
        })?;
        for &vertex in &vertices {
            self.connect_walk(hub, vertex);
        }

        let mut nodes = vertices.clone();
        nodes.push(hub);

        self.parcel_lookup.insert(land.id.clone(), parcel_idx);
        self.boundaries.push(vertices);
        self.parcels.push(Parcel {
            id: land.id.clone(),
            polygon,
            nodes,
        });
        Ok(())
    }

    fn vertex_tree(&self) -> NodeTree {
        let entries = self
            .boundaries
            .iter()
            .flatten()
            .map(|&idx| GeomWithData::new(self.projection.project(&self.graph[idx].position), idx))
            .collect();
        RTree::bulk_load(entries)
    }

    fn parcel_tree(&self) -> ParcelTree {
        let entries = self
            .parcels
            .iter()
            .enumerate()
            .filter_map(|(idx, parcel)| {
                let rect = parcel.polygon.bounding_rect()?;
                Some(GeomWithData::new(
                    Rectangle::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                    idx,
                ))
            })
            .collect();
        RTree::bulk_load(entries)
    }

    /// Joins boundary vertices of different parcels lying within the
    /// adjacency tolerance of each other.
    fn link_adjacent_parcels(&mut self, vertex_tree: &NodeTree) {
        let tolerance = self.config.adjacency_tolerance_m;
        let mut links = Vec::new();

        for &vertex in self.boundaries.iter().flatten() {
            let node = &self.graph[vertex];
            // Projection error is well under a meter at city scale
            let candidates = nodes_near(vertex_tree, self.projection.project(&node.position), tolerance + 1.0);
            for other in candidates {
                if other <= vertex {
                    continue;
                }
                let other_node = &self.graph[other];
                if other_node.polygon_id == node.polygon_id {
                    continue;
                }
                if node.position.distance_to(&other_node.position) <= tolerance {
                    links.push((vertex, other));
                }
            }
        }

        debug!(links = links.len(), "linked adjacent parcels");
        for (a, b) in links {
            self.connect_walk(a, b);
        }
    }

    /// Splits other parcels' edges where a boundary vertex touches them away
    /// from their corners, so parcels meeting in a T-junction connect.
    fn link_parcel_junctions(&mut self, parcel_tree: &ParcelTree) -> Result<(), GraphBuildError> {
        let tolerance = self.config.adjacency_tolerance_m;
        let mut junctions = Vec::new();

        for (own, boundary) in self.boundaries.iter().enumerate() {
            for &vertex in boundary {
                let position = self.graph[vertex].position;
                for other in parcels_within(parcel_tree, &position, tolerance) {
                    if other != own {
                        junctions.extend(self.edge_contacts(vertex, other, tolerance));
                    }
                }
            }
        }

        debug!(junctions = junctions.len(), "linked parcel junctions");
        for (n, junction) in junctions.into_iter().enumerate() {
            let parcel_id = self.parcels[junction.parcel].id.clone();
            let node = self.add_node(GraphNode {
                id: format!("{parcel_id}#j{n}"),
                position: junction.position,
                kind: NodeKind::LandVertex,
                polygon_id: Some(parcel_id),
            })?;
            let (a, b) = junction.segment;
            self.connect_walk(node, a);
            self.connect_walk(node, b);
            self.connect_walk(node, junction.vertex);
            self.parcels[junction.parcel].nodes.push(node);
        }
        Ok(())
    }

    /// Points on `parcel`'s edges within `tolerance` of `vertex`, skipping
    /// edges with a corner already in range.
    fn edge_contacts(&self, vertex: NodeIndex, parcel: usize, tolerance: f64) -> Vec<Junction> {
        let position = self.graph[vertex].position;
        let [x, y] = self.projection.project(&position);
        let target = geo::Point::new(x, y);
        let ring = &self.boundaries[parcel];

        let mut contacts = Vec::new();
        for i in 0..ring.len() {
            let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
            let (pa, pb) = (self.graph[a].position, self.graph[b].position);
            if position.distance_to(&pa) <= tolerance || position.distance_to(&pb) <= tolerance {
                continue;
            }

            let [ax, ay] = self.projection.project(&pa);
            let [bx, by] = self.projection.project(&pb);
            let edge = Line::new(coord! { x: ax, y: ay }, coord! { x: bx, y: by });
            let foot = match edge.closest_point(&target) {
                Closest::Intersection(p) | Closest::SinglePoint(p) => p,
                Closest::Indeterminate => continue,
            };
            let foot = self.projection.unproject([foot.x(), foot.y()]);
            if position.distance_to(&foot) <= tolerance {
                contacts.push(Junction {
                    vertex,
                    parcel,
                    segment: (a, b),
                    position: foot,
                });
            }
        }
        contacts
    }

    fn parcel_ref(&self, referenced_by: &str, land_id: &str) -> Result<usize, GraphBuildError> {
        self.parcel_lookup
            .get(land_id)
            .copied()
            .ok_or_else(|| GraphBuildError::UnknownParcel {
                referenced_by: referenced_by.to_string(),
                parcel: land_id.to_string(),
            })
    }

    /// The `vertex_links` boundary vertices of a parcel closest to `position`.
    fn closest_boundary_vertices(&self, parcel: usize, position: &GeoPoint) -> Vec<NodeIndex> {
        let mut by_distance: Vec<(f64, NodeIndex)> = self.boundaries[parcel]
            .iter()
            .map(|&idx| (position.distance_to(&self.graph[idx].position), idx))
            .collect();
        by_distance.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        by_distance
            .into_iter()
            .take(self.config.vertex_links.max(1))
            .map(|(_, idx)| idx)
            .collect()
    }

    fn add_bridge(&mut self, bridge: &BridgeSpec) -> Result<(), GraphBuildError> {
        let land_a = self.parcel_ref(&bridge.id, &bridge.land_a)?;
        let land_b = self.parcel_ref(&bridge.id, &bridge.land_b)?;

        let node = self.add_node(GraphNode {
            id: bridge.id.clone(),
            position: bridge.position,
            kind: NodeKind::Bridge {
                constructed: bridge.constructed,
            },
            polygon_id: None,
        })?;

        let mut sides = vec![land_a];
        if land_b != land_a {
            sides.push(land_b);
        }
        for parcel in sides {
            for vertex in self.closest_boundary_vertices(parcel, &bridge.position) {
                self.connect_walk(node, vertex);
            }
        }
        Ok(())
    }

    /// Parcel a dock without an explicit land id stands on: the containing
    /// parcel, else the parcel of the nearest boundary vertex if it is within
    /// dock snapping range.
    fn locate_dock_parcel(
        &self,
        position: &GeoPoint,
        parcel_tree: &ParcelTree,
        vertex_tree: &NodeTree,
    ) -> Option<usize> {
        let point: geo::Point<f64> = (*position).into();
        let containing = super::index::parcels_around(parcel_tree, position)
            .into_iter()
            .find(|&idx| geo::Intersects::intersects(&self.parcels[idx].polygon, &point));
        if containing.is_some() {
            return containing;
        }

        let nearest = vertex_tree.nearest_neighbor(&self.projection.project(position))?;
        let node = &self.graph[nearest.data];
        if position.distance_to(&node.position) > self.config.max_dock_snap_m {
            return None;
        }
        node.polygon_id
            .as_deref()
            .and_then(|id| self.parcel_lookup.get(id).copied())
    }

    fn add_dock(
        &mut self,
        dock: &DockSpec,
        parcel_tree: &ParcelTree,
        vertex_tree: &NodeTree,
    ) -> Result<(), GraphBuildError> {
        let parcel = match &dock.land_id {
            Some(land_id) => Some(self.parcel_ref(&dock.id, land_id)?),
            None => self.locate_dock_parcel(&dock.position, parcel_tree, vertex_tree),
        };

        let node = self.add_node(GraphNode {
            id: dock.id.clone(),
            position: dock.position,
            kind: NodeKind::Dock,
            polygon_id: parcel.map(|idx| self.parcels[idx].id.clone()),
        })?;

        match parcel {
            Some(idx) => {
                for vertex in self.closest_boundary_vertices(idx, &dock.position) {
                    self.connect_walk(node, vertex);
                }
                self.parcels[idx].nodes.push(node);
            }
            None => debug!(dock = %dock.id, "dock is not attached to any parcel"),
        }

        self.docks
            .push(GeomWithData::new(self.projection.project(&dock.position), node));
        Ok(())
    }

    fn dock_ref(&self, id: &str) -> Result<NodeIndex, GraphBuildError> {
        self.node_ids
            .get(id)
            .copied()
            .filter(|&idx| self.graph[idx].is_dock())
            .ok_or_else(|| GraphBuildError::UnknownDock(id.to_string()))
    }

    fn add_canal(&mut self, canal: &CanalLink) -> Result<(), GraphBuildError> {
        let from = self.dock_ref(&canal.from)?;
        let to = self.dock_ref(&canal.to)?;
        if from == to {
            return Err(GraphBuildError::CanalLoop(canal.from.clone()));
        }

        let mut distance = 0.0;
        let mut previous = self.graph[from].position;
        for point in canal.waypoints.iter().chain(std::iter::once(&self.graph[to].position)) {
            distance += previous.distance_to(point);
            previous = *point;
        }

        self.graph
            .add_edge(from, to, GraphEdge::canal(distance, canal.waypoints.clone()));
        Ok(())
    }

    fn finish(self, parcel_tree: ParcelTree) -> GeoGraph {
        GeoGraph {
            graph: self.graph,
            parcels: self.parcels,
            parcel_tree,
            dock_tree: RTree::bulk_load(self.docks),
            projection: self.projection,
            node_ids: self.node_ids,
        }
    }
}

/// Rejects the first non-finite or out-of-range coordinate anywhere in the
/// geometry. Runs before anything is projected.
fn check_coordinates(geometry: &CityGeometry) -> Result<(), GraphBuildError> {
    for land in &geometry.lands {
        for point in &land.coordinates {
            check_point(&land.id, point)?;
        }
    }
    for bridge in &geometry.bridges {
        check_point(&bridge.id, &bridge.position)?;
    }
    for dock in &geometry.docks {
        check_point(&dock.id, &dock.position)?;
    }
    for canal in &geometry.canals {
        for waypoint in &canal.waypoints {
            check_point(&format!("canal {}-{}", canal.from, canal.to), waypoint)?;
        }
    }
    Ok(())
}

fn check_point(id: &str, point: &GeoPoint) -> Result<(), GraphBuildError> {
    point
        .validate()
        .map_err(|e| GraphBuildError::InvalidCoordinate {
            id: id.to_string(),
            message: e.to_string(),
        })
}

/// Distinct boundary vertices of a parcel, without the closing repeat.
fn boundary_ring(land: &LandParcel) -> Result<Vec<GeoPoint>, GraphBuildError> {
    let mut ring: Vec<GeoPoint> = Vec::with_capacity(land.coordinates.len());
    for point in &land.coordinates {
        if ring.last() != Some(point) {
            ring.push(*point);
        }
    }
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if ring.len() < 3 {
        return Err(GraphBuildError::DegenerateParcel(land.id.clone()));
    }
    Ok(ring)
}
