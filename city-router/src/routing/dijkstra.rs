//! Multi-source, multi-target Dijkstra over the city graph.
//!
//! Endpoints are not graph nodes: the origin reaches a set of source nodes
//! at a known cost and each target node reaches the destination at a known
//! tail cost. Seeding sources and finishing at targets this way keeps the
//! shared graph untouched by queries.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use petgraph::graph::{EdgeIndex, NodeIndex};
use tracing::trace;

use crate::domain::RouteError;
use crate::graph::{GeoGraph, GraphEdge, GraphNode};

use super::deadline::Deadline;

/// Heap pops between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 256;

/// Search label. Ordered by cost, then number of segments, then node
/// index, reversed so `BinaryHeap` pops the smallest first.
#[derive(Debug, Clone, Copy)]
struct State {
    cost: f64,
    hops: usize,
    node: NodeIndex,
}

impl State {
    fn key_cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.hops.cmp(&other.hops))
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key_cmp(self)
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.key_cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

/// Cheapest route found between the virtual origin and destination.
#[derive(Debug, Clone)]
pub(crate) struct GraphRoute {
    /// Graph nodes visited, first to last.
    pub(crate) nodes: Vec<NodeIndex>,
    /// `edges[i]` joins `nodes[i]` and `nodes[i + 1]`.
    pub(crate) edges: Vec<EdgeIndex>,
    /// Total cost including the origin and destination segments.
    pub(crate) cost: f64,
}

/// Runs the search.
///
/// `sources` are `(node, cost from origin)` pairs and `targets` map nodes to
/// their cost onward to the destination. `allow(edge, node)` decides whether
/// `node` may be entered over `edge`.
///
/// Among routes of equal cost the one with fewer segments wins; remaining
/// ties go to the lower final node index.
pub(crate) fn shortest_route<F>(
    graph: &GeoGraph,
    sources: &[(NodeIndex, f64)],
    targets: &HashMap<NodeIndex, f64>,
    allow: F,
    deadline: &Deadline,
) -> Result<Option<GraphRoute>, RouteError>
where
    F: Fn(&GraphEdge, &GraphNode) -> bool,
{
    let node_count = graph.node_count();
    let mut labels: Vec<Option<(f64, usize)>> = vec![None; node_count];
    let mut predecessors: Vec<Option<(NodeIndex, EdgeIndex)>> = vec![None; node_count];
    let mut heap = BinaryHeap::new();

    for &(node, cost) in sources {
        if improves(labels[node.index()], cost, 1) {
            labels[node.index()] = Some((cost, 1));
            heap.push(State {
                cost,
                hops: 1,
                node,
            });
        }
    }

    let mut best: Option<State> = None;
    let mut pops = 0usize;

    while let Some(state) = heap.pop() {
        pops += 1;
        if pops % DEADLINE_CHECK_INTERVAL == 0 {
            deadline.check()?;
        }

        if best.is_some_and(|b| state.cost > b.cost) {
            break;
        }

        // Stale entry
        if labels[state.node.index()] != Some((state.cost, state.hops)) {
            continue;
        }

        if let Some(&tail) = targets.get(&state.node) {
            let candidate = State {
                cost: state.cost + tail,
                hops: state.hops + 1,
                node: state.node,
            };
            if best.is_none_or(|b| candidate.key_cmp(&b) == Ordering::Less) {
                best = Some(candidate);
            }
        }

        for (edge_idx, next, edge) in graph.neighbours(state.node) {
            if !allow(edge, graph.node(next)) {
                continue;
            }
            let cost = state.cost + edge.distance_m;
            let hops = state.hops + 1;
            if improves(labels[next.index()], cost, hops) {
                labels[next.index()] = Some((cost, hops));
                predecessors[next.index()] = Some((state.node, edge_idx));
                heap.push(State {
                    cost,
                    hops,
                    node: next,
                });
            }
        }
    }

    trace!(pops, found = best.is_some(), "dijkstra finished");

    Ok(best.map(|end| {
        let mut nodes = vec![end.node];
        let mut edges = Vec::new();
        let mut current = end.node;
        while let Some((previous, edge)) = predecessors[current.index()] {
            nodes.push(previous);
            edges.push(edge);
            current = previous;
        }
        nodes.reverse();
        edges.reverse();
        GraphRoute {
            nodes,
            edges,
            cost: end.cost,
        }
    }))
}

fn improves(label: Option<(f64, usize)>, cost: f64, hops: usize) -> bool {
    match label {
        None => true,
        Some((old_cost, old_hops)) => match cost.total_cmp(&old_cost) {
            Ordering::Less => true,
            Ordering::Equal => hops < old_hops,
            Ordering::Greater => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::RouterConfig;
    use crate::domain::TransportMode;
    use crate::fixtures;
    use crate::graph::build_graph;

    fn city() -> GeoGraph {
        build_graph(&fixtures::lagoon_city(), &RouterConfig::default()).unwrap()
    }

    fn live() -> Deadline {
        Deadline::after(Duration::from_secs(60))
    }

    fn node(graph: &GeoGraph, id: &str) -> NodeIndex {
        graph.node_by_id(id).unwrap()
    }

    #[test]
    fn heap_pops_cheapest_then_fewest_hops() {
        let mut heap = BinaryHeap::new();
        heap.push(State { cost: 5.0, hops: 1, node: NodeIndex::new(0) });
        heap.push(State { cost: 2.0, hops: 4, node: NodeIndex::new(1) });
        heap.push(State { cost: 2.0, hops: 2, node: NodeIndex::new(2) });
        heap.push(State { cost: 2.0, hops: 2, node: NodeIndex::new(3) });

        let order: Vec<usize> = std::iter::from_fn(|| heap.pop())
            .map(|s| s.node.index())
            .collect();
        assert_eq!(order, vec![2, 3, 1, 0]);
    }

    #[test]
    fn source_that_is_also_target() {
        let graph = city();
        let dock = node(&graph, "dock-a");
        let targets = HashMap::from([(dock, 4.0)]);

        let route = shortest_route(&graph, &[(dock, 3.0)], &targets, |_, _| true, &live())
            .unwrap()
            .unwrap();
        assert_eq!(route.nodes, vec![dock]);
        assert!(route.edges.is_empty());
        assert_eq!(route.cost, 7.0);
    }

    #[test]
    fn follows_canal_between_docks() {
        let graph = city();
        let from = node(&graph, "dock-a");
        let to = node(&graph, "dock-lagoon");
        let targets = HashMap::from([(to, 0.0)]);

        let route = shortest_route(
            &graph,
            &[(from, 0.0)],
            &targets,
            |edge, next| edge.mode == TransportMode::Gondola && next.is_dock(),
            &live(),
        )
        .unwrap()
        .unwrap();

        let ids: Vec<&str> = route
            .nodes
            .iter()
            .map(|&idx| graph.node(idx).id.as_str())
            .collect();
        assert_eq!(ids, vec!["dock-a", "dock-b", "dock-lagoon"]);
        assert_eq!(route.edges.len(), 2);

        let expected: f64 = route.edges.iter().map(|&e| graph.edge(e).distance_m).sum();
        assert!((route.cost - expected).abs() < 1e-9);
    }

    #[test]
    fn filter_can_disconnect_targets() {
        let graph = city();
        let from = node(&graph, "dock-a");
        let to = node(&graph, "dock-lagoon");
        let targets = HashMap::from([(to, 0.0)]);

        let route = shortest_route(
            &graph,
            &[(from, 0.0)],
            &targets,
            |edge, _| edge.mode == TransportMode::Walk,
            &live(),
        )
        .unwrap();
        assert!(route.is_none());
    }

    #[test]
    fn picks_cheapest_target_including_tail() {
        let graph = city();
        let from = node(&graph, "land-a#0");
        let near = node(&graph, "land-a#1");
        let far = node(&graph, "land-a#2");
        // The far target's tail makes it cheaper overall
        let targets = HashMap::from([(near, 1_000.0), (far, 0.0)]);

        let route = shortest_route(&graph, &[(from, 0.0)], &targets, |_, _| true, &live())
            .unwrap()
            .unwrap();
        assert_eq!(route.nodes.last(), Some(&far));
    }

    #[test]
    fn adjacent_target_is_reached_directly() {
        let graph = city();
        let from = node(&graph, "land-a#0");
        let to = node(&graph, "land-a#1");
        let direct = graph
            .neighbours(from)
            .find(|(_, other, _)| *other == to)
            .map(|(_, _, edge)| edge.distance_m)
            .unwrap();
        let targets = HashMap::from([(to, 0.0)]);
        let route = shortest_route(&graph, &[(from, 0.0)], &targets, |_, _| true, &live())
            .unwrap()
            .unwrap();
        assert_eq!(route.nodes, vec![from, to]);
        assert!((route.cost - direct).abs() < 1e-9);
    }

    #[test]
    fn unreachable_target_returns_none() {
        let graph = city();
        let from = node(&graph, "land-a#0");
        let island = node(&graph, "island#hub");
        let targets = HashMap::from([(island, 0.0)]);

        let route = shortest_route(&graph, &[(from, 0.0)], &targets, |_, _| true, &live()).unwrap();
        assert!(route.is_none());
    }

    #[test]
    fn no_sources_returns_none() {
        let graph = city();
        let targets = HashMap::from([(node(&graph, "land-a#0"), 0.0)]);
        let route = shortest_route(&graph, &[], &targets, |_, _| true, &live()).unwrap();
        assert!(route.is_none());
    }
}
