//! Shortest-route search over the city graph.

mod deadline;
mod dijkstra;
mod path_finder;
mod water;

pub use deadline::Deadline;
pub use path_finder::PathFinder;
pub use water::WaterOnlyPathFinder;
