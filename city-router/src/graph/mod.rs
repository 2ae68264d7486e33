//! The city graph: land parcels, bridges, docks and canals as one weighted
//! network with spatial indices for endpoint snapping.

mod builder;
mod error;
mod index;
mod model;

pub use builder::build_graph;
pub use error::GraphBuildError;
pub use model::{GeoGraph, GraphEdge, GraphNode, NetworkGraph, NodeKind};
