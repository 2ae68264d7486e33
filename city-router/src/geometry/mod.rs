//! Static city geometry.
//!
//! Land parcels, bridges, docks and canal links as delivered by the geometry
//! source. This is raw input: nothing here is validated until the graph
//! builder consumes it.

mod error;
mod source;
mod types;

pub use error::GeometryError;
pub use source::{FileGeometrySource, GeometrySource};
pub use types::{BridgeSpec, CanalLink, CityGeometry, DockSpec, LandParcel};
