//! Domain types for the city router.
//!
//! Coordinates, typed path points, journey events and route results, plus
//! the routing error taxonomy. These are the only types that cross the
//! service boundary.

mod error;
mod journey;
mod mode;
mod path;
mod point;
mod route;

pub use error::{ErrorCode, RouteError};
pub use journey::{JourneyEvent, JourneyEventKind};
pub use mode::{RouteMode, TransportMode};
pub use path::{Path, PathPoint, PointKind};
pub use point::{EARTH_RADIUS_M, GeoPoint, haversine_meters};
pub use route::{RouteFailure, RouteResult, RouteTiming, travel_duration};
