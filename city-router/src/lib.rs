//! City router.
//!
//! Routes agents between two points of a city built from land parcels,
//! bridges and a canal network: walking over land and bridges, taking a
//! gondola between docks, and summarizing the trip as a short journey with
//! a travel time.

pub mod cache;
pub mod clock;
pub mod config;
pub mod directory;
pub mod domain;
pub mod geometry;
pub mod graph;
pub mod journey;
pub mod routing;
pub mod service;
pub mod transporter;
pub mod travel;

#[cfg(test)]
mod fixtures;

pub use service::{RefreshError, RouteRequest, RouteService};
