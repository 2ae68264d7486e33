//! Router configuration.

use std::time::Duration;

/// Configuration parameters for graph construction and route search.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Walking speed in meters per second.
    pub walk_speed_mps: f64,

    /// Gondola speed as a multiple of walking speed.
    pub gondola_speed_factor: f64,

    /// Boundary vertices of different parcels closer than this (meters)
    /// are joined by a walking edge.
    pub adjacency_tolerance_m: f64,

    /// How many boundary vertices of a parcel each bridge or dock is
    /// linked to.
    pub vertex_links: usize,

    /// Maximum distance (meters) from a raw coordinate to its nearest dock
    /// for water-only routing.
    pub max_dock_snap_m: f64,

    /// Default deadline for a query when the caller doesn't supply one.
    pub query_timeout_ms: u64,

    /// Maximum number of concurrent dock-operator lookups per query.
    pub transporter_concurrency: usize,
}

/// A configuration value the router can't work with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be non-negative and finite, got {value}")]
    Negative { name: &'static str, value: f64 },
}

impl RouterConfig {
    /// Checks speeds are positive and distances non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("walk_speed_mps", self.walk_speed_mps),
            ("gondola_speed_factor", self.gondola_speed_factor),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        for (name, value) in [
            ("adjacency_tolerance_m", self.adjacency_tolerance_m),
            ("max_dock_snap_m", self.max_dock_snap_m),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }
        Ok(())
    }

    /// Returns the gondola speed in meters per second.
    pub fn gondola_speed_mps(&self) -> f64 {
        self.walk_speed_mps * self.gondola_speed_factor
    }

    /// Returns the default query timeout as a Duration.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Set the default query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the maximum dock snapping distance.
    pub fn with_max_dock_snap(mut self, meters: f64) -> Self {
        self.max_dock_snap_m = meters;
        self
    }

    /// Set the fan-out width for operator lookups.
    pub fn with_transporter_concurrency(mut self, n: usize) -> Self {
        self.transporter_concurrency = n.max(1);
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            walk_speed_mps: 1.4,
            gondola_speed_factor: 2.0,
            adjacency_tolerance_m: 3.0,
            vertex_links: 2,
            max_dock_snap_m: 500.0,
            query_timeout_ms: 10_000,
            transporter_concurrency: 4,
        }
    }
}
