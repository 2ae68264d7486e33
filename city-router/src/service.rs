//! The route service: the one entry point callers use.
//!
//! A query goes through the cache first. On a miss the land search runs,
//! falling back to a canal-only search when an endpoint is off land; the
//! path is then summarized, timed and attributed to a transporter before
//! being cached and returned.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{CacheConfig, CacheMode, RouteCache};
use crate::clock::{Clock, SystemClock};
use crate::config::RouterConfig;
use crate::directory::BuildingDirectory;
use crate::domain::{GeoPoint, Path, RouteError, RouteMode, RouteResult, RouteTiming};
use crate::geometry::{CityGeometry, GeometryError, GeometrySource};
use crate::graph::{GeoGraph, GraphBuildError, build_graph};
use crate::journey::summarize;
use crate::routing::{Deadline, PathFinder, WaterOnlyPathFinder};
use crate::transporter::resolve_transporter;
use crate::travel::{Speeds, estimate};

/// A route query.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub mode: RouteMode,
    /// Departure time; now when absent.
    pub start_date: Option<DateTime<Utc>>,
    /// Search deadline; the configured default when absent.
    pub timeout: Option<Duration>,
}

impl RouteRequest {
    /// Create a request over constructed bridges only, leaving now.
    pub fn new(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self {
            origin,
            destination,
            mode: RouteMode::Real,
            start_date: None,
            timeout: None,
        }
    }

    pub fn with_mode(mut self, mode: RouteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn starting_at(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check both endpoints are usable coordinates.
    pub fn validate(&self) -> Result<(), RouteError> {
        self.origin.validate()?;
        self.destination.validate()
    }
}

/// Error from replacing the city graph.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("failed to load geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("failed to build graph: {0}")]
    Graph(#[from] GraphBuildError),
}

/// Which search a query runs.
#[derive(Debug, Clone, Copy)]
enum Search {
    Land(RouteMode),
    WaterOnly,
}

impl Search {
    fn cache_mode(self) -> CacheMode {
        match self {
            Search::Land(mode) => mode.into(),
            Search::WaterOnly => CacheMode::WaterOnly,
        }
    }
}

/// Routes agents through the city.
///
/// Holds the current graph snapshot, the route cache and the building
/// directory. Queries take a clone of the snapshot `Arc` and never block a
/// refresh; a refresh publishes a fully built graph in one swap.
pub struct RouteService<D> {
    graph: RwLock<Arc<GeoGraph>>,
    cache: RouteCache,
    directory: D,
    clock: Arc<dyn Clock>,
    config: RouterConfig,
}

impl<D: BuildingDirectory> RouteService<D> {
    /// Create a service using the system clock.
    pub fn new(graph: GeoGraph, directory: D, config: RouterConfig, cache_config: &CacheConfig) -> Self {
        Self::with_clock(graph, directory, config, cache_config, Arc::new(SystemClock))
    }

    /// Create a service reading time from `clock`.
    pub fn with_clock(
        graph: GeoGraph,
        directory: D,
        config: RouterConfig,
        cache_config: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            graph: RwLock::new(Arc::new(graph)),
            cache: RouteCache::new(cache_config, clock.clone()),
            directory,
            clock,
            config,
        }
    }

    /// Build the graph from `geometry` and create a service around it.
    pub fn from_geometry(
        geometry: &CityGeometry,
        directory: D,
        config: RouterConfig,
        cache_config: &CacheConfig,
    ) -> Result<Self, GraphBuildError> {
        let graph = build_graph(geometry, &config)?;
        Ok(Self::new(graph, directory, config, cache_config))
    }

    /// The current graph snapshot.
    pub async fn graph(&self) -> Arc<GeoGraph> {
        self.graph.read().await.clone()
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Find a route between two points, over land where possible.
    ///
    /// Falls back to canals only when an endpoint is off land. Never fails:
    /// problems are reported in the result's `error`.
    pub async fn find_route(&self, request: &RouteRequest) -> RouteResult {
        self.route(request, Search::Land(request.mode)).await
    }

    /// Find a route that travels by gondola the whole way.
    ///
    /// The request's mode is ignored.
    pub async fn find_water_only_route(&self, request: &RouteRequest) -> RouteResult {
        self.route(request, Search::WaterOnly).await
    }

    /// Replace the graph with one built from `geometry`.
    ///
    /// Builds first; on error the current graph stays in place. On success
    /// the cache is flushed since cached routes describe the old topology.
    pub async fn refresh_geometry(&self, geometry: &CityGeometry) -> Result<(), GraphBuildError> {
        let graph = build_graph(geometry, &self.config).inspect_err(|e| {
            warn!(error = %e, "graph rebuild failed, keeping current graph");
        })?;
        let (nodes, edges) = (graph.node_count(), graph.edge_count());

        *self.graph.write().await = Arc::new(graph);
        self.cache.clear();

        info!(nodes, edges, "swapped city graph");
        Ok(())
    }

    /// Load geometry from `source` and refresh the graph with it.
    pub async fn reload(&self, source: &impl GeometrySource) -> Result<(), RefreshError> {
        let geometry = source.load()?;
        self.refresh_geometry(&geometry).await?;
        Ok(())
    }

    async fn route(&self, request: &RouteRequest, search: Search) -> RouteResult {
        let start = request.start_date.unwrap_or_else(|| self.clock.now());

        if let Err(e) = request.validate() {
            debug!(error = %e, "rejected route request");
            return RouteResult::failure(&e);
        }

        let mode = search.cache_mode();
        let key = self
            .cache
            .key(&request.origin, &request.destination, mode);
        if let Some(cached) = self.cache.get(&key).await {
            debug!(mode = mode.as_str(), "route cache hit");
            return cached
                .retimed(start)
                .unwrap_or_else(|e| RouteResult::failure(&e));
        }
        debug!(mode = mode.as_str(), "route cache miss");

        let deadline = Deadline::after(request.timeout.unwrap_or_else(|| self.config.query_timeout()));
        let graph = self.graph().await;

        let (result, cacheable) = match self.compute(&graph, request, search, start, &deadline).await {
            Ok(result) => (result, true),
            Err(e) => {
                if e == RouteError::Timeout {
                    warn!(origin = %request.origin, destination = %request.destination, "route search timed out");
                } else {
                    debug!(code = e.code().as_str(), "route search failed");
                }
                (RouteResult::failure(&e), e.is_cacheable())
            }
        };

        if cacheable {
            self.cache.put(key, result.clone()).await;
        }
        result
    }

    async fn compute(
        &self,
        graph: &GeoGraph,
        request: &RouteRequest,
        search: Search,
        start: DateTime<Utc>,
        deadline: &Deadline,
    ) -> Result<RouteResult, RouteError> {
        let path = match search {
            Search::Land(mode) => {
                match PathFinder::new(graph, mode).find_path(request.origin, request.destination, deadline) {
                    Err(RouteError::NotNavigable) => {
                        info!(
                            origin = %request.origin,
                            destination = %request.destination,
                            "endpoint off land, trying canals only"
                        );
                        self.water_path(graph, request, deadline)?
                    }
                    other => other?,
                }
            }
            Search::WaterOnly => self.water_path(graph, request, deadline)?,
        };

        let journey = summarize(&path);
        let travel = estimate(&path, &Speeds::from_config(&self.config));
        let transporter = tokio::time::timeout(
            deadline.remaining(),
            resolve_transporter(&path, &self.directory, self.config.transporter_concurrency),
        )
        .await
        .map_err(|_| RouteError::Timeout)?;

        Ok(RouteResult::found(
            path,
            journey,
            RouteTiming::new(start, travel.distance_meters, travel.duration_seconds)?,
            transporter,
        ))
    }

    fn water_path(
        &self,
        graph: &GeoGraph,
        request: &RouteRequest,
        deadline: &Deadline,
    ) -> Result<Path, RouteError> {
        WaterOnlyPathFinder::new(graph, self.config.max_dock_snap_m).find_path(
            request.origin,
            request.destination,
            deadline,
        )
    }
}
