//! Caching layer for computed routes.
//!
//! Route searches are keyed by quantized endpoints and request mode.
//! Successful routes are kept for a week and failures for five minutes, so
//! an unreachable destination is retried soon while good routes stay cheap.
//!
//! Expiry is decided by the injected [`Clock`]; moka additionally evicts by
//! the same TTLs in wall time and by capacity.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use moka::Expiry;
use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::clock::Clock;
use crate::domain::{GeoPoint, RouteMode, RouteResult};

/// Configuration for the route cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for successful routes.
    pub success_ttl: Duration,

    /// TTL for failed searches.
    pub failure_ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,

    /// Decimal places endpoints are rounded to in cache keys.
    pub precision: u32,
}

impl CacheConfig {
    /// Set the TTL for successful routes.
    pub fn with_success_ttl(mut self, ttl: Duration) -> Self {
        self.success_ttl = ttl;
        self
    }

    /// Set the TTL for failed searches.
    pub fn with_failure_ttl(mut self, ttl: Duration) -> Self {
        self.failure_ttl = ttl;
        self
    }

    /// Set the key precision in decimal places.
    pub fn with_precision(mut self, places: u32) -> Self {
        self.precision = places;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            success_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            failure_ttl: Duration::from_secs(5 * 60),
            max_capacity: 10_000,
            precision: 6,
        }
    }
}

/// Which search a cached route came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheMode {
    Real,
    All,
    WaterOnly,
}

impl CacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Real => "real",
            CacheMode::All => "all",
            CacheMode::WaterOnly => "water_only",
        }
    }
}

impl From<RouteMode> for CacheMode {
    fn from(mode: RouteMode) -> Self {
        match mode {
            RouteMode::Real => CacheMode::Real,
            RouteMode::All => CacheMode::All,
        }
    }
}

/// Cache key: endpoints rounded to a grid, plus the request mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    origin: (i64, i64),
    destination: (i64, i64),
    mode: CacheMode,
}

impl RouteKey {
    pub fn new(origin: &GeoPoint, destination: &GeoPoint, mode: CacheMode, precision: u32) -> Self {
        Self {
            origin: quantize(origin, precision),
            destination: quantize(destination, precision),
            mode,
        }
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }
}

/// Rounds both components to `precision` decimal places, as integers.
fn quantize(point: &GeoPoint, precision: u32) -> (i64, i64) {
    let scale = 10f64.powi(precision as i32);
    (
        (point.lat * scale).round() as i64,
        (point.lng * scale).round() as i64,
    )
}

/// Cached route with its expiry.
#[derive(Debug)]
struct CacheEntry {
    result: RouteResult,
    expires_at: DateTime<Utc>,
    ttl: Duration,
}

/// Evicts each entry after its own TTL.
struct PerEntryTtl;

impl Expiry<RouteKey, Arc<CacheEntry>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &RouteKey,
        value: &Arc<CacheEntry>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &RouteKey,
        value: &Arc<CacheEntry>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Memoized route results.
///
/// Constructed explicitly and shared by the route service; [`clear`] flushes
/// it when the graph changes.
///
/// [`clear`]: RouteCache::clear
pub struct RouteCache {
    entries: MokaCache<RouteKey, Arc<CacheEntry>>,
    clock: Arc<dyn Clock>,
    success_ttl: Duration,
    failure_ttl: Duration,
    precision: u32,
}

impl RouteCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            entries,
            clock,
            success_ttl: config.success_ttl,
            failure_ttl: config.failure_ttl,
            precision: config.precision,
        }
    }

    /// Build the key for a query using this cache's precision.
    pub fn key(&self, origin: &GeoPoint, destination: &GeoPoint, mode: CacheMode) -> RouteKey {
        RouteKey::new(origin, destination, mode, self.precision)
    }

    /// Get a cached result that hasn't expired yet.
    pub async fn get(&self, key: &RouteKey) -> Option<RouteResult> {
        let entry = self.entries.get(key).await?;
        if self.clock.now() >= entry.expires_at {
            debug!(mode = key.mode.as_str(), "cached route expired");
            self.entries.invalidate(key).await;
            return None;
        }
        Some(entry.result.clone())
    }

    /// Store a result. Failures get the short TTL.
    pub async fn put(&self, key: RouteKey, result: RouteResult) {
        let ttl = if result.success {
            self.success_ttl
        } else {
            self.failure_ttl
        };
        let now = self.clock.now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        debug!(
            mode = key.mode.as_str(),
            success = result.success,
            ttl_secs = ttl.as_secs(),
            "caching route"
        );
        self.entries
            .insert(
                key,
                Arc::new(CacheEntry {
                    result,
                    expires_at,
                    ttl,
                }),
            )
            .await;
    }

    /// Number of live entries.
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::{Path, RouteError, RouteTiming};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    fn found() -> RouteResult {
        RouteResult::found(
            Path::default(),
            Vec::new(),
            RouteTiming::new(start(), 100.0, 70.0).unwrap(),
            None,
        )
    }

    fn setup() -> (Arc<ManualClock>, RouteCache) {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = RouteCache::new(&CacheConfig::default(), clock.clone());
        (clock, cache)
    }

    fn key(cache: &RouteCache) -> RouteKey {
        cache.key(
            &GeoPoint::new(45.4380, 12.3350),
            &GeoPoint::new(45.4360, 12.3390),
            CacheMode::Real,
        )
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.success_ttl, Duration::from_secs(604_800));
        assert_eq!(config.failure_ttl, Duration::from_secs(300));
        assert_eq!(config.max_capacity, 10_000);
        assert_eq!(config.precision, 6);
    }

    #[test]
    fn modes_are_distinct_keys() {
        let a = GeoPoint::new(45.0, 12.0);
        let b = GeoPoint::new(45.1, 12.1);
        let real = RouteKey::new(&a, &b, CacheMode::Real, 6);
        let all = RouteKey::new(&a, &b, CacheMode::All, 6);
        let water = RouteKey::new(&a, &b, CacheMode::WaterOnly, 6);
        assert_ne!(real, all);
        assert_ne!(real, water);
        assert_ne!(all, water);
        assert_eq!(CacheMode::from(RouteMode::Real), CacheMode::Real);
        assert_eq!(CacheMode::WaterOnly.as_str(), "water_only");
    }

    #[test]
    fn direction_matters() {
        let a = GeoPoint::new(45.0, 12.0);
        let b = GeoPoint::new(45.1, 12.1);
        assert_ne!(
            RouteKey::new(&a, &b, CacheMode::Real, 6),
            RouteKey::new(&b, &a, CacheMode::Real, 6)
        );
    }

    #[test]
    fn coarse_precision_merges_nearby_points() {
        let a = GeoPoint::new(45.43801, 12.33502);
        let b = GeoPoint::new(45.43799, 12.33498);
        let dest = GeoPoint::new(45.4360, 12.3390);
        assert_eq!(
            RouteKey::new(&a, &dest, CacheMode::Real, 4),
            RouteKey::new(&b, &dest, CacheMode::Real, 4)
        );
        assert_ne!(
            RouteKey::new(&a, &dest, CacheMode::Real, 6),
            RouteKey::new(&b, &dest, CacheMode::Real, 6)
        );
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let (_, cache) = setup();
        let key = key(&cache);
        assert_eq!(cache.get(&key).await, None);

        cache.put(key.clone(), found()).await;
        assert_eq!(cache.get(&key).await, Some(found()));
        assert_eq!(cache.entry_count().await, 1);
    }

    #[tokio::test]
    async fn failure_expires_after_five_minutes() {
        let (clock, cache) = setup();
        let key = key(&cache);
        cache
            .put(key.clone(), RouteResult::failure(&RouteError::NoPathFound))
            .await;

        clock.advance(chrono::Duration::minutes(4));
        assert!(cache.get(&key).await.is_some());

        clock.advance(chrono::Duration::minutes(1));
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn success_lives_for_a_week() {
        let (clock, cache) = setup();
        let key = key(&cache);
        cache.put(key.clone(), found()).await;

        clock.advance(chrono::Duration::days(6));
        assert!(cache.get(&key).await.is_some());

        clock.advance(chrono::Duration::days(1));
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn clear_flushes_everything() {
        let (_, cache) = setup();
        let key = key(&cache);
        cache.put(key.clone(), found()).await;

        cache.clear();
        assert_eq!(cache.get(&key).await, None);
        assert_eq!(cache.entry_count().await, 0);
    }

    proptest! {
        #[test]
        fn quantization_snaps_to_grid(
            lat_q in -90_000_000i64..=90_000_000,
            lng_q in -180_000_000i64..=180_000_000,
            nudge in -0.4f64..0.4,
        ) {
            let point = GeoPoint::new(
                (lat_q as f64 + nudge) / 1e6,
                (lng_q as f64 - nudge) / 1e6,
            );
            prop_assert_eq!(quantize(&point, 6), (lat_q, lng_q));
        }

        #[test]
        fn keys_are_stable(lat in -90.0f64..90.0, lng in -180.0f64..180.0) {
            let p = GeoPoint::new(lat, lng);
            prop_assert_eq!(
                RouteKey::new(&p, &p, CacheMode::All, 6),
                RouteKey::new(&GeoPoint::new(lat, lng), &p, CacheMode::All, 6)
            );
        }
    }
}
