//! Working out who operates the canal legs of a route.

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::directory::{BuildingDirectory, DirectoryError};
use crate::domain::{Path, RouteError};

/// Looks up the operator of the docks a route passes through.
///
/// Only paths that use a gondola are resolved. Docks are looked up with at
/// most `concurrency` requests in flight and the first lookup to complete
/// with an operator wins; the rest are dropped. Failed lookups are logged
/// and otherwise ignored, so a directory outage leaves the transporter
/// empty rather than failing the route.
pub async fn resolve_transporter<D: BuildingDirectory>(
    path: &Path,
    directory: &D,
    concurrency: usize,
) -> Option<String> {
    if !path.uses_gondola() {
        return None;
    }

    let docks = path.dock_ids();
    debug!(docks = docks.len(), "resolving transporter");

    let mut lookups = stream::iter(docks)
        .map(|id| async move { (id, directory.get_building(id).await) })
        .buffer_unordered(concurrency.max(1));

    while let Some((id, result)) = lookups.next().await {
        match result {
            Ok(building) => {
                if let Some(operator) = building.operator_id {
                    debug!(dock = id, %operator, "resolved transporter");
                    return Some(operator);
                }
            }
            Err(e) => {
                let failure = upstream_failure(id, &e);
                warn!(dock = id, code = failure.code().as_str(), error = %failure, "dock lookup failed");
            }
        }
    }

    None
}

fn upstream_failure(id: &str, err: &DirectoryError) -> RouteError {
    RouteError::UpstreamLookupFailure {
        building_id: id.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::directory::{Building, StaticBuildingDirectory};
    use crate::domain::{GeoPoint, PathPoint, TransportMode};

    fn pt(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng)
    }

    fn dock(id: &str, operator: Option<&str>) -> Building {
        Building {
            id: id.to_string(),
            position: pt(45.0, 12.0),
            operator_id: operator.map(str::to_string),
        }
    }

    fn canal_path(docks: &[&str]) -> Path {
        let mut points = vec![PathPoint::land(pt(45.0, 12.0), "a")];
        for (i, id) in docks.iter().enumerate() {
            let mode = if i == 0 {
                TransportMode::Walk
            } else {
                TransportMode::Gondola
            };
            points.push(PathPoint::dock(pt(45.0, 12.0 + i as f64 * 0.001), *id).via(mode));
        }
        Path::new(points)
    }

    /// Directory that answers after a per-building delay and records calls.
    struct SlowDirectory {
        buildings: HashMap<String, (Building, Duration)>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: Mutex<usize>,
    }

    impl SlowDirectory {
        fn new(entries: Vec<(Building, u64)>) -> Self {
            Self {
                buildings: entries
                    .into_iter()
                    .map(|(b, ms)| (b.id.clone(), (b, Duration::from_millis(ms))))
                    .collect(),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: Mutex::new(0),
            }
        }
    }

    impl BuildingDirectory for SlowDirectory {
        async fn get_building(&self, id: &str) -> Result<Building, DirectoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            {
                let mut max = self.max_in_flight.lock().unwrap();
                *max = (*max).max(now);
            }
            let entry = self.buildings.get(id).cloned();
            if let Some((_, delay)) = &entry {
                tokio::time::sleep(*delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            entry
                .map(|(b, _)| b)
                .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
        }
    }

    #[tokio::test]
    async fn walking_routes_skip_lookup() {
        let directory = SlowDirectory::new(vec![(dock("d1", Some("op")), 0)]);
        let path = Path::new(vec![
            PathPoint::land(pt(45.0, 12.0), "a"),
            PathPoint::dock(pt(45.0, 12.001), "d1").via(TransportMode::Walk),
        ]);

        assert_eq!(resolve_transporter(&path, &directory, 4).await, None);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn first_completed_operator_wins() {
        let directory = SlowDirectory::new(vec![
            (dock("d1", Some("slow-op")), 200),
            (dock("d2", Some("fast-op")), 5),
        ]);
        let path = canal_path(&["d1", "d2"]);

        assert_eq!(
            resolve_transporter(&path, &directory, 4).await.as_deref(),
            Some("fast-op")
        );
    }

    #[tokio::test]
    async fn docks_without_operator_are_skipped() {
        let directory = StaticBuildingDirectory::new([dock("d1", None), dock("d2", Some("op-2"))]);
        let path = canal_path(&["d1", "d2"]);

        assert_eq!(
            resolve_transporter(&path, &directory, 1).await.as_deref(),
            Some("op-2")
        );
    }

    #[tokio::test]
    async fn lookup_failures_are_not_fatal() {
        let directory = StaticBuildingDirectory::new([dock("d2", Some("op-2"))]);
        let path = canal_path(&["missing", "d2"]);
        assert_eq!(
            resolve_transporter(&path, &directory, 2).await.as_deref(),
            Some("op-2")
        );

        let empty = StaticBuildingDirectory::default();
        assert_eq!(resolve_transporter(&path, &empty, 2).await, None);
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let directory = SlowDirectory::new(
            (0..6)
                .map(|i| (dock(&format!("d{i}"), None), 10))
                .collect(),
        );
        let path = canal_path(&["d0", "d1", "d2", "d3", "d4", "d5"]);

        assert_eq!(resolve_transporter(&path, &directory, 2).await, None);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 6);
        assert!(*directory.max_in_flight.lock().unwrap() <= 2);
    }

    #[test]
    fn failures_carry_the_upstream_code() {
        let err = upstream_failure("d1", &DirectoryError::NotFound("d1".into()));
        assert_eq!(err.code(), crate::domain::ErrorCode::UpstreamLookupFailure);
        assert!(err.to_string().contains("d1"));
    }
}
