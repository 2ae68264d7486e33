//! Travel distance and time along a path.

use crate::config::RouterConfig;
use crate::domain::{Path, TransportMode};

/// Travel speeds per transport mode, in meters per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speeds {
    pub walk_mps: f64,
    pub gondola_mps: f64,
}

impl Speeds {
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            walk_mps: config.walk_speed_mps,
            gondola_mps: config.gondola_speed_mps(),
        }
    }

    pub fn for_mode(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Walk => self.walk_mps,
            TransportMode::Gondola => self.gondola_mps,
        }
    }
}

impl Default for Speeds {
    fn default() -> Self {
        Self::from_config(&RouterConfig::default())
    }
}

/// Total length and duration of a path.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TravelEstimate {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// Sums great-circle distance and travel time over consecutive points.
///
/// Each segment is travelled in the mode of the point it arrives at. Paths
/// of fewer than two points have zero length.
pub fn estimate(path: &Path, speeds: &Speeds) -> TravelEstimate {
    path.points()
        .windows(2)
        .fold(TravelEstimate::default(), |acc, pair| {
            let distance = pair[0].position.distance_to(&pair[1].position);
            let speed = speeds.for_mode(pair[1].mode());
            TravelEstimate {
                distance_meters: acc.distance_meters + distance,
                duration_seconds: acc.duration_seconds + distance / speed,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GeoPoint, PathPoint, haversine_meters};
    use proptest::prelude::*;

    fn pt(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng)
    }

    #[test]
    fn short_paths_are_free() {
        let speeds = Speeds::default();
        assert_eq!(estimate(&Path::default(), &speeds), TravelEstimate::default());

        let single = Path::new(vec![PathPoint::plain(pt(45.0, 12.0))]);
        assert_eq!(estimate(&single, &speeds), TravelEstimate::default());
    }

    #[test]
    fn default_speeds() {
        let speeds = Speeds::default();
        assert_eq!(speeds.walk_mps, 1.4);
        assert_eq!(speeds.gondola_mps, 2.8);
    }

    #[test]
    fn walking_segment() {
        let a = pt(45.4380, 12.3350);
        let b = pt(45.4360, 12.3390);
        let path = Path::new(vec![
            PathPoint::plain(a),
            PathPoint::plain(b).via(TransportMode::Walk),
        ]);

        let est = estimate(&path, &Speeds::default());
        let d = haversine_meters(&a, &b);
        assert!((est.distance_meters - d).abs() < 1e-9);
        assert!((est.duration_seconds - d / 1.4).abs() < 1e-9);
    }

    #[test]
    fn gondola_is_twice_as_fast() {
        let a = pt(45.4380, 12.3350);
        let b = pt(45.4360, 12.3390);
        let walk = Path::new(vec![
            PathPoint::plain(a),
            PathPoint::plain(b).via(TransportMode::Walk),
        ]);
        let boat = Path::new(vec![
            PathPoint::plain(a),
            PathPoint::plain(b).via(TransportMode::Gondola),
        ]);

        let speeds = Speeds::default();
        let walk = estimate(&walk, &speeds);
        let boat = estimate(&boat, &speeds);
        assert_eq!(walk.distance_meters, boat.distance_meters);
        assert!((walk.duration_seconds - 2.0 * boat.duration_seconds).abs() < 1e-9);
    }

    #[test]
    fn segment_mode_comes_from_arrival_point() {
        let a = pt(45.0, 12.0);
        let b = pt(45.001, 12.0);
        // Leaving a gondola stop on foot is walked
        let path = Path::new(vec![
            PathPoint::plain(a).via(TransportMode::Gondola),
            PathPoint::plain(b).via(TransportMode::Walk),
        ]);
        let est = estimate(&path, &Speeds::default());
        assert!((est.duration_seconds - est.distance_meters / 1.4).abs() < 1e-9);
    }

    #[test]
    fn origin_without_mode_defaults_to_walk_for_arrival() {
        let a = pt(45.0, 12.0);
        let b = pt(45.001, 12.0);
        let path = Path::new(vec![PathPoint::plain(a), PathPoint::plain(b)]);
        let est = estimate(&path, &Speeds::default());
        assert!((est.duration_seconds - est.distance_meters / 1.4).abs() < 1e-9);
    }

    fn arb_leg() -> impl Strategy<Value = (f64, f64, bool)> {
        (45.40f64..45.45, 12.30f64..12.36, any::<bool>())
    }

    proptest! {
        #[test]
        fn totals_match_segment_sums(legs in prop::collection::vec(arb_leg(), 2..20)) {
            let points: Vec<PathPoint> = legs
                .iter()
                .enumerate()
                .map(|(i, &(lat, lng, boat))| {
                    let p = PathPoint::plain(pt(lat, lng));
                    match (i, boat) {
                        (0, _) => p,
                        (_, true) => p.via(TransportMode::Gondola),
                        (_, false) => p.via(TransportMode::Walk),
                    }
                })
                .collect();
            let path = Path::new(points);
            let est = estimate(&path, &Speeds::default());

            let mut distance = 0.0;
            let mut duration = 0.0;
            for pair in path.points().windows(2) {
                let d = haversine_meters(&pair[0].position, &pair[1].position);
                distance += d;
                duration += d / if pair[1].mode() == TransportMode::Gondola { 2.8 } else { 1.4 };
            }

            prop_assert!(est.distance_meters >= 0.0);
            prop_assert!(est.duration_seconds >= 0.0);
            prop_assert!((est.distance_meters - distance).abs() < 1e-6);
            prop_assert!((est.duration_seconds - duration).abs() < 1e-6);
        }
    }
}
