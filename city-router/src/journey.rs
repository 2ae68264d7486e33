//! Condensing a path into the waypoints worth telling a traveller about.

use crate::domain::{JourneyEvent, JourneyEventKind, Path, PointKind};

/// Summarizes a path as land, bridge and dock events.
///
/// Canal waypoints are skipped. A land event is emitted whenever the path
/// enters a parcel other than the current one; bridges and docks don't
/// change the current parcel, so walking off a bridge back onto the same
/// parcel emits nothing.
pub fn summarize(path: &Path) -> Vec<JourneyEvent> {
    let mut events = Vec::new();
    let mut current_parcel: Option<&str> = None;

    for point in path.points() {
        match &point.kind {
            PointKind::Land { polygon_id } => {
                if current_parcel != Some(polygon_id.as_str()) {
                    events.push(JourneyEvent::new(
                        JourneyEventKind::Land,
                        polygon_id.as_str(),
                        point.position,
                        point.mode(),
                    ));
                    current_parcel = Some(polygon_id);
                }
            }
            PointKind::Bridge { node_id } => events.push(JourneyEvent::new(
                JourneyEventKind::Bridge,
                node_id.as_str(),
                point.position,
                point.mode(),
            )),
            PointKind::Dock { node_id } => events.push(JourneyEvent::new(
                JourneyEventKind::Dock,
                node_id.as_str(),
                point.position,
                point.mode(),
            )),
            PointKind::Plain { .. } => {}
        }
    }

    events
}
