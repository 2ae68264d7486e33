//! Route query results.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{ErrorCode, JourneyEvent, Path, RouteError};

/// Wall-clock timing of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTiming {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub duration_seconds: f64,
    pub distance_meters: f64,
}

impl RouteTiming {
    /// Builds timing for a trip of the given length leaving at `start_date`.
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidInput`] if the duration isn't a finite,
    /// non-negative number of seconds or the arrival overflows the calendar.
    pub fn new(
        start_date: DateTime<Utc>,
        distance_meters: f64,
        duration_seconds: f64,
    ) -> Result<Self, RouteError> {
        let end_date = travel_duration(duration_seconds)
            .ok_or_else(|| {
                RouteError::InvalidInput(format!("travel time {duration_seconds}s is not usable"))
            })
            .and_then(|duration| {
                start_date.checked_add_signed(duration).ok_or_else(|| {
                    RouteError::InvalidInput(format!("start date {start_date} is too late"))
                })
            })?;

        Ok(Self {
            start_date,
            end_date,
            duration_seconds,
            distance_meters,
        })
    }

    /// Same trip, leaving at a different time.
    pub fn starting_at(&self, start_date: DateTime<Utc>) -> Result<Self, RouteError> {
        Self::new(start_date, self.distance_meters, self.duration_seconds)
    }
}

/// Converts fractional seconds to a chrono duration at millisecond precision.
///
/// `None` for negative, non-finite or unrepresentably long durations.
pub fn travel_duration(seconds: f64) -> Option<Duration> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis < 0.0 || millis >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

/// Structured error carried by a failed result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteFailure {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&RouteError> for RouteFailure {
    fn from(err: &RouteError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Outcome of a route query.
///
/// `success == false` means "no route available now", never a crash; the
/// `error` field says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub success: bool,
    pub path: Path,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<RouteTiming>,
    pub journey: Vec<JourneyEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transporter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RouteFailure>,
}

impl RouteResult {
    pub fn found(
        path: Path,
        journey: Vec<JourneyEvent>,
        timing: RouteTiming,
        transporter: Option<String>,
    ) -> Self {
        Self {
            success: true,
            path,
            timing: Some(timing),
            journey,
            transporter,
            error: None,
        }
    }

    pub fn failure(err: &RouteError) -> Self {
        Self {
            success: false,
            path: Path::default(),
            timing: None,
            journey: Vec::new(),
            transporter: None,
            error: Some(err.into()),
        }
    }

    pub fn distance_meters(&self) -> f64 {
        self.timing.as_ref().map_or(0.0, |t| t.distance_meters)
    }

    pub fn duration_seconds(&self) -> f64 {
        self.timing.as_ref().map_or(0.0, |t| t.duration_seconds)
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }

    /// Copy of this result with its timing shifted to a new start date.
    ///
    /// Path, distance and duration are kept verbatim.
    pub fn retimed(&self, start_date: DateTime<Utc>) -> Result<Self, RouteError> {
        let mut result = self.clone();
        result.timing = self
            .timing
            .as_ref()
            .map(|t| t.starting_at(start_date))
            .transpose()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn end_date_adds_duration() {
        let timing = RouteTiming::new(start(), 420.0, 300.0).unwrap();
        assert_eq!(timing.end_date, start() + Duration::seconds(300));
    }

    #[test]
    fn fractional_duration_rounds_to_millis() {
        let timing = RouteTiming::new(start(), 1.4, 1.0004).unwrap();
        assert_eq!(timing.end_date, start() + Duration::milliseconds(1000));
    }

    #[test]
    fn arrival_past_the_calendar_is_invalid() {
        assert!(matches!(
            RouteTiming::new(DateTime::<Utc>::MAX_UTC, 100.0, 60.0),
            Err(RouteError::InvalidInput(_))
        ));
        // A zero-length trip still fits
        assert!(RouteTiming::new(DateTime::<Utc>::MAX_UTC, 0.0, 0.0).is_ok());
    }

    #[test]
    fn unusable_durations_are_invalid() {
        for seconds in [f64::INFINITY, f64::NAN, -1.0, 1e300] {
            assert_eq!(travel_duration(seconds), None, "{seconds}");
            assert!(matches!(
                RouteTiming::new(start(), 10.0, seconds),
                Err(RouteError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn failure_has_code_and_no_timing() {
        let result = RouteResult::failure(&RouteError::NotNavigable);
        assert!(!result.success);
        assert!(result.path.is_empty());
        assert_eq!(result.error_code(), Some(ErrorCode::NotNavigable));
        assert_eq!(result.distance_meters(), 0.0);
        assert_eq!(result.duration_seconds(), 0.0);
    }

    #[test]
    fn retimed_keeps_everything_but_dates() {
        let result = RouteResult::found(
            Path::default(),
            Vec::new(),
            RouteTiming::new(start(), 100.0, 60.0).unwrap(),
            Some("operator".into()),
        );
        let later = start() + Duration::hours(3);
        let moved = result.retimed(later).unwrap();

        let timing = moved.timing.as_ref().unwrap();
        assert_eq!(timing.start_date, later);
        assert_eq!(timing.end_date, later + Duration::seconds(60));
        assert_eq!(moved.distance_meters(), 100.0);
        assert_eq!(moved.duration_seconds(), 60.0);
        assert_eq!(moved.transporter, result.transporter);

        assert!(result.retimed(DateTime::<Utc>::MAX_UTC).is_err());
        // Failures carry no timing to shift
        let failed = RouteResult::failure(&RouteError::NoPathFound);
        assert_eq!(failed.retimed(DateTime::<Utc>::MAX_UTC).unwrap(), failed);
    }

    #[test]
    fn failure_json_shape() {
        let json = serde_json::to_value(RouteResult::failure(&RouteError::NoPathFound)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "NoPathFound");
        assert!(json.get("timing").is_none());
        assert_eq!(json["path"].as_array().unwrap().len(), 0);
    }
}
