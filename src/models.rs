use serde::{Deserialize, Serialize};

/// Latest known position and status of a single vehicle.
///
/// Values are replaced wholesale on every poll; a vehicle absent from the
/// most recent fetch is considered gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Unique vehicle identifier (bus number)
    pub id: String,

    /// Route the vehicle is currently serving, when known
    #[serde(default)]
    pub route_id: Option<String>,

    /// Current latitude
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Current longitude
    #[serde(default)]
    pub longitude: Option<f64>,

    /// Heading in degrees
    #[serde(default)]
    pub bearing: f64,

    /// Raw stop-relation code (0 incoming, 1 stopped, 2 in transit)
    #[serde(default)]
    pub current_status: Option<i64>,

    /// Raw occupancy code (0-6)
    #[serde(default)]
    pub occupancy_status: Option<i64>,

    /// Unix timestamp of the vehicle's last report
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Vehicle {
    pub fn status(&self) -> CurrentStatus {
        CurrentStatus::from_code(self.current_status)
    }

    pub fn occupancy(&self) -> Crowding {
        Crowding::from_code(self.occupancy_status)
    }

    /// Position as (latitude, longitude), when both coordinates are reported
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

impl std::fmt::Display for Vehicle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Vehicle {} on route {} ({}) [{}]",
            self.id,
            self.route_id.as_deref().unwrap_or("unknown"),
            self.status(),
            self.timestamp
                .and_then(|ts| chrono::DateTime::<chrono::Utc>::from_timestamp(ts, 0))
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "no report time".to_string())
        )
    }
}

/// Where a vehicle stands relative to its next stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentStatus {
    IncomingAt,
    StoppedAt,
    InTransitTo,
    Unknown,
}

impl CurrentStatus {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => CurrentStatus::IncomingAt,
            Some(1) => CurrentStatus::StoppedAt,
            Some(2) => CurrentStatus::InTransitTo,
            _ => CurrentStatus::Unknown,
        }
    }
}

impl std::fmt::Display for CurrentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            CurrentStatus::IncomingAt => "incoming at stop",
            CurrentStatus::StoppedAt => "stopped at stop",
            CurrentStatus::InTransitTo => "in transit",
            CurrentStatus::Unknown => "status unknown",
        };
        f.write_str(text)
    }
}

/// GTFS-style 7-level occupancy scale, with a catch-all for anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crowding {
    Empty,
    ManySeats,
    FewSeats,
    Standing,
    Crushed,
    Full,
    NotAccepting,
    Unknown,
}

impl Crowding {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => Crowding::Empty,
            Some(1) => Crowding::ManySeats,
            Some(2) => Crowding::FewSeats,
            Some(3) => Crowding::Standing,
            Some(4) => Crowding::Crushed,
            Some(5) => Crowding::Full,
            Some(6) => Crowding::NotAccepting,
            _ => Crowding::Unknown,
        }
    }

    /// Parse the textual form used by the prediction endpoint.
    pub fn from_name(name: &str) -> Self {
        match name {
            "empty" => Crowding::Empty,
            "many_seats" => Crowding::ManySeats,
            "few_seats" => Crowding::FewSeats,
            "standing" => Crowding::Standing,
            "crushed" => Crowding::Crushed,
            "full" => Crowding::Full,
            "not_accepting" => Crowding::NotAccepting,
            _ => Crowding::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Crowding::Empty => "Empty",
            Crowding::ManySeats => "Many seats available",
            Crowding::FewSeats => "Few seats available",
            Crowding::Standing => "Standing room only",
            Crowding::Crushed => "Crushed standing room",
            Crowding::Full => "Full",
            Crowding::NotAccepting => "Not accepting passengers",
            Crowding::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Crowding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Delay information for one stop on a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopTimeUpdate {
    pub stop_id: String,

    /// Arrival delay in seconds (negative = early)
    #[serde(default)]
    pub arrival_delay: Option<i64>,

    /// Departure delay in seconds (negative = early)
    #[serde(default)]
    pub departure_delay: Option<i64>,
}

/// Live delay data for a trip, keyed by trip id and replaced wholesale per
/// poll like [`Vehicle`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripUpdate {
    pub trip_id: String,

    #[serde(default)]
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

impl TripUpdate {
    pub fn stop_update(&self, stop_id: &str) -> Option<&StopTimeUpdate> {
        self.stop_time_updates.iter().find(|u| u.stop_id == stop_id)
    }
}

/// Fine-grained prediction for one (trip, stop) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedPrediction {
    pub trip_id: String,
    pub stop_id: String,

    /// Predicted arrival as a transit clock string (hour may exceed 24)
    #[serde(default)]
    pub predicted_time: Option<String>,

    /// Textual crowding level (e.g. "few_seats")
    #[serde(default)]
    pub crowding: Option<String>,
}

impl DetailedPrediction {
    pub fn crowding_level(&self) -> Crowding {
        self.crowding
            .as_deref()
            .map(Crowding::from_name)
            .unwrap_or(Crowding::Unknown)
    }
}

/// A named stop with its scheduled (and optionally predicted) clock time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopPoint {
    pub name: String,

    /// Scheduled time as a transit clock string
    pub time: String,

    /// Live predicted time, when available
    #[serde(default)]
    pub predicted_time: Option<String>,
}

/// Single-vehicle, no-transfer journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectRoute {
    pub route_id: String,
    pub route_name: String,
    pub start_stop: StopPoint,
    pub end_stop: StopPoint,

    /// Total travel time in minutes
    pub travel_time: f64,

    /// Predicted crowding for the trip, when available
    #[serde(default)]
    pub crowding: Option<String>,
}

/// One leg of a two-leg journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub route_id: String,
    pub route_name: String,
    pub start_stop: StopPoint,
    pub end_stop: StopPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferStop {
    pub name: String,
}

/// Two-leg journey with an intermediate transfer stop.
///
/// `travel_time` is the route-level total; it may include walking or buffer
/// time not reflected in the per-leg times, so it is never recomputed from
/// the legs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRoute {
    pub first_leg: Leg,
    pub second_leg: Leg,
    pub transfer_stop: TransferStop,
    pub travel_time: f64,
}

/// A route-search result as returned by the trip planner.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteOption {
    Direct(DirectRoute),
    Transfer(TransferRoute),
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_tolerates_missing_fields() {
        let v: Vehicle = serde_json::from_str(r#"{"id": "v1"}"#).unwrap();
        assert_eq!(v.id, "v1");
        assert_eq!(v.route_id, None);
        assert_eq!(v.bearing, 0.0);
        assert_eq!(v.status(), CurrentStatus::Unknown);
        assert_eq!(v.position(), None);
    }

    #[test]
    fn status_codes_map_per_gtfs() {
        assert_eq!(CurrentStatus::from_code(Some(0)), CurrentStatus::IncomingAt);
        assert_eq!(CurrentStatus::from_code(Some(1)), CurrentStatus::StoppedAt);
        assert_eq!(CurrentStatus::from_code(Some(2)), CurrentStatus::InTransitTo);
        assert_eq!(CurrentStatus::from_code(Some(7)), CurrentStatus::Unknown);
        assert_eq!(CurrentStatus::from_code(None), CurrentStatus::Unknown);
    }

    #[test]
    fn crowding_codes_and_names_agree() {
        assert_eq!(Crowding::from_code(Some(3)), Crowding::Standing);
        assert_eq!(Crowding::from_name("standing"), Crowding::Standing);
        assert_eq!(Crowding::from_code(Some(42)), Crowding::Unknown);
        assert_eq!(Crowding::from_name("packed"), Crowding::Unknown);
        assert_eq!(Crowding::from_code(None), Crowding::Unknown);
    }

    #[test]
    fn route_option_tags_select_the_kind() {
        let direct: RouteOption = serde_json::from_str(
            r#"{"type": "direct", "route_id": "3", "route_name": "Elbow Drive",
                "start_stop": {"name": "A", "time": "08:00:00"},
                "end_stop": {"name": "B", "time": "08:20:00"},
                "travel_time": 20.0}"#,
        )
        .unwrap();
        assert!(matches!(direct, RouteOption::Direct(_)));

        let unknown: RouteOption =
            serde_json::from_str(r#"{"type": "teleport"}"#).unwrap();
        assert!(matches!(unknown, RouteOption::Unknown));
    }

    #[test]
    fn trip_update_finds_stop_by_id() {
        let t = TripUpdate {
            trip_id: "t1".into(),
            stop_time_updates: vec![
                StopTimeUpdate {
                    stop_id: "s1".into(),
                    arrival_delay: Some(120),
                    departure_delay: None,
                },
                StopTimeUpdate {
                    stop_id: "s2".into(),
                    arrival_delay: None,
                    departure_delay: Some(-60),
                },
            ],
        };
        assert_eq!(t.stop_update("s2").unwrap().departure_delay, Some(-60));
        assert!(t.stop_update("s3").is_none());
    }
}
