//! Turns route-search results into displayable itinerary data.
//!
//! Output is pure data; a rendering collaborator owns markup. All times pass
//! through [`crate::clock`] so overnight trips display correctly.

use crate::clock;
use crate::models::{DirectRoute, Leg, RouteOption, TransferRoute};

/// Displayable form of a route-search result.
#[derive(Debug, Clone, PartialEq)]
pub enum ItineraryView {
    Direct(DirectItinerary),
    Transfer(TransferItinerary),
    /// Degraded view for a route kind this client does not understand.
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectItinerary {
    pub route_id: String,
    pub route_name: String,
    pub from: String,
    pub to: String,
    /// Departure time, `HH:MM`
    pub departure: String,
    /// Arrival time, `HH:MM`; live prediction preferred over schedule
    pub arrival: String,
    /// Total travel time, rounded to whole minutes
    pub travel_minutes: i64,
    pub crowding: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegView {
    pub route_id: String,
    pub route_name: String,
    pub from: String,
    pub to: String,
    pub departure: String,
    pub arrival: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferItinerary {
    pub first_leg: LegView,
    pub second_leg: LegView,
    pub transfer_stop: String,
    /// Wait at the transfer stop in minutes; `None` renders as "N/A"
    pub transfer_wait: Option<i64>,
    /// Route-level total, not the sum of the legs
    pub travel_minutes: i64,
}

/// Format any route-search result. Unknown kinds degrade to
/// [`ItineraryView::Unknown`]; this never fails.
pub fn format(route: &RouteOption) -> ItineraryView {
    match route {
        RouteOption::Direct(direct) => ItineraryView::Direct(format_direct(direct)),
        RouteOption::Transfer(transfer) => ItineraryView::Transfer(format_transfer(transfer)),
        RouteOption::Unknown => ItineraryView::Unknown,
    }
}

fn format_direct(route: &DirectRoute) -> DirectItinerary {
    let arrival_source = route
        .end_stop
        .predicted_time
        .as_deref()
        .unwrap_or(&route.end_stop.time);

    DirectItinerary {
        route_id: route.route_id.clone(),
        route_name: route.route_name.clone(),
        from: route.start_stop.name.clone(),
        to: route.end_stop.name.clone(),
        departure: clock::format_display(&route.start_stop.time),
        arrival: clock::format_display(arrival_source),
        travel_minutes: route.travel_time.round() as i64,
        crowding: route
            .crowding
            .as_deref()
            .map(|c| crate::models::Crowding::from_name(c).label()),
    }
}

fn format_transfer(route: &TransferRoute) -> TransferItinerary {
    TransferItinerary {
        first_leg: format_leg(&route.first_leg),
        second_leg: format_leg(&route.second_leg),
        transfer_stop: route.transfer_stop.name.clone(),
        transfer_wait: clock::wait_minutes(
            &route.first_leg.end_stop.time,
            &route.second_leg.start_stop.time,
        ),
        travel_minutes: route.travel_time.round() as i64,
    }
}

fn format_leg(leg: &Leg) -> LegView {
    LegView {
        route_id: leg.route_id.clone(),
        route_name: leg.route_name.clone(),
        from: leg.start_stop.name.clone(),
        to: leg.end_stop.name.clone(),
        departure: clock::format_display(&leg.start_stop.time),
        arrival: clock::format_display(&leg.end_stop.time),
    }
}

impl std::fmt::Display for ItineraryView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItineraryView::Direct(d) => write!(
                f,
                "Route {} ({}): {} {} -> {} {} ({} min){}",
                d.route_id,
                d.route_name,
                d.from,
                d.departure,
                d.to,
                d.arrival,
                d.travel_minutes,
                d.crowding.map(|c| format!(" [{}]", c)).unwrap_or_default(),
            ),
            ItineraryView::Transfer(t) => t.fmt(f),
            ItineraryView::Unknown => f.write_str("Unknown route type"),
        }
    }
}

impl std::fmt::Display for TransferItinerary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Route {}: {} {} -> {} {}, transfer at {} (wait {}), \
             then route {}: {} -> {} {} ({} min total)",
            self.first_leg.route_id,
            self.first_leg.from,
            self.first_leg.departure,
            self.first_leg.to,
            self.first_leg.arrival,
            self.transfer_stop,
            self.transfer_wait
                .map(|w| format!("{} min", w))
                .unwrap_or_else(|| "N/A".to_string()),
            self.second_leg.route_id,
            self.second_leg.departure,
            self.second_leg.to,
            self.second_leg.arrival,
            self.travel_minutes,
        )
    }
}
