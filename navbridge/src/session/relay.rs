use std::sync::Arc;

use navbridge_types::{LatLng, NavInfo};

use crate::events::{SessionEvent, SessionEventSink};
use crate::native::{
    NavInfoSink, NavigatorEvent, NavigatorEventSink, NavigatorSubscription, RoadSnappedLocationSink,
};

/// Navigator listeners registered by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ListenerKind {
    Arrival,
    RouteChanged,
    Rerouting,
    TrafficUpdated,
    Speeding,
    RemainingTimeOrDistance,
}

impl ListenerKind {
    /// Listeners registered as soon as the session is ready.
    pub(crate) const BASE: [ListenerKind; 5] = [
        ListenerKind::Arrival,
        ListenerKind::RouteChanged,
        ListenerKind::Rerouting,
        ListenerKind::TrafficUpdated,
        ListenerKind::Speeding,
    ];

    /// Native subscription of a base listener.
    pub(crate) fn subscription(&self) -> Option<NavigatorSubscription> {
        match self {
            ListenerKind::Arrival => Some(NavigatorSubscription::Arrival),
            ListenerKind::RouteChanged => Some(NavigatorSubscription::RouteChanged),
            ListenerKind::Rerouting => Some(NavigatorSubscription::Rerouting),
            ListenerKind::TrafficUpdated => Some(NavigatorSubscription::TrafficUpdated),
            ListenerKind::Speeding => Some(NavigatorSubscription::Speeding),
            ListenerKind::RemainingTimeOrDistance => None,
        }
    }
}

/// Forwards native navigation callbacks to the host session channel.
///
/// Holds no session state, so it can be called from any engine thread while the session is
/// being reconfigured.
pub(crate) struct SessionEventRelay {
    events: Arc<dyn SessionEventSink>,
    max_steps: usize,
}

impl SessionEventRelay {
    pub(crate) fn new(events: Arc<dyn SessionEventSink>) -> Self {
        Self {
            events,
            max_steps: usize::MAX,
        }
    }

    /// Relay truncating turn-by-turn updates to `max_steps` upcoming steps.
    pub(crate) fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

impl NavigatorEventSink for SessionEventRelay {
    fn on_navigator_event(&self, event: NavigatorEvent) {
        let event = match event {
            NavigatorEvent::Arrival(waypoint) => SessionEvent::Arrival(waypoint),
            NavigatorEvent::RouteChanged => SessionEvent::RouteChanged,
            NavigatorEvent::Rerouting => SessionEvent::Rerouting,
            NavigatorEvent::TrafficUpdated => SessionEvent::TrafficUpdated,
            NavigatorEvent::Speeding(update) => SessionEvent::SpeedingUpdated(update),
            NavigatorEvent::RemainingTimeOrDistanceChanged(value) => {
                SessionEvent::RemainingTimeOrDistanceChanged(value)
            }
        };

        self.events.on_session_event(event);
    }
}

impl RoadSnappedLocationSink for SessionEventRelay {
    fn on_location(&self, location: LatLng) {
        self.events.on_session_event(SessionEvent::RoadSnappedLocationUpdated(location));
    }

    fn on_raw_location(&self, location: LatLng) {
        self.events.on_session_event(SessionEvent::RoadSnappedRawLocationUpdated(location));
    }

    fn on_gps_availability(&self, available: bool) {
        self.events.on_session_event(SessionEvent::GpsAvailabilityUpdated(available));
    }
}

impl NavInfoSink for SessionEventRelay {
    fn on_nav_info(&self, info: NavInfo) {
        self.events.on_session_event(SessionEvent::NavInfo(info.truncate_steps(self.max_steps)));
    }
}
