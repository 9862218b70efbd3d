//! Host-bound events and the sinks they are delivered to.

use std::sync::Arc;

use log::debug;
use maybe_sync::{MaybeSend, MaybeSync};
use navbridge_types::{
    CameraEventType, CameraPosition, ClusterDto, LatLng, NavInfo, SpeedingUpdate, TimeAndDistance,
    Waypoint,
};
use parking_lot::ReentrantMutex;

use crate::native::{InfoWindowEventType, MarkerDragEventType};

/// Kind of a marker event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerEventType {
    /// The marker was tapped.
    Clicked,
    /// The info window was tapped.
    InfoWindowClicked,
    /// The info window was long pressed.
    InfoWindowLongClicked,
    /// The info window was closed.
    InfoWindowClosed,
}

impl From<InfoWindowEventType> for MarkerEventType {
    fn from(value: InfoWindowEventType) -> Self {
        match value {
            InfoWindowEventType::Clicked => MarkerEventType::InfoWindowClicked,
            InfoWindowEventType::LongClicked => MarkerEventType::InfoWindowLongClicked,
            InfoWindowEventType::Closed => MarkerEventType::InfoWindowClosed,
        }
    }
}

/// Event emitted for a single view.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ViewEvent {
    /// Tap on the map.
    MapClick(LatLng),
    /// Long press on the map.
    MapLongClick(LatLng),
    /// Marker tap or info window event.
    Marker {
        /// Logical marker id.
        marker_id: String,
        /// What happened.
        event: MarkerEventType,
    },
    /// Marker drag progress.
    MarkerDrag {
        /// Logical marker id.
        marker_id: String,
        /// Drag phase.
        event: MarkerDragEventType,
        /// Current marker position.
        position: LatLng,
    },
    /// Polygon tap, with the logical id.
    PolygonClicked(String),
    /// Polyline tap, with the logical id.
    PolylineClicked(String),
    /// Circle tap, with the logical id.
    CircleClicked(String),
    /// Cluster glyph tap.
    ClusterClicked(ClusterDto),
    /// Tap on the my-location dot.
    MyLocationClicked,
    /// Tap on the my-location button.
    MyLocationButtonClicked,
    /// Camera movement, only after the camera listener was registered.
    CameraChanged {
        /// Camera event kind.
        event: CameraEventType,
        /// Camera position after the change.
        position: CameraPosition,
    },
    /// Tap on the re-center button.
    RecenterButtonClicked,
    /// The navigation UI was turned on or off.
    NavigationUiEnabledChanged(bool),
}

/// Event emitted by the navigation session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SessionEvent {
    /// A waypoint was reached.
    Arrival(Waypoint),
    /// The route changed.
    RouteChanged,
    /// Rerouting started.
    Rerouting,
    /// Traffic along the route changed.
    TrafficUpdated,
    /// Speeding state changed.
    SpeedingUpdated(SpeedingUpdate),
    /// Remaining time or distance crossed the registered thresholds.
    RemainingTimeOrDistanceChanged(TimeAndDistance),
    /// Road snapped location.
    RoadSnappedLocationUpdated(LatLng),
    /// Raw location.
    RoadSnappedRawLocationUpdated(LatLng),
    /// GPS signal was lost or regained.
    GpsAvailabilityUpdated(bool),
    /// Turn-by-turn update.
    NavInfo(NavInfo),
    /// The session became ready (`true`) or was cleaned up (`false`).
    NavigationSessionReady(bool),
}

/// Host channel receiving view events.
pub trait ViewEventSink: MaybeSend + MaybeSync {
    /// Delivers an event of view `view_id`.
    fn on_view_event(&self, view_id: i64, event: ViewEvent);
}

/// Host channel receiving session events. May be called from a background thread.
pub trait SessionEventSink: MaybeSend + MaybeSync {
    /// Delivers a session event.
    fn on_session_event(&self, event: SessionEvent);
}

/// Serializes the events of one view into a single ordered stream.
///
/// Native callbacks may race each other on different threads; the emitter makes sure the host
/// sees them one at a time. Re-entrant emission from the same thread (a host handler that
/// triggers another event synchronously) is allowed.
pub(crate) struct ViewEventEmitter {
    view_id: Option<i64>,
    sink: ReentrantMutex<Option<Arc<dyn ViewEventSink>>>,
}

impl ViewEventEmitter {
    pub(crate) fn new(view_id: Option<i64>, sink: Option<Arc<dyn ViewEventSink>>) -> Self {
        Self {
            view_id,
            sink: ReentrantMutex::new(sink),
        }
    }

    pub(crate) fn emit(&self, event: ViewEvent) {
        let guard = self.sink.lock();
        match (self.view_id, guard.as_ref()) {
            (Some(view_id), Some(sink)) => sink.on_view_event(view_id, event),
            _ => debug!("Dropping view event without host channel: {event:?}"),
        }
    }
}
