use std::sync::Arc;

use maybe_sync::{MaybeSend, MaybeSync};
use navbridge_types::{
    AudioGuidanceSettings, DisplayOptions, LatLng, NavInfo, RouteSegment, RouteStatus,
    RouteTokenOptions, RoutingOptions, SimulationOptions, SpeedAlertOptions, SpeedingUpdate,
    TaskRemovedBehavior, TimeAndDistance, Waypoint,
};

/// Reasons the engine refuses to create a navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorError {
    /// The API key is not authorized.
    NotAuthorized,
    /// The user has not accepted the terms.
    TermsNotAccepted,
    /// Network failure.
    NetworkError,
    /// Location permission was not granted.
    LocationPermissionMissing,
}

/// Parameters of the terms and conditions dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsDialogParams {
    /// Dialog title.
    pub title: String,
    /// Company name shown in the dialog.
    pub company_name: String,
    /// Show only the driver awareness disclaimer.
    pub only_driver_awareness_disclaimer: bool,
}

/// Called with the route calculation result.
pub type RouteStatusCallback = Box<dyn FnOnce(RouteStatus) + Send>;

/// Process wide entry points of the navigation engine.
pub trait NavigationServices: MaybeSend + MaybeSync {
    /// Whether the user accepted the terms.
    fn are_terms_accepted(&self) -> bool;
    /// Shows the dialog and reports whether the user accepted.
    fn show_terms_dialog(&self, params: TermsDialogParams, callback: Box<dyn FnOnce(bool) + Send>);
    /// Fails with the native message while a session is active.
    fn reset_terms_accepted(&self) -> Result<(), String>;
    /// Whether location permission is granted.
    fn has_location_permission(&self) -> bool;
    /// Version of the native SDK.
    fn nav_sdk_version(&self) -> String;
    /// Toggles crash reporting of the engine.
    fn set_abnormal_termination_reporting(&self, enabled: bool);
    /// Requests a navigator. The callback may be invoked on any thread, at any later time.
    fn request_navigator(
        &self,
        activity: &Arc<dyn HostActivity>,
        callback: Box<dyn FnOnce(Result<Arc<dyn Navigator>, NavigatorError>) + Send>,
    );
    /// Provider of road snapped locations, if available.
    fn road_snapped_location_provider(&self) -> Option<Arc<dyn RoadSnappedLocationProvider>>;
}

/// The host activity (or lifecycle owner) the session works on behalf of.
pub trait HostActivity: MaybeSend + MaybeSync {
    /// Package the turn-by-turn service is registered under.
    fn package_name(&self) -> String;
}

/// Identifier of a native listener subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Kinds of navigator change listeners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigatorSubscription {
    /// Waypoint reached.
    Arrival,
    /// Route changed.
    RouteChanged,
    /// Rerouting started.
    Rerouting,
    /// Traffic changed.
    TrafficUpdated,
    /// Speeding changed.
    Speeding,
    /// Remaining time or distance crossed a threshold.
    RemainingTimeOrDistance {
        /// Minimum change in seconds.
        time_threshold_seconds: i64,
        /// Minimum change in meters.
        distance_threshold_meters: i64,
    },
}

/// Events delivered to navigator subscriptions.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigatorEvent {
    /// Waypoint reached.
    Arrival(Waypoint),
    /// Route changed.
    RouteChanged,
    /// Rerouting started.
    Rerouting,
    /// Traffic changed.
    TrafficUpdated,
    /// Speeding changed.
    Speeding(SpeedingUpdate),
    /// Remaining time or distance changed.
    RemainingTimeOrDistanceChanged(TimeAndDistance),
}

/// Receiver of navigator events.
pub trait NavigatorEventSink: MaybeSend + MaybeSync {
    /// Delivers a navigator event.
    fn on_navigator_event(&self, event: NavigatorEvent);
}

/// Receiver of turn-by-turn updates.
pub trait NavInfoSink: MaybeSend + MaybeSync {
    /// Delivers a turn-by-turn update.
    fn on_nav_info(&self, info: NavInfo);
}

/// Receiver of road snapped locations. Called from a background thread.
pub trait RoadSnappedLocationSink: MaybeSend + MaybeSync {
    /// Road snapped location.
    fn on_location(&self, location: LatLng);
    /// Raw location.
    fn on_raw_location(&self, location: LatLng);
    /// GPS availability change.
    fn on_gps_availability(&self, available: bool);
}

/// Source of road snapped locations.
pub trait RoadSnappedLocationProvider: MaybeSend + MaybeSync {
    /// Adds a listener.
    fn add_listener(&self, sink: Arc<dyn RoadSnappedLocationSink>) -> SubscriptionId;
    /// Removes a listener.
    fn remove_listener(&self, id: SubscriptionId);
}

/// Location simulator of a navigator.
pub trait Simulator: MaybeSend + MaybeSync {
    /// Places the simulated user at a location.
    fn set_user_location(&self, location: LatLng);
    /// Removes the simulated location.
    fn unset_user_location(&self);
    /// Simulates along the current route.
    fn simulate_along_existing_route(&self, options: Option<SimulationOptions>);
    /// Computes a route and simulates along it.
    fn simulate_along_new_route(
        &self,
        waypoints: &[Waypoint],
        routing: Option<&RoutingOptions>,
        simulation: Option<SimulationOptions>,
        callback: RouteStatusCallback,
    );
    /// Pauses.
    fn pause(&self);
    /// Resumes.
    fn resume(&self);
}

/// The native navigator owned by the session.
pub trait Navigator: MaybeSend + MaybeSync {
    /// Sets what happens when the host task is removed.
    fn set_task_removed_behavior(&self, behavior: TaskRemovedBehavior);

    /// Adds a change listener.
    fn subscribe(
        &self,
        subscription: NavigatorSubscription,
        sink: Arc<dyn NavigatorEventSink>,
    ) -> SubscriptionId;
    /// Removes a change listener.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Starts guidance.
    fn start_guidance(&self);
    /// Stops guidance.
    fn stop_guidance(&self);
    /// Whether guidance is running.
    fn is_guidance_running(&self) -> bool;
    /// Sets destinations and computes a route.
    fn set_destinations(
        &self,
        waypoints: &[Waypoint],
        routing: Option<&RoutingOptions>,
        display: DisplayOptions,
        callback: RouteStatusCallback,
    );
    /// Sets destinations along a pre-computed route. Fails with the native message when the
    /// token cannot be parsed.
    fn set_destinations_with_route_token(
        &self,
        waypoints: &[Waypoint],
        token: &RouteTokenOptions,
        display: DisplayOptions,
        callback: RouteStatusCallback,
    ) -> Result<(), String>;
    /// Clears destinations.
    fn clear_destinations(&self);
    /// Drops the current destination and returns the next one.
    fn continue_to_next_destination(&self) -> Option<Waypoint>;
    /// Remaining time and distance.
    fn current_time_and_distance(&self) -> TimeAndDistance;
    /// Configures audio guidance.
    fn set_audio_guidance(&self, settings: AudioGuidanceSettings);
    /// Configures speed alerts.
    fn set_speed_alert_options(&self, options: SpeedAlertOptions);
    /// Segments of the current route.
    fn route_segments(&self) -> Vec<RouteSegment>;
    /// Route traveled so far.
    fn traveled_route(&self) -> Vec<LatLng>;
    /// Segment being driven.
    fn current_route_segment(&self) -> Option<RouteSegment>;

    /// Location simulator.
    fn simulator(&self) -> Arc<dyn Simulator>;

    /// Registers the turn-by-turn update service. Returns false if the engine refused.
    fn register_nav_updates(
        &self,
        package_name: &str,
        max_steps: usize,
        sink: Arc<dyn NavInfoSink>,
    ) -> bool;
    /// Unregisters the turn-by-turn update service. Returns false if the engine refused.
    fn unregister_nav_updates(&self) -> bool;
}
