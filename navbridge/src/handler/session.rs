use std::sync::Arc;

use navbridge_types::{
    AudioGuidanceSettings, Destinations, LatLng, RouteSegment, RoutingOptions, SimulationOptions,
    SpeedAlertOptions, TimeAndDistance, Waypoint,
};

use crate::error::BridgeError;
use crate::native::{RouteStatusCallback, TermsDialogParams};
use crate::session::{NavigationSessionManager, SessionCallback, SessionOptions, SessionSlot};

/// Host call addressed to the navigation session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub enum SessionCall {
    /// Whether the session is initialized.
    IsInitialized,
    /// Cleans the session up.
    Cleanup,
    /// Whether terms were accepted.
    AreTermsAccepted,
    /// Resets the acceptance of the terms.
    ResetTermsAccepted,
    /// Version of the native SDK.
    GetNavSdkVersion,
    /// Starts guidance.
    StartGuidance,
    /// Stops guidance.
    StopGuidance,
    /// Whether guidance is running.
    IsGuidanceRunning,
    /// Clears all destinations.
    ClearDestinations,
    /// Drops the current destination and returns the next one.
    ContinueToNextDestination,
    /// Remaining time and distance.
    GetCurrentTimeAndDistance,
    /// Configures audio guidance.
    SetAudioGuidance(AudioGuidanceSettings),
    /// Configures speed alerts.
    SetSpeedAlertOptions(SpeedAlertOptions),
    /// Segments of the current route.
    GetRouteSegments,
    /// Route traveled so far.
    GetTraveledRoute,
    /// Segment being driven.
    GetCurrentRouteSegment,
    /// Places the simulated user at a location.
    SetUserLocation(LatLng),
    /// Removes the simulated location.
    RemoveUserLocation,
    /// Simulates along the current route, with options if given.
    SimulateLocationsAlongExistingRoute(Option<SimulationOptions>),
    /// Pauses simulation.
    PauseSimulation,
    /// Resumes simulation.
    ResumeSimulation,
    /// Starts reporting remaining time and distance past the given thresholds.
    RegisterRemainingTimeOrDistanceChangedListener {
        /// Minimum change in seconds.
        time_threshold_seconds: i64,
        /// Minimum change in meters.
        distance_threshold_meters: i64,
    },
    /// Starts road snapped location events.
    EnableRoadSnappedLocationUpdates,
    /// Stops road snapped location events.
    DisableRoadSnappedLocationUpdates,
    /// Starts turn-by-turn events, with an optional step cap.
    EnableTurnByTurnNavigationEvents(Option<usize>),
    /// Stops turn-by-turn events.
    DisableTurnByTurnNavigationEvents,
}

/// Result of a [`SessionCall`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SessionReply {
    /// The call has no result value.
    Done,
    /// Boolean answer.
    Flag(bool),
    /// Native SDK version.
    Version(String),
    /// Next destination, if any.
    NextDestination(Option<Waypoint>),
    /// Remaining time and distance.
    TimeAndDistance(TimeAndDistance),
    /// Route segments.
    RouteSegments(Vec<RouteSegment>),
    /// Traveled path.
    TraveledRoute(Vec<LatLng>),
    /// Current segment, if any.
    CurrentRouteSegment(Option<RouteSegment>),
}

/// Routes host calls to the session manager of the plugin.
pub struct SessionMessageHandler {
    slot: Arc<SessionSlot>,
}

impl SessionMessageHandler {
    /// Creates a handler resolving the manager held by `slot`.
    pub fn new(slot: Arc<SessionSlot>) -> Self {
        Self { slot }
    }

    /// The session manager, or [`BridgeError::SessionManagerNotAvailable`] after the plugin
    /// was detached.
    pub fn manager(&self) -> Result<Arc<NavigationSessionManager>, BridgeError> {
        self.slot.manager()
    }

    /// Executes `call` on the session manager.
    pub fn handle(&self, call: SessionCall) -> Result<SessionReply, BridgeError> {
        use SessionCall::*;

        let manager = self.manager()?;
        let reply = match call {
            IsInitialized => SessionReply::Flag(manager.is_initialized()),
            Cleanup => done(manager.cleanup())?,
            AreTermsAccepted => SessionReply::Flag(manager.are_terms_accepted()),
            ResetTermsAccepted => done(manager.reset_terms_accepted())?,
            GetNavSdkVersion => SessionReply::Version(manager.nav_sdk_version()),
            StartGuidance => done(manager.start_guidance())?,
            StopGuidance => done(manager.stop_guidance())?,
            IsGuidanceRunning => SessionReply::Flag(manager.is_guidance_running()?),
            ClearDestinations => done(manager.clear_destinations())?,
            ContinueToNextDestination => {
                SessionReply::NextDestination(manager.continue_to_next_destination()?)
            }
            GetCurrentTimeAndDistance => {
                SessionReply::TimeAndDistance(manager.current_time_and_distance()?)
            }
            SetAudioGuidance(settings) => done(manager.set_audio_guidance(settings))?,
            SetSpeedAlertOptions(options) => done(manager.set_speed_alert_options(options))?,
            GetRouteSegments => SessionReply::RouteSegments(manager.route_segments()?),
            GetTraveledRoute => SessionReply::TraveledRoute(manager.traveled_route()?),
            GetCurrentRouteSegment => {
                SessionReply::CurrentRouteSegment(manager.current_route_segment()?)
            }
            SetUserLocation(location) => done(manager.set_user_location(location))?,
            RemoveUserLocation => done(manager.remove_user_location())?,
            SimulateLocationsAlongExistingRoute(None) => {
                done(manager.simulate_locations_along_existing_route())?
            }
            SimulateLocationsAlongExistingRoute(Some(options)) => {
                done(manager.simulate_locations_along_existing_route_with_options(options))?
            }
            PauseSimulation => done(manager.pause_simulation())?,
            ResumeSimulation => done(manager.resume_simulation())?,
            RegisterRemainingTimeOrDistanceChangedListener {
                time_threshold_seconds,
                distance_threshold_meters,
            } => done(manager.register_remaining_time_or_distance_changed_listener(
                time_threshold_seconds,
                distance_threshold_meters,
            ))?,
            EnableRoadSnappedLocationUpdates => {
                done(manager.enable_road_snapped_location_updates())?
            }
            DisableRoadSnappedLocationUpdates => {
                manager.disable_road_snapped_location_updates();
                SessionReply::Done
            }
            EnableTurnByTurnNavigationEvents(max_steps) => {
                done(manager.enable_turn_by_turn_navigation_events(max_steps))?
            }
            DisableTurnByTurnNavigationEvents => {
                done(manager.disable_turn_by_turn_navigation_events())?
            }
        };

        Ok(reply)
    }

    /// Creates the navigation session. A missing manager is reported through `callback`.
    pub fn create_navigation_session(&self, options: SessionOptions, callback: SessionCallback) {
        match self.manager() {
            Ok(manager) => manager.create_navigation_session(options, callback),
            Err(error) => callback(Err(error)),
        }
    }

    /// Shows the terms and conditions dialog.
    pub fn show_terms_and_conditions_dialog(
        &self,
        params: TermsDialogParams,
        callback: Box<dyn FnOnce(bool) + Send>,
    ) -> Result<(), BridgeError> {
        self.manager()?.show_terms_and_conditions_dialog(params, callback);
        Ok(())
    }

    /// Sets destinations. `callback` receives the route calculation status.
    pub fn set_destinations(
        &self,
        destinations: Destinations,
        callback: RouteStatusCallback,
    ) -> Result<(), BridgeError> {
        self.manager()?.set_destinations(destinations, callback)
    }

    /// Calculates a route through `waypoints` and simulates driving along it.
    pub fn simulate_locations_along_new_route(
        &self,
        waypoints: &[Waypoint],
        routing: Option<&RoutingOptions>,
        simulation: Option<SimulationOptions>,
        callback: RouteStatusCallback,
    ) -> Result<(), BridgeError> {
        self.manager()?.simulate_locations_along_new_route(waypoints, routing, simulation, callback)
    }
}

fn done(result: Result<(), BridgeError>) -> Result<SessionReply, BridgeError> {
    result.map(|()| SessionReply::Done)
}
