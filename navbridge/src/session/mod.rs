//! The navigation session shared by all views.
//!
//! There is at most one [`NavigationSessionManager`] per plugin. It is created and destroyed
//! explicitly through the [`SessionSlot`] owned by the plugin; views only hold a weak
//! reference to the slot and look the session up when they need it.

use std::sync::{Arc, Weak};

use ahash::AHashMap;
use log::{debug, error, warn};
use navbridge_types::{
    AudioGuidanceSettings, Destinations, LatLng, RouteSegment, RoutingOptions, SimulationOptions,
    SpeedAlertOptions, TaskRemovedBehavior, TimeAndDistance, Waypoint,
};
use parking_lot::{Mutex, RwLock};

use crate::error::BridgeError;
use crate::events::{SessionEvent, SessionEventSink};
use crate::native::{
    HostActivity, NavigationServices, Navigator, NavigatorError, NavigatorSubscription,
    RoadSnappedLocationProvider, RouteStatusCallback, SubscriptionId, TermsDialogParams, UiSetting,
};
use crate::view::{MapViewController, ViewRegistry};

mod relay;

use relay::{ListenerKind, SessionEventRelay};

/// Reports the outcome of [`NavigationSessionManager::create_navigation_session`].
pub type SessionCallback = Box<dyn FnOnce(Result<(), BridgeError>) + Send>;

/// Session creation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionOptions {
    /// Report abnormal terminations of the navigation engine.
    pub abnormal_termination_reporting: bool,
    /// What the engine does when the host task is removed.
    pub task_removed_behavior: TaskRemovedBehavior,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            abnormal_termination_reporting: true,
            task_removed_behavior: TaskRemovedBehavior::ContinueService,
        }
    }
}

impl SessionOptions {
    /// Sets abnormal termination reporting.
    pub fn with_abnormal_termination_reporting(mut self, enabled: bool) -> Self {
        self.abnormal_termination_reporting = enabled;
        self
    }

    /// Sets the task removed behavior.
    pub fn with_task_removed_behavior(mut self, behavior: TaskRemovedBehavior) -> Self {
        self.task_removed_behavior = behavior;
        self
    }
}

/// Session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// No navigator is in use.
    Uninitialized,
    /// A navigator was requested and the engine has not answered yet.
    Initializing,
    /// The navigator is usable.
    Ready,
}

struct SessionState {
    phase: SessionPhase,
    /// Kept across cleanups, so re-creation does not request a new navigator.
    navigator: Option<Arc<dyn Navigator>>,
    pending: Vec<SessionCallback>,
    options: SessionOptions,
    subscriptions: AHashMap<ListenerKind, SubscriptionId>,
    road_snapped: Option<(Arc<dyn RoadSnappedLocationProvider>, SubscriptionId)>,
    turn_by_turn_enabled: bool,
    activity: Option<Weak<dyn HostActivity>>,
}

/// Native registrations taken out of the session state. Released once the state lock is gone.
struct DetachedListeners {
    navigator: Option<Arc<dyn Navigator>>,
    subscriptions: Vec<SubscriptionId>,
    turn_by_turn: bool,
    road_snapped: Option<(Arc<dyn RoadSnappedLocationProvider>, SubscriptionId)>,
}

impl DetachedListeners {
    fn take(state: &mut SessionState) -> Self {
        Self {
            navigator: state.navigator.clone(),
            subscriptions: state.subscriptions.drain().map(|(_, id)| id).collect(),
            turn_by_turn: std::mem::take(&mut state.turn_by_turn_enabled),
            road_snapped: state.road_snapped.take(),
        }
    }

    fn release(self) {
        if let Some(navigator) = &self.navigator {
            for id in self.subscriptions {
                navigator.unsubscribe(id);
            }

            if self.turn_by_turn && !navigator.unregister_nav_updates() {
                warn!("Failed to unregister turn-by-turn updates");
            }
        }

        if let Some((provider, id)) = self.road_snapped {
            provider.remove_listener(id);
        }
    }
}

/// Owner of the native navigator and of the listeners registered on it.
pub struct NavigationSessionManager {
    services: Arc<dyn NavigationServices>,
    views: Arc<ViewRegistry>,
    events: Arc<dyn SessionEventSink>,
    relay: Arc<SessionEventRelay>,
    state: Mutex<SessionState>,
    this: Weak<NavigationSessionManager>,
}

impl std::fmt::Debug for NavigationSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationSessionManager")
            .field("phase", &self.state.try_lock().map(|state| state.phase))
            .finish_non_exhaustive()
    }
}

impl NavigationSessionManager {
    /// Creates a manager in the [`SessionPhase::Uninitialized`] phase.
    pub fn new(
        services: Arc<dyn NavigationServices>,
        views: Arc<ViewRegistry>,
        events: Arc<dyn SessionEventSink>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            services,
            views,
            relay: Arc::new(SessionEventRelay::new(events.clone())),
            events,
            state: Mutex::new(SessionState {
                phase: SessionPhase::Uninitialized,
                navigator: None,
                pending: Vec::new(),
                options: SessionOptions::default(),
                subscriptions: AHashMap::new(),
                road_snapped: None,
                turn_by_turn_enabled: false,
                activity: None,
            }),
            this: this.clone(),
        })
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    /// Returns true once the navigator is usable.
    pub fn is_initialized(&self) -> bool {
        self.phase() == SessionPhase::Ready
    }

    /// Number of navigator listeners currently registered.
    pub fn registered_listener_count(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// The navigator of a ready session.
    pub fn navigator(&self) -> Result<Arc<dyn Navigator>, BridgeError> {
        let state = self.state.lock();
        match (state.phase, &state.navigator) {
            (SessionPhase::Ready, Some(navigator)) => Ok(navigator.clone()),
            _ => Err(BridgeError::SessionNotInitialized),
        }
    }

    /// Stores the host activity the session works for. Only a weak reference is kept.
    pub fn on_activity_created(&self, activity: &Arc<dyn HostActivity>) {
        self.state.lock().activity = Some(Arc::downgrade(activity));
    }

    /// Unregisters every listener and forgets the host activity.
    pub fn on_activity_destroyed(&self) {
        let listeners = {
            let mut state = self.state.lock();
            state.activity = None;
            DetachedListeners::take(&mut state)
        };

        listeners.release();
    }

    fn activity(state: &SessionState) -> Result<Arc<dyn HostActivity>, BridgeError> {
        state
            .activity
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(BridgeError::ActivityNotFound)
    }

    /// Creates the navigation session.
    ///
    /// A ready session only re-registers its listeners. Otherwise terms acceptance and then
    /// location permission are checked before a navigator is requested. Calls made while a
    /// navigator request is in flight are resolved together with it.
    pub fn create_navigation_session(&self, options: SessionOptions, callback: SessionCallback) {
        let mut state = self.state.lock();
        match state.phase {
            SessionPhase::Ready => {
                debug!("Navigation session already initialized, re-registering listeners");
                drop(state);
                self.register_listeners();
                callback(Ok(()));
                return;
            }
            SessionPhase::Initializing => {
                debug!("Navigation session is initializing, queueing callback");
                state.pending.push(callback);
                return;
            }
            SessionPhase::Uninitialized => {}
        }

        if !self.services.are_terms_accepted() {
            drop(state);
            callback(Err(BridgeError::TermsNotAccepted));
            return;
        }

        if !self.services.has_location_permission() {
            drop(state);
            callback(Err(BridgeError::LocationPermissionMissing));
            return;
        }

        state.options = options;
        self.services.set_abnormal_termination_reporting(options.abnormal_termination_reporting);

        if let Some(navigator) = state.navigator.clone() {
            debug!("Reusing the navigator of the previous session");
            state.pending.push(callback);
            drop(state);
            self.on_navigator_result(Ok(navigator));
            return;
        }

        let activity = match Self::activity(&state) {
            Ok(activity) => activity,
            Err(error) => {
                drop(state);
                callback(Err(error));
                return;
            }
        };

        state.phase = SessionPhase::Initializing;
        state.pending.push(callback);
        drop(state);

        debug!("Requesting navigator");
        let this = self.this.clone();
        self.services.request_navigator(
            &activity,
            Box::new(move |result| {
                if let Some(manager) = this.upgrade() {
                    manager.on_navigator_result(result);
                }
            }),
        );
    }

    fn on_navigator_result(&self, result: Result<Arc<dyn Navigator>, NavigatorError>) {
        match result {
            Ok(navigator) => {
                let (pending, task_removed_behavior) = {
                    let mut state = self.state.lock();
                    state.navigator = Some(navigator.clone());
                    state.phase = SessionPhase::Ready;
                    (
                        std::mem::take(&mut state.pending),
                        state.options.task_removed_behavior,
                    )
                };

                navigator.set_task_removed_behavior(task_removed_behavior);
                self.register_listeners();

                debug!("Navigation session is ready");
                self.attach_to_views(&navigator);
                self.events.on_session_event(SessionEvent::NavigationSessionReady(true));

                for callback in pending {
                    callback(Ok(()));
                }
            }
            Err(navigator_error) => {
                let pending = {
                    let mut state = self.state.lock();
                    state.phase = SessionPhase::Uninitialized;
                    std::mem::take(&mut state.pending)
                };

                error!("Failed to create navigator: {navigator_error:?}");
                for callback in pending {
                    callback(Err(Self::map_navigator_error(navigator_error)));
                }
            }
        }
    }

    fn map_navigator_error(error: NavigatorError) -> BridgeError {
        match error {
            NavigatorError::NotAuthorized => BridgeError::NotAuthorized,
            NavigatorError::TermsNotAccepted => BridgeError::TermsNotAccepted,
            NavigatorError::NetworkError => BridgeError::NetworkError,
            NavigatorError::LocationPermissionMissing => BridgeError::LocationPermissionMissing,
        }
    }

    fn attach_to_views(&self, navigator: &Arc<dyn Navigator>) {
        let views = self
            .views
            .navigation_views()
            .into_iter()
            .chain(self.views.auxiliary());
        for view in views {
            view.attach_navigator(navigator);
        }
    }

    fn detach_from_views(&self) {
        let views: Vec<Arc<MapViewController>> = self
            .views
            .navigation_views()
            .into_iter()
            .chain(self.views.auxiliary())
            .collect();
        for view in views {
            view.detach_navigator();
        }
    }

    /// Registers every base listener, replacing earlier registrations. Native calls run without
    /// the state lock.
    fn register_listeners(&self) {
        let (navigator, previous) = {
            let mut state = self.state.lock();
            let Some(navigator) = state.navigator.clone() else {
                return;
            };

            let previous: Vec<SubscriptionId> = ListenerKind::BASE
                .iter()
                .filter_map(|kind| state.subscriptions.remove(kind))
                .collect();
            (navigator, previous)
        };

        for id in previous {
            navigator.unsubscribe(id);
        }

        let registered: Vec<(ListenerKind, SubscriptionId)> = ListenerKind::BASE
            .iter()
            .filter_map(|kind| {
                let subscription = kind.subscription()?;
                Some((*kind, navigator.subscribe(subscription, self.relay.clone())))
            })
            .collect();

        let stale = {
            let mut state = self.state.lock();
            if state.phase == SessionPhase::Ready {
                let stale: Vec<SubscriptionId> = registered
                    .into_iter()
                    .filter_map(|(kind, id)| state.subscriptions.insert(kind, id))
                    .collect();
                debug!("Registered {} navigator listeners", state.subscriptions.len());
                stale
            } else {
                debug!("Session was cleaned up while registering listeners");
                registered.into_iter().map(|(_, id)| id).collect()
            }
        };

        for id in stale {
            navigator.unsubscribe(id);
        }
    }

    /// Stops guidance, clears destinations and the simulated location, unregisters every
    /// listener and returns to [`SessionPhase::Uninitialized`]. The manager itself stays
    /// usable.
    pub fn cleanup(&self) -> Result<(), BridgeError> {
        let navigator = self.navigator()?;
        navigator.stop_guidance();
        navigator.clear_destinations();
        navigator.simulator().unset_user_location();

        let listeners = {
            let mut state = self.state.lock();
            state.phase = SessionPhase::Uninitialized;
            DetachedListeners::take(&mut state)
        };
        listeners.release();

        debug!("Navigation session cleaned up");
        self.detach_from_views();
        self.events.on_session_event(SessionEvent::NavigationSessionReady(false));
        Ok(())
    }

    /// Version of the native navigation engine.
    pub fn nav_sdk_version(&self) -> String {
        self.services.nav_sdk_version()
    }

    /// Returns whether the user accepted the terms and conditions.
    pub fn are_terms_accepted(&self) -> bool {
        self.services.are_terms_accepted()
    }

    /// Shows the terms and conditions dialog. Reports `true` immediately when the terms
    /// were already accepted.
    pub fn show_terms_and_conditions_dialog(
        &self,
        params: TermsDialogParams,
        callback: Box<dyn FnOnce(bool) + Send>,
    ) {
        if self.services.are_terms_accepted() {
            callback(true);
            return;
        }

        self.services.show_terms_dialog(params, callback);
    }

    /// Resets the terms acceptance. Not allowed while a session is active.
    pub fn reset_terms_accepted(&self) -> Result<(), BridgeError> {
        if self.is_initialized() {
            return Err(BridgeError::TermsResetNotAllowed);
        }

        self.services.reset_terms_accepted().map_err(|message| {
            warn!("Terms reset refused: {message}");
            BridgeError::TermsResetNotAllowed
        })
    }

    /// Starts guidance.
    pub fn start_guidance(&self) -> Result<(), BridgeError> {
        self.navigator()?.start_guidance();
        Ok(())
    }

    /// Stops guidance.
    pub fn stop_guidance(&self) -> Result<(), BridgeError> {
        self.navigator()?.stop_guidance();
        Ok(())
    }

    /// Returns whether guidance is running.
    pub fn is_guidance_running(&self) -> Result<bool, BridgeError> {
        Ok(self.navigator()?.is_guidance_running())
    }

    /// Sets destinations and applies the display options to every view.
    ///
    /// With route token options the route is taken from the token; a token the engine
    /// cannot parse fails with [`BridgeError::RouteTokenMalformed`].
    pub fn set_destinations(
        &self,
        destinations: Destinations,
        callback: RouteStatusCallback,
    ) -> Result<(), BridgeError> {
        let navigator = self.navigator()?;
        self.apply_display_options(&destinations);

        match &destinations.route_token_options {
            Some(token) => navigator
                .set_destinations_with_route_token(
                    &destinations.waypoints,
                    token,
                    destinations.display_options,
                    callback,
                )
                .map_err(BridgeError::RouteTokenMalformed),
            None => {
                navigator.set_destinations(
                    &destinations.waypoints,
                    destinations.routing_options.as_ref(),
                    destinations.display_options,
                    callback,
                );
                Ok(())
            }
        }
    }

    fn apply_display_options(&self, destinations: &Destinations) {
        let options = destinations.display_options;
        let settings = [
            (UiSetting::DestinationMarkers, options.show_destination_markers),
            (UiSetting::StopSigns, options.show_stop_signs),
            (UiSetting::TrafficLights, options.show_traffic_lights),
        ];

        for view in self.views.all_views() {
            for (setting, value) in settings {
                if let Some(enabled) = value {
                    if let Err(error) = view.set_ui_setting(setting, enabled) {
                        debug!(
                            "Display options not applied to view {:?}: {error}",
                            view.view_id()
                        );
                    }
                }
            }
        }
    }

    /// Clears every destination.
    pub fn clear_destinations(&self) -> Result<(), BridgeError> {
        self.navigator()?.clear_destinations();
        Ok(())
    }

    /// Continues to the next destination and returns it.
    pub fn continue_to_next_destination(&self) -> Result<Option<Waypoint>, BridgeError> {
        Ok(self.navigator()?.continue_to_next_destination())
    }

    /// Time and distance to the next destination.
    pub fn current_time_and_distance(&self) -> Result<TimeAndDistance, BridgeError> {
        Ok(self.navigator()?.current_time_and_distance())
    }

    /// Sets audio guidance.
    pub fn set_audio_guidance(&self, settings: AudioGuidanceSettings) -> Result<(), BridgeError> {
        self.navigator()?.set_audio_guidance(settings);
        Ok(())
    }

    /// Sets speed alert thresholds.
    pub fn set_speed_alert_options(&self, options: SpeedAlertOptions) -> Result<(), BridgeError> {
        self.navigator()?.set_speed_alert_options(options);
        Ok(())
    }

    /// Segments of the current route.
    pub fn route_segments(&self) -> Result<Vec<RouteSegment>, BridgeError> {
        Ok(self.navigator()?.route_segments())
    }

    /// Route traveled so far.
    pub fn traveled_route(&self) -> Result<Vec<LatLng>, BridgeError> {
        Ok(self.navigator()?.traveled_route())
    }

    /// Segment currently driven.
    pub fn current_route_segment(&self) -> Result<Option<RouteSegment>, BridgeError> {
        Ok(self.navigator()?.current_route_segment())
    }

    /// Sets the simulated user location.
    pub fn set_user_location(&self, location: LatLng) -> Result<(), BridgeError> {
        self.navigator()?.simulator().set_user_location(location);
        Ok(())
    }

    /// Removes the simulated user location.
    pub fn remove_user_location(&self) -> Result<(), BridgeError> {
        self.navigator()?.simulator().unset_user_location();
        Ok(())
    }

    /// Simulates driving along the current route.
    pub fn simulate_locations_along_existing_route(&self) -> Result<(), BridgeError> {
        self.navigator()?
            .simulator()
            .simulate_along_existing_route(None);
        Ok(())
    }

    /// Simulates driving along the current route with the given options.
    pub fn simulate_locations_along_existing_route_with_options(
        &self,
        options: SimulationOptions,
    ) -> Result<(), BridgeError> {
        self.navigator()?
            .simulator()
            .simulate_along_existing_route(Some(options));
        Ok(())
    }

    /// Calculates a route through `waypoints` and simulates driving along it.
    pub fn simulate_locations_along_new_route(
        &self,
        waypoints: &[Waypoint],
        routing: Option<&RoutingOptions>,
        simulation: Option<SimulationOptions>,
        callback: RouteStatusCallback,
    ) -> Result<(), BridgeError> {
        self.navigator()?
            .simulator()
            .simulate_along_new_route(waypoints, routing, simulation, callback);
        Ok(())
    }

    /// Pauses the simulation.
    pub fn pause_simulation(&self) -> Result<(), BridgeError> {
        self.navigator()?.simulator().pause();
        Ok(())
    }

    /// Resumes the simulation.
    pub fn resume_simulation(&self) -> Result<(), BridgeError> {
        self.navigator()?.simulator().resume();
        Ok(())
    }

    /// Subscribes to remaining time or distance changes above the given thresholds,
    /// replacing the previous subscription.
    pub fn register_remaining_time_or_distance_changed_listener(
        &self,
        time_threshold_seconds: i64,
        distance_threshold_meters: i64,
    ) -> Result<(), BridgeError> {
        let navigator = self.navigator()?;
        let kind = ListenerKind::RemainingTimeOrDistance;
        let previous = self.state.lock().subscriptions.remove(&kind);
        if let Some(previous) = previous {
            navigator.unsubscribe(previous);
        }

        let id = navigator.subscribe(
            NavigatorSubscription::RemainingTimeOrDistance {
                time_threshold_seconds,
                distance_threshold_meters,
            },
            self.relay.clone(),
        );

        let replaced = self.state.lock().subscriptions.insert(kind, id);
        if let Some(replaced) = replaced {
            navigator.unsubscribe(replaced);
        }

        Ok(())
    }

    /// Starts road snapped location updates. Enabling twice is a no-op.
    pub fn enable_road_snapped_location_updates(&self) -> Result<(), BridgeError> {
        if self.state.lock().road_snapped.is_some() {
            return Ok(());
        }

        let provider = self
            .services
            .road_snapped_location_provider()
            .ok_or(BridgeError::RoadSnappedLocationProviderUnavailable)?;
        let id = provider.add_listener(self.relay.clone());

        let mut state = self.state.lock();
        if state.road_snapped.is_some() {
            drop(state);
            provider.remove_listener(id);
            return Ok(());
        }

        state.road_snapped = Some((provider, id));
        Ok(())
    }

    /// Stops road snapped location updates.
    pub fn disable_road_snapped_location_updates(&self) {
        let subscription = self.state.lock().road_snapped.take();
        if let Some((provider, id)) = subscription {
            provider.remove_listener(id);
        }
    }

    /// Starts relaying turn-by-turn updates with at most `max_steps` upcoming steps (no cap
    /// when `None`). Enabling twice is a no-op.
    pub fn enable_turn_by_turn_navigation_events(
        &self,
        max_steps: Option<usize>,
    ) -> Result<(), BridgeError> {
        let navigator = self.navigator()?;
        let activity = {
            let mut state = self.state.lock();
            if state.turn_by_turn_enabled {
                return Ok(());
            }

            let activity = Self::activity(&state)?;
            state.turn_by_turn_enabled = true;
            activity
        };

        let max_steps = max_steps.unwrap_or(usize::MAX);
        let sink = Arc::new(SessionEventRelay::new(self.events.clone()).with_max_steps(max_steps));
        if !navigator.register_nav_updates(&activity.package_name(), max_steps, sink) {
            self.state.lock().turn_by_turn_enabled = false;
            return Err(BridgeError::TurnByTurnService(
                "failed to register for turn-by-turn updates".into(),
            ));
        }

        Ok(())
    }

    /// Stops relaying turn-by-turn updates and detaches the native subscription.
    pub fn disable_turn_by_turn_navigation_events(&self) -> Result<(), BridgeError> {
        let navigator = self.navigator()?;
        if !std::mem::take(&mut self.state.lock().turn_by_turn_enabled) {
            return Ok(());
        }

        if !navigator.unregister_nav_updates() {
            self.state.lock().turn_by_turn_enabled = true;
            return Err(BridgeError::TurnByTurnService(
                "failed to unregister turn-by-turn updates".into(),
            ));
        }

        Ok(())
    }
}

/// Holder of the plugin wide session manager.
///
/// The plugin creates and destroys the manager explicitly; everyone else looks it up.
#[derive(Default)]
pub struct SessionSlot {
    manager: RwLock<Option<Arc<NavigationSessionManager>>>,
}

impl SessionSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The session manager, if it exists.
    pub fn get(&self) -> Option<Arc<NavigationSessionManager>> {
        self.manager.read().clone()
    }

    /// The session manager, or [`BridgeError::SessionManagerNotAvailable`].
    pub fn manager(&self) -> Result<Arc<NavigationSessionManager>, BridgeError> {
        self.get().ok_or(BridgeError::SessionManagerNotAvailable)
    }

    /// Creates the manager unless it already exists.
    pub fn create_with(
        &self,
        create: impl FnOnce() -> Arc<NavigationSessionManager>,
    ) -> Arc<NavigationSessionManager> {
        let mut manager = self.manager.write();
        manager.get_or_insert_with(create).clone()
    }

    /// Removes the manager from the slot.
    pub fn take(&self) -> Option<Arc<NavigationSessionManager>> {
        self.manager.write().take()
    }
}
