//! Navigation session values: waypoints, route status, guidance and simulation options, and
//! turn-by-turn step information.

use serde::{Deserialize, Serialize};

use crate::latlng::LatLng;

/// A stop on the route. Either `target` or `place_id` identifies the location.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Waypoint {
    /// Human readable title.
    pub title: String,
    /// Geographic location of the stop.
    pub target: Option<LatLng>,
    /// Place id of the stop.
    pub place_id: Option<String>,
    /// Prefer arriving on the same side of the road as the waypoint.
    pub prefer_same_side_of_road: bool,
    /// Preferred heading at arrival, in degrees.
    pub preferred_segment_heading: Option<i32>,
}

impl Waypoint {
    /// Waypoint at the given location.
    pub fn at(title: impl Into<String>, target: LatLng) -> Self {
        Self {
            title: title.into(),
            target: Some(target),
            ..Default::default()
        }
    }
}

/// Result of a route calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum RouteStatus {
    /// Route found.
    Ok,
    /// The engine failed internally.
    InternalError,
    /// No route between the waypoints.
    RouteNotFound,
    /// Network request failed.
    NetworkError,
    /// Routing quota exhausted.
    QuotaExceeded,
    /// The API key is not authorized for routing.
    ApiKeyNotAuthorized,
    /// Calculation was cancelled by a newer request.
    StatusCanceled,
    /// Two consecutive waypoints are identical.
    DuplicateWaypointsError,
    /// No waypoints were given.
    NoWaypointsError,
    /// Current location is not available.
    LocationUnavailable,
    /// A waypoint could not be resolved.
    WaypointError,
    /// Travel mode is not supported for this route.
    TravelModeUnsupported,
    /// Current location is not known yet.
    LocationUnknown,
    /// Unrecognized native status.
    Unknown,
}

/// Remaining time and distance to the next destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct TimeAndDistance {
    /// Seconds to the destination.
    pub seconds: f64,
    /// Meters to the destination.
    pub meters: f64,
}

/// Severity of a speeding alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SpeedAlertSeverity {
    /// Unrecognized severity.
    Unknown,
    /// Speed is within the limit.
    NotSpeeding,
    /// Minor speeding.
    Minor,
    /// Major speeding.
    Major,
}

/// Speeding state reported by the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SpeedingUpdate {
    /// How much the current speed exceeds the limit, in percent.
    pub percentage_above_limit: f64,
    /// Severity of the alert.
    pub severity: SpeedAlertSeverity,
}

/// Thresholds for speed alerts.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SpeedAlertOptions {
    /// Seconds a minor alert must last before it becomes major.
    pub severity_upgrade_duration_seconds: f64,
    /// Percentage above the limit that triggers a minor alert.
    pub minor_speed_alert_threshold_percentage: f64,
    /// Percentage above the limit that triggers a major alert.
    pub major_speed_alert_threshold_percentage: f64,
}

/// Audio guidance mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum AudioGuidance {
    /// No audio.
    Silent,
    /// Alerts only, no turn instructions.
    AlertsOnly,
    /// Alerts and turn instructions.
    #[default]
    AlertsAndGuidance,
}

/// Audio guidance settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct AudioGuidanceSettings {
    /// Play guidance over bluetooth audio.
    pub is_bluetooth_audio_enabled: Option<bool>,
    /// Vibrate on alerts.
    pub is_vibration_enabled: Option<bool>,
    /// Guidance mode.
    pub guidance_type: Option<AudioGuidance>,
}

/// What happens to the navigation session when the host task is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum TaskRemovedBehavior {
    /// Guidance keeps running in the background.
    #[default]
    ContinueService,
    /// Guidance stops and the notification is removed.
    QuitService,
}

/// Travel mode used for route calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum TravelMode {
    /// Car.
    #[default]
    Driving,
    /// Bicycle.
    Cycling,
    /// Walking.
    Walking,
    /// Motorcycle or scooter.
    TwoWheeler,
    /// Taxi lanes allowed.
    Taxi,
}

/// Route calculation preferences.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RoutingOptions {
    /// Travel mode, driving if absent.
    pub travel_mode: Option<TravelMode>,
    /// Avoid ferries.
    pub avoid_ferries: Option<bool>,
    /// Avoid highways.
    pub avoid_highways: Option<bool>,
    /// Avoid tolls.
    pub avoid_tolls: Option<bool>,
    /// Number of alternate routes to compute.
    pub alternate_routes_count: Option<u32>,
    /// Target distance per waypoint, in meters.
    pub target_distance_meters: Option<Vec<Option<i64>>>,
}

/// Pre-computed route passed as an opaque token.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouteTokenOptions {
    /// Opaque route token.
    pub route_token: String,
    /// Travel mode the token was computed for.
    pub travel_mode: Option<TravelMode>,
}

/// Elements the native surface shows along the route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DisplayOptions {
    /// Show markers at destinations.
    pub show_destination_markers: Option<bool>,
    /// Show stop signs.
    pub show_stop_signs: Option<bool>,
    /// Show traffic lights.
    pub show_traffic_lights: Option<bool>,
}

/// Destinations for guidance.
///
/// When `route_token_options` is present the route is taken from the token and
/// `routing_options` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Destinations {
    /// Stops in visiting order.
    pub waypoints: Vec<Waypoint>,
    /// Route display options.
    pub display_options: DisplayOptions,
    /// Route calculation preferences.
    pub routing_options: Option<RoutingOptions>,
    /// Pre-computed route.
    pub route_token_options: Option<RouteTokenOptions>,
}

/// Location simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SimulationOptions {
    /// Speed multiplier, 1.0 is real time.
    pub speed_multiplier: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
        }
    }
}

/// A segment of the current route.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouteSegment {
    /// Waypoint the segment ends at, if any.
    pub destination_waypoint: Option<Waypoint>,
    /// End point of the segment.
    pub destination_latlng: LatLng,
    /// Path of the segment.
    pub latlngs: Vec<LatLng>,
    /// Traffic along the path.
    pub traffic: Option<Vec<TrafficSpan>>,
}

/// Traffic density over a stretch of a route segment.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TrafficSpan {
    /// Length of the span.
    pub length_meters: f64,
    /// Traffic density of the span.
    pub style: TrafficStyle,
}

/// Traffic density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum TrafficStyle {
    /// No traffic data.
    Unknown,
    /// Free flowing traffic.
    SpeedNormal,
    /// Slower than usual.
    SlowerTraffic,
    /// Traffic jam.
    TrafficJam,
}

/// Overall guidance state in a turn-by-turn update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum NavState {
    /// State not reported.
    #[default]
    Unknown,
    /// Guidance is following the route.
    Enroute,
    /// A new route is being computed.
    Rerouting,
    /// Guidance stopped.
    Stopped,
}

/// Lane guidance for a step.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Lane {
    /// Directions a lane allows, as native maneuver names.
    pub directions: Vec<String>,
    /// True if the lane is recommended for the upcoming maneuver.
    pub is_recommended: bool,
}

/// One maneuver of the route.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StepInfo {
    /// Distance from the previous step.
    pub distance_from_prev_step_meters: i64,
    /// Time from the previous step.
    pub time_from_prev_step_seconds: i64,
    /// Full instruction text.
    pub full_instructions: String,
    /// Full name of the road.
    pub full_road_name: String,
    /// Short name of the road.
    pub simple_road_name: String,
    /// Native maneuver name.
    pub maneuver: String,
    /// Index of the step in the route.
    pub step_number: u32,
    /// Lanes at the maneuver.
    pub lanes: Vec<Lane>,
}

/// Turn-by-turn update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NavInfo {
    /// Guidance state.
    pub nav_state: NavState,
    /// Step being driven.
    pub current_step: Option<StepInfo>,
    /// Upcoming steps, at most as many as the subscription allows.
    pub remaining_steps: Vec<StepInfo>,
    /// True if the route changed since the previous update.
    pub route_changed: bool,
    /// Meters to the current step.
    pub distance_to_current_step_meters: Option<i64>,
    /// Meters to the final destination.
    pub distance_to_final_destination_meters: Option<i64>,
    /// Seconds to the current step.
    pub time_to_current_step_seconds: Option<i64>,
    /// Seconds to the final destination.
    pub time_to_final_destination_seconds: Option<i64>,
}

impl NavInfo {
    /// Drops upcoming steps beyond `max_steps`.
    pub fn truncate_steps(mut self, max_steps: usize) -> Self {
        self.remaining_steps.truncate(max_steps);
        self
    }
}
