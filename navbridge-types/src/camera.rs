//! Camera state and camera change requests.

use serde::{Deserialize, Serialize};

use crate::latlng::{LatLng, LatLngBounds};

/// Position of the map camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct CameraPosition {
    /// Point the camera is looking at.
    pub target: LatLng,
    /// Zoom level.
    pub zoom: f64,
    /// Direction the camera is facing, in degrees clockwise from north.
    pub bearing: f64,
    /// Camera angle from the nadir, in degrees.
    pub tilt: f64,
}

/// Point on the screen in logical pixels from the top-left corner of the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct ScreenPoint {
    /// Horizontal offset.
    pub x: f64,
    /// Vertical offset.
    pub y: f64,
}

/// A camera change requested by the host. Applied either immediately (move) or with an
/// animation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum CameraUpdate {
    /// Move to the given position.
    NewCameraPosition(CameraPosition),
    /// Keep zoom, bearing and tilt, change the target.
    NewLatLng(LatLng),
    /// Fit the bounds into the view, leaving `padding` pixels at every edge.
    NewLatLngBounds {
        /// Bounds to fit.
        bounds: LatLngBounds,
        /// Padding in pixels.
        padding: f64,
    },
    /// Change the target and the zoom level.
    NewLatLngZoom {
        /// New target.
        target: LatLng,
        /// New zoom level.
        zoom: f64,
    },
    /// Scroll the camera by the given amount of pixels.
    ScrollBy {
        /// Horizontal scroll.
        dx: f64,
        /// Vertical scroll.
        dy: f64,
    },
    /// Change zoom by the given delta, optionally keeping `focus` fixed on the screen.
    ZoomBy {
        /// Zoom delta.
        amount: f64,
        /// Screen point that stays in place.
        focus: Option<ScreenPoint>,
    },
    /// Set zoom to the given level.
    ZoomTo(f64),
}

/// Perspective of the camera while following the user location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum CameraPerspective {
    /// Tilted view in the direction of travel.
    #[default]
    Tilted,
    /// Top-down view rotated with the heading.
    TopDownHeadingUp,
    /// Top-down view with north up.
    TopDownNorthUp,
}

/// Reason a camera event was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum CameraEventType {
    /// Movement was started by an API call or an animation.
    MoveStartedByApi,
    /// Movement was started by a user gesture.
    MoveStartedByGesture,
    /// Camera is moving.
    OnCameraMove,
    /// Camera stopped moving.
    OnCameraIdle,
    /// Camera started following the user location.
    OnCameraStartedFollowingLocation,
    /// Camera stopped following the user location.
    OnCameraStoppedFollowingLocation,
}

/// Padding of the map content inside the view, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MapPadding {
    /// Top padding.
    pub top: i64,
    /// Left padding.
    pub left: i64,
    /// Bottom padding.
    pub bottom: i64,
    /// Right padding.
    pub right: i64,
}
