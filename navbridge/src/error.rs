//! Error types used by the crate.

use navbridge_types::NavbridgeTypesError;
use thiserror::Error;

#[cfg(feature = "image")]
use image::ImageError;

/// Navbridge error type.
///
/// Every variant maps to a stable error code reported to the host with [`BridgeError::code`].
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No view is registered with the given id.
    #[error("view with id {0} not found")]
    ViewNotFound(i64),
    /// The auxiliary display view is not registered.
    #[error("auxiliary view not found")]
    AuxiliaryViewNotFound,
    /// The view was created as a plain map and does not support navigation calls.
    #[error("view is not a navigation view")]
    NotNavigationView,
    /// The native surface has not finished initialization yet.
    #[error("map is not ready yet")]
    MapNotReady,
    /// The view was disposed.
    #[error("view is disposed")]
    ViewDisposed,
    /// `await_map_ready` was called while another call was still waiting.
    #[error("a map ready callback is already pending and cannot be overridden")]
    ReadyCallbackPending,

    /// Marker with the given id not found.
    #[error("marker with id {0} not found")]
    MarkerNotFound(String),
    /// Some markers of an update or remove batch were not found.
    #[error("markers not found: {0:?}")]
    MarkersNotFound(Vec<String>),
    /// Some polygons of an update or remove batch were not found.
    #[error("polygons not found: {0:?}")]
    PolygonsNotFound(Vec<String>),
    /// Some polylines of an update or remove batch were not found.
    #[error("polylines not found: {0:?}")]
    PolylinesNotFound(Vec<String>),
    /// Some circles of an update or remove batch were not found.
    #[error("circles not found: {0:?}")]
    CirclesNotFound(Vec<String>),
    /// Cluster manager with the given id not found.
    #[error("cluster manager with id {0} not found")]
    ClusterManagerNotFound(String),

    /// New minimum zoom is above the effective maximum.
    #[error("minimum zoom level {min} cannot be greater than maximum zoom level {max}")]
    MinZoomGreaterThanMaxZoom {
        /// Rejected value.
        min: f64,
        /// Effective maximum.
        max: f64,
    },
    /// New maximum zoom is below the effective minimum.
    #[error("maximum zoom level {max} cannot be less than minimum zoom level {min}")]
    MaxZoomLessThanMinZoom {
        /// Effective minimum.
        min: f64,
        /// Rejected value.
        max: f64,
    },

    /// Navigation calls were made before a session was created.
    #[error("navigation session is not initialized")]
    SessionNotInitialized,
    /// The session manager was destroyed or never created.
    #[error("navigation session manager is not available")]
    SessionManagerNotAvailable,
    /// The user has not accepted the navigation terms and conditions.
    #[error("navigation terms and conditions are not accepted")]
    TermsNotAccepted,
    /// Location permission has not been granted.
    #[error("location permission is missing")]
    LocationPermissionMissing,
    /// The API key is empty or invalid.
    #[error("the navigation API key is missing or invalid")]
    NotAuthorized,
    /// No working network connection during session creation.
    #[error("no working network connection")]
    NetworkError,
    /// Terms acceptance cannot be reset while a session is active.
    #[error("terms acceptance cannot be reset while the navigation session is active")]
    TermsResetNotAllowed,
    /// No host activity is attached.
    #[error("host activity is not available")]
    ActivityNotFound,
    /// Road snapped location provider is not available.
    #[error("road snapped location provider is not available")]
    RoadSnappedLocationProviderUnavailable,
    /// The turn-by-turn update service could not be (un)registered.
    #[error("turn-by-turn updates service error: {0}")]
    TurnByTurnService(String),

    /// The native surface failed to parse the map style.
    #[error("failed to set map style: {0}")]
    MapStyle(String),
    /// The native navigator rejected the route token.
    #[error("route token is malformed: {0}")]
    RouteTokenMalformed(String),
    /// The native engine failed to create an icon from a bitmap.
    #[error("failed to create native icon: {0}")]
    IconCreation(String),

    /// A host value is out of its valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] NavbridgeTypesError),
    /// The scaled image would be empty or exceed the largest supported icon.
    #[error("invalid image size {width}x{height}")]
    InvalidImageSize {
        /// Requested width in physical pixels.
        width: f64,
        /// Requested height in physical pixels.
        height: f64,
    },
    /// Image with the given id is not registered.
    #[error("image with id {0} not found")]
    ImageNotFound(String),
    /// Image bytes could not be decoded.
    #[cfg(feature = "image")]
    #[error("image decode error: {0:?}")]
    ImageDecode(#[from] ImageError),
    /// Image decoding is not compiled in.
    #[cfg(not(feature = "image"))]
    #[error("image decoding is not supported in this build")]
    ImageDecode,
}

impl BridgeError {
    /// Stable error code reported to the host.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::ViewNotFound(_) | BridgeError::AuxiliaryViewNotFound => "viewNotFound",
            BridgeError::NotNavigationView => "notNavigationView",
            BridgeError::MapNotReady => "mapNotFound",
            BridgeError::ViewDisposed => "viewDisposed",
            BridgeError::ReadyCallbackPending => "mapReadyCallbackAlreadyPending",
            BridgeError::MarkerNotFound(_) | BridgeError::MarkersNotFound(_) => "markerNotFound",
            BridgeError::PolygonsNotFound(_) => "polygonNotFound",
            BridgeError::PolylinesNotFound(_) => "polylineNotFound",
            BridgeError::CirclesNotFound(_) => "circleNotFound",
            BridgeError::ClusterManagerNotFound(_) => "clusterManagerNotFound",
            BridgeError::MinZoomGreaterThanMaxZoom { .. } => "minZoomGreaterThanMaxZoom",
            BridgeError::MaxZoomLessThanMinZoom { .. } => "maxZoomLessThanMinZoom",
            BridgeError::SessionNotInitialized => "sessionNotInitialized",
            BridgeError::SessionManagerNotAvailable => "sessionManagerNotAvailable",
            BridgeError::TermsNotAccepted => "termsNotAccepted",
            BridgeError::LocationPermissionMissing => "locationPermissionMissing",
            BridgeError::NotAuthorized => "notAuthorized",
            BridgeError::NetworkError => "networkError",
            BridgeError::TermsResetNotAllowed => "termsResetNotAllowed",
            BridgeError::ActivityNotFound => "activityNotFound",
            BridgeError::RoadSnappedLocationProviderUnavailable => {
                "roadSnappedLocationProviderUnavailable"
            }
            BridgeError::TurnByTurnService(_) => "turnByTurnServiceError",
            BridgeError::MapStyle(_) => "mapStyleError",
            BridgeError::RouteTokenMalformed(_) => "routeTokenMalformed",
            BridgeError::IconCreation(_) => "iconCreationFailed",
            BridgeError::InvalidArgument(_) => "invalidArgument",
            BridgeError::InvalidImageSize { .. } => "invalidImageSize",
            BridgeError::ImageNotFound(_) => "imageNotFound",
            #[cfg(feature = "image")]
            BridgeError::ImageDecode(_) => "imageDecodingFailed",
            #[cfg(not(feature = "image"))]
            BridgeError::ImageDecode => "imageDecodingFailed",
        }
    }

    /// Returns true for errors of an update or remove batch that was partially applied.
    pub fn is_partial_batch(&self) -> bool {
        matches!(
            self,
            BridgeError::MarkersNotFound(_)
                | BridgeError::PolygonsNotFound(_)
                | BridgeError::PolylinesNotFound(_)
                | BridgeError::CirclesNotFound(_)
        )
    }
}
