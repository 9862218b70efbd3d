//! Value types shared between a host message channel and the `navbridge` controller core.
//!
//! Nothing in this crate talks to a native engine. The types describe positions, camera
//! updates, overlay options and navigation state exactly as they travel over the host
//! contract, so that both sides of the bridge agree on a single vocabulary.

pub mod camera;
pub mod error;
pub mod latlng;
pub mod navigation;
pub mod overlay;

pub use camera::{
    CameraEventType, CameraPerspective, CameraPosition, CameraUpdate, MapPadding, ScreenPoint,
};
pub use error::NavbridgeTypesError;
pub use latlng::{LatLng, LatLngBounds};
pub use navigation::{
    AudioGuidance, AudioGuidanceSettings, Destinations, DisplayOptions, NavInfo, NavState,
    RouteSegment, RouteStatus, RouteTokenOptions, RoutingOptions, SimulationOptions,
    SpeedAlertOptions, SpeedAlertSeverity, SpeedingUpdate, StepInfo, TaskRemovedBehavior,
    TimeAndDistance, TravelMode, Waypoint,
};
pub use overlay::{
    Anchor, CircleDto, CircleOptions, ClusterDto, ImageDescriptor, InfoWindow, MarkerDto,
    MarkerOptions, PolygonDto, PolygonOptions, PolylineDto, PolylineOptions, RegisteredImageType,
    StrokeJointType,
};
