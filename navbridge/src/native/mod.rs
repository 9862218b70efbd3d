//! Interfaces of the wrapped native map and navigation engine.
//!
//! The controller core never renders anything or computes routes by itself. Everything it
//! needs from the engine is described by the traits in this module, which a platform layer
//! implements on top of the real SDK objects.

mod cluster;
mod map;
mod navigation;

pub use cluster::{ClusterEngine, ClusterRenderHooks, NativeCluster};
pub use map::{
    AnimationCallback, IconFactory, InfoWindowEventType, LifecycleEvent, MapEventListener,
    MapSurface, MapType, MarkerDragEventType, NativeCircle, NativeMarker, NativeMarkerOptions,
    NativeMarkerState, NativeOverlay, NativePolygon, NativePolyline, UiSetting,
};
pub use navigation::{
    HostActivity, NavInfoSink, NavigationServices, Navigator, NavigatorError, NavigatorEvent,
    NavigatorEventSink, NavigatorSubscription, RoadSnappedLocationProvider, RoadSnappedLocationSink,
    RouteStatusCallback, Simulator, SubscriptionId, TermsDialogParams,
};

/// Identity of a native overlay object (marker, polygon, polyline or circle).
///
/// The engine assigns handles; they are unique among live overlays of one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayHandle(pub u64);

/// Identity of a native icon (bitmap descriptor) created by an [`IconFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconHandle(pub u64);
