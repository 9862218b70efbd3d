use std::sync::{Arc, Weak};

use maybe_sync::{MaybeSend, MaybeSync};
use navbridge_types::{
    Anchor, CameraEventType, CameraPerspective, CameraPosition, CameraUpdate, CircleOptions, LatLng,
    LatLngBounds, MapPadding, MarkerOptions, PolygonOptions, PolylineOptions,
};

use super::cluster::{ClusterEngine, ClusterRenderHooks};
use super::navigation::Navigator;
use super::{IconHandle, OverlayHandle};
use crate::decoded_image::DecodedImage;

/// A native overlay object attached to a map surface.
///
/// `O` is what the overlay is configured with and `S` is what can be read back from it. For
/// markers these differ, because a native marker cannot report its anchors or icon.
pub trait NativeOverlay<O, S = O>: MaybeSend + MaybeSync {
    /// Identity of the overlay.
    fn handle(&self) -> OverlayHandle;
    /// Reads the current state of the overlay.
    fn state(&self) -> S;
    /// Applies new options in place.
    fn set_options(&self, options: &O);
    /// Detaches the overlay from the surface.
    fn remove(&self);
}

/// Native marker.
pub type NativeMarker = Box<dyn NativeOverlay<NativeMarkerOptions, NativeMarkerState>>;
/// Native polygon.
pub type NativePolygon = Box<dyn NativeOverlay<PolygonOptions>>;
/// Native polyline.
pub type NativePolyline = Box<dyn NativeOverlay<PolylineOptions>>;
/// Native circle.
pub type NativeCircle = Box<dyn NativeOverlay<CircleOptions>>;

/// Marker options with the icon already resolved to a native icon.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeMarkerOptions {
    /// Position.
    pub position: LatLng,
    /// Opacity.
    pub alpha: f64,
    /// Icon anchor.
    pub anchor: Anchor,
    /// Draggable.
    pub draggable: bool,
    /// Flat on the map.
    pub flat: bool,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Info window title.
    pub title: Option<String>,
    /// Info window snippet.
    pub snippet: Option<String>,
    /// Info window anchor.
    pub info_window_anchor: Anchor,
    /// Visibility.
    pub visible: bool,
    /// Draw order.
    pub z_index: f64,
    /// `None` stands for the default marker icon.
    pub icon: Option<IconHandle>,
}

impl NativeMarkerOptions {
    /// Converts host marker options, using `icon` as the resolved native icon.
    pub fn from_options(options: &MarkerOptions, icon: Option<IconHandle>) -> Self {
        Self {
            position: options.position,
            alpha: options.alpha,
            anchor: options.anchor,
            draggable: options.draggable,
            flat: options.flat,
            rotation: options.rotation,
            title: options.info_window.title.clone(),
            snippet: options.info_window.snippet.clone(),
            info_window_anchor: options.info_window.anchor,
            visible: options.visible,
            z_index: options.z_index,
            icon,
        }
    }
}

/// Marker properties that can be read back from a native marker.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeMarkerState {
    /// Position.
    pub position: LatLng,
    /// Opacity.
    pub alpha: f64,
    /// Draggable.
    pub draggable: bool,
    /// Flat on the map.
    pub flat: bool,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Info window title.
    pub title: Option<String>,
    /// Info window snippet.
    pub snippet: Option<String>,
    /// Visibility.
    pub visible: bool,
    /// Draw order.
    pub z_index: f64,
}

/// Base map type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MapType {
    /// No base map tiles.
    None,
    /// Road map.
    #[default]
    Normal,
    /// Satellite imagery.
    Satellite,
    /// Topographic map.
    Terrain,
    /// Satellite imagery with roads.
    Hybrid,
}

/// A toggleable UI feature of the native surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UiSetting {
    /// My-location layer.
    MyLocation,
    /// My-location button.
    MyLocationButton,
    /// Pinch zoom.
    ZoomGestures,
    /// Zoom buttons.
    ZoomControls,
    /// Compass.
    Compass,
    /// Rotation gestures.
    RotateGestures,
    /// Pan gestures.
    ScrollGestures,
    /// Panning while rotating or zooming.
    ScrollGesturesDuringRotateOrZoom,
    /// Tilt gestures.
    TiltGestures,
    /// Map toolbar.
    MapToolbar,
    /// Traffic layer.
    Traffic,
    /// Navigation header.
    NavigationHeader,
    /// Navigation footer.
    NavigationFooter,
    /// Trip progress bar.
    NavigationTripProgressBar,
    /// Re-center button.
    RecenterButton,
    /// Speed limit icon.
    SpeedLimitIcon,
    /// Speedometer.
    Speedometer,
    /// Traffic incident cards.
    TrafficIncidentCards,
    /// Report incident button.
    ReportIncidentButton,
    /// Destination markers.
    DestinationMarkers,
    /// Stop signs.
    StopSigns,
    /// Traffic lights.
    TrafficLights,
}

/// Host application lifecycle transitions forwarded to native surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LifecycleEvent {
    /// The host became visible.
    Start,
    /// The host got focus.
    Resume,
    /// The host lost focus.
    Pause,
    /// The host is hidden.
    Stop,
    /// Device configuration changed.
    ConfigurationChanged,
    /// The system is low on memory.
    LowMemory,
    /// Memory trim request with the platform trim level.
    TrimMemory(i32),
}

impl LifecycleEvent {
    /// Returns true for events that only navigation surfaces react to.
    pub fn is_navigation_only(&self) -> bool {
        matches!(
            self,
            LifecycleEvent::ConfigurationChanged
                | LifecycleEvent::LowMemory
                | LifecycleEvent::TrimMemory(_)
        )
    }
}

/// Kind of a marker drag callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerDragEventType {
    /// Drag started.
    DragStart,
    /// Drag in progress.
    Drag,
    /// Drag finished.
    DragEnd,
}

/// Kind of an info window callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InfoWindowEventType {
    /// Tap.
    Clicked,
    /// Long press.
    LongClicked,
    /// Closed.
    Closed,
}

/// Called with `true` when a camera animation finishes and `false` when it is cancelled.
pub type AnimationCallback = Box<dyn FnOnce(bool) + Send>;

/// Creates native icons from decoded bitmaps. Only available once a surface finished
/// initialization.
pub trait IconFactory: MaybeSend + MaybeSync {
    /// Creates a native icon.
    fn create_icon(&self, image: &DecodedImage) -> Result<IconHandle, String>;
}

/// Receiver of native map callbacks.
///
/// The surface keeps only a weak reference to the listener, so callbacks arriving after the
/// owning view is gone are dropped by the engine.
pub trait MapEventListener: MaybeSend + MaybeSync {
    /// Tap on the map.
    fn on_map_click(&self, position: LatLng);
    /// Long press on the map.
    fn on_map_long_click(&self, position: LatLng);
    /// Returns true if the default tap behaviour must be suppressed.
    fn on_marker_click(&self, marker: OverlayHandle) -> bool;
    /// Marker drag progress.
    fn on_marker_drag(&self, marker: OverlayHandle, event: MarkerDragEventType, position: LatLng);
    /// Info window event.
    fn on_info_window(&self, marker: OverlayHandle, event: InfoWindowEventType);
    /// Polygon tap.
    fn on_polygon_click(&self, polygon: OverlayHandle);
    /// Polyline tap.
    fn on_polyline_click(&self, polyline: OverlayHandle);
    /// Circle tap.
    fn on_circle_click(&self, circle: OverlayHandle);
    /// Tap on the my-location dot.
    fn on_my_location_click(&self);
    /// Returns true if the default button behaviour must be suppressed.
    fn on_my_location_button_click(&self) -> bool;
    /// Camera movement.
    fn on_camera_event(&self, event: CameraEventType, position: CameraPosition);
    /// Tap on the re-center button.
    fn on_recenter_button_click(&self);
}

/// One native map (or navigation map) rendering surface.
pub trait MapSurface: MaybeSend + MaybeSync {
    /// Adds a marker. `None` if the surface refused it.
    fn add_marker(&self, options: &NativeMarkerOptions) -> Option<NativeMarker>;
    /// Adds a polygon.
    fn add_polygon(&self, options: &PolygonOptions) -> Option<NativePolygon>;
    /// Adds a polyline.
    fn add_polyline(&self, options: &PolylineOptions) -> Option<NativePolyline>;
    /// Adds a circle.
    fn add_circle(&self, options: &CircleOptions) -> Option<NativeCircle>;
    /// Removes every overlay from the surface.
    fn clear(&self);

    /// Absolute minimum zoom level the surface supports.
    fn min_zoom_level(&self) -> f64;
    /// Absolute maximum zoom level the surface supports.
    fn max_zoom_level(&self) -> f64;
    /// Sets the minimum zoom preference.
    fn set_min_zoom_preference(&self, zoom: f64);
    /// Sets the maximum zoom preference.
    fn set_max_zoom_preference(&self, zoom: f64);
    /// Resets both zoom preferences.
    fn reset_min_max_zoom_preference(&self);

    /// Moves the camera.
    fn move_camera(&self, update: &CameraUpdate);
    /// Animates the camera. The callback is invoked exactly once.
    fn animate_camera(
        &self,
        update: &CameraUpdate,
        duration_ms: Option<u64>,
        callback: AnimationCallback,
    );
    /// Current camera position.
    fn camera_position(&self) -> CameraPosition;
    /// Visible region.
    fn visible_region(&self) -> LatLngBounds;
    /// User location, if known.
    fn my_location(&self) -> Option<LatLng>;
    /// Makes the camera follow the user.
    fn follow_my_location(&self, perspective: CameraPerspective);
    /// Zoom level used while following.
    fn set_following_zoom_level(&self, zoom: f64);

    /// Applies a JSON map style. Returns the native parser message on failure.
    fn set_map_style(&self, style_json: &str) -> Result<(), String>;
    /// Current map type.
    fn map_type(&self) -> MapType;
    /// Sets the map type.
    fn set_map_type(&self, map_type: MapType);
    /// Sets the padding.
    fn set_padding(&self, padding: MapPadding);
    /// Toggles a UI setting.
    fn set_ui_setting(&self, setting: UiSetting, enabled: bool);
    /// Reads a UI setting.
    fn ui_setting(&self, setting: UiSetting) -> bool;

    /// Forces a repaint of the surface.
    fn invalidate(&self);
    /// Asks the engine to report the next "map loaded" moment through
    /// [`MapViewController::on_map_loaded`](crate::view::MapViewController::on_map_loaded).
    fn request_map_loaded_callback(&self);
    /// Sets or clears the receiver of native callbacks.
    fn set_event_listener(&self, listener: Option<Weak<dyn MapEventListener>>);

    /// Attaches a navigator. Surfaces without navigation support return false.
    fn attach_navigator(&self, navigator: &Arc<dyn Navigator>) -> bool;
    /// Toggles the navigation UI.
    fn set_navigation_ui_enabled(&self, enabled: bool);
    /// Whether the navigation UI is on.
    fn is_navigation_ui_enabled(&self) -> bool;
    /// Zooms out to the whole route.
    fn show_route_overview(&self);

    /// Creates a clustering algorithm and renderer bound to this surface.
    fn create_cluster_engine(&self, hooks: Weak<dyn ClusterRenderHooks>) -> Box<dyn ClusterEngine>;
    /// Icon factory of the surface.
    fn icon_factory(&self) -> Arc<dyn IconFactory>;

    /// Forwards a host lifecycle transition.
    fn on_lifecycle(&self, event: LifecycleEvent);
    /// Destroys the surface. No callbacks are delivered afterwards.
    fn destroy(&self);
}
