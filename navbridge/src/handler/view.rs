use std::sync::Arc;

use log::debug;
use navbridge_types::{
    CameraPerspective, CameraPosition, CameraUpdate, CircleDto, ClusterDto, LatLng, LatLngBounds,
    MapPadding, MarkerDto, PolygonDto, PolylineDto,
};

use crate::error::BridgeError;
use crate::native::{AnimationCallback, MapType, UiSetting};
use crate::view::{MapReadyCallback, MapViewController, ViewRegistry};

/// Host call addressed to one view.
///
/// Calls that complete asynchronously (waiting for readiness, camera animation) have their own
/// methods on the handlers since they carry a callback.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub enum ViewCall {
    /// Adds markers.
    AddMarkers(Vec<MarkerDto>),
    /// Updates markers by id.
    UpdateMarkers(Vec<MarkerDto>),
    /// Removes markers by id.
    RemoveMarkers(Vec<MarkerDto>),
    /// Removes all markers.
    ClearMarkers,
    /// Lists markers.
    GetMarkers,
    /// Adds polygons.
    AddPolygons(Vec<PolygonDto>),
    /// Updates polygons by id.
    UpdatePolygons(Vec<PolygonDto>),
    /// Removes polygons by id.
    RemovePolygons(Vec<PolygonDto>),
    /// Removes all polygons.
    ClearPolygons,
    /// Lists polygons.
    GetPolygons,
    /// Adds polylines.
    AddPolylines(Vec<PolylineDto>),
    /// Updates polylines by id.
    UpdatePolylines(Vec<PolylineDto>),
    /// Removes polylines by id.
    RemovePolylines(Vec<PolylineDto>),
    /// Removes all polylines.
    ClearPolylines,
    /// Lists polylines.
    GetPolylines,
    /// Adds circles.
    AddCircles(Vec<CircleDto>),
    /// Updates circles by id.
    UpdateCircles(Vec<CircleDto>),
    /// Removes circles by id.
    RemoveCircles(Vec<CircleDto>),
    /// Removes all circles.
    ClearCircles,
    /// Lists circles.
    GetCircles,
    /// Removes every overlay.
    Clear,
    /// Adds a cluster manager.
    AddClusterManager(String),
    /// Removes a cluster manager and its items.
    RemoveClusterManager(String),
    /// Lists cluster manager ids.
    GetClusterManagers,
    /// Moves an existing marker into a cluster manager.
    AddMarkerToCluster {
        /// Logical marker id.
        marker_id: String,
        /// Target cluster manager.
        cluster_manager_id: String,
    },
    /// Clusters of one manager.
    GetClusters(String),
    /// Clusters of all managers.
    GetAllClusters,
    /// Moves the camera without animation.
    MoveCamera(CameraUpdate),
    /// Current camera position.
    GetCameraPosition,
    /// Visible region.
    GetVisibleRegion,
    /// Makes the camera follow the user.
    FollowMyLocation {
        /// Camera perspective while following.
        perspective: CameraPerspective,
        /// Zoom level while following.
        zoom_level: Option<f64>,
    },
    /// Last known user location.
    GetMyLocation,
    /// Starts camera change events.
    RegisterOnCameraChangedListener,
    /// Sets the minimum zoom preference.
    SetMinZoomPreference(f64),
    /// Sets the maximum zoom preference.
    SetMaxZoomPreference(f64),
    /// Effective minimum zoom.
    GetMinZoomPreference,
    /// Effective maximum zoom.
    GetMaxZoomPreference,
    /// Resets both zoom preferences.
    ResetMinMaxZoomPreference,
    /// Applies a JSON map style.
    SetMapStyle(String),
    /// Current map type.
    GetMapType,
    /// Sets the map type.
    SetMapType(MapType),
    /// Sets the map padding.
    SetPadding(MapPadding),
    /// Current map padding.
    GetPadding,
    /// Toggles a UI setting.
    SetUiSetting(UiSetting, bool),
    /// Reads a UI setting.
    GetUiSetting(UiSetting),
    /// Whether my-location button taps skip the native behaviour.
    SetConsumeMyLocationButtonClickEvents(bool),
    /// Reads the my-location button consumption flag.
    IsConsumingMyLocationButtonClickEvents,
    /// Toggles the navigation UI.
    SetNavigationUiEnabled(bool),
    /// Whether the navigation UI is on.
    IsNavigationUiEnabled,
    /// Zooms out to the whole route.
    ShowRouteOverview,
}

/// Result of a [`ViewCall`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ViewReply {
    /// The call has no result value.
    Done,
    /// A single marker.
    Marker(MarkerDto),
    /// Markers.
    Markers(Vec<MarkerDto>),
    /// Polygons.
    Polygons(Vec<PolygonDto>),
    /// Polylines.
    Polylines(Vec<PolylineDto>),
    /// Circles.
    Circles(Vec<CircleDto>),
    /// Cluster manager ids.
    ClusterManagerIds(Vec<String>),
    /// Clusters.
    Clusters(Vec<ClusterDto>),
    /// Camera position.
    CameraPosition(CameraPosition),
    /// Visible region.
    VisibleRegion(LatLngBounds),
    /// User location, if known.
    MyLocation(Option<LatLng>),
    /// Zoom level.
    Zoom(f64),
    /// Map type.
    MapType(MapType),
    /// Map padding.
    Padding(MapPadding),
    /// Boolean answer.
    Flag(bool),
}

/// Executes a call on a resolved view.
pub(super) fn apply(view: &MapViewController, call: ViewCall) -> Result<ViewReply, BridgeError> {
    use ViewCall::*;

    let reply = match call {
        AddMarkers(markers) => ViewReply::Markers(view.add_markers(markers)?),
        UpdateMarkers(markers) => ViewReply::Markers(view.update_markers(markers)?),
        RemoveMarkers(markers) => done(view.remove_markers(&markers))?,
        ClearMarkers => done(view.clear_markers())?,
        GetMarkers => ViewReply::Markers(view.get_markers()?),
        AddPolygons(polygons) => ViewReply::Polygons(view.add_polygons(polygons)?),
        UpdatePolygons(polygons) => ViewReply::Polygons(view.update_polygons(polygons)?),
        RemovePolygons(polygons) => done(view.remove_polygons(&polygons))?,
        ClearPolygons => done(view.clear_polygons())?,
        GetPolygons => ViewReply::Polygons(view.get_polygons()?),
        AddPolylines(polylines) => ViewReply::Polylines(view.add_polylines(polylines)?),
        UpdatePolylines(polylines) => ViewReply::Polylines(view.update_polylines(polylines)?),
        RemovePolylines(polylines) => done(view.remove_polylines(&polylines))?,
        ClearPolylines => done(view.clear_polylines())?,
        GetPolylines => ViewReply::Polylines(view.get_polylines()?),
        AddCircles(circles) => ViewReply::Circles(view.add_circles(circles)?),
        UpdateCircles(circles) => ViewReply::Circles(view.update_circles(circles)?),
        RemoveCircles(circles) => done(view.remove_circles(&circles))?,
        ClearCircles => done(view.clear_circles())?,
        GetCircles => ViewReply::Circles(view.get_circles()?),
        Clear => done(view.clear())?,
        AddClusterManager(id) => done(view.add_cluster_manager(&id))?,
        RemoveClusterManager(id) => done(view.remove_cluster_manager(&id))?,
        GetClusterManagers => ViewReply::ClusterManagerIds(view.cluster_manager_ids()?),
        AddMarkerToCluster {
            marker_id,
            cluster_manager_id,
        } => ViewReply::Marker(view.add_marker_to_cluster(&marker_id, &cluster_manager_id)?),
        GetClusters(id) => ViewReply::Clusters(view.get_clusters(&id)?),
        GetAllClusters => ViewReply::Clusters(view.get_all_clusters()?),
        MoveCamera(update) => done(view.move_camera(&update))?,
        GetCameraPosition => ViewReply::CameraPosition(view.camera_position()?),
        GetVisibleRegion => ViewReply::VisibleRegion(view.visible_region()?),
        FollowMyLocation {
            perspective,
            zoom_level,
        } => done(view.follow_my_location(perspective, zoom_level))?,
        GetMyLocation => ViewReply::MyLocation(view.my_location()?),
        RegisterOnCameraChangedListener => done(view.register_on_camera_changed_listener())?,
        SetMinZoomPreference(zoom) => done(view.set_min_zoom_preference(zoom))?,
        SetMaxZoomPreference(zoom) => done(view.set_max_zoom_preference(zoom))?,
        GetMinZoomPreference => ViewReply::Zoom(view.min_zoom_preference()),
        GetMaxZoomPreference => ViewReply::Zoom(view.max_zoom_preference()),
        ResetMinMaxZoomPreference => done(view.reset_min_max_zoom_preference())?,
        SetMapStyle(style) => done(view.set_map_style(&style))?,
        GetMapType => ViewReply::MapType(view.map_type()?),
        SetMapType(map_type) => done(view.set_map_type(map_type))?,
        SetPadding(padding) => done(view.set_padding(padding))?,
        GetPadding => ViewReply::Padding(view.padding()?),
        SetUiSetting(setting, enabled) => done(view.set_ui_setting(setting, enabled))?,
        GetUiSetting(setting) => ViewReply::Flag(view.ui_setting(setting)?),
        SetConsumeMyLocationButtonClickEvents(consume) => {
            done(view.set_consume_my_location_button_click_events(consume))?
        }
        IsConsumingMyLocationButtonClickEvents => {
            ViewReply::Flag(view.consumes_my_location_button_click_events()?)
        }
        SetNavigationUiEnabled(enabled) => done(view.set_navigation_ui_enabled(enabled))?,
        IsNavigationUiEnabled => ViewReply::Flag(view.is_navigation_ui_enabled()?),
        ShowRouteOverview => done(view.show_route_overview())?,
    };

    Ok(reply)
}

fn done(result: Result<(), BridgeError>) -> Result<ViewReply, BridgeError> {
    result.map(|()| ViewReply::Done)
}

/// Routes host calls to views registered by id.
pub struct ViewMessageHandler {
    views: Arc<ViewRegistry>,
}

impl ViewMessageHandler {
    /// Creates a handler resolving views in `views`.
    pub fn new(views: Arc<ViewRegistry>) -> Self {
        Self { views }
    }

    /// The view with the given id, or [`BridgeError::ViewNotFound`].
    pub fn view(&self, view_id: i64) -> Result<Arc<MapViewController>, BridgeError> {
        self.views.get(view_id).ok_or_else(|| {
            debug!("Call for unknown view {view_id}");
            BridgeError::ViewNotFound(view_id)
        })
    }

    /// Executes `call` on the view with the given id.
    pub fn handle(&self, view_id: i64, call: ViewCall) -> Result<ViewReply, BridgeError> {
        let view = self.view(view_id)?;
        apply(&view, call)
    }

    /// Calls `callback` once the view is ready.
    pub fn await_map_ready(
        &self,
        view_id: i64,
        callback: MapReadyCallback,
    ) -> Result<(), BridgeError> {
        self.view(view_id)?.await_map_ready(callback)
    }

    /// Animates the camera of the view.
    pub fn animate_camera(
        &self,
        view_id: i64,
        update: &CameraUpdate,
        duration_ms: Option<u64>,
        callback: AnimationCallback,
    ) -> Result<(), BridgeError> {
        self.view(view_id)?.animate_camera(update, duration_ms, callback)
    }
}
