//! Map and navigation views.
//!
//! A [`MapViewController`] owns one native [`MapSurface`] together with the overlays placed on
//! it. Views start in the [`ViewLifecycle::Created`] state and only accept calls that need the
//! native map after the platform reported [`MapViewController::on_map_ready`].

use std::sync::{Arc, Weak};

use log::{debug, warn};
use navbridge_types::{
    CameraEventType, CameraPerspective, CameraPosition, CameraUpdate, CircleDto, CircleOptions,
    ClusterDto, LatLng, LatLngBounds, MapPadding, MarkerDto, PolygonDto, PolygonOptions,
    PolylineDto, PolylineOptions,
};
use parking_lot::{Mutex, MutexGuard};

use crate::cluster::{recluster, ClusterManagerController, ClusterManagers};
use crate::error::BridgeError;
use crate::events::{MarkerEventType, ViewEvent, ViewEventEmitter, ViewEventSink};
use crate::frame_delay::FrameDelay;
use crate::image_registry::ImageRegistry;
use crate::native::{
    AnimationCallback, InfoWindowEventType, LifecycleEvent, MapEventListener, MapSurface, MapType,
    MarkerDragEventType, NativeMarkerOptions, NativeOverlay, Navigator, OverlayHandle, UiSetting,
};
use crate::overlay::{MarkerController, OverlayController, OverlayStore, ShapeController, ShapeDto};
use crate::session::SessionSlot;

mod options;
mod registry;

pub use options::{MapOptions, NavigationUiPreference, ViewKind};
pub use registry::ViewRegistry;

/// Lifecycle state of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewLifecycle {
    /// The native surface is being set up.
    Created,
    /// The native surface is usable.
    Ready,
    /// The view was disposed. Terminal.
    Disposed,
}

/// Repaint request issued after overlay mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Invalidation {
    /// Repaint once.
    Single,
    /// Repaint twice, one frame delay apart.
    Double,
}

/// Called once the view is ready, or with [`BridgeError::ViewDisposed`] if it is disposed
/// first.
pub type MapReadyCallback = Box<dyn FnOnce(Result<(), BridgeError>) + Send>;

struct ViewState {
    lifecycle: ViewLifecycle,
    ready_callback: Option<MapReadyCallback>,

    initial_camera: Option<CameraPosition>,
    padding: Option<MapPadding>,
    map_type: Option<MapType>,
    min_zoom_preference: Option<f64>,
    max_zoom_preference: Option<f64>,
    zoom_preferences_pending: bool,

    markers: OverlayStore<MarkerController>,
    polygons: OverlayStore<ShapeController<PolygonOptions>>,
    polylines: OverlayStore<ShapeController<PolylineOptions>>,
    circles: OverlayStore<ShapeController<CircleOptions>>,

    camera_events_enabled: bool,
    consume_my_location_button_click: bool,
    navigation_ui: NavigationUiPreference,
    session_attached: bool,

    map_loaded_pending: Option<Invalidation>,
    frame_delay: FrameDelay<Invalidation>,
}

impl ViewState {
    fn new(options: &MapOptions) -> Self {
        let zoom_preferences_pending =
            options.min_zoom_preference.is_some() || options.max_zoom_preference.is_some();
        Self {
            lifecycle: ViewLifecycle::Created,
            ready_callback: None,
            initial_camera: options.initial_camera,
            padding: options.padding,
            map_type: options.map_type,
            min_zoom_preference: options.min_zoom_preference,
            max_zoom_preference: options.max_zoom_preference,
            zoom_preferences_pending,
            markers: OverlayStore::new(),
            polygons: OverlayStore::new(),
            polylines: OverlayStore::new(),
            circles: OverlayStore::new(),
            camera_events_enabled: false,
            consume_my_location_button_click: false,
            navigation_ui: options.navigation_ui,
            session_attached: false,
            map_loaded_pending: None,
            frame_delay: FrameDelay::default(),
        }
    }
}

/// Settings collected while the surface was not ready.
struct DeferredSettings {
    camera: Option<CameraPosition>,
    padding: Option<MapPadding>,
    map_type: Option<MapType>,
    min_zoom: Option<f64>,
    max_zoom: Option<f64>,
}

/// Controller of one map or navigation view.
pub struct MapViewController {
    view_id: Option<i64>,
    kind: ViewKind,
    surface: Arc<dyn MapSurface>,
    image_registry: Arc<ImageRegistry>,
    session: Weak<SessionSlot>,
    events: Arc<ViewEventEmitter>,
    clusters: ClusterManagers,
    state: Mutex<ViewState>,
}

impl std::fmt::Debug for MapViewController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapViewController")
            .field("view_id", &self.view_id)
            .field("kind", &self.kind)
            .field("lifecycle", &self.state.try_lock().map(|state| state.lifecycle))
            .finish_non_exhaustive()
    }
}

impl MapViewController {
    /// Creates a view around a native surface.
    ///
    /// `view_id` is `None` for the auxiliary display view, whose events are not delivered to
    /// the host.
    pub fn new(
        view_id: Option<i64>,
        options: &MapOptions,
        surface: Arc<dyn MapSurface>,
        image_registry: Arc<ImageRegistry>,
        session: Weak<SessionSlot>,
        event_sink: Option<Arc<dyn ViewEventSink>>,
    ) -> Arc<Self> {
        let events = Arc::new(ViewEventEmitter::new(view_id, event_sink));
        Arc::new(Self {
            view_id,
            kind: options.kind,
            surface,
            clusters: ClusterManagers::new(events.clone(), image_registry.clone()),
            image_registry,
            session,
            events,
            state: Mutex::new(ViewState::new(options)),
        })
    }

    /// Host assigned id. `None` for the auxiliary view.
    pub fn view_id(&self) -> Option<i64> {
        self.view_id
    }

    /// Kind of the view.
    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> ViewLifecycle {
        self.state.lock().lifecycle
    }

    /// Returns true once the native surface is usable.
    pub fn is_ready(&self) -> bool {
        self.lifecycle() == ViewLifecycle::Ready
    }

    /// Returns true if the navigation session is attached to this view.
    pub fn is_session_attached(&self) -> bool {
        self.state.lock().session_attached
    }

    fn ready_state(&self) -> Result<MutexGuard<'_, ViewState>, BridgeError> {
        let state = self.state.lock();
        match state.lifecycle {
            ViewLifecycle::Created => Err(BridgeError::MapNotReady),
            ViewLifecycle::Ready => Ok(state),
            ViewLifecycle::Disposed => Err(BridgeError::ViewDisposed),
        }
    }

    fn check_ready(&self) -> Result<(), BridgeError> {
        self.ready_state().map(drop)
    }

    fn check_navigation(&self) -> Result<(), BridgeError> {
        match self.kind {
            ViewKind::Navigation => self.check_ready(),
            ViewKind::Map => Err(BridgeError::NotNavigationView),
        }
    }

    /// Registers the callback to invoke when the view becomes ready.
    ///
    /// A ready view invokes the callback immediately. Only one callback may wait at a time.
    pub fn await_map_ready(&self, callback: MapReadyCallback) -> Result<(), BridgeError> {
        let mut state = self.state.lock();
        match state.lifecycle {
            ViewLifecycle::Created => {
                if state.ready_callback.is_some() {
                    return Err(BridgeError::ReadyCallbackPending);
                }

                state.ready_callback = Some(callback);
            }
            ViewLifecycle::Ready => {
                drop(state);
                callback(Ok(()));
            }
            ViewLifecycle::Disposed => {
                drop(state);
                callback(Err(BridgeError::ViewDisposed));
            }
        }

        Ok(())
    }

    /// Reported by the platform when the native surface is usable.
    ///
    /// Applies the settings collected before readiness, attaches the navigation session to
    /// navigation views, releases the waiting ready callback and starts listening to native
    /// events.
    pub fn on_map_ready(self: &Arc<Self>) {
        let (callback, deferred) = {
            let mut state = self.state.lock();
            if state.lifecycle != ViewLifecycle::Created {
                warn!(
                    "Ignoring map ready notification for view {:?} in state {:?}",
                    self.view_id, state.lifecycle
                );
                return;
            }

            state.lifecycle = ViewLifecycle::Ready;
            let zoom_pending = std::mem::take(&mut state.zoom_preferences_pending);
            let deferred = DeferredSettings {
                camera: state.initial_camera.take(),
                padding: state.padding,
                map_type: state.map_type,
                min_zoom: state.min_zoom_preference.filter(|_| zoom_pending),
                max_zoom: state.max_zoom_preference.filter(|_| zoom_pending),
            };
            (state.ready_callback.take(), deferred)
        };

        debug!("View {:?} is ready", self.view_id);

        self.apply_deferred(deferred);
        self.image_registry.map_view_initialization_complete(self.surface.icon_factory());

        if self.kind == ViewKind::Navigation {
            self.attach_session_on_ready();
        }

        if let Some(callback) = callback {
            callback(Ok(()));
        }

        let listener: Weak<Self> = Arc::downgrade(self);
        let listener: Weak<dyn MapEventListener> = listener;
        self.surface.set_event_listener(Some(listener));

        self.invalidate_after_map_load(Invalidation::Single);
    }

    fn apply_deferred(&self, deferred: DeferredSettings) {
        if let Some(min) = deferred.min_zoom {
            self.surface.set_min_zoom_preference(min);
        }
        if let Some(max) = deferred.max_zoom {
            self.surface.set_max_zoom_preference(max);
        }
        if let Some(map_type) = deferred.map_type {
            self.surface.set_map_type(map_type);
        }
        if let Some(padding) = deferred.padding {
            self.surface.set_padding(padding);
        }
        if let Some(camera) = deferred.camera {
            self.surface.move_camera(&CameraUpdate::NewCameraPosition(camera));
        }
    }

    fn attach_session_on_ready(&self) {
        let navigator = self
            .session
            .upgrade()
            .and_then(|slot| slot.get())
            .and_then(|session| session.navigator().ok());

        match navigator {
            Some(navigator) => {
                self.attach_navigator(&navigator);
            }
            None => self.apply_navigation_ui(false),
        }
    }

    /// Disposes the view. Native listeners are cleared before the surface is destroyed, so no
    /// callback reaches a disposed view. A waiting ready callback fails with
    /// [`BridgeError::ViewDisposed`].
    pub fn dispose(&self) {
        let callback = {
            let mut state = self.state.lock();
            if state.lifecycle == ViewLifecycle::Disposed {
                return;
            }

            state.lifecycle = ViewLifecycle::Disposed;
            state.map_loaded_pending = None;
            state.frame_delay.clear();
            state.session_attached = false;
            state.markers.take_all();
            state.polygons.take_all();
            state.polylines.take_all();
            state.circles.take_all();
            state.ready_callback.take()
        };

        debug!("Disposing view {:?}", self.view_id);

        self.surface.set_event_listener(None);
        self.clusters.forget_all();
        self.surface.destroy();

        if let Some(callback) = callback {
            callback(Err(BridgeError::ViewDisposed));
        }
    }

    /// Forwards a host lifecycle transition to the native surface.
    pub fn on_lifecycle(&self, event: LifecycleEvent) {
        if self.lifecycle() == ViewLifecycle::Disposed {
            return;
        }

        self.surface.on_lifecycle(event);
    }

    /// Requests a repaint once the engine reports the map as loaded. A pending single request
    /// is upgraded to a double one.
    pub fn invalidate_after_map_load(&self, invalidation: Invalidation) {
        let request = {
            let mut state = self.state.lock();
            if state.lifecycle != ViewLifecycle::Ready {
                return;
            }

            match state.map_loaded_pending {
                None => {
                    state.map_loaded_pending = Some(invalidation);
                    true
                }
                Some(Invalidation::Single) if invalidation == Invalidation::Double => {
                    state.map_loaded_pending = Some(Invalidation::Double);
                    false
                }
                Some(_) => false,
            }
        };

        if request {
            self.surface.request_map_loaded_callback();
        }
    }

    /// Reported by the platform when the engine considers the map loaded.
    pub fn on_map_loaded(&self) {
        let mut state = self.state.lock();
        if let Some(invalidation) = state.map_loaded_pending.take() {
            state.frame_delay.schedule(invalidation);
        }
    }

    /// Reported by the platform for every rendered frame.
    pub fn on_frame_rendered(&self) {
        let due = {
            let mut state = self.state.lock();
            if state.lifecycle != ViewLifecycle::Ready {
                return;
            }

            state.frame_delay.on_frame_rendered()
        };

        for invalidation in due {
            self.surface.invalidate();
            if invalidation == Invalidation::Double {
                self.state.lock().frame_delay.schedule(Invalidation::Single);
            }
        }
    }

    /// Adds markers. Markers referencing an existing cluster manager are handed to it, other
    /// markers are placed on the map directly. Returns the markers that were added.
    pub fn add_markers(&self, markers: Vec<MarkerDto>) -> Result<Vec<MarkerDto>, BridgeError> {
        let mut touched = Vec::new();
        let mut removed = Vec::new();
        let mut added = Vec::with_capacity(markers.len());
        {
            let mut state = self.ready_state()?;
            for marker in markers {
                self.detach_marker(&mut state, &marker.marker_id, &mut touched, &mut removed);
                if let Some(marker) = self.insert_marker(&mut state, marker, &mut touched) {
                    added.push(marker);
                }
            }
        }

        remove_native(&removed);
        recluster(&touched);
        self.invalidate_after_map_load(Invalidation::Double);
        Ok(added)
    }

    /// Updates markers in place, moving them between the plain list and cluster managers when
    /// their cluster manager changed.
    ///
    /// Markers that exist are updated even if some ids of the batch are unknown. The unknown
    /// ids are reported with [`BridgeError::MarkersNotFound`].
    pub fn update_markers(&self, markers: Vec<MarkerDto>) -> Result<Vec<MarkerDto>, BridgeError> {
        let mut touched = Vec::new();
        let mut removed = Vec::new();
        let mut updated = Vec::with_capacity(markers.len());
        let mut missing = Vec::new();
        {
            let mut state = self.ready_state()?;
            for mut marker in markers {
                let target = marker
                    .options
                    .cluster_manager_id
                    .as_deref()
                    .and_then(|id| self.clusters.get(id));

                if let Some(controller) = state.markers.get_mut(&marker.marker_id) {
                    if target.is_none() {
                        let icon = self.image_registry.icon_for(&marker.options.icon);
                        controller.update(&marker.options, icon);
                        marker.options.cluster_manager_id = None;
                        updated.push(marker);
                        continue;
                    }
                } else if self.clusters.owner_of(&marker.marker_id).is_none() {
                    missing.push(marker.marker_id);
                    continue;
                }

                self.detach_marker(&mut state, &marker.marker_id, &mut touched, &mut removed);
                if let Some(marker) = self.insert_marker(&mut state, marker, &mut touched) {
                    updated.push(marker);
                }
            }
        }

        remove_native(&removed);
        recluster(&touched);
        self.invalidate_after_map_load(Invalidation::Double);

        if !missing.is_empty() {
            return Err(BridgeError::MarkersNotFound(missing));
        }

        Ok(updated)
    }

    /// Removes markers from the map or from their cluster manager.
    pub fn remove_markers(&self, markers: &[MarkerDto]) -> Result<(), BridgeError> {
        let mut touched = Vec::new();
        let mut removed = Vec::new();
        let mut missing = Vec::new();
        {
            let mut state = self.ready_state()?;
            for marker in markers {
                if !self.detach_marker(&mut state, &marker.marker_id, &mut touched, &mut removed) {
                    missing.push(marker.marker_id.clone());
                }
            }
        }

        remove_native(&removed);
        recluster(&touched);
        self.invalidate_after_map_load(Invalidation::Single);

        if !missing.is_empty() {
            return Err(BridgeError::MarkersNotFound(missing));
        }

        Ok(())
    }

    /// Removes every plain marker and every clustered item. Cluster managers are kept.
    pub fn clear_markers(&self) -> Result<(), BridgeError> {
        let removed = self.ready_state()?.markers.take_all();
        remove_native(&removed);

        self.clusters.clear_items();
        self.invalidate_after_map_load(Invalidation::Single);
        Ok(())
    }

    /// Markers placed on the map directly. Clustered markers are reported by
    /// [`MapViewController::get_clusters`].
    pub fn get_markers(&self) -> Result<Vec<MarkerDto>, BridgeError> {
        Ok(self
            .ready_state()?
            .markers
            .iter()
            .map(MarkerController::to_dto)
            .collect())
    }

    fn insert_marker(
        &self,
        state: &mut ViewState,
        mut marker: MarkerDto,
        touched: &mut Vec<Arc<ClusterManagerController>>,
    ) -> Option<MarkerDto> {
        if let Some(cluster_manager_id) = marker.options.cluster_manager_id.as_deref() {
            match self.clusters.get(cluster_manager_id) {
                Some(manager) => {
                    manager.add_item(marker.clone());
                    touched.push(manager);
                    return Some(marker);
                }
                None => warn!(
                    "Cluster manager {cluster_manager_id} for marker {} not found, adding a plain marker",
                    marker.marker_id
                ),
            }
        }

        marker.options.cluster_manager_id = None;
        let icon = self.image_registry.icon_for(&marker.options.icon);
        let Some(native) = self
            .surface
            .add_marker(&NativeMarkerOptions::from_options(&marker.options, icon))
        else {
            warn!("Native surface refused marker {}", marker.marker_id);
            return None;
        };

        state.markers.push(MarkerController::new(
            marker.marker_id.clone(),
            native,
            &marker.options,
        ));
        Some(marker)
    }

    /// Removes the marker from wherever it lives. Returns false if it was not found.
    ///
    /// A plain marker is moved to `removed`; its native removal must run once the state lock
    /// is released, since the engine reports info window closes from inside it.
    fn detach_marker(
        &self,
        state: &mut ViewState,
        marker_id: &str,
        touched: &mut Vec<Arc<ClusterManagerController>>,
        removed: &mut Vec<MarkerController>,
    ) -> bool {
        if let Some(marker) = state.markers.remove(marker_id) {
            removed.push(marker);
            return true;
        }

        match self.clusters.owner_of(marker_id) {
            Some(manager) => {
                manager.remove_item(marker_id);
                touched.push(manager);
                true
            }
            None => false,
        }
    }

    /// Adds polygons. Returns the polygons that were added.
    pub fn add_polygons(&self, polygons: Vec<PolygonDto>) -> Result<Vec<PolygonDto>, BridgeError> {
        self.add_shapes(polygons)
    }

    /// Updates polygons in place. Unknown ids are reported with
    /// [`BridgeError::PolygonsNotFound`] after the known ones were applied.
    pub fn update_polygons(
        &self,
        polygons: Vec<PolygonDto>,
    ) -> Result<Vec<PolygonDto>, BridgeError> {
        self.update_shapes(polygons)
    }

    /// Removes polygons.
    pub fn remove_polygons(&self, polygons: &[PolygonDto]) -> Result<(), BridgeError> {
        self.remove_shapes(polygons)
    }

    /// Removes every polygon.
    pub fn clear_polygons(&self) -> Result<(), BridgeError> {
        self.clear_shapes::<PolygonDto>()
    }

    /// Current polygons.
    pub fn get_polygons(&self) -> Result<Vec<PolygonDto>, BridgeError> {
        self.get_shapes()
    }

    /// Adds polylines. Returns the polylines that were added.
    pub fn add_polylines(
        &self,
        polylines: Vec<PolylineDto>,
    ) -> Result<Vec<PolylineDto>, BridgeError> {
        self.add_shapes(polylines)
    }

    /// Updates polylines in place. Unknown ids are reported with
    /// [`BridgeError::PolylinesNotFound`] after the known ones were applied.
    pub fn update_polylines(
        &self,
        polylines: Vec<PolylineDto>,
    ) -> Result<Vec<PolylineDto>, BridgeError> {
        self.update_shapes(polylines)
    }

    /// Removes polylines.
    pub fn remove_polylines(&self, polylines: &[PolylineDto]) -> Result<(), BridgeError> {
        self.remove_shapes(polylines)
    }

    /// Removes every polyline.
    pub fn clear_polylines(&self) -> Result<(), BridgeError> {
        self.clear_shapes::<PolylineDto>()
    }

    /// Current polylines.
    pub fn get_polylines(&self) -> Result<Vec<PolylineDto>, BridgeError> {
        self.get_shapes()
    }

    /// Adds circles. Returns the circles that were added.
    pub fn add_circles(&self, circles: Vec<CircleDto>) -> Result<Vec<CircleDto>, BridgeError> {
        self.add_shapes(circles)
    }

    /// Updates circles in place. Unknown ids are reported with
    /// [`BridgeError::CirclesNotFound`] after the known ones were applied.
    pub fn update_circles(&self, circles: Vec<CircleDto>) -> Result<Vec<CircleDto>, BridgeError> {
        self.update_shapes(circles)
    }

    /// Removes circles.
    pub fn remove_circles(&self, circles: &[CircleDto]) -> Result<(), BridgeError> {
        self.remove_shapes(circles)
    }

    /// Removes every circle.
    pub fn clear_circles(&self) -> Result<(), BridgeError> {
        self.clear_shapes::<CircleDto>()
    }

    /// Current circles.
    pub fn get_circles(&self) -> Result<Vec<CircleDto>, BridgeError> {
        self.get_shapes()
    }

    /// Removes every overlay from the map. Cluster managers are kept, their items are dropped.
    pub fn clear(&self) -> Result<(), BridgeError> {
        {
            let mut state = self.ready_state()?;
            state.markers.take_all();
            state.polygons.take_all();
            state.polylines.take_all();
            state.circles.take_all();
        }

        self.surface.clear();
        self.clusters.clear_items();
        self.invalidate_after_map_load(Invalidation::Single);
        Ok(())
    }

    fn add_shapes<D: ViewShape>(&self, shapes: Vec<D>) -> Result<Vec<D>, BridgeError> {
        let mut added = Vec::with_capacity(shapes.len());
        {
            let mut state = self.ready_state()?;
            for shape in shapes {
                let Some(native) = D::add_native(self.surface.as_ref(), shape.options()) else {
                    warn!("Native surface refused overlay {}", shape.id());
                    continue;
                };

                D::store(&mut state).push(ShapeController::new(shape.id().to_string(), native));
                added.push(shape);
            }
        }

        self.invalidate_after_map_load(Invalidation::Single);
        Ok(added)
    }

    fn update_shapes<D: ViewShape>(&self, shapes: Vec<D>) -> Result<Vec<D>, BridgeError> {
        let mut updated = Vec::with_capacity(shapes.len());
        let mut missing = Vec::new();
        {
            let mut state = self.ready_state()?;
            let store = D::store(&mut state);
            for shape in shapes {
                match store.get(shape.id()) {
                    Some(controller) => {
                        controller.update(shape.options());
                        updated.push(shape);
                    }
                    None => missing.push(shape.id().to_string()),
                }
            }
        }

        self.invalidate_after_map_load(Invalidation::Single);

        if !missing.is_empty() {
            return Err(D::not_found(missing));
        }

        Ok(updated)
    }

    fn remove_shapes<D: ViewShape>(&self, shapes: &[D]) -> Result<(), BridgeError> {
        let mut missing = Vec::new();
        let mut removed = Vec::new();
        {
            let mut state = self.ready_state()?;
            let store = D::store(&mut state);
            for shape in shapes {
                match store.remove(shape.id()) {
                    Some(controller) => removed.push(controller),
                    None => missing.push(shape.id().to_string()),
                }
            }
        }

        remove_native(&removed);
        self.invalidate_after_map_load(Invalidation::Single);

        if !missing.is_empty() {
            return Err(D::not_found(missing));
        }

        Ok(())
    }

    fn clear_shapes<D: ViewShape>(&self) -> Result<(), BridgeError> {
        let removed = D::store(&mut *self.ready_state()?).take_all();
        remove_native(&removed);

        self.invalidate_after_map_load(Invalidation::Single);
        Ok(())
    }

    fn get_shapes<D: ViewShape>(&self) -> Result<Vec<D>, BridgeError> {
        let mut state = self.ready_state()?;
        Ok(D::store(&mut state)
            .iter()
            .map(|controller| D::new(controller.id().to_string(), controller.options()))
            .collect())
    }

    /// Creates a cluster manager. Adding an existing id is a no-op.
    pub fn add_cluster_manager(&self, cluster_manager_id: &str) -> Result<(), BridgeError> {
        self.check_ready()?;
        self.clusters.add(cluster_manager_id, self.surface.as_ref());
        Ok(())
    }

    /// Removes a cluster manager together with its items.
    pub fn remove_cluster_manager(&self, cluster_manager_id: &str) -> Result<(), BridgeError> {
        self.check_ready()?;
        self.clusters
            .remove(cluster_manager_id)
            .ok_or_else(|| BridgeError::ClusterManagerNotFound(cluster_manager_id.to_string()))?;
        self.invalidate_after_map_load(Invalidation::Single);
        Ok(())
    }

    /// Ids of the cluster managers of this view.
    pub fn cluster_manager_ids(&self) -> Result<Vec<String>, BridgeError> {
        self.check_ready()?;
        Ok(self.clusters.ids())
    }

    /// Moves a marker into a cluster manager.
    pub fn add_marker_to_cluster(
        &self,
        marker_id: &str,
        cluster_manager_id: &str,
    ) -> Result<MarkerDto, BridgeError> {
        let mut touched = Vec::new();
        let mut removed = Vec::new();
        let marker = {
            let mut state = self.ready_state()?;
            let manager = self.clusters.get(cluster_manager_id).ok_or_else(|| {
                BridgeError::ClusterManagerNotFound(cluster_manager_id.to_string())
            })?;

            let mut marker = match state.markers.get(marker_id) {
                Some(controller) => controller.to_dto(),
                None => self
                    .clusters
                    .owner_of(marker_id)
                    .and_then(|owner| owner.item(marker_id))
                    .ok_or_else(|| BridgeError::MarkerNotFound(marker_id.to_string()))?,
            };

            self.detach_marker(&mut state, marker_id, &mut touched, &mut removed);
            marker.options.cluster_manager_id = Some(cluster_manager_id.to_string());
            manager.add_item(marker.clone());
            touched.push(manager);
            marker
        };

        remove_native(&removed);
        recluster(&touched);
        self.invalidate_after_map_load(Invalidation::Double);
        Ok(marker)
    }

    /// Clusters of one manager at the current camera zoom.
    pub fn get_clusters(&self, cluster_manager_id: &str) -> Result<Vec<ClusterDto>, BridgeError> {
        self.check_ready()?;
        let zoom = self.surface.camera_position().zoom;
        self.clusters
            .clusters(cluster_manager_id, zoom)
            .ok_or_else(|| BridgeError::ClusterManagerNotFound(cluster_manager_id.to_string()))
    }

    /// Clusters of every manager at the current camera zoom.
    pub fn get_all_clusters(&self) -> Result<Vec<ClusterDto>, BridgeError> {
        self.check_ready()?;
        let zoom = self.surface.camera_position().zoom;
        Ok(self.clusters.all_clusters(zoom))
    }

    /// Moves the camera without animation.
    pub fn move_camera(&self, update: &CameraUpdate) -> Result<(), BridgeError> {
        self.check_ready()?;
        self.surface.move_camera(update);
        Ok(())
    }

    /// Animates the camera. `callback` reports whether the animation finished.
    pub fn animate_camera(
        &self,
        update: &CameraUpdate,
        duration_ms: Option<u64>,
        callback: AnimationCallback,
    ) -> Result<(), BridgeError> {
        self.check_ready()?;
        self.surface.animate_camera(update, duration_ms, callback);
        Ok(())
    }

    /// Current camera position.
    pub fn camera_position(&self) -> Result<CameraPosition, BridgeError> {
        self.check_ready()?;
        Ok(self.surface.camera_position())
    }

    /// Currently visible area.
    pub fn visible_region(&self) -> Result<LatLngBounds, BridgeError> {
        self.check_ready()?;
        Ok(self.surface.visible_region())
    }

    /// Makes the camera follow the device location.
    pub fn follow_my_location(
        &self,
        perspective: CameraPerspective,
        zoom: Option<f64>,
    ) -> Result<(), BridgeError> {
        self.check_ready()?;
        self.surface.follow_my_location(perspective);
        if let Some(zoom) = zoom {
            self.surface.set_following_zoom_level(zoom);
        }
        Ok(())
    }

    /// Last known device location.
    pub fn my_location(&self) -> Result<Option<LatLng>, BridgeError> {
        self.check_ready()?;
        Ok(self.surface.my_location())
    }

    /// Starts delivering camera change events to the host. Following-location events are
    /// delivered regardless.
    pub fn register_on_camera_changed_listener(&self) -> Result<(), BridgeError> {
        self.ready_state()?.camera_events_enabled = true;
        Ok(())
    }

    /// Sets the minimum zoom preference.
    ///
    /// The value is checked against the maximum preference, or against the native maximum
    /// zoom level if no maximum preference is set. Before the view is ready the value is
    /// stored and applied once on readiness.
    pub fn set_min_zoom_preference(&self, zoom: f64) -> Result<(), BridgeError> {
        let mut state = self.state.lock();
        if state.lifecycle == ViewLifecycle::Disposed {
            return Err(BridgeError::ViewDisposed);
        }

        let max = state
            .max_zoom_preference
            .unwrap_or_else(|| self.surface.max_zoom_level());
        if zoom > max {
            return Err(BridgeError::MinZoomGreaterThanMaxZoom { min: zoom, max });
        }

        state.min_zoom_preference = Some(zoom);
        if state.lifecycle == ViewLifecycle::Created {
            state.zoom_preferences_pending = true;
            return Ok(());
        }

        drop(state);
        self.surface.set_min_zoom_preference(zoom);
        Ok(())
    }

    /// Sets the maximum zoom preference. See [`MapViewController::set_min_zoom_preference`].
    pub fn set_max_zoom_preference(&self, zoom: f64) -> Result<(), BridgeError> {
        let mut state = self.state.lock();
        if state.lifecycle == ViewLifecycle::Disposed {
            return Err(BridgeError::ViewDisposed);
        }

        let min = state
            .min_zoom_preference
            .unwrap_or_else(|| self.surface.min_zoom_level());
        if zoom < min {
            return Err(BridgeError::MaxZoomLessThanMinZoom { min, max: zoom });
        }

        state.max_zoom_preference = Some(zoom);
        if state.lifecycle == ViewLifecycle::Created {
            state.zoom_preferences_pending = true;
            return Ok(());
        }

        drop(state);
        self.surface.set_max_zoom_preference(zoom);
        Ok(())
    }

    /// Minimum zoom preference, or the native minimum zoom level if none is set.
    pub fn min_zoom_preference(&self) -> f64 {
        let preference = self.state.lock().min_zoom_preference;
        preference.unwrap_or_else(|| self.surface.min_zoom_level())
    }

    /// Maximum zoom preference, or the native maximum zoom level if none is set.
    pub fn max_zoom_preference(&self) -> f64 {
        let preference = self.state.lock().max_zoom_preference;
        preference.unwrap_or_else(|| self.surface.max_zoom_level())
    }

    /// Drops both zoom preferences.
    pub fn reset_min_max_zoom_preference(&self) -> Result<(), BridgeError> {
        let mut state = self.state.lock();
        state.min_zoom_preference = None;
        state.max_zoom_preference = None;
        state.zoom_preferences_pending = false;
        match state.lifecycle {
            ViewLifecycle::Created => Ok(()),
            ViewLifecycle::Ready => {
                drop(state);
                self.surface.reset_min_max_zoom_preference();
                Ok(())
            }
            ViewLifecycle::Disposed => Err(BridgeError::ViewDisposed),
        }
    }

    /// Applies a JSON map style.
    pub fn set_map_style(&self, style_json: &str) -> Result<(), BridgeError> {
        self.check_ready()?;
        self.surface
            .set_map_style(style_json)
            .map_err(BridgeError::MapStyle)
    }

    /// Current map type.
    pub fn map_type(&self) -> Result<MapType, BridgeError> {
        self.check_ready()?;
        Ok(self.surface.map_type())
    }

    /// Sets the map type.
    pub fn set_map_type(&self, map_type: MapType) -> Result<(), BridgeError> {
        self.check_ready()?;
        self.surface.set_map_type(map_type);
        Ok(())
    }

    /// Sets the map padding.
    pub fn set_padding(&self, padding: MapPadding) -> Result<(), BridgeError> {
        self.ready_state()?.padding = Some(padding);
        self.surface.set_padding(padding);
        Ok(())
    }

    /// Current map padding.
    pub fn padding(&self) -> Result<MapPadding, BridgeError> {
        Ok(self.ready_state()?.padding.unwrap_or_default())
    }

    /// Turns a UI feature on or off.
    pub fn set_ui_setting(&self, setting: UiSetting, enabled: bool) -> Result<(), BridgeError> {
        self.check_ready()?;
        self.surface.set_ui_setting(setting, enabled);
        Ok(())
    }

    /// Returns whether a UI feature is on.
    pub fn ui_setting(&self, setting: UiSetting) -> Result<bool, BridgeError> {
        self.check_ready()?;
        Ok(self.surface.ui_setting(setting))
    }

    /// Sets whether taps on the my-location button are consumed instead of centering the
    /// camera.
    pub fn set_consume_my_location_button_click_events(
        &self,
        consume: bool,
    ) -> Result<(), BridgeError> {
        self.ready_state()?.consume_my_location_button_click = consume;
        Ok(())
    }

    /// Returns whether taps on the my-location button are consumed.
    pub fn consumes_my_location_button_click_events(&self) -> Result<bool, BridgeError> {
        Ok(self.ready_state()?.consume_my_location_button_click)
    }

    /// Turns the navigation UI on or off.
    pub fn set_navigation_ui_enabled(&self, enabled: bool) -> Result<(), BridgeError> {
        self.check_navigation()?;
        self.state.lock().navigation_ui = if enabled {
            NavigationUiPreference::Automatic
        } else {
            NavigationUiPreference::Disabled
        };
        self.apply_navigation_ui(enabled);
        Ok(())
    }

    /// Returns whether the navigation UI is on.
    pub fn is_navigation_ui_enabled(&self) -> Result<bool, BridgeError> {
        self.check_navigation()?;
        Ok(self.surface.is_navigation_ui_enabled())
    }

    /// Shows the whole remaining route.
    pub fn show_route_overview(&self) -> Result<(), BridgeError> {
        self.check_navigation()?;
        self.surface.show_route_overview();
        Ok(())
    }

    /// Attaches the navigator to a ready navigation view. Returns false if the view cannot
    /// host it.
    pub(crate) fn attach_navigator(&self, navigator: &Arc<dyn Navigator>) -> bool {
        if self.kind != ViewKind::Navigation {
            return false;
        }

        let preference = {
            let state = self.state.lock();
            if state.lifecycle != ViewLifecycle::Ready {
                return false;
            }
            state.navigation_ui
        };

        if !self.surface.attach_navigator(navigator) {
            warn!("Surface of view {:?} refused the navigator", self.view_id);
            return false;
        }

        self.state.lock().session_attached = true;
        self.apply_navigation_ui(preference == NavigationUiPreference::Automatic);
        true
    }

    /// Reverts [`MapViewController::attach_navigator`] after the session was cleaned up.
    pub(crate) fn detach_navigator(&self) {
        {
            let mut state = self.state.lock();
            if !state.session_attached || state.lifecycle != ViewLifecycle::Ready {
                return;
            }
            state.session_attached = false;
        }

        self.apply_navigation_ui(false);
    }

    fn apply_navigation_ui(&self, enabled: bool) {
        let was_enabled = self.surface.is_navigation_ui_enabled();
        self.surface.set_navigation_ui_enabled(enabled);
        let is_enabled = self.surface.is_navigation_ui_enabled();
        if was_enabled != is_enabled {
            self.events.emit(ViewEvent::NavigationUiEnabledChanged(is_enabled));
        }
    }

    fn resolve_marker(&self, handle: OverlayHandle) -> Option<(String, bool)> {
        let plain = self
            .state
            .lock()
            .markers
            .get_by_handle(handle)
            .map(|marker| (marker.id().to_string(), marker.consume_tap_events()));

        plain.or_else(|| {
            self.clusters
                .item_by_handle(handle)
                .map(|item| (item.marker_id, item.options.consume_tap_events))
        })
    }
}

impl MapEventListener for MapViewController {
    fn on_map_click(&self, position: LatLng) {
        self.events.emit(ViewEvent::MapClick(position));
    }

    fn on_map_long_click(&self, position: LatLng) {
        self.events.emit(ViewEvent::MapLongClick(position));
    }

    fn on_marker_click(&self, marker: OverlayHandle) -> bool {
        let Some((marker_id, consume)) = self.resolve_marker(marker) else {
            debug!("Click on unknown marker {marker:?}");
            return false;
        };

        self.events.emit(ViewEvent::Marker {
            marker_id,
            event: MarkerEventType::Clicked,
        });
        consume
    }

    fn on_marker_drag(&self, marker: OverlayHandle, event: MarkerDragEventType, position: LatLng) {
        if let Some((marker_id, _)) = self.resolve_marker(marker) {
            self.events.emit(ViewEvent::MarkerDrag {
                marker_id,
                event,
                position,
            });
        }
    }

    fn on_info_window(&self, marker: OverlayHandle, event: InfoWindowEventType) {
        let Some((marker_id, _)) = self.resolve_marker(marker) else {
            warn!("Info window event {event:?} on unknown marker {marker:?}");
            return;
        };

        self.events.emit(ViewEvent::Marker {
            marker_id,
            event: event.into(),
        });
    }

    fn on_polygon_click(&self, polygon: OverlayHandle) {
        let id = self.state.lock().polygons.id_for(polygon).map(String::from);
        if let Some(id) = id {
            self.events.emit(ViewEvent::PolygonClicked(id));
        }
    }

    fn on_polyline_click(&self, polyline: OverlayHandle) {
        let id = self.state.lock().polylines.id_for(polyline).map(String::from);
        if let Some(id) = id {
            self.events.emit(ViewEvent::PolylineClicked(id));
        }
    }

    fn on_circle_click(&self, circle: OverlayHandle) {
        let id = self.state.lock().circles.id_for(circle).map(String::from);
        if let Some(id) = id {
            self.events.emit(ViewEvent::CircleClicked(id));
        }
    }

    fn on_my_location_click(&self) {
        self.events.emit(ViewEvent::MyLocationClicked);
    }

    fn on_my_location_button_click(&self) -> bool {
        let consume = self.state.lock().consume_my_location_button_click;
        self.events.emit(ViewEvent::MyLocationButtonClicked);
        consume
    }

    fn on_camera_event(&self, event: CameraEventType, position: CameraPosition) {
        if event == CameraEventType::OnCameraIdle {
            self.clusters.cluster_all();
        }

        let forward = match event {
            CameraEventType::OnCameraStartedFollowingLocation
            | CameraEventType::OnCameraStoppedFollowingLocation => true,
            _ => self.state.lock().camera_events_enabled,
        };

        if forward {
            self.events.emit(ViewEvent::CameraChanged { event, position });
        }
    }

    fn on_recenter_button_click(&self) {
        self.events.emit(ViewEvent::RecenterButtonClicked);
    }
}

/// Detaches overlays already taken out of their store. Must not run under the state lock.
fn remove_native<C: OverlayController>(controllers: &[C]) {
    for controller in controllers {
        controller.remove();
    }
}

/// Shape overlay kinds and where a view keeps them.
trait ViewShape: ShapeDto {
    fn store(state: &mut ViewState) -> &mut OverlayStore<ShapeController<Self::Options>>;
    fn add_native(
        surface: &dyn MapSurface,
        options: &Self::Options,
    ) -> Option<Box<dyn NativeOverlay<Self::Options>>>;
}

impl ViewShape for PolygonDto {
    fn store(state: &mut ViewState) -> &mut OverlayStore<ShapeController<PolygonOptions>> {
        &mut state.polygons
    }

    fn add_native(
        surface: &dyn MapSurface,
        options: &PolygonOptions,
    ) -> Option<Box<dyn NativeOverlay<PolygonOptions>>> {
        surface.add_polygon(options)
    }
}

impl ViewShape for PolylineDto {
    fn store(state: &mut ViewState) -> &mut OverlayStore<ShapeController<PolylineOptions>> {
        &mut state.polylines
    }

    fn add_native(
        surface: &dyn MapSurface,
        options: &PolylineOptions,
    ) -> Option<Box<dyn NativeOverlay<PolylineOptions>>> {
        surface.add_polyline(options)
    }
}

impl ViewShape for CircleDto {
    fn store(state: &mut ViewState) -> &mut OverlayStore<ShapeController<CircleOptions>> {
        &mut state.circles
    }

    fn add_native(
        surface: &dyn MapSurface,
        options: &CircleOptions,
    ) -> Option<Box<dyn NativeOverlay<CircleOptions>>> {
        surface.add_circle(options)
    }
}
