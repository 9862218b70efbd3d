//! In-memory native engine used by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use ahash::AHashMap;
use navbridge_types::{
    AudioGuidanceSettings, CameraPerspective, CameraPosition, CameraUpdate, CircleOptions,
    DisplayOptions, LatLng, LatLngBounds, MapPadding, PolygonOptions, PolylineOptions, RouteSegment,
    RouteStatus, RouteTokenOptions, RoutingOptions, SimulationOptions, SpeedAlertOptions,
    TaskRemovedBehavior, TimeAndDistance, Waypoint,
};
use parking_lot::Mutex;

use crate::decoded_image::DecodedImage;
use crate::events::{SessionEvent, SessionEventSink, ViewEvent, ViewEventSink};
use crate::image_registry::ImageRegistry;
use crate::native::{
    AnimationCallback, ClusterEngine, ClusterRenderHooks, HostActivity, IconFactory, IconHandle,
    InfoWindowEventType, LifecycleEvent, MapEventListener, MapSurface, MapType, NativeCircle,
    NativeCluster, NativeMarker, NativeMarkerOptions, NativeMarkerState, NativeOverlay,
    NativePolygon, NativePolyline, NavInfoSink, NavigationServices, Navigator, NavigatorError,
    NavigatorEvent, NavigatorEventSink, NavigatorSubscription, OverlayHandle,
    RoadSnappedLocationProvider, RoadSnappedLocationSink, RouteStatusCallback, Simulator,
    SubscriptionId, TermsDialogParams, UiSetting,
};
use crate::session::SessionSlot;
use crate::view::{MapOptions, MapViewController, ViewKind};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
pub(crate) struct MockIconFactory {
    created: AtomicUsize,
    failing: bool,
}

impl MockIconFactory {
    pub(crate) fn failing() -> Self {
        Self {
            created: AtomicUsize::new(0),
            failing: true,
        }
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl IconFactory for MockIconFactory {
    fn create_icon(&self, _image: &DecodedImage) -> Result<IconHandle, String> {
        if self.failing {
            return Err("no rendering context".into());
        }

        let id = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(IconHandle(id as u64))
    }
}

type OverlayMap<O> = Arc<Mutex<AHashMap<OverlayHandle, O>>>;

struct MockOverlay<O> {
    handle: OverlayHandle,
    overlays: OverlayMap<O>,
}

impl<O: Clone + Send + Sync + 'static> NativeOverlay<O> for MockOverlay<O> {
    fn handle(&self) -> OverlayHandle {
        self.handle
    }

    fn state(&self) -> O {
        self.overlays
            .lock()
            .get(&self.handle)
            .cloned()
            .expect("overlay was removed")
    }

    fn set_options(&self, options: &O) {
        self.overlays.lock().insert(self.handle, options.clone());
    }

    fn remove(&self) {
        self.overlays.lock().remove(&self.handle);
    }
}

/// Reports info window closes for removed markers from inside the removal call, as the
/// native engines do when a marker with an open info window goes away.
#[derive(Clone, Default)]
struct InfoWindowCloser {
    enabled: Arc<AtomicBool>,
    listener: Arc<Mutex<Option<Weak<dyn MapEventListener>>>>,
}

impl InfoWindowCloser {
    fn listener(&self) -> Option<Arc<dyn MapEventListener>> {
        self.listener.lock().as_ref().and_then(Weak::upgrade)
    }

    fn close(&self, handle: OverlayHandle) {
        if !self.enabled.load(Ordering::SeqCst) {
            return;
        }

        if let Some(listener) = self.listener() {
            listener.on_info_window(handle, InfoWindowEventType::Closed);
        }
    }
}

struct MockMarker {
    overlay: MockOverlay<NativeMarkerOptions>,
    info_window: InfoWindowCloser,
}

impl NativeOverlay<NativeMarkerOptions, NativeMarkerState> for MockMarker {
    fn handle(&self) -> OverlayHandle {
        self.overlay.handle
    }

    fn state(&self) -> NativeMarkerState {
        let options = NativeOverlay::<NativeMarkerOptions>::state(&self.overlay);
        NativeMarkerState {
            position: options.position,
            alpha: options.alpha,
            draggable: options.draggable,
            flat: options.flat,
            rotation: options.rotation,
            title: options.title,
            snippet: options.snippet,
            visible: options.visible,
            z_index: options.z_index,
        }
    }

    fn set_options(&self, options: &NativeMarkerOptions) {
        self.overlay.set_options(options);
    }

    fn remove(&self) {
        NativeOverlay::<NativeMarkerOptions>::remove(&self.overlay);
        self.info_window.close(self.overlay.handle);
    }
}

/// Clustering engine that renders every item as a singleton and groups all items into one
/// cluster below zoom 10.
pub(crate) struct MockClusterEngine {
    hooks: Weak<dyn ClusterRenderHooks>,
    items: Mutex<Vec<(String, LatLng)>>,
    rendered: Mutex<Vec<(String, OverlayHandle, NativeMarkerOptions)>>,
    next_handle: AtomicU64,
    cluster_calls: AtomicUsize,
}

impl MockClusterEngine {
    fn new(hooks: Weak<dyn ClusterRenderHooks>, first_handle: u64) -> Self {
        Self {
            hooks,
            items: Mutex::new(Vec::new()),
            rendered: Mutex::new(Vec::new()),
            next_handle: AtomicU64::new(first_handle),
            cluster_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn cluster_calls(&self) -> usize {
        self.cluster_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn item_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.items.lock().iter().map(|(id, _)| id.clone()).collect();
        ids.sort();
        ids
    }

    /// Native handle of the rendered singleton marker of an item.
    pub(crate) fn rendered_handle(&self, item_id: &str) -> Option<OverlayHandle> {
        self.rendered
            .lock()
            .iter()
            .find(|(id, _, _)| id == item_id)
            .map(|(_, handle, _)| *handle)
    }

    pub(crate) fn rendered_options(&self, item_id: &str) -> Option<NativeMarkerOptions> {
        self.rendered
            .lock()
            .iter()
            .find(|(id, _, _)| id == item_id)
            .map(|(_, _, options)| options.clone())
    }

    /// Simulates a tap on the cluster glyph containing every item.
    pub(crate) fn click_cluster(&self) -> bool {
        let items = self.items.lock().clone();
        let cluster = NativeCluster {
            position: centroid(&items),
            item_ids: items.into_iter().map(|(id, _)| id).collect(),
        };

        match self.hooks.upgrade() {
            Some(hooks) => hooks.on_cluster_click(&cluster),
            None => false,
        }
    }
}

fn centroid(items: &[(String, LatLng)]) -> LatLng {
    if items.is_empty() {
        return LatLng::default();
    }

    let count = items.len() as f64;
    let (lat, lng) = items.iter().fold((0.0, 0.0), |(lat, lng), (_, position)| {
        (lat + position.latitude, lng + position.longitude)
    });
    LatLng::new(lat / count, lng / count)
}

impl ClusterEngine for MockClusterEngine {
    fn add_item(&self, item_id: &str, position: LatLng) {
        self.items.lock().push((item_id.to_string(), position));
    }

    fn remove_item(&self, item_id: &str) {
        self.items.lock().retain(|(id, _)| id != item_id);
    }

    fn clear_items(&self) {
        self.items.lock().clear();
    }

    fn cluster(&self) {
        self.cluster_calls.fetch_add(1, Ordering::SeqCst);
        let Some(hooks) = self.hooks.upgrade() else {
            return;
        };

        let items = self.items.lock().clone();
        let mut rendered = Vec::with_capacity(items.len());
        for (id, _) in items {
            if let Some(options) = hooks.before_item_rendered(&id) {
                let handle = OverlayHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
                hooks.on_item_rendered(&id, handle);
                rendered.push((id, handle, options));
            }
        }

        *self.rendered.lock() = rendered;
    }

    fn clusters(&self, zoom: f64) -> Vec<NativeCluster> {
        let items = self.items.lock().clone();
        if items.is_empty() {
            return vec![];
        }

        if zoom < 10.0 {
            return vec![NativeCluster {
                position: centroid(&items),
                item_ids: items.into_iter().map(|(id, _)| id).collect(),
            }];
        }

        items
            .into_iter()
            .map(|(id, position)| NativeCluster {
                position,
                item_ids: vec![id],
            })
            .collect()
    }
}

struct SharedEngine(Arc<MockClusterEngine>);

impl ClusterEngine for SharedEngine {
    fn add_item(&self, item_id: &str, position: LatLng) {
        self.0.add_item(item_id, position);
    }

    fn remove_item(&self, item_id: &str) {
        self.0.remove_item(item_id);
    }

    fn clear_items(&self) {
        self.0.clear_items();
    }

    fn cluster(&self) {
        self.0.cluster();
    }

    fn clusters(&self, zoom: f64) -> Vec<NativeCluster> {
        self.0.clusters(zoom)
    }
}

/// Map surface keeping every overlay in memory and recording the calls it receives.
pub(crate) struct MockMapSurface {
    next_handle: AtomicU64,
    markers: OverlayMap<NativeMarkerOptions>,
    polygons: OverlayMap<PolygonOptions>,
    polylines: OverlayMap<PolylineOptions>,
    circles: OverlayMap<CircleOptions>,
    refuse_overlays: AtomicBool,
    clear_calls: AtomicUsize,

    info_window: InfoWindowCloser,
    listener_changes: Mutex<Vec<bool>>,

    invalidations: AtomicUsize,
    map_loaded_requests: AtomicUsize,

    min_zoom_calls: Mutex<Vec<f64>>,
    max_zoom_calls: Mutex<Vec<f64>>,
    zoom_resets: AtomicUsize,

    camera: Mutex<CameraPosition>,
    camera_updates: Mutex<Vec<CameraUpdate>>,
    following: Mutex<Option<CameraPerspective>>,
    following_zoom: Mutex<Option<f64>>,

    map_type: Mutex<MapType>,
    padding: Mutex<Option<MapPadding>>,
    ui_settings: Mutex<AHashMap<UiSetting, bool>>,

    supports_navigation: bool,
    navigation_ui: AtomicBool,
    navigators_attached: AtomicUsize,
    route_overviews: AtomicUsize,

    engines: Mutex<Vec<Arc<MockClusterEngine>>>,
    icon_factory: Arc<MockIconFactory>,

    lifecycle: Mutex<Vec<LifecycleEvent>>,
    destroyed: AtomicBool,
}

impl MockMapSurface {
    fn with_navigation(supports_navigation: bool) -> Arc<Self> {
        Arc::new(Self {
            next_handle: AtomicU64::new(1),
            markers: OverlayMap::default(),
            polygons: OverlayMap::default(),
            polylines: OverlayMap::default(),
            circles: OverlayMap::default(),
            refuse_overlays: AtomicBool::new(false),
            clear_calls: AtomicUsize::new(0),
            info_window: InfoWindowCloser::default(),
            listener_changes: Mutex::new(Vec::new()),
            invalidations: AtomicUsize::new(0),
            map_loaded_requests: AtomicUsize::new(0),
            min_zoom_calls: Mutex::new(Vec::new()),
            max_zoom_calls: Mutex::new(Vec::new()),
            zoom_resets: AtomicUsize::new(0),
            camera: Mutex::new(CameraPosition {
                zoom: 15.0,
                ..Default::default()
            }),
            camera_updates: Mutex::new(Vec::new()),
            following: Mutex::new(None),
            following_zoom: Mutex::new(None),
            map_type: Mutex::new(MapType::Normal),
            padding: Mutex::new(None),
            ui_settings: Mutex::new(AHashMap::new()),
            supports_navigation,
            navigation_ui: AtomicBool::new(false),
            navigators_attached: AtomicUsize::new(0),
            route_overviews: AtomicUsize::new(0),
            engines: Mutex::new(Vec::new()),
            icon_factory: Arc::new(MockIconFactory::default()),
            lifecycle: Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
        })
    }

    pub(crate) fn map() -> Arc<Self> {
        Self::with_navigation(false)
    }

    pub(crate) fn navigation() -> Arc<Self> {
        Self::with_navigation(true)
    }

    fn next_handle(&self) -> OverlayHandle {
        OverlayHandle(self.next_handle.fetch_add(1, Ordering::SeqCst))
    }

    fn add_overlay<O: Clone>(
        &self,
        overlays: &OverlayMap<O>,
        options: &O,
    ) -> Option<MockOverlay<O>> {
        if self.refuse_overlays.load(Ordering::SeqCst) {
            return None;
        }

        let handle = self.next_handle();
        overlays.lock().insert(handle, options.clone());
        Some(MockOverlay {
            handle,
            overlays: overlays.clone(),
        })
    }

    pub(crate) fn set_refuse_overlays(&self, refuse: bool) {
        self.refuse_overlays.store(refuse, Ordering::SeqCst);
    }

    /// Listener currently registered by the view.
    pub(crate) fn listener(&self) -> Option<Arc<dyn MapEventListener>> {
        self.info_window.listener()
    }

    /// Makes marker removal and `clear` report an info window close for every removed marker.
    pub(crate) fn set_close_info_windows_on_remove(&self, enabled: bool) {
        self.info_window.enabled.store(enabled, Ordering::SeqCst);
    }

    /// History of listener changes: `true` for set, `false` for cleared.
    pub(crate) fn listener_changes(&self) -> Vec<bool> {
        self.listener_changes.lock().clone()
    }

    pub(crate) fn marker_count(&self) -> usize {
        self.markers.lock().len()
    }

    pub(crate) fn marker_handles(&self) -> Vec<OverlayHandle> {
        let mut handles: Vec<OverlayHandle> = self.markers.lock().keys().copied().collect();
        handles.sort();
        handles
    }

    pub(crate) fn marker_options(&self, handle: OverlayHandle) -> Option<NativeMarkerOptions> {
        self.markers.lock().get(&handle).cloned()
    }

    pub(crate) fn polygon_handles(&self) -> Vec<OverlayHandle> {
        let mut handles: Vec<OverlayHandle> = self.polygons.lock().keys().copied().collect();
        handles.sort();
        handles
    }

    pub(crate) fn circle_count(&self) -> usize {
        self.circles.lock().len()
    }

    pub(crate) fn polyline_count(&self) -> usize {
        self.polylines.lock().len()
    }

    pub(crate) fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    pub(crate) fn map_loaded_requests(&self) -> usize {
        self.map_loaded_requests.load(Ordering::SeqCst)
    }

    pub(crate) fn min_zoom_calls(&self) -> Vec<f64> {
        self.min_zoom_calls.lock().clone()
    }

    pub(crate) fn max_zoom_calls(&self) -> Vec<f64> {
        self.max_zoom_calls.lock().clone()
    }

    pub(crate) fn zoom_resets(&self) -> usize {
        self.zoom_resets.load(Ordering::SeqCst)
    }

    pub(crate) fn camera_updates(&self) -> Vec<CameraUpdate> {
        self.camera_updates.lock().clone()
    }

    pub(crate) fn set_camera(&self, camera: CameraPosition) {
        *self.camera.lock() = camera;
    }

    pub(crate) fn following(&self) -> (Option<CameraPerspective>, Option<f64>) {
        (*self.following.lock(), *self.following_zoom.lock())
    }

    pub(crate) fn padding(&self) -> Option<MapPadding> {
        *self.padding.lock()
    }

    pub(crate) fn navigators_attached(&self) -> usize {
        self.navigators_attached.load(Ordering::SeqCst)
    }

    pub(crate) fn route_overviews(&self) -> usize {
        self.route_overviews.load(Ordering::SeqCst)
    }

    pub(crate) fn engines(&self) -> Vec<Arc<MockClusterEngine>> {
        self.engines.lock().clone()
    }

    pub(crate) fn icon_factory_created(&self) -> usize {
        self.icon_factory.created()
    }

    pub(crate) fn lifecycle_events(&self) -> Vec<LifecycleEvent> {
        self.lifecycle.lock().clone()
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl MapSurface for MockMapSurface {
    fn add_marker(&self, options: &NativeMarkerOptions) -> Option<NativeMarker> {
        let overlay = self.add_overlay(&self.markers, options)?;
        Some(Box::new(MockMarker {
            overlay,
            info_window: self.info_window.clone(),
        }))
    }

    fn add_polygon(&self, options: &PolygonOptions) -> Option<NativePolygon> {
        let overlay = self.add_overlay(&self.polygons, options)?;
        Some(Box::new(overlay))
    }

    fn add_polyline(&self, options: &PolylineOptions) -> Option<NativePolyline> {
        let overlay = self.add_overlay(&self.polylines, options)?;
        Some(Box::new(overlay))
    }

    fn add_circle(&self, options: &CircleOptions) -> Option<NativeCircle> {
        let overlay = self.add_overlay(&self.circles, options)?;
        Some(Box::new(overlay))
    }

    fn clear(&self) {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        let removed: Vec<OverlayHandle> =
            self.markers.lock().drain().map(|(handle, _)| handle).collect();
        self.polygons.lock().clear();
        self.polylines.lock().clear();
        self.circles.lock().clear();
        for handle in removed {
            self.info_window.close(handle);
        }
    }

    fn min_zoom_level(&self) -> f64 {
        2.0
    }

    fn max_zoom_level(&self) -> f64 {
        21.0
    }

    fn set_min_zoom_preference(&self, zoom: f64) {
        self.min_zoom_calls.lock().push(zoom);
    }

    fn set_max_zoom_preference(&self, zoom: f64) {
        self.max_zoom_calls.lock().push(zoom);
    }

    fn reset_min_max_zoom_preference(&self) {
        self.zoom_resets.fetch_add(1, Ordering::SeqCst);
    }

    fn move_camera(&self, update: &CameraUpdate) {
        if let CameraUpdate::NewCameraPosition(position) = update {
            *self.camera.lock() = *position;
        }
        self.camera_updates.lock().push(update.clone());
    }

    fn animate_camera(
        &self,
        update: &CameraUpdate,
        _duration_ms: Option<u64>,
        callback: AnimationCallback,
    ) {
        self.move_camera(update);
        callback(true);
    }

    fn camera_position(&self) -> CameraPosition {
        *self.camera.lock()
    }

    fn visible_region(&self) -> LatLngBounds {
        let target = self.camera.lock().target;
        LatLngBounds::new(
            LatLng::new(target.latitude - 1.0, target.longitude - 1.0),
            LatLng::new(target.latitude + 1.0, target.longitude + 1.0),
        )
        .expect("valid bounds")
    }

    fn my_location(&self) -> Option<LatLng> {
        Some(LatLng::new(52.0, 13.0))
    }

    fn follow_my_location(&self, perspective: CameraPerspective) {
        *self.following.lock() = Some(perspective);
    }

    fn set_following_zoom_level(&self, zoom: f64) {
        *self.following_zoom.lock() = Some(zoom);
    }

    fn set_map_style(&self, style_json: &str) -> Result<(), String> {
        if style_json.trim_start().starts_with('[') {
            Ok(())
        } else {
            Err("style must be a JSON array".into())
        }
    }

    fn map_type(&self) -> MapType {
        *self.map_type.lock()
    }

    fn set_map_type(&self, map_type: MapType) {
        *self.map_type.lock() = map_type;
    }

    fn set_padding(&self, padding: MapPadding) {
        *self.padding.lock() = Some(padding);
    }

    fn set_ui_setting(&self, setting: UiSetting, enabled: bool) {
        self.ui_settings.lock().insert(setting, enabled);
    }

    fn ui_setting(&self, setting: UiSetting) -> bool {
        self.ui_settings
            .lock()
            .get(&setting)
            .copied()
            .unwrap_or(true)
    }

    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }

    fn request_map_loaded_callback(&self) {
        self.map_loaded_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn set_event_listener(&self, listener: Option<Weak<dyn MapEventListener>>) {
        self.listener_changes.lock().push(listener.is_some());
        *self.info_window.listener.lock() = listener;
    }

    fn attach_navigator(&self, _navigator: &Arc<dyn Navigator>) -> bool {
        if !self.supports_navigation {
            return false;
        }

        self.navigators_attached.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn set_navigation_ui_enabled(&self, enabled: bool) {
        if self.supports_navigation {
            self.navigation_ui.store(enabled, Ordering::SeqCst);
        }
    }

    fn is_navigation_ui_enabled(&self) -> bool {
        self.navigation_ui.load(Ordering::SeqCst)
    }

    fn show_route_overview(&self) {
        self.route_overviews.fetch_add(1, Ordering::SeqCst);
    }

    fn create_cluster_engine(&self, hooks: Weak<dyn ClusterRenderHooks>) -> Box<dyn ClusterEngine> {
        let mut engines = self.engines.lock();
        let first_handle = 10_000 * (engines.len() as u64 + 1);
        let engine = Arc::new(MockClusterEngine::new(hooks, first_handle));
        engines.push(engine.clone());
        Box::new(SharedEngine(engine))
    }

    fn icon_factory(&self) -> Arc<dyn IconFactory> {
        self.icon_factory.clone()
    }

    fn on_lifecycle(&self, event: LifecycleEvent) {
        self.lifecycle.lock().push(event);
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct RecordingViewSink {
    events: Mutex<Vec<(i64, ViewEvent)>>,
}

impl RecordingViewSink {
    pub(crate) fn events(&self) -> Vec<(i64, ViewEvent)> {
        self.events.lock().clone()
    }

    pub(crate) fn events_of(&self, view_id: i64) -> Vec<ViewEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(id, _)| *id == view_id)
            .map(|(_, event)| event.clone())
            .collect()
    }
}

impl ViewEventSink for RecordingViewSink {
    fn on_view_event(&self, view_id: i64, event: ViewEvent) {
        self.events.lock().push((view_id, event));
    }
}

#[derive(Default)]
pub(crate) struct RecordingSessionSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSessionSink {
    pub(crate) fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }
}

impl SessionEventSink for RecordingSessionSink {
    fn on_session_event(&self, event: SessionEvent) {
        self.events.lock().push(event);
    }
}

#[derive(Default)]
pub(crate) struct MockSimulator {
    user_location: Mutex<Option<LatLng>>,
    simulations: AtomicUsize,
    paused: AtomicBool,
}

impl MockSimulator {
    pub(crate) fn user_location(&self) -> Option<LatLng> {
        *self.user_location.lock()
    }

    pub(crate) fn simulations(&self) -> usize {
        self.simulations.load(Ordering::SeqCst)
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

impl Simulator for MockSimulator {
    fn set_user_location(&self, location: LatLng) {
        *self.user_location.lock() = Some(location);
    }

    fn unset_user_location(&self) {
        *self.user_location.lock() = None;
    }

    fn simulate_along_existing_route(&self, _options: Option<SimulationOptions>) {
        self.simulations.fetch_add(1, Ordering::SeqCst);
    }

    fn simulate_along_new_route(
        &self,
        _waypoints: &[Waypoint],
        _routing: Option<&RoutingOptions>,
        _simulation: Option<SimulationOptions>,
        callback: RouteStatusCallback,
    ) {
        self.simulations.fetch_add(1, Ordering::SeqCst);
        callback(RouteStatus::Ok);
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

pub(crate) struct MockNavigator {
    next_subscription: AtomicU64,
    subscriptions:
        Mutex<AHashMap<SubscriptionId, (NavigatorSubscription, Arc<dyn NavigatorEventSink>)>>,
    guidance: AtomicBool,
    destinations: Mutex<Vec<Waypoint>>,
    task_removed_behavior: Mutex<Option<TaskRemovedBehavior>>,
    simulator: Arc<MockSimulator>,
    nav_updates: Mutex<Option<(usize, Arc<dyn NavInfoSink>)>>,
    refuse_nav_updates: AtomicBool,
    replayed_event: Mutex<Option<NavigatorEvent>>,
}

impl Default for MockNavigator {
    fn default() -> Self {
        Self {
            next_subscription: AtomicU64::new(1),
            subscriptions: Mutex::new(AHashMap::new()),
            guidance: AtomicBool::new(false),
            destinations: Mutex::new(Vec::new()),
            task_removed_behavior: Mutex::new(None),
            simulator: Arc::new(MockSimulator::default()),
            nav_updates: Mutex::new(None),
            refuse_nav_updates: AtomicBool::new(false),
            replayed_event: Mutex::new(None),
        }
    }
}

impl MockNavigator {
    pub(crate) fn active_subscriptions(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub(crate) fn subscriptions(&self) -> Vec<NavigatorSubscription> {
        self.subscriptions
            .lock()
            .values()
            .map(|(subscription, _)| *subscription)
            .collect()
    }

    /// Event delivered to every new subscription of its kind from inside `subscribe`.
    pub(crate) fn replay_on_subscribe(&self, event: NavigatorEvent) {
        *self.replayed_event.lock() = Some(event);
    }

    /// Delivers an event to the subscriptions of its kind.
    pub(crate) fn fire(&self, event: NavigatorEvent) {
        let sinks: Vec<Arc<dyn NavigatorEventSink>> = self
            .subscriptions
            .lock()
            .values()
            .filter(|(subscription, _)| accepts(subscription, &event))
            .map(|(_, sink)| sink.clone())
            .collect();
        for sink in sinks {
            sink.on_navigator_event(event.clone());
        }
    }

    pub(crate) fn destinations(&self) -> Vec<Waypoint> {
        self.destinations.lock().clone()
    }

    pub(crate) fn task_removed_behavior(&self) -> Option<TaskRemovedBehavior> {
        *self.task_removed_behavior.lock()
    }

    pub(crate) fn simulator_mock(&self) -> Arc<MockSimulator> {
        self.simulator.clone()
    }

    pub(crate) fn nav_updates_sink(&self) -> Option<(usize, Arc<dyn NavInfoSink>)> {
        self.nav_updates.lock().clone()
    }

    pub(crate) fn set_refuse_nav_updates(&self, refuse: bool) {
        self.refuse_nav_updates.store(refuse, Ordering::SeqCst);
    }
}

fn accepts(subscription: &NavigatorSubscription, event: &NavigatorEvent) -> bool {
    matches!(
        (subscription, event),
        (NavigatorSubscription::Arrival, NavigatorEvent::Arrival(_))
            | (NavigatorSubscription::RouteChanged, NavigatorEvent::RouteChanged)
            | (NavigatorSubscription::Rerouting, NavigatorEvent::Rerouting)
            | (NavigatorSubscription::TrafficUpdated, NavigatorEvent::TrafficUpdated)
            | (NavigatorSubscription::Speeding, NavigatorEvent::Speeding(_))
            | (
                NavigatorSubscription::RemainingTimeOrDistance { .. },
                NavigatorEvent::RemainingTimeOrDistanceChanged(_)
            )
    )
}

impl Navigator for MockNavigator {
    fn set_task_removed_behavior(&self, behavior: TaskRemovedBehavior) {
        *self.task_removed_behavior.lock() = Some(behavior);
    }

    fn subscribe(
        &self,
        subscription: NavigatorSubscription,
        sink: Arc<dyn NavigatorEventSink>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.subscriptions.lock().insert(id, (subscription, sink.clone()));
        let replayed = self.replayed_event.lock().clone();
        if let Some(event) = replayed.filter(|event| accepts(&subscription, event)) {
            sink.on_navigator_event(event);
        }
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscriptions.lock().remove(&id);
    }

    fn start_guidance(&self) {
        self.guidance.store(true, Ordering::SeqCst);
    }

    fn stop_guidance(&self) {
        self.guidance.store(false, Ordering::SeqCst);
    }

    fn is_guidance_running(&self) -> bool {
        self.guidance.load(Ordering::SeqCst)
    }

    fn set_destinations(
        &self,
        waypoints: &[Waypoint],
        _routing: Option<&RoutingOptions>,
        _display: DisplayOptions,
        callback: RouteStatusCallback,
    ) {
        *self.destinations.lock() = waypoints.to_vec();
        callback(RouteStatus::Ok);
    }

    fn set_destinations_with_route_token(
        &self,
        waypoints: &[Waypoint],
        token: &RouteTokenOptions,
        _display: DisplayOptions,
        callback: RouteStatusCallback,
    ) -> Result<(), String> {
        if token.route_token.is_empty() {
            return Err("route token is empty".into());
        }

        *self.destinations.lock() = waypoints.to_vec();
        callback(RouteStatus::Ok);
        Ok(())
    }

    fn clear_destinations(&self) {
        self.destinations.lock().clear();
    }

    fn continue_to_next_destination(&self) -> Option<Waypoint> {
        let mut destinations = self.destinations.lock();
        if destinations.is_empty() {
            return None;
        }
        destinations.remove(0);
        destinations.first().cloned()
    }

    fn current_time_and_distance(&self) -> TimeAndDistance {
        TimeAndDistance {
            seconds: 600.0,
            meters: 5000.0,
        }
    }

    fn set_audio_guidance(&self, _settings: AudioGuidanceSettings) {}

    fn set_speed_alert_options(&self, _options: SpeedAlertOptions) {}

    fn route_segments(&self) -> Vec<RouteSegment> {
        vec![]
    }

    fn traveled_route(&self) -> Vec<LatLng> {
        vec![]
    }

    fn current_route_segment(&self) -> Option<RouteSegment> {
        None
    }

    fn simulator(&self) -> Arc<dyn Simulator> {
        self.simulator.clone()
    }

    fn register_nav_updates(
        &self,
        _package_name: &str,
        max_steps: usize,
        sink: Arc<dyn NavInfoSink>,
    ) -> bool {
        if self.refuse_nav_updates.load(Ordering::SeqCst) {
            return false;
        }

        *self.nav_updates.lock() = Some((max_steps, sink));
        true
    }

    fn unregister_nav_updates(&self) -> bool {
        self.nav_updates.lock().take();
        !self.refuse_nav_updates.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub(crate) struct MockRoadSnappedProvider {
    next_id: AtomicU64,
    listeners: Mutex<AHashMap<SubscriptionId, Arc<dyn RoadSnappedLocationSink>>>,
    last_location: Mutex<Option<LatLng>>,
}

impl MockRoadSnappedProvider {
    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Location delivered to every new listener from inside `add_listener`.
    pub(crate) fn set_last_location(&self, location: LatLng) {
        *self.last_location.lock() = Some(location);
    }

    /// Delivers a location from a background thread.
    pub(crate) fn emit_from_background(&self, location: LatLng) {
        let sinks: Vec<Arc<dyn RoadSnappedLocationSink>> =
            self.listeners.lock().values().cloned().collect();
        std::thread::spawn(move || {
            for sink in sinks {
                sink.on_location(location);
                sink.on_gps_availability(true);
            }
        })
        .join()
        .expect("location thread panicked");
    }
}

impl RoadSnappedLocationProvider for MockRoadSnappedProvider {
    fn add_listener(&self, sink: Arc<dyn RoadSnappedLocationSink>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().insert(id, sink.clone());
        let last_location = *self.last_location.lock();
        if let Some(location) = last_location {
            sink.on_location(location);
        }
        id
    }

    fn remove_listener(&self, id: SubscriptionId) {
        self.listeners.lock().remove(&id);
    }
}

type NavigatorCallback = Box<dyn FnOnce(Result<Arc<dyn Navigator>, NavigatorError>) + Send>;

pub(crate) struct MockNavigationServices {
    terms_accepted: AtomicBool,
    location_permission: AtomicBool,
    deferred: AtomicBool,
    failure: Mutex<Option<NavigatorError>>,
    pending: Mutex<Vec<NavigatorCallback>>,
    requests: AtomicUsize,
    abnormal_termination_reporting: Mutex<Option<bool>>,
    pub(crate) navigator: Arc<MockNavigator>,
    pub(crate) road_snapped: Arc<MockRoadSnappedProvider>,
}

impl Default for MockNavigationServices {
    fn default() -> Self {
        Self {
            terms_accepted: AtomicBool::new(true),
            location_permission: AtomicBool::new(true),
            deferred: AtomicBool::new(false),
            failure: Mutex::new(None),
            pending: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
            abnormal_termination_reporting: Mutex::new(None),
            navigator: Arc::new(MockNavigator::default()),
            road_snapped: Arc::new(MockRoadSnappedProvider::default()),
        }
    }
}

impl MockNavigationServices {
    pub(crate) fn set_terms_accepted(&self, accepted: bool) {
        self.terms_accepted.store(accepted, Ordering::SeqCst);
    }

    pub(crate) fn set_location_permission(&self, granted: bool) {
        self.location_permission.store(granted, Ordering::SeqCst);
    }

    /// Keeps navigator requests pending until [`MockNavigationServices::complete`].
    pub(crate) fn set_deferred(&self, deferred: bool) {
        self.deferred.store(deferred, Ordering::SeqCst);
    }

    pub(crate) fn set_failure(&self, failure: Option<NavigatorError>) {
        *self.failure.lock() = failure;
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub(crate) fn abnormal_termination_reporting(&self) -> Option<bool> {
        *self.abnormal_termination_reporting.lock()
    }

    fn result(&self) -> Result<Arc<dyn Navigator>, NavigatorError> {
        match *self.failure.lock() {
            Some(error) => Err(error),
            None => Ok(self.navigator.clone()),
        }
    }

    /// Answers every pending navigator request.
    pub(crate) fn complete(&self) {
        let pending = std::mem::take(&mut *self.pending.lock());
        for callback in pending {
            callback(self.result());
        }
    }
}

impl NavigationServices for MockNavigationServices {
    fn are_terms_accepted(&self) -> bool {
        self.terms_accepted.load(Ordering::SeqCst)
    }

    fn show_terms_dialog(
        &self,
        _params: TermsDialogParams,
        callback: Box<dyn FnOnce(bool) + Send>,
    ) {
        self.set_terms_accepted(true);
        callback(true);
    }

    fn reset_terms_accepted(&self) -> Result<(), String> {
        self.set_terms_accepted(false);
        Ok(())
    }

    fn has_location_permission(&self) -> bool {
        self.location_permission.load(Ordering::SeqCst)
    }

    fn nav_sdk_version(&self) -> String {
        "6.0.0".into()
    }

    fn set_abnormal_termination_reporting(&self, enabled: bool) {
        *self.abnormal_termination_reporting.lock() = Some(enabled);
    }

    fn request_navigator(&self, _activity: &Arc<dyn HostActivity>, callback: NavigatorCallback) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.deferred.load(Ordering::SeqCst) {
            self.pending.lock().push(callback);
            return;
        }

        callback(self.result());
    }

    fn road_snapped_location_provider(&self) -> Option<Arc<dyn RoadSnappedLocationProvider>> {
        Some(self.road_snapped.clone())
    }
}

pub(crate) struct MockActivity;

impl HostActivity for MockActivity {
    fn package_name(&self) -> String {
        "com.example.navbridge".into()
    }
}

/// Shared collaborators of views created in a test.
pub(crate) struct TestBed {
    pub(crate) image_registry: Arc<ImageRegistry>,
    pub(crate) view_sink: Arc<RecordingViewSink>,
    pub(crate) session_slot: Arc<SessionSlot>,
}

impl TestBed {
    pub(crate) fn new() -> Self {
        init_logger();
        Self {
            image_registry: Arc::new(ImageRegistry::new(1.0)),
            view_sink: Arc::new(RecordingViewSink::default()),
            session_slot: Arc::new(SessionSlot::new()),
        }
    }

    pub(crate) fn events_of(&self, view_id: i64) -> Vec<ViewEvent> {
        self.view_sink.events_of(view_id)
    }
}

/// A view together with its mock surface.
pub(crate) struct ViewFixture {
    pub(crate) view: Arc<MapViewController>,
    pub(crate) surface: Arc<MockMapSurface>,
}

impl ViewFixture {
    pub(crate) fn with_options(bed: &TestBed, view_id: Option<i64>, options: MapOptions) -> Self {
        let surface = match options.kind {
            ViewKind::Map => MockMapSurface::map(),
            ViewKind::Navigation => MockMapSurface::navigation(),
        };
        let view = MapViewController::new(
            view_id,
            &options,
            surface.clone(),
            bed.image_registry.clone(),
            Arc::downgrade(&bed.session_slot),
            Some(bed.view_sink.clone()),
        );
        Self { view, surface }
    }

    pub(crate) fn map(bed: &TestBed, view_id: i64) -> Self {
        Self::with_options(bed, Some(view_id), MapOptions::default())
    }

    pub(crate) fn navigation(bed: &TestBed, view_id: i64) -> Self {
        Self::with_options(
            bed,
            Some(view_id),
            MapOptions::default().with_kind(ViewKind::Navigation),
        )
    }

    pub(crate) fn auxiliary(bed: &TestBed) -> Self {
        Self::with_options(
            bed,
            None,
            MapOptions::default().with_kind(ViewKind::Navigation),
        )
    }

    /// Reports the surface as ready.
    pub(crate) fn ready(self) -> Self {
        self.view.on_map_ready();
        self
    }

    pub(crate) fn listener(&self) -> Arc<dyn MapEventListener> {
        self.surface.listener().expect("listener is registered")
    }

    /// Lets the engine report map loaded and renders enough frames to flush every pending
    /// repaint.
    pub(crate) fn flush_frames(&self) {
        self.view.on_map_loaded();
        for _ in 0..(2 * crate::frame_delay::INVALIDATION_FRAME_DELAY) {
            self.view.on_frame_rendered();
        }
    }
}
