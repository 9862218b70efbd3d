use std::sync::{Arc, Weak};

use ahash::AHashMap;
use log::debug;
use navbridge_types::{ClusterDto, MarkerDto};
use parking_lot::Mutex;

use crate::events::{ViewEvent, ViewEventEmitter};
use crate::image_registry::ImageRegistry;
use crate::native::{
    ClusterEngine, ClusterRenderHooks, MapSurface, NativeCluster, NativeMarkerOptions,
    OverlayHandle,
};

/// A marker owned by a cluster manager instead of the plain marker list.
#[derive(Debug, Clone)]
struct ClusterItem {
    dto: MarkerDto,
}

/// Owns one native clustering engine and the marker items assigned to it.
///
/// The engine renders singleton items lazily and reports the native marker it created, so
/// marker taps can be mapped back to the logical id.
pub(crate) struct ClusterManagerController {
    cluster_manager_id: String,
    engine: Box<dyn ClusterEngine>,
    items: Mutex<AHashMap<String, ClusterItem>>,
    rendered: Mutex<AHashMap<OverlayHandle, String>>,
    events: Arc<ViewEventEmitter>,
    image_registry: Arc<ImageRegistry>,
}

impl ClusterManagerController {
    pub(crate) fn new(
        cluster_manager_id: String,
        surface: &dyn MapSurface,
        events: Arc<ViewEventEmitter>,
        image_registry: Arc<ImageRegistry>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let hooks: Weak<dyn ClusterRenderHooks> = this.clone();
            Self {
                cluster_manager_id,
                engine: surface.create_cluster_engine(hooks),
                items: Mutex::new(AHashMap::new()),
                rendered: Mutex::new(AHashMap::new()),
                events,
                image_registry,
            }
        })
    }

    pub(crate) fn id(&self) -> &str {
        &self.cluster_manager_id
    }

    /// Adds or replaces an item. Does not re-cluster.
    pub(crate) fn add_item(&self, mut dto: MarkerDto) {
        dto.options.cluster_manager_id = Some(self.cluster_manager_id.clone());
        let marker_id = dto.marker_id.clone();
        let position = dto.options.position;

        let replaced = self
            .items
            .lock()
            .insert(marker_id.clone(), ClusterItem { dto })
            .is_some();
        if replaced {
            self.engine.remove_item(&marker_id);
        }

        self.engine.add_item(&marker_id, position);
    }

    /// Removes an item. Does not re-cluster.
    pub(crate) fn remove_item(&self, marker_id: &str) -> Option<MarkerDto> {
        let item = self.items.lock().remove(marker_id)?;
        self.rendered.lock().retain(|_, id| id != marker_id);
        self.engine.remove_item(marker_id);
        Some(item.dto)
    }

    /// Removes every item. Does not re-cluster.
    pub(crate) fn clear_items(&self) {
        self.items.lock().clear();
        self.rendered.lock().clear();
        self.engine.clear_items();
    }

    /// Recomputes clusters. Must not be called while holding any item lock.
    pub(crate) fn cluster(&self) {
        debug!("Clustering items of {}", self.cluster_manager_id);
        self.engine.cluster();
    }

    pub(crate) fn contains(&self, marker_id: &str) -> bool {
        self.items.lock().contains_key(marker_id)
    }

    pub(crate) fn item(&self, marker_id: &str) -> Option<MarkerDto> {
        self.items
            .lock()
            .get(marker_id)
            .map(|item| item.dto.clone())
    }

    pub(crate) fn items(&self) -> Vec<MarkerDto> {
        self.items
            .lock()
            .values()
            .map(|item| item.dto.clone())
            .collect()
    }

    /// Resolves a native marker rendered by this manager to its item.
    pub(crate) fn item_by_handle(&self, handle: OverlayHandle) -> Option<MarkerDto> {
        let marker_id = self.rendered.lock().get(&handle).cloned()?;
        self.item(&marker_id)
    }

    pub(crate) fn clusters(&self, zoom: f64) -> Vec<ClusterDto> {
        self.engine
            .clusters(zoom)
            .into_iter()
            .map(|cluster| self.to_dto(&cluster))
            .collect()
    }

    fn to_dto(&self, cluster: &NativeCluster) -> ClusterDto {
        ClusterDto {
            cluster_manager_id: self.cluster_manager_id.clone(),
            position: cluster.position,
            marker_ids: cluster.item_ids.clone(),
        }
    }
}

impl ClusterRenderHooks for ClusterManagerController {
    fn before_item_rendered(&self, item_id: &str) -> Option<NativeMarkerOptions> {
        let items = self.items.lock();
        let item = items.get(item_id)?;
        let icon = self.image_registry.icon_for(&item.dto.options.icon);
        Some(NativeMarkerOptions::from_options(&item.dto.options, icon))
    }

    fn on_item_rendered(&self, item_id: &str, marker: OverlayHandle) {
        if !self.items.lock().contains_key(item_id) {
            return;
        }

        self.rendered.lock().insert(marker, item_id.to_string());
    }

    fn on_cluster_click(&self, cluster: &NativeCluster) -> bool {
        if cluster.item_ids.is_empty() {
            return false;
        }

        self.events.emit(ViewEvent::ClusterClicked(self.to_dto(cluster)));
        false
    }
}
