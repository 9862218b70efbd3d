//! Marker clustering.

use std::sync::Arc;

use ahash::AHashMap;
use navbridge_types::{ClusterDto, MarkerDto};
use parking_lot::RwLock;

use crate::events::ViewEventEmitter;
use crate::image_registry::ImageRegistry;
use crate::native::{MapSurface, OverlayHandle};

mod manager;

pub(crate) use manager::ClusterManagerController;

/// Cluster managers of one view keyed by id.
pub(crate) struct ClusterManagers {
    managers: RwLock<AHashMap<String, Arc<ClusterManagerController>>>,
    events: Arc<ViewEventEmitter>,
    image_registry: Arc<ImageRegistry>,
}

impl ClusterManagers {
    pub(crate) fn new(events: Arc<ViewEventEmitter>, image_registry: Arc<ImageRegistry>) -> Self {
        Self {
            managers: RwLock::new(AHashMap::new()),
            events,
            image_registry,
        }
    }

    /// Creates a manager unless one with the same id already exists.
    pub(crate) fn add(
        &self,
        cluster_manager_id: &str,
        surface: &dyn MapSurface,
    ) -> Arc<ClusterManagerController> {
        let mut managers = self.managers.write();
        if let Some(existing) = managers.get(cluster_manager_id) {
            return existing.clone();
        }

        let manager = ClusterManagerController::new(
            cluster_manager_id.to_string(),
            surface,
            self.events.clone(),
            self.image_registry.clone(),
        );
        managers.insert(cluster_manager_id.to_string(), manager.clone());
        manager
    }

    /// Removes a manager, dropping its items and the glyphs it rendered.
    pub(crate) fn remove(&self, cluster_manager_id: &str) -> Option<Vec<MarkerDto>> {
        let manager = self.managers.write().remove(cluster_manager_id)?;
        let items = manager.items();
        manager.clear_items();
        manager.cluster();
        Some(items)
    }

    pub(crate) fn get(&self, cluster_manager_id: &str) -> Option<Arc<ClusterManagerController>> {
        self.managers.read().get(cluster_manager_id).cloned()
    }

    pub(crate) fn ids(&self) -> Vec<String> {
        self.managers.read().keys().cloned().collect()
    }

    pub(crate) fn all(&self) -> Vec<Arc<ClusterManagerController>> {
        self.managers.read().values().cloned().collect()
    }

    /// Manager currently owning the marker.
    pub(crate) fn owner_of(&self, marker_id: &str) -> Option<Arc<ClusterManagerController>> {
        self.managers
            .read()
            .values()
            .find(|manager| manager.contains(marker_id))
            .cloned()
    }

    /// Resolves a native marker rendered by any of the managers.
    pub(crate) fn item_by_handle(&self, handle: OverlayHandle) -> Option<MarkerDto> {
        self.all()
            .iter()
            .find_map(|manager| manager.item_by_handle(handle))
    }

    /// Re-clusters every manager.
    pub(crate) fn cluster_all(&self) {
        for manager in self.all() {
            manager.cluster();
        }
    }

    /// Clears the items of every manager and re-clusters. Managers themselves are kept.
    pub(crate) fn clear_items(&self) {
        for manager in self.all() {
            manager.clear_items();
            manager.cluster();
        }
    }

    /// Drops every manager without touching native state.
    pub(crate) fn forget_all(&self) {
        self.managers.write().clear();
    }

    pub(crate) fn clusters(&self, cluster_manager_id: &str, zoom: f64) -> Option<Vec<ClusterDto>> {
        self.get(cluster_manager_id).map(|manager| manager.clusters(zoom))
    }

    pub(crate) fn all_clusters(&self, zoom: f64) -> Vec<ClusterDto> {
        self.all()
            .iter()
            .flat_map(|manager| manager.clusters(zoom))
            .collect()
    }
}

/// Re-clusters the given managers once each.
pub(crate) fn recluster(managers: &[Arc<ClusterManagerController>]) {
    let mut done: Vec<&str> = Vec::with_capacity(managers.len());
    for manager in managers {
        if done.contains(&manager.id()) {
            continue;
        }

        done.push(manager.id());
        manager.cluster();
    }
}

