//! Controllers wrapping single native overlays, and the per-view collections holding them.

use ahash::AHashMap;
use log::warn;

use crate::native::OverlayHandle;

mod marker;
mod shape;

pub(crate) use marker::MarkerController;
pub(crate) use shape::{ShapeController, ShapeDto};

/// Common interface of overlay controllers kept in an [`OverlayStore`].
pub(crate) trait OverlayController {
    /// Logical id assigned by the host.
    fn id(&self) -> &str;
    /// Identity of the native overlay.
    fn handle(&self) -> OverlayHandle;
    /// Detaches the native overlay from the surface.
    fn remove(&self);
}

/// Ordered collection of overlay controllers of one kind.
///
/// Logical ids are unique within the store. Native handles are indexed so that native
/// callbacks resolve to a logical id without scanning.
pub(crate) struct OverlayStore<C> {
    items: Vec<C>,
    ids_by_handle: AHashMap<OverlayHandle, String>,
}

impl<C: OverlayController> OverlayStore<C> {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            ids_by_handle: AHashMap::new(),
        }
    }

    /// Adds a controller. A controller with the same id is detached and replaced.
    pub(crate) fn push(&mut self, controller: C) {
        if let Some(previous) = self.remove(controller.id()) {
            warn!(
                "Overlay with id {} already exists, replacing it",
                previous.id()
            );
            previous.remove();
        }

        self.ids_by_handle.insert(controller.handle(), controller.id().to_string());
        self.items.push(controller);
    }

    pub(crate) fn get(&self, id: &str) -> Option<&C> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut C> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Removes the controller from the store without touching the native overlay.
    pub(crate) fn remove(&mut self, id: &str) -> Option<C> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        let controller = self.items.remove(index);
        self.ids_by_handle.remove(&controller.handle());
        Some(controller)
    }

    /// Logical id of the overlay with the given native handle.
    pub(crate) fn id_for(&self, handle: OverlayHandle) -> Option<&str> {
        self.ids_by_handle.get(&handle).map(String::as_str)
    }

    pub(crate) fn get_by_handle(&self, handle: OverlayHandle) -> Option<&C> {
        let id = self.id_for(handle)?;
        self.get(id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &C> {
        self.items.iter()
    }

    /// Removes every controller from the store and returns them.
    pub(crate) fn take_all(&mut self) -> Vec<C> {
        self.ids_by_handle.clear();
        std::mem::take(&mut self.items)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestOverlay {
        id: String,
        handle: u64,
    }

    impl OverlayController for TestOverlay {
        fn id(&self) -> &str {
            &self.id
        }

        fn handle(&self) -> OverlayHandle {
            OverlayHandle(self.handle)
        }

        fn remove(&self) {}
    }

    fn overlay(id: &str, handle: u64) -> TestOverlay {
        TestOverlay {
            id: id.to_string(),
            handle,
        }
    }

    #[test]
    fn ids_stay_unique() {
        let mut store = OverlayStore::new();
        store.push(overlay("a", 1));
        store.push(overlay("b", 2));
        store.push(overlay("a", 3));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").map(|o| o.handle), Some(3));
        assert_eq!(store.id_for(OverlayHandle(1)), None);
        assert_eq!(store.id_for(OverlayHandle(3)), Some("a"));
    }

    #[test]
    fn remove_drops_handle_index() {
        let mut store = OverlayStore::new();
        store.push(overlay("a", 1));

        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert!(store.get_by_handle(OverlayHandle(1)).is_none());
        assert!(!store.contains("a"));
    }

    #[test]
    fn take_all_empties_store() {
        let mut store = OverlayStore::new();
        store.push(overlay("a", 1));
        store.push(overlay("b", 2));

        let taken = store.take_all();
        assert_eq!(taken.len(), 2);
        assert_eq!(store.len(), 0);
        assert!(store.id_for(OverlayHandle(2)).is_none());
    }
}
