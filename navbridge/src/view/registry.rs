use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, warn};
use parking_lot::RwLock;

use super::{MapViewController, ViewKind};
use crate::native::LifecycleEvent;

type AuxiliaryObserver = Box<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct Views {
    by_id: AHashMap<i64, Arc<MapViewController>>,
    auxiliary: Option<Arc<MapViewController>>,
}

/// Views of the plugin keyed by their host assigned id, plus the single auxiliary display
/// view.
///
/// Registration happens from one thread, lookups may happen from any thread. Lifecycle
/// fan-out iterates over a snapshot, so views may be disposed while an event is forwarded.
#[derive(Default)]
pub struct ViewRegistry {
    views: RwLock<Views>,
    auxiliary_observer: RwLock<Option<AuxiliaryObserver>>,
}

impl ViewRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a view. A view previously registered with the same id is returned.
    pub fn register(
        &self,
        view_id: i64,
        view: Arc<MapViewController>,
    ) -> Option<Arc<MapViewController>> {
        debug!("Registering view {view_id}");
        let previous = self.views.write().by_id.insert(view_id, view);
        if previous.is_some() {
            warn!("View {view_id} was already registered and has been replaced");
        }
        previous
    }

    /// Unregisters a view.
    pub fn unregister(&self, view_id: i64) -> Option<Arc<MapViewController>> {
        debug!("Unregistering view {view_id}");
        self.views.write().by_id.remove(&view_id)
    }

    /// View with the given id.
    pub fn get(&self, view_id: i64) -> Option<Arc<MapViewController>> {
        self.views.read().by_id.get(&view_id).cloned()
    }

    /// Every registered view, excluding the auxiliary one.
    pub fn all_views(&self) -> Vec<Arc<MapViewController>> {
        self.views.read().by_id.values().cloned().collect()
    }

    /// Registered navigation views, excluding the auxiliary one.
    pub fn navigation_views(&self) -> Vec<Arc<MapViewController>> {
        self.views
            .read()
            .by_id
            .values()
            .filter(|view| view.kind() == ViewKind::Navigation)
            .cloned()
            .collect()
    }

    /// Ids of the registered navigation views.
    pub fn navigation_view_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .views
            .read()
            .by_id
            .iter()
            .filter(|(_, view)| view.kind() == ViewKind::Navigation)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Registers the auxiliary view, replacing the current one.
    pub fn register_auxiliary(
        &self,
        view: Arc<MapViewController>,
    ) -> Option<Arc<MapViewController>> {
        let previous = self.views.write().auxiliary.replace(view);
        if previous.is_some() {
            warn!("Auxiliary view was already registered and has been replaced");
        }

        self.notify_auxiliary(true);
        previous
    }

    /// Unregisters the auxiliary view.
    pub fn unregister_auxiliary(&self) -> Option<Arc<MapViewController>> {
        let previous = self.views.write().auxiliary.take();
        if previous.is_some() {
            self.notify_auxiliary(false);
        }
        previous
    }

    /// The auxiliary view, if one is registered.
    pub fn auxiliary(&self) -> Option<Arc<MapViewController>> {
        self.views.read().auxiliary.clone()
    }

    /// Sets the function called with `true` when an auxiliary view is registered and with
    /// `false` when it is unregistered.
    pub fn on_auxiliary_changed(&self, observer: impl Fn(bool) + Send + Sync + 'static) {
        *self.auxiliary_observer.write() = Some(Box::new(observer));
    }

    fn notify_auxiliary(&self, available: bool) {
        if let Some(observer) = self.auxiliary_observer.read().as_ref() {
            observer(available);
        }
    }

    /// Forwards a host lifecycle event.
    ///
    /// Start, resume, pause and stop reach every view including the auxiliary one. The
    /// configuration and memory events only reach navigation views.
    pub fn dispatch_lifecycle(&self, event: LifecycleEvent) {
        let targets = if event.is_navigation_only() {
            self.navigation_views()
        } else {
            let views = self.views.read();
            let targets: Vec<_> = views
                .by_id
                .values()
                .chain(views.auxiliary.iter())
                .cloned()
                .collect();
            targets
        };

        for view in targets {
            view.on_lifecycle(event);
        }
    }
}
