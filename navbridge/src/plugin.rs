//! Plugin entry point tying the registries, the session and the handlers together.

use std::sync::Arc;

use log::{debug, warn};

use crate::error::BridgeError;
use crate::events::{SessionEventSink, ViewEventSink};
use crate::handler::{
    AutoViewMessageHandler, ImageMessageHandler, SessionMessageHandler, ViewMessageHandler,
};
use crate::image_registry::ImageRegistry;
use crate::native::{HostActivity, LifecycleEvent, MapSurface, NavigationServices};
use crate::session::{NavigationSessionManager, SessionSlot};
use crate::view::{MapOptions, MapViewController, ViewKind, ViewRegistry};

/// Plugin wide configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PluginConfig {
    /// Ratio of physical to logical pixels of the display, used to scale registered images.
    pub display_density: f64,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            display_density: 1.0,
        }
    }
}

impl PluginConfig {
    /// Sets the display density.
    pub fn with_display_density(mut self, display_density: f64) -> Self {
        self.display_density = display_density;
        self
    }
}

/// A plugin instance attached to a host.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use navbridge::native::NavigationServices;
/// # use navbridge::events::{SessionEventSink, ViewEventSink};
/// # fn services() -> Arc<dyn NavigationServices> { unimplemented!() }
/// # fn session_sink() -> Arc<dyn SessionEventSink> { unimplemented!() }
/// # fn view_sink() -> Arc<dyn ViewEventSink> { unimplemented!() }
/// use navbridge::plugin::{NavigationPlugin, PluginConfig};
///
/// let plugin = NavigationPlugin::attach(
///     PluginConfig::default().with_display_density(2.0),
///     services(),
///     session_sink(),
///     view_sink(),
/// );
/// assert!(!plugin.session_handler().manager().unwrap().is_initialized());
/// plugin.detach();
/// ```
pub struct NavigationPlugin {
    services: Arc<dyn NavigationServices>,
    session_events: Arc<dyn SessionEventSink>,
    view_events: Arc<dyn ViewEventSink>,
    views: Arc<ViewRegistry>,
    image_registry: Arc<ImageRegistry>,
    session: Arc<SessionSlot>,
    view_handler: ViewMessageHandler,
    auto_view_handler: AutoViewMessageHandler,
    session_handler: SessionMessageHandler,
    image_handler: ImageMessageHandler,
}

impl NavigationPlugin {
    /// Attaches the plugin: builds the registries, the session manager and the handlers.
    pub fn attach(
        config: PluginConfig,
        services: Arc<dyn NavigationServices>,
        session_events: Arc<dyn SessionEventSink>,
        view_events: Arc<dyn ViewEventSink>,
    ) -> Self {
        debug!("Attaching navigation plugin with {config:?}");

        let views = Arc::new(ViewRegistry::new());
        let image_registry = Arc::new(ImageRegistry::new(config.display_density));
        let session = Arc::new(SessionSlot::new());

        let plugin = Self {
            view_handler: ViewMessageHandler::new(views.clone()),
            auto_view_handler: AutoViewMessageHandler::new(views.clone()),
            session_handler: SessionMessageHandler::new(session.clone()),
            image_handler: ImageMessageHandler::new(image_registry.clone()),
            services,
            session_events,
            view_events,
            views,
            image_registry,
            session,
        };
        plugin.ensure_session_manager();
        plugin
    }

    /// Returns the session manager, creating it if it does not exist.
    pub fn ensure_session_manager(&self) -> Arc<NavigationSessionManager> {
        self.session.create_with(|| {
            NavigationSessionManager::new(
                self.services.clone(),
                self.views.clone(),
                self.session_events.clone(),
            )
        })
    }

    /// Detaches the plugin: cleans up an initialized session and destroys the session
    /// manager.
    pub fn detach(&self) {
        let Some(manager) = self.session.take() else {
            return;
        };

        if manager.is_initialized() {
            if let Err(error) = manager.cleanup() {
                warn!("Failed to clean up navigation session on detach: {error}");
            }
        }

        debug!("Navigation plugin detached");
    }

    /// Creates a view around a platform surface and registers it.
    ///
    /// A view already registered with the same id is disposed.
    pub fn create_view(
        &self,
        view_id: i64,
        options: &MapOptions,
        surface: Arc<dyn MapSurface>,
    ) -> Result<Arc<MapViewController>, BridgeError> {
        options.validate()?;

        let view = MapViewController::new(
            Some(view_id),
            options,
            surface,
            self.image_registry.clone(),
            Arc::downgrade(&self.session),
            Some(self.view_events.clone()),
        );

        if let Some(previous) = self.views.register(view_id, view.clone()) {
            previous.dispose();
        }

        Ok(view)
    }

    /// Creates the auxiliary display view. It is always a navigation view and its events are
    /// not delivered to the host.
    pub fn create_auxiliary_view(
        &self,
        options: &MapOptions,
        surface: Arc<dyn MapSurface>,
    ) -> Result<Arc<MapViewController>, BridgeError> {
        let options = options.clone().with_kind(ViewKind::Navigation);
        options.validate()?;

        let view = MapViewController::new(
            None,
            &options,
            surface,
            self.image_registry.clone(),
            Arc::downgrade(&self.session),
            None,
        );

        if let Some(previous) = self.views.register_auxiliary(view.clone()) {
            previous.dispose();
        }

        Ok(view)
    }

    /// Unregisters and disposes a view.
    pub fn dispose_view(&self, view_id: i64) -> Result<(), BridgeError> {
        let view = self
            .views
            .unregister(view_id)
            .ok_or(BridgeError::ViewNotFound(view_id))?;
        view.dispose();
        Ok(())
    }

    /// Unregisters and disposes the auxiliary view.
    pub fn dispose_auxiliary_view(&self) -> Result<(), BridgeError> {
        let view = self
            .views
            .unregister_auxiliary()
            .ok_or(BridgeError::AuxiliaryViewNotFound)?;
        view.dispose();
        Ok(())
    }

    /// Forwards a host lifecycle transition to the views.
    pub fn on_lifecycle(&self, event: LifecycleEvent) {
        self.views.dispatch_lifecycle(event);
    }

    /// Hands the host activity to the session manager.
    pub fn on_activity_created(&self, activity: &Arc<dyn HostActivity>) -> Result<(), BridgeError> {
        self.session.manager()?.on_activity_created(activity);
        Ok(())
    }

    /// Tells the session manager the host activity is gone.
    pub fn on_activity_destroyed(&self) {
        if let Some(manager) = self.session.get() {
            manager.on_activity_destroyed();
        }
    }

    /// Registered views.
    pub fn views(&self) -> &Arc<ViewRegistry> {
        &self.views
    }

    /// Registered images.
    pub fn image_registry(&self) -> &Arc<ImageRegistry> {
        &self.image_registry
    }

    /// Handler of calls addressed to views by id.
    pub fn view_handler(&self) -> &ViewMessageHandler {
        &self.view_handler
    }

    /// Handler of calls addressed to the auxiliary view.
    pub fn auto_view_handler(&self) -> &AutoViewMessageHandler {
        &self.auto_view_handler
    }

    /// Handler of calls addressed to the navigation session.
    pub fn session_handler(&self) -> &SessionMessageHandler {
        &self.session_handler
    }

    /// Handler of image registry calls.
    pub fn image_handler(&self) -> &ImageMessageHandler {
        &self.image_handler
    }
}
