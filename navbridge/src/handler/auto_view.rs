use std::sync::Arc;

use navbridge_types::CameraUpdate;

use super::view::{apply, ViewCall, ViewReply};
use crate::error::BridgeError;
use crate::native::AnimationCallback;
use crate::view::{MapReadyCallback, MapViewController, ViewRegistry};

/// Routes host calls to the auxiliary display view.
///
/// Accepts the same calls as [`ViewMessageHandler`](super::ViewMessageHandler), but the target is
/// the single auxiliary view instead of a view looked up by id.
pub struct AutoViewMessageHandler {
    views: Arc<ViewRegistry>,
}

impl AutoViewMessageHandler {
    /// Creates a handler resolving the auxiliary view of `views`.
    pub fn new(views: Arc<ViewRegistry>) -> Self {
        Self { views }
    }

    /// The auxiliary view, or [`BridgeError::AuxiliaryViewNotFound`].
    pub fn view(&self) -> Result<Arc<MapViewController>, BridgeError> {
        self.views
            .auxiliary()
            .ok_or(BridgeError::AuxiliaryViewNotFound)
    }

    /// Returns true while an auxiliary display is connected.
    pub fn is_auto_screen_available(&self) -> bool {
        self.views.auxiliary().is_some()
    }

    /// Executes `call` on the auxiliary view.
    pub fn handle(&self, call: ViewCall) -> Result<ViewReply, BridgeError> {
        let view = self.view()?;
        apply(&view, call)
    }

    /// Calls `callback` once the auxiliary view is ready.
    pub fn await_map_ready(&self, callback: MapReadyCallback) -> Result<(), BridgeError> {
        self.view()?.await_map_ready(callback)
    }

    /// Animates the camera of the auxiliary view.
    pub fn animate_camera(
        &self,
        update: &CameraUpdate,
        duration_ms: Option<u64>,
        callback: AnimationCallback,
    ) -> Result<(), BridgeError> {
        self.view()?.animate_camera(update, duration_ms, callback)
    }
}
