use navbridge_types::{Anchor, ImageDescriptor, InfoWindow, MarkerDto, MarkerOptions};

use super::OverlayController;
use crate::native::{IconHandle, NativeMarker, NativeMarkerOptions, OverlayHandle};

/// Controls a single native marker.
///
/// Anchors, the tap consumption flag and the icon descriptor cannot be read back from a
/// native marker, so they are kept here.
pub(crate) struct MarkerController {
    marker_id: String,
    marker: NativeMarker,
    consume_tap_events: bool,
    anchor: Anchor,
    info_window_anchor: Anchor,
    icon: ImageDescriptor,
}

impl MarkerController {
    pub(crate) fn new(marker_id: String, marker: NativeMarker, options: &MarkerOptions) -> Self {
        Self {
            marker_id,
            marker,
            consume_tap_events: options.consume_tap_events,
            anchor: options.anchor,
            info_window_anchor: options.info_window.anchor,
            icon: options.icon.clone(),
        }
    }

    /// Applies new options to the native marker in place.
    pub(crate) fn update(&mut self, options: &MarkerOptions, icon: Option<IconHandle>) {
        self.consume_tap_events = options.consume_tap_events;
        self.anchor = options.anchor;
        self.info_window_anchor = options.info_window.anchor;
        self.icon = options.icon.clone();
        self.marker.set_options(&NativeMarkerOptions::from_options(options, icon));
    }

    pub(crate) fn consume_tap_events(&self) -> bool {
        self.consume_tap_events
    }

    /// Current marker state as seen by the host.
    pub(crate) fn to_dto(&self) -> MarkerDto {
        let state = self.marker.state();
        MarkerDto::new(
            self.marker_id.clone(),
            MarkerOptions {
                position: state.position,
                alpha: state.alpha,
                anchor: self.anchor,
                draggable: state.draggable,
                flat: state.flat,
                consume_tap_events: self.consume_tap_events,
                rotation: state.rotation,
                info_window: InfoWindow {
                    title: state.title,
                    snippet: state.snippet,
                    anchor: self.info_window_anchor,
                },
                visible: state.visible,
                z_index: state.z_index,
                icon: self.icon.clone(),
                cluster_manager_id: None,
            },
        )
    }
}

impl OverlayController for MarkerController {
    fn id(&self) -> &str {
        &self.marker_id
    }

    fn handle(&self) -> OverlayHandle {
        self.marker.handle()
    }

    fn remove(&self) {
        self.marker.remove();
    }
}
