use navbridge_types::{
    CircleDto, CircleOptions, PolygonDto, PolygonOptions, PolylineDto, PolylineOptions,
};

use super::OverlayController;
use crate::error::BridgeError;
use crate::native::{NativeOverlay, OverlayHandle};

/// Controls a single native polygon, polyline or circle.
///
/// Unlike markers, these overlays report every option back, so nothing is stored besides the
/// logical id.
pub(crate) struct ShapeController<O> {
    id: String,
    native: Box<dyn NativeOverlay<O>>,
}

impl<O> ShapeController<O> {
    pub(crate) fn new(id: String, native: Box<dyn NativeOverlay<O>>) -> Self {
        Self { id, native }
    }

    pub(crate) fn update(&self, options: &O) {
        self.native.set_options(options);
    }

    pub(crate) fn options(&self) -> O {
        self.native.state()
    }
}

impl<O> OverlayController for ShapeController<O> {
    fn id(&self) -> &str {
        &self.id
    }

    fn handle(&self) -> OverlayHandle {
        self.native.handle()
    }

    fn remove(&self) {
        self.native.remove();
    }
}

/// Id-tagged host value of a shape overlay.
pub(crate) trait ShapeDto: Sized {
    type Options;

    fn new(id: String, options: Self::Options) -> Self;
    fn id(&self) -> &str;
    fn options(&self) -> &Self::Options;
    /// Error reported when some ids of a batch were not found.
    fn not_found(ids: Vec<String>) -> BridgeError;
}

impl ShapeDto for PolygonDto {
    type Options = PolygonOptions;

    fn new(id: String, options: PolygonOptions) -> Self {
        PolygonDto::new(id, options)
    }

    fn id(&self) -> &str {
        &self.polygon_id
    }

    fn options(&self) -> &PolygonOptions {
        &self.options
    }

    fn not_found(ids: Vec<String>) -> BridgeError {
        BridgeError::PolygonsNotFound(ids)
    }
}

impl ShapeDto for PolylineDto {
    type Options = PolylineOptions;

    fn new(id: String, options: PolylineOptions) -> Self {
        PolylineDto::new(id, options)
    }

    fn id(&self) -> &str {
        &self.polyline_id
    }

    fn options(&self) -> &PolylineOptions {
        &self.options
    }

    fn not_found(ids: Vec<String>) -> BridgeError {
        BridgeError::PolylinesNotFound(ids)
    }
}

impl ShapeDto for CircleDto {
    type Options = CircleOptions;

    fn new(id: String, options: CircleOptions) -> Self {
        CircleDto::new(id, options)
    }

    fn id(&self) -> &str {
        &self.circle_id
    }

    fn options(&self) -> &CircleOptions {
        &self.options
    }

    fn not_found(ids: Vec<String>) -> BridgeError {
        BridgeError::CirclesNotFound(ids)
    }
}
