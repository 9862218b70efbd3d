use std::sync::Arc;

use navbridge_types::{ImageDescriptor, RegisteredImageType};

use crate::error::BridgeError;
use crate::image_registry::ImageRegistry;

/// Host calls managing registered images.
pub struct ImageMessageHandler {
    registry: Arc<ImageRegistry>,
}

impl ImageMessageHandler {
    /// Creates a handler for `registry`.
    pub fn new(registry: Arc<ImageRegistry>) -> Self {
        Self { registry }
    }

    /// Decodes and registers an encoded bitmap. See [`ImageRegistry::register_bitmap_image`].
    pub fn register_bitmap_image(
        &self,
        image_id: &str,
        bytes: &[u8],
        image_pixel_ratio: f64,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<ImageDescriptor, BridgeError> {
        self.registry.register_bitmap_image(image_id, bytes, image_pixel_ratio, width, height)
    }

    /// Removes the image the descriptor refers to.
    pub fn unregister_image(&self, descriptor: &ImageDescriptor) {
        if let Some(id) = &descriptor.registered_image_id {
            self.registry.unregister_image(id);
        }
    }

    /// Descriptors of every registered image.
    pub fn registered_images(&self) -> Vec<ImageDescriptor> {
        self.registry.registered_images()
    }

    /// Removes every image, or only images of the given type.
    pub fn clear_registered_images(&self, filter: Option<RegisteredImageType>) {
        self.registry.clear(filter);
    }

    /// PNG bytes of the image the descriptor refers to.
    pub fn registered_image_data(
        &self,
        descriptor: &ImageDescriptor,
    ) -> Result<Option<Vec<u8>>, BridgeError> {
        match &descriptor.registered_image_id {
            Some(id) => self.registry.registered_image_data(id),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoded_image::DecodedImage;
    use crate::tests::init_logger;

    fn handler() -> ImageMessageHandler {
        init_logger();
        ImageMessageHandler::new(Arc::new(ImageRegistry::new(1.0)))
    }

    fn bitmap() -> DecodedImage {
        DecodedImage::from_rgba(2, 2, vec![64; 16]).expect("valid buffer")
    }

    #[test]
    fn default_descriptor_has_no_data() {
        let handler = handler();
        handler.unregister_image(&ImageDescriptor::default());

        assert!(handler
            .registered_image_data(&ImageDescriptor::default())
            .expect("no error")
            .is_none());
    }

    #[test]
    fn images_are_unregistered_by_descriptor() {
        let handler = handler();
        let lane = handler
            .registry
            .register_lane_image("lane", bitmap(), 1.0)
            .expect("registration failed");
        let turn = handler
            .registry
            .register_maneuver_image("turn", bitmap(), 1.0)
            .expect("registration failed");
        assert_eq!(handler.registered_images().len(), 2);

        handler.unregister_image(&lane);
        let remaining = handler.registered_images();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].registered_image_id, turn.registered_image_id);

        handler.clear_registered_images(Some(RegisteredImageType::Maneuver));
        assert!(handler.registered_images().is_empty());
    }

    #[cfg(feature = "image")]
    #[test]
    fn registered_bitmap_can_be_read_back() {
        let handler = handler();
        let png = bitmap().encode_png().expect("encoding failed");
        let descriptor = handler
            .register_bitmap_image("pin", &png, 1.0, Some(4.0), None)
            .expect("registration failed");

        let data = handler
            .registered_image_data(&descriptor)
            .expect("encoding failed")
            .expect("image exists");
        let decoded = DecodedImage::new(&data).expect("valid png");
        assert_eq!((decoded.width(), decoded.height()), (4, 4));
    }
}
