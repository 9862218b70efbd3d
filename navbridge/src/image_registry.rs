//! Registry of bitmaps used as marker and navigation icons.

use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, error, warn};
use navbridge_types::{ImageDescriptor, RegisteredImageType};
use parking_lot::RwLock;

use crate::decoded_image::DecodedImage;
use crate::error::BridgeError;
use crate::native::{IconFactory, IconHandle};

/// Largest side of a registered icon, in physical pixels.
pub const MAX_ICON_SIZE: f64 = 4096.0;

/// An image with a native icon created for it.
#[derive(Debug, Clone)]
pub struct RegisteredImage {
    id: String,
    icon: IconHandle,
    bitmap: DecodedImage,
    image_pixel_ratio: f64,
    width: Option<f64>,
    height: Option<f64>,
    image_type: RegisteredImageType,
}

impl RegisteredImage {
    /// Logical id of the image.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Native icon.
    pub fn icon(&self) -> IconHandle {
        self.icon
    }

    /// Scaled bitmap the icon was created from.
    pub fn bitmap(&self) -> &DecodedImage {
        &self.bitmap
    }

    /// Descriptor referencing this image.
    pub fn descriptor(&self) -> ImageDescriptor {
        ImageDescriptor {
            registered_image_id: Some(self.id.clone()),
            image_pixel_ratio: self.image_pixel_ratio,
            width: self.width,
            height: self.height,
            image_type: self.image_type,
        }
    }
}

#[derive(Debug, Clone)]
struct QueuedImage {
    id: String,
    bitmap: DecodedImage,
    image_pixel_ratio: f64,
    width: Option<f64>,
    height: Option<f64>,
    image_type: RegisteredImageType,
}

#[derive(Default)]
struct RegistryState {
    images: AHashMap<String, RegisteredImage>,
    queue: Vec<QueuedImage>,
    icon_factory: Option<Arc<dyn IconFactory>>,
}

/// Owns registered icons keyed by id.
///
/// Native icons can only be created once at least one map surface finished initialization.
/// Until then registered bitmaps are queued and materialized by
/// [`ImageRegistry::map_view_initialization_complete`]. Queued images resolve to the default
/// icon.
pub struct ImageRegistry {
    display_density: f64,
    state: RwLock<RegistryState>,
}

impl ImageRegistry {
    /// Creates an empty registry. `display_density` is the ratio of physical to logical
    /// pixels of the display.
    pub fn new(display_density: f64) -> Self {
        Self {
            display_density,
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Returns true once a surface provided an icon factory.
    pub fn is_initialized(&self) -> bool {
        self.state.read().icon_factory.is_some()
    }

    /// Called by every view when its surface becomes ready. The first call materializes the
    /// queued images, later calls are no-ops.
    pub fn map_view_initialization_complete(&self, factory: Arc<dyn IconFactory>) {
        let mut state = self.state.write();
        if state.icon_factory.is_some() {
            return;
        }

        let queue = std::mem::take(&mut state.queue);
        debug!("Image registry initialized, materializing {} queued images", queue.len());

        for queued in queue {
            match factory.create_icon(&queued.bitmap) {
                Ok(icon) => {
                    state
                        .images
                        .insert(queued.id.clone(), Self::registered(queued, icon));
                }
                Err(message) => error!("Failed to create icon for image {}: {message}", queued.id),
            }
        }

        state.icon_factory = Some(factory);
    }

    /// Decodes and registers a bitmap.
    ///
    /// The bitmap is scaled before registration: an explicit width and height win, a single
    /// dimension keeps the aspect ratio, and without either the size is the pixel size divided
    /// by `image_pixel_ratio`. The result is multiplied by the display density.
    ///
    /// Fails with [`BridgeError::InvalidArgument`] for a pixel ratio that is not a positive
    /// number, and with [`BridgeError::InvalidImageSize`] when the scaled bitmap would be empty
    /// or larger than [`MAX_ICON_SIZE`] on either side.
    pub fn register_bitmap_image(
        &self,
        image_id: &str,
        bytes: &[u8],
        image_pixel_ratio: f64,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<ImageDescriptor, BridgeError> {
        let descriptor = ImageDescriptor::registered(
            image_id,
            image_pixel_ratio,
            width,
            height,
            RegisteredImageType::Regular,
        )?;

        let decoded = DecodedImage::new(bytes)?;
        let (scaled_width, scaled_height) = scaled_size(
            (decoded.width(), decoded.height()),
            image_pixel_ratio,
            self.display_density,
            width,
            height,
        )?;
        let bitmap = decoded.resized(scaled_width, scaled_height);

        self.insert(
            QueuedImage {
                id: image_id.to_string(),
                bitmap,
                image_pixel_ratio,
                width,
                height,
                image_type: RegisteredImageType::Regular,
            },
            descriptor,
        )
    }

    /// Registers an already decoded maneuver icon.
    pub fn register_maneuver_image(
        &self,
        image_id: &str,
        bitmap: DecodedImage,
        image_pixel_ratio: f64,
    ) -> Result<ImageDescriptor, BridgeError> {
        let image_type = RegisteredImageType::Maneuver;
        let descriptor =
            ImageDescriptor::registered(image_id, image_pixel_ratio, None, None, image_type)?;

        self.insert(
            QueuedImage {
                id: image_id.to_string(),
                bitmap,
                image_pixel_ratio,
                width: None,
                height: None,
                image_type,
            },
            descriptor,
        )
    }

    /// Registers an already decoded lane guidance image.
    pub fn register_lane_image(
        &self,
        image_id: &str,
        bitmap: DecodedImage,
        image_pixel_ratio: f64,
    ) -> Result<ImageDescriptor, BridgeError> {
        let image_type = RegisteredImageType::Lane;
        let descriptor =
            ImageDescriptor::registered(image_id, image_pixel_ratio, None, None, image_type)?;

        self.insert(
            QueuedImage {
                id: image_id.to_string(),
                bitmap,
                image_pixel_ratio,
                width: None,
                height: None,
                image_type,
            },
            descriptor,
        )
    }

    fn insert(
        &self,
        image: QueuedImage,
        descriptor: ImageDescriptor,
    ) -> Result<ImageDescriptor, BridgeError> {
        let mut state = self.state.write();
        state.queue.retain(|queued| queued.id != image.id);

        match state.icon_factory.clone() {
            Some(factory) => {
                let icon = factory
                    .create_icon(&image.bitmap)
                    .map_err(BridgeError::IconCreation)?;
                state
                    .images
                    .insert(image.id.clone(), Self::registered(image, icon));
            }
            None => {
                debug!("No map surface initialized yet, queueing image {}", image.id);
                state.queue.push(image);
            }
        }

        Ok(descriptor)
    }

    fn registered(image: QueuedImage, icon: IconHandle) -> RegisteredImage {
        RegisteredImage {
            id: image.id,
            icon,
            bitmap: image.bitmap,
            image_pixel_ratio: image.image_pixel_ratio,
            width: image.width,
            height: image.height,
            image_type: image.image_type,
        }
    }

    /// Returns the registered image with the given id.
    pub fn find_registered_image(&self, image_id: &str) -> Option<RegisteredImage> {
        self.state.read().images.get(image_id).cloned()
    }

    /// Resolves a descriptor to a native icon. `None` stands for the default icon.
    pub fn icon_for(&self, descriptor: &ImageDescriptor) -> Option<IconHandle> {
        let id = descriptor.registered_image_id.as_deref()?;
        let state = self.state.read();
        match state.images.get(id) {
            Some(image) => Some(image.icon),
            None => {
                warn!("Image {id} is not materialized, falling back to the default icon");
                None
            }
        }
    }

    /// Descriptors of every registered and queued image.
    pub fn registered_images(&self) -> Vec<ImageDescriptor> {
        let state = self.state.read();
        state
            .images
            .values()
            .map(RegisteredImage::descriptor)
            .chain(state.queue.iter().map(|queued| ImageDescriptor {
                registered_image_id: Some(queued.id.clone()),
                image_pixel_ratio: queued.image_pixel_ratio,
                width: queued.width,
                height: queued.height,
                image_type: queued.image_type,
            }))
            .collect()
    }

    /// Removes an image. Unknown ids are ignored.
    pub fn unregister_image(&self, image_id: &str) {
        let mut state = self.state.write();
        state.images.remove(image_id);
        state.queue.retain(|queued| queued.id != image_id);
    }

    /// Removes every image, or only images of the given type.
    pub fn clear(&self, filter: Option<RegisteredImageType>) {
        let mut state = self.state.write();
        match filter {
            None => {
                state.images.clear();
                state.queue.clear();
            }
            Some(image_type) => {
                state.images.retain(|_, image| image.image_type != image_type);
                state.queue.retain(|queued| queued.image_type != image_type);
            }
        }
    }

    /// PNG encoded bitmap of the image, or `None` if no such image is registered.
    pub fn registered_image_data(&self, image_id: &str) -> Result<Option<Vec<u8>>, BridgeError> {
        let bitmap = {
            let state = self.state.read();
            state
                .images
                .get(image_id)
                .map(|image| image.bitmap.clone())
                .or_else(|| {
                    state
                        .queue
                        .iter()
                        .find(|queued| queued.id == image_id)
                        .map(|queued| queued.bitmap.clone())
                })
        };

        bitmap.map(|bitmap| bitmap.encode_png()).transpose()
    }
}

fn scaled_size(
    (pixel_width, pixel_height): (u32, u32),
    image_pixel_ratio: f64,
    density: f64,
    width: Option<f64>,
    height: Option<f64>,
) -> Result<(u32, u32), BridgeError> {
    let pixel_width = pixel_width as f64;
    let pixel_height = pixel_height as f64;

    let (logical_width, logical_height) = match (width, height) {
        (Some(width), Some(height)) => (width, height),
        (Some(width), None) => (width, width / pixel_width * pixel_height),
        (None, Some(height)) => (height / pixel_height * pixel_width, height),
        (None, None) => (
            pixel_width / image_pixel_ratio,
            pixel_height / image_pixel_ratio,
        ),
    };

    let scaled_width = logical_width * density;
    let scaled_height = logical_height * density;
    let in_range = |size: f64| size.is_finite() && size > 0.0 && size <= MAX_ICON_SIZE;
    if !(in_range(scaled_width) && in_range(scaled_height)) {
        return Err(BridgeError::InvalidImageSize {
            width: scaled_width,
            height: scaled_height,
        });
    }

    Ok(((scaled_width as u32).max(1), (scaled_height as u32).max(1)))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use navbridge_types::NavbridgeTypesError;

    use super::*;
    use crate::tests::{init_logger, MockIconFactory};

    fn bitmap() -> DecodedImage {
        DecodedImage::from_rgba(4, 2, vec![128; 32]).expect("valid buffer")
    }

    #[test]
    fn scaled_size_rules() {
        assert_eq!(scaled_size((100, 50), 2.0, 1.0, None, None).ok(), Some((50, 25)));
        assert_eq!(scaled_size((100, 50), 1.0, 2.0, Some(40.0), None).ok(), Some((80, 40)));
        assert_eq!(scaled_size((100, 50), 1.0, 1.0, None, Some(10.0)).ok(), Some((20, 10)));
        assert_eq!(
            scaled_size((100, 50), 3.0, 1.5, Some(10.0), Some(10.0)).ok(),
            Some((15, 15))
        );
        assert_eq!(scaled_size((100, 50), 1.0, 1.0, Some(0.5), None).ok(), Some((1, 1)));
    }

    #[test]
    fn scaled_size_rejects_degenerate_targets() {
        assert_matches!(
            scaled_size((100, 50), 1.0, 1.0, Some(1e9), None),
            Err(BridgeError::InvalidImageSize { .. })
        );
        assert_matches!(
            scaled_size((100, 50), 1.0, 1.0, Some(-4.0), Some(4.0)),
            Err(BridgeError::InvalidImageSize { .. })
        );
        assert_matches!(
            scaled_size((100, 50), 1.0, f64::NAN, None, None),
            Err(BridgeError::InvalidImageSize { .. })
        );
        assert_matches!(
            scaled_size((100, 50), 1.0, 1.0, Some(0.0), None),
            Err(BridgeError::InvalidImageSize { .. })
        );
    }

    #[test]
    fn invalid_pixel_ratio_is_rejected() {
        let registry = ImageRegistry::new(1.0);
        for ratio in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert_matches!(
                registry.register_lane_image("lane", bitmap(), ratio),
                Err(BridgeError::InvalidArgument(NavbridgeTypesError::InvalidPixelRatio(_)))
            );
        }

        assert!(registry.registered_images().is_empty());
    }

    #[test]
    fn images_are_queued_until_surface_is_ready() {
        init_logger();
        let registry = ImageRegistry::new(1.0);
        let descriptor = registry
            .register_maneuver_image("turn", bitmap(), 1.0)
            .expect("registration failed");

        assert_eq!(descriptor.image_type, RegisteredImageType::Maneuver);
        assert!(registry.find_registered_image("turn").is_none());
        assert!(registry.icon_for(&descriptor).is_none());
        assert_eq!(registry.registered_images().len(), 1);

        let factory = Arc::new(MockIconFactory::default());
        registry.map_view_initialization_complete(factory.clone());

        assert!(registry.is_initialized());
        assert!(registry.icon_for(&descriptor).is_some());
        assert_eq!(factory.created(), 1);

        registry.map_view_initialization_complete(factory.clone());
        assert_eq!(factory.created(), 1);
    }

    #[test]
    fn registration_after_initialization_creates_icon_immediately() {
        let registry = ImageRegistry::new(1.0);
        let factory = Arc::new(MockIconFactory::default());
        registry.map_view_initialization_complete(factory.clone());

        registry
            .register_lane_image("lane", bitmap(), 1.0)
            .expect("registration failed");

        assert_eq!(factory.created(), 1);
        assert_eq!(
            registry
                .find_registered_image("lane")
                .expect("image is registered")
                .bitmap()
                .width(),
            4
        );
    }

    #[test]
    fn clear_with_filter_keeps_other_types() {
        let registry = ImageRegistry::new(1.0);
        registry.map_view_initialization_complete(Arc::new(MockIconFactory::default()));
        registry
            .register_lane_image("lane", bitmap(), 1.0)
            .expect("registration failed");
        registry
            .register_maneuver_image("turn", bitmap(), 1.0)
            .expect("registration failed");

        registry.clear(Some(RegisteredImageType::Lane));
        assert!(registry.find_registered_image("lane").is_none());
        assert!(registry.find_registered_image("turn").is_some());

        registry.clear(None);
        assert!(registry.registered_images().is_empty());
    }

    #[test]
    fn unregister_removes_queued_image() {
        let registry = ImageRegistry::new(1.0);
        registry
            .register_lane_image("lane", bitmap(), 1.0)
            .expect("registration failed");
        registry.unregister_image("lane");

        registry.map_view_initialization_complete(Arc::new(MockIconFactory::default()));
        assert!(registry.find_registered_image("lane").is_none());
    }

    #[test]
    fn icon_creation_failure_is_reported() {
        let registry = ImageRegistry::new(1.0);
        registry.map_view_initialization_complete(Arc::new(MockIconFactory::failing()));

        assert_matches!(
            registry.register_lane_image("lane", bitmap(), 1.0),
            Err(BridgeError::IconCreation(_))
        );
    }

    #[cfg(feature = "image")]
    #[test]
    fn bitmap_registration_decodes_and_scales() {
        let png = DecodedImage::from_rgba(8, 4, vec![255; 128])
            .expect("valid buffer")
            .encode_png()
            .expect("encoding failed");

        let registry = ImageRegistry::new(2.0);
        registry.map_view_initialization_complete(Arc::new(MockIconFactory::default()));
        let descriptor = registry
            .register_bitmap_image("pin", &png, 2.0, None, None)
            .expect("registration failed");

        assert_eq!(descriptor.registered_image_id.as_deref(), Some("pin"));
        let image = registry.find_registered_image("pin").expect("registered");
        assert_eq!((image.bitmap().width(), image.bitmap().height()), (8, 4));

        let data = registry
            .registered_image_data("pin")
            .expect("encoding failed")
            .expect("image exists");
        assert_eq!(DecodedImage::new(&data).expect("valid png").width(), 8);
        assert!(registry
            .registered_image_data("missing")
            .expect("no error")
            .is_none());
    }

    #[cfg(feature = "image")]
    #[test]
    fn bitmap_with_unusable_scale_is_not_registered() {
        let png = DecodedImage::from_rgba(8, 4, vec![255; 128])
            .expect("valid buffer")
            .encode_png()
            .expect("encoding failed");

        let registry = ImageRegistry::new(1.0);
        registry.map_view_initialization_complete(Arc::new(MockIconFactory::default()));

        assert_matches!(
            registry.register_bitmap_image("pin", &png, 0.0, None, None),
            Err(BridgeError::InvalidArgument(NavbridgeTypesError::InvalidPixelRatio(_)))
        );
        assert_matches!(
            registry.register_bitmap_image("pin", &png, 1.0, Some(1e12), Some(1e12)),
            Err(BridgeError::InvalidImageSize { .. })
        );
        assert!(registry.find_registered_image("pin").is_none());
    }

    #[cfg(feature = "image")]
    #[test]
    fn invalid_bytes_fail_to_decode() {
        let registry = ImageRegistry::new(1.0);
        let result = registry.register_bitmap_image("bad", &[1, 2, 3], 1.0, None, None);
        assert_matches!(result, Err(ref error) if error.code() == "imageDecodingFailed");
    }
}
