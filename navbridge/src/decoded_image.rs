//! Bitmaps handed to the native engine as marker and navigation icons.

use crate::error::BridgeError;

/// An image that has been loaded into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    /// Raw bytes of the image, in RGBA order.
    pub(crate) bytes: Vec<u8>,
    /// Width and height of the image.
    pub(crate) dimensions: (u32, u32),
}

impl DecodedImage {
    /// Decode an image from a byte slice.
    ///
    /// Attempts to guess the format of the image from the data. Non-RGBA images
    /// will be converted to RGBA.
    #[cfg(feature = "image")]
    pub fn new(bytes: &[u8]) -> Result<Self, BridgeError> {
        use image::GenericImageView;
        let decoded = image::load_from_memory(bytes)?;
        let bytes = decoded.to_rgba8();
        let dimensions = decoded.dimensions();

        Ok(Self {
            bytes: bytes.into_vec(),
            dimensions,
        })
    }

    /// Image decoding is not compiled in, always fails.
    #[cfg(not(feature = "image"))]
    pub fn new(_bytes: &[u8]) -> Result<Self, BridgeError> {
        Err(BridgeError::ImageDecode)
    }

    /// Wraps already decoded RGBA pixels. Returns `None` if the buffer length does not match
    /// the dimensions.
    pub fn from_rgba(width: u32, height: u32, bytes: Vec<u8>) -> Option<Self> {
        if bytes.len() != width as usize * height as usize * 4 {
            return None;
        }

        Some(Self {
            bytes,
            dimensions: (width, height),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    /// RGBA pixel data.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns a copy scaled to the given size. Zero sizes are raised to one pixel.
    #[cfg(feature = "image")]
    pub fn resized(&self, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        if (width, height) == self.dimensions {
            return self.clone();
        }

        let Some(source) =
            image::RgbaImage::from_raw(self.width(), self.height(), self.bytes.clone())
        else {
            return self.clone();
        };

        let scaled =
            image::imageops::resize(&source, width, height, image::imageops::FilterType::Triangle);

        Self {
            bytes: scaled.into_raw(),
            dimensions: (width, height),
        }
    }

    /// Without the `image` feature the image is returned as is.
    #[cfg(not(feature = "image"))]
    pub fn resized(&self, _width: u32, _height: u32) -> Self {
        self.clone()
    }

    /// Encodes the image as PNG.
    #[cfg(feature = "image")]
    pub fn encode_png(&self) -> Result<Vec<u8>, BridgeError> {
        use image::ImageEncoder;

        let mut buffer = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buffer).write_image(
            &self.bytes,
            self.width(),
            self.height(),
            image::ColorType::Rgba8,
        )?;

        Ok(buffer)
    }

    /// PNG encoding is not compiled in, always fails.
    #[cfg(not(feature = "image"))]
    pub fn encode_png(&self) -> Result<Vec<u8>, BridgeError> {
        Err(BridgeError::ImageDecode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_checks_buffer_length() {
        assert!(DecodedImage::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(DecodedImage::from_rgba(2, 2, vec![0; 15]).is_none());
    }

    #[cfg(feature = "image")]
    #[test]
    fn png_round_trip_keeps_dimensions() {
        let image = DecodedImage::from_rgba(3, 2, vec![255; 24]).expect("valid buffer");
        let png = image.encode_png().expect("encoding failed");
        let decoded = DecodedImage::new(&png).expect("decoding failed");

        assert_eq!(decoded.dimensions, (3, 2));
        assert_eq!(decoded.resized(6, 4).dimensions, (6, 4));
    }
}
