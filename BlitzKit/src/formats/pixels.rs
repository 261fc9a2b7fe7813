//! Flat RGBA8 pixel buffer produced by the image decoders

use image::RgbaImage;

use crate::error::{Error, Result};

/// Channel value at or below which a pixel counts as black for masking
/// (1% of 255, rounded down).
pub const MASK_THRESHOLD: u8 = 2;

/// Decoded image: `width * height` RGBA8 pixels in scanline order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    /// A fully transparent black image.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wrap existing RGBA8 data.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if `pixels` is not `width * height * 4`
    /// bytes long.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::InvalidFormat(format!(
                "{width}x{height} image needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Number of pixels.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// RGBA of the pixel at `(x, y)`, if in bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.pixels[i..i + 4]);
        Some(rgba)
    }

    /// Write the pixel at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x < self.width && y < self.height {
            let i = self.offset(x, y);
            self.pixels[i..i + 4].copy_from_slice(&rgba);
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Make every pixel whose RGB channels are all at or below
    /// [`MASK_THRESHOLD`] fully transparent. Returns the number of pixels
    /// changed.
    pub fn apply_black_mask(&mut self) -> usize {
        let mut masked = 0;
        for px in self.pixels.chunks_exact_mut(4) {
            if px[..3].iter().all(|&c| c <= MASK_THRESHOLD) && px[3] != 0 {
                px[3] = 0;
                masked += 1;
            }
        }
        masked
    }

    /// True when any pixel is not fully opaque.
    #[must_use]
    pub fn has_transparency(&self) -> bool {
        self.pixels.chunks_exact(4).any(|px| px[3] != 255)
    }

    /// Convert into an `image` buffer for encoding.
    ///
    /// # Errors
    /// Returns [`Error::Image`] if the buffer length does not match the
    /// dimensions.
    pub fn into_rgba_image(self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels)
            .ok_or_else(|| Error::Image("pixel buffer does not match its dimensions".to_string()))
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            pixels: img.into_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_access() {
        let mut buf = PixelBuffer::new(2, 2);
        buf.set_pixel(1, 1, [1, 2, 3, 4]);
        buf.set_pixel(5, 0, [9, 9, 9, 9]);
        assert_eq!(buf.pixel(1, 1), Some([1, 2, 3, 4]));
        assert_eq!(buf.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(buf.pixel(2, 0), None);
        assert_eq!(buf.pixel_count(), 4);
    }

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(PixelBuffer::from_rgba(1, 1, vec![0; 4]).is_ok());
        assert!(matches!(
            PixelBuffer::from_rgba(2, 1, vec![0; 4]),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_black_mask_threshold() {
        let mut buf = PixelBuffer::from_rgba(
            3,
            1,
            vec![2, 2, 2, 255, 3, 0, 0, 255, 0, 0, 0, 255],
        )
        .unwrap();
        assert!(!buf.has_transparency());
        assert_eq!(buf.apply_black_mask(), 2);
        assert_eq!(buf.pixel(0, 0), Some([2, 2, 2, 0]));
        assert_eq!(buf.pixel(1, 0), Some([3, 0, 0, 255]));
        assert_eq!(buf.pixel(2, 0), Some([0, 0, 0, 0]));
        assert!(buf.has_transparency());
    }

    #[test]
    fn test_image_conversion() {
        let buf = PixelBuffer::from_rgba(1, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let img = buf.clone().into_rgba_image().unwrap();
        assert_eq!(img.get_pixel(0, 1).0, [5, 6, 7, 8]);
        assert_eq!(PixelBuffer::from(img), buf);
    }
}
