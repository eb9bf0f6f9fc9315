//! Decoding encoded image bytes into a fixed RGBA pixel buffer.

use crate::error::{DecodeError, DimensionError, Result};
use image::imageops::FilterType;
use image::RgbaImage;

/// Default cap on either image dimension before downsampling.
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

/// Immutable row-major RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw interleaved RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionError::ZeroArea`] if either dimension is zero and
    /// [`DimensionError::LengthMismatch`] if `data` is not `width * height * 4` bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DimensionError> {
        if width == 0 || height == 0 {
            return Err(DimensionError::ZeroArea { width, height });
        }

        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(DimensionError::LengthMismatch {
                expected,
                found: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.data
    }

    /// RGBA channels of the pixel at flat index `idx` (`y * width + x`).
    #[inline]
    pub fn rgba(&self, idx: usize) -> [u8; 4] {
        let o = idx * 4;
        [
            self.data[o],
            self.data[o + 1],
            self.data[o + 2],
            self.data[o + 3],
        ]
    }

    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
    }
}

/// Perceptual luminance of an 8-bit RGB triple.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Decode `bytes` into a [`PixelBuffer`], downsampling so that neither side
/// exceeds `max_dimension`.
///
/// # Errors
///
/// Returns [`DecodeError`] for empty or undecodable input and
/// [`DimensionError::ZeroArea`] if the decoded image has no pixels.
pub fn load_pixels(bytes: &[u8], max_dimension: u32) -> Result<PixelBuffer> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyInput.into());
    }

    let decoded =
        image::load_from_memory(bytes).map_err(|source| DecodeError::Malformed { source })?;
    let mut rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    if width == 0 || height == 0 {
        return Err(DimensionError::ZeroArea { width, height }.into());
    }

    let (target_w, target_h) = fit_within(width, height, max_dimension);
    let resampled = (target_w, target_h) != (width, height);
    if resampled {
        rgba = image::imageops::resize(&rgba, target_w, target_h, FilterType::Triangle);
    }

    tracing::info!(
        width = target_w,
        height = target_h,
        source_width = width,
        source_height = height,
        resampled,
        "Decoded image"
    );

    let (w, h) = rgba.dimensions();
    Ok(PixelBuffer::from_rgba(w, h, rgba.into_raw())?)
}

/// Scale `(width, height)` proportionally so the larger side equals `cap`
/// when either side exceeds it.
pub fn fit_within(width: u32, height: u32, cap: u32) -> (u32, u32) {
    if width <= cap && height <= cap {
        return (width, height);
    }

    if width >= height {
        let h = (height as f64 * cap as f64 / width as f64).round() as u32;
        (cap, h.max(1))
    } else {
        let w = (width as f64 * cap as f64 / height as f64).round() as u32;
        (w.max(1), cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{encode_png, uniform_image};

    #[test]
    fn test_fit_within_small_image_unchanged() {
        assert_eq!(fit_within(640, 480, 2048), (640, 480));
        assert_eq!(fit_within(2048, 2048, 2048), (2048, 2048));
    }

    #[test]
    fn test_fit_within_landscape() {
        assert_eq!(fit_within(4096, 2048, 2048), (2048, 1024));
    }

    #[test]
    fn test_fit_within_portrait() {
        assert_eq!(fit_within(1000, 3000, 1500), (500, 1500));
    }

    #[test]
    fn test_fit_within_never_zero() {
        assert_eq!(fit_within(10_000, 1, 100), (100, 1));
    }

    #[test]
    fn test_from_rgba_zero_area() {
        let err = PixelBuffer::from_rgba(0, 4, Vec::new()).unwrap_err();
        assert_eq!(
            err,
            DimensionError::ZeroArea {
                width: 0,
                height: 4
            }
        );
    }

    #[test]
    fn test_from_rgba_length_mismatch() {
        let err = PixelBuffer::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, DimensionError::LengthMismatch { expected: 16, found: 15 }));
    }

    #[test]
    fn test_load_png() {
        let source = uniform_image(16, 8, [10, 20, 30, 255]);
        let bytes = encode_png(&source);

        let loaded = load_pixels(&bytes, DEFAULT_MAX_DIMENSION).expect("PNG should decode");
        assert_eq!(loaded, source);
    }

    #[test]
    fn test_load_downsamples_large_image() {
        let source = uniform_image(64, 32, [200, 200, 200, 255]);
        let bytes = encode_png(&source);

        let loaded = load_pixels(&bytes, 16).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (16, 8));
        assert_eq!(loaded.as_rgba().len(), 16 * 8 * 4);
        // Resampling a flat field keeps it flat
        let [r, g, b, _] = loaded.rgba(0);
        for channel in [r, g, b] {
            assert!((199..=201).contains(&channel));
        }
    }

    #[test]
    fn test_load_garbage_is_decode_error() {
        let err = load_pixels(b"definitely not an image", 2048).unwrap_err();
        assert!(err.is_recoverable());

        let err = load_pixels(&[], 2048).unwrap_err();
        assert!(matches!(
            err,
            crate::error::SonifyError::Decode(DecodeError::EmptyInput)
        ));
    }

    #[test]
    fn test_luminance_weights() {
        assert_eq!(luminance(0, 0, 0), 0.0);
        assert!((luminance(255, 255, 255) - 255.0).abs() < 1e-3);
        assert!((luminance(100, 0, 0) - 29.9).abs() < 1e-4);
    }
}
