//! Synthetic image test fixtures for development and testing
//!
//! This module provides deterministic images with known properties,
//! allowing testing without committing binary image files to the repository.

use crate::pixels::PixelBuffer;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Cursor;

/// Generate an image where every pixel has the same RGBA value
///
/// # Example
/// ```
/// use astro_sonify::test_fixtures::uniform_image;
/// let gray = uniform_image(4, 2, [128, 128, 128, 255]);
/// assert_eq!(gray.pixel_count(), 8);
/// ```
pub fn uniform_image(width: u32, height: u32, rgba: [u8; 4]) -> PixelBuffer {
    let data = rgba.repeat(width as usize * height as usize);
    PixelBuffer::from_rgba(width, height, data).expect("fixture dimensions are valid")
}

/// Generate an opaque grayscale image from a per-pixel function of (x, y)
pub fn gray_image(width: u32, height: u32, value: impl Fn(usize, usize) -> u8) -> PixelBuffer {
    color_image(width, height, |x, y| {
        let v = value(x, y);
        [v, v, v]
    })
}

/// Generate an opaque RGB image from a per-pixel function of (x, y)
pub fn color_image(
    width: u32,
    height: u32,
    value: impl Fn(usize, usize) -> [u8; 3],
) -> PixelBuffer {
    let (w, h) = (width as usize, height as usize);
    let mut data = Vec::with_capacity(w * h * 4);
    for y in 0..h {
        for x in 0..w {
            let [r, g, b] = value(x, y);
            data.extend_from_slice(&[r, g, b, 255]);
        }
    }
    PixelBuffer::from_rgba(width, height, data).expect("fixture dimensions are valid")
}

/// Black sky with a compact star at each position
///
/// Each star is a 3x3 plus: 255 at the center, 150 on the 4-neighbors and
/// 80 on the diagonals. Positions must be at least one pixel from the edge.
pub fn starfield(width: u32, height: u32, stars: &[(usize, usize)]) -> PixelBuffer {
    gray_image(width, height, |x, y| {
        stars
            .iter()
            .map(|&(sx, sy)| match (x.abs_diff(sx), y.abs_diff(sy)) {
                (0, 0) => 255,
                (0, 1) | (1, 0) => 150,
                (1, 1) => 80,
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    })
}

/// Deterministic pseudo-random byte for pixel (x, y)
///
/// Same inputs always give the same value, for reproducible tests.
pub fn hash_noise(x: usize, y: usize, seed: u64) -> u8 {
    let mut hasher = DefaultHasher::new();
    (x, y, seed).hash(&mut hasher);
    (hasher.finish() % 256) as u8
}

/// A dim, noisy, strongly colored cloud on a black background
///
/// Centered in the frame with the given radius; useful for exercising the
/// diffuse-region path of deep-sky detection.
pub fn nebula_image(width: u32, height: u32, radius: usize) -> PixelBuffer {
    let center = (width as usize / 2, height as usize / 2);
    color_image(width, height, |x, y| {
        nebula_pixel(x, y, center, radius).unwrap_or([0, 0, 0])
    })
}

fn nebula_pixel(x: usize, y: usize, center: (usize, usize), radius: usize) -> Option<[u8; 3]> {
    let dx = x.abs_diff(center.0);
    let dy = y.abs_diff(center.1);
    if dx * dx + dy * dy > radius * radius {
        return None;
    }
    let n = hash_noise(x, y, 7) / 2;
    Some([120 + n, 20, 150 - n / 2])
}

const GALAXY_RIM: usize = 60;
const GALAXY_SLOPE: usize = 3;
const GALAXY_FALLOFF: usize = 18;

/// Gray level of a rectangular "roof" galaxy at (x, y)
///
/// Inside the rectangle the level rises by 3 per pixel of distance from the
/// rim (60), so every member keeps a nonzero gradient. Outside it drops by 18
/// per pixel, steep enough for elongated moments just off the rim yet gentle
/// enough that no pixel reads as a colorful nebula seed. Keep the shorter side
/// under 90 pixels so the ridge stays below 200.
fn galaxy_level(x: usize, y: usize, origin: (usize, usize), size: (usize, usize)) -> u8 {
    let (x0, y0) = origin;
    let (x1, y1) = (x0 + size.0 - 1, y0 + size.1 - 1);
    let (cx, cy) = (x.clamp(x0, x1), y.clamp(y0, y1));
    let outside = x.abs_diff(cx).max(y.abs_diff(cy));

    let level = if outside == 0 {
        let depth = (x - x0).min(x1 - x).min(y - y0).min(y1 - y);
        GALAXY_RIM + GALAXY_SLOPE * depth
    } else {
        GALAXY_RIM.saturating_sub(GALAXY_FALLOFF * outside)
    };
    level.min(199) as u8
}

/// Black sky holding a single elongated galaxy
///
/// The rectangle starts at `origin` and spans `size` pixels; it needs at
/// least four pixels of black margin on every side.
pub fn galaxy_image(
    width: u32,
    height: u32,
    origin: (usize, usize),
    size: (usize, usize),
) -> PixelBuffer {
    gray_image(width, height, |x, y| galaxy_level(x, y, origin, size))
}

/// Star positions in [`deep_sky_scene`]
pub const SCENE_STARS: [(usize, usize); 5] = [(10, 80), (40, 80), (80, 88), (150, 10), (150, 90)];

/// A 160x100 deep-sky frame with one of everything
///
/// Holds the five stars of [`SCENE_STARS`], a nebula of radius 20 centered at
/// (115, 50) and a 40x24 galaxy at (20, 20). The features sit far enough apart
/// that none of them touch.
pub fn deep_sky_scene() -> PixelBuffer {
    let stars = starfield(160, 100, &SCENE_STARS);
    color_image(160, 100, |x, y| {
        if let Some(rgb) = nebula_pixel(x, y, (115, 50), 20) {
            return rgb;
        }
        let v = galaxy_level(x, y, (20, 20), (40, 24)).max(stars.rgba(y * 160 + x)[0]);
        [v, v, v]
    })
}

/// Encode a buffer as PNG bytes
pub fn encode_png(pixels: &PixelBuffer) -> Vec<u8> {
    let image = pixels.to_image().expect("buffer matches its dimensions");
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("PNG encoding succeeds");
    bytes
}
