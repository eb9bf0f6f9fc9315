//! Global luminance statistics and the per-pixel maps shared by every detector.
//!
//! All maps are flat `Vec<f32>` indexed by `y * width + x`. Border pixels that
//! lack a full neighborhood hold `0.0`. Maps are filled row-parallel; every
//! cell depends only on its own neighborhood so results do not depend on the
//! thread count.

use crate::pixels::{luminance, PixelBuffer};
use rayon::prelude::*;

/// Maximum standard deviation of 8-bit values, used to normalize texture.
const TEXTURE_NORM: f32 = 127.5;

/// Robust and classical luminance statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImageStats {
    pub mean: f32,
    pub std: f32,
    pub median: f32,
    pub mad: f32,
}

/// Per-pixel derived maps.
#[derive(Debug, Clone)]
pub struct StatMaps {
    pub width: usize,
    pub height: usize,
    pub luminance: Vec<f32>,
    /// Sum of absolute RGB differences from the 3x3 neighborhood mean.
    pub color_variance: Vec<f32>,
    /// 5x5 luminance standard deviation, normalized to [0, 1].
    pub texture: Vec<f32>,
    /// Sobel gradient magnitude of luminance.
    pub gradient: Vec<f32>,
    /// `1 - λ2/λ1` of the 5x5 second-moment matrix.
    pub ellipticity: Vec<f32>,
}

impl StatMaps {
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the statistics engine derives from one image.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub stats: ImageStats,
    pub maps: StatMaps,
}

/// Compute global statistics and all per-pixel maps for `pixels`.
pub fn compute_statistics(pixels: &PixelBuffer) -> Statistics {
    let width = pixels.width() as usize;
    let height = pixels.height() as usize;

    let lum: Vec<f32> = pixels
        .as_rgba()
        .par_chunks_exact(4)
        .map(|p| luminance(p[0], p[1], p[2]))
        .collect();

    let stats = luminance_stats(&lum);

    let color_variance = interior_map(width, height, 1, |x, y| {
        color_variance_at(pixels, width, x, y)
    });
    let texture = interior_map(width, height, 2, |x, y| {
        (local_std(&lum, width, x, y) / TEXTURE_NORM).clamp(0.0, 1.0)
    });
    let gradient = interior_map(width, height, 1, |x, y| sobel_at(&lum, width, x, y));
    let ellipticity = interior_map(width, height, 2, |x, y| ellipticity_at(&lum, width, x, y));

    tracing::debug!(
        mean = stats.mean,
        std = stats.std,
        median = stats.median,
        mad = stats.mad,
        "Computed image statistics"
    );

    Statistics {
        stats,
        maps: StatMaps {
            width,
            height,
            luminance: lum,
            color_variance,
            texture,
            gradient,
            ellipticity,
        },
    }
}

/// Mean, population standard deviation, median and MAD of `values`.
pub fn luminance_stats(values: &[f32]) -> ImageStats {
    if values.is_empty() {
        return ImageStats::default();
    }

    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;

    let mut sorted = values.to_vec();
    let median = median_in_place(&mut sorted);

    let mut deviations: Vec<f32> = values.iter().map(|&v| (v - median).abs()).collect();
    let mad = median_in_place(&mut deviations);

    ImageStats {
        mean: mean as f32,
        std: variance.sqrt() as f32,
        median,
        mad,
    }
}

/// Median by full sort; averages the two middle values for even lengths.
fn median_in_place(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Build a map by evaluating `f` at every pixel at least `margin` from the border.
fn interior_map<F>(width: usize, height: usize, margin: usize, f: F) -> Vec<f32>
where
    F: Fn(usize, usize) -> f32 + Sync,
{
    let mut map = vec![0.0f32; width * height];
    if width <= 2 * margin || height <= 2 * margin {
        return map;
    }

    map.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            if y < margin || y >= height - margin {
                return;
            }
            for (x, cell) in row.iter_mut().enumerate().take(width - margin).skip(margin) {
                *cell = f(x, y);
            }
        });
    map
}

fn color_variance_at(pixels: &PixelBuffer, width: usize, x: usize, y: usize) -> f32 {
    let mut sum = [0.0f32; 3];
    for ny in y - 1..=y + 1 {
        for nx in x - 1..=x + 1 {
            let p = pixels.rgba(ny * width + nx);
            for c in 0..3 {
                sum[c] += p[c] as f32;
            }
        }
    }

    let center = pixels.rgba(y * width + x);
    (0..3)
        .map(|c| (center[c] as f32 - sum[c] / 9.0).abs())
        .sum()
}

fn local_std(lum: &[f32], width: usize, x: usize, y: usize) -> f32 {
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for ny in y - 2..=y + 2 {
        let row = &lum[ny * width + x - 2..=ny * width + x + 2];
        for &v in row {
            sum += v as f64;
            sum_sq += v as f64 * v as f64;
        }
    }
    let mean = sum / 25.0;
    (sum_sq / 25.0 - mean * mean).max(0.0).sqrt() as f32
}

fn sobel_at(lum: &[f32], width: usize, x: usize, y: usize) -> f32 {
    let at = |dx: isize, dy: isize| {
        lum[(y as isize + dy) as usize * width + (x as isize + dx) as usize]
    };

    let gx = (at(1, -1) + 2.0 * at(1, 0) + at(1, 1)) - (at(-1, -1) + 2.0 * at(-1, 0) + at(-1, 1));
    let gy = (at(-1, 1) + 2.0 * at(0, 1) + at(1, 1)) - (at(-1, -1) + 2.0 * at(0, -1) + at(1, -1));
    (gx * gx + gy * gy).sqrt()
}

/// Ellipticity from intensity-weighted central second moments of the 5x5 window.
fn ellipticity_at(lum: &[f32], width: usize, x: usize, y: usize) -> f32 {
    let mut m00 = 0.0f64;
    let mut m10 = 0.0f64;
    let mut m01 = 0.0f64;
    for dy in -2i32..=2 {
        for dx in -2i32..=2 {
            let v = lum[(y as i32 + dy) as usize * width + (x as i32 + dx) as usize] as f64;
            m00 += v;
            m10 += dx as f64 * v;
            m01 += dy as f64 * v;
        }
    }
    if m00 <= 0.0 {
        return 0.0;
    }

    let cx = m10 / m00;
    let cy = m01 / m00;
    let (mut mu20, mut mu02, mut mu11) = (0.0f64, 0.0f64, 0.0f64);
    for dy in -2i32..=2 {
        for dx in -2i32..=2 {
            let v = lum[(y as i32 + dy) as usize * width + (x as i32 + dx) as usize] as f64;
            let ddx = dx as f64 - cx;
            let ddy = dy as f64 - cy;
            mu20 += ddx * ddx * v;
            mu02 += ddy * ddy * v;
            mu11 += ddx * ddy * v;
        }
    }
    mu20 /= m00;
    mu02 /= m00;
    mu11 /= m00;

    let half_trace = (mu20 + mu02) / 2.0;
    let root = (((mu20 - mu02) / 2.0).powi(2) + mu11 * mu11).sqrt();
    let lambda1 = half_trace + root;
    let lambda2 = half_trace - root;
    if lambda1 <= f64::EPSILON {
        return 0.0;
    }

    (1.0 - lambda2 / lambda1).clamp(0.0, 1.0) as f32
}
