//! Point-source detection: adaptive threshold, local maxima, size-limited
//! 8-connected growth and non-maximum suppression.

use super::mask::{DetectionResult, FeatureMask};
use crate::stats::{ImageStats, StatMaps};

/// Regions larger than this are not stars.
pub const MAX_STAR_SIZE: usize = 50;
/// Candidates within this distance of a brighter kept star are dropped.
pub const SUPPRESSION_RADIUS: usize = 3;
const MAX_MARK_RADIUS: usize = 3;
/// Growth floor as a fraction of the detection threshold.
const GROWTH_FRACTION: f32 = 0.7;
/// Scan margin from each border.
const EDGE_MARGIN: usize = 2;

/// A candidate that passed threshold, contrast and size tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarCandidate {
    pub x: usize,
    pub y: usize,
    pub intensity: f32,
    pub contrast: f32,
    pub size: usize,
}

/// `max(median + 3·MAD, mean + 2·std)`
pub fn adaptive_threshold(stats: &ImageStats) -> f32 {
    (stats.median + 3.0 * stats.mad).max(stats.mean + 2.0 * stats.std)
}

pub fn detect_stars(maps: &StatMaps, stats: &ImageStats) -> DetectionResult {
    let mut result = DetectionResult::empty(maps.width, maps.height);
    let threshold = adaptive_threshold(stats);

    let candidates = find_candidates(maps, stats, threshold);
    let considered = candidates.len();
    let kept = suppress_non_maxima(candidates, maps.width, maps.height);

    for star in &kept {
        let radius = ((star.size as f32).sqrt().ceil() as usize).min(MAX_MARK_RADIUS);
        mark_disk(&mut result.mask, star.x, star.y, radius);
    }
    result.count = kept.len();

    tracing::debug!(threshold, considered, stars = result.count, "Star detection complete");
    result
}

/// Scan interior pixels for accepted star centers, in row-major order.
pub fn find_candidates(maps: &StatMaps, stats: &ImageStats, threshold: f32) -> Vec<StarCandidate> {
    let (w, h) = (maps.width, maps.height);
    let mut candidates = Vec::new();
    if w <= 2 * EDGE_MARGIN || h <= 2 * EDGE_MARGIN {
        return candidates;
    }

    let lum = &maps.luminance;
    let floor = GROWTH_FRACTION * threshold;
    let min_contrast = 2.0 * stats.mad;
    let mut stamps = vec![0u32; w * h];
    let mut stamp = 0u32;

    for y in EDGE_MARGIN..h - EDGE_MARGIN {
        for x in EDGE_MARGIN..w - EDGE_MARGIN {
            let idx = y * w + x;
            let center = lum[idx];
            if center <= threshold {
                continue;
            }

            let mut neighbor_sum = 0.0f32;
            let mut is_peak = true;
            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let v = lum[(y as isize + dy) as usize * w + (x as isize + dx) as usize];
                    neighbor_sum += v;
                    if v > center {
                        is_peak = false;
                    }
                }
            }
            if !is_peak {
                continue;
            }

            let contrast = center - neighbor_sum / 8.0;
            if contrast <= min_contrast {
                continue;
            }

            stamp += 1;
            let Some(size) = grown_size(lum, w, h, idx, floor, &mut stamps, stamp) else {
                continue;
            };
            if (1..=MAX_STAR_SIZE).contains(&size) {
                candidates.push(StarCandidate {
                    x,
                    y,
                    intensity: center,
                    contrast,
                    size,
                });
            }
        }
    }

    candidates
}

/// 8-connected growth from `seed` over pixels brighter than `floor`.
/// Returns `None` once the region exceeds [`MAX_STAR_SIZE`].
fn grown_size(
    lum: &[f32],
    w: usize,
    h: usize,
    seed: usize,
    floor: f32,
    stamps: &mut [u32],
    stamp: u32,
) -> Option<usize> {
    let mut stack = vec![seed];
    stamps[seed] = stamp;
    let mut size = 0;

    while let Some(idx) = stack.pop() {
        size += 1;
        if size > MAX_STAR_SIZE {
            return None;
        }

        let (x, y) = ((idx % w) as isize, (idx / w) as isize);
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let n = ny as usize * w + nx as usize;
                if stamps[n] != stamp && lum[n] > floor {
                    stamps[n] = stamp;
                    stack.push(n);
                }
            }
        }
    }

    Some(size)
}

/// Keep candidates brightest-first, dropping any within
/// [`SUPPRESSION_RADIUS`] of one already kept. Ties keep scan order.
pub fn suppress_non_maxima(
    mut candidates: Vec<StarCandidate>,
    width: usize,
    height: usize,
) -> Vec<StarCandidate> {
    candidates.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));

    // Cells at least as wide as the radius, so only adjacent cells can conflict
    let cell = SUPPRESSION_RADIUS + 1;
    let grid_w = width.div_ceil(cell).max(1);
    let grid_h = height.div_ceil(cell).max(1);
    let mut grid: Vec<Vec<usize>> = vec![Vec::new(); grid_w * grid_h];
    let radius_sq = (SUPPRESSION_RADIUS * SUPPRESSION_RADIUS) as isize;

    let mut kept: Vec<StarCandidate> = Vec::new();
    for candidate in candidates {
        let (cx, cy) = (candidate.x / cell, candidate.y / cell);
        let mut suppressed = false;

        'search: for gy in cy.saturating_sub(1)..=(cy + 1).min(grid_h - 1) {
            for gx in cx.saturating_sub(1)..=(cx + 1).min(grid_w - 1) {
                for &k in &grid[gy * grid_w + gx] {
                    let other = &kept[k];
                    let dx = other.x as isize - candidate.x as isize;
                    let dy = other.y as isize - candidate.y as isize;
                    if dx * dx + dy * dy <= radius_sq {
                        suppressed = true;
                        break 'search;
                    }
                }
            }
        }

        if !suppressed {
            grid[cy * grid_w + cx].push(kept.len());
            kept.push(candidate);
        }
    }

    kept
}

fn mark_disk(mask: &mut FeatureMask, cx: usize, cy: usize, radius: usize) {
    let (w, h) = (mask.width(), mask.height());
    let r = radius as isize;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy > r * r {
                continue;
            }
            let (x, y) = (cx as isize + dx, cy as isize + dy);
            if x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h {
                mask.set(y as usize * w + x as usize);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::compute_statistics;
    use crate::test_fixtures::{gray_image, starfield, uniform_image};

    fn candidate(x: usize, y: usize, intensity: f32) -> StarCandidate {
        StarCandidate {
            x,
            y,
            intensity,
            contrast: 10.0,
            size: 1,
        }
    }

    #[test]
    fn test_threshold_takes_larger_bound() {
        let stats = ImageStats {
            mean: 10.0,
            std: 5.0,
            median: 8.0,
            mad: 1.0,
        };
        assert_eq!(adaptive_threshold(&stats), 20.0);

        let robust = ImageStats {
            mad: 10.0,
            ..stats
        };
        assert_eq!(adaptive_threshold(&robust), 38.0);
    }

    #[test]
    fn test_black_image_has_no_stars() {
        let pixels = uniform_image(32, 32, [0, 0, 0, 255]);
        let s = compute_statistics(&pixels);
        let result = detect_stars(&s.maps, &s.stats);
        assert_eq!(result.count, 0);
        assert_eq!(result.mask.count(), 0);
    }

    #[test]
    fn test_detects_isolated_stars() {
        let positions = [(8, 8), (24, 8), (8, 24), (24, 24), (40, 40)];
        let pixels = starfield(48, 48, &positions);
        let s = compute_statistics(&pixels);
        let result = detect_stars(&s.maps, &s.stats);

        assert_eq!(result.count, positions.len());
        for (x, y) in positions {
            assert!(result.mask.get(y * 48 + x));
        }
    }

    #[test]
    fn test_oversized_blob_is_not_a_star() {
        // A 10x10 bright square peaks above threshold but grows past the cap
        let pixels = gray_image(40, 40, |x, y| {
            if (15..25).contains(&x) && (15..25).contains(&y) {
                if x == 20 && y == 20 {
                    255
                } else {
                    240
                }
            } else {
                0
            }
        });
        let s = compute_statistics(&pixels);
        let result = detect_stars(&s.maps, &s.stats);
        assert_eq!(result.count, 0);
    }

    #[test]
    fn test_suppression_keeps_brightest() {
        let kept = suppress_non_maxima(
            vec![candidate(10, 10, 100.0), candidate(12, 10, 200.0), candidate(20, 20, 50.0)],
            32,
            32,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!((kept[0].x, kept[0].y), (12, 10));
        assert_eq!((kept[1].x, kept[1].y), (20, 20));
    }

    #[test]
    fn test_suppression_radius_is_inclusive() {
        let kept = suppress_non_maxima(
            vec![candidate(10, 10, 100.0), candidate(13, 10, 90.0), candidate(14, 10, 80.0)],
            32,
            32,
        );
        // (13,10) lies exactly 3 px away and is dropped; (14,10) is 4 px away
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].x, 14);
    }

    #[test]
    fn test_mark_disk_clips_at_border() {
        let mut mask = FeatureMask::new(5, 5);
        mark_disk(&mut mask, 0, 0, 1);
        assert_eq!(mask.count(), 3);
    }
}
