//! Smooth, elongated, compact regions with strong but moderate gradients.

use super::mask::{DetectionResult, FeatureMask};
use super::region::{Region, RegionGrower};
use crate::stats::StatMaps;
use std::f32::consts::PI;

const SEED_GRADIENT: f32 = 15.0;
const SEED_ELLIPTICITY: f32 = 0.3;
const MEMBER_GRADIENT: f32 = 8.0;
const MEMBER_LUMINANCE_MIN: f32 = 50.0;
const MEMBER_LUMINANCE_MAX: f32 = 200.0;
const MIN_AREA: usize = 500;
const MAX_AREA: usize = 20_000;
const MIN_ASPECT: f32 = 1.2;
const MAX_ASPECT: f32 = 8.0;
const MIN_COMPACTNESS: f32 = 0.4;

/// Grow regions over pixels not in `claimed` and count galaxy-shaped ones.
pub fn detect_galaxies(maps: &StatMaps, claimed: &FeatureMask) -> DetectionResult {
    let mut result = DetectionResult::empty(maps.width, maps.height);
    let mut grower = RegionGrower::new(maps.width, maps.height);

    for seed in 0..maps.len() {
        if grower.is_visited(seed) || claimed.get(seed) || !is_seed(maps, seed) {
            continue;
        }

        let region = grower.grow(seed, |idx| !claimed.get(idx) && is_member(maps, idx));
        if is_galaxy_shaped(&grower, &region) {
            for &idx in &region.pixels {
                result.mask.set(idx);
            }
            result.count += 1;
        }
    }

    tracing::debug!(galaxies = result.count, "Galaxy detection complete");
    result
}

/// `4π·area / perimeter²` using the boundary-pixel perimeter.
pub fn compactness(area: usize, perimeter: usize) -> f32 {
    if perimeter == 0 {
        return 0.0;
    }
    4.0 * PI * area as f32 / (perimeter * perimeter) as f32
}

fn is_galaxy_shaped(grower: &RegionGrower, region: &Region) -> bool {
    let area = region.area();
    if area <= MIN_AREA || area >= MAX_AREA {
        return false;
    }

    let aspect = region.aspect_ratio();
    if aspect <= MIN_ASPECT || aspect >= MAX_ASPECT {
        return false;
    }

    compactness(area, grower.boundary_pixels(region)) > MIN_COMPACTNESS
}

fn is_seed(maps: &StatMaps, idx: usize) -> bool {
    maps.gradient[idx] > SEED_GRADIENT && maps.ellipticity[idx] > SEED_ELLIPTICITY
}

fn is_member(maps: &StatMaps, idx: usize) -> bool {
    let lum = maps.luminance[idx];
    maps.gradient[idx] > MEMBER_GRADIENT
        && lum > MEMBER_LUMINANCE_MIN
        && lum < MEMBER_LUMINANCE_MAX
}
