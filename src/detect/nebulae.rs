//! Diffuse, colorful, textured regions.

use super::mask::{DetectionResult, FeatureMask};
use super::region::RegionGrower;
use crate::stats::StatMaps;

const SEED_COLOR_VARIANCE: f32 = 30.0;
const SEED_TEXTURE_MIN: f32 = 0.1;
const SEED_TEXTURE_MAX: f32 = 0.8;
const MEMBER_COLOR_VARIANCE: f32 = 20.0;
const MEMBER_TEXTURE: f32 = 0.05;
/// Accepted regions have strictly more pixels than this...
const MIN_AREA: usize = 100;
/// ...and strictly fewer than this.
const MAX_AREA: usize = 50_000;

/// Grow regions over pixels not in `claimed` and count those of nebula size.
pub fn detect_nebulae(maps: &StatMaps, claimed: &FeatureMask) -> DetectionResult {
    let mut result = DetectionResult::empty(maps.width, maps.height);
    let mut grower = RegionGrower::new(maps.width, maps.height);
    let mut rejected = 0usize;

    for seed in 0..maps.len() {
        if grower.is_visited(seed) || claimed.get(seed) || !is_seed(maps, seed) {
            continue;
        }

        let region = grower.grow(seed, |idx| !claimed.get(idx) && is_member(maps, idx));
        if region.area() > MIN_AREA && region.area() < MAX_AREA {
            for &idx in &region.pixels {
                result.mask.set(idx);
            }
            result.count += 1;
        } else {
            rejected += 1;
        }
    }

    tracing::debug!(nebulae = result.count, rejected, "Nebula detection complete");
    result
}

fn is_seed(maps: &StatMaps, idx: usize) -> bool {
    let texture = maps.texture[idx];
    maps.color_variance[idx] > SEED_COLOR_VARIANCE
        && texture > SEED_TEXTURE_MIN
        && texture < SEED_TEXTURE_MAX
}

fn is_member(maps: &StatMaps, idx: usize) -> bool {
    maps.color_variance[idx] > MEMBER_COLOR_VARIANCE && maps.texture[idx] > MEMBER_TEXTURE
}
