//! Coarse count estimates for solar, lunar, planetary and mixed scenes.
//!
//! These come straight from global pixel tallies and produce no masks.

use crate::analysis::ObjectCounts;
use crate::classifier::{GlobalAggregates, ImageType};

/// `min(value / scale, max)` with integer division.
fn scaled(value: usize, scale: usize, max: u32) -> u32 {
    u32::try_from(value / scale).unwrap_or(u32::MAX).min(max)
}

pub fn estimate_objects(image_type: ImageType, agg: &GlobalAggregates) -> ObjectCounts {
    let circular = agg.evidence.circular;
    let linear = agg.evidence.linear;

    let counts = match image_type {
        ImageType::Solar => ObjectCounts {
            sunspots: scaled(agg.dark_pixels, 5000, 50),
            solar_flares: scaled(agg.bright_pixels, 2000, 20),
            ..ObjectCounts::default()
        },
        ImageType::Lunar => ObjectCounts {
            moons: 1,
            ..ObjectCounts::default()
        },
        ImageType::Planetary => ObjectCounts {
            planets: scaled(circular, 1000, 5),
            moons: scaled(circular, 5000, 10),
            ..ObjectCounts::default()
        },
        ImageType::Mixed => ObjectCounts {
            stars: scaled(agg.bright_pixels, 500, 100),
            nebulae: scaled(agg.colorful_pixels, 10_000, 10),
            galaxies: scaled(linear, 5000, 5),
            planets: scaled(circular, 2000, 3),
            ..ObjectCounts::default()
        },
        // Deep-sky scenes go through the statistical detectors instead
        ImageType::DeepSky => ObjectCounts::default(),
    };

    tracing::debug!(%image_type, ?counts, "Estimated object counts");
    counts
}
