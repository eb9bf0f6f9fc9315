//! Feature detectors.
//!
//! Deep-sky images run the star, nebula and galaxy detectors in that order;
//! each later detector skips pixels claimed by the earlier ones, so the three
//! masks are pairwise disjoint. Other image types use [`basic`] estimates.

pub mod basic;
pub mod galaxies;
pub mod mask;
pub mod nebulae;
pub mod region;
pub mod stars;

pub use mask::{DetectionResult, FeatureMask};

use crate::stats::Statistics;

/// Results of the three deep-sky detectors.
#[derive(Debug, Clone)]
pub struct DeepSkyDetections {
    pub stars: DetectionResult,
    pub nebulae: DetectionResult,
    pub galaxies: DetectionResult,
}

pub fn detect_deep_sky(statistics: &Statistics) -> DeepSkyDetections {
    let maps = &statistics.maps;

    let stars = stars::detect_stars(maps, &statistics.stats);
    let nebulae = nebulae::detect_nebulae(maps, &stars.mask);
    let claimed = stars.mask.union(&nebulae.mask);
    let galaxies = galaxies::detect_galaxies(maps, &claimed);

    tracing::info!(
        stars = stars.count,
        nebulae = nebulae.count,
        galaxies = galaxies.count,
        "Deep-sky detection complete"
    );

    DeepSkyDetections {
        stars,
        nebulae,
        galaxies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::compute_statistics;
    use crate::test_fixtures::{deep_sky_scene, galaxy_image, nebula_image};

    #[test]
    fn test_nebula_found_from_pixels() {
        let found = detect_deep_sky(&compute_statistics(&nebula_image(64, 64, 20)));
        assert_eq!(found.stars.count, 0);
        assert_eq!(found.nebulae.count, 1);
        assert_eq!(found.galaxies.count, 0);
        assert!(found.nebulae.mask.count() > 100);
    }

    #[test]
    fn test_galaxy_found_from_pixels() {
        let found = detect_deep_sky(&compute_statistics(&galaxy_image(80, 60, (20, 18), (40, 24))));
        assert_eq!(found.stars.count, 0);
        assert_eq!(found.nebulae.count, 0);
        assert_eq!(found.galaxies.count, 1);
        assert!(found.galaxies.mask.get(30 * 80 + 40));
        assert!(!found.galaxies.mask.get(0));
    }

    #[test]
    fn test_scene_masks_disjoint_and_nonempty() {
        let found = detect_deep_sky(&compute_statistics(&deep_sky_scene()));

        assert_eq!(found.stars.count, 5);
        assert_eq!(found.nebulae.count, 1);
        assert_eq!(found.galaxies.count, 1);

        assert!(found.stars.mask.is_disjoint(&found.nebulae.mask));
        assert!(found.stars.mask.is_disjoint(&found.galaxies.mask));
        assert!(found.nebulae.mask.is_disjoint(&found.galaxies.mask));

        // Each mask sits on its own feature
        assert!(found.stars.mask.get(80 * 160 + 10));
        assert!(found.nebulae.mask.count() > 100);
        assert!(found.galaxies.mask.get(31 * 160 + 40));
    }
}
