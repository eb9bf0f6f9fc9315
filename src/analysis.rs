//! The aggregate analysis record and the image → analysis stage.

use crate::classifier::{classify, GlobalAggregates, ImageType};
use crate::detect::{basic, detect_deep_sky};
use crate::frequency::{map_frequencies, SonicProfile};
use crate::pixels::PixelBuffer;
use crate::stats::compute_statistics;
use serde::{Deserialize, Serialize};

/// Detected (or estimated) object counts per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectCounts {
    pub stars: u32,
    pub nebulae: u32,
    pub galaxies: u32,
    pub planets: u32,
    pub moons: u32,
    pub sunspots: u32,
    pub solar_flares: u32,
}

/// Mean channel intensities in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorProfile {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

/// Normalized whole-image scalars fed to the frequency mapper.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SceneScalars {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub color: ColorProfile,
}

impl SceneScalars {
    /// Copy with every scalar clamped into [0, 1]; NaN becomes 0.
    pub fn clamped(self) -> Self {
        let unit = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            brightness: unit(self.brightness),
            contrast: unit(self.contrast),
            saturation: unit(self.saturation),
            color: ColorProfile {
                red: unit(self.color.red),
                green: unit(self.color.green),
                blue: unit(self.color.blue),
            },
        }
    }
}

impl From<&GlobalAggregates> for SceneScalars {
    fn from(agg: &GlobalAggregates) -> Self {
        Self {
            brightness: agg.brightness,
            contrast: agg.contrast,
            saturation: agg.saturation,
            color: ColorProfile {
                red: agg.red,
                green: agg.green,
                blue: agg.blue,
            },
        }
    }
}

/// Everything downstream consumers need: counts, scalars and the sound recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(flatten)]
    pub counts: ObjectCounts,
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub image_type: ImageType,
    pub color_profile: ColorProfile,
    pub dominant_frequencies: Vec<f32>,
    pub harmonic_structure: Vec<u32>,
    pub rhythm_pattern: Vec<f32>,
}

impl AnalysisResult {
    /// Assemble a result, clamping scalars and deriving the sound recipe.
    pub fn new(counts: ObjectCounts, scalars: SceneScalars, image_type: ImageType) -> Self {
        let scalars = scalars.clamped();
        let SonicProfile {
            dominant_frequencies,
            harmonic_structure,
            rhythm_pattern,
        } = map_frequencies(&counts, &scalars, image_type);

        Self {
            counts,
            brightness: scalars.brightness,
            contrast: scalars.contrast,
            saturation: scalars.saturation,
            image_type,
            color_profile: scalars.color,
            dominant_frequencies,
            harmonic_structure,
            rhythm_pattern,
        }
    }

    /// Fixed result used when the input image cannot be decoded.
    pub fn fallback() -> Self {
        let counts = ObjectCounts {
            stars: 25,
            nebulae: 2,
            galaxies: 1,
            ..ObjectCounts::default()
        };
        let scalars = SceneScalars {
            brightness: 0.3,
            contrast: 0.5,
            saturation: 0.4,
            color: ColorProfile {
                red: 0.35,
                green: 0.4,
                blue: 0.55,
            },
        };
        Self::new(counts, scalars, ImageType::DeepSky)
    }

    pub fn total_objects(&self) -> u32 {
        let c = &self.counts;
        c.stars + c.nebulae + c.galaxies + c.planets + c.moons + c.sunspots + c.solar_flares
    }
}

/// Run statistics, classification and detection on a decoded image.
pub fn analyze_pixels(
    pixels: &PixelBuffer,
    hint: Option<ImageType>,
    filename: Option<&str>,
) -> AnalysisResult {
    let statistics = compute_statistics(pixels);
    let aggregates = GlobalAggregates::compute(pixels, &statistics.maps, statistics.stats.std);
    let image_type = classify(
        hint,
        filename,
        aggregates.brightness,
        aggregates.contrast,
        aggregates.evidence,
    );

    let counts = match image_type {
        ImageType::DeepSky => {
            let found = detect_deep_sky(&statistics);
            ObjectCounts {
                stars: count_u32(found.stars.count),
                nebulae: count_u32(found.nebulae.count),
                galaxies: count_u32(found.galaxies.count),
                ..ObjectCounts::default()
            }
        }
        ImageType::Planetary | ImageType::Solar | ImageType::Lunar | ImageType::Mixed => {
            basic::estimate_objects(image_type, &aggregates)
        }
    };

    tracing::info!(%image_type, ?counts, "Image analysis complete");
    AnalysisResult::new(counts, SceneScalars::from(&aggregates), image_type)
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
