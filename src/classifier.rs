//! Image-wide aggregates and the fixed decision tree that picks an [`ImageType`].

use crate::pixels::PixelBuffer;
use crate::stats::StatMaps;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Luminance above which a pixel counts as bright.
const BRIGHT_LUMINANCE: f32 = 200.0;
/// Luminance below which a pixel counts as dark.
const DARK_LUMINANCE: f32 = 50.0;
/// HSV saturation above which a (non-black) pixel counts as colorful.
const COLORFUL_SATURATION: f32 = 0.5;
const COLORFUL_MIN_LUMINANCE: f32 = 30.0;
/// Central-difference magnitude both axes must exceed for circular evidence.
const CIRCULAR_GRADIENT: f32 = 20.0;
/// Axis disagreement that counts as linear evidence.
const LINEAR_GRADIENT_DIFFERENCE: f32 = 40.0;

const PLANET_NAMES: &[&str] = &[
    "planet", "mercury", "venus", "mars", "jupiter", "saturn", "uranus", "neptune",
];

/// Broad category of the imaged scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageType {
    DeepSky,
    Planetary,
    Solar,
    Lunar,
    Mixed,
}

impl ImageType {
    pub const ALL: [ImageType; 5] = [
        ImageType::DeepSky,
        ImageType::Planetary,
        ImageType::Solar,
        ImageType::Lunar,
        ImageType::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::DeepSky => "deep-sky",
            ImageType::Planetary => "planetary",
            ImageType::Solar => "solar",
            ImageType::Lunar => "lunar",
            ImageType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseImageTypeError(pub String);

impl fmt::Display for ParseImageTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown image type '{}' (expected deep-sky, planetary, solar, lunar or mixed)",
            self.0
        )
    }
}

impl std::error::Error for ParseImageTypeError {}

impl FromStr for ImageType {
    type Err = ParseImageTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deep-sky" | "deepsky" | "deep_sky" => Ok(ImageType::DeepSky),
            "planetary" | "planet" => Ok(ImageType::Planetary),
            "solar" | "sun" => Ok(ImageType::Solar),
            "lunar" | "moon" => Ok(ImageType::Lunar),
            "mixed" => Ok(ImageType::Mixed),
            _ => Err(ParseImageTypeError(s.to_string())),
        }
    }
}

/// Whole-image measurements used by the classifier and the basic estimator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlobalAggregates {
    /// Mean luminance / 255.
    pub brightness: f32,
    /// Luminance standard deviation / 127.5, clamped.
    pub contrast: f32,
    /// Mean HSV saturation.
    pub saturation: f32,
    /// Per-channel means / 255.
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub bright_pixels: usize,
    pub dark_pixels: usize,
    pub colorful_pixels: usize,
    pub evidence: GradientEvidence,
}

/// Counts of pixels whose directional gradients look round or streaky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GradientEvidence {
    pub circular: usize,
    pub linear: usize,
}

impl GlobalAggregates {
    pub fn compute(pixels: &PixelBuffer, maps: &StatMaps, luminance_std: f32) -> Self {
        let n = pixels.pixel_count().max(1) as f64;
        let mut channel_sums = [0.0f64; 3];
        let mut saturation_sum = 0.0f64;
        let mut lum_sum = 0.0f64;
        let mut bright_pixels = 0;
        let mut dark_pixels = 0;
        let mut colorful_pixels = 0;

        for (idx, &lum) in maps.luminance.iter().enumerate() {
            let [r, g, b, _] = pixels.rgba(idx);
            channel_sums[0] += r as f64;
            channel_sums[1] += g as f64;
            channel_sums[2] += b as f64;
            lum_sum += lum as f64;

            let sat = hsv_saturation(r, g, b);
            saturation_sum += sat as f64;

            if lum > BRIGHT_LUMINANCE {
                bright_pixels += 1;
            }
            if lum < DARK_LUMINANCE {
                dark_pixels += 1;
            }
            if sat > COLORFUL_SATURATION && lum > COLORFUL_MIN_LUMINANCE {
                colorful_pixels += 1;
            }
        }

        let unit = |v: f64| (v as f32).clamp(0.0, 1.0);
        Self {
            brightness: unit(lum_sum / n / 255.0),
            contrast: (luminance_std / 127.5).clamp(0.0, 1.0),
            saturation: unit(saturation_sum / n),
            red: unit(channel_sums[0] / n / 255.0),
            green: unit(channel_sums[1] / n / 255.0),
            blue: unit(channel_sums[2] / n / 255.0),
            bright_pixels,
            dark_pixels,
            colorful_pixels,
            evidence: gradient_evidence(maps),
        }
    }
}

fn hsv_saturation(r: u8, g: u8, b: u8) -> f32 {
    let max = r.max(g).max(b);
    if max == 0 {
        return 0.0;
    }
    let min = r.min(g).min(b);
    (max - min) as f32 / max as f32
}

/// Tally circular and linear gradient evidence from central differences.
pub fn gradient_evidence(maps: &StatMaps) -> GradientEvidence {
    let (w, h) = (maps.width, maps.height);
    let mut evidence = GradientEvidence::default();
    if w < 3 || h < 3 {
        return evidence;
    }

    let lum = &maps.luminance;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let gx = (lum[y * w + x + 1] - lum[y * w + x - 1]).abs();
            let gy = (lum[(y + 1) * w + x] - lum[(y - 1) * w + x]).abs();
            if gx > CIRCULAR_GRADIENT && gy > CIRCULAR_GRADIENT {
                evidence.circular += 1;
            }
            if (gx - gy).abs() > LINEAR_GRADIENT_DIFFERENCE {
                evidence.linear += 1;
            }
        }
    }
    evidence
}

/// Keyword-based type from a filename, if any keyword matches.
pub fn type_from_filename(filename: &str) -> Option<ImageType> {
    let name = filename.to_ascii_lowercase();
    if name.contains("sun") || name.contains("solar") {
        Some(ImageType::Solar)
    } else if name.contains("moon") || name.contains("lunar") {
        Some(ImageType::Lunar)
    } else if PLANET_NAMES.iter().any(|p| name.contains(p)) {
        Some(ImageType::Planetary)
    } else {
        None
    }
}

/// Pick the image type. An explicit hint wins, then a filename keyword, then
/// the brightness/contrast/gradient decision tree evaluated in order.
pub fn classify(
    hint: Option<ImageType>,
    filename: Option<&str>,
    brightness: f32,
    contrast: f32,
    evidence: GradientEvidence,
) -> ImageType {
    if let Some(hint) = hint {
        tracing::debug!(image_type = %hint, "Classified from explicit hint");
        return hint;
    }

    if let Some(image_type) = filename.and_then(type_from_filename) {
        tracing::debug!(image_type = %image_type, "Classified from filename");
        return image_type;
    }

    let GradientEvidence { circular, linear } = evidence;
    let image_type = if brightness > 0.7 && circular > 1000 {
        ImageType::Solar
    } else if brightness > 0.5 && contrast > 0.6 {
        ImageType::Lunar
    } else if circular > 500 && brightness > 0.3 {
        ImageType::Planetary
    } else if linear > 2 * circular {
        ImageType::DeepSky
    } else if brightness > 0.4 {
        ImageType::Mixed
    } else {
        ImageType::DeepSky
    };

    tracing::debug!(
        image_type = %image_type,
        brightness,
        contrast,
        circular,
        linear,
        "Classified from image heuristics"
    );
    image_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::compute_statistics;
    use crate::test_fixtures::{gray_image, uniform_image};

    fn evidence(circular: usize, linear: usize) -> GradientEvidence {
        GradientEvidence { circular, linear }
    }

    #[test]
    fn test_hint_wins() {
        let t = classify(
            Some(ImageType::Lunar),
            Some("sun.png"),
            0.9,
            0.0,
            evidence(5000, 0),
        );
        assert_eq!(t, ImageType::Lunar);
    }

    #[test]
    fn test_filename_keywords() {
        assert_eq!(type_from_filename("SUN_2024.jpg"), Some(ImageType::Solar));
        assert_eq!(type_from_filename("solar-flare.png"), Some(ImageType::Solar));
        assert_eq!(type_from_filename("full_moon.png"), Some(ImageType::Lunar));
        assert_eq!(type_from_filename("lunar.tif"), Some(ImageType::Lunar));
        assert_eq!(type_from_filename("Jupiter.png"), Some(ImageType::Planetary));
        assert_eq!(type_from_filename("planet-x.png"), Some(ImageType::Planetary));
        assert_eq!(type_from_filename("m31.png"), None);
    }

    #[test]
    fn test_filename_beats_heuristics() {
        let t = classify(None, Some("mars.png"), 0.05, 0.0, evidence(0, 10_000));
        assert_eq!(t, ImageType::Planetary);
    }

    #[test]
    fn test_decision_tree_order() {
        assert_eq!(classify(None, None, 0.8, 0.9, evidence(1001, 0)), ImageType::Solar);
        // Solar requires circular > 1000; falls through to lunar
        assert_eq!(classify(None, None, 0.8, 0.9, evidence(1000, 0)), ImageType::Lunar);
        assert_eq!(classify(None, None, 0.35, 0.1, evidence(501, 0)), ImageType::Planetary);
        assert_eq!(classify(None, None, 0.35, 0.1, evidence(100, 201)), ImageType::DeepSky);
        assert_eq!(classify(None, None, 0.45, 0.1, evidence(100, 200)), ImageType::Mixed);
        assert_eq!(classify(None, None, 0.2, 0.1, evidence(0, 0)), ImageType::DeepSky);
    }

    #[test]
    fn test_white_image_is_mixed() {
        let pixels = uniform_image(64, 64, [255, 255, 255, 255]);
        let s = compute_statistics(&pixels);
        let agg = GlobalAggregates::compute(&pixels, &s.maps, s.stats.std);

        assert!(agg.brightness > 0.99);
        assert_eq!(agg.evidence, GradientEvidence::default());
        let t = classify(None, None, agg.brightness, agg.contrast, agg.evidence);
        assert_eq!(t, ImageType::Mixed);
    }

    #[test]
    fn test_parse_image_type() {
        assert_eq!("deep-sky".parse::<ImageType>().unwrap(), ImageType::DeepSky);
        assert_eq!("DeepSky".parse::<ImageType>().unwrap(), ImageType::DeepSky);
        assert_eq!(" Solar ".parse::<ImageType>().unwrap(), ImageType::Solar);
        assert_eq!("moon".parse::<ImageType>().unwrap(), ImageType::Lunar);
        assert!("nebula".parse::<ImageType>().is_err());

        for t in ImageType::ALL {
            assert_eq!(t.as_str().parse::<ImageType>().unwrap(), t);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ImageType::DeepSky).unwrap();
        assert_eq!(json, "\"deep-sky\"");
    }

    #[test]
    fn test_aggregates_color_profile() {
        let pixels = uniform_image(4, 4, [255, 0, 0, 255]);
        let s = compute_statistics(&pixels);
        let agg = GlobalAggregates::compute(&pixels, &s.maps, s.stats.std);

        assert_eq!(agg.red, 1.0);
        assert_eq!(agg.green, 0.0);
        assert_eq!(agg.saturation, 1.0);
        assert_eq!(agg.colorful_pixels, 16);
        assert_eq!(agg.bright_pixels, 0);
        assert_eq!(agg.dark_pixels, 0);
    }

    #[test]
    fn test_linear_evidence_on_stripes() {
        let pixels = gray_image(16, 16, |x, _| if x % 4 < 2 { 0 } else { 255 });
        let s = compute_statistics(&pixels);
        let e = gradient_evidence(&s.maps);
        assert!(e.linear > 0);
        assert_eq!(e.circular, 0);
    }
}
