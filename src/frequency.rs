//! Mapping analysis counts and scalars to frequencies, harmonics and rhythm.

use crate::analysis::{ObjectCounts, SceneScalars};
use crate::classifier::ImageType;

/// Root of every derived frequency, in Hz.
pub const BASE_FREQUENCY_HZ: f32 = 220.0;
pub const MAX_FREQUENCIES: usize = 12;
pub const DEFAULT_HARMONICS: [u32; 3] = [2, 3, 4];
pub const DEFAULT_RHYTHM: [f32; 3] = [1.0, 0.5, 0.5];

/// Which normalized scalar bends a category's characteristic frequency.
#[derive(Debug, Clone, Copy)]
enum Modulation {
    Brightness,
    Contrast,
    Saturation,
    /// `min(count, 10) / 10`
    Count,
}

/// How one object category sounds.
#[derive(Debug, Clone, Copy)]
struct Voice {
    multiplier_hz: f32,
    modulation: Modulation,
    harmonics: &'static [u32],
    rhythm: &'static [f32],
}

const STARS: Voice = Voice {
    multiplier_hz: 440.0,
    modulation: Modulation::Brightness,
    harmonics: &[2, 3],
    rhythm: &[0.5, 0.25, 0.25],
};
const NEBULAE: Voice = Voice {
    multiplier_hz: 110.0,
    modulation: Modulation::Saturation,
    harmonics: &[3, 5],
    rhythm: &[1.0, 0.75],
};
const GALAXIES: Voice = Voice {
    multiplier_hz: 55.0,
    modulation: Modulation::Contrast,
    harmonics: &[2, 4],
    rhythm: &[2.0, 1.0],
};
const PLANETS: Voice = Voice {
    multiplier_hz: 330.0,
    modulation: Modulation::Count,
    harmonics: &[3],
    rhythm: &[1.0, 0.5],
};
const MOONS: Voice = Voice {
    multiplier_hz: 196.0,
    modulation: Modulation::Count,
    harmonics: &[2],
    rhythm: &[0.75, 0.75, 0.5],
};
const SUNSPOTS: Voice = Voice {
    multiplier_hz: 146.83,
    modulation: Modulation::Contrast,
    harmonics: &[5],
    rhythm: &[0.25, 0.25, 0.5],
};
const SOLAR_FLARES: Voice = Voice {
    multiplier_hz: 587.33,
    modulation: Modulation::Brightness,
    harmonics: &[7],
    rhythm: &[0.125, 0.125, 0.25, 0.5],
};

/// Multipliers of [`BASE_FREQUENCY_HZ`] appended for each image type.
pub fn type_multipliers(image_type: ImageType) -> [f32; 2] {
    match image_type {
        ImageType::DeepSky => [0.25, 0.375],
        ImageType::Planetary => [1.5, 2.25],
        ImageType::Solar => [3.0, 4.5],
        ImageType::Lunar => [0.75, 1.125],
        ImageType::Mixed => [1.25, 1.875],
    }
}

/// The synthesis recipe derived from an analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct SonicProfile {
    pub dominant_frequencies: Vec<f32>,
    pub harmonic_structure: Vec<u32>,
    pub rhythm_pattern: Vec<f32>,
}

/// Derive frequencies, harmonics and rhythm. Scalars are expected in [0, 1].
pub fn map_frequencies(
    counts: &ObjectCounts,
    scalars: &SceneScalars,
    image_type: ImageType,
) -> SonicProfile {
    let color = scalars.color;
    let mut frequencies = vec![
        BASE_FREQUENCY_HZ * (0.5 + color.red),
        BASE_FREQUENCY_HZ * (1.0 + color.green),
        BASE_FREQUENCY_HZ * (2.0 + color.blue),
    ];
    let mut harmonics: Vec<u32> = Vec::new();
    let mut rhythm: Vec<f32> = Vec::new();

    let voices = [
        (counts.stars, STARS),
        (counts.nebulae, NEBULAE),
        (counts.galaxies, GALAXIES),
        (counts.planets, PLANETS),
        (counts.moons, MOONS),
        (counts.sunspots, SUNSPOTS),
        (counts.solar_flares, SOLAR_FLARES),
    ];
    for (count, voice) in voices {
        if count == 0 {
            continue;
        }
        let scalar = match voice.modulation {
            Modulation::Brightness => scalars.brightness,
            Modulation::Contrast => scalars.contrast,
            Modulation::Saturation => scalars.saturation,
            Modulation::Count => count.min(10) as f32 / 10.0,
        };
        frequencies.push(voice.multiplier_hz * (1.0 + scalar));
        for &h in voice.harmonics {
            if !harmonics.contains(&h) {
                harmonics.push(h);
            }
        }
        rhythm.extend_from_slice(voice.rhythm);
    }

    frequencies.extend(
        type_multipliers(image_type)
            .iter()
            .map(|m| BASE_FREQUENCY_HZ * m),
    );
    frequencies.truncate(MAX_FREQUENCIES);

    if harmonics.is_empty() {
        harmonics = DEFAULT_HARMONICS.to_vec();
    }
    if rhythm.is_empty() {
        rhythm = DEFAULT_RHYTHM.to_vec();
    }

    SonicProfile {
        dominant_frequencies: frequencies,
        harmonic_structure: harmonics,
        rhythm_pattern: rhythm,
    }
}
