//! Additive stereo synthesis of an [`AnalysisResult`].
//!
//! Every output sample is a pure function of its index, so the buffer is
//! rendered over parallel chunks without affecting the result.

use crate::analysis::AnalysisResult;
use crate::classifier::ImageType;
use crate::error::SynthesisError;
use rayon::prelude::*;
use std::f64::consts::PI;

const TOTAL_AMPLITUDE: f64 = 0.08;
const PAN: f64 = 0.3;
/// Rhythm steps per second.
const RHYTHM_RATE: f64 = 2.0;
const RENDER_CHUNK: usize = 4096;

/// Sample rate, duration and output gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisParams {
    pub sample_rate: u32,
    pub duration_secs: u32,
    pub headroom: f32,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            duration_secs: 30,
            headroom: 0.4,
        }
    }
}

impl SynthesisParams {
    pub fn validate(&self) -> Result<(), SynthesisError> {
        if !(8000..=192_000).contains(&self.sample_rate) {
            return Err(SynthesisError::InvalidSampleRate {
                rate: self.sample_rate,
            });
        }
        if !(1..=600).contains(&self.duration_secs) {
            return Err(SynthesisError::InvalidDuration {
                secs: self.duration_secs,
            });
        }
        if !(self.headroom > 0.0 && self.headroom <= 1.0) {
            return Err(SynthesisError::InvalidHeadroom {
                headroom: self.headroom,
            });
        }
        Ok(())
    }

    /// Samples per channel.
    pub fn sample_count(&self) -> usize {
        self.sample_rate as usize * self.duration_secs as usize
    }
}

/// Two-channel float PCM, samples in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl AudioBuffer {
    pub const CHANNELS: u16 = 2;

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample across both channels.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0f32, |max, &s| max.max(s.abs()))
    }
}

/// Render `analysis` into a stereo buffer of exactly
/// `sample_rate * duration_secs` samples per channel.
///
/// # Errors
///
/// Returns a [`SynthesisError`] if `params` are out of range.
pub fn render(analysis: &AnalysisResult, params: &SynthesisParams) -> Result<AudioBuffer, SynthesisError> {
    params.validate()?;

    let voice = Voice::new(analysis, params);
    let n = params.sample_count();
    let mut left = vec![0.0f32; n];
    let mut right = vec![0.0f32; n];

    left.par_chunks_mut(RENDER_CHUNK)
        .zip(right.par_chunks_mut(RENDER_CHUNK))
        .enumerate()
        .for_each(|(chunk, (l, r))| {
            let start = chunk * RENDER_CHUNK;
            for (offset, (ls, rs)) in l.iter_mut().zip(r.iter_mut()).enumerate() {
                let (a, b) = voice.sample(start + offset);
                *ls = a;
                *rs = b;
            }
        });

    tracing::info!(
        samples = n,
        sample_rate = params.sample_rate,
        frequencies = analysis.dominant_frequencies.len(),
        harmonics = analysis.harmonic_structure.len(),
        "Synthesis complete"
    );

    Ok(AudioBuffer {
        sample_rate: params.sample_rate,
        left,
        right,
    })
}

/// Precomputed, read-only rendering state.
struct Voice<'a> {
    frequencies: &'a [f32],
    harmonics: &'a [u32],
    rhythm: &'a [f32],
    image_type: ImageType,
    amplitude: f64,
    sample_rate: f64,
    duration: f64,
    /// brightness · (1 + contrast/2) · headroom
    gain: f64,
}

impl<'a> Voice<'a> {
    fn new(analysis: &'a AnalysisResult, params: &SynthesisParams) -> Self {
        let count = analysis.dominant_frequencies.len().max(1);
        Self {
            frequencies: &analysis.dominant_frequencies,
            harmonics: &analysis.harmonic_structure,
            rhythm: &analysis.rhythm_pattern,
            image_type: analysis.image_type,
            amplitude: TOTAL_AMPLITUDE / count as f64,
            sample_rate: params.sample_rate as f64,
            duration: params.duration_secs as f64,
            gain: analysis.brightness as f64
                * (1.0 + 0.5 * analysis.contrast as f64)
                * params.headroom as f64,
        }
    }

    fn rhythm_multiplier(&self, t: f64) -> f64 {
        if self.rhythm.is_empty() {
            return 1.0;
        }
        let len = self.rhythm.len();
        let idx = ((t * RHYTHM_RATE) % len as f64).floor() as usize;
        self.rhythm[idx.min(len - 1)] as f64
    }

    fn sample(&self, i: usize) -> (f32, f32) {
        let t = i as f64 / self.sample_rate;
        let rhythm = self.rhythm_multiplier(t);

        let mut left = 0.0f64;
        let mut right = 0.0f64;
        for (k, &f) in self.frequencies.iter().enumerate() {
            let f = f as f64;
            let pan = if k % 2 == 0 { -PAN } else { PAN };

            let mut wave = (2.0 * PI * f * t).sin();
            for &h in self.harmonics {
                let h = h as f64;
                wave += (2.0 * PI * f * h * t).sin() * (self.amplitude / (2.0 * h));
            }

            match self.image_type {
                ImageType::Solar if k < 2 => wave *= 1.0 + 0.3 * (0.5 * t).sin(),
                ImageType::Planetary if k < 3 => wave *= 1.0 + 0.2 * (0.2 * t + k as f64).sin(),
                _ => {}
            }
            wave *= rhythm;

            left += wave * self.amplitude * (1.0 + pan);
            right += wave * self.amplitude * (1.0 - pan);
        }

        let envelope = (PI * t / self.duration).sin() * self.gain;
        (
            (left * envelope).clamp(-1.0, 1.0) as f32,
            (right * envelope).clamp(-1.0, 1.0) as f32,
        )
    }
}
