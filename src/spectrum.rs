//! Magnitude spectra and spectral peak picking for rendered audio.

use realfft::RealFftPlanner;
use std::f32::consts::TAU;

/// Hamming-windowed magnitude spectrum, one `(hz, magnitude)` pair per bin
/// from DC up to Nyquist. Magnitudes are scaled by `1 / n`.
pub fn compute_spectrum(samples: &[f32], sample_rate: u32) -> Vec<(f64, f64)> {
    let n = samples.len();
    if n < 2 {
        return Vec::new();
    }

    let fft = RealFftPlanner::<f32>::new().plan_fft_forward(n);
    let span = (n - 1) as f32;
    let mut windowed: Vec<f32> = samples
        .iter()
        .enumerate()
        .map(|(i, &s)| s * (0.54 - 0.46 * (TAU * i as f32 / span).cos()))
        .collect();
    let mut bins = fft.make_output_vec();

    if fft.process(&mut windowed, &mut bins).is_err() {
        return Vec::new();
    }

    let hz_per_bin = sample_rate as f64 / n as f64;
    bins.iter()
        .enumerate()
        .map(|(i, c)| (i as f64 * hz_per_bin, (c.norm() / n as f32) as f64))
        .collect()
}

/// The `count` strongest local maxima of the spectrum, strongest first.
pub fn peak_frequencies(samples: &[f32], sample_rate: u32, count: usize) -> Vec<f64> {
    let spectrum = compute_spectrum(samples, sample_rate);
    if spectrum.len() < 3 {
        return Vec::new();
    }

    let mut peaks: Vec<(f64, f64)> = spectrum
        .windows(3)
        .filter(|w| w[1].1 > w[0].1 && w[1].1 >= w[2].1)
        .map(|w| w[1])
        .collect();
    peaks.sort_by(|a, b| b.1.total_cmp(&a.1));

    peaks.into_iter().take(count).map(|(f, _)| f).collect()
}
