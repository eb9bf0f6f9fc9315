//! 16-bit PCM RIFF/WAVE encoding of [`AudioBuffer`]s, and the inverse reader.

use crate::error::EncodeError;
use crate::synth::AudioBuffer;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;

pub const BITS_PER_SAMPLE: u16 = 16;

/// An encoded container plus the facts a player needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAudio {
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_secs: f64,
}

/// Float sample to signed 16-bit: clamp, then scale by 32767 above zero and
/// 32768 below, rounding to nearest.
#[inline]
pub fn quantize(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s >= 0.0 {
        (s * 32767.0).round() as i16
    } else {
        (s * 32768.0).round() as i16
    }
}

/// Inverse of [`quantize`].
#[inline]
pub fn dequantize(sample: i16) -> f32 {
    if sample >= 0 {
        sample as f32 / 32767.0
    } else {
        sample as f32 / 32768.0
    }
}

/// Serialize `audio` as interleaved stereo 16-bit linear PCM.
///
/// # Errors
///
/// Returns [`EncodeError::ChannelMismatch`] if the channels differ in length.
pub fn encode_wav(audio: &AudioBuffer) -> Result<EncodedAudio, EncodeError> {
    if audio.left.len() != audio.right.len() {
        return Err(EncodeError::ChannelMismatch {
            left: audio.left.len(),
            right: audio.right.len(),
        });
    }

    let spec = WavSpec {
        channels: AudioBuffer::CHANNELS,
        sample_rate: audio.sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + audio.len() * 4));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        let mut samples = writer.get_i16_writer(audio.len() as u32 * 2);
        for (&l, &r) in audio.left.iter().zip(&audio.right) {
            samples.write_sample(quantize(l));
            samples.write_sample(quantize(r));
        }
        samples.flush()?;
        writer.finalize()?;
    }

    let bytes = cursor.into_inner();
    tracing::debug!(bytes = bytes.len(), samples = audio.len(), "Encoded WAV");

    Ok(EncodedAudio {
        bytes,
        sample_rate: audio.sample_rate,
        channels: AudioBuffer::CHANNELS,
        duration_secs: audio.duration_secs(),
    })
}

/// Parse a 16-bit PCM WAV. Mono input is duplicated to both channels.
///
/// # Errors
///
/// Returns [`EncodeError::Wav`] for malformed containers and
/// [`EncodeError::UnsupportedLayout`] for anything but 1-2 channel 16-bit PCM.
pub fn decode_wav(bytes: &[u8]) -> Result<AudioBuffer, EncodeError> {
    let mut reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    if spec.bits_per_sample != BITS_PER_SAMPLE
        || spec.sample_format != SampleFormat::Int
        || !(1..=2).contains(&spec.channels)
    {
        return Err(EncodeError::UnsupportedLayout {
            channels: spec.channels,
            bits: spec.bits_per_sample,
        });
    }

    let samples = reader
        .samples::<i16>()
        .map(|s| s.map(dequantize))
        .collect::<Result<Vec<f32>, _>>()?;

    let (left, right) = match spec.channels {
        1 => (samples.clone(), samples),
        _ => {
            let mut left = Vec::with_capacity(samples.len() / 2);
            let mut right = Vec::with_capacity(samples.len() / 2);
            for chunk in samples.chunks_exact(2) {
                left.push(chunk[0]);
                right.push(chunk[1]);
            }
            (left, right)
        }
    };

    Ok(AudioBuffer {
        sample_rate: spec.sample_rate,
        left,
        right,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(left: Vec<f32>, right: Vec<f32>) -> AudioBuffer {
        AudioBuffer {
            sample_rate: 8000,
            left,
            right,
        }
    }

    #[test]
    fn test_quantize_extremes() {
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32768);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(3.5), 32767);
        assert_eq!(quantize(-7.0), -32768);
        assert_eq!(quantize(f32::NAN), 0);
    }

    #[test]
    fn test_header_fields() {
        let audio = buffer(vec![0.0; 10], vec![0.0; 10]);
        let encoded = encode_wav(&audio).unwrap();
        let b = &encoded.bytes;

        assert_eq!(&b[0..4], b"RIFF");
        assert_eq!(&b[8..12], b"WAVE");
        assert_eq!(&b[12..16], b"fmt ");
        assert_eq!(u16::from_le_bytes([b[20], b[21]]), 1); // linear PCM
        assert_eq!(u16::from_le_bytes([b[22], b[23]]), 2); // channels
        assert_eq!(u32::from_le_bytes([b[24], b[25], b[26], b[27]]), 8000);
        assert_eq!(u32::from_le_bytes([b[28], b[29], b[30], b[31]]), 8000 * 4); // byte rate
        assert_eq!(u16::from_le_bytes([b[32], b[33]]), 4); // block align
        assert_eq!(u16::from_le_bytes([b[34], b[35]]), 16);
        assert_eq!(b.len(), 44 + 10 * 4);
        assert_eq!(encoded.channels, 2);
    }

    #[test]
    fn test_samples_interleaved() {
        let audio = buffer(vec![1.0, 0.0], vec![-1.0, 0.5]);
        let encoded = encode_wav(&audio).unwrap();
        let data = &encoded.bytes[44..];
        let words: Vec<i16> = data
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(words, vec![32767, -32768, 0, 16384]);
    }

    #[test]
    fn test_roundtrip_within_quantization_error() {
        let left: Vec<f32> = (0..500).map(|i| ((i as f32) * 0.037).sin() * 0.9).collect();
        let right: Vec<f32> = (0..500).map(|i| ((i as f32) * 0.011).cos() * -0.7).collect();
        let audio = buffer(left, right);

        let decoded = decode_wav(&encode_wav(&audio).unwrap().bytes).unwrap();
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.len(), audio.len());
        for (a, b) in audio.left.iter().chain(&audio.right).zip(decoded.left.iter().chain(&decoded.right)) {
            assert!((a - b).abs() <= 1.0 / 32768.0, "{a} vs {b}");
        }
    }

    #[test]
    fn test_channel_mismatch() {
        let audio = buffer(vec![0.0; 3], vec![0.0; 2]);
        assert!(matches!(
            encode_wav(&audio),
            Err(EncodeError::ChannelMismatch { left: 3, right: 2 })
        ));
    }

    #[test]
    fn test_decode_mono_duplicates_channel() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for s in [1000i16, -2000, 3000] {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }

        let audio = decode_wav(cursor.get_ref()).unwrap();
        assert_eq!(audio.sample_rate, 22_050);
        assert_eq!(audio.left, audio.right);
        assert_eq!(audio.left.len(), 3);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_wav(b"nope"), Err(EncodeError::Wav { .. })));
    }
}
