//! Error types for the sonification pipeline.
//!
//! Decode failures are recovered inside the pipeline by substituting a fixed
//! analysis; every other kind is a caller configuration problem and is
//! propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all sonification operations.
#[derive(Error, Debug)]
pub enum SonifyError {
    /// Malformed or unsupported image bytes
    #[error("Image decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Zero-area or inconsistent pixel buffer
    #[error("Image dimension error: {0}")]
    Dimension(#[from] DimensionError),

    /// Invalid synthesis parameters
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// PCM container encoding or decoding errors
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Image decoding errors
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Image input is empty")]
    EmptyInput,

    #[error("Failed to decode image: {source}")]
    Malformed { source: image::ImageError },
}

/// Pixel buffer dimension errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DimensionError {
    #[error("Image has zero area: {width}x{height}")]
    ZeroArea { width: u32, height: u32 },

    #[error("Pixel data length mismatch: expected {expected} bytes, found {found} bytes")]
    LengthMismatch { expected: usize, found: usize },
}

/// Synthesis configuration errors
#[derive(Error, Debug, PartialEq)]
pub enum SynthesisError {
    #[error("Invalid sample rate: {rate} Hz (must be 8kHz-192kHz)")]
    InvalidSampleRate { rate: u32 },

    #[error("Invalid duration: {secs}s (must be 1-600s)")]
    InvalidDuration { secs: u32 },

    #[error("Invalid headroom: {headroom} (must be in (0.0, 1.0])")]
    InvalidHeadroom { headroom: f32 },
}

/// PCM container errors
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("WAV container error: {source}")]
    Wav { source: hound::Error },

    #[error("Channel length mismatch: left has {left} samples, right has {right}")]
    ChannelMismatch { left: usize, right: usize },

    #[error("Unsupported WAV layout: {channels} channels at {bits} bits")]
    UnsupportedLayout { channels: u16, bits: u16 },
}

impl From<hound::Error> for EncodeError {
    fn from(source: hound::Error) -> Self {
        EncodeError::Wav { source }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file '{path}': {source}")]
    LoadFailed {
        path: Box<PathBuf>,
        source: std::io::Error,
    },

    #[error("Invalid config format in '{path}': {source}")]
    InvalidFormat {
        path: Box<PathBuf>,
        source: toml::de::Error,
    },

    #[error("Config validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Failed to save config to '{path}': {source}")]
    SaveFailed {
        path: Box<PathBuf>,
        source: std::io::Error,
    },

    #[error("Config serialization failed: {source}")]
    SerializationFailed { source: toml::ser::Error },
}

/// Result type alias for sonification operations
pub type Result<T, E = SonifyError> = std::result::Result<T, E>;

impl SonifyError {
    /// Whether the pipeline recovers from this error on its own
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SonifyError::Decode(_))
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            SonifyError::Decode(_) => "The image could not be read".to_string(),
            SonifyError::Dimension(DimensionError::ZeroArea { .. }) => {
                "The image has no pixels".to_string()
            }
            SonifyError::Dimension(DimensionError::LengthMismatch { .. }) => {
                "The image data is truncated".to_string()
            }
            SonifyError::Synthesis(SynthesisError::InvalidSampleRate { rate }) => {
                format!("Sample rate {} Hz is not supported", rate)
            }
            SonifyError::Synthesis(SynthesisError::InvalidDuration { secs }) => {
                format!("Duration of {} seconds is not supported", secs)
            }
            SonifyError::Synthesis(SynthesisError::InvalidHeadroom { .. }) => {
                "Output volume setting is out of range".to_string()
            }
            SonifyError::Encode(_) => "The audio could not be written".to_string(),
            SonifyError::Config(_) => "The settings file is invalid".to_string(),
            SonifyError::Io(_) => "A file could not be read or written".to_string(),
        }
    }
}

impl ConfigError {
    /// Get suggested recovery action
    pub fn recovery_hint(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidFormat { .. } => Some("Check the TOML syntax of the config file"),
            ConfigError::ValidationFailed { .. } => {
                Some("Delete the config file to regenerate defaults")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SynthesisError::InvalidSampleRate { rate: 999 };
        assert!(err.to_string().contains("999"));
        assert!(err.to_string().contains("8kHz-192kHz"));
    }

    #[test]
    fn test_only_decode_is_recoverable() {
        let decode: SonifyError = DecodeError::EmptyInput.into();
        assert!(decode.is_recoverable());

        let dimension: SonifyError = DimensionError::ZeroArea {
            width: 0,
            height: 10,
        }
        .into();
        assert!(!dimension.is_recoverable());

        let synthesis: SonifyError = SynthesisError::InvalidDuration { secs: 0 }.into();
        assert!(!synthesis.is_recoverable());
    }

    #[test]
    fn test_user_messages() {
        let err: SonifyError = SynthesisError::InvalidSampleRate { rate: 1000 }.into();
        let msg = err.user_message();
        assert!(msg.contains("1000"));
        assert!(!msg.contains("Error")); // User-friendly, not technical
    }

    #[test]
    fn test_recovery_hints() {
        let err = ConfigError::ValidationFailed {
            reason: "bad".to_string(),
        };
        assert!(err.recovery_hint().is_some());
        assert!(err.recovery_hint().unwrap().contains("defaults"));
    }
}
