//! End-to-end orchestration: image bytes in, analysis and WAV bytes out.

use crate::analysis::{analyze_pixels, AnalysisResult};
use crate::classifier::ImageType;
use crate::config::AppConfig;
use crate::error::Result;
use crate::metrics::{PipelineMetrics, Stage, StageTimings};
use crate::pixels::load_pixels;
use crate::synth::render;
use crate::wav::{encode_wav, EncodedAudio};
use std::path::Path;
use std::time::Instant;

/// One sonification job.
#[derive(Debug, Clone, Default)]
pub struct SonificationRequest {
    pub image_bytes: Vec<u8>,
    pub hint: Option<ImageType>,
    /// Consulted by the classifier when no hint is given.
    pub filename: Option<String>,
}

impl SonificationRequest {
    pub fn new(image_bytes: Vec<u8>) -> Self {
        Self {
            image_bytes,
            ..Self::default()
        }
    }

    /// Read an image file, remembering its file name for classification.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image_bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(Self {
            image_bytes,
            hint: None,
            filename,
        })
    }

    pub fn with_hint(mut self, hint: Option<ImageType>) -> Self {
        self.hint = hint;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Everything one invocation produces.
#[derive(Debug, Clone)]
pub struct SonificationOutput {
    pub analysis: AnalysisResult,
    pub audio: EncodedAudio,
    pub timings: StageTimings,
    /// The image could not be decoded and the fixed fallback analysis was used.
    pub used_fallback: bool,
}

pub struct SonificationPipeline {
    config: AppConfig,
}

impl SonificationPipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run decode, analysis, synthesis and encoding in sequence.
    ///
    /// # Errors
    ///
    /// Undecodable images are not errors: they are replaced by
    /// [`AnalysisResult::fallback`]. Invalid synthesis parameters, inconsistent
    /// dimensions and encoder failures are returned.
    pub fn process(&self, request: &SonificationRequest) -> Result<SonificationOutput> {
        let params = self.config.synthesis.params();
        params.validate()?;

        let mut timings = StageTimings::default();

        let start = Instant::now();
        let decoded = match load_pixels(&request.image_bytes, self.config.loader.max_dimension) {
            Ok(pixels) => Some(pixels),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(
                    error = %e,
                    filename = request.filename.as_deref().unwrap_or("<memory>"),
                    "Image decode failed, using fallback analysis"
                );
                None
            }
            Err(e) => return Err(e),
        };
        timings.set(Stage::Decode, start.elapsed());

        let used_fallback = decoded.is_none();
        let analysis = match decoded {
            Some(pixels) => {
                let start = Instant::now();
                let analysis =
                    analyze_pixels(&pixels, request.hint, request.filename.as_deref());
                timings.set(Stage::Analysis, start.elapsed());
                analysis
            }
            None => AnalysisResult::fallback(),
        };

        let start = Instant::now();
        let buffer = render(&analysis, &params)?;
        timings.set(Stage::Synthesis, start.elapsed());

        let start = Instant::now();
        let audio = encode_wav(&buffer)?;
        timings.set(Stage::Encoding, start.elapsed());

        tracing::info!(
            image_type = %analysis.image_type,
            objects = analysis.total_objects(),
            used_fallback,
            total_ms = timings.total().as_millis() as u64,
            "Sonification complete"
        );

        Ok(SonificationOutput {
            analysis,
            audio,
            timings,
            used_fallback,
        })
    }

    /// [`process`](Self::process), recording the outcome into `metrics`.
    pub fn process_with_metrics(
        &self,
        request: &SonificationRequest,
        metrics: &mut PipelineMetrics,
    ) -> Result<SonificationOutput> {
        match self.process(request) {
            Ok(output) => {
                let samples = self.config.synthesis.params().sample_count();
                metrics.record_success(&output.timings, samples, output.used_fallback);
                Ok(output)
            }
            Err(e) => {
                metrics.record_failure();
                Err(e)
            }
        }
    }
}

impl Default for SonificationPipeline {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SonifyError, SynthesisError};
    use crate::test_fixtures::{encode_png, starfield};
    use crate::wav::decode_wav;

    fn quick_pipeline() -> SonificationPipeline {
        let mut config = AppConfig::default();
        config.synthesis.sample_rate = 8000;
        config.synthesis.duration_secs = 1;
        SonificationPipeline::new(config)
    }

    #[test]
    fn test_process_starfield() {
        let bytes = encode_png(&starfield(48, 48, &[(10, 10), (30, 20)]));
        let request = SonificationRequest::new(bytes).with_hint(Some(ImageType::DeepSky));

        let output = quick_pipeline().process(&request).unwrap();
        assert!(!output.used_fallback);
        assert_eq!(output.analysis.image_type, ImageType::DeepSky);
        assert_eq!(output.analysis.counts.stars, 2);
        assert_eq!(output.audio.sample_rate, 8000);

        let decoded = decode_wav(&output.audio.bytes).unwrap();
        assert_eq!(decoded.len(), 8000);
    }

    #[test]
    fn test_garbage_bytes_use_fallback() {
        let request = SonificationRequest::new(b"definitely not an image".to_vec());
        let output = quick_pipeline().process(&request).unwrap();

        assert!(output.used_fallback);
        assert_eq!(output.analysis, AnalysisResult::fallback());
        assert_eq!(output.timings.analysis, std::time::Duration::ZERO);
    }

    #[test]
    fn test_empty_bytes_use_fallback() {
        let output = quick_pipeline()
            .process(&SonificationRequest::new(Vec::new()))
            .unwrap();
        assert!(output.used_fallback);
    }

    #[test]
    fn test_invalid_sample_rate_is_fatal() {
        let mut config = AppConfig::default();
        config.synthesis.sample_rate = 100;
        let pipeline = SonificationPipeline::new(config);

        let err = pipeline
            .process(&SonificationRequest::new(Vec::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            SonifyError::Synthesis(SynthesisError::InvalidSampleRate { rate: 100 })
        ));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_metrics_recorded() {
        let pipeline = quick_pipeline();
        let mut metrics = PipelineMetrics::new();

        pipeline
            .process_with_metrics(&SonificationRequest::new(vec![1, 2, 3]), &mut metrics)
            .unwrap();

        let summary = metrics.summary();
        assert_eq!(summary.total_requests, 1);
        assert_eq!(summary.total_fallbacks, 1);
        assert_eq!(summary.total_samples, 8000);
    }

    #[test]
    fn test_filename_drives_classification() {
        let bytes = encode_png(&starfield(32, 32, &[(16, 16)]));
        let request = SonificationRequest::new(bytes).with_filename("full_moon.png");
        let output = quick_pipeline().process(&request).unwrap();
        assert_eq!(output.analysis.image_type, ImageType::Lunar);
    }
}
