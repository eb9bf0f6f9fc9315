use crate::classifier::ImageType;
use crate::config::AppConfig;
use crate::metrics::PipelineMetrics;
use crate::pipeline::{SonificationPipeline, SonificationRequest};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct BatchArgs {
    pub input_pattern: String,
    pub output_dir: PathBuf,
    pub hint: Option<ImageType>,
    pub config: AppConfig,
}

/// Outcome counts for one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub fallbacks: usize,
    pub failed: usize,
}

pub fn run_batch(args: BatchArgs) -> Result<BatchReport> {
    tracing::info!("Starting batch sonification");
    tracing::info!("Input pattern: {}", args.input_pattern);
    tracing::info!("Output directory: {:?}", args.output_dir);

    // Create output directory if it doesn't exist
    fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    // Find files matching the pattern
    let paths: Vec<PathBuf> = glob::glob(&args.input_pattern)
        .context("Failed to read glob pattern")?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();

    let mut report = BatchReport::default();
    if paths.is_empty() {
        tracing::warn!("No files found matching pattern: {}", args.input_pattern);
        return Ok(report);
    }

    tracing::info!("Found {} files to process", paths.len());

    let mut metrics = PipelineMetrics::with_config(&args.config.metrics);
    let metrics_enabled = args.config.metrics.enabled;
    let pipeline = SonificationPipeline::new(args.config);

    for path in paths {
        tracing::info!("Processing file: {:?}", path);

        match process_file(&path, &args.output_dir, &pipeline, args.hint, &mut metrics) {
            Ok(used_fallback) => {
                report.processed += 1;
                if used_fallback {
                    report.fallbacks += 1;
                }
                tracing::info!("Successfully processed {:?}", path);
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!("Failed to process {:?}: {:#}", path, e);
            }
        }
    }

    if metrics_enabled {
        metrics.summary().log();
    }
    tracing::info!(
        processed = report.processed,
        fallbacks = report.fallbacks,
        failed = report.failed,
        "Batch sonification complete"
    );
    Ok(report)
}

fn process_file(
    input_path: &Path,
    output_dir: &Path,
    pipeline: &SonificationPipeline,
    hint: Option<ImageType>,
    metrics: &mut PipelineMetrics,
) -> Result<bool> {
    let file_stem = input_path
        .file_stem()
        .ok_or_else(|| anyhow::anyhow!("Invalid filename: {:?} has no stem", input_path))?;

    // Ensure stem is not empty to prevent ".wav" overwrites
    if file_stem.is_empty() {
        anyhow::bail!("Invalid filename: {:?} has empty stem", input_path);
    }

    let request = SonificationRequest::from_file(input_path)
        .context("Failed to read image file")?
        .with_hint(hint);

    let output = pipeline
        .process_with_metrics(&request, metrics)
        .context("Failed to sonify image")?;

    let wav_path = output_dir.join(PathBuf::from(file_stem).with_extension("wav"));
    fs::write(&wav_path, &output.audio.bytes)
        .with_context(|| format!("Failed to write {:?}", wav_path))?;

    let json_path = output_dir.join(PathBuf::from(file_stem).with_extension("json"));
    let json =
        serde_json::to_string_pretty(&output.analysis).context("Failed to serialize analysis")?;
    fs::write(&json_path, json).with_context(|| format!("Failed to write {:?}", json_path))?;

    Ok(output.used_fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResult;
    use crate::test_fixtures::{encode_png, starfield};
    use tempfile::tempdir;

    fn quick_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.synthesis.sample_rate = 8000;
        config.synthesis.duration_secs = 1;
        config
    }

    #[test]
    fn test_batch_writes_wav_and_json() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();

        let png = encode_png(&starfield(32, 32, &[(8, 8), (20, 20)]));
        fs::write(input.path().join("field.png"), &png).unwrap();
        fs::write(input.path().join("broken.png"), b"not a png").unwrap();

        let report = run_batch(BatchArgs {
            input_pattern: format!("{}/*.png", input.path().display()),
            output_dir: output.path().join("out"),
            hint: Some(ImageType::DeepSky),
            config: quick_config(),
        })
        .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.fallbacks, 1);
        assert_eq!(report.failed, 0);

        let out = output.path().join("out");
        assert!(out.join("field.wav").exists());
        assert!(out.join("broken.wav").exists());

        let json = fs::read_to_string(out.join("broken.json")).unwrap();
        let analysis: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(analysis, AnalysisResult::fallback());
    }

    #[test]
    fn test_batch_no_matches() {
        let dir = tempdir().unwrap();
        let report = run_batch(BatchArgs {
            input_pattern: format!("{}/*.jpg", dir.path().display()),
            output_dir: dir.path().to_path_buf(),
            hint: None,
            config: quick_config(),
        })
        .unwrap();
        assert_eq!(report, BatchReport::default());
    }

    #[test]
    fn test_batch_invalid_config_counts_failures() {
        let input = tempdir().unwrap();
        fs::write(input.path().join("a.png"), b"x").unwrap();

        let mut config = quick_config();
        config.synthesis.duration_secs = 0;

        let report = run_batch(BatchArgs {
            input_pattern: format!("{}/*.png", input.path().display()),
            output_dir: input.path().join("out"),
            hint: None,
            config,
        })
        .unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 0);
    }
}
