use anyhow::{Context, Result};
use astro_sonify::batch::{run_batch, BatchArgs};
use astro_sonify::metrics::PipelineMetrics;
use astro_sonify::pipeline::{SonificationPipeline, SonificationRequest};
use astro_sonify::{AppConfig, ImageType};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Turn astronomical images into stereo soundscapes
#[derive(Parser, Debug)]
#[command(version, about = "Astronomical image sonifier")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sonify a single image into a WAV file
    Render {
        /// Input image (PNG, JPEG or TIFF)
        image: PathBuf,

        /// Output WAV path (defaults to the image path with a .wav extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the analysis as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Sonify every image matching a glob pattern
    Batch {
        /// Glob pattern, e.g. "captures/*.png"
        pattern: String,

        /// Directory receiving <stem>.wav and <stem>.json
        out_dir: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Image type: deep-sky, planetary, solar, lunar or mixed
    #[arg(long)]
    hint: Option<ImageType>,

    /// Duration in whole seconds
    #[arg(long)]
    duration: Option<u32>,

    /// Output sample rate in Hz
    #[arg(long = "sample-rate")]
    sample_rate: Option<u32>,

    /// TOML config file (defaults to the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl CommonArgs {
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_from_file(path).map_err(|e| {
                match e.recovery_hint().map(str::to_owned) {
                    Some(hint) => anyhow::anyhow!("{} ({})", e, hint),
                    None => anyhow::anyhow!(e),
                }
            })?,
            None => {
                let path = AppConfig::default_path();
                if path.exists() {
                    AppConfig::load_or_default(path)
                } else {
                    AppConfig::default()
                }
            }
        };

        if let Some(secs) = self.duration {
            config.synthesis.duration_secs = secs;
        }
        if let Some(rate) = self.sample_rate {
            config.synthesis.sample_rate = rate;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Render {
            image,
            output,
            json,
            common,
        } => render(&image, output, json, &common),
        Command::Batch {
            pattern,
            out_dir,
            common,
        } => {
            let report = run_batch(BatchArgs {
                input_pattern: pattern,
                output_dir: out_dir,
                hint: common.hint,
                config: common.load_config()?,
            })?;
            if report.failed > 0 {
                anyhow::bail!("{} of {} files failed", report.failed, report.failed + report.processed);
            }
            Ok(())
        }
    }
}

fn render(
    image: &Path,
    output: Option<PathBuf>,
    json: Option<PathBuf>,
    common: &CommonArgs,
) -> Result<()> {
    let config = common.load_config()?;
    let metrics_enabled = config.metrics.enabled;
    let mut metrics = PipelineMetrics::with_config(&config.metrics);
    let pipeline = SonificationPipeline::new(config);

    let request = SonificationRequest::from_file(image)
        .with_context(|| format!("Failed to read {:?}", image))?
        .with_hint(common.hint);

    let result = pipeline
        .process_with_metrics(&request, &mut metrics)
        .map_err(|e| anyhow::anyhow!("{}: {}", e.user_message(), e))?;

    let wav_path = output.unwrap_or_else(|| image.with_extension("wav"));
    std::fs::write(&wav_path, &result.audio.bytes)
        .with_context(|| format!("Failed to write {:?}", wav_path))?;
    tracing::info!(path = ?wav_path, seconds = result.audio.duration_secs, "Wrote WAV");

    if let Some(json_path) = json {
        let text = serde_json::to_string_pretty(&result.analysis)
            .context("Failed to serialize analysis")?;
        std::fs::write(&json_path, text)
            .with_context(|| format!("Failed to write {:?}", json_path))?;
    }

    if metrics_enabled {
        metrics.summary().log();
    }
    Ok(())
}
