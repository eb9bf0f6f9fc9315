//! Pipeline metrics collection and reporting.
//!
//! Uses HDR histograms for accurate latency percentiles.

use crate::config::MetricsConfig;
use hdrhistogram::Histogram;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A pipeline stage with its own latency histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Analysis,
    Synthesis,
    Encoding,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Decode,
        Stage::Analysis,
        Stage::Synthesis,
        Stage::Encoding,
    ];

    fn index(self) -> usize {
        match self {
            Stage::Decode => 0,
            Stage::Analysis => 1,
            Stage::Synthesis => 2,
            Stage::Encoding => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Analysis => "analysis",
            Stage::Synthesis => "synthesis",
            Stage::Encoding => "encoding",
        }
    }
}

/// Wall-clock time spent in each stage of one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    pub decode: Duration,
    pub analysis: Duration,
    pub synthesis: Duration,
    pub encoding: Duration,
}

impl StageTimings {
    pub fn get(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Decode => self.decode,
            Stage::Analysis => self.analysis,
            Stage::Synthesis => self.synthesis,
            Stage::Encoding => self.encoding,
        }
    }

    pub fn set(&mut self, stage: Stage, duration: Duration) {
        match stage {
            Stage::Decode => self.decode = duration,
            Stage::Analysis => self.analysis = duration,
            Stage::Synthesis => self.synthesis = duration,
            Stage::Encoding => self.encoding = duration,
        }
    }

    pub fn total(&self) -> Duration {
        self.decode + self.analysis + self.synthesis + self.encoding
    }
}

/// Aggregated pipeline metrics
#[derive(Debug)]
pub struct PipelineMetrics {
    /// Per-stage latency histograms (milliseconds), indexed by [`Stage`]
    stage_latency_ms: Vec<Histogram<u64>>,

    /// Total pipeline invocations
    total_requests: AtomicU64,

    /// Invocations that substituted the fallback analysis
    total_fallbacks: AtomicU64,

    /// Invocations that returned an error
    total_failures: AtomicU64,

    /// Total audio samples rendered, per channel
    total_samples: AtomicU64,

    /// Last reset timestamp
    last_reset: Instant,
}

/// Summary of key metrics for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    /// (stage, P50 ms, P99 ms) for every stage
    pub stage_latency_ms: Vec<(Stage, f64, f64)>,

    /// Total pipeline invocations
    pub total_requests: u64,

    /// Invocations served by the fallback analysis
    pub total_fallbacks: u64,

    /// Invocations that failed
    pub total_failures: u64,

    /// Success rate (0.0-1.0); fallbacks count as successes
    pub success_rate: f64,

    /// Total samples rendered per channel
    pub total_samples: u64,

    /// Seconds since creation or last reset
    pub uptime_secs: f64,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    /// Create a collector with the default histogram bounds
    pub fn new() -> Self {
        Self::with_config(&MetricsConfig::default())
    }

    /// Create a collector sized by `config`
    ///
    /// Falls back to 1ms-60s with 2 significant digits if the configured
    /// bounds are rejected by the histogram.
    pub fn with_config(config: &MetricsConfig) -> Self {
        let stage_latency_ms = Stage::ALL
            .iter()
            .map(|_| latency_histogram(config.histogram_max_ms, config.histogram_precision))
            .collect();

        Self {
            stage_latency_ms,
            total_requests: AtomicU64::new(0),
            total_fallbacks: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            total_samples: AtomicU64::new(0),
            last_reset: Instant::now(),
        }
    }

    /// Record one stage's latency
    pub fn record_stage(&mut self, stage: Stage, duration: Duration) {
        let ms = (duration.as_millis() as u64).max(1);

        if let Err(e) = self.stage_latency_ms[stage.index()].record(ms) {
            tracing::warn!("Failed to record {} latency: {}", stage.as_str(), e);
        }
    }

    /// Record a completed invocation
    pub fn record_success(&mut self, timings: &StageTimings, samples: usize, used_fallback: bool) {
        for stage in Stage::ALL {
            if stage == Stage::Analysis && used_fallback {
                continue;
            }
            self.record_stage(stage, timings.get(stage));
        }

        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_samples
            .fetch_add(samples as u64, Ordering::Relaxed);
        if used_fallback {
            self.total_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an invocation that returned an error
    pub fn record_failure(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics summary
    pub fn summary(&self) -> MetricsSummary {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let total_failures = self.total_failures.load(Ordering::Relaxed);
        let success_rate = if total_requests > 0 {
            (total_requests - total_failures) as f64 / total_requests as f64
        } else {
            0.0
        };

        let stage_latency_ms = Stage::ALL
            .iter()
            .map(|&stage| {
                let h = &self.stage_latency_ms[stage.index()];
                (
                    stage,
                    h.value_at_quantile(0.5) as f64,
                    h.value_at_quantile(0.99) as f64,
                )
            })
            .collect();

        MetricsSummary {
            stage_latency_ms,
            total_requests,
            total_fallbacks: self.total_fallbacks.load(Ordering::Relaxed),
            total_failures,
            success_rate,
            total_samples: self.total_samples.load(Ordering::Relaxed),
            uptime_secs: self.last_reset.elapsed().as_secs_f64(),
        }
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        for h in &mut self.stage_latency_ms {
            h.clear();
        }
        self.total_requests.store(0, Ordering::Relaxed);
        self.total_fallbacks.store(0, Ordering::Relaxed);
        self.total_failures.store(0, Ordering::Relaxed);
        self.total_samples.store(0, Ordering::Relaxed);
        self.last_reset = Instant::now();
    }
}

fn latency_histogram(max_ms: u64, precision: u8) -> Histogram<u64> {
    Histogram::new_with_bounds(1, max_ms.max(2), precision.clamp(1, 5)).unwrap_or_else(|e| {
        tracing::warn!("Invalid histogram bounds ({}), using defaults", e);
        Histogram::new_with_bounds(1, 60_000, 2).expect("default histogram bounds are valid")
    })
}

impl MetricsSummary {
    /// Emit the summary as structured log events
    pub fn log(&self) {
        for (stage, p50, p99) in &self.stage_latency_ms {
            tracing::info!(stage = stage.as_str(), p50_ms = p50, p99_ms = p99, "Stage latency");
        }
        tracing::info!(
            requests = self.total_requests,
            fallbacks = self.total_fallbacks,
            failures = self.total_failures,
            success_rate = self.success_rate,
            samples = self.total_samples,
            uptime_secs = self.uptime_secs,
            "Pipeline metrics"
        );
    }
}
