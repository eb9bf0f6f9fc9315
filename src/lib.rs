// Library interface for the astronomical image sonifier

pub mod analysis;
pub mod batch;
pub mod classifier;
pub mod config;
pub mod detect;
pub mod error;
pub mod frequency;
pub mod metrics;
pub mod pipeline;
pub mod pixels;
pub mod spectrum;
pub mod stats;
pub mod synth;
pub mod wav;

// Test fixtures for synthetic sky images
pub mod test_fixtures;

// Re-export commonly used types
pub use analysis::AnalysisResult;
pub use classifier::ImageType;
pub use config::AppConfig;
pub use error::{Result, SonifyError};
pub use pipeline::{SonificationPipeline, SonificationRequest};
