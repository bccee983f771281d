//! ShrinkX media compressor library
//!
//! Drives an external ffmpeg process to compress a single video, audio or
//! image file under one of several strategies, turning its diagnostic
//! output into a progress signal and typed failures. A running job can be
//! paused, resumed or cancelled.

pub mod adapters;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod output;
pub mod planner;
pub mod ports;
pub mod probe;
pub mod utils;

// Re-export commonly used types
pub use domain::model::{
    CompressionStrategy, Job, JobState, MediaKind, MediaMetadata, ProgressSample, SpeedPreset,
};
pub use engine::{EngineConfig, JobOutcome, ProgressSink, TranscodeEngine};
pub use error::{ShrinkXError, ShrinkXResult};
