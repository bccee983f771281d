//! Core transcoding engine module

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub mod lines;
pub mod parser;
pub mod progress;
pub mod state;
pub mod supervisor;
pub mod transcoder;

pub use progress::{ConsoleProgressSink, JsonProgressSink, ProgressSink};
pub use supervisor::{ExitOutcome, ProcessSupervisor, SupervisedProcess};
pub use transcoder::{JobOutcome, TranscodeEngine};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Encoder executable, looked up on `PATH` when not absolute
    pub ffmpeg_path: PathBuf,
    /// Value reported to progress sinks at 100%
    pub progress_max: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            progress_max: 100.0,
        }
    }
}
