//! Encoder command planning module

use std::path::PathBuf;
use std::time::Duration;

use crate::engine::parser::ParseProfile;

pub mod rates;
pub mod strategy;

pub use strategy::CommandBuilder;

/// Everything needed to launch and follow one encoder run
#[derive(Debug, Clone)]
pub struct CommandPlan {
    /// Arguments passed to the encoder, without the program name
    pub args: Vec<String>,
    /// Destination the encoder writes to
    pub output_path: PathBuf,
    /// How to read the encoder's diagnostic output
    pub profile: ParseProfile,
    /// Source duration if already probed
    pub known_duration: Option<Duration>,
}
