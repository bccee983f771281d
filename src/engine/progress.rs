//! Progress sinks for UI integration

use std::io::Write;
use std::path::Path;

use crate::domain::model::ProgressSample;
use crate::error::ShrinkXError;

/// Receives progress and failures from a running job.
///
/// Called from the supervising task; implementations must return quickly.
pub trait ProgressSink: Send + Sync {
    /// Called once the output path is known, before encoding starts
    fn on_output(&self, _path: &Path) {}

    /// Called for each progress update, in the order the encoder reported them
    fn on_progress(&self, sample: &ProgressSample);

    /// Called when the encoder hits a fatal error
    fn on_error(&self, error: &ShrinkXError);
}

/// Console progress bar for interactive CLI usage
pub struct ConsoleProgressSink {
    bar_length: usize,
}

impl ConsoleProgressSink {
    pub fn new() -> Self {
        Self { bar_length: 30 }
    }
}

impl Default for ConsoleProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgressSink {
    fn on_output(&self, path: &Path) {
        println!("Writing {}", path.display());
    }

    fn on_progress(&self, sample: &ProgressSample) {
        let filled = ((sample.fraction * self.bar_length as f64) as usize).min(self.bar_length);
        let bar = "#".repeat(filled) + &"-".repeat(self.bar_length - filled);

        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\r[{}] {:>8}", bar, sample.text);
        if sample.fraction >= 1.0 {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }

    fn on_error(&self, error: &ShrinkXError) {
        println!();
        eprintln!("Error: {}", error);
    }
}

/// JSON lines progress sink for structured output
pub struct JsonProgressSink;

impl ProgressSink for JsonProgressSink {
    fn on_output(&self, path: &Path) {
        let event = serde_json::json!({
            "event": "output",
            "path": path.display().to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }

    fn on_progress(&self, sample: &ProgressSample) {
        let event = serde_json::json!({
            "event": "progress",
            "fraction": sample.fraction,
            "value": sample.value,
            "text": sample.text,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }

    fn on_error(&self, error: &ShrinkXError) {
        let event = serde_json::json!({
            "event": "error",
            "error": error.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }
}
