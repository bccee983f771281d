// Adapters - External system implementations

pub mod noop_suspend;
#[cfg(unix)]
pub mod signal_suspend;
#[cfg(windows)]
pub mod thread_suspend;
pub mod toml_config;

// Re-export adapters
pub use noop_suspend::NoopSuspender;
#[cfg(unix)]
pub use signal_suspend::SignalSuspender;
#[cfg(windows)]
pub use thread_suspend::ThreadSuspender;
pub use toml_config::{CompressorConfig, TomlConfigAdapter};
