// Ports - Interface definitions (contracts)

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::model::MediaMetadata;
use crate::error::ShrinkXResult;

/// OS-level suspension of a running process
///
/// Both calls must tolerate a pid that has already exited.
pub trait ProcessSuspender: Send + Sync {
    /// Stop every thread of the process
    fn suspend(&self, pid: u32) -> ShrinkXResult<()>;

    /// Undo all suspensions so the process runs again
    fn resume(&self, pid: u32) -> ShrinkXResult<()>;
}

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a source file and return its metadata
    async fn probe(&self, source: &Path) -> ShrinkXResult<MediaMetadata>;
}

/// Suspender for the current platform
pub fn default_suspender() -> Arc<dyn ProcessSuspender> {
    #[cfg(unix)]
    {
        Arc::new(crate::adapters::SignalSuspender)
    }
    #[cfg(windows)]
    {
        Arc::new(crate::adapters::ThreadSuspender)
    }
    #[cfg(not(any(unix, windows)))]
    {
        Arc::new(crate::adapters::NoopSuspender)
    }
}
