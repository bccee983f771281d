// No-op suspender - for platforms without process suspension

use tracing::warn;

use crate::error::ShrinkXResult;
use crate::ports::ProcessSuspender;

/// Accepts pause and resume requests but leaves the process running
pub struct NoopSuspender;

impl ProcessSuspender for NoopSuspender {
    fn suspend(&self, pid: u32) -> ShrinkXResult<()> {
        warn!(pid, "Pausing is not supported on this platform");
        Ok(())
    }

    fn resume(&self, _pid: u32) -> ShrinkXResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_always_succeeds() {
        assert!(NoopSuspender.suspend(1).is_ok());
        assert!(NoopSuspender.resume(1).is_ok());
    }
}
