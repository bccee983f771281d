// Signal suspender - SIGSTOP/SIGCONT based pause for Unix

use std::io;

use tracing::debug;

use crate::error::{ShrinkXError, ShrinkXResult};
use crate::ports::ProcessSuspender;

/// Pauses a process with `SIGSTOP` and continues it with `SIGCONT`.
///
/// `SIGCONT` clears the stop regardless of how many `SIGSTOP`s were sent, so
/// resuming needs only one signal and is harmless on a running process.
pub struct SignalSuspender;

impl SignalSuspender {
    fn signal(pid: u32, signal: libc::c_int) -> ShrinkXResult<()> {
        let pid = libc::pid_t::try_from(pid).map_err(|_| ShrinkXError::InvalidParameters {
            message: format!("Process id out of range: {}", pid),
        })?;

        // SAFETY: kill(2) has no memory-safety preconditions.
        let rc = unsafe { libc::kill(pid, signal) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            debug!(pid, "Process already gone, nothing to signal");
            return Ok(());
        }
        Err(ShrinkXError::IoError(err))
    }
}

impl ProcessSuspender for SignalSuspender {
    fn suspend(&self, pid: u32) -> ShrinkXResult<()> {
        debug!(pid, "Sending SIGSTOP");
        Self::signal(pid, libc::SIGSTOP)
    }

    fn resume(&self, pid: u32) -> ShrinkXResult<()> {
        debug!(pid, "Sending SIGCONT");
        Self::signal(pid, libc::SIGCONT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_suspend_and_resume_child() {
        let mut child = Command::new("sleep").arg("5").spawn().unwrap();
        let suspender = SignalSuspender;

        suspender.suspend(child.id()).unwrap();
        suspender.resume(child.id()).unwrap();
        suspender.resume(child.id()).unwrap();

        child.kill().unwrap();
        child.wait().unwrap();
    }
}
