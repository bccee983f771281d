//! Ownership and control of the single live encoder process
//!
//! The child is owned by a waiter task that races natural exit against kill
//! requests, so `cancel` never contends with a pending `wait`. Control callers
//! only touch the active slot, which holds the pid and a channel to the waiter.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::{AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::lines::DiagnosticLines;
use crate::error::{ShrinkXError, ShrinkXResult};
use crate::output::remove_partial_output;
use crate::ports::ProcessSuspender;
use crate::utils::display_command;

/// How a supervised process ended
#[derive(Debug)]
pub enum ExitOutcome {
    Exited(ExitStatus),
    Killed,
}

struct ActiveSlot {
    pid: u32,
    suspended: bool,
    kill_tx: mpsc::Sender<oneshot::Sender<()>>,
}

/// Handle to a started process, held by the supervising task
#[derive(Debug)]
pub struct SupervisedProcess {
    pid: u32,
    lines: mpsc::UnboundedReceiver<String>,
    exit: oneshot::Receiver<io::Result<ExitOutcome>>,
}

impl SupervisedProcess {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Next line from stdout or stderr; `None` once both pipes are closed
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    /// Wait for the process to exit or be killed
    pub async fn wait(self) -> ShrinkXResult<ExitOutcome> {
        match self.exit.await {
            Ok(outcome) => outcome.map_err(ShrinkXError::IoError),
            Err(_) => Err(ShrinkXError::IoError(io::Error::other(
                "process waiter ended without reporting an exit",
            ))),
        }
    }
}

/// Starts, pauses, resumes and kills at most one external process at a time
pub struct ProcessSupervisor {
    slot: Arc<Mutex<Option<ActiveSlot>>>,
    killed: Arc<AtomicBool>,
    suspender: Arc<dyn ProcessSuspender>,
}

impl ProcessSupervisor {
    pub fn new(suspender: Arc<dyn ProcessSuspender>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            killed: Arc::new(AtomicBool::new(false)),
            suspender,
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<ActiveSlot>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Launch `program` with both output pipes captured line by line
    pub fn start(&self, program: &Path, args: &[String]) -> ShrinkXResult<SupervisedProcess> {
        let program_name = program.display().to_string();
        let mut slot = self.lock_slot();
        if let Some(active) = slot.as_ref() {
            warn!(pid = active.pid, "Refusing to start a second process");
            return Err(ShrinkXError::JobAlreadyRunning);
        }

        debug!("Spawning: {}", display_command(&program_name, args));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ShrinkXError::SpawnError {
                program: program_name.clone(),
                source,
            })?;

        let pid = child.id().ok_or_else(|| ShrinkXError::SpawnError {
            program: program_name.clone(),
            source: io::Error::other("process exited before its id could be read"),
        })?;

        let (line_tx, lines) = mpsc::unbounded_channel();
        let readers = [
            child.stdout.take().map(|out| spawn_reader(out, line_tx.clone())),
            child.stderr.take().map(|err| spawn_reader(err, line_tx.clone())),
        ];
        drop(line_tx);

        let (kill_tx, mut kill_rx) = mpsc::channel::<oneshot::Sender<()>>(1);
        let (exit_tx, exit) = oneshot::channel();
        let slot_ref = Arc::clone(&self.slot);

        tokio::spawn(async move {
            let outcome = tokio::select! {
                status = child.wait() => status.map(ExitOutcome::Exited),
                Some(ack) = kill_rx.recv() => {
                    let killed = child.kill().await.map(|_| ExitOutcome::Killed);
                    for reader in readers.iter().flatten() {
                        reader.abort();
                    }
                    clear_slot(&slot_ref, pid);
                    let _ = ack.send(());
                    killed
                }
            };
            clear_slot(&slot_ref, pid);
            match &outcome {
                Ok(ExitOutcome::Exited(status)) => debug!(pid, %status, "Process exited"),
                Ok(ExitOutcome::Killed) => debug!(pid, "Process killed"),
                Err(e) => warn!(pid, "Waiting on process failed: {}", e),
            }
            let _ = exit_tx.send(outcome);
        });

        self.killed.store(false, Ordering::SeqCst);
        *slot = Some(ActiveSlot {
            pid,
            suspended: false,
            kill_tx,
        });
        info!(pid, "Started {}", program_name);

        Ok(SupervisedProcess { pid, lines, exit })
    }

    /// Suspend the active process. Returns whether anything was paused.
    pub fn pause(&self) -> ShrinkXResult<bool> {
        let mut slot = self.lock_slot();
        match slot.as_mut() {
            Some(active) if !active.suspended => {
                self.suspender.suspend(active.pid)?;
                active.suspended = true;
                info!(pid = active.pid, "Process paused");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Resume the active process. Returns whether anything was resumed.
    pub fn resume(&self) -> ShrinkXResult<bool> {
        let mut slot = self.lock_slot();
        match slot.as_mut() {
            Some(active) if active.suspended => {
                self.suspender.resume(active.pid)?;
                active.suspended = false;
                info!(pid = active.pid, "Process resumed");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Kill the active process, wait for it to exit and remove `output` if given
    pub async fn cancel(&self, output: Option<&Path>) -> ShrinkXResult<()> {
        self.killed.store(true, Ordering::SeqCst);

        let kill_tx = self.lock_slot().as_ref().map(|active| active.kill_tx.clone());
        if let Some(kill_tx) = kill_tx {
            let (ack_tx, ack_rx) = oneshot::channel();
            if kill_tx.send(ack_tx).await.is_ok() {
                // The waiter drops the ack without sending if the process exited first.
                let _ = ack_rx.await;
            }
        }

        if let Some(path) = output {
            remove_partial_output(path);
        }
        Ok(())
    }

    /// Whether the current or most recent run was killed
    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.lock_slot().is_some()
    }

    pub fn is_suspended(&self) -> bool {
        self.lock_slot().as_ref().is_some_and(|active| active.suspended)
    }

    pub fn active_pid(&self) -> Option<u32> {
        self.lock_slot().as_ref().map(|active| active.pid)
    }
}

fn clear_slot(slot: &Mutex<Option<ActiveSlot>>, pid: u32) {
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.as_ref().is_some_and(|active| active.pid == pid) {
        *slot = None;
    }
}

fn spawn_reader<R>(pipe: R, tx: mpsc::UnboundedSender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = DiagnosticLines::new(BufReader::new(pipe));
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!("Output pipe read failed: {}", e);
                    break;
                }
            }
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::adapters::NoopSuspender;

    fn supervisor() -> ProcessSupervisor {
        ProcessSupervisor::new(Arc::new(NoopSuspender))
    }

    #[tokio::test]
    async fn test_collects_both_streams() {
        let supervisor = supervisor();
        let args = vec!["-c".to_string(), "printf 'one\\rtwo\\n' >&2; echo three".to_string()];
        let mut process = supervisor.start(Path::new("sh"), &args).unwrap();

        let mut lines = Vec::new();
        while let Some(line) = process.next_line().await {
            lines.push(line);
        }
        lines.sort();
        assert_eq!(lines, vec!["one", "three", "two"]);

        let outcome = process.wait().await.unwrap();
        assert!(matches!(outcome, ExitOutcome::Exited(status) if status.success()));
        assert!(!supervisor.is_active());
        assert!(!supervisor.was_killed());
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let err = supervisor()
            .start(Path::new("/nonexistent/encoder"), &[])
            .unwrap_err();
        assert!(matches!(err, ShrinkXError::SpawnError { ref program, .. } if program == "/nonexistent/encoder"));
    }

    #[tokio::test]
    async fn test_controls_without_process() {
        let supervisor = supervisor();
        assert!(!supervisor.pause().unwrap());
        assert!(!supervisor.resume().unwrap());
        supervisor.cancel(None).await.unwrap();
        assert!(supervisor.active_pid().is_none());
    }
}
