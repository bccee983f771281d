// Thread suspender - per-thread suspension through the Win32 toolhelp API

use std::io;

use tracing::debug;
use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::processthreadsapi::{OpenThread, ResumeThread, SuspendThread};
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Thread32First, Thread32Next, TH32CS_SNAPTHREAD, THREADENTRY32,
};
use winapi::um::winnt::{HANDLE, THREAD_SUSPEND_RESUME};

use crate::error::{ShrinkXError, ShrinkXResult};
use crate::ports::ProcessSuspender;

const FAILED: DWORD = DWORD::MAX;

/// Suspends and resumes every thread owned by a process
pub struct ThreadSuspender;

struct OwnedHandle(HANDLE);

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by a successful Win32 open call and is closed once.
        unsafe {
            CloseHandle(self.0);
        }
    }
}

impl ThreadSuspender {
    /// Open each thread of `pid` and hand it to `action`
    fn for_each_thread(pid: u32, mut action: impl FnMut(HANDLE)) -> ShrinkXResult<()> {
        // SAFETY: plain Win32 calls; the entry struct is sized before use and
        // every handle is wrapped so it is closed on all paths.
        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPTHREAD, 0);
            if snapshot == INVALID_HANDLE_VALUE {
                return Err(ShrinkXError::IoError(io::Error::last_os_error()));
            }
            let snapshot = OwnedHandle(snapshot);

            let mut entry: THREADENTRY32 = std::mem::zeroed();
            entry.dwSize = std::mem::size_of::<THREADENTRY32>() as DWORD;

            let mut more = Thread32First(snapshot.0, &mut entry) != FALSE;
            while more {
                if entry.th32OwnerProcessID == pid {
                    let thread = OpenThread(THREAD_SUSPEND_RESUME, FALSE, entry.th32ThreadID);
                    if !thread.is_null() {
                        let thread = OwnedHandle(thread);
                        action(thread.0);
                    }
                }
                more = Thread32Next(snapshot.0, &mut entry) != FALSE;
            }
        }
        Ok(())
    }
}

impl ProcessSuspender for ThreadSuspender {
    fn suspend(&self, pid: u32) -> ShrinkXResult<()> {
        let mut count = 0usize;
        Self::for_each_thread(pid, |thread| {
            // SAFETY: `thread` was opened with THREAD_SUSPEND_RESUME.
            if unsafe { SuspendThread(thread) } != FAILED {
                count += 1;
            }
        })?;
        debug!(pid, threads = count, "Suspended threads");
        Ok(())
    }

    fn resume(&self, pid: u32) -> ShrinkXResult<()> {
        Self::for_each_thread(pid, |thread| loop {
            // ResumeThread returns the previous count and only drops it by one.
            // SAFETY: `thread` was opened with THREAD_SUSPEND_RESUME.
            let previous = unsafe { ResumeThread(thread) };
            if previous == FAILED || previous <= 1 {
                break;
            }
        })?;
        debug!(pid, "Resumed threads");
        Ok(())
    }
}
