// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pause / resume / cancel: the control protocols.
//
// Each protocol signals the job's whole process group, then (for pause and
// resume) waits for the reaper to observe the resulting transition.  Both
// waits are bounded poll loops (the command thread must stay responsive)
// and both run with SIGCHLD blocked so no status change is lost between the
// signal and the wait; the previous mask is restored on every exit path.

use std::thread;

use nix::sys::signal::{SigSet, Signal, SigmaskHow, killpg, sigprocmask};
use nix::unistd::Pid;
use tracing::{debug, warn};

use spoolwerk_core::error::{Result, SpoolError};
use spoolwerk_core::types::{JobId, JobStatus};

use crate::spooler::Spooler;

/// Blocks SIGCHLD for the current scope; the prior mask comes back when the
/// guard drops, on every exit path.
struct SigChldGuard {
    prev: SigSet,
}

impl SigChldGuard {
    fn block() -> Result<Self> {
        let mut mask = SigSet::empty();
        mask.add(Signal::SIGCHLD);
        let mut prev = SigSet::empty();
        sigprocmask(SigmaskHow::SIG_BLOCK, Some(&mask), Some(&mut prev))
            .map_err(|e| SpoolError::Signal(format!("block SIGCHLD: {e}")))?;
        Ok(Self { prev })
    }
}

impl Drop for SigChldGuard {
    fn drop(&mut self) {
        if let Err(e) = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.prev), None) {
            warn!(error = %e, "failed to restore signal mask");
        }
    }
}

impl Spooler {
    /// Pause a running job by stopping its whole process group.
    ///
    /// Pausing an already-paused job succeeds as a no-op; any other
    /// non-Running state is a "not running" error.  The call waits, bounded,
    /// for the reaper to observe the stop; on timeout the job's state is
    /// left as actually observed.
    pub fn pause(&mut self, id: JobId) -> Result<()> {
        let job = self.registry.job(id).ok_or(SpoolError::UnknownJob(id))?;
        match job.status {
            JobStatus::Paused => return Ok(()),
            JobStatus::Running => {}
            _ => return Err(SpoolError::NotRunning(id)),
        }
        let pgid = job.pgid.ok_or(SpoolError::NotRunning(id))?;

        let _guard = SigChldGuard::block()?;
        killpg(Pid::from_raw(pgid), Signal::SIGSTOP)
            .map_err(|e| SpoolError::Signal(format!("stop group {pgid}: {e}")))?;
        debug!(job = %id, pgid, "stop signal sent");

        if self.await_status(id, JobStatus::Paused) {
            Ok(())
        } else {
            Err(SpoolError::PauseTimeout(id))
        }
    }

    /// Resume a paused job by continuing its process group.
    ///
    /// Resuming a job in any non-Paused state succeeds as a no-op.  The
    /// wait is bounded like pause's: an unbounded wait would hang forever
    /// if the group never continues.
    pub fn resume(&mut self, id: JobId) -> Result<()> {
        let job = self.registry.job(id).ok_or(SpoolError::UnknownJob(id))?;
        if job.status != JobStatus::Paused {
            return Ok(());
        }
        let pgid = job.pgid.ok_or(SpoolError::NotRunning(id))?;

        let _guard = SigChldGuard::block()?;
        killpg(Pid::from_raw(pgid), Signal::SIGCONT)
            .map_err(|e| SpoolError::Signal(format!("continue group {pgid}: {e}")))?;
        debug!(job = %id, pgid, "continue signal sent");

        if self.await_status(id, JobStatus::Running) {
            Ok(())
        } else {
            Err(SpoolError::ResumeTimeout(id))
        }
    }

    /// Cancel a job from any non-terminal state.
    ///
    /// Fire-and-forget: the terminate signal is sent group-wide (followed by
    /// a continue, since a stopped group never sees SIGTERM alone) and the
    /// job is optimistically marked Aborted without waiting for the reaper.
    /// The reaper's later observation of the dead stages is a no-op against
    /// the already-Aborted job.  Cancelling twice succeeds both times but
    /// notifies only once.
    pub fn cancel(&mut self, id: JobId) -> Result<()> {
        let job = self.registry.job_mut(id).ok_or(SpoolError::UnknownJob(id))?;
        match job.status {
            JobStatus::Aborted => return Ok(()),
            JobStatus::Finished | JobStatus::Deleted => {
                return Err(SpoolError::JobComplete {
                    id,
                    status: job.status,
                });
            }
            _ => {}
        }

        if let Some(pgid) = job.pgid {
            let group = Pid::from_raw(pgid);
            if let Err(e) = killpg(group, Signal::SIGTERM) {
                warn!(job = %id, pgid, error = %e, "terminate signal failed");
            }
            if let Err(e) = killpg(group, Signal::SIGCONT) {
                warn!(job = %id, pgid, error = %e, "continue-after-terminate failed");
            }
            debug!(job = %id, pgid, "terminate signal sent");
        }

        if let Some(job) = self.registry.job_mut(id) {
            job.set_status(JobStatus::Aborted);
        }
        if let Some(job) = self.registry.job(id) {
            self.observer.job_status(job);
        }
        self.observer.job_aborted(id);
        Ok(())
    }

    /// Bounded poll loop interleaving short sleeps with reap attempts until
    /// the job reaches `wanted`.  Returns false on timeout, or as soon as
    /// the job lands in some other state it can never leave for `wanted`.
    fn await_status(&mut self, id: JobId, wanted: JobStatus) -> bool {
        for _ in 0..self.config.control_poll_limit {
            thread::sleep(self.config.control_poll());
            self.reap();
            match self.registry.job(id).map(|j| j.status) {
                Some(status) if status == wanted => return true,
                // Terminal states are final; keep polling only while the
                // pipeline is still alive.
                Some(status) if status.is_terminal() => return false,
                None => return false,
                _ => {}
            }
        }
        false
    }
}
