// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The reaper: non-blocking drain of child-process status changes.
//
// Each active process group is drained with
// `waitpid(-pgid, WNOHANG | WUNTRACED | WCONTINUED)` until the group
// reports nothing further.  Stops and continues flip the owning job between
// Paused and Running; exits shrink the group's live set, and when the last
// stage is gone the aggregate result decides Finished vs Aborted.

use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use tracing::{debug, trace, warn};

use spoolwerk_core::types::{JobStatus, PrinterStatus};

use crate::spooler::Spooler;

impl Spooler {
    /// Drain every pending status change for every active process group.
    /// Never blocks; must run after every pipeline launch and on every
    /// command cycle so printers are not stranded Busy.
    pub fn reap(&mut self) {
        for pgid in self.registry.active_pgids() {
            self.drain_group(pgid);
        }
    }

    fn drain_group(&mut self, pgid: i32) {
        let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
        loop {
            match waitpid(Pid::from_raw(-pgid), Some(flags)) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(WaitStatus::Exited(pid, code)) => {
                    trace!(pgid, pid = pid.as_raw(), code, "stage exited");
                    self.stage_done(pgid, pid.as_raw(), code == 0);
                }
                Ok(WaitStatus::Signaled(pid, sig, _)) => {
                    trace!(pgid, pid = pid.as_raw(), signal = ?sig, "stage killed");
                    self.stage_done(pgid, pid.as_raw(), false);
                }
                Ok(WaitStatus::Stopped(..)) => self.group_stopped(pgid),
                Ok(WaitStatus::Continued(..)) => self.group_continued(pgid),
                Ok(status) => {
                    trace!(pgid, ?status, "ignoring unmatched status change");
                }
                Err(Errno::ECHILD) => break,
                Err(e) => {
                    warn!(pgid, error = %e, "waitpid failed");
                    break;
                }
            }
        }
    }

    /// A stage left the group; when the last one is gone, settle the job.
    fn stage_done(&mut self, pgid: i32, pid: i32, clean: bool) {
        let Some(group) = self.registry.group_mut(pgid) else {
            return;
        };
        group.live.remove(&pid);
        if !clean {
            group.failed = true;
        }
        if group.live.is_empty() {
            let failed = group.failed;
            self.settle_group(pgid, failed);
        }
    }

    /// Every stage has exited: transition the job, release the printer.
    fn settle_group(&mut self, pgid: i32, failed: bool) {
        self.registry.remove_group(pgid);

        if let Some(job) = self.registry.job_by_pgid_mut(pgid) {
            let id = job.id;
            // A cancelled job is already Aborted; the late observation of
            // its terminated stages must not produce a second transition.
            if !job.status.is_terminal() {
                let status = if failed {
                    JobStatus::Aborted
                } else {
                    JobStatus::Finished
                };
                job.set_status(status);
                debug!(job = %id, pgid, %status, "job settled");
                if let Some(job) = self.registry.job(id) {
                    self.observer.job_status(job);
                }
                if failed {
                    self.observer.job_aborted(id);
                } else {
                    self.observer.job_finished(id);
                }
            }
        }

        self.release_printer(pgid);
    }

    /// Return the printer owning this group to Idle, or straight to
    /// Disabled when a disable was requested while it was Busy.
    fn release_printer(&mut self, pgid: i32) {
        let Some(printer) = self.registry.printer_by_pgid_mut(pgid) else {
            return;
        };
        printer.status = if printer.pending_disable {
            PrinterStatus::Disabled
        } else {
            PrinterStatus::Idle
        };
        printer.pending_disable = false;
        printer.pgid = None;
        let name = printer.name.clone();
        debug!(printer = %name, pgid, "printer released");
        if let Some(printer) = self.registry.printer(&name) {
            self.observer.printer_status(printer);
        }
    }

    /// A stop was observed: the pause protocol's synchronization point.
    /// Internal only; no outward notification.
    fn group_stopped(&mut self, pgid: i32) {
        if let Some(job) = self.registry.job_by_pgid_mut(pgid) {
            if job.status == JobStatus::Running {
                job.set_status(JobStatus::Paused);
                debug!(job = %job.id, pgid, "job paused");
            }
        }
    }

    fn group_continued(&mut self, pgid: i32) {
        if let Some(job) = self.registry.job_by_pgid_mut(pgid) {
            if job.status == JobStatus::Paused {
                job.set_status(JobStatus::Running);
                debug!(job = %job.id, pgid, "job resumed");
            }
        }
    }
}
