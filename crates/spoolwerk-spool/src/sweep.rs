// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The expiry sweeper: terminal jobs older than the retention window are
// removed from the registry.  The clock is a parameter so the boundary is
// testable to the instant.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use spoolwerk_core::types::{JobId, JobStatus};

use crate::spooler::Spooler;

impl Spooler {
    /// Remove every Finished/Aborted job whose last status change is at
    /// least the retention window in the past.
    pub fn sweep(&mut self) {
        self.sweep_at(Utc::now());
    }

    pub(crate) fn sweep_at(&mut self, now: DateTime<Utc>) {
        let retention = TimeDelta::seconds(self.config.retention_secs as i64);
        let expired: Vec<JobId> = self
            .registry
            .jobs()
            .filter(|j| {
                matches!(j.status, JobStatus::Finished | JobStatus::Aborted)
                    && now - j.changed_at >= retention
            })
            .map(|j| j.id)
            .collect();

        for id in expired {
            if let Some(job) = self.registry.job_mut(id) {
                job.set_status(JobStatus::Deleted);
            }
            self.observer.job_deleted(id);
            self.registry.remove_job(id);
            debug!(job = %id, "expired job deleted");
        }
    }
}
