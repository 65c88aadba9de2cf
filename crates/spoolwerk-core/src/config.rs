// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spooler configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable spooler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoolConfig {
    /// How long a finished or aborted job stays visible before the expiry
    /// sweeper removes it (seconds).
    pub retention_secs: u64,
    /// Sleep between polls while waiting for a pause/resume to be observed
    /// (milliseconds).
    pub control_poll_ms: u64,
    /// Maximum number of polls before a pause/resume is reported as failed.
    pub control_poll_limit: u32,
    /// Maximum number of jobs held in the registry at once.
    pub max_jobs: usize,
    /// Maximum number of printers that may be defined.
    pub max_printers: usize,
    /// Directory where the spool-directory connector writes printer sinks.
    pub spool_dir: PathBuf,
}

impl SpoolConfig {
    /// Retention window as a `Duration`.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Poll interval as a `Duration`.
    pub fn control_poll(&self) -> Duration {
        Duration::from_millis(self.control_poll_ms)
    }
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            retention_secs: 10,
            control_poll_ms: 1,
            control_poll_limit: 1000,
            max_jobs: 64,
            max_printers: 32,
            spool_dir: PathBuf::from("spool-out"),
        }
    }
}
