// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Spoolwerk print spooler.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp format used in job and printer listings.
const LISTING_TIME_FORMAT: &str = "%d %b %H:%M:%S";

/// Unique identifier for a print job.
///
/// Ids are assigned once, increase monotonically, and are never reused.
/// They are the sole key for all control operations; a job's position in
/// any listing is an implementation detail and carries no identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Queued, waiting for an eligible idle printer.
    Created,
    /// A conversion pipeline is feeding the printer.
    Running,
    /// The pipeline's process group is stopped.
    Paused,
    /// The pipeline failed, was signalled, or the job was cancelled.
    Aborted,
    /// Every pipeline stage exited cleanly.
    Finished,
    /// Removed by the expiry sweeper.
    Deleted,
}

impl JobStatus {
    /// Lower-case name used in listings and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Aborted => "aborted",
            Self::Finished => "finished",
            Self::Deleted => "deleted",
        }
    }

    /// Whether the job has reached a pre-delete terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Aborted | Self::Deleted)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle states of a printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterStatus {
    /// Defined but not accepting jobs.
    Disabled,
    /// Ready for the dispatch engine.
    Idle,
    /// Owned by exactly one running or paused job.
    Busy,
}

impl PrinterStatus {
    /// Lower-case name used in listings and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Idle => "idle",
            Self::Busy => "busy",
        }
    }
}

impl std::fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a printer connection is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectMode {
    /// Normal data connection for a dispatched job.
    Normal,
    /// Probe connection; opened and dropped without sending a job.
    Probe,
}

/// One stage of a conversion pipeline: an external command plus arguments,
/// reading the previous stage on stdin and writing the next on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStep {
    pub command: String,
    pub args: Vec<String>,
}

impl ConversionStep {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

/// A print job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Path of the source file to print.
    pub file: PathBuf,
    /// Declared type of the source file.
    pub file_type: String,
    pub status: JobStatus,
    /// Printers this job may be routed to.
    pub eligible: BTreeSet<String>,
    /// Process group of the running pipeline; Some once the job has been
    /// dispatched, until the record is deleted.
    pub pgid: Option<i32>,
    pub created_at: DateTime<Utc>,
    /// When `status` last changed; the expiry sweeper's clock source.
    pub changed_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: JobId, file: PathBuf, file_type: String, eligible: BTreeSet<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            file,
            file_type,
            status: JobStatus::Created,
            eligible,
            pgid: None,
            created_at: now,
            changed_at: now,
        }
    }

    /// Whether the job currently owns a live pipeline.
    pub fn is_active(&self) -> bool {
        matches!(self.status, JobStatus::Running | JobStatus::Paused)
    }

    /// Move to a new status and stamp the change time.
    pub fn set_status(&mut self, status: JobStatus) {
        self.status = status;
        self.changed_at = Utc::now();
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let eligible: Vec<&str> = self.eligible.iter().map(String::as_str).collect();
        write!(
            f,
            "JOB[{}]: type={}, creation({}), status({})={}, eligible=[{}], file={}",
            self.id,
            self.file_type,
            self.created_at.format(LISTING_TIME_FORMAT),
            self.changed_at.format(LISTING_TIME_FORMAT),
            self.status,
            eligible.join(","),
            self.file.display(),
        )
    }
}

/// A printer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Printer {
    /// Unique name, fixed at definition time.
    pub name: String,
    /// The file type this printer accepts natively.
    pub file_type: String,
    pub status: PrinterStatus,
    /// Process group of the job currently feeding this printer; Some iff Busy.
    pub pgid: Option<i32>,
    /// A disable was requested while Busy; applied on release.
    pub pending_disable: bool,
}

impl Printer {
    pub fn new(name: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_type: file_type.into(),
            status: PrinterStatus::Disabled,
            pgid: None,
            pending_disable: false,
        }
    }
}

impl std::fmt::Display for Printer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PRINTER: name={}, type={}, status={}",
            self.name, self.file_type, self.status
        )
    }
}
