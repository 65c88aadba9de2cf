// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Spoolwerk.

use thiserror::Error;

use crate::types::{JobId, JobStatus};

/// Top-level error type for all Spoolwerk operations.
///
/// No error here is fatal to the spooler: every failure is scoped to a
/// single job or command, reported to the caller, and leaves the registry
/// in a consistent state.
#[derive(Debug, Error)]
pub enum SpoolError {
    // -- Validation --
    #[error("no such job: {0}")]
    UnknownJob(JobId),

    #[error("no such printer: {0}")]
    UnknownPrinter(String),

    #[error("no such file type: {0}")]
    UnknownType(String),

    #[error("cannot infer a file type for: {0}")]
    UntypedFile(String),

    #[error("printer already defined: {0}")]
    DuplicatePrinter(String),

    #[error("printer already enabled: {0}")]
    PrinterAlreadyEnabled(String),

    #[error("job {0} is not running")]
    NotRunning(JobId),

    #[error("job {id} is already {status}")]
    JobComplete { id: JobId, status: JobStatus },

    // -- Capacity --
    #[error("job capacity reached ({0})")]
    JobCapacity(usize),

    #[error("printer capacity reached ({0})")]
    PrinterCapacity(usize),

    // -- Process orchestration --
    #[error("printer connection failed: {0}")]
    Connect(String),

    #[error("pipeline launch failed: {0}")]
    Launch(String),

    #[error("signal delivery failed: {0}")]
    Signal(String),

    // -- Control protocol --
    #[error("job {0} didn't pause")]
    PauseTimeout(JobId),

    #[error("job {0} didn't resume")]
    ResumeTimeout(JobId),

    // -- Front end --
    #[error("unrecognized command: {0}")]
    Command(String),

    // -- I/O --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpoolError>;
