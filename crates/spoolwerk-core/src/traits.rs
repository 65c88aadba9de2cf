// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator trait seams consumed by the dispatch engine.
//
// The engine never talks to the type registry, the printer hardware, or the
// outside world directly.  Each concern sits behind one of these traits so
// the orchestration core stays testable in isolation.

use std::os::fd::OwnedFd;
use std::path::Path;

use crate::error::Result;
use crate::types::{ConnectMode, ConversionStep, Job, JobId, Printer};

/// Resolves file types and conversion paths.
///
/// `resolve` returns the ordered command sequence that transforms `from`
/// into `to`: an empty sequence means the formats already match (direct
/// pass-through), `None` means the destination is unreachable.
pub trait CapabilityResolver {
    /// Infer the declared type of a source file, typically from its
    /// extension. Returns `None` for unregistered types.
    fn infer_type(&self, path: &Path) -> Option<String>;

    /// Resolve an ordered conversion-step sequence, or `None` if no path
    /// through the registered conversions exists.
    fn resolve(&self, from: &str, to: &str) -> Option<Vec<ConversionStep>>;
}

/// Establishes printer connections.
pub trait PrinterConnector {
    /// Connect to the named printer and return a writable sink handle.
    /// The handle becomes the final pipeline stage's stdout.
    fn connect(&self, name: &str, file_type: &str, mode: ConnectMode) -> Result<OwnedFd>;
}

/// Outward-facing lifecycle notifications.
///
/// Fire-and-forget observers: no return value, no influence on control
/// flow. The default implementations do nothing so observers only override
/// the events they care about.
pub trait SpoolObserver {
    fn job_created(&self, _job: &Job) {}

    /// A pipeline was launched: the job's id, the printer it landed on, the
    /// process group, and the resolved command sequence.
    fn job_started(&self, _job: &Job, _printer: &str, _pgid: i32, _commands: &[String]) {}

    fn job_status(&self, _job: &Job) {}

    fn job_finished(&self, _id: JobId) {}

    fn job_aborted(&self, _id: JobId) {}

    fn job_deleted(&self, _id: JobId) {}

    fn printer_defined(&self, _printer: &Printer) {}

    fn printer_status(&self, _printer: &Printer) {}
}
