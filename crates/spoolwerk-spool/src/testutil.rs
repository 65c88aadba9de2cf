// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared stubs for engine unit tests.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::os::fd::OwnedFd;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use spoolwerk_core::config::SpoolConfig;
use spoolwerk_core::error::{Result, SpoolError};
use spoolwerk_core::traits::{CapabilityResolver, PrinterConnector, SpoolObserver};
use spoolwerk_core::types::{ConnectMode, ConversionStep, Job, JobId, JobStatus, Printer};

use crate::spooler::Spooler;

/// Resolver with a fixed type set and no conversion edges: same-type pairs
/// resolve to the empty path, everything else is unreachable.
pub(crate) struct StubResolver {
    types: BTreeSet<String>,
}

impl StubResolver {
    pub fn new(types: &[&str]) -> Self {
        Self {
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl CapabilityResolver for StubResolver {
    fn infer_type(&self, path: &Path) -> Option<String> {
        let ext = path.extension()?.to_str()?;
        self.types.get(ext).cloned()
    }

    fn resolve(&self, from: &str, to: &str) -> Option<Vec<ConversionStep>> {
        (from == to && self.types.contains(from)).then(Vec::new)
    }
}

/// Connector that sinks everything into /dev/null.
pub(crate) struct NullConnector;

impl PrinterConnector for NullConnector {
    fn connect(&self, _name: &str, _file_type: &str, _mode: ConnectMode) -> Result<OwnedFd> {
        let file = OpenOptions::new()
            .write(true)
            .open("/dev/null")
            .map_err(|e| SpoolError::Connect(format!("/dev/null: {e}")))?;
        Ok(OwnedFd::from(file))
    }
}

/// Shared view of the events a `RecordingObserver` captured.
#[derive(Clone, Default)]
pub(crate) struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    fn push(&self, event: String) {
        self.0.lock().expect("event log lock").push(event);
    }

    pub fn contains(&self, event: &str) -> bool {
        self.0.lock().expect("event log lock").iter().any(|e| e == event)
    }

    pub fn count(&self, event: &str) -> usize {
        self.0
            .lock()
            .expect("event log lock")
            .iter()
            .filter(|e| *e == event)
            .count()
    }
}

/// Observer that records every notification as a compact string.
pub(crate) struct RecordingObserver {
    pub events: EventLog,
}

impl SpoolObserver for RecordingObserver {
    fn job_created(&self, job: &Job) {
        self.events.push(format!("created:{}", job.id));
    }

    fn job_started(&self, job: &Job, printer: &str, _pgid: i32, _commands: &[String]) {
        self.events.push(format!("started:{}:{printer}", job.id));
    }

    fn job_status(&self, job: &Job) {
        self.events.push(format!("status:{}:{}", job.id, job.status));
    }

    fn job_finished(&self, id: JobId) {
        self.events.push(format!("finished:{id}"));
    }

    fn job_aborted(&self, id: JobId) {
        self.events.push(format!("aborted:{id}"));
    }

    fn job_deleted(&self, id: JobId) {
        self.events.push(format!("deleted:{id}"));
    }

    fn printer_defined(&self, printer: &Printer) {
        self.events.push(format!("printer_defined:{}", printer.name));
    }

    fn printer_status(&self, printer: &Printer) {
        self.events
            .push(format!("printer:{}:{}", printer.name, printer.status));
    }
}

/// A spooler over stub collaborators ("txt" as the only type), plus the
/// event log its observer writes to.
pub(crate) fn recording_spooler() -> (Spooler, EventLog) {
    let events = EventLog::default();
    let spooler = Spooler::new(
        SpoolConfig::default(),
        Box::new(StubResolver::new(&["txt"])),
        Box::new(NullConnector),
        Box::new(RecordingObserver {
            events: events.clone(),
        }),
    );
    (spooler, events)
}

/// Force a job into `status` and return the stamped change time.
pub(crate) fn stamp_status(
    spooler: &mut Spooler,
    id: JobId,
    status: JobStatus,
) -> DateTime<Utc> {
    let job = spooler.registry.job_mut(id).expect("job exists");
    job.set_status(status);
    job.changed_at
}
