// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The spooler facade: the surface consumed by the command layer.
//
// All registry mutation funnels through this one object on the single
// control-flow thread; the engine internals (dispatch, reaper, control
// protocols, sweeper) are `impl Spooler` blocks in their own modules.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::info;

use spoolwerk_core::config::SpoolConfig;
use spoolwerk_core::error::{Result, SpoolError};
use spoolwerk_core::traits::{CapabilityResolver, PrinterConnector, SpoolObserver};
use spoolwerk_core::types::{Job, JobId, Printer, PrinterStatus};

use crate::registry::Registry;

/// The print spooler.
pub struct Spooler {
    pub(crate) config: SpoolConfig,
    pub(crate) registry: Registry,
    pub(crate) resolver: Box<dyn CapabilityResolver>,
    pub(crate) connector: Box<dyn PrinterConnector>,
    pub(crate) observer: Box<dyn SpoolObserver>,
}

impl Spooler {
    pub fn new(
        config: SpoolConfig,
        resolver: Box<dyn CapabilityResolver>,
        connector: Box<dyn PrinterConnector>,
        observer: Box<dyn SpoolObserver>,
    ) -> Self {
        Self {
            config,
            registry: Registry::new(),
            resolver,
            connector,
            observer,
        }
    }

    pub fn config(&self) -> &SpoolConfig {
        &self.config
    }

    /// Define a printer in Disabled state.
    ///
    /// The capability tag must name a registered file type; an empty
    /// conversion path from the tag to itself is exactly "the type exists".
    pub fn define_printer(&mut self, name: &str, file_type: &str) -> Result<()> {
        if self.registry.printer_count() >= self.config.max_printers {
            return Err(SpoolError::PrinterCapacity(self.config.max_printers));
        }
        if self.resolver.resolve(file_type, file_type).is_none() {
            return Err(SpoolError::UnknownType(file_type.to_string()));
        }
        self.registry.add_printer(name, file_type)?;
        info!(printer = name, file_type, "printer defined");
        if let Some(printer) = self.registry.printer(name) {
            self.observer.printer_defined(printer);
        }
        Ok(())
    }

    /// Enable a Disabled printer, then run a dispatch round to put it to
    /// work immediately.
    pub fn enable_printer(&mut self, name: &str) -> Result<()> {
        let printer = self
            .registry
            .printer_mut(name)
            .ok_or_else(|| SpoolError::UnknownPrinter(name.to_string()))?;
        if printer.status != PrinterStatus::Disabled {
            return Err(SpoolError::PrinterAlreadyEnabled(name.to_string()));
        }
        printer.status = PrinterStatus::Idle;
        printer.pending_disable = false;
        info!(printer = name, "printer enabled");
        if let Some(printer) = self.registry.printer(name) {
            self.observer.printer_status(printer);
        }
        self.dispatch();
        Ok(())
    }

    /// Disable a printer. A Busy printer keeps its current job and is
    /// disabled when the reaper releases it; disabling a Disabled printer
    /// is a no-op.
    pub fn disable_printer(&mut self, name: &str) -> Result<()> {
        let printer = self
            .registry
            .printer_mut(name)
            .ok_or_else(|| SpoolError::UnknownPrinter(name.to_string()))?;
        match printer.status {
            PrinterStatus::Disabled => Ok(()),
            PrinterStatus::Idle => {
                printer.status = PrinterStatus::Disabled;
                info!(printer = name, "printer disabled");
                if let Some(printer) = self.registry.printer(name) {
                    self.observer.printer_status(printer);
                }
                Ok(())
            }
            PrinterStatus::Busy => {
                printer.pending_disable = true;
                info!(printer = name, "printer disable deferred until release");
                Ok(())
            }
        }
    }

    /// Create a job for the given source file and run a dispatch round.
    ///
    /// With an empty printer list the job is eligible for every printer
    /// known right now.  A named printer must exist, and joins the
    /// eligibility set only if a conversion path from the job's type to its
    /// capability exists.
    pub fn create_job(&mut self, file: impl Into<PathBuf>, printers: &[String]) -> Result<JobId> {
        if self.registry.job_count() >= self.config.max_jobs {
            return Err(SpoolError::JobCapacity(self.config.max_jobs));
        }

        let file = file.into();
        let file_type = self
            .resolver
            .infer_type(&file)
            .ok_or_else(|| SpoolError::UntypedFile(file.display().to_string()))?;

        let mut eligible = BTreeSet::new();
        if printers.is_empty() {
            eligible.extend(self.registry.printers().map(|p| p.name.clone()));
        } else {
            for name in printers {
                let printer = self
                    .registry
                    .printer(name)
                    .ok_or_else(|| SpoolError::UnknownPrinter(name.clone()))?;
                if self.resolver.resolve(&file_type, &printer.file_type).is_some() {
                    eligible.insert(printer.name.clone());
                }
            }
        }

        let id = self.registry.add_job(file, file_type, eligible);
        info!(job = %id, "job created");
        if let Some(job) = self.registry.job(id) {
            self.observer.job_created(job);
        }
        self.dispatch();
        Ok(id)
    }

    /// Jobs in stable id order.
    pub fn jobs(&self) -> Vec<&Job> {
        self.registry.jobs().collect()
    }

    /// Printers in definition order.
    pub fn printers(&self) -> Vec<&Printer> {
        self.registry.printers().collect()
    }

    /// One full engine cycle: drain pending child status changes, fill
    /// freshly idled printers, then expire old terminal jobs.  Invoked on
    /// every command cycle and whenever the SIGCHLD flag is pending;
    /// idempotent when nothing external has happened.
    pub fn tick(&mut self) {
        self.reap();
        self.dispatch();
        self.sweep();
    }
}
