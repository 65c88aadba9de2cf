// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The dispatch engine: greedy matching of created jobs to idle printers.
//
// Each pass scans jobs in stable id order and printers in definition order;
// the first (job, printer) pair with eligibility and a resolvable
// conversion path wins.  An assignment flips job and printer state before
// any further scanning, then the pass restarts, so redundant calls can
// never double-dispatch a job or double-assign a printer.

use std::fs::File;

use tracing::{debug, warn};

use spoolwerk_core::types::{ConnectMode, ConversionStep, JobId, JobStatus, PrinterStatus};

use crate::pipeline;
use crate::spooler::Spooler;

/// Outcome of one (job, printer) launch attempt.
enum PairOutcome {
    /// Pipeline running; restart the scan.
    Launched,
    /// Printer unavailable or launch failed; keep scanning, the job stays
    /// Created and is retried on the next dispatch trigger.
    SkipPrinter,
    /// The job itself is unusable (source unreadable) and was aborted.
    JobAborted,
}

impl Spooler {
    /// Repeat matching passes until one makes no assignment.
    pub fn dispatch(&mut self) {
        while self.dispatch_pass() {}
    }

    /// One scanning pass. Returns true if an assignment was made.
    fn dispatch_pass(&mut self) -> bool {
        let created: Vec<JobId> = self
            .registry
            .jobs()
            .filter(|j| j.status == JobStatus::Created)
            .map(|j| j.id)
            .collect();

        for job_id in created {
            let printer_names: Vec<String> =
                self.registry.printers().map(|p| p.name.clone()).collect();

            for name in printer_names {
                let Some(steps) = self.pair_steps(job_id, &name) else {
                    continue;
                };
                match self.launch_pair(job_id, &name, &steps) {
                    PairOutcome::Launched => return true,
                    PairOutcome::SkipPrinter => continue,
                    PairOutcome::JobAborted => break,
                }
            }
        }
        false
    }

    /// The conversion steps for a dispatchable (job, printer) pair, or None
    /// if the pair does not match (printer not idle, not eligible, or no
    /// conversion path).
    fn pair_steps(&self, job_id: JobId, printer_name: &str) -> Option<Vec<ConversionStep>> {
        let job = self.registry.job(job_id)?;
        let printer = self.registry.printer(printer_name)?;
        if printer.status != PrinterStatus::Idle || !job.eligible.contains(printer_name) {
            return None;
        }
        self.resolver.resolve(&job.file_type, &printer.file_type)
    }

    /// Connect, open the source, and launch the pipeline for one pair.
    fn launch_pair(
        &mut self,
        job_id: JobId,
        printer_name: &str,
        steps: &[ConversionStep],
    ) -> PairOutcome {
        let Some(printer) = self.registry.printer(printer_name) else {
            return PairOutcome::SkipPrinter;
        };
        let file_type = printer.file_type.clone();

        let sink = match self
            .connector
            .connect(printer_name, &file_type, ConnectMode::Normal)
        {
            Ok(fd) => fd,
            Err(e) => {
                warn!(printer = printer_name, error = %e, "connection failed, skipping printer");
                return PairOutcome::SkipPrinter;
            }
        };

        let Some(job) = self.registry.job(job_id) else {
            return PairOutcome::SkipPrinter;
        };
        let source = match File::open(&job.file) {
            Ok(f) => f,
            Err(e) => {
                warn!(job = %job_id, file = %job.file.display(), error = %e, "source unreadable");
                self.abort_unlaunched(job_id);
                return PairOutcome::JobAborted;
            }
        };

        let launched = match pipeline::launch(source, sink, steps) {
            Ok(launched) => launched,
            Err(e) => {
                warn!(job = %job_id, printer = printer_name, error = %e, "pipeline launch failed");
                return PairOutcome::SkipPrinter;
            }
        };

        debug!(
            job = %job_id,
            printer = printer_name,
            pgid = launched.pgid,
            stages = launched.stage_pids.len(),
            "job dispatched"
        );

        self.registry.insert_group(launched.pgid, &launched.stage_pids);
        if let Some(job) = self.registry.job_mut(job_id) {
            job.pgid = Some(launched.pgid);
            job.set_status(JobStatus::Running);
        }
        if let Some(printer) = self.registry.printer_mut(printer_name) {
            printer.status = PrinterStatus::Busy;
            printer.pgid = Some(launched.pgid);
        }

        if let Some(job) = self.registry.job(job_id) {
            self.observer.job_status(job);
            self.observer
                .job_started(job, printer_name, launched.pgid, &launched.commands);
        }
        if let Some(printer) = self.registry.printer(printer_name) {
            self.observer.printer_status(printer);
        }
        PairOutcome::Launched
    }

    /// Abort a job that never launched (e.g. its source file is unreadable).
    fn abort_unlaunched(&mut self, job_id: JobId) {
        if let Some(job) = self.registry.job_mut(job_id) {
            job.set_status(JobStatus::Aborted);
        }
        if let Some(job) = self.registry.job(job_id) {
            self.observer.job_status(job);
        }
        self.observer.job_aborted(job_id);
    }
}
