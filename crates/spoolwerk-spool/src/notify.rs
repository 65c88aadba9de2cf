// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tracing-backed notification observer.

use tracing::info;

use spoolwerk_core::traits::SpoolObserver;
use spoolwerk_core::types::{Job, JobId, Printer};

/// Emits every lifecycle notification as a structured tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SpoolObserver for LogObserver {
    fn job_created(&self, job: &Job) {
        info!(job = %job.id, file = %job.file.display(), file_type = %job.file_type, "job created");
    }

    fn job_started(&self, job: &Job, printer: &str, pgid: i32, commands: &[String]) {
        info!(
            job = %job.id,
            printer,
            pgid,
            pipeline = commands.join(" | "),
            "job started"
        );
    }

    fn job_status(&self, job: &Job) {
        info!(job = %job.id, status = %job.status, "job status changed");
    }

    fn job_finished(&self, id: JobId) {
        info!(job = %id, "job finished");
    }

    fn job_aborted(&self, id: JobId) {
        info!(job = %id, "job aborted");
    }

    fn job_deleted(&self, id: JobId) {
        info!(job = %id, "job deleted");
    }

    fn printer_defined(&self, printer: &Printer) {
        info!(printer = %printer.name, file_type = %printer.file_type, "printer defined");
    }

    fn printer_status(&self, printer: &Printer) {
        info!(printer = %printer.name, status = %printer.status, "printer status changed");
    }
}
