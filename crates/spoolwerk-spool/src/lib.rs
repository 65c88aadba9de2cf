// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk Spool — the dispatch and process-orchestration engine.  Matches
// created jobs against idle printers, launches conversion pipelines as OS
// process groups, reaps child status changes, and runs the pause/resume/
// cancel protocols on process-group signals.

pub mod connector;
pub mod control;
pub mod dispatch;
pub mod notify;
pub mod pipeline;
pub mod reaper;
pub mod registry;
pub mod signal;
pub mod spooler;
pub mod sweep;

pub use connector::SpoolDirConnector;
pub use notify::LogObserver;
pub use registry::Registry;
pub use spooler::Spooler;

#[cfg(test)]
pub(crate) mod testutil;
