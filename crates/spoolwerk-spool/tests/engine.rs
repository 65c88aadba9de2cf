// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end engine tests: real conversion pipelines as OS process groups,
// feeding spool-directory sinks, driven through the public spooler surface.

use std::fs;
use std::os::fd::OwnedFd;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tempfile::TempDir;

use spoolwerk_convert::ConversionGraph;
use spoolwerk_core::config::SpoolConfig;
use spoolwerk_core::error::{Result, SpoolError};
use spoolwerk_core::traits::{PrinterConnector, SpoolObserver};
use spoolwerk_core::types::{ConnectMode, ConversionStep, Job, JobId, JobStatus, Printer, PrinterStatus};
use spoolwerk_spool::{SpoolDirConnector, Spooler};

/// Observer that records every notification as a compact string.
#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    fn contains(&self, event: &str) -> bool {
        self.0.lock().unwrap().iter().any(|e| e == event)
    }

    fn count(&self, event: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == event).count()
    }

    fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }
}

impl SpoolObserver for EventLog {
    fn job_created(&self, job: &Job) {
        self.push(format!("created:{}", job.id));
    }
    fn job_started(&self, job: &Job, printer: &str, _pgid: i32, _commands: &[String]) {
        self.push(format!("started:{}:{printer}", job.id));
    }
    fn job_status(&self, job: &Job) {
        self.push(format!("status:{}:{}", job.id, job.status));
    }
    fn job_finished(&self, id: JobId) {
        self.push(format!("finished:{id}"));
    }
    fn job_aborted(&self, id: JobId) {
        self.push(format!("aborted:{id}"));
    }
    fn job_deleted(&self, id: JobId) {
        self.push(format!("deleted:{id}"));
    }
    fn printer_defined(&self, printer: &Printer) {
        self.push(format!("printer_defined:{}", printer.name));
    }
    fn printer_status(&self, printer: &Printer) {
        self.push(format!("printer:{}:{}", printer.name, printer.status));
    }
}

/// One test's world: a spooler over a tempdir-backed spool directory.
struct Rig {
    spooler: Spooler,
    events: EventLog,
    connector: SpoolDirConnector,
    dir: TempDir,
}

impl Rig {
    fn new(graph: ConversionGraph) -> Self {
        Self::with_connector(graph, |c| Box::new(c.clone()))
    }

    fn with_connector(
        graph: ConversionGraph,
        wrap: impl FnOnce(&SpoolDirConnector) -> Box<dyn PrinterConnector>,
    ) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let connector = SpoolDirConnector::new(dir.path().join("spool"));
        let events = EventLog::default();
        let spooler = Spooler::new(
            SpoolConfig::default(),
            Box::new(graph),
            wrap(&connector),
            Box::new(events.clone()),
        );
        Self {
            spooler,
            events,
            connector,
            dir,
        }
    }

    /// Write a source file under the rig's tempdir.
    fn source(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).expect("write source");
        path
    }

    fn sink(&self, printer: &str) -> String {
        fs::read_to_string(self.connector.sink_path(printer)).expect("read sink")
    }

    fn job_status(&self, id: JobId) -> Option<JobStatus> {
        self.spooler.jobs().iter().find(|j| j.id == id).map(|j| j.status)
    }

    fn printer_status(&self, name: &str) -> PrinterStatus {
        self.spooler
            .printers()
            .iter()
            .find(|p| p.name == name)
            .expect("printer defined")
            .status
    }

    /// Tick until `pred` holds or the deadline passes.
    fn tick_until(&mut self, what: &str, pred: impl Fn(&Rig) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            self.spooler.tick();
            if pred(self) {
                return;
            }
            assert!(Instant::now() < deadline, "timed out waiting for: {what}");
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

/// Graph with a "txt" type only.
fn txt_graph() -> ConversionGraph {
    let mut graph = ConversionGraph::new();
    graph.define_type("txt").expect("define txt");
    graph
}

/// Graph with txt plus a slow txt→slow conversion for pause/cancel tests.
fn slow_graph() -> ConversionGraph {
    let mut graph = txt_graph();
    graph.define_type("slow").expect("define slow");
    graph
        .define_conversion(
            "txt",
            "slow",
            ConversionStep::new("sh", vec!["-c".into(), "sleep 30; cat".into()]),
        )
        .expect("define conversion");
    graph
}

#[test]
fn pass_through_pipeline_copies_bytes_to_the_sink() {
    let mut rig = Rig::new(txt_graph());
    rig.spooler.define_printer("alpha", "txt").expect("define");
    rig.spooler.enable_printer("alpha").expect("enable");

    let source = rig.source("doc.txt", "the quick brown fox\n");
    let id = rig.spooler.create_job(source, &[]).expect("create");

    rig.tick_until("job finished", |r| {
        r.job_status(id) == Some(JobStatus::Finished)
    });

    assert_eq!(rig.sink("alpha"), "the quick brown fox\n");
    assert_eq!(rig.printer_status("alpha"), PrinterStatus::Idle);
    assert!(rig.events.contains("started:0:alpha"));
    assert!(rig.events.contains("finished:0"));
}

#[test]
fn two_stage_conversion_pipeline_transforms_bytes() {
    let mut graph = txt_graph();
    graph.define_type("loud").expect("define loud");
    graph.define_type("final").expect("define final");
    graph
        .define_conversion(
            "txt",
            "loud",
            ConversionStep::new("tr", vec!["a-z".into(), "A-Z".into()]),
        )
        .expect("txt→loud");
    graph
        .define_conversion(
            "loud",
            "final",
            ConversionStep::new("sed", vec!["s/WORLD/SPOOL/".into()]),
        )
        .expect("loud→final");

    let mut rig = Rig::new(graph);
    rig.spooler.define_printer("omega", "final").expect("define");
    rig.spooler.enable_printer("omega").expect("enable");

    let source = rig.source("hello.txt", "hello world\n");
    let id = rig.spooler.create_job(source, &[]).expect("create");

    rig.tick_until("job finished", |r| {
        r.job_status(id) == Some(JobStatus::Finished)
    });

    assert_eq!(rig.sink("omega"), "HELLO SPOOL\n");
}

#[test]
fn direct_match_is_preferred_over_conversion() {
    let mut graph = txt_graph();
    graph.define_type("ps").expect("define ps");
    graph
        .define_conversion(
            "txt",
            "ps",
            ConversionStep::new("tr", vec!["a-z".into(), "A-Z".into()]),
        )
        .expect("txt→ps");

    let mut rig = Rig::new(graph);
    // "alpha" accepts txt directly and precedes "beta" in definition order.
    rig.spooler.define_printer("alpha", "txt").expect("define alpha");
    rig.spooler.define_printer("beta", "ps").expect("define beta");
    rig.spooler.enable_printer("alpha").expect("enable alpha");
    rig.spooler.enable_printer("beta").expect("enable beta");

    let source = rig.source("doc.txt", "body\n");
    let id = rig.spooler.create_job(source, &[]).expect("create");

    rig.tick_until("job finished", |r| {
        r.job_status(id) == Some(JobStatus::Finished)
    });

    assert!(rig.events.contains("started:0:alpha"));
    assert!(!rig.events.contains("printer:beta:busy"));
}

#[test]
fn pause_resume_cancel_through_a_live_process_group() {
    let mut rig = Rig::new(slow_graph());
    rig.spooler.define_printer("tortoise", "slow").expect("define");
    rig.spooler.enable_printer("tortoise").expect("enable");

    let source = rig.source("doc.txt", "slow data\n");
    let id = rig.spooler.create_job(source, &[]).expect("create");
    assert_eq!(rig.job_status(id), Some(JobStatus::Running));

    rig.spooler.pause(id).expect("pause");
    assert_eq!(rig.job_status(id), Some(JobStatus::Paused));

    rig.spooler.resume(id).expect("resume");
    assert_eq!(rig.job_status(id), Some(JobStatus::Running));

    rig.spooler.cancel(id).expect("cancel");
    assert_eq!(rig.job_status(id), Some(JobStatus::Aborted));

    rig.tick_until("printer released", |r| {
        r.printer_status("tortoise") == PrinterStatus::Idle
    });
    assert_eq!(rig.events.count("aborted:0"), 1);
}

#[test]
fn reap_after_cancel_does_not_override_aborted() {
    let mut rig = Rig::new(slow_graph());
    rig.spooler.define_printer("tortoise", "slow").expect("define");
    rig.spooler.enable_printer("tortoise").expect("enable");

    let source = rig.source("doc.txt", "slow data\n");
    let id = rig.spooler.create_job(source, &[]).expect("create");

    rig.spooler.cancel(id).expect("cancel");
    rig.tick_until("printer released", |r| {
        r.printer_status("tortoise") == PrinterStatus::Idle
    });

    assert_eq!(rig.job_status(id), Some(JobStatus::Aborted));
    // One abort notification, one aborted status transition, no finish.
    assert_eq!(rig.events.count("aborted:0"), 1);
    assert_eq!(rig.events.count("status:0:aborted"), 1);
    assert!(!rig.events.contains("finished:0"));
}

#[test]
fn resume_reports_failure_when_the_group_died_stopped() {
    let mut rig = Rig::new(slow_graph());
    rig.spooler.define_printer("tortoise", "slow").expect("define");
    rig.spooler.enable_printer("tortoise").expect("enable");

    let source = rig.source("doc.txt", "slow data\n");
    let id = rig.spooler.create_job(source, &[]).expect("create");
    rig.spooler.pause(id).expect("pause");

    // Kill the whole group behind the spooler's back; SIGKILL reaches even
    // stopped processes.
    let pgid = rig
        .spooler
        .jobs()
        .iter()
        .find(|j| j.id == id)
        .and_then(|j| j.pgid)
        .expect("paused job has a group");
    nix::sys::signal::killpg(nix::unistd::Pid::from_raw(pgid), nix::sys::signal::Signal::SIGKILL)
        .expect("killpg");

    // Depending on reap timing the continue signal may fail outright
    // (group fully gone) or the bounded wait may observe the abort.
    let err = rig.spooler.resume(id).expect_err("group is gone");
    assert!(matches!(
        err,
        SpoolError::ResumeTimeout(_) | SpoolError::Signal(_)
    ));
    rig.tick_until("job aborted", |r| {
        r.job_status(id) == Some(JobStatus::Aborted)
    });
}

#[test]
fn unreadable_source_aborts_the_job() {
    let mut rig = Rig::new(txt_graph());
    rig.spooler.define_printer("alpha", "txt").expect("define");
    rig.spooler.enable_printer("alpha").expect("enable");

    let missing = rig.dir.path().join("ghost.txt");
    let id = rig.spooler.create_job(missing, &[]).expect("create");

    assert_eq!(rig.job_status(id), Some(JobStatus::Aborted));
    assert!(rig.events.contains("aborted:0"));
    assert_eq!(rig.printer_status("alpha"), PrinterStatus::Idle);
}

/// Connector that refuses one named printer and delegates the rest.
struct FlakyConnector {
    inner: SpoolDirConnector,
    refuse: String,
}

impl PrinterConnector for FlakyConnector {
    fn connect(&self, name: &str, file_type: &str, mode: ConnectMode) -> Result<OwnedFd> {
        if name == self.refuse {
            return Err(SpoolError::Connect(format!("{name}: printer offline")));
        }
        self.inner.connect(name, file_type, mode)
    }
}

#[test]
fn connection_failure_skips_the_printer_not_the_job() {
    let mut rig = Rig::with_connector(txt_graph(), |c| {
        Box::new(FlakyConnector {
            inner: c.clone(),
            refuse: "alpha".to_string(),
        })
    });
    rig.spooler.define_printer("alpha", "txt").expect("define alpha");
    rig.spooler.define_printer("beta", "txt").expect("define beta");
    rig.spooler.enable_printer("alpha").expect("enable alpha");
    rig.spooler.enable_printer("beta").expect("enable beta");

    let source = rig.source("doc.txt", "payload\n");
    let id = rig.spooler.create_job(source, &[]).expect("create");

    rig.tick_until("job finished", |r| {
        r.job_status(id) == Some(JobStatus::Finished)
    });

    assert!(rig.events.contains("started:0:beta"));
    assert_eq!(rig.printer_status("alpha"), PrinterStatus::Idle);
    assert_eq!(rig.sink("beta"), "payload\n");
}

#[test]
fn tick_is_idempotent_after_convergence() {
    let mut rig = Rig::new(txt_graph());
    rig.spooler.define_printer("alpha", "txt").expect("define");
    rig.spooler.enable_printer("alpha").expect("enable");

    let source = rig.source("doc.txt", "once\n");
    let id = rig.spooler.create_job(source, &[]).expect("create");
    rig.tick_until("job finished", |r| {
        r.job_status(id) == Some(JobStatus::Finished)
    });

    let events_before = rig.events.len();
    rig.spooler.tick();
    rig.spooler.tick();

    assert_eq!(rig.events.len(), events_before, "no new notifications");
    assert_eq!(rig.job_status(id), Some(JobStatus::Finished));
    assert_eq!(rig.printer_status("alpha"), PrinterStatus::Idle);
}

#[test]
fn disable_of_a_busy_printer_is_deferred_until_release() {
    let mut rig = Rig::new(slow_graph());
    rig.spooler.define_printer("tortoise", "slow").expect("define");
    rig.spooler.enable_printer("tortoise").expect("enable");

    let source = rig.source("doc.txt", "slow data\n");
    let id = rig.spooler.create_job(source, &[]).expect("create");

    rig.spooler.disable_printer("tortoise").expect("disable");
    assert_eq!(rig.printer_status("tortoise"), PrinterStatus::Busy);

    rig.spooler.cancel(id).expect("cancel");
    rig.tick_until("printer disabled", |r| {
        r.printer_status("tortoise") == PrinterStatus::Disabled
    });
    assert!(rig.events.contains("printer:tortoise:disabled"));
}

#[test]
fn released_printer_picks_up_the_waiting_job() {
    let mut rig = Rig::new(slow_graph());
    rig.spooler.define_printer("tortoise", "slow").expect("define");
    rig.spooler.enable_printer("tortoise").expect("enable");

    let first = rig.source("first.txt", "first\n");
    let second = rig.source("second.txt", "second\n");
    let job1 = rig.spooler.create_job(first, &[]).expect("create first");
    let job2 = rig.spooler.create_job(second, &[]).expect("create second");

    assert_eq!(rig.job_status(job1), Some(JobStatus::Running));
    assert_eq!(rig.job_status(job2), Some(JobStatus::Created));

    rig.spooler.cancel(job1).expect("cancel first");
    rig.tick_until("second job dispatched", |r| {
        matches!(
            r.job_status(job2),
            Some(JobStatus::Running) | Some(JobStatus::Finished)
        )
    });
    assert!(rig.events.contains("started:1:tortoise"));

    // Don't leave the slow group running past the test.
    let _ = rig.spooler.cancel(job2);
}

#[test]
fn explicit_eligibility_restricts_routing() {
    let mut rig = Rig::new(txt_graph());
    rig.spooler.define_printer("alpha", "txt").expect("define alpha");
    rig.spooler.define_printer("beta", "txt").expect("define beta");
    rig.spooler.enable_printer("alpha").expect("enable alpha");
    rig.spooler.enable_printer("beta").expect("enable beta");

    let source = rig.source("doc.txt", "restricted\n");
    let id = rig
        .spooler
        .create_job(source, &["beta".to_string()])
        .expect("create");

    rig.tick_until("job finished", |r| {
        r.job_status(id) == Some(JobStatus::Finished)
    });

    assert!(rig.events.contains("started:0:beta"));
    assert!(!rig.events.contains("printer:alpha:busy"));
}
