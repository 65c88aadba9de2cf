// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion-pipeline construction.
//
// A pipeline is L external processes wired stdin→stdout with OS pipes:
// stage 0 reads the source file, stage L-1 writes the printer sink.  All
// stages share one process group so a single group-directed signal reaches
// every stage at once.  Stage 0 is spawned into a fresh group and becomes
// its leader; later stages must join before the leader exits, otherwise the
// spawn fails and the whole launch is abandoned.

use std::fs::File;
use std::os::fd::OwnedFd;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::sys::wait::waitpid;
use nix::unistd::Pid;
use tracing::{debug, warn};

use spoolwerk_core::error::{Result, SpoolError};
use spoolwerk_core::types::ConversionStep;

/// Copy command used when no conversion is needed.
const PASSTHROUGH: &str = "cat";

/// A successfully launched pipeline.
#[derive(Debug)]
pub(crate) struct LaunchedPipeline {
    /// Process group shared by every stage; equals the first stage's pid.
    pub pgid: i32,
    /// Stage pids, source to sink.
    pub stage_pids: Vec<i32>,
    /// Stage command names, for the "job started" notification.
    pub commands: Vec<String>,
}

/// Launch the conversion pipeline for one (job, printer) pairing.
///
/// `source` becomes stage 0's stdin and `sink` the final stage's stdout;
/// both are consumed.  An empty step sequence launches a single
/// pass-through copy.
pub(crate) fn launch(
    source: File,
    sink: OwnedFd,
    steps: &[ConversionStep],
) -> Result<LaunchedPipeline> {
    let Some((last_step, mid_steps)) = steps.split_last() else {
        // No conversion needed: one process copies source bytes to the sink.
        let child = spawn_stage(PASSTHROUGH, &[], Stdio::from(source), Stdio::from(sink), 0)?;
        let pgid = child.id() as i32;
        debug!(pgid, "pass-through pipeline launched");
        return Ok(LaunchedPipeline {
            pgid,
            stage_pids: vec![pgid],
            commands: vec![PASSTHROUGH.to_string()],
        });
    };

    let mut pgid = 0;
    let mut stage_pids = Vec::with_capacity(steps.len());
    let mut commands = Vec::with_capacity(steps.len());
    let mut stdin = Stdio::from(source);

    for step in mid_steps {
        let mut child =
            match spawn_stage(&step.command, &step.args, stdin, Stdio::piped(), pgid) {
                Ok(child) => child,
                Err(e) => {
                    tear_down(pgid);
                    return Err(e);
                }
            };
        let pid = child.id() as i32;
        if pgid == 0 {
            pgid = pid;
        }
        let Some(out) = child.stdout.take() else {
            tear_down(pgid);
            return Err(SpoolError::Launch(format!(
                "{}: no pipe to next stage",
                step.command
            )));
        };
        stdin = Stdio::from(out);
        stage_pids.push(pid);
        commands.push(step.command.clone());
    }

    let child = match spawn_stage(
        &last_step.command,
        &last_step.args,
        stdin,
        Stdio::from(sink),
        pgid,
    ) {
        Ok(child) => child,
        Err(e) => {
            tear_down(pgid);
            return Err(e);
        }
    };
    let pid = child.id() as i32;
    if pgid == 0 {
        // Single-stage pipeline: the only stage leads the group.
        pgid = pid;
    }
    stage_pids.push(pid);
    commands.push(last_step.command.clone());

    debug!(pgid, stages = stage_pids.len(), "pipeline launched");
    Ok(LaunchedPipeline {
        pgid,
        stage_pids,
        commands,
    })
}

/// Spawn one stage into the given process group (0 = lead a fresh group).
/// stderr is inherited so conversion diagnostics reach the operator.
fn spawn_stage(
    command: &str,
    args: &[String],
    stdin: Stdio,
    stdout: Stdio,
    pgid: i32,
) -> Result<Child> {
    Command::new(command)
        .args(args)
        .stdin(stdin)
        .stdout(stdout)
        .process_group(pgid)
        .spawn()
        .map_err(|e| SpoolError::Launch(format!("{command}: {e}")))
}

/// Kill and reap a partially launched group after a mid-launch failure.
/// SIGKILL rather than SIGTERM: the stages are ours, nothing needs a
/// graceful shutdown, and the group must be gone before the pairing is
/// retried.
fn tear_down(pgid: i32) {
    if pgid == 0 {
        return;
    }
    let group = Pid::from_raw(pgid);
    if let Err(e) = killpg(group, Signal::SIGKILL) {
        warn!(pgid, error = %e, "failed to kill partial pipeline");
        return;
    }
    loop {
        match waitpid(Pid::from_raw(-pgid), None) {
            Ok(_) => continue,
            Err(Errno::ECHILD) => break,
            Err(e) => {
                warn!(pgid, error = %e, "failed to reap partial pipeline");
                break;
            }
        }
    }
}
