// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The command loop and grammar.
//
// One command per line:
//   help quit type printer conversion printers jobs print cancel disable
//   enable pause resume
// Listings accept -j for JSON output. Between input lines the loop drains
// the SIGCHLD flag and runs a full engine tick, so reaping and redispatch
// happen on every command cycle.

use std::io::{self, BufRead, IsTerminal, Write};

use spoolwerk_core::error::{Result, SpoolError};
use spoolwerk_core::types::{ConversionStep, JobId};
use spoolwerk_convert::SharedGraph;
use spoolwerk_spool::{Spooler, signal};

/// What a command asks the loop to do next.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Continue,
    Quit,
}

/// Run the command loop until quit or EOF. Returns the process exit code.
pub(crate) fn run(spooler: &mut Spooler, graph: &SharedGraph) -> i32 {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut lines = stdin.lock().lines();

    loop {
        // Child status changes that arrived while a command was being
        // handled (or while the loop slept in read) are drained here,
        // never inside the signal handler.
        if signal::take_pending() {
            spooler.tick();
        } else {
            spooler.reap();
        }

        if interactive {
            print!("spoolwerk> ");
            let _ = io::stdout().flush();
        }

        let Some(line) = lines.next() else {
            // EOF: success in batch mode, same as quit interactively.
            return 0;
        };
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                return 1;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match execute(spooler, graph, &line) {
            Ok(Outcome::Quit) => return 0,
            Ok(Outcome::Continue) => {}
            Err(e) => eprintln!("error: {e}"),
        }

        spooler.tick();
    }
}

/// Parse and execute one command line.
pub(crate) fn execute(spooler: &mut Spooler, graph: &SharedGraph, line: &str) -> Result<Outcome> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = words.split_first() else {
        return Ok(Outcome::Continue);
    };

    match (command, args) {
        ("help", _) => {
            println!(
                "Commands are: help quit type printer conversion printers jobs \
                 print cancel disable enable pause resume"
            );
        }
        ("quit", _) => return Ok(Outcome::Quit),

        ("type", [name]) => graph.define_type(name)?,
        ("type", _) => return usage("type <name>"),

        ("printer", [name, file_type]) => {
            spooler.define_printer(name, file_type)?;
            if let Some(printer) = spooler.printers().iter().find(|p| p.name == *name) {
                println!("{printer}");
            }
        }
        ("printer", _) => return usage("printer <name> <type>"),

        ("conversion", [from, to, cmd, rest @ ..]) => {
            let step = ConversionStep::new(*cmd, rest.iter().map(|a| a.to_string()).collect());
            graph.define_conversion(from, to, step)?;
        }
        ("conversion", _) => return usage("conversion <from> <to> <cmd> [args...]"),

        ("printers", ["-j"]) => println!("{}", serde_json::to_string(&spooler.printers())?),
        ("printers", []) => {
            for printer in spooler.printers() {
                println!("{printer}");
            }
        }
        ("printers", _) => return usage("printers [-j]"),

        ("jobs", ["-j"]) => println!("{}", serde_json::to_string(&spooler.jobs())?),
        ("jobs", []) => {
            for job in spooler.jobs() {
                println!("{job}");
            }
        }
        ("jobs", _) => return usage("jobs [-j]"),

        ("print", [file, printers @ ..]) => {
            let printers: Vec<String> = printers.iter().map(|p| p.to_string()).collect();
            let id = spooler.create_job(*file, &printers)?;
            if let Some(job) = spooler.jobs().iter().find(|j| j.id == id) {
                println!("{job}");
            }
        }
        ("print", _) => return usage("print <file> [printer...]"),

        ("enable", [name]) => spooler.enable_printer(name)?,
        ("enable", _) => return usage("enable <printer>"),

        ("disable", [name]) => spooler.disable_printer(name)?,
        ("disable", _) => return usage("disable <printer>"),

        ("pause", [id]) => spooler.pause(parse_job_id(id)?)?,
        ("pause", _) => return usage("pause <job>"),

        ("resume", [id]) => spooler.resume(parse_job_id(id)?)?,
        ("resume", _) => return usage("resume <job>"),

        ("cancel", [id]) => spooler.cancel(parse_job_id(id)?)?,
        ("cancel", _) => return usage("cancel <job>"),

        _ => return Err(SpoolError::Command(command.to_string())),
    }

    Ok(Outcome::Continue)
}

fn parse_job_id(word: &str) -> Result<JobId> {
    word.parse::<u64>()
        .map(JobId)
        .map_err(|_| SpoolError::Command(format!("invalid job id: {word}")))
}

fn usage(text: &str) -> Result<Outcome> {
    Err(SpoolError::Command(format!("usage: {text}")))
}
