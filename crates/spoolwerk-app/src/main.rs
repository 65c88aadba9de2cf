// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk — print-job spooler console.
//
// Entry point. Initialises logging, installs the SIGCHLD flag handler,
// wires the conversion registry and spool-directory connector into the
// spooler, and runs the command loop over stdin (interactive or batch).

mod commands;

use spoolwerk_core::config::SpoolConfig;
use spoolwerk_convert::SharedGraph;
use spoolwerk_spool::{LogObserver, SpoolDirConnector, Spooler, signal};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Spoolwerk starting");

    if let Err(e) = signal::install() {
        tracing::error!(error = %e, "cannot install SIGCHLD handler");
        std::process::exit(1);
    }

    let config = SpoolConfig::default();
    let graph = SharedGraph::new();
    let connector = SpoolDirConnector::new(config.spool_dir.clone());
    let mut spooler = Spooler::new(
        config,
        Box::new(graph.clone()),
        Box::new(connector),
        Box::new(LogObserver),
    );

    let code = commands::run(&mut spooler, &graph);
    tracing::info!("Spoolwerk exiting");
    std::process::exit(code);
}
