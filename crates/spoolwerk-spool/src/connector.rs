// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spool-directory printer connector.
//
// The simplest possible printer: one sink file per printer under a spool
// directory, opened in append mode so consecutive jobs land back to back.
// Real hardware would sit behind the same `PrinterConnector` seam.

use std::fs::OpenOptions;
use std::os::fd::OwnedFd;
use std::path::PathBuf;

use tracing::debug;

use spoolwerk_core::error::{Result, SpoolError};
use spoolwerk_core::traits::PrinterConnector;
use spoolwerk_core::types::ConnectMode;

/// Connects printers to `<dir>/<name>.out` sink files.
#[derive(Debug, Clone)]
pub struct SpoolDirConnector {
    dir: PathBuf,
}

impl SpoolDirConnector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The sink path for a printer.
    pub fn sink_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.out"))
    }
}

impl PrinterConnector for SpoolDirConnector {
    fn connect(&self, name: &str, file_type: &str, mode: ConnectMode) -> Result<OwnedFd> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| SpoolError::Connect(format!("{}: {e}", self.dir.display())))?;
        let path = self.sink_path(name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| SpoolError::Connect(format!("{}: {e}", path.display())))?;
        debug!(printer = name, file_type, ?mode, sink = %path.display(), "printer connected");
        Ok(OwnedFd::from(file))
    }
}
