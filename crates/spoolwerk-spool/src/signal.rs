// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SIGCHLD wiring: the handler raises a flag, nothing more.
//
// Registry work never happens in signal context.  The command loop drains
// the flag between input lines and runs a full engine tick when it was set.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::libc;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

use spoolwerk_core::error::{Result, SpoolError};

static CHLD_PENDING: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigchld(_signo: libc::c_int) {
    CHLD_PENDING.store(true, Ordering::Relaxed);
}

/// Install the SIGCHLD handler for the process.  SA_RESTART keeps blocking
/// reads in the command loop from failing with EINTR.
pub fn install() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_sigchld),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe { sigaction(Signal::SIGCHLD, &action) }
        .map_err(|e| SpoolError::Signal(format!("install SIGCHLD handler: {e}")))?;
    Ok(())
}

/// Consume the pending flag. True means at least one child status change
/// arrived since the last drain and a tick is due.
pub fn take_pending() -> bool {
    CHLD_PENDING.swap(false, Ordering::Relaxed)
}
