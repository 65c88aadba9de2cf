// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk — Core types, error definitions, and collaborator traits shared
// across all crates.  Unix-only: job control is built on process groups.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::SpoolConfig;
pub use error::SpoolError;
pub use traits::*;
pub use types::*;
