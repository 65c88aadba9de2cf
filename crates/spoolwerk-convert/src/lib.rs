// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk Convert — the registry of file types and conversion commands,
// and breadth-first resolution of conversion paths between them.  This crate
// is the production implementation of the `CapabilityResolver` seam consumed
// by the dispatch engine.

pub mod path;
pub mod registry;

pub use registry::{ConversionGraph, SharedGraph};
