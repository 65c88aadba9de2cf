// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Registry of file types and the conversion commands between them.
//
// Types are bare tags ("pdf", "ps") that double as file extensions for
// inference. Conversions form a directed graph: one external command per
// edge, reading the source format on stdin and writing the destination on
// stdout. Path resolution over the graph lives in `path.rs`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::debug;

use spoolwerk_core::error::{Result, SpoolError};
use spoolwerk_core::types::ConversionStep;

/// The registered file types and conversion edges.
#[derive(Debug, Clone, Default)]
pub struct ConversionGraph {
    /// Registered type tags.
    types: BTreeSet<String>,
    /// Adjacency: source type → destination type → conversion command.
    /// BTreeMaps keep neighbour enumeration deterministic.
    edges: BTreeMap<String, BTreeMap<String, ConversionStep>>,
}

impl ConversionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file type. Re-registering an existing type is a no-op.
    pub fn define_type(&mut self, name: &str) -> Result<()> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(SpoolError::UnknownType(name.to_string()));
        }
        if self.types.insert(name.to_string()) {
            debug!(file_type = name, "file type defined");
        }
        Ok(())
    }

    /// Register a conversion command from one type to another.
    ///
    /// Both endpoints must already be defined. Redefining an edge replaces
    /// the previous command.
    pub fn define_conversion(&mut self, from: &str, to: &str, step: ConversionStep) -> Result<()> {
        for name in [from, to] {
            if !self.types.contains(name) {
                return Err(SpoolError::UnknownType(name.to_string()));
            }
        }
        debug!(from, to, command = %step.command, "conversion defined");
        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), step);
        Ok(())
    }

    /// Whether a type tag is registered.
    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    /// Infer a file's type from its extension, if that extension names a
    /// registered type.
    pub fn infer_type(&self, path: &Path) -> Option<String> {
        let ext = path.extension()?.to_str()?;
        self.types.get(ext).cloned()
    }

    /// Conversion commands leaving `from`, in destination order.
    pub(crate) fn edges_from(&self, from: &str) -> impl Iterator<Item = (&str, &ConversionStep)> {
        self.edges
            .get(from)
            .into_iter()
            .flat_map(|m| m.iter().map(|(to, step)| (to.as_str(), step)))
    }
}

/// Clone-able handle sharing one graph between the command layer, which
/// keeps defining types and conversions, and the dispatch engine, which
/// resolves paths through it.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: std::sync::Arc<std::sync::RwLock<ConversionGraph>>,
}

impl SharedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_type(&self, name: &str) -> Result<()> {
        self.write(|g| g.define_type(name))
    }

    pub fn define_conversion(&self, from: &str, to: &str, step: ConversionStep) -> Result<()> {
        self.write(|g| g.define_conversion(from, to, step))
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.read(|g| g.has_type(name))
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&ConversionGraph) -> T) -> T {
        f(&self.inner.read().expect("conversion graph lock"))
    }

    fn write<T>(&self, f: impl FnOnce(&mut ConversionGraph) -> T) -> T {
        f(&mut self.inner.write().expect("conversion graph lock"))
    }
}
