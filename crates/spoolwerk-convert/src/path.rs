// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Breadth-first conversion-path resolution.
//
// BFS guarantees the resolved pipeline has the fewest stages; among paths of
// equal length the deterministic neighbour order of the registry decides.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use tracing::trace;

use spoolwerk_core::traits::CapabilityResolver;
use spoolwerk_core::types::ConversionStep;

use crate::registry::ConversionGraph;

impl ConversionGraph {
    /// Resolve the ordered conversion-step sequence from `from` to `to`.
    ///
    /// Returns an empty sequence when the types already match, `None` when
    /// either type is unregistered or no chain of conversions reaches `to`.
    pub fn find_path(&self, from: &str, to: &str) -> Option<Vec<ConversionStep>> {
        if !self.has_type(from) || !self.has_type(to) {
            return None;
        }
        if from == to {
            return Some(Vec::new());
        }

        // Predecessor map for path reconstruction: visited type → the type
        // we came from and the step that got us here.
        let mut prev: HashMap<&str, (&str, &ConversionStep)> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for (next, step) in self.edges_from(current) {
                if next == from || prev.contains_key(next) {
                    continue;
                }
                prev.insert(next, (current, step));
                if next == to {
                    return Some(rebuild(&prev, from, to));
                }
                queue.push_back(next);
            }
        }

        trace!(from, to, "destination unreachable");
        None
    }
}

/// Walk the predecessor map backwards from `to` and collect the steps in
/// source-to-sink order.
fn rebuild(
    prev: &HashMap<&str, (&str, &ConversionStep)>,
    from: &str,
    to: &str,
) -> Vec<ConversionStep> {
    let mut steps = Vec::new();
    let mut current = to;
    while current != from {
        let Some(&(parent, step)) = prev.get(current) else {
            break;
        };
        steps.push(step.clone());
        current = parent;
    }
    steps.reverse();
    steps
}

impl CapabilityResolver for ConversionGraph {
    fn infer_type(&self, path: &Path) -> Option<String> {
        ConversionGraph::infer_type(self, path)
    }

    fn resolve(&self, from: &str, to: &str) -> Option<Vec<ConversionStep>> {
        self.find_path(from, to)
    }
}

impl CapabilityResolver for crate::registry::SharedGraph {
    fn infer_type(&self, path: &Path) -> Option<String> {
        self.read(|g| g.infer_type(path))
    }

    fn resolve(&self, from: &str, to: &str) -> Option<Vec<ConversionStep>> {
        self.read(|g| g.find_path(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(types: &[&str], edges: &[(&str, &str)]) -> ConversionGraph {
        let mut g = ConversionGraph::new();
        for t in types {
            g.define_type(t).expect("define type");
        }
        for (from, to) in edges {
            let cmd = format!("{from}2{to}");
            g.define_conversion(from, to, ConversionStep::new(cmd, vec![]))
                .expect("define conversion");
        }
        g
    }

    #[test]
    fn same_type_resolves_to_empty_path() {
        let g = graph(&["pdf"], &[]);
        assert_eq!(g.find_path("pdf", "pdf"), Some(Vec::new()));
    }

    #[test]
    fn direct_edge_resolves_to_one_step() {
        let g = graph(&["pdf", "ps"], &[("pdf", "ps")]);
        let path = g.find_path("pdf", "ps").expect("reachable");
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].command, "pdf2ps");
    }

    #[test]
    fn multi_hop_path_is_ordered_source_to_sink() {
        let g = graph(
            &["txt", "ps", "pdf"],
            &[("txt", "ps"), ("ps", "pdf")],
        );
        let path = g.find_path("txt", "pdf").expect("reachable");
        let commands: Vec<&str> = path.iter().map(|s| s.command.as_str()).collect();
        assert_eq!(commands, ["txt2ps", "ps2pdf"]);
    }

    #[test]
    fn bfs_prefers_the_shorter_path() {
        // txt→pdf directly, and txt→ps→pdf. BFS must pick the direct edge.
        let g = graph(
            &["txt", "ps", "pdf"],
            &[("txt", "ps"), ("ps", "pdf"), ("txt", "pdf")],
        );
        let path = g.find_path("txt", "pdf").expect("reachable");
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].command, "txt2pdf");
    }

    #[test]
    fn edges_are_directed() {
        let g = graph(&["pdf", "ps"], &[("pdf", "ps")]);
        assert!(g.find_path("ps", "pdf").is_none());
    }

    #[test]
    fn unregistered_types_are_unreachable() {
        let g = graph(&["pdf"], &[]);
        assert!(g.find_path("pdf", "ps").is_none());
        assert!(g.find_path("ps", "pdf").is_none());
    }

    #[test]
    fn cycles_terminate() {
        let g = graph(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "a"), ("b", "c")],
        );
        let path = g.find_path("a", "c").expect("reachable through the cycle");
        assert_eq!(path.len(), 2);
        assert!(g.find_path("c", "a").is_none());
    }
}
