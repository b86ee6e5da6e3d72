//! Dependency graph over the unit arena with cycle-safe ordering.
//!
//! Nodes are arena indices; adjacency lists keep first-occurrence edge
//! order. The traversal is an iterative depth-first walk with explicit
//! visited and on-path state, so cyclic repositories terminate and every
//! unit is emitted exactly once.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::{DependencyEdge, Diagnostic, ModuleUnit};

#[derive(Debug)]
pub struct DependencyGraph {
    adjacency: Vec<Vec<usize>>,
    /// Ordering edges from each named unit to its file's header unit.
    /// These are not imports and never produce cycle diagnostics.
    containment: HashSet<(usize, usize)>,
}

/// Node state during traversal.
#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

impl DependencyGraph {
    /// Build adjacency lists from resolved edges. Duplicate edges (the
    /// same unit imported twice) collapse to their first occurrence.
    ///
    /// Besides the resolved import edges, every named unit gets an
    /// ordering edge to its file's header unit: the header carries the
    /// file's imports, so its dependencies must land before any unit of
    /// that file.
    pub fn build(units: &[ModuleUnit], edges: &[DependencyEdge]) -> Self {
        let index_of: HashMap<_, usize> = units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.id.clone(), i))
            .collect();

        let mut adjacency = vec![Vec::new(); units.len()];
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for edge in edges {
            // Both endpoints exist by construction: resolution only emits
            // edges for units found in the symbol table.
            let (Some(&from), Some(&to)) = (index_of.get(&edge.from), index_of.get(&edge.to))
            else {
                continue;
            };
            if from != to && seen.insert((from, to)) {
                adjacency[from].push(to);
            }
        }

        let header_of: HashMap<&str, usize> = units
            .iter()
            .enumerate()
            .filter(|(_, u)| u.id.is_file_header())
            .map(|(i, u)| (u.id.file_path.as_str(), i))
            .collect();
        let mut containment = HashSet::new();
        for (index, unit) in units.iter().enumerate() {
            if unit.id.is_file_header() {
                continue;
            }
            if let Some(&header) = header_of.get(unit.id.file_path.as_str()) {
                if seen.insert((index, header)) {
                    adjacency[index].push(header);
                    containment.insert((index, header));
                }
            }
        }

        DependencyGraph {
            adjacency,
            containment,
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Dependency-first ordering of every node.
    ///
    /// Depth-first from each node in arena (file-discovery) order; a node
    /// is emitted once all of its dependencies are. A dependency already
    /// on the current path closes a cycle: it is treated as emitted and
    /// the cycle membership is reported as an ImportCycle diagnostic.
    pub fn topological_order(
        &self,
        units: &[ModuleUnit],
    ) -> (Vec<usize>, Vec<Diagnostic>) {
        let n = self.adjacency.len();
        let mut marks = vec![Mark::Unvisited; n];
        let mut order = Vec::with_capacity(n);
        let mut diagnostics = Vec::new();
        let mut reported_cycles: HashSet<Vec<usize>> = HashSet::new();

        for root in 0..n {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            // Frame: (node, next child offset). `path` mirrors the stack.
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            let mut path: Vec<usize> = vec![root];
            marks[root] = Mark::OnPath;

            while let Some(&mut (node, ref mut child_pos)) = stack.last_mut() {
                if let Some(&child) = self.adjacency[node].get(*child_pos) {
                    *child_pos += 1;
                    match marks[child] {
                        Mark::Unvisited => {
                            marks[child] = Mark::OnPath;
                            stack.push((child, 0));
                            path.push(child);
                        }
                        Mark::OnPath => {
                            // Back edge: record the cycle once, keep going.
                            // Loops closed only by a containment ordering
                            // edge are not import cycles.
                            if self.containment.contains(&(node, child)) {
                                continue;
                            }
                            let start = path.iter().position(|&p| p == child)
                                .unwrap_or(0);
                            let cycle: Vec<usize> = path[start..].to_vec();
                            if reported_cycles.insert(canonical_cycle(&cycle)) {
                                debug!(len = cycle.len(), "import cycle detected");
                                diagnostics.push(Diagnostic::ImportCycle {
                                    unit_ids: cycle
                                        .iter()
                                        .map(|&i| units[i].id.clone())
                                        .collect(),
                                });
                            }
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    order.push(node);
                    stack.pop();
                    path.pop();
                }
            }
        }

        (order, diagnostics)
    }
}

/// Rotate a cycle so its smallest index comes first, giving a canonical
/// form for dedup regardless of where the traversal entered it.
fn canonical_cycle(cycle: &[usize]) -> Vec<usize> {
    let min_pos = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, &v)| v)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut rotated = Vec::with_capacity(cycle.len());
    rotated.extend_from_slice(&cycle[min_pos..]);
    rotated.extend_from_slice(&cycle[..min_pos]);
    rotated
}
