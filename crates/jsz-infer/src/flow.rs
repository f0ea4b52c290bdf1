//! Forward dataflow driver.
//!
//! A standard worklist fixpoint over the supplied CFG: each node's incoming
//! scope is the slot-wise join of its predecessors' edge scopes, the
//! transfer functions come from [`TypeInference`], and iteration stops when
//! no edge scope carries new information under the data-flow equivalence.
//! Types only widen through joins, so the lattice height bounds the fixpoint;
//! a generous iteration cap guards the analysis against a degenerate graph,
//! degrading by keeping the last computed scopes rather than failing.

use crate::cfg::{Branch, CfgNodeIndex, ControlFlowGraph};
use crate::infer::{GraphInvariantError, TypeInference};
use crate::scope::FlowScope;
use jsz_types::TypeRegistry;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Upper bound on node visits in one analysis run.
pub const MAX_FLOW_ITERATIONS: usize = 100_000;

/// The per-node incoming scopes computed by a run. Nodes never reached keep
/// the bottom sentinel.
#[derive(Debug)]
pub struct FlowAnalysisResult {
    in_scopes: Vec<FlowScope>,
}

impl FlowAnalysisResult {
    /// The scope flowing into a CFG node.
    pub fn scope_before(&self, index: CfgNodeIndex) -> &FlowScope {
        &self.in_scopes[index.0]
    }
}

pub struct DataFlowAnalysis<'a> {
    registry: &'a TypeRegistry,
    inference: &'a TypeInference<'a>,
    cfg: &'a ControlFlowGraph,
}

impl<'a> DataFlowAnalysis<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        inference: &'a TypeInference<'a>,
        cfg: &'a ControlFlowGraph,
    ) -> Self {
        Self {
            registry,
            inference,
            cfg,
        }
    }

    /// Run the forward analysis from `entry_scope`, annotating expression
    /// nodes as a side effect.
    pub fn analyze(&self, entry_scope: FlowScope) -> Result<FlowAnalysisResult, GraphInvariantError> {
        let node_count = self.cfg.len();
        let mut in_scopes: Vec<FlowScope> = vec![FlowScope::bottom(); node_count];
        // Outgoing scope per (node, outgoing-edge ordinal).
        let mut edge_scopes: FxHashMap<(usize, usize), FlowScope> = FxHashMap::default();

        let Some(entry) = self.cfg.entry() else {
            return Ok(FlowAnalysisResult { in_scopes });
        };

        let mut worklist: VecDeque<CfgNodeIndex> = VecDeque::new();
        let mut queued: FxHashSet<usize> = FxHashSet::default();
        worklist.push_back(entry);
        queued.insert(entry.0);

        let mut iterations = 0usize;
        while let Some(index) = worklist.pop_front() {
            queued.remove(&index.0);
            iterations += 1;
            if iterations > MAX_FLOW_ITERATIONS {
                debug!(iterations, "flow analysis hit the iteration cap");
                break;
            }

            let input = self.incoming_scope(index, entry, &entry_scope, &edge_scopes);
            in_scopes[index.0] = input.clone();

            let successors = self.cfg.successors(index);
            let branches: Vec<Branch> = successors.iter().map(|&(branch, _)| branch).collect();
            let outputs =
                self.inference
                    .branched_flow_through(self.cfg.node(index), &input, &branches)?;

            for (ordinal, ((_, successor), output)) in
                successors.iter().zip(outputs.into_iter()).enumerate()
            {
                let key = (index.0, ordinal);
                let changed = match edge_scopes.get(&key) {
                    Some(previous) => !FlowScope::same_knowledge(self.registry, previous, &output),
                    None => true,
                };
                if changed {
                    trace!(from = index.0, ordinal, "edge scope changed");
                    edge_scopes.insert(key, output);
                    if queued.insert(successor.0) {
                        worklist.push_back(*successor);
                    }
                }
            }
        }

        Ok(FlowAnalysisResult { in_scopes })
    }

    /// Join of the predecessors' edge scopes into `index`; the entry node
    /// additionally receives the initial scope.
    fn incoming_scope(
        &self,
        index: CfgNodeIndex,
        entry: CfgNodeIndex,
        entry_scope: &FlowScope,
        edge_scopes: &FxHashMap<(usize, usize), FlowScope>,
    ) -> FlowScope {
        let mut input = if index == entry {
            entry_scope.clone()
        } else {
            FlowScope::bottom()
        };
        for &pred in self.cfg.predecessors(index) {
            for (ordinal, &(_, successor)) in self.cfg.successors(pred).iter().enumerate() {
                if successor != index {
                    continue;
                }
                if let Some(scope) = edge_scopes.get(&(pred.0, ordinal)) {
                    input = FlowScope::join(self.registry, &input, scope);
                }
            }
        }
        input
    }
}

#[cfg(test)]
#[path = "../tests/flow_tests.rs"]
mod tests;
