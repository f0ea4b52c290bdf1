//! Control-flow graph boundary.
//!
//! The graph is built by the surrounding pipeline; the engine only reads it.
//! Nodes are syntax-arena node ids, edges carry the branch label the reverse
//! abstract interpreter keys its narrowing on.

use crate::syntax::NodeId;

/// Label on a CFG edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Branch {
    /// Edge is always taken.
    Unconditional,
    /// Taken when the node's condition coerces to true.
    OnTrue,
    /// Taken when the node's condition coerces to false.
    OnFalse,
    /// Taken when the node throws. Treated like an unconditional edge by
    /// the engine; the per-throw-point join is a documented approximation.
    OnException,
    /// Taken when a case expression matches the switch subject.
    CaseMatch,
}

/// Index of a node within one control-flow graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CfgNodeIndex(pub usize);

pub struct ControlFlowGraph {
    nodes: Vec<NodeId>,
    succs: Vec<Vec<(Branch, CfgNodeIndex)>>,
    preds: Vec<Vec<CfgNodeIndex>>,
}

impl Default for ControlFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlFlowGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            succs: Vec::new(),
            preds: Vec::new(),
        }
    }

    /// Add a statement/expression node. The first node added is the entry.
    pub fn add_node(&mut self, node: NodeId) -> CfgNodeIndex {
        let index = CfgNodeIndex(self.nodes.len());
        self.nodes.push(node);
        self.succs.push(Vec::new());
        self.preds.push(Vec::new());
        index
    }

    pub fn add_edge(&mut self, from: CfgNodeIndex, branch: Branch, to: CfgNodeIndex) {
        self.succs[from.0].push((branch, to));
        self.preds[to.0].push(from);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn entry(&self) -> Option<CfgNodeIndex> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(CfgNodeIndex(0))
        }
    }

    pub fn node(&self, index: CfgNodeIndex) -> NodeId {
        self.nodes.get(index.0).copied().unwrap_or(NodeId::NONE)
    }

    pub fn successors(&self, index: CfgNodeIndex) -> &[(Branch, CfgNodeIndex)] {
        self.succs.get(index.0).map_or(&[], Vec::as_slice)
    }

    pub fn predecessors(&self, index: CfgNodeIndex) -> &[CfgNodeIndex] {
        self.preds.get(index.0).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
#[path = "../tests/cfg_tests.rs"]
mod tests;
