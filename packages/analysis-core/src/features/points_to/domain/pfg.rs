//! C8: the pointer-flow graph itself — points-to sets plus propagation
//! (simple/copy) edges between nodes (§3, §4.5).

use super::pointer::PfgNode;
use crate::shared::ObjectId;
use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;
use std::sync::OnceLock;

fn empty_set() -> &'static FxHashSet<ObjectId> {
    static EMPTY: OnceLock<FxHashSet<ObjectId>> = OnceLock::new();
    EMPTY.get_or_init(FxHashSet::default)
}

#[derive(Debug, Default)]
pub struct PointerFlowGraph<C: Clone + Eq + Hash> {
    pts: FxHashMap<PfgNode<C>, FxHashSet<ObjectId>>,
    edges: FxHashMap<PfgNode<C>, FxHashSet<PfgNode<C>>>,
}

impl<C: Clone + Eq + Hash> PointerFlowGraph<C> {
    pub fn new() -> Self {
        Self {
            pts: FxHashMap::default(),
            edges: FxHashMap::default(),
        }
    }

    pub fn pts(&self, node: &PfgNode<C>) -> &FxHashSet<ObjectId> {
        self.pts.get(node).unwrap_or_else(|| empty_set())
    }

    /// Adds `obj` to `node`'s points-to set. Returns `true` if it wasn't
    /// already there (the caller should re-queue `node` on its worklist).
    pub fn add_pts(&mut self, node: PfgNode<C>, obj: ObjectId) -> bool {
        self.pts.entry(node).or_default().insert(obj)
    }

    /// Adds a simple/copy edge `from -> to` (`pt(to) ⊇ pt(from)`). Returns
    /// `true` if the edge is new.
    pub fn add_edge(&mut self, from: PfgNode<C>, to: PfgNode<C>) -> bool {
        if from == to {
            return false;
        }
        self.edges.entry(from).or_default().insert(to)
    }

    pub fn successors(&self, node: &PfgNode<C>) -> impl Iterator<Item = PfgNode<C>> + '_ {
        self.edges
            .get(node)
            .into_iter()
            .flat_map(|s| s.iter().cloned())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &PfgNode<C>> + '_ {
        self.pts.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_edge_propagation_is_the_caller_s_job_but_pts_and_edges_compose() {
        let mut pfg: PointerFlowGraph<()> = PointerFlowGraph::new();
        let x = PfgNode::var((), 0);
        let y = PfgNode::var((), 1);
        pfg.add_edge(x, y);
        assert!(pfg.add_pts(x, ObjectId(0)));
        assert!(!pfg.add_pts(x, ObjectId(0)));
        assert_eq!(pfg.pts(&y).len(), 0);
        assert!(pfg.successors(&x).any(|n| n == y));
    }
}
