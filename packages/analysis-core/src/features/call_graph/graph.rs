//! The call graph data structure shared by CHA (C7) and the PTA-backed
//! call graph (§4.5/§4.6): a set of call edges plus the small query
//! surface downstream consumers (ICPI, taint) need.

use crate::shared::ir::{MethodId, NodeId};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallSite {
    pub caller: MethodId,
    pub stmt: NodeId,
}

#[derive(Debug, Default, Clone)]
pub struct CallGraph {
    edges: FxHashMap<CallSite, FxHashSet<MethodId>>,
    reachable: FxHashSet<MethodId>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, site: CallSite, callee: MethodId) -> bool {
        self.reachable.insert(callee);
        self.edges.entry(site).or_default().insert(callee)
    }

    pub fn mark_reachable(&mut self, method: MethodId) -> bool {
        self.reachable.insert(method)
    }

    /// Resolved callees at `site`, in no particular order — callers that
    /// need determinism should sort.
    pub fn edges_from(&self, site: CallSite) -> impl Iterator<Item = MethodId> + '_ {
        self.edges
            .get(&site)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// All methods discovered as call targets or explicitly marked as
    /// entry points, sorted for deterministic reporting.
    pub fn reachable_methods(&self) -> Vec<MethodId> {
        let mut v: Vec<MethodId> = self.reachable.iter().copied().collect();
        v.sort_unstable();
        v
    }

    pub fn is_reachable(&self, method: MethodId) -> bool {
        self.reachable.contains(&method)
    }

    /// All call sites with at least one resolved edge, sorted.
    pub fn call_sites(&self) -> Vec<CallSite> {
        let mut v: Vec<CallSite> = self.edges.keys().copied().collect();
        v.sort_unstable();
        v
    }
}
