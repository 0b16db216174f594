//! C5: a generic, direction-parametric worklist fixed-point solver (§4.1).
//!
//! Any analysis that can state its lattice, its boundary fact, its meet,
//! and its per-node transfer function gets a correct, terminating,
//! worklist-driven solve for free — this is what both intraprocedural CP
//! (C4) and the dead-code liveness pass (C6) are built on.

use crate::shared::ir::{Cfg, NodeId};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A monotone dataflow analysis over one method's CFG.
pub trait Analysis {
    type Fact: Clone + PartialEq;

    fn direction(&self) -> Direction;

    /// The fact that holds at the boundary (CFG entry for a forward
    /// analysis, exit for a backward one) before any propagation.
    fn boundary(&self) -> Self::Fact;

    /// The fact every other node starts at — lattice bottom (`UNDEF`
    /// everywhere, for CP; the empty set, for liveness).
    fn initial(&self) -> Self::Fact;

    fn meet(&self, a: &Self::Fact, b: &Self::Fact) -> Self::Fact;

    /// Computes the node's output fact from its input fact. For a forward
    /// analysis this is `OUT = transfer(node, IN)`; for a backward one,
    /// the "input"/"output" are from the analysis's own point of view
    /// (flow travels node → predecessors), so the solver passes the fact
    /// coming from successors as `input` and expects the fact to push to
    /// predecessors as the result.
    fn transfer(&self, cfg: &Cfg, node: NodeId, input: &Self::Fact) -> Self::Fact;
}

/// Per-node results: `(in_fact, out_fact)` in the analysis's own forward/
/// backward sense (for backward analyses, `in_fact` is the fact nearer the
/// exit and `out_fact` the one nearer the entry — callers that care about
/// source-order IN/OUT should consult `direction()` first).
pub struct SolveResult<F> {
    pub in_facts: Vec<F>,
    pub out_facts: Vec<F>,
}

/// Runs `analysis` over `cfg` to a fixed point.
pub fn solve<A: Analysis>(analysis: &A, cfg: &Cfg) -> SolveResult<A::Fact> {
    let node_count = cfg.len() + 1; // + virtual exit sentinel
    let boundary_node = match analysis.direction() {
        Direction::Forward => cfg.entry,
        Direction::Backward => cfg.exit,
    };

    let mut out_facts: Vec<A::Fact> = (0..node_count)
        .map(|n| {
            if n == boundary_node {
                analysis.boundary()
            } else {
                analysis.initial()
            }
        })
        .collect();
    let mut in_facts: Vec<A::Fact> = (0..node_count).map(|_| analysis.initial()).collect();

    let mut worklist: VecDeque<NodeId> = VecDeque::new();
    let mut queued: FxHashSet<NodeId> = FxHashSet::default();
    for n in 0..node_count {
        if n != boundary_node {
            worklist.push_back(n);
            queued.insert(n);
        }
    }

    let (preds_of, succs_of): (
        fn(&Cfg, NodeId) -> &[NodeId],
        fn(&Cfg, NodeId) -> &[NodeId],
    ) = match analysis.direction() {
        Direction::Forward => (Cfg::predecessors, Cfg::successors),
        Direction::Backward => (Cfg::successors, Cfg::predecessors),
    };

    let mut steps = 0u64;
    while let Some(node) = worklist.pop_front() {
        queued.remove(&node);
        steps += 1;

        let preds = preds_of(cfg, node);
        let mut merged = analysis.initial();
        for (i, p) in preds.iter().enumerate() {
            let fact = &out_facts[*p];
            merged = if i == 0 {
                fact.clone()
            } else {
                analysis.meet(&merged, fact)
            };
        }
        in_facts[node] = merged;

        let new_out = analysis.transfer(cfg, node, &in_facts[node]);
        if new_out != out_facts[node] {
            out_facts[node] = new_out;
            for succ in succs_of(cfg, node) {
                if queued.insert(*succ) {
                    worklist.push_back(*succ);
                }
            }
        }
    }

    debug!(steps, node_count, "worklist solve converged");

    match analysis.direction() {
        Direction::Forward => SolveResult {
            in_facts,
            out_facts,
        },
        // For a backward analysis "in_facts"/"out_facts" as computed above
        // are already in the analysis's own entry/exit sense (flow runs
        // node -> predecessor), which is what callers of a backward
        // analysis expect: in_facts[n] is the fact just after n (towards
        // exit), out_facts[n] the fact just before n (towards entry).
        Direction::Backward => SolveResult {
            in_facts,
            out_facts,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ir::{Operand, Stmt};

    /// A trivial analysis counting how many predecessors flow into each
    /// node, to exercise the solver's plumbing independent of any real
    /// lattice.
    struct ReachabilityAnalysis;

    impl Analysis for ReachabilityAnalysis {
        type Fact = bool;

        fn direction(&self) -> Direction {
            Direction::Forward
        }

        fn boundary(&self) -> bool {
            true
        }

        fn initial(&self) -> bool {
            false
        }

        fn meet(&self, a: &bool, b: &bool) -> bool {
            *a || *b
        }

        fn transfer(&self, _cfg: &Cfg, _node: NodeId, input: &bool) -> bool {
            *input
        }
    }

    #[test]
    fn reachability_propagates_through_a_straight_line() {
        let cfg = Cfg::new(vec![
            Stmt::Assign {
                lhs: 0,
                rhs: crate::shared::ir::RValue::Operand(Operand::Const(1)),
            },
            Stmt::Return(None),
        ]);
        let result = solve(&ReachabilityAnalysis, &cfg);
        assert!(result.out_facts[0]);
        assert!(result.out_facts[1]);
    }

    #[test]
    fn unreachable_branch_target_stays_unreached() {
        // node 0: if (false) goto 2 else goto 1 -- but node 2 has no
        // predecessor other than this dead edge is still "reached" by
        // worklist construction (CFG reachability isn't pruned by this
        // generic solver -- that's DCD's job, layered on top).
        let cfg = Cfg::new(vec![
            Stmt::If {
                cond: Operand::Const(0),
                true_target: 1,
                false_target: 1,
            },
            Stmt::Return(None),
        ]);
        let result = solve(&ReachabilityAnalysis, &cfg);
        assert!(result.out_facts[1]);
    }
}
