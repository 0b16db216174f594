//! C6: dead-code detection (§4.3) — unreachable code (including branches
//! on a known-constant condition) and dead assignments (side-effect-free
//! writes to a variable that's never live afterward).

use super::liveness::LivenessAnalysis;
use crate::features::constant_propagation::domain::AbstractValue;
use crate::features::constant_propagation::infrastructure::{eval_operand, IntraproceduralCp};
use crate::shared::ir::{Method, NodeId, Stmt};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadCodeReport {
    /// CFG nodes never reached from entry, sorted by `NodeId`.
    pub unreachable: Vec<NodeId>,
    /// Assignments whose `lhs` is never live afterward and whose `rhs` has
    /// no side effect, sorted by `NodeId`.
    pub dead_assignments: Vec<NodeId>,
    /// Branch edges pruned because the condition/selector folded to a
    /// known constant: `(from, to)`, sorted.
    pub pruned_edges: Vec<(NodeId, NodeId)>,
}

/// Runs DCD for one method: layers CP (to prune statically-known branches)
/// and liveness (to find dead writes) on top of the method's own CFG.
pub fn detect(method: &Method) -> DeadCodeReport {
    let cp = IntraproceduralCp::new(method).run();
    let liveness = LivenessAnalysis::new(&method.cfg).run();

    let cfg = &method.cfg;
    let mut reached: FxHashSet<NodeId> = FxHashSet::default();
    let mut pruned_edges = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(cfg.entry);
    reached.insert(cfg.entry);

    while let Some(node) = queue.pop_front() {
        let targets = taken_successors(method, node, &cp.in_facts[node], &mut pruned_edges);
        for t in targets {
            if reached.insert(t) {
                queue.push_back(t);
            }
        }
    }

    let mut unreachable: Vec<NodeId> = cfg.nodes().filter(|n| !reached.contains(n)).collect();
    unreachable.sort_unstable();

    let mut dead_assignments = Vec::new();
    for node in cfg.nodes() {
        if !reached.contains(&node) {
            continue;
        }
        if let Stmt::Assign { lhs, .. } = cfg.stmt(node) {
            let stmt = cfg.stmt(node);
            if !stmt.has_side_effect() && !liveness.in_facts[node].0.contains(lhs) {
                dead_assignments.push(node);
            }
        }
    }
    dead_assignments.sort_unstable();
    pruned_edges.sort_unstable();

    debug!(
        unreachable = unreachable.len(),
        dead_assignments = dead_assignments.len(),
        pruned_edges = pruned_edges.len(),
        "dead code detection finished"
    );

    DeadCodeReport {
        unreachable,
        dead_assignments,
        pruned_edges,
    }
}

/// The successors actually reachable from `node` given the CP fact that
/// held just before it executed: branches/switches with a known-constant
/// condition only flow to their taken target, with every other structural
/// edge recorded as pruned.
fn taken_successors(
    method: &Method,
    node: NodeId,
    in_fact: &crate::features::constant_propagation::domain::CpFact,
    pruned_edges: &mut Vec<(NodeId, NodeId)>,
) -> Vec<NodeId> {
    let cfg = &method.cfg;
    match cfg.stmt(node) {
        Stmt::If {
            cond,
            true_target,
            false_target,
        } => match eval_operand(*cond, in_fact) {
            AbstractValue::Const(c) => {
                let (taken, pruned) = if c != 0 {
                    (*true_target, *false_target)
                } else {
                    (*false_target, *true_target)
                };
                if pruned != taken {
                    pruned_edges.push((node, pruned));
                }
                vec![taken]
            }
            _ => cfg.successors(node).to_vec(),
        },
        Stmt::Switch {
            selector,
            cases,
            default,
        } => match eval_operand(*selector, in_fact) {
            AbstractValue::Const(c) => {
                let taken = cases
                    .iter()
                    .find(|(v, _)| *v == c)
                    .map(|(_, t)| *t)
                    .unwrap_or(*default);
                for (_, t) in cases {
                    if *t != taken {
                        pruned_edges.push((node, *t));
                    }
                }
                if *default != taken {
                    pruned_edges.push((node, *default));
                }
                vec![taken]
            }
            _ => cfg.successors(node).to_vec(),
        },
        _ => cfg.successors(node).to_vec(),
    }
}
