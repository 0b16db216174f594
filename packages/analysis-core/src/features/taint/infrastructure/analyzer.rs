//! C12: taint analysis (§4.8), layered on top of a finished pointer
//! analysis. Rather than re-running the solver's own worklist with taint
//! seeded in from the start, this module treats the PTA run's
//! points-to/pointer-flow graph as already converged and floods taint
//! objects through its *existing* copy edges with the same
//! `add_pts`/`successors` primitives the solver itself uses to propagate
//! ordinary objects -- the three hooks (source, transfer, sink) only ever
//! add objects and edges the solver's own fixed point already computed,
//! so the call graph and PFG topology never need to be revisited.
//!
//! Implemented against the context-insensitive result (`CiResult`); the
//! context-sensitive solver (C10) shares the same `PfgNode<C>` /
//! `PointerFlowGraph<C>` shape, so retargeting this layer at a
//! context-sensitive run is a matter of threading a `Context` through
//! `flood` and the call-site iteration below, not a structural change.

use super::super::domain::{MethodRefConfig, Slot, TaintConfig};
use super::manager::TaintManager;
use crate::features::call_graph::CallSite;
use crate::features::points_to::{CiResult, PfgNode};
use crate::shared::ir::{Method, Operand, Stmt, VarId};
use crate::shared::{ObjectId, Program};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaintFlow {
    pub source: CallSite,
    pub sink: CallSite,
    pub arg_index: u32,
}

pub fn run<P: Program>(program: &P, pta: &mut CiResult, config: &TaintConfig) -> Vec<TaintFlow> {
    let mut manager = TaintManager::new();
    seed_and_propagate(program, pta, config, &mut manager);
    let mut flows = collect_sinks(program, pta, config, &manager);
    flows.sort_unstable();
    flows.dedup();
    debug!(flows = flows.len(), "taint analysis converged");
    flows
}

fn method_key(method: &Method) -> MethodRefConfig {
    MethodRefConfig {
        declaring_class: method.declaring_class,
        subsignature: method.subsignature.0.clone(),
    }
}

/// Pushes `obj` through the pointer-flow graph from `start`, reusing the
/// PTA's own copy edges. Returns whether anything new was added.
fn flood(pfg: &mut crate::features::points_to::PointerFlowGraph<()>, start: PfgNode<()>, obj: ObjectId) -> bool {
    let mut changed = false;
    let mut worklist = VecDeque::new();
    if pfg.add_pts(start, obj) {
        changed = true;
        worklist.push_back(start);
    }
    while let Some(n) = worklist.pop_front() {
        let succs: Vec<_> = pfg.successors(&n).collect();
        for s in succs {
            if pfg.add_pts(s, obj) {
                changed = true;
                worklist.push_back(s);
            }
        }
    }
    changed
}

fn slot_var(slot: Slot, receiver: Option<VarId>, lhs: Option<VarId>, args: &[Operand]) -> Option<VarId> {
    match slot {
        Slot::Base => receiver,
        Slot::Result => lhs,
        Slot::Arg(i) => args.get(i as usize).and_then(|op| match op {
            Operand::Var(v) => Some(*v),
            Operand::Const(_) => None,
        }),
    }
}

/// Hooks 1 and 2 of §4.8: source processing and transfer-rule application,
/// iterated to a fixed point since a transfer at one call site can depend
/// on taint sourced or transferred at another call site visited later in
/// call-site order.
fn seed_and_propagate<P: Program>(
    program: &P,
    pta: &mut CiResult,
    config: &TaintConfig,
    manager: &mut TaintManager,
) {
    loop {
        let mut changed = false;
        for site in pta.call_graph.call_sites() {
            let caller = program.method(site.caller);
            let Stmt::Invoke { lhs, expr } = caller.cfg.stmt(site.stmt) else {
                continue;
            };
            for callee_id in pta.call_graph.edges_from(site).collect::<Vec<_>>() {
                let callee = program.method(callee_id);
                let key = method_key(callee);

                for src in config.sources_for(&key).cloned().collect::<Vec<_>>() {
                    if let Some(l) = lhs {
                        let obj = manager.materialize(&mut pta.heap, site, src.return_type);
                        if flood(&mut pta.pfg, PfgNode::var((), l), obj) {
                            changed = true;
                        }
                    }
                }

                for t in config.transfers_for(&key).cloned().collect::<Vec<_>>() {
                    let Some(from_var) = slot_var(t.from, expr.receiver, lhs, &expr.args) else {
                        continue;
                    };
                    let Some(to_var) = slot_var(t.to, expr.receiver, lhs, &expr.args) else {
                        continue;
                    };
                    let tainted: Vec<ObjectId> = pta
                        .pts_of_var(from_var)
                        .iter()
                        .copied()
                        .filter(|o| manager.is_tainted(*o))
                        .collect();
                    for o in tainted {
                        let origin = manager
                            .origin(o)
                            .expect("filtered by is_tainted, so origin must exist");
                        let new_obj = manager.materialize(&mut pta.heap, origin.source_site, t.to_type);
                        if flood(&mut pta.pfg, PfgNode::var((), to_var), new_obj) {
                            changed = true;
                        }
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
}

/// Hook 3 of §4.8: finish by scanning every reachable call to a configured
/// sink and emitting a flow for every tainted object in the sunk argument.
fn collect_sinks<P: Program>(
    program: &P,
    pta: &CiResult,
    config: &TaintConfig,
    manager: &TaintManager,
) -> Vec<TaintFlow> {
    let mut flows = Vec::new();
    for site in pta.call_graph.call_sites() {
        let caller = program.method(site.caller);
        let Stmt::Invoke { expr, .. } = caller.cfg.stmt(site.stmt) else {
            continue;
        };
        for callee_id in pta.call_graph.edges_from(site) {
            let callee = program.method(callee_id);
            let key = method_key(callee);
            for sink in config.sinks_for(&key) {
                let Some(Operand::Var(arg_var)) = expr.args.get(sink.arg_index as usize) else {
                    continue;
                };
                for obj in pta.pts_of_var(*arg_var) {
                    if let Some(origin) = manager.origin(*obj) {
                        flows.push(TaintFlow {
                            source: origin.source_site,
                            sink: site,
                            arg_index: sink.arg_index,
                        });
                    }
                }
            }
        }
    }
    flows
}
