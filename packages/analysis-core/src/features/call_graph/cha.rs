//! C7: class-hierarchy analysis (§4.4).
//!
//! Starting from the program's entry points, CHA walks reachable methods'
//! call sites. Static and special calls resolve to exactly one target
//! (via `dispatch` on the literal/declared receiver class); virtual and
//! interface calls conservatively resolve to `dispatch(c, sig)` for every
//! concrete `c` in `{declaring_class} ∪ direct_subclasses ∪
//! direct_subinterfaces ∪ direct_implementors` (§4.4) — one level, not the
//! transitive closure, since a subclass's own overrides are reached through
//! its own declaring-class dispatch, not by re-walking its descendants here.

use super::graph::{CallGraph, CallSite};
use crate::shared::ir::{InvokeKind, MethodId, Stmt};
use crate::shared::{ClassHierarchy, Program};
use std::collections::VecDeque;
use tracing::debug;

/// Runs CHA over `program`, starting from its declared entry points.
pub fn build<P: Program, H: ClassHierarchy>(program: &P, hierarchy: &H) -> CallGraph {
    let mut graph = CallGraph::new();
    let mut queue: VecDeque<MethodId> = VecDeque::new();

    for &entry in program.entry_points() {
        if graph.mark_reachable(entry) {
            queue.push_back(entry);
        }
    }

    while let Some(caller) = queue.pop_front() {
        let method = program.method(caller);
        for node in method.cfg.nodes() {
            let Stmt::Invoke { expr, .. } = method.cfg.stmt(node) else {
                continue;
            };
            let site = CallSite { caller, stmt: node };
            let targets = resolve(expr, hierarchy);
            for target in targets {
                if graph.add_edge(site, target) && graph.mark_reachable(target) {
                    debug!(method = target, "CHA discovered method");
                    queue.push_back(target);
                }
            }
        }
    }

    graph
}

fn resolve<H: ClassHierarchy>(expr: &crate::shared::ir::InvokeExpr, hierarchy: &H) -> Vec<MethodId> {
    match expr.kind {
        // Static and special calls never depend on the receiver's runtime
        // type: both resolve to whatever `dispatch` finds starting from
        // the literal declaring class named at the call site.
        InvokeKind::Static | InvokeKind::Special => hierarchy
            .dispatch(expr.method.declaring_class, &expr.method.subsignature)
            .into_iter()
            .collect(),
        InvokeKind::Virtual | InvokeKind::Interface => {
            // One level only (§4.4's Note): the declaring class plus its
            // *direct* subclasses/subinterfaces/implementors. A deeper
            // override is reached by CHA re-visiting that subclass's own
            // call sites once it becomes reachable, not by recursing here.
            let declaring = expr.method.declaring_class;
            let mut classes = vec![declaring];
            classes.extend(hierarchy.direct_subclasses(declaring));
            classes.extend(hierarchy.direct_subinterfaces(declaring));
            classes.extend(hierarchy.direct_implementors(declaring));

            let mut seen = rustc_hash::FxHashSet::default();
            let mut targets = Vec::new();
            for class in classes {
                if !seen.insert(class) {
                    continue;
                }
                if !hierarchy.is_interface(class) && !hierarchy.is_abstract(class) {
                    if let Some(m) = hierarchy.dispatch(class, &expr.method.subsignature) {
                        targets.push(m);
                    }
                }
            }
            targets
        }
    }
}
