//! C9: context-insensitive Andersen pointer analysis (§4.5).
//!
//! A flow-insensitive, inclusion-based solver: every reachable statement
//! generates a constraint once (there's no per-CFG-node IN/OUT here, only
//! one points-to set per pointer-flow-graph node), and the call graph is
//! built on the fly as points-to information reveals which methods a
//! virtual/interface call site can actually reach — the same fixed point
//! that makes Andersen's analysis and CHA-free call graph construction
//! mutually recursive.
//!
//! Array elements and every instance field of a given object are each
//! collapsed to one PFG node (field-sensitive, array-element-insensitive),
//! and reprocessing a pointer's full current points-to set on every queue
//! pop (rather than tracking only the delta since last time) trades some
//! redundant work for a much simpler, still-correct worklist.

use super::super::domain::{PfgNode, PointerFlowGraph};
use crate::features::call_graph::{CallGraph, CallSite};
use crate::shared::heap_model::AllocSiteHeapModel;
use crate::shared::ir::{FieldId, InvokeKind, MethodId, Operand, RValue, Stmt, Subsignature, Type, VarId};
use crate::shared::{ClassHierarchy, HeapModel, ObjectId, Program};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct AndersenConfig {
    /// Whether the call graph is refined on the fly from points-to
    /// information (always `true` in this engine — CHA alone is §4.4's
    /// job, not this solver's).
    pub on_the_fly_call_graph: bool,
}

impl Default for AndersenConfig {
    fn default() -> Self {
        Self {
            on_the_fly_call_graph: true,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AndersenStats {
    pub worklist_steps: u64,
    pub reachable_methods: usize,
    pub objects: usize,
}

pub struct PointsToResult {
    pub pfg: PointerFlowGraph<()>,
    pub call_graph: CallGraph,
    pub heap: AllocSiteHeapModel,
    pub stats: AndersenStats,
}

impl PointsToResult {
    pub fn pts_of_var(&self, var: VarId) -> &FxHashSet<ObjectId> {
        self.pfg.pts(&PfgNode::var((), var))
    }
}

#[derive(Debug, Clone)]
enum PendingConstraint {
    InstanceLoad { field: FieldId, to: VarId },
    InstanceStore { field: FieldId, from: Operand },
    ArrayLoad { to: VarId },
    ArrayStore { from: Operand },
    Call {
        site: CallSite,
        sig: Subsignature,
        receiver: VarId,
        args: Vec<Operand>,
        lhs: Option<VarId>,
    },
}

pub fn solve<P: Program, H: ClassHierarchy>(
    program: &P,
    hierarchy: &H,
    config: AndersenConfig,
) -> PointsToResult {
    let _ = config.on_the_fly_call_graph;
    let mut solver = CiSolver {
        program,
        hierarchy,
        heap: AllocSiteHeapModel::new(),
        pfg: PointerFlowGraph::new(),
        call_graph: CallGraph::new(),
        reachable: FxHashSet::default(),
        method_worklist: VecDeque::new(),
        node_worklist: VecDeque::new(),
        queued_nodes: FxHashSet::default(),
        pending: FxHashMap::default(),
        stats: AndersenStats::default(),
    };
    solver.run()
}

struct CiSolver<'p, P, H> {
    program: &'p P,
    hierarchy: &'p H,
    heap: AllocSiteHeapModel,
    pfg: PointerFlowGraph<()>,
    call_graph: CallGraph,
    reachable: FxHashSet<MethodId>,
    method_worklist: VecDeque<MethodId>,
    node_worklist: VecDeque<PfgNode<()>>,
    queued_nodes: FxHashSet<PfgNode<()>>,
    pending: FxHashMap<VarId, Vec<PendingConstraint>>,
    stats: AndersenStats,
}

impl<'p, P: Program, H: ClassHierarchy> CiSolver<'p, P, H> {
    fn run(mut self) -> PointsToResult {
        for &entry in self.program.entry_points() {
            self.mark_reachable(entry);
        }

        loop {
            if let Some(m) = self.method_worklist.pop_front() {
                self.process_method(m);
                continue;
            }
            if let Some(node) = self.node_worklist.pop_front() {
                self.queued_nodes.remove(&node);
                self.stats.worklist_steps += 1;
                self.propagate(node);
                continue;
            }
            break;
        }

        self.stats.reachable_methods = self.reachable.len();
        self.stats.objects = self.pfg.nodes().count();
        debug!(
            steps = self.stats.worklist_steps,
            methods = self.stats.reachable_methods,
            "context-insensitive pointer analysis converged"
        );

        PointsToResult {
            pfg: self.pfg,
            call_graph: self.call_graph,
            heap: self.heap,
            stats: self.stats,
        }
    }

    fn mark_reachable(&mut self, method: MethodId) {
        if self.reachable.insert(method) {
            self.call_graph.mark_reachable(method);
            self.method_worklist.push_back(method);
        }
    }

    fn enqueue(&mut self, node: PfgNode<()>) {
        if self.queued_nodes.insert(node) {
            self.node_worklist.push_back(node);
        }
    }

    fn add_pts_and_enqueue(&mut self, node: PfgNode<()>, obj: ObjectId) {
        if self.pfg.add_pts(node, obj) {
            self.enqueue(node);
        }
    }

    /// `pt(to) ⊇ pt(from)`: records the edge and immediately copies
    /// `from`'s current points-to set (new additions later get carried by
    /// the ordinary worklist propagation).
    fn connect(&mut self, from: PfgNode<()>, to: PfgNode<()>) {
        if self.pfg.add_edge(from, to) {
            let objs: Vec<ObjectId> = self.pfg.pts(&from).iter().copied().collect();
            for o in objs {
                self.add_pts_and_enqueue(to, o);
            }
        }
    }

    fn process_method(&mut self, method_id: MethodId) {
        let method = self.program.method(method_id);
        for node in method.cfg.nodes() {
            match method.cfg.stmt(node) {
                Stmt::Assign { lhs, rhs } if method.var_type(*lhs) == Type::Other => {
                    self.handle_assign(*lhs, rhs);
                }
                Stmt::StaticStore { field, value } => {
                    if let Operand::Var(v) = *value {
                        self.connect(PfgNode::var((), v), PfgNode::StaticField(*field));
                    }
                }
                Stmt::InstanceStore { base, field, value } => {
                    self.pending.entry(*base).or_default().push(
                        PendingConstraint::InstanceStore {
                            field: *field,
                            from: *value,
                        },
                    );
                    self.resolve_instance_store(*base, *field, *value);
                }
                Stmt::ArrayStore { base, value, .. } => {
                    self.pending
                        .entry(*base)
                        .or_default()
                        .push(PendingConstraint::ArrayStore { from: *value });
                    self.resolve_array_store(*base, *value);
                }
                Stmt::Invoke { lhs, expr } => {
                    let site = CallSite {
                        caller: method_id,
                        stmt: node,
                    };
                    match expr.kind {
                        InvokeKind::Static | InvokeKind::Special => {
                            if let Some(target) = self
                                .hierarchy
                                .dispatch(expr.method.declaring_class, &expr.method.subsignature)
                            {
                                self.resolve_call(
                                    site,
                                    target,
                                    expr.receiver,
                                    &expr.args,
                                    *lhs,
                                );
                            }
                        }
                        InvokeKind::Virtual | InvokeKind::Interface => {
                            let receiver = expr
                                .receiver
                                .expect("virtual/interface call must have a receiver");
                            self.pending.entry(receiver).or_default().push(
                                PendingConstraint::Call {
                                    site,
                                    sig: expr.method.subsignature.clone(),
                                    receiver,
                                    args: expr.args.clone(),
                                    lhs: *lhs,
                                },
                            );
                            self.resolve_virtual_call(
                                site,
                                receiver,
                                expr.method.subsignature.clone(),
                                expr.args.clone(),
                                *lhs,
                            );
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn handle_assign(&mut self, lhs: VarId, rhs: &RValue) {
        let to = PfgNode::var((), lhs);
        match rhs {
            RValue::Operand(Operand::Var(y)) => self.connect(PfgNode::var((), *y), to),
            RValue::Operand(Operand::Const(_)) => {}
            RValue::New(site) => {
                let obj = self.heap.object_for(*site);
                self.add_pts_and_enqueue(to, obj);
            }
            RValue::Cast { operand: Operand::Var(y) } => self.connect(PfgNode::var((), *y), to),
            RValue::Cast { operand: Operand::Const(_) } => {}
            RValue::StaticFieldLoad(field) => self.connect(PfgNode::StaticField(*field), to),
            RValue::InstanceFieldLoad { base, field } => {
                self.pending
                    .entry(*base)
                    .or_default()
                    .push(PendingConstraint::InstanceLoad { field: *field, to: lhs });
                self.resolve_instance_load(*base, *field, lhs);
            }
            RValue::ArrayLoad { base, .. } => {
                self.pending
                    .entry(*base)
                    .or_default()
                    .push(PendingConstraint::ArrayLoad { to: lhs });
                self.resolve_array_load(*base, lhs);
            }
            RValue::Binary { .. } | RValue::Unknown => {}
        }
    }

    fn resolve_instance_load(&mut self, base: VarId, field: FieldId, to: VarId) {
        let objs: Vec<ObjectId> = self.pfg.pts(&PfgNode::var((), base)).iter().copied().collect();
        for obj in objs {
            self.connect(PfgNode::InstanceField(obj, field), PfgNode::var((), to));
        }
    }

    fn resolve_instance_store(&mut self, base: VarId, field: FieldId, value: Operand) {
        let Operand::Var(v) = value else { return };
        let objs: Vec<ObjectId> = self.pfg.pts(&PfgNode::var((), base)).iter().copied().collect();
        for obj in objs {
            self.connect(PfgNode::var((), v), PfgNode::InstanceField(obj, field));
        }
    }

    fn resolve_array_load(&mut self, base: VarId, to: VarId) {
        let objs: Vec<ObjectId> = self.pfg.pts(&PfgNode::var((), base)).iter().copied().collect();
        for obj in objs {
            self.connect(PfgNode::ArrayElem(obj), PfgNode::var((), to));
        }
    }

    fn resolve_array_store(&mut self, base: VarId, value: Operand) {
        let Operand::Var(v) = value else { return };
        let objs: Vec<ObjectId> = self.pfg.pts(&PfgNode::var((), base)).iter().copied().collect();
        for obj in objs {
            self.connect(PfgNode::var((), v), PfgNode::ArrayElem(obj));
        }
    }

    fn resolve_virtual_call(
        &mut self,
        site: CallSite,
        receiver: VarId,
        sig: Subsignature,
        args: Vec<Operand>,
        lhs: Option<VarId>,
    ) {
        let objs: Vec<ObjectId> = self.pfg.pts(&PfgNode::var((), receiver)).iter().copied().collect();
        for obj in objs {
            let class = self.heap.class_of(obj);
            if let Some(target) = self.hierarchy.dispatch(class, &sig) {
                self.resolve_call(site, target, Some(receiver), &args, lhs);
            }
        }
    }

    /// Wires a resolved call edge: binds `receiver -> this`, each
    /// reference-typed `arg -> param`, and each of the callee's
    /// `return_vars -> lhs`. Safe to call more than once for the same
    /// `(site, target)` pair -- `connect` and `CallGraph::add_edge` are
    /// both idempotent.
    fn resolve_call(
        &mut self,
        site: CallSite,
        target: MethodId,
        receiver: Option<VarId>,
        args: &[Operand],
        lhs: Option<VarId>,
    ) {
        let newly_connected = self.call_graph.add_edge(site, target);
        if newly_connected {
            self.mark_reachable(target);
            debug!(caller = site.caller, callee = target, "PTA call edge");
        }
        let callee = self.program.method(target);
        if let (Some(this_var), Some(r)) = (callee.this_var, receiver) {
            self.connect(PfgNode::var((), r), PfgNode::var((), this_var));
        }
        for (param, arg) in callee.params.iter().zip(args.iter()) {
            if callee.var_type(param.var) == Type::Other {
                if let Operand::Var(a) = arg {
                    self.connect(PfgNode::var((), *a), PfgNode::var((), param.var));
                }
            }
        }
        if let Some(l) = lhs {
            for rv in callee.return_vars.clone() {
                self.connect(PfgNode::var((), rv), PfgNode::var((), l));
            }
        }
    }

    fn propagate(&mut self, node: PfgNode<()>) {
        let objs: Vec<ObjectId> = self.pfg.pts(&node).iter().copied().collect();

        let succs: Vec<PfgNode<()>> = self.pfg.successors(&node).collect();
        for succ in succs {
            for obj in &objs {
                self.add_pts_and_enqueue(succ, *obj);
            }
        }

        let PfgNode::Var(_, var) = node else { return };
        let Some(constraints) = self.pending.get(&var).cloned() else {
            return;
        };
        for c in constraints {
            match c {
                PendingConstraint::InstanceLoad { field, to } => {
                    self.resolve_instance_load(var, field, to)
                }
                PendingConstraint::InstanceStore { field, from } => {
                    self.resolve_instance_store(var, field, from)
                }
                PendingConstraint::ArrayLoad { to } => self.resolve_array_load(var, to),
                PendingConstraint::ArrayStore { from } => self.resolve_array_store(var, from),
                PendingConstraint::Call {
                    site,
                    sig,
                    receiver,
                    args,
                    lhs,
                } => self.resolve_virtual_call(site, receiver, sig, args, lhs),
            }
        }
    }
}
