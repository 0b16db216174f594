//! C10: context-sensitive Andersen pointer analysis (§4.6).
//!
//! Identical fixed point to the CI solver (C9), except a "reachable
//! method" is really a `(Context, MethodId)` pair, parameter/this/return
//! edges connect `(caller_ctx, var)` to `(callee_ctx, var)` where
//! `callee_ctx` comes from `selector.select`/`select_instance`, and each
//! `new` mints its `ObjectId` under `selector.select_heap_context`'s heap
//! context rather than the context-free policy C9 uses -- `CSObj(heapCtx,
//! o)` in full.

use super::super::domain::{PfgNode, PointerFlowGraph};
use super::context::ContextSelector;
use crate::features::call_graph::{CallGraph, CallSite};
use crate::shared::heap_model::AllocSiteHeapModel;
use crate::shared::ir::{FieldId, InvokeKind, MethodId, Operand, RValue, Stmt, Subsignature, Type, VarId};
use crate::shared::{ClassHierarchy, ObjectId, Program};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::hash::Hash;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct AndersenStats {
    pub worklist_steps: u64,
    pub reachable_contexts: usize,
    pub objects: usize,
}

pub struct PointsToResult<C: Clone + Eq + Hash> {
    pub pfg: PointerFlowGraph<C>,
    /// Context-sensitive call edges, keyed by the context the call ran
    /// under; §4.6 only asks for the CI-shaped `CallGraph` as the
    /// queryable surface, so contexts are collapsed away here --
    /// `call_graph.edges_from`/`reachable_methods` report the same
    /// context-insensitive shape C9 does, just computed more precisely.
    pub call_graph: CallGraph,
    pub heap: AllocSiteHeapModel<C>,
    pub stats: AndersenStats,
}

impl<C: Clone + Eq + Hash> PointsToResult<C> {
    pub fn pts_of(&self, ctx: C, var: VarId) -> &FxHashSet<ObjectId> {
        self.pfg.pts(&PfgNode::var(ctx, var))
    }
}

#[derive(Debug, Clone)]
enum PendingConstraint<C> {
    InstanceLoad { field: FieldId, to: (C, VarId) },
    InstanceStore { field: FieldId, from: Operand, ctx: C },
    ArrayLoad { to: (C, VarId) },
    ArrayStore { from: Operand, ctx: C },
    Call {
        site: CallSite,
        caller_ctx: C,
        sig: Subsignature,
        receiver: VarId,
        args: Vec<Operand>,
        lhs: Option<VarId>,
    },
}

pub fn solve<P: Program, H: ClassHierarchy, S: ContextSelector>(
    program: &P,
    hierarchy: &H,
    selector: &S,
) -> PointsToResult<S::Context> {
    let solver = CsSolver {
        program,
        hierarchy,
        selector,
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

struct CsSolver<'p, P, H, S: ContextSelector> {
    program: &'p P,
    hierarchy: &'p H,
    selector: &'p S,
    heap: AllocSiteHeapModel<S::Context>,
    pfg: PointerFlowGraph<S::Context>,
    call_graph: CallGraph,
    reachable: FxHashSet<(S::Context, MethodId)>,
    method_worklist: VecDeque<(S::Context, MethodId)>,
    node_worklist: VecDeque<PfgNode<S::Context>>,
    queued_nodes: FxHashSet<PfgNode<S::Context>>,
    pending: FxHashMap<VarId, Vec<PendingConstraint<S::Context>>>,
    stats: AndersenStats,
}

impl<'p, P: Program, H: ClassHierarchy, S: ContextSelector> CsSolver<'p, P, H, S> {
    fn run(mut self) -> PointsToResult<S::Context> {
        let c0 = self.selector.initial_context();
        for &entry in self.program.entry_points() {
            self.mark_reachable(c0.clone(), entry);
        }

        loop {
            if let Some((ctx, m)) = self.method_worklist.pop_front() {
                self.process_method(ctx, m);
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

        self.stats.reachable_contexts = self.reachable.len();
        self.stats.objects = self.pfg.nodes().count();
        debug!(
            steps = self.stats.worklist_steps,
            contexts = self.stats.reachable_contexts,
            "context-sensitive pointer analysis converged"
        );

        PointsToResult {
            pfg: self.pfg,
            call_graph: self.call_graph,
            heap: self.heap,
            stats: self.stats,
        }
    }

    fn mark_reachable(&mut self, ctx: S::Context, method: MethodId) {
        if self.reachable.insert((ctx.clone(), method)) {
            self.call_graph.mark_reachable(method);
            self.method_worklist.push_back((ctx, method));
        }
    }

    fn enqueue(&mut self, node: PfgNode<S::Context>) {
        if self.queued_nodes.insert(node.clone()) {
            self.node_worklist.push_back(node);
        }
    }

    fn add_pts_and_enqueue(&mut self, node: PfgNode<S::Context>, obj: ObjectId) {
        if self.pfg.add_pts(node.clone(), obj) {
            self.enqueue(node);
        }
    }

    fn connect(&mut self, from: PfgNode<S::Context>, to: PfgNode<S::Context>) {
        if self.pfg.add_edge(from.clone(), to.clone()) {
            let objs: Vec<ObjectId> = self.pfg.pts(&from).iter().copied().collect();
            for o in objs {
                self.add_pts_and_enqueue(to.clone(), o);
            }
        }
    }

    fn process_method(&mut self, ctx: S::Context, method_id: MethodId) {
        let method = self.program.method(method_id);
        for node in method.cfg.nodes() {
            match method.cfg.stmt(node) {
                Stmt::Assign { lhs, rhs } if method.var_type(*lhs) == Type::Other => {
                    self.handle_assign(ctx.clone(), *lhs, rhs);
                }
                Stmt::StaticStore { field, value } => {
                    if let Operand::Var(v) = *value {
                        self.connect(
                            PfgNode::var(ctx.clone(), v),
                            PfgNode::StaticField(*field),
                        );
                    }
                }
                Stmt::InstanceStore { base, field, value } => {
                    self.pending.entry(*base).or_default().push(
                        PendingConstraint::InstanceStore {
                            field: *field,
                            from: *value,
                            ctx: ctx.clone(),
                        },
                    );
                    self.resolve_instance_store(ctx.clone(), *base, *field, *value);
                }
                Stmt::ArrayStore { base, value, .. } => {
                    self.pending.entry(*base).or_default().push(
                        PendingConstraint::ArrayStore {
                            from: *value,
                            ctx: ctx.clone(),
                        },
                    );
                    self.resolve_array_store(ctx.clone(), *base, *value);
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
                                let callee_ctx = self.selector.select(&ctx, site);
                                self.resolve_call(
                                    site,
                                    ctx.clone(),
                                    callee_ctx,
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
                                    caller_ctx: ctx.clone(),
                                    sig: expr.method.subsignature.clone(),
                                    receiver,
                                    args: expr.args.clone(),
                                    lhs: *lhs,
                                },
                            );
                            self.resolve_virtual_call(
                                site,
                                ctx.clone(),
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

    fn handle_assign(&mut self, ctx: S::Context, lhs: VarId, rhs: &RValue) {
        let to = PfgNode::var(ctx.clone(), lhs);
        match rhs {
            RValue::Operand(Operand::Var(y)) => self.connect(PfgNode::var(ctx, *y), to),
            RValue::Operand(Operand::Const(_)) => {}
            RValue::New(site) => {
                let heap_ctx = self.selector.select_heap_context(&ctx, *site);
                let obj = self.heap.object_for_in(heap_ctx, *site);
                self.add_pts_and_enqueue(to, obj);
            }
            RValue::Cast { operand: Operand::Var(y) } => self.connect(PfgNode::var(ctx, *y), to),
            RValue::Cast { operand: Operand::Const(_) } => {}
            RValue::StaticFieldLoad(field) => self.connect(PfgNode::StaticField(*field), to),
            RValue::InstanceFieldLoad { base, field } => {
                self.pending.entry(*base).or_default().push(
                    PendingConstraint::InstanceLoad {
                        field: *field,
                        to: (ctx.clone(), lhs),
                    },
                );
                self.resolve_instance_load(ctx, *base, *field, lhs);
            }
            RValue::ArrayLoad { base, .. } => {
                self.pending.entry(*base).or_default().push(PendingConstraint::ArrayLoad {
                    to: (ctx.clone(), lhs),
                });
                self.resolve_array_load(ctx, *base, lhs);
            }
            RValue::Binary { .. } | RValue::Unknown => {}
        }
    }

    fn resolve_instance_load(&mut self, ctx: S::Context, base: VarId, field: FieldId, to: VarId) {
        let objs: Vec<ObjectId> = self
            .pfg
            .pts(&PfgNode::var(ctx.clone(), base))
            .iter()
            .copied()
            .collect();
        for obj in objs {
            self.connect(PfgNode::InstanceField(obj, field), PfgNode::var(ctx.clone(), to));
        }
    }

    fn resolve_instance_store(&mut self, ctx: S::Context, base: VarId, field: FieldId, value: Operand) {
        let Operand::Var(v) = value else { return };
        let objs: Vec<ObjectId> = self
            .pfg
            .pts(&PfgNode::var(ctx.clone(), base))
            .iter()
            .copied()
            .collect();
        for obj in objs {
            self.connect(PfgNode::var(ctx.clone(), v), PfgNode::InstanceField(obj, field));
        }
    }

    fn resolve_array_load(&mut self, ctx: S::Context, base: VarId, to: VarId) {
        let objs: Vec<ObjectId> = self
            .pfg
            .pts(&PfgNode::var(ctx.clone(), base))
            .iter()
            .copied()
            .collect();
        for obj in objs {
            self.connect(PfgNode::ArrayElem(obj), PfgNode::var(ctx.clone(), to));
        }
    }

    fn resolve_array_store(&mut self, ctx: S::Context, base: VarId, value: Operand) {
        let Operand::Var(v) = value else { return };
        let objs: Vec<ObjectId> = self
            .pfg
            .pts(&PfgNode::var(ctx.clone(), base))
            .iter()
            .copied()
            .collect();
        for obj in objs {
            self.connect(PfgNode::var(ctx.clone(), v), PfgNode::ArrayElem(obj));
        }
    }

    fn resolve_virtual_call(
        &mut self,
        site: CallSite,
        caller_ctx: S::Context,
        receiver: VarId,
        sig: Subsignature,
        args: Vec<Operand>,
        lhs: Option<VarId>,
    ) {
        let objs: Vec<ObjectId> = self
            .pfg
            .pts(&PfgNode::var(caller_ctx.clone(), receiver))
            .iter()
            .copied()
            .collect();
        for obj in objs {
            let class = self.heap.class_of(obj);
            if let Some(target) = self.hierarchy.dispatch(class, &sig) {
                let callee_ctx = self.selector.select_instance(&caller_ctx, site, obj);
                self.resolve_call(
                    site,
                    caller_ctx.clone(),
                    callee_ctx,
                    target,
                    Some(receiver),
                    &args,
                    lhs,
                );
            }
        }
    }

    fn resolve_call(
        &mut self,
        site: CallSite,
        caller_ctx: S::Context,
        callee_ctx: S::Context,
        target: MethodId,
        receiver: Option<VarId>,
        args: &[Operand],
        lhs: Option<VarId>,
    ) {
        let newly_connected = self.call_graph.add_edge(site, target);
        if newly_connected {
            debug!(caller = site.caller, callee = target, "CS PTA call edge (new site)");
        }
        self.mark_reachable(callee_ctx.clone(), target);

        let callee = self.program.method(target);
        if let (Some(this_var), Some(r)) = (callee.this_var, receiver) {
            self.connect(
                PfgNode::var(caller_ctx.clone(), r),
                PfgNode::var(callee_ctx.clone(), this_var),
            );
        }
        for (param, arg) in callee.params.iter().zip(args.iter()) {
            if callee.var_type(param.var) == Type::Other {
                if let Operand::Var(a) = arg {
                    self.connect(
                        PfgNode::var(caller_ctx.clone(), *a),
                        PfgNode::var(callee_ctx.clone(), param.var),
                    );
                }
            }
        }
        if let Some(l) = lhs {
            for rv in callee.return_vars.clone() {
                self.connect(PfgNode::var(callee_ctx.clone(), rv), PfgNode::var(caller_ctx.clone(), l));
            }
        }
    }

    fn propagate(&mut self, node: PfgNode<S::Context>) {
        let objs: Vec<ObjectId> = self.pfg.pts(&node).iter().copied().collect();

        let succs: Vec<PfgNode<S::Context>> = self.pfg.successors(&node).collect();
        for succ in succs {
            for obj in &objs {
                self.add_pts_and_enqueue(succ.clone(), *obj);
            }
        }

        let PfgNode::Var(ctx, var) = node else { return };
        let Some(constraints) = self.pending.get(&var).cloned() else {
            return;
        };
        for c in constraints {
            match c {
                PendingConstraint::InstanceLoad { field, to } => {
                    if to.0 == ctx {
                        self.resolve_instance_load(ctx.clone(), var, field, to.1)
                    }
                }
                PendingConstraint::InstanceStore { field, from, ctx: cctx } => {
                    if cctx == ctx {
                        self.resolve_instance_store(ctx.clone(), var, field, from)
                    }
                }
                PendingConstraint::ArrayLoad { to } => {
                    if to.0 == ctx {
                        self.resolve_array_load(ctx.clone(), var, to.1)
                    }
                }
                PendingConstraint::ArrayStore { from, ctx: cctx } => {
                    if cctx == ctx {
                        self.resolve_array_store(ctx.clone(), var, from)
                    }
                }
                PendingConstraint::Call {
                    site,
                    caller_ctx,
                    sig,
                    receiver,
                    args,
                    lhs,
                } => {
                    if caller_ctx == ctx {
                        self.resolve_virtual_call(site, ctx.clone(), receiver, sig, args, lhs)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::context::CallStringSelector;
    use crate::shared::ir::{
        AllocSite, Cfg, InvokeExpr, Method, MethodRef, RValue, Subsignature,
    };
    use crate::shared::ClassHierarchy;
    use rustc_hash::FxHashMap as Map;

    struct NoDispatchHierarchy;

    impl ClassHierarchy for NoDispatchHierarchy {
        fn declared_methods(&self, _class: crate::shared::ir::ClassId) -> &[MethodId] {
            &[]
        }
        fn superclass(&self, _class: crate::shared::ir::ClassId) -> Option<crate::shared::ir::ClassId> {
            None
        }
        fn direct_interfaces(&self, _class: crate::shared::ir::ClassId) -> &[crate::shared::ir::ClassId] {
            &[]
        }
        fn direct_subclasses(&self, _class: crate::shared::ir::ClassId) -> &[crate::shared::ir::ClassId] {
            &[]
        }
        fn direct_subinterfaces(&self, _class: crate::shared::ir::ClassId) -> &[crate::shared::ir::ClassId] {
            &[]
        }
        fn direct_implementors(&self, _class: crate::shared::ir::ClassId) -> &[crate::shared::ir::ClassId] {
            &[]
        }
        fn is_interface(&self, _class: crate::shared::ir::ClassId) -> bool {
            false
        }
        fn is_abstract(&self, _class: crate::shared::ir::ClassId) -> bool {
            false
        }
        fn resolve_declared(&self, _class: crate::shared::ir::ClassId, _sig: &Subsignature) -> Option<MethodRef> {
            None
        }
        fn dispatch(&self, _class: crate::shared::ir::ClassId, _sig: &Subsignature) -> Option<MethodId> {
            Some(1)
        }
    }

    struct FixtureProgram {
        methods: Map<MethodId, Method>,
        entries: Vec<MethodId>,
    }

    impl Program for FixtureProgram {
        fn method(&self, id: MethodId) -> &Method {
            &self.methods[&id]
        }
        fn method_ids(&self) -> &[MethodId] {
            &[]
        }
        fn entry_points(&self) -> &[MethodId] {
            &self.entries
        }
    }

    fn alloc_method() -> Method {
        let cfg = Cfg::new(vec![
            Stmt::Assign {
                lhs: 0,
                rhs: RValue::New(AllocSite {
                    method: 1,
                    stmt: 0,
                    class: 9,
                }),
            },
            Stmt::Return(Some(Operand::Var(0))),
        ]);
        Method {
            id: 1,
            declaring_class: 0,
            subsignature: Subsignature("alloc()".into()),
            params: vec![],
            this_var: None,
            return_vars: vec![0],
            is_abstract: false,
            var_types: [(0, Type::Other)].into_iter().collect::<Map<_, _>>(),
            cfg,
        }
    }

    fn caller_method() -> Method {
        let invoke = |lhs: VarId| Stmt::Invoke {
            lhs: Some(lhs),
            expr: InvokeExpr {
                kind: InvokeKind::Static,
                receiver: None,
                method: MethodRef {
                    declaring_class: 0,
                    subsignature: Subsignature("alloc()".into()),
                },
                args: vec![],
            },
        };
        let cfg = Cfg::new(vec![invoke(1), invoke(2), Stmt::Return(None)]);
        Method {
            id: 0,
            declaring_class: 0,
            subsignature: Subsignature("caller()".into()),
            params: vec![],
            this_var: None,
            return_vars: vec![],
            is_abstract: false,
            var_types: [(1, Type::Other), (2, Type::Other)]
                .into_iter()
                .collect::<Map<_, _>>(),
            cfg,
        }
    }

    #[test]
    fn distinct_call_strings_reaching_the_same_new_mint_distinct_objects() {
        let program = FixtureProgram {
            methods: [(0, caller_method()), (1, alloc_method())].into_iter().collect(),
            entries: vec![0],
        };
        let hierarchy = NoDispatchHierarchy;
        let selector = CallStringSelector::new(1);

        let result = solve(&program, &hierarchy, &selector);
        let c0 = selector.initial_context();

        let first = result.pts_of(c0.clone(), 1);
        let second = result.pts_of(c0, 2);
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first, second);
    }
}
