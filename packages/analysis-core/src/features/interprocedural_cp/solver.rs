//! C11: interprocedural constant propagation (ICPI, §4.7) -- the
//! intraprocedural transfer (C4) lifted onto the ICFG (§4.7's four edge
//! kinds) plus an alias-aware heap abstraction so field/array/static
//! constants flow through aliased access paths, not just through locals.

use super::heap_abstraction::HeapAbstraction;
use super::icfg::{EdgeKind, Icfg, IcfgEdge, IcfgNode};
use crate::features::call_graph::CallGraph;
use crate::features::constant_propagation::domain::{AbstractValue, CpFact};
use crate::features::constant_propagation::infrastructure::eval_operand;
use crate::features::points_to::CiResult;
use crate::shared::ir::{Method, Operand, RValue, Stmt};
use crate::shared::Program;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use tracing::debug;

pub struct IcpiResult {
    pub in_facts: FxHashMap<IcfgNode, CpFact>,
    pub out_facts: FxHashMap<IcfgNode, CpFact>,
}

impl IcpiResult {
    pub fn in_fact(&self, node: IcfgNode) -> CpFact {
        self.in_facts.get(&node).cloned().unwrap_or_default()
    }

    pub fn out_fact(&self, node: IcfgNode) -> CpFact {
        self.out_facts.get(&node).cloned().unwrap_or_default()
    }
}

pub fn solve<P: Program>(program: &P, call_graph: &CallGraph, pta: &CiResult) -> IcpiResult {
    let icfg = Icfg::build(call_graph);
    let heap = HeapAbstraction::build(program, call_graph, pta);
    let mut solver = IcpiSolver {
        program,
        call_graph,
        pta,
        icfg,
        heap,
        in_facts: FxHashMap::default(),
        out_facts: FxHashMap::default(),
        worklist: VecDeque::new(),
        queued: FxHashSet::default(),
    };
    solver.run()
}

/// §4.2's boundary fact, lifted to the ICFG: only a method with no callers
/// in the call graph (a true program entry point) starts with its
/// int-typed parameters forced to NAC. Every other reachable method's
/// parameters arrive solely via call edges (§4.7's "param_i ← callSiteOut").
fn boundary_fact(method: &Method) -> CpFact {
    let mut fact = CpFact::new();
    for param in &method.params {
        if method.can_hold_int(param.var) {
            fact.set(param.var, AbstractValue::Nac);
        }
    }
    fact
}

struct IcpiSolver<'p, P: Program> {
    program: &'p P,
    call_graph: &'p CallGraph,
    pta: &'p CiResult,
    icfg: Icfg,
    heap: HeapAbstraction,
    in_facts: FxHashMap<IcfgNode, CpFact>,
    out_facts: FxHashMap<IcfgNode, CpFact>,
    worklist: VecDeque<IcfgNode>,
    queued: FxHashSet<IcfgNode>,
}

impl<'p, P: Program> IcpiSolver<'p, P> {
    fn run(mut self) -> IcpiResult {
        for &entry in self.program.entry_points() {
            let node = Icfg::entry_node(entry);
            let boundary = boundary_fact(self.program.method(entry));
            self.merge_into(node, boundary);
        }

        let mut steps: u64 = 0;
        while let Some(node) = self.worklist.pop_front() {
            self.queued.remove(&node);
            steps += 1;
            self.process(node);
        }

        debug!(steps, "interprocedural constant propagation converged");

        IcpiResult {
            in_facts: self.in_facts,
            out_facts: self.out_facts,
        }
    }

    fn enqueue(&mut self, node: IcfgNode) {
        if self.queued.insert(node) {
            self.worklist.push_back(node);
        }
    }

    fn merge_into(&mut self, node: IcfgNode, fact: CpFact) {
        let current = self.in_facts.entry(node).or_default();
        let merged = current.meet(&fact);
        if merged != *current {
            *current = merged;
            self.enqueue(node);
        }
    }

    fn process(&mut self, node: IcfgNode) {
        let input = self.in_facts.get(&node).cloned().unwrap_or_default();
        let out = self.transfer(node, &input);
        self.out_facts.insert(node, out.clone());

        for edge in self.icfg.edges_from(self.program, self.call_graph, node) {
            let contributed = self.edge_transfer(node, &edge, &out);
            self.merge_into(edge.to, contributed);
        }
    }

    /// The per-node transfer (§4.7's "non-call node" and "call node"
    /// rules). Store statements additionally update the heap abstraction
    /// and re-enqueue dependent loads here -- that enqueue is a direct
    /// push onto the worklist, not mediated by `merge_into`, since the
    /// load nodes' *input* fact hasn't changed, only the heap state their
    /// transfer reads from.
    fn transfer(&mut self, node: IcfgNode, input: &CpFact) -> CpFact {
        if Icfg::is_exit(self.program, node) {
            return input.clone();
        }
        let method = self.program.method(node.method);

        match method.cfg.stmt(node.stmt) {
            Stmt::Assign { lhs, rhs } if method.can_hold_int(*lhs) => {
                let mut out = input.clone();
                let value = self.eval_icpi(rhs, input);
                out.set(*lhs, value);
                out
            }
            Stmt::Invoke { .. } => input.clone(),
            Stmt::StaticStore { field, value } => {
                if !operand_can_hold_int(method, *value) {
                    return input.clone();
                }
                let rv = eval_operand(*value, input);
                let (class, fid) = (field.declaring_class, field.name);
                if self.heap.set_static_value(class, fid, rv) {
                    let deps: Vec<IcfgNode> = self.heap.static_loads(class, fid).collect();
                    for d in deps {
                        self.enqueue(d);
                    }
                }
                input.clone()
            }
            Stmt::InstanceStore { base, field, value } => {
                if !operand_can_hold_int(method, *value) {
                    return input.clone();
                }
                let rv = eval_operand(*value, input);
                let (base, field) = (*base, *field);
                let objs: Vec<_> = self.pta.pts_of_var(base).iter().copied().collect();
                let mut changed = false;
                for o in objs {
                    if self.heap.set_field_value(o, field, rv) {
                        changed = true;
                    }
                }
                if changed {
                    let aliases = self.heap.aliases(base);
                    let deps: Vec<IcfgNode> = aliases
                        .into_iter()
                        .flat_map(|v| self.heap.instance_loads(v, field).collect::<Vec<_>>())
                        .collect();
                    for d in deps {
                        self.enqueue(d);
                    }
                }
                input.clone()
            }
            Stmt::ArrayStore { base, index, value } => {
                let idx_val = eval_operand(*index, input);
                if idx_val.is_undef() || !operand_can_hold_int(method, *value) {
                    return input.clone();
                }
                let rv = eval_operand(*value, input);
                let base = *base;
                let objs: Vec<_> = self.pta.pts_of_var(base).iter().copied().collect();
                let mut changed = false;
                for o in objs {
                    if self.heap.set_array_value(o, idx_val, rv) {
                        changed = true;
                    }
                }
                if changed {
                    let aliases = self.heap.aliases(base);
                    let deps: Vec<IcfgNode> = aliases
                        .into_iter()
                        .flat_map(|v| self.heap.array_loads(v).collect::<Vec<_>>())
                        .collect();
                    for d in deps {
                        self.enqueue(d);
                    }
                }
                input.clone()
            }
            _ => input.clone(),
        }
    }

    /// §4.7's `eval`: field/array/static reads go through the heap
    /// abstraction and PTA's points-to sets; everything else falls back to
    /// the alias-oblivious intraprocedural evaluator (C3), which is exactly
    /// right for operands, binary ops, and the remaining untracked shapes.
    fn eval_icpi(&self, rhs: &RValue, input: &CpFact) -> AbstractValue {
        match rhs {
            RValue::StaticFieldLoad(field) => self.heap.static_value(field.declaring_class, field.name),
            RValue::InstanceFieldLoad { base, field } => {
                let pts = self.pta.pts_of_var(*base);
                if pts.is_empty() {
                    return AbstractValue::Undef;
                }
                pts.iter()
                    .fold(AbstractValue::Undef, |acc, &o| acc.meet(self.heap.field_value(o, *field)))
            }
            RValue::ArrayLoad { base, index } => {
                let idx_val = eval_operand(*index, input);
                match idx_val {
                    AbstractValue::Undef => AbstractValue::Undef,
                    AbstractValue::Const(_) => {
                        let pts = self.pta.pts_of_var(*base);
                        pts.iter().fold(AbstractValue::Undef, |acc, &o| {
                            acc.meet(self.heap.array_value(o, idx_val))
                                .meet(self.heap.array_value(o, AbstractValue::Nac))
                        })
                    }
                    AbstractValue::Nac => {
                        let pts = self.pta.pts_of_var(*base);
                        pts.iter()
                            .fold(AbstractValue::Undef, |acc, &o| acc.meet(self.heap.array_all_values(o)))
                    }
                }
            }
            _ => crate::features::constant_propagation::infrastructure::eval_rvalue(rhs, input),
        }
    }

    /// §4.7's per-edge transfer: `Normal` is the identity, `CallToReturn`
    /// copies but kills the call's LHS, `Call` produces a fresh
    /// argument-to-parameter binding, `Return` produces a fresh fact
    /// binding the caller's LHS to the meet of the callee's return
    /// variables.
    fn edge_transfer(&self, from: IcfgNode, edge: &IcfgEdge, out: &CpFact) -> CpFact {
        match edge.kind {
            EdgeKind::Normal => out.clone(),
            EdgeKind::CallToReturn => {
                let method = self.program.method(from.method);
                let mut fact = out.clone();
                if let Stmt::Invoke { lhs: Some(l), .. } = method.cfg.stmt(from.stmt) {
                    fact.set(*l, AbstractValue::Undef);
                }
                fact
            }
            EdgeKind::Call => {
                let method = self.program.method(from.method);
                let callee = self.program.method(edge.to.method);
                let mut fact = CpFact::new();
                if let Stmt::Invoke { expr, .. } = method.cfg.stmt(from.stmt) {
                    for (param, arg) in callee.params.iter().zip(expr.args.iter()) {
                        if callee.can_hold_int(param.var) {
                            fact.set(param.var, eval_operand(*arg, out));
                        }
                    }
                }
                fact
            }
            EdgeKind::Return(site) => {
                let callee = self.program.method(from.method);
                let caller = self.program.method(site.caller);
                let mut fact = CpFact::new();
                if let Stmt::Invoke { lhs: Some(l), .. } = caller.cfg.stmt(site.stmt) {
                    if caller.can_hold_int(*l) {
                        let merged = callee
                            .return_vars
                            .iter()
                            .fold(AbstractValue::Undef, |acc, &rv| acc.meet(out.get(rv)));
                        fact.set(*l, merged);
                    }
                }
                fact
            }
        }
    }
}

fn operand_can_hold_int(method: &Method, operand: Operand) -> bool {
    match operand {
        Operand::Var(v) => method.can_hold_int(v),
        Operand::Const(_) => true,
    }
}
