//! Backward live-variable analysis, feeding the dead-assignment half of
//! DCD (§4.3).
//!
//! `IN(n) = use(n) ∪ (OUT(n) - def(n))`, `OUT(n) = ⋃ IN(succ)` — the
//! standard backward may-analysis. It's layered on the same generic
//! worklist solver (C5) as ICP; its fact is a set of live variables rather
//! than a per-variable lattice value.

use crate::features::dataflow::{Analysis, Direction};
use crate::shared::ir::{Cfg, NodeId, Operand, RValue, Stmt};
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSet(pub FxHashSet<u32>);

impl LiveSet {
    fn union(&self, other: &LiveSet) -> LiveSet {
        LiveSet(self.0.union(&other.0).copied().collect())
    }
}

pub struct LivenessAnalysis<'c> {
    cfg: &'c Cfg,
}

impl<'c> LivenessAnalysis<'c> {
    pub fn new(cfg: &'c Cfg) -> Self {
        Self { cfg }
    }

    pub fn run(&self) -> crate::features::dataflow::SolveResult<LiveSet> {
        crate::features::dataflow::solver::solve(self, self.cfg)
    }
}

fn uses_of_operand(op: Operand, out: &mut FxHashSet<u32>) {
    if let Operand::Var(v) = op {
        out.insert(v);
    }
}

fn uses(stmt: &Stmt) -> FxHashSet<u32> {
    let mut used = FxHashSet::default();
    match stmt {
        Stmt::Assign { rhs, .. } => uses_in_rvalue(rhs, &mut used),
        Stmt::StaticStore { value, .. } => uses_of_operand(*value, &mut used),
        Stmt::InstanceStore { base, value, .. } => {
            used.insert(*base);
            uses_of_operand(*value, &mut used);
        }
        Stmt::ArrayStore { base, index, value } => {
            used.insert(*base);
            uses_of_operand(*index, &mut used);
            uses_of_operand(*value, &mut used);
        }
        Stmt::Invoke { expr, .. } => {
            if let Some(r) = expr.receiver {
                used.insert(r);
            }
            for arg in &expr.args {
                uses_of_operand(*arg, &mut used);
            }
        }
        Stmt::If { cond, .. } => uses_of_operand(*cond, &mut used),
        Stmt::Switch { selector, .. } => uses_of_operand(*selector, &mut used),
        Stmt::Return(Some(op)) => uses_of_operand(*op, &mut used),
        Stmt::Return(None) | Stmt::Goto(_) | Stmt::Nop => {}
    }
    used
}

fn uses_in_rvalue(rhs: &RValue, out: &mut FxHashSet<u32>) {
    match rhs {
        RValue::Operand(op) => uses_of_operand(*op, out),
        RValue::Cast { operand } => uses_of_operand(*operand, out),
        RValue::InstanceFieldLoad { base, .. } => {
            out.insert(*base);
        }
        RValue::ArrayLoad { base, index } => {
            out.insert(*base);
            uses_of_operand(*index, out);
        }
        RValue::Binary { left, right, .. } => {
            uses_of_operand(*left, out);
            uses_of_operand(*right, out);
        }
        RValue::New(_) | RValue::StaticFieldLoad(_) | RValue::Unknown => {}
    }
}

fn def(stmt: &Stmt) -> Option<u32> {
    match stmt {
        Stmt::Assign { lhs, .. } => Some(*lhs),
        Stmt::Invoke { lhs, .. } => *lhs,
        _ => None,
    }
}

impl<'c> Analysis for LivenessAnalysis<'c> {
    type Fact = LiveSet;

    fn direction(&self) -> Direction {
        Direction::Backward
    }

    fn boundary(&self) -> LiveSet {
        LiveSet::default()
    }

    fn initial(&self) -> LiveSet {
        LiveSet::default()
    }

    fn meet(&self, a: &LiveSet, b: &LiveSet) -> LiveSet {
        a.union(b)
    }

    fn transfer(&self, cfg: &Cfg, node: NodeId, input: &LiveSet) -> LiveSet {
        if node >= cfg.len() {
            // the virtual exit sentinel: nothing is live past it.
            return LiveSet::default();
        }
        let stmt = cfg.stmt(node);
        let mut live = input.0.clone();
        if let Some(d) = def(stmt) {
            live.remove(&d);
        }
        live.extend(uses(stmt));
        LiveSet(live)
    }
}
