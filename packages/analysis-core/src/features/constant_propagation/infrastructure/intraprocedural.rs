//! C4: intraprocedural constant propagation (ICP), a forward analysis over
//! one method's CFG (§4.2).
//!
//! The transfer rule for a node holding `Stmt::Assign { lhs, rhs }` with an
//! int-compatible `lhs` is `OUT = IN[lhs := eval(rhs, IN)]`; every other
//! statement kind (including assignments to non-int variables) is the
//! identity transfer `OUT = IN`, per §4.2's "assignment to a non-trackable
//! type leaves the fact unchanged" rule.

use super::evaluator::eval_rvalue;
use crate::features::constant_propagation::domain::CpFact;
use crate::features::dataflow::{Analysis, Direction};
use crate::shared::ir::{Cfg, Method, NodeId, Stmt};

pub struct IntraproceduralCp<'m> {
    method: &'m Method,
}

impl<'m> IntraproceduralCp<'m> {
    pub fn new(method: &'m Method) -> Self {
        Self { method }
    }

    pub fn run(&self) -> crate::features::dataflow::SolveResult<CpFact> {
        crate::features::dataflow::solver::solve(self, &self.method.cfg)
    }
}

impl<'m> Analysis for IntraproceduralCp<'m> {
    type Fact = CpFact;

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn boundary(&self) -> CpFact {
        // Parameters enter as NAC: the method's callers are unknown in an
        // intraprocedural analysis, so nothing about their arguments'
        // values can be assumed (§4.2).
        let mut fact = CpFact::new();
        for param in &self.method.params {
            if self.method.can_hold_int(param.var) {
                fact.set(param.var, crate::features::constant_propagation::domain::AbstractValue::Nac);
            }
        }
        fact
    }

    fn initial(&self) -> CpFact {
        CpFact::new()
    }

    fn meet(&self, a: &CpFact, b: &CpFact) -> CpFact {
        a.meet(b)
    }

    fn transfer(&self, cfg: &Cfg, node: NodeId, input: &CpFact) -> CpFact {
        match cfg.stmt(node) {
            Stmt::Assign { lhs, rhs } if self.method.can_hold_int(*lhs) => {
                let mut out = input.clone();
                out.set(*lhs, eval_rvalue(rhs, input));
                out
            }
            Stmt::Invoke {
                lhs: Some(lhs), ..
            } if self.method.can_hold_int(*lhs) => {
                // A call result is always NAC intraprocedurally -- only
                // ICPI (§4.7), which has a call graph and a heap
                // abstraction, can do better.
                let mut out = input.clone();
                out.set(
                    *lhs,
                    crate::features::constant_propagation::domain::AbstractValue::Nac,
                );
                out
            }
            _ => input.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::constant_propagation::domain::AbstractValue::*;
    use crate::shared::ir::{BinOp, Operand, RValue, Type};
    use rustc_hash::FxHashMap;

    fn method_with(cfg: Cfg, var_types: &[(u32, Type)]) -> Method {
        Method {
            id: 0,
            declaring_class: 0,
            subsignature: crate::shared::ir::Subsignature("m()".into()),
            params: vec![],
            this_var: None,
            return_vars: vec![],
            is_abstract: false,
            var_types: var_types.iter().copied().collect::<FxHashMap<_, _>>(),
            cfg,
        }
    }

    #[test]
    fn straight_line_constant_folds() {
        // x = 2; y = x + 3; return y
        let cfg = Cfg::new(vec![
            Stmt::Assign {
                lhs: 0,
                rhs: RValue::Operand(Operand::Const(2)),
            },
            Stmt::Assign {
                lhs: 1,
                rhs: RValue::Binary {
                    op: BinOp::Add,
                    left: Operand::Var(0),
                    right: Operand::Const(3),
                },
            },
            Stmt::Return(Some(Operand::Var(1))),
        ]);
        let method = method_with(cfg, &[(0, Type::Int), (1, Type::Int)]);
        let result = IntraproceduralCp::new(&method).run();
        assert_eq!(result.out_facts[1].get(1), Const(5));
    }

    #[test]
    fn join_of_conflicting_branches_is_nac() {
        // if (p) x = 1; else x = 2;  (join point after)
        let cfg = Cfg::new(vec![
            Stmt::If {
                cond: Operand::Const(1),
                true_target: 1,
                false_target: 3,
            },
            Stmt::Assign {
                lhs: 0,
                rhs: RValue::Operand(Operand::Const(1)),
            },
            Stmt::Goto(4),
            Stmt::Assign {
                lhs: 0,
                rhs: RValue::Operand(Operand::Const(2)),
            },
            Stmt::Return(Some(Operand::Var(0))),
        ]);
        let method = method_with(cfg, &[(0, Type::Int)]);
        let result = IntraproceduralCp::new(&method).run();
        assert_eq!(result.in_facts[4].get(0), Nac);
    }

    #[test]
    fn divide_by_constant_zero_yields_undef() {
        let cfg = Cfg::new(vec![
            Stmt::Assign {
                lhs: 0,
                rhs: RValue::Binary {
                    op: BinOp::Div,
                    left: Operand::Const(1),
                    right: Operand::Const(0),
                },
            },
            Stmt::Return(Some(Operand::Var(0))),
        ]);
        let method = method_with(cfg, &[(0, Type::Int)]);
        let result = IntraproceduralCp::new(&method).run();
        assert_eq!(result.out_facts[0].get(0), Undef);
    }
}
