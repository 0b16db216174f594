//! C3: evaluates an expression's abstract value from the current fact
//! (§4.2).
//!
//! This evaluator is alias-oblivious: field loads, array loads, and call
//! results are always `NAC` here, since without points-to information
//! there is no way to know which store they last saw. The alias-aware
//! variant used by ICPI (§4.7) re-implements field/array evaluation on top
//! of the heap abstraction instead of calling this one.

use crate::features::constant_propagation::domain::{AbstractValue, CpFact};
use crate::shared::ir::{Operand, RValue};

/// Reads an operand's abstract value out of `fact`.
pub fn eval_operand(op: Operand, fact: &CpFact) -> AbstractValue {
    match op {
        Operand::Var(v) => fact.get(v),
        Operand::Const(i) => AbstractValue::Const(i),
    }
}

/// Evaluates `rhs`'s abstract value under `fact`, per §4.2's rules, checked
/// in this order:
/// - a bare operand: its own value (lifted, for a literal).
/// - a binary op of two `CONST`s: the folded constant.
/// - a binary op dividing or remaindering by a literal `CONST(0)`: `UNDEF`
///   regardless of the other operand (§7: the trap makes the statement
///   unreachable in any concrete execution, so the "result" carries no
///   information) -- this runs before the `NAC`/`UNDEF` catch-alls below
///   since it overrides both.
/// - a binary op with either operand `NAC`: `NAC`.
/// - anything else binary (i.e. an `UNDEF` operand with no `NAC` on the
///   other side): `UNDEF`.
/// - anything else (`New`, casts, field/array loads, `Unknown`): `NAC`,
///   since none of those are tracked without alias information.
pub fn eval_rvalue(rhs: &RValue, fact: &CpFact) -> AbstractValue {
    match rhs {
        RValue::Operand(op) => eval_operand(*op, fact),
        RValue::Binary { op, left, right } => {
            let l = eval_operand(*left, fact);
            let r = eval_operand(*right, fact);
            eval_binary(*op, l, r)
        }
        RValue::New(_)
        | RValue::Cast { .. }
        | RValue::StaticFieldLoad(_)
        | RValue::InstanceFieldLoad { .. }
        | RValue::ArrayLoad { .. }
        | RValue::Unknown => AbstractValue::Nac,
    }
}

fn eval_binary(
    op: crate::shared::ir::BinOp,
    left: AbstractValue,
    right: AbstractValue,
) -> AbstractValue {
    use crate::shared::ir::BinOp::{Div, Rem};
    use AbstractValue::*;
    match (left, right) {
        (Const(a), Const(b)) => match op.apply(a, b) {
            Some(v) => Const(v),
            None => Undef,
        },
        // A NAC dividend still traps on a known-zero divisor: the program
        // never reaches a value for the division itself (§4.2). This check
        // must run before the NAC/UNDEF catch-alls below, since it applies
        // regardless of which of those the dividend is.
        (_, Const(0)) if matches!(op, Div | Rem) => Undef,
        (Nac, _) | (_, Nac) => Nac,
        _ => Undef,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ir::BinOp;

    #[test]
    fn literal_operand_is_its_own_constant() {
        let fact = CpFact::new();
        assert_eq!(eval_operand(Operand::Const(7), &fact), AbstractValue::Const(7));
    }

    #[test]
    fn binary_folds_two_constants() {
        let fact = CpFact::new();
        let v = eval_rvalue(
            &RValue::Binary {
                op: BinOp::Add,
                left: Operand::Const(2),
                right: Operand::Const(3),
            },
            &fact,
        );
        assert_eq!(v, AbstractValue::Const(5));
    }

    #[test]
    fn division_by_constant_zero_is_undef() {
        let fact = CpFact::new();
        let v = eval_rvalue(
            &RValue::Binary {
                op: BinOp::Div,
                left: Operand::Const(1),
                right: Operand::Const(0),
            },
            &fact,
        );
        assert_eq!(v, AbstractValue::Undef);
    }

    #[test]
    fn division_of_a_nac_dividend_by_a_known_zero_is_still_undef() {
        let mut fact = CpFact::new();
        fact.set(0, AbstractValue::Nac);
        let v = eval_rvalue(
            &RValue::Binary {
                op: BinOp::Div,
                left: Operand::Var(0),
                right: Operand::Const(0),
            },
            &fact,
        );
        assert_eq!(v, AbstractValue::Undef);
    }

    #[test]
    fn nac_operand_poisons_a_binary_with_a_constant() {
        let mut fact = CpFact::new();
        fact.set(0, AbstractValue::Nac);
        let v = eval_rvalue(
            &RValue::Binary {
                op: BinOp::Add,
                left: Operand::Var(0),
                right: Operand::Const(1),
            },
            &fact,
        );
        assert_eq!(v, AbstractValue::Nac);
    }

    #[test]
    fn nac_outranks_undef_when_the_two_meet_in_a_binary() {
        let mut fact = CpFact::new();
        fact.set(0, AbstractValue::Nac);
        fact.set(1, AbstractValue::Undef);
        let v = eval_rvalue(
            &RValue::Binary {
                op: BinOp::Add,
                left: Operand::Var(0),
                right: Operand::Var(1),
            },
            &fact,
        );
        assert_eq!(v, AbstractValue::Nac);
    }

    #[test]
    fn field_and_array_loads_are_always_nac() {
        let fact = CpFact::new();
        assert_eq!(
            eval_rvalue(
                &RValue::InstanceFieldLoad { base: 0, field: 0 },
                &fact
            ),
            AbstractValue::Nac
        );
    }
}
