//! C1: the abstract-value lattice `{UNDEF, CONST(i), NAC}` (§3, §4.2).
//!
//! `UNDEF` sits at the bottom (no information yet reached this point),
//! `NAC` ("not a constant") at the top, and each `CONST(i)` is an
//! incomparable middle point — the classic three-point flat lattice used
//! by every textbook constant-propagation pass.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbstractValue {
    Undef,
    Const(i32),
    Nac,
}

impl AbstractValue {
    pub fn is_undef(self) -> bool {
        matches!(self, AbstractValue::Undef)
    }

    pub fn is_nac(self) -> bool {
        matches!(self, AbstractValue::Nac)
    }

    pub fn as_const(self) -> Option<i32> {
        match self {
            AbstractValue::Const(i) => Some(i),
            _ => None,
        }
    }

    /// The lattice meet (greatest lower bound), §4.2:
    /// - `UNDEF ⊓ x = x`
    /// - `NAC ⊓ x = NAC`
    /// - `CONST(a) ⊓ CONST(b) = CONST(a)` if `a == b`, else `NAC`
    pub fn meet(self, other: AbstractValue) -> AbstractValue {
        use AbstractValue::*;
        match (self, other) {
            (Undef, x) | (x, Undef) => x,
            (Nac, _) | (_, Nac) => Nac,
            (Const(a), Const(b)) => {
                if a == b {
                    Const(a)
                } else {
                    Nac
                }
            }
        }
    }

    /// Partial order used by §8's monotonicity property: `UNDEF ⊑ CONST(i)
    /// ⊑ NAC` for every `i`, and no two distinct constants are comparable.
    pub fn leq(self, other: AbstractValue) -> bool {
        use AbstractValue::*;
        match (self, other) {
            (Undef, _) => true,
            (_, Nac) => true,
            (Const(a), Const(b)) => a == b,
            _ => false,
        }
    }

    /// Three-way comparison for the lattice order, where it's defined;
    /// `None` when the two values are incomparable (two distinct
    /// constants).
    pub fn partial_cmp_lattice(self, other: AbstractValue) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if self.leq(other) {
            Some(Ordering::Less)
        } else if other.leq(self) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl Default for AbstractValue {
    fn default() -> Self {
        AbstractValue::Undef
    }
}

#[cfg(test)]
mod tests {
    use super::AbstractValue::*;
    use super::*;
    use proptest::prelude::*;

    fn arb_value() -> impl Strategy<Value = AbstractValue> {
        prop_oneof![
            Just(Undef),
            Just(Nac),
            (-4i32..4).prop_map(Const),
        ]
    }

    #[test]
    fn meet_table() {
        assert_eq!(Undef.meet(Const(1)), Const(1));
        assert_eq!(Const(1).meet(Undef), Const(1));
        assert_eq!(Nac.meet(Const(1)), Nac);
        assert_eq!(Const(1).meet(Const(1)), Const(1));
        assert_eq!(Const(1).meet(Const(2)), Nac);
    }

    proptest! {
        #[test]
        fn meet_is_commutative(a in arb_value(), b in arb_value()) {
            prop_assert_eq!(a.meet(b), b.meet(a));
        }

        #[test]
        fn meet_is_associative(a in arb_value(), b in arb_value(), c in arb_value()) {
            prop_assert_eq!(a.meet(b).meet(c), a.meet(b.meet(c)));
        }

        #[test]
        fn meet_is_idempotent(a in arb_value()) {
            prop_assert_eq!(a.meet(a), a);
        }

        #[test]
        fn meet_is_a_lower_bound(a in arb_value(), b in arb_value()) {
            let m = a.meet(b);
            prop_assert!(m.leq(a));
            prop_assert!(m.leq(b));
        }
    }
}
