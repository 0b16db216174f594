//! C2: the CP fact — a map from variable to `AbstractValue` (§3, §4.1).
//!
//! A `CpFact` is the dataflow value that flows along a method's CFG edges.
//! Variables absent from the map are implicitly `UNDEF` (§4.2): the map
//! only ever grows entries forward, never needs to store `UNDEF` bindings
//! explicitly.

use super::lattice::AbstractValue;
use crate::shared::ir::VarId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpFact {
    values: FxHashMap<VarId, AbstractValue>,
}

impl CpFact {
    pub fn new() -> Self {
        Self::default()
    }

    /// `UNDEF` for any variable not yet bound.
    pub fn get(&self, var: VarId) -> AbstractValue {
        self.values.get(&var).copied().unwrap_or_default()
    }

    /// Sets `var`'s value. Setting `UNDEF` removes the entry rather than
    /// storing it explicitly, keeping the map's size proportional to
    /// "variables with actual information" rather than "variables ever
    /// mentioned".
    pub fn set(&mut self, var: VarId, value: AbstractValue) {
        if value.is_undef() {
            self.values.remove(&var);
        } else {
            self.values.insert(var, value);
        }
    }

    /// Pointwise meet (§4.1's `meet` combinator lifted to facts): the
    /// result binds each variable to the meet of its value in `self` and
    /// in `other`, treating any variable missing from one side as `UNDEF`.
    pub fn meet(&self, other: &CpFact) -> CpFact {
        let mut result = CpFact::new();
        for var in self.values.keys().chain(other.values.keys()) {
            let merged = self.get(*var).meet(other.get(*var));
            result.set(*var, merged);
        }
        result
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, AbstractValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}
