//! A whole-program view over methods (§6): everything CHA, the PTA
//! solvers, and ICPI need to walk "every method in the program" rather
//! than one method at a time.

use crate::shared::ir::{Method, MethodId};

pub trait Program {
    fn method(&self, id: MethodId) -> &Method;

    /// All methods with a body (excludes abstract/interface declarations,
    /// which have no `Cfg` to analyze).
    fn method_ids(&self) -> &[MethodId];

    /// The program's entry points (§4.4: where CHA's reachable-method
    /// search starts; §4.5: where the PTA solvers seed their worklist).
    fn entry_points(&self) -> &[MethodId];
}
