//! The class hierarchy the engine consumes to resolve dispatch (§4.4, §6).
//!
//! Building the hierarchy from declarations is an external collaborator's
//! job; CHA and the pointer analyses only ever walk it through this trait.

use crate::shared::ir::{ClassId, MethodId, MethodRef, Subsignature};

/// A read-only view of the class/interface hierarchy.
///
/// Implementors are expected to have already resolved inheritance at
/// construction time — `direct_subclasses`/`direct_subinterfaces` are plain
/// lookups, not search.
pub trait ClassHierarchy {
    /// Methods declared directly on `class` (not inherited).
    fn declared_methods(&self, class: ClassId) -> &[MethodId];

    /// `class`'s direct superclass, if any (`Object`-like roots return
    /// `None`).
    fn superclass(&self, class: ClassId) -> Option<ClassId>;

    /// Interfaces `class` directly implements (not transitively).
    fn direct_interfaces(&self, class: ClassId) -> &[ClassId];

    /// Classes that directly extend `class`.
    fn direct_subclasses(&self, class: ClassId) -> &[ClassId];

    /// Interfaces that directly extend `class` (when `class` is itself an
    /// interface).
    fn direct_subinterfaces(&self, class: ClassId) -> &[ClassId];

    /// Classes that directly implement `class` (when `class` is an
    /// interface).
    fn direct_implementors(&self, class: ClassId) -> &[ClassId];

    fn is_interface(&self, class: ClassId) -> bool;

    fn is_abstract(&self, class: ClassId) -> bool;

    /// The method a given (class, subsignature) resolves to, per the JVM's
    /// `dispatch` procedure (§4.4 glossary): walk `class` then its
    /// superclasses looking for a declared method matching `subsignature`.
    /// Returns `None` if the chain is exhausted without a match (an
    /// abstract method with no concrete override reachable here).
    fn resolve_declared(&self, class: ClassId, sig: &Subsignature) -> Option<MethodRef>;

    /// CHA's `Dispatch(c, m)` (§4.4): the concrete method `class` runs when
    /// `m`'s subsignature is invoked virtually on an object of exactly type
    /// `class`. Equivalent to walking `class` up through its superclasses
    /// for the first declared override; `None` if `class` cannot provide a
    /// concrete body (e.g. it's still abstract here).
    fn dispatch(&self, class: ClassId, sig: &Subsignature) -> Option<MethodId>;
}
