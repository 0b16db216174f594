//! C8: pointer-flow graph node identity (§3, §4.5).
//!
//! A node is either a (possibly contextified) local variable, or one of
//! the three heap-indexed locations the engine tracks fields through:
//! an instance field on a specific object, a static field (no base
//! object needed), or an array's elements. Arrays are modeled
//! field-insensitively: every element of a given object is one node,
//! the same "(Obj, merged-index)" collapsing the spec's heap
//! abstraction already uses for unknown-index writes.
//!
//! `C` is the context type: `()` for context-insensitive analysis (C9),
//! or a call-string (§4.6) for context-sensitive analysis (C10). Heap
//! objects are never contextified here — only pointer variables are —
//! matching a call-string/k-CFA context policy rather than an
//! object-sensitive one.

use crate::shared::ir::{FieldId, FieldRef, VarId};
use crate::shared::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PfgNode<C> {
    Var(C, VarId),
    InstanceField(ObjectId, FieldId),
    StaticField(FieldRef),
    ArrayElem(ObjectId),
}

impl<C> PfgNode<C> {
    pub fn var(ctx: C, var: VarId) -> Self {
        PfgNode::Var(ctx, var)
    }
}
