//! A taint object (§3, §4.8): a heap object synthesized by the taint layer
//! rather than allocated by the analyzed program, keyed by the call site
//! that sourced it plus its declared type. Re-sourcing the same
//! `(site, type)` pair must yield the same object -- §4.8's "idempotent
//! synthesis" -- so sink collection can recognize the same flow discovered
//! through two different aliasing paths as one finding, not two.

use crate::features::call_graph::CallSite;
use crate::shared::ir::ClassId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaintObject {
    pub source_site: CallSite,
    pub ty: ClassId,
}
