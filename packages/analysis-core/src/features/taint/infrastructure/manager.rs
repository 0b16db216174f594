//! Taint-object registry (§4.8): mints taint objects through the same
//! `HeapModel` a pointer-analysis run used, so a taint object's `ObjectId`
//! shares one namespace with ordinary allocation sites and can flow
//! through the already-built pointer-flow graph without any special
//! casing at the PFG level. Materializing through `HeapModel::object_for`
//! also gives idempotent synthesis for free: the model already interns by
//! `AllocSite`, and `(source_site, type)` is exactly the key a source call
//! re-visited twice should collapse to the same object under.

use super::super::domain::TaintObject;
use crate::features::call_graph::CallSite;
use crate::shared::ir::{AllocSite, ClassId};
use crate::shared::{HeapModel, ObjectId};
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct TaintManager {
    registry: FxHashMap<ObjectId, TaintObject>,
}

impl TaintManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints, or returns the existing, taint object for `(source_site,
    /// ty)`.
    pub fn materialize<H: HeapModel>(
        &mut self,
        heap: &mut H,
        source_site: CallSite,
        ty: ClassId,
    ) -> ObjectId {
        let pseudo_site = AllocSite {
            method: source_site.caller,
            stmt: source_site.stmt,
            class: ty,
        };
        let id = heap.object_for(pseudo_site);
        self.registry.entry(id).or_insert(TaintObject { source_site, ty });
        id
    }

    pub fn is_tainted(&self, obj: ObjectId) -> bool {
        self.registry.contains_key(&obj)
    }

    pub fn origin(&self, obj: ObjectId) -> Option<TaintObject> {
        self.registry.get(&obj).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::heap_model::AllocSiteHeapModel;

    #[test]
    fn rematerializing_the_same_site_and_type_returns_the_same_object() {
        let mut heap: AllocSiteHeapModel = AllocSiteHeapModel::new();
        let mut manager = TaintManager::new();
        let site = CallSite { caller: 0, stmt: 3 };
        let a = manager.materialize(&mut heap, site, 9);
        let b = manager.materialize(&mut heap, site, 9);
        assert_eq!(a, b);
        assert!(manager.is_tainted(a));
        assert_eq!(manager.origin(a).unwrap().source_site, site);
    }

    #[test]
    fn a_different_type_at_the_same_site_yields_a_distinct_object() {
        let mut heap: AllocSiteHeapModel = AllocSiteHeapModel::new();
        let mut manager = TaintManager::new();
        let site = CallSite { caller: 0, stmt: 3 };
        let a = manager.materialize(&mut heap, site, 9);
        let b = manager.materialize(&mut heap, site, 10);
        assert_ne!(a, b);
    }
}
