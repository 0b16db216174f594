//! Heap-object numbering (§4.5, §4.6, §6).
//!
//! The pointer analyses never allocate object identities themselves — they
//! ask a `HeapModel` to turn an allocation site, qualified by the heap
//! context it was reached in (`CSObj(heapCtx, o)`, §4.6), into a canonical
//! `ObjectId`. Context-insensitively the heap context is always `()`, which
//! collapses back to the CI policy of one `ObjectId` per `AllocSite`.

use crate::shared::ir::AllocSite;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// A canonical heap-object identity, opaque to callers. Whether two
/// `(heapCtx, site)` pairs share an `ObjectId` is entirely the `HeapModel`
/// impl's interning policy -- `AllocSiteHeapModel<C>` below never merges
/// distinct contexts, giving true per-context heap objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Maps context-insensitive allocation sites to canonical object
/// identities. This is the CI solver's view: a heap context of `()` for
/// every object, i.e. §4.5's "one object per allocation site" policy.
///
/// `object_for` is get-or-create: the PTA solvers discover allocation sites
/// lazily as they walk reachable methods (§4.5), so the model mints a fresh
/// `ObjectId` the first time a site is seen and returns the same id on
/// every later sighting.
pub trait HeapModel {
    fn object_for(&mut self, site: AllocSite) -> ObjectId;

    /// The declared class of the object allocated at `site`, used by CHA
    /// seeding and alias-aware field lookups.
    fn class_of(&self, object: ObjectId) -> crate::shared::ir::ClassId;
}

/// A `HeapModel` that assigns one `ObjectId` per distinct `(heapCtx, site)`
/// pair, interning pairs on first sight. Instantiated as
/// `AllocSiteHeapModel<()>` (aliased `AllocSiteHeapModel` below) for the CI
/// solver, and as `AllocSiteHeapModel<S::Context>` for the CS solver, where
/// `S::Context` is whatever heap context the `ContextSelector` picks
/// (§4.6's `selectHeapContext`) -- the same type, two granularities.
#[derive(Debug)]
pub struct AllocSiteHeapModel<C: Clone + Eq + Hash = ()> {
    sites: rustc_hash::FxHashMap<(C, AllocSite), ObjectId>,
    classes: Vec<crate::shared::ir::ClassId>,
}

impl<C: Clone + Eq + Hash> Default for AllocSiteHeapModel<C> {
    fn default() -> Self {
        Self {
            sites: rustc_hash::FxHashMap::default(),
            classes: Vec::new(),
        }
    }
}

impl<C: Clone + Eq + Hash> AllocSiteHeapModel<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the object for `site` under heap context `ctx`.
    /// Distinct contexts reaching the same site mint distinct objects.
    pub fn object_for_in(&mut self, ctx: C, site: AllocSite) -> ObjectId {
        if let Some(id) = self.sites.get(&(ctx.clone(), site)) {
            return *id;
        }
        let id = ObjectId(self.classes.len() as u32);
        self.classes.push(site.class);
        self.sites.insert((ctx, site), id);
        id
    }

    pub fn class_of(&self, object: ObjectId) -> crate::shared::ir::ClassId {
        self.classes[object.0 as usize]
    }
}

impl HeapModel for AllocSiteHeapModel<()> {
    fn object_for(&mut self, site: AllocSite) -> ObjectId {
        self.object_for_in((), site)
    }

    fn class_of(&self, object: ObjectId) -> crate::shared::ir::ClassId {
        AllocSiteHeapModel::class_of(self, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_site_yields_same_object() {
        let mut model: AllocSiteHeapModel = AllocSiteHeapModel::new();
        let site = AllocSite {
            method: 1,
            stmt: 3,
            class: 7,
        };
        let a = model.object_for(site);
        let b = model.object_for(site);
        assert_eq!(a, b);
        assert_eq!(model.class_of(a), 7);
    }

    #[test]
    fn distinct_sites_yield_distinct_objects() {
        let mut model: AllocSiteHeapModel = AllocSiteHeapModel::new();
        let a = model.object_for(AllocSite {
            method: 1,
            stmt: 0,
            class: 1,
        });
        let b = model.object_for(AllocSite {
            method: 1,
            stmt: 1,
            class: 1,
        });
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_heap_contexts_over_the_same_site_are_distinct_objects() {
        let mut model: AllocSiteHeapModel<u32> = AllocSiteHeapModel::new();
        let site = AllocSite {
            method: 1,
            stmt: 0,
            class: 1,
        };
        let a = model.object_for_in(10, site);
        let b = model.object_for_in(20, site);
        assert_ne!(a, b);
        assert_eq!(model.class_of(a), 1);
        assert_eq!(model.class_of(b), 1);
    }
}
