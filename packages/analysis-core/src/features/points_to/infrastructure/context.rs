//! The `ContextSelector` abstraction (§4.6) plus one concrete strategy:
//! k-limited call-string contexts. Object- and type-sensitivity are real
//! alternatives in this design space; the trait is deliberately small so
//! another strategy can be dropped in without touching the CS solver.

use crate::features::call_graph::CallSite;
use crate::shared::{AllocSite, ObjectId};

/// A context is an opaque, hashable, cloneable token the CS solver
/// threads through the pointer-flow graph. `CallStringSelector` below
/// uses `Vec<CallSite>`; other strategies might use a single `ObjectId`
/// (object-sensitivity) or a `ClassId` (type-sensitivity).
pub trait ContextSelector {
    type Context: Clone + Eq + std::hash::Hash + std::fmt::Debug;

    fn initial_context(&self) -> Self::Context;

    /// `selectContext(csCallSite, callee)` (§4.6): the context a static or
    /// special call from `caller_ctx` through `site` runs the callee under.
    fn select(&self, caller_ctx: &Self::Context, site: CallSite) -> Self::Context;

    /// `selectContext(csCallSite, recvObj, callee)` (§4.6): the context an
    /// instance call runs its callee under, additionally qualified by the
    /// resolved receiver object. Defaults to ignoring `recv_obj` and
    /// falling back to `select`, which is exactly right for a selector
    /// (like `CallStringSelector`) whose contexts carry no object identity;
    /// an object-sensitive selector would override this to fold `recv_obj`
    /// into the returned context instead.
    fn select_instance(
        &self,
        caller_ctx: &Self::Context,
        site: CallSite,
        recv_obj: ObjectId,
    ) -> Self::Context {
        let _ = recv_obj;
        self.select(caller_ctx, site)
    }

    /// `selectHeapContext(callerCSMethod, obj)` (§4.6): the heap context a
    /// `new` reached under `caller_ctx` mints its object with. The default
    /// -- reusing the allocating method's own context verbatim -- is the
    /// standard call-string-k heap policy: an object's heap context is the
    /// (already-truncated) call string of the method that allocated it.
    fn select_heap_context(&self, caller_ctx: &Self::Context, site: AllocSite) -> Self::Context {
        let _ = site;
        caller_ctx.clone()
    }
}

/// Call-string contexts truncated to the most recent `k` call sites
/// (§4.6's concrete default). `k = 0` degenerates to context-insensitive
/// analysis (every context is the empty string).
#[derive(Debug, Clone, Copy)]
pub struct CallStringSelector {
    pub k: usize,
}

impl CallStringSelector {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl ContextSelector for CallStringSelector {
    type Context = CallString;

    fn initial_context(&self) -> CallString {
        CallString(Vec::new())
    }

    fn select(&self, caller_ctx: &CallString, site: CallSite) -> CallString {
        let mut sites = caller_ctx.0.clone();
        sites.push(site);
        if sites.len() > self.k {
            sites.remove(0);
        }
        CallString(sites)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallString(pub Vec<CallSite>);
