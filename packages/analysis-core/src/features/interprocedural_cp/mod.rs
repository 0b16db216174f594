//! C11: interprocedural constant propagation over an ICFG, with an
//! alias-aware heap abstraction built from PTA results (§4.7).

pub mod heap_abstraction;
pub mod icfg;
pub mod solver;

pub use heap_abstraction::HeapAbstraction;
pub use icfg::{EdgeKind, Icfg, IcfgEdge, IcfgNode};
pub use solver::{solve, IcpiResult};
