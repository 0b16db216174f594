//! C8-C10: pointer-flow graph plus context-insensitive and
//! context-sensitive Andersen-style pointer analysis.

pub mod domain;
pub mod infrastructure;

pub use domain::{PfgNode, PointerFlowGraph};
pub use infrastructure::{
    solve_ci, solve_cs, AndersenConfig, CallString, CallStringSelector, CiResult, CiStats,
    ContextSelector, CsResult, CsStats,
};
