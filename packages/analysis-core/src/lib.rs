//! A whole-program static analysis engine over a method-granular,
//! statement-level IR (§1-§3): intraprocedural constant propagation and
//! dead-code detection, CHA and Andersen-style (context-insensitive and
//! context-sensitive) call-graph/points-to construction, alias-aware
//! interprocedural constant propagation, and a configurable taint layer
//! riding on top of points-to results.
//!
//! The engine never parses source itself (§6): it consumes an IR handed
//! to it by an external front end through the `shared::Program` and
//! `shared::ClassHierarchy` traits, and treats that IR as trusted --
//! malformed input is a fatal `errors::AnalysisError`, not a per-program
//! finding (§7).

pub mod errors;
pub mod features;
pub mod shared;

pub use errors::{AnalysisError, Result};
