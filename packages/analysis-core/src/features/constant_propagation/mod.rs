//! C1–C4: the abstract-value lattice, CP fact, expression evaluator, and
//! intraprocedural constant propagation.

pub mod domain;
pub mod infrastructure;

pub use domain::{AbstractValue, CpFact};
pub use infrastructure::IntraproceduralCp;
