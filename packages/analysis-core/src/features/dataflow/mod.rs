pub mod solver;

pub use solver::{Analysis, Direction, SolveResult};
