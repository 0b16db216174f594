//! C6: dead-code detection, built on a backward liveness analysis.

pub mod detector;
pub mod liveness;

pub use detector::{detect, DeadCodeReport};
pub use liveness::LivenessAnalysis;
