pub mod evaluator;
pub mod intraprocedural;

pub use evaluator::{eval_operand, eval_rvalue};
pub use intraprocedural::IntraproceduralCp;
