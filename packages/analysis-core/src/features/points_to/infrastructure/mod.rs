pub mod ci_solver;
pub mod context;
pub mod cs_solver;

pub use ci_solver::{solve as solve_ci, AndersenConfig, AndersenStats as CiStats, PointsToResult as CiResult};
pub use context::{CallString, CallStringSelector, ContextSelector};
pub use cs_solver::{solve as solve_cs, AndersenStats as CsStats, PointsToResult as CsResult};
