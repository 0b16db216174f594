pub mod pfg;
pub mod pointer;

pub use pfg::PointerFlowGraph;
pub use pointer::PfgNode;
