pub mod config;
pub mod taint_object;

pub use config::{MethodRefConfig, SinkRule, Slot, SourceRule, TaintConfig, TransferRule};
pub use taint_object::TaintObject;
