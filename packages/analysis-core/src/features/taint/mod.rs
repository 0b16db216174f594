//! C12: taint analysis (§4.8). Rides on a finished pointer-analysis result
//! via three hooks -- source processing, transfer-rule application, sink
//! collection -- configured from an external JSON document rather than
//! hardcoded method lists.

pub mod domain;
pub mod infrastructure;

pub use domain::{MethodRefConfig, SinkRule, Slot, SourceRule, TaintConfig, TaintObject, TransferRule};
pub use infrastructure::{run, TaintFlow, TaintManager};
