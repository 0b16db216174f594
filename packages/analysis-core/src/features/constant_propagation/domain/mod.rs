pub mod fact;
pub mod lattice;

pub use fact::CpFact;
pub use lattice::AbstractValue;
