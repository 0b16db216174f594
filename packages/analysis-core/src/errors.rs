//! Error types for analysis-core
//!
//! Provides unified error handling across the crate. The engine treats the
//! IR as trusted (§7 of the spec): everything here is a *fatal* condition —
//! a programmer error in how the engine was driven, never a recoverable
//! property of the analyzed program. Benign per-program conditions (e.g.
//! divide-by-zero, an unresolved virtual dispatch) are never errors; they
//! show up as lattice values or missing call-graph edges instead.

use thiserror::Error;

/// Main error type for analysis-core operations.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The IR handed to the engine violates a structural invariant the
    /// engine assumes (e.g. a statement references a variable or block id
    /// that doesn't exist in its own method).
    #[error("malformed IR: {0}")]
    MalformedIr(String),

    /// The class hierarchy has a cycle in its superclass chain.
    #[error("cyclic superclass chain starting at {0}")]
    CyclicHierarchy(String),

    /// Interprocedural constant propagation was asked to run against a PTA
    /// result that was never supplied.
    #[error("no pointer-analysis result available for alias-aware CP (pta option: {0})")]
    MissingPtaResult(String),

    /// Taint configuration could not be loaded.
    #[error("taint configuration error: {0}")]
    Config(#[from] TaintConfigError),

    /// I/O failure while reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors specific to parsing a taint-configuration file.
#[derive(Debug, Error)]
pub enum TaintConfigError {
    #[error("failed to parse taint configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("taint configuration references unknown method ref: {0}")]
    UnknownMethodRef(String),
}

/// Result type alias for analysis-core operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
