//! Declarative source/sink/transfer rules loaded from the `taint-config`
//! file (§4.8, §6). The config is produced by the same external IR
//! provider that assigns `ClassId`s and subsignatures, so rules are
//! matched against a callee's own `(declaring_class, subsignature)` rather
//! than a hand-authored symbolic name.

use crate::errors::{Result, TaintConfigError};
use crate::shared::ir::ClassId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which operand position a transfer rule reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Base,
    Result,
    Arg(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MethodRefConfig {
    pub declaring_class: ClassId,
    pub subsignature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRule {
    pub method: MethodRefConfig,
    pub return_type: ClassId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkRule {
    pub method: MethodRefConfig,
    pub arg_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRule {
    pub method: MethodRefConfig,
    pub from: Slot,
    pub to: Slot,
    pub to_type: ClassId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaintConfig {
    #[serde(default)]
    pub sources: Vec<SourceRule>,
    #[serde(default)]
    pub sinks: Vec<SinkRule>,
    #[serde(default)]
    pub transfers: Vec<TransferRule>,
}

impl TaintConfig {
    /// Malformed JSON is a fatal `AnalysisError::Config`; a missing file
    /// surfaces as `AnalysisError::Io` (§7 treats both as programmer-error
    /// conditions, never a per-program finding).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: TaintConfig = serde_json::from_str(&text).map_err(TaintConfigError::Parse)?;
        Ok(config)
    }

    pub(crate) fn sources_for(&self, method: &MethodRefConfig) -> impl Iterator<Item = &SourceRule> {
        self.sources.iter().filter(move |s| &s.method == method)
    }

    pub(crate) fn sinks_for(&self, method: &MethodRefConfig) -> impl Iterator<Item = &SinkRule> {
        self.sinks.iter().filter(move |s| &s.method == method)
    }

    pub(crate) fn transfers_for(&self, method: &MethodRefConfig) -> impl Iterator<Item = &TransferRule> {
        self.transfers.iter().filter(move |t| &t.method == method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_are_looked_up_by_declaring_class_and_subsignature() {
        let config = TaintConfig {
            sources: vec![SourceRule {
                method: MethodRefConfig {
                    declaring_class: 1,
                    subsignature: "read()".into(),
                },
                return_type: 9,
            }],
            sinks: vec![],
            transfers: vec![],
        };
        let hit = MethodRefConfig {
            declaring_class: 1,
            subsignature: "read()".into(),
        };
        let miss = MethodRefConfig {
            declaring_class: 2,
            subsignature: "read()".into(),
        };
        assert_eq!(config.sources_for(&hit).count(), 1);
        assert_eq!(config.sources_for(&miss).count(), 0);
    }

    #[test]
    fn deserializes_a_config_document() {
        let text = r#"{
            "sources": [{"method": {"declaring_class": 1, "subsignature": "read()"}, "return_type": 9}],
            "sinks": [{"method": {"declaring_class": 2, "subsignature": "exec(java.lang.String)"}, "arg_index": 0}],
            "transfers": [{"method": {"declaring_class": 3, "subsignature": "concat(java.lang.String)"}, "from": "base", "to": "result", "to_type": 9}]
        }"#;
        let config: TaintConfig = serde_json::from_str(text).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sinks.len(), 1);
        assert_eq!(config.transfers.len(), 1);
        assert_eq!(config.transfers[0].from, Slot::Base);
        assert_eq!(config.transfers[0].to, Slot::Result);
    }
}
