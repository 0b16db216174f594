//! Alias-aware heap abstraction (§4.7), built once from a finished CI PTA
//! result before ICPI's worklist starts. It is what lets a flow-insensitive
//! view of the heap (one merged value per field/array slot, not one per
//! program point) participate correctly in a flow-sensitive variable
//! analysis: a store re-evaluates every load that *might* read the same
//! slot through an alias, instead of only the loads syntactically after it.

use super::icfg::IcfgNode;
use crate::features::constant_propagation::domain::AbstractValue;
use crate::features::points_to::{CiResult, PfgNode};
use crate::shared::ir::{ClassId, FieldId, RValue, Stmt, VarId};
use crate::shared::{ObjectId, Program};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::features::call_graph::CallGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum HeapKey {
    Instance(ObjectId, FieldId),
    Static(ClassId, FieldId),
    /// §4.7: the array index's own abstract value is part of the key.
    /// `idx` is always `Const(i)` or `Nac` here -- an `Undef` index is
    /// never looked up or stored, both callers special-case it away first.
    Array(ObjectId, AbstractValue),
}

#[derive(Debug, Default)]
pub struct HeapAbstraction {
    alias_map: FxHashMap<VarId, FxHashSet<VarId>>,
    val_map: FxHashMap<HeapKey, AbstractValue>,
    array_keys_by_object: FxHashMap<ObjectId, FxHashSet<AbstractValue>>,
    static_load_map: FxHashMap<(ClassId, FieldId), FxHashSet<IcfgNode>>,
    instance_load_map: FxHashMap<(VarId, FieldId), FxHashSet<IcfgNode>>,
    array_load_map: FxHashMap<VarId, FxHashSet<IcfgNode>>,
}

impl HeapAbstraction {
    pub fn build<P: Program>(program: &P, call_graph: &CallGraph, pta: &CiResult) -> Self {
        let mut ha = HeapAbstraction::default();
        ha.build_alias_map(pta);
        ha.build_load_maps(program, call_graph);
        ha
    }

    fn build_alias_map(&mut self, pta: &CiResult) {
        let mut var_pts: Vec<(VarId, FxHashSet<ObjectId>)> = Vec::new();
        for node in pta.pfg.nodes() {
            if let PfgNode::Var(_, v) = node {
                let pts = pta.pts_of_var(*v);
                if !pts.is_empty() {
                    var_pts.push((*v, pts.clone()));
                }
            }
        }
        for &(v, _) in &var_pts {
            self.alias_map.entry(v).or_default().insert(v);
        }
        for i in 0..var_pts.len() {
            for j in (i + 1)..var_pts.len() {
                let (v1, p1) = &var_pts[i];
                let (v2, p2) = &var_pts[j];
                if !p1.is_disjoint(p2) {
                    self.alias_map.entry(*v1).or_default().insert(*v2);
                    self.alias_map.entry(*v2).or_default().insert(*v1);
                }
            }
        }
    }

    fn build_load_maps<P: Program>(&mut self, program: &P, call_graph: &CallGraph) {
        for method_id in call_graph.reachable_methods() {
            let method = program.method(method_id);
            for stmt_idx in method.cfg.nodes() {
                match method.cfg.stmt(stmt_idx) {
                    Stmt::Assign {
                        rhs: RValue::InstanceFieldLoad { base, field },
                        ..
                    } => {
                        self.instance_load_map
                            .entry((*base, *field))
                            .or_default()
                            .insert(IcfgNode::new(method_id, stmt_idx));
                    }
                    Stmt::Assign {
                        rhs: RValue::StaticFieldLoad(f),
                        ..
                    } => {
                        self.static_load_map
                            .entry((f.declaring_class, f.name))
                            .or_default()
                            .insert(IcfgNode::new(method_id, stmt_idx));
                    }
                    Stmt::Assign {
                        rhs: RValue::ArrayLoad { base, .. },
                        ..
                    } => {
                        self.array_load_map
                            .entry(*base)
                            .or_default()
                            .insert(IcfgNode::new(method_id, stmt_idx));
                    }
                    _ => {}
                }
            }
        }
    }

    /// `v` always aliases itself, even if it was never seen by PTA (e.g. a
    /// variable PTA never gave a nonempty points-to set).
    pub fn aliases(&self, v: VarId) -> FxHashSet<VarId> {
        self.alias_map.get(&v).cloned().unwrap_or_else(|| {
            let mut s = FxHashSet::default();
            s.insert(v);
            s
        })
    }

    pub fn field_value(&self, obj: ObjectId, field: FieldId) -> AbstractValue {
        self.val_map
            .get(&HeapKey::Instance(obj, field))
            .copied()
            .unwrap_or_default()
    }

    /// Returns `true` if the merged value changed (callers enqueue
    /// dependent loads only then).
    pub fn set_field_value(&mut self, obj: ObjectId, field: FieldId, value: AbstractValue) -> bool {
        self.meet_into(HeapKey::Instance(obj, field), value)
    }

    pub fn static_value(&self, class: ClassId, field: FieldId) -> AbstractValue {
        self.val_map
            .get(&HeapKey::Static(class, field))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_static_value(&mut self, class: ClassId, field: FieldId, value: AbstractValue) -> bool {
        self.meet_into(HeapKey::Static(class, field), value)
    }

    /// `idx` must be `Const(i)` or `Nac` (callers filter `Undef` out before
    /// calling).
    pub fn array_value(&self, obj: ObjectId, idx: AbstractValue) -> AbstractValue {
        self.val_map
            .get(&HeapKey::Array(obj, idx))
            .copied()
            .unwrap_or_default()
    }

    /// Meet over every index ever recorded for `obj` (§4.7's NAC-index
    /// load rule).
    pub fn array_all_values(&self, obj: ObjectId) -> AbstractValue {
        self.array_keys_by_object
            .get(&obj)
            .into_iter()
            .flatten()
            .fold(AbstractValue::Undef, |acc, &idx| {
                acc.meet(self.array_value(obj, idx))
            })
    }

    pub fn set_array_value(&mut self, obj: ObjectId, idx: AbstractValue, value: AbstractValue) -> bool {
        self.array_keys_by_object.entry(obj).or_default().insert(idx);
        self.meet_into(HeapKey::Array(obj, idx), value)
    }

    fn meet_into(&mut self, key: HeapKey, value: AbstractValue) -> bool {
        let old = self.val_map.get(&key).copied().unwrap_or_default();
        let merged = old.meet(value);
        if merged != old {
            self.val_map.insert(key, merged);
            true
        } else {
            false
        }
    }

    pub fn static_loads(&self, class: ClassId, field: FieldId) -> impl Iterator<Item = IcfgNode> + '_ {
        self.static_load_map
            .get(&(class, field))
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn instance_loads(&self, base: VarId, field: FieldId) -> impl Iterator<Item = IcfgNode> + '_ {
        self.instance_load_map
            .get(&(base, field))
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn array_loads(&self, base: VarId) -> impl Iterator<Item = IcfgNode> + '_ {
        self.array_load_map
            .get(&base)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::constant_propagation::domain::AbstractValue::*;

    #[test]
    fn instance_field_value_starts_undef_and_merges_toward_nac() {
        let mut ha = HeapAbstraction::default();
        assert_eq!(ha.field_value(ObjectId(0), 1), Undef);
        assert!(ha.set_field_value(ObjectId(0), 1, Const(1)));
        assert_eq!(ha.field_value(ObjectId(0), 1), Const(1));
        assert!(!ha.set_field_value(ObjectId(0), 1, Const(1)));
        assert!(ha.set_field_value(ObjectId(0), 1, Const(2)));
        assert_eq!(ha.field_value(ObjectId(0), 1), Nac);
    }

    #[test]
    fn array_all_values_meets_every_recorded_index() {
        let mut ha = HeapAbstraction::default();
        ha.set_array_value(ObjectId(0), Const(0), Const(5));
        ha.set_array_value(ObjectId(0), Const(1), Const(5));
        assert_eq!(ha.array_all_values(ObjectId(0)), Const(5));
        ha.set_array_value(ObjectId(0), Const(2), Const(9));
        assert_eq!(ha.array_all_values(ObjectId(0)), Nac);
    }

    #[test]
    fn unaliased_variable_only_aliases_itself() {
        let ha = HeapAbstraction::default();
        let aliases = ha.aliases(3);
        assert_eq!(aliases.len(), 1);
        assert!(aliases.contains(&3));
    }
}
