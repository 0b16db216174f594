//! The intermediate representation the engine analyzes (§3, §6).
//!
//! Parsing source/bytecode into this IR, and building its control-flow
//! graphs, are both explicit external collaborators (§1) — this module
//! only defines the *shape* the rest of the crate agrees to consume. A
//! `Cfg` here is still given a reference builder (`Cfg::new`) purely so the
//! solvers are testable against tiny hand-built methods; nothing in the
//! engine requires IR to arrive this way rather than being handed a
//! pre-built graph from elsewhere.

use rustc_hash::FxHashMap;
use std::fmt;

/// A local variable, identified by a small dense integer (interned by the
/// IR provider).
pub type VarId = u32;

/// A method, identified by a small dense integer.
pub type MethodId = u32;

/// A class or interface, identified by a small dense integer.
pub type ClassId = u32;

/// A declared field, identified by a small dense integer. Distinct fields
/// (even same-named fields in unrelated classes) get distinct ids — the
/// IR provider is responsible for that uniqueness, the same way it
/// guarantees `VarId`/`ClassId` uniqueness.
pub type FieldId = u32;

/// Index of a statement within one method's `Cfg`. Dead-code results are
/// reported sorted by this id (§6).
pub type NodeId = usize;

/// A primitive type, to the precision §4.2's `canHoldInt` needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Byte,
    Short,
    Int,
    Char,
    Boolean,
    /// Anything else (reference types, long, float, ...). Expressions of
    /// this type are never tracked by the CP lattice.
    Other,
}

impl Type {
    /// §4.2: "v's type is byte, short, int, char, or boolean."
    pub fn can_hold_int(self) -> bool {
        matches!(
            self,
            Type::Byte | Type::Short | Type::Int | Type::Char | Type::Boolean
        )
    }
}

/// A (declaring class, field) pair. Both components are already interned
/// ids, so deriving `Hash`/`Eq` here gives the stable structural key §9
/// asks for without needing a separate interner for the pair itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub declaring_class: ClassId,
    pub name: FieldId,
}

/// A method name + parameter/return shape, used for virtual dispatch (§4.4
/// glossary: "Subsignature").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subsignature(pub String);

impl fmt::Display for Subsignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reference to a method as written at a call site, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub declaring_class: ClassId,
    pub subsignature: Subsignature,
}

/// An allocation site: `x = new T@s`. Together with a context (CS mode
/// only) this is what `HeapModel` turns into a canonical object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocSite {
    pub method: MethodId,
    pub stmt: NodeId,
    pub class: ClassId,
}

/// A simple operand: either a variable read or an integer literal. Every
/// binary operation's operands are operands, not arbitrary sub-expressions
/// — this is a three-address IR, matching what a real bytecode/SSA front
/// end would hand the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Var(VarId),
    Const(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    UShr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// Applies the operator under 32-bit wraparound semantics (§4.2).
    /// Returns `None` for division/remainder by zero — the caller decides
    /// what that means for the lattice (UNDEF, per §4.2/§7).
    pub fn apply(self, a: i32, b: i32) -> Option<i32> {
        use BinOp::*;
        Some(match self {
            Add => a.wrapping_add(b),
            Sub => a.wrapping_sub(b),
            Mul => a.wrapping_mul(b),
            Div => {
                if b == 0 {
                    return None;
                }
                a.wrapping_div(b)
            }
            Rem => {
                if b == 0 {
                    return None;
                }
                a.wrapping_rem(b)
            }
            And => a & b,
            Or => a | b,
            Xor => a ^ b,
            Shl => a.wrapping_shl((b as u32) & 0x1f),
            Shr => a.wrapping_shr((b as u32) & 0x1f),
            UShr => ((a as u32).wrapping_shr((b as u32) & 0x1f)) as i32,
            Eq => (a == b) as i32,
            Ne => (a != b) as i32,
            Lt => (a < b) as i32,
            Le => (a <= b) as i32,
            Gt => (a > b) as i32,
            Ge => (a >= b) as i32,
        })
    }

    /// Whether the operator can ever trap on its own (used by §4.3's
    /// side-effect classification).
    pub fn may_trap(self) -> bool {
        matches!(self, BinOp::Div | BinOp::Rem)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    Static,
    Special,
    Virtual,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeExpr {
    pub kind: InvokeKind,
    /// `None` for static calls, `Some(receiver var)` otherwise.
    pub receiver: Option<VarId>,
    pub method: MethodRef,
    pub args: Vec<Operand>,
}

/// The right-hand side of a non-call assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RValue {
    /// Plain copy or constant load: `x = y` or `x = 1`.
    Operand(Operand),
    New(AllocSite),
    /// A checked cast: may trap (§4.3).
    Cast { operand: Operand },
    StaticFieldLoad(FieldRef),
    InstanceFieldLoad { base: VarId, field: FieldId },
    ArrayLoad { base: VarId, index: Operand },
    Binary { op: BinOp, left: Operand, right: Operand },
    /// Any expression shape the engine doesn't model — §4.2's safe default
    /// is NAC, never a crash.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Assign {
        lhs: VarId,
        rhs: RValue,
    },
    StaticStore {
        field: FieldRef,
        value: Operand,
    },
    InstanceStore {
        base: VarId,
        field: FieldId,
        value: Operand,
    },
    ArrayStore {
        base: VarId,
        index: Operand,
        value: Operand,
    },
    /// A call statement. `lhs` is `Some` when the call's result is used;
    /// this is the only way a call ever appears (no calls nested inside
    /// other expressions), so every call site is syntactically a single
    /// CFG node, matching §3's ICFG call-site classification.
    Invoke {
        lhs: Option<VarId>,
        expr: InvokeExpr,
    },
    If {
        cond: Operand,
        true_target: NodeId,
        false_target: NodeId,
    },
    Switch {
        selector: Operand,
        cases: Vec<(i32, NodeId)>,
        default: NodeId,
    },
    Return(Option<Operand>),
    Goto(NodeId),
    Nop,
}

impl Stmt {
    /// §4.3's side-effect classification: object allocation, casts, field
    /// accesses, array accesses, and integer division/remainder may all
    /// trap or trigger observable behavior; everything else is pure.
    pub fn has_side_effect(&self) -> bool {
        match self {
            Stmt::Assign { rhs, .. } => match rhs {
                RValue::New(_)
                | RValue::Cast { .. }
                | RValue::StaticFieldLoad(_)
                | RValue::InstanceFieldLoad { .. }
                | RValue::ArrayLoad { .. } => true,
                RValue::Binary { op, .. } => op.may_trap(),
                RValue::Operand(_) | RValue::Unknown => false,
            },
            Stmt::StaticStore { .. }
            | Stmt::InstanceStore { .. }
            | Stmt::ArrayStore { .. }
            | Stmt::Invoke { .. } => true,
            Stmt::If { .. } | Stmt::Switch { .. } | Stmt::Return(_) | Stmt::Goto(_) | Stmt::Nop => {
                false
            }
        }
    }
}

/// A method's control-flow graph, at statement granularity: each `Stmt` is
/// its own CFG node. `exit` is a virtual sentinel node (one past the last
/// real statement) that every `Return` flows into, so the graph always has
/// the single unique exit §3 requires even with multiple return statements.
#[derive(Debug, Clone)]
pub struct Cfg {
    pub entry: NodeId,
    pub exit: NodeId,
    nodes: Vec<Stmt>,
    succ: Vec<Vec<NodeId>>,
    pred: Vec<Vec<NodeId>>,
}

impl Cfg {
    /// Builds the graph from a linear statement list: branch/switch/goto
    /// targets are taken from the statements themselves, and anything else
    /// falls through to the next statement (or to `exit`, if it's last).
    pub fn new(nodes: Vec<Stmt>) -> Self {
        let n = nodes.len();
        let exit = n;
        let mut succ = vec![Vec::new(); n + 1];
        let mut pred = vec![Vec::new(); n + 1];

        for (i, stmt) in nodes.iter().enumerate() {
            let targets: Vec<NodeId> = match stmt {
                Stmt::If {
                    true_target,
                    false_target,
                    ..
                } => vec![*true_target, *false_target],
                Stmt::Switch { cases, default, .. } => {
                    let mut t: Vec<NodeId> = cases.iter().map(|(_, target)| *target).collect();
                    t.push(*default);
                    t
                }
                Stmt::Goto(target) => vec![*target],
                Stmt::Return(_) => vec![exit],
                _ => vec![if i + 1 < n { i + 1 } else { exit }],
            };
            for t in targets {
                succ[i].push(t);
                pred[t].push(i);
            }
        }

        Cfg {
            entry: 0,
            exit,
            nodes,
            succ,
            pred,
        }
    }

    pub fn stmt(&self, n: NodeId) -> &Stmt {
        &self.nodes[n]
    }

    pub fn successors(&self, n: NodeId) -> &[NodeId] {
        &self.succ[n]
    }

    pub fn predecessors(&self, n: NodeId) -> &[NodeId] {
        &self.pred[n]
    }

    /// All statement nodes (excludes the virtual exit sentinel).
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        0..self.nodes.len()
    }

    /// All graph nodes including the virtual exit sentinel — what the
    /// worklist solver (§4.1) needs to initialize `OUT` everywhere.
    pub fn all_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        0..=self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub var: VarId,
    pub ty: Type,
}

/// A method body: its CFG plus everything the analyses need about its
/// signature (§6: "per method: statements in order, parameters, return
/// variables, `this` variable").
#[derive(Debug, Clone)]
pub struct Method {
    pub id: MethodId,
    pub declaring_class: ClassId,
    pub subsignature: Subsignature,
    pub params: Vec<Param>,
    /// `None` for static methods.
    pub this_var: Option<VarId>,
    /// Every variable assigned by a `Return` across the body — ICPI's
    /// return-edge transfer (§4.7) meets over these at the caller.
    pub return_vars: Vec<VarId>,
    pub is_abstract: bool,
    pub var_types: FxHashMap<VarId, Type>,
    pub cfg: Cfg,
}

impl Method {
    pub fn is_static(&self) -> bool {
        self.this_var.is_none()
    }

    pub fn var_type(&self, v: VarId) -> Type {
        self.var_types.get(&v).copied().unwrap_or(Type::Other)
    }

    pub fn can_hold_int(&self, v: VarId) -> bool {
        self.var_type(v).can_hold_int()
    }
}
