//! The interprocedural control-flow graph (§3, §4.7): one method's `Cfg`
//! stitched to every other reachable method's `Cfg` at call sites, via four
//! edge kinds. Nothing here is materialized as an explicit adjacency list
//! beyond the reverse caller index -- everything else is derived on the fly
//! from `Program` and a finished `CallGraph`, the same "graph view over
//! existing data" shape `PointerFlowGraph` uses for its own successors.

use crate::features::call_graph::{CallGraph, CallSite};
use crate::shared::ir::{MethodId, NodeId, Stmt};
use crate::shared::Program;
use rustc_hash::FxHashMap;

/// A statement, addressed across the whole program rather than within one
/// method's `Cfg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IcfgNode {
    pub method: MethodId,
    pub stmt: NodeId,
}

impl IcfgNode {
    pub fn new(method: MethodId, stmt: NodeId) -> Self {
        Self { method, stmt }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Normal,
    Call,
    CallToReturn,
    /// Carries the originating call site, since one callee can be reached
    /// from several call sites and the caller's LHS binding (if any) lives
    /// at that specific site, not at the callee's exit.
    Return(CallSite),
}

#[derive(Debug, Clone, Copy)]
pub struct IcfgEdge {
    pub to: IcfgNode,
    pub kind: EdgeKind,
}

pub struct Icfg {
    callers_of: FxHashMap<MethodId, Vec<CallSite>>,
}

impl Icfg {
    pub fn build(call_graph: &CallGraph) -> Self {
        let mut callers_of: FxHashMap<MethodId, Vec<CallSite>> = FxHashMap::default();
        for site in call_graph.call_sites() {
            for callee in call_graph.edges_from(site) {
                callers_of.entry(callee).or_default().push(site);
            }
        }
        Self { callers_of }
    }

    pub fn entry_node(method: MethodId) -> IcfgNode {
        IcfgNode::new(method, 0)
    }

    pub fn is_exit<P: Program>(program: &P, node: IcfgNode) -> bool {
        node.stmt >= program.method(node.method).cfg.len()
    }

    /// Every ICFG node belonging to a reachable method, including each
    /// method's virtual exit sentinel.
    pub fn nodes<P: Program>(&self, program: &P, call_graph: &CallGraph) -> Vec<IcfgNode> {
        let mut out = Vec::new();
        for method in call_graph.reachable_methods() {
            let cfg = &program.method(method).cfg;
            for stmt in cfg.all_nodes() {
                out.push(IcfgNode::new(method, stmt));
            }
        }
        out
    }

    /// Outgoing ICFG edges from `node`, classified per §4.7.
    pub fn edges_from<P: Program>(
        &self,
        program: &P,
        call_graph: &CallGraph,
        node: IcfgNode,
    ) -> Vec<IcfgEdge> {
        let method = program.method(node.method);
        let cfg = &method.cfg;

        if node.stmt >= cfg.len() {
            let mut out = Vec::new();
            if let Some(sites) = self.callers_of.get(&node.method) {
                for site in sites {
                    let caller_cfg = &program.method(site.caller).cfg;
                    for succ in caller_cfg.successors(site.stmt) {
                        out.push(IcfgEdge {
                            to: IcfgNode::new(site.caller, *succ),
                            kind: EdgeKind::Return(*site),
                        });
                    }
                }
            }
            return out;
        }

        if let Stmt::Invoke { .. } = cfg.stmt(node.stmt) {
            let site = CallSite {
                caller: node.method,
                stmt: node.stmt,
            };
            let mut out: Vec<IcfgEdge> = cfg
                .successors(node.stmt)
                .iter()
                .map(|&s| IcfgEdge {
                    to: IcfgNode::new(node.method, s),
                    kind: EdgeKind::CallToReturn,
                })
                .collect();
            for callee in call_graph.edges_from(site) {
                out.push(IcfgEdge {
                    to: Self::entry_node(callee),
                    kind: EdgeKind::Call,
                });
            }
            return out;
        }

        cfg.successors(node.stmt)
            .iter()
            .map(|&s| IcfgEdge {
                to: IcfgNode::new(node.method, s),
                kind: EdgeKind::Normal,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ir::{
        Cfg, InvokeExpr, InvokeKind, Method, MethodRef, Operand, Param, Subsignature, Type,
    };
    use rustc_hash::FxHashMap as Map;

    fn callee() -> Method {
        let cfg = Cfg::new(vec![Stmt::Return(Some(Operand::Var(0)))]);
        Method {
            id: 1,
            declaring_class: 0,
            subsignature: Subsignature("callee()".into()),
            params: vec![Param { var: 0, ty: Type::Int }],
            this_var: None,
            return_vars: vec![0],
            is_abstract: false,
            var_types: [(0, Type::Int)].into_iter().collect::<Map<_, _>>(),
            cfg,
        }
    }

    fn caller() -> Method {
        let cfg = Cfg::new(vec![
            Stmt::Invoke {
                lhs: Some(1),
                expr: InvokeExpr {
                    kind: InvokeKind::Static,
                    receiver: None,
                    method: MethodRef {
                        declaring_class: 0,
                        subsignature: Subsignature("callee()".into()),
                    },
                    args: vec![Operand::Const(7)],
                },
            },
            Stmt::Return(Some(Operand::Var(1))),
        ]);
        Method {
            id: 0,
            declaring_class: 0,
            subsignature: Subsignature("caller()".into()),
            params: vec![],
            this_var: None,
            return_vars: vec![1],
            is_abstract: false,
            var_types: [(1, Type::Int)].into_iter().collect::<Map<_, _>>(),
            cfg,
        }
    }

    struct FixtureProgram {
        methods: Map<MethodId, Method>,
    }

    impl Program for FixtureProgram {
        fn method(&self, id: MethodId) -> &Method {
            &self.methods[&id]
        }
        fn method_ids(&self) -> &[MethodId] {
            &[]
        }
        fn entry_points(&self) -> &[MethodId] {
            &[]
        }
    }

    #[test]
    fn call_site_produces_call_to_return_and_call_edges() {
        let program = FixtureProgram {
            methods: [(0, caller()), (1, callee())].into_iter().collect(),
        };
        let mut call_graph = CallGraph::new();
        call_graph.mark_reachable(0);
        call_graph.add_edge(CallSite { caller: 0, stmt: 0 }, 1);

        let icfg = Icfg::build(&call_graph);
        let edges = icfg.edges_from(&program, &call_graph, IcfgNode::new(0, 0));
        assert!(edges.iter().any(|e| matches!(e.kind, EdgeKind::CallToReturn) && e.to == IcfgNode::new(0, 1)));
        assert!(edges.iter().any(|e| matches!(e.kind, EdgeKind::Call) && e.to == Icfg::entry_node(1)));
    }

    #[test]
    fn callee_exit_returns_to_the_call_s_successor() {
        let program = FixtureProgram {
            methods: [(0, caller()), (1, callee())].into_iter().collect(),
        };
        let mut call_graph = CallGraph::new();
        call_graph.mark_reachable(0);
        call_graph.add_edge(CallSite { caller: 0, stmt: 0 }, 1);

        let icfg = Icfg::build(&call_graph);
        let callee_exit = IcfgNode::new(1, program.method(1).cfg.len());
        let edges = icfg.edges_from(&program, &call_graph, callee_exit);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to, IcfgNode::new(0, 1));
        assert!(matches!(edges[0].kind, EdgeKind::Return(site) if site.caller == 0 && site.stmt == 0));
    }
}
