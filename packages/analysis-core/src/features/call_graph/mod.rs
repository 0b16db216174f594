//! C7: CHA call-graph construction.

pub mod cha;
pub mod graph;

pub use cha::build;
pub use graph::{CallGraph, CallSite};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ir::{
        Cfg, InvokeExpr, InvokeKind, Method, MethodRef, Param, Stmt, Subsignature, Type,
    };
    use crate::shared::{ClassHierarchy, Program};
    use rustc_hash::FxHashMap;

    /// Minimal in-memory `Program`/`ClassHierarchy` for exercising CHA:
    ///
    /// ```text
    /// interface Shape { area() }
    /// class Circle implements Shape { area() }
    /// class Square implements Shape { area() }
    /// class Main { main() { Shape s = ...; s.area(); } }
    /// ```
    struct FixtureProgram {
        methods: FxHashMap<u32, Method>,
        ids: Vec<u32>,
        entries: Vec<u32>,
    }

    impl Program for FixtureProgram {
        fn method(&self, id: u32) -> &Method {
            &self.methods[&id]
        }
        fn method_ids(&self) -> &[u32] {
            &self.ids
        }
        fn entry_points(&self) -> &[u32] {
            &self.entries
        }
    }

    struct FixtureHierarchy;

    const SHAPE: u32 = 0;
    const CIRCLE: u32 = 1;
    const SQUARE: u32 = 2;
    const MAIN: u32 = 3;

    const AREA_CIRCLE: u32 = 10;
    const AREA_SQUARE: u32 = 11;
    const MAIN_M: u32 = 12;

    impl ClassHierarchy for FixtureHierarchy {
        fn declared_methods(&self, class: u32) -> &[u32] {
            match class {
                CIRCLE => &[AREA_CIRCLE],
                SQUARE => &[AREA_SQUARE],
                MAIN => &[MAIN_M],
                _ => &[],
            }
        }
        fn superclass(&self, _class: u32) -> Option<u32> {
            None
        }
        fn direct_interfaces(&self, class: u32) -> &[u32] {
            match class {
                CIRCLE | SQUARE => &[SHAPE],
                _ => &[],
            }
        }
        fn direct_subclasses(&self, _class: u32) -> &[u32] {
            &[]
        }
        fn direct_subinterfaces(&self, _class: u32) -> &[u32] {
            &[]
        }
        fn direct_implementors(&self, class: u32) -> &[u32] {
            match class {
                SHAPE => &[CIRCLE, SQUARE],
                _ => &[],
            }
        }
        fn is_interface(&self, class: u32) -> bool {
            class == SHAPE
        }
        fn is_abstract(&self, _class: u32) -> bool {
            false
        }
        fn resolve_declared(&self, class: u32, sig: &Subsignature) -> Option<MethodRef> {
            self.dispatch(class, sig).map(|_| MethodRef {
                declaring_class: class,
                subsignature: sig.clone(),
            })
        }
        fn dispatch(&self, class: u32, sig: &Subsignature) -> Option<u32> {
            match (class, sig.0.as_str()) {
                (CIRCLE, "area()") => Some(AREA_CIRCLE),
                (SQUARE, "area()") => Some(AREA_SQUARE),
                (MAIN, "main()") => Some(MAIN_M),
                _ => None,
            }
        }
    }

    fn empty_method(id: u32, declaring_class: u32, sig: &str, body: Vec<Stmt>) -> Method {
        Method {
            id,
            declaring_class,
            subsignature: Subsignature(sig.into()),
            params: vec![Param { var: 0, ty: Type::Other }],
            this_var: Some(0),
            return_vars: vec![],
            is_abstract: false,
            var_types: FxHashMap::default(),
            cfg: Cfg::new(body),
        }
    }

    #[test]
    fn virtual_call_on_an_interface_type_resolves_every_implementor() {
        let main_body = vec![
            Stmt::Invoke {
                lhs: None,
                expr: InvokeExpr {
                    kind: InvokeKind::Interface,
                    receiver: Some(1),
                    method: MethodRef {
                        declaring_class: SHAPE,
                        subsignature: Subsignature("area()".into()),
                    },
                    args: vec![],
                },
            },
            Stmt::Return(None),
        ];
        let mut methods = FxHashMap::default();
        methods.insert(MAIN_M, empty_method(MAIN_M, MAIN, "main()", main_body));
        methods.insert(AREA_CIRCLE, empty_method(AREA_CIRCLE, CIRCLE, "area()", vec![Stmt::Return(None)]));
        methods.insert(AREA_SQUARE, empty_method(AREA_SQUARE, SQUARE, "area()", vec![Stmt::Return(None)]));

        let program = FixtureProgram {
            methods,
            ids: vec![MAIN_M, AREA_CIRCLE, AREA_SQUARE],
            entries: vec![MAIN_M],
        };

        let graph = build(&program, &FixtureHierarchy);
        let site = CallSite { caller: MAIN_M, stmt: 0 };
        let mut callees: Vec<u32> = graph.edges_from(site).collect();
        callees.sort_unstable();
        assert_eq!(callees, vec![AREA_CIRCLE, AREA_SQUARE]);
        assert!(graph.is_reachable(AREA_CIRCLE));
        assert!(graph.is_reachable(AREA_SQUARE));
    }

    /// `A <- B <- D`, each overriding `m()`. A call with static type `A`
    /// must resolve only `A.m`/`B.m` (direct subclass), never `D.m` --
    /// CHA's one-level rule, not the transitive subtype cone.
    struct ThreeLevelHierarchy;

    const CLASS_A: u32 = 20;
    const CLASS_B: u32 = 21;
    const CLASS_D: u32 = 22;
    const CALLER: u32 = 23;

    const METHOD_A_M: u32 = 30;
    const METHOD_B_M: u32 = 31;
    const METHOD_D_M: u32 = 32;
    const METHOD_CALLER: u32 = 33;

    impl ClassHierarchy for ThreeLevelHierarchy {
        fn declared_methods(&self, _class: u32) -> &[u32] {
            &[]
        }
        fn superclass(&self, class: u32) -> Option<u32> {
            match class {
                CLASS_B => Some(CLASS_A),
                CLASS_D => Some(CLASS_B),
                _ => None,
            }
        }
        fn direct_interfaces(&self, _class: u32) -> &[u32] {
            &[]
        }
        fn direct_subclasses(&self, class: u32) -> &[u32] {
            match class {
                CLASS_A => &[CLASS_B],
                CLASS_B => &[CLASS_D],
                _ => &[],
            }
        }
        fn direct_subinterfaces(&self, _class: u32) -> &[u32] {
            &[]
        }
        fn direct_implementors(&self, _class: u32) -> &[u32] {
            &[]
        }
        fn is_interface(&self, _class: u32) -> bool {
            false
        }
        fn is_abstract(&self, _class: u32) -> bool {
            false
        }
        fn resolve_declared(&self, class: u32, sig: &Subsignature) -> Option<MethodRef> {
            self.dispatch(class, sig).map(|_| MethodRef {
                declaring_class: class,
                subsignature: sig.clone(),
            })
        }
        fn dispatch(&self, class: u32, sig: &Subsignature) -> Option<u32> {
            match (class, sig.0.as_str()) {
                (CLASS_A, "m()") => Some(METHOD_A_M),
                (CLASS_B, "m()") => Some(METHOD_B_M),
                (CLASS_D, "m()") => Some(METHOD_D_M),
                (CALLER, "caller()") => Some(METHOD_CALLER),
                _ => None,
            }
        }
    }

    #[test]
    fn virtual_dispatch_does_not_walk_past_direct_subclasses() {
        let caller_body = vec![
            Stmt::Invoke {
                lhs: None,
                expr: InvokeExpr {
                    kind: InvokeKind::Virtual,
                    receiver: Some(1),
                    method: MethodRef {
                        declaring_class: CLASS_A,
                        subsignature: Subsignature("m()".into()),
                    },
                    args: vec![],
                },
            },
            Stmt::Return(None),
        ];
        let mut methods = FxHashMap::default();
        methods.insert(
            METHOD_CALLER,
            empty_method(METHOD_CALLER, CALLER, "caller()", caller_body),
        );
        methods.insert(METHOD_A_M, empty_method(METHOD_A_M, CLASS_A, "m()", vec![Stmt::Return(None)]));
        methods.insert(METHOD_B_M, empty_method(METHOD_B_M, CLASS_B, "m()", vec![Stmt::Return(None)]));
        methods.insert(METHOD_D_M, empty_method(METHOD_D_M, CLASS_D, "m()", vec![Stmt::Return(None)]));

        let program = FixtureProgram {
            methods,
            ids: vec![METHOD_CALLER, METHOD_A_M, METHOD_B_M, METHOD_D_M],
            entries: vec![METHOD_CALLER],
        };

        let graph = build(&program, &ThreeLevelHierarchy);
        let site = CallSite { caller: METHOD_CALLER, stmt: 0 };
        let mut callees: Vec<u32> = graph.edges_from(site).collect();
        callees.sort_unstable();
        assert_eq!(callees, vec![METHOD_A_M, METHOD_B_M]);
        assert!(!graph.is_reachable(METHOD_D_M));
    }
}
