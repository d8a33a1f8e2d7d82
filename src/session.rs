//! One analysis run over one symbol store.
//!
//! [`AnalysisSession`] is the crate's entry point. It owns the annotation resolver and
//! its memo cache, so every check performed through the session shares resolved
//! capability sets. Sessions are cheap to create and tied to one store; a new or
//! mutated program gets a new session.
//!
//! The per-body operations are independent of each other, which is what
//! [`AnalysisSession::analyze_all`] exploits: bodies are analyzed in parallel and the
//! combined report is deterministic regardless of scheduling.
//!
//! # Key Types
//!
//! - [`AnalysisSession`] - the facade over resolver, flow engine, and checkers
//! - [`SessionReport`] - aggregated diagnostics plus isolated per-body failures

use rayon::prelude::*;

use crate::{
    annotations::{AnnotationResolver, Slot},
    capability::MemberCapabilities,
    diagnostics::Diagnostic,
    flow::{Body, FlowEngine},
    overrides::OverrideConsistencyChecker,
    symbols::{MethodId, PropertyId, SymbolStore},
    Error, Result,
};

/// Outcome of analyzing a batch of bodies.
///
/// A malformed body never poisons its siblings: its error is recorded here and every
/// other body's diagnostics are still produced.
#[derive(Debug, Default)]
pub struct SessionReport {
    /// All diagnostics, ordered by method handle, then by checkpoint order within
    /// each body
    pub diagnostics: Vec<Diagnostic>,
    /// Bodies that could not be analyzed, with the error each one produced
    pub failures: Vec<(MethodId, Error)>,
}

/// A single analysis run over one [`SymbolStore`].
pub struct AnalysisSession<'a, S: SymbolStore> {
    annotations: AnnotationResolver<'a, S>,
}

impl<'a, S: SymbolStore> AnalysisSession<'a, S> {
    /// Creates a session over the given store with an empty resolution cache.
    pub fn new(store: &'a S) -> Self {
        Self {
            annotations: AnnotationResolver::new(store),
        }
    }

    /// The store this session analyzes.
    pub fn store(&self) -> &'a S {
        self.annotations.store()
    }

    /// Resolves the capability set of a declaration slot, honoring the
    /// accessor/property precedence rules. Results are memoized for the session.
    pub fn resolve_requirement(&self, slot: Slot) -> MemberCapabilities {
        self.annotations.resolve(slot)
    }

    /// Reports every annotation sitting on a declaration slot that cannot carry a
    /// reflection target, once per offending declaration.
    #[must_use]
    pub fn validate_placements(&self) -> Vec<Diagnostic> {
        self.annotations.validate_placements()
    }

    /// Analyzes one lowered body to fixpoint and reports its checkpoint violations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if the body references blocks, locals, or
    /// parameter slots outside its declared ranges.
    pub fn analyze_body(&self, body: &Body) -> Result<Vec<Diagnostic>> {
        FlowEngine::new(&self.annotations).analyze(body)
    }

    /// Checks annotation consistency of one override / interface-implementation pair.
    #[must_use]
    pub fn check_override_pair(&self, derived: MethodId, base: MethodId) -> Vec<Diagnostic> {
        OverrideConsistencyChecker::new(&self.annotations).check_pair(derived, base)
    }

    /// Checks a property against its accessors for conflicting annotations.
    #[must_use]
    pub fn check_property_accessors(&self, property: PropertyId) -> Vec<Diagnostic> {
        OverrideConsistencyChecker::new(&self.annotations).check_property_accessors(property)
    }

    /// Analyzes every body in parallel and aggregates one deterministic report.
    ///
    /// Results are ordered by method handle, independent of scheduling; a failing body
    /// is isolated into [`SessionReport::failures`].
    #[must_use]
    pub fn analyze_all(&self, bodies: &[Body]) -> SessionReport
    where
        S: Sync,
    {
        let mut outcomes: Vec<(MethodId, Result<Vec<Diagnostic>>)> = bodies
            .par_iter()
            .map(|body| (body.method, self.analyze_body(body)))
            .collect();
        outcomes.sort_by_key(|(method, _)| *method);

        let mut report = SessionReport::default();
        for (method, outcome) in outcomes {
            match outcome {
                Ok(diagnostics) => report.diagnostics.extend(diagnostics),
                Err(error) => report.failures.push((method, error)),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diagnostics::DiagnosticId,
        flow::{Block, CallSite, Expr, Operation, Statement},
        symbols::{
            FieldDecl, Location, MethodDecl, MethodKind, ParamDecl, SlotType, SymbolTable,
            TypeDecl,
        },
    };

    fn build_store() -> (SymbolTable, MethodId, MethodId, crate::symbols::FieldId) {
        let mut table = SymbolTable::new();
        let holder = table.add_type(TypeDecl {
            namespace: "App".to_string(),
            name: "Holder".to_string(),
            is_value_type: false,
            is_type_like: false,
            generic_params: Vec::new(),
            location: Location::default(),
        });
        let field = table.add_field(FieldDecl {
            name: "_source".to_string(),
            owner: holder,
            ty: SlotType::TypeHandle,
            annotation: MemberCapabilities::NONE,
            location: Location::default(),
        });
        let callee = table.add_method(MethodDecl {
            name: "NeedsMethods".to_string(),
            owner: holder,
            is_static: true,
            kind: MethodKind::Ordinary,
            params: vec![ParamDecl {
                name: "target".to_string(),
                ty: SlotType::TypeHandle,
                annotation: MemberCapabilities::PUBLIC_METHODS,
                location: Location::default(),
            }],
            generic_params: Vec::new(),
            return_ty: SlotType::Void,
            return_annotation: MemberCapabilities::NONE,
            receiver_annotation: MemberCapabilities::NONE,
            suppressed: false,
            in_source: true,
            location: Location::default(),
        });
        let caller = table.add_method(MethodDecl {
            name: "Run".to_string(),
            owner: holder,
            is_static: true,
            kind: MethodKind::Ordinary,
            params: Vec::new(),
            generic_params: Vec::new(),
            return_ty: SlotType::Void,
            return_annotation: MemberCapabilities::NONE,
            receiver_annotation: MemberCapabilities::NONE,
            suppressed: false,
            in_source: true,
            location: Location::default(),
        });
        (table, callee, caller, field)
    }

    fn offending_body(method: MethodId, callee: MethodId, field: crate::symbols::FieldId) -> Body {
        Body {
            method,
            locals: 0,
            blocks: vec![Block {
                statements: vec![Statement {
                    op: Operation::Call(CallSite {
                        callee: Some(callee),
                        receiver: None,
                        args: vec![Expr::LoadField(Some(field))],
                    }),
                    location: Location(3),
                }],
                successors: Vec::new(),
            }],
        }
    }

    #[test]
    fn test_analyze_all_isolates_malformed_bodies() {
        let (table, callee, caller, field) = build_store();
        let session = AnalysisSession::new(&table);

        let good = offending_body(caller, callee, field);
        let bad = Body {
            method: callee,
            locals: 0,
            blocks: vec![Block {
                statements: Vec::new(),
                successors: vec![42],
            }],
        };

        let report = session.analyze_all(&[good, bad]);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(
            report.diagnostics[0].id,
            DiagnosticId::MismatchFieldTargetsParameter
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, callee);
    }

    #[test]
    fn test_analyze_all_isolates_unresolved_handles() {
        let (table, callee, caller, field) = build_store();
        let session = AnalysisSession::new(&table);

        let good = offending_body(caller, callee, field);
        // A body referencing a method handle the table never produced.
        let bad = offending_body(callee, MethodId(999), field);

        let report = session.analyze_all(&[good, bad]);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, callee);
        assert!(matches!(
            report.failures[0].1,
            crate::Error::SymbolNotFound(_)
        ));
    }

    #[test]
    fn test_analyze_all_matches_sequential_results() {
        let (table, callee, caller, field) = build_store();
        let session = AnalysisSession::new(&table);
        let body = offending_body(caller, callee, field);

        let sequential = session.analyze_body(&body).unwrap();
        let report = session.analyze_all(std::slice::from_ref(&body));
        assert_eq!(report.diagnostics, sequential);
        assert!(report.failures.is_empty());
    }
}
