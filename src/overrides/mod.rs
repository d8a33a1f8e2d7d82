//! Annotation consistency across override and interface-implementation pairs.
//!
//! A virtual dispatch site only sees the base declaration, so every annotatable slot of
//! an override must carry exactly the capability set its base declares; a weaker
//! override under-delivers to callers of the base, a stronger one demands more than the
//! base promised. [`OverrideConsistencyChecker`] compares the resolved annotations of a
//! (derived, base) pair slot by slot and reports every disagreement.
//!
//! Each mismatch is attributed to the side that is missing the annotation: if exactly
//! one side resolves to no capabilities, that declaration is cited and, when it is
//! source-editable, the diagnostic carries [`SuggestedFix`] metadata naming the
//! capability set to add. When both sides carry conflicting non-empty annotations the
//! base declaration is cited and no fix is suggested.

use crate::{
    annotations::{AnnotationResolver, Slot},
    capability::MemberCapabilities,
    diagnostics::{Diagnostic, DiagnosticId, SuggestedFix},
    symbols::{Location, MethodId, PropertyId, SymbolStore},
};

/// One annotatable slot flattened for comparison.
struct SlotInfo {
    annotation: MemberCapabilities,
    location: Location,
    in_source: bool,
    display: String,
}

/// Pairwise override/implementation consistency checks.
pub struct OverrideConsistencyChecker<'a, S: SymbolStore> {
    annotations: &'a AnnotationResolver<'a, S>,
    store: &'a S,
}

impl<'a, S: SymbolStore> OverrideConsistencyChecker<'a, S> {
    /// Creates a checker sharing the given annotation resolver (and its cache).
    pub fn new(annotations: &'a AnnotationResolver<'a, S>) -> Self {
        Self {
            annotations,
            store: annotations.store(),
        }
    }

    /// Checks one (derived, base) pair: return slot, implicit receiver, parameters by
    /// position, and generic parameters by position.
    ///
    /// The front end supplies the pairs; signature compatibility between the two
    /// methods is its responsibility, and positions only present on one side are
    /// skipped here.
    pub fn check_pair(&self, derived: MethodId, base: MethodId) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let derived_decl = self.store.method(derived);
        let base_decl = self.store.method(base);

        self.compare(
            DiagnosticId::OverrideReturnMismatch,
            self.return_slot(derived),
            self.return_slot(base),
            true,
            &mut diagnostics,
        );

        // No fix metadata for the receiver; the annotation lives on the method
        // declaration itself and carries placement constraints of its own.
        if !derived_decl.is_static && !base_decl.is_static {
            self.compare(
                DiagnosticId::OverrideImplicitThisMismatch,
                self.receiver_slot(derived),
                self.receiver_slot(base),
                false,
                &mut diagnostics,
            );
        }

        let param_count = derived_decl.params.len().min(base_decl.params.len());
        for index in 0..param_count {
            self.compare(
                DiagnosticId::OverrideParameterMismatch,
                self.param_slot(derived, index),
                self.param_slot(base, index),
                true,
                &mut diagnostics,
            );
        }

        for (derived_param, base_param) in derived_decl
            .generic_params
            .iter()
            .zip(&base_decl.generic_params)
        {
            let derived_info = self.generic_slot(*derived_param);
            let base_info = self.generic_slot(*base_param);
            self.compare(
                DiagnosticId::OverrideGenericParameterMismatch,
                derived_info,
                base_info,
                true,
                &mut diagnostics,
            );
        }

        diagnostics
    }

    /// Checks a property against its accessors for conflicting annotations.
    ///
    /// A property annotation is only a fallback; an accessor that also carries its own
    /// explicit annotation on the governed slot (getter return, setter value parameter)
    /// silently shadows the property's, so the combination is reported.
    pub fn check_property_accessors(&self, property: PropertyId) -> Vec<Diagnostic> {
        let decl = self.store.property(property);
        if decl.annotation.is_none() {
            return Vec::new();
        }

        let mut diagnostics = Vec::new();
        if let Some(getter) = decl.getter {
            let method = self.store.method(getter);
            if !method.return_annotation.is_none() {
                diagnostics.push(self.accessor_conflict(getter, property));
            }
        }
        if let Some(setter) = decl.setter {
            let method = self.store.method(setter);
            let value_param_annotated = method
                .params
                .last()
                .is_some_and(|param| !param.annotation.is_none());
            if value_param_annotated {
                diagnostics.push(self.accessor_conflict(setter, property));
            }
        }
        diagnostics
    }

    fn accessor_conflict(&self, accessor: MethodId, property: PropertyId) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::PropertyAccessorConflict,
            self.store.method(accessor).location,
            vec![
                format!("'{}'", self.store.method_display(accessor)),
                format!("'{}'", self.store.property_display(property)),
            ],
        )
    }

    fn compare(
        &self,
        id: DiagnosticId,
        derived: SlotInfo,
        base: SlotInfo,
        allow_fix: bool,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if derived.annotation == base.annotation {
            return;
        }
        let (location, fix) = if derived.annotation.is_none() {
            (
                derived.location,
                Self::fix_for(&derived, base.annotation, allow_fix),
            )
        } else if base.annotation.is_none() {
            (
                base.location,
                Self::fix_for(&base, derived.annotation, allow_fix),
            )
        } else {
            // Both sides are explicit and disagree; the base declaration is the
            // contract callers see, so it is the one cited.
            (base.location, None)
        };

        let mut diagnostic = Diagnostic::new(id, location, vec![derived.display, base.display]);
        diagnostic.fix = fix;
        diagnostics.push(diagnostic);
    }

    fn fix_for(
        missing: &SlotInfo,
        needed: MemberCapabilities,
        allow_fix: bool,
    ) -> Option<SuggestedFix> {
        (allow_fix && missing.in_source).then(|| SuggestedFix {
            location: missing.location,
            capabilities: needed,
        })
    }

    fn return_slot(&self, method: MethodId) -> SlotInfo {
        let decl = self.store.method(method);
        SlotInfo {
            annotation: self.annotations.resolve(Slot::Return(method)),
            location: decl.location,
            in_source: decl.in_source,
            display: format!("return value of '{}'", self.store.method_display(method)),
        }
    }

    fn receiver_slot(&self, method: MethodId) -> SlotInfo {
        let decl = self.store.method(method);
        SlotInfo {
            annotation: self.annotations.resolve(Slot::Receiver(method)),
            location: decl.location,
            in_source: decl.in_source,
            display: format!("implicit 'this' of '{}'", self.store.method_display(method)),
        }
    }

    fn param_slot(&self, method: MethodId, index: usize) -> SlotInfo {
        let decl = self.store.method(method);
        let param = &decl.params[index];
        SlotInfo {
            annotation: self.annotations.resolve(Slot::Param(method, index as u32)),
            location: param.location,
            in_source: decl.in_source,
            display: format!(
                "parameter '{}' of '{}'",
                param.name,
                self.store.method_display(method)
            ),
        }
    }

    fn generic_slot(&self, param: crate::symbols::GenericParamId) -> SlotInfo {
        let decl = self.store.generic_param(param);
        SlotInfo {
            annotation: self.annotations.resolve(Slot::GenericParam(param)),
            location: decl.location,
            in_source: decl.in_source,
            display: format!("generic parameter '{}'", decl.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{
        MethodDecl, MethodKind, ParamDecl, PropertyDecl, SlotType, SymbolTable, TypeDecl, TypeId,
    };

    fn add_type(table: &mut SymbolTable, name: &str) -> TypeId {
        table.add_type(TypeDecl {
            namespace: "App".to_string(),
            name: name.to_string(),
            is_value_type: false,
            is_type_like: false,
            generic_params: Vec::new(),
            location: Location::default(),
        })
    }

    fn method_with_param(
        table: &mut SymbolTable,
        owner: TypeId,
        annotation: MemberCapabilities,
        in_source: bool,
        location: Location,
    ) -> MethodId {
        table.add_method(MethodDecl {
            name: "Load".to_string(),
            owner,
            is_static: false,
            kind: MethodKind::Ordinary,
            params: vec![ParamDecl {
                name: "target".to_string(),
                ty: SlotType::TypeHandle,
                annotation,
                location,
            }],
            generic_params: Vec::new(),
            return_ty: SlotType::Void,
            return_annotation: MemberCapabilities::NONE,
            receiver_annotation: MemberCapabilities::NONE,
            suppressed: false,
            in_source,
            location: Location::default(),
        })
    }

    #[test]
    fn test_matching_annotations_are_clean() {
        let mut table = SymbolTable::new();
        let base_ty = add_type(&mut table, "Base");
        let derived_ty = add_type(&mut table, "Derived");
        let caps = MemberCapabilities::PUBLIC_METHODS;
        let base = method_with_param(&mut table, base_ty, caps, true, Location(1));
        let derived = method_with_param(&mut table, derived_ty, caps, true, Location(2));

        let annotations = AnnotationResolver::new(&table);
        let checker = OverrideConsistencyChecker::new(&annotations);
        assert!(checker.check_pair(derived, base).is_empty());
    }

    #[test]
    fn test_unannotated_override_is_cited_with_fix() {
        let mut table = SymbolTable::new();
        let base_ty = add_type(&mut table, "Base");
        let derived_ty = add_type(&mut table, "Derived");
        let base = method_with_param(
            &mut table,
            base_ty,
            MemberCapabilities::PUBLIC_METHODS,
            true,
            Location(1),
        );
        let derived =
            method_with_param(&mut table, derived_ty, MemberCapabilities::NONE, true, Location(2));

        let annotations = AnnotationResolver::new(&table);
        let checker = OverrideConsistencyChecker::new(&annotations);
        let diagnostics = checker.check_pair(derived, base);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, DiagnosticId::OverrideParameterMismatch);
        assert_eq!(diagnostics[0].location, Location(2));
        let fix = diagnostics[0].fix.as_ref().unwrap();
        assert_eq!(fix.location, Location(2));
        assert_eq!(fix.capabilities, MemberCapabilities::PUBLIC_METHODS);
    }

    #[test]
    fn test_unannotated_base_is_cited() {
        let mut table = SymbolTable::new();
        let base_ty = add_type(&mut table, "Base");
        let derived_ty = add_type(&mut table, "Derived");
        let base =
            method_with_param(&mut table, base_ty, MemberCapabilities::NONE, true, Location(1));
        let derived = method_with_param(
            &mut table,
            derived_ty,
            MemberCapabilities::PUBLIC_METHODS,
            true,
            Location(2),
        );

        let annotations = AnnotationResolver::new(&table);
        let checker = OverrideConsistencyChecker::new(&annotations);
        let diagnostics = checker.check_pair(derived, base);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].location, Location(1));
        assert!(diagnostics[0].fix.is_some());
    }

    #[test]
    fn test_missing_side_outside_source_gets_no_fix() {
        let mut table = SymbolTable::new();
        let base_ty = add_type(&mut table, "Base");
        let derived_ty = add_type(&mut table, "Derived");
        let base = method_with_param(
            &mut table,
            base_ty,
            MemberCapabilities::PUBLIC_METHODS,
            true,
            Location(1),
        );
        let derived =
            method_with_param(&mut table, derived_ty, MemberCapabilities::NONE, false, Location(2));

        let annotations = AnnotationResolver::new(&table);
        let checker = OverrideConsistencyChecker::new(&annotations);
        let diagnostics = checker.check_pair(derived, base);

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].fix.is_none());
    }

    #[test]
    fn test_conflicting_annotations_cite_base_without_fix() {
        let mut table = SymbolTable::new();
        let base_ty = add_type(&mut table, "Base");
        let derived_ty = add_type(&mut table, "Derived");
        let base = method_with_param(
            &mut table,
            base_ty,
            MemberCapabilities::PUBLIC_METHODS,
            true,
            Location(1),
        );
        let derived = method_with_param(
            &mut table,
            derived_ty,
            MemberCapabilities::PUBLIC_FIELDS,
            true,
            Location(2),
        );

        let annotations = AnnotationResolver::new(&table);
        let checker = OverrideConsistencyChecker::new(&annotations);
        let diagnostics = checker.check_pair(derived, base);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].location, Location(1));
        assert!(diagnostics[0].fix.is_none());
    }

    #[test]
    fn test_property_accessor_conflict() {
        let mut table = SymbolTable::new();
        let owner = add_type(&mut table, "Holder");
        let property = table.add_property(PropertyDecl {
            name: "Target".to_string(),
            owner,
            ty: SlotType::TypeHandle,
            annotation: MemberCapabilities::PUBLIC_METHODS,
            getter: None,
            setter: None,
            location: Location::default(),
        });
        let getter = table.add_method(MethodDecl {
            name: "get_Target".to_string(),
            owner,
            is_static: false,
            kind: MethodKind::PropertyGet(property),
            params: Vec::new(),
            generic_params: Vec::new(),
            return_ty: SlotType::TypeHandle,
            return_annotation: MemberCapabilities::PUBLIC_FIELDS,
            receiver_annotation: MemberCapabilities::NONE,
            suppressed: false,
            in_source: true,
            location: Location(5),
        });
        table.link_property(property, Some(getter), None);

        let annotations = AnnotationResolver::new(&table);
        let checker = OverrideConsistencyChecker::new(&annotations);
        let diagnostics = checker.check_property_accessors(property);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, DiagnosticId::PropertyAccessorConflict);
        assert_eq!(diagnostics[0].location, Location(5));
    }

    #[test]
    fn test_unannotated_property_never_conflicts() {
        let mut table = SymbolTable::new();
        let owner = add_type(&mut table, "Holder");
        let property = table.add_property(PropertyDecl {
            name: "Target".to_string(),
            owner,
            ty: SlotType::TypeHandle,
            annotation: MemberCapabilities::NONE,
            getter: None,
            setter: None,
            location: Location::default(),
        });

        let annotations = AnnotationResolver::new(&table);
        let checker = OverrideConsistencyChecker::new(&annotations);
        assert!(checker.check_property_accessors(property).is_empty());
    }
}
