//! Capability-requirement resolution for declaration slots.
//!
//! The [`AnnotationResolver`] answers "what capability set does this slot require or
//! guarantee", applying the precedence rules between related declarations:
//!
//! - a property getter's unannotated return slot inherits the property's annotation,
//!   but the getter's own explicit annotation always wins;
//! - a property setter's unannotated value parameter (the last parameter, which also
//!   covers indexer setters) inherits the property's annotation, with the same
//!   explicit-wins rule;
//! - the implicit receiver reads the annotation placed on the method itself.
//!
//! Resolution is a pure function of static declarations, so results are memoized in a
//! thread-safe map owned by the resolver; racing the first resolution of a slot is
//! harmless. The resolver lives exactly as long as one analysis session, never across
//! runs.

use dashmap::DashMap;

use crate::{
    capability::MemberCapabilities,
    diagnostics::{Diagnostic, DiagnosticId},
    symbols::{FieldId, GenericParamId, MethodId, MethodKind, SymbolStore},
};

/// An annotatable slot on a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// A declared parameter of a method, by zero-based position
    Param(MethodId, u32),
    /// The implicit receiver of an instance method
    Receiver(MethodId),
    /// The return slot of a method
    Return(MethodId),
    /// A field
    Field(FieldId),
    /// A generic parameter of a type or method
    GenericParam(GenericParamId),
}

/// Resolves and memoizes the required capability set of declaration slots.
pub struct AnnotationResolver<'a, S: SymbolStore> {
    store: &'a S,
    cache: DashMap<Slot, MemberCapabilities>,
}

impl<'a, S: SymbolStore> AnnotationResolver<'a, S> {
    /// Creates a resolver over the given store with an empty cache.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            cache: DashMap::new(),
        }
    }

    /// The store this resolver reads from.
    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Resolves the capability set of a slot, honoring accessor/property precedence.
    ///
    /// An empty result means "no requirement"; callers short-circuit on it and never
    /// invoke the requirement check for such slots.
    pub fn resolve(&self, slot: Slot) -> MemberCapabilities {
        if let Some(cached) = self.cache.get(&slot) {
            return *cached;
        }
        let resolved = self.resolve_uncached(slot);
        self.cache.insert(slot, resolved);
        resolved
    }

    fn resolve_uncached(&self, slot: Slot) -> MemberCapabilities {
        match slot {
            Slot::Receiver(id) => self.store.method(id).receiver_annotation,
            Slot::Param(id, index) => {
                let method = self.store.method(id);
                let Some(param) = method.params.get(index as usize) else {
                    debug_assert!(false, "parameter index out of range");
                    return MemberCapabilities::NONE;
                };
                let annotation = param.annotation;
                // The setter's own annotation wins over the property's; only the
                // synthesized value parameter (last position, which skips indexer
                // keys) falls back.
                if annotation.is_none() {
                    if let MethodKind::PropertySet(property) = method.kind {
                        if index as usize + 1 == method.params.len() {
                            return self.store.property(property).annotation;
                        }
                    }
                }
                annotation
            }
            Slot::Return(id) => {
                let method = self.store.method(id);
                let annotation = method.return_annotation;
                if annotation.is_none() {
                    if let MethodKind::PropertyGet(property) = method.kind {
                        return self.store.property(property).annotation;
                    }
                }
                annotation
            }
            Slot::Field(id) => self.store.field(id).annotation,
            Slot::GenericParam(id) => self.store.generic_param(id).annotation,
        }
    }

    /// Validates annotation placement across the whole store.
    ///
    /// Annotations may only appear on slots whose declared type can carry a reflection
    /// target (type handles and type-naming strings) and, for the implicit receiver, on
    /// methods of such types. Each offending declaration is reported exactly once,
    /// independent of any flow use, and is afterwards treated as unannotated.
    pub fn validate_placements(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for id in self.store.field_ids() {
            let field = self.store.field(id);
            if !field.annotation.is_none() && !field.ty.is_type_like() {
                diagnostics.push(Diagnostic::new(
                    DiagnosticId::InvalidAnnotationPlacement,
                    field.location,
                    vec![self.store.field_display(id)],
                ));
            }
        }

        for id in self.store.property_ids() {
            let property = self.store.property(id);
            if !property.annotation.is_none() && !property.ty.is_type_like() {
                diagnostics.push(Diagnostic::new(
                    DiagnosticId::InvalidAnnotationPlacement,
                    property.location,
                    vec![self.store.property_display(id)],
                ));
            }
        }

        for id in self.store.method_ids() {
            let method = self.store.method(id);
            if !method.return_annotation.is_none() && !method.return_ty.is_type_like() {
                diagnostics.push(Diagnostic::new(
                    DiagnosticId::InvalidAnnotationPlacement,
                    method.location,
                    vec![self.store.method_display(id)],
                ));
            }
            if !method.receiver_annotation.is_none()
                && !self.store.type_decl(method.owner).is_type_like
            {
                diagnostics.push(Diagnostic::new(
                    DiagnosticId::InvalidAnnotationPlacement,
                    method.location,
                    vec![self.store.method_display(id)],
                ));
            }
            for param in &method.params {
                if !param.annotation.is_none() && !param.ty.is_type_like() {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticId::InvalidAnnotationPlacement,
                        param.location,
                        vec![param.name.clone(), self.store.method_display(id)],
                    ));
                }
            }
        }

        diagnostics
    }
}
