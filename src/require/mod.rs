//! Compatibility checking of flowed values against capability requirements.
//!
//! [`RequireAction`] decides, per alternative of a [`MultiValue`], whether the value is
//! guaranteed to keep the required member categories alive through trimming:
//!
//! - a statically known type always satisfies (the trimmer can keep everything on it);
//! - a value of unknown provenance never satisfies a non-empty requirement;
//! - an annotated value (parameter, return, field, generic parameter) satisfies iff its
//!   own capability set is a flag-superset of the requirement;
//! - a nullable projection defers to the wrapped value.
//!
//! Each unsatisfied alternative yields exactly one diagnostic: annotated sources select
//! from the 5×5 mismatch matrix, unknown sources from the per-target unresolvable
//! family. Callers short-circuit on empty requirements and never invoke the check for
//! them.

use crate::{
    capability::MemberCapabilities,
    diagnostics::{Diagnostic, DiagnosticId, SourceKind, TargetKind},
    symbols::{Location, SymbolStore},
    value::{MultiValue, ParamSlot, SingleValue},
};

/// A resolved requirement at a checkpoint: what is required, what kind of declaration
/// requires it, and how to name that declaration in diagnostics.
#[derive(Debug, Clone)]
pub struct Requirement {
    /// The required capability set, never empty at a checkpoint
    pub capabilities: MemberCapabilities,
    /// What kind of declaration the requirement is attached to
    pub kind: TargetKind,
    /// Display name of the requiring declaration
    pub display: String,
    /// Location reported for diagnostics at this checkpoint
    pub location: Location,
}

/// How one alternative relates to a requirement.
enum Satisfaction {
    /// Satisfies any requirement
    Always,
    /// Carries these capabilities with this source kind
    Annotated(MemberCapabilities, SourceKind),
    /// Provenance unknown, cannot satisfy
    Unresolvable,
}

/// The compatibility/diagnosis check applied at every requirement checkpoint.
pub struct RequireAction<'a, S: SymbolStore> {
    store: &'a S,
}

impl<'a, S: SymbolStore> RequireAction<'a, S> {
    /// Creates the action over the given store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Checks every alternative of `source` against the requirement, returning one
    /// diagnostic per unsatisfied alternative.
    pub fn check(&self, source: &MultiValue, requirement: &Requirement) -> Vec<Diagnostic> {
        debug_assert!(
            !requirement.capabilities.is_none(),
            "empty requirements must be short-circuited before the check"
        );

        let mut diagnostics = Vec::new();
        for value in source.iter() {
            match Self::classify(value) {
                Satisfaction::Always => {}
                Satisfaction::Annotated(capabilities, _)
                    if capabilities.satisfies(requirement.capabilities) => {}
                Satisfaction::Annotated(_, source_kind) => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticId::mismatch(source_kind, requirement.kind),
                        requirement.location,
                        vec![value.display(self.store), requirement.display.clone()],
                    ));
                }
                Satisfaction::Unresolvable => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticId::unresolvable(requirement.kind),
                        requirement.location,
                        vec![requirement.display.clone()],
                    ));
                }
            }
        }
        diagnostics
    }

    /// Maps a value to its satisfaction rule. The nullable wrapper contributes no
    /// capability of its own and defers to the wrapped value.
    fn classify(value: &SingleValue) -> Satisfaction {
        match value {
            SingleValue::ConcreteType(_) => Satisfaction::Always,
            SingleValue::Unknown => Satisfaction::Unresolvable,
            SingleValue::MethodReturn { capabilities, .. } => {
                Satisfaction::Annotated(*capabilities, SourceKind::MethodReturn)
            }
            SingleValue::MethodParameter {
                slot: ParamSlot::This,
                capabilities,
                ..
            } => Satisfaction::Annotated(*capabilities, SourceKind::ThisParameter),
            SingleValue::MethodParameter { capabilities, .. } => {
                Satisfaction::Annotated(*capabilities, SourceKind::Parameter)
            }
            SingleValue::GenericParameter { capabilities, .. } => {
                Satisfaction::Annotated(*capabilities, SourceKind::TypeArgument)
            }
            SingleValue::Field { capabilities, .. } => {
                Satisfaction::Annotated(*capabilities, SourceKind::Field)
            }
            SingleValue::NullableWrapped(inner) => Self::classify(inner),
        }
    }
}
