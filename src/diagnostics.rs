//! Diagnostic identities and records produced by the analysis.
//!
//! Diagnostics are opaque to the core: an identity, a location handle, and ordered
//! string arguments. Rendering them to user-facing text and deciding severity is the
//! caller's responsibility.
//!
//! The capability-mismatch family is keyed by a fixed 5×5 matrix of
//! ([`SourceKind`], [`TargetKind`]) pairs; every pair maps to exactly one identity and
//! the mapping is total (see [`DiagnosticId::mismatch`]). Values whose provenance could
//! not be determined select from a separate per-target "cannot be statically resolved"
//! family instead ([`DiagnosticId::unresolvable`]).

use strum::{Display, EnumIter};

use crate::{capability::MemberCapabilities, symbols::Location};

/// Where a flowed value came from, for diagnostic selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum SourceKind {
    /// A formal method parameter
    Parameter,
    /// A method call's return value
    MethodReturn,
    /// A field load
    Field,
    /// The implicit receiver of an instance method
    ThisParameter,
    /// A type argument of a generic instantiation
    TypeArgument,
}

/// What an annotated requirement is attached to, for diagnostic selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TargetKind {
    /// A formal method parameter
    Parameter,
    /// A method's return slot
    MethodReturn,
    /// A field
    Field,
    /// The implicit receiver of an instance method
    ThisParameter,
    /// A generic parameter of a type or method
    GenericParameter,
}

/// Stable identity of a diagnostic.
///
/// Numeric codes are exposed through [`DiagnosticId::code`] and rendered as `TRIMxxxx`
/// by the `Display` of [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[allow(missing_docs)] // variant names are the documentation; see the family docs above
pub enum DiagnosticId {
    // Annotation placement errors, reported once per offending declaration.
    InvalidAnnotationPlacement,

    // A flowed value's provenance could not be determined, keyed by target kind.
    ParameterValueUnresolvable,
    MethodReturnValueUnresolvable,
    FieldValueUnresolvable,
    ImplicitThisValueUnresolvable,
    TypeArgumentUnresolvable,

    // The 5x5 capability mismatch matrix, source kind x target kind.
    MismatchParameterTargetsParameter,
    MismatchParameterTargetsMethodReturn,
    MismatchParameterTargetsField,
    MismatchParameterTargetsThisParameter,
    MismatchParameterTargetsGenericParameter,
    MismatchMethodReturnTargetsParameter,
    MismatchMethodReturnTargetsMethodReturn,
    MismatchMethodReturnTargetsField,
    MismatchMethodReturnTargetsThisParameter,
    MismatchMethodReturnTargetsGenericParameter,
    MismatchFieldTargetsParameter,
    MismatchFieldTargetsMethodReturn,
    MismatchFieldTargetsField,
    MismatchFieldTargetsThisParameter,
    MismatchFieldTargetsGenericParameter,
    MismatchThisParameterTargetsParameter,
    MismatchThisParameterTargetsMethodReturn,
    MismatchThisParameterTargetsField,
    MismatchThisParameterTargetsThisParameter,
    MismatchThisParameterTargetsGenericParameter,
    MismatchTypeArgumentTargetsParameter,
    MismatchTypeArgumentTargetsMethodReturn,
    MismatchTypeArgumentTargetsField,
    MismatchTypeArgumentTargetsThisParameter,
    MismatchTypeArgumentTargetsGenericParameter,

    // Generic instantiation through reflection whose arguments are not statically known.
    MakeGenericTypeUnverifiable,
    MakeGenericMethodUnverifiable,

    // Override / interface-implementation annotation consistency.
    OverrideParameterMismatch,
    OverrideReturnMismatch,
    OverrideImplicitThisMismatch,
    OverrideGenericParameterMismatch,
    PropertyAccessorConflict,
}

impl DiagnosticId {
    /// Selects the mismatch diagnostic for a (source, target) pair.
    ///
    /// The mapping is total and injective over the 25 pairs; both properties are
    /// enforced by tests iterating the full matrix.
    #[must_use]
    pub fn mismatch(source: SourceKind, target: TargetKind) -> Self {
        use DiagnosticId as D;
        use SourceKind as S;
        use TargetKind as T;
        match (source, target) {
            (S::Parameter, T::Parameter) => D::MismatchParameterTargetsParameter,
            (S::Parameter, T::MethodReturn) => D::MismatchParameterTargetsMethodReturn,
            (S::Parameter, T::Field) => D::MismatchParameterTargetsField,
            (S::Parameter, T::ThisParameter) => D::MismatchParameterTargetsThisParameter,
            (S::Parameter, T::GenericParameter) => D::MismatchParameterTargetsGenericParameter,
            (S::MethodReturn, T::Parameter) => D::MismatchMethodReturnTargetsParameter,
            (S::MethodReturn, T::MethodReturn) => D::MismatchMethodReturnTargetsMethodReturn,
            (S::MethodReturn, T::Field) => D::MismatchMethodReturnTargetsField,
            (S::MethodReturn, T::ThisParameter) => D::MismatchMethodReturnTargetsThisParameter,
            (S::MethodReturn, T::GenericParameter) => D::MismatchMethodReturnTargetsGenericParameter,
            (S::Field, T::Parameter) => D::MismatchFieldTargetsParameter,
            (S::Field, T::MethodReturn) => D::MismatchFieldTargetsMethodReturn,
            (S::Field, T::Field) => D::MismatchFieldTargetsField,
            (S::Field, T::ThisParameter) => D::MismatchFieldTargetsThisParameter,
            (S::Field, T::GenericParameter) => D::MismatchFieldTargetsGenericParameter,
            (S::ThisParameter, T::Parameter) => D::MismatchThisParameterTargetsParameter,
            (S::ThisParameter, T::MethodReturn) => D::MismatchThisParameterTargetsMethodReturn,
            (S::ThisParameter, T::Field) => D::MismatchThisParameterTargetsField,
            (S::ThisParameter, T::ThisParameter) => D::MismatchThisParameterTargetsThisParameter,
            (S::ThisParameter, T::GenericParameter) => {
                D::MismatchThisParameterTargetsGenericParameter
            }
            (S::TypeArgument, T::Parameter) => D::MismatchTypeArgumentTargetsParameter,
            (S::TypeArgument, T::MethodReturn) => D::MismatchTypeArgumentTargetsMethodReturn,
            (S::TypeArgument, T::Field) => D::MismatchTypeArgumentTargetsField,
            (S::TypeArgument, T::ThisParameter) => D::MismatchTypeArgumentTargetsThisParameter,
            (S::TypeArgument, T::GenericParameter) => {
                D::MismatchTypeArgumentTargetsGenericParameter
            }
        }
    }

    /// Selects the "value cannot be statically resolved" diagnostic for a target kind.
    #[must_use]
    pub fn unresolvable(target: TargetKind) -> Self {
        match target {
            TargetKind::Parameter => DiagnosticId::ParameterValueUnresolvable,
            TargetKind::MethodReturn => DiagnosticId::MethodReturnValueUnresolvable,
            TargetKind::Field => DiagnosticId::FieldValueUnresolvable,
            TargetKind::ThisParameter => DiagnosticId::ImplicitThisValueUnresolvable,
            TargetKind::GenericParameter => DiagnosticId::TypeArgumentUnresolvable,
        }
    }

    /// Stable numeric code for this diagnostic.
    #[must_use]
    pub fn code(self) -> u16 {
        use DiagnosticId as D;
        match self {
            D::InvalidAnnotationPlacement => 1001,

            D::ParameterValueUnresolvable => 2101,
            D::MethodReturnValueUnresolvable => 2102,
            D::FieldValueUnresolvable => 2103,
            D::ImplicitThisValueUnresolvable => 2104,
            D::TypeArgumentUnresolvable => 2105,

            D::MismatchParameterTargetsParameter => 2111,
            D::MismatchParameterTargetsMethodReturn => 2112,
            D::MismatchParameterTargetsField => 2113,
            D::MismatchParameterTargetsThisParameter => 2114,
            D::MismatchParameterTargetsGenericParameter => 2115,
            D::MismatchMethodReturnTargetsParameter => 2116,
            D::MismatchMethodReturnTargetsMethodReturn => 2117,
            D::MismatchMethodReturnTargetsField => 2118,
            D::MismatchMethodReturnTargetsThisParameter => 2119,
            D::MismatchMethodReturnTargetsGenericParameter => 2120,
            D::MismatchFieldTargetsParameter => 2121,
            D::MismatchFieldTargetsMethodReturn => 2122,
            D::MismatchFieldTargetsField => 2123,
            D::MismatchFieldTargetsThisParameter => 2124,
            D::MismatchFieldTargetsGenericParameter => 2125,
            D::MismatchThisParameterTargetsParameter => 2126,
            D::MismatchThisParameterTargetsMethodReturn => 2127,
            D::MismatchThisParameterTargetsField => 2128,
            D::MismatchThisParameterTargetsThisParameter => 2129,
            D::MismatchThisParameterTargetsGenericParameter => 2130,
            D::MismatchTypeArgumentTargetsParameter => 2131,
            D::MismatchTypeArgumentTargetsMethodReturn => 2132,
            D::MismatchTypeArgumentTargetsField => 2133,
            D::MismatchTypeArgumentTargetsThisParameter => 2134,
            D::MismatchTypeArgumentTargetsGenericParameter => 2135,

            D::MakeGenericTypeUnverifiable => 2141,
            D::MakeGenericMethodUnverifiable => 2142,

            D::OverrideParameterMismatch => 2151,
            D::OverrideReturnMismatch => 2152,
            D::OverrideImplicitThisMismatch => 2153,
            D::OverrideGenericParameterMismatch => 2154,
            D::PropertyAccessorConflict => 2155,
        }
    }
}

/// Suggested-fix metadata attached to override mismatch diagnostics.
///
/// Only present when the declaration needing the missing annotation is source-editable
/// and does not already carry an explicit annotation of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedFix {
    /// Location of the declaration that should receive the annotation
    pub location: Location,
    /// The capability set the added annotation must carry
    pub capabilities: MemberCapabilities,
}

/// A single analysis finding.
///
/// The record is deliberately opaque: an identity, an opaque location handle, and the
/// ordered message arguments. The `Display` impl is a debugging aid, not the user-facing
/// rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Which diagnostic this is
    pub id: DiagnosticId,
    /// Where it was detected, opaque to the core
    pub location: Location,
    /// Ordered message arguments (display names of the declarations involved)
    pub args: Vec<String>,
    /// Optional suggested-fix metadata, only on override mismatches
    pub fix: Option<SuggestedFix>,
}

impl Diagnostic {
    /// Creates a diagnostic without fix metadata.
    #[must_use]
    pub fn new(id: DiagnosticId, location: Location, args: Vec<String>) -> Self {
        Self {
            id,
            location,
            args,
            fix: None,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TRIM{}: {} [{}]", self.id.code(), self.id, self.args.join(", "))
    }
}
