//! Recognition of reflection intrinsics that need bespoke value flow.
//!
//! Most calls follow the generic rule (check annotated parameters, produce an annotated
//! return value). A small catalog of well-known reflection, activation, expression-tree,
//! and interop APIs instead manipulates the flowed type value itself and is matched here
//! structurally: declaring type name, member name, staticness, arity, and parameter type
//! names must all agree with a catalog entry.
//!
//! The catalog is a fixed, manually ordered list and the first matching entry wins;
//! ordering matters because some signatures are prefixes of others (the two
//! `Activator.CreateInstance` families differ only in their first parameter type).
//! Arity constraints are exact, never "at least N".

use strum::{Display, EnumIter};

use crate::capability::MemberCapabilities;

/// The well-known reflection intrinsics with bespoke flow handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[allow(missing_docs)] // names mirror the matched APIs
pub enum IntrinsicId {
    TypeFromHandle,
    TypeHandleGetter,
    ObjectGetType,
    TypeGetConstructor,
    TypeGetMethod,
    TypeGetField,
    TypeGetProperty,
    TypeGetEvent,
    TypeGetNestedType,
    TypeGetInterface,
    ActivatorCreateInstance,
    ActivatorCreateInstanceNamed,
    ExpressionCall,
    ExpressionField,
    ExpressionProperty,
    ExpressionNew,
    MarshalSizeOf,
    MarshalOffsetOf,
    MarshalPtrToStructure,
    MarshalDestroyStructure,
    MakeGenericType,
    MakeGenericMethod,
    NullableUnderlyingType,
}

/// Which operand of an intrinsic call carries the flowed type value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOperand {
    /// The receiver of the call
    Receiver,
    /// A declared argument, by zero-based position
    Arg(usize),
}

impl IntrinsicId {
    /// The fixed capability requirement this intrinsic places on its type operand,
    /// if it follows the common "one type operand, one requirement" pattern.
    ///
    /// Intrinsics that propagate or transform the type value instead of requiring
    /// capabilities from it (handle conversions, generic instantiation, the nullable
    /// underlying-type query) return `None` and are handled individually by the flow
    /// engine.
    #[must_use]
    pub fn requirement(self) -> Option<(TypeOperand, MemberCapabilities)> {
        use IntrinsicId as I;
        use MemberCapabilities as C;
        match self {
            I::TypeGetConstructor => Some((TypeOperand::Receiver, C::PUBLIC_CONSTRUCTORS)),
            I::TypeGetMethod => Some((TypeOperand::Receiver, C::PUBLIC_METHODS)),
            I::TypeGetField => Some((TypeOperand::Receiver, C::PUBLIC_FIELDS)),
            I::TypeGetProperty => Some((TypeOperand::Receiver, C::PUBLIC_PROPERTIES)),
            I::TypeGetEvent => Some((TypeOperand::Receiver, C::PUBLIC_EVENTS)),
            I::TypeGetNestedType => Some((TypeOperand::Receiver, C::PUBLIC_NESTED_TYPES)),
            I::TypeGetInterface => Some((TypeOperand::Receiver, C::INTERFACES)),
            I::ActivatorCreateInstance => {
                Some((TypeOperand::Arg(0), C::PUBLIC_PARAMETERLESS_CONSTRUCTOR))
            }
            I::ExpressionCall => Some((TypeOperand::Arg(0), C::PUBLIC_METHODS)),
            I::ExpressionField => Some((TypeOperand::Arg(1), C::PUBLIC_FIELDS)),
            I::ExpressionProperty => Some((TypeOperand::Arg(1), C::PUBLIC_PROPERTIES)),
            I::ExpressionNew => Some((TypeOperand::Arg(0), C::PUBLIC_PARAMETERLESS_CONSTRUCTOR)),
            I::MarshalSizeOf => Some((TypeOperand::Arg(0), C::PUBLIC_PARAMETERLESS_CONSTRUCTOR)),
            I::MarshalOffsetOf => Some((TypeOperand::Arg(0), C::PUBLIC_FIELDS)),
            I::MarshalPtrToStructure => {
                Some((TypeOperand::Arg(1), C::PUBLIC_PARAMETERLESS_CONSTRUCTOR))
            }
            I::MarshalDestroyStructure => {
                Some((TypeOperand::Arg(1), C::PUBLIC_PARAMETERLESS_CONSTRUCTOR))
            }
            I::ActivatorCreateInstanceNamed
            | I::TypeFromHandle
            | I::TypeHandleGetter
            | I::ObjectGetType
            | I::MakeGenericType
            | I::MakeGenericMethod
            | I::NullableUnderlyingType => None,
        }
    }
}

/// The structural shape of a callee, supplied by the flow engine from signature
/// metadata. Parameter types exclude the implicit receiver.
#[derive(Debug, Clone)]
pub struct CalleeShape<'a> {
    /// Full name of the declaring type
    pub owner: &'a str,
    /// Member name
    pub name: &'a str,
    /// Whether the callee is static
    pub is_static: bool,
    /// Declared parameter type names, in order
    pub params: Vec<&'a str>,
}

/// One catalog entry. `arity` of `Some` is an exact count; `params` lists the
/// positions whose type names must match (positions beyond the callee's arity never
/// match).
struct Signature {
    owner: &'static str,
    name: &'static str,
    is_static: bool,
    arity: Option<usize>,
    params: &'static [(usize, &'static str)],
    id: IntrinsicId,
}

impl Signature {
    fn matches(&self, shape: &CalleeShape<'_>) -> bool {
        if shape.name != self.name || shape.owner != self.owner || shape.is_static != self.is_static
        {
            return false;
        }
        if let Some(arity) = self.arity {
            if shape.params.len() != arity {
                return false;
            }
        }
        self.params.iter().all(|&(index, type_name)| {
            shape.params.get(index).is_some_and(|p| *p == type_name)
        })
    }
}

/// The ordered catalog. Entries whose signatures overlap are ordered so the more
/// specific one comes first.
const CATALOG: &[Signature] = &[
    Signature {
        owner: "System.Type",
        name: "GetTypeFromHandle",
        is_static: true,
        arity: Some(1),
        params: &[(0, "System.RuntimeTypeHandle")],
        id: IntrinsicId::TypeFromHandle,
    },
    Signature {
        owner: "System.Type",
        name: "get_TypeHandle",
        is_static: false,
        arity: Some(0),
        params: &[],
        id: IntrinsicId::TypeHandleGetter,
    },
    Signature {
        owner: "System.Object",
        name: "GetType",
        is_static: false,
        arity: Some(0),
        params: &[],
        id: IntrinsicId::ObjectGetType,
    },
    Signature {
        owner: "System.Type",
        name: "GetConstructor",
        is_static: false,
        arity: None,
        params: &[],
        id: IntrinsicId::TypeGetConstructor,
    },
    Signature {
        owner: "System.Type",
        name: "GetMethod",
        is_static: false,
        arity: None,
        params: &[(0, "System.String")],
        id: IntrinsicId::TypeGetMethod,
    },
    Signature {
        owner: "System.Type",
        name: "GetField",
        is_static: false,
        arity: None,
        params: &[(0, "System.String")],
        id: IntrinsicId::TypeGetField,
    },
    Signature {
        owner: "System.Type",
        name: "GetProperty",
        is_static: false,
        arity: None,
        params: &[(0, "System.String")],
        id: IntrinsicId::TypeGetProperty,
    },
    Signature {
        owner: "System.Type",
        name: "GetEvent",
        is_static: false,
        arity: None,
        params: &[(0, "System.String")],
        id: IntrinsicId::TypeGetEvent,
    },
    Signature {
        owner: "System.Type",
        name: "GetNestedType",
        is_static: false,
        arity: None,
        params: &[(0, "System.String")],
        id: IntrinsicId::TypeGetNestedType,
    },
    Signature {
        owner: "System.Type",
        name: "GetInterface",
        is_static: false,
        arity: None,
        params: &[(0, "System.String")],
        id: IntrinsicId::TypeGetInterface,
    },
    Signature {
        owner: "System.Type",
        name: "MakeGenericType",
        is_static: false,
        arity: None,
        params: &[],
        id: IntrinsicId::MakeGenericType,
    },
    Signature {
        owner: "System.Reflection.MethodInfo",
        name: "MakeGenericMethod",
        is_static: false,
        arity: None,
        params: &[],
        id: IntrinsicId::MakeGenericMethod,
    },
    // The Type-first overload family must precede the name-based one: both are
    // static members of System.Activator with the same name.
    Signature {
        owner: "System.Activator",
        name: "CreateInstance",
        is_static: true,
        arity: None,
        params: &[(0, "System.Type")],
        id: IntrinsicId::ActivatorCreateInstance,
    },
    Signature {
        owner: "System.Activator",
        name: "CreateInstance",
        is_static: true,
        arity: None,
        params: &[(0, "System.String"), (1, "System.String")],
        id: IntrinsicId::ActivatorCreateInstanceNamed,
    },
    Signature {
        owner: "System.Linq.Expressions.Expression",
        name: "Call",
        is_static: true,
        arity: Some(4),
        params: &[(0, "System.Type")],
        id: IntrinsicId::ExpressionCall,
    },
    Signature {
        owner: "System.Linq.Expressions.Expression",
        name: "Field",
        is_static: true,
        arity: Some(3),
        params: &[(1, "System.Type")],
        id: IntrinsicId::ExpressionField,
    },
    Signature {
        owner: "System.Linq.Expressions.Expression",
        name: "Property",
        is_static: true,
        arity: Some(3),
        params: &[(1, "System.Type")],
        id: IntrinsicId::ExpressionProperty,
    },
    Signature {
        owner: "System.Linq.Expressions.Expression",
        name: "New",
        is_static: true,
        arity: Some(1),
        params: &[(0, "System.Type")],
        id: IntrinsicId::ExpressionNew,
    },
    Signature {
        owner: "System.Runtime.InteropServices.Marshal",
        name: "SizeOf",
        is_static: true,
        arity: Some(1),
        params: &[(0, "System.Type")],
        id: IntrinsicId::MarshalSizeOf,
    },
    Signature {
        owner: "System.Runtime.InteropServices.Marshal",
        name: "OffsetOf",
        is_static: true,
        arity: Some(2),
        params: &[(0, "System.Type"), (1, "System.String")],
        id: IntrinsicId::MarshalOffsetOf,
    },
    Signature {
        owner: "System.Runtime.InteropServices.Marshal",
        name: "PtrToStructure",
        is_static: true,
        arity: Some(2),
        params: &[(1, "System.Type")],
        id: IntrinsicId::MarshalPtrToStructure,
    },
    Signature {
        owner: "System.Runtime.InteropServices.Marshal",
        name: "DestroyStructure",
        is_static: true,
        arity: Some(2),
        params: &[(1, "System.Type")],
        id: IntrinsicId::MarshalDestroyStructure,
    },
    Signature {
        owner: "System.Nullable",
        name: "GetUnderlyingType",
        is_static: true,
        arity: Some(1),
        params: &[(0, "System.Type")],
        id: IntrinsicId::NullableUnderlyingType,
    },
];

/// Classifies a callee against the intrinsic catalog.
///
/// Returns the first matching entry, or `None` for callees that follow the generic
/// call rule.
#[must_use]
pub fn recognize(shape: &CalleeShape<'_>) -> Option<IntrinsicId> {
    CATALOG.iter().find(|sig| sig.matches(shape)).map(|sig| sig.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape<'a>(owner: &'a str, name: &'a str, is_static: bool, params: Vec<&'a str>) -> CalleeShape<'a> {
        CalleeShape {
            owner,
            name,
            is_static,
            params,
        }
    }

    #[test]
    fn test_member_queries() {
        assert_eq!(
            recognize(&shape("System.Type", "GetMethod", false, vec!["System.String"])),
            Some(IntrinsicId::TypeGetMethod)
        );
        assert_eq!(
            recognize(&shape(
                "System.Type",
                "GetMethod",
                false,
                vec!["System.String", "System.Reflection.BindingFlags"]
            )),
            Some(IntrinsicId::TypeGetMethod)
        );
        // Wrong first parameter type does not match.
        assert_eq!(
            recognize(&shape("System.Type", "GetMethod", false, vec!["System.Int32"])),
            None
        );
    }

    #[test]
    fn test_activator_families_disambiguated_by_first_param() {
        assert_eq!(
            recognize(&shape("System.Activator", "CreateInstance", true, vec!["System.Type"])),
            Some(IntrinsicId::ActivatorCreateInstance)
        );
        assert_eq!(
            recognize(&shape(
                "System.Activator",
                "CreateInstance",
                true,
                vec!["System.String", "System.String"]
            )),
            Some(IntrinsicId::ActivatorCreateInstanceNamed)
        );
        // A lone string argument matches neither family.
        assert_eq!(
            recognize(&shape("System.Activator", "CreateInstance", true, vec!["System.String"])),
            None
        );
    }

    #[test]
    fn test_exact_arity_is_enforced() {
        assert_eq!(
            recognize(&shape(
                "System.Linq.Expressions.Expression",
                "New",
                true,
                vec!["System.Type"]
            )),
            Some(IntrinsicId::ExpressionNew)
        );
        // Extra parameters disqualify an exact-arity entry.
        assert_eq!(
            recognize(&shape(
                "System.Linq.Expressions.Expression",
                "New",
                true,
                vec!["System.Type", "System.Object"]
            )),
            None
        );
    }

    #[test]
    fn test_staticness_must_match() {
        assert_eq!(
            recognize(&shape(
                "System.Type",
                "GetTypeFromHandle",
                false,
                vec!["System.RuntimeTypeHandle"]
            )),
            None
        );
    }

    #[test]
    fn test_unknown_member_is_not_intrinsic() {
        assert_eq!(
            recognize(&shape("MyApp.Helpers", "GetMethod", false, vec!["System.String"])),
            None
        );
    }

    #[test]
    fn test_requirement_operands() {
        assert_eq!(
            IntrinsicId::TypeGetField.requirement(),
            Some((TypeOperand::Receiver, MemberCapabilities::PUBLIC_FIELDS))
        );
        assert_eq!(
            IntrinsicId::ExpressionField.requirement(),
            Some((TypeOperand::Arg(1), MemberCapabilities::PUBLIC_FIELDS))
        );
        assert_eq!(IntrinsicId::MakeGenericType.requirement(), None);
    }
}
