//! Abstract value domain for reflection-target dataflow.
//!
//! A [`SingleValue`] describes one possible provenance of a reflection target at a
//! program point; a [`MultiValue`] is the join of several alternatives that control
//! flow made indistinguishable. The domain is a join semi-lattice: the join is set
//! union, equivalence is set equality, and there is no widening because a method body
//! only ever mentions finitely many single values.
//!
//! # Lattice Laws
//!
//! [`JoinSemiLattice::join`] must be:
//!
//! - **Idempotent**: `x.join(x) = x`
//! - **Commutative**: `x.join(y) = y.join(x)`
//! - **Associative**: `x.join(y.join(z)) = (x.join(y)).join(z)`

use std::fmt::Debug;

use crate::{
    capability::MemberCapabilities,
    symbols::{FieldId, GenericParamId, MethodId, SymbolStore, TypeId},
};

/// A join semi-lattice with a join (least upper bound) operation.
///
/// The join combines information when control flow paths merge: the result must be a
/// superset of both inputs so that no diagnostic obligation is lost by merging.
pub trait JoinSemiLattice: Clone + Debug + PartialEq {
    /// Computes the join (least upper bound) of two lattice elements.
    #[must_use]
    fn join(&self, other: &Self) -> Self;
}

/// Position of a parameter within a method signature, counting the implicit receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamSlot {
    /// The implicit `this` receiver of an instance method
    This,
    /// A declared parameter, by zero-based position
    Index(u32),
}

/// One possible provenance of a reflection target.
///
/// The set of variants is closed on purpose: both decision points that consume values
/// (the flow transfer function and the requirement check) match exhaustively, so adding
/// a variant is a compile-time-visible change everywhere it matters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SingleValue {
    /// A statically known type; satisfies any requirement
    ConcreteType(TypeId),
    /// Provenance could not be determined; never satisfies a non-empty requirement
    Unknown,
    /// The return value of a statically resolved call
    MethodReturn {
        /// The callee
        method: MethodId,
        /// The callee's resolved return-slot capability set
        capabilities: MemberCapabilities,
    },
    /// A formal parameter or the implicit receiver
    MethodParameter {
        /// The declaring method
        method: MethodId,
        /// Which signature slot
        slot: ParamSlot,
        /// The slot's resolved capability set
        capabilities: MemberCapabilities,
    },
    /// A generic parameter of a type or method
    GenericParameter {
        /// The generic parameter declaration
        param: GenericParamId,
        /// The declaration's resolved capability set
        capabilities: MemberCapabilities,
    },
    /// A field load
    Field {
        /// The field declaration
        field: FieldId,
        /// The field's resolved capability set
        capabilities: MemberCapabilities,
    },
    /// A nullable-of-T handle that keeps the underlying value's annotation visible
    /// through the nullable projection. The wrapper itself carries no capability.
    NullableWrapped(Box<SingleValue>),
}

impl SingleValue {
    /// Wraps a value in a nullable projection.
    ///
    /// The caller owns the other half of the precondition: `inner` must be the type
    /// argument of a construction whose open generic is the nullable wrapper type
    /// itself. This function never sees that outer type, so it cannot check it; the
    /// flow engine establishes it at the single site that builds these values.
    ///
    /// Nesting nullable wrappers is a front-end programming error, not a condition a
    /// user can trigger, so it is checked with a debug assertion only.
    #[must_use]
    pub fn wrap_nullable(inner: SingleValue) -> SingleValue {
        debug_assert!(
            !matches!(inner, SingleValue::NullableWrapped(_)),
            "nullable wrapper applied to an already wrapped value"
        );
        SingleValue::NullableWrapped(Box::new(inner))
    }

    /// Human-readable description of the value's provenance, for diagnostics.
    pub fn display(&self, store: &dyn SymbolStore) -> String {
        match self {
            SingleValue::ConcreteType(ty) => store.type_decl(*ty).full_name(),
            SingleValue::Unknown => "<unknown>".to_string(),
            SingleValue::MethodReturn { method, .. } => {
                format!("return value of '{}'", store.method_display(*method))
            }
            SingleValue::MethodParameter { method, slot, .. } => match slot {
                ParamSlot::This => {
                    format!("implicit 'this' of '{}'", store.method_display(*method))
                }
                ParamSlot::Index(index) => {
                    let name = store
                        .method(*method)
                        .params
                        .get(*index as usize)
                        .map_or_else(|| index.to_string(), |p| p.name.clone());
                    format!("parameter '{}' of '{}'", name, store.method_display(*method))
                }
            },
            SingleValue::GenericParameter { param, .. } => {
                format!("generic parameter '{}'", store.generic_param(*param).name)
            }
            SingleValue::Field { field, .. } => {
                format!("field '{}'", store.field_display(*field))
            }
            SingleValue::NullableWrapped(inner) => inner.display(store),
        }
    }
}

/// A non-empty, deduplicated set of [`SingleValue`] alternatives.
///
/// Kept sorted so that derived equality and hashing see the canonical form; set
/// equality is exactly what the lattice requires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MultiValue(Vec<SingleValue>);

impl MultiValue {
    /// A set holding exactly one value.
    #[must_use]
    pub fn singleton(value: SingleValue) -> Self {
        MultiValue(vec![value])
    }

    /// The unknown-provenance singleton.
    #[must_use]
    pub fn unknown() -> Self {
        Self::singleton(SingleValue::Unknown)
    }

    /// Builds a set from arbitrary alternatives, canonicalizing order and duplicates.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty; an empty alternative set has no meaning in this
    /// domain and indicates a front-end defect.
    #[must_use]
    pub fn from_values(mut values: Vec<SingleValue>) -> Self {
        assert!(!values.is_empty(), "MultiValue must be non-empty");
        values.sort();
        values.dedup();
        MultiValue(values)
    }

    /// Iterates the alternatives in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &SingleValue> {
        self.0.iter()
    }

    /// Number of alternatives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; the set is non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the set contains the given alternative.
    #[must_use]
    pub fn contains(&self, value: &SingleValue) -> bool {
        self.0.binary_search(value).is_ok()
    }
}

impl JoinSemiLattice for MultiValue {
    /// Join is set union.
    fn join(&self, other: &Self) -> Self {
        let mut merged = Vec::with_capacity(self.0.len() + other.0.len());
        merged.extend_from_slice(&self.0);
        merged.extend_from_slice(&other.0);
        MultiValue::from_values(merged)
    }
}

impl From<SingleValue> for MultiValue {
    fn from(value: SingleValue) -> Self {
        MultiValue::singleton(value)
    }
}
