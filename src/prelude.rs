//! # trimscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the trimscope library. Import this module to get quick access to the essential
//! types for reflection-versus-trimming analysis.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all trimscope operations
pub use crate::Error;

/// The result type used throughout trimscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Main entry point: one analysis run over one symbol store
pub use crate::session::{AnalysisSession, SessionReport};

// ================================================================================================
// Symbol Model
// ================================================================================================

/// The declaration seam and its in-memory implementation
pub use crate::symbols::{SymbolStore, SymbolTable};

/// Declaration handles
pub use crate::symbols::{FieldId, GenericParamId, Location, MethodId, PropertyId, TypeId};

/// Declaration records
pub use crate::symbols::{
    FieldDecl, GenericParamDecl, MethodDecl, MethodKind, ParamDecl, PropertyDecl, SlotType,
    TypeDecl,
};

// ================================================================================================
// Capabilities and Annotations
// ================================================================================================

/// The member capability categories demanded and guaranteed by annotations
pub use crate::capability::MemberCapabilities;

/// Annotatable declaration slots
pub use crate::annotations::Slot;

// ================================================================================================
// Body Model and Value Domain
// ================================================================================================

/// The lowered body shape handed to the flow engine
pub use crate::flow::{Block, Body, CallSite, Expr, Operation, Statement};

/// The abstract value domain
pub use crate::value::{JoinSemiLattice, MultiValue, ParamSlot, SingleValue};

// ================================================================================================
// Diagnostics
// ================================================================================================

/// Analysis findings and their stable identities
pub use crate::diagnostics::{
    Diagnostic, DiagnosticId, SourceKind, SuggestedFix, TargetKind,
};
