// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # trimscope
//!
//! A capability dataflow engine for verifying reflection use against trimming.
//!
//! Trimming removes program members that static analysis cannot prove reachable.
//! Reflection breaks that proof: `GetMethod`, `Activator.CreateInstance`, and friends
//! reach members through runtime values the trimmer cannot see. `trimscope` analyzes
//! lowered method bodies to decide, member category by member category, whether every
//! reflection target is either statically known or covered by a capability annotation
//! on its path, and reports precisely where the guarantee breaks.
//!
//! ## Features
//!
//! - **Declaration-seam design** - Front ends lower programs into the [`SymbolStore`]
//!   seam; the engine never parses anything itself
//! - **Join-set value domain** - Per-local abstract states with set-union joins at
//!   control flow merges, so no offending path is lost
//! - **Intrinsic catalog** - Structural recognition of the well-known reflection,
//!   activation, expression-tree, and interop APIs with bespoke flow for each
//! - **Stable diagnostics** - A fixed 5×5 source/target mismatch matrix plus
//!   per-target unresolvable-value identities, with numeric `TRIMxxxx` codes
//! - **Override consistency** - Annotation agreement across virtual and interface
//!   pairs, with suggested-fix metadata for source-editable declarations
//! - **Parallel batch driver** - Per-body analysis is independent; whole-table runs
//!   are parallelized and deterministic
//!
//! ## Architecture
//!
//! One [`AnalysisSession`] per program snapshot. The session owns the memoizing
//! [`annotations::AnnotationResolver`]; bodies go through [`flow::FlowEngine`] to a
//! fixpoint, and every checkpoint funnels into [`require::RequireAction`], the single
//! place a value meets a requirement.
//!
//! ## Quick Start
//!
//! ```rust
//! use trimscope::{
//!     AnalysisSession, MemberCapabilities, SymbolTable,
//!     flow::{Block, Body, CallSite, Expr, Operation, Statement},
//!     symbols::{FieldDecl, Location, MethodDecl, MethodKind, ParamDecl, SlotType, TypeDecl},
//! };
//!
//! let mut table = SymbolTable::new();
//! let holder = table.add_type(TypeDecl {
//!     namespace: "App".to_string(),
//!     name: "Holder".to_string(),
//!     is_value_type: false,
//!     is_type_like: false,
//!     generic_params: Vec::new(),
//!     location: Location::default(),
//! });
//! // A field that only guarantees public fields ...
//! let field = table.add_field(FieldDecl {
//!     name: "_source".to_string(),
//!     owner: holder,
//!     ty: SlotType::TypeHandle,
//!     annotation: MemberCapabilities::PUBLIC_FIELDS,
//!     location: Location::default(),
//! });
//! // ... flowing into a parameter that demands public methods.
//! let callee = table.add_method(MethodDecl {
//!     name: "NeedsMethods".to_string(),
//!     owner: holder,
//!     is_static: true,
//!     kind: MethodKind::Ordinary,
//!     params: vec![ParamDecl {
//!         name: "target".to_string(),
//!         ty: SlotType::TypeHandle,
//!         annotation: MemberCapabilities::PUBLIC_METHODS,
//!         location: Location::default(),
//!     }],
//!     generic_params: Vec::new(),
//!     return_ty: SlotType::Void,
//!     return_annotation: MemberCapabilities::NONE,
//!     receiver_annotation: MemberCapabilities::NONE,
//!     suppressed: false,
//!     in_source: true,
//!     location: Location::default(),
//! });
//! let caller = table.add_method(MethodDecl {
//!     name: "Run".to_string(),
//!     owner: holder,
//!     is_static: true,
//!     kind: MethodKind::Ordinary,
//!     params: Vec::new(),
//!     generic_params: Vec::new(),
//!     return_ty: SlotType::Void,
//!     return_annotation: MemberCapabilities::NONE,
//!     receiver_annotation: MemberCapabilities::NONE,
//!     suppressed: false,
//!     in_source: true,
//!     location: Location::default(),
//! });
//!
//! let body = Body {
//!     method: caller,
//!     locals: 0,
//!     blocks: vec![Block {
//!         statements: vec![Statement {
//!             op: Operation::Call(CallSite {
//!                 callee: Some(callee),
//!                 receiver: None,
//!                 args: vec![Expr::LoadField(Some(field))],
//!             }),
//!             location: Location(42),
//!         }],
//!         successors: Vec::new(),
//!     }],
//! };
//!
//! let session = AnalysisSession::new(&table);
//! let diagnostics = session.analyze_body(&body)?;
//! assert_eq!(diagnostics.len(), 1);
//! println!("{}", diagnostics[0]);
//! # Ok::<(), trimscope::Error>(())
//! ```

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the trimscope library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use trimscope::prelude::*;
///
/// let table = SymbolTable::new();
/// let session = AnalysisSession::new(&table);
/// assert!(session.validate_placements().is_empty());
/// ```
pub mod prelude;

/// Member capability categories and their subset algebra.
///
/// [`MemberCapabilities`] is the bitflag set at the heart of every check: annotations
/// declare it, requirements demand it, and satisfaction is flag containment.
pub mod capability;

/// Program symbol model and the [`SymbolStore`] front-end seam.
///
/// # Key Types
///
/// - [`symbols::SymbolStore`] - read access to declarations, the core's only view of
///   a program
/// - [`symbols::SymbolTable`] - the arena-backed in-memory store
/// - [`symbols::TypeDecl`], [`symbols::MethodDecl`], [`symbols::FieldDecl`],
///   [`symbols::PropertyDecl`], [`symbols::GenericParamDecl`] - declaration records
pub mod symbols;

/// Requirement resolution with accessor/property precedence, plus placement validation.
pub mod annotations;

/// The abstract value domain: [`value::SingleValue`], [`value::MultiValue`], and the
/// join semi-lattice they form.
pub mod value;

/// Structural recognition of well-known reflection intrinsics.
pub mod intrinsics;

/// The per-body forward dataflow engine.
///
/// # Key Types
///
/// - [`flow::Body`], [`flow::Block`], [`flow::Statement`] - the lowered CFG shape
/// - [`flow::FlowEngine`] - worklist fixpoint plus single-pass checkpoint reporting
pub mod flow;

/// The requirement checkpoint: value-versus-capability compatibility and diagnostic
/// selection.
pub mod require;

/// Override and property-accessor annotation consistency.
pub mod overrides;

/// Diagnostic identities, the mismatch matrix, and the [`Diagnostic`] record.
pub mod diagnostics;

/// The per-run [`AnalysisSession`] facade.
pub mod session;

pub use capability::MemberCapabilities;
pub use diagnostics::{Diagnostic, DiagnosticId};
pub use error::{Error, Result};
pub use session::{AnalysisSession, SessionReport};
pub use symbols::{SymbolStore, SymbolTable};
