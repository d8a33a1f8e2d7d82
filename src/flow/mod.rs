//! Forward dataflow over normalized method bodies.
//!
//! Front ends lower each analyzable method into a [`Body`]: a small CFG of blocks whose
//! statements assign, call, store, return, and instantiate over an indexed pool of
//! locals. [`FlowEngine`] runs a two-phase analysis over that body:
//!
//! 1. a worklist fixpoint that propagates [`MultiValue`] states through the CFG, joining
//!    at merge points until the per-block entry states stabilize;
//! 2. a single reporting pass over every reachable block with its fixed entry state,
//!    so each checkpoint is diagnosed exactly once no matter how many fixpoint
//!    iterations touched it.
//!
//! Checkpoints are the places a value meets a declared requirement: annotated call
//! arguments and receivers, annotated return slots, annotated field stores, annotated
//! type arguments of a generic instantiation, and the recognized reflection intrinsics.
//!
//! # Key Types
//!
//! - [`Body`], [`Block`], [`Statement`] - the normalized CFG handed in by a front end
//! - [`Operation`], [`Expr`], [`CallSite`] - the statement and expression shapes
//! - [`FlowEngine`] - the fixpoint solver and checkpoint reporter

use std::collections::VecDeque;

use crate::{
    annotations::{AnnotationResolver, Slot},
    capability::MemberCapabilities,
    diagnostics::{Diagnostic, DiagnosticId, TargetKind},
    intrinsics::{self, CalleeShape, IntrinsicId, TypeOperand},
    require::{RequireAction, Requirement},
    symbols::{FieldId, GenericParamId, Location, MethodId, SymbolStore},
    value::{JoinSemiLattice, MultiValue, ParamSlot, SingleValue},
    Error, Result,
};

/// A value-producing expression inside a statement.
///
/// Expressions carry no locations of their own; diagnostics raised while evaluating an
/// expression use the enclosing statement's location.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Read of a local by index
    Local(usize),
    /// Read of a formal parameter or the implicit receiver
    Param(ParamSlot),
    /// A statically known type mention (`typeof`, a type literal)
    TypeOf(crate::symbols::TypeId),
    /// A field load; `None` when the field did not resolve
    LoadField(Option<FieldId>),
    /// A call used as a value
    Call(Box<CallSite>),
    /// A value the front end could not model
    Unknown,
    /// A type argument position left open in a generic context; instantiation
    /// checkpoints skip it, any other use evaluates to unknown
    OpenGeneric,
}

/// A call, either a standalone statement or nested inside an expression.
#[derive(Debug, Clone)]
pub struct CallSite {
    /// The resolved callee; `None` when resolution failed
    pub callee: Option<MethodId>,
    /// Receiver expression for instance calls
    pub receiver: Option<Expr>,
    /// Argument expressions, in declaration order
    pub args: Vec<Expr>,
}

/// One statement's effect.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Overwrite a local with the value of an expression
    Assign {
        /// Index of the assigned local
        local: usize,
        /// The assigned value
        value: Expr,
    },
    /// A call whose result is discarded
    Call(CallSite),
    /// A store into a field; `None` when the field did not resolve
    StoreField {
        /// The stored-into field, if resolved
        field: Option<FieldId>,
        /// The stored value
        value: Expr,
    },
    /// Return from the body, with the returned value for non-void methods
    Return {
        /// The returned value, absent for void returns
        value: Option<Expr>,
    },
    /// A direct generic instantiation with its type arguments paired to the
    /// instantiated declaration's generic parameters
    Instantiate {
        /// (generic parameter, supplied type argument) pairs
        args: Vec<(GenericParamId, Expr)>,
    },
}

/// An [`Operation`] with the location diagnostics raised from it should carry.
#[derive(Debug, Clone)]
pub struct Statement {
    /// The statement's effect
    pub op: Operation,
    /// Location reported for diagnostics at this statement
    pub location: Location,
}

/// A basic block: straight-line statements and successor edges by block index.
#[derive(Debug, Clone, Default)]
pub struct Block {
    /// Statements in execution order
    pub statements: Vec<Statement>,
    /// Successor blocks, by index into [`Body::blocks`]
    pub successors: Vec<usize>,
}

/// A lowered method body. Execution starts at block 0; an empty block list means the
/// body has nothing to analyze.
#[derive(Debug, Clone)]
pub struct Body {
    /// The method this body belongs to
    pub method: MethodId,
    /// Number of locals; `Expr::Local` and `Operation::Assign` index below this
    pub locals: usize,
    /// The basic blocks, entry first
    pub blocks: Vec<Block>,
}

/// Per-local abstract state at a program point. `None` is bottom: the local has not
/// been assigned on any path reaching this point, and reading it yields unknown.
type LocalState = Vec<Option<MultiValue>>;

/// Joins `incoming` into `current` pointwise, returning whether anything changed.
fn join_into(current: &mut [Option<MultiValue>], incoming: &[Option<MultiValue>]) -> bool {
    let mut changed = false;
    for (slot, value) in current.iter_mut().zip(incoming) {
        match (slot.as_ref(), value) {
            (_, None) => {}
            (None, Some(value)) => {
                *slot = Some(value.clone());
                changed = true;
            }
            (Some(existing), Some(value)) => {
                let joined = existing.join(value);
                if joined != *existing {
                    *slot = Some(joined);
                    changed = true;
                }
            }
        }
    }
    changed
}

/// Mutable context threaded through one pass over a block.
struct StepCtx<'s> {
    method: MethodId,
    location: Location,
    state: &'s mut LocalState,
    sink: &'s mut Vec<Diagnostic>,
}

/// The per-body dataflow solver and checkpoint reporter.
pub struct FlowEngine<'a, S: SymbolStore> {
    annotations: &'a AnnotationResolver<'a, S>,
    store: &'a S,
    require: RequireAction<'a, S>,
}

impl<'a, S: SymbolStore> FlowEngine<'a, S> {
    /// Creates an engine sharing the given annotation resolver (and its cache).
    pub fn new(annotations: &'a AnnotationResolver<'a, S>) -> Self {
        let store = annotations.store();
        Self {
            annotations,
            store,
            require: RequireAction::new(store),
        }
    }

    /// Analyzes one body to fixpoint and reports every checkpoint violation in it.
    ///
    /// Bodies of suppressed methods produce no diagnostics. Diagnostics are ordered by
    /// block index, then statement order within the block.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the body references blocks, locals, or
    /// parameter slots outside its declared ranges.
    pub fn analyze(&self, body: &Body) -> Result<Vec<Diagnostic>> {
        self.validate(body)?;
        if self.store.method(body.method).suppressed || body.blocks.is_empty() {
            return Ok(Vec::new());
        }

        let mut in_states: Vec<Option<LocalState>> = vec![None; body.blocks.len()];
        in_states[0] = Some(vec![None; body.locals]);

        let mut queued = vec![false; body.blocks.len()];
        queued[0] = true;
        let mut worklist = VecDeque::from([0usize]);
        let mut scratch = Vec::new();

        while let Some(index) = worklist.pop_front() {
            queued[index] = false;
            let Some(mut state) = in_states[index].clone() else {
                continue;
            };
            scratch.clear();
            self.apply_block(body, &body.blocks[index], &mut state, &mut scratch);

            for &successor in &body.blocks[index].successors {
                let changed = match &mut in_states[successor] {
                    Some(existing) => join_into(existing, &state),
                    slot @ None => {
                        *slot = Some(state.clone());
                        true
                    }
                };
                if changed && !queued[successor] {
                    queued[successor] = true;
                    worklist.push_back(successor);
                }
            }
        }

        // Reporting pass: reachable blocks only, each visited once against its fixed
        // entry state.
        let mut diagnostics = Vec::new();
        for (index, block) in body.blocks.iter().enumerate() {
            let Some(in_state) = &in_states[index] else {
                continue;
            };
            let mut state = in_state.clone();
            self.apply_block(body, block, &mut state, &mut diagnostics);
        }
        Ok(diagnostics)
    }

    fn validate(&self, body: &Body) -> Result<()> {
        if !self.store.has_method(body.method) {
            return Err(Error::SymbolNotFound(format!(
                "body names method {:?}, which the store does not hold",
                body.method
            )));
        }
        let param_count = self.store.method(body.method).params.len();
        for (index, block) in body.blocks.iter().enumerate() {
            for &successor in &block.successors {
                if successor >= body.blocks.len() {
                    return Err(malformed_error!(
                        "block {index} has successor {successor} but the body has {} blocks",
                        body.blocks.len()
                    ));
                }
            }
            for statement in &block.statements {
                self.validate_operation(&statement.op, body, param_count)?;
            }
        }
        Ok(())
    }

    fn validate_operation(&self, op: &Operation, body: &Body, param_count: usize) -> Result<()> {
        match op {
            Operation::Assign { local, value } => {
                if *local >= body.locals {
                    return Err(malformed_error!(
                        "assignment to local {local} but the body declares {} locals",
                        body.locals
                    ));
                }
                self.validate_expr(value, body, param_count)
            }
            Operation::Call(site) => self.validate_call(site, body, param_count),
            Operation::StoreField { field, value } => {
                if let Some(field) = field {
                    if !self.store.has_field(*field) {
                        return Err(Error::SymbolNotFound(format!(
                            "store to field {field:?}, which the store does not hold"
                        )));
                    }
                }
                self.validate_expr(value, body, param_count)
            }
            Operation::Return { value: Some(expr) } => self.validate_expr(expr, body, param_count),
            Operation::Return { value: None } => Ok(()),
            Operation::Instantiate { args } => {
                for (param, expr) in args {
                    if !self.store.has_generic_param(*param) {
                        return Err(Error::SymbolNotFound(format!(
                            "instantiation binds generic parameter {param:?}, which the store \
                             does not hold"
                        )));
                    }
                    self.validate_expr(expr, body, param_count)?;
                }
                Ok(())
            }
        }
    }

    fn validate_expr(&self, expr: &Expr, body: &Body, param_count: usize) -> Result<()> {
        match expr {
            Expr::Local(index) if *index >= body.locals => Err(malformed_error!(
                "read of local {index} but the body declares {} locals",
                body.locals
            )),
            Expr::Param(ParamSlot::Index(index)) if *index as usize >= param_count => {
                Err(malformed_error!(
                    "read of parameter {index} but the method declares {param_count} parameters"
                ))
            }
            Expr::TypeOf(ty) if !self.store.has_type(*ty) => Err(Error::SymbolNotFound(format!(
                "typeof names type {ty:?}, which the store does not hold"
            ))),
            Expr::LoadField(Some(field)) if !self.store.has_field(*field) => {
                Err(Error::SymbolNotFound(format!(
                    "load of field {field:?}, which the store does not hold"
                )))
            }
            Expr::Call(site) => self.validate_call(site, body, param_count),
            _ => Ok(()),
        }
    }

    fn validate_call(&self, site: &CallSite, body: &Body, param_count: usize) -> Result<()> {
        if let Some(callee) = site.callee {
            if !self.store.has_method(callee) {
                return Err(Error::SymbolNotFound(format!(
                    "call names method {callee:?}, which the store does not hold"
                )));
            }
        }
        if let Some(receiver) = &site.receiver {
            self.validate_expr(receiver, body, param_count)?;
        }
        for arg in &site.args {
            self.validate_expr(arg, body, param_count)?;
        }
        Ok(())
    }

    fn apply_block(
        &self,
        body: &Body,
        block: &Block,
        state: &mut LocalState,
        sink: &mut Vec<Diagnostic>,
    ) {
        let mut ctx = StepCtx {
            method: body.method,
            location: Location::default(),
            state,
            sink,
        };
        for statement in &block.statements {
            ctx.location = statement.location;
            self.apply_statement(&mut ctx, &statement.op);
        }
    }

    fn apply_statement(&self, ctx: &mut StepCtx<'_>, op: &Operation) {
        match op {
            Operation::Assign { local, value } => {
                let value = self.eval_expr(ctx, value);
                ctx.state[*local] = Some(value);
            }
            Operation::Call(site) => {
                self.eval_call(ctx, site);
            }
            Operation::StoreField { field, value } => {
                let value = self.eval_expr(ctx, value);
                let Some(field) = field else {
                    return;
                };
                let required = self.annotations.resolve(Slot::Field(*field));
                if !required.is_none() {
                    let display = format!("field '{}'", self.store.field_display(*field));
                    self.check(ctx, &value, required, TargetKind::Field, display);
                }
            }
            Operation::Return { value: Some(expr) } => {
                let value = self.eval_expr(ctx, expr);
                let required = self.annotations.resolve(Slot::Return(ctx.method));
                if !required.is_none() {
                    let display =
                        format!("return value of '{}'", self.store.method_display(ctx.method));
                    self.check(ctx, &value, required, TargetKind::MethodReturn, display);
                }
            }
            Operation::Return { value: None } => {}
            Operation::Instantiate { args } => {
                for (param, expr) in args {
                    // Open positions stay generic after this instantiation and are
                    // checked where they are eventually closed.
                    if matches!(expr, Expr::OpenGeneric) {
                        continue;
                    }
                    let value = self.eval_expr(ctx, expr);
                    let required = self.annotations.resolve(Slot::GenericParam(*param));
                    if !required.is_none() {
                        let display = self.generic_param_display(*param);
                        self.check(ctx, &value, required, TargetKind::GenericParameter, display);
                    }
                }
            }
        }
    }

    fn eval_expr(&self, ctx: &mut StepCtx<'_>, expr: &Expr) -> MultiValue {
        match expr {
            Expr::Local(index) => ctx.state[*index]
                .clone()
                .unwrap_or_else(MultiValue::unknown),
            Expr::Param(slot) => self.eval_param(ctx.method, *slot),
            Expr::TypeOf(ty) => MultiValue::singleton(SingleValue::ConcreteType(*ty)),
            Expr::LoadField(Some(field)) => {
                if !self.store.field(*field).ty.is_type_like() {
                    return MultiValue::unknown();
                }
                let capabilities = self.annotations.resolve(Slot::Field(*field));
                MultiValue::singleton(SingleValue::Field {
                    field: *field,
                    capabilities,
                })
            }
            Expr::LoadField(None) | Expr::Unknown | Expr::OpenGeneric => MultiValue::unknown(),
            Expr::Call(site) => self.eval_call(ctx, site),
        }
    }

    /// Parameter reads only carry provenance when the declared slot can hold a
    /// reflection target; anything else is unknown.
    fn eval_param(&self, method: MethodId, slot: ParamSlot) -> MultiValue {
        let decl = self.store.method(method);
        let capabilities = match slot {
            ParamSlot::This => {
                if !self.store.type_decl(decl.owner).is_type_like {
                    return MultiValue::unknown();
                }
                self.annotations.resolve(Slot::Receiver(method))
            }
            ParamSlot::Index(index) => {
                let type_like = decl
                    .params
                    .get(index as usize)
                    .is_some_and(|p| p.ty.is_type_like());
                if !type_like {
                    return MultiValue::unknown();
                }
                self.annotations.resolve(Slot::Param(method, index))
            }
        };
        MultiValue::singleton(SingleValue::MethodParameter {
            method,
            slot,
            capabilities,
        })
    }

    fn eval_call(&self, ctx: &mut StepCtx<'_>, site: &CallSite) -> MultiValue {
        // Operands are always evaluated so nested calls report their own checkpoints.
        let receiver = site
            .receiver
            .as_ref()
            .map(|expr| self.eval_expr(ctx, expr));
        let args: Vec<MultiValue> = site
            .args
            .iter()
            .map(|expr| self.eval_expr(ctx, expr))
            .collect();

        let Some(callee) = site.callee else {
            return MultiValue::unknown();
        };

        let decl = self.store.method(callee);
        let owner = self.store.type_decl(decl.owner).full_name();
        let shape = CalleeShape {
            owner: &owner,
            name: &decl.name,
            is_static: decl.is_static,
            params: decl.params.iter().map(|p| p.ty.type_name()).collect(),
        };
        if let Some(intrinsic) = intrinsics::recognize(&shape) {
            return self.eval_intrinsic(ctx, intrinsic, callee, receiver, args);
        }

        if !decl.is_static {
            if let Some(value) = &receiver {
                let required = self.annotations.resolve(Slot::Receiver(callee));
                if !required.is_none() {
                    let display = format!("'{}'", self.store.method_display(callee));
                    self.check(ctx, value, required, TargetKind::ThisParameter, display);
                }
            }
        }
        for (index, value) in args.iter().enumerate().take(decl.params.len()) {
            let required = self.annotations.resolve(Slot::Param(callee, index as u32));
            if !required.is_none() {
                let display = self.param_display(callee, index);
                self.check(ctx, value, required, TargetKind::Parameter, display);
            }
        }

        self.call_result(callee)
    }

    /// The abstract result of a statically resolved call: the callee's return-slot
    /// provenance for reflection-capable returns, unknown otherwise.
    fn call_result(&self, callee: MethodId) -> MultiValue {
        if !self.store.method(callee).return_ty.is_type_like() {
            return MultiValue::unknown();
        }
        let capabilities = self.annotations.resolve(Slot::Return(callee));
        MultiValue::singleton(SingleValue::MethodReturn {
            method: callee,
            capabilities,
        })
    }

    fn eval_intrinsic(
        &self,
        ctx: &mut StepCtx<'_>,
        intrinsic: IntrinsicId,
        callee: MethodId,
        receiver: Option<MultiValue>,
        args: Vec<MultiValue>,
    ) -> MultiValue {
        // The common shape: one type operand, one fixed requirement, generic result.
        if let Some((operand, required)) = intrinsic.requirement() {
            let value = match operand {
                TypeOperand::Receiver => receiver.as_ref(),
                TypeOperand::Arg(index) => args.get(index),
            };
            if let Some(value) = value {
                let (kind, display) = match operand {
                    TypeOperand::Receiver => (
                        TargetKind::ThisParameter,
                        format!("'{}'", self.store.method_display(callee)),
                    ),
                    TypeOperand::Arg(index) => {
                        (TargetKind::Parameter, self.param_display(callee, index))
                    }
                };
                self.check(ctx, value, required, kind, display);
            }
            return self.call_result(callee);
        }

        match intrinsic {
            IntrinsicId::TypeFromHandle => {
                args.into_iter().next().unwrap_or_else(MultiValue::unknown)
            }
            IntrinsicId::TypeHandleGetter => receiver.unwrap_or_else(MultiValue::unknown),
            IntrinsicId::ObjectGetType => {
                let Some(receiver) = receiver else {
                    return MultiValue::unknown();
                };
                // Without a class-hierarchy model only exact statically known types
                // survive GetType; everything else could be a derived runtime type.
                MultiValue::from_values(
                    receiver
                        .iter()
                        .map(|value| match value {
                            SingleValue::ConcreteType(ty) => SingleValue::ConcreteType(*ty),
                            SingleValue::MethodReturn { .. }
                            | SingleValue::MethodParameter { .. }
                            | SingleValue::GenericParameter { .. }
                            | SingleValue::Field { .. }
                            | SingleValue::NullableWrapped(_)
                            | SingleValue::Unknown => SingleValue::Unknown,
                        })
                        .collect(),
                )
            }
            // Activation by assembly/type name is never tracked.
            IntrinsicId::ActivatorCreateInstanceNamed => MultiValue::unknown(),
            IntrinsicId::MakeGenericType => self.eval_make_generic_type(ctx, receiver, &args),
            IntrinsicId::MakeGenericMethod => {
                // Method identity is not part of the value domain, so the target
                // method's generic parameters can never be verified here.
                ctx.sink.push(Diagnostic::new(
                    DiagnosticId::MakeGenericMethodUnverifiable,
                    ctx.location,
                    vec![format!("'{}'", self.store.method_display(callee))],
                ));
                MultiValue::unknown()
            }
            IntrinsicId::NullableUnderlyingType => {
                let Some(value) = args.into_iter().next() else {
                    return MultiValue::unknown();
                };
                MultiValue::from_values(
                    value
                        .iter()
                        .map(|element| match element {
                            // Unwrap the projection; the underlying provenance keeps
                            // its annotation.
                            SingleValue::NullableWrapped(inner) => (**inner).clone(),
                            SingleValue::MethodReturn { .. }
                            | SingleValue::MethodParameter { .. }
                            | SingleValue::GenericParameter { .. }
                            | SingleValue::Field { .. } => element.clone(),
                            SingleValue::ConcreteType(_) | SingleValue::Unknown => {
                                SingleValue::Unknown
                            }
                        })
                        .collect(),
                )
            }
            _ => MultiValue::unknown(),
        }
    }

    fn eval_make_generic_type(
        &self,
        ctx: &mut StepCtx<'_>,
        receiver: Option<MultiValue>,
        args: &[MultiValue],
    ) -> MultiValue {
        let Some(receiver) = receiver else {
            return MultiValue::unknown();
        };

        let mut result = Vec::new();
        for element in receiver.iter() {
            let SingleValue::ConcreteType(ty) = element else {
                ctx.sink.push(Diagnostic::new(
                    DiagnosticId::MakeGenericTypeUnverifiable,
                    ctx.location,
                    vec![element.display(self.store)],
                ));
                result.push(SingleValue::Unknown);
                continue;
            };
            let decl = self.store.type_decl(*ty);

            if decl.is_nullable_wrapper() && args.len() == 1 {
                for inner in args[0].iter() {
                    result.push(match inner {
                        SingleValue::NullableWrapped(_) => SingleValue::Unknown,
                        other => SingleValue::wrap_nullable(other.clone()),
                    });
                }
                continue;
            }

            if decl.generic_params.len() != args.len() {
                ctx.sink.push(Diagnostic::new(
                    DiagnosticId::MakeGenericTypeUnverifiable,
                    ctx.location,
                    vec![decl.full_name()],
                ));
                result.push(SingleValue::Unknown);
                continue;
            }

            for (param, value) in decl.generic_params.iter().zip(args) {
                let required = self.annotations.resolve(Slot::GenericParam(*param));
                if !required.is_none() {
                    let display = self.generic_param_display(*param);
                    self.check(ctx, value, required, TargetKind::GenericParameter, display);
                }
            }
            result.push(SingleValue::Unknown);
        }
        MultiValue::from_values(result)
    }

    fn check(
        &self,
        ctx: &mut StepCtx<'_>,
        value: &MultiValue,
        capabilities: MemberCapabilities,
        kind: TargetKind,
        display: String,
    ) {
        let requirement = Requirement {
            capabilities,
            kind,
            display,
            location: ctx.location,
        };
        ctx.sink.extend(self.require.check(value, &requirement));
    }

    fn param_display(&self, method: MethodId, index: usize) -> String {
        let name = self
            .store
            .method(method)
            .params
            .get(index)
            .map_or_else(|| index.to_string(), |p| p.name.clone());
        format!(
            "parameter '{}' of '{}'",
            name,
            self.store.method_display(method)
        )
    }

    fn generic_param_display(&self, param: GenericParamId) -> String {
        format!(
            "generic parameter '{}'",
            self.store.generic_param(param).name
        )
    }
}
