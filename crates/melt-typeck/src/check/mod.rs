//! Per-node checks.
//!
//! [`check_module`] registers the top-level functions in the root frame,
//! checks every function body in declaration order and records the generic
//! requests the instantiation pass consumes. Each check fills in the `ty`
//! slots of the nodes it visits and returns the first error it meets.

mod call;
mod expr;

use melt_common::span::Span;
use tracing::{debug, debug_span, info};

use crate::context::{FnContext, Session};
use crate::decls::Declarations;
use crate::error::{EffectViolation, TypeError};
use crate::hir::{Expr, Function, LabelRef, Module, Stmt, StmtKind};
use crate::ty::{Duck, Effect, Type};

/// Check every function of a loaded module.
pub fn check_module(module: &mut Module, session: &mut Session) -> Result<(), TypeError> {
    info!(
        package = %module.package,
        functions = module.functions.len(),
        "checking module"
    );
    collect_functions(module, session);
    for function in &mut module.functions {
        check_function(function, session)?;
    }
    Ok(())
}

/// Register top-level functions in the root frame so bodies may call
/// functions declared later.
fn collect_functions(module: &Module, session: &mut Session) {
    for function in module.functions.iter().filter(|f| f.receiver.is_none()) {
        session
            .env
            .insert(function.label.clone(), Type::Function(function.signature()));
    }
}

pub(crate) struct Checker<'s> {
    pub(crate) s: &'s mut Session,
    pub(crate) fx: FnContext,
}

fn check_function(function: &mut Function, session: &mut Session) -> Result<(), TypeError> {
    let _span = debug_span!("function", label = %function.label).entered();
    let is_generic = function.signature().is_generic();
    debug!(effect = %function.effect, is_generic, "checking function");

    let mut checker = Checker {
        s: session,
        fx: FnContext::new(
            &function.label,
            function.ret.clone(),
            function.effect,
            is_generic,
        ),
    };

    checker.s.env.push_frame();
    let result = checker.function_body(function);
    checker.s.env.pop_frame();
    result?;
    checker.finish(function)
}

impl Checker<'_> {
    fn function_body(&mut self, function: &mut Function) -> Result<(), TypeError> {
        if let Some(receiver) = &function.receiver {
            self.s.env.insert(
                receiver.name.clone(),
                Type::record(receiver.record.clone(), Vec::new()),
            );
        }
        for param in &function.params {
            if self.s.env.contains(&param.name) {
                return Err(TypeError::AlreadyDefined {
                    name: param.name.clone(),
                    span: param.span,
                });
            }
            self.s.env.insert(param.name.clone(), param.ty.clone());
        }
        self.block(&mut function.body)
    }

    /// End-of-body effect checks: escalations fit the declared color and no
    /// fallible call was left unhandled.
    fn finish(&self, function: &Function) -> Result<(), TypeError> {
        if self.fx.required > self.fx.declared {
            let (callee, span) = self
                .fx
                .required_by
                .clone()
                .unwrap_or_else(|| (function.label.clone(), function.span));
            return Err(TypeError::effect(
                EffectViolation::EscalationNeedsColor {
                    function: function.label.clone(),
                    callee,
                    needed: self.fx.required,
                },
                span,
            ));
        }
        if let Some((label, span)) = self.fx.first_unhandled() {
            return Err(TypeError::Unhandled {
                label: label.to_string(),
                span,
            });
        }
        Ok(())
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn block(&mut self, body: &mut [Stmt]) -> Result<(), TypeError> {
        for stmt in body {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    /// Check a block in a fresh frame.
    fn scoped_block(
        &mut self,
        bindings: Vec<(String, Type)>,
        body: &mut [Stmt],
    ) -> Result<(), TypeError> {
        self.s.env.push_frame();
        for (name, ty) in bindings {
            self.s.env.insert(name, ty);
        }
        let result = self.block(body);
        self.s.env.pop_frame();
        result
    }

    fn stmt(&mut self, stmt: &mut Stmt) -> Result<(), TypeError> {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::Set { label, value } => self.set(label, value),
            StmtKind::IndexAssign {
                collection,
                index,
                value,
            } => self.index_assign(collection, index, value),
            StmtKind::Return(value) => self.return_stmt(value.as_mut(), span),
            StmtKind::ReturnError(value) => self.return_error(value, span),
            StmtKind::Escalate(labels) => {
                for label in labels.iter() {
                    self.escalate(label)?;
                }
                Ok(())
            }
            StmtKind::On { label, body } => {
                self.on(label)?;
                self.scoped_block(vec![("$err".to_string(), Type::Error)], body)
            }
            StmtKind::ForIn {
                index,
                value,
                sequence,
                body,
            } => {
                let bindings = self.for_in(index.as_ref(), value, sequence)?;
                self.scoped_block(bindings, body)
            }
            StmtKind::ForRange {
                index,
                start,
                end,
                body,
                ..
            } => {
                for bound in [&mut *start, &mut *end] {
                    let ty = self.value(bound)?;
                    if !ty.is_basic("int") {
                        return Err(TypeError::mismatch(&Type::int(), &ty, bound.span));
                    }
                }
                self.fresh_label(index)?;
                self.scoped_block(vec![(index.name.clone(), Type::int())], body)
            }
            StmtKind::If {
                test,
                then,
                otherwise,
            } => {
                let ty = self.value(test)?;
                if !ty.is_basic("bool") {
                    return Err(TypeError::mismatch(&Type::bool(), &ty, test.span));
                }
                self.scoped_block(Vec::new(), then)?;
                self.scoped_block(Vec::new(), otherwise)
            }
            StmtKind::Expr(expr) => self.expr(expr),
        }
    }

    fn set(&mut self, label: &LabelRef, value: &mut Expr) -> Result<(), TypeError> {
        let ty = self.value(value)?;
        match self.lookup_value(label)? {
            Some(existing) => {
                if !existing.accepts(&ty, &self.s.decls) {
                    return Err(TypeError::mismatch(&existing, &ty, value.span));
                }
            }
            None => self.s.env.insert(label.name.clone(), ty),
        }
        Ok(())
    }

    fn index_assign(
        &mut self,
        collection: &mut Expr,
        index: &mut Expr,
        value: &mut Expr,
    ) -> Result<(), TypeError> {
        let collection_ty = self.value(collection)?.deref().clone();
        let index_ty = self.value(index)?;
        let value_ty = self.value(value)?;
        let (key, element) = match &collection_ty {
            Type::Slice(slice) => (Type::int(), (*slice.element).clone()),
            Type::Map(map) => ((*map.key).clone(), (*map.value).clone()),
            other => {
                return Err(TypeError::NotIndexable {
                    ty: other.clone(),
                    span: collection.span,
                })
            }
        };
        if !key.accepts(&index_ty, &self.s.decls) {
            return Err(TypeError::mismatch(&key, &index_ty, index.span));
        }
        if !element.accepts(&value_ty, &self.s.decls) {
            return Err(TypeError::mismatch(&element, &value_ty, value.span));
        }
        Ok(())
    }

    fn return_stmt(&mut self, value: Option<&mut Expr>, span: Span) -> Result<(), TypeError> {
        let ret = self.fx.ret.clone();
        match value {
            Some(value) => {
                let ty = self.value(value)?;
                if ret == Type::Empty || !ret.accepts(&ty, &self.s.decls) {
                    return Err(TypeError::mismatch(&ret, &ty, value.span));
                }
            }
            None if ret != Type::Empty => {
                return Err(TypeError::mismatch(&ret, &Type::Empty, span));
            }
            None => {}
        }
        Ok(())
    }

    fn return_error(&mut self, value: &mut Expr, span: Span) -> Result<(), TypeError> {
        match self.fx.declared {
            Effect::Correct => {
                return Err(TypeError::effect(
                    EffectViolation::CantFail {
                        label: self.fx.label.clone(),
                    },
                    span,
                ))
            }
            Effect::Maybe => {
                return Err(TypeError::effect(
                    EffectViolation::OwnErrorInMaybe {
                        function: self.fx.label.clone(),
                    },
                    span,
                ))
            }
            Effect::Fail => {}
        }
        let ty = self.value(value)?;
        if !ty.is_basic("string") {
            return Err(TypeError::mismatch(&Type::string(), &ty, value.span));
        }
        Ok(())
    }

    /// The declared color of a fallible function named by `on`/`escalate`
    /// that has no pending call.
    fn declared_color(&self, label: &LabelRef) -> Result<Effect, TypeError> {
        let ty = self
            .s
            .env
            .lookup(&label.name)
            .ok_or_else(|| TypeError::UndefinedSymbol {
                name: label.name.clone(),
                span: label.span,
            })?;
        let effect = match ty {
            Type::Function(f) => f.effect,
            other => {
                return Err(TypeError::NotAFunction {
                    name: label.name.clone(),
                    ty: other.clone(),
                    span: label.span,
                })
            }
        };
        if effect == Effect::Correct {
            return Err(TypeError::effect(
                EffectViolation::CantFail {
                    label: label.name.clone(),
                },
                label.span,
            ));
        }
        Ok(effect)
    }

    fn escalate(&mut self, label: &LabelRef) -> Result<(), TypeError> {
        let effect = match self.fx.discharge(&label.name) {
            Some(effect) => effect,
            None if self.fx.handled.contains(&label.name) => {
                return Err(TypeError::effect(
                    EffectViolation::AlreadyHandled {
                        label: label.name.clone(),
                    },
                    label.span,
                ))
            }
            None => {
                let effect = self.declared_color(label)?;
                self.fx.handled.insert(label.name.clone());
                effect
            }
        };
        self.fx.require(effect, &label.name, label.span);
        Ok(())
    }

    fn on(&mut self, label: &LabelRef) -> Result<(), TypeError> {
        if self.fx.discharge(&label.name).is_some() {
            return Ok(());
        }
        if self.fx.handled.contains(&label.name) {
            return Err(TypeError::effect(
                EffectViolation::AlreadyHandled {
                    label: label.name.clone(),
                },
                label.span,
            ));
        }
        self.declared_color(label)?;
        self.fx.handled.insert(label.name.clone());
        Ok(())
    }

    /// A loop label must not shadow anything in scope.
    fn fresh_label(&self, label: &LabelRef) -> Result<(), TypeError> {
        if self.s.env.lookup(&label.name).is_some() {
            return Err(TypeError::AlreadyDefined {
                name: label.name.clone(),
                span: label.span,
            });
        }
        Ok(())
    }

    fn for_in(
        &mut self,
        index: Option<&LabelRef>,
        value: &LabelRef,
        sequence: &mut Expr,
    ) -> Result<Vec<(String, Type)>, TypeError> {
        let seq = self.value(sequence)?.deref().clone();
        if let Some(index) = index {
            self.fresh_label(index)?;
        }
        self.fresh_label(value)?;
        let (key, element) =
            iteration_types(&seq, &self.s.decls).ok_or_else(|| TypeError::NotIterable {
                ty: seq.clone(),
                span: sequence.span,
            })?;

        let mut bindings = Vec::new();
        if let Some(index) = index {
            bindings.push((index.name.clone(), key));
        }
        bindings.push((value.name.clone(), element));
        Ok(bindings)
    }
}

/// Index and element types of a `for` over `seq`. Maps yield key and value;
/// slices and ducks with `Begin`/`Next` cursors yield an `int` index and
/// the element.
pub(crate) fn iteration_types(seq: &Type, decls: &Declarations) -> Option<(Type, Type)> {
    match seq {
        Type::Map(map) => Some(((*map.key).clone(), (*map.value).clone())),
        Type::Slice(slice) => Some((Type::int(), (*slice.element).clone())),
        other => {
            let duck = other.as_duck()?;
            let cursor = |name: &str| {
                let f = duck.method(name, decls)?.function;
                if !f.args.is_empty() || f.effect != Effect::Correct {
                    return None;
                }
                match *f.ret {
                    Type::Pointer(pointee) => Some(*pointee),
                    _ => None,
                }
            };
            let begin = cursor("Begin")?;
            let next = cursor("Next")?;
            if !begin.accepts(&next, decls) {
                return None;
            }
            Some((Type::int(), next))
        }
    }
}
