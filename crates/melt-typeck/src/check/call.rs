//! Labels, calls and method calls.
//!
//! Resolving a label validates its effect suffix against the declaration.
//! A call to a generic or `?` top-level function goes through
//! [`match_type`]; the solved map colors the call and is recorded for the
//! instantiation pass. Fallible calls become effect obligations of the
//! enclosing function.

use melt_common::span::Span;
use tracing::trace;

use super::Checker;
use crate::builtins;
use crate::env::Binding;
use crate::error::{Arity, EffectViolation, TypeError};
use crate::hir::{Expr, ExprKind, LabelRef};
use crate::replace::replace_signature;
use crate::ty::{Duck, Effect, FunctionType, Type};
use crate::unify::{match_type, GenericMap};

/// Validate a use of `label` against the declared color of a function.
fn check_suffix(label: &LabelRef, declared: Effect) -> Result<(), TypeError> {
    let ok = match label.suffix {
        Effect::Correct => declared != Effect::Fail,
        used => used == declared,
    };
    if ok {
        Ok(())
    } else {
        Err(TypeError::effect(
            EffectViolation::SuffixMismatch {
                label: label.name.clone(),
                declared,
                used: label.suffix,
            },
            label.span,
        ))
    }
}

impl Checker<'_> {
    /// Resolve a label through the scope chain, checking its suffix.
    pub(super) fn resolve_label(&self, label: &LabelRef) -> Result<(Type, Binding), TypeError> {
        let (ty, binding) =
            self.s
                .env
                .resolve(&label.name)
                .ok_or_else(|| TypeError::UndefinedSymbol {
                    name: label.name.clone(),
                    span: label.span,
                })?;
        if binding == Binding::Root && self.s.is_type_name(&label.name) {
            return Err(TypeError::NotAValue {
                name: label.name.clone(),
                span: label.span,
            });
        }
        match ty {
            Type::Function(f) => check_suffix(label, f.effect)?,
            other if label.suffix != Effect::Correct => {
                return Err(TypeError::NotAFunction {
                    name: label.name.clone(),
                    ty: other.clone(),
                    span: label.span,
                })
            }
            _ => {}
        }
        Ok((ty.clone(), binding))
    }

    /// The type of an existing value binding, or `None` for a fresh label.
    pub(super) fn lookup_value(&self, label: &LabelRef) -> Result<Option<Type>, TypeError> {
        if self.s.env.lookup(&label.name).is_none() {
            return Ok(None);
        }
        self.resolve_label(label).map(|(ty, _)| Some(ty))
    }

    /// A label used as a value rather than called.
    pub(super) fn label_value(&self, label: &LabelRef) -> Result<Type, TypeError> {
        let (ty, binding) = self.resolve_label(label)?;
        if let (Type::Function(f), Binding::Root) = (&ty, binding) {
            if f.is_generic() {
                return Err(TypeError::GenericValue {
                    name: label.name.clone(),
                    span: label.span,
                });
            }
        }
        Ok(ty)
    }

    /// Record a call of resolved color `effect` as an obligation.
    fn note_fallible(&mut self, label: &str, effect: Effect, span: Span) {
        if effect.is_fallible() {
            self.fx.mark_unhandled(label, effect, span);
        }
    }

    // ── Calls ──────────────────────────────────────────────────────────

    pub(super) fn call(&mut self, expr: &mut Expr) -> Result<Type, TypeError> {
        let span = expr.span;
        let ExprKind::Call {
            callee,
            args,
            effect,
        } = &mut expr.kind
        else {
            return Err(TypeError::Internal {
                message: "call check on a non-call".into(),
                span,
            });
        };

        let (ty, binding) = self.resolve_label(callee)?;
        if binding == Binding::Root && callee.name == builtins::LEN {
            return self.len(args, span);
        }
        if binding == Binding::Root && callee.name == builtins::PRINT {
            return self.print(args, span);
        }
        let Type::Function(f) = ty else {
            return Err(TypeError::NotAFunction {
                name: callee.name.clone(),
                ty,
                span: callee.span,
            });
        };
        if f.args.len() != args.len() {
            return Err(TypeError::ArityMismatch {
                name: callee.name.clone(),
                what: Arity::Arguments,
                expected: f.args.len(),
                found: args.len(),
                span,
            });
        }
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            arg_types.push(self.value(arg)?);
        }

        let (ret, resolved) = if binding == Binding::Root && f.is_generic() {
            self.generic_call(&callee.name, &f, args, &arg_types, span)?
        } else {
            for ((declared, actual), arg) in f.args.iter().zip(&arg_types).zip(args.iter()) {
                if !declared.accepts(actual, &self.s.decls) {
                    return Err(TypeError::mismatch(declared, actual, arg.span));
                }
            }
            self.note_fallible(&callee.name, f.effect, span);
            ((*f.ret).clone(), f.effect)
        };
        *effect = resolved;
        Ok(ret)
    }

    /// Unify a generic callee against the call's arguments.
    fn generic_call(
        &mut self,
        callee: &str,
        f: &FunctionType,
        args: &[Expr],
        arg_types: &[Type],
        span: Span,
    ) -> Result<(Type, Effect), TypeError> {
        let mut map = GenericMap::new(&f.generic_vars);
        for ((declared, actual), arg) in f.args.iter().zip(arg_types).zip(args) {
            match_type(declared, actual, &mut map, &self.s.decls).map_err(|m| {
                TypeError::UnificationFailure {
                    callee: callee.to_string(),
                    expected: m.expected,
                    found: m.found,
                    span: arg.span,
                }
            })?;
        }
        if let Some(var) = map.unbound() {
            return Err(TypeError::UninferredGeneric {
                callee: callee.to_string(),
                var: var.to_string(),
                span,
            });
        }

        let signature = replace_signature(f, &map);
        let effect = signature.effect;
        trace!(callee, key = %map.key(), %effect, "generic call");
        if self.fx.is_generic {
            let caller = self.fx.label.clone();
            self.s.record_dependency(&caller, callee, map);
            match effect {
                Effect::Fail => self.fx.mark_unhandled(callee, effect, span),
                // Forwarded `?`: the color is only known per clone.
                Effect::Maybe => self.fx.require(Effect::Maybe, callee, span),
                Effect::Correct => {}
            }
        } else {
            self.s.record_instantiation(callee, map);
            self.note_fallible(callee, effect, span);
        }
        Ok((*signature.ret, effect))
    }

    /// `len(x)`: a slice, or a duck with `Length() int`.
    fn len(&mut self, args: &mut [Expr], span: Span) -> Result<Type, TypeError> {
        let [arg] = args else {
            return Err(TypeError::ArityMismatch {
                name: builtins::LEN.into(),
                what: Arity::Arguments,
                expected: 1,
                found: args.len(),
                span,
            });
        };
        let ty = self.value(arg)?;
        let valid = match &ty {
            Type::Slice(_) => true,
            other => other
                .as_duck()
                .and_then(|duck| duck.method("Length", &self.s.decls))
                .map_or(false, |m| {
                    m.function.args.is_empty()
                        && m.function.effect == Effect::Correct
                        && m.function.generic_vars.is_empty()
                        && m.function.ret.is_basic("int")
                }),
        };
        if !valid {
            return Err(TypeError::InvalidLen { ty, span: arg.span });
        }
        Ok(Type::int())
    }

    /// `print(x)`: any single value, yields the printed string.
    fn print(&mut self, args: &mut [Expr], span: Span) -> Result<Type, TypeError> {
        let [arg] = args else {
            return Err(TypeError::ArityMismatch {
                name: builtins::PRINT.into(),
                what: Arity::Arguments,
                expected: 1,
                found: args.len(),
                span,
            });
        };
        self.value(arg)?;
        Ok(Type::string())
    }

    // ── Method calls ───────────────────────────────────────────────────

    pub(super) fn method_call(&mut self, expr: &mut Expr) -> Result<Type, TypeError> {
        let span = expr.span;
        let ExprKind::MethodCall {
            receiver,
            method,
            args,
            effect,
        } = &mut expr.kind
        else {
            return Err(TypeError::Internal {
                message: "method check on a non-method call".into(),
                span,
            });
        };

        let receiver_ty = self.value(receiver)?;
        let target = receiver_ty.deref();
        let found = target
            .as_duck()
            .and_then(|duck| duck.method(&method.name, &self.s.decls))
            .ok_or_else(|| TypeError::NoSuchMethod {
                ty: target.clone(),
                method: method.name.clone(),
                span: method.span,
            })?;
        let f = found.function;
        check_suffix(method, f.effect)?;
        if f.args.len() != args.len() {
            return Err(TypeError::ArityMismatch {
                name: method.name.clone(),
                what: Arity::Arguments,
                expected: f.args.len(),
                found: args.len(),
                span,
            });
        }
        for (declared, arg) in f.args.iter().zip(args.iter_mut()) {
            let actual = self.value(arg)?;
            if !declared.accepts(&actual, &self.s.decls) {
                return Err(TypeError::mismatch(declared, &actual, arg.span));
            }
        }

        // The implementation behind an interface is unknown: a `?` method
        // may fail.
        let resolved = match f.effect {
            Effect::Maybe => Effect::Fail,
            other => other,
        };
        self.note_fallible(&method.name, resolved, span);
        *effect = resolved;
        Ok(*f.ret)
    }
}
