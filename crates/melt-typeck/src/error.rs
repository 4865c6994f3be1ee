//! Type errors.
//!
//! Checking is fail-fast: the first `TypeError` aborts the module. Every
//! variant carries the span of the construct that failed so diagnostics can
//! point at it.

use std::fmt;

use melt_common::span::Span;

use crate::ty::{Effect, Type};

/// What kind of top-level declaration clashed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Interface,
    Record,
    Function,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclKind::Interface => write!(f, "interface"),
            DeclKind::Record => write!(f, "record"),
            DeclKind::Function => write!(f, "function"),
        }
    }
}

/// What an arity mismatch counted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    Arguments,
    TypeArguments,
}

/// A breach of the effect-color discipline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EffectViolation {
    /// A label used with a suffix that does not spell its declared color.
    SuffixMismatch {
        label: String,
        declared: Effect,
        used: Effect,
    },
    /// `!!` in a correct function, or `on`/`escalate` of a correct one.
    CantFail { label: String },
    /// `!!` in a `?` function, whose color comes from its arguments.
    OwnErrorInMaybe { function: String },
    /// An escalation that needs a stronger declared color.
    EscalationNeedsColor {
        function: String,
        callee: String,
        needed: Effect,
    },
    AlreadyHandled { label: String },
    /// A `?` function without a `?` argument to take its color from.
    MaybeWithoutSource { function: String },
    MaybeMethod { record: String, method: String },
    /// A suffix on a parameter that is not function-typed.
    ColoredNonFunction { name: String },
}

impl fmt::Display for EffectViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectViolation::SuffixMismatch {
                label,
                declared: Effect::Fail,
                used: Effect::Correct,
            } => write!(f, "`{label}` can fail: use it as `{label}!`"),
            EffectViolation::SuffixMismatch {
                label,
                declared,
                used,
            } => write!(
                f,
                "`{label}{}` doesn't match the declaration `{label}{}`",
                used.suffix(),
                declared.suffix()
            ),
            EffectViolation::CantFail { label } => {
                write!(f, "`{label}` can't return an error")
            }
            EffectViolation::OwnErrorInMaybe { function } => write!(
                f,
                "`{function}?` takes its color from its `?` arguments and can't return its own error: declare it as `{function}!`"
            ),
            EffectViolation::EscalationNeedsColor {
                function,
                callee,
                needed,
            } => write!(
                f,
                "`{function}` can't escalate `{callee}`: declare it as `{function}{}`",
                needed.suffix()
            ),
            EffectViolation::AlreadyHandled { label } => {
                write!(f, "`{label}` is already handled")
            }
            EffectViolation::MaybeWithoutSource { function } => write!(
                f,
                "`{function}?` needs a `?` argument to take its color from"
            ),
            EffectViolation::MaybeMethod { record, method } => {
                write!(f, "method `{record}.{method}` can't be `?`-colored")
            }
            EffectViolation::ColoredNonFunction { name } => write!(
                f,
                "`{name}` is not a function and can't carry an effect suffix"
            ),
        }
    }
}

/// A type error encountered while loading or checking a module.
#[derive(Clone, Debug)]
pub enum TypeError {
    /// A label not bound in any enclosing scope.
    UndefinedSymbol { name: String, span: Span },
    /// A type name used where a value is expected.
    NotAValue { name: String, span: Span },
    Mismatch {
        expected: Type,
        found: Type,
        span: Span,
    },
    ArityMismatch {
        name: String,
        what: Arity,
        expected: usize,
        found: usize,
        span: Span,
    },
    NotAFunction { name: String, ty: Type, span: Span },
    InvalidOperand { op: String, ty: Type, span: Span },
    /// A call to a function without a return value used as a value.
    NoValue { span: Span },
    NoSuchField {
        ty: Type,
        field: String,
        span: Span,
    },
    MissingField {
        record: String,
        field: String,
        span: Span,
    },
    UnknownField {
        record: String,
        field: String,
        span: Span,
    },
    DuplicateField {
        record: String,
        field: String,
        span: Span,
    },
    NoSuchMethod {
        ty: Type,
        method: String,
        span: Span,
    },
    NotIterable { ty: Type, span: Span },
    NotIndexable { ty: Type, span: Span },
    InvalidLen { ty: Type, span: Span },
    InvalidMake { ty: Type, span: Span },
    EmptyList { span: Span },
    /// A loop label or parameter that shadows an existing binding.
    AlreadyDefined { name: String, span: Span },
    /// A generic function referenced without being called.
    GenericValue { name: String, span: Span },
    InvalidReceiver { ty: Type, span: Span },
    Effect {
        violation: EffectViolation,
        span: Span,
    },
    /// A fallible call left without `on` or `escalate` at the end of its body.
    Unhandled { label: String, span: Span },
    UnificationFailure {
        callee: String,
        expected: Type,
        found: Type,
        span: Span,
    },
    UninferredGeneric {
        callee: String,
        var: String,
        span: Span,
    },
    Redefinition {
        kind: DeclKind,
        name: String,
        span: Span,
    },
    /// Instantiating a generic function keeps requesting new clones, as
    /// polymorphic recursion does.
    InstantiationLimit {
        function: String,
        limit: usize,
        span: Span,
    },
    /// A broken post-condition of the instantiation pass.
    Internal { message: String, span: Span },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::UndefinedSymbol { span, .. }
            | TypeError::NotAValue { span, .. }
            | TypeError::Mismatch { span, .. }
            | TypeError::ArityMismatch { span, .. }
            | TypeError::NotAFunction { span, .. }
            | TypeError::InvalidOperand { span, .. }
            | TypeError::NoValue { span }
            | TypeError::NoSuchField { span, .. }
            | TypeError::MissingField { span, .. }
            | TypeError::UnknownField { span, .. }
            | TypeError::DuplicateField { span, .. }
            | TypeError::NoSuchMethod { span, .. }
            | TypeError::NotIterable { span, .. }
            | TypeError::NotIndexable { span, .. }
            | TypeError::InvalidLen { span, .. }
            | TypeError::InvalidMake { span, .. }
            | TypeError::EmptyList { span }
            | TypeError::AlreadyDefined { span, .. }
            | TypeError::GenericValue { span, .. }
            | TypeError::InvalidReceiver { span, .. }
            | TypeError::Effect { span, .. }
            | TypeError::Unhandled { span, .. }
            | TypeError::UnificationFailure { span, .. }
            | TypeError::UninferredGeneric { span, .. }
            | TypeError::Redefinition { span, .. }
            | TypeError::InstantiationLimit { span, .. }
            | TypeError::Internal { span, .. } => *span,
        }
    }

    pub(crate) fn effect(violation: EffectViolation, span: Span) -> Self {
        TypeError::Effect { violation, span }
    }

    pub(crate) fn mismatch(expected: &Type, found: &Type, span: Span) -> Self {
        TypeError::Mismatch {
            expected: expected.clone(),
            found: found.clone(),
            span,
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::UndefinedSymbol { name, .. } => write!(f, "undefined `{}`", name),
            TypeError::NotAValue { name, .. } => {
                write!(f, "`{}` is a type, not a value", name)
            }
            TypeError::Mismatch {
                expected, found, ..
            } => {
                write!(f, "type mismatch: expected `{}`, found `{}`", expected, found)
            }
            TypeError::ArityMismatch {
                name,
                what,
                expected,
                found,
                ..
            } => {
                let noun = match (what, *expected == 1) {
                    (Arity::Arguments, true) => "argument",
                    (Arity::Arguments, false) => "arguments",
                    (Arity::TypeArguments, true) => "type argument",
                    (Arity::TypeArguments, false) => "type arguments",
                };
                write!(
                    f,
                    "arity mismatch: `{}` expects {} {}, found {}",
                    name, expected, noun, found
                )
            }
            TypeError::NotAFunction { name, ty, .. } => {
                write!(f, "`{}` is not a function, it has type `{}`", name, ty)
            }
            TypeError::InvalidOperand { op, ty, .. } => {
                write!(f, "operator `{}` can't be applied to `{}`", op, ty)
            }
            TypeError::NoValue { .. } => write!(f, "expression has no value"),
            TypeError::NoSuchField { ty, field, .. } => {
                write!(f, "`{}` has no field `{}`", ty, field)
            }
            TypeError::MissingField { record, field, .. } => {
                write!(f, "missing field `{}` in record `{}`", field, record)
            }
            TypeError::UnknownField { record, field, .. } => {
                write!(f, "record `{}` has no field `{}`", record, field)
            }
            TypeError::DuplicateField { record, field, .. } => {
                write!(f, "field `{}` of `{}` is given twice", field, record)
            }
            TypeError::NoSuchMethod { ty, method, .. } => {
                write!(f, "`{}` has no method `{}`", ty, method)
            }
            TypeError::NotIterable { ty, .. } => write!(
                f,
                "can't iterate over `{}`: expected a slice, a map or a duck with `Begin() *T` and `Next() *T`",
                ty
            ),
            TypeError::NotIndexable { ty, .. } => write!(f, "can't index into `{}`", ty),
            TypeError::InvalidLen { ty, .. } => write!(
                f,
                "`len` expects a slice or a duck with `Length() int`, found `{}`",
                ty
            ),
            TypeError::InvalidMake { ty, .. } => {
                write!(f, "`make` expects a slice or map type, found `{}`", ty)
            }
            TypeError::EmptyList { .. } => {
                write!(f, "empty list literal: use `make` to create an empty slice")
            }
            TypeError::AlreadyDefined { name, .. } => write!(f, "`{}` is already defined", name),
            TypeError::GenericValue { name, .. } => write!(
                f,
                "generic function `{}` can only be called, not used as a value",
                name
            ),
            TypeError::InvalidReceiver { ty, .. } => write!(
                f,
                "methods can only be declared on non-generic records, found `{}`",
                ty
            ),
            TypeError::Effect { violation, .. } => write!(f, "{}", violation),
            TypeError::Unhandled { label, .. } => write!(
                f,
                "unhandled failure of `{label}`: handle it with `on {label}:` or `escalate {label}`"
            ),
            TypeError::UnificationFailure {
                callee,
                expected,
                found,
                ..
            } => write!(
                f,
                "cannot unify call to `{}`: expected `{}`, found `{}`",
                callee, expected, found
            ),
            TypeError::UninferredGeneric { callee, var, .. } => {
                write!(f, "cannot infer `{}` for `{}`", var, callee)
            }
            TypeError::Redefinition { kind, name, .. } => {
                write!(f, "{} `{}` can't be redefined", kind, name)
            }
            TypeError::InstantiationLimit {
                function, limit, ..
            } => write!(
                f,
                "cannot instantiate `{}`: more than {} nested instantiations",
                function, limit
            ),
            TypeError::Internal { message, .. } => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for TypeError {}
