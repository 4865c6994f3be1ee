use melt_common::span::Span;

use super::Checker;
use crate::builtins;
use crate::error::{Arity, TypeError};
use crate::hir::{BinaryOp, Expr, ExprKind, TemplatePart};
use crate::ty::Type;
use crate::unify::{match_type, GenericMap};

impl Checker<'_> {
    /// Check an expression that must produce a value.
    pub(super) fn value(&mut self, expr: &mut Expr) -> Result<Type, TypeError> {
        self.expr(expr)?;
        if expr.ty == Type::Empty {
            return Err(TypeError::NoValue { span: expr.span });
        }
        Ok(expr.ty.clone())
    }

    /// Check an expression and fill in its type.
    pub(super) fn expr(&mut self, expr: &mut Expr) -> Result<(), TypeError> {
        let span = expr.span;
        let nested = match expr.kind {
            ExprKind::Call { .. } => Some(self.call(expr)?),
            ExprKind::MethodCall { .. } => Some(self.method_call(expr)?),
            ExprKind::RecordLiteral { .. } => Some(self.record_literal(expr)?),
            _ => None,
        };
        if let Some(ty) = nested {
            expr.ty = ty;
            return Ok(());
        }

        let ty = match &mut expr.kind {
            ExprKind::Int(_) => Type::int(),
            ExprKind::Float(_) => Type::float(),
            ExprKind::Bool(_) => Type::bool(),
            ExprKind::Nil => Type::Nil,
            ExprKind::Str(_) => Type::string(),
            ExprKind::Template(parts) => {
                for part in parts.iter_mut() {
                    if let TemplatePart::Expr(e) = part {
                        self.value(e)?;
                    }
                }
                Type::string()
            }
            ExprKind::Label(label) => self.label_value(label)?,
            ExprKind::ErrorRef => self
                .s
                .env
                .lookup("$err")
                .cloned()
                .ok_or_else(|| TypeError::UndefinedSymbol {
                    name: "$err".into(),
                    span,
                })?,
            ExprKind::List(items) => {
                let Some((first, rest)) = items.split_first_mut() else {
                    return Err(TypeError::EmptyList { span });
                };
                let element = self.value(first)?;
                for item in rest {
                    let ty = self.value(item)?;
                    if !element.accepts(&ty, &self.s.decls) {
                        return Err(TypeError::mismatch(&element, &ty, item.span));
                    }
                }
                Type::slice(element)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let op = *op;
                let l = self.value(lhs)?;
                let r = self.value(rhs)?;
                binary_result(op, &l, &r, span)?
            }
            ExprKind::Cmp { lhs, rhs, .. } => {
                let l = self.value(lhs)?;
                let r = self.value(rhs)?;
                if !l.accepts(&r, &self.s.decls) {
                    return Err(TypeError::mismatch(&l, &r, rhs.span));
                }
                Type::bool()
            }
            ExprKind::Unary { op, operand } => {
                let ty = self.value(operand)?;
                if !matches!(&ty, Type::Basic(label) if builtins::is_numeric(label)) {
                    return Err(TypeError::InvalidOperand {
                        op: op.symbol().into(),
                        ty,
                        span,
                    });
                }
                ty
            }
            ExprKind::Field { base, field } => {
                let base_ty = self.value(base)?;
                let target = base_ty.deref();
                let found = match target {
                    Type::Record(record) => self.s.decls.field_type(record, field),
                    _ => None,
                };
                found.ok_or_else(|| TypeError::NoSuchField {
                    ty: target.clone(),
                    field: field.clone(),
                    span,
                })?
            }
            ExprKind::Index { base, index } => {
                let base_ty = self.value(base)?;
                let index_ty = self.value(index)?;
                let (key, element) = match base_ty.deref() {
                    Type::Slice(slice) => (Type::int(), (*slice.element).clone()),
                    Type::Map(map) => ((*map.key).clone(), (*map.value).clone()),
                    other => {
                        return Err(TypeError::NotIndexable {
                            ty: other.clone(),
                            span: base.span,
                        })
                    }
                };
                if !key.accepts(&index_ty, &self.s.decls) {
                    return Err(TypeError::mismatch(&key, &index_ty, index.span));
                }
                element
            }
            ExprKind::Make { ty, args } => {
                let expected = match ty {
                    Type::Slice(_) => 1,
                    Type::Map(_) => 0,
                    other => {
                        return Err(TypeError::InvalidMake {
                            ty: other.clone(),
                            span,
                        })
                    }
                };
                if args.len() != expected {
                    return Err(TypeError::ArityMismatch {
                        name: "make".into(),
                        what: Arity::Arguments,
                        expected,
                        found: args.len(),
                        span,
                    });
                }
                for arg in args.iter_mut() {
                    let size = self.value(arg)?;
                    if !size.is_basic("int") {
                        return Err(TypeError::mismatch(&Type::int(), &size, arg.span));
                    }
                }
                ty.clone()
            }
            ExprKind::Call { .. } | ExprKind::MethodCall { .. } | ExprKind::RecordLiteral { .. } => {
                return Err(TypeError::Internal {
                    message: "nested expression dispatched twice".into(),
                    span,
                })
            }
        };
        expr.ty = ty;
        Ok(())
    }

    fn record_literal(&mut self, expr: &mut Expr) -> Result<Type, TypeError> {
        let span = expr.span;
        let ExprKind::RecordLiteral { record, fields } = &mut expr.kind else {
            return Err(TypeError::Internal {
                message: "record check on a non-record literal".into(),
                span,
            });
        };
        let def = self
            .s
            .decls
            .record(record)
            .cloned()
            .ok_or_else(|| TypeError::UndefinedSymbol {
                name: record.clone(),
                span,
            })?;

        let mut map = GenericMap::new(&def.generic_vars);
        let mut seen: Vec<String> = Vec::new();
        for (name, value) in fields.iter_mut() {
            let Some(declared) = def.field(name) else {
                return Err(TypeError::UnknownField {
                    record: def.label.clone(),
                    field: name.clone(),
                    span: value.span,
                });
            };
            if seen.contains(name) {
                return Err(TypeError::DuplicateField {
                    record: def.label.clone(),
                    field: name.clone(),
                    span: value.span,
                });
            }
            seen.push(name.clone());

            let actual = self.value(value)?;
            if def.generic_vars.is_empty() {
                if !declared.accepts(&actual, &self.s.decls) {
                    return Err(TypeError::mismatch(declared, &actual, value.span));
                }
            } else {
                match_type(declared, &actual, &mut map, &self.s.decls).map_err(|m| {
                    TypeError::UnificationFailure {
                        callee: def.label.clone(),
                        expected: m.expected,
                        found: m.found,
                        span: value.span,
                    }
                })?;
            }
        }
        if let Some((missing, _)) = def.fields.iter().find(|(n, _)| !seen.contains(n)) {
            return Err(TypeError::MissingField {
                record: def.label.clone(),
                field: missing.clone(),
                span,
            });
        }
        if let Some(var) = map.unbound() {
            return Err(TypeError::UninferredGeneric {
                callee: def.label.clone(),
                var: var.to_string(),
                span,
            });
        }
        let instance_vars = def
            .generic_vars
            .iter()
            .map(|v| map.types.get(v).cloned().unwrap_or(Type::Empty))
            .collect();
        Ok(Type::record(def.label, instance_vars))
    }
}

/// Result type of an arithmetic operator on two basic operands.
fn binary_result(
    op: BinaryOp,
    lhs: &Type,
    rhs: &Type,
    span: Span,
) -> Result<Type, TypeError> {
    let invalid = |ty: &Type| TypeError::InvalidOperand {
        op: op.symbol().into(),
        ty: ty.clone(),
        span,
    };
    let (Type::Basic(l), Type::Basic(r)) = (lhs, rhs) else {
        let bad = if matches!(lhs, Type::Basic(_)) { rhs } else { lhs };
        return Err(invalid(bad));
    };
    match (l.as_str(), r.as_str()) {
        ("string", "string") if op == BinaryOp::Add => Ok(Type::string()),
        ("string", "string") => Err(invalid(lhs)),
        ("bool", _) => Err(invalid(lhs)),
        (_, "bool") => Err(invalid(rhs)),
        ("int", "float") | ("float", "int") => Ok(Type::float()),
        (a, b) if a == b && builtins::is_numeric(a) => Ok(lhs.clone()),
        (a, _) if a == r.as_str() => Err(invalid(lhs)),
        _ => Err(TypeError::mismatch(lhs, rhs, span)),
    }
}
