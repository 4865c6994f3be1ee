//! Loader: CST -> typed AST.
//!
//! Walks the parser's typed CST wrappers and builds the owned [`hir`]
//! module plus the [`Declarations`] registry. Type expressions are resolved
//! here. Record and interface names are registered before any type is
//! resolved, so declarations may be used before they appear and records may
//! refer to themselves.

use melt_common::span::Span;
use melt_parser::ast::expr::{Expr as AstExpr, StringPart};
use melt_parser::ast::item::{FnDef, InterfaceDef as AstInterface, RecordDef as AstRecord, SourceFile};
use melt_parser::ast::stmt::{IfStmt, Stmt as AstStmt};
use melt_parser::ast::ty::TypeExpr;
use melt_parser::ast::AstNode;
use melt_parser::cst::{SyntaxNode, SyntaxToken};
use melt_parser::syntax_kind::SyntaxKind;

use crate::builtins;
use crate::decls::{Declarations, InterfaceDef, RecordDef};
use crate::error::{Arity, DeclKind, EffectViolation, TypeError};
use crate::hir::{
    BinaryOp, CmpOp, Expr, ExprKind, Function, Import, LabelRef, Module, Param, Receiver, Stmt,
    StmtKind, TemplatePart, UnaryOp,
};
use crate::ty::{split_label, Effect, FunctionType, Method, Type};

pub(crate) fn span_of(range: rowan::TextRange) -> Span {
    Span::new(range.start().into(), range.end().into())
}

fn node_span(node: &SyntaxNode) -> Span {
    span_of(node.text_range())
}

fn malformed(span: Span) -> TypeError {
    TypeError::Internal {
        message: "malformed syntax tree".into(),
        span,
    }
}

/// Build the typed AST and declaration registry for a parsed file.
pub fn load(file: &SourceFile) -> Result<(Module, Declarations), TypeError> {
    let mut loader = Loader {
        decls: Declarations::default(),
    };
    let package = file
        .package()
        .and_then(|p| p.name())
        .and_then(|n| n.text())
        .unwrap_or_else(|| "main".to_string());
    let imports = file
        .imports()
        .flat_map(|decl| decl.groups())
        .map(|group| Import {
            kind: group.kind().map(|t| t.text().to_string()).unwrap_or_default(),
            paths: group.paths(),
        })
        .collect();

    let interfaces: Vec<AstInterface> = file.interfaces().collect();
    let records: Vec<AstRecord> = file.records().collect();
    for iface in &interfaces {
        loader.declare_interface(iface)?;
    }
    for record in &records {
        loader.declare_record(record)?;
    }
    for iface in &interfaces {
        loader.load_interface(iface)?;
    }
    for record in &records {
        loader.load_record(record)?;
    }

    let mut functions: Vec<Function> = Vec::new();
    for def in file.fn_defs() {
        let function = loader.load_function(&def)?;
        if function.receiver.is_none() {
            let label = function.label.as_str();
            let taken = label == builtins::LEN
                || label == builtins::PRINT
                || builtins::is_builtin_type(label)
                || loader.decls.generic_arity(label).is_some()
                || functions
                    .iter()
                    .any(|f| f.receiver.is_none() && f.label == label);
            if taken {
                return Err(TypeError::Redefinition {
                    kind: DeclKind::Function,
                    name: function.label,
                    span: function.span,
                });
            }
        }
        functions.push(function);
    }

    let module = Module {
        package,
        imports,
        interfaces: loader.decls.interfaces().to_vec(),
        records: loader.decls.records().to_vec(),
        functions,
        record_instances: Vec::new(),
    };
    Ok((module, loader.decls))
}

struct Loader {
    decls: Declarations,
}

/// Name text and span of an item's `NAME` child.
fn item_name(name: Option<melt_parser::ast::item::Name>, parent: &SyntaxNode) -> Result<(String, Span), TypeError> {
    let name = name.ok_or_else(|| malformed(node_span(parent)))?;
    let text = name.text().ok_or_else(|| malformed(node_span(parent)))?;
    Ok((text, node_span(name.syntax())))
}

fn generic_names(list: Option<melt_parser::ast::item::GenericParamList>) -> Vec<String> {
    list.map(|l| l.names().filter_map(|n| n.text()).collect())
        .unwrap_or_default()
}

fn check_free_name(decls: &Declarations, kind: DeclKind, name: &str, span: Span) -> Result<(), TypeError> {
    if builtins::is_builtin_type(name) || decls.generic_arity(name).is_some() {
        return Err(TypeError::Redefinition {
            kind,
            name: name.to_string(),
            span,
        });
    }
    Ok(())
}

impl Loader {
    // ── Declarations ───────────────────────────────────────────────────

    fn declare_interface(&mut self, def: &AstInterface) -> Result<(), TypeError> {
        let (label, span) = item_name(def.name(), def.syntax())?;
        check_free_name(&self.decls, DeclKind::Interface, &label, span)?;
        let generic_vars = generic_names(def.generic_params());
        self.decls
            .add_interface(InterfaceDef {
                label,
                generic_vars,
                methods: Vec::new(),
                span,
            })
            .map_err(|_| malformed(span))
    }

    fn declare_record(&mut self, def: &AstRecord) -> Result<(), TypeError> {
        let (label, span) = item_name(def.name(), def.syntax())?;
        check_free_name(&self.decls, DeclKind::Record, &label, span)?;
        let generic_vars = generic_names(def.generic_params());
        self.decls
            .add_record(RecordDef {
                label,
                generic_vars,
                fields: Vec::new(),
                methods: Vec::new(),
                span,
            })
            .map_err(|_| malformed(span))
    }

    fn load_interface(&mut self, def: &AstInterface) -> Result<(), TypeError> {
        let (label, _) = item_name(def.name(), def.syntax())?;
        let generics = generic_names(def.generic_params());
        let mut methods: Vec<Method> = Vec::new();
        for method in def.methods() {
            let (name, span) = item_name(method.name(), method.syntax())?;
            let (base, effect) = split_label(&name);
            let args = method
                .param_types()
                .iter()
                .map(|t| self.resolve_type(t, &generics))
                .collect::<Result<Vec<_>, _>>()?;
            let ret = match method.ret_type().and_then(|r| r.ty()) {
                Some(t) => self.resolve_type(&t, &generics)?,
                None => Type::Empty,
            };
            if methods.iter().any(|m| m.label == base) {
                return Err(TypeError::Redefinition {
                    kind: DeclKind::Function,
                    name: format!("{}.{}", label, base),
                    span,
                });
            }
            methods.push(Method {
                label: base.to_string(),
                function: FunctionType::new(args, ret, effect),
            });
        }
        if let Some(iface) = self.decls.interface_mut(&label) {
            iface.methods = methods;
        }
        Ok(())
    }

    fn load_record(&mut self, def: &AstRecord) -> Result<(), TypeError> {
        let (label, _) = item_name(def.name(), def.syntax())?;
        let generics = generic_names(def.generic_params());
        let mut fields: Vec<(String, Type)> = Vec::new();
        for field in def.fields() {
            let (name, span) = item_name(field.name(), field.syntax())?;
            let ty = field.ty().ok_or_else(|| malformed(span))?;
            let ty = self.resolve_type(&ty, &generics)?;
            if fields.iter().any(|(n, _)| *n == name) {
                return Err(TypeError::DuplicateField {
                    record: label.clone(),
                    field: name,
                    span,
                });
            }
            fields.push((name, ty));
        }
        if let Some(record) = self.decls.record_mut(&label) {
            record.fields = fields;
        }
        Ok(())
    }

    // ── Types ──────────────────────────────────────────────────────────

    fn resolve_type(&self, texpr: &TypeExpr, generics: &[String]) -> Result<Type, TypeError> {
        let span = node_span(texpr.syntax());
        match texpr {
            TypeExpr::Named(named) => {
                let name = named.name().ok_or_else(|| malformed(span))?;
                let args: Vec<TypeExpr> = named
                    .generic_args()
                    .map(|list| list.types().collect())
                    .unwrap_or_default();
                self.resolve_named(name.text(), &args, generics, span)
            }
            TypeExpr::Pointer(ptr) => {
                let inner = ptr.pointee().ok_or_else(|| malformed(span))?;
                Ok(Type::pointer(self.resolve_type(&inner, generics)?))
            }
            TypeExpr::Slice(slice) => {
                let inner = slice.element().ok_or_else(|| malformed(span))?;
                Ok(Type::slice(self.resolve_type(&inner, generics)?))
            }
            TypeExpr::Map(map) => {
                let key = map.key().ok_or_else(|| malformed(span))?;
                let value = map.value().ok_or_else(|| malformed(span))?;
                Ok(Type::map(
                    self.resolve_type(&key, generics)?,
                    self.resolve_type(&value, generics)?,
                ))
            }
            TypeExpr::Fn(func) => {
                let args = func
                    .arg_types()
                    .iter()
                    .map(|t| self.resolve_type(t, generics))
                    .collect::<Result<Vec<_>, _>>()?;
                let ret = func.ret_type().ok_or_else(|| malformed(span))?;
                let ret = self.resolve_type(&ret, generics)?;
                Ok(Type::function(args, ret, Effect::Correct))
            }
        }
    }

    fn resolve_named(
        &self,
        name: &str,
        args: &[TypeExpr],
        generics: &[String],
        span: Span,
    ) -> Result<Type, TypeError> {
        let arity_error = |expected: usize| TypeError::ArityMismatch {
            name: name.to_string(),
            what: Arity::TypeArguments,
            expected,
            found: args.len(),
            span,
        };
        if generics.iter().any(|g| g == name) {
            if !args.is_empty() {
                return Err(arity_error(0));
            }
            return Ok(Type::GenericVar(name.to_string()));
        }
        if name.starts_with(|c: char| c.is_ascii_lowercase()) {
            if !args.is_empty() {
                return Err(arity_error(0));
            }
            return Ok(Type::Basic(name.to_string()));
        }
        let Some(arity) = self.decls.generic_arity(name) else {
            return Err(TypeError::UndefinedSymbol {
                name: name.to_string(),
                span,
            });
        };
        if arity != args.len() {
            return Err(arity_error(arity));
        }
        let instance_vars = args
            .iter()
            .map(|t| self.resolve_type(t, generics))
            .collect::<Result<Vec<_>, _>>()?;
        if self.decls.record(name).is_some() {
            Ok(Type::record(name, instance_vars))
        } else {
            Ok(Type::interface(name, instance_vars))
        }
    }

    /// A function's return type. A suffix on a named return type (`int!`)
    /// spells the function's own color.
    fn resolve_return(&self, texpr: &TypeExpr, generics: &[String]) -> Result<(Type, Effect), TypeError> {
        if let TypeExpr::Named(named) = texpr {
            let span = node_span(texpr.syntax());
            let token = named.name().ok_or_else(|| malformed(span))?;
            let (base, effect) = split_label(token.text());
            if effect != Effect::Correct {
                let args: Vec<TypeExpr> = named
                    .generic_args()
                    .map(|list| list.types().collect())
                    .unwrap_or_default();
                let ty = self.resolve_named(base, &args, generics, span)?;
                return Ok((ty, effect));
            }
        }
        Ok((self.resolve_type(texpr, generics)?, Effect::Correct))
    }

    // ── Functions ──────────────────────────────────────────────────────

    fn load_function(&mut self, def: &FnDef) -> Result<Function, TypeError> {
        let span = node_span(def.syntax());
        let (name, name_span) = item_name(def.name(), def.syntax())?;
        let (label, suffix) = split_label(&name);
        let label = label.to_string();
        let generic_vars = generic_names(def.generic_params());

        let mut params = Vec::new();
        if let Some(list) = def.param_list() {
            for param in list.params() {
                params.push(self.load_param(&param, &generic_vars)?);
            }
        }

        let (ret, ret_color) = match def.ret_type().and_then(|r| r.ty()) {
            Some(t) => self.resolve_return(&t, &generic_vars)?,
            None => (Type::Empty, Effect::Correct),
        };
        let effect = if suffix == Effect::Correct { ret_color } else { suffix };

        let receiver = match def.receiver() {
            Some(recv) => Some(self.load_receiver(
                &recv,
                &label,
                effect,
                &generic_vars,
                &params,
                &ret,
                name_span,
            )?),
            None => None,
        };

        if effect == Effect::Maybe && !params.iter().any(|p: &Param| p.ty.maybe_slots() > 0) {
            return Err(TypeError::effect(
                EffectViolation::MaybeWithoutSource { function: label },
                name_span,
            ));
        }

        let body = match def.body() {
            Some(block) => self.load_block(block.stmts(), &generic_vars)?,
            None => return Err(malformed(span)),
        };

        Ok(Function {
            label,
            receiver,
            generic_vars,
            params,
            ret,
            effect,
            body,
            span,
        })
    }

    fn load_param(&self, param: &melt_parser::ast::item::Param, generics: &[String]) -> Result<Param, TypeError> {
        let span = node_span(param.syntax());
        let token = param.name().ok_or_else(|| malformed(span))?;
        let (name, color) = split_label(token.text());
        let texpr = param.ty().ok_or_else(|| malformed(span))?;
        let mut ty = self.resolve_type(&texpr, generics)?;
        if color != Effect::Correct {
            match &mut ty {
                Type::Function(f) => f.effect = color,
                _ => {
                    return Err(TypeError::effect(
                        EffectViolation::ColoredNonFunction {
                            name: name.to_string(),
                        },
                        span,
                    ))
                }
            }
        }
        Ok(Param {
            name: name.to_string(),
            ty,
            span,
        })
    }

    fn load_receiver(
        &mut self,
        recv: &melt_parser::ast::item::Receiver,
        method: &str,
        effect: Effect,
        generic_vars: &[String],
        params: &[Param],
        ret: &Type,
        span: Span,
    ) -> Result<Receiver, TypeError> {
        let recv_span = node_span(recv.syntax());
        let name = recv.name().ok_or_else(|| malformed(recv_span))?;
        let texpr = recv.ty().ok_or_else(|| malformed(recv_span))?;
        let ty = self.resolve_type(&texpr, &[])?;
        let record = match &ty {
            Type::Record(r) if r.instance_vars.is_empty() && generic_vars.is_empty() => {
                r.label.clone()
            }
            _ => return Err(TypeError::InvalidReceiver { ty, span: recv_span }),
        };
        if effect == Effect::Maybe || params.iter().any(|p| p.ty.maybe_slots() > 0) {
            return Err(TypeError::effect(
                EffectViolation::MaybeMethod {
                    record,
                    method: method.to_string(),
                },
                span,
            ));
        }
        let clash = self
            .decls
            .record(&record)
            .map_or(false, |def| def.methods.iter().any(|m| m.label == method));
        if clash {
            return Err(TypeError::Redefinition {
                kind: DeclKind::Function,
                name: format!("{}.{}", record, method),
                span,
            });
        }
        let function = FunctionType::new(
            params.iter().map(|p| p.ty.clone()).collect(),
            ret.clone(),
            effect,
        );
        self.decls.add_method(
            &record,
            Method {
                label: method.to_string(),
                function,
            },
        );
        Ok(Receiver {
            name: name.text().to_string(),
            record,
        })
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn load_block(
        &self,
        stmts: impl Iterator<Item = AstStmt>,
        generics: &[String],
    ) -> Result<Vec<Stmt>, TypeError> {
        stmts.map(|s| self.load_stmt(&s, generics)).collect()
    }

    fn body_of(&self, block: Option<melt_parser::ast::item::Block>, span: Span, generics: &[String]) -> Result<Vec<Stmt>, TypeError> {
        let block = block.ok_or_else(|| malformed(span))?;
        self.load_block(block.stmts(), generics)
    }

    fn load_stmt(&self, stmt: &AstStmt, generics: &[String]) -> Result<Stmt, TypeError> {
        let span = node_span(stmt.syntax());
        let expr = |e: Option<AstExpr>| -> Result<Expr, TypeError> {
            let e = e.ok_or_else(|| malformed(span))?;
            self.load_expr(&e, generics)
        };
        let kind = match stmt {
            AstStmt::Assign(assign) => {
                let value = expr(assign.value())?;
                match assign.target() {
                    Some(AstExpr::NameRef(name)) => StmtKind::Set {
                        label: label_ref(&name.ident().ok_or_else(|| malformed(span))?),
                        value,
                    },
                    Some(AstExpr::IndexExpr(index)) => StmtKind::IndexAssign {
                        collection: expr(index.base())?,
                        index: expr(index.index())?,
                        value,
                    },
                    _ => return Err(malformed(span)),
                }
            }
            AstStmt::Return(ret) => StmtKind::Return(match ret.value() {
                Some(e) => Some(self.load_expr(&e, generics)?),
                None => None,
            }),
            AstStmt::ReturnError(ret) => StmtKind::ReturnError(expr(ret.value())?),
            AstStmt::Escalate(esc) => StmtKind::Escalate(
                esc.names()
                    .map(|n| n.ident().map(|t| label_ref(&t)).ok_or_else(|| malformed(span)))
                    .collect::<Result<_, _>>()?,
            ),
            AstStmt::On(on) => {
                let name = on
                    .name_ref()
                    .and_then(|n| n.ident())
                    .ok_or_else(|| malformed(span))?;
                StmtKind::On {
                    label: label_ref(&name),
                    body: self.body_of(on.body(), span, generics)?,
                }
            }
            AstStmt::ForIn(for_in) => {
                let bindings = for_in.bindings();
                let (index, value) = match bindings.as_slice() {
                    [value] => (None, label_ref(value)),
                    [index, value] => (Some(label_ref(index)), label_ref(value)),
                    _ => return Err(malformed(span)),
                };
                StmtKind::ForIn {
                    index,
                    value,
                    sequence: expr(for_in.iterable())?,
                    body: self.body_of(for_in.body(), span, generics)?,
                }
            }
            AstStmt::ForRange(range) => StmtKind::ForRange {
                index: label_ref(&range.binding().ok_or_else(|| malformed(span))?),
                start: expr(range.start())?,
                end: expr(range.end())?,
                inclusive: range.is_inclusive(),
                body: self.body_of(range.body(), span, generics)?,
            },
            AstStmt::If(if_stmt) => return self.load_if(if_stmt, generics),
            AstStmt::Expr(e) => StmtKind::Expr(expr(e.expr())?),
        };
        Ok(Stmt { kind, span })
    }

    fn load_if(&self, if_stmt: &IfStmt, generics: &[String]) -> Result<Stmt, TypeError> {
        let span = node_span(if_stmt.syntax());
        let test = if_stmt.condition().ok_or_else(|| malformed(span))?;
        let otherwise = match if_stmt.else_branch() {
            Some(branch) => match (branch.if_stmt(), branch.block()) {
                (Some(nested), _) => vec![self.load_if(&nested, generics)?],
                (None, Some(block)) => self.load_block(block.stmts(), generics)?,
                (None, None) => return Err(malformed(span)),
            },
            None => Vec::new(),
        };
        Ok(Stmt {
            kind: StmtKind::If {
                test: self.load_expr(&test, generics)?,
                then: self.body_of(if_stmt.then_block(), span, generics)?,
                otherwise,
            },
            span,
        })
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn load_expr(&self, expr: &AstExpr, generics: &[String]) -> Result<Expr, TypeError> {
        let span = node_span(expr.syntax());
        let sub = |e: Option<AstExpr>| -> Result<Box<Expr>, TypeError> {
            let e = e.ok_or_else(|| malformed(span))?;
            Ok(Box::new(self.load_expr(&e, generics)?))
        };
        let all = |es: &mut dyn Iterator<Item = AstExpr>| -> Result<Vec<Expr>, TypeError> {
            es.map(|e| self.load_expr(&e, generics)).collect()
        };
        let kind = match expr {
            AstExpr::Literal(lit) => {
                let token = lit.token().ok_or_else(|| malformed(span))?;
                match token.kind() {
                    SyntaxKind::INT_LITERAL => ExprKind::Int(token.text().to_string()),
                    SyntaxKind::FLOAT_LITERAL => ExprKind::Float(token.text().to_string()),
                    SyntaxKind::TRUE_KW => ExprKind::Bool(true),
                    SyntaxKind::FALSE_KW => ExprKind::Bool(false),
                    SyntaxKind::NIL_KW => ExprKind::Nil,
                    _ => return Err(malformed(span)),
                }
            }
            AstExpr::NameRef(name) => {
                ExprKind::Label(label_ref(&name.ident().ok_or_else(|| malformed(span))?))
            }
            AstExpr::ErrorRef(_) => ExprKind::ErrorRef,
            AstExpr::StringExpr(s) => {
                if s.has_interpolation() {
                    let mut parts = Vec::new();
                    for part in s.parts() {
                        parts.push(match part {
                            StringPart::Text(text) => TemplatePart::Text(text),
                            StringPart::Interpolation(e) => {
                                TemplatePart::Expr(self.load_expr(&e, generics)?)
                            }
                        });
                    }
                    ExprKind::Template(parts)
                } else {
                    ExprKind::Str(s.literal_text())
                }
            }
            AstExpr::ListExpr(list) => ExprKind::List(all(&mut list.elements())?),
            AstExpr::ParenExpr(paren) => {
                let inner = paren.inner().ok_or_else(|| malformed(span))?;
                return self.load_expr(&inner, generics);
            }
            AstExpr::BinaryExpr(bin) => {
                let op = bin.op().ok_or_else(|| malformed(span))?;
                let lhs = sub(bin.lhs())?;
                let rhs = sub(bin.rhs())?;
                match op.kind() {
                    SyntaxKind::PLUS => ExprKind::Binary { op: BinaryOp::Add, lhs, rhs },
                    SyntaxKind::MINUS => ExprKind::Binary { op: BinaryOp::Sub, lhs, rhs },
                    SyntaxKind::STAR => ExprKind::Binary { op: BinaryOp::Mul, lhs, rhs },
                    SyntaxKind::SLASH => ExprKind::Binary { op: BinaryOp::Div, lhs, rhs },
                    SyntaxKind::EQ_EQ => ExprKind::Cmp { op: CmpOp::Eq, lhs, rhs },
                    SyntaxKind::NOT_EQ => ExprKind::Cmp { op: CmpOp::NotEq, lhs, rhs },
                    SyntaxKind::LT => ExprKind::Cmp { op: CmpOp::Lt, lhs, rhs },
                    SyntaxKind::GT => ExprKind::Cmp { op: CmpOp::Gt, lhs, rhs },
                    SyntaxKind::LT_EQ => ExprKind::Cmp { op: CmpOp::LtEq, lhs, rhs },
                    SyntaxKind::GT_EQ => ExprKind::Cmp { op: CmpOp::GtEq, lhs, rhs },
                    _ => return Err(malformed(span)),
                }
            }
            AstExpr::UnaryExpr(unary) => {
                let op = match unary.op().map(|t| t.kind()) {
                    Some(SyntaxKind::MINUS) => UnaryOp::Minus,
                    Some(SyntaxKind::PLUS) => UnaryOp::Plus,
                    _ => return Err(malformed(span)),
                };
                ExprKind::Unary {
                    op,
                    operand: sub(unary.operand())?,
                }
            }
            AstExpr::CallExpr(call) => {
                let callee = call
                    .callee()
                    .and_then(|c| c.ident())
                    .ok_or_else(|| malformed(span))?;
                let args = match call.arg_list() {
                    Some(list) => all(&mut list.args())?,
                    None => Vec::new(),
                };
                ExprKind::Call {
                    callee: label_ref(&callee),
                    args,
                    effect: Effect::Correct,
                }
            }
            AstExpr::MethodCallExpr(call) => {
                let method = call.method().ok_or_else(|| malformed(span))?;
                let args = match call.arg_list() {
                    Some(list) => all(&mut list.args())?,
                    None => Vec::new(),
                };
                ExprKind::MethodCall {
                    receiver: sub(call.receiver())?,
                    method: label_ref(&method),
                    args,
                    effect: Effect::Correct,
                }
            }
            AstExpr::FieldAccess(access) => ExprKind::Field {
                base: sub(access.base())?,
                field: access
                    .field()
                    .map(|t| t.text().to_string())
                    .ok_or_else(|| malformed(span))?,
            },
            AstExpr::IndexExpr(index) => ExprKind::Index {
                base: sub(index.base())?,
                index: sub(index.index())?,
            },
            AstExpr::MakeExpr(make) => {
                let texpr = make.ty().ok_or_else(|| malformed(span))?;
                ExprKind::Make {
                    ty: self.resolve_type(&texpr, generics)?,
                    args: all(&mut make.args())?,
                }
            }
            AstExpr::RecordLiteral(lit) => {
                let record = lit
                    .name_ref()
                    .and_then(|n| n.text())
                    .ok_or_else(|| malformed(span))?;
                let mut fields = Vec::new();
                for field in lit.fields() {
                    let name = field.name().ok_or_else(|| malformed(span))?;
                    let value = field.value().ok_or_else(|| malformed(span))?;
                    fields.push((name.text().to_string(), self.load_expr(&value, generics)?));
                }
                ExprKind::RecordLiteral { record, fields }
            }
        };
        Ok(Expr::new(kind, span))
    }
}

fn label_ref(token: &SyntaxToken) -> LabelRef {
    let (name, suffix) = split_label(token.text());
    LabelRef {
        name: name.to_string(),
        suffix,
        span: span_of(token.text_range()),
    }
}
