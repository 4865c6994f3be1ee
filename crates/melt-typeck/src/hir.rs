//! Typed AST.
//!
//! Built by the [`loader`](crate::loader) from the CST with every `ty` slot
//! set to `Empty`, filled in by the checker, and cloned per instantiation by
//! the monomorphization pass. After a successful check the module is the
//! hand-off to code generation: every node type is concrete.

use melt_common::span::Span;
use serde::Serialize;

use crate::decls::{InterfaceDef, RecordDef};
use crate::ty::{Effect, FunctionType, RecordType, Type};

#[derive(Clone, Debug, Serialize)]
pub struct Module {
    pub package: String,
    pub imports: Vec<Import>,
    pub interfaces: Vec<InterfaceDef>,
    pub records: Vec<RecordDef>,
    pub functions: Vec<Function>,
    /// Concrete instances of generic records used by the functions.
    pub record_instances: Vec<RecordType>,
}

impl Module {
    pub fn function(&self, label: &str) -> Option<&Function> {
        self.functions
            .iter()
            .find(|f| f.label == label && f.receiver.is_none())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Import {
    /// `go` or `melt`.
    pub kind: String,
    pub paths: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Receiver {
    pub name: String,
    pub record: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct Function {
    /// The label without its suffix; the color is in `effect`.
    pub label: String,
    pub receiver: Option<Receiver>,
    pub generic_vars: Vec<String>,
    pub params: Vec<Param>,
    pub ret: Type,
    pub effect: Effect,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Function {
    pub fn signature(&self) -> FunctionType {
        FunctionType {
            args: self.params.iter().map(|p| p.ty.clone()).collect(),
            ret: Box::new(self.ret.clone()),
            effect: self.effect,
            generic_vars: self.generic_vars.clone(),
        }
    }
}

/// A label as written, split into its base name and suffix color.
#[derive(Clone, Debug, Serialize)]
pub struct LabelRef {
    pub name: String,
    pub suffix: Effect,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub enum StmtKind {
    /// `x = e`: defines `x` on first assignment.
    Set { label: LabelRef, value: Expr },
    /// `xs[i] = e`
    IndexAssign {
        collection: Expr,
        index: Expr,
        value: Expr,
    },
    Return(Option<Expr>),
    /// `!! e`
    ReturnError(Expr),
    Escalate(Vec<LabelRef>),
    On { label: LabelRef, body: Vec<Stmt> },
    /// `for v in e` or `for i, v in e`.
    ForIn {
        index: Option<LabelRef>,
        value: LabelRef,
        sequence: Expr,
        body: Vec<Stmt>,
    },
    /// `for i in a..b` / `for i in a...b`.
    ForRange {
        index: LabelRef,
        start: Expr,
        end: Expr,
        inclusive: bool,
        body: Vec<Stmt>,
    },
    If {
        test: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    Expr(Expr),
}

#[derive(Clone, Debug, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr {
            kind,
            ty: Type::Empty,
            span,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

#[derive(Clone, Debug, Serialize)]
pub enum ExprKind {
    Int(String),
    Float(String),
    Bool(bool),
    Nil,
    Str(String),
    Template(Vec<TemplatePart>),
    Label(LabelRef),
    /// `$err`
    ErrorRef,
    List(Vec<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Cmp {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// A call of a named function. `effect` is the call's resolved color;
    /// after monomorphization `callee.name` names the concrete clone.
    Call {
        callee: LabelRef,
        args: Vec<Expr>,
        effect: Effect,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: LabelRef,
        args: Vec<Expr>,
        effect: Effect,
    },
    Field {
        base: Box<Expr>,
        field: String,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Make {
        ty: Type,
        args: Vec<Expr>,
    },
    RecordLiteral {
        record: String,
        fields: Vec<(String, Expr)>,
    },
}

// ── Traversal ──────────────────────────────────────────────────────────

/// Visit every expression in a block, children before parents.
pub fn walk_exprs_mut(body: &mut [Stmt], f: &mut dyn FnMut(&mut Expr)) {
    for stmt in body {
        match &mut stmt.kind {
            StmtKind::Set { value, .. } => walk_expr_mut(value, f),
            StmtKind::IndexAssign {
                collection,
                index,
                value,
            } => {
                walk_expr_mut(collection, f);
                walk_expr_mut(index, f);
                walk_expr_mut(value, f);
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    walk_expr_mut(value, f);
                }
            }
            StmtKind::ReturnError(value) | StmtKind::Expr(value) => walk_expr_mut(value, f),
            StmtKind::Escalate(_) => {}
            StmtKind::On { body, .. } => walk_exprs_mut(body, f),
            StmtKind::ForIn { sequence, body, .. } => {
                walk_expr_mut(sequence, f);
                walk_exprs_mut(body, f);
            }
            StmtKind::ForRange {
                start, end, body, ..
            } => {
                walk_expr_mut(start, f);
                walk_expr_mut(end, f);
                walk_exprs_mut(body, f);
            }
            StmtKind::If {
                test,
                then,
                otherwise,
            } => {
                walk_expr_mut(test, f);
                walk_exprs_mut(then, f);
                walk_exprs_mut(otherwise, f);
            }
        }
    }
}

pub fn walk_expr_mut(expr: &mut Expr, f: &mut dyn FnMut(&mut Expr)) {
    match &mut expr.kind {
        ExprKind::Template(parts) => {
            for part in parts {
                if let TemplatePart::Expr(e) = part {
                    walk_expr_mut(e, f);
                }
            }
        }
        ExprKind::List(items) => items.iter_mut().for_each(|e| walk_expr_mut(e, f)),
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::Cmp { lhs, rhs, .. } => {
            walk_expr_mut(lhs, f);
            walk_expr_mut(rhs, f);
        }
        ExprKind::Unary { operand, .. } => walk_expr_mut(operand, f),
        ExprKind::Call { args, .. } | ExprKind::Make { args, .. } => {
            args.iter_mut().for_each(|e| walk_expr_mut(e, f))
        }
        ExprKind::MethodCall { receiver, args, .. } => {
            walk_expr_mut(receiver, f);
            args.iter_mut().for_each(|e| walk_expr_mut(e, f));
        }
        ExprKind::Field { base, .. } => walk_expr_mut(base, f),
        ExprKind::Index { base, index } => {
            walk_expr_mut(base, f);
            walk_expr_mut(index, f);
        }
        ExprKind::RecordLiteral { fields, .. } => {
            fields.iter_mut().for_each(|(_, e)| walk_expr_mut(e, f))
        }
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Bool(_)
        | ExprKind::Nil
        | ExprKind::Str(_)
        | ExprKind::Label(_)
        | ExprKind::ErrorRef => {}
    }
    f(expr);
}
