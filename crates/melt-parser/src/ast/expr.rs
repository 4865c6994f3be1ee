//! Typed AST nodes for expressions.

use crate::ast::ty::{type_children, TypeExpr};
use crate::ast::{ast_node, child_node, child_nodes, child_token, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

/// Any expression.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    NameRef(NameRef),
    ErrorRef(ErrorRef),
    StringExpr(StringExpr),
    ListExpr(ListExpr),
    ParenExpr(ParenExpr),
    BinaryExpr(BinaryExpr),
    UnaryExpr(UnaryExpr),
    CallExpr(CallExpr),
    MethodCallExpr(MethodCallExpr),
    FieldAccess(FieldAccess),
    IndexExpr(IndexExpr),
    MakeExpr(MakeExpr),
    RecordLiteral(RecordLiteral),
}

impl Expr {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        let expr = match node.kind() {
            SyntaxKind::LITERAL => Expr::Literal(Literal { syntax: node }),
            SyntaxKind::NAME_REF => Expr::NameRef(NameRef { syntax: node }),
            SyntaxKind::ERROR_REF => Expr::ErrorRef(ErrorRef { syntax: node }),
            SyntaxKind::STRING_EXPR => Expr::StringExpr(StringExpr { syntax: node }),
            SyntaxKind::LIST_EXPR => Expr::ListExpr(ListExpr { syntax: node }),
            SyntaxKind::PAREN_EXPR => Expr::ParenExpr(ParenExpr { syntax: node }),
            SyntaxKind::BINARY_EXPR => Expr::BinaryExpr(BinaryExpr { syntax: node }),
            SyntaxKind::UNARY_EXPR => Expr::UnaryExpr(UnaryExpr { syntax: node }),
            SyntaxKind::CALL_EXPR => Expr::CallExpr(CallExpr { syntax: node }),
            SyntaxKind::METHOD_CALL_EXPR => Expr::MethodCallExpr(MethodCallExpr { syntax: node }),
            SyntaxKind::FIELD_ACCESS => Expr::FieldAccess(FieldAccess { syntax: node }),
            SyntaxKind::INDEX_EXPR => Expr::IndexExpr(IndexExpr { syntax: node }),
            SyntaxKind::MAKE_EXPR => Expr::MakeExpr(MakeExpr { syntax: node }),
            SyntaxKind::RECORD_LITERAL => Expr::RecordLiteral(RecordLiteral { syntax: node }),
            _ => return None,
        };
        Some(expr)
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Expr::Literal(it) => &it.syntax,
            Expr::NameRef(it) => &it.syntax,
            Expr::ErrorRef(it) => &it.syntax,
            Expr::StringExpr(it) => &it.syntax,
            Expr::ListExpr(it) => &it.syntax,
            Expr::ParenExpr(it) => &it.syntax,
            Expr::BinaryExpr(it) => &it.syntax,
            Expr::UnaryExpr(it) => &it.syntax,
            Expr::CallExpr(it) => &it.syntax,
            Expr::MethodCallExpr(it) => &it.syntax,
            Expr::FieldAccess(it) => &it.syntax,
            Expr::IndexExpr(it) => &it.syntax,
            Expr::MakeExpr(it) => &it.syntax,
            Expr::RecordLiteral(it) => &it.syntax,
        }
    }
}

fn exprs(node: &SyntaxNode) -> impl Iterator<Item = Expr> + '_ {
    node.children().filter_map(Expr::cast)
}

// ── Leaves ───────────────────────────────────────────────────────────────

ast_node!(Literal, LITERAL);

impl Literal {
    /// The literal token (INT_LITERAL, FLOAT_LITERAL, TRUE_KW, FALSE_KW, NIL_KW).
    pub fn token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|it| !it.kind().is_trivia())
    }
}

ast_node!(NameRef, NAME_REF);

impl NameRef {
    pub fn ident(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    /// The name as written, suffix included.
    pub fn text(&self) -> Option<String> {
        self.ident().map(|t| t.text().to_string())
    }
}

ast_node!(ErrorRef, ERROR_REF);

impl ErrorRef {
    pub fn text(&self) -> Option<String> {
        child_token(&self.syntax, SyntaxKind::DOLLAR_IDENT).map(|t| t.text().to_string())
    }
}

ast_node!(StringExpr, STRING_EXPR);

/// One piece of a string literal.
#[derive(Debug, Clone)]
pub enum StringPart {
    Text(String),
    Interpolation(Expr),
}

impl StringExpr {
    pub fn parts(&self) -> Vec<StringPart> {
        let mut parts = Vec::new();
        for element in self.syntax.children_with_tokens() {
            match element {
                rowan::NodeOrToken::Token(t) if t.kind() == SyntaxKind::STRING_CONTENT => {
                    parts.push(StringPart::Text(t.text().to_string()));
                }
                rowan::NodeOrToken::Node(n) if n.kind() == SyntaxKind::INTERPOLATION => {
                    if let Some(expr) = exprs(&n).next() {
                        parts.push(StringPart::Interpolation(expr));
                    }
                }
                _ => {}
            }
        }
        parts
    }

    /// The literal text of a string without interpolations.
    pub fn literal_text(&self) -> String {
        self.parts()
            .into_iter()
            .filter_map(|part| match part {
                StringPart::Text(text) => Some(text),
                StringPart::Interpolation(_) => None,
            })
            .collect()
    }

    pub fn has_interpolation(&self) -> bool {
        self.syntax
            .children()
            .any(|n| n.kind() == SyntaxKind::INTERPOLATION)
    }
}

// ── Compound expressions ─────────────────────────────────────────────────

ast_node!(ListExpr, LIST_EXPR);

impl ListExpr {
    pub fn elements(&self) -> impl Iterator<Item = Expr> + '_ {
        exprs(&self.syntax)
    }
}

ast_node!(ParenExpr, PAREN_EXPR);

impl ParenExpr {
    pub fn inner(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }
}

ast_node!(BinaryExpr, BINARY_EXPR);

impl BinaryExpr {
    pub fn lhs(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }

    pub fn rhs(&self) -> Option<Expr> {
        exprs(&self.syntax).nth(1)
    }

    pub fn op(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|it| {
                matches!(
                    it.kind(),
                    SyntaxKind::PLUS
                        | SyntaxKind::MINUS
                        | SyntaxKind::STAR
                        | SyntaxKind::SLASH
                        | SyntaxKind::EQ_EQ
                        | SyntaxKind::NOT_EQ
                        | SyntaxKind::LT
                        | SyntaxKind::GT
                        | SyntaxKind::LT_EQ
                        | SyntaxKind::GT_EQ
                )
            })
    }
}

ast_node!(UnaryExpr, UNARY_EXPR);

impl UnaryExpr {
    pub fn op(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|it| matches!(it.kind(), SyntaxKind::MINUS | SyntaxKind::PLUS))
    }

    pub fn operand(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }
}

ast_node!(CallExpr, CALL_EXPR);

impl CallExpr {
    pub fn callee(&self) -> Option<NameRef> {
        child_node(&self.syntax)
    }

    pub fn arg_list(&self) -> Option<ArgList> {
        child_node(&self.syntax)
    }
}

ast_node!(MethodCallExpr, METHOD_CALL_EXPR);

impl MethodCallExpr {
    pub fn receiver(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }

    /// Method name, possibly with a glued `!`/`?`.
    pub fn method(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn arg_list(&self) -> Option<ArgList> {
        child_node(&self.syntax)
    }
}

ast_node!(ArgList, ARG_LIST);

impl ArgList {
    pub fn args(&self) -> impl Iterator<Item = Expr> + '_ {
        exprs(&self.syntax)
    }
}

ast_node!(FieldAccess, FIELD_ACCESS);

impl FieldAccess {
    pub fn base(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }

    pub fn field(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }
}

ast_node!(IndexExpr, INDEX_EXPR);

impl IndexExpr {
    pub fn base(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }

    pub fn index(&self) -> Option<Expr> {
        exprs(&self.syntax).nth(1)
    }
}

ast_node!(MakeExpr, MAKE_EXPR);

impl MakeExpr {
    pub fn ty(&self) -> Option<TypeExpr> {
        type_children(&self.syntax).next()
    }

    pub fn args(&self) -> impl Iterator<Item = Expr> + '_ {
        exprs(&self.syntax)
    }
}

ast_node!(RecordLiteral, RECORD_LITERAL);

impl RecordLiteral {
    pub fn name_ref(&self) -> Option<NameRef> {
        child_node(&self.syntax)
    }

    pub fn fields(&self) -> impl Iterator<Item = RecordLiteralField> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(RecordLiteralField, RECORD_LITERAL_FIELD);

impl RecordLiteralField {
    pub fn name(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn value(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }
}
