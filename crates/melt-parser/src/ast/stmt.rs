//! Typed AST nodes for statements.

use crate::ast::expr::{Expr, NameRef};
use crate::ast::item::Block;
use crate::ast::{ast_node, child_node, child_nodes, child_token, child_tokens, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

/// Any statement in a block.
#[derive(Debug, Clone)]
pub enum Stmt {
    Assign(AssignStmt),
    Return(ReturnStmt),
    ReturnError(ReturnErrorStmt),
    Escalate(EscalateStmt),
    On(OnStmt),
    ForIn(ForInStmt),
    ForRange(ForRangeStmt),
    If(IfStmt),
    Expr(ExprStmt),
}

impl Stmt {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::ASSIGN_STMT => Some(Stmt::Assign(AssignStmt { syntax: node })),
            SyntaxKind::RETURN_STMT => Some(Stmt::Return(ReturnStmt { syntax: node })),
            SyntaxKind::RETURN_ERROR_STMT => {
                Some(Stmt::ReturnError(ReturnErrorStmt { syntax: node }))
            }
            SyntaxKind::ESCALATE_STMT => Some(Stmt::Escalate(EscalateStmt { syntax: node })),
            SyntaxKind::ON_STMT => Some(Stmt::On(OnStmt { syntax: node })),
            SyntaxKind::FOR_IN_STMT => Some(Stmt::ForIn(ForInStmt { syntax: node })),
            SyntaxKind::FOR_RANGE_STMT => Some(Stmt::ForRange(ForRangeStmt { syntax: node })),
            SyntaxKind::IF_STMT => Some(Stmt::If(IfStmt { syntax: node })),
            SyntaxKind::EXPR_STMT => Some(Stmt::Expr(ExprStmt { syntax: node })),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Stmt::Assign(it) => &it.syntax,
            Stmt::Return(it) => &it.syntax,
            Stmt::ReturnError(it) => &it.syntax,
            Stmt::Escalate(it) => &it.syntax,
            Stmt::On(it) => &it.syntax,
            Stmt::ForIn(it) => &it.syntax,
            Stmt::ForRange(it) => &it.syntax,
            Stmt::If(it) => &it.syntax,
            Stmt::Expr(it) => &it.syntax,
        }
    }
}

fn exprs(node: &SyntaxNode) -> impl Iterator<Item = Expr> + '_ {
    node.children().filter_map(Expr::cast)
}

ast_node!(AssignStmt, ASSIGN_STMT);

impl AssignStmt {
    /// A `NameRef` or an `IndexExpr`.
    pub fn target(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }

    pub fn value(&self) -> Option<Expr> {
        exprs(&self.syntax).nth(1)
    }
}

ast_node!(ReturnStmt, RETURN_STMT);

impl ReturnStmt {
    pub fn value(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }
}

ast_node!(ReturnErrorStmt, RETURN_ERROR_STMT);

impl ReturnErrorStmt {
    pub fn value(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }
}

ast_node!(EscalateStmt, ESCALATE_STMT);

impl EscalateStmt {
    pub fn names(&self) -> impl Iterator<Item = NameRef> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(OnStmt, ON_STMT);

impl OnStmt {
    pub fn name_ref(&self) -> Option<NameRef> {
        child_node(&self.syntax)
    }

    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }
}

ast_node!(ForInStmt, FOR_IN_STMT);

impl ForInStmt {
    /// One or two loop names.
    pub fn bindings(&self) -> Vec<SyntaxToken> {
        child_tokens(&self.syntax, SyntaxKind::IDENT).collect()
    }

    pub fn iterable(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }

    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }
}

ast_node!(ForRangeStmt, FOR_RANGE_STMT);

impl ForRangeStmt {
    pub fn binding(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn start(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }

    pub fn end(&self) -> Option<Expr> {
        exprs(&self.syntax).nth(1)
    }

    /// `a...b` includes `b`; `a..b` stops before it.
    pub fn is_inclusive(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::DOT_DOT_DOT).is_some()
    }

    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }
}

ast_node!(IfStmt, IF_STMT);

impl IfStmt {
    pub fn condition(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }

    pub fn then_block(&self) -> Option<Block> {
        child_node(&self.syntax)
    }

    pub fn else_branch(&self) -> Option<ElseBranch> {
        child_node(&self.syntax)
    }
}

ast_node!(ElseBranch, ELSE_BRANCH);

impl ElseBranch {
    pub fn block(&self) -> Option<Block> {
        child_node(&self.syntax)
    }

    /// The nested `if` of an `else if`.
    pub fn if_stmt(&self) -> Option<IfStmt> {
        child_node(&self.syntax)
    }
}

ast_node!(ExprStmt, EXPR_STMT);

impl ExprStmt {
    pub fn expr(&self) -> Option<Expr> {
        exprs(&self.syntax).next()
    }
}
