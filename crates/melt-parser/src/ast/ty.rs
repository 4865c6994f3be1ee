//! Typed AST nodes for type expressions.

use crate::ast::{ast_node, child_node, child_token, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

/// Any type expression.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Named(NamedType),
    Pointer(PointerType),
    Slice(SliceType),
    Map(MapType),
    Fn(FnType),
}

impl TypeExpr {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::NAMED_TYPE => Some(TypeExpr::Named(NamedType { syntax: node })),
            SyntaxKind::POINTER_TYPE => Some(TypeExpr::Pointer(PointerType { syntax: node })),
            SyntaxKind::SLICE_TYPE => Some(TypeExpr::Slice(SliceType { syntax: node })),
            SyntaxKind::MAP_TYPE => Some(TypeExpr::Map(MapType { syntax: node })),
            SyntaxKind::FN_TYPE => Some(TypeExpr::Fn(FnType { syntax: node })),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            TypeExpr::Named(it) => &it.syntax,
            TypeExpr::Pointer(it) => &it.syntax,
            TypeExpr::Slice(it) => &it.syntax,
            TypeExpr::Map(it) => &it.syntax,
            TypeExpr::Fn(it) => &it.syntax,
        }
    }
}

pub(crate) fn type_children(node: &SyntaxNode) -> impl Iterator<Item = TypeExpr> + '_ {
    node.children().filter_map(TypeExpr::cast)
}

ast_node!(NamedType, NAMED_TYPE);

impl NamedType {
    /// The type name as written, possibly with a glued `!`/`?`.
    pub fn name(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn generic_args(&self) -> Option<GenericArgList> {
        child_node(&self.syntax)
    }
}

ast_node!(GenericArgList, GENERIC_ARG_LIST);

impl GenericArgList {
    pub fn types(&self) -> impl Iterator<Item = TypeExpr> + '_ {
        type_children(&self.syntax)
    }
}

ast_node!(PointerType, POINTER_TYPE);

impl PointerType {
    pub fn pointee(&self) -> Option<TypeExpr> {
        type_children(&self.syntax).next()
    }
}

ast_node!(SliceType, SLICE_TYPE);

impl SliceType {
    pub fn element(&self) -> Option<TypeExpr> {
        type_children(&self.syntax).next()
    }
}

ast_node!(MapType, MAP_TYPE);

impl MapType {
    pub fn key(&self) -> Option<TypeExpr> {
        type_children(&self.syntax).next()
    }

    pub fn value(&self) -> Option<TypeExpr> {
        type_children(&self.syntax).nth(1)
    }
}

ast_node!(FnType, FN_TYPE);

impl FnType {
    /// Argument types: every type written before the `->`.
    pub fn arg_types(&self) -> Vec<TypeExpr> {
        self.syntax
            .children_with_tokens()
            .take_while(|it| it.kind() != SyntaxKind::ARROW)
            .filter_map(|it| it.into_node())
            .filter_map(TypeExpr::cast)
            .collect()
    }

    /// The type after the `->`.
    pub fn ret_type(&self) -> Option<TypeExpr> {
        self.syntax
            .children_with_tokens()
            .skip_while(|it| it.kind() != SyntaxKind::ARROW)
            .filter_map(|it| it.into_node())
            .find_map(TypeExpr::cast)
    }
}
