//! Typed AST nodes for top-level items and their pieces.
//!
//! Covers: SourceFile, PackageDecl, ImportDecl, ImportGroup, InterfaceDef,
//! InterfaceMethod, RecordDef, RecordField, FnDef, Receiver, ParamList,
//! Param, RetType, GenericParamList, Name, Block.

use crate::ast::expr::StringExpr;
use crate::ast::stmt::Stmt;
use crate::ast::ty::{type_children, TypeExpr};
use crate::ast::{ast_node, child_node, child_nodes, child_token, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

// ── Source File ──────────────────────────────────────────────────────────

ast_node!(SourceFile, SOURCE_FILE);

impl SourceFile {
    pub fn items(&self) -> impl Iterator<Item = Item> + '_ {
        self.syntax.children().filter_map(Item::cast)
    }

    pub fn package(&self) -> Option<PackageDecl> {
        child_node(&self.syntax)
    }

    pub fn imports(&self) -> impl Iterator<Item = ImportDecl> + '_ {
        child_nodes(&self.syntax)
    }

    pub fn interfaces(&self) -> impl Iterator<Item = InterfaceDef> + '_ {
        child_nodes(&self.syntax)
    }

    pub fn records(&self) -> impl Iterator<Item = RecordDef> + '_ {
        child_nodes(&self.syntax)
    }

    pub fn fn_defs(&self) -> impl Iterator<Item = FnDef> + '_ {
        child_nodes(&self.syntax)
    }
}

/// Any top-level item.
#[derive(Debug, Clone)]
pub enum Item {
    PackageDecl(PackageDecl),
    ImportDecl(ImportDecl),
    InterfaceDef(InterfaceDef),
    RecordDef(RecordDef),
    FnDef(FnDef),
}

impl Item {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::PACKAGE_DECL => Some(Item::PackageDecl(PackageDecl { syntax: node })),
            SyntaxKind::IMPORT_DECL => Some(Item::ImportDecl(ImportDecl { syntax: node })),
            SyntaxKind::INTERFACE_DEF => Some(Item::InterfaceDef(InterfaceDef { syntax: node })),
            SyntaxKind::RECORD_DEF => Some(Item::RecordDef(RecordDef { syntax: node })),
            SyntaxKind::FN_DEF => Some(Item::FnDef(FnDef { syntax: node })),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Item::PackageDecl(it) => &it.syntax,
            Item::ImportDecl(it) => &it.syntax,
            Item::InterfaceDef(it) => &it.syntax,
            Item::RecordDef(it) => &it.syntax,
            Item::FnDef(it) => &it.syntax,
        }
    }
}

// ── Package and imports ──────────────────────────────────────────────────

ast_node!(PackageDecl, PACKAGE_DECL);

impl PackageDecl {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }
}

ast_node!(ImportDecl, IMPORT_DECL);

impl ImportDecl {
    pub fn groups(&self) -> Vec<ImportGroup> {
        child_node::<Block>(&self.syntax)
            .map(|block| child_nodes(&block.syntax).collect())
            .unwrap_or_default()
    }
}

ast_node!(ImportGroup, IMPORT_GROUP);

impl ImportGroup {
    /// `go` or `melt`.
    pub fn kind(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    /// The import paths, without quotes.
    pub fn paths(&self) -> Vec<String> {
        child_nodes::<StringExpr>(&self.syntax)
            .map(|s| s.literal_text())
            .collect()
    }
}

// ── Interfaces ───────────────────────────────────────────────────────────

ast_node!(InterfaceDef, INTERFACE_DEF);

impl InterfaceDef {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn generic_params(&self) -> Option<GenericParamList> {
        child_node(&self.syntax)
    }

    pub fn methods(&self) -> Vec<InterfaceMethod> {
        child_node::<Block>(&self.syntax)
            .map(|block| child_nodes(&block.syntax).collect())
            .unwrap_or_default()
    }
}

ast_node!(InterfaceMethod, INTERFACE_METHOD);

impl InterfaceMethod {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn param_types(&self) -> Vec<TypeExpr> {
        child_node::<ParamTypeList>(&self.syntax)
            .map(|list| type_children(&list.syntax).collect())
            .unwrap_or_default()
    }

    pub fn ret_type(&self) -> Option<RetType> {
        child_node(&self.syntax)
    }
}

ast_node!(ParamTypeList, PARAM_TYPE_LIST);

// ── Records ──────────────────────────────────────────────────────────────

ast_node!(RecordDef, RECORD_DEF);

impl RecordDef {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn generic_params(&self) -> Option<GenericParamList> {
        child_node(&self.syntax)
    }

    pub fn fields(&self) -> Vec<RecordField> {
        child_node::<Block>(&self.syntax)
            .map(|block| child_nodes(&block.syntax).collect())
            .unwrap_or_default()
    }
}

ast_node!(RecordField, RECORD_FIELD);

impl RecordField {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn ty(&self) -> Option<TypeExpr> {
        type_children(&self.syntax).next()
    }
}

// ── Functions ────────────────────────────────────────────────────────────

ast_node!(FnDef, FN_DEF);

impl FnDef {
    /// `(p Point)` for a method definition.
    pub fn receiver(&self) -> Option<Receiver> {
        child_node(&self.syntax)
    }

    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn generic_params(&self) -> Option<GenericParamList> {
        child_node(&self.syntax)
    }

    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    pub fn ret_type(&self) -> Option<RetType> {
        child_node(&self.syntax)
    }

    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }
}

ast_node!(Receiver, RECEIVER);

impl Receiver {
    pub fn name(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn ty(&self) -> Option<TypeExpr> {
        type_children(&self.syntax).next()
    }
}

ast_node!(ParamList, PARAM_LIST);

impl ParamList {
    pub fn params(&self) -> impl Iterator<Item = Param> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(Param, PARAM);

impl Param {
    /// Parameter name, possibly with a glued `!`/`?` coloring a function type.
    pub fn name(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn ty(&self) -> Option<TypeExpr> {
        type_children(&self.syntax).next()
    }
}

ast_node!(RetType, RET_TYPE);

impl RetType {
    pub fn ty(&self) -> Option<TypeExpr> {
        type_children(&self.syntax).next()
    }
}

ast_node!(GenericParamList, GENERIC_PARAM_LIST);

impl GenericParamList {
    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        child_nodes(&self.syntax)
    }
}

// ── Shared pieces ────────────────────────────────────────────────────────

ast_node!(Name, NAME);

impl Name {
    pub fn text(&self) -> Option<String> {
        child_token(&self.syntax, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }
}

ast_node!(Block, BLOCK);

impl Block {
    pub fn stmts(&self) -> impl Iterator<Item = Stmt> + '_ {
        self.syntax.children().filter_map(Stmt::cast)
    }
}
