//! Melt parser: recursive descent parser producing a rowan-based CST.
//!
//! This crate transforms the token stream from `melt-lexer` into a
//! lossless concrete syntax tree (CST) using the `rowan` library, and
//! exposes typed AST wrappers (see [`ast`]) that the type checker walks.

pub mod ast;
pub mod cst;
pub mod error;
mod parser;
pub mod syntax_kind;

use ast::AstNode;
use melt_lexer::Lexer;

pub use cst::{SyntaxElement, SyntaxNode, SyntaxToken};
pub use error::ParseError;
pub use syntax_kind::SyntaxKind;

/// Result of parsing a Melt source file.
///
/// Contains the green tree and the parse errors. With the first-error-only
/// strategy, `errors` holds at most one error.
#[derive(Debug, Clone)]
pub struct Parse {
    green: rowan::GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    /// Build the syntax tree root from the green node.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Typed root of the tree.
    pub fn tree(&self) -> ast::item::SourceFile {
        ast::item::SourceFile::cast(self.syntax())
            .unwrap_or_else(|| unreachable!("the parser always produces a SOURCE_FILE root"))
    }

    /// Parse errors encountered during parsing.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Whether parsing completed without errors.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a Melt source file into a CST.
///
/// Lexes the source, parses the token stream and returns the tree together
/// with the first error found. A lexical error takes precedence over the
/// parse error it provokes.
pub fn parse(source: &str) -> Parse {
    let (tokens, lex_errors) = Lexer::tokenize_with_errors(source);
    let mut p = parser::Parser::new(tokens, source);
    parser::parse_source_file(&mut p);
    let (green, mut errors) = p.build_tree();

    if let Some(first) = lex_errors.into_iter().next() {
        errors = vec![ParseError::from(first)];
    }

    Parse { green, errors }
}

/// Render a syntax tree as an indented debug dump, one element per line.
pub fn debug_tree(node: &SyntaxNode) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for event in node.preorder_with_tokens() {
        match event {
            rowan::WalkEvent::Enter(element) => {
                let indent = "  ".repeat(depth);
                match element {
                    rowan::NodeOrToken::Node(n) => {
                        out.push_str(&format!("{indent}{:?}@{:?}\n", n.kind(), n.text_range()));
                    }
                    rowan::NodeOrToken::Token(t) => {
                        out.push_str(&format!(
                            "{indent}{:?}@{:?} {:?}\n",
                            t.kind(),
                            t.text_range(),
                            t.text()
                        ));
                    }
                }
                depth += 1;
            }
            rowan::WalkEvent::Leave(_) => depth -= 1,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_parses() {
        let parse = parse("");
        assert!(parse.ok());
        assert_eq!(parse.syntax().kind(), SyntaxKind::SOURCE_FILE);
    }

    #[test]
    fn tree_is_lossless() {
        let source = "package main\n\n# entry\nfunc main():\n    x = [1,\n        2]  # two\n";
        let parse = parse(source);
        assert!(parse.ok(), "{:?}", parse.errors());
        assert_eq!(parse.syntax().text().to_string(), source);
    }

    #[test]
    fn node_ranges_are_source_offsets() {
        let source = "func main():\n    total = 1\n";
        let parse = parse(source);
        let name = parse
            .syntax()
            .descendants()
            .find(|n| n.kind() == SyntaxKind::NAME_REF)
            .map(|n| n.text_range());
        assert_eq!(name, Some(rowan::TextRange::new(17.into(), 22.into())));
    }

    #[test]
    fn lex_error_wins_over_parse_error() {
        let parse = parse("func main():\n    x = @\n");
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].message, "unexpected character: '@'");
    }
}
