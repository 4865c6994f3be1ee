//! SyntaxKind enum for the Melt CST.
//!
//! A superset of `TokenKind` (mapped to SCREAMING_SNAKE_CASE) plus the
//! composite node kinds produced by the parser.

use melt_common::token::TokenKind;

/// Every kind of syntax element in the Melt CST.
///
/// Token kinds (leaves) map 1:1 from [`TokenKind`]. The first two values are
/// sentinels used by the event-based parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // ── Sentinels ──────────────────────────────────────────────────────
    /// Placeholder kind for unfinished parser events.
    TOMBSTONE = 0,
    /// Wrapper for tokens that couldn't be parsed.
    ERROR_NODE = 1,

    // ── Keywords ───────────────────────────────────────────────────────
    ELSE_KW,
    ESCALATE_KW,
    FALSE_KW,
    FOR_KW,
    FUNC_KW,
    IF_KW,
    IMPORT_KW,
    IN_KW,
    INTERFACE_KW,
    MAKE_KW,
    MAP_KW,
    NIL_KW,
    ON_KW,
    PACKAGE_KW,
    RECORD_KW,
    RETURN_KW,
    TRUE_KW,

    // ── Operators ──────────────────────────────────────────────────────
    PLUS,
    MINUS,
    STAR,
    SLASH,
    EQ_EQ,
    NOT_EQ,
    LT,
    GT,
    LT_EQ,
    GT_EQ,
    EQ,
    ARROW,
    DOT_DOT,
    DOT_DOT_DOT,
    BANG_BANG,
    DOLLAR_IDENT,

    // ── Delimiters and punctuation ─────────────────────────────────────
    L_PAREN,
    R_PAREN,
    L_BRACKET,
    R_BRACKET,
    L_BRACE,
    R_BRACE,
    COMMA,
    DOT,
    COLON,

    // ── Layout ─────────────────────────────────────────────────────────
    NEWLINE,
    INDENT,
    DEDENT,

    // ── Literals ───────────────────────────────────────────────────────
    INT_LITERAL,
    FLOAT_LITERAL,
    STRING_START,
    STRING_END,
    STRING_CONTENT,
    INTERPOLATION_START,
    INTERPOLATION_END,

    // ── Identifiers, comments, special ─────────────────────────────────
    IDENT,
    COMMENT,
    EOF,
    /// Lexer error token.
    ERROR,

    // ── Whitespace (parser-only, not from TokenKind) ───────────────────
    /// Source text between two tokens. The lexer skips it; the tree
    /// builder restores it so node ranges are source byte offsets.
    WHITESPACE,

    // ── Items ──────────────────────────────────────────────────────────
    /// Root node of a parsed source file.
    SOURCE_FILE,
    /// `package main`
    PACKAGE_DECL,
    /// `import:` followed by an indented list of groups.
    IMPORT_DECL,
    /// `go: "fmt", "os"` inside an import block.
    IMPORT_GROUP,
    /// `func [receiver] name[<T>](params) [ret]: block`
    FN_DEF,
    /// `(p Point)` between `func` and the method name.
    RECEIVER,
    /// `record Name[<T>]:` with field lines.
    RECORD_DEF,
    /// `name Type` inside a record.
    RECORD_FIELD,
    /// `interface Name[<T>]:` with method lines.
    INTERFACE_DEF,
    /// `label[?!](Type, ...) [Ret]` inside an interface.
    INTERFACE_METHOD,
    /// Name in a definition position.
    NAME,
    /// `<A, B>` after a definition name.
    GENERIC_PARAM_LIST,
    /// `(a int, f? int -> int)`
    PARAM_LIST,
    /// `name[?!] Type`
    PARAM,
    /// Parenthesised types of an interface method: `(int, string)`.
    PARAM_TYPE_LIST,
    /// Declared return type of a function or method signature.
    RET_TYPE,
    /// Indented statement block: `NEWLINE INDENT stmt* DEDENT`.
    BLOCK,

    // ── Types ──────────────────────────────────────────────────────────
    /// `int`, `Point`, `Box<T>`
    NAMED_TYPE,
    /// `<int, string>` after a type name.
    GENERIC_ARG_LIST,
    /// `*T`
    POINTER_TYPE,
    /// `[]T` or `[N]T`
    SLICE_TYPE,
    /// `map[K]V`
    MAP_TYPE,
    /// `A -> R` or `(A, B) -> R`
    FN_TYPE,

    // ── Statements ─────────────────────────────────────────────────────
    /// `target = value`; the target is a name or an index expression.
    ASSIGN_STMT,
    /// `return [expr]`
    RETURN_STMT,
    /// `!! expr`
    RETURN_ERROR_STMT,
    /// `escalate f, g`
    ESCALATE_STMT,
    /// `on f: block`
    ON_STMT,
    /// `for a[, b] in expr: block`
    FOR_IN_STMT,
    /// `for i in a..b: block`
    FOR_RANGE_STMT,
    /// `if cond: block [else ...]`
    IF_STMT,
    /// `else: block` or `else if ...`
    ELSE_BRANCH,
    /// An expression used as a statement.
    EXPR_STMT,

    // ── Expressions ────────────────────────────────────────────────────
    /// Int, float, bool or nil literal.
    LITERAL,
    /// Identifier used as an expression.
    NAME_REF,
    /// `$err`
    ERROR_REF,
    /// String, possibly with `#{expr}` segments.
    STRING_EXPR,
    /// `#{expr}` segment of a string.
    INTERPOLATION,
    /// `[a, b, c]`
    LIST_EXPR,
    /// `(expr)`
    PAREN_EXPR,
    /// `a + b`, `a == b`
    BINARY_EXPR,
    /// `-x`
    UNARY_EXPR,
    /// `f(args)`
    CALL_EXPR,
    /// `recv.m(args)`
    METHOD_CALL_EXPR,
    /// `recv.field`
    FIELD_ACCESS,
    /// `xs[i]`
    INDEX_EXPR,
    /// `make(Type, args)`
    MAKE_EXPR,
    /// `Point{x: 1, y: 2}`
    RECORD_LITERAL,
    /// `x: 1` inside a record literal.
    RECORD_LITERAL_FIELD,
    /// `(a, b)` after a callee.
    ARG_LIST,
}

impl SyntaxKind {
    /// Whether this kind is trivia the parser skips during lookahead.
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::COMMENT | SyntaxKind::WHITESPACE)
    }
}

impl From<TokenKind> for SyntaxKind {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Else => SyntaxKind::ELSE_KW,
            TokenKind::Escalate => SyntaxKind::ESCALATE_KW,
            TokenKind::False => SyntaxKind::FALSE_KW,
            TokenKind::For => SyntaxKind::FOR_KW,
            TokenKind::Func => SyntaxKind::FUNC_KW,
            TokenKind::If => SyntaxKind::IF_KW,
            TokenKind::Import => SyntaxKind::IMPORT_KW,
            TokenKind::In => SyntaxKind::IN_KW,
            TokenKind::Interface => SyntaxKind::INTERFACE_KW,
            TokenKind::Make => SyntaxKind::MAKE_KW,
            TokenKind::Map => SyntaxKind::MAP_KW,
            TokenKind::Nil => SyntaxKind::NIL_KW,
            TokenKind::On => SyntaxKind::ON_KW,
            TokenKind::Package => SyntaxKind::PACKAGE_KW,
            TokenKind::Record => SyntaxKind::RECORD_KW,
            TokenKind::Return => SyntaxKind::RETURN_KW,
            TokenKind::True => SyntaxKind::TRUE_KW,

            TokenKind::Plus => SyntaxKind::PLUS,
            TokenKind::Minus => SyntaxKind::MINUS,
            TokenKind::Star => SyntaxKind::STAR,
            TokenKind::Slash => SyntaxKind::SLASH,
            TokenKind::EqEq => SyntaxKind::EQ_EQ,
            TokenKind::NotEq => SyntaxKind::NOT_EQ,
            TokenKind::Lt => SyntaxKind::LT,
            TokenKind::Gt => SyntaxKind::GT,
            TokenKind::LtEq => SyntaxKind::LT_EQ,
            TokenKind::GtEq => SyntaxKind::GT_EQ,
            TokenKind::Eq => SyntaxKind::EQ,
            TokenKind::Arrow => SyntaxKind::ARROW,
            TokenKind::DotDot => SyntaxKind::DOT_DOT,
            TokenKind::DotDotDot => SyntaxKind::DOT_DOT_DOT,
            TokenKind::BangBang => SyntaxKind::BANG_BANG,
            TokenKind::DollarIdent => SyntaxKind::DOLLAR_IDENT,

            TokenKind::LParen => SyntaxKind::L_PAREN,
            TokenKind::RParen => SyntaxKind::R_PAREN,
            TokenKind::LBracket => SyntaxKind::L_BRACKET,
            TokenKind::RBracket => SyntaxKind::R_BRACKET,
            TokenKind::LBrace => SyntaxKind::L_BRACE,
            TokenKind::RBrace => SyntaxKind::R_BRACE,
            TokenKind::Comma => SyntaxKind::COMMA,
            TokenKind::Dot => SyntaxKind::DOT,
            TokenKind::Colon => SyntaxKind::COLON,

            TokenKind::Newline => SyntaxKind::NEWLINE,
            TokenKind::Indent => SyntaxKind::INDENT,
            TokenKind::Dedent => SyntaxKind::DEDENT,

            TokenKind::IntLiteral => SyntaxKind::INT_LITERAL,
            TokenKind::FloatLiteral => SyntaxKind::FLOAT_LITERAL,
            TokenKind::StringStart => SyntaxKind::STRING_START,
            TokenKind::StringEnd => SyntaxKind::STRING_END,
            TokenKind::StringContent => SyntaxKind::STRING_CONTENT,
            TokenKind::InterpolationStart => SyntaxKind::INTERPOLATION_START,
            TokenKind::InterpolationEnd => SyntaxKind::INTERPOLATION_END,

            TokenKind::Ident => SyntaxKind::IDENT,
            TokenKind::Comment => SyntaxKind::COMMENT,
            TokenKind::Eof => SyntaxKind::EOF,
            TokenKind::Error => SyntaxKind::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_kinds_map_to_leaf_kinds() {
        assert_eq!(SyntaxKind::from(TokenKind::Func), SyntaxKind::FUNC_KW);
        assert_eq!(SyntaxKind::from(TokenKind::BangBang), SyntaxKind::BANG_BANG);
        assert_eq!(SyntaxKind::from(TokenKind::Dedent), SyntaxKind::DEDENT);
        assert_eq!(SyntaxKind::from(TokenKind::Error), SyntaxKind::ERROR);
    }

    #[test]
    fn node_kinds_come_after_token_kinds() {
        assert!(SyntaxKind::SOURCE_FILE > SyntaxKind::ERROR);
        assert!(SyntaxKind::ARG_LIST > SyntaxKind::SOURCE_FILE);
    }

    #[test]
    fn trivia_kinds() {
        assert!(SyntaxKind::COMMENT.is_trivia());
        assert!(SyntaxKind::WHITESPACE.is_trivia());
        assert!(!SyntaxKind::NEWLINE.is_trivia());
    }
}
