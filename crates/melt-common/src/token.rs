use serde::Serialize;

use crate::span::Span;

/// A token produced by the Melt lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// Every kind of token in the Melt language.
///
/// Layout tokens (`Newline`, `Indent`, `Dedent`) are synthesized by the lexer
/// from leading whitespace; everything else maps to a run of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // ── Keywords (17) ──────────────────────────────────────────────────
    Else,
    Escalate,
    False,
    For,
    Func,
    If,
    Import,
    In,
    Interface,
    Make,
    Map,
    Nil,
    On,
    Package,
    Record,
    Return,
    True,

    // ── Operators (16) ─────────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `=`
    Eq,
    /// `->`
    Arrow,
    /// `..`
    DotDot,
    /// `...`
    DotDotDot,
    /// `!!`, the return-error operator.
    BangBang,
    /// `$name`, the error binding inside an `on` handler.
    DollarIdent,

    // ── Delimiters (6) ─────────────────────────────────────────────────
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // ── Punctuation (3) ────────────────────────────────────────────────
    Comma,
    Dot,
    Colon,

    // ── Layout (3) ─────────────────────────────────────────────────────
    /// End of a logical line outside delimiters.
    Newline,
    /// Indentation increased relative to the enclosing block.
    Indent,
    /// Indentation returned to an enclosing block's level.
    Dedent,

    // ── Literals (7) ───────────────────────────────────────────────────
    IntLiteral,
    FloatLiteral,
    /// Opening `"` of a string.
    StringStart,
    /// Closing `"` of a string.
    StringEnd,
    /// Literal text between delimiters and interpolations.
    StringContent,
    /// `#{` inside a string.
    InterpolationStart,
    /// `}` closing a string interpolation.
    InterpolationEnd,

    // ── Identifiers and comments (2) ───────────────────────────────────
    /// Identifier, optionally carrying a glued effect suffix: `f`, `f!`, `f?`.
    Ident,
    /// Line comment (`# ...`).
    Comment,

    // ── Special (2) ────────────────────────────────────────────────────
    Eof,
    /// Invalid input. The matching [`LexError`](crate::error::LexError) is
    /// recorded by the lexer.
    Error,
}

impl TokenKind {
    /// Whether the parser skips this token during lookahead.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Comment)
    }
}

/// Look up a keyword from its string representation.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "else" => Some(TokenKind::Else),
        "escalate" => Some(TokenKind::Escalate),
        "false" => Some(TokenKind::False),
        "for" => Some(TokenKind::For),
        "func" => Some(TokenKind::Func),
        "if" => Some(TokenKind::If),
        "import" => Some(TokenKind::Import),
        "in" => Some(TokenKind::In),
        "interface" => Some(TokenKind::Interface),
        "make" => Some(TokenKind::Make),
        "map" => Some(TokenKind::Map),
        "nil" => Some(TokenKind::Nil),
        "on" => Some(TokenKind::On),
        "package" => Some(TokenKind::Package),
        "record" => Some(TokenKind::Record),
        "return" => Some(TokenKind::Return),
        "true" => Some(TokenKind::True),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_from_str_recognizes_keywords() {
        let keywords = [
            ("else", TokenKind::Else),
            ("escalate", TokenKind::Escalate),
            ("false", TokenKind::False),
            ("for", TokenKind::For),
            ("func", TokenKind::Func),
            ("if", TokenKind::If),
            ("import", TokenKind::Import),
            ("in", TokenKind::In),
            ("interface", TokenKind::Interface),
            ("make", TokenKind::Make),
            ("map", TokenKind::Map),
            ("nil", TokenKind::Nil),
            ("on", TokenKind::On),
            ("package", TokenKind::Package),
            ("record", TokenKind::Record),
            ("return", TokenKind::Return),
            ("true", TokenKind::True),
        ];
        for (s, expected) in keywords {
            assert_eq!(keyword_from_str(s), Some(expected), "keyword {s:?}");
        }
    }

    #[test]
    fn keyword_from_str_rejects_non_keywords() {
        assert_eq!(keyword_from_str("go"), None);
        assert_eq!(keyword_from_str("melt"), None);
        assert_eq!(keyword_from_str("len"), None);
        assert_eq!(keyword_from_str("Func"), None);
        assert_eq!(keyword_from_str(""), None);
    }

    #[test]
    fn only_comments_are_trivia() {
        assert!(TokenKind::Comment.is_trivia());
        assert!(!TokenKind::Newline.is_trivia());
        assert!(!TokenKind::Dedent.is_trivia());
    }
}
