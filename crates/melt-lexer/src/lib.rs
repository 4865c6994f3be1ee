//! Melt lexer: an indentation-aware tokenizer.
//!
//! Melt marks blocks with a trailing `:` and an indented body, so besides
//! ordinary tokens the lexer synthesizes layout tokens from leading
//! whitespace:
//!
//! - `Newline` ends every logical line (never emitted inside `()`, `[]`,
//!   `{}` or string interpolations).
//! - `Indent` opens a deeper block, `Dedent` closes one for every level the
//!   indentation falls back to.
//!
//! Blank and comment-only lines never affect layout. At end of input a final
//! `Newline` and the `Dedent`s for all open blocks are emitted before `Eof`,
//! so the parser sees every block closed.

mod cursor;

use std::collections::VecDeque;

use cursor::Cursor;
use melt_common::error::{LexError, LexErrorKind};
use melt_common::span::Span;
use melt_common::token::{keyword_from_str, Token, TokenKind};

/// Columns a tab advances the indentation width by.
const TAB_WIDTH: u32 = 4;

/// What the lexer is in the middle of, innermost last.
#[derive(Debug, Clone, Copy)]
enum Mode {
    /// Inside a string literal, after `StringStart`.
    String,
    /// Inside `#{ ... }`; counts nested braces so the right `}` ends it.
    Interpolation { braces: u32 },
}

/// The Melt lexer. Converts source text into a stream of tokens.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    /// Tokens already produced but not yet handed out (dedent runs, EOF tail).
    pending: VecDeque<Token>,
    modes: Vec<Mode>,
    /// Indentation widths of the open blocks. Always starts with 0.
    indents: Vec<u32>,
    at_line_start: bool,
    /// Nesting of `(`, `[` and `{` outside interpolations.
    delimiter_depth: u32,
    last_significant: Option<TokenKind>,
    errors: Vec<LexError>,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            pending: VecDeque::new(),
            modes: Vec::new(),
            indents: vec![0],
            at_line_start: true,
            delimiter_depth: 0,
            last_significant: None,
            errors: Vec::new(),
            finished: false,
        }
    }

    /// Tokenize the entire source. The result ends with `Eof`.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    /// Tokenize the entire source, also returning the lexical errors found.
    pub fn tokenize_with_errors(source: &str) -> (Vec<Token>, Vec<LexError>) {
        let mut lexer = Lexer::new(source);
        let tokens: Vec<Token> = lexer.by_ref().collect();
        (tokens, lexer.errors)
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    fn newlines_significant(&self) -> bool {
        self.delimiter_depth == 0 && self.modes.is_empty()
    }

    fn next_token(&mut self) -> Token {
        if let Some(Mode::String) = self.modes.last() {
            return self.lex_string_content();
        }

        if self.at_line_start && self.newlines_significant() {
            if let Some(token) = self.lex_line_start() {
                return token;
            }
        }

        self.skip_whitespace();
        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            return self.lex_eof(start);
        };

        match c {
            '\n' => {
                self.cursor.advance();
                self.at_line_start = true;
                Token::new(TokenKind::Newline, start, self.cursor.pos())
            }

            // ── Delimiters ───────────────────────────────────────────────
            '(' => self.open_delimiter(TokenKind::LParen, start),
            '[' => self.open_delimiter(TokenKind::LBracket, start),
            ')' => self.close_delimiter(TokenKind::RParen, start),
            ']' => self.close_delimiter(TokenKind::RBracket, start),
            '{' => self.lex_lbrace(start),
            '}' => self.lex_rbrace(start),
            ',' => self.single_char_token(TokenKind::Comma, start),
            ':' => self.single_char_token(TokenKind::Colon, start),

            // ── Operators ────────────────────────────────────────────────
            '+' => self.single_char_token(TokenKind::Plus, start),
            '*' => self.single_char_token(TokenKind::Star, start),
            '/' => self.single_char_token(TokenKind::Slash, start),
            '-' => self.lex_pair('>', TokenKind::Arrow, TokenKind::Minus, start),
            '=' => self.lex_pair('=', TokenKind::EqEq, TokenKind::Eq, start),
            '<' => self.lex_pair('=', TokenKind::LtEq, TokenKind::Lt, start),
            '>' => self.lex_pair('=', TokenKind::GtEq, TokenKind::Gt, start),
            '!' => self.lex_bang(start),
            '.' => self.lex_dot(start),
            '$' => self.lex_dollar(start),

            '#' => self.lex_comment(start),
            '"' => {
                self.cursor.advance();
                self.modes.push(Mode::String);
                Token::new(TokenKind::StringStart, start, self.cursor.pos())
            }
            '0'..='9' => self.lex_number(start),
            c if is_ident_start(c) => self.lex_ident(start),

            c => {
                self.cursor.advance();
                self.error_token(LexErrorKind::UnexpectedCharacter(c), start)
            }
        }
    }

    // ── Layout ───────────────────────────────────────────────────────────

    /// Measure the indentation of the next non-blank line and turn a change
    /// of width into `Indent`/`Dedent` tokens. Comment-only lines are
    /// returned as plain comments without touching the indentation stack.
    fn lex_line_start(&mut self) -> Option<Token> {
        loop {
            let line_start = self.cursor.pos();
            let mut width = 0;
            while let Some(c) = self.cursor.peek() {
                match c {
                    ' ' => width += 1,
                    '\t' => width += TAB_WIDTH,
                    _ => break,
                }
                self.cursor.advance();
            }

            match self.cursor.peek() {
                Some('\n') => {
                    self.cursor.advance();
                }
                Some('\r') if self.cursor.peek_next() == Some('\n') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some('#') => {
                    let start = self.cursor.pos();
                    return Some(self.lex_comment(start));
                }
                None => {
                    self.at_line_start = false;
                    return None;
                }
                Some(_) => {
                    self.at_line_start = false;
                    let span = Span::new(line_start, self.cursor.pos());
                    return self.apply_indentation(width, span);
                }
            }
        }
    }

    fn apply_indentation(&mut self, width: u32, span: Span) -> Option<Token> {
        let top = self.indents.last().copied().unwrap_or(0);
        if width > top {
            self.indents.push(width);
            return Some(Token::new(TokenKind::Indent, span.start, span.end));
        }
        if width == top {
            return None;
        }

        while self.indents.last().is_some_and(|&level| level > width) {
            self.indents.pop();
            self.pending
                .push_back(Token::new(TokenKind::Dedent, span.end, span.end));
        }
        let current = self.indents.last().copied().unwrap_or(0);
        if current != width {
            self.errors.push(LexError::new(
                LexErrorKind::InconsistentIndentation {
                    found: width,
                    expected: current,
                },
                span,
            ));
            self.pending
                .push_back(Token::new(TokenKind::Error, span.start, span.end));
        }
        self.pending.pop_front()
    }

    /// Close the last line and every open block, then emit `Eof`.
    fn lex_eof(&mut self, pos: u32) -> Token {
        if let Some(Mode::Interpolation { .. }) = self.modes.last() {
            self.errors.push(LexError::new(
                LexErrorKind::UnterminatedInterpolation,
                Span::new(pos, pos),
            ));
            self.modes.clear();
        }
        if !matches!(
            self.last_significant,
            None | Some(TokenKind::Newline) | Some(TokenKind::Dedent)
        ) {
            self.pending
                .push_back(Token::new(TokenKind::Newline, pos, pos));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.pending.push_back(Token::new(TokenKind::Dedent, pos, pos));
        }
        self.pending.push_back(Token::new(TokenKind::Eof, pos, pos));
        self.pending
            .pop_front()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, pos, pos))
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    /// Skip spaces, tabs and carriage returns; also newlines while they are
    /// insignificant (inside delimiters or interpolations).
    fn skip_whitespace(&mut self) {
        let significant = self.newlines_significant();
        self.cursor
            .eat_while(|c| c == ' ' || c == '\t' || c == '\r' || (c == '\n' && !significant));
    }

    fn single_char_token(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    /// `<c><next>` -> `pair`, otherwise just `<c>` -> `single`.
    fn lex_pair(&mut self, next: char, pair: TokenKind, single: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some(next) {
            self.cursor.advance();
            Token::new(pair, start, self.cursor.pos())
        } else {
            Token::new(single, start, self.cursor.pos())
        }
    }

    fn error_token(&mut self, kind: LexErrorKind, start: u32) -> Token {
        let span = Span::new(start, self.cursor.pos());
        self.errors.push(LexError::new(kind, span));
        Token::new(TokenKind::Error, span.start, span.end)
    }

    fn open_delimiter(&mut self, kind: TokenKind, start: u32) -> Token {
        self.delimiter_depth += 1;
        self.single_char_token(kind, start)
    }

    fn close_delimiter(&mut self, kind: TokenKind, start: u32) -> Token {
        self.delimiter_depth = self.delimiter_depth.saturating_sub(1);
        self.single_char_token(kind, start)
    }

    fn lex_lbrace(&mut self, start: u32) -> Token {
        match self.modes.last_mut() {
            Some(Mode::Interpolation { braces }) => {
                *braces += 1;
                self.single_char_token(TokenKind::LBrace, start)
            }
            _ => self.open_delimiter(TokenKind::LBrace, start),
        }
    }

    fn lex_rbrace(&mut self, start: u32) -> Token {
        match self.modes.last_mut() {
            Some(Mode::Interpolation { braces: 0 }) => {
                self.modes.pop();
                self.single_char_token(TokenKind::InterpolationEnd, start)
            }
            Some(Mode::Interpolation { braces }) => {
                *braces -= 1;
                self.single_char_token(TokenKind::RBrace, start)
            }
            _ => self.close_delimiter(TokenKind::RBrace, start),
        }
    }

    /// `!=` -> `NotEq`, `!!` -> `BangBang`. A lone `!` only exists glued to
    /// an identifier, which `lex_ident` handles.
    fn lex_bang(&mut self, start: u32) -> Token {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('=') => {
                self.cursor.advance();
                Token::new(TokenKind::NotEq, start, self.cursor.pos())
            }
            Some('!') => {
                self.cursor.advance();
                Token::new(TokenKind::BangBang, start, self.cursor.pos())
            }
            _ => self.error_token(LexErrorKind::UnexpectedCharacter('!'), start),
        }
    }

    /// `.` -> `Dot`, `..` -> `DotDot`, `...` -> `DotDotDot`
    fn lex_dot(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() != Some('.') {
            return Token::new(TokenKind::Dot, start, self.cursor.pos());
        }
        self.cursor.advance();
        if self.cursor.peek() == Some('.') {
            self.cursor.advance();
            Token::new(TokenKind::DotDotDot, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::DotDot, start, self.cursor.pos())
        }
    }

    fn lex_dollar(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek().is_some_and(is_ident_start) {
            self.cursor.eat_while(is_ident_continue);
            Token::new(TokenKind::DollarIdent, start, self.cursor.pos())
        } else {
            self.error_token(LexErrorKind::UnexpectedCharacter('$'), start)
        }
    }

    fn lex_comment(&mut self, start: u32) -> Token {
        self.cursor.eat_while(|c| c != '\n');
        Token::new(TokenKind::Comment, start, self.cursor.pos())
    }

    // ── Literals ─────────────────────────────────────────────────────────

    /// Decimal integers and floats (`1.5`, `2e10`). A `.` only continues
    /// the number when a digit follows, so `0..10` stays a range.
    fn lex_number(&mut self, start: u32) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        let mut kind = TokenKind::IntLiteral;

        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
            kind = TokenKind::FloatLiteral;
        }

        if matches!(self.cursor.peek(), Some('e' | 'E'))
            && self
                .cursor
                .peek_next()
                .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            self.cursor.eat_while(|c| c.is_ascii_digit());
            kind = TokenKind::FloatLiteral;
        }

        Token::new(kind, start, self.cursor.pos())
    }

    /// String body up to the closing quote or the next `#{`. Content and
    /// delimiters are separate tokens; an empty run produces no content token.
    fn lex_string_content(&mut self) -> Token {
        let start = self.cursor.pos();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    self.modes.pop();
                    return self.error_token(LexErrorKind::UnterminatedString, start);
                }
                Some('"') => {
                    if self.cursor.pos() > start {
                        return Token::new(TokenKind::StringContent, start, self.cursor.pos());
                    }
                    self.cursor.advance();
                    self.modes.pop();
                    return Token::new(TokenKind::StringEnd, start, self.cursor.pos());
                }
                Some('#') if self.cursor.peek_next() == Some('{') => {
                    if self.cursor.pos() > start {
                        return Token::new(TokenKind::StringContent, start, self.cursor.pos());
                    }
                    self.cursor.advance();
                    self.cursor.advance();
                    self.modes.push(Mode::Interpolation { braces: 0 });
                    return Token::new(TokenKind::InterpolationStart, start, self.cursor.pos());
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    // ── Identifiers and keywords ─────────────────────────────────────────

    /// Identifiers may carry a glued effect suffix: `read!`, `apply?`.
    /// `x!=y` keeps `!=` as an operator.
    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.advance();
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());

        if let Some(keyword) = keyword_from_str(text) {
            return Token::new(keyword, start, self.cursor.pos());
        }

        if matches!(self.cursor.peek(), Some('!' | '?')) && self.cursor.peek_next() != Some('=') {
            self.cursor.advance();
        }
        Token::new(TokenKind::Ident, start, self.cursor.pos())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = match self.pending.pop_front() {
            Some(token) => token,
            None => self.next_token(),
        };
        match token.kind {
            TokenKind::Eof => self.finished = true,
            kind if !kind.is_trivia() => self.last_significant = Some(kind),
            _ => {}
        }
        Some(token)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_assignment() {
        use TokenKind::*;
        assert_eq!(kinds("x = 42"), vec![Ident, Eq, IntLiteral, Newline, Eof]);
    }

    #[test]
    fn lex_block_layout() {
        use TokenKind::*;
        let source = "func f():\n    return 1\n";
        assert_eq!(
            kinds(source),
            vec![
                Func, Ident, LParen, RParen, Colon, Newline, Indent, Return, IntLiteral, Newline,
                Dedent, Eof,
            ]
        );
    }

    #[test]
    fn dedent_run_closes_every_level() {
        use TokenKind::*;
        let source = "a:\n  b:\n    c\nd";
        assert_eq!(
            kinds(source),
            vec![
                Ident, Colon, Newline, Indent, Ident, Colon, Newline, Indent, Ident, Newline,
                Dedent, Dedent, Ident, Newline, Eof,
            ]
        );
    }

    #[test]
    fn blank_and_comment_lines_do_not_change_layout() {
        use TokenKind::*;
        let source = "a:\n\n        # note\n    b\n";
        assert_eq!(
            kinds(source),
            vec![Ident, Colon, Newline, Comment, Indent, Ident, Newline, Dedent, Eof]
        );
    }

    #[test]
    fn inconsistent_dedent_is_an_error() {
        let (tokens, errors) = Lexer::tokenize_with_errors("a:\n    b\n  c\n");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
        assert_eq!(
            errors[0].kind,
            LexErrorKind::InconsistentIndentation {
                found: 2,
                expected: 0
            }
        );
    }

    #[test]
    fn suffix_glues_to_identifier() {
        let source = "read!(p) apply?(f) a != b";
        let tokens = Lexer::tokenize(source);
        let text = |i: usize| {
            let span = tokens[i].span;
            &source[span.start as usize..span.end as usize]
        };
        assert_eq!(text(0), "read!");
        assert_eq!(text(4), "apply?");
        assert_eq!(tokens[9].kind, TokenKind::NotEq);
    }

    #[test]
    fn newlines_inside_delimiters_are_insignificant() {
        use TokenKind::*;
        assert_eq!(
            kinds("f(1,\n  2)"),
            vec![Ident, LParen, IntLiteral, Comma, IntLiteral, RParen, Newline, Eof]
        );
    }

    #[test]
    fn template_string_with_nested_braces() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#""a #{P{x: 1}.x} b""#),
            vec![
                StringStart,
                StringContent,
                InterpolationStart,
                Ident,
                LBrace,
                Ident,
                Colon,
                IntLiteral,
                RBrace,
                Dot,
                Ident,
                InterpolationEnd,
                StringContent,
                StringEnd,
                Newline,
                Eof,
            ]
        );
    }

    #[test]
    fn range_is_not_a_float() {
        use TokenKind::*;
        assert_eq!(
            kinds("0..10 1.5 0...3"),
            vec![
                IntLiteral, DotDot, IntLiteral, FloatLiteral, IntLiteral, DotDotDot, IntLiteral,
                Newline, Eof,
            ]
        );
    }
}
