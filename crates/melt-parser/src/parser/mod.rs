//! Event-based parser for Melt.
//!
//! The parser consumes a token stream and produces events (Open/Close/Advance)
//! that are later converted into a rowan green tree. This decouples parsing
//! logic from tree construction.
//!
//! # Architecture
//!
//! The parser uses matklad's event-based approach (as in rust-analyzer):
//!
//! 1. Parse functions call `open()` to start a node, `advance()` to consume
//!    tokens, and `close()` to finish a node with its actual kind.
//! 2. Events are collected into a flat `Vec<Event>`.
//! 3. `build_tree()` converts events into a rowan `GreenNode`.
//!
//! `open_before()` wraps a previously completed node (turning `ident` into
//! `call_expr(ident, arg_list)`) using the "forward parent" technique.
//!
//! # Layout
//!
//! The lexer already resolved indentation: blocks arrive as
//! `NEWLINE INDENT ... DEDENT` and newlines inside delimiters are never
//! emitted. The only trivia the parser sees during lookahead is comments.

pub(crate) mod expressions;
pub(crate) mod items;
pub(crate) mod statements;
pub(crate) mod types;

use melt_common::span::Span;
use melt_common::token::Token;

use crate::error::ParseError;
use crate::syntax_kind::SyntaxKind;

/// A parser event, later replayed by [`Parser::build_tree`].
#[derive(Debug)]
enum Event {
    /// Start a new CST node. The `kind` is TOMBSTONE until `close()` patches
    /// it. `forward_parent` links to a wrapper opened by `open_before()`.
    Open {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },
    Close,
    Advance,
}

/// A started but not-yet-closed CST node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkOpened {
    index: usize,
}

/// A completed CST node, usable with `open_before()`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkClosed {
    index: usize,
}

/// Event-based parser for Melt source code.
pub(crate) struct Parser<'src> {
    /// All tokens from the lexer (including Eof).
    tokens: Vec<Token>,
    pos: usize,
    events: Vec<Event>,
    source: &'src str,
    errors: Vec<ParseError>,
    /// First-error-only strategy: once set, parse functions bail out.
    has_error: bool,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
            source,
            errors: Vec::new(),
            has_error: false,
        }
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    /// Kind of the current significant token, or `EOF` past the end.
    pub(crate) fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Kind of the Nth significant token ahead.
    pub(crate) fn nth(&self, n: usize) -> SyntaxKind {
        let mut pos = self.pos;
        let mut remaining = n;
        while pos < self.tokens.len() {
            let kind = SyntaxKind::from(self.tokens[pos].kind);
            if kind.is_trivia() {
                pos += 1;
                continue;
            }
            if remaining == 0 {
                return kind;
            }
            remaining -= 1;
            pos += 1;
        }
        SyntaxKind::EOF
    }

    /// Text of the current significant token.
    pub(crate) fn current_text(&self) -> &str {
        let pos = self.skip_to_significant(self.pos);
        match self.tokens.get(pos) {
            Some(token) => &self.source[token.span.start as usize..token.span.end as usize],
            None => "",
        }
    }

    /// Span of the current significant token.
    pub(crate) fn current_span(&self) -> Span {
        let pos = self.skip_to_significant(self.pos);
        match self.tokens.get(pos) {
            Some(token) => token.span,
            None => {
                let end = self.source.len() as u32;
                Span::new(end, end)
            }
        }
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.current())
    }

    // ── Mutation: node management ──────────────────────────────────────

    /// Start a new CST node. The returned marker must be passed to `close()`.
    pub(crate) fn open(&mut self) -> MarkOpened {
        let mark = MarkOpened {
            index: self.events.len(),
        };
        self.events.push(Event::Open {
            kind: SyntaxKind::TOMBSTONE,
            forward_parent: None,
        });
        mark
    }

    /// Start a new CST node BEFORE a previously completed node, making the
    /// completed node its first child.
    pub(crate) fn open_before(&mut self, completed: MarkClosed) -> MarkOpened {
        let mark = self.open();
        if let Event::Open { forward_parent, .. } = &mut self.events[completed.index] {
            *forward_parent = Some(mark.index);
        }
        mark
    }

    /// Close a CST node, patching its Open event with the actual kind.
    pub(crate) fn close(&mut self, m: MarkOpened, kind: SyntaxKind) -> MarkClosed {
        if let Event::Open {
            kind: slot_kind, ..
        } = &mut self.events[m.index]
        {
            *slot_kind = kind;
        }
        self.events.push(Event::Close);
        MarkClosed { index: m.index }
    }

    /// The kind a completed node was closed with.
    pub(crate) fn kind_of(&self, m: MarkClosed) -> SyntaxKind {
        match self.events[m.index] {
            Event::Open { kind, .. } => kind,
            _ => SyntaxKind::TOMBSTONE,
        }
    }

    // ── Mutation: token consumption ────────────────────────────────────

    /// Consume the current significant token, together with any comments
    /// in front of it.
    pub(crate) fn advance(&mut self) {
        while self.pos < self.tokens.len()
            && SyntaxKind::from(self.tokens[self.pos].kind).is_trivia()
        {
            self.events.push(Event::Advance);
            self.pos += 1;
        }
        if self.pos < self.tokens.len() {
            self.events.push(Event::Advance);
            self.pos += 1;
        }
    }

    /// Consume the current token wrapped in an ERROR_NODE.
    pub(crate) fn advance_with_error(&mut self, message: &str) {
        let m = self.open();
        self.error(message);
        self.advance();
        self.close(m, SyntaxKind::ERROR_NODE);
    }

    /// Consume `kind` or record an "expected" error.
    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            self.error(&format!("expected {:?}", kind));
            false
        }
    }

    /// Consume `kind` if present.
    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_newlines(&mut self) {
        while self.eat(SyntaxKind::NEWLINE) {}
    }

    // ── Error reporting ────────────────────────────────────────────────

    /// Record a parse error at the current position.
    pub(crate) fn error(&mut self, message: &str) {
        if self.has_error {
            return;
        }
        let span = self.current_span();
        self.errors.push(ParseError::new(message, span));
        self.has_error = true;
    }

    /// Record a parse error with a related span for additional context.
    pub(crate) fn error_with_related(
        &mut self,
        message: &str,
        related_span: Span,
        related_msg: &str,
    ) {
        if self.has_error {
            return;
        }
        let span = self.current_span();
        self.errors
            .push(ParseError::with_related(message, span, related_msg, related_span));
        self.has_error = true;
    }

    pub(crate) fn has_error(&self) -> bool {
        self.has_error
    }

    fn skip_to_significant(&self, mut pos: usize) -> usize {
        while pos < self.tokens.len() && SyntaxKind::from(self.tokens[pos].kind).is_trivia() {
            pos += 1;
        }
        pos
    }

    // ── Tree building ──────────────────────────────────────────────────

    /// Convert collected events into a rowan `GreenNode` and errors.
    ///
    /// When an Open event has a forward parent, the whole chain is opened
    /// outermost first and the wrapper events are turned into tombstones so
    /// they are skipped when reached later. Gaps between token spans become
    /// WHITESPACE tokens placed before any node that starts at the next
    /// token, so every node's text range is its source byte range.
    pub(crate) fn build_tree(mut self) -> (rowan::GreenNode, Vec<ParseError>) {
        let mut builder = rowan::GreenNodeBuilder::new();
        let mut token_pos: usize = 0;
        let mut text_pos: u32 = 0;
        let mut chain: Vec<SyntaxKind> = Vec::new();

        for i in 0..self.events.len() {
            match self.events[i] {
                Event::Open {
                    kind,
                    forward_parent: None,
                } => {
                    if kind != SyntaxKind::TOMBSTONE {
                        self.flush_whitespace(&mut builder, token_pos, &mut text_pos);
                        builder.start_node(rowan::SyntaxKind(kind as u16));
                    }
                }
                Event::Open {
                    kind,
                    forward_parent: Some(first_parent),
                } => {
                    chain.clear();
                    chain.push(kind);
                    let mut next = Some(first_parent);
                    while let Some(idx) = next {
                        next = None;
                        if let Event::Open {
                            kind: parent_kind,
                            forward_parent,
                        } = &mut self.events[idx]
                        {
                            chain.push(*parent_kind);
                            next = forward_parent.take();
                            *parent_kind = SyntaxKind::TOMBSTONE;
                        }
                    }
                    self.flush_whitespace(&mut builder, token_pos, &mut text_pos);
                    for &k in chain.iter().rev() {
                        if k != SyntaxKind::TOMBSTONE {
                            builder.start_node(rowan::SyntaxKind(k as u16));
                        }
                    }
                }
                Event::Close => builder.finish_node(),
                Event::Advance => {
                    self.flush_whitespace(&mut builder, token_pos, &mut text_pos);
                    if let Some(token) = self.tokens.get(token_pos) {
                        let kind = SyntaxKind::from(token.kind);
                        let text =
                            &self.source[token.span.start as usize..token.span.end as usize];
                        builder.token(rowan::SyntaxKind(kind as u16), text);
                        text_pos = text_pos.max(token.span.end);
                        token_pos += 1;
                    }
                }
            }
        }

        (builder.finish(), self.errors)
    }

    /// Emit the source text skipped by the lexer in front of the token at
    /// `token_pos` as a WHITESPACE token.
    fn flush_whitespace(
        &self,
        builder: &mut rowan::GreenNodeBuilder<'static>,
        token_pos: usize,
        text_pos: &mut u32,
    ) {
        let Some(token) = self.tokens.get(token_pos) else {
            return;
        };
        if token.span.start > *text_pos {
            let gap = &self.source[*text_pos as usize..token.span.start as usize];
            builder.token(rowan::SyntaxKind(SyntaxKind::WHITESPACE as u16), gap);
            *text_pos = token.span.start;
        }
    }
}

// ── Top-level parsing ──────────────────────────────────────────────────

/// Parse a complete source file: a sequence of items up to EOF.
pub(crate) fn parse_source_file(p: &mut Parser) {
    let root = p.open();

    loop {
        p.eat_newlines();
        if p.at(SyntaxKind::EOF) {
            break;
        }

        items::item(p);

        if p.has_error() {
            break;
        }
    }

    // Whatever follows the first error is kept verbatim in the tree.
    while !p.at(SyntaxKind::EOF) {
        p.advance();
    }
    p.advance(); // EOF

    p.close(root, SyntaxKind::SOURCE_FILE);
}

/// Parse an indented block: `NEWLINE INDENT stmt* DEDENT`.
///
/// `opener` is the span of the construct that introduced the block, used
/// as related context when the block is never closed.
pub(crate) fn block(p: &mut Parser, opener: Span, body: fn(&mut Parser)) {
    let m = p.open();
    if !p.expect(SyntaxKind::NEWLINE) {
        p.close(m, SyntaxKind::BLOCK);
        return;
    }
    if !p.at(SyntaxKind::INDENT) {
        p.error_with_related("expected an indented block", opener, "block opened here");
        p.close(m, SyntaxKind::BLOCK);
        return;
    }
    p.advance(); // INDENT

    while !p.at(SyntaxKind::DEDENT) && !p.at(SyntaxKind::EOF) {
        if p.eat(SyntaxKind::NEWLINE) {
            continue;
        }
        body(p);
        if p.has_error() {
            p.close(m, SyntaxKind::BLOCK);
            return;
        }
    }

    if !p.at(SyntaxKind::DEDENT) {
        p.error_with_related("unterminated block", opener, "block opened here");
    } else {
        p.advance(); // DEDENT
    }
    p.close(m, SyntaxKind::BLOCK);
}

/// Parse a comma-separated list of `item` up to (not including) `close`.
/// A trailing comma is allowed.
pub(crate) fn comma_separated(p: &mut Parser, close: SyntaxKind, item: fn(&mut Parser)) {
    while !p.at(close) && !p.at(SyntaxKind::EOF) {
        item(p);
        if p.has_error() || !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
}
