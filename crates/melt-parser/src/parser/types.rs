//! Type expressions.
//!
//! ```text
//! type      = atom [ "->" type ]
//!           | "(" [ type { "," type } ] ")" "->" type
//! atom      = IDENT [ "<" type { "," type } ">" ]
//!           | "*" atom
//!           | "[" [ INT ] "]" atom
//!           | "map" "[" type "]" atom
//! ```
//!
//! `->` is right-associative, and binds looser than `*`, `[]` and `map`,
//! so `*int -> int` is a function from `*int`.

use crate::syntax_kind::SyntaxKind;

use super::{comma_separated, MarkClosed, Parser};

/// Whether the current token can start a type.
pub(crate) fn at_type_start(p: &Parser) -> bool {
    p.at_any(&[
        SyntaxKind::IDENT,
        SyntaxKind::STAR,
        SyntaxKind::L_BRACKET,
        SyntaxKind::MAP_KW,
        SyntaxKind::L_PAREN,
    ])
}

/// Parse a full type, including function types.
pub(crate) fn type_expr(p: &mut Parser) {
    let Some(arg) = type_atom(p) else {
        return;
    };
    // A parenthesised argument list already consumed its own arrow.
    if p.at(SyntaxKind::ARROW) && !p.has_error() && p.kind_of(arg) != SyntaxKind::FN_TYPE {
        let m = p.open_before(arg);
        p.advance(); // ->
        type_expr(p);
        p.close(m, SyntaxKind::FN_TYPE);
    }
}

fn type_atom(p: &mut Parser) -> Option<MarkClosed> {
    match p.current() {
        SyntaxKind::IDENT => {
            let m = p.open();
            p.advance();
            if p.at(SyntaxKind::LT) {
                let args = p.open();
                p.advance(); // <
                comma_separated(p, SyntaxKind::GT, type_expr);
                if !p.has_error() {
                    p.expect(SyntaxKind::GT);
                }
                p.close(args, SyntaxKind::GENERIC_ARG_LIST);
            }
            Some(p.close(m, SyntaxKind::NAMED_TYPE))
        }
        SyntaxKind::STAR => {
            let m = p.open();
            p.advance(); // *
            type_atom(p);
            Some(p.close(m, SyntaxKind::POINTER_TYPE))
        }
        SyntaxKind::L_BRACKET => {
            let m = p.open();
            p.advance(); // [
            p.eat(SyntaxKind::INT_LITERAL);
            if p.expect(SyntaxKind::R_BRACKET) {
                type_atom(p);
            }
            Some(p.close(m, SyntaxKind::SLICE_TYPE))
        }
        SyntaxKind::MAP_KW => {
            let m = p.open();
            p.advance(); // map
            if p.expect(SyntaxKind::L_BRACKET) {
                type_expr(p);
                if !p.has_error() && p.expect(SyntaxKind::R_BRACKET) {
                    type_atom(p);
                }
            }
            Some(p.close(m, SyntaxKind::MAP_TYPE))
        }
        SyntaxKind::L_PAREN => {
            // `(A, B) -> R`
            let m = p.open();
            p.advance(); // (
            comma_separated(p, SyntaxKind::R_PAREN, type_expr);
            if !p.has_error() {
                p.expect(SyntaxKind::R_PAREN);
            }
            if !p.has_error() {
                p.expect(SyntaxKind::ARROW);
            }
            if !p.has_error() {
                type_expr(p);
            }
            Some(p.close(m, SyntaxKind::FN_TYPE))
        }
        _ => {
            p.error("expected a type");
            None
        }
    }
}
