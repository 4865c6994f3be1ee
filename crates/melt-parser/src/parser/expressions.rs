//! Pratt expression parser for Melt.

use crate::syntax_kind::SyntaxKind;

use super::{comma_separated, types, MarkClosed, Parser};

// ── Binding Power Tables ───────────────────────────────────────────────

/// Returns (left_bp, right_bp) for infix operators. All are
/// left-associative.
fn infix_binding_power(op: SyntaxKind) -> Option<(u8, u8)> {
    match op {
        SyntaxKind::EQ_EQ
        | SyntaxKind::NOT_EQ
        | SyntaxKind::LT
        | SyntaxKind::GT
        | SyntaxKind::LT_EQ
        | SyntaxKind::GT_EQ => Some((5, 6)),
        SyntaxKind::PLUS | SyntaxKind::MINUS => Some((7, 8)),
        SyntaxKind::STAR | SyntaxKind::SLASH => Some((9, 10)),
        _ => None,
    }
}

fn prefix_binding_power(op: SyntaxKind) -> Option<((), u8)> {
    match op {
        SyntaxKind::MINUS | SyntaxKind::PLUS => Some(((), 11)),
        _ => None,
    }
}

/// Postfix operations (call, method call, field access, indexing) bind
/// tighter than every prefix and infix operator.
const POSTFIX_BP: u8 = 25;

// ── Expression Entry Point ─────────────────────────────────────────────

pub(crate) fn expr(p: &mut Parser) {
    expr_bp(p, 0);
}

/// Parse an expression and return its completed node.
pub(crate) fn expr_closed(p: &mut Parser) -> Option<MarkClosed> {
    expr_bp(p, 0)
}

fn expr_bp(p: &mut Parser, min_bp: u8) -> Option<MarkClosed> {
    let mut lhs = lhs(p)?;

    loop {
        if p.has_error() {
            break;
        }

        let current = p.current();

        // ── Postfix: call ──
        if current == SyntaxKind::L_PAREN && POSTFIX_BP >= min_bp {
            if p.kind_of(lhs) != SyntaxKind::NAME_REF {
                p.error("only named functions can be called");
                break;
            }
            let m = p.open_before(lhs);
            arg_list(p);
            lhs = p.close(m, SyntaxKind::CALL_EXPR);
            continue;
        }

        // ── Postfix: field access or method call ──
        if current == SyntaxKind::DOT && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            p.advance(); // .
            p.expect(SyntaxKind::IDENT);
            if !p.has_error() && p.at(SyntaxKind::L_PAREN) {
                arg_list(p);
                lhs = p.close(m, SyntaxKind::METHOD_CALL_EXPR);
            } else {
                lhs = p.close(m, SyntaxKind::FIELD_ACCESS);
            }
            continue;
        }

        // ── Postfix: index ──
        if current == SyntaxKind::L_BRACKET && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            p.advance(); // [
            expr_bp(p, 0);
            if !p.has_error() {
                p.expect(SyntaxKind::R_BRACKET);
            }
            lhs = p.close(m, SyntaxKind::INDEX_EXPR);
            continue;
        }

        // ── Infix operators ──
        if let Some((l_bp, r_bp)) = infix_binding_power(current) {
            if l_bp < min_bp {
                break;
            }
            let m = p.open_before(lhs);
            p.advance(); // operator
            expr_bp(p, r_bp);
            lhs = p.close(m, SyntaxKind::BINARY_EXPR);
            continue;
        }

        break;
    }

    Some(lhs)
}

// ── Atom / Prefix Parsing (LHS) ───────────────────────────────────────

fn lhs(p: &mut Parser) -> Option<MarkClosed> {
    let current = p.current();

    if let Some(((), r_bp)) = prefix_binding_power(current) {
        let m = p.open();
        p.advance(); // operator
        expr_bp(p, r_bp);
        return Some(p.close(m, SyntaxKind::UNARY_EXPR));
    }

    match current {
        SyntaxKind::INT_LITERAL
        | SyntaxKind::FLOAT_LITERAL
        | SyntaxKind::TRUE_KW
        | SyntaxKind::FALSE_KW
        | SyntaxKind::NIL_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::LITERAL))
        }

        SyntaxKind::IDENT => {
            let m = p.open();
            p.advance();
            let name = p.close(m, SyntaxKind::NAME_REF);
            if p.at(SyntaxKind::L_BRACE) {
                return Some(record_literal(p, name));
            }
            Some(name)
        }

        SyntaxKind::DOLLAR_IDENT => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::ERROR_REF))
        }

        SyntaxKind::STRING_START => Some(string_expr(p)),

        SyntaxKind::L_BRACKET => {
            let m = p.open();
            p.advance(); // [
            comma_separated(p, SyntaxKind::R_BRACKET, expr);
            if !p.has_error() {
                p.expect(SyntaxKind::R_BRACKET);
            }
            Some(p.close(m, SyntaxKind::LIST_EXPR))
        }

        SyntaxKind::L_PAREN => {
            let m = p.open();
            p.advance(); // (
            expr_bp(p, 0);
            if !p.has_error() {
                p.expect(SyntaxKind::R_PAREN);
            }
            Some(p.close(m, SyntaxKind::PAREN_EXPR))
        }

        SyntaxKind::MAKE_KW => {
            let m = p.open();
            p.advance(); // make
            if p.expect(SyntaxKind::L_PAREN) {
                types::type_expr(p);
                while !p.has_error() && p.eat(SyntaxKind::COMMA) {
                    expr(p);
                }
                if !p.has_error() {
                    p.expect(SyntaxKind::R_PAREN);
                }
            }
            Some(p.close(m, SyntaxKind::MAKE_EXPR))
        }

        _ => {
            p.error("expected an expression");
            None
        }
    }
}

/// `(a, b)`
fn arg_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // (
    comma_separated(p, SyntaxKind::R_PAREN, expr);
    if !p.has_error() {
        p.expect(SyntaxKind::R_PAREN);
    }
    p.close(m, SyntaxKind::ARG_LIST);
}

/// `Name{field: expr, ...}`, wrapping the already parsed name.
fn record_literal(p: &mut Parser, name: MarkClosed) -> MarkClosed {
    let m = p.open_before(name);
    p.advance(); // {
    comma_separated(p, SyntaxKind::R_BRACE, record_literal_field);
    if !p.has_error() {
        p.expect(SyntaxKind::R_BRACE);
    }
    p.close(m, SyntaxKind::RECORD_LITERAL)
}

fn record_literal_field(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::IDENT);
    if !p.has_error() {
        p.expect(SyntaxKind::COLON);
    }
    if !p.has_error() {
        expr(p);
    }
    p.close(m, SyntaxKind::RECORD_LITERAL_FIELD);
}

/// A string, with `#{expr}` segments parsed as INTERPOLATION nodes.
fn string_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // "
    loop {
        match p.current() {
            SyntaxKind::STRING_CONTENT => p.advance(),
            SyntaxKind::INTERPOLATION_START => {
                let interp = p.open();
                p.advance(); // #{
                expr(p);
                if !p.has_error() {
                    p.expect(SyntaxKind::INTERPOLATION_END);
                }
                p.close(interp, SyntaxKind::INTERPOLATION);
                if p.has_error() {
                    break;
                }
            }
            SyntaxKind::STRING_END => {
                p.advance();
                break;
            }
            _ => {
                p.error("unterminated string literal");
                break;
            }
        }
    }
    p.close(m, SyntaxKind::STRING_EXPR)
}
