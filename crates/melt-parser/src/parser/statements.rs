//! Statements inside function bodies.
//!
//! Simple statements end at a NEWLINE; compound statements (`if`, `for`,
//! `on`) end with the DEDENT of their block.

use crate::syntax_kind::SyntaxKind;

use super::{block, expressions, Parser};

/// Parse one statement, including its terminator.
pub(crate) fn stmt(p: &mut Parser) {
    match p.current() {
        SyntaxKind::IF_KW => if_stmt(p),
        SyntaxKind::FOR_KW => for_stmt(p),
        SyntaxKind::ON_KW => on_stmt(p),
        SyntaxKind::RETURN_KW => simple(p, return_stmt),
        SyntaxKind::BANG_BANG => simple(p, return_error_stmt),
        SyntaxKind::ESCALATE_KW => simple(p, escalate_stmt),
        _ => simple(p, expr_or_assign_stmt),
    }
}

fn simple(p: &mut Parser, body: fn(&mut Parser)) {
    body(p);
    if !p.has_error() {
        p.expect(SyntaxKind::NEWLINE);
    }
}

/// `return [expr]`
fn return_stmt(p: &mut Parser) {
    let m = p.open();
    p.advance(); // return
    if !p.at(SyntaxKind::NEWLINE) {
        expressions::expr(p);
    }
    p.close(m, SyntaxKind::RETURN_STMT);
}

/// `!! expr`
fn return_error_stmt(p: &mut Parser) {
    let m = p.open();
    p.advance(); // !!
    expressions::expr(p);
    p.close(m, SyntaxKind::RETURN_ERROR_STMT);
}

/// `escalate f, g`
fn escalate_stmt(p: &mut Parser) {
    let m = p.open();
    p.advance(); // escalate
    loop {
        name_ref(p);
        if p.has_error() || !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.close(m, SyntaxKind::ESCALATE_STMT);
}

/// `on f: block`
fn on_stmt(p: &mut Parser) {
    let m = p.open();
    let opener = p.current_span();
    p.advance(); // on
    name_ref(p);
    if !p.has_error() && p.expect(SyntaxKind::COLON) {
        block(p, opener, stmt);
    }
    p.close(m, SyntaxKind::ON_STMT);
}

/// `for a[, b] in expr: block` or `for i in a..b: block`
fn for_stmt(p: &mut Parser) {
    let m = p.open();
    let opener = p.current_span();
    p.advance(); // for

    let mut bindings = 0;
    loop {
        if !p.expect(SyntaxKind::IDENT) {
            break;
        }
        bindings += 1;
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    if !p.has_error() && bindings > 2 {
        p.error("a for loop binds at most two names");
    }
    if !p.has_error() {
        p.expect(SyntaxKind::IN_KW);
    }
    if !p.has_error() {
        expressions::expr(p);
    }

    let mut kind = SyntaxKind::FOR_IN_STMT;
    if !p.has_error() && p.at_any(&[SyntaxKind::DOT_DOT, SyntaxKind::DOT_DOT_DOT]) {
        if bindings != 1 {
            p.error("a range loop binds exactly one index");
        } else {
            p.advance(); // .. or ...
            expressions::expr(p);
            kind = SyntaxKind::FOR_RANGE_STMT;
        }
    }

    if !p.has_error() && p.expect(SyntaxKind::COLON) {
        block(p, opener, stmt);
    }
    p.close(m, kind);
}

/// `if cond: block [else: block | else if ...]`
fn if_stmt(p: &mut Parser) {
    let m = p.open();
    let opener = p.current_span();
    p.advance(); // if
    expressions::expr(p);
    if !p.has_error() && p.expect(SyntaxKind::COLON) {
        block(p, opener, stmt);
    }
    if !p.has_error() && p.at(SyntaxKind::ELSE_KW) {
        let branch = p.open();
        let else_span = p.current_span();
        p.advance(); // else
        if p.at(SyntaxKind::IF_KW) {
            if_stmt(p);
        } else if p.expect(SyntaxKind::COLON) {
            block(p, else_span, stmt);
        }
        p.close(branch, SyntaxKind::ELSE_BRANCH);
    }
    p.close(m, SyntaxKind::IF_STMT);
}

/// An expression statement, or an assignment when followed by `=`.
fn expr_or_assign_stmt(p: &mut Parser) {
    let Some(target) = expressions::expr_closed(p) else {
        return;
    };
    if p.has_error() {
        return;
    }

    if p.at(SyntaxKind::EQ) {
        if !matches!(
            p.kind_of(target),
            SyntaxKind::NAME_REF | SyntaxKind::INDEX_EXPR
        ) {
            p.error("only names and index expressions can be assigned to");
            return;
        }
        let m = p.open_before(target);
        p.advance(); // =
        expressions::expr(p);
        p.close(m, SyntaxKind::ASSIGN_STMT);
    } else {
        let m = p.open_before(target);
        p.close(m, SyntaxKind::EXPR_STMT);
    }
}

fn name_ref(p: &mut Parser) {
    if !p.at(SyntaxKind::IDENT) {
        p.error("expected a function name");
        return;
    }
    let m = p.open();
    p.advance();
    p.close(m, SyntaxKind::NAME_REF);
}
