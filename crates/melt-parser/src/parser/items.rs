//! Top-level items: package, import, interface, record and func.

use crate::syntax_kind::SyntaxKind;

use super::{block, comma_separated, statements, types, Parser};

/// Parse one top-level item.
pub(crate) fn item(p: &mut Parser) {
    match p.current() {
        SyntaxKind::PACKAGE_KW => package_decl(p),
        SyntaxKind::IMPORT_KW => import_decl(p),
        SyntaxKind::INTERFACE_KW => interface_def(p),
        SyntaxKind::RECORD_KW => record_def(p),
        SyntaxKind::FUNC_KW => fn_def(p),
        _ => p.advance_with_error(
            "expected `package`, `import`, `interface`, `record` or `func`",
        ),
    }
}

/// `package NAME NEWLINE`
fn package_decl(p: &mut Parser) {
    let m = p.open();
    p.advance(); // package
    name(p);
    if !p.has_error() {
        p.expect(SyntaxKind::NEWLINE);
    }
    p.close(m, SyntaxKind::PACKAGE_DECL);
}

/// ```text
/// import:
///     go: "fmt", "os"
///     melt: "util"
/// ```
fn import_decl(p: &mut Parser) {
    let m = p.open();
    let opener = p.current_span();
    p.advance(); // import
    if p.expect(SyntaxKind::COLON) {
        block(p, opener, import_group);
    }
    p.close(m, SyntaxKind::IMPORT_DECL);
}

fn import_group(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::IDENT);
    if !p.has_error() {
        p.expect(SyntaxKind::COLON);
    }
    if !p.has_error() {
        comma_separated(p, SyntaxKind::NEWLINE, import_path);
    }
    if !p.has_error() {
        p.expect(SyntaxKind::NEWLINE);
    }
    p.close(m, SyntaxKind::IMPORT_GROUP);
}

fn import_path(p: &mut Parser) {
    if !p.at(SyntaxKind::STRING_START) {
        p.error("expected an import path string");
        return;
    }
    let m = p.open();
    p.advance(); // "
    p.eat(SyntaxKind::STRING_CONTENT);
    p.expect(SyntaxKind::STRING_END);
    p.close(m, SyntaxKind::STRING_EXPR);
}

/// `interface NAME [<T, ...>]:` followed by method signature lines.
fn interface_def(p: &mut Parser) {
    let m = p.open();
    let opener = p.current_span();
    p.advance(); // interface
    name(p);
    if !p.has_error() && p.at(SyntaxKind::LT) {
        generic_param_list(p);
    }
    if !p.has_error() && p.expect(SyntaxKind::COLON) {
        block(p, opener, interface_method);
    }
    p.close(m, SyntaxKind::INTERFACE_DEF);
}

/// `label[?!](Type, ...) [Ret] NEWLINE`
fn interface_method(p: &mut Parser) {
    let m = p.open();
    name(p);
    if !p.has_error() && p.at(SyntaxKind::L_PAREN) {
        let list = p.open();
        p.advance(); // (
        comma_separated(p, SyntaxKind::R_PAREN, types::type_expr);
        if !p.has_error() {
            p.expect(SyntaxKind::R_PAREN);
        }
        p.close(list, SyntaxKind::PARAM_TYPE_LIST);
    } else if !p.has_error() {
        p.error("expected `(` after method name");
    }
    if !p.has_error() && !p.at(SyntaxKind::NEWLINE) {
        ret_type(p);
    }
    if !p.has_error() {
        p.expect(SyntaxKind::NEWLINE);
    }
    p.close(m, SyntaxKind::INTERFACE_METHOD);
}

/// `record NAME [<T, ...>]:` followed by `field Type` lines.
fn record_def(p: &mut Parser) {
    let m = p.open();
    let opener = p.current_span();
    p.advance(); // record
    name(p);
    if !p.has_error() && p.at(SyntaxKind::LT) {
        generic_param_list(p);
    }
    if !p.has_error() && p.expect(SyntaxKind::COLON) {
        block(p, opener, record_field);
    }
    p.close(m, SyntaxKind::RECORD_DEF);
}

fn record_field(p: &mut Parser) {
    let m = p.open();
    name(p);
    if !p.has_error() {
        types::type_expr(p);
    }
    if !p.has_error() {
        p.expect(SyntaxKind::NEWLINE);
    }
    p.close(m, SyntaxKind::RECORD_FIELD);
}

/// ```text
/// func [ "(" IDENT Type ")" ] NAME [ "<" IDENT, ... ">" ] "(" params ")" [ Ret ] ":" block
/// ```
fn fn_def(p: &mut Parser) {
    let m = p.open();
    let opener = p.current_span();
    p.advance(); // func

    if p.at(SyntaxKind::L_PAREN) {
        let receiver = p.open();
        p.advance(); // (
        p.expect(SyntaxKind::IDENT);
        if !p.has_error() {
            types::type_expr(p);
        }
        if !p.has_error() {
            p.expect(SyntaxKind::R_PAREN);
        }
        p.close(receiver, SyntaxKind::RECEIVER);
    }

    if !p.has_error() {
        name(p);
    }
    if !p.has_error() && p.at(SyntaxKind::LT) {
        generic_param_list(p);
    }
    if !p.has_error() {
        param_list(p);
    }
    if !p.has_error() && types::at_type_start(p) {
        ret_type(p);
    }
    if !p.has_error() && p.expect(SyntaxKind::COLON) {
        block(p, opener, statements::stmt);
    }
    p.close(m, SyntaxKind::FN_DEF);
}

fn param_list(p: &mut Parser) {
    let m = p.open();
    if p.expect(SyntaxKind::L_PAREN) {
        comma_separated(p, SyntaxKind::R_PAREN, param);
        if !p.has_error() {
            p.expect(SyntaxKind::R_PAREN);
        }
    }
    p.close(m, SyntaxKind::PARAM_LIST);
}

/// `name[?!] Type`
fn param(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::IDENT);
    if !p.has_error() {
        types::type_expr(p);
    }
    p.close(m, SyntaxKind::PARAM);
}

fn ret_type(p: &mut Parser) {
    let m = p.open();
    types::type_expr(p);
    p.close(m, SyntaxKind::RET_TYPE);
}

/// `<A, B>` on a definition.
fn generic_param_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // <
    comma_separated(p, SyntaxKind::GT, name);
    if !p.has_error() {
        p.expect(SyntaxKind::GT);
    }
    p.close(m, SyntaxKind::GENERIC_PARAM_LIST);
}

fn name(p: &mut Parser) {
    if !p.at(SyntaxKind::IDENT) {
        p.error("expected a name");
        return;
    }
    let m = p.open();
    p.advance();
    p.close(m, SyntaxKind::NAME);
}
