//! Rendering tests for Melt type error diagnostics.
//!
//! Each test triggers a specific type error and renders it through the
//! ariadne pipeline or as JSON, checking the code, message, label and help
//! text that reach the user.

use melt_typeck::diagnostics::{error_code, render_diagnostic, DiagnosticOptions};
use melt_typeck::TypeckResult;

// ── Helpers ────────────────────────────────────────────────────────────

/// Colorless options for deterministic output.
fn opts() -> DiagnosticOptions {
    DiagnosticOptions::colorless()
}

/// Parse Melt source and run the type checker.
fn check_source(src: &str) -> TypeckResult {
    let parse = melt_parser::parse(src);
    melt_typeck::check(&parse)
}

/// Render the first error from a type check result as a diagnostic string.
fn render_first_error(src: &str, options: &DiagnosticOptions) -> String {
    let result = check_source(src);
    assert!(
        !result.errors.is_empty(),
        "expected at least one error for source: {:?}",
        src
    );
    render_diagnostic(&result.errors[0], src, "test.melt", options)
}

// ── Ariadne output ─────────────────────────────────────────────────────

#[test]
fn test_diag_type_mismatch() {
    let src = "func main():\n    x = 1\n    x = \"a\"\n";
    let output = render_first_error(src, &opts());
    assert!(output.contains("E0001"), "output: {output}");
    assert!(
        output.contains("type mismatch: expected `int`, found `string`"),
        "output: {output}"
    );
    assert!(output.contains("this is `string`"), "output: {output}");
    assert!(!output.contains('\u{1b}'), "colorless output has escapes");
}

#[test]
fn test_diag_cant_fail_help() {
    let src = "func div(a int, b int) int:\n    if b == 0:\n        !! \"zero\"\n    return a / b\n";
    let output = render_first_error(src, &opts());
    assert!(output.contains("E0015"), "output: {output}");
    assert!(output.contains("`div` can't return an error"), "output: {output}");
    assert!(output.contains("declare it as `div!` if it can fail"), "output: {output}");
}

#[test]
fn test_diag_unhandled() {
    let src = "func read!(p string) string:\n    !! p\n\nfunc load!(p string) string:\n    d = read!(p)\n    return d\n";
    let output = render_first_error(src, &opts());
    assert!(output.contains("E0016"), "output: {output}");
    assert!(output.contains("`read` can fail here"), "output: {output}");
    assert!(output.contains("escalate read"), "output: {output}");
}

#[test]
fn test_diag_empty_list_help() {
    let src = "func main():\n    xs = []\n";
    let output = render_first_error(src, &opts());
    assert!(output.contains("E0012"), "output: {output}");
    assert!(output.contains("use `make([]T, 0)`"), "output: {output}");
}

#[test]
fn test_render_errors_matches_error_count() {
    let src = "func main():\n    print(y)\n";
    let result = check_source(src);
    let rendered = result.render_errors(src, "test.melt", &opts());
    assert_eq!(rendered.len(), result.errors.len());
    assert_eq!(error_code(&result.errors[0]), "E0002");
    assert!(rendered[0].contains("undefined `y`"));
}

#[test]
fn test_parse_errors_are_not_type_errors() {
    let result = check_source("func main(:\n");
    assert!(result.module.is_none());
    assert!(result.errors.is_empty());
}

// ── JSON output ────────────────────────────────────────────────────────

#[test]
fn test_json_diagnostic() {
    let src = "func main():\n    x = 1\n    x = \"a\"\n";
    let output = render_first_error(src, &DiagnosticOptions::json_mode());
    assert!(!output.contains('\n'), "JSON diagnostics are one line");

    let value: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");
    assert_eq!(value["code"], "E0001");
    assert_eq!(value["severity"], "error");
    assert_eq!(value["file"], "test.melt");
    assert_eq!(
        value["message"],
        "type mismatch: expected `int`, found `string`"
    );

    let span = &value["spans"][0];
    let start = span["start"].as_u64().expect("start") as usize;
    let end = span["end"].as_u64().expect("end") as usize;
    assert_eq!(&src[start..end], "\"a\"");
    assert_eq!(span["label"], "this is `string`");
}

// ── Messages ───────────────────────────────────────────────────────────

#[test]
fn test_messages() {
    let first = "func first<T>(xs []T) T:\n    return xs[0]\n\n";
    let inc = "func inc(n int) int:\n    return n + 1\n\n";
    let sources = [
        "func main():\n    print(y)\n".to_string(),
        "func main():\n    xs = []\n".to_string(),
        "func main():\n    x = 1\n    x = \"a\"\n".to_string(),
        format!("{first}func main():\n    x = first(3)\n"),
        format!("{inc}func main():\n    x = inc(1, 2)\n"),
    ];
    let messages: Vec<String> = sources
        .iter()
        .map(|src| check_source(src).errors[0].to_string())
        .collect();
    insta::assert_snapshot!(messages.join("\n"), @r"
    undefined `y`
    empty list literal: use `make` to create an empty slice
    type mismatch: expected `int`, found `string`
    cannot unify call to `first`: expected `[]@T`, found `int`
    arity mismatch: `inc` expects 1 argument, found 2
    ");
}
