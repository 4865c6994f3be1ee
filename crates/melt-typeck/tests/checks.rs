//! Integration tests for the per-node checks: declarations, expressions,
//! statements, records, methods and builtins.

use melt_typeck::error::{Arity, DeclKind, EffectViolation, TypeError};
use melt_typeck::hir::{Expr, Function, Module, StmtKind};
use melt_typeck::ty::{Effect, Type};
use melt_typeck::TypeckResult;

// ── Helpers ────────────────────────────────────────────────────────────

/// Parse Melt source and run the type checker.
fn check_source(src: &str) -> TypeckResult {
    let parse = melt_parser::parse(src);
    assert!(parse.ok(), "unexpected parse errors: {:?}", parse.errors());
    melt_typeck::check(&parse)
}

fn check_ok(src: &str) -> Module {
    let result = check_source(src);
    assert!(
        result.errors.is_empty(),
        "expected no errors, got: {:?}",
        result.errors
    );
    result.module.expect("a checked module")
}

/// Assert that checking fails with an error matching the given predicate.
fn assert_has_error<F: Fn(&TypeError) -> bool>(src: &str, pred: F, desc: &str) {
    let result = check_source(src);
    assert!(
        result.errors.iter().any(|e| pred(e)),
        "expected error matching `{}`, got errors: {:?}",
        desc,
        result.errors
    );
}

/// Wrap statements in `func main():`.
fn in_main(body: &str) -> String {
    let mut src = String::from("func main():\n");
    for line in body.lines() {
        src.push_str("    ");
        src.push_str(line);
        src.push('\n');
    }
    src
}

fn main_fn(module: &Module) -> &Function {
    module.function("main").expect("a main function")
}

fn assigned<'f>(function: &'f Function, name: &str) -> &'f Expr {
    function
        .body
        .iter()
        .find_map(|stmt| match &stmt.kind {
            StmtKind::Set { label, value } if label.name == name => Some(value),
            _ => None,
        })
        .unwrap_or_else(|| panic!("`{name}` is never assigned"))
}

const POINT: &str = "record Point:\n    x int\n    y int\n\nfunc (p Point) area() float:\n    return 0.0\n\n";

// ── Declarations ───────────────────────────────────────────────────────

#[test]
fn test_module_shape() {
    let module = check_ok(
        "package shapes\n\nimport:\n    go: \"fmt\", \"strings\"\n\nrecord Point:\n    x int\n    y int\n\nfunc main():\n    print(1)\n",
    );
    assert_eq!(module.package, "shapes");
    assert_eq!(module.imports.len(), 1);
    assert_eq!(module.imports[0].kind, "go");
    assert_eq!(module.imports[0].paths, vec!["fmt", "strings"]);
    assert_eq!(module.records[0].label, "Point");
    assert_eq!(module.records[0].fields.len(), 2);
}

#[test]
fn test_default_package_is_main() {
    let module = check_ok(&in_main("print(1)"));
    assert_eq!(module.package, "main");
}

#[test]
fn test_function_redefinition() {
    assert_has_error(
        "func f():\n    print(1)\n\nfunc f():\n    print(2)\n",
        |e| {
            matches!(e, TypeError::Redefinition { kind: DeclKind::Function, name, .. } if name == "f")
        },
        "Redefinition(f)",
    );
}

#[test]
fn test_builtin_names_cant_be_redefined() {
    assert_has_error(
        "func len(x int) int:\n    return x\n",
        |e| matches!(e, TypeError::Redefinition { name, .. } if name == "len"),
        "Redefinition(len)",
    );
    assert_has_error(
        "record int:\n    x int\n",
        |e| matches!(e, TypeError::Redefinition { kind: DeclKind::Record, .. }),
        "Redefinition(record int)",
    );
}

#[test]
fn test_duplicate_record_field() {
    assert_has_error(
        "record Point:\n    x int\n    x int\n",
        |e| matches!(e, TypeError::DuplicateField { field, .. } if field == "x"),
        "DuplicateField(x)",
    );
}

#[test]
fn test_unknown_type_name() {
    assert_has_error(
        "func f(x Foo):\n    print(1)\n",
        |e| matches!(e, TypeError::UndefinedSymbol { name, .. } if name == "Foo"),
        "UndefinedSymbol(Foo)",
    );
}

#[test]
fn test_generic_record_needs_type_arguments() {
    assert_has_error(
        "record Box<T>:\n    value T\n\nfunc f(b Box) int:\n    return 1\n",
        |e| {
            matches!(
                e,
                TypeError::ArityMismatch { what: Arity::TypeArguments, expected: 1, found: 0, .. }
            )
        },
        "ArityMismatch(type arguments)",
    );
}

#[test]
fn test_colored_non_function_param() {
    assert_has_error(
        "func f(x! int) int:\n    return 1\n",
        |e| {
            matches!(
                e,
                TypeError::Effect { violation: EffectViolation::ColoredNonFunction { .. }, .. }
            )
        },
        "ColoredNonFunction",
    );
}

#[test]
fn test_method_on_basic_type() {
    assert_has_error(
        "func (n int) twice() int:\n    return n * 2\n",
        |e| matches!(e, TypeError::InvalidReceiver { .. }),
        "InvalidReceiver",
    );
}

#[test]
fn test_generic_method() {
    let src = format!("{POINT}func (p Point) pick<T>(x T) T:\n    return x\n");
    assert_has_error(
        &src,
        |e| matches!(e, TypeError::InvalidReceiver { .. }),
        "InvalidReceiver",
    );
}

#[test]
fn test_duplicate_method() {
    let src = format!("{POINT}func (p Point) area() float:\n    return 1.0\n");
    assert_has_error(
        &src,
        |e| matches!(e, TypeError::Redefinition { name, .. } if name == "Point.area"),
        "Redefinition(Point.area)",
    );
}

// ── Labels and assignment ──────────────────────────────────────────────

#[test]
fn test_reassignment_keeps_type() {
    assert_has_error(
        &in_main("x = 1\nx = \"a\""),
        |e| {
            matches!(e, TypeError::Mismatch { expected, found, .. }
                if *expected == Type::int() && *found == Type::string())
        },
        "Mismatch(int, string)",
    );
}

#[test]
fn test_undefined_label() {
    assert_has_error(
        &in_main("print(y)"),
        |e| matches!(e, TypeError::UndefinedSymbol { name, .. } if name == "y"),
        "UndefinedSymbol(y)",
    );
}

#[test]
fn test_type_name_is_not_a_value() {
    assert_has_error(
        &in_main("x = int"),
        |e| matches!(e, TypeError::NotAValue { name, .. } if name == "int"),
        "NotAValue(int)",
    );
}

#[test]
fn test_generic_function_is_not_a_value() {
    let src = format!("func id<T>(x T) T:\n    return x\n\n{}", in_main("g = id"));
    assert_has_error(
        &src,
        |e| matches!(e, TypeError::GenericValue { name, .. } if name == "id"),
        "GenericValue(id)",
    );
}

#[test]
fn test_function_value() {
    let src = format!("func inc(n int) int:\n    return n + 1\n\n{}", in_main("g = inc\nprint(g(1))"));
    let module = check_ok(&src);
    assert_eq!(
        assigned(main_fn(&module), "g").ty,
        Type::function(vec![Type::int()], Type::int(), Effect::Correct)
    );
}

#[test]
fn test_suffix_on_a_value() {
    assert_has_error(
        &in_main("x = 1\ny = x!"),
        |e| matches!(e, TypeError::NotAFunction { name, .. } if name == "x"),
        "NotAFunction(x)",
    );
}

#[test]
fn test_suffix_must_match_declaration() {
    let src = format!("func inc(n int) int:\n    return n + 1\n\n{}", in_main("x = inc!(1)"));
    let result = check_source(&src);
    assert_eq!(
        result.errors[0].to_string(),
        "`inc!` doesn't match the declaration `inc`"
    );
}

// ── Expressions ────────────────────────────────────────────────────────

#[test]
fn test_arithmetic_types() {
    let module = check_ok(&in_main(
        "a = 1 + 2.5\nb = \"x\" + \"y\"\nc = 7 / 2\nd = -a\ne = 1 < 2\nprint(a)\nprint(b)\nprint(c)\nprint(d)\nprint(e)",
    ));
    let main = main_fn(&module);
    assert_eq!(assigned(main, "a").ty, Type::float());
    assert_eq!(assigned(main, "b").ty, Type::string());
    assert_eq!(assigned(main, "c").ty, Type::int());
    assert_eq!(assigned(main, "d").ty, Type::float());
    assert_eq!(assigned(main, "e").ty, Type::bool());
}

#[test]
fn test_invalid_operands() {
    assert_has_error(
        &in_main("x = \"a\" - \"b\""),
        |e| matches!(e, TypeError::InvalidOperand { op, .. } if op == "-"),
        "InvalidOperand(-)",
    );
    assert_has_error(
        &in_main("x = true + false"),
        |e| matches!(e, TypeError::InvalidOperand { .. }),
        "InvalidOperand(bool)",
    );
    assert_has_error(
        &in_main("x = -\"a\""),
        |e| matches!(e, TypeError::InvalidOperand { .. }),
        "InvalidOperand(unary)",
    );
}

#[test]
fn test_template_string() {
    let module = check_ok(&in_main("n = 3\ns = \"n is #{n}\"\nprint(s)"));
    assert_eq!(assigned(main_fn(&module), "s").ty, Type::string());
}

#[test]
fn test_list_literals() {
    let module = check_ok(&in_main("xs = [1, 2, 3]\nprint(xs[0])"));
    assert_eq!(assigned(main_fn(&module), "xs").ty, Type::slice(Type::int()));

    assert_has_error(
        &in_main("xs = []"),
        |e| matches!(e, TypeError::EmptyList { .. }),
        "EmptyList",
    );
    assert_has_error(
        &in_main("xs = [1, \"a\"]"),
        |e| matches!(e, TypeError::Mismatch { .. }),
        "Mismatch(list element)",
    );
}

#[test]
fn test_make_and_index() {
    let module = check_ok(&in_main(
        "m = make(map[string]int)\nm[\"a\"] = 1\nxs = make([]float, 3)\nxs[0] = 1.5\nprint(m[\"a\"])",
    ));
    let main = main_fn(&module);
    assert_eq!(
        assigned(main, "m").ty,
        Type::map(Type::string(), Type::int())
    );
    assert_eq!(assigned(main, "xs").ty, Type::slice(Type::float()));
}

#[test]
fn test_make_errors() {
    assert_has_error(
        &in_main("xs = make([]int)"),
        |e| matches!(e, TypeError::ArityMismatch { name, .. } if name == "make"),
        "ArityMismatch(make)",
    );
    assert_has_error(
        &in_main("x = make(int, 1)"),
        |e| matches!(e, TypeError::InvalidMake { .. }),
        "InvalidMake",
    );
}

#[test]
fn test_index_errors() {
    assert_has_error(
        &in_main("xs = [1]\nprint(xs[\"a\"])"),
        |e| matches!(e, TypeError::Mismatch { expected, .. } if *expected == Type::int()),
        "Mismatch(index)",
    );
    assert_has_error(
        &in_main("x = 1\nprint(x[0])"),
        |e| matches!(e, TypeError::NotIndexable { .. }),
        "NotIndexable",
    );
}

#[test]
fn test_call_arity() {
    let src = format!("func inc(n int) int:\n    return n + 1\n\n{}", in_main("x = inc(1, 2)"));
    assert_has_error(
        &src,
        |e| {
            matches!(e, TypeError::ArityMismatch { what: Arity::Arguments, expected: 1, found: 2, .. })
        },
        "ArityMismatch(inc)",
    );
}

#[test]
fn test_calling_a_value() {
    assert_has_error(
        &in_main("x = 1\ny = x(2)"),
        |e| matches!(e, TypeError::NotAFunction { .. }),
        "NotAFunction",
    );
}

#[test]
fn test_empty_call_has_no_value() {
    let src = format!("func log(s string):\n    print(s)\n\n{}", in_main("x = log(\"a\")"));
    assert_has_error(&src, |e| matches!(e, TypeError::NoValue { .. }), "NoValue");
}

// ── Records and methods ────────────────────────────────────────────────

#[test]
fn test_record_literal_and_fields() {
    let src = format!("{POINT}{}", in_main("p = Point{x: 1, y: 2}\nq = p.x + p.y\na = p.area()\nprint(q)\nprint(a)"));
    let module = check_ok(&src);
    let main = main_fn(&module);
    assert_eq!(assigned(main, "p").ty, Type::record("Point", vec![]));
    assert_eq!(assigned(main, "q").ty, Type::int());
    assert_eq!(assigned(main, "a").ty, Type::float());
}

#[test]
fn test_record_literal_errors() {
    let missing = format!("{POINT}{}", in_main("p = Point{x: 1}"));
    assert_has_error(
        &missing,
        |e| matches!(e, TypeError::MissingField { field, .. } if field == "y"),
        "MissingField(y)",
    );
    let unknown = format!("{POINT}{}", in_main("p = Point{x: 1, y: 2, z: 3}"));
    assert_has_error(
        &unknown,
        |e| matches!(e, TypeError::UnknownField { field, .. } if field == "z"),
        "UnknownField(z)",
    );
    let twice = format!("{POINT}{}", in_main("p = Point{x: 1, x: 2}"));
    assert_has_error(
        &twice,
        |e| matches!(e, TypeError::DuplicateField { field, .. } if field == "x"),
        "DuplicateField(x)",
    );
    let wrong = format!("{POINT}{}", in_main("p = Point{x: 1, y: \"2\"}"));
    assert_has_error(
        &wrong,
        |e| matches!(e, TypeError::Mismatch { .. }),
        "Mismatch(field)",
    );
}

#[test]
fn test_generic_record_literal() {
    let module = check_ok(&format!(
        "record Box<T>:\n    value T\n\n{}",
        in_main("b = Box{value: 3}\nprint(b.value)")
    ));
    assert_eq!(
        assigned(main_fn(&module), "b").ty,
        Type::record("Box", vec![Type::int()])
    );
    assert_eq!(module.record_instances.len(), 1);
}

#[test]
fn test_missing_field_and_method() {
    let field = format!("{POINT}{}", in_main("p = Point{x: 1, y: 2}\nprint(p.z)"));
    assert_has_error(
        &field,
        |e| matches!(e, TypeError::NoSuchField { field, .. } if field == "z"),
        "NoSuchField(z)",
    );
    let method = format!("{POINT}{}", in_main("p = Point{x: 1, y: 2}\nprint(p.volume())"));
    assert_has_error(
        &method,
        |e| matches!(e, TypeError::NoSuchMethod { method, .. } if method == "volume"),
        "NoSuchMethod(volume)",
    );
}

#[test]
fn test_record_satisfies_interface() {
    let src = format!(
        "interface Area:\n    area() float\n\n{POINT}func measure(s Area) float:\n    return s.area()\n\n{}",
        in_main("p = Point{x: 1, y: 2}\nprint(measure(p))")
    );
    check_ok(&src);
}

#[test]
fn test_record_missing_interface_method() {
    let src = format!(
        "interface Named:\n    name() string\n\n{POINT}func show(n Named) string:\n    return n.name()\n\n{}",
        in_main("p = Point{x: 1, y: 2}\nprint(show(p))")
    );
    assert_has_error(&src, |e| matches!(e, TypeError::Mismatch { .. }), "Mismatch(interface)");
}

#[test]
fn test_maybe_interface_method_is_fallible() {
    let src = "interface Source:\n    read?() string\n\nfunc load(s Source) string:\n    data = s.read?()\n    return data\n";
    assert_has_error(
        src,
        |e| matches!(e, TypeError::Unhandled { label, .. } if label == "read"),
        "Unhandled(read)",
    );
}

// ── Statements ─────────────────────────────────────────────────────────

#[test]
fn test_for_loops() {
    check_ok(&in_main(
        "total = 0\nfor i, v in [1, 2]:\n    total = total + i + v\nfor k, v in make(map[string]int):\n    print(k)\nfor i in 0..10:\n    total = total + i\nprint(total)",
    ));
}

#[test]
fn test_for_loop_errors() {
    assert_has_error(
        &in_main("for v in 3:\n    print(v)"),
        |e| matches!(e, TypeError::NotIterable { .. }),
        "NotIterable",
    );
    assert_has_error(
        &in_main("v = 1\nfor v in [1]:\n    print(v)"),
        |e| matches!(e, TypeError::AlreadyDefined { name, .. } if name == "v"),
        "AlreadyDefined(v)",
    );
    assert_has_error(
        &in_main("for i in 0..\"a\":\n    print(i)"),
        |e| matches!(e, TypeError::Mismatch { .. }),
        "Mismatch(range bound)",
    );
}

#[test]
fn test_loop_labels_are_scoped() {
    assert_has_error(
        &in_main("for v in [1]:\n    print(v)\nprint(v)"),
        |e| matches!(e, TypeError::UndefinedSymbol { name, .. } if name == "v"),
        "UndefinedSymbol(v)",
    );
}

#[test]
fn test_condition_must_be_bool() {
    assert_has_error(
        &in_main("if 1:\n    print(1)"),
        |e| matches!(e, TypeError::Mismatch { expected, .. } if *expected == Type::bool()),
        "Mismatch(bool)",
    );
}

#[test]
fn test_else_if_chain() {
    check_ok(
        "func sign(n int) int:\n    if n < 0:\n        return -1\n    else if n == 0:\n        return 0\n    else:\n        return 1\n    return 1\n",
    );
}

#[test]
fn test_return_checks() {
    assert_has_error(
        "func f() int:\n    return \"a\"\n",
        |e| matches!(e, TypeError::Mismatch { .. }),
        "Mismatch(return)",
    );
    assert_has_error(
        "func f() int:\n    return\n",
        |e| matches!(e, TypeError::Mismatch { found, .. } if *found == Type::Empty),
        "Mismatch(bare return)",
    );
    assert_has_error(
        "func f():\n    return 1\n",
        |e| matches!(e, TypeError::Mismatch { .. }),
        "Mismatch(value in empty function)",
    );
}

#[test]
fn test_error_message_must_be_string() {
    assert_has_error(
        "func f!() int:\n    !! 3\n",
        |e| matches!(e, TypeError::Mismatch { expected, .. } if *expected == Type::string()),
        "Mismatch(!! operand)",
    );
}

#[test]
fn test_handling_a_correct_function() {
    let src = format!("func inc(n int) int:\n    return n + 1\n\n{}", in_main("on inc:\n    print(1)"));
    assert_has_error(
        &src,
        |e| matches!(e, TypeError::Effect { violation: EffectViolation::CantFail { .. }, .. }),
        "CantFail(inc)",
    );
}

#[test]
fn test_error_ref_outside_handler() {
    assert_has_error(
        &in_main("print($err)"),
        |e| matches!(e, TypeError::UndefinedSymbol { name, .. } if name == "$err"),
        "UndefinedSymbol($err)",
    );
}

// ── Generic calls ──────────────────────────────────────────────────────

#[test]
fn test_unification_failures() {
    let first = "func first<T>(xs []T) T:\n    return xs[0]\n\n";
    assert_has_error(
        &format!("{first}{}", in_main("x = first(3)")),
        |e| matches!(e, TypeError::UnificationFailure { callee, .. } if callee == "first"),
        "UnificationFailure(first)",
    );
    let pair = "func pair<T>(a T, b T) T:\n    return a\n\n";
    assert_has_error(
        &format!("{pair}{}", in_main("x = pair(1, \"a\")")),
        |e| {
            matches!(e, TypeError::UnificationFailure { expected, found, .. }
                if *expected == Type::int() && *found == Type::string())
        },
        "UnificationFailure(pair)",
    );
}

#[test]
fn test_uninferred_generic() {
    let src = format!(
        "func empty<T>() []T:\n    return make([]T, 0)\n\n{}",
        in_main("xs = empty()")
    );
    assert_has_error(
        &src,
        |e| matches!(e, TypeError::UninferredGeneric { var, .. } if var == "T"),
        "UninferredGeneric(T)",
    );
}

// ── Builtins ───────────────────────────────────────────────────────────

const BAG: &str = "record Bag:\n    items []int\n\n";

#[test]
fn test_len_of_slices_and_ducks() {
    let src = format!(
        "{BAG}func (b Bag) Length() int:\n    return len(b.items)\n\n{}",
        in_main("b = Bag{items: [1, 2]}\nn = len(b) + len([1])\nprint(n)")
    );
    let module = check_ok(&src);
    assert_eq!(assigned(main_fn(&module), "n").ty, Type::int());
}

#[test]
fn test_len_is_strict() {
    let with_param = format!(
        "{BAG}func (b Bag) Length(extra int) int:\n    return extra\n\n{}",
        in_main("b = Bag{items: [1]}\nprint(len(b))")
    );
    assert_has_error(&with_param, |e| matches!(e, TypeError::InvalidLen { .. }), "InvalidLen");

    let wrong_ret = format!(
        "{BAG}func (b Bag) Length() string:\n    return \"1\"\n\n{}",
        in_main("b = Bag{items: [1]}\nprint(len(b))")
    );
    assert_has_error(&wrong_ret, |e| matches!(e, TypeError::InvalidLen { .. }), "InvalidLen");

    let pointer = format!(
        "func size(p *[]int) int:\n    return len(p)\n\n{}",
        in_main("print(1)")
    );
    assert_has_error(&pointer, |e| matches!(e, TypeError::InvalidLen { .. }), "InvalidLen(*[]int)");

    assert_has_error(
        &in_main("print(len(3))"),
        |e| matches!(e, TypeError::InvalidLen { .. }),
        "InvalidLen(int)",
    );
    assert_has_error(
        &in_main("print(len([1], [2]))"),
        |e| matches!(e, TypeError::ArityMismatch { name, .. } if name == "len"),
        "ArityMismatch(len)",
    );
}

#[test]
fn test_print_yields_string() {
    let module = check_ok(&in_main("s = print(1)\nprint(s + \"!\")"));
    assert_eq!(assigned(main_fn(&module), "s").ty, Type::string());
}
