//! Builtin types and functions registered in the root scope.

use crate::env::TypeEnv;
use crate::ty::{Effect, FunctionType, Method, Type};

/// Basic type names known to every module.
pub const BASIC_TYPES: &[&str] = &[
    "int", "string", "float", "bool", "byte", "int8", "int16", "int32", "int64",
];

/// Integer-like basics that support arithmetic among themselves.
const INTEGER_TYPES: &[&str] = &["int", "byte", "int8", "int16", "int32", "int64"];

/// Builtin type constructors that are not basic types.
pub const BUILTIN_CONSTRUCTORS: &[&str] = &["map", "Slice"];

/// Builtin functions with special-cased call checking.
pub const LEN: &str = "len";
pub const PRINT: &str = "print";

pub fn is_builtin_type(name: &str) -> bool {
    BASIC_TYPES.contains(&name) || BUILTIN_CONSTRUCTORS.contains(&name)
}

pub fn is_integer(label: &str) -> bool {
    INTEGER_TYPES.contains(&label)
}

pub fn is_numeric(label: &str) -> bool {
    label == "float" || is_integer(label)
}

/// Populate the root scope with builtin types and functions.
pub fn register_builtins(env: &mut TypeEnv) {
    for name in BASIC_TYPES {
        env.insert(name.to_string(), Type::Basic(name.to_string()));
    }
    env.insert(
        "map".into(),
        Type::map(Type::GenericVar("K".into()), Type::GenericVar("V".into())),
    );
    env.insert("Slice".into(), Type::slice(Type::GenericVar("T".into())));
    env.insert(
        LEN.into(),
        Type::function(vec![], Type::int(), Effect::Correct),
    );
    env.insert(
        PRINT.into(),
        Type::function(vec![], Type::string(), Effect::Correct),
    );
}

/// The builtin `Slice` method table for a given element type:
/// `Begin() *T`, `Next() *T`, `Length() int`.
pub fn slice_methods(element: &Type) -> Vec<Method> {
    let cursor = || FunctionType::new(vec![], Type::pointer(element.clone()), Effect::Correct);
    vec![
        Method {
            label: "Begin".into(),
            function: cursor(),
        },
        Method {
            label: "Next".into(),
            function: cursor(),
        },
        Method {
            label: "Length".into(),
            function: FunctionType::new(vec![], Type::int(), Effect::Correct),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let mut env = TypeEnv::new();
        register_builtins(&mut env);
        for name in ["int", "string", "float", "bool", "byte", "int64", "map", "Slice", "len", "print"] {
            assert!(env.contains(name), "missing builtin {name}");
        }
        assert_eq!(env.lookup("int"), Some(&Type::int()));
    }

    #[test]
    fn numeric_classification() {
        assert!(is_numeric("float"));
        assert!(is_numeric("int8"));
        assert!(!is_numeric("string"));
        assert!(!is_integer("float"));
        assert!(is_builtin_type("Slice"));
        assert!(!is_builtin_type("Point"));
    }
}
