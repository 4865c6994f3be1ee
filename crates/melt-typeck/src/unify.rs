//! Generic unification (`Match`).
//!
//! A call to a generic function is checked by matching each declared
//! parameter type against the type of the argument at that position. The
//! matcher threads one [`GenericMap`] through the whole call: type
//! parameters are bound on first sight, and every `?` slot of a declared
//! function type records the color of the function actually passed there.
//! The recorded colors are consumed in the same pre-order by
//! [`replace`](crate::replace) to color the call's concrete signature.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::trace;

use crate::decls::Declarations;
use crate::ty::{Duck, Effect, FunctionType, Type};

/// The unification solution for one call site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenericMap {
    /// Type parameter bindings. `Type::Empty` marks a parameter not yet seen.
    pub types: BTreeMap<String, Type>,
    /// Colors of the functions passed into `?` slots, in pre-order.
    pub errors: Vec<Effect>,
}

impl GenericMap {
    pub fn new(vars: &[String]) -> Self {
        GenericMap {
            types: vars.iter().map(|v| (v.clone(), Type::Empty)).collect(),
            errors: Vec::new(),
        }
    }

    /// The first type parameter that nothing bound.
    pub fn unbound(&self) -> Option<&str> {
        self.types
            .iter()
            .find(|(_, t)| **t == Type::Empty)
            .map(|(name, _)| name.as_str())
    }

    /// The bound type parameters as substitution bindings.
    pub fn bindings(&self) -> FxHashMap<String, Type> {
        self.types
            .iter()
            .filter(|(_, t)| **t != Type::Empty)
            .map(|(name, t)| (name.clone(), t.clone()))
            .collect()
    }

    /// Canonical rendering used to deduplicate instantiations.
    pub fn key(&self) -> String {
        let mut key = String::new();
        for (i, (name, ty)) in self.types.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            let _ = write!(key, "{}={}", name, ty);
        }
        key.push('|');
        for (i, effect) in self.errors.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            let _ = write!(key, "{}", effect);
        }
        key
    }
}

/// The sub-structure at which matching failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: Type,
    pub found: Type,
}

impl Mismatch {
    fn new(expected: &Type, found: &Type) -> Self {
        Mismatch {
            expected: expected.clone(),
            found: found.clone(),
        }
    }
}

/// Match a declared parameter type against the actual argument type.
pub fn match_type(
    declared: &Type,
    actual: &Type,
    map: &mut GenericMap,
    decls: &Declarations,
) -> Result<(), Mismatch> {
    if let Type::Nil = actual {
        if declared.accepts_nil() {
            // A nil function never fails: its slots resolve to correct.
            map.errors
                .extend(std::iter::repeat(Effect::Correct).take(declared.maybe_slots()));
            return Ok(());
        }
        return Err(Mismatch::new(declared, actual));
    }

    match declared {
        Type::GenericVar(name) => match map.types.get(name) {
            Some(Type::Empty) => {
                if matches!(actual, Type::Empty) {
                    return Err(Mismatch::new(declared, actual));
                }
                trace!(var = %name, ty = %actual, "bind generic var");
                map.types.insert(name.clone(), actual.clone());
                Ok(())
            }
            Some(bound) => {
                if bound.accepts(actual, decls) {
                    Ok(())
                } else {
                    Err(Mismatch::new(bound, actual))
                }
            }
            None if declared == actual => Ok(()),
            None => Err(Mismatch::new(declared, actual)),
        },
        Type::Basic(_) => {
            if declared.accepts(actual, decls) {
                Ok(())
            } else {
                Err(Mismatch::new(declared, actual))
            }
        }
        Type::Record(expected) => match actual {
            Type::Record(found)
                if found.label == expected.label
                    && found.instance_vars.len() == expected.instance_vars.len() =>
            {
                match_all(&expected.instance_vars, &found.instance_vars, map, decls)
            }
            _ => Err(Mismatch::new(declared, actual)),
        },
        Type::Function(expected) => match actual {
            Type::Function(found) => match_function(expected, found, map, decls),
            _ => Err(Mismatch::new(declared, actual)),
        },
        Type::Interface(expected) => match actual {
            Type::Interface(found) if found.label == expected.label => {
                match_all(&expected.instance_vars, &found.instance_vars, map, decls)
            }
            _ => match_duck(declared, actual, map, decls),
        },
        Type::Pointer(expected) => match actual {
            Type::Pointer(found) => match_type(expected, found, map, decls),
            _ => Err(Mismatch::new(declared, actual)),
        },
        Type::Slice(expected) => match actual {
            Type::Slice(found) => match_type(&expected.element, &found.element, map, decls),
            _ => Err(Mismatch::new(declared, actual)),
        },
        Type::Map(expected) => match actual {
            Type::Map(found) => {
                match_type(&expected.key, &found.key, map, decls)?;
                match_type(&expected.value, &found.value, map, decls)
            }
            _ => Err(Mismatch::new(declared, actual)),
        },
        Type::Nil | Type::Empty | Type::Error => {
            if declared == actual {
                Ok(())
            } else {
                Err(Mismatch::new(declared, actual))
            }
        }
    }
}

fn match_all(
    declared: &[Type],
    actual: &[Type],
    map: &mut GenericMap,
    decls: &Declarations,
) -> Result<(), Mismatch> {
    for (d, a) in declared.iter().zip(actual) {
        match_type(d, a, map, decls)?;
    }
    Ok(())
}

fn match_function(
    expected: &FunctionType,
    found: &FunctionType,
    map: &mut GenericMap,
    decls: &Declarations,
) -> Result<(), Mismatch> {
    let whole = || Mismatch::new(&Type::Function(expected.clone()), &Type::Function(found.clone()));
    if expected.args.len() != found.args.len() || !found.generic_vars.is_empty() {
        return Err(whole());
    }
    match expected.effect {
        Effect::Maybe => {
            trace!(effect = %found.effect, "resolve maybe slot");
            map.errors.push(found.effect);
        }
        color if color != found.effect => return Err(whole()),
        _ => {}
    }
    match_all(&expected.args, &found.args, map, decls)?;
    match_type(&expected.ret, &found.ret, map, decls)
}

/// Duck check of a declared interface against any type with methods. The
/// colors of duck methods must agree exactly and record no slots.
fn match_duck(
    declared: &Type,
    actual: &Type,
    map: &mut GenericMap,
    decls: &Declarations,
) -> Result<(), Mismatch> {
    let Type::Interface(iface) = declared else {
        return Err(Mismatch::new(declared, actual));
    };
    let required = iface.methods(decls);
    if let Type::Basic(_) = actual {
        return if required.is_empty() {
            Ok(())
        } else {
            Err(Mismatch::new(declared, actual))
        };
    }
    let Some(duck) = actual.as_duck() else {
        return Err(Mismatch::new(declared, actual));
    };
    let provided = duck.methods(decls);
    for req in &required {
        let Some(found) = provided.iter().find(|m| m.label == req.label) else {
            return Err(Mismatch::new(declared, actual));
        };
        let compatible = (req.function.effect == found.function.effect
            || req.function.effect == Effect::Maybe)
            && req.function.args.len() == found.function.args.len();
        if !compatible {
            return Err(Mismatch::new(declared, actual));
        }
        match_all(&req.function.args, &found.function.args, map, decls)
            .and_then(|_| match_type(&req.function.ret, &found.function.ret, map, decls))
            .map_err(|_| Mismatch::new(declared, actual))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decls::{InterfaceDef, RecordDef};
    use crate::ty::Method;
    use melt_common::span::Span;

    fn t() -> Type {
        Type::GenericVar("T".into())
    }

    fn decls() -> Declarations {
        let mut decls = Declarations::default();
        decls
            .add_record(RecordDef {
                label: "Box".into(),
                generic_vars: vec!["T".into()],
                fields: vec![("value".into(), t())],
                methods: vec![],
                span: Span::default(),
            })
            .unwrap();
        decls
            .add_record(RecordDef {
                label: "Counter".into(),
                generic_vars: vec![],
                fields: vec![],
                methods: vec![Method {
                    label: "get".into(),
                    function: FunctionType::new(vec![], Type::int(), Effect::Correct),
                }],
                span: Span::default(),
            })
            .unwrap();
        decls
            .add_interface(InterfaceDef {
                label: "Getter".into(),
                generic_vars: vec!["T".into()],
                methods: vec![Method {
                    label: "get".into(),
                    function: FunctionType::new(vec![], t(), Effect::Correct),
                }],
                span: Span::default(),
            })
            .unwrap();
        decls
    }

    #[test]
    fn binds_on_first_sight_and_checks_repeats() {
        let d = decls();
        let mut map = GenericMap::new(&["T".into()]);
        match_type(&t(), &Type::int(), &mut map, &d).unwrap();
        assert_eq!(map.types["T"], Type::int());
        match_type(&t(), &Type::int(), &mut map, &d).unwrap();
        let err = match_type(&t(), &Type::string(), &mut map, &d).unwrap_err();
        assert_eq!(err.expected, Type::int());
        assert_eq!(err.found, Type::string());
    }

    #[test]
    fn second_pass_with_bound_map_is_stable() {
        let d = decls();
        let declared = Type::map(t(), Type::slice(t()));
        let actual = Type::map(Type::string(), Type::slice(Type::string()));
        let mut map = GenericMap::new(&["T".into()]);
        match_type(&declared, &actual, &mut map, &d).unwrap();
        let first = map.clone();
        match_type(&declared, &actual, &mut map, &d).unwrap();
        assert_eq!(map.types, first.types);
    }

    #[test]
    fn records_match_through_instance_vars() {
        let d = decls();
        let mut map = GenericMap::new(&["T".into()]);
        let declared = Type::record("Box", vec![t()]);
        match_type(&declared, &Type::record("Box", vec![Type::bool()]), &mut map, &d).unwrap();
        assert_eq!(map.types["T"], Type::bool());
        assert!(match_type(&declared, &Type::record("Counter", vec![]), &mut map, &d).is_err());
    }

    #[test]
    fn maybe_slots_record_actual_colors_in_order() {
        let d = decls();
        let slot = Type::function(vec![t()], t(), Effect::Maybe);
        let mut map = GenericMap::new(&["T".into()]);
        match_type(
            &slot,
            &Type::function(vec![Type::int()], Type::int(), Effect::Fail),
            &mut map,
            &d,
        )
        .unwrap();
        match_type(
            &slot,
            &Type::function(vec![Type::int()], Type::int(), Effect::Correct),
            &mut map,
            &d,
        )
        .unwrap();
        assert_eq!(map.errors, vec![Effect::Fail, Effect::Correct]);
    }

    #[test]
    fn fixed_colors_must_stay() {
        let d = decls();
        let mut map = GenericMap::new(&[]);
        let correct = Type::function(vec![], Type::int(), Effect::Correct);
        let fail = Type::function(vec![], Type::int(), Effect::Fail);
        assert!(match_type(&correct, &fail, &mut map, &d).is_err());
        assert!(match_type(&fail, &correct, &mut map, &d).is_err());
        assert!(match_type(&fail, &fail, &mut map, &d).is_ok());
    }

    #[test]
    fn interfaces_bind_through_duck_methods() {
        let d = decls();
        let mut map = GenericMap::new(&["T".into()]);
        let declared = Type::interface("Getter", vec![t()]);
        match_type(&declared, &Type::record("Counter", vec![]), &mut map, &d).unwrap();
        assert_eq!(map.types["T"], Type::int());
        assert!(map.errors.is_empty());
    }

    #[test]
    fn nil_fills_slots_with_correct() {
        let d = decls();
        let mut map = GenericMap::new(&[]);
        let slot = Type::function(vec![], Type::int(), Effect::Maybe);
        match_type(&slot, &Type::Nil, &mut map, &d).unwrap();
        assert_eq!(map.errors, vec![Effect::Correct]);
        assert!(match_type(&t(), &Type::Nil, &mut GenericMap::new(&["T".into()]), &d).is_err());
    }

    #[test]
    fn key_is_canonical() {
        let mut map = GenericMap::new(&["U".into(), "T".into()]);
        map.types.insert("T".into(), Type::int());
        map.types.insert("U".into(), Type::slice(Type::string()));
        map.errors.push(Effect::Fail);
        assert_eq!(map.key(), "T=int,U=[]string|fail");
        assert_eq!(map.unbound(), None);
        assert_eq!(GenericMap::new(&["T".into()]).unbound(), Some("T"));
    }
}
