//! Generic substitution (`ReplaceGenericVars`).
//!
//! Rewrites a signature with a solved [`GenericMap`]. Type parameters come
//! from the map's bindings; `?` slots consume the map's recorded colors in
//! the pre-order [`match_type`](crate::unify::match_type) produced them.

use crate::unify::GenericMap;
use crate::ty::{Effect, FunctionType, InterfaceType, MapType, RecordType, SliceType, Type};

/// Walks a signature, handing out recorded colors one slot at a time.
struct Replacer<'a> {
    map: &'a GenericMap,
    cursor: usize,
}

impl Replacer<'_> {
    fn next_color(&mut self) -> Option<Effect> {
        let color = self.map.errors.get(self.cursor).copied();
        if color.is_some() {
            self.cursor += 1;
        }
        color
    }

    fn replace(&mut self, ty: &Type) -> Type {
        match ty {
            Type::GenericVar(name) => match self.map.types.get(name) {
                Some(Type::Empty) | None => ty.clone(),
                Some(bound) => bound.clone(),
            },
            Type::Function(f) => Type::Function(self.replace_function(f)),
            Type::Record(r) => Type::Record(RecordType {
                label: r.label.clone(),
                instance_vars: r.instance_vars.iter().map(|t| self.replace(t)).collect(),
            }),
            Type::Interface(i) => Type::Interface(InterfaceType {
                label: i.label.clone(),
                instance_vars: i.instance_vars.iter().map(|t| self.replace(t)).collect(),
            }),
            Type::Pointer(inner) => Type::Pointer(Box::new(self.replace(inner))),
            Type::Slice(s) => Type::Slice(SliceType {
                element: Box::new(self.replace(&s.element)),
            }),
            Type::Map(m) => {
                let key = self.replace(&m.key);
                let value = self.replace(&m.value);
                Type::Map(MapType {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            Type::Basic(_) | Type::Nil | Type::Empty | Type::Error => ty.clone(),
        }
    }

    /// A nested function type: its own `?` color is a slot.
    fn replace_function(&mut self, f: &FunctionType) -> FunctionType {
        let effect = match f.effect {
            Effect::Maybe => self.next_color().unwrap_or(Effect::Maybe),
            fixed => fixed,
        };
        let args = f.args.iter().map(|a| self.replace(a)).collect();
        let ret = self.replace(&f.ret);
        FunctionType {
            args,
            ret: Box::new(ret),
            effect,
            generic_vars: f.generic_vars.clone(),
        }
    }
}

/// Replace generic vars in a single type. Slots are consumed from the start
/// of the map's color list.
pub fn replace_generic_vars(ty: &Type, map: &GenericMap) -> Type {
    Replacer { map, cursor: 0 }.replace(ty)
}

/// The concrete signature of a call to `f` solved by `map`.
///
/// Arguments are rewritten in order, so their `?` slots consume the recorded
/// colors exactly as matching recorded them. The return type only takes the
/// type bindings. A `?` function's own color becomes `Fail` if any slot
/// resolved to `Fail`, `Maybe` if a slot is still `Maybe` (a generic caller
/// forwarding its own `?` argument), and `Correct` otherwise.
pub fn replace_signature(f: &FunctionType, map: &GenericMap) -> FunctionType {
    let mut replacer = Replacer { map, cursor: 0 };
    let args = f.args.iter().map(|a| replacer.replace(a)).collect();
    let ret = f.ret.substitute(&map.bindings());
    let effect = match f.effect {
        Effect::Maybe => map
            .errors
            .iter()
            .copied()
            .fold(Effect::Correct, Effect::join),
        fixed => fixed,
    };
    FunctionType {
        args,
        ret: Box::new(ret),
        effect,
        generic_vars: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> Type {
        Type::GenericVar("T".into())
    }

    fn apply() -> FunctionType {
        FunctionType {
            args: vec![Type::function(vec![t()], t(), Effect::Maybe), t()],
            ret: Box::new(t()),
            effect: Effect::Maybe,
            generic_vars: vec!["T".into()],
        }
    }

    fn solved(errors: Vec<Effect>) -> GenericMap {
        let mut map = GenericMap::new(&["T".into()]);
        map.types.insert("T".into(), Type::int());
        map.errors = errors;
        map
    }

    #[test]
    fn maybe_function_fails_when_a_slot_fails() {
        let sig = replace_signature(&apply(), &solved(vec![Effect::Fail]));
        assert_eq!(sig.effect, Effect::Fail);
        assert_eq!(
            sig.args[0],
            Type::function(vec![Type::int()], Type::int(), Effect::Fail)
        );
        assert_eq!(*sig.ret, Type::int());
        assert!(sig.generic_vars.is_empty());
    }

    #[test]
    fn maybe_function_is_correct_when_slots_are_correct() {
        let sig = replace_signature(&apply(), &solved(vec![Effect::Correct]));
        assert_eq!(sig.effect, Effect::Correct);
    }

    #[test]
    fn forwarded_maybe_stays_maybe() {
        let sig = replace_signature(&apply(), &solved(vec![Effect::Maybe]));
        assert_eq!(sig.effect, Effect::Maybe);
    }

    #[test]
    fn slots_are_consumed_in_pre_order() {
        // (f? (g? -> int) -> int, h? -> int)
        let g = Type::function(vec![], Type::int(), Effect::Maybe);
        let f = Type::function(vec![g], Type::int(), Effect::Maybe);
        let h = Type::function(vec![], Type::int(), Effect::Maybe);
        let sig = FunctionType::new(vec![f, h], Type::int(), Effect::Correct);
        let mut map = GenericMap::new(&[]);
        map.errors = vec![Effect::Fail, Effect::Correct, Effect::Fail];

        let out = replace_signature(&sig, &map);
        let Type::Function(f) = &out.args[0] else { panic!("expected a function") };
        let Type::Function(g) = &f.args[0] else { panic!("expected a function") };
        let Type::Function(h) = &out.args[1] else { panic!("expected a function") };
        assert_eq!(f.effect, Effect::Fail);
        assert_eq!(g.effect, Effect::Correct);
        assert_eq!(h.effect, Effect::Fail);
        assert_eq!(out.effect, Effect::Correct);
    }

    #[test]
    fn missing_colors_leave_slots_maybe() {
        let slot = Type::function(vec![], Type::int(), Effect::Maybe);
        let replaced = replace_generic_vars(&slot, &GenericMap::new(&[]));
        assert_eq!(replaced, slot);
    }

    #[test]
    fn unbound_vars_are_left_in_place() {
        let map = GenericMap::new(&["T".into()]);
        assert_eq!(replace_generic_vars(&Type::slice(t()), &map), Type::slice(t()));
    }
}
