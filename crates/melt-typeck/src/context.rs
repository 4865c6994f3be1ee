//! Checking state.
//!
//! A [`Session`] lives for one module: it owns the declaration registry,
//! the scope stack and the generic bookkeeping the instantiation pass
//! consumes. A [`FnContext`] lives for one function body and tracks its
//! effect obligations.

use std::collections::BTreeMap;

use melt_common::span::Span;
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::builtins;
use crate::decls::Declarations;
use crate::env::TypeEnv;
use crate::ty::{Effect, Type};
use crate::unify::GenericMap;

pub struct Session {
    pub decls: Declarations,
    pub env: TypeEnv,
    /// Call-site solutions requested of each generic function by
    /// non-generic callers, in request order.
    pub instantiations: BTreeMap<String, Vec<GenericMap>>,
    /// caller -> callee -> solutions a generic caller requested of a
    /// generic helper. Resolved per clone of the caller.
    pub dependencies: BTreeMap<String, BTreeMap<String, Vec<GenericMap>>>,
}

impl Session {
    pub fn new(decls: Declarations) -> Self {
        let mut env = TypeEnv::new();
        builtins::register_builtins(&mut env);
        Session {
            decls,
            env,
            instantiations: BTreeMap::new(),
            dependencies: BTreeMap::new(),
        }
    }

    /// Whether `name` names a type rather than a value.
    pub fn is_type_name(&self, name: &str) -> bool {
        builtins::is_builtin_type(name) || self.decls.generic_arity(name).is_some()
    }

    pub fn record_instantiation(&mut self, callee: &str, map: GenericMap) {
        let maps = self.instantiations.entry(callee.to_string()).or_default();
        push_unique(maps, map);
    }

    pub fn record_dependency(&mut self, caller: &str, callee: &str, map: GenericMap) {
        let maps = self
            .dependencies
            .entry(caller.to_string())
            .or_default()
            .entry(callee.to_string())
            .or_default();
        push_unique(maps, map);
    }
}

fn push_unique(maps: &mut Vec<GenericMap>, map: GenericMap) {
    let key = map.key();
    if !maps.iter().any(|m| m.key() == key) {
        maps.push(map);
    }
}

/// Effect bookkeeping for the function being checked.
pub struct FnContext {
    pub label: String,
    pub ret: Type,
    pub declared: Effect,
    /// The strongest color the body's escalations demand.
    pub required: Effect,
    /// The escalation that set `required`.
    pub required_by: Option<(String, Span)>,
    /// The function has type parameters or `?` slots.
    pub is_generic: bool,
    /// Fallible calls awaiting `on` or `escalate`, with their color and the
    /// span of the first such call.
    pub unhandled: BTreeMap<String, (Effect, Span)>,
    pub handled: FxHashSet<String>,
}

impl FnContext {
    pub fn new(label: &str, ret: Type, declared: Effect, is_generic: bool) -> Self {
        FnContext {
            label: label.to_string(),
            ret,
            declared,
            required: Effect::Correct,
            required_by: None,
            is_generic,
            unhandled: BTreeMap::new(),
            handled: FxHashSet::default(),
        }
    }

    pub fn mark_unhandled(&mut self, label: &str, effect: Effect, span: Span) {
        trace!(function = %self.label, callee = label, %effect, "unhandled call");
        self.handled.remove(label);
        self.unhandled
            .entry(label.to_string())
            .and_modify(|(pending, _)| *pending = pending.join(effect))
            .or_insert((effect, span));
    }

    /// Discharge a pending call, returning its recorded color.
    pub fn discharge(&mut self, label: &str) -> Option<Effect> {
        let (effect, _) = self.unhandled.remove(label)?;
        trace!(function = %self.label, callee = label, %effect, "handled call");
        self.handled.insert(label.to_string());
        Some(effect)
    }

    /// Raise the color the function must be declared with.
    pub fn require(&mut self, effect: Effect, callee: &str, span: Span) {
        if effect > self.required {
            self.required = effect;
            self.required_by = Some((callee.to_string(), span));
        }
    }

    /// The pending call with the earliest span.
    pub fn first_unhandled(&self) -> Option<(&str, Span)> {
        self.unhandled
            .iter()
            .min_by_key(|(_, (_, span))| span.start)
            .map(|(label, (_, span))| (label.as_str(), *span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discharge_moves_label_to_handled() {
        let mut fx = FnContext::new("main", Type::Empty, Effect::Fail, false);
        fx.mark_unhandled("read", Effect::Fail, Span::new(10, 15));
        fx.mark_unhandled("read", Effect::Maybe, Span::new(30, 35));
        assert_eq!(fx.unhandled["read"], (Effect::Fail, Span::new(10, 15)));

        assert_eq!(fx.discharge("read"), Some(Effect::Fail));
        assert!(fx.handled.contains("read"));
        assert_eq!(fx.discharge("read"), None);
    }

    #[test]
    fn first_unhandled_is_earliest() {
        let mut fx = FnContext::new("main", Type::Empty, Effect::Correct, false);
        fx.mark_unhandled("b", Effect::Fail, Span::new(20, 21));
        fx.mark_unhandled("a", Effect::Fail, Span::new(40, 41));
        assert_eq!(fx.first_unhandled(), Some(("b", Span::new(20, 21))));
    }

    #[test]
    fn require_keeps_strongest() {
        let mut fx = FnContext::new("f", Type::Empty, Effect::Correct, false);
        fx.require(Effect::Fail, "g", Span::new(1, 2));
        fx.require(Effect::Maybe, "h", Span::new(3, 4));
        assert_eq!(fx.required, Effect::Fail);
        assert_eq!(fx.required_by, Some(("g".to_string(), Span::new(1, 2))));
    }

    #[test]
    fn duplicate_requests_are_recorded_once() {
        let mut session = Session::new(Declarations::default());
        let mut map = GenericMap::new(&["T".into()]);
        map.types.insert("T".into(), Type::int());
        session.record_instantiation("first", map.clone());
        session.record_instantiation("first", map);
        assert_eq!(session.instantiations["first"].len(), 1);
        assert!(session.is_type_name("int"));
        assert!(!session.is_type_name("first"));
    }
}
