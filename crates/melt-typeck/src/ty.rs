//! Type representation for the Melt type system.
//!
//! `Type` is a closed set of variants. Records and interfaces are nominal
//! references into the [`Declarations`] registry, which owns their field and
//! method tables; that keeps `Type` small, hashable and able to describe
//! self-referential records (`next *Node`).
//!
//! Functions carry an [`Effect`] color: `Correct` (never fails), `Maybe`
//! (takes its color from its `?` arguments at each call site) or `Fail`.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::builtins;
use crate::decls::Declarations;

/// The three-state fallibility color of a function.
///
/// The ordering `Correct < Maybe < Fail` is the escalation lattice: joining
/// two colors keeps the stronger one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Effect {
    Correct,
    Maybe,
    Fail,
}

impl Effect {
    /// The label suffix spelling this color: ``, `?` or `!`.
    pub fn suffix(self) -> &'static str {
        match self {
            Effect::Correct => "",
            Effect::Maybe => "?",
            Effect::Fail => "!",
        }
    }

    pub fn join(self, other: Effect) -> Effect {
        self.max(other)
    }

    pub fn is_fallible(self) -> bool {
        self != Effect::Correct
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Correct => write!(f, "correct"),
            Effect::Maybe => write!(f, "maybe"),
            Effect::Fail => write!(f, "fail"),
        }
    }
}

/// Split a label into its base name and the color its suffix spells.
///
/// `read!` -> (`read`, Fail), `apply?` -> (`apply`, Maybe), `x` -> (`x`, Correct).
pub fn split_label(label: &str) -> (&str, Effect) {
    if let Some(base) = label.strip_suffix('!') {
        (base, Effect::Fail)
    } else if let Some(base) = label.strip_suffix('?') {
        (base, Effect::Maybe)
    } else {
        (label, Effect::Correct)
    }
}

/// A reference to a declared record, with its generic arguments bound.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RecordType {
    pub label: String,
    pub instance_vars: Vec<Type>,
}

/// A reference to a declared interface, with its generic arguments bound.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct InterfaceType {
    pub label: String,
    pub instance_vars: Vec<Type>,
}

/// The builtin slice `[]T`. Its method table is the builtin `Slice` one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SliceType {
    pub element: Box<Type>,
}

/// The builtin map `map[K]V`. It exposes no methods.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MapType {
    pub key: Box<Type>,
    pub value: Box<Type>,
}

/// A function signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionType {
    pub args: Vec<Type>,
    pub ret: Box<Type>,
    pub effect: Effect,
    /// Generic parameters declared by the function itself (`<T, U>`).
    pub generic_vars: Vec<String>,
}

impl FunctionType {
    pub fn new(args: Vec<Type>, ret: Type, effect: Effect) -> Self {
        FunctionType {
            args,
            ret: Box::new(ret),
            effect,
            generic_vars: Vec::new(),
        }
    }

    /// Whether calls to this signature go through unification: it has type
    /// parameters, is `?`-colored, or has an argument carrying a `?` slot.
    pub fn is_generic(&self) -> bool {
        !self.generic_vars.is_empty()
            || self.effect == Effect::Maybe
            || self.args.iter().any(|arg| arg.maybe_slots() > 0)
    }
}

/// A named method in a duck's method table. The label has no suffix; the
/// color lives in the function type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Method {
    pub label: String,
    pub function: FunctionType,
}

/// A Melt type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    /// `int`, `string`, `float`, `bool`, `byte`, ...
    Basic(String),
    Record(RecordType),
    Interface(InterfaceType),
    Function(FunctionType),
    Pointer(Box<Type>),
    Slice(SliceType),
    Map(MapType),
    /// A generic placeholder, `@T` when printed.
    GenericVar(String),
    /// The type of the `nil` literal.
    Nil,
    /// No type: the result of a call to a function without a return value.
    Empty,
    /// The type of `$err` inside an `on` handler.
    Error,
}

impl Type {
    pub fn int() -> Type {
        Type::Basic("int".into())
    }

    pub fn float() -> Type {
        Type::Basic("float".into())
    }

    pub fn string() -> Type {
        Type::Basic("string".into())
    }

    pub fn bool() -> Type {
        Type::Basic("bool".into())
    }

    pub fn slice(element: Type) -> Type {
        Type::Slice(SliceType {
            element: Box::new(element),
        })
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(MapType {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    pub fn pointer(pointee: Type) -> Type {
        Type::Pointer(Box::new(pointee))
    }

    pub fn function(args: Vec<Type>, ret: Type, effect: Effect) -> Type {
        Type::Function(FunctionType::new(args, ret, effect))
    }

    pub fn record(label: impl Into<String>, instance_vars: Vec<Type>) -> Type {
        Type::Record(RecordType {
            label: label.into(),
            instance_vars,
        })
    }

    pub fn interface(label: impl Into<String>, instance_vars: Vec<Type>) -> Type {
        Type::Interface(InterfaceType {
            label: label.into(),
            instance_vars,
        })
    }

    pub fn is_basic(&self, label: &str) -> bool {
        matches!(self, Type::Basic(l) if l == label)
    }

    /// The Duck capability of this type, if it has a method table.
    pub fn as_duck(&self) -> Option<&dyn Duck> {
        match self {
            Type::Record(r) => Some(r),
            Type::Interface(i) => Some(i),
            Type::Slice(s) => Some(s),
            Type::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Strip one level of pointer indirection.
    pub fn deref(&self) -> &Type {
        match self {
            Type::Pointer(inner) => inner,
            other => other,
        }
    }

    /// Whether a value of type `other` can be used where `self` is expected.
    pub fn accepts(&self, other: &Type, decls: &Declarations) -> bool {
        if matches!(other, Type::Nil) {
            return self.accepts_nil();
        }
        match (self, other) {
            (Type::Basic(a), Type::Basic(b)) => a == b,
            (Type::Record(a), Type::Record(b)) => {
                a.label == b.label && pairwise_accepts(&a.instance_vars, &b.instance_vars, decls)
            }
            (Type::Interface(a), Type::Interface(b)) if a.label == b.label => {
                pairwise_accepts(&a.instance_vars, &b.instance_vars, decls)
            }
            (Type::Interface(iface), _) => iface.accepts_duck(other, decls),
            (Type::Function(a), Type::Function(b)) => a.accepts(b, decls),
            (Type::Pointer(a), Type::Pointer(b)) => a.accepts(b, decls),
            (Type::Slice(a), Type::Slice(b)) => a.element.accepts(&b.element, decls),
            (Type::Map(a), Type::Map(b)) => {
                a.key.accepts(&b.key, decls) && a.value.accepts(&b.value, decls)
            }
            (Type::GenericVar(a), Type::GenericVar(b)) => a == b,
            (Type::Empty, Type::Empty) => true,
            (Type::Error, Type::Error) => true,
            _ => false,
        }
    }

    pub fn accepts_nil(&self) -> bool {
        matches!(
            self,
            Type::Nil
                | Type::Pointer(_)
                | Type::Slice(_)
                | Type::Map(_)
                | Type::Interface(_)
                | Type::Function(_)
        )
    }

    /// Replace every bound generic variable. Unbound variables stay as they are.
    pub fn substitute(&self, bindings: &FxHashMap<String, Type>) -> Type {
        match self {
            Type::GenericVar(name) => bindings
                .get(name)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Type::Record(r) => Type::Record(RecordType {
                label: r.label.clone(),
                instance_vars: substitute_all(&r.instance_vars, bindings),
            }),
            Type::Interface(i) => Type::Interface(InterfaceType {
                label: i.label.clone(),
                instance_vars: substitute_all(&i.instance_vars, bindings),
            }),
            Type::Function(f) => Type::Function(f.substitute(bindings)),
            Type::Pointer(inner) => Type::pointer(inner.substitute(bindings)),
            Type::Slice(s) => Type::slice(s.element.substitute(bindings)),
            Type::Map(m) => Type::map(m.key.substitute(bindings), m.value.substitute(bindings)),
            Type::Basic(_) | Type::Nil | Type::Empty | Type::Error => self.clone(),
        }
    }

    /// Whether any generic variable occurs in this type.
    pub fn has_generic_vars(&self) -> bool {
        match self {
            Type::GenericVar(_) => true,
            Type::Record(r) => r.instance_vars.iter().any(Type::has_generic_vars),
            Type::Interface(i) => i.instance_vars.iter().any(Type::has_generic_vars),
            Type::Function(f) => {
                f.args.iter().any(Type::has_generic_vars) || f.ret.has_generic_vars()
            }
            Type::Pointer(inner) => inner.has_generic_vars(),
            Type::Slice(s) => s.element.has_generic_vars(),
            Type::Map(m) => m.key.has_generic_vars() || m.value.has_generic_vars(),
            Type::Basic(_) | Type::Nil | Type::Empty | Type::Error => false,
        }
    }

    /// Number of `?`-colored function types nested in this type.
    pub fn maybe_slots(&self) -> usize {
        match self {
            Type::Function(f) => {
                usize::from(f.effect == Effect::Maybe)
                    + f.args.iter().map(Type::maybe_slots).sum::<usize>()
                    + f.ret.maybe_slots()
            }
            Type::Record(r) => r.instance_vars.iter().map(Type::maybe_slots).sum(),
            Type::Interface(i) => i.instance_vars.iter().map(Type::maybe_slots).sum(),
            Type::Pointer(inner) => inner.maybe_slots(),
            Type::Slice(s) => s.element.maybe_slots(),
            Type::Map(m) => m.key.maybe_slots() + m.value.maybe_slots(),
            Type::Basic(_) | Type::GenericVar(_) | Type::Nil | Type::Empty | Type::Error => 0,
        }
    }
}

fn pairwise_accepts(expected: &[Type], found: &[Type], decls: &Declarations) -> bool {
    expected.len() == found.len()
        && expected
            .iter()
            .zip(found)
            .all(|(e, f)| e.accepts(f, decls))
}

pub(crate) fn substitute_all(types: &[Type], bindings: &FxHashMap<String, Type>) -> Vec<Type> {
    types.iter().map(|t| t.substitute(bindings)).collect()
}

/// Bind a declaration's generic parameters to the instance vars of a use.
pub(crate) fn bindings_for(generic_vars: &[String], instance_vars: &[Type]) -> FxHashMap<String, Type> {
    generic_vars
        .iter()
        .cloned()
        .zip(instance_vars.iter().cloned())
        .collect()
}

impl FunctionType {
    /// Function acceptance: contravariant arguments, covariant return, equal
    /// colors unless the accepting side is `Maybe`.
    pub fn accepts(&self, other: &FunctionType, decls: &Declarations) -> bool {
        if self.effect != Effect::Maybe && self.effect != other.effect {
            return false;
        }
        self.generic_vars.len() == other.generic_vars.len()
            && self.args.len() == other.args.len()
            && self.ret.accepts(&other.ret, decls)
            && self
                .args
                .iter()
                .zip(&other.args)
                .all(|(mine, theirs)| theirs.accepts(mine, decls))
    }

    pub fn substitute(&self, bindings: &FxHashMap<String, Type>) -> FunctionType {
        FunctionType {
            args: substitute_all(&self.args, bindings),
            ret: Box::new(self.ret.substitute(bindings)),
            effect: self.effect,
            generic_vars: self.generic_vars.clone(),
        }
    }
}

// ── Duck capability ────────────────────────────────────────────────────

/// A type exposing a method table. Interfaces accept any duck providing
/// every method they require.
pub trait Duck {
    /// The method table, specialised to the duck's instance vars.
    fn methods(&self, decls: &Declarations) -> Vec<Method>;

    fn method(&self, label: &str, decls: &Declarations) -> Option<Method> {
        self.methods(decls).into_iter().find(|m| m.label == label)
    }
}

impl Duck for RecordType {
    fn methods(&self, decls: &Declarations) -> Vec<Method> {
        decls
            .record(&self.label)
            .map(|def| specialise(&def.methods, &def.generic_vars, &self.instance_vars))
            .unwrap_or_default()
    }
}

impl Duck for InterfaceType {
    fn methods(&self, decls: &Declarations) -> Vec<Method> {
        decls
            .interface(&self.label)
            .map(|def| specialise(&def.methods, &def.generic_vars, &self.instance_vars))
            .unwrap_or_default()
    }
}

impl Duck for SliceType {
    fn methods(&self, _decls: &Declarations) -> Vec<Method> {
        builtins::slice_methods(&self.element)
    }
}

impl Duck for MapType {
    fn methods(&self, _decls: &Declarations) -> Vec<Method> {
        Vec::new()
    }
}

fn specialise(methods: &[Method], generic_vars: &[String], instance_vars: &[Type]) -> Vec<Method> {
    if generic_vars.is_empty() {
        return methods.to_vec();
    }
    let bindings = bindings_for(generic_vars, instance_vars);
    methods
        .iter()
        .map(|m| Method {
            label: m.label.clone(),
            function: m.function.substitute(&bindings),
        })
        .collect()
}

impl InterfaceType {
    /// Structural check: every required method is provided by `candidate`
    /// with an acceptable signature. An interface without methods accepts
    /// any basic value or duck.
    fn accepts_duck(&self, candidate: &Type, decls: &Declarations) -> bool {
        let required = self.methods(decls);
        if let Type::Basic(_) = candidate {
            return required.is_empty();
        }
        let Some(duck) = candidate.as_duck() else {
            return false;
        };
        let provided = duck.methods(decls);
        required.iter().all(|req| {
            provided
                .iter()
                .any(|m| m.label == req.label && req.function.accepts(&m.function, decls))
        })
    }
}

// ── Display ────────────────────────────────────────────────────────────

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (i, t) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", t)?;
    }
    Ok(())
}

fn write_instance(f: &mut fmt::Formatter<'_>, label: &str, vars: &[Type]) -> fmt::Result {
    write!(f, "{}", label)?;
    if !vars.is_empty() {
        write!(f, "<")?;
        write_list(f, vars)?;
        write!(f, ">")?;
    }
    Ok(())
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        write_list(f, &self.args)?;
        if !self.args.is_empty() {
            write!(f, " ")?;
        }
        write!(f, "-> {}){}", self.ret, self.effect.suffix())
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_instance(f, &self.label, &self.instance_vars)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(label) => write!(f, "{}", label),
            Type::Record(r) => write!(f, "{}", r),
            Type::Interface(i) => write_instance(f, &i.label, &i.instance_vars),
            Type::Function(func) => write!(f, "{}", func),
            Type::Pointer(inner) => write!(f, "*{}", inner),
            Type::Slice(s) => write!(f, "[]{}", s.element),
            Type::Map(m) => write!(f, "map[{}]{}", m.key, m.value),
            Type::GenericVar(label) => write!(f, "@{}", label),
            Type::Nil => write!(f, "nil"),
            Type::Empty => write!(f, "empty"),
            Type::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decls::{InterfaceDef, RecordDef};
    use melt_common::span::Span;

    fn decls() -> Declarations {
        let mut decls = Declarations::default();
        decls
            .add_record(RecordDef {
                label: "Point".into(),
                generic_vars: vec![],
                fields: vec![("x".into(), Type::int()), ("y".into(), Type::int())],
                methods: vec![Method {
                    label: "area".into(),
                    function: FunctionType::new(vec![], Type::float(), Effect::Correct),
                }],
                span: Span::default(),
            })
            .unwrap();
        decls
            .add_record(RecordDef {
                label: "Box".into(),
                generic_vars: vec!["T".into()],
                fields: vec![("value".into(), Type::GenericVar("T".into()))],
                methods: vec![],
                span: Span::default(),
            })
            .unwrap();
        decls
            .add_interface(InterfaceDef {
                label: "Shape".into(),
                generic_vars: vec![],
                methods: vec![Method {
                    label: "area".into(),
                    function: FunctionType::new(vec![], Type::float(), Effect::Correct),
                }],
                span: Span::default(),
            })
            .unwrap();
        decls
            .add_interface(InterfaceDef {
                label: "Any".into(),
                generic_vars: vec![],
                methods: vec![],
                span: Span::default(),
            })
            .unwrap();
        decls
    }

    #[test]
    fn split_label_reads_suffix() {
        assert_eq!(split_label("read!"), ("read", Effect::Fail));
        assert_eq!(split_label("apply?"), ("apply", Effect::Maybe));
        assert_eq!(split_label("x"), ("x", Effect::Correct));
    }

    #[test]
    fn effect_join_keeps_stronger_color() {
        assert_eq!(Effect::Correct.join(Effect::Maybe), Effect::Maybe);
        assert_eq!(Effect::Fail.join(Effect::Maybe), Effect::Fail);
        assert_eq!(Effect::Correct.join(Effect::Correct), Effect::Correct);
    }

    #[test]
    fn basic_accepts_is_reflexive_by_label() {
        let d = decls();
        assert!(Type::int().accepts(&Type::int(), &d));
        assert!(!Type::int().accepts(&Type::string(), &d));
    }

    #[test]
    fn record_accepts_by_label_and_instance_vars() {
        let d = decls();
        let point = Type::record("Point", vec![]);
        assert!(point.accepts(&point, &d));
        let box_int = Type::record("Box", vec![Type::int()]);
        let box_string = Type::record("Box", vec![Type::string()]);
        assert!(box_int.accepts(&box_int, &d));
        assert!(!box_int.accepts(&box_string, &d));
        assert!(!point.accepts(&Type::Nil, &d));
    }

    #[test]
    fn interface_accepts_ducks_structurally() {
        let d = decls();
        let shape = Type::interface("Shape", vec![]);
        assert!(shape.accepts(&Type::record("Point", vec![]), &d));
        assert!(!shape.accepts(&Type::record("Box", vec![Type::int()]), &d));
        assert!(!shape.accepts(&Type::int(), &d));
        assert!(shape.accepts(&Type::Nil, &d));
        // Acceptance is directional.
        assert!(!Type::record("Point", vec![]).accepts(&shape, &d));
    }

    #[test]
    fn empty_interface_accepts_basics_and_ducks() {
        let d = decls();
        let any = Type::interface("Any", vec![]);
        assert!(any.accepts(&Type::int(), &d));
        assert!(any.accepts(&Type::slice(Type::int()), &d));
        assert!(!Type::int().accepts(&any, &d));
    }

    #[test]
    fn function_accepts_checks_color() {
        let d = decls();
        let correct = FunctionType::new(vec![Type::int()], Type::int(), Effect::Correct);
        let fail = FunctionType::new(vec![Type::int()], Type::int(), Effect::Fail);
        let maybe = FunctionType::new(vec![Type::int()], Type::int(), Effect::Maybe);
        assert!(correct.accepts(&correct, &d));
        assert!(!correct.accepts(&fail, &d));
        assert!(!fail.accepts(&correct, &d));
        assert!(maybe.accepts(&fail, &d));
        assert!(maybe.accepts(&correct, &d));
    }

    #[test]
    fn function_accepts_is_contravariant_in_args() {
        let d = decls();
        let takes_shape = FunctionType::new(
            vec![Type::interface("Shape", vec![])],
            Type::int(),
            Effect::Correct,
        );
        let takes_point = FunctionType::new(
            vec![Type::record("Point", vec![])],
            Type::int(),
            Effect::Correct,
        );
        assert!(takes_point.accepts(&takes_shape, &d));
        assert!(!takes_shape.accepts(&takes_point, &d));
    }

    #[test]
    fn containers_accept_componentwise_and_nil() {
        let d = decls();
        assert!(Type::slice(Type::int()).accepts(&Type::slice(Type::int()), &d));
        assert!(!Type::slice(Type::int()).accepts(&Type::slice(Type::string()), &d));
        assert!(Type::map(Type::string(), Type::int()).accepts(&Type::Nil, &d));
        assert!(Type::pointer(Type::int()).accepts(&Type::pointer(Type::int()), &d));
        assert!(!Type::pointer(Type::int()).accepts(&Type::int(), &d));
    }

    #[test]
    fn slice_duck_exposes_builtin_methods() {
        let d = decls();
        let slice = SliceType {
            element: Box::new(Type::string()),
        };
        let next = slice.method("Next", &d).unwrap();
        assert_eq!(*next.function.ret, Type::pointer(Type::string()));
        assert!(slice.method("Length", &d).is_some());
    }

    #[test]
    fn substitute_leaves_unbound_vars() {
        let mut bindings = FxHashMap::default();
        bindings.insert("T".to_string(), Type::int());
        let t = Type::map(Type::GenericVar("T".into()), Type::GenericVar("U".into()));
        assert_eq!(
            t.substitute(&bindings),
            Type::map(Type::int(), Type::GenericVar("U".into()))
        );
    }

    #[test]
    fn maybe_slots_count_nested_functions() {
        let inner = Type::function(vec![], Type::int(), Effect::Maybe);
        let outer = Type::function(vec![inner.clone()], Type::int(), Effect::Maybe);
        assert_eq!(outer.maybe_slots(), 2);
        assert_eq!(Type::slice(inner).maybe_slots(), 1);
        assert_eq!(Type::int().maybe_slots(), 0);
    }

    #[test]
    fn display_forms() {
        let f = Type::function(vec![Type::int(), Type::string()], Type::bool(), Effect::Fail);
        assert_eq!(f.to_string(), "(int, string -> bool)!");
        assert_eq!(
            Type::function(vec![], Type::int(), Effect::Correct).to_string(),
            "(-> int)"
        );
        assert_eq!(Type::record("Box", vec![Type::int()]).to_string(), "Box<int>");
        assert_eq!(Type::pointer(Type::GenericVar("T".into())).to_string(), "*@T");
        assert_eq!(Type::slice(Type::int()).to_string(), "[]int");
        assert_eq!(Type::map(Type::string(), Type::int()).to_string(), "map[string]int");
        assert_eq!(Type::Nil.to_string(), "nil");
        assert_eq!(Type::Empty.to_string(), "empty");
        assert_eq!(Type::Error.to_string(), "error");
    }
}
