//! Monomorphization.
//!
//! Every generic or `?` function is replaced by one concrete clone per
//! distinct [`GenericMap`] requested of it. Requests from non-generic
//! callers seed a work queue; cloning a generic function re-matches the
//! generic calls in its body against the now concrete argument types, which
//! yields derived requests for its helpers. A `(label, map key)` pair is
//! cloned at most once, and a chain of derived requests is cut off at
//! [`MAX_INSTANTIATION_DEPTH`].

use std::collections::VecDeque;

use melt_common::span::Span;
use rustc_hash::FxHashMap;
use tracing::{debug, debug_span};

use crate::check::iteration_types;
use crate::context::Session;
use crate::error::TypeError;
use crate::hir::{walk_expr_mut, walk_exprs_mut, Expr, ExprKind, Function, Module, Stmt, StmtKind};
use crate::replace::replace_signature;
use crate::ty::{Duck, Effect, RecordType, Type};
use crate::unify::{match_type, GenericMap};

/// Longest chain of clones requested by other clones. Polymorphic recursion
/// (`deep([x])` inside `deep<T>`) would otherwise grow its types forever.
pub const MAX_INSTANTIATION_DEPTH: usize = 64;

fn internal(message: String, span: Span) -> TypeError {
    TypeError::Internal { message, span }
}

/// Replace the module's generic functions with their concrete clones.
pub fn instantiate(module: &mut Module, session: &Session) -> Result<(), TypeError> {
    let templates: FxHashMap<String, Function> = module
        .functions
        .iter()
        .filter(|f| f.receiver.is_none() && f.signature().is_generic())
        .map(|f| (f.label.clone(), f.clone()))
        .collect();

    let mut expander = Expander {
        session,
        templates: &templates,
        clone_names: FxHashMap::default(),
        counters: FxHashMap::default(),
        queue: VecDeque::new(),
    };
    for (label, maps) in &session.instantiations {
        for map in maps {
            expander.request(label, map.clone(), 0, Span::default())?;
        }
    }

    let mut clones: FxHashMap<String, Vec<Function>> = FxHashMap::default();
    while let Some((label, map, name, depth)) = expander.queue.pop_front() {
        let template = templates.get(&label).ok_or_else(|| {
            internal(
                format!("instantiation requested of unknown function `{label}`"),
                Span::default(),
            )
        })?;
        let _span = debug_span!("instantiate", function = %label, clone = %name).entered();
        debug!(key = %map.key(), "cloning generic function");
        let function = expander.concretize(template, &map, name, depth)?;
        clones.entry(label).or_default().push(function);
    }

    let mut functions = Vec::new();
    for mut function in std::mem::take(&mut module.functions) {
        if function.receiver.is_none() && templates.contains_key(&function.label) {
            // A generic function nobody calls produces no code.
            functions.extend(clones.remove(&function.label).unwrap_or_default());
        } else {
            expander.pass_through(&mut function)?;
            functions.push(function);
        }
    }

    module.record_instances = verify(&mut functions)?;
    module.functions = functions;
    Ok(())
}

struct Expander<'a> {
    session: &'a Session,
    templates: &'a FxHashMap<String, Function>,
    /// (label, map key) -> clone label.
    clone_names: FxHashMap<(String, String), String>,
    counters: FxHashMap<String, usize>,
    /// (label, map, clone label, derivation depth)
    queue: VecDeque<(String, GenericMap, String, usize)>,
}

impl Expander<'_> {
    /// The clone label for `label` under `map`, queueing it if new.
    fn request(
        &mut self,
        label: &str,
        map: GenericMap,
        depth: usize,
        span: Span,
    ) -> Result<String, TypeError> {
        let key = (label.to_string(), map.key());
        if let Some(name) = self.clone_names.get(&key) {
            return Ok(name.clone());
        }
        if depth > MAX_INSTANTIATION_DEPTH {
            return Err(TypeError::InstantiationLimit {
                function: label.to_string(),
                limit: MAX_INSTANTIATION_DEPTH,
                span,
            });
        }
        let counter = self.counters.entry(label.to_string()).or_insert(0);
        let name = format!("{label}{counter}");
        *counter += 1;
        self.clone_names.insert(key, name.clone());
        self.queue.push_back((label.to_string(), map, name.clone(), depth));
        Ok(name)
    }

    fn concretize(
        &mut self,
        template: &Function,
        map: &GenericMap,
        name: String,
        depth: usize,
    ) -> Result<Function, TypeError> {
        let signature = replace_signature(&template.signature(), map);
        let mut function = template.clone();
        function.label = name;
        function.generic_vars.clear();
        for (param, ty) in function.params.iter_mut().zip(&signature.args) {
            param.ty = ty.clone();
        }
        function.ret = *signature.ret;
        function.effect = signature.effect;

        let mut rewriter = Rewriter {
            scopes: vec![params_of(&function)],
            expander: self,
            caller: &template.label,
            bindings: map.bindings(),
            expand: true,
            depth,
        };
        rewriter.body(&mut function.body)?;
        Ok(function)
    }

    /// Point a non-generic function's generic calls at their clones.
    fn pass_through(&mut self, function: &mut Function) -> Result<(), TypeError> {
        let mut rewriter = Rewriter {
            scopes: vec![params_of(function)],
            expander: self,
            caller: &function.label,
            bindings: FxHashMap::default(),
            expand: false,
            depth: 0,
        };
        rewriter.body(&mut function.body)
    }
}

fn params_of(function: &Function) -> FxHashMap<String, Type> {
    function
        .params
        .iter()
        .map(|p| (p.name.clone(), p.ty.clone()))
        .collect()
}

/// Rewrites one function body to concrete types.
struct Rewriter<'e, 'a> {
    expander: &'e mut Expander<'a>,
    /// The template's label, under which its dependencies were recorded.
    caller: &'e str,
    bindings: FxHashMap<String, Type>,
    /// Concrete types of parameters and locals, one frame per block as the
    /// checker scoped them.
    scopes: Vec<FxHashMap<String, Type>>,
    /// Queue derived requests (cloning a generic function) rather than look
    /// up existing clones (a non-generic caller).
    expand: bool,
    /// Derivation depth of the clone being rewritten.
    depth: usize,
}

impl Rewriter<'_, '_> {
    fn lookup(&self, name: &str) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|frame| frame.get(name))
    }

    fn scoped(&mut self, bindings: Vec<(String, Type)>, body: &mut [Stmt]) -> Result<(), TypeError> {
        self.scopes.push(bindings.into_iter().collect());
        let result = self.body(body);
        self.scopes.pop();
        result
    }

    fn body(&mut self, stmts: &mut [Stmt]) -> Result<(), TypeError> {
        for stmt in stmts {
            let span = stmt.span;
            match &mut stmt.kind {
                StmtKind::Set { label, value } => {
                    self.expr(value)?;
                    if self.lookup(&label.name).is_none() {
                        if let Some(frame) = self.scopes.last_mut() {
                            frame.insert(label.name.clone(), value.ty.clone());
                        }
                    }
                }
                StmtKind::IndexAssign {
                    collection,
                    index,
                    value,
                } => {
                    self.expr(collection)?;
                    self.expr(index)?;
                    self.expr(value)?;
                }
                StmtKind::Return(Some(e)) | StmtKind::ReturnError(e) | StmtKind::Expr(e) => {
                    self.expr(e)?
                }
                StmtKind::Return(None) | StmtKind::Escalate(_) => {}
                StmtKind::On { body, .. } => self.scoped(Vec::new(), body)?,
                StmtKind::ForIn {
                    index,
                    value,
                    sequence,
                    body,
                } => {
                    self.expr(sequence)?;
                    let seq = sequence.ty.deref();
                    let (key, element) = iteration_types(seq, &self.expander.session.decls)
                        .ok_or_else(|| internal(format!("`{seq}` is not iterable"), span))?;
                    let mut bindings = Vec::new();
                    if let Some(index) = index {
                        bindings.push((index.name.clone(), key));
                    }
                    bindings.push((value.name.clone(), element));
                    self.scoped(bindings, body)?;
                }
                StmtKind::ForRange {
                    index,
                    start,
                    end,
                    body,
                    ..
                } => {
                    self.expr(start)?;
                    self.expr(end)?;
                    self.scoped(vec![(index.name.clone(), Type::int())], body)?;
                }
                StmtKind::If {
                    test,
                    then,
                    otherwise,
                } => {
                    self.expr(test)?;
                    self.scoped(Vec::new(), then)?;
                    self.scoped(Vec::new(), otherwise)?;
                }
            }
        }
        Ok(())
    }

    fn expr(&mut self, expr: &mut Expr) -> Result<(), TypeError> {
        let mut error = None;
        walk_expr_mut(expr, &mut |node| {
            if error.is_none() {
                if let Err(err) = self.node(node) {
                    error = Some(err);
                }
            }
        });
        error.map_or(Ok(()), Err)
    }

    /// Rewrite one node. Children are already concrete.
    fn node(&mut self, node: &mut Expr) -> Result<(), TypeError> {
        let span = node.span;
        let session = self.expander.session;
        let decls = &session.decls;
        match &mut node.kind {
            ExprKind::Label(label) => {
                if let Some(ty) = self.lookup(&label.name) {
                    node.ty = ty.clone();
                    return Ok(());
                }
            }
            ExprKind::Call {
                callee,
                args,
                effect,
            } => {
                if let Some(Type::Function(f)) = self.lookup(&callee.name) {
                    node.ty = (*f.ret).clone();
                    *effect = f.effect;
                    return Ok(());
                }
                let templates = self.expander.templates;
                if let Some(template) = templates.get(&callee.name) {
                    let signature = template.signature();
                    let mut derived = GenericMap::new(&signature.generic_vars);
                    for (declared, arg) in signature.args.iter().zip(args.iter()) {
                        match_type(declared, &arg.ty, &mut derived, decls).map_err(|m| {
                            internal(
                                format!(
                                    "instantiating `{}`: expected `{}`, found `{}`",
                                    callee.name, m.expected, m.found
                                ),
                                arg.span,
                            )
                        })?;
                    }
                    let clone = self.clone_for(&callee.name, derived.clone(), span)?;
                    let concrete = replace_signature(&signature, &derived);
                    node.ty = *concrete.ret;
                    *effect = concrete.effect;
                    callee.name = clone;
                    return Ok(());
                }
            }
            ExprKind::MethodCall {
                receiver,
                method,
                effect,
                ..
            } => {
                let found = receiver
                    .ty
                    .deref()
                    .as_duck()
                    .and_then(|duck| duck.method(&method.name, decls))
                    .ok_or_else(|| {
                        internal(
                            format!("`{}` has no method `{}`", receiver.ty, method.name),
                            span,
                        )
                    })?;
                *effect = match found.function.effect {
                    Effect::Maybe => Effect::Fail,
                    other => other,
                };
                node.ty = *found.function.ret;
                return Ok(());
            }
            ExprKind::Make { ty, .. } => *ty = ty.substitute(&self.bindings),
            _ => {}
        }
        node.ty = node.ty.substitute(&self.bindings);
        Ok(())
    }

    fn clone_for(
        &mut self,
        callee: &str,
        derived: GenericMap,
        span: Span,
    ) -> Result<String, TypeError> {
        if self.expand {
            let recorded = self
                .expander
                .session
                .dependencies
                .get(self.caller)
                .map_or(false, |deps| deps.contains_key(callee));
            if !recorded {
                return Err(internal(
                    format!("`{}` calls `{callee}` without a recorded dependency", self.caller),
                    span,
                ));
            }
            return self.expander.request(callee, derived, self.depth + 1, span);
        }
        let key = (callee.to_string(), derived.key());
        self.expander.clone_names.get(&key).cloned().ok_or_else(|| {
            internal(
                format!("no instantiation of `{callee}` for `{}`", key.1),
                span,
            )
        })
    }
}

/// Check that nothing generic or `?`-colored reaches code generation and
/// collect the concrete instances of generic records the functions use, in
/// first-use order.
fn verify(functions: &mut [Function]) -> Result<Vec<RecordType>, TypeError> {
    let residual = |ty: &Type| ty.has_generic_vars() || ty.maybe_slots() > 0;
    let mut records = Vec::new();
    for function in functions.iter_mut() {
        let signature_ok = function.effect != Effect::Maybe
            && !residual(&function.ret)
            && !function.params.iter().any(|p| residual(&p.ty));
        if !signature_ok {
            return Err(internal(
                format!("`{}` is still generic after instantiation", function.label),
                function.span,
            ));
        }

        for param in &function.params {
            collect_records(&param.ty, &mut records);
        }
        collect_records(&function.ret, &mut records);

        let label = function.label.clone();
        let mut error = None;
        walk_exprs_mut(&mut function.body, &mut |node| {
            if error.is_some() {
                return;
            }
            collect_records(&node.ty, &mut records);
            if let ExprKind::Make { ty, .. } = &node.kind {
                collect_records(ty, &mut records);
            }
            let maybe_call = matches!(
                node.kind,
                ExprKind::Call { effect: Effect::Maybe, .. }
                    | ExprKind::MethodCall { effect: Effect::Maybe, .. }
            );
            if maybe_call || residual(&node.ty) {
                error = Some(internal(
                    format!("`{label}` keeps the generic type `{}`", node.ty),
                    node.span,
                ));
            }
        });
        if let Some(err) = error {
            return Err(err);
        }
    }
    Ok(records)
}

fn collect_records(ty: &Type, out: &mut Vec<RecordType>) {
    match ty {
        Type::Record(record) => {
            for var in &record.instance_vars {
                collect_records(var, out);
            }
            if !record.instance_vars.is_empty() && !out.contains(record) {
                out.push(record.clone());
            }
        }
        Type::Interface(iface) => {
            for var in &iface.instance_vars {
                collect_records(var, out);
            }
        }
        Type::Function(f) => {
            for arg in &f.args {
                collect_records(arg, out);
            }
            collect_records(&f.ret, out);
        }
        Type::Pointer(inner) => collect_records(inner, out),
        Type::Slice(slice) => collect_records(&slice.element, out),
        Type::Map(map) => {
            collect_records(&map.key, out);
            collect_records(&map.value, out);
        }
        Type::Basic(_) | Type::GenericVar(_) | Type::Nil | Type::Empty | Type::Error => {}
    }
}
