//! Registry of declared records and interfaces.
//!
//! Record and interface types are nominal references; this registry owns
//! their generic parameters, field lists and method tables. Declaration
//! order is preserved so the generator sees records in source order.

use melt_common::span::Span;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::ty::{bindings_for, Method, RecordType, Type};

#[derive(Clone, Debug, Serialize)]
pub struct RecordDef {
    pub label: String,
    pub generic_vars: Vec<String>,
    /// Fields in declaration order.
    pub fields: Vec<(String, Type)>,
    /// Methods from receiver functions, appended as they are loaded.
    pub methods: Vec<Method>,
    pub span: Span,
}

impl RecordDef {
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct InterfaceDef {
    pub label: String,
    pub generic_vars: Vec<String>,
    pub methods: Vec<Method>,
    pub span: Span,
}

#[derive(Clone, Debug, Default)]
pub struct Declarations {
    records: Vec<RecordDef>,
    interfaces: Vec<InterfaceDef>,
    record_index: FxHashMap<String, usize>,
    interface_index: FxHashMap<String, usize>,
}

impl Declarations {
    /// Register a record. On a clash returns the span of the earlier one.
    pub fn add_record(&mut self, def: RecordDef) -> Result<(), Span> {
        if let Some(previous) = self.span_of(&def.label) {
            return Err(previous);
        }
        self.record_index.insert(def.label.clone(), self.records.len());
        self.records.push(def);
        Ok(())
    }

    /// Register an interface. On a clash returns the span of the earlier one.
    pub fn add_interface(&mut self, def: InterfaceDef) -> Result<(), Span> {
        if let Some(previous) = self.span_of(&def.label) {
            return Err(previous);
        }
        self.interface_index
            .insert(def.label.clone(), self.interfaces.len());
        self.interfaces.push(def);
        Ok(())
    }

    /// Append a method to a record's table. Returns false for an unknown record.
    pub fn add_method(&mut self, record: &str, method: Method) -> bool {
        match self.record_index.get(record) {
            Some(&idx) => {
                self.records[idx].methods.push(method);
                true
            }
            None => false,
        }
    }

    pub fn record(&self, label: &str) -> Option<&RecordDef> {
        self.record_index.get(label).map(|&idx| &self.records[idx])
    }

    pub fn interface(&self, label: &str) -> Option<&InterfaceDef> {
        self.interface_index
            .get(label)
            .map(|&idx| &self.interfaces[idx])
    }

    pub(crate) fn record_mut(&mut self, label: &str) -> Option<&mut RecordDef> {
        let idx = *self.record_index.get(label)?;
        self.records.get_mut(idx)
    }

    pub(crate) fn interface_mut(&mut self, label: &str) -> Option<&mut InterfaceDef> {
        let idx = *self.interface_index.get(label)?;
        self.interfaces.get_mut(idx)
    }

    pub fn records(&self) -> &[RecordDef] {
        &self.records
    }

    pub fn interfaces(&self) -> &[InterfaceDef] {
        &self.interfaces
    }

    /// Generic parameter count of a declared record or interface.
    pub fn generic_arity(&self, label: &str) -> Option<usize> {
        self.record(label)
            .map(|r| r.generic_vars.len())
            .or_else(|| self.interface(label).map(|i| i.generic_vars.len()))
    }

    fn span_of(&self, label: &str) -> Option<Span> {
        self.record(label)
            .map(|r| r.span)
            .or_else(|| self.interface(label).map(|i| i.span))
    }

    /// Field type of a record instance, specialised to its instance vars.
    pub fn field_type(&self, record: &RecordType, field: &str) -> Option<Type> {
        let def = self.record(&record.label)?;
        let declared = def.field(field)?;
        if def.generic_vars.is_empty() {
            return Some(declared.clone());
        }
        let bindings = bindings_for(&def.generic_vars, &record.instance_vars);
        Some(declared.substitute(&bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{Effect, FunctionType};

    fn boxed() -> RecordDef {
        RecordDef {
            label: "Box".into(),
            generic_vars: vec!["T".into()],
            fields: vec![("value".into(), Type::GenericVar("T".into()))],
            methods: vec![],
            span: Span::new(0, 3),
        }
    }

    #[test]
    fn field_type_is_specialised() {
        let mut decls = Declarations::default();
        decls.add_record(boxed()).unwrap();
        let instance = RecordType {
            label: "Box".into(),
            instance_vars: vec![Type::string()],
        };
        assert_eq!(decls.field_type(&instance, "value"), Some(Type::string()));
        assert_eq!(decls.field_type(&instance, "missing"), None);
    }

    #[test]
    fn clash_reports_earlier_span() {
        let mut decls = Declarations::default();
        decls.add_record(boxed()).unwrap();
        let clash = InterfaceDef {
            label: "Box".into(),
            generic_vars: vec![],
            methods: vec![],
            span: Span::new(10, 13),
        };
        assert_eq!(decls.add_interface(clash), Err(Span::new(0, 3)));
    }

    #[test]
    fn methods_are_appended() {
        let mut decls = Declarations::default();
        decls.add_record(boxed()).unwrap();
        let method = Method {
            label: "size".into(),
            function: FunctionType::new(vec![], Type::int(), Effect::Correct),
        };
        assert!(decls.add_method("Box", method));
        assert!(!decls.add_method(
            "Missing",
            Method {
                label: "x".into(),
                function: FunctionType::new(vec![], Type::int(), Effect::Correct),
            }
        ));
        assert_eq!(decls.record("Box").unwrap().methods.len(), 1);
        assert_eq!(decls.generic_arity("Box"), Some(1));
    }
}
