//! Melt type checker.
//!
//! Loads the parser's CST into a typed AST, checks it against a structural
//! type system with function coloring, and monomorphizes generic functions
//! into the concrete module handed to code generation.
//!
//! # Architecture
//!
//! - [`ty`]: Type representation, acceptance and the Duck capability
//! - [`decls`]: Registry of record and interface declarations
//! - [`env`]: Scope stack
//! - [`builtins`]: Builtin types and functions
//! - [`hir`]: Typed AST
//! - [`loader`]: CST -> typed AST, type expression resolution
//! - [`context`]: Per-module session and per-function effect bookkeeping
//! - [`check`]: Per-node checks, calls and the effect discipline
//! - [`unify`]: Generic matching of call-site arguments
//! - [`replace`]: Substitution of solved generic maps
//! - [`instantiate`]: Monomorphization
//! - [`error`] / [`diagnostics`]: Type errors and their rendering

pub mod builtins;
pub mod check;
pub mod context;
pub mod decls;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod hir;
pub mod instantiate;
pub mod loader;
pub mod replace;
pub mod ty;
pub mod unify;

use melt_parser::ast::item::SourceFile;

use crate::context::Session;
use crate::diagnostics::DiagnosticOptions;
use crate::error::TypeError;

/// The result of type checking a Melt module.
pub struct TypeckResult {
    /// The checked and monomorphized module. `None` when checking failed
    /// or the source did not parse.
    pub module: Option<hir::Module>,
    /// Type errors found during checking. Checking stops at the first one.
    pub errors: Vec<TypeError>,
}

impl TypeckResult {
    /// Render every error as a diagnostic string.
    pub fn render_errors(
        &self,
        source: &str,
        filename: &str,
        options: &DiagnosticOptions,
    ) -> Vec<String> {
        self.errors
            .iter()
            .map(|err| diagnostics::render_diagnostic(err, source, filename, options))
            .collect()
    }
}

/// Type-check a parsed Melt program.
///
/// Parse errors are the parser's to report: a tree with errors yields no
/// module and no type errors.
pub fn check(parse: &melt_parser::Parse) -> TypeckResult {
    if !parse.ok() {
        return TypeckResult {
            module: None,
            errors: Vec::new(),
        };
    }
    match check_source_file(&parse.tree()) {
        Ok(module) => TypeckResult {
            module: Some(module),
            errors: Vec::new(),
        },
        Err(err) => TypeckResult {
            module: None,
            errors: vec![err],
        },
    }
}

/// Load, check and monomorphize one source file.
pub fn check_source_file(file: &SourceFile) -> Result<hir::Module, TypeError> {
    let (mut module, decls) = loader::load(file)?;
    let mut session = Session::new(decls);
    check::check_module(&mut module, &mut session)?;
    instantiate::instantiate(&mut module, &session)?;
    Ok(module)
}
