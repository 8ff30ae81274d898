//! Code bodies.
//!
//! The bytecode itself is produced and executed elsewhere; this core only needs the
//! parts that matter for naming, argument binding and tracing.

use std::rc::Rc;

use crate::{
    function::FuncDecl,
    heap::{HeapId, push_ref},
    intern::StringId,
    value::Value,
};

/// A compiled code body: its name, local slot names, constants and nested declarations.
#[derive(Debug)]
pub struct CodeObject {
    name: StringId,
    varnames: Vec<StringId>,
    consts: Vec<Value>,
    func_decls: Vec<Rc<FuncDecl>>,
}

impl CodeObject {
    /// Creates a code body whose local slots are named by `varnames`, in slot order.
    #[must_use]
    pub fn new(name: StringId, varnames: Vec<StringId>) -> Self {
        Self {
            name,
            varnames,
            consts: Vec::new(),
            func_decls: Vec::new(),
        }
    }

    /// Sets the constant pool. Heap constants stay alive as long as a function using this body does.
    #[must_use]
    pub fn with_consts(mut self, consts: Vec<Value>) -> Self {
        self.consts = consts;
        self
    }

    /// Adds a declaration this body defines (a nested `def` or lambda).
    #[must_use]
    pub fn with_func_decl(mut self, decl: Rc<FuncDecl>) -> Self {
        self.func_decls.push(decl);
        self
    }

    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    #[must_use]
    pub fn varnames(&self) -> &[StringId] {
        &self.varnames
    }

    #[must_use]
    pub fn consts(&self) -> &[Value] {
        &self.consts
    }

    #[must_use]
    pub fn func_decls(&self) -> &[Rc<FuncDecl>] {
        &self.func_decls
    }

    /// Returns the local slot named `name`.
    #[must_use]
    pub fn slot_of(&self, name: StringId) -> Option<usize> {
        self.varnames.iter().position(|n| *n == name)
    }

    /// Constants, then every nested declaration. Declarations form a tree, so this terminates.
    pub(crate) fn collect_refs(&self, work_list: &mut Vec<HeapId>) {
        for value in &self.consts {
            push_ref(work_list, *value);
        }
        for decl in &self.func_decls {
            decl.collect_refs(work_list);
        }
    }
}
