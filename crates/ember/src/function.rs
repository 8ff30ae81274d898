//! Function declarations, function instances and call-argument binding.
//!
//! A [`FuncDecl`] is the static, shared half of a function: its parameter layout and code
//! body. A [`Function`] is what a `def` statement evaluates to: the declaration bound to an
//! owning module and, for nested functions, the captured enclosing scope.

use std::rc::Rc;

use crate::{
    args::ArgValues,
    code::CodeObject,
    exception::{ExcType, RunResult},
    heap::{Heap, HeapData, HeapId, HeapView, push_ref},
    intern::StringId,
    namedict::NameDict,
    resource::ResourceTracker,
    types::Dict,
    value::Value,
};

/// A keyword parameter and its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KwArg {
    /// Local slot the parameter binds to.
    pub slot: usize,
    pub default: Value,
}

/// Static parameter layout of a function, shared by every instance made from it.
///
/// Keyword parameters are keyword-only: surplus positional arguments never fill them.
#[derive(Debug)]
pub struct FuncDecl {
    code: Rc<CodeObject>,
    args: Vec<usize>,
    kwargs: Vec<KwArg>,
    starred_arg: Option<usize>,
    starred_kwarg: Option<usize>,
    nested: bool,
    is_simple: bool,
}

impl FuncDecl {
    /// Starts a declaration for `code` with no parameters.
    #[must_use]
    pub fn builder(code: Rc<CodeObject>) -> FuncDeclBuilder {
        FuncDeclBuilder {
            decl: Self {
                code,
                args: Vec::new(),
                kwargs: Vec::new(),
                starred_arg: None,
                starred_kwarg: None,
                nested: false,
                is_simple: true,
            },
        }
    }

    #[must_use]
    pub fn code(&self) -> &Rc<CodeObject> {
        &self.code
    }

    /// Slots of the required positional parameters, in order.
    #[must_use]
    pub fn args(&self) -> &[usize] {
        &self.args
    }

    #[must_use]
    pub fn kwargs(&self) -> &[KwArg] {
        &self.kwargs
    }

    /// Slot receiving surplus positional arguments as a tuple (`*args`).
    #[must_use]
    pub fn starred_arg(&self) -> Option<usize> {
        self.starred_arg
    }

    /// Slot receiving surplus keyword arguments as a dict (`**kwargs`).
    #[must_use]
    pub fn starred_kwarg(&self) -> Option<usize> {
        self.starred_kwarg
    }

    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.nested
    }

    /// True when there are no defaults and no variadics, so binding is a plain copy.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.is_simple
    }

    /// Finds the parameter slot a keyword argument named `name` binds to.
    fn param_slot(&self, name: StringId) -> Option<usize> {
        let names = self.code.varnames();
        self.args
            .iter()
            .copied()
            .chain(self.kwargs.iter().map(|kw| kw.slot))
            .find(|slot| names[*slot] == name)
    }

    /// Code constants (nested declarations included) and keyword defaults.
    pub(crate) fn collect_refs(&self, work_list: &mut Vec<HeapId>) {
        self.code.collect_refs(work_list);
        for kw in &self.kwargs {
            push_ref(work_list, kw.default);
        }
    }
}

/// Builder returned by [`FuncDecl::builder`].
#[derive(Debug)]
#[must_use]
pub struct FuncDeclBuilder {
    decl: FuncDecl,
}

impl FuncDeclBuilder {
    /// Appends a required positional parameter bound to `slot`.
    pub fn arg(mut self, slot: usize) -> Self {
        self.decl.args.push(slot);
        self
    }

    /// Appends a keyword parameter bound to `slot` with a default.
    pub fn kwarg(mut self, slot: usize, default: Value) -> Self {
        self.decl.kwargs.push(KwArg { slot, default });
        self
    }

    pub fn starred_arg(mut self, slot: usize) -> Self {
        self.decl.starred_arg = Some(slot);
        self
    }

    pub fn starred_kwarg(mut self, slot: usize) -> Self {
        self.decl.starred_kwarg = Some(slot);
        self
    }

    /// Marks the declaration as defined inside another function, so instances capture a closure.
    pub fn nested(mut self, nested: bool) -> Self {
        self.decl.nested = nested;
        self
    }

    /// Freezes the declaration and computes its calling mode.
    ///
    /// # Panics
    /// Panics if a parameter slot is outside the code body's locals or used twice.
    pub fn build(mut self) -> Rc<FuncDecl> {
        let decl = &mut self.decl;
        let n_locals = decl.code.varnames().len();
        let mut seen = vec![false; n_locals];
        let slots = decl
            .args
            .iter()
            .copied()
            .chain(decl.kwargs.iter().map(|kw| kw.slot))
            .chain(decl.starred_arg)
            .chain(decl.starred_kwarg);
        for slot in slots {
            assert!(slot < n_locals, "FuncDecl: slot {slot} out of range ({n_locals} locals)");
            assert!(!seen[slot], "FuncDecl: slot {slot} bound twice");
            seen[slot] = true;
        }
        decl.is_simple = decl.kwargs.is_empty() && decl.starred_arg.is_none() && decl.starred_kwarg.is_none();
        Rc::new(self.decl)
    }
}

/// A function instance.
#[derive(Debug, Clone)]
pub struct Function {
    decl: Rc<FuncDecl>,
    is_simple: bool,
    argc: usize,
    module: Option<HeapId>,
    closure: Option<Rc<NameDict>>,
}

impl Function {
    /// Instantiates `decl` inside `module`.
    ///
    /// `closure` is kept only for nested declarations; build it with [`capture`] when the
    /// `def` executes so the function sees the scope as it was at definition time. Several
    /// functions defined in the same scope may share one captured dict.
    #[must_use]
    pub fn new(decl: Rc<FuncDecl>, module: Option<HeapId>, closure: Option<Rc<NameDict>>) -> Self {
        let closure = if decl.is_nested() { closure } else { None };
        Self {
            is_simple: decl.is_simple(),
            argc: decl.args().len(),
            decl,
            module,
            closure,
        }
    }

    #[must_use]
    pub fn decl(&self) -> &Rc<FuncDecl> {
        &self.decl
    }

    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.is_simple
    }

    /// Number of required positional parameters.
    #[must_use]
    pub fn argc(&self) -> usize {
        self.argc
    }

    #[must_use]
    pub fn module(&self) -> Option<HeapId> {
        self.module
    }

    #[must_use]
    pub fn closure(&self) -> Option<&Rc<NameDict>> {
        self.closure.as_ref()
    }

    pub(crate) fn collect_refs(&self, work_list: &mut Vec<HeapId>) {
        self.decl.collect_refs(work_list);
        if let Some(module) = self.module {
            work_list.push(module);
        }
        if let Some(closure) = &self.closure {
            closure.collect_refs(work_list);
        }
    }
}

/// Snapshots the live bindings of an enclosing scope for nested functions to share.
#[must_use]
pub fn capture(scope: &NameDict) -> Rc<NameDict> {
    Rc::new(scope.clone())
}

impl<T: ResourceTracker> Heap<T> {
    /// Binds call arguments to the local slots of the function `func`.
    ///
    /// Returns one value per local of the code body; locals that are not parameters stay
    /// `Value::NULL`. Surplus positional arguments go to the `*` slot as a tuple, surplus
    /// keywords to the `**` slot as a dict; without a sink either is a `TypeError`, as is
    /// a keyword naming an already-bound positional parameter or a missing required one.
    pub fn bind_args(&mut self, func: Value, args: &ArgValues) -> RunResult<Vec<Value>> {
        let function = match func.as_heap().map(|id| self.get(id)) {
            Some(HeapData::Function(function)) => function,
            _ => return Err(ExcType::type_error_expected("function", self.type_name(self.type_of(func)))),
        };
        let decl = Rc::clone(function.decl());
        let (is_simple, argc) = (function.is_simple(), function.argc());
        let code = Rc::clone(decl.code());
        let mut locals = vec![Value::NULL; code.varnames().len()];
        let given = args.args();

        if is_simple && !args.has_kwargs() && given.len() == argc {
            for (slot, value) in decl.args().iter().zip(given) {
                locals[*slot] = *value;
            }
            return Ok(locals);
        }

        let func_name = || self.interns().get_str(code.name()).to_owned();

        let n_bound = given.len().min(argc);
        for (slot, value) in decl.args().iter().zip(given) {
            locals[*slot] = *value;
        }
        for kw in decl.kwargs() {
            locals[kw.slot] = kw.default;
        }
        let extra = &given[n_bound..];
        if !extra.is_empty() && decl.starred_arg().is_none() {
            return Err(ExcType::type_error_too_many_positional(
                &func_name(),
                argc,
                given.len(),
            ));
        }

        let mut sink = decl.starred_kwarg().map(|_| Dict::new());
        for (key, value) in args.kwargs() {
            if let Some(slot) = decl.param_slot(*key) {
                if decl.args()[..n_bound].contains(&slot) {
                    return Err(ExcType::type_error_duplicate_arg(
                        &func_name(),
                        self.interns().get_str(*key),
                    ));
                }
                locals[slot] = *value;
            } else if let Some(dict) = &mut sink {
                dict.insert(*key, *value);
            } else {
                return Err(ExcType::type_error_unexpected_keyword(
                    &func_name(),
                    self.interns().get_str(*key),
                ));
            }
        }

        let missing: Vec<&str> = decl
            .args()
            .iter()
            .filter(|slot| locals[**slot].is_null())
            .map(|slot| self.interns().get_str(code.varnames()[*slot]))
            .collect();
        if !missing.is_empty() {
            return Err(ExcType::type_error_missing_positional_with_names(
                &func_name(),
                &missing,
            ));
        }

        if let Some(slot) = decl.starred_arg() {
            locals[slot] = self.new_tuple(extra.to_vec())?;
        }
        if let (Some(slot), Some(dict)) = (decl.starred_kwarg(), sink) {
            locals[slot] = self.new_dict(dict)?;
        }
        Ok(locals)
    }
}
