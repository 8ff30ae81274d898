//! Method binding and `super()` payloads.

use crate::{
    heap::{HeapId, push_ref},
    types::Type,
    value::Value,
};

/// A callable paired with the receiver it was looked up on.
///
/// Equality compares both handles, so `a.append == a.append` holds even though each
/// attribute access allocates a fresh bound method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundMethod {
    receiver: Value,
    func: Value,
}

impl BoundMethod {
    #[must_use]
    pub fn new(receiver: Value, func: Value) -> Self {
        Self { receiver, func }
    }

    #[must_use]
    pub fn receiver(&self) -> Value {
        self.receiver
    }

    #[must_use]
    pub fn func(&self) -> Value {
        self.func
    }

    pub(crate) fn collect_refs(&self, work_list: &mut Vec<HeapId>) {
        push_ref(work_list, self.receiver);
        push_ref(work_list, self.func);
    }
}

/// Result of `super()`: an object viewed as an instance of a base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Super {
    obj: Value,
    ty: Type,
}

impl Super {
    #[must_use]
    pub fn new(obj: Value, ty: Type) -> Self {
        Self { obj, ty }
    }

    #[must_use]
    pub fn obj(&self) -> Value {
        self.obj
    }

    /// Type whose bases the lookup starts from.
    #[must_use]
    pub fn ty(&self) -> Type {
        self.ty
    }

    /// Only the object is a reference; type ids are permanent metadata.
    pub(crate) fn collect_refs(&self, work_list: &mut Vec<HeapId>) {
        push_ref(work_list, self.obj);
    }
}
