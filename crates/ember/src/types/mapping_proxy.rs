//! Read-only view over another object's namespace (`type.__dict__`).

use crate::{
    heap::{HeapId, push_ref},
    value::Value,
};

/// Wraps the object whose attributes it exposes; only that object is traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingProxy {
    obj: Value,
}

impl MappingProxy {
    #[must_use]
    pub fn new(obj: Value) -> Self {
        Self { obj }
    }

    #[must_use]
    pub fn obj(&self) -> Value {
        self.obj
    }

    pub(crate) fn collect_refs(&self, work_list: &mut Vec<HeapId>) {
        push_ref(work_list, self.obj);
    }
}
