use crate::{
    heap::{HeapId, push_ref},
    value::Value,
};

/// Descriptor built by `property(getter, setter)`. A missing setter is `Value::NONE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    getter: Value,
    setter: Value,
}

impl Property {
    #[must_use]
    pub fn new(getter: Value, setter: Value) -> Self {
        Self { getter, setter }
    }

    #[must_use]
    pub fn getter(&self) -> Value {
        self.getter
    }

    #[must_use]
    pub fn setter(&self) -> Value {
        self.setter
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.setter == Value::NONE
    }

    pub(crate) fn collect_refs(&self, work_list: &mut Vec<HeapId>) {
        push_ref(work_list, self.getter);
        push_ref(work_list, self.setter);
    }
}
