use crate::{
    heap::{HeapId, push_ref},
    value::Value,
};

/// Mutable sequence of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct List {
    items: Vec<Value>,
}

impl List {
    #[must_use]
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, value: Value) {
        self.items.push(value);
    }

    /// Replaces the element at `index`, returning the old one.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: Value) -> Value {
        std::mem::replace(&mut self.items[index], value)
    }

    pub(crate) fn collect_refs(&self, work_list: &mut Vec<HeapId>) {
        for value in &self.items {
            push_ref(work_list, *value);
        }
    }

    pub(crate) fn estimate_size(&self) -> usize {
        self.items.capacity() * size_of::<Value>()
    }
}
