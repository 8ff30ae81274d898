use crate::{
    heap::{HeapId, push_ref},
    value::Value,
};

/// Immutable sequence of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tuple {
    items: Box<[Value]>,
}

impl Tuple {
    #[must_use]
    pub fn new(items: impl Into<Box<[Value]>>) -> Self {
        Self { items: items.into() }
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

    pub(crate) fn collect_refs(&self, work_list: &mut Vec<HeapId>) {
        for value in &self.items {
            push_ref(work_list, *value);
        }
    }

    pub(crate) fn estimate_size(&self) -> usize {
        self.items.len() * size_of::<Value>()
    }
}
