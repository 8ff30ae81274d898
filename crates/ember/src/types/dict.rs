use indexmap::IndexMap;

use crate::{
    heap::{HeapId, push_ref},
    intern::StringId,
    value::Value,
};

/// Insertion-ordered name → value mapping.
///
/// Receives the surplus keyword arguments of a call whose declaration has a `**` parameter,
/// so keys are always interned names and are not traced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dict {
    map: IndexMap<StringId, Value, ahash::RandomState>,
}

impl Dict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: StringId) -> Option<Value> {
        self.map.get(&key).copied()
    }

    pub fn insert(&mut self, key: StringId, value: Value) -> Option<Value> {
        self.map.insert(key, value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StringId, Value)> + '_ {
        self.map.iter().map(|(k, v)| (*k, *v))
    }

    pub(crate) fn collect_refs(&self, work_list: &mut Vec<HeapId>) {
        for value in self.map.values() {
            push_ref(work_list, *value);
        }
    }

    pub(crate) fn estimate_size(&self) -> usize {
        self.map.capacity() * (size_of::<StringId>() + size_of::<Value>() + size_of::<u64>())
    }
}

impl FromIterator<(StringId, Value)> for Dict {
    fn from_iter<I: IntoIterator<Item = (StringId, Value)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}
