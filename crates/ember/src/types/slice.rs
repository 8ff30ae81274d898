use crate::{
    heap::{HeapId, push_ref},
    value::Value,
};

/// `start:stop:step`; any bound may be an arbitrary value, omitted ones are `Value::NONE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: Value,
    pub stop: Value,
    pub step: Value,
}

impl Slice {
    #[must_use]
    pub fn new(start: Value, stop: Value, step: Value) -> Self {
        Self { start, stop, step }
    }

    pub(crate) fn collect_refs(&self, work_list: &mut Vec<HeapId>) {
        push_ref(work_list, self.start);
        push_ref(work_list, self.stop);
        push_ref(work_list, self.step);
    }
}
