use crate::{
    exception::{ExcType, RunResult, SimpleException},
    heap::{HeapId, push_ref},
    value::Value,
};

/// Marks an argument for unpacking at a call site: level 1 is `*obj`, level 2 is `**obj`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarWrapper {
    level: u8,
    obj: Value,
}

impl StarWrapper {
    /// # Errors
    /// Returns `ValueError` unless `level` is 1 or 2.
    pub fn new(level: u8, obj: Value) -> RunResult<Self> {
        if !matches!(level, 1 | 2) {
            return Err(SimpleException::new_msg(ExcType::ValueError, format!("invalid star level {level}")).into());
        }
        Ok(Self { level, obj })
    }

    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[must_use]
    pub fn obj(&self) -> Value {
        self.obj
    }

    pub(crate) fn collect_refs(&self, work_list: &mut Vec<HeapId>) {
        push_ref(work_list, self.obj);
    }
}
