//! Pooled storage for attribute dicts.
//!
//! Object headers never build their dict directly: they draw one from the heap's
//! [`DictPool`] and the sweep phase hands it back with [`DictPool::deallocate`]. Only
//! dicts still at [`INITIAL_CAPACITY`] are retained, so every pooled entry is the same
//! size class and reuse never hands out an oversized table.

use crate::namedict::{INITIAL_CAPACITY, NameDict};

/// Bounded free list of attribute dicts.
#[derive(Debug)]
pub struct DictPool {
    free: Vec<NameDict>,
    max_pooled: usize,
    allocated: usize,
    reused: usize,
}

impl DictPool {
    #[must_use]
    pub fn new(max_pooled: usize) -> Self {
        Self {
            free: Vec::with_capacity(max_pooled.min(64)),
            max_pooled,
            allocated: 0,
            reused: 0,
        }
    }

    /// Returns an empty dict tuned with `load_factor`, reusing pooled storage when available.
    pub fn allocate(&mut self, load_factor: f32) -> NameDict {
        self.allocated += 1;
        match self.free.pop() {
            Some(mut dict) => {
                self.reused += 1;
                dict.set_load_factor(load_factor);
                dict
            }
            None => NameDict::new(load_factor),
        }
    }

    /// Takes back a dict whose owner is being destroyed.
    ///
    /// Entries are dropped here; the storage is kept only if it is still in the pooled size
    /// class and the pool is not full.
    pub fn deallocate(&mut self, mut dict: NameDict) {
        if dict.capacity() != INITIAL_CAPACITY || self.free.len() >= self.max_pooled {
            return;
        }
        dict.clear();
        self.free.push(dict);
    }

    /// Number of dicts waiting for reuse.
    #[must_use]
    pub fn pooled(&self) -> usize {
        self.free.len()
    }

    /// Total dicts handed out and how many of those were recycled.
    #[must_use]
    pub fn counters(&self) -> (usize, usize) {
        (self.allocated, self.reused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{intern::Interns, value::Value};

    #[test]
    fn released_dicts_are_reused_empty() {
        let mut interns = Interns::new();
        let key = interns.intern("x");
        let mut pool = DictPool::new(4);

        let mut dict = pool.allocate(0.67);
        dict.set(key, Value::int(1));
        pool.deallocate(dict);
        assert_eq!(pool.pooled(), 1);

        let dict = pool.allocate(0.5);
        assert!(dict.is_empty(), "pooled dicts come back cleared");
        assert!((dict.load_factor() - 0.5).abs() < f32::EPSILON, "load factor follows the new owner");
        assert_eq!(pool.counters(), (2, 1));
    }

    #[test]
    fn grown_dicts_and_overflow_are_not_pooled() {
        let mut interns = Interns::new();
        let mut pool = DictPool::new(1);

        let mut big = pool.allocate(0.5);
        for i in 0..32 {
            big.set(interns.intern(&format!("k{i}")), Value::NONE);
        }
        pool.deallocate(big);
        assert_eq!(pool.pooled(), 0);

        pool.deallocate(NameDict::new(0.67));
        pool.deallocate(NameDict::new(0.67));
        assert_eq!(pool.pooled(), 1);
    }
}
