//! Attribute dictionary.
//!
//! An open-addressing map from interned names to values. Capacity is always a power of
//! two and is introspectable together with per-slot occupancy, which is how the collector
//! walks an object's attributes. Keys are [`StringId`] tokens and are never traced.

use crate::{intern::StringId, value::Value};

/// Capacity of a freshly allocated dict. The pool recycles dicts of this size only.
pub const INITIAL_CAPACITY: usize = 8;

type Slot = Option<(StringId, Value)>;

/// Linear-probing name → value table with a configurable load factor.
#[derive(Debug, Clone)]
pub struct NameDict {
    slots: Box<[Slot]>,
    len: usize,
    load_factor: f32,
}

impl NameDict {
    /// Creates an empty dict with [`INITIAL_CAPACITY`] slots.
    ///
    /// # Panics
    /// Panics unless `0.0 < load_factor < 1.0`.
    #[must_use]
    pub fn new(load_factor: f32) -> Self {
        assert!(
            load_factor > 0.0 && load_factor < 1.0,
            "NameDict: load factor must be in (0, 1), got {load_factor}"
        );
        Self {
            slots: vec![None; INITIAL_CAPACITY].into_boxed_slice(),
            len: 0,
            load_factor,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots; always a power of two.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Returns true if slot `index` holds an entry.
    ///
    /// # Panics
    /// Panics if `index >= self.capacity()`.
    #[inline]
    #[must_use]
    pub fn is_occupied(&self, index: usize) -> bool {
        self.slots[index].is_some()
    }

    /// Returns the entry stored in slot `index`, if any.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<(StringId, Value)> {
        self.slots.get(index).copied().flatten()
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    /// Fibonacci hashing of the token index: ids are dense, so spreading them matters.
    #[inline]
    fn home(&self, key: StringId) -> usize {
        let h = (key.index() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        (h >> 32) as usize & self.mask()
    }

    /// Most entries allowed before the table grows.
    fn critical_size(&self) -> usize {
        (self.capacity() as f32 * self.load_factor) as usize
    }

    fn find(&self, key: StringId) -> Result<usize, usize> {
        let mut i = self.home(key);
        loop {
            match self.slots[i] {
                Some((k, _)) if k == key => return Ok(i),
                Some(_) => i = (i + 1) & self.mask(),
                None => return Err(i),
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: StringId) -> Option<Value> {
        self.find(key).ok().and_then(|i| self.slots[i].map(|(_, v)| v))
    }

    #[must_use]
    pub fn contains(&self, key: StringId) -> bool {
        self.find(key).is_ok()
    }

    /// Inserts or overwrites `key`, returning the previous value.
    pub fn set(&mut self, key: StringId, value: Value) -> Option<Value> {
        match self.find(key) {
            Ok(i) => self.slots[i].replace((key, value)).map(|(_, old)| old),
            Err(i) => {
                self.slots[i] = Some((key, value));
                self.len += 1;
                if self.len > self.critical_size() {
                    self.grow();
                }
                None
            }
        }
    }

    /// Removes `key`, returning its value.
    ///
    /// Uses backward-shift deletion so probe chains stay intact without tombstones.
    pub fn remove(&mut self, key: StringId) -> Option<Value> {
        let mut hole = self.find(key).ok()?;
        let removed = self.slots[hole].take().map(|(_, v)| v);
        self.len -= 1;

        let mut next = (hole + 1) & self.mask();
        while let Some((k, v)) = self.slots[next] {
            let home = self.home(k);
            // the entry may stay only if its home lies cyclically in (hole, next]
            let stays = if hole <= next {
                hole < home && home <= next
            } else {
                home > hole || home <= next
            };
            if !stays {
                self.slots[hole] = Some((k, v));
                self.slots[next] = None;
                hole = next;
            }
            next = (next + 1) & self.mask();
        }
        removed
    }

    fn grow(&mut self) {
        let new_capacity = self.capacity() * 2;
        let old = std::mem::replace(&mut self.slots, vec![None; new_capacity].into_boxed_slice());
        for (k, v) in old.iter().flatten() {
            match self.find(*k) {
                Err(i) => self.slots[i] = Some((*k, *v)),
                Ok(_) => unreachable!("NameDict::grow: duplicate key"),
            }
        }
    }

    /// Removes every entry and shrinks back to [`INITIAL_CAPACITY`].
    pub fn clear(&mut self) {
        if self.capacity() == INITIAL_CAPACITY {
            self.slots.fill(None);
        } else {
            self.slots = vec![None; INITIAL_CAPACITY].into_boxed_slice();
        }
        self.len = 0;
    }

    pub(crate) fn set_load_factor(&mut self, load_factor: f32) {
        self.load_factor = load_factor;
    }

    /// Iterates entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (StringId, Value)> + '_ {
        self.slots.iter().filter_map(|slot| *slot)
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Pushes every heap reference stored as a value, walking slots by capacity and
    /// skipping empty ones.
    pub(crate) fn collect_refs(&self, work_list: &mut Vec<crate::heap::HeapId>) {
        for index in 0..self.capacity() {
            if !self.is_occupied(index) {
                continue;
            }
            if let Some((_, value)) = self.slots[index]
                && let Some(id) = value.as_heap()
            {
                work_list.push(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interns;

    fn names(n: usize) -> Vec<StringId> {
        let mut interns = Interns::new();
        (0..n).map(|i| interns.intern(&format!("attr_{i}"))).collect()
    }

    #[test]
    fn set_get_overwrite() {
        let keys = names(2);
        let mut dict = NameDict::new(0.67);
        assert_eq!(dict.set(keys[0], Value::int(1)), None);
        assert_eq!(dict.set(keys[0], Value::int(2)), Some(Value::int(1)));
        assert_eq!(dict.get(keys[0]), Some(Value::int(2)));
        assert_eq!(dict.get(keys[1]), None);
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn grows_past_load_factor_and_keeps_entries() {
        let keys = names(50);
        let mut dict = NameDict::new(0.5);
        for (i, k) in keys.iter().enumerate() {
            dict.set(*k, Value::int(i as i64));
        }
        assert!(dict.capacity().is_power_of_two());
        assert!(dict.len() as f32 <= dict.capacity() as f32 * 0.5);
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(dict.get(*k), Some(Value::int(i as i64)));
        }
    }

    #[test]
    fn occupancy_matches_len() {
        let keys = names(5);
        let mut dict = NameDict::new(0.67);
        for k in &keys {
            dict.set(*k, Value::NONE);
        }
        let occupied = (0..dict.capacity()).filter(|i| dict.is_occupied(*i)).count();
        assert_eq!(occupied, dict.len());
    }

    #[test]
    fn remove_keeps_probe_chains_reachable() {
        let keys = names(40);
        let mut dict = NameDict::new(0.67);
        for (i, k) in keys.iter().enumerate() {
            dict.set(*k, Value::int(i as i64));
        }
        for k in keys.iter().step_by(2) {
            assert!(dict.remove(*k).is_some());
        }
        for (i, k) in keys.iter().enumerate() {
            let expected = (i % 2 == 1).then(|| Value::int(i as i64));
            assert_eq!(dict.get(*k), expected, "key {i}");
        }
        assert_eq!(dict.len(), 20);
        assert_eq!(dict.remove(keys[0]), None);
    }

    #[test]
    fn clear_resets_to_initial_capacity() {
        let keys = names(20);
        let mut dict = NameDict::new(0.67);
        for k in &keys {
            dict.set(*k, Value::NONE);
        }
        dict.clear();
        assert!(dict.is_empty());
        assert_eq!(dict.capacity(), INITIAL_CAPACITY);
    }
}
