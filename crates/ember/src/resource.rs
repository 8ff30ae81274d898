use std::fmt;

use crate::exception::{ExcType, RunError, SimpleException};

/// Error returned when a resource limit is exceeded during allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// Maximum number of allocations exceeded.
    Allocation { limit: usize, count: usize },
    /// Maximum memory usage exceeded.
    Memory { limit: usize, used: usize },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation { limit, count } => {
                write!(f, "allocation limit exceeded: {count} > {limit}")
            }
            Self::Memory { limit, used } => {
                write!(f, "memory limit exceeded: {used} bytes > {limit} bytes")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

impl From<ResourceError> for RunError {
    /// Both limits surface as a `MemoryError` that user code cannot catch.
    fn from(err: ResourceError) -> Self {
        Self::UncatchableExc(Box::new(SimpleException::new_msg(ExcType::MemoryError, err)))
    }
}

/// Trait for tracking heap resource usage.
///
/// The heap consults its tracker on every allocation and every sweep-time free.
/// Generic so that [`NoLimitTracker`] compiles every check away.
pub trait ResourceTracker: fmt::Debug {
    /// Called before each heap allocation.
    ///
    /// Returns `Ok(())` if the allocation should proceed, or `Err(ResourceError)`
    /// if a limit would be exceeded. `get_size` is only evaluated when memory is tracked.
    fn on_allocate(&mut self, get_size: impl FnOnce() -> usize) -> Result<(), ResourceError>;

    /// Called when the collector frees an object.
    fn on_free(&mut self, get_size: impl FnOnce() -> usize);

    /// Returns the number of live allocations tracked, if this tracker records them.
    fn allocation_count(&self) -> Option<usize> {
        None
    }

    /// Returns the current approximate memory usage in bytes, if tracked.
    fn current_memory_bytes(&self) -> Option<usize> {
        None
    }
}

/// A resource tracker that imposes no limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLimitTracker;

impl ResourceTracker for NoLimitTracker {
    #[inline]
    fn on_allocate(&mut self, _get_size: impl FnOnce() -> usize) -> Result<(), ResourceError> {
        Ok(())
    }

    #[inline]
    fn on_free(&mut self, _get_size: impl FnOnce() -> usize) {}
}

/// Configuration for resource limits.
///
/// All limits are optional - set to `None` to disable a specific limit.
/// Use `ResourceLimits::default()` for no limits, or build custom limits
/// with the builder pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of live heap allocations allowed.
    pub max_allocations: Option<usize>,
    /// Maximum heap memory in bytes (approximate).
    pub max_memory: Option<usize>,
}

impl ResourceLimits {
    /// Creates a new `ResourceLimits` with all limits disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of live allocations.
    #[must_use]
    pub fn max_allocations(mut self, limit: usize) -> Self {
        self.max_allocations = Some(limit);
        self
    }

    /// Sets the maximum memory usage in bytes.
    #[must_use]
    pub fn max_memory(mut self, limit: usize) -> Self {
        self.max_memory = Some(limit);
        self
    }
}

/// A resource tracker that enforces configurable limits.
///
/// Counts are of *live* objects: frees performed by the sweep phase give
/// budget back, so a program that keeps collecting garbage can run forever.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LimitedTracker {
    limits: ResourceLimits,
    allocation_count: usize,
    current_memory: usize,
}

impl LimitedTracker {
    /// Creates a new `LimitedTracker` with the given limits.
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            allocation_count: 0,
            current_memory: 0,
        }
    }

    #[must_use]
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }
}

impl ResourceTracker for LimitedTracker {
    fn on_allocate(&mut self, get_size: impl FnOnce() -> usize) -> Result<(), ResourceError> {
        if let Some(max) = self.limits.max_allocations
            && self.allocation_count >= max
        {
            return Err(ResourceError::Allocation {
                limit: max,
                count: self.allocation_count + 1,
            });
        }

        if let Some(max) = self.limits.max_memory {
            let new_memory = self.current_memory + get_size();
            if new_memory > max {
                return Err(ResourceError::Memory {
                    limit: max,
                    used: new_memory,
                });
            }
            self.current_memory = new_memory;
        }

        self.allocation_count += 1;
        Ok(())
    }

    fn on_free(&mut self, get_size: impl FnOnce() -> usize) {
        self.allocation_count = self.allocation_count.saturating_sub(1);
        if self.limits.max_memory.is_some() {
            self.current_memory = self.current_memory.saturating_sub(get_size());
        }
    }

    fn allocation_count(&self) -> Option<usize> {
        Some(self.allocation_count)
    }

    fn current_memory_bytes(&self) -> Option<usize> {
        Some(self.current_memory)
    }
}

/// Load factor for attribute dicts of ordinary instances, functions and native functions.
pub const INSTANCE_ATTR_LOAD_FACTOR: f32 = 0.67;

/// Load factor for type and module namespaces, which usually hold many names.
pub const NAMESPACE_ATTR_LOAD_FACTOR: f32 = 0.5;

/// Default number of allocations between suggested collections.
pub const DEFAULT_GC_INTERVAL: usize = 10_000;

/// Tuning knobs for a [`Heap`](crate::Heap).
///
/// Serializable so embedders can load it from their own configuration files.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Number of arena slots reserved up front.
    pub initial_capacity: usize,
    /// Load factor of attribute dicts owned by instances and callables.
    pub instance_load_factor: f32,
    /// Load factor of attribute dicts owned by type objects and modules.
    pub namespace_load_factor: f32,
    /// Maximum number of released attribute dicts kept for reuse.
    pub dict_pool_capacity: usize,
    /// Allocations between collections suggested by [`Heap::should_gc`](crate::Heap::should_gc).
    pub gc_interval: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            instance_load_factor: INSTANCE_ATTR_LOAD_FACTOR,
            namespace_load_factor: NAMESPACE_ATTR_LOAD_FACTOR,
            dict_pool_capacity: 64,
            gc_interval: DEFAULT_GC_INTERVAL,
        }
    }
}

impl HeapConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets the instance dict load factor.
    ///
    /// # Panics
    /// Panics unless `0.0 < factor < 1.0`.
    #[must_use]
    pub fn instance_load_factor(mut self, factor: f32) -> Self {
        assert!(factor > 0.0 && factor < 1.0, "load factor must be in (0, 1), got {factor}");
        self.instance_load_factor = factor;
        self
    }

    /// Sets the type/module namespace load factor.
    ///
    /// # Panics
    /// Panics unless `0.0 < factor < 1.0`.
    #[must_use]
    pub fn namespace_load_factor(mut self, factor: f32) -> Self {
        assert!(factor > 0.0 && factor < 1.0, "load factor must be in (0, 1), got {factor}");
        self.namespace_load_factor = factor;
        self
    }

    #[must_use]
    pub fn dict_pool_capacity(mut self, capacity: usize) -> Self {
        self.dict_pool_capacity = capacity;
        self
    }

    #[must_use]
    pub fn gc_interval(mut self, interval: usize) -> Self {
        self.gc_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_tracker_enforces_allocation_count() {
        let mut tracker = LimitedTracker::new(ResourceLimits::new().max_allocations(2));
        assert!(tracker.on_allocate(|| 8).is_ok());
        assert!(tracker.on_allocate(|| 8).is_ok());
        let err = tracker.on_allocate(|| 8).unwrap_err();
        assert_eq!(err, ResourceError::Allocation { limit: 2, count: 3 });

        tracker.on_free(|| 8);
        assert!(tracker.on_allocate(|| 8).is_ok(), "freeing returns budget");
    }

    #[test]
    fn limited_tracker_enforces_memory() {
        let mut tracker = LimitedTracker::new(ResourceLimits::new().max_memory(100));
        assert!(tracker.on_allocate(|| 60).is_ok());
        let err = tracker.on_allocate(|| 60).unwrap_err();
        assert_eq!(err, ResourceError::Memory { limit: 100, used: 120 });
        assert_eq!(tracker.current_memory_bytes(), Some(60));
    }

    #[test]
    fn resource_error_is_uncatchable_memory_error() {
        let err: RunError = ResourceError::Allocation { limit: 1, count: 2 }.into();
        assert!(matches!(err, RunError::UncatchableExc(_)));
        assert_eq!(err.exc_type(), Some(ExcType::MemoryError));
    }

    #[test]
    fn heap_config_defaults_use_both_load_factor_profiles() {
        let config = HeapConfig::default();
        assert!((config.instance_load_factor - 0.67).abs() < f32::EPSILON);
        assert!((config.namespace_load_factor - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.gc_interval, DEFAULT_GC_INTERVAL);
    }

    #[test]
    #[should_panic(expected = "load factor must be in (0, 1)")]
    fn heap_config_rejects_full_load_factor() {
        let _ = HeapConfig::new().instance_load_factor(1.0);
    }
}
