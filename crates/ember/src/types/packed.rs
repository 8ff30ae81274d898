//! Opaque host payloads: packed plain-data values and raw pointers.

use std::any::TypeId;

use crate::plain::{PlainData, as_bytes, from_bytes};

/// Bytes of a [`PlainData`] value.
///
/// Backs both instances of registered host classes (whose runtime type is the class's
/// registered id) and plain aggregate structs (runtime type `struct`). Holds no references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packed {
    bytes: Box<[u8]>,
    native: TypeId,
}

impl Packed {
    #[must_use]
    pub fn new<T: PlainData>(value: &T) -> Self {
        Self {
            bytes: as_bytes(value).into(),
            native: TypeId::of::<T>(),
        }
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns true if the payload was packed from a `T`.
    #[must_use]
    pub fn holds<T: 'static>(&self) -> bool {
        self.native == TypeId::of::<T>()
    }

    /// Reads the payload as a `T` without checking what was packed.
    ///
    /// A mismatched `T` yields whatever the payload bytes spell, zero-extended.
    #[must_use]
    pub fn read<T: PlainData>(&self) -> T {
        from_bytes(&self.bytes)
    }

    /// Overwrites the payload with `value`.
    pub fn write<T: PlainData>(&mut self, value: &T) {
        *self = Self::new(value);
    }
}

/// A host pointer stored as a value. The collector never follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpaquePtr {
    addr: usize,
    pointee: TypeId,
    pointee_name: &'static str,
}

impl OpaquePtr {
    #[must_use]
    pub fn new<T: 'static>(ptr: *const T) -> Self {
        Self {
            addr: ptr.expose_provenance(),
            pointee: TypeId::of::<T>(),
            pointee_name: std::any::type_name::<T>(),
        }
    }

    #[must_use]
    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Rebuilds the pointer as a `*const T`, whatever it was created from.
    #[must_use]
    pub fn cast<T>(&self) -> *const T {
        std::ptr::with_exposed_provenance(self.addr)
    }

    #[must_use]
    pub fn points_to<T: 'static>(&self) -> bool {
        self.pointee == TypeId::of::<T>()
    }

    #[must_use]
    pub fn pointee_name(&self) -> &'static str {
        self.pointee_name
    }
}
