//! Typed extraction: converting a [`Value`] into a native Rust type.
//!
//! Every extractable type implements [`Extract`] once, generic over a [`CheckPolicy`]:
//! [`Checked`] verifies the value's dynamic type before reading it, [`Unchecked`] skips the
//! verification for callers that already branched on the type. Types with no `Extract`
//! implementation simply cannot be extracted; there is no runtime "unsupported" error.
//!
//! Shapes beyond the builtin scalars are opted in with macros:
//!
//! | Shape | Macro | Conversion |
//! |-------|-------|------------|
//! | Enum with integer discriminants | [`extract_enum!`](crate::extract_enum) | underlying integer, then `from_repr` |
//! | Host class ([`HostClass`]) | [`extract_host_class!`](crate::extract_host_class) | packed payload, type id checked against the registered class |
//! | Plain struct ([`PlainData`]) | [`extract_struct!`](crate::extract_struct) | registered [`StructHook`] |
//!
//! Raw pointers go through the registry's [`PointerHook`].

use std::{
    any::{Any, TypeId, type_name},
    fmt,
};

use ahash::AHashMap;

use crate::{
    exception::{ExcType, RunResult},
    heap::{Heap, HeapData, HeapView},
    plain::{PlainData, from_bytes},
    resource::ResourceTracker,
    types::{Packed, Type},
    value::Value,
};

mod sealed {
    pub trait Sealed {}
}

/// Whether an extraction verifies the dynamic type of its input.
pub trait CheckPolicy: sealed::Sealed {
    const CHECKED: bool;
}

/// Verify the dynamic type and fail with `TypeError` on mismatch.
#[derive(Debug, Clone, Copy)]
pub enum Checked {}

/// Trust the caller about the dynamic type.
///
/// Never memory-unsafe: a mismatched value yields an unspecified result of the requested
/// type (reinterpreted payload bits or zeros).
#[derive(Debug, Clone, Copy)]
pub enum Unchecked {}

impl sealed::Sealed for Checked {}
impl sealed::Sealed for Unchecked {}

impl CheckPolicy for Checked {
    const CHECKED: bool = true;
}

impl CheckPolicy for Unchecked {
    const CHECKED: bool = false;
}

/// Conversion from a runtime value to `Self`.
pub trait Extract: Sized {
    fn extract_with<P: CheckPolicy, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<Self>;
}

/// Extracts `T` from `value`, verifying its dynamic type.
pub fn extract<T: Extract, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<T> {
    T::extract_with::<Checked, H>(heap, value)
}

/// Extracts `T` from `value` without verifying its dynamic type.
///
/// Only meaningful where the caller has already established the type, e.g. a dispatch
/// path that branched on the type id. On a mismatch the result is unspecified.
pub fn extract_unchecked<T: Extract, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<T> {
    T::extract_with::<Unchecked, H>(heap, value)
}

fn mismatch<H: HeapView + ?Sized>(heap: &H, expected: &str, value: Value) -> crate::exception::RunError {
    ExcType::type_error_expected(expected, heap.type_name(heap.type_of(value)))
}

fn payload<H: HeapView + ?Sized>(heap: &H, value: Value) -> Option<&HeapData> {
    value.as_heap().map(|id| heap.object(id).data())
}

// ============================================================================
// Scalars
// ============================================================================

impl Extract for Value {
    fn extract_with<P: CheckPolicy, H: HeapView + ?Sized>(_heap: &H, value: Value) -> RunResult<Self> {
        Ok(value)
    }
}

impl Extract for i64 {
    fn extract_with<P: CheckPolicy, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<Self> {
        if !P::CHECKED {
            return Ok(value.as_int_unchecked());
        }
        value.as_int().ok_or_else(|| mismatch(heap, "int", value))
    }
}

macro_rules! extract_int {
    ($($t:ty),* $(,)?) => {
        $(
            /// Range-checked under either policy: the policy only governs the type check.
            impl Extract for $t {
                fn extract_with<P: CheckPolicy, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<Self> {
                    let raw = i64::extract_with::<P, H>(heap, value)?;
                    <$t>::try_from(raw).map_err(|_| ExcType::value_error_out_of_range(stringify!($t), raw))
                }
            }
        )*
    };
}

extract_int!(i8, i16, i32, isize, u8, u16, u32, u64, usize);

impl Extract for f64 {
    /// Integers are widened; the checked path rejects everything else.
    fn extract_with<P: CheckPolicy, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<Self> {
        if let Some(i) = value.as_int() {
            return Ok(i as f64);
        }
        if !P::CHECKED {
            return Ok(value.as_float_unchecked());
        }
        value.as_float().ok_or_else(|| mismatch(heap, "float", value))
    }
}

impl Extract for f32 {
    fn extract_with<P: CheckPolicy, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<Self> {
        f64::extract_with::<P, H>(heap, value).map(|f| f as f32)
    }
}

impl Extract for bool {
    fn extract_with<P: CheckPolicy, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<Self> {
        if P::CHECKED && value != Value::TRUE && value != Value::FALSE {
            return Err(mismatch(heap, "bool", value));
        }
        Ok(value == Value::TRUE)
    }
}

/// Strings always verify their payload kind: there are no bytes to reinterpret otherwise.
impl Extract for String {
    fn extract_with<P: CheckPolicy, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<Self> {
        match payload(heap, value) {
            Some(HeapData::Str(s)) => Ok(s.as_str().to_owned()),
            _ => Err(mismatch(heap, "str", value)),
        }
    }
}

// ============================================================================
// Pointers
// ============================================================================

/// Converts a value into a pointer address. `None` when the value holds no pointer.
pub type PointerHook = fn(value: Value, payload: Option<&HeapData>) -> Option<usize>;

/// Default pointer conversion: opaque pointer payloads yield their address and `None`
/// yields null.
fn opaque_pointer_hook(value: Value, payload: Option<&HeapData>) -> Option<usize> {
    match payload {
        Some(HeapData::Pointer(ptr)) => Some(ptr.addr()),
        _ if value == Value::NONE => Some(0),
        _ => None,
    }
}

fn extract_pointer<T: 'static, P: CheckPolicy, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<*const T> {
    let data = payload(heap, value);
    if P::CHECKED
        && let Some(HeapData::Pointer(ptr)) = data
        && !ptr.points_to::<T>()
    {
        return Err(ExcType::type_error_expected(
            &format!("pointer to {}", type_name::<T>()),
            &format!("pointer to {}", ptr.pointee_name()),
        ));
    }
    match (heap.registry().pointer_hook())(value, data) {
        Some(addr) => Ok(std::ptr::with_exposed_provenance(addr)),
        None => Err(mismatch(heap, "void_p", value)),
    }
}

impl<T: 'static> Extract for *const T {
    fn extract_with<P: CheckPolicy, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<Self> {
        extract_pointer::<T, P, H>(heap, value)
    }
}

impl<T: 'static> Extract for *mut T {
    fn extract_with<P: CheckPolicy, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<Self> {
        extract_pointer::<T, P, H>(heap, value).map(<*const T>::cast_mut)
    }
}

// ============================================================================
// Host classes and structs
// ============================================================================

/// Marker for host types exposed to the runtime as a class of their own.
///
/// Register the class with [`Heap::register_class`], create instances with
/// [`Heap::new_host`] and opt into extraction with
/// [`extract_host_class!`](crate::extract_host_class).
pub trait HostClass: PlainData {
    /// Class name shown by the runtime.
    const NAME: &'static str;
}

/// Converts packed struct bytes into `S`.
pub type StructHook<S> = fn(&[u8]) -> RunResult<S>;

/// Default struct conversion: reinterpret the packed bytes.
fn packed_struct_hook<S: PlainData>(bytes: &[u8]) -> RunResult<S> {
    Ok(from_bytes(bytes))
}

/// Per-type conversion hooks consulted by extraction.
pub struct ConversionRegistry {
    pointer_hook: PointerHook,
    structs: AHashMap<TypeId, Box<dyn Any>>,
    classes: AHashMap<TypeId, Type>,
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRegistry")
            .field("structs", &self.structs.len())
            .field("classes", &self.classes)
            .finish_non_exhaustive()
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pointer_hook: opaque_pointer_hook,
            structs: AHashMap::new(),
            classes: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn pointer_hook(&self) -> PointerHook {
        self.pointer_hook
    }

    /// Replaces the pointer conversion, e.g. to accept integers as addresses.
    pub fn set_pointer_hook(&mut self, hook: PointerHook) {
        self.pointer_hook = hook;
    }

    /// Registers `S` with the default conversion, which reinterprets the packed bytes.
    pub fn register_struct<S: PlainData>(&mut self) {
        self.register_struct_with::<S>(packed_struct_hook::<S>);
    }

    /// Registers `S` with a custom conversion, replacing any earlier one.
    pub fn register_struct_with<S: PlainData>(&mut self, hook: StructHook<S>) {
        self.structs.insert(TypeId::of::<S>(), Box::new(hook));
    }

    #[must_use]
    pub fn struct_hook<S: PlainData>(&self) -> Option<StructHook<S>> {
        self.structs
            .get(&TypeId::of::<S>())?
            .downcast_ref::<StructHook<S>>()
            .copied()
    }

    /// Runtime type registered for the host class `C`.
    #[must_use]
    pub fn class_type<C: HostClass>(&self) -> Option<Type> {
        self.classes.get(&TypeId::of::<C>()).copied()
    }
}

/// Extraction of a registered host class. Used by [`extract_host_class!`](crate::extract_host_class).
///
/// The checked path compares the value's type id with the class's registered id. The
/// unchecked path reads any packed payload as `C`, and yields a zeroed `C` for values
/// without one.
///
/// # Errors
/// `TypeError` if `C` was never registered, or on a checked mismatch.
pub fn extract_class<C: HostClass, P: CheckPolicy, H: HeapView + ?Sized>(heap: &H, value: Value) -> RunResult<C> {
    let Some(ty) = heap.registry().class_type::<C>() else {
        return Err(ExcType::type_error_expected(C::NAME, "<unregistered class>"));
    };
    let packed = match payload(heap, value) {
        Some(HeapData::Packed(packed)) => Some(packed),
        _ => None,
    };
    if P::CHECKED {
        return match packed {
            Some(packed) if heap.type_of(value) == ty => Ok(packed.read()),
            _ => Err(mismatch(heap, C::NAME, value)),
        };
    }
    Ok(packed.map_or_else(|| from_bytes(&[]), Packed::read::<C>))
}

/// Extraction of a plain struct through its registered hook. Used by
/// [`extract_struct!`](crate::extract_struct).
///
/// The checked path requires a `struct` value packed from an `S`.
///
/// # Errors
/// `TypeError` if no hook is registered for `S`, on a checked mismatch, or whatever the
/// hook reports.
pub fn extract_plain_struct<S: PlainData, P: CheckPolicy, H: HeapView + ?Sized>(
    heap: &H,
    value: Value,
) -> RunResult<S> {
    let Some(hook) = heap.registry().struct_hook::<S>() else {
        return Err(ExcType::type_error_expected(type_name::<S>(), "<unregistered struct>"));
    };
    match payload(heap, value) {
        Some(HeapData::Packed(packed))
            if !P::CHECKED || (heap.type_of(value) == Type::STRUCT && packed.holds::<S>()) =>
        {
            hook(packed.bytes())
        }
        _ if !P::CHECKED => hook(&vec![0; size_of::<S>()]),
        _ => Err(mismatch(heap, type_name::<S>(), value)),
    }
}

/// Implements [`Extract`](crate::Extract) for enums deriving `strum::FromRepr`.
///
/// ```ignore
/// #[derive(strum::FromRepr)]
/// #[repr(u8)]
/// enum Mode { Read = 1, Write = 2 }
/// ember::extract_enum!(Mode => u8);
/// ```
#[macro_export]
macro_rules! extract_enum {
    ($($ty:ty => $repr:ty),* $(,)?) => {
        $(
            impl $crate::Extract for $ty {
                fn extract_with<P: $crate::CheckPolicy, H: $crate::HeapView + ?Sized>(
                    heap: &H,
                    value: $crate::Value,
                ) -> $crate::RunResult<Self> {
                    let raw = <$repr as $crate::Extract>::extract_with::<P, H>(heap, value)?;
                    <$ty>::from_repr(raw)
                        .ok_or_else(|| $crate::ExcType::value_error_invalid_variant(stringify!($ty), raw))
                }
            }
        )*
    };
}

/// Implements [`Extract`](crate::Extract) for types implementing [`HostClass`](crate::HostClass).
#[macro_export]
macro_rules! extract_host_class {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::Extract for $ty {
                fn extract_with<P: $crate::CheckPolicy, H: $crate::HeapView + ?Sized>(
                    heap: &H,
                    value: $crate::Value,
                ) -> $crate::RunResult<Self> {
                    $crate::extract::extract_class::<Self, P, H>(heap, value)
                }
            }
        )*
    };
}

/// Implements [`Extract`](crate::Extract) for [`PlainData`](crate::PlainData) structs
/// converted through a registered [`StructHook`](crate::extract::StructHook).
#[macro_export]
macro_rules! extract_struct {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::Extract for $ty {
                fn extract_with<P: $crate::CheckPolicy, H: $crate::HeapView + ?Sized>(
                    heap: &H,
                    value: $crate::Value,
                ) -> $crate::RunResult<Self> {
                    $crate::extract::extract_plain_struct::<Self, P, H>(heap, value)
                }
            }
        )*
    };
}

impl<T: ResourceTracker> Heap<T> {
    /// Registers the host class `C` under a fresh runtime type, returning it.
    ///
    /// Registering the same class again returns the existing type.
    pub fn register_class<C: HostClass>(&mut self) -> RunResult<Type> {
        if let Some(ty) = self.registry().class_type::<C>() {
            return Ok(ty);
        }
        let (ty, _) = self.new_type(C::NAME, None)?;
        self.registry_mut().classes.insert(TypeId::of::<C>(), ty);
        Ok(ty)
    }

    /// Creates an instance of the registered host class `C` holding `value`.
    ///
    /// # Errors
    /// `TypeError` if `C` was never registered.
    pub fn new_host<C: HostClass>(&mut self, value: &C) -> RunResult<Value> {
        let Some(ty) = self.registry().class_type::<C>() else {
            return Err(ExcType::type_error_expected(C::NAME, "<unregistered class>"));
        };
        self.allocate_typed(ty, HeapData::Packed(Packed::new(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::NoLimitTracker;

    #[test]
    fn unchecked_int_reads_the_payload_bits() {
        let heap = Heap::with_tracker(NoLimitTracker);
        assert_eq!(extract::<i64, _>(&heap, Value::int(-5)).unwrap(), -5);
        assert!(extract::<i64, _>(&heap, Value::float(1.5)).is_err());
        // an unchecked read of a float still yields some integer
        let _ = extract_unchecked::<i64, _>(&heap, Value::float(1.5)).unwrap();
    }

    #[test]
    fn narrow_ints_are_range_checked() {
        let heap = Heap::with_tracker(NoLimitTracker);
        assert_eq!(extract::<u8, _>(&heap, Value::int(255)).unwrap(), 255);
        let err = extract::<u8, _>(&heap, Value::int(256)).unwrap_err();
        assert_eq!(err.exc_type(), Some(ExcType::ValueError));
        assert!(extract_unchecked::<u8, _>(&heap, Value::int(256)).is_err(), "range checks ignore the policy");
    }

    #[test]
    fn floats_accept_ints() {
        let heap = Heap::with_tracker(NoLimitTracker);
        assert!((extract::<f64, _>(&heap, Value::int(3)).unwrap() - 3.0).abs() < f64::EPSILON);
        assert!(extract::<f64, _>(&heap, Value::NONE).is_err());
    }

    #[test]
    fn struct_hooks_are_found_by_type() {
        let mut registry = ConversionRegistry::new();
        assert!(registry.struct_hook::<[u32; 2]>().is_none());
        registry.register_struct::<[u32; 2]>();
        let hook = registry.struct_hook::<[u32; 2]>().unwrap();
        let expected = [u32::from_ne_bytes([1, 0, 0, 0]), u32::from_ne_bytes([2, 0, 0, 0])];
        assert_eq!(hook(&[1, 0, 0, 0, 2, 0, 0, 0]).unwrap(), expected);
        assert!(registry.struct_hook::<[u32; 3]>().is_none());
    }
}
