//! Tests for typed extraction: scalars, enums, host classes, structs and pointers,
//! under both the checked and unchecked policies.

use ember::{
    ExcType, Extract, Heap, HeapData, HeapView, HostClass, NoLimitTracker, PlainData, RunResult, Value, extract,
    extract_unchecked,
};
use pretty_assertions::assert_eq;

fn heap() -> Heap<NoLimitTracker> {
    Heap::with_tracker(NoLimitTracker)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::FromRepr)]
#[repr(u8)]
enum Mode {
    Read = 1,
    Write = 2,
    Append = 3,
}

ember::extract_enum!(Mode => u8);

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
struct Point {
    x: f64,
    y: f64,
}

// SAFETY: two `f64` fields under `repr(C)`: no padding, every bit pattern is a valid float.
unsafe impl PlainData for Point {}

impl HostClass for Point {
    const NAME: &'static str = "Point";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

// SAFETY: four `u8` fields under `repr(C)`: no padding, no invalid bit patterns.
unsafe impl PlainData for Color {}

impl HostClass for Color {
    const NAME: &'static str = "Color";
}

ember::extract_host_class!(Point, Color);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
struct Extent {
    w: u32,
    h: u32,
}

// SAFETY: two `u32` fields under `repr(C)`: no padding, no invalid bit patterns.
unsafe impl PlainData for Extent {}

ember::extract_struct!(Extent);

// =============================================================================
// 1. Scalars
// =============================================================================

/// Checked scalar extraction verifies the immediate kind.
#[test]
fn scalars_are_type_checked() {
    let mut heap = heap();
    let s = heap.new_str("text").unwrap();

    assert_eq!(extract::<i64, _>(&heap, Value::int(-3)).unwrap(), -3);
    assert_eq!(extract::<i32, _>(&heap, Value::int(7)).unwrap(), 7);
    assert!(extract::<bool, _>(&heap, Value::TRUE).unwrap());
    assert_eq!(extract::<String, _>(&heap, s).unwrap(), "text");
    assert_eq!(extract::<Value, _>(&heap, s).unwrap(), s);

    let err = extract::<i64, _>(&heap, s).unwrap_err();
    assert_eq!(err.exc_type(), Some(ExcType::TypeError));
    assert_eq!(err.message(), Some("expected 'int', got 'str'"));
    assert!(extract::<bool, _>(&heap, Value::int(1)).is_err());
    assert!(extract::<String, _>(&heap, Value::NONE).is_err());
}

/// Floats accept integers and round-trip values with clear low bits.
#[test]
fn floats_widen_integers() {
    let heap = heap();
    let half: f64 = extract(&heap, Value::float(0.5)).unwrap();
    assert!((half - 0.5).abs() < f64::EPSILON);
    let widened: f64 = extract(&heap, Value::int(4)).unwrap();
    assert!((widened - 4.0).abs() < f64::EPSILON);
}

// =============================================================================
// 2. Enums
// =============================================================================

/// Enums convert through their underlying integer.
#[test]
fn enum_from_underlying_integer() {
    let heap = heap();
    assert_eq!(extract::<Mode, _>(&heap, Value::int(2)).unwrap(), Mode::Write);
    assert_eq!(extract::<Mode, _>(&heap, Value::int(3)).unwrap(), Mode::Append);
    assert_eq!(extract_unchecked::<Mode, _>(&heap, Value::int(1)).unwrap(), Mode::Read);
}

/// Integers naming no variant, or non-integers, are rejected.
#[test]
fn enum_rejects_unknown_discriminants() {
    let heap = heap();
    let err = extract::<Mode, _>(&heap, Value::int(9)).unwrap_err();
    assert_eq!(err.exc_type(), Some(ExcType::ValueError));
    assert_eq!(err.message(), Some("9 is not a valid Mode"));

    let err = extract::<Mode, _>(&heap, Value::float(2.0)).unwrap_err();
    assert_eq!(err.exc_type(), Some(ExcType::TypeError));
}

// =============================================================================
// 3. Host classes
// =============================================================================

/// A registered class gets its own runtime type and its instances extract back.
#[test]
fn host_class_round_trip() {
    let mut heap = heap();
    let ty = heap.register_class::<Point>().unwrap();
    assert_eq!(heap.register_class::<Point>().unwrap(), ty, "registration is idempotent");

    let p = heap.new_host(&Point { x: 1.5, y: -2.0 }).unwrap();
    assert!(heap.is_type(p, ty));
    assert_eq!(heap.type_name(heap.type_of(p)), "Point");
    assert_eq!(extract::<Point, _>(&heap, p).unwrap(), Point { x: 1.5, y: -2.0 });
}

/// Checked extraction of a class from an instance of another class is a type error.
#[test]
fn checked_class_mismatch_is_a_type_error() {
    let mut heap = heap();
    heap.register_class::<Point>().unwrap();
    heap.register_class::<Color>().unwrap();
    let c = heap.new_host(&Color { r: 1, g: 2, b: 3, a: 4 }).unwrap();

    let err = extract::<Point, _>(&heap, c).unwrap_err();
    assert_eq!(err.exc_type(), Some(ExcType::TypeError));
    assert_eq!(err.message(), Some("expected 'Point', got 'Color'"));
    assert!(extract::<Point, _>(&heap, Value::int(1)).is_err());
}

/// Unchecked extraction reads the payload bytes whatever class produced them.
#[test]
fn unchecked_class_mismatch_reads_payload_bytes() {
    let mut heap = heap();
    heap.register_class::<Point>().unwrap();
    heap.register_class::<Color>().unwrap();
    let c = heap.new_host(&Color { r: 1, g: 2, b: 3, a: 4 }).unwrap();

    let p = extract_unchecked::<Point, _>(&heap, c).unwrap();
    let expected_x = f64::from_ne_bytes([1, 2, 3, 4, 0, 0, 0, 0]);
    assert_eq!(p.x.to_bits(), expected_x.to_bits(), "bytes past the payload read as zero");
    assert_eq!(p.y.to_bits(), 0);
}

/// Instances cannot be created for classes that were never registered.
#[test]
fn unregistered_class_is_rejected() {
    let mut heap = heap();
    let err = heap.new_host(&Point { x: 0.0, y: 0.0 }).unwrap_err();
    assert_eq!(err.exc_type(), Some(ExcType::TypeError));
    assert!(extract::<Point, _>(&heap, Value::NONE).is_err());
}

/// Host instances accept attributes, stored in a lazily created dict.
#[test]
fn host_instances_take_attributes() {
    let mut heap = heap();
    heap.register_class::<Color>().unwrap();
    let c = heap.new_host(&Color { r: 0, g: 0, b: 0, a: 255 }).unwrap();
    let label = heap.intern("label");
    heap.set_attr(c, label, Value::int(1)).unwrap();
    assert_eq!(heap.get_attr(c, label), Some(Value::int(1)));
}

// =============================================================================
// 4. Structs
// =============================================================================

/// Structs convert through the registered hook.
#[test]
fn struct_extracts_through_default_hook() {
    let mut heap = heap();
    heap.registry_mut().register_struct::<Extent>();
    let v = heap.new_struct(&Extent { w: 640, h: 480 }).unwrap();
    assert!(heap.is_type(v, ember::Type::STRUCT));
    assert_eq!(extract::<Extent, _>(&heap, v).unwrap(), Extent { w: 640, h: 480 });
}

/// Without a registered hook the conversion fails.
#[test]
fn struct_without_hook_is_rejected() {
    let mut heap = heap();
    let v = heap.new_struct(&Extent { w: 1, h: 1 }).unwrap();
    let err = extract::<Extent, _>(&heap, v).unwrap_err();
    assert_eq!(err.exc_type(), Some(ExcType::TypeError));
}

/// Checked struct extraction requires a payload packed from the same type.
#[test]
fn checked_struct_requires_matching_payload() {
    let mut heap = heap();
    heap.registry_mut().register_struct::<Extent>();
    let other = heap.new_struct(&[7_u32, 9]).unwrap();

    assert!(extract::<Extent, _>(&heap, other).is_err());
    assert_eq!(
        extract_unchecked::<Extent, _>(&heap, other).unwrap(),
        Extent { w: 7, h: 9 },
        "same layout, so the unchecked read matches"
    );
}

fn transposed(bytes: &[u8]) -> RunResult<Extent> {
    let word = |i: usize| u32::from_ne_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    Ok(Extent { w: word(4), h: word(0) })
}

/// A custom hook replaces the default conversion.
#[test]
fn custom_struct_hook_is_used() {
    let mut heap = heap();
    heap.registry_mut().register_struct_with::<Extent>(transposed);
    let v = heap.new_struct(&Extent { w: 3, h: 5 }).unwrap();
    assert_eq!(extract::<Extent, _>(&heap, v).unwrap(), Extent { w: 5, h: 3 });
}

// =============================================================================
// 5. Pointers
// =============================================================================

static ANSWER: u64 = 42;

/// Opaque pointers extract back to the original address.
#[test]
fn pointer_round_trip() {
    let mut heap = heap();
    let p = heap.new_pointer(&raw const ANSWER).unwrap();
    let ptr: *const u64 = extract(&heap, p).unwrap();
    assert_eq!(ptr, &raw const ANSWER);
    // SAFETY: the pointer was created from a live static of the same type.
    assert_eq!(unsafe { *ptr }, 42);

    let null: *mut u64 = extract(&heap, Value::NONE).unwrap();
    assert!(null.is_null(), "None converts to null");
}

/// Checked extraction verifies the pointee type; unchecked only asks the hook.
#[test]
fn pointer_pointee_is_checked() {
    let mut heap = heap();
    let p = heap.new_pointer(&raw const ANSWER).unwrap();

    let err = extract::<*const u32, _>(&heap, p).unwrap_err();
    assert_eq!(err.exc_type(), Some(ExcType::TypeError));
    let raw = extract_unchecked::<*const u32, _>(&heap, p).unwrap();
    assert_eq!(raw.addr(), (&raw const ANSWER).addr());
}

fn ints_as_addresses(value: Value, payload: Option<&HeapData>) -> Option<usize> {
    match payload {
        Some(HeapData::Pointer(ptr)) => Some(ptr.addr()),
        _ => value.as_int().and_then(|i| usize::try_from(i).ok()),
    }
}

/// The pointer hook can be replaced to accept other representations.
#[test]
fn custom_pointer_hook_accepts_integers() {
    let mut heap = heap();
    assert!(extract::<*const u8, _>(&heap, Value::int(64)).is_err());
    heap.registry_mut().set_pointer_hook(ints_as_addresses);
    let ptr: *const u8 = extract(&heap, Value::int(64)).unwrap();
    assert_eq!(ptr.addr(), 64);
}

// =============================================================================
// 6. Policy parameter
// =============================================================================

/// A generic caller picks the policy with a type parameter.
fn read_twice<T: Extract + PartialEq + std::fmt::Debug>(heap: &Heap<NoLimitTracker>, value: Value) {
    let checked = T::extract_with::<ember::Checked, _>(heap, value).unwrap();
    let unchecked = T::extract_with::<ember::Unchecked, _>(heap, value).unwrap();
    assert_eq!(checked, unchecked, "both policies agree on well-typed input");
}

/// Both policies produce the same result when the type is right.
#[test]
fn policies_agree_on_matching_types() {
    let mut heap = heap();
    heap.register_class::<Color>().unwrap();
    let c = heap.new_host(&Color { r: 9, g: 8, b: 7, a: 6 }).unwrap();
    read_twice::<Color>(&heap, c);
    read_twice::<i64>(&heap, Value::int(12));
    read_twice::<Mode>(&heap, Value::int(1));
}
