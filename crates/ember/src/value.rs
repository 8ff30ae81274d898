//! Tagged value handles.
//!
//! A [`Value`] is one 64-bit word. The low two bits are the tag:
//!
//! | Tag  | Meaning | Payload (upper 62 bits) |
//! |------|---------|-------------------------|
//! | `00` | heap reference | arena index of a [`HeapId`] |
//! | `01` | immediate int | signed 62-bit integer |
//! | `10` | immediate float | `f64` bits with the two lowest mantissa bits dropped |
//! | `11` | special immediate | [`Special`] code |
//!
//! Classification only inspects the tag, so it never reads heap memory and can be run on
//! any bit pattern. Immediates carry no GC header and are never seen by the collector.

use std::fmt;

use strum::FromRepr;

use crate::{heap::HeapId, types::Type};

const TAG_BITS: u32 = 2;
const TAG_MASK: u64 = 0b11;
const TAG_HEAP: u64 = 0b00;
const TAG_INT: u64 = 0b01;
const TAG_FLOAT: u64 = 0b10;
const TAG_SPECIAL: u64 = 0b11;

/// Smallest integer representable as an immediate.
pub const INT_MIN: i64 = i64::MIN >> TAG_BITS;
/// Largest integer representable as an immediate.
pub const INT_MAX: i64 = i64::MAX >> TAG_BITS;

/// Reserved non-numeric immediates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[repr(u8)]
pub enum Special {
    /// Unbound slot marker. Never visible to user code.
    Null,
    None,
    True,
    False,
    NotImplemented,
    Ellipsis,
}

impl Special {
    /// Runtime type of the special immediate.
    #[must_use]
    pub fn type_id(self) -> Type {
        match self {
            Self::True | Self::False => Type::BOOL,
            Self::None => Type::NONE_TYPE,
            Self::Null | Self::NotImplemented | Self::Ellipsis => Type::OBJECT,
        }
    }
}

/// An immediate decoded from its handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    Int(i64),
    Float(f64),
    Special(Special),
}

/// Result of [`Value::classify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kind {
    Immediate(Immediate),
    Heap(HeapId),
}

/// A runtime value handle: either an immediate or a reference into the heap arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Value(u64);

impl Value {
    pub const NULL: Self = Self::special(Special::Null);
    pub const NONE: Self = Self::special(Special::None);
    pub const TRUE: Self = Self::special(Special::True);
    pub const FALSE: Self = Self::special(Special::False);
    pub const NOT_IMPLEMENTED: Self = Self::special(Special::NotImplemented);
    pub const ELLIPSIS: Self = Self::special(Special::Ellipsis);

    /// Encodes a special immediate.
    #[must_use]
    pub const fn special(special: Special) -> Self {
        Self(((special as u64) << TAG_BITS) | TAG_SPECIAL)
    }

    /// Encodes an immediate integer.
    ///
    /// # Panics
    /// Panics if `value` is outside [`INT_MIN`]`..=`[`INT_MAX`].
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::try_int(value).unwrap_or_else(|| panic!("Value::int: {value} does not fit in 62 bits"))
    }

    /// Encodes an immediate integer, or `None` if it does not fit.
    #[must_use]
    pub fn try_int(value: i64) -> Option<Self> {
        (INT_MIN..=INT_MAX)
            .contains(&value)
            .then(|| Self(((value as u64) << TAG_BITS) | TAG_INT))
    }

    /// Encodes an immediate float.
    ///
    /// The two lowest mantissa bits are dropped, so round-tripping is exact only for
    /// values whose bit pattern already has them clear (all small integers and halves do).
    /// Every NaN is stored as the canonical quiet NaN, so a payload held only in the dropped
    /// bits cannot turn into an infinity.
    #[must_use]
    pub fn float(value: f64) -> Self {
        let value = if value.is_nan() { f64::NAN } else { value };
        Self((value.to_bits() & !TAG_MASK) | TAG_FLOAT)
    }

    #[must_use]
    pub fn bool(value: bool) -> Self {
        if value { Self::TRUE } else { Self::FALSE }
    }

    /// Encodes a heap reference.
    #[must_use]
    pub fn from_id(id: HeapId) -> Self {
        Self((id.index() as u64) << TAG_BITS)
    }

    /// Reinterprets a raw word as a handle.
    ///
    /// Safe for any bit pattern: classification does not dereference. A forged heap
    /// reference is only caught when the heap resolves it.
    #[must_use]
    pub fn from_raw(bits: u64) -> Self {
        Self(bits)
    }

    #[must_use]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    fn tag(self) -> u64 {
        self.0 & TAG_MASK
    }

    /// Classifies the handle by its tag bits alone.
    ///
    /// An unknown special code is a corrupted handle: debug builds panic, release builds
    /// report it as [`Special::Null`].
    #[must_use]
    pub fn classify(self) -> Kind {
        match self.tag() {
            TAG_HEAP => Kind::Heap(HeapId::new((self.0 >> TAG_BITS) as usize)),
            TAG_INT => Kind::Immediate(Immediate::Int(self.as_int_unchecked())),
            TAG_FLOAT => Kind::Immediate(Immediate::Float(self.as_float_unchecked())),
            _ => {
                let special = u8::try_from(self.0 >> TAG_BITS).ok().and_then(Special::from_repr);
                debug_assert!(special.is_some(), "Value::classify: invalid special immediate {:#x}", self.0);
                Kind::Immediate(Immediate::Special(special.unwrap_or(Special::Null)))
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn is_heap(self) -> bool {
        self.tag() == TAG_HEAP
    }

    #[inline]
    #[must_use]
    pub fn is_int(self) -> bool {
        self.tag() == TAG_INT
    }

    #[inline]
    #[must_use]
    pub fn is_float(self) -> bool {
        self.tag() == TAG_FLOAT
    }

    #[inline]
    #[must_use]
    pub fn is_special(self) -> bool {
        self.tag() == TAG_SPECIAL
    }

    #[inline]
    #[must_use]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    /// Returns the referenced heap slot, if this is a heap reference.
    #[inline]
    #[must_use]
    pub fn as_heap(self) -> Option<HeapId> {
        self.is_heap().then(|| HeapId::new((self.0 >> TAG_BITS) as usize))
    }

    #[must_use]
    pub fn as_int(self) -> Option<i64> {
        self.is_int().then(|| self.as_int_unchecked())
    }

    #[must_use]
    pub fn as_float(self) -> Option<f64> {
        self.is_float().then(|| self.as_float_unchecked())
    }

    /// Decodes the payload as an integer whatever the tag says.
    #[inline]
    #[must_use]
    pub fn as_int_unchecked(self) -> i64 {
        (self.0 as i64) >> TAG_BITS
    }

    /// Decodes the payload as a float whatever the tag says.
    #[inline]
    #[must_use]
    pub fn as_float_unchecked(self) -> f64 {
        f64::from_bits(self.0 & !TAG_MASK)
    }

    /// Type of an immediate, or `None` for heap references.
    #[must_use]
    pub fn immediate_type(self) -> Option<Type> {
        match self.classify() {
            Kind::Heap(_) => None,
            Kind::Immediate(Immediate::Int(_)) => Some(Type::INT),
            Kind::Immediate(Immediate::Float(_)) => Some(Type::FLOAT),
            Kind::Immediate(Immediate::Special(s)) => Some(s.type_id()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            TAG_HEAP => write!(f, "Ref({})", self.0 >> TAG_BITS),
            TAG_INT => write!(f, "Int({})", self.as_int_unchecked()),
            TAG_FLOAT => write!(f, "Float({})", self.as_float_unchecked()),
            _ => match u8::try_from(self.0 >> TAG_BITS).ok().and_then(Special::from_repr) {
                Some(special) => write!(f, "{special:?}"),
                None => write!(f, "InvalidSpecial({:#x})", self.0),
            },
        }
    }
}

impl From<HeapId> for Value {
    fn from(id: HeapId) -> Self {
        Self::from_id(id)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_round_trip_including_extremes() {
        for v in [0, 1, -1, 42, INT_MIN, INT_MAX] {
            assert_eq!(Value::int(v).classify(), Kind::Immediate(Immediate::Int(v)));
        }
        assert_eq!(Value::try_int(INT_MAX + 1), None);
        assert_eq!(Value::try_int(INT_MIN - 1), None);
    }

    #[test]
    fn floats_keep_common_values_exactly() {
        for v in [0.0, 1.5, -2.25, 1024.0] {
            assert_eq!(Value::float(v).as_float(), Some(v));
        }
        let lossy = Value::float(0.1).as_float().unwrap();
        assert!((lossy - 0.1).abs() < 1e-15, "dropped mantissa bits stay within precision");
    }

    #[test]
    fn nan_stays_nan_whatever_its_payload() {
        let low_payload = f64::from_bits(0x7FF0_0000_0000_0001);
        assert!(low_payload.is_nan());
        let stored = Value::float(low_payload).as_float().unwrap();
        assert!(stored.is_nan(), "a NaN must not collapse into an infinity");
        assert!(Value::float(-f64::NAN).as_float().unwrap().is_nan());
        assert_eq!(Value::float(f64::INFINITY).as_float(), Some(f64::INFINITY));
    }

    #[test]
    fn forged_immediate_bit_patterns_classify_without_heap_access() {
        // Arbitrary high bits with an immediate tag: classification reads nothing else.
        let forged_int = Value::from_raw(0xdead_beef_0000_0001);
        assert!(matches!(forged_int.classify(), Kind::Immediate(Immediate::Int(_))));
        let forged_float = Value::from_raw(0xdead_beef_0000_0002);
        assert!(matches!(forged_float.classify(), Kind::Immediate(Immediate::Float(_))));
        assert_eq!(forged_int.as_heap(), None);
    }

    #[test]
    fn heap_references_are_never_immediates() {
        let v = Value::from_id(HeapId::new(7));
        assert_eq!(v.classify(), Kind::Heap(HeapId::new(7)));
        assert!(!v.is_int() && !v.is_float() && !v.is_special());
        assert_eq!(v.immediate_type(), None);
    }

    #[test]
    fn specials_classify_and_type() {
        assert_eq!(Value::NONE.classify(), Kind::Immediate(Immediate::Special(Special::None)));
        assert_eq!(Value::TRUE.immediate_type(), Some(Type::BOOL));
        assert!(Value::NULL.is_null());
        assert_eq!(format!("{:?}", Value::FALSE), "False");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invalid special immediate")]
    fn invalid_special_panics_in_debug() {
        let _ = Value::from_raw((200 << TAG_BITS) | TAG_SPECIAL).classify();
    }
}
