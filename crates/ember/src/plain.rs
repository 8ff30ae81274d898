//! Plain-old-data payloads copied in and out of byte buffers.

use std::{mem::MaybeUninit, ptr};

/// Marker for types that can be stored as raw bytes and read back from any bytes.
///
/// Native-function userdata, host-class payloads and packed structs are all stored as
/// untyped bytes. Reading them back never checks more than the caller asks for, so the
/// type itself must make every read sound.
///
/// # Safety
///
/// Implementors must guarantee that the type:
/// - has no padding bytes (every byte of `size_of::<Self>()` is initialized);
/// - accepts every bit pattern as a valid value, including all zeros;
/// - owns nothing that needs dropping (implied by `Copy`).
pub unsafe trait PlainData: Copy + 'static {}

macro_rules! impl_plain_data {
    ($($t:ty),* $(,)?) => {
        $(
            // SAFETY: primitive numeric types have no padding and no invalid bit patterns.
            unsafe impl PlainData for $t {}
        )*
    };
}

impl_plain_data!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

// SAFETY: an array of padding-free, any-bit-pattern elements has neither padding nor invalid patterns.
unsafe impl<T: PlainData, const N: usize> PlainData for [T; N] {}

// SAFETY: raw pointers are plain addresses; any address is a valid (if not dereferenceable) pointer value.
unsafe impl<T: 'static> PlainData for *const T {}

// SAFETY: as for `*const T`.
unsafe impl<T: 'static> PlainData for *mut T {}

/// Views a plain value as its bytes.
pub(crate) fn as_bytes<T: PlainData>(value: &T) -> &[u8] {
    // SAFETY: `PlainData` has no padding, so all `size_of::<T>()` bytes behind the
    // reference are initialized; the slice borrows `value` for its whole lifetime.
    unsafe { std::slice::from_raw_parts(ptr::from_ref(value).cast::<u8>(), size_of::<T>()) }
}

/// Rebuilds a plain value from the front of `bytes`, zero-filling whatever is missing.
pub(crate) fn from_bytes<T: PlainData>(bytes: &[u8]) -> T {
    let mut out = MaybeUninit::<T>::zeroed();
    let n = bytes.len().min(size_of::<T>());
    // SAFETY: at most `size_of::<T>()` bytes are written into `out`, which starts fully
    // zeroed, and `PlainData` makes every resulting bit pattern a valid `T`.
    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr(), out.as_mut_ptr().cast::<u8>(), n);
        out.assume_init()
    }
}
