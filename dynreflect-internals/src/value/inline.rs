//! Fixed-capacity inline storage for small values.
//!
//! This module encapsulates the bytes of the [`InlineBuffer`]. A buffer is only
//! ever filled by [`InlineBuffer::new`], which refuses (in debug builds, and by
//! construction in [`RawValue::new`]) any type that does not satisfy
//! [`fits_inline`]. The buffer itself never runs a destructor; the owning
//! [`RawValue`] drops the payload through its vtable.
//!
//! The bytes sit behind an [`UnsafeCell`], so payloads with interior
//! mutability (`Cell`, `RefCell`, atomics) may be mutated through the shared
//! pointer returned by [`InlineBuffer::as_ptr`].
//!
//! [`RawValue`]: crate::RawValue
//! [`RawValue::new`]: crate::RawValue::new

use core::{cell::UnsafeCell, mem::MaybeUninit, ptr::NonNull};

use crate::util::Erased;

/// Number of bytes a value may occupy and still be stored inline.
pub const INLINE_CAPACITY: usize = 32;

/// Returns whether values of type `T` are stored inline rather than boxed.
///
/// A type fits when both its size and its alignment fit the inline buffer.
#[inline]
#[must_use]
pub const fn fits_inline<T>() -> bool {
    size_of::<T>() <= INLINE_CAPACITY && align_of::<T>() <= align_of::<InlineBuffer>()
}

/// Raw storage for one inline payload.
///
/// The alignment is fixed at 16 bytes, which covers every primitive type as
/// well as `u128` and most SIMD-free user types.
#[repr(C, align(16))]
pub(crate) struct InlineBuffer {
    /// The payload bytes. Only the first `size_of::<T>()` bytes are
    /// initialized, for the `T` the buffer was created with.
    bytes: UnsafeCell<MaybeUninit<[u8; INLINE_CAPACITY]>>,
}

impl InlineBuffer {
    /// Moves `value` into a fresh buffer.
    ///
    /// The returned buffer owns the value logically, but will not drop it:
    /// that is the responsibility of whoever holds the matching vtable.
    #[inline]
    pub(super) fn new<T>(value: T) -> Self {
        // Not a `const` assertion: callers branch on `fits_inline` at the same
        // monomorphization, so the oversized instantiation exists but never runs.
        assert!(fits_inline::<T>(), "type does not fit the inline buffer");

        let buffer = Self {
            bytes: UnsafeCell::new(MaybeUninit::uninit()),
        };
        let ptr: *mut T = buffer.bytes.get().cast::<T>();

        // SAFETY: The buffer is at least `size_of::<T>()` bytes large and aligned
        // to at least `align_of::<T>()`, which is checked by the assertion above.
        // The memory is uninitialized, so nothing is overwritten.
        unsafe {
            ptr.write(value);
        }

        buffer
    }

    /// Returns a pointer to the start of the payload.
    #[inline]
    pub(super) fn as_ptr(&self) -> NonNull<Erased> {
        // SAFETY: `UnsafeCell::get` never returns null.
        unsafe { NonNull::new_unchecked(self.bytes.get()) }.cast::<Erased>()
    }

    /// Returns a mutable pointer to the start of the payload.
    #[inline]
    pub(super) fn as_mut_ptr(&mut self) -> NonNull<Erased> {
        NonNull::from(self.bytes.get_mut()).cast::<Erased>()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use core::cell::Cell;

    use super::*;

    #[repr(align(32))]
    struct LargeAlignment {
        _value: u8,
    }

    #[test]
    fn test_fits_inline() {
        assert!(fits_inline::<u8>());
        assert!(fits_inline::<u128>());
        assert!(fits_inline::<String>());
        assert!(fits_inline::<[u64; 4]>());
        assert!(fits_inline::<()>());

        assert!(!fits_inline::<[u64; 5]>());
        assert!(!fits_inline::<LargeAlignment>());
    }

    #[test]
    fn test_buffer_layout() {
        assert_eq!(align_of::<InlineBuffer>(), 16);
        assert_eq!(size_of::<InlineBuffer>(), INLINE_CAPACITY);
    }

    #[test]
    fn test_interior_mutability_through_shared_pointer() {
        let buffer = InlineBuffer::new(Cell::new(1u32));
        // SAFETY: The buffer was created from a `Cell<u32>`.
        let cell = unsafe { buffer.as_ptr().cast::<Cell<u32>>().as_ref() };
        cell.set(2);
        // SAFETY: As above.
        let cell = unsafe { buffer.as_ptr().cast::<Cell<u32>>().as_ref() };
        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn test_buffer_pointer_is_stable() {
        let buffer = InlineBuffer::new(7u64);
        assert_eq!(buffer.as_ptr(), buffer.as_ptr());
        assert_eq!(buffer.as_ptr().as_ptr() as usize % 16, 0);
    }
}
