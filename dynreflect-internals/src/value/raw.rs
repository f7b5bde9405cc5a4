//! Type-erased owned value storage.
//!
//! This module encapsulates the `storage` field of [`RawValue`], ensuring it is
//! only visible within this module. This visibility restriction guarantees the
//! safety invariant: **an inline or heap payload is always paired with the
//! vtable of its own type**.
//!
//! # Safety Invariant
//!
//! Since the `storage` field can only be filled with a payload via
//! [`RawValue::new`] (which picks the vtable from the same type parameter it
//! stores), and cannot be modified afterward except by replacing it wholesale,
//! the vtable always matches the payload.
//!
//! The [`Drop`] implementation relies on this invariant to run the right
//! destructor for inline payloads. Heap payloads are a `Box<dyn Any>` and are
//! released by ordinary drop glue.
//!
//! # Storage Selection
//!
//! Values whose size and alignment fit [`INLINE_CAPACITY`] are kept inline,
//! everything else is boxed. The choice depends only on the type and is made
//! once per construction; it is observable through [`RawValue::is_heap`] and
//! nothing else.

use alloc::boxed::Box;
use core::{
    any::{Any, TypeId},
    ptr::NonNull,
};

use crate::{
    reference::{RawValueMut, RawValueRef},
    util::Erased,
    value::{
        inline::{INLINE_CAPACITY, InlineBuffer, fits_inline},
        vtable::ValueVtable,
    },
};

/// An owned, type-erased value.
///
/// A [`RawValue`] is in exactly one of four states:
///
/// - **empty**: default-constructed, or the source of a [`take`](Self::take)
/// - **void**: the distinguished result of a call that returns nothing
/// - **inline**: a payload small enough for the inline buffer
/// - **heap**: a boxed payload
///
/// Cloning deep-copies the payload through the vtable, so a clone never shares
/// state with its original regardless of where the payload lives.
pub struct RawValue {
    /// The current state and payload.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. For [`Storage::Inline`], the buffer holds an initialized payload of
    ///    the type `vtable` was created for.
    /// 2. For [`Storage::Heap`], the box holds a payload of the type `vtable`
    ///    was created for.
    storage: Storage,
}

/// The possible states of a [`RawValue`].
enum Storage {
    /// No value.
    Empty,
    /// The result of a call returning nothing.
    Void,
    /// A payload stored in the inline buffer.
    Inline {
        /// Vtable of the payload type.
        vtable: &'static ValueVtable,
        /// The payload itself.
        buffer: InlineBuffer,
    },
    /// A payload stored in its own allocation.
    Heap {
        /// Vtable of the payload type.
        vtable: &'static ValueVtable,
        /// The payload itself.
        payload: Box<dyn Any>,
    },
}

impl RawValue {
    /// Creates a new [`RawValue`] holding `value`.
    ///
    /// The value is stored inline when it fits [`INLINE_CAPACITY`], and boxed
    /// otherwise.
    #[inline]
    pub fn new<T: Clone + 'static>(value: T) -> Self {
        let vtable = ValueVtable::new::<T>();
        let storage = if fits_inline::<T>() {
            Storage::Inline {
                vtable,
                buffer: InlineBuffer::new(value),
            }
        } else {
            Storage::Heap {
                vtable,
                payload: Box::new(value),
            }
        };
        Self { storage }
    }

    /// Creates an empty [`RawValue`].
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            storage: Storage::Empty,
        }
    }

    /// Creates a [`RawValue`] in the void state.
    #[inline]
    #[must_use]
    pub const fn void() -> Self {
        Self {
            storage: Storage::Void,
        }
    }

    /// Returns `true` if this value holds a payload.
    ///
    /// Both the empty and the void state hold no payload.
    #[inline]
    pub fn has_value(&self) -> bool {
        matches!(self.storage, Storage::Inline { .. } | Storage::Heap { .. })
    }

    /// Returns `true` if this value is in the void state.
    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self.storage, Storage::Void)
    }

    /// Returns `true` if the payload lives in its own heap allocation.
    #[inline]
    pub fn is_heap(&self) -> bool {
        matches!(self.storage, Storage::Heap { .. })
    }

    /// Returns the [`TypeId`] of the payload, if any.
    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        self.vtable().map(ValueVtable::type_id)
    }

    /// Returns the [`core::any::type_name`] of the payload, if any.
    #[inline]
    pub fn type_name(&self) -> Option<&'static str> {
        self.vtable().map(ValueVtable::type_name)
    }

    /// Returns the size in bytes of the payload type, if any.
    #[inline]
    pub fn payload_size(&self) -> Option<usize> {
        self.vtable().map(ValueVtable::size)
    }

    /// Returns `true` if the payload is of type `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id() == Some(TypeId::of::<T>())
    }

    /// Moves the value out, leaving this one empty.
    #[inline]
    #[must_use]
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Returns a reference to the payload if it is of type `T`.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.is::<T>() {
            // SAFETY:
            // 1. The payload exists and is of type `T`, as just checked.
            let value = unsafe { self.downcast_ref_unchecked::<T>() };
            Some(value)
        } else {
            None
        }
    }

    /// Returns a mutable reference to the payload if it is of type `T`.
    #[inline]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if self.is::<T>() {
            // SAFETY:
            // 1. The payload exists and is of type `T`, as just checked.
            let value = unsafe { self.downcast_mut_unchecked::<T>() };
            Some(value)
        } else {
            None
        }
    }

    /// Moves the payload out if it is of type `T`, otherwise returns the value
    /// unchanged.
    #[inline]
    pub fn downcast_into<T: 'static>(self) -> Result<T, Self> {
        if self.is::<T>() {
            // SAFETY:
            // 1. The payload exists and is of type `T`, as just checked.
            let value = unsafe { self.into_inner_unchecked::<T>() };
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Reinterprets the payload as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This value holds a payload, and the payload is of type `T`.
    #[inline]
    pub unsafe fn downcast_ref_unchecked<T: 'static>(&self) -> &T {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.type_id(), Some(TypeId::of::<T>()));

        let Some(ptr) = self.payload_ptr() else {
            // SAFETY: The caller guarantees that a payload exists.
            unsafe { core::hint::unreachable_unchecked() }
        };
        // SAFETY: The pointer is non-null, aligned and points to an initialized
        // `T` (guaranteed by the caller together with the storage invariant). The
        // returned borrow is tied to `&self`, so no mutable access can overlap.
        unsafe { ptr.cast::<T>().as_ref() }
    }

    /// Reinterprets the payload as a mutable `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This value holds a payload, and the payload is of type `T`.
    #[inline]
    pub unsafe fn downcast_mut_unchecked<T: 'static>(&mut self) -> &mut T {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(RawValue::type_id(self), Some(TypeId::of::<T>()));

        let Some(ptr) = self.payload_mut_ptr() else {
            // SAFETY: The caller guarantees that a payload exists.
            unsafe { core::hint::unreachable_unchecked() }
        };
        // SAFETY: The pointer is non-null, aligned and points to an initialized
        // `T` (guaranteed by the caller together with the storage invariant). The
        // returned borrow is tied to `&mut self`, so it is unique.
        unsafe { ptr.cast::<T>().as_mut() }
    }

    /// Moves the payload out as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This value holds a payload, and the payload is of type `T`.
    #[inline]
    pub unsafe fn into_inner_unchecked<T: 'static>(mut self) -> T {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(RawValue::type_id(&self), Some(TypeId::of::<T>()));

        // Detach the storage so that our own `Drop` sees an empty value.
        match core::mem::replace(&mut self.storage, Storage::Empty) {
            Storage::Inline { buffer, .. } => {
                let ptr = buffer.as_ptr().cast::<T>();
                // SAFETY: The buffer holds an initialized `T` (guaranteed by the
                // caller together with the storage invariant). The buffer is
                // dropped right after this read without running any destructor,
                // so the `T` is moved out exactly once.
                unsafe { ptr.read() }
            }
            Storage::Heap { payload, .. } => {
                let ptr: *mut T = Box::into_raw(payload).cast::<T>();
                // SAFETY: The pointer came from `Box::into_raw` on a box whose
                // payload is a `T` (guaranteed by the caller together with the
                // storage invariant), so rebuilding a `Box<T>` from it is sound.
                let boxed = unsafe { Box::from_raw(ptr) };
                *boxed
            }
            Storage::Empty | Storage::Void => {
                // SAFETY: The caller guarantees that a payload exists.
                unsafe { core::hint::unreachable_unchecked() }
            }
        }
    }

    /// Returns a shared erased reference to the payload.
    ///
    /// The reference is null if this value holds no payload.
    #[inline]
    pub fn as_value_ref(&self) -> RawValueRef<'_> {
        match (self.payload_ptr(), self.vtable()) {
            (Some(ptr), Some(vtable)) => {
                // SAFETY:
                // 1. `ptr` points to the payload, which matches `vtable` by the
                //    storage invariant.
                // 2. The payload stays alive and unmodified for the borrow of
                //    `self`.
                unsafe { RawValueRef::from_raw_parts(ptr, vtable) }
            }
            _ => RawValueRef::null(),
        }
    }

    /// Returns an exclusive erased reference to the payload.
    ///
    /// The reference is null if this value holds no payload.
    #[inline]
    pub fn as_value_mut(&mut self) -> RawValueMut<'_> {
        let vtable = self.vtable();
        match (self.payload_mut_ptr(), vtable) {
            (Some(ptr), Some(vtable)) => {
                // SAFETY:
                // 1. `ptr` points to the payload, which matches `vtable` by the
                //    storage invariant.
                // 2. The payload is exclusively borrowed through `&mut self` for
                //    the lifetime of the returned reference.
                unsafe { RawValueMut::from_raw_parts(ptr, vtable) }
            }
            _ => RawValueMut::null(),
        }
    }

    /// Returns the vtable of the payload, if any.
    #[inline]
    fn vtable(&self) -> Option<&'static ValueVtable> {
        match &self.storage {
            Storage::Inline { vtable, .. } | Storage::Heap { vtable, .. } => Some(*vtable),
            Storage::Empty | Storage::Void => None,
        }
    }

    /// Returns a pointer to the payload, if any.
    #[inline]
    fn payload_ptr(&self) -> Option<NonNull<Erased>> {
        match &self.storage {
            Storage::Inline { buffer, .. } => Some(buffer.as_ptr()),
            Storage::Heap { payload, .. } => {
                Some(NonNull::from(&**payload).cast::<Erased>())
            }
            Storage::Empty | Storage::Void => None,
        }
    }

    /// Returns a mutable pointer to the payload, if any.
    #[inline]
    fn payload_mut_ptr(&mut self) -> Option<NonNull<Erased>> {
        match &mut self.storage {
            Storage::Inline { buffer, .. } => Some(buffer.as_mut_ptr()),
            Storage::Heap { payload, .. } => {
                Some(NonNull::from(&mut **payload).cast::<Erased>())
            }
            Storage::Empty | Storage::Void => None,
        }
    }
}

impl Default for RawValue {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl Clone for RawValue {
    fn clone(&self) -> Self {
        match &self.storage {
            Storage::Empty => Self::empty(),
            Storage::Void => Self::void(),
            Storage::Inline { vtable, buffer } => {
                // SAFETY:
                // 1. The buffer holds an initialized payload matching `vtable`.
                // 2. We only hold `&self`, so the payload is not mutably borrowed.
                unsafe { vtable.clone_value(buffer.as_ptr()) }
            }
            Storage::Heap { vtable, payload } => {
                let ptr = NonNull::from(&**payload).cast::<Erased>();
                // SAFETY:
                // 1. The box holds a payload matching `vtable`.
                // 2. We only hold `&self`, so the payload is not mutably borrowed.
                unsafe { vtable.clone_value(ptr) }
            }
        }
    }
}

impl core::ops::Drop for RawValue {
    #[inline]
    fn drop(&mut self) {
        if let Storage::Inline { vtable, buffer } = &mut self.storage {
            // SAFETY:
            // 1. The buffer holds an initialized payload matching `vtable`.
            // 2. We are in the drop function, so the payload is never used again;
            //    the buffer itself has no destructor.
            unsafe {
                vtable.drop_in_place(buffer.as_mut_ptr());
            }
        }
    }
}

impl core::fmt::Debug for RawValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.storage {
            Storage::Empty => f.write_str("RawValue(empty)"),
            Storage::Void => f.write_str("RawValue(void)"),
            Storage::Inline { vtable, .. } => write!(f, "RawValue(inline {})", vtable.type_name()),
            Storage::Heap { vtable, .. } => write!(f, "RawValue(heap {})", vtable.type_name()),
        }
    }
}

const _: () = assert!(INLINE_CAPACITY >= 2 * size_of::<usize>());
