//! Vtable for type-erased value operations.
//!
//! This module contains the [`ValueVtable`] which enables cloning, dropping and
//! identifying a payload after its concrete type `T` has been erased. The
//! vtable stores function pointers that dispatch to the correct typed
//! implementations.
//!
//! This module encapsulates the fields of [`ValueVtable`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameter must match the actual payload type
//! it is paired with**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`ValueVtable::new`], which pairs the function pointers with
//! a specific type `T` at compile time, and because every pairing of a vtable
//! with a payload happens in a typed constructor.

use core::{any::TypeId, ptr::NonNull};

use crate::{util::Erased, value::raw::RawValue};

/// Vtable for type-erased value operations.
///
/// # Safety Invariant
///
/// The fields `clone` and `drop_in_place` are guaranteed to point to the
/// functions defined below instantiated with the payload type `T` that was
/// used to create this [`ValueVtable`].
pub(crate) struct ValueVtable {
    /// Gets the [`TypeId`] of the payload type.
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the payload type.
    type_name: fn() -> &'static str,
    /// `size_of::<T>()`
    size: usize,
    /// Clones the payload behind the pointer into a new [`RawValue`].
    clone: unsafe fn(NonNull<Erased>) -> RawValue,
    /// Runs the destructor of the payload behind the pointer in place.
    drop_in_place: unsafe fn(NonNull<Erased>),
}

impl ValueVtable {
    /// Creates a new [`ValueVtable`] for the payload type `T`.
    pub(crate) const fn new<T: Clone + 'static>() -> &'static Self {
        const {
            &Self {
                type_id: TypeId::of::<T>,
                type_name: core::any::type_name::<T>,
                size: size_of::<T>(),
                clone: clone::<T>,
                drop_in_place: drop_in_place::<T>,
            }
        }
    }

    /// Gets the [`TypeId`] of the payload type that was used to create this
    /// [`ValueVtable`].
    #[inline]
    pub(crate) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the name of the payload type that was used to create this
    /// [`ValueVtable`].
    #[inline]
    pub(crate) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Gets the size in bytes of the payload type.
    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    /// Clones the payload pointed to by `ptr` into a new, independently owned
    /// [`RawValue`].
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized payload of the type this vtable was
    ///    created for.
    /// 2. The payload is not mutably borrowed for the duration of the call.
    #[inline]
    pub(crate) unsafe fn clone_value(&self, ptr: NonNull<Erased>) -> RawValue {
        // SAFETY: We know that `self.clone` points to the function `clone::<T>`
        // below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.clone)(ptr) }
    }

    /// Drops the payload pointed to by `ptr` in place, without deallocating.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized payload of the type this vtable was
    ///    created for.
    /// 2. The payload is not used again after this call, other than having
    ///    its storage released.
    #[inline]
    pub(crate) unsafe fn drop_in_place(&self, ptr: NonNull<Erased>) {
        // SAFETY: We know that `self.drop_in_place` points to the function
        // `drop_in_place::<T>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.drop_in_place)(ptr) }
    }
}

/// Clones the `T` behind `ptr` into a new [`RawValue`].
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` points to an initialized `T`.
/// 2. The `T` is not mutably borrowed for the duration of the call.
unsafe fn clone<T: Clone + 'static>(ptr: NonNull<Erased>) -> RawValue {
    let ptr: NonNull<T> = ptr.cast::<T>();
    // SAFETY: The pointer is non-null, aligned and points to an initialized `T`
    // that is not mutably borrowed, as guaranteed by the caller.
    let value: &T = unsafe { ptr.as_ref() };
    RawValue::new(value.clone())
}

/// Drops the `T` behind `ptr` in place.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` points to an initialized `T`.
/// 2. The `T` is not used again after this call.
unsafe fn drop_in_place<T>(ptr: NonNull<Erased>) {
    let ptr: NonNull<T> = ptr.cast::<T>();
    // SAFETY: The pointer is valid for reads and writes, aligned and points to
    // an initialized `T` that will not be used again, as guaranteed by the
    // caller.
    unsafe {
        ptr.drop_in_place();
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    #[test]
    fn test_value_vtable_eq() {
        let vtable1 = ValueVtable::new::<i32>();
        let vtable2 = ValueVtable::new::<i32>();

        // Both should be the exact same static instance
        assert!(core::ptr::eq(vtable1, vtable2));
        assert!(!core::ptr::eq(vtable1, ValueVtable::new::<u32>()));
    }

    #[test]
    fn test_value_vtable_identity() {
        let vtable = ValueVtable::new::<String>();
        assert_eq!(vtable.type_id(), TypeId::of::<String>());
        assert_eq!(vtable.type_name(), core::any::type_name::<String>());
        assert_eq!(vtable.size(), size_of::<String>());
    }
}
