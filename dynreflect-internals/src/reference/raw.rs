//! Type-erased reference types.
//!
//! This module encapsulates the `target` field of [`RawValueRef`] and
//! [`RawValueMut`], ensuring it is only visible within this module. This
//! visibility restriction guarantees the safety invariant: **a non-null
//! reference always points to a live payload of the type its vtable was created
//! for**.
//!
//! # Safety Invariant
//!
//! The `target` can only be set by the typed constructors ([`RawValueRef::new`],
//! [`RawValueMut::new`]), which derive both halves from the same `&T`, or by
//! the crate-internal `from_raw_parts`, whose callers vouch for the pairing.
//! The lifetime parameter ties the reference to the borrow it was created
//! from, so the payload outlives every copy.
//!
//! # Null State
//!
//! Both reference types have a null state, which is what a reference to an
//! empty or void [`RawValue`] produces. Converting a null reference into an
//! owned value yields an empty [`RawValue`].

use core::{any::TypeId, marker::PhantomData, ptr::NonNull};

use crate::{
    util::Erased,
    value::{RawValue, vtable::ValueVtable},
};

/// Address and vtable of a referenced payload.
#[derive(Clone, Copy)]
struct Target {
    /// Pointer to the payload.
    ptr: NonNull<Erased>,
    /// Vtable of the payload type.
    vtable: &'static ValueVtable,
}

/// A shared, type-erased reference to an existing value.
///
/// Copying a [`RawValueRef`] copies the address only.
#[derive(Clone, Copy)]
pub struct RawValueRef<'a> {
    /// The referenced payload, or `None` for the null reference.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. `ptr` points to an initialized payload of the type `vtable` was
    ///    created for.
    /// 2. The payload is valid for shared access for the lifetime `'a`.
    target: Option<Target>,

    /// Marker to tell the compiler that we should
    /// behave the same as a `&'a Erased`
    _marker: PhantomData<&'a Erased>,
}

impl<'a> RawValueRef<'a> {
    /// Creates a reference to `value`.
    #[inline]
    pub fn new<T: Clone + 'static>(value: &'a T) -> Self {
        Self {
            target: Some(Target {
                ptr: NonNull::from(value).cast::<Erased>(),
                vtable: ValueVtable::new::<T>(),
            }),
            _marker: PhantomData,
        }
    }

    /// Creates the null reference.
    #[inline]
    #[must_use]
    pub const fn null() -> Self {
        Self {
            target: None,
            _marker: PhantomData,
        }
    }

    /// Creates a reference from a payload pointer and its vtable.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized payload of the type `vtable` was
    ///    created for.
    /// 2. The payload is valid for shared access for the lifetime `'a`.
    #[inline]
    pub(crate) unsafe fn from_raw_parts(
        ptr: NonNull<Erased>,
        vtable: &'static ValueVtable,
    ) -> Self {
        Self {
            target: Some(Target { ptr, vtable }),
            _marker: PhantomData,
        }
    }

    /// Returns `true` if this reference points to a value.
    #[inline]
    pub fn has_reference(self) -> bool {
        self.target.is_some()
    }

    /// Returns the [`TypeId`] of the referenced value, if any.
    #[inline]
    pub fn type_id(self) -> Option<TypeId> {
        self.target.map(|target| target.vtable.type_id())
    }

    /// Returns the [`core::any::type_name`] of the referenced value, if any.
    #[inline]
    pub fn type_name(self) -> Option<&'static str> {
        self.target.map(|target| target.vtable.type_name())
    }

    /// Returns the referenced value if it is of type `T`.
    #[inline]
    pub fn downcast_ref<T: 'static>(self) -> Option<&'a T> {
        if self.type_id() == Some(TypeId::of::<T>()) {
            // SAFETY:
            // 1. The reference is non-null and the referent is a `T`, as just
            //    checked.
            let value = unsafe { self.downcast_ref_unchecked::<T>() };
            Some(value)
        } else {
            None
        }
    }

    /// Reinterprets the referenced value as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The reference is not null, and the referenced value is of type `T`.
    #[inline]
    pub unsafe fn downcast_ref_unchecked<T: 'static>(self) -> &'a T {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.type_id(), Some(TypeId::of::<T>()));

        let Some(target) = self.target else {
            // SAFETY: The caller guarantees that the reference is not null.
            unsafe { core::hint::unreachable_unchecked() }
        };
        // SAFETY: The pointer is aligned and points to an initialized `T` that is
        // valid for shared access for `'a` (type invariant plus the caller's
        // guarantee about `T`).
        unsafe { target.ptr.cast::<T>().as_ref() }
    }

    /// Clones the referenced value into a new [`RawValue`].
    ///
    /// A null reference produces an empty value.
    #[inline]
    pub fn to_value(self) -> RawValue {
        match self.target {
            Some(target) => {
                // SAFETY:
                // 1. The pointer matches the vtable by the type invariant.
                // 2. The payload is only shared-borrowed for `'a`.
                unsafe { target.vtable.clone_value(target.ptr) }
            }
            None => RawValue::empty(),
        }
    }

    /// Returns the referenced address, for identity comparisons.
    #[inline]
    pub fn addr(self) -> Option<usize> {
        self.target.map(|target| target.ptr.as_ptr() as usize)
    }
}

impl core::fmt::Debug for RawValueRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.type_name() {
            Some(name) => write!(f, "RawValueRef({name})"),
            None => f.write_str("RawValueRef(null)"),
        }
    }
}

/// An exclusive, type-erased reference to an existing value.
///
/// Mutation through a [`RawValueMut`] is visible to the owner of the value once
/// the reference is gone.
pub struct RawValueMut<'a> {
    /// The referenced payload, or `None` for the null reference.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. `ptr` points to an initialized payload of the type `vtable` was
    ///    created for.
    /// 2. The payload is valid for exclusive access for the lifetime `'a`.
    target: Option<Target>,

    /// Marker to tell the compiler that we should
    /// behave the same as a `&'a mut Erased`
    _marker: PhantomData<&'a mut Erased>,
}

impl<'a> RawValueMut<'a> {
    /// Creates an exclusive reference to `value`.
    #[inline]
    pub fn new<T: Clone + 'static>(value: &'a mut T) -> Self {
        Self {
            target: Some(Target {
                ptr: NonNull::from(value).cast::<Erased>(),
                vtable: ValueVtable::new::<T>(),
            }),
            _marker: PhantomData,
        }
    }

    /// Creates the null reference.
    #[inline]
    #[must_use]
    pub const fn null() -> Self {
        Self {
            target: None,
            _marker: PhantomData,
        }
    }

    /// Creates an exclusive reference from a payload pointer and its vtable.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized payload of the type `vtable` was
    ///    created for.
    /// 2. The payload is valid for exclusive access for the lifetime `'a`.
    #[inline]
    pub(crate) unsafe fn from_raw_parts(
        ptr: NonNull<Erased>,
        vtable: &'static ValueVtable,
    ) -> Self {
        Self {
            target: Some(Target { ptr, vtable }),
            _marker: PhantomData,
        }
    }

    /// Returns `true` if this reference points to a value.
    #[inline]
    pub fn has_reference(&self) -> bool {
        self.target.is_some()
    }

    /// Returns the [`TypeId`] of the referenced value, if any.
    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        self.as_ref().type_id()
    }

    /// Returns a shared reference with a shorter lifetime.
    #[inline]
    pub fn as_ref(&self) -> RawValueRef<'_> {
        RawValueRef {
            target: self.target,
            _marker: PhantomData,
        }
    }

    /// Reborrows this reference with a shorter lifetime.
    #[inline]
    pub fn reborrow(&mut self) -> RawValueMut<'_> {
        RawValueMut {
            target: self.target,
            _marker: PhantomData,
        }
    }

    /// Returns the referenced value mutably if it is of type `T`.
    #[inline]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.reborrow().into_mut::<T>()
    }

    /// Converts this reference into a `&'a mut T` if the referenced value is of
    /// type `T`.
    #[inline]
    pub fn into_mut<T: 'static>(self) -> Option<&'a mut T> {
        if self.type_id() == Some(TypeId::of::<T>()) {
            // SAFETY:
            // 1. The reference is non-null and the referent is a `T`, as just
            //    checked.
            let value = unsafe { self.into_mut_unchecked::<T>() };
            Some(value)
        } else {
            None
        }
    }

    /// Reinterprets the referenced value as a mutable `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The reference is not null, and the referenced value is of type `T`.
    #[inline]
    pub unsafe fn into_mut_unchecked<T: 'static>(self) -> &'a mut T {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.type_id(), Some(TypeId::of::<T>()));

        let Some(target) = self.target else {
            // SAFETY: The caller guarantees that the reference is not null.
            unsafe { core::hint::unreachable_unchecked() }
        };
        // SAFETY: The pointer is aligned and points to an initialized `T` that is
        // valid for exclusive access for `'a` (type invariant plus the caller's
        // guarantee about `T`). `self` is consumed, so the exclusivity moves
        // into the returned reference.
        unsafe { target.ptr.cast::<T>().as_mut() }
    }

    /// Clones the referenced value into a new [`RawValue`].
    ///
    /// A null reference produces an empty value.
    #[inline]
    pub fn to_value(&self) -> RawValue {
        self.as_ref().to_value()
    }
}

impl core::fmt::Debug for RawValueMut<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.as_ref().type_name() {
            Some(name) => write!(f, "RawValueMut({name})"),
            None => f.write_str("RawValueMut(null)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    #[test]
    fn test_raw_reference_size() {
        assert_eq!(
            size_of::<RawValueRef<'_>>(),
            2 * size_of::<usize>()
        );
        assert_eq!(
            size_of::<RawValueMut<'_>>(),
            2 * size_of::<usize>()
        );
    }

    #[test]
    fn test_null() {
        let null = RawValueRef::null();
        assert!(!null.has_reference());
        assert_eq!(null.type_id(), None);
        assert!(!null.to_value().has_value());

        let null = RawValueMut::null();
        assert!(!null.has_reference());
    }

    #[test]
    fn test_copy_shares_address() {
        let value = String::from("shared");
        let first = RawValueRef::new(&value);
        let second = first;
        assert_eq!(first.addr(), second.addr());
        assert_eq!(second.downcast_ref::<String>(), Some(&value));
    }

    #[test]
    fn test_mutation_is_visible() {
        let mut counter = 1u32;
        {
            let mut reference = RawValueMut::new(&mut counter);
            assert!(reference.downcast_mut::<i32>().is_none());
            *reference.downcast_mut::<u32>().unwrap() += 41;
        }
        assert_eq!(counter, 42);
    }

    #[test]
    fn test_to_value_copies() {
        let mut text = String::from("before");
        let copy = RawValueMut::new(&mut text).to_value();
        text.push_str(" and after");
        assert_eq!(copy.downcast_ref::<String>().map(String::as_str), Some("before"));
    }

    #[test]
    fn test_reference_into_raw_value() {
        let mut value = RawValue::new(5i64);
        {
            let mut reference = value.as_value_mut();
            *reference.downcast_mut::<i64>().unwrap() = 6;
        }
        assert_eq!(value.as_value_ref().downcast_ref::<i64>(), Some(&6));
        assert!(!RawValue::void().as_value_ref().has_reference());
    }

    #[test]
    fn test_send_sync() {
        static_assertions::assert_not_impl_any!(RawValueRef<'_>: Send, Sync);
        static_assertions::assert_not_impl_any!(RawValueMut<'_>: Send, Sync);
    }
}
