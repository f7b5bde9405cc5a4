//! Non-owning, type-erased references.
//!
//! [`AnyRef`] and [`AnyMut`] point at an existing value of any
//! `Clone + 'static` type without owning it. Both may be null, which is what
//! borrowing an empty [`Value`] produces.
//!
//! ```
//! use dynreflect::{AnyMut, AnyRef, Value};
//!
//! let mut counter = 41u32;
//! *AnyMut::new(&mut counter).into_mut::<u32>().unwrap() += 1;
//!
//! let shared = AnyRef::new(&counter);
//! let copy = shared;
//! assert_eq!(copy.downcast_ref::<u32>(), Some(&42));
//! assert_eq!(Value::from(shared).get::<u32>(), Some(42));
//! ```

use core::any::TypeId;

use dynreflect_internals::{RawValueMut, RawValueRef};

use crate::value::Value;

/// A shared reference to a value of erased type.
///
/// Copies refer to the same value.
#[derive(Clone, Copy)]
pub struct AnyRef<'a> {
    /// The erased reference.
    raw: RawValueRef<'a>,
}

impl<'a> AnyRef<'a> {
    /// Borrows `value`.
    #[inline]
    pub fn new<T: Clone + 'static>(value: &'a T) -> Self {
        Self {
            raw: RawValueRef::new(value),
        }
    }

    /// Creates a null reference.
    #[inline]
    #[must_use]
    pub const fn null() -> Self {
        Self {
            raw: RawValueRef::null(),
        }
    }

    /// Wraps an internal reference.
    #[inline]
    pub(crate) fn from_raw(raw: RawValueRef<'a>) -> Self {
        Self { raw }
    }

    /// Returns `true` if this reference is not null.
    #[inline]
    #[must_use]
    pub fn has_reference(self) -> bool {
        self.raw.has_reference()
    }

    /// Returns the [`TypeId`] of the referenced value, if any.
    #[inline]
    #[must_use]
    pub fn type_id(self) -> Option<TypeId> {
        self.raw.type_id()
    }

    /// Returns the Rust type name of the referenced value, if any.
    #[inline]
    #[must_use]
    pub fn type_name(self) -> Option<&'static str> {
        self.raw.type_name()
    }

    /// Returns the referenced value if it has type `T`.
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: 'static>(self) -> Option<&'a T> {
        self.raw.downcast_ref()
    }

    /// Returns the referenced value without checking its type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The reference is not null and refers to a value of type `T`.
    #[inline]
    #[must_use]
    pub unsafe fn downcast_ref_unchecked<T: 'static>(self) -> &'a T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { self.raw.downcast_ref_unchecked() }
    }

    /// Returns whether both references point at the same value.
    ///
    /// Two null references are considered the same.
    #[inline]
    #[must_use]
    pub fn ptr_eq(self, other: AnyRef<'_>) -> bool {
        self.raw.addr() == other.raw.addr()
    }

    /// Copies the referenced value into a new [`Value`].
    ///
    /// A null reference produces an empty value.
    #[inline]
    #[must_use]
    pub fn to_value(self) -> Value {
        Value::from_raw(self.raw.to_value())
    }
}

impl Default for AnyRef<'_> {
    fn default() -> Self {
        Self::null()
    }
}

impl core::fmt::Debug for AnyRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.type_name() {
            Some(name) => write!(f, "AnyRef({name})"),
            None => f.write_str("AnyRef(null)"),
        }
    }
}

/// An exclusive reference to a value of erased type.
pub struct AnyMut<'a> {
    /// The erased reference.
    raw: RawValueMut<'a>,
}

impl<'a> AnyMut<'a> {
    /// Borrows `value` exclusively.
    #[inline]
    pub fn new<T: Clone + 'static>(value: &'a mut T) -> Self {
        Self {
            raw: RawValueMut::new(value),
        }
    }

    /// Creates a null reference.
    #[inline]
    #[must_use]
    pub const fn null() -> Self {
        Self {
            raw: RawValueMut::null(),
        }
    }

    /// Wraps an internal reference.
    #[inline]
    pub(crate) fn from_raw(raw: RawValueMut<'a>) -> Self {
        Self { raw }
    }

    /// Returns `true` if this reference is not null.
    #[inline]
    #[must_use]
    pub fn has_reference(&self) -> bool {
        self.raw.has_reference()
    }

    /// Returns the [`TypeId`] of the referenced value, if any.
    #[inline]
    #[must_use]
    pub fn type_id(&self) -> Option<TypeId> {
        self.raw.type_id()
    }

    /// Returns a shared reference to the same value.
    #[inline]
    #[must_use]
    pub fn as_ref(&self) -> AnyRef<'_> {
        AnyRef::from_raw(self.raw.as_ref())
    }

    /// Reborrows this reference for a shorter lifetime.
    #[inline]
    pub fn reborrow(&mut self) -> AnyMut<'_> {
        AnyMut {
            raw: self.raw.reborrow(),
        }
    }

    /// Returns the referenced value mutably if it has type `T`.
    #[inline]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.raw.downcast_mut()
    }

    /// Converts into a `&'a mut T` if the referenced value has type `T`.
    #[inline]
    #[must_use]
    pub fn into_mut<T: 'static>(self) -> Option<&'a mut T> {
        self.raw.into_mut()
    }

    /// Converts into a `&'a mut T` without checking the type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The reference is not null and refers to a value of type `T`.
    #[inline]
    #[must_use]
    pub unsafe fn into_mut_unchecked<T: 'static>(self) -> &'a mut T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { self.raw.into_mut_unchecked() }
    }

    /// Copies the referenced value into a new [`Value`].
    #[inline]
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::from_raw(self.raw.to_value())
    }
}

impl Default for AnyMut<'_> {
    fn default() -> Self {
        Self::null()
    }
}

impl core::fmt::Debug for AnyMut<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.as_ref().type_name() {
            Some(name) => write!(f, "AnyMut({name})"),
            None => f.write_str("AnyMut(null)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    #[test]
    fn test_null() {
        assert!(!AnyRef::null().has_reference());
        assert!(!AnyMut::default().has_reference());
        assert!(AnyRef::null().ptr_eq(AnyRef::null()));
        assert!(!AnyRef::null().to_value().has_value());
    }

    #[test]
    fn test_shared_copies_alias() {
        let text = String::from("shared");
        let a = AnyRef::new(&text);
        let b = a;
        assert!(a.ptr_eq(b));
        assert!(!a.ptr_eq(AnyRef::new(&String::from("shared"))));
        assert_eq!(b.downcast_ref::<String>(), Some(&text));
    }

    #[test]
    fn test_reborrow_writes_through() {
        let mut number = 1i64;
        let mut reference = AnyMut::new(&mut number);
        *reference.reborrow().into_mut::<i64>().unwrap() = 7;
        assert_eq!(reference.as_ref().downcast_ref::<i64>(), Some(&7));
        assert!(reference.downcast_mut::<i32>().is_none());
        assert_eq!(number, 7);
    }
}
