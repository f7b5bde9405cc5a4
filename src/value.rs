//! The owned, type-erased [`Value`].
//!
//! A [`Value`] holds any `Clone + 'static` payload. Small payloads live in an
//! inline buffer of [`INLINE_CAPACITY`] bytes; larger (or over-aligned) ones
//! are boxed. Either way the value owns its payload exclusively, clones
//! deep-copy it, and dropping the value drops the payload exactly once.
//!
//! Besides holding a payload, a value can be *empty* (nothing at all, the
//! default) or *void* (the result of a call that returns nothing). Neither
//! state has a payload, so [`Value::has_value`] is `false` for both.
//!
//! ```
//! use dynreflect::Value;
//!
//! let mut value = Value::new(String::from("hello"));
//! assert!(value.is::<String>());
//! value.downcast_mut::<String>().unwrap().push('!');
//! assert_eq!(value.get::<String>().as_deref(), Some("hello!"));
//!
//! let taken = value.take();
//! assert!(!value.has_value());
//! assert_eq!(taken.downcast_ref::<String>().unwrap(), "hello!");
//! ```

use core::any::TypeId;

use dynreflect_internals::RawValue;
pub use dynreflect_internals::{INLINE_CAPACITY, fits_inline};

use crate::reference::{AnyMut, AnyRef};

/// An owned value of any `Clone + 'static` type.
///
/// See the [module documentation](self) for the storage states.
#[derive(Clone, Default)]
pub struct Value {
    /// The erased storage.
    raw: RawValue,
}

impl Value {
    /// Creates a value holding `value`.
    #[inline]
    pub fn new<T: Clone + 'static>(value: T) -> Self {
        Self {
            raw: RawValue::new(value),
        }
    }

    /// Creates an empty value.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            raw: RawValue::empty(),
        }
    }

    /// Creates a void value, the result of a call returning `()`.
    #[inline]
    #[must_use]
    pub const fn void() -> Self {
        Self {
            raw: RawValue::void(),
        }
    }

    /// Wraps internal storage.
    #[inline]
    pub(crate) fn from_raw(raw: RawValue) -> Self {
        Self { raw }
    }

    /// Wraps the return value of a call.
    ///
    /// A unit return becomes [`Value::void`] rather than a stored `()`.
    #[inline]
    pub(crate) fn from_return<R: Clone + 'static>(value: R) -> Self {
        if TypeId::of::<R>() == TypeId::of::<()>() {
            drop(value);
            Self::void()
        } else {
            Self::new(value)
        }
    }

    /// Returns `true` if this value holds a payload.
    #[inline]
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.raw.has_value()
    }

    /// Returns `true` if this value is void.
    #[inline]
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.raw.is_void()
    }

    /// Returns `true` if the payload is stored in its own allocation.
    #[inline]
    #[must_use]
    pub fn is_heap(&self) -> bool {
        self.raw.is_heap()
    }

    /// Returns `true` if the payload has type `T`.
    #[inline]
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.raw.is::<T>()
    }

    /// Returns the [`TypeId`] of the payload, if any.
    #[inline]
    #[must_use]
    pub fn type_id(&self) -> Option<TypeId> {
        self.raw.type_id()
    }

    /// Returns the Rust type name of the payload, if any.
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> Option<&'static str> {
        self.raw.type_name()
    }

    /// Returns a copy of the payload if it has type `T`.
    #[inline]
    #[must_use]
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Returns a reference to the payload if it has type `T`.
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.raw.downcast_ref()
    }

    /// Returns a mutable reference to the payload if it has type `T`.
    #[inline]
    #[must_use]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.raw.downcast_mut()
    }

    /// Moves the payload out if it has type `T`, or gives the value back.
    #[inline]
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        self.raw.downcast_into().map_err(|raw| Self { raw })
    }

    /// Returns a reference to the payload without checking its type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This value holds a payload of type `T`.
    #[inline]
    #[must_use]
    pub unsafe fn downcast_ref_unchecked<T: 'static>(&self) -> &T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { self.raw.downcast_ref_unchecked() }
    }

    /// Returns a mutable reference to the payload without checking its type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This value holds a payload of type `T`.
    #[inline]
    #[must_use]
    pub unsafe fn downcast_mut_unchecked<T: 'static>(&mut self) -> &mut T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { self.raw.downcast_mut_unchecked() }
    }

    /// Moves the payload out without checking its type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This value holds a payload of type `T`.
    #[inline]
    pub unsafe fn into_inner_unchecked<T: 'static>(self) -> T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { self.raw.into_inner_unchecked() }
    }

    /// Moves the contents out, leaving this value empty.
    #[inline]
    #[must_use = "use `clear` to discard the contents"]
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
        }
    }

    /// Drops the contents, leaving this value empty.
    #[inline]
    pub fn clear(&mut self) {
        self.raw = RawValue::empty();
    }

    /// Borrows the payload as an [`AnyRef`], null if there is none.
    #[inline]
    pub fn as_any_ref(&self) -> AnyRef<'_> {
        AnyRef::from_raw(self.raw.as_value_ref())
    }

    /// Borrows the payload as an [`AnyMut`], null if there is none.
    #[inline]
    pub fn as_any_mut(&mut self) -> AnyMut<'_> {
        AnyMut::from_raw(self.raw.as_value_mut())
    }
}

impl core::fmt::Debug for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.raw, f)
    }
}

impl From<AnyRef<'_>> for Value {
    /// Copies the referenced payload; a null reference yields an empty value.
    fn from(reference: AnyRef<'_>) -> Self {
        reference.to_value()
    }
}

impl From<AnyMut<'_>> for Value {
    /// Copies the referenced payload; a null reference yields an empty value.
    fn from(reference: AnyMut<'_>) -> Self {
        reference.to_value()
    }
}
