//! Per-parameter qualifiers and unpacking.
//!
//! A [`Value`] always stores an unqualified object. Whether a bound function
//! receives that object by value, by shared or exclusive reference, or as an
//! optional (nullable) reference is recorded once per parameter as a
//! [`Qualifier`] and re-applied by [`Param::unpack`] at call time.
//!
//! | Parameter type     | [`Qualifier`]                  | Empty argument |
//! |--------------------|--------------------------------|----------------|
//! | `T`                | [`Value`](Qualifier::Value)    | rejected       |
//! | `&T`               | [`Ref`](Qualifier::Ref)        | rejected       |
//! | `&mut T`           | [`Mut`](Qualifier::Mut)        | rejected       |
//! | `Option<&T>`       | [`OptionalRef`](Qualifier::OptionalRef) | `None` |
//! | `Option<&mut T>`   | [`OptionalMut`](Qualifier::OptionalMut) | `None` |
//!
//! By-value parameters need an explicit [`Param`] implementation, which the
//! [`value_param!`](crate::value_param!) macro writes for you. The primitive
//! types, [`String`] and [`Vec<T>`] are covered out of the box.

use alloc::{borrow::Cow, format, string::String, vec::Vec};
use core::any::TypeId;

use crate::value::Value;

/// How a bound parameter receives the object stored in its argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// A copy of the stored object.
    Value,
    /// A shared reference to the stored object.
    Ref,
    /// An exclusive reference to the stored object.
    Mut,
    /// A shared reference, or `None` when the argument is empty.
    OptionalRef,
    /// An exclusive reference, or `None` when the argument is empty.
    OptionalMut,
}

impl Qualifier {
    /// Returns `true` if an empty argument is acceptable.
    #[inline]
    #[must_use]
    pub const fn is_optional(self) -> bool {
        matches!(self, Self::OptionalRef | Self::OptionalMut)
    }

    /// Returns `true` if the bound entity may mutate the argument in place.
    #[inline]
    #[must_use]
    pub const fn is_mutable(self) -> bool {
        matches!(self, Self::Mut | Self::OptionalMut)
    }

    /// Spells the qualified form of `base` the way Rust would write it.
    #[must_use]
    pub fn decorate<'a>(self, base: &'a str) -> Cow<'a, str> {
        match self {
            Self::Value => Cow::Borrowed(base),
            Self::Ref => Cow::Owned(format!("&{base}")),
            Self::Mut => Cow::Owned(format!("&mut {base}")),
            Self::OptionalRef => Cow::Owned(format!("Option<&{base}>")),
            Self::OptionalMut => Cow::Owned(format!("Option<&mut {base}>")),
        }
    }
}

/// Static facts about a Rust type, captured at registration time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeInfo {
    /// The type's [`TypeId`].
    type_id: TypeId,
    /// The type's [`core::any::type_name`].
    name: &'static str,
    /// `size_of::<T>()`
    size: usize,
    /// `align_of::<T>()`
    align: usize,
}

impl TypeInfo {
    /// Captures the facts about `T`.
    #[inline]
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
            size: size_of::<T>(),
            align: align_of::<T>(),
        }
    }

    /// The type's [`TypeId`].
    #[inline]
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The type's Rust name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type's size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The type's alignment in bytes.
    #[inline]
    #[must_use]
    pub fn align(&self) -> usize {
        self.align
    }

    /// Returns `true` for the unit type.
    #[inline]
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.type_id == TypeId::of::<()>()
    }
}

/// A parameter's unqualified type together with its qualifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamInfo {
    /// The unqualified type stored in the argument.
    pub base: TypeInfo,
    /// How the argument is handed to the bound entity.
    pub qualifier: Qualifier,
}

/// A type that can appear as a parameter of a bound function.
///
/// The lifetimes in `&'r T` and friends are only markers; the actual
/// lifetime of an unpacked item is the `'a` of [`Param::unpack`].
pub trait Param {
    /// The unqualified type stored in the argument.
    type Base: Clone + 'static;

    /// What the bound entity receives.
    type Item<'a>;

    /// How the argument is handed over.
    const QUALIFIER: Qualifier;

    /// Re-applies the qualifier to an argument slot.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `slot` holds a payload of type [`Param::Base`], or, when
    ///    [`Param::QUALIFIER`] is optional, holds no payload at all.
    unsafe fn unpack<'a>(slot: &'a mut Value) -> Self::Item<'a>;

    /// Returns the static description of this parameter.
    #[inline]
    #[must_use]
    fn info() -> ParamInfo {
        ParamInfo {
            base: TypeInfo::of::<Self::Base>(),
            qualifier: Self::QUALIFIER,
        }
    }
}

/// Shorthand for the item a [`Param`] unpacks to.
pub type ParamItem<'a, P> = <P as Param>::Item<'a>;

impl<'r, T: Clone + 'static> Param for &'r T {
    type Base = T;
    type Item<'a> = &'a T;
    const QUALIFIER: Qualifier = Qualifier::Ref;

    #[inline]
    unsafe fn unpack<'a>(slot: &'a mut Value) -> &'a T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { slot.downcast_ref_unchecked::<T>() }
    }
}

impl<'r, T: Clone + 'static> Param for &'r mut T {
    type Base = T;
    type Item<'a> = &'a mut T;
    const QUALIFIER: Qualifier = Qualifier::Mut;

    #[inline]
    unsafe fn unpack<'a>(slot: &'a mut Value) -> &'a mut T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { slot.downcast_mut_unchecked::<T>() }
    }
}

impl<'r, T: Clone + 'static> Param for Option<&'r T> {
    type Base = T;
    type Item<'a> = Option<&'a T>;
    const QUALIFIER: Qualifier = Qualifier::OptionalRef;

    #[inline]
    unsafe fn unpack<'a>(slot: &'a mut Value) -> Option<&'a T> {
        if !slot.has_value() {
            return None;
        }
        // SAFETY:
        // 1. The slot holds a payload, which the caller guarantees is a `T`.
        Some(unsafe { slot.downcast_ref_unchecked::<T>() })
    }
}

impl<'r, T: Clone + 'static> Param for Option<&'r mut T> {
    type Base = T;
    type Item<'a> = Option<&'a mut T>;
    const QUALIFIER: Qualifier = Qualifier::OptionalMut;

    #[inline]
    unsafe fn unpack<'a>(slot: &'a mut Value) -> Option<&'a mut T> {
        if !slot.has_value() {
            return None;
        }
        // SAFETY:
        // 1. The slot holds a payload, which the caller guarantees is a `T`.
        Some(unsafe { slot.downcast_mut_unchecked::<T>() })
    }
}

impl<T: Clone + 'static> Param for Vec<T> {
    type Base = Vec<T>;
    type Item<'a> = Vec<T>;
    const QUALIFIER: Qualifier = Qualifier::Value;

    #[inline]
    unsafe fn unpack<'a>(slot: &'a mut Value) -> Vec<T> {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { slot.downcast_ref_unchecked::<Vec<T>>() }.clone()
    }
}

crate::value_param!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

/// A type that can appear as the receiver of a bound method.
///
/// Implemented for `&T` (a const method) and `&mut T`.
pub trait Receiver {
    /// The type that owns the method.
    type Owner: Clone + 'static;

    /// What the bound method receives as `self`.
    type Item<'a>;

    /// Whether the method leaves the object untouched.
    const IS_CONST: bool;

    /// Borrows the object out of its slot.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `object` holds a payload of type [`Receiver::Owner`].
    unsafe fn unpack<'a>(object: &'a mut Value) -> Self::Item<'a>;
}

/// Shorthand for the item a [`Receiver`] unpacks to.
pub type ReceiverItem<'a, R> = <R as Receiver>::Item<'a>;

impl<'r, T: Clone + 'static> Receiver for &'r T {
    type Owner = T;
    type Item<'a> = &'a T;
    const IS_CONST: bool = true;

    #[inline]
    unsafe fn unpack<'a>(object: &'a mut Value) -> &'a T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { object.downcast_ref_unchecked::<T>() }
    }
}

impl<'r, T: Clone + 'static> Receiver for &'r mut T {
    type Owner = T;
    type Item<'a> = &'a mut T;
    const IS_CONST: bool = false;

    #[inline]
    unsafe fn unpack<'a>(object: &'a mut Value) -> &'a mut T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { object.downcast_mut_unchecked::<T>() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualifier_names() {
        assert_eq!(Qualifier::Value.decorate("i32"), "i32");
        assert_eq!(Qualifier::Ref.decorate("i32"), "&i32");
        assert_eq!(Qualifier::Mut.decorate("i32"), "&mut i32");
        assert_eq!(Qualifier::OptionalRef.decorate("i32"), "Option<&i32>");
        assert_eq!(Qualifier::OptionalMut.decorate("i32"), "Option<&mut i32>");
    }

    #[test]
    fn test_param_info() {
        assert_eq!(<&String as Param>::info().qualifier, Qualifier::Ref);
        assert_eq!(
            <Option<&mut u8> as Param>::info().base.type_id(),
            TypeId::of::<u8>()
        );
        assert_eq!(<Vec<i32> as Param>::QUALIFIER, Qualifier::Value);
        assert!(Qualifier::OptionalMut.is_optional());
        assert!(Qualifier::OptionalMut.is_mutable());
        assert!(!Qualifier::Ref.is_mutable());
    }

    #[test]
    fn test_unpack_optional() {
        let mut empty = Value::empty();
        // SAFETY: An empty slot is valid for optional parameters.
        assert!(unsafe { <Option<&i32> as Param>::unpack(&mut empty) }.is_none());

        let mut slot = Value::new(4i32);
        // SAFETY: The slot holds an `i32`.
        if let Some(value) = unsafe { <Option<&mut i32> as Param>::unpack(&mut slot) } {
            *value = 5;
        }
        assert_eq!(slot.get::<i32>(), Some(5));
    }

    #[test]
    fn test_unpack_by_value_copies() {
        let mut slot = Value::new(String::from("kept"));
        // SAFETY: The slot holds a `String`.
        let copy = unsafe { <String as Param>::unpack(&mut slot) };
        assert_eq!(copy, "kept");
        assert_eq!(slot.downcast_ref::<String>().unwrap(), "kept");
    }
}
