//! Erased entry points for registered entities.
//!
//! Every registered function, method, field, constructor, conversion and
//! serializer is turned, once, into a *binding*: an object implementing one
//! of the traits below, whose signature is the same no matter what the
//! wrapped entity looks like. A binding unpacks erased [`Value`]s into the
//! real arguments, calls the entity and packs the result back up.
//!
//! | Category        | Trait                  | Erased shape                        |
//! |-----------------|------------------------|-------------------------------------|
//! | free function   | [`FunctionBinding`]    | `(&mut [Value]) -> Value`           |
//! | constructor     | [`FunctionBinding`]    | `(&mut [Value]) -> Value`           |
//! | member function | [`MethodBinding`]      | `(&mut Value, &mut [Value]) -> Value` |
//! | field get       | [`FieldGetter`]        | `(&Value) -> Value`                 |
//! | field set       | [`FieldSetter`]        | `(&mut Value, &Value)`              |
//! | conversion      | [`ConversionBinding`]  | `(&Value) -> Value`                 |
//! | serializer      | [`SerializerBinding`]  | `(&Value) -> String`, `(&str) -> Value` |
//!
//! The entry points do not check anything: they trust that the arguments
//! have the types recorded at registration. Checking is the job of the
//! [`Registry`](crate::Registry), which validates before it invokes.
//!
//! Bindings are shared through [`Binding`], whose equality is identity.

mod conversion;
mod field;
mod function;
mod method;
mod serializer;

use alloc::{string::String, vec::Vec};
use core::ops::Deref;

use triomphe::Arc;

pub use self::{
    conversion::conversion_binding,
    field::field_bindings,
    function::IntoFunction,
    method::IntoMethod,
    serializer::serializer_binding,
};
use crate::{
    param::{ParamInfo, TypeInfo},
    value::Value,
};

/// Erased entry point of a free function or a constructor.
pub trait FunctionBinding: 'static + Send + Sync {
    /// Calls the wrapped entity.
    ///
    /// Void-returning entities produce [`Value::void`].
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `args` has exactly one element per declared parameter.
    /// 2. Every element holds a payload of its parameter's base type, or is
    ///    empty if that parameter's qualifier is optional.
    unsafe fn invoke(&self, args: &mut [Value]) -> Value;
}

/// Erased entry point of a member function.
pub trait MethodBinding: 'static + Send + Sync {
    /// Calls the wrapped method on `object`, which may be mutated in place.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `object` holds a payload of the owning type.
    /// 2. `args` has exactly one element per declared parameter.
    /// 3. Every element holds a payload of its parameter's base type, or is
    ///    empty if that parameter's qualifier is optional.
    unsafe fn invoke(&self, object: &mut Value, args: &mut [Value]) -> Value;
}

/// Erased read access to a member variable.
pub trait FieldGetter: 'static + Send + Sync {
    /// Returns a copy of the member.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `object` holds a payload of the owning type.
    unsafe fn get(&self, object: &Value) -> Value;
}

/// Erased write access to a member variable.
pub trait FieldSetter: 'static + Send + Sync {
    /// Overwrites the member with a copy of `value`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `object` holds a payload of the owning type.
    /// 2. `value` holds a payload of the member's type.
    unsafe fn set(&self, object: &mut Value, value: &Value);
}

/// Erased conversion from one type to another.
pub trait ConversionBinding: 'static + Send + Sync {
    /// Produces a new value of the target type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `source` holds a payload of the source type.
    unsafe fn convert(&self, source: &Value) -> Value;
}

/// Erased string serialization for one type.
pub trait SerializerBinding: 'static + Send + Sync {
    /// Renders `value` as text.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `value` holds a payload of the serialized type.
    unsafe fn serialize(&self, value: &Value) -> String;

    /// Parses text into a new value of the serialized type.
    ///
    /// # Errors
    ///
    /// Returns the parser's explanation when `text` is malformed.
    fn deserialize(&self, text: &str) -> Result<Value, String>;
}

/// A shared handle to a binding.
///
/// Cloning is cheap and two handles compare equal exactly when they share
/// the same binding, which makes a binding usable as the identity of the
/// entity it wraps.
pub struct Binding<B: ?Sized>(Arc<B>);

impl<B: ?Sized> Binding<B> {
    /// Wraps an already erased binding.
    #[inline]
    pub(crate) fn from_arc(binding: Arc<B>) -> Self {
        Self(binding)
    }

    /// Returns `true` if both handles share the same binding.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(
            core::ptr::from_ref::<B>(&self.0),
            core::ptr::from_ref::<B>(&other.0),
        )
    }
}

impl<B: ?Sized> Clone for Binding<B> {
    #[inline]
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<B: ?Sized> PartialEq for Binding<B> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<B: ?Sized> Eq for Binding<B> {}

impl<B: ?Sized> Deref for Binding<B> {
    type Target = B;

    #[inline]
    fn deref(&self) -> &B {
        &self.0
    }
}

impl<B: ?Sized> core::fmt::Debug for Binding<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Binding")
            .field(&core::ptr::from_ref::<B>(&self.0).cast::<()>())
            .finish()
    }
}

/// The statically known shape of a bound callable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Parameters in declaration order.
    params: Vec<ParamInfo>,
    /// The return type, `()` for void.
    returns: TypeInfo,
}

impl Signature {
    /// Creates a signature.
    #[inline]
    pub(crate) fn new(params: Vec<ParamInfo>, returns: TypeInfo) -> Self {
        Self { params, returns }
    }

    /// Parameters in declaration order.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    /// The return type, `()` for void.
    #[inline]
    #[must_use]
    pub fn returns(&self) -> TypeInfo {
        self.returns
    }
}

/// The statically known shape of a bound method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSignature {
    /// The type that owns the method.
    owner: TypeInfo,
    /// Whether the method takes `&self`.
    is_const: bool,
    /// Parameters after the receiver, and the return type.
    signature: Signature,
}

impl MethodSignature {
    /// Creates a method signature.
    #[inline]
    pub(crate) fn new(owner: TypeInfo, is_const: bool, signature: Signature) -> Self {
        Self {
            owner,
            is_const,
            signature,
        }
    }

    /// The type that owns the method.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> TypeInfo {
        self.owner
    }

    /// Whether the method takes `&self`.
    #[inline]
    #[must_use]
    pub fn is_const(&self) -> bool {
        self.is_const
    }

    /// Parameters after the receiver.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[ParamInfo] {
        self.signature.params()
    }

    /// The return type, `()` for void.
    #[inline]
    #[must_use]
    pub fn returns(&self) -> TypeInfo {
        self.signature.returns()
    }
}
