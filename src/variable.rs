//! Handles that pair a [`Value`] with its registered type.
//!
//! A [`Variable`] is what every registry operation takes and returns. Besides
//! the value it remembers the value's [`TypeIndex`] and, when attached, the
//! [`Registry`] it came from, so member functions and member variables can
//! be reached through the handle alone:
//!
//! ```
//! use dynreflect::Registry;
//!
//! #[derive(Clone, Default)]
//! struct Counter {
//!     count: u32,
//! }
//!
//! impl Counter {
//!     fn bump(&mut self, by: u32) {
//!         self.count += by;
//!     }
//! }
//!
//! let registry = Registry::builder()
//!     .with_primitives()
//!     .register_type_named::<Counter>("Counter")
//!     .field("count", |c: &Counter| &c.count, |c: &mut Counter| &mut c.count)
//!     .method("bump", Counter::bump)
//!     .build();
//!
//! let mut counter = registry.wrap(Counter::default());
//! counter
//!     .call_member_function("bump", &mut [registry.wrap(2u32)])
//!     .unwrap();
//! let count = counter.get_member_variable("count").unwrap();
//! assert_eq!(count.to_string(), "2");
//! ```

use alloc::{format, string::String};
use core::fmt;

use crate::{
    ReflectError, Result,
    descriptors::{FieldDescriptor, MethodDescriptor, TypeIndex},
    macros::fail,
    registry::Registry,
    value::Value,
};

/// A value tagged with its registered type.
///
/// Handles are cheap to move but stay on the thread that created them, since
/// the value inside is neither `Send` nor `Sync`. Cloning a handle clones its
/// value.
#[derive(Clone, Default)]
pub struct Variable<'r> {
    /// The object, or nothing.
    pub(crate) value: Value,
    /// The registered type of `value`.
    pub(crate) type_index: TypeIndex,
    /// The registry `type_index` belongs to.
    pub(crate) registry: Option<&'r Registry>,
}

impl<'r> Variable<'r> {
    /// Creates a handle attached to `registry`.
    #[inline]
    pub(crate) fn attached(value: Value, type_index: TypeIndex, registry: &'r Registry) -> Self {
        Self {
            value,
            type_index,
            registry: Some(registry),
        }
    }

    /// Creates a handle that belongs to no registry.
    ///
    /// Its type is void, so checked operations reject it as an argument. Use
    /// [`Registry::adopt`] to tag a value with its registered type instead.
    #[must_use]
    pub fn detached(value: Value) -> Self {
        Self {
            value,
            type_index: TypeIndex::VOID,
            registry: None,
        }
    }

    /// Returns `true` if the handle holds a value.
    #[inline]
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.value.has_value()
    }

    /// Returns `true` if the handle is the result of a call returning unit.
    #[inline]
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.value.is_void()
    }

    /// The type the handle was tagged with.
    #[inline]
    #[must_use]
    pub fn type_index(&self) -> TypeIndex {
        self.type_index
    }

    /// The erased value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Releases the erased value.
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// The registry this handle is attached to.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> Option<&'r Registry> {
        self.registry
    }

    /// The type of the held value; void if there is none.
    #[must_use]
    pub fn object_type(&self) -> TypeIndex {
        match self.registry {
            Some(registry) => registry.object_type(self),
            None => TypeIndex::VOID,
        }
    }

    /// The registered name of the held value's type.
    ///
    /// A detached handle reports the Rust type name instead.
    #[must_use]
    pub fn type_name(&self) -> &'r str {
        match self.registry {
            Some(registry) => registry.type_name(self),
            None => self.value.type_name().unwrap_or("void"),
        }
    }

    /// Borrows the value as a `T`.
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Mutably borrows the value as a `T`.
    #[inline]
    #[must_use]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut()
    }

    /// Moves the value out as a `T`, or returns the handle unchanged.
    ///
    /// # Errors
    ///
    /// Returns `self` if the value is not a `T`.
    pub fn downcast<T: 'static>(self) -> core::result::Result<T, Self> {
        let Self {
            value,
            type_index,
            registry,
        } = self;
        value.downcast().map_err(|value| Self {
            value,
            type_index,
            registry,
        })
    }

    /// Iterates over the member functions of the held value's type.
    ///
    /// Empty for a detached or valueless handle.
    pub fn member_functions(&self) -> impl Iterator<Item = &'r MethodDescriptor> + 'r {
        let ty = self.object_type();
        self.registry
            .into_iter()
            .flat_map(move |registry| registry.methods_of(ty))
    }

    /// Iterates over the member variables of the held value's type.
    ///
    /// Empty for a detached or valueless handle.
    pub fn member_variables(&self) -> impl Iterator<Item = &'r FieldDescriptor> + 'r {
        let ty = self.object_type();
        self.registry
            .into_iter()
            .flat_map(move |registry| registry.fields_of(ty))
    }

    /// Reads the member variable `name` into a new handle.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError::Detached`], [`ReflectError::EmptyHandle`] or
    /// [`ReflectError::NotFound`] before reading anything.
    pub fn get_member_variable(&self, name: &str) -> Result<Variable<'r>> {
        let registry = self.attached_registry()?;
        let field = self.field(registry, name)?;
        registry.get_field(field, self)
    }

    /// Overwrites the member variable `name` with a copy of `value`.
    ///
    /// # Errors
    ///
    /// Fails without writing if the handle is detached or empty, if the
    /// member does not exist, or if `value` has another type.
    pub fn set_member_variable(&mut self, name: &str, value: &Variable<'_>) -> Result<()> {
        let registry = self.attached_registry()?;
        let field = self.field(registry, name)?;
        registry.set_field(field, self, value)
    }

    /// Calls the member function `name` on the held value.
    ///
    /// The value is updated in place. Overloads are chosen by exact argument
    /// types, first registered first.
    ///
    /// # Errors
    ///
    /// Fails without calling anything if the handle is detached or empty, if
    /// no member function has that name, or if no overload accepts `args`.
    pub fn call_member_function(
        &mut self,
        name: &str,
        args: &mut [Variable<'_>],
    ) -> Result<Variable<'r>> {
        let registry = self.attached_registry()?;
        registry.call_method_by_name(self, name, args)
    }

    /// Converts the held value to the type `target`.
    ///
    /// # Errors
    ///
    /// Fails if the handle is detached or empty, or if no conversion to
    /// `target` is registered.
    pub fn convert_to(&self, target: TypeIndex) -> Result<Variable<'r>> {
        self.attached_registry()?.convert_to(self, target)
    }

    /// Renders the held value with the serializer `name`.
    ///
    /// # Errors
    ///
    /// Fails if the handle is detached or empty, or if the type has no such
    /// serializer.
    pub fn serialize(&self, name: &str) -> Result<String> {
        self.attached_registry()?.serialize(self, name)
    }

    fn attached_registry(&self) -> Result<&'r Registry> {
        match self.registry {
            Some(registry) => Ok(registry),
            None => fail!(ReflectError::Detached),
        }
    }

    fn field(&self, registry: &'r Registry, name: &str) -> Result<&'r FieldDescriptor> {
        if !self.has_value() {
            fail!(
                ReflectError::EmptyHandle,
                format!("while accessing member variable `{name}`")
            );
        }
        match registry.find_field(self.type_index, name) {
            Some(field) => Ok(field),
            None => fail!(ReflectError::NotFound {
                kind: "member variable",
                name: format!("{}::{name}", self.type_name()),
            }),
        }
    }
}

impl fmt::Display for Variable<'_> {
    /// Renders the value with its type's default serializer, or as
    /// `<type name>` when there is none.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.registry.and_then(|registry| {
            registry
                .serialize(self, registry.options().default_serializer)
                .ok()
        });
        match rendered {
            Some(text) => f.write_str(&text),
            None => write!(f, "<{}>", self.type_name()),
        }
    }
}

impl fmt::Debug for Variable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("type_name", &self.type_name())
            .field("type_index", &self.type_index)
            .field("value", &self.value)
            .field("attached", &self.registry.is_some())
            .finish()
    }
}
